//! Cassette session wiring configuration, store and transport together.

use std::sync::Arc;

use tracing::info;

use super::config::{Mode, RecorderConfig};
use super::store::{open_store, shared, SharedStore};
use crate::adapters::live::transport::LiveTransport;
use crate::adapters::recording::transport::RecordingTransport;
use crate::adapters::replaying::transport::PlaybackQueue;
use crate::error::Result;
use crate::ports::transport::Transport;

/// Owns the cassette store for a test run and hands out transports.
///
/// In record mode transports call the live service and persist every
/// exchange; in replay mode they serve the persisted exchanges for the
/// bound context. The resource client only ever sees `dyn Transport`.
pub struct CassetteSession {
    config: RecorderConfig,
    mode: Mode,
    store: SharedStore,
}

impl CassetteSession {
    /// Create a session for `mode`. The numbered layout only writes in record mode.
    #[must_use]
    pub fn open(config: RecorderConfig, mode: Mode) -> Self {
        let store = shared(open_store(config.strategy, &config.base_directory, mode.is_record()));
        Self { config, mode, store }
    }

    /// Create a session from the process environment, honoring `--record` in `args`.
    ///
    /// # Errors
    ///
    /// Returns an error if the environment holds an invalid setting.
    pub fn from_env<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let config = RecorderConfig::from_env()?;
        let mode = Mode::resolve(args, &config);
        Ok(Self::open(config, mode))
    }

    /// The active mode.
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The configuration this session was opened with.
    #[must_use]
    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// Shared handle to the underlying store.
    #[must_use]
    pub fn store(&self) -> SharedStore {
        Arc::clone(&self.store)
    }

    /// Bind the store to `context` (e.g. `"suite/test name"`).
    ///
    /// In record mode the previous cassette for `context` is discarded, so a
    /// run that makes fewer calls than the last one leaves nothing stale.
    ///
    /// # Errors
    ///
    /// Returns an error if the context is empty or its cassette cannot be
    /// created or cleared.
    pub fn begin(&self, context: &str) -> Result<()> {
        let mut store = self.store.lock().expect("cassette store lock poisoned");
        store.set_context(context)?;
        if self.mode.is_record() {
            store.clear()?;
        }
        info!(mode = ?self.mode, context = store.context().unwrap_or_default(), "cassette bound");
        Ok(())
    }

    /// Transport for the bound context, talking to the live service when recording.
    ///
    /// # Errors
    ///
    /// In replay mode, returns an error if the cassette is unbound, missing or malformed.
    pub fn transport(&self) -> Result<Box<dyn Transport>> {
        let live = LiveTransport::new(self.config.transport_logging);
        self.transport_over(Box::new(live))
    }

    /// Like [`transport`](Self::transport), but records through `inner`
    /// instead of a fresh [`LiveTransport`]. `inner` is unused in replay mode.
    ///
    /// # Errors
    ///
    /// In replay mode, returns an error if the cassette is unbound, missing or malformed.
    pub fn transport_over(&self, inner: Box<dyn Transport>) -> Result<Box<dyn Transport>> {
        match self.mode {
            Mode::Record => Ok(Box::new(RecordingTransport::new(
                inner,
                self.store(),
                self.config.origin.clone(),
            ))),
            Mode::Replay => {
                let entries =
                    self.store.lock().expect("cassette store lock poisoned").entries()?;
                info!(count = entries.len(), "loaded cassette for replay");
                Ok(Box::new(PlaybackQueue::new(entries)))
            }
        }
    }

    /// Unbind the store so the next test starts clean.
    pub fn reset(&self) {
        self.store.lock().expect("cassette store lock poisoned").reset();
    }
}
