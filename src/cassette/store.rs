//! The storage interface shared by both cassette layouts.

use std::path::Path;
use std::sync::{Arc, Mutex};

use super::config::StorageStrategy;
use super::format::InteractionEntry;
use super::log::SingleFileLog;
use super::numbered::NumberedRecorder;
use crate::error::Result;

/// Persists interactions for one bound context at a time.
///
/// Both layouts sanitize contexts the same way, run the codec on every
/// appended entry, and fail with `ContextNotSet` when used unbound.
pub trait CassetteStore: Send {
    /// Bind subsequent operations to `context`, creating its directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the context is empty or the directory cannot be created.
    fn set_context(&mut self, context: &str) -> Result<()>;

    /// The sanitized context currently bound, if any.
    fn context(&self) -> Option<&str>;

    /// Persist one interaction after the ones already recorded.
    ///
    /// # Errors
    ///
    /// Returns an error if no context is bound or the entry cannot be written.
    fn append(&mut self, entry: InteractionEntry) -> Result<()>;

    /// Read back every persisted interaction for the bound context, in order.
    ///
    /// # Errors
    ///
    /// Returns an error if no context is bound or the cassette is missing or malformed.
    fn entries(&self) -> Result<Vec<InteractionEntry>>;

    /// Discard everything recorded for the bound context, on disk included.
    ///
    /// A record run calls this on bind so a replay never sees interactions
    /// from an earlier recording.
    ///
    /// # Errors
    ///
    /// Returns an error if no context is bound or the cassette cannot be rewritten.
    fn clear(&mut self) -> Result<()>;

    /// Forget the bound context so the next test starts clean.
    fn reset(&mut self);
}

/// Store handle shared between a session and the transports it hands out.
pub type SharedStore = Arc<Mutex<Box<dyn CassetteStore>>>;

/// Build the store for `strategy` rooted at `base_directory`.
///
/// `recording_active` only affects the numbered layout, whose writes are
/// no-ops while recording is inactive.
#[must_use]
pub fn open_store(
    strategy: StorageStrategy,
    base_directory: &Path,
    recording_active: bool,
) -> Box<dyn CassetteStore> {
    match strategy {
        StorageStrategy::Log => Box::new(SingleFileLog::new(base_directory)),
        StorageStrategy::Numbered => {
            Box::new(NumberedRecorder::new(base_directory, recording_active))
        }
    }
}

/// Wrap a store so it can be shared.
#[must_use]
pub fn shared(store: Box<dyn CassetteStore>) -> SharedStore {
    Arc::new(Mutex::new(store))
}
