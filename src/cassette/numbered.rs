//! Counter-based cassettes: one numbered file per interaction.
//!
//! Reads and writes advance the same counter, so a replay run only lines up
//! with its recording when both make the same calls in the same order.
//! Divergence is not detected beyond an eventual missing file.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::codec;
use super::format::{InteractionEntry, RecordedRequest, RecordedResponse};
use super::paths::{context_path, materialize_dir};
use super::store::CassetteStore;
use crate::error::{CassetteError, Result};

/// Counter value right after a context is bound; the first file is `1001.json`.
pub const COUNTER_START: u32 = 1000;

/// Writes each interaction to `<base>/<context>/<counter>.json`.
#[derive(Debug)]
pub struct NumberedRecorder {
    base_directory: PathBuf,
    active: bool,
    context: Option<String>,
    directory: Option<PathBuf>,
    counter: u32,
}

impl NumberedRecorder {
    /// Create an unbound recorder. Writes are skipped unless `active`.
    pub fn new(base_directory: impl Into<PathBuf>, active: bool) -> Self {
        Self {
            base_directory: base_directory.into(),
            active,
            context: None,
            directory: None,
            counter: COUNTER_START,
        }
    }

    /// Whether [`record`](Self::record) writes anything.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Current counter value.
    #[must_use]
    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Directory the recorder is bound to, if any.
    #[must_use]
    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    /// Bind to `context`, reset the counter and create the context directory.
    ///
    /// An active recorder also deletes the numbered files of any earlier
    /// recording, so a shorter re-recording leaves no stale tail behind.
    ///
    /// # Errors
    ///
    /// Returns an error if the context is empty or the directory cannot be
    /// created or cleared.
    pub fn set_context(&mut self, context: &str) -> Result<()> {
        let (name, directory) = context_path(&self.base_directory, context)?;
        materialize_dir(&directory)?;
        debug!(context = %name, path = %directory.display(), "bound numbered cassette");
        self.counter = COUNTER_START;
        self.context = Some(name);
        self.directory = Some(directory);
        if self.active {
            self.clear()?;
        }
        Ok(())
    }

    /// Delete every `<n>.json` file in the bound directory and reset the counter.
    ///
    /// Nested context directories and other files are left alone.
    ///
    /// # Errors
    ///
    /// Returns [`CassetteError::ContextNotSet`] when unbound, or an error if
    /// the directory cannot be listed or a file cannot be removed.
    pub fn clear(&mut self) -> Result<()> {
        let directory = self.directory.clone().ok_or(CassetteError::ContextNotSet)?;
        let listing = std::fs::read_dir(&directory).map_err(|e| CassetteError::io(&directory, e))?;
        let mut removed = 0_usize;
        for item in listing {
            let path = item.map_err(|e| CassetteError::io(&directory, e))?.path();
            if is_entry_file(&path) {
                std::fs::remove_file(&path).map_err(|e| CassetteError::io(&path, e))?;
                removed += 1;
            }
        }
        if removed > 0 {
            debug!(path = %directory.display(), removed, "cleared numbered cassette");
        }
        self.counter = COUNTER_START;
        Ok(())
    }

    /// Persist one request/response pair as the next numbered file.
    ///
    /// Does nothing while recording is inactive.
    ///
    /// # Errors
    ///
    /// Returns [`CassetteError::ContextNotSet`] when unbound, or an error if a
    /// JSON body is malformed or the file cannot be written.
    pub fn record(&mut self, request: RecordedRequest, response: RecordedResponse) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        let directory = self.directory.clone().ok_or(CassetteError::ContextNotSet)?;

        let mut entry = InteractionEntry { request, response };
        codec::enrich(&mut entry)?;
        let json = serde_json::to_string_pretty(&entry).map_err(CassetteError::Serialize)?;

        let next = self.counter + 1;
        let path = entry_path(&directory, next);
        std::fs::write(&path, json).map_err(|source| CassetteError::Io { path: path.clone(), source })?;
        self.counter = next;
        debug!(path = %path.display(), "recorded interaction");
        Ok(())
    }

    /// Return the response recorded at the next counter position.
    ///
    /// The request is not inspected; selection is purely positional.
    ///
    /// # Errors
    ///
    /// Returns [`CassetteError::ContextNotSet`] when unbound,
    /// [`CassetteError::MissingCassette`] when no file exists at the position,
    /// or [`CassetteError::MalformedCassette`] if it does not parse.
    pub fn recorded_response(&mut self, _request: &RecordedRequest) -> Result<RecordedResponse> {
        let directory = self.directory.clone().ok_or(CassetteError::ContextNotSet)?;
        self.counter += 1;
        let entry = read_entry(&entry_path(&directory, self.counter))?;
        Ok(entry.response)
    }

    /// Read every numbered file from `1001.json` up to the first gap.
    ///
    /// The counter is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`CassetteError::ContextNotSet`] when unbound, or an error if a file is unreadable.
    pub fn entries(&self) -> Result<Vec<InteractionEntry>> {
        let directory = self.directory.as_deref().ok_or(CassetteError::ContextNotSet)?;
        let mut entries = Vec::new();
        let mut n = COUNTER_START + 1;
        loop {
            let path = entry_path(directory, n);
            if !path.is_file() {
                break;
            }
            entries.push(read_entry(&path)?);
            n += 1;
        }
        Ok(entries)
    }

    /// Forget the bound context and reset the counter.
    pub fn reset(&mut self) {
        self.context = None;
        self.directory = None;
        self.counter = COUNTER_START;
    }
}

fn entry_path(directory: &Path, counter: u32) -> PathBuf {
    directory.join(format!("{counter}.json"))
}

/// `true` for regular files named `<digits>.json`.
fn is_entry_file(path: &Path) -> bool {
    path.is_file()
        && path.extension().is_some_and(|ext| ext == "json")
        && path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .is_some_and(|stem| !stem.is_empty() && stem.bytes().all(|b| b.is_ascii_digit()))
}

fn read_entry(path: &Path) -> Result<InteractionEntry> {
    let content = std::fs::read_to_string(path).map_err(|e| CassetteError::io(path, e))?;
    serde_json::from_str(&content)
        .map_err(|source| CassetteError::MalformedCassette { path: path.to_path_buf(), source })
}

impl CassetteStore for NumberedRecorder {
    fn set_context(&mut self, context: &str) -> Result<()> {
        NumberedRecorder::set_context(self, context)
    }

    fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    fn append(&mut self, entry: InteractionEntry) -> Result<()> {
        self.record(entry.request, entry.response)
    }

    fn entries(&self) -> Result<Vec<InteractionEntry>> {
        NumberedRecorder::entries(self)
    }

    fn clear(&mut self) -> Result<()> {
        NumberedRecorder::clear(self)
    }

    fn reset(&mut self) {
        NumberedRecorder::reset(self);
    }
}
