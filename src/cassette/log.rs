//! Single-file cassette log: one JSON array per context.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::codec;
use super::format::InteractionEntry;
use super::paths::{context_path, materialize_dir};
use super::store::CassetteStore;
use crate::error::{CassetteError, Result};

/// Records interactions into `<base>/<context>.json`.
///
/// The whole list is rewritten on every append, so the file on disk always
/// mirrors the in-memory log.
#[derive(Debug)]
pub struct SingleFileLog {
    base_directory: PathBuf,
    context: Option<String>,
    path: Option<PathBuf>,
    entries: Vec<InteractionEntry>,
}

impl SingleFileLog {
    /// Create an unbound log rooted at `base_directory`.
    pub fn new(base_directory: impl Into<PathBuf>) -> Self {
        Self { base_directory: base_directory.into(), context: None, path: None, entries: Vec::new() }
    }

    /// File the log is bound to, if a context has been set.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Bind to `context`. Starts from an empty log even if a file already exists;
    /// the file is only overwritten on the first [`add_entry`](Self::add_entry).
    ///
    /// # Errors
    ///
    /// Returns an error if the context is empty or its directory cannot be created.
    pub fn set_context(&mut self, context: &str) -> Result<()> {
        let (name, location) = context_path(&self.base_directory, context)?;
        let mut file = location.into_os_string();
        file.push(".json");
        let file = PathBuf::from(file);

        if let Some(parent) = file.parent() {
            materialize_dir(parent)?;
        }

        debug!(context = %name, path = %file.display(), "bound cassette log");
        self.entries.clear();
        self.context = Some(name);
        self.path = Some(file);
        Ok(())
    }

    /// Enrich `entry` with decoded bodies, append it and rewrite the file.
    ///
    /// # Errors
    ///
    /// Returns [`CassetteError::ContextNotSet`] when unbound, or an error if a
    /// JSON body is malformed or the file cannot be written.
    pub fn add_entry(&mut self, mut entry: InteractionEntry) -> Result<()> {
        let path = self.path.clone().ok_or(CassetteError::ContextNotSet)?;
        codec::enrich(&mut entry)?;
        self.entries.push(entry);

        let json =
            serde_json::to_string_pretty(&self.entries).map_err(CassetteError::Serialize)?;
        std::fs::write(&path, json).map_err(|source| CassetteError::Io { path: path.clone(), source })?;
        debug!(path = %path.display(), count = self.entries.len(), "appended interaction");
        Ok(())
    }

    /// Read the bound file and return every entry in recorded order.
    ///
    /// # Errors
    ///
    /// Returns [`CassetteError::ContextNotSet`] when unbound,
    /// [`CassetteError::MissingCassette`] if the file does not exist, or
    /// [`CassetteError::MalformedCassette`] if it does not parse.
    pub fn entries(&self) -> Result<Vec<InteractionEntry>> {
        let path = self.path.as_deref().ok_or(CassetteError::ContextNotSet)?;
        let content = std::fs::read_to_string(path).map_err(|e| CassetteError::io(path, e))?;
        serde_json::from_str(&content)
            .map_err(|source| CassetteError::MalformedCassette { path: path.to_path_buf(), source })
    }

    /// Drop every entry and rewrite the bound file as an empty log.
    ///
    /// # Errors
    ///
    /// Returns [`CassetteError::ContextNotSet`] when unbound, or an error if
    /// the file cannot be written.
    pub fn clear(&mut self) -> Result<()> {
        let path = self.path.clone().ok_or(CassetteError::ContextNotSet)?;
        self.entries.clear();
        std::fs::write(&path, "[]").map_err(|source| CassetteError::Io { path: path.clone(), source })?;
        debug!(path = %path.display(), "cleared cassette log");
        Ok(())
    }

    /// Forget the bound context and in-memory entries.
    pub fn reset(&mut self) {
        self.context = None;
        self.path = None;
        self.entries.clear();
    }
}

impl CassetteStore for SingleFileLog {
    fn set_context(&mut self, context: &str) -> Result<()> {
        SingleFileLog::set_context(self, context)
    }

    fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    fn append(&mut self, entry: InteractionEntry) -> Result<()> {
        self.add_entry(entry)
    }

    fn entries(&self) -> Result<Vec<InteractionEntry>> {
        SingleFileLog::entries(self)
    }

    fn clear(&mut self) -> Result<()> {
        SingleFileLog::clear(self)
    }

    fn reset(&mut self) {
        SingleFileLog::reset(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::format::{RecordedRequest, RecordedResponse};
    use serde_json::json;

    fn entry(method: &str, url: &str, status: u16, body: Option<&str>, ct: Option<&str>) -> InteractionEntry {
        InteractionEntry {
            request: RecordedRequest {
                method: method.into(),
                url: url.into(),
                description: format!("{method} {url}"),
                body: None,
                decoded_body: None,
            },
            response: RecordedResponse {
                status,
                body: body.map(Into::into),
                content_type: ct.map(Into::into),
                content_location: None,
                decoded_body: None,
            },
        }
    }

    #[test]
    fn writes_pretty_json_array_under_sanitized_context() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = SingleFileLog::new(dir.path());
        log.set_context("Folder suite/create: v1.0").unwrap();

        let expected = dir.path().join("Folder_suite").join("create__v1_0.json");
        assert_eq!(log.path(), Some(expected.as_path()));

        log.add_entry(entry("MKCOL", "/remote.php/dav/files/u/a", 201, None, None)).unwrap();

        let content = std::fs::read_to_string(&expected).unwrap();
        assert!(content.starts_with("[\n"), "expected pretty-printed array, got {content}");
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value[0]["request"]["method"], "MKCOL");
        assert_eq!(value[0]["response"]["status"], 201);
    }

    #[test]
    fn round_trip_preserves_order_and_fields() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = SingleFileLog::new(dir.path());
        log.set_context("suite/round trip").unwrap();

        let recorded = vec![
            entry("PROPFIND", "/dav/a", 207, Some("<d:multistatus xmlns:d=\"DAV:\"/>"), Some("application/xml")),
            entry("GET", "/ocs/user", 200, Some(r#"{"jsonProperty":42}"#), Some("application/json")),
            entry("DELETE", "/dav/a", 204, None, None),
        ];
        for e in &recorded {
            log.add_entry(e.clone()).unwrap();
        }

        let read: Vec<InteractionEntry> =
            log.entries().unwrap().iter().map(InteractionEntry::without_decoded).collect();
        assert_eq!(read, recorded);
    }

    #[test]
    fn appended_entries_carry_decoded_bodies() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = SingleFileLog::new(dir.path());
        log.set_context("codec").unwrap();

        log.add_entry(entry("GET", "/x", 200, Some(r#"{"jsonProperty":42}"#), Some("application/json")))
            .unwrap();
        log.add_entry(entry("GET", "/y", 200, Some("<broken>"), Some("application/xml"))).unwrap();

        let entries = log.entries().unwrap();
        assert_eq!(entries[0].response.decoded_body, Some(json!({"jsonProperty": 42})));
        assert_eq!(entries[1].response.decoded_body.as_ref().unwrap()["invalidXml"], true);
        assert_eq!(entries[1].response.body.as_deref(), Some("<broken>"));
    }

    #[test]
    fn set_context_starts_from_an_empty_log() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = SingleFileLog::new(dir.path());
        log.set_context("again").unwrap();
        log.add_entry(entry("GET", "/1", 200, None, None)).unwrap();
        log.add_entry(entry("GET", "/2", 200, None, None)).unwrap();

        log.set_context("again").unwrap();
        // The old file is still readable until the next append overwrites it.
        assert_eq!(log.entries().unwrap().len(), 2);

        log.add_entry(entry("GET", "/3", 200, None, None)).unwrap();
        let entries = log.entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].request.url, "/3");
    }

    #[test]
    fn clear_rewrites_an_empty_log() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = SingleFileLog::new(dir.path());
        log.set_context("wiped").unwrap();
        log.add_entry(entry("GET", "/1", 200, None, None)).unwrap();

        log.clear().unwrap();
        assert_eq!(std::fs::read_to_string(dir.path().join("wiped.json")).unwrap(), "[]");
        assert!(log.entries().unwrap().is_empty());
        assert!(matches!(SingleFileLog::new(dir.path()).clear(), Err(CassetteError::ContextNotSet)));
    }

    #[test]
    fn unbound_log_fails_with_context_not_set() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = SingleFileLog::new(dir.path());
        assert!(matches!(log.add_entry(entry("GET", "/", 200, None, None)), Err(CassetteError::ContextNotSet)));
        assert!(matches!(log.entries(), Err(CassetteError::ContextNotSet)));
    }

    #[test]
    fn missing_and_malformed_files_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = SingleFileLog::new(dir.path());
        log.set_context("nothing-here").unwrap();
        assert!(matches!(log.entries(), Err(CassetteError::MissingCassette { .. })));

        std::fs::write(dir.path().join("nothing-here.json"), "[{").unwrap();
        assert!(matches!(log.entries(), Err(CassetteError::MalformedCassette { .. })));
    }
}
