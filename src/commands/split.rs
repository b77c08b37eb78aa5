//! `davreplay split` command.

use std::path::Path;

use crate::cassette::config::RecorderConfig;
use crate::cassette::log::SingleFileLog;
use crate::cassette::numbered::{NumberedRecorder, COUNTER_START};

/// Execute the `split` command.
///
/// Reads the single-file log for `context` and writes each interaction as
/// a numbered file under `out` (or the configured base directory).
///
/// # Errors
///
/// Returns an error string if the log cannot be read, the target already
/// holds a numbered cassette, or a file cannot be written.
pub fn run(config: &RecorderConfig, context: &str, out: Option<&Path>) -> Result<(), String> {
    let mut log = SingleFileLog::new(&config.base_directory);
    log.set_context(context).map_err(|e| e.to_string())?;
    let entries = log.entries().map_err(|e| e.to_string())?;

    let target = out.unwrap_or(&config.base_directory);
    // An active recorder clears the context on bind, so look first.
    let mut existing = NumberedRecorder::new(target, false);
    existing.set_context(context).map_err(|e| e.to_string())?;
    let directory = existing.directory().map(Path::to_path_buf).unwrap_or_default();
    if directory.join(format!("{}.json", COUNTER_START + 1)).exists() {
        return Err(format!("Numbered cassette already exists: {}", directory.display()));
    }

    let mut recorder = NumberedRecorder::new(target, true);
    recorder.set_context(context).map_err(|e| e.to_string())?;

    let count = entries.len();
    for entry in entries {
        recorder.record(entry.request, entry.response).map_err(|e| e.to_string())?;
    }

    println!("Wrote {count} interactions to {}", directory.display());
    Ok(())
}
