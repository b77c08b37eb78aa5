//! Context sanitizing and directory creation shared by every store.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{CassetteError, Result};

/// Characters that never survive into a cassette path.
const UNSAFE_CHARS: [char; 3] = [' ', ':', '.'];

/// Replace spaces, colons and periods with underscores.
///
/// Idempotent: the output contains none of the replaced characters.
#[must_use]
pub fn sanitize_context(context: &str) -> String {
    context.replace(&UNSAFE_CHARS[..], "_")
}

/// Sanitize `context` and resolve it relative to `base`.
///
/// Leading and trailing `/` are dropped so a context can never replace
/// the base directory. Periods are already gone, so `..` cannot appear.
///
/// # Errors
///
/// Returns [`CassetteError::InvalidContext`] if nothing is left after sanitizing.
pub(crate) fn context_path(base: &Path, context: &str) -> Result<(String, PathBuf)> {
    let sanitized = sanitize_context(context);
    let relative = sanitized.trim_matches('/');
    if relative.is_empty() {
        return Err(CassetteError::InvalidContext(context.to_string()));
    }
    Ok((relative.to_string(), base.join(relative)))
}

/// Create every missing directory along `path`.
///
/// Segments are created one at a time from the left; a segment that
/// already exists counts as created.
///
/// # Errors
///
/// Returns [`CassetteError::Io`] for any failure other than "already exists".
pub fn materialize_dir(path: &Path) -> Result<()> {
    let mut partial = PathBuf::new();
    for component in path.components() {
        partial.push(component);
        match std::fs::create_dir(&partial) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
            Err(source) => return Err(CassetteError::Io { path: partial, source }),
        }
    }
    Ok(())
}
