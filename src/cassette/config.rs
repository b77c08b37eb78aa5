//! Recorder configuration, activation flags and mode selection.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CassetteError, Result};

/// Environment variable naming the cassette base directory.
pub const DIR_VAR: &str = "DAV_CASSETTE_DIR";
/// Environment variable selecting the storage layout (`log` or `numbered`).
pub const STRATEGY_VAR: &str = "DAV_CASSETTE_STRATEGY";
/// Activation flag for recording live traffic.
pub const RECORDING_VAR: &str = "DAV_RECORDING";
/// Activation flag for diagnostic traffic logging on the live transport.
pub const LOGGING_VAR: &str = "DAV_TRANSPORT_LOGGING";
/// Shared origin stripped from recorded URLs.
pub const ORIGIN_VAR: &str = "DAV_ORIGIN";

/// Command-line switch that forces record mode.
pub const RECORD_SWITCH: &str = "--record";

/// Evaluate an activation flag value.
///
/// Unset, empty, `"0"`, `"false"` and `"inactive"` are inactive; anything
/// else is active.
#[must_use]
pub fn flag_is_active(value: Option<&str>) -> bool {
    !matches!(value, None | Some("" | "0" | "false" | "inactive"))
}

/// How cassettes are laid out on disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageStrategy {
    /// `<base>/<context>.json` holding every interaction.
    #[default]
    Log,
    /// `<base>/<context>/<counter>.json`, one interaction per file.
    Numbered,
}

impl FromStr for StorageStrategy {
    type Err = CassetteError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "log" => Ok(Self::Log),
            "numbered" => Ok(Self::Numbered),
            other => Err(CassetteError::InvalidConfig(format!(
                "unknown storage strategy {other:?} (expected \"log\" or \"numbered\")"
            ))),
        }
    }
}

/// Whether a run talks to the live service or replays cassettes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Call the live service and persist every interaction.
    Record,
    /// Serve persisted interactions without network access.
    Replay,
}

impl Mode {
    /// Record if `args` contain [`RECORD_SWITCH`] or recording is active in `config`.
    pub fn resolve<I, S>(args: I, config: &RecorderConfig) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let forced = args.into_iter().any(|arg| arg.as_ref() == RECORD_SWITCH);
        if forced || config.recording {
            Self::Record
        } else {
            Self::Replay
        }
    }

    /// `true` for [`Mode::Record`].
    #[must_use]
    pub fn is_record(self) -> bool {
        self == Self::Record
    }
}

/// Settings for a cassette session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Directory holding all cassettes.
    pub base_directory: PathBuf,
    /// On-disk layout.
    pub strategy: StorageStrategy,
    /// Whether live recording is active.
    pub recording: bool,
    /// Whether the live transport logs full requests and responses.
    pub transport_logging: bool,
    /// Origin stripped from recorded URLs (e.g. `https://cloud.example.com`).
    pub origin: Option<String>,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            base_directory: PathBuf::from("tests/cassettes"),
            strategy: StorageStrategy::Log,
            recording: false,
            transport_logging: false,
            origin: None,
        }
    }
}

impl RecorderConfig {
    /// Load settings from an optional YAML file, then apply the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or an
    /// environment value is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let base = match path {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        base.with_overrides(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if an environment value is invalid.
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }

    /// Parse a YAML configuration file. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`CassetteError::InvalidConfig`] if the file cannot be read or parsed.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CassetteError::InvalidConfig(format!("failed to read {}: {e}", path.display()))
        })?;
        serde_yaml::from_str(&content).map_err(|e| {
            CassetteError::InvalidConfig(format!("failed to parse {}: {e}", path.display()))
        })
    }

    /// Apply overrides from `lookup`, which maps variable names to values.
    ///
    /// Activation flags only override when their variable is set.
    ///
    /// # Errors
    ///
    /// Returns [`CassetteError::InvalidConfig`] for an unknown storage strategy.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(DIR_VAR).filter(|d| !d.is_empty()) {
            self.base_directory = PathBuf::from(dir);
        }
        if let Some(strategy) = lookup(STRATEGY_VAR) {
            self.strategy = strategy.parse()?;
        }
        if let Some(flag) = lookup(RECORDING_VAR) {
            self.recording = flag_is_active(Some(&flag));
        }
        if let Some(flag) = lookup(LOGGING_VAR) {
            self.transport_logging = flag_is_active(Some(&flag));
        }
        if let Some(origin) = lookup(ORIGIN_VAR).filter(|o| !o.is_empty()) {
            self.origin = Some(origin);
        }
        Ok(self)
    }
}
