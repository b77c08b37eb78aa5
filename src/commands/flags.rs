//! `davreplay flags` command.

use crate::cassette::config::{RecorderConfig, LOGGING_VAR, RECORDING_VAR};

/// Execute the `flags` command.
///
/// # Errors
///
/// Never fails; the signature matches the other handlers.
pub fn run(config: &RecorderConfig) -> Result<(), String> {
    println!("recording: {} ({RECORDING_VAR})", describe(config.recording));
    println!("transport logging: {} ({LOGGING_VAR})", describe(config.transport_logging));
    println!("cassette directory: {}", config.base_directory.display());
    println!("strategy: {:?}", config.strategy);
    if let Some(origin) = &config.origin {
        println!("origin: {origin}");
    }
    Ok(())
}

fn describe(active: bool) -> &'static str {
    if active {
        "active"
    } else {
        "inactive"
    }
}
