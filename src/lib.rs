//! Record and replay storage-service interactions as per-test cassettes.
//!
//! A [`CassetteSession`](cassette::CassetteSession) hands the resource client
//! a [`Transport`](ports::Transport). In record mode it calls the live service
//! and persists every exchange under the bound context; in replay mode it
//! serves the persisted exchanges in order, without network access.

pub mod adapters;
pub mod cassette;
pub mod cli;
pub mod commands;
pub mod error;
pub mod ports;

pub use error::{CassetteError, Result};

use clap::Parser;

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or command execution fails.
pub fn run<I, T>(args: I) -> std::result::Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = cli::Cli::try_parse_from(args).map_err(|err| err.to_string())?;
    commands::dispatch(&cli)
}
