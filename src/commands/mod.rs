//! Command dispatch and handlers.

pub mod flags;
pub mod show;
pub mod split;

use crate::cassette::config::RecorderConfig;
use crate::cli::{Cli, Command};

/// Dispatch a parsed command to its handler.
///
/// Configuration comes from `--config` (if given) and the environment;
/// `--dir` overrides the cassette base directory.
///
/// # Errors
///
/// Returns an error string if configuration is invalid or the handler fails.
pub fn dispatch(cli: &Cli) -> Result<(), String> {
    let mut config = RecorderConfig::load(cli.config.as_deref()).map_err(|e| e.to_string())?;
    if let Some(dir) = &cli.dir {
        config.base_directory.clone_from(dir);
    }

    match &cli.command {
        Command::Show { context, numbered } => show::run(&config, context, *numbered),
        Command::Split { context, out } => split::run(&config, context, out.as_deref()),
        Command::Flags => flags::run(&config),
    }
}
