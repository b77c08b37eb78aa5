//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI parser for `davreplay`.
#[derive(Debug, Parser)]
#[command(name = "davreplay", version, about = "Inspect and convert interaction cassettes")]
pub struct Cli {
    /// YAML configuration file; environment variables override it.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Cassette base directory, overriding configuration and environment.
    #[arg(long, global = true)]
    pub dir: Option<PathBuf>,

    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the interactions recorded for a context.
    Show {
        /// Context the cassette was recorded under (e.g. "suite/test name").
        context: String,
        /// Read the numbered-file layout instead of the configured one.
        #[arg(long)]
        numbered: bool,
    },
    /// Convert a single-file log cassette into numbered files.
    Split {
        /// Context the cassette was recorded under.
        context: String,
        /// Base directory for the numbered cassette (defaults to the source base).
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Report recording and logging activation under the current environment.
    Flags,
}
