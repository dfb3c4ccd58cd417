//! CLI argument definitions for the collab-updates binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use collab_updates::constants::DEFAULT_FLUSH_DELAY_MILLIS;

/// How flushed batches are written to stdout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// One JSON object per batch, one batch per line
    #[default]
    Json,
    /// A table of records under a header line per batch
    Human,
}

/// Replays tree edits through the update batching engine
#[derive(Parser, Debug)]
#[command(name = "collab-updates")]
#[command(about = "Replay tree edits and print the update batches they produce")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply a JSON edit script and print every flushed batch
    Replay(ReplayArgs),
}

/// Arguments for the replay command
#[derive(clap::Args, Debug)]
pub struct ReplayArgs {
    /// Path to the edit script
    pub script: PathBuf,

    /// Quiescence delay before a batch is flushed, in milliseconds
    #[arg(short, long, default_value_t = DEFAULT_FLUSH_DELAY_MILLIS, env = "COLLAB_UPDATES_DELAY_MS")]
    pub delay_ms: u64,

    /// Revision the session resumes from; the first batch gets the next one
    #[arg(long, default_value_t = 0)]
    pub start_revision: u64,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Json)]
    pub format: Format,
}
