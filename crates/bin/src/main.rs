use clap::Parser;
use collab_updates::constants::DEFAULT_LOG_DIRECTIVE;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod output;
mod script;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so stdout carries only batches
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(DEFAULT_LOG_DIRECTIVE.parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Replay(args) => commands::replay::run(&args).await,
    }
}
