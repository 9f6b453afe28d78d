//! Launchpad CLI
//!
//! Command-line interface for the Launchpad training-run submission service.

mod api;
mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;

#[derive(Parser)]
#[command(name = "launchpad")]
#[command(about = "Submit training runs from annotated tasks", long_about = None)]
struct Cli {
    /// Launchpad server URL
    #[arg(long, env = "LAUNCHPAD_URL", default_value = "http://localhost:8090")]
    server_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config {
        server_url: cli.server_url,
    };

    handle_command(cli.command, &config).await
}
