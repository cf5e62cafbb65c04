//! CLI module for Tripwire
//!
//! Provides operator commands:
//! - `status`: print a breaker's stored record
//! - `reset`: force a breaker back to Closed
//! - `probe`: send one guarded GET request

use crate::settings::{load_config, AppConfig};
use clap::{Parser, Subcommand};

pub mod probe;
pub mod reset;
pub mod status;

/// Tripwire circuit breaker CLI
#[derive(Parser, Debug)]
#[command(name = "tripwire")]
#[command(about = "Circuit breakers with pluggable shared state")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the stored state of a breaker
    Status {
        /// Breaker name
        name: String,
    },
    /// Reset a breaker to Closed with zeroed counters
    Reset {
        /// Breaker name
        name: String,
    },
    /// Send one GET request through a breaker
    Probe {
        /// Target URL
        url: String,
        /// Breaker name
        #[arg(long, default_value = "probe")]
        name: String,
    },
}

/// Run the CLI command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let Some(command) = cli.command else {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        cmd.print_help()?;
        println!();
        return Ok(());
    };

    let config = load_config()?;
    dispatch(command, &config).await
}

async fn dispatch(command: Commands, config: &AppConfig) -> anyhow::Result<()> {
    match command {
        Commands::Status { name } => status::run(config, &name).await,
        Commands::Reset { name } => reset::run(config, &name).await,
        Commands::Probe { url, name } => probe::run(config, &url, &name).await,
    }
}
