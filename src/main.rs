//! Missed Alerts CLI

use anyhow::Result;
use clap::{Parser, Subcommand};
use missed_alerts::cli::{handle_config, handle_run, ConfigAction, RunArgs};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "mma")]
#[command(about = "Missed Alerts - keep reminding until missed messages are read")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read signals from stdin and alert until acknowledged
    Run(RunArgs),
    /// Inspect settings
    Config {
        /// Settings file (default: ~/.missed-alerts/settings.json)
        #[arg(long, short, global = true)]
        config: Option<PathBuf>,

        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("missed_alerts=info,mma=info"));

    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => handle_run(args).await?,
        Commands::Config { config, action } => handle_config(config, action)?,
    }

    Ok(())
}
