//! `mma run` - alert on signal lines read from stdin

use crate::alerting::AlertController;
use crate::clock::SystemClock;
use crate::config::{default_settings_path, Settings};
use crate::platform::{ConsoleAlertSink, CountsFileSource, LoggingResourceProvider};
use crate::service::{self, AlertService, SignalSender};
use crate::signal::Signal;
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Settings file (default: ~/.missed-alerts/settings.json)
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Unread counts JSON, re-read on every poll (default: ~/.missed-alerts/counts.json)
    #[arg(long)]
    pub counts: Option<PathBuf>,
}

/// `~/.missed-alerts/counts.json`
pub fn default_counts_path() -> PathBuf {
    default_settings_path().with_file_name("counts.json")
}

pub async fn handle_run(args: RunArgs) -> Result<()> {
    let settings_path = args.config.unwrap_or_else(default_settings_path);
    let counts_path = args.counts.unwrap_or_else(default_counts_path);
    info!(
        settings = %settings_path.display(),
        counts = %counts_path.display(),
        "Starting missed-alerts"
    );

    let settings = Settings::load_or_default(&settings_path);
    let controller = AlertController::new(
        Box::new(settings.resolve()),
        Box::new(CountsFileSource::new(counts_path)),
        Box::new(ConsoleAlertSink::new()),
        Box::new(LoggingResourceProvider::new()),
        Box::new(SystemClock),
    );

    let (tx, rx) = service::channel();
    tokio::spawn(read_signals(tx));

    let controller = AlertService::new(controller, rx).run().await;
    info!(holders = controller.holder_count(), "Stopped");
    Ok(())
}

/// Forwards stdin lines as signals until EOF
async fn read_signals(tx: SignalSender) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "Failed to read stdin");
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match line.parse::<Signal>() {
            Ok(signal) => {
                if tx.send(signal).is_err() {
                    break;
                }
            }
            Err(e) => warn!(line, error = %e, "Ignoring line"),
        }
    }
}
