//! Async runtime around the controller
//!
//! Signals arrive over an unbounded channel from whatever feeds them (stdin,
//! a platform bridge, a test). The loop waits for the next signal or the next
//! timer deadline, whichever comes first, and hands both to the controller on
//! this one task.

use crate::alerting::AlertController;
use crate::signal::Signal;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{info, warn};

pub type SignalSender = mpsc::UnboundedSender<Signal>;
pub type SignalReceiver = mpsc::UnboundedReceiver<Signal>;

pub fn channel() -> (SignalSender, SignalReceiver) {
    mpsc::unbounded_channel()
}

pub struct AlertService {
    controller: AlertController,
    signals: SignalReceiver,
    handle_interrupt: bool,
}

impl AlertService {
    pub fn new(controller: AlertController, signals: SignalReceiver) -> Self {
        Self {
            controller,
            signals,
            handle_interrupt: true,
        }
    }

    /// Leaves ctrl-c to the embedding program
    pub fn without_interrupt_handler(mut self) -> Self {
        self.handle_interrupt = false;
        self
    }

    /// Runs until every sender is dropped or ctrl-c, then force-stops all
    /// alerts and hands the controller back.
    pub async fn run(mut self) -> AlertController {
        self.controller.start();

        loop {
            let deadline = self.controller.next_deadline();
            tokio::select! {
                signal = self.signals.recv() => match signal {
                    Some(signal) => self.controller.handle(signal),
                    None => {
                        info!("Signal source closed");
                        break;
                    }
                },
                _ = sleep_until_opt(deadline) => {}
                interrupted = interrupt(self.handle_interrupt) => match interrupted {
                    Ok(()) => {
                        info!("Interrupted");
                        break;
                    }
                    Err(e) => {
                        warn!(error = %e, "Cannot listen for ctrl-c");
                        self.handle_interrupt = false;
                    }
                },
            }
            self.controller.run_due();
        }

        self.controller.shutdown();
        self.controller
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
        None => std::future::pending().await,
    }
}

async fn interrupt(enabled: bool) -> std::io::Result<()> {
    if enabled {
        tokio::signal::ctrl_c().await
    } else {
        std::future::pending().await
    }
}
