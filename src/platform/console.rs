//! Console collaborators used by the `mma` binary

use super::{AlertSink, ResourceProvider};
use crate::category::Category;
use crate::config::{AlertConfig, FlashStyle};
use anyhow::{bail, Result};
use std::io::Write;
use std::time::Duration;
use tracing::{debug, info};

/// Prints alerts to stdout; a tone becomes the terminal bell
#[derive(Debug, Default)]
pub struct ConsoleAlertSink {
    emitted: u64,
}

impl ConsoleAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    /// One-line summary of the effects, e.g. "vibrate [5, 800] + tone chime.ogg @ 80%"
    pub fn describe(config: &AlertConfig) -> String {
        let effects = &config.effects;
        let mut parts = Vec::new();
        if let Some(style) = effects.vibrate {
            parts.push(format!("vibrate {:?}", style.pattern()));
        }
        if let Some(audio) = &effects.audio {
            parts.push(format!("tone {} @ {}%", audio.tone, audio.volume));
        }
        if let Some(flash) = effects.flash {
            parts.push(format!("flash {:?}", flash).to_lowercase());
        }
        if parts.is_empty() {
            "no effects".to_string()
        } else {
            parts.join(" + ")
        }
    }
}

impl AlertSink for ConsoleAlertSink {
    fn emit(&mut self, category: Category, config: &AlertConfig) -> Result<()> {
        self.emitted += 1;
        let description = Self::describe(config);
        info!(category = %category, effects = %description, "Alert");

        let mut out = std::io::stdout().lock();
        write!(out, "[alert] {}: {}", category.display_name(), description)?;
        if config.effects.audio.is_some() {
            write!(out, "\x07")?;
        }
        writeln!(out)?;
        out.flush()?;
        Ok(())
    }

    fn silence(&mut self, category: Category) -> Result<()> {
        debug!(category = %category, "Silenced");
        Ok(())
    }

    fn show_notification(&mut self) -> Result<()> {
        println!("[notification] Missed messages waiting - send 'stop' to dismiss");
        Ok(())
    }

    fn hide_notification(&mut self) -> Result<()> {
        println!("[notification] cleared");
        Ok(())
    }
}

/// Stands in for a real wake lock: records and logs state changes
#[derive(Debug, Default)]
pub struct LoggingResourceProvider {
    held: bool,
    screen_style: Option<FlashStyle>,
}

impl LoggingResourceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_held(&self) -> bool {
        self.held
    }
}

impl ResourceProvider for LoggingResourceProvider {
    fn acquire(&mut self) -> Result<()> {
        if self.held {
            bail!("wake-resource already held");
        }
        self.held = true;
        info!("Wake-resource acquired");
        Ok(())
    }

    fn release(&mut self) -> Result<()> {
        if !self.held {
            bail!("wake-resource not held");
        }
        self.held = false;
        info!("Wake-resource released");
        Ok(())
    }

    fn acquire_screen_wake(&mut self, style: FlashStyle, duration: Duration) -> Result<()> {
        self.screen_style = Some(style);
        info!(style = ?style, duration_ms = duration.as_millis() as u64, "Screen wake");
        Ok(())
    }
}
