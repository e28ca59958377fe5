//! Platform collaborators - the device-facing side of the alerting core
//!
//! The controller never touches hardware itself. It asks a [`QuerySource`] for
//! ground-truth counts, tells an [`AlertSink`] to vibrate/play/notify, and
//! holds the wake-resource through a [`ResourceProvider`]. Raw signals arrive
//! as [`crate::signal::Signal`] values over a channel.

pub mod console;
pub mod counts_file;

use crate::category::Category;
use crate::config::{AlertConfig, FlashStyle};
use anyhow::Result;
use std::time::Duration;

pub use console::{ConsoleAlertSink, LoggingResourceProvider};
pub use counts_file::{CountsFileSource, UnreadCounts};

/// Ground-truth count of unacknowledged items per category
pub trait QuerySource: Send {
    /// Unread messages, new missed calls or waiting voicemails. Called from
    /// the controller's loop, so it must return quickly.
    fn count(&mut self, category: Category) -> Result<u32>;
}

/// Performs alert effects
pub trait AlertSink: Send {
    /// Vibrate and/or play the tone described by `config.effects`
    fn emit(&mut self, category: Category, config: &AlertConfig) -> Result<()>;

    /// Cut off anything still playing for `category`
    fn silence(&mut self, _category: Category) -> Result<()> {
        Ok(())
    }

    fn show_notification(&mut self) -> Result<()>;

    fn hide_notification(&mut self) -> Result<()>;
}

/// Low-level wake-resource and screen control
pub trait ResourceProvider: Send {
    /// Take the shared wake-resource. May fail transiently.
    fn acquire(&mut self) -> Result<()>;

    fn release(&mut self) -> Result<()>;

    /// Wake the screen for `duration` in the given flash style
    fn acquire_screen_wake(&mut self, style: FlashStyle, duration: Duration) -> Result<()>;

    /// A lit screen means the user is already looking at the device
    fn is_screen_on(&self) -> bool {
        false
    }
}
