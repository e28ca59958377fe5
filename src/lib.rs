//! Missed Alerts - repeating reminders for unread texts, missed calls and voicemail
//!
//! A raw "something arrived" signal is first confirmed against a ground-truth
//! count, then drives a repeating alert until the user catches up, the
//! configured duration runs out, or alerting is switched off.

pub mod alerting;
pub mod category;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod platform;
pub mod service;
pub mod signal;
pub mod timer;

pub use alerting::{AlertController, GatePhase, GateTiming, ResourceArbiter};
pub use category::{Category, PerCategory};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AlertConfig, PreferenceStore, Preferences, Settings, SharedPreferences};
pub use error::{AlertError, Result};
pub use platform::{AlertSink, QuerySource, ResourceProvider};
pub use service::AlertService;
pub use signal::{CallState, Signal};
pub use timer::{TimerKey, TimerQueue};
