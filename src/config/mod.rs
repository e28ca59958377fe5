//! Preferences - stored settings, their typed resolution and read-only access

pub mod alert;
pub mod settings;
pub mod store;

pub use alert::{
    AlertConfig, AlertEffects, AudioAlert, FlashStyle, QuietHours, VibrateStyle, DEFAULT_DURATION,
    DEFAULT_INTERVAL, SCREEN_WAKE_DURATION,
};
pub use settings::{default_settings_path, AlertPreferences, Settings};
pub use store::{PreferenceStore, Preferences, SharedPreferences};
