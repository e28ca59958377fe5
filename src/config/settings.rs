//! Raw preference values as stored in `settings.json`
//!
//! Interval, duration and vibrate style come from list pickers and are kept
//! as strings here. [`Settings::resolve`] turns them into typed
//! [`AlertConfig`]s, falling back to defaults on anything malformed.

use super::alert::{
    AlertConfig, AlertEffects, AudioAlert, FlashStyle, QuietHours, VibrateStyle, DEFAULT_DURATION,
    DEFAULT_INTERVAL,
};
use super::store::Preferences;
use crate::category::{Category, PerCategory};
use crate::error::{AlertError, Result};
use chrono::NaiveTime;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Global and per-category preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub alerts_enabled: bool,
    pub disable_on_low_battery: bool,
    pub low_battery_percentage: u8,
    pub show_notification: bool,
    #[serde(deserialize_with = "text_preferences")]
    pub text: AlertPreferences,
    #[serde(deserialize_with = "missed_call_preferences")]
    pub missed_call: AlertPreferences,
    #[serde(deserialize_with = "voicemail_preferences")]
    pub voicemail: AlertPreferences,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            alerts_enabled: true,
            disable_on_low_battery: true,
            low_battery_percentage: 15,
            show_notification: true,
            text: AlertPreferences::defaults_for(Category::Text),
            missed_call: AlertPreferences::defaults_for(Category::MissedCall),
            voicemail: AlertPreferences::defaults_for(Category::Voicemail),
        }
    }
}

/// `~/.missed-alerts/settings.json`
pub fn default_settings_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".missed-alerts")
        .join("settings.json")
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| AlertError::ConfigLoad {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| AlertError::ConfigLoad {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Loads `path`, or defaults when it is missing or unreadable
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            debug!(path = %path.display(), "No settings file, using defaults");
            return Self::default();
        }
        match Self::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(error = %e, "Falling back to default settings");
                Self::default()
            }
        }
    }

    pub fn alert_preferences(&self, category: Category) -> &AlertPreferences {
        match category {
            Category::Text => &self.text,
            Category::MissedCall => &self.missed_call,
            Category::Voicemail => &self.voicemail,
        }
    }

    pub fn alert_preferences_mut(&mut self, category: Category) -> &mut AlertPreferences {
        match category {
            Category::Text => &mut self.text,
            Category::MissedCall => &mut self.missed_call,
            Category::Voicemail => &mut self.voicemail,
        }
    }

    /// Typed snapshot; invalid values are logged and replaced by defaults
    pub fn resolve(&self) -> Preferences {
        let alerts = PerCategory::from_fn(|category| {
            let (config, problems) = self.alert_preferences(category).resolve();
            for problem in problems {
                warn!(category = %category, error = %problem, "Invalid alert preference, using default");
            }
            config
        });

        Preferences {
            alerts_enabled: self.alerts_enabled,
            low_battery_cutoff: self
                .disable_on_low_battery
                .then_some(self.low_battery_percentage.min(100)),
            show_notification: self.show_notification,
            alerts,
        }
    }

    /// Human-readable problems and caveats, one line each
    pub fn check(&self) -> Vec<String> {
        let mut notes = Vec::new();

        if self.low_battery_percentage > 100 {
            notes.push(format!(
                "low_battery_percentage {} is above 100, treating as 100",
                self.low_battery_percentage
            ));
        }

        for category in Category::ALL {
            let prefs = self.alert_preferences(category);
            let (config, problems) = prefs.resolve();
            for problem in problems {
                notes.push(format!("{}: {}", category, problem));
            }

            match config.duration {
                None => notes.push(format!(
                    "{}: duration is unlimited, alerts repeat until acknowledged",
                    category
                )),
                Some(duration) if config.interval > duration => notes.push(format!(
                    "{}: interval ({}s) is longer than duration ({}s), the alert sounds only once",
                    category,
                    config.interval.as_secs(),
                    duration.as_secs()
                )),
                Some(_) => {}
            }

            if prefs.audio && prefs.alert_tone.is_empty() {
                notes.push(format!("{}: audio is enabled but no alert tone is set", category));
            }
        }

        notes
    }
}

/// One category's stored preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertPreferences {
    pub enabled: bool,
    /// Seconds between alerts
    pub interval: String,
    /// Seconds to keep alerting, "0" for forever
    pub duration: String,
    pub flash_screen: bool,
    pub dim_flash: bool,
    pub vibrate: bool,
    /// Index into the vibrate style list
    pub vibrate_style: String,
    pub audio: bool,
    pub alert_tone: String,
    pub volume: u8,
    pub audio_disabled_on_silent: bool,
    pub scheduling_enabled: bool,
    pub scheduled_hour_start: u32,
    pub scheduled_minute_start: u32,
    pub scheduled_hour_end: u32,
    pub scheduled_minute_end: u32,
}

impl Default for AlertPreferences {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: DEFAULT_INTERVAL.as_secs().to_string(),
            duration: DEFAULT_DURATION.as_secs().to_string(),
            flash_screen: false,
            dim_flash: false,
            vibrate: true,
            vibrate_style: "0".to_string(),
            audio: false,
            alert_tone: String::new(),
            volume: 100,
            audio_disabled_on_silent: true,
            scheduling_enabled: false,
            scheduled_hour_start: 22,
            scheduled_minute_start: 0,
            scheduled_hour_end: 7,
            scheduled_minute_end: 0,
        }
    }
}

impl AlertPreferences {
    pub fn defaults_for(category: Category) -> Self {
        Self {
            enabled: category != Category::Voicemail,
            ..Self::default()
        }
    }

    /// Typed config plus every value that had to be replaced
    pub fn resolve(&self) -> (AlertConfig, Vec<AlertError>) {
        let mut problems = Vec::new();

        let interval = match parse_seconds("interval", &self.interval) {
            Ok(0) => {
                problems.push(invalid("interval", &self.interval, "must be greater than zero"));
                DEFAULT_INTERVAL
            }
            Ok(secs) => Duration::from_secs(secs),
            Err(e) => {
                problems.push(e);
                DEFAULT_INTERVAL
            }
        };

        let duration = match parse_seconds("duration", &self.duration) {
            Ok(0) => None,
            Ok(secs) => Some(Duration::from_secs(secs)),
            Err(e) => {
                problems.push(e);
                Some(DEFAULT_DURATION)
            }
        };

        let vibrate = if self.vibrate {
            let style = self
                .vibrate_style
                .trim()
                .parse::<u32>()
                .ok()
                .and_then(VibrateStyle::from_index);
            if style.is_none() {
                problems.push(invalid("vibrate_style", &self.vibrate_style, "expected 0-4"));
            }
            Some(style.unwrap_or_default())
        } else {
            None
        };

        // an empty tone means nothing to play
        let audio = (self.audio && !self.alert_tone.is_empty()).then(|| AudioAlert {
            tone: self.alert_tone.clone(),
            volume: self.volume.min(100),
            play_when_silent: !self.audio_disabled_on_silent,
        });

        let flash = self.flash_screen.then_some(if self.dim_flash {
            FlashStyle::Dim
        } else {
            FlashStyle::Full
        });

        let defaults = QuietHours::default();
        let start = time_of_day(
            "scheduled_start",
            self.scheduled_hour_start,
            self.scheduled_minute_start,
            &mut problems,
        )
        .unwrap_or(defaults.start);
        let end = time_of_day(
            "scheduled_end",
            self.scheduled_hour_end,
            self.scheduled_minute_end,
            &mut problems,
        )
        .unwrap_or(defaults.end);

        let config = AlertConfig {
            enabled: self.enabled,
            interval,
            duration,
            quiet_hours: QuietHours::new(self.scheduling_enabled, start, end),
            effects: AlertEffects {
                vibrate,
                audio,
                flash,
            },
        };

        (config, problems)
    }
}

fn text_preferences<'de, D: Deserializer<'de>>(d: D) -> Result<AlertPreferences, D::Error> {
    preferences_for(d, Category::Text)
}

fn missed_call_preferences<'de, D: Deserializer<'de>>(d: D) -> Result<AlertPreferences, D::Error> {
    preferences_for(d, Category::MissedCall)
}

fn voicemail_preferences<'de, D: Deserializer<'de>>(d: D) -> Result<AlertPreferences, D::Error> {
    preferences_for(d, Category::Voicemail)
}

/// Fields missing from a stored block take the category's own defaults
fn preferences_for<'de, D: Deserializer<'de>>(
    d: D,
    category: Category,
) -> Result<AlertPreferences, D::Error> {
    let mut stored = serde_json::Value::deserialize(d)?;
    let defaults =
        serde_json::to_value(AlertPreferences::defaults_for(category)).map_err(D::Error::custom)?;
    if let (Some(stored), serde_json::Value::Object(defaults)) = (stored.as_object_mut(), defaults) {
        for (key, value) in defaults {
            stored.entry(key).or_insert(value);
        }
    }
    serde_json::from_value(stored).map_err(D::Error::custom)
}

fn parse_seconds(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|e| invalid(key, value, &e.to_string()))
}

fn time_of_day(key: &str, hour: u32, minute: u32, problems: &mut Vec<AlertError>) -> Option<NaiveTime> {
    let time = NaiveTime::from_hms_opt(hour, minute, 0);
    if time.is_none() {
        problems.push(invalid(key, &format!("{}:{}", hour, minute), "hour or minute out of range"));
    }
    time
}

fn invalid(key: &str, value: &str, message: &str) -> AlertError {
    AlertError::InvalidConfig {
        key: key.to_string(),
        value: value.to_string(),
        message: message.to_string(),
    }
}
