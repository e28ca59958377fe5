//! Read-only preference access for the controller

use super::alert::AlertConfig;
use crate::category::{Category, PerCategory};
use std::sync::{Arc, RwLock};

/// Preference collaborator. The controller only ever reads from it.
pub trait PreferenceStore: Send {
    fn alerts_enabled(&self) -> bool;

    /// Battery percentage at or below which alerting shuts down, `None` if disabled
    fn low_battery_cutoff(&self) -> Option<u8>;

    /// Whether to show the persistent status indicator while alerting
    fn show_notification(&self) -> bool;

    fn alert_config(&self, category: Category) -> AlertConfig;
}

/// Resolved preference snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct Preferences {
    pub alerts_enabled: bool,
    pub low_battery_cutoff: Option<u8>,
    pub show_notification: bool,
    pub alerts: PerCategory<AlertConfig>,
}

impl Default for Preferences {
    fn default() -> Self {
        super::Settings::default().resolve()
    }
}

impl PreferenceStore for Preferences {
    fn alerts_enabled(&self) -> bool {
        self.alerts_enabled
    }

    fn low_battery_cutoff(&self) -> Option<u8> {
        self.low_battery_cutoff
    }

    fn show_notification(&self) -> bool {
        self.show_notification
    }

    fn alert_config(&self, category: Category) -> AlertConfig {
        self.alerts[category].clone()
    }
}

/// Preferences that a host can replace while the controller runs
#[derive(Debug, Clone, Default)]
pub struct SharedPreferences {
    inner: Arc<RwLock<Preferences>>,
}

impl SharedPreferences {
    pub fn new(preferences: Preferences) -> Self {
        Self {
            inner: Arc::new(RwLock::new(preferences)),
        }
    }

    pub fn replace(&self, preferences: Preferences) {
        if let Ok(mut guard) = self.inner.write() {
            *guard = preferences;
        }
    }

    /// Edits the snapshot in place
    pub fn update(&self, f: impl FnOnce(&mut Preferences)) {
        if let Ok(mut guard) = self.inner.write() {
            f(&mut guard);
        }
    }

    fn read<T>(&self, f: impl FnOnce(&Preferences) -> T, fallback: T) -> T {
        self.inner.read().map(|guard| f(&guard)).unwrap_or(fallback)
    }
}

// a poisoned lock reads as "alerts off", never as a reason to alert
impl PreferenceStore for SharedPreferences {
    fn alerts_enabled(&self) -> bool {
        self.read(|p| p.alerts_enabled, false)
    }

    fn low_battery_cutoff(&self) -> Option<u8> {
        self.read(|p| p.low_battery_cutoff, None)
    }

    fn show_notification(&self) -> bool {
        self.read(|p| p.show_notification, false)
    }

    fn alert_config(&self, category: Category) -> AlertConfig {
        self.read(
            |p| p.alerts[category].clone(),
            AlertConfig {
                enabled: false,
                ..AlertConfig::default()
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_preferences_see_updates() {
        let shared = SharedPreferences::new(Preferences::default());
        let handle = shared.clone();
        assert!(shared.alerts_enabled());

        handle.update(|p| {
            p.alerts_enabled = false;
            p.alerts[Category::Text].enabled = false;
        });

        assert!(!shared.alerts_enabled());
        assert!(!shared.alert_config(Category::Text).enabled);
        assert!(shared.alert_config(Category::MissedCall).enabled);
    }
}
