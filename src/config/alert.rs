//! Resolved, typed per-category alert configuration

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Interval used when the configured one cannot be parsed
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);
/// Duration used when the configured one cannot be parsed
pub const DEFAULT_DURATION: Duration = Duration::from_secs(3600);
/// How long a screen flash keeps the display awake
pub const SCREEN_WAKE_DURATION: Duration = Duration::from_millis(1500);

/// Snapshot of one category's alert preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertConfig {
    pub enabled: bool,
    /// Time between alert ticks, never zero
    pub interval: Duration,
    /// `None` keeps alerting until acknowledged
    pub duration: Option<Duration>,
    pub quiet_hours: QuietHours,
    /// Passed through to the sink untouched
    pub effects: AlertEffects,
}

impl AlertConfig {
    /// Whether a session started at `elapsed` ago has run its course
    pub fn duration_exceeded(&self, elapsed: Duration) -> bool {
        match self.duration {
            Some(limit) => elapsed >= limit,
            None => false,
        }
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: DEFAULT_INTERVAL,
            duration: Some(DEFAULT_DURATION),
            quiet_hours: QuietHours::default(),
            effects: AlertEffects::default(),
        }
    }
}

/// Daily window in which new alert sessions are not started.
///
/// The window is `[start, end)`. A window whose end is before its start runs
/// across midnight; `start == end` is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuietHours {
    pub enabled: bool,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl QuietHours {
    pub fn new(enabled: bool, start: NaiveTime, end: NaiveTime) -> Self {
        Self { enabled, start, end }
    }

    pub fn suppresses(&self, now: NaiveTime) -> bool {
        if !self.enabled {
            return false;
        }
        // minute resolution, like the hour/minute pickers that set it
        let now = now.with_second(0).and_then(|t| t.with_nanosecond(0)).unwrap_or(now);
        if self.start < self.end {
            now >= self.start && now < self.end
        } else if self.start > self.end {
            now >= self.start || now < self.end
        } else {
            false
        }
    }

    /// "10:00 PM - 07:00 AM"
    pub fn describe(&self) -> String {
        format!("{} - {}", self.start.format("%I:%M %p"), self.end.format("%I:%M %p"))
    }
}

impl Default for QuietHours {
    fn default() -> Self {
        Self {
            enabled: false,
            start: NaiveTime::from_hms_opt(22, 0, 0).unwrap_or_default(),
            end: NaiveTime::from_hms_opt(7, 0, 0).unwrap_or_default(),
        }
    }
}

/// Effects performed on every alert tick
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertEffects {
    pub vibrate: Option<VibrateStyle>,
    pub audio: Option<AudioAlert>,
    pub flash: Option<FlashStyle>,
}

impl AlertEffects {
    pub fn is_silent(&self) -> bool {
        self.vibrate.is_none() && self.audio.is_none() && self.flash.is_none()
    }
}

/// Vibration pattern choices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VibrateStyle {
    #[default]
    TwoShort,
    OneLong,
    TwoLong,
    ThreeMedium,
    LongShortLong,
}

impl VibrateStyle {
    /// Style for a list-picker index; unknown indexes yield `None`
    pub fn from_index(index: u32) -> Option<Self> {
        match index {
            0 => Some(Self::TwoShort),
            1 => Some(Self::OneLong),
            2 => Some(Self::TwoLong),
            3 => Some(Self::ThreeMedium),
            4 => Some(Self::LongShortLong),
            _ => None,
        }
    }

    /// Alternating off/on durations in milliseconds, starting with a delay
    pub fn pattern(self) -> &'static [u64] {
        match self {
            Self::TwoShort => &[5, 120, 60, 120],
            Self::OneLong => &[5, 800],
            Self::TwoLong => &[5, 260, 100, 260],
            Self::ThreeMedium => &[5, 100, 20, 100, 20, 100],
            Self::LongShortLong => &[5, 300, 60, 120, 60, 300],
        }
    }
}

/// Alert tone settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioAlert {
    /// Tone location understood by the audio collaborator
    pub tone: String,
    /// 0-100
    pub volume: u8,
    /// Play even when the device is in silent mode
    pub play_when_silent: bool,
}

/// Screen flash brightness; the collaborator keys its screen-wake by this
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashStyle {
    Dim,
    Full,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_quiet_hours_same_day_window() {
        let window = QuietHours::new(true, hm(9, 0), hm(17, 30));
        assert!(!window.suppresses(hm(8, 59)));
        assert!(window.suppresses(hm(9, 0)));
        assert!(window.suppresses(hm(17, 29)));
        assert!(!window.suppresses(hm(17, 30)));
    }

    #[test]
    fn test_quiet_hours_across_midnight() {
        let window = QuietHours::new(true, hm(22, 0), hm(7, 0));
        assert!(window.suppresses(hm(23, 0)));
        assert!(window.suppresses(hm(0, 0)));
        assert!(window.suppresses(hm(6, 59)));
        assert!(!window.suppresses(hm(7, 0)));
        assert!(!window.suppresses(hm(8, 0)));
        assert!(!window.suppresses(hm(21, 59)));
    }

    #[test]
    fn test_quiet_hours_disabled_or_empty() {
        assert!(!QuietHours::new(false, hm(0, 0), hm(23, 59)).suppresses(hm(12, 0)));
        assert!(!QuietHours::new(true, hm(8, 0), hm(8, 0)).suppresses(hm(8, 0)));
    }

    #[test]
    fn test_quiet_hours_ignores_seconds() {
        let window = QuietHours::new(true, hm(9, 0), hm(10, 0));
        let just_before_end = NaiveTime::from_hms_opt(9, 59, 59).unwrap();
        assert!(window.suppresses(just_before_end));
    }

    #[test]
    fn test_describe_uses_twelve_hour_clock() {
        let window = QuietHours::new(true, hm(22, 0), hm(7, 5));
        assert_eq!(window.describe(), "10:00 PM - 07:05 AM");
    }

    #[test]
    fn test_vibrate_patterns() {
        assert_eq!(VibrateStyle::from_index(1).unwrap().pattern(), &[5, 800]);
        assert_eq!(VibrateStyle::from_index(9), None);
        assert_eq!(VibrateStyle::default().pattern(), &[5, 120, 60, 120]);
    }

    #[test]
    fn test_duration_exceeded() {
        let mut config = AlertConfig::default();
        config.duration = Some(Duration::from_secs(120));
        assert!(!config.duration_exceeded(Duration::from_secs(119)));
        assert!(config.duration_exceeded(Duration::from_secs(120)));

        config.duration = None;
        assert!(!config.duration_exceeded(Duration::from_secs(u32::MAX as u64)));
    }
}
