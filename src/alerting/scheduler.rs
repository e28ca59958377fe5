//! Alert scheduler - one repeating escalation loop per category

use super::arbiter::ResourceArbiter;
use crate::category::{Category, PerCategory};
use crate::config::AlertConfig;
use crate::platform::AlertSink;
use crate::timer::{TimerKey, TimerQueue};
use chrono::NaiveTime;
use std::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertSession {
    pub started_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyActive,
    Disabled,
    QuietHours,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Tick for a category with no session
    Stale,
    Emitted,
    /// Session alive but nothing emitted this time
    Skipped,
    Ended(EndReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    Acknowledged,
    AlertsDisabled,
    CategoryDisabled,
    DurationExceeded,
}

/// When a start or tick happens
#[derive(Debug, Clone, Copy)]
pub struct Moment {
    pub now: Instant,
    pub time_of_day: NaiveTime,
    /// Effects are held back, e.g. during a call
    pub muted: bool,
}

/// What the scheduler drives
pub struct Outputs<'a> {
    pub timers: &'a mut TimerQueue,
    pub arbiter: &'a mut ResourceArbiter,
    pub sink: &'a mut dyn AlertSink,
}

#[derive(Debug, Default)]
pub struct AlertScheduler {
    sessions: PerCategory<Option<AlertSession>>,
}

impl AlertScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self, category: Category) -> bool {
        self.sessions[category].is_some()
    }

    pub fn session(&self, category: Category) -> Option<AlertSession> {
        self.sessions[category]
    }

    pub fn active_count(&self) -> usize {
        self.sessions.iter().filter(|(_, s)| s.is_some()).count()
    }

    /// Starts alerting for `category`: alerts once straight away, then every
    /// `config.interval`.
    pub fn start(
        &mut self,
        category: Category,
        config: &AlertConfig,
        at: Moment,
        out: &mut Outputs<'_>,
    ) -> StartOutcome {
        if self.is_active(category) {
            return StartOutcome::AlreadyActive;
        }
        if !config.enabled {
            debug!(category = %category, "Category disabled, not alerting");
            return StartOutcome::Disabled;
        }
        if config.quiet_hours.suppresses(at.time_of_day) {
            info!(
                category = %category,
                window = %config.quiet_hours.describe(),
                "Quiet hours, not alerting"
            );
            return StartOutcome::QuietHours;
        }

        self.sessions[category] = Some(AlertSession { started_at: at.now });
        if let Err(e) = out.arbiter.acquire(category) {
            warn!(category = %category, error = %e, "Alerting without wake-resource");
        }
        info!(
            category = %category,
            interval_secs = config.interval.as_secs(),
            "Alert session started"
        );

        self.fire(category, config, at, out);
        out.timers.schedule(TimerKey::Tick(category), at.now + config.interval);
        StartOutcome::Started
    }

    /// One escalation step. `config` and the flags are read fresh by the
    /// caller so preference changes apply to a running session.
    pub fn tick(
        &mut self,
        category: Category,
        config: &AlertConfig,
        source_pending: bool,
        alerts_enabled: bool,
        at: Moment,
        out: &mut Outputs<'_>,
    ) -> TickOutcome {
        let Some(session) = self.sessions[category] else {
            return TickOutcome::Stale;
        };

        let end = if !source_pending {
            Some(EndReason::Acknowledged)
        } else if !alerts_enabled {
            Some(EndReason::AlertsDisabled)
        } else if !config.enabled {
            Some(EndReason::CategoryDisabled)
        } else if config.duration_exceeded(at.now.saturating_duration_since(session.started_at)) {
            Some(EndReason::DurationExceeded)
        } else {
            None
        };

        if let Some(reason) = end {
            info!(category = %category, reason = ?reason, "Alert session ended");
            self.stop(category, out);
            return TickOutcome::Ended(reason);
        }

        let emitted = self.fire(category, config, at, out);
        out.timers.schedule(TimerKey::Tick(category), at.now + config.interval);
        if emitted {
            TickOutcome::Emitted
        } else {
            TickOutcome::Skipped
        }
    }

    /// Deactivates `category` at once. Returns whether a session was running.
    pub fn stop(&mut self, category: Category, out: &mut Outputs<'_>) -> bool {
        if self.sessions[category].take().is_none() {
            return false;
        }
        out.timers.cancel(TimerKey::Tick(category));
        if let Err(e) = out.arbiter.release(category) {
            warn!(category = %category, error = %e, "Wake-resource bookkeeping");
        }
        if let Err(e) = out.sink.silence(category) {
            warn!(category = %category, error = %e, "Failed to silence alert");
        }
        debug!(category = %category, "Alert session stopped");
        true
    }

    /// Returns how many sessions were running
    pub fn stop_all(&mut self, out: &mut Outputs<'_>) -> usize {
        Category::ALL
            .into_iter()
            .filter(|&category| self.stop(category, out))
            .count()
    }

    fn fire(&mut self, category: Category, config: &AlertConfig, at: Moment, out: &mut Outputs<'_>) -> bool {
        if at.muted {
            debug!(category = %category, "Muted, skipping alert");
            return false;
        }
        if out.arbiter.user_is_looking(at.now) {
            debug!(category = %category, "Screen on, skipping alert");
            return false;
        }

        if let Some(style) = config.effects.flash {
            if let Err(e) = out.arbiter.flash_screen(style, at.now) {
                warn!(category = %category, error = %e, "Screen flash failed");
            }
        }
        // a failing sink means a silent alert, never a stopped loop
        if let Err(e) = out.sink.emit(category, config) {
            warn!(category = %category, error = %e, "Alert effects failed");
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FlashStyle, QuietHours};
    use crate::platform::ResourceProvider;
    use anyhow::bail;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Default)]
    struct Log {
        emits: Vec<Category>,
        silenced: Vec<Category>,
        acquires: usize,
        releases: usize,
        fail_emit: bool,
    }

    struct Sink(Arc<Mutex<Log>>);

    impl AlertSink for Sink {
        fn emit(&mut self, category: Category, _: &AlertConfig) -> anyhow::Result<()> {
            let mut log = self.0.lock().unwrap();
            log.emits.push(category);
            if log.fail_emit {
                bail!("audio device gone");
            }
            Ok(())
        }

        fn silence(&mut self, category: Category) -> anyhow::Result<()> {
            self.0.lock().unwrap().silenced.push(category);
            Ok(())
        }

        fn show_notification(&mut self) -> anyhow::Result<()> {
            Ok(())
        }

        fn hide_notification(&mut self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    struct Provider(Arc<Mutex<Log>>);

    impl ResourceProvider for Provider {
        fn acquire(&mut self) -> anyhow::Result<()> {
            self.0.lock().unwrap().acquires += 1;
            Ok(())
        }

        fn release(&mut self) -> anyhow::Result<()> {
            self.0.lock().unwrap().releases += 1;
            Ok(())
        }

        fn acquire_screen_wake(&mut self, _: FlashStyle, _: Duration) -> anyhow::Result<()> {
            Ok(())
        }
    }

    struct Fixture {
        scheduler: AlertScheduler,
        timers: TimerQueue,
        arbiter: ResourceArbiter,
        sink: Sink,
        log: Arc<Mutex<Log>>,
        t0: Instant,
    }

    impl Fixture {
        fn new() -> Self {
            let log = Arc::new(Mutex::new(Log::default()));
            Self {
                scheduler: AlertScheduler::new(),
                timers: TimerQueue::new(),
                arbiter: ResourceArbiter::new(Box::new(Provider(log.clone()))),
                sink: Sink(log.clone()),
                log,
                t0: Instant::now(),
            }
        }

        fn at(&self, secs: u64) -> Moment {
            Moment {
                now: self.t0 + Duration::from_secs(secs),
                time_of_day: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
                muted: false,
            }
        }

        fn start(&mut self, category: Category, config: &AlertConfig, at: Moment) -> StartOutcome {
            let mut out = Outputs {
                timers: &mut self.timers,
                arbiter: &mut self.arbiter,
                sink: &mut self.sink,
            };
            self.scheduler.start(category, config, at, &mut out)
        }

        fn tick(&mut self, category: Category, config: &AlertConfig, pending: bool, at: Moment) -> TickOutcome {
            let mut out = Outputs {
                timers: &mut self.timers,
                arbiter: &mut self.arbiter,
                sink: &mut self.sink,
            };
            self.scheduler.tick(category, config, pending, true, at, &mut out)
        }

        fn stop(&mut self, category: Category) -> bool {
            let mut out = Outputs {
                timers: &mut self.timers,
                arbiter: &mut self.arbiter,
                sink: &mut self.sink,
            };
            self.scheduler.stop(category, &mut out)
        }
    }

    #[test]
    fn test_start_emits_and_schedules_tick() {
        let mut f = Fixture::new();
        let config = AlertConfig::default();

        assert_eq!(f.start(Category::Text, &config, f.at(1)), StartOutcome::Started);

        assert_eq!(f.log.lock().unwrap().emits, vec![Category::Text]);
        assert_eq!(
            f.timers.deadline(TimerKey::Tick(Category::Text)),
            Some(f.t0 + Duration::from_secs(61))
        );
        assert_eq!(f.arbiter.holder_count(), 1);
    }

    #[test]
    fn test_start_twice_is_noop() {
        let mut f = Fixture::new();
        let config = AlertConfig::default();
        f.start(Category::Text, &config, f.at(0));

        assert_eq!(f.start(Category::Text, &config, f.at(5)), StartOutcome::AlreadyActive);
        assert_eq!(f.log.lock().unwrap().emits.len(), 1);
        assert_eq!(f.scheduler.session(Category::Text).unwrap().started_at, f.t0);
        assert_eq!(f.log.lock().unwrap().acquires, 1);
    }

    #[test]
    fn test_quiet_hours_blocks_start() {
        let mut f = Fixture::new();
        let mut config = AlertConfig::default();
        config.quiet_hours = QuietHours::new(
            true,
            NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(13, 0, 0).unwrap(),
        );

        assert_eq!(f.start(Category::Text, &config, f.at(0)), StartOutcome::QuietHours);
        assert!(!f.scheduler.is_active(Category::Text));
        assert_eq!(f.arbiter.holder_count(), 0);
        assert!(f.timers.is_empty());
    }

    #[test]
    fn test_duration_ends_session() {
        let mut f = Fixture::new();
        let mut config = AlertConfig::default();
        config.duration = Some(Duration::from_secs(120));
        f.start(Category::MissedCall, &config, f.at(0));

        assert_eq!(f.tick(Category::MissedCall, &config, true, f.at(60)), TickOutcome::Emitted);
        assert_eq!(
            f.tick(Category::MissedCall, &config, true, f.at(120)),
            TickOutcome::Ended(EndReason::DurationExceeded)
        );

        let log = f.log.lock().unwrap();
        assert_eq!(log.emits.len(), 2);
        assert_eq!(log.silenced, vec![Category::MissedCall]);
        assert_eq!(log.releases, 1);
        assert!(f.timers.is_empty());
    }

    #[test]
    fn test_tick_checks_live_conditions() {
        let mut f = Fixture::new();
        let config = AlertConfig::default();
        f.start(Category::Text, &config, f.at(0));
        assert_eq!(
            f.tick(Category::Text, &config, false, f.at(60)),
            TickOutcome::Ended(EndReason::Acknowledged)
        );

        f.start(Category::Text, &config, f.at(100));
        let disabled = AlertConfig {
            enabled: false,
            ..AlertConfig::default()
        };
        assert_eq!(
            f.tick(Category::Text, &disabled, true, f.at(160)),
            TickOutcome::Ended(EndReason::CategoryDisabled)
        );
        assert_eq!(f.tick(Category::Text, &config, true, f.at(220)), TickOutcome::Stale);
    }

    #[test]
    fn test_muted_tick_keeps_loop_running() {
        let mut f = Fixture::new();
        let config = AlertConfig::default();
        f.start(Category::Text, &config, f.at(0));

        let mut muted = f.at(60);
        muted.muted = true;
        assert_eq!(f.tick(Category::Text, &config, true, muted), TickOutcome::Skipped);
        assert!(f.timers.is_scheduled(TimerKey::Tick(Category::Text)));
        assert_eq!(f.log.lock().unwrap().emits.len(), 1);
    }

    #[test]
    fn test_sink_failure_is_absorbed() {
        let mut f = Fixture::new();
        f.log.lock().unwrap().fail_emit = true;
        let config = AlertConfig::default();

        assert_eq!(f.start(Category::Voicemail, &config, f.at(0)), StartOutcome::Started);
        assert_eq!(f.tick(Category::Voicemail, &config, true, f.at(60)), TickOutcome::Emitted);
        assert!(f.scheduler.is_active(Category::Voicemail));
    }

    #[test]
    fn test_stop_cancels_tick_and_releases() {
        let mut f = Fixture::new();
        let config = AlertConfig::default();
        f.start(Category::Text, &config, f.at(0));
        f.start(Category::MissedCall, &config, f.at(0));

        assert!(f.stop(Category::Text));
        assert!(!f.stop(Category::Text));
        assert!(f.arbiter.is_resource_held());
        assert!(!f.timers.is_scheduled(TimerKey::Tick(Category::Text)));

        assert!(f.stop(Category::MissedCall));
        assert!(!f.arbiter.is_resource_held());
        assert_eq!(f.log.lock().unwrap().releases, 1);
    }
}
