//! Shared mock collaborators for the integration tests

#![allow(dead_code)]

use anyhow::bail;
use missed_alerts::config::{AlertConfig, FlashStyle, Preferences, SharedPreferences};
use missed_alerts::{
    AlertController, AlertSink, Category, Clock, GateTiming, ManualClock, PerCategory,
    QuerySource, ResourceProvider,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Everything the collaborators saw, in order
#[derive(Debug, Default)]
pub struct Log {
    /// Elapsed time and category of every emit
    pub emits: Vec<(Duration, Category)>,
    pub silenced: Vec<Category>,
    pub notifications_shown: usize,
    pub notifications_hidden: usize,
    pub acquires: usize,
    pub releases: usize,
    pub screen_wakes: Vec<FlashStyle>,
    pub screen_on: bool,
    pub fail_acquire: bool,
    pub queries: usize,
}

pub type SharedLog = Arc<Mutex<Log>>;

/// Unread counts the test can change between polls; `None` fails the query
#[derive(Clone, Default)]
pub struct Counts {
    values: Arc<Mutex<PerCategory<Option<u32>>>>,
    log: SharedLog,
}

impl Counts {
    pub fn set(&self, category: Category, count: u32) {
        self.values.lock().unwrap()[category] = Some(count);
    }

    pub fn fail(&self, category: Category) {
        self.values.lock().unwrap()[category] = None;
    }
}

impl QuerySource for Counts {
    fn count(&mut self, category: Category) -> anyhow::Result<u32> {
        self.log.lock().unwrap().queries += 1;
        match self.values.lock().unwrap()[category] {
            Some(n) => Ok(n),
            None => bail!("content provider unavailable"),
        }
    }
}

pub struct MockSink {
    log: SharedLog,
    clock: ManualClock,
}

impl AlertSink for MockSink {
    fn emit(&mut self, category: Category, _: &AlertConfig) -> anyhow::Result<()> {
        let at = self.clock.elapsed();
        self.log.lock().unwrap().emits.push((at, category));
        Ok(())
    }

    fn silence(&mut self, category: Category) -> anyhow::Result<()> {
        self.log.lock().unwrap().silenced.push(category);
        Ok(())
    }

    fn show_notification(&mut self) -> anyhow::Result<()> {
        self.log.lock().unwrap().notifications_shown += 1;
        Ok(())
    }

    fn hide_notification(&mut self) -> anyhow::Result<()> {
        self.log.lock().unwrap().notifications_hidden += 1;
        Ok(())
    }
}

pub struct MockProvider {
    log: SharedLog,
}

impl ResourceProvider for MockProvider {
    fn acquire(&mut self) -> anyhow::Result<()> {
        let mut log = self.log.lock().unwrap();
        log.acquires += 1;
        if log.fail_acquire {
            bail!("wake lock busy");
        }
        Ok(())
    }

    fn release(&mut self) -> anyhow::Result<()> {
        self.log.lock().unwrap().releases += 1;
        Ok(())
    }

    fn acquire_screen_wake(&mut self, style: FlashStyle, _: Duration) -> anyhow::Result<()> {
        self.log.lock().unwrap().screen_wakes.push(style);
        Ok(())
    }

    fn is_screen_on(&self) -> bool {
        self.log.lock().unwrap().screen_on
    }
}

pub struct Harness {
    pub controller: AlertController,
    pub clock: ManualClock,
    pub counts: Counts,
    pub prefs: SharedPreferences,
    pub log: SharedLog,
}

impl Harness {
    /// Default preferences, all counts zero, clock at noon
    pub fn new() -> Self {
        Self::with_preferences(Preferences::default())
    }

    pub fn with_preferences(preferences: Preferences) -> Self {
        Self::build(preferences, ManualClock::at_noon(), GateTiming::default())
    }

    pub fn build(preferences: Preferences, clock: ManualClock, timing: GateTiming) -> Self {
        let log = SharedLog::default();
        let counts = Counts {
            values: Default::default(),
            log: log.clone(),
        };
        for category in Category::ALL {
            counts.set(category, 0);
        }
        let prefs = SharedPreferences::new(preferences);

        let controller = AlertController::new(
            Box::new(prefs.clone()),
            Box::new(counts.clone()),
            Box::new(MockSink {
                log: log.clone(),
                clock: clock.clone(),
            }),
            Box::new(MockProvider { log: log.clone() }),
            Box::new(clock.clone()),
        )
        .with_timing(timing);

        Self {
            controller,
            clock,
            counts,
            prefs,
            log,
        }
    }

    /// Moves time forward by `by`, firing every timer that falls due on the way
    pub fn advance(&mut self, by: Duration) {
        let target = self.clock.now() + by;
        while let Some(deadline) = self.controller.next_deadline() {
            if deadline > target {
                break;
            }
            let now = self.clock.now();
            if deadline > now {
                self.clock.advance(deadline - now);
            }
            self.controller.run_due();
        }
        let now = self.clock.now();
        if target > now {
            self.clock.advance(target - now);
        }
    }

    pub fn advance_secs(&mut self, secs: u64) {
        self.advance(Duration::from_secs(secs));
    }

    pub fn advance_millis(&mut self, millis: u64) {
        self.advance(Duration::from_millis(millis));
    }

    /// Elapsed seconds of every emit for `category`
    pub fn emit_times(&self, category: Category) -> Vec<u64> {
        self.log
            .lock()
            .unwrap()
            .emits
            .iter()
            .filter(|(_, c)| *c == category)
            .map(|(at, _)| at.as_secs())
            .collect()
    }

    pub fn emit_count(&self) -> usize {
        self.log.lock().unwrap().emits.len()
    }
}

pub fn preferences(f: impl FnOnce(&mut Preferences)) -> Preferences {
    let mut preferences = Preferences::default();
    f(&mut preferences);
    preferences
}
