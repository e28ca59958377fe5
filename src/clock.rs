//! Time sources for the controller

use chrono::{Local, NaiveTime, Timelike};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Monotonic time for timers plus local wall time for quiet hours
pub trait Clock: Send {
    fn now(&self) -> Instant;

    /// Local time of day, minute resolution is all the scheduler needs
    fn time_of_day(&self) -> NaiveTime;
}

/// Real clock backed by `Instant::now` and the local timezone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn time_of_day(&self) -> NaiveTime {
        Local::now().time()
    }
}

#[derive(Debug)]
struct ManualState {
    elapsed: Duration,
    wall_start: NaiveTime,
}

/// Hand-driven clock. Clones share the same time so a test can keep one
/// handle while the controller owns another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    base: Instant,
    state: Arc<Mutex<ManualState>>,
}

impl ManualClock {
    pub fn new(wall_start: NaiveTime) -> Self {
        Self {
            base: Instant::now(),
            state: Arc::new(Mutex::new(ManualState {
                elapsed: Duration::ZERO,
                wall_start,
            })),
        }
    }

    /// Starts at 12:00 local, outside any default quiet window
    pub fn at_noon() -> Self {
        Self::new(NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default())
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut state) = self.state.lock() {
            state.elapsed += by;
        }
    }

    /// Moves the wall clock without touching monotonic time
    pub fn set_time_of_day(&self, time: NaiveTime) {
        if let Ok(mut state) = self.state.lock() {
            let elapsed_secs = state.elapsed.as_secs() as i64;
            state.wall_start = time - chrono::Duration::seconds(elapsed_secs);
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.state
            .lock()
            .map(|s| s.elapsed)
            .unwrap_or_default()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + self.elapsed()
    }

    fn time_of_day(&self) -> NaiveTime {
        let Ok(state) = self.state.lock() else {
            return NaiveTime::default();
        };
        let wall = state.wall_start + chrono::Duration::seconds(state.elapsed.as_secs() as i64);
        // drop sub-second noise so window comparisons stay exact
        wall.with_nanosecond(0).unwrap_or(wall)
    }
}
