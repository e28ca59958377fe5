//! Debounce gate - turns raw signals into confirmed pending categories

use super::poller::{ConfirmationPoller, ExpiryReason, Verdict};
use crate::category::{Category, PerCategory};
use crate::timer::{TimerKey, TimerQueue};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Delay between confirmation polls
pub const POLL_PERIOD: Duration = Duration::from_millis(1000);
/// How long a zero count is tolerated before a signal is written off
pub const CONFIRMATION_TIMEOUT: Duration = Duration::from_millis(3000);

/// Debounce state for one category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingState {
    pub is_pending: bool,
    /// Only meaningful while pending, zero otherwise
    pub last_observed_count: u32,
    /// `None` for a re-armed category, which expires on its first empty poll
    pub first_detected_at: Option<Instant>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatePhase {
    Idle,
    AwaitingConfirmation,
    Confirmed,
}

/// Emitted by a poll round for the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateEvent {
    AlertStart(Category),
    AlertStop(Category),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateTiming {
    pub poll_period: Duration,
    pub confirmation_timeout: Duration,
}

impl Default for GateTiming {
    fn default() -> Self {
        Self {
            poll_period: POLL_PERIOD,
            confirmation_timeout: CONFIRMATION_TIMEOUT,
        }
    }
}

/// One state machine per category, sharing a single poll timer
#[derive(Debug, Default)]
pub struct DebounceGate {
    states: PerCategory<PendingState>,
    timing: GateTiming,
}

impl DebounceGate {
    pub fn new(timing: GateTiming) -> Self {
        Self {
            states: PerCategory::default(),
            timing,
        }
    }

    pub fn timing(&self) -> GateTiming {
        self.timing
    }

    /// Idle -> AwaitingConfirmation. A category that is already pending keeps
    /// its state. Returns whether the category was armed.
    pub fn arm(&mut self, category: Category, now: Instant, timers: &mut TimerQueue) -> bool {
        if self.states[category].is_pending {
            debug!(category = %category, "Already pending");
            return false;
        }
        self.states[category] = PendingState {
            is_pending: true,
            last_observed_count: 0,
            first_detected_at: Some(now),
        };
        if !timers.is_scheduled(TimerKey::Poll) {
            timers.schedule(TimerKey::Poll, now + self.timing.poll_period);
        }
        debug!(category = %category, "Awaiting confirmation");
        true
    }

    /// Marks `category` pending without a detection time, so the next poll
    /// either confirms it or drops it straight away. The caller polls.
    pub fn rearm(&mut self, category: Category) -> bool {
        if self.states[category].is_pending {
            return false;
        }
        self.states[category] = PendingState {
            is_pending: true,
            last_observed_count: 0,
            first_detected_at: None,
        };
        true
    }

    /// Polls every pending category and keeps the poll timer running while
    /// anything still needs it.
    pub fn poll(
        &mut self,
        poller: &mut ConfirmationPoller,
        now: Instant,
        timers: &mut TimerQueue,
    ) -> Vec<GateEvent> {
        let mut events = Vec::new();

        for category in Category::ALL {
            let state = self.states[category];
            if !state.is_pending {
                continue;
            }
            match poller.check(category, &state, now) {
                Verdict::Waiting => {}
                Verdict::Confirmed { count } => {
                    info!(category = %category, count, "Confirmed");
                    self.states[category].last_observed_count = count;
                    events.push(GateEvent::AlertStart(category));
                }
                Verdict::StillPending { count } => {
                    self.states[category].last_observed_count = count;
                }
                Verdict::Acknowledged => {
                    info!(category = %category, "Acknowledged");
                    self.reset(category);
                    events.push(GateEvent::AlertStop(category));
                }
                Verdict::Expired(reason) => {
                    match reason {
                        ExpiryReason::Timeout => debug!(category = %category, "Never confirmed"),
                        ExpiryReason::QueryFailed => debug!(category = %category, "Unconfirmable"),
                    }
                    self.reset(category);
                    events.push(GateEvent::AlertStop(category));
                }
            }
        }

        if self.any_pending() {
            timers.schedule(TimerKey::Poll, now + self.timing.poll_period);
        } else {
            timers.cancel(TimerKey::Poll);
        }
        events
    }

    pub fn reset(&mut self, category: Category) {
        self.states[category] = PendingState::default();
    }

    /// Everything back to idle and the poll timer stopped
    pub fn reset_all(&mut self, timers: &mut TimerQueue) {
        for (_, state) in self.states.iter_mut() {
            *state = PendingState::default();
        }
        timers.cancel(TimerKey::Poll);
    }

    pub fn is_pending(&self, category: Category) -> bool {
        self.states[category].is_pending
    }

    pub fn any_pending(&self) -> bool {
        self.states.iter().any(|(_, s)| s.is_pending)
    }

    pub fn state(&self, category: Category) -> PendingState {
        self.states[category]
    }

    pub fn phase(&self, category: Category) -> GatePhase {
        let state = &self.states[category];
        if !state.is_pending {
            GatePhase::Idle
        } else if state.last_observed_count > 0 {
            GatePhase::Confirmed
        } else {
            GatePhase::AwaitingConfirmation
        }
    }
}
