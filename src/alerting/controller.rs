//! Control dispatcher - wires signals through the gate into the scheduler
//!
//! Everything here runs on one logical loop: [`AlertController::handle`] for
//! incoming signals and [`AlertController::run_due`] for expired timers. No
//! callback runs while another is in progress, so no state is locked.

use super::arbiter::ResourceArbiter;
use super::gate::{DebounceGate, GateEvent, GatePhase, GateTiming};
use super::poller::ConfirmationPoller;
use super::scheduler::{AlertScheduler, Moment, Outputs, StartOutcome, TickOutcome};
use crate::category::Category;
use crate::clock::Clock;
use crate::config::PreferenceStore;
use crate::platform::{AlertSink, QuerySource, ResourceProvider};
use crate::signal::{CallOutcome, CallTracker, Signal};
use crate::timer::{TimerKey, TimerQueue};
use std::time::Instant;
use tracing::{debug, info, warn};

pub struct AlertController {
    prefs: Box<dyn PreferenceStore>,
    poller: ConfirmationPoller,
    gate: DebounceGate,
    scheduler: AlertScheduler,
    arbiter: ResourceArbiter,
    sink: Box<dyn AlertSink>,
    clock: Box<dyn Clock>,
    timers: TimerQueue,
    calls: CallTracker,
    low_power: bool,
    notification_shown: bool,
}

impl AlertController {
    pub fn new(
        prefs: Box<dyn PreferenceStore>,
        source: Box<dyn QuerySource>,
        sink: Box<dyn AlertSink>,
        provider: Box<dyn ResourceProvider>,
        clock: Box<dyn Clock>,
    ) -> Self {
        let timing = GateTiming::default();
        Self {
            prefs,
            poller: ConfirmationPoller::new(source, timing.confirmation_timeout),
            gate: DebounceGate::new(timing),
            scheduler: AlertScheduler::new(),
            arbiter: ResourceArbiter::new(provider),
            sink,
            clock,
            timers: TimerQueue::new(),
            calls: CallTracker::new(),
            low_power: false,
            notification_shown: false,
        }
    }

    /// Overrides the poll period and confirmation timeout
    pub fn with_timing(mut self, timing: GateTiming) -> Self {
        self.gate = DebounceGate::new(timing);
        self.poller.set_confirmation_timeout(timing.confirmation_timeout);
        self
    }

    /// Startup scan: anything already unread gets alerted without waiting for
    /// a fresh signal.
    pub fn start(&mut self) {
        info!("Alert controller started");
        if self.low_power || !self.prefs.alerts_enabled() {
            return;
        }
        self.rearm_all_and_poll();
    }

    pub fn handle(&mut self, signal: Signal) {
        debug!(signal = ?signal, "Signal");
        match signal {
            Signal::BatteryChanged { level, charging } => self.battery_changed(level, charging),
            Signal::StopAll => {
                info!("Stop requested");
                self.stop_all();
            }
            Signal::AlertsStopped => self.stop_all(),
            // call state is tracked even in low-power mode, only its effects are dropped
            Signal::CallStateChanged { state } => {
                let outcome = self.calls.observe(state);
                if self.low_power {
                    debug!(outcome = ?outcome, "Low-power mode, ignoring call outcome");
                    return;
                }
                match outcome {
                    CallOutcome::Nothing => {}
                    CallOutcome::Missed => self.raise(Category::MissedCall),
                    CallOutcome::Ended => self.call_ended(),
                    CallOutcome::MissedAndEnded => {
                        self.raise(Category::MissedCall);
                        self.call_ended();
                    }
                }
            }
            _ if self.low_power => debug!("Low-power mode, ignoring signal"),
            Signal::MessageArrived => self.raise(Category::Text),
            Signal::CallBecameIdleAfterUnansweredRing => self.raise(Category::MissedCall),
            Signal::VoicemailIndicatorChanged { waiting: true } => self.raise(Category::Voicemail),
            Signal::VoicemailIndicatorChanged { waiting: false } => self.clear(Category::Voicemail),
        }
    }

    /// Fires every timer that is due. Returns how many ran.
    pub fn run_due(&mut self) -> usize {
        let mut fired = 0;
        while let Some(key) = self.timers.pop_due(self.clock.now()) {
            fired += 1;
            match key {
                TimerKey::Poll => self.poll_now(),
                TimerKey::Tick(category) => self.tick(category),
            }
        }
        fired
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    /// Stop-all: every session stopped, every category idle, resource freed
    pub fn stop_all(&mut self) {
        let stopped = {
            let mut out = Outputs {
                timers: &mut self.timers,
                arbiter: &mut self.arbiter,
                sink: self.sink.as_mut(),
            };
            self.scheduler.stop_all(&mut out)
        };
        self.gate.reset_all(&mut self.timers);
        self.arbiter.release_all();
        self.update_notification();
        if stopped > 0 {
            info!(sessions = stopped, "All alerts stopped");
        }
    }

    /// Force-stops everything before the process exits
    pub fn shutdown(&mut self) {
        self.stop_all();
        self.timers.cancel_all();
        info!("Alert controller stopped");
    }

    pub fn is_pending(&self, category: Category) -> bool {
        self.gate.is_pending(category)
    }

    pub fn phase(&self, category: Category) -> GatePhase {
        self.gate.phase(category)
    }

    pub fn is_alerting(&self, category: Category) -> bool {
        self.scheduler.is_active(category)
    }

    pub fn active_sessions(&self) -> usize {
        self.scheduler.active_count()
    }

    pub fn holder_count(&self) -> usize {
        self.arbiter.holder_count()
    }

    pub fn is_resource_held(&self) -> bool {
        self.arbiter.is_resource_held()
    }

    pub fn low_power(&self) -> bool {
        self.low_power
    }

    pub fn in_call(&self) -> bool {
        self.calls.in_call()
    }

    fn raise(&mut self, category: Category) {
        if self.calls.in_call() {
            debug!(category = %category, "In a call, ignoring signal");
            return;
        }
        if !self.prefs.alerts_enabled() {
            debug!(category = %category, "Alerts disabled, ignoring signal");
            return;
        }
        if !self.prefs.alert_config(category).enabled {
            debug!(category = %category, "Category disabled, ignoring signal");
            return;
        }
        let now = self.clock.now();
        if self.gate.arm(category, now, &mut self.timers) {
            info!(category = %category, "Signal received, confirming");
        }
    }

    fn clear(&mut self, category: Category) {
        self.gate.reset(category);
        let mut out = Outputs {
            timers: &mut self.timers,
            arbiter: &mut self.arbiter,
            sink: self.sink.as_mut(),
        };
        if self.scheduler.stop(category, &mut out) {
            info!(category = %category, "Cleared");
        }
        self.update_notification();
    }

    fn call_ended(&mut self) {
        debug!("Call ended, re-checking categories");
        if self.prefs.alerts_enabled() {
            self.rearm_all_and_poll();
        }
    }

    fn rearm_all_and_poll(&mut self) {
        let mut armed = false;
        for category in Category::ALL {
            if self.prefs.alert_config(category).enabled {
                armed |= self.gate.rearm(category);
            }
        }
        if armed || self.gate.any_pending() {
            self.poll_now();
        }
    }

    fn poll_now(&mut self) {
        let now = self.clock.now();
        let events = self.gate.poll(&mut self.poller, now, &mut self.timers);
        for event in events {
            match event {
                GateEvent::AlertStart(category) => self.alert_start(category),
                GateEvent::AlertStop(category) => {
                    let mut out = Outputs {
                        timers: &mut self.timers,
                        arbiter: &mut self.arbiter,
                        sink: self.sink.as_mut(),
                    };
                    self.scheduler.stop(category, &mut out);
                }
            }
        }
        self.update_notification();
    }

    fn alert_start(&mut self, category: Category) {
        let config = self.prefs.alert_config(category);
        let at = self.moment();
        let mut out = Outputs {
            timers: &mut self.timers,
            arbiter: &mut self.arbiter,
            sink: self.sink.as_mut(),
        };
        let outcome = self.scheduler.start(category, &config, at, &mut out);
        debug!(category = %category, outcome = ?outcome, "Alert start");

        if outcome != StartOutcome::Disabled && !self.notification_shown && self.prefs.show_notification() {
            match self.sink.show_notification() {
                Ok(()) => self.notification_shown = true,
                Err(e) => warn!(error = %e, "Failed to show notification"),
            }
        }
    }

    fn tick(&mut self, category: Category) {
        let config = self.prefs.alert_config(category);
        let source_pending = self.gate.is_pending(category);
        let alerts_enabled = self.prefs.alerts_enabled();
        let at = self.moment();
        let mut out = Outputs {
            timers: &mut self.timers,
            arbiter: &mut self.arbiter,
            sink: self.sink.as_mut(),
        };
        let outcome = self
            .scheduler
            .tick(category, &config, source_pending, alerts_enabled, at, &mut out);

        if let TickOutcome::Ended(_) = outcome {
            if self.scheduler.active_count() == 0 {
                debug!("Last alert session ended, resetting");
                self.stop_all();
            }
        }
    }

    fn battery_changed(&mut self, level: u8, charging: bool) {
        let low = match self.prefs.low_battery_cutoff() {
            Some(cutoff) => !charging && level <= cutoff,
            None => false,
        };
        if low && !self.low_power {
            warn!(level, "Battery low, alerts off");
            self.low_power = true;
            self.stop_all();
        } else if !low && self.low_power {
            info!(level, charging, "Battery recovered, alerts back on");
            self.low_power = false;
        }
    }

    fn update_notification(&mut self) {
        if self.notification_shown && !self.gate.any_pending() {
            self.notification_shown = false;
            if let Err(e) = self.sink.hide_notification() {
                warn!(error = %e, "Failed to hide notification");
            }
        }
    }

    fn moment(&self) -> Moment {
        Moment {
            now: self.clock.now(),
            time_of_day: self.clock.time_of_day(),
            muted: self.calls.in_call(),
        }
    }
}
