//! Cancellable delayed callbacks for the single-threaded controller

use crate::category::Category;
use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

/// What a timer fires into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKey {
    /// Confirmation poll shared by every pending category
    Poll,
    /// Next escalation tick of one category's alert session
    Tick(Category),
}

/// Deadline-ordered timer set with at most one timer per key.
///
/// Scheduling a key that is already pending replaces it, so a category can
/// never end up with two loops running.
#[derive(Debug, Default)]
pub struct TimerQueue {
    by_deadline: BTreeMap<(Instant, u64), TimerKey>,
    by_key: HashMap<TimerKey, (Instant, u64)>,
    seq: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, key: TimerKey, at: Instant) {
        self.cancel(key);
        self.seq += 1;
        let slot = (at, self.seq);
        self.by_deadline.insert(slot, key);
        self.by_key.insert(key, slot);
    }

    /// Returns whether a timer was pending
    pub fn cancel(&mut self, key: TimerKey) -> bool {
        match self.by_key.remove(&key) {
            Some(slot) => {
                self.by_deadline.remove(&slot);
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&mut self) {
        self.by_deadline.clear();
        self.by_key.clear();
    }

    pub fn is_scheduled(&self, key: TimerKey) -> bool {
        self.by_key.contains_key(&key)
    }

    pub fn deadline(&self, key: TimerKey) -> Option<Instant> {
        self.by_key.get(&key).map(|(at, _)| *at)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.by_deadline.keys().next().map(|(at, _)| *at)
    }

    /// Removes and returns the earliest timer due at `now`. Timers with equal
    /// deadlines come out in the order they were scheduled.
    pub fn pop_due(&mut self, now: Instant) -> Option<TimerKey> {
        let (&slot, &key) = self.by_deadline.iter().next()?;
        if slot.0 > now {
            return None;
        }
        self.by_deadline.remove(&slot);
        self.by_key.remove(&key);
        Some(key)
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_reschedule_replaces_pending_timer() {
        let base = Instant::now();
        let mut timers = TimerQueue::new();

        timers.schedule(TimerKey::Poll, base + Duration::from_secs(1));
        timers.schedule(TimerKey::Poll, base + Duration::from_secs(5));

        assert_eq!(timers.len(), 1);
        assert_eq!(timers.deadline(TimerKey::Poll), Some(base + Duration::from_secs(5)));
        assert_eq!(timers.pop_due(base + Duration::from_secs(2)), None);
    }

    #[test]
    fn test_pop_due_in_deadline_then_insertion_order() {
        let base = Instant::now();
        let mut timers = TimerQueue::new();
        let at = base + Duration::from_secs(1);

        timers.schedule(TimerKey::Tick(Category::Voicemail), at);
        timers.schedule(TimerKey::Poll, at);
        timers.schedule(TimerKey::Tick(Category::Text), base);

        let now = base + Duration::from_secs(1);
        assert_eq!(timers.pop_due(now), Some(TimerKey::Tick(Category::Text)));
        assert_eq!(timers.pop_due(now), Some(TimerKey::Tick(Category::Voicemail)));
        assert_eq!(timers.pop_due(now), Some(TimerKey::Poll));
        assert_eq!(timers.pop_due(now), None);
        assert!(timers.is_empty());
    }

    #[test]
    fn test_cancel() {
        let base = Instant::now();
        let mut timers = TimerQueue::new();
        timers.schedule(TimerKey::Tick(Category::Text), base);

        assert!(timers.cancel(TimerKey::Tick(Category::Text)));
        assert!(!timers.cancel(TimerKey::Tick(Category::Text)));
        assert_eq!(timers.next_deadline(), None);
    }
}
