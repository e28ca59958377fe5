//! Confirmation poller - checks raw signals against ground-truth counts

use super::gate::PendingState;
use crate::category::Category;
use crate::error::{AlertError, Result};
use crate::platform::QuerySource;
use std::time::{Duration, Instant};
use tracing::warn;

/// What one poll of a pending category concluded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Nothing counted yet, still inside the confirmation window
    Waiting,
    /// First non-zero count: start alerting
    Confirmed { count: u32 },
    /// Still unacknowledged items
    StillPending { count: u32 },
    /// Count dropped to zero after being confirmed: the user caught up
    Acknowledged,
    /// Never confirmed, give up
    Expired(ExpiryReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryReason {
    /// Confirmation window ran out with a zero count
    Timeout,
    /// The count could not be read
    QueryFailed,
}

pub struct ConfirmationPoller {
    source: Box<dyn QuerySource>,
    confirmation_timeout: Duration,
}

impl ConfirmationPoller {
    pub fn new(source: Box<dyn QuerySource>, confirmation_timeout: Duration) -> Self {
        Self {
            source,
            confirmation_timeout,
        }
    }

    pub fn confirmation_timeout(&self) -> Duration {
        self.confirmation_timeout
    }

    pub fn set_confirmation_timeout(&mut self, timeout: Duration) {
        self.confirmation_timeout = timeout;
    }

    pub fn poll(&mut self, category: Category) -> Result<u32> {
        self.source
            .count(category)
            .map_err(|e| AlertError::QueryFailure {
                category,
                message: format!("{:#}", e),
            })
    }

    /// Polls `category` and judges the count against its pending state
    pub fn check(&mut self, category: Category, state: &PendingState, now: Instant) -> Verdict {
        let count = match self.poll(category) {
            Ok(count) => count,
            Err(e) => {
                warn!(category = %category, error = %e, "Count query failed, expiring category");
                return Verdict::Expired(ExpiryReason::QueryFailed);
            }
        };

        if count > 0 {
            return if state.last_observed_count == 0 {
                Verdict::Confirmed { count }
            } else {
                Verdict::StillPending { count }
            };
        }

        if state.last_observed_count > 0 {
            return Verdict::Acknowledged;
        }

        let timed_out = match state.first_detected_at {
            Some(at) => now.saturating_duration_since(at) >= self.confirmation_timeout,
            None => true,
        };
        if timed_out {
            Verdict::Expired(ExpiryReason::Timeout)
        } else {
            Verdict::Waiting
        }
    }
}
