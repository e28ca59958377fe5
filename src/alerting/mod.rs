//! Alerting core: confirmation, escalation and wake-resource sharing

pub mod arbiter;
pub mod controller;
pub mod gate;
pub mod poller;
pub mod scheduler;

pub use arbiter::ResourceArbiter;
pub use controller::AlertController;
pub use gate::{
    DebounceGate, GateEvent, GatePhase, GateTiming, PendingState, CONFIRMATION_TIMEOUT, POLL_PERIOD,
};
pub use poller::{ConfirmationPoller, ExpiryReason, Verdict};
pub use scheduler::{
    AlertScheduler, AlertSession, EndReason, Moment, Outputs, StartOutcome, TickOutcome,
};
