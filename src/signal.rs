//! Raw signals pushed in by the event source, and call-state tracking

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};

/// Telephony state as reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallState {
    Ringing,
    OffHook,
    Idle,
}

/// Something happened on the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Signal {
    /// A text (SMS/MMS) arrived
    MessageArrived,
    /// Raw call-state transition; missed calls and call ends are derived from these
    CallStateChanged { state: CallState },
    /// Already-derived missed call, for sources that track ringing themselves
    CallBecameIdleAfterUnansweredRing,
    VoicemailIndicatorChanged { waiting: bool },
    BatteryChanged { level: u8, charging: bool },
    /// User dismissed everything
    StopAll,
    /// Alerting finished on its own; reset every category
    AlertsStopped,
}

impl std::str::FromStr for Signal {
    type Err = anyhow::Error;

    /// Parses the line protocol read by `mma run`
    fn from_str(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let command = words
            .next()
            .ok_or_else(|| anyhow!("empty signal"))?
            .to_lowercase();

        let signal = match command.as_str() {
            "sms" | "mms" | "text" | "message" => Signal::MessageArrived,
            "ring" | "ringing" => Signal::CallStateChanged { state: CallState::Ringing },
            "offhook" | "answer" => Signal::CallStateChanged { state: CallState::OffHook },
            "idle" | "hangup" => Signal::CallStateChanged { state: CallState::Idle },
            "missed" => Signal::CallBecameIdleAfterUnansweredRing,
            "vm" | "voicemail" => {
                let waiting = match words.next().map(|w| w.to_lowercase()) {
                    None => true,
                    Some(w) if w == "on" || w == "1" || w == "true" => true,
                    Some(w) if w == "off" || w == "0" || w == "false" => false,
                    Some(w) => bail!("expected on/off after '{}', got '{}'", command, w),
                };
                Signal::VoicemailIndicatorChanged { waiting }
            }
            "battery" => {
                let level = words
                    .next()
                    .ok_or_else(|| anyhow!("battery needs a level"))?
                    .trim_end_matches('%')
                    .parse::<u8>()
                    .map_err(|e| anyhow!("invalid battery level: {}", e))?;
                let charging = matches!(words.next(), Some("charging") | Some("plugged"));
                Signal::BatteryChanged {
                    level: level.min(100),
                    charging,
                }
            }
            "stop" | "ack" | "dismiss" => Signal::StopAll,
            _ => bail!("unknown signal: {}", command),
        };
        Ok(signal)
    }
}

/// What a call-state transition means for alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    Nothing,
    /// Phone rang and went idle without being answered
    Missed,
    /// A call that was in progress ended
    Ended,
    /// Rang unanswered while another call was in progress, then everything hung up
    MissedAndEnded,
}

/// Follows Ringing/OffHook/Idle transitions
#[derive(Debug, Clone, Default)]
pub struct CallTracker {
    started_ringing: bool,
    answered: bool,
    in_call: bool,
}

impl CallTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_call(&self) -> bool {
        self.in_call
    }

    pub fn observe(&mut self, state: CallState) -> CallOutcome {
        match state {
            CallState::Ringing => {
                self.started_ringing = true;
                self.answered = false;
                CallOutcome::Nothing
            }
            CallState::OffHook => {
                self.answered = true;
                self.in_call = true;
                CallOutcome::Nothing
            }
            CallState::Idle => {
                let missed = self.started_ringing && !self.answered;
                let ended = self.in_call;
                self.started_ringing = false;
                self.answered = false;
                self.in_call = false;
                match (missed, ended) {
                    (true, true) => CallOutcome::MissedAndEnded,
                    (true, false) => CallOutcome::Missed,
                    (false, true) => CallOutcome::Ended,
                    (false, false) => CallOutcome::Nothing,
                }
            }
        }
    }
}
