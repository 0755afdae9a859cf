use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::Phase;

/// Every session phase change produces an Event.
/// The notification sink forwards them to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        phase: Phase,
        duration_secs: u64,
        /// Task the session was started for.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        at: DateTime<Utc>,
    },
    /// A running phase expired and the next one began.
    PhaseAdvanced {
        from: Phase,
        to: Phase,
        cycles_completed: u32,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    SessionPaused {
        /// Phase that was interrupted.
        phase: Phase,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    SessionResumed {
        phase: Phase,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    SessionStopped {
        from: Phase,
        cycles_completed: u32,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::SessionStarted { at, .. }
            | Event::PhaseAdvanced { at, .. }
            | Event::SessionPaused { at, .. }
            | Event::SessionResumed { at, .. }
            | Event::SessionStopped { at, .. } => *at,
        }
    }

    /// Phase the session is in once this event has happened.
    pub fn phase_after(&self) -> Phase {
        match self {
            Event::SessionStarted { phase, .. } | Event::SessionResumed { phase, .. } => *phase,
            Event::PhaseAdvanced { to, .. } => *to,
            Event::SessionPaused { .. } => Phase::Paused,
            Event::SessionStopped { .. } => Phase::Stopped,
        }
    }
}
