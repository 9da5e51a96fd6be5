use std::time::SystemTime;

use crate::session::{EndReason, SessionConfig, SessionState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndDecision {
    Continue,
    Win,
    Timeout,
}

impl EndDecision {
    pub fn end_reason(self) -> Option<EndReason> {
        match self {
            EndDecision::Continue => None,
            EndDecision::Win => Some(EndReason::Win),
            EndDecision::Timeout => Some(EndReason::Timeout),
        }
    }
}

/// Win beats timeout when both hold. Early abort is never decided here.
pub fn evaluate(state: &SessionState, config: &SessionConfig, now: SystemTime) -> EndDecision {
    if state.start_time.is_none() {
        return EndDecision::Continue;
    }
    if state.hits >= config.targets_to_win {
        return EndDecision::Win;
    }
    if state.elapsed(now) > config.max_duration {
        return EndDecision::Timeout;
    }
    EndDecision::Continue
}
