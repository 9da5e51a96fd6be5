use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};

use crate::visit_order::VisitOrder;

#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub targets_to_win: usize,
    pub max_duration: Duration,
    pub visit_order: VisitOrder,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EndReason {
    Win,
    Timeout,
    EarlyAbort,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitRecord {
    pub at: SystemTime,
    pub target_id: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub active_target_id: Option<usize>,
    pub cursor_in_order: usize,
    pub hits: usize,
    pub hit_log: Vec<HitRecord>,
    pub start_time: Option<SystemTime>,
    pub end_reason: Option<EndReason>,
    pub ended_at: Option<SystemTime>,
    pub duration: Option<Duration>,
}

impl SessionState {
    pub fn started(at: SystemTime) -> Self {
        Self {
            start_time: Some(at),
            ..Self::default()
        }
    }

    pub fn record_hit(&mut self, at: SystemTime, target_id: usize) {
        self.hits += 1;
        self.hit_log.push(HitRecord { at, target_id });
    }

    /// Wall-clock time since start, zero before start or if the clock went backwards.
    pub fn elapsed(&self, now: SystemTime) -> Duration {
        self.start_time
            .and_then(|start| now.duration_since(start).ok())
            .unwrap_or_default()
    }

    /// Write the terminal reason once and freeze the duration.
    /// Returns false if a reason was already recorded.
    pub fn conclude(&mut self, reason: EndReason, now: SystemTime) -> bool {
        if self.end_reason.is_some() {
            return false;
        }
        self.end_reason = Some(reason);
        self.ended_at = Some(now);
        self.duration = Some(self.elapsed(now));
        true
    }

    pub fn has_ended(&self) -> bool {
        self.end_reason.is_some()
    }
}
