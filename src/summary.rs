use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::Result;
use crate::session::{EndReason, SessionState};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitEntry {
    pub time_since_start: f64,
    pub target_id: usize,
}

/// How the participant rated the session afterwards.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Feedback {
    Happy,
    Medium,
    Sad,
}

impl Feedback {
    pub const ALL: [Feedback; 3] = [Feedback::Happy, Feedback::Medium, Feedback::Sad];
}

/// Once-per-session record handed to the loggers at the terminal transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub date: DateTime<Local>,
    pub end_reason: EndReason,
    pub hits: usize,
    pub duration_seconds: f64,
    pub hit_log: Vec<HitEntry>,
    /// Average time between consecutive hits, counting the first from the start.
    pub mean_interval_seconds: Option<f64>,
    /// Set from the results screen before the summary is written.
    #[serde(default)]
    pub feedback: Option<Feedback>,
}

impl SessionSummary {
    /// `None` until the session has both started and ended.
    pub fn from_state(state: &SessionState) -> Option<Self> {
        let start = state.start_time?;
        let end_reason = state.end_reason?;
        let duration = state.duration?;
        let ended_at = state.ended_at.unwrap_or_else(SystemTime::now);

        let hit_log: Vec<HitEntry> = state
            .hit_log
            .iter()
            .map(|h| HitEntry {
                time_since_start: round2(seconds_between(start, h.at)),
                target_id: h.target_id,
            })
            .collect();

        let mut previous = 0.0;
        let intervals: Vec<f64> = state
            .hit_log
            .iter()
            .map(|h| {
                let t = seconds_between(start, h.at);
                let gap = t - previous;
                previous = t;
                gap
            })
            .collect();
        let mean_interval_seconds = if intervals.is_empty() {
            None
        } else {
            Some(round2(intervals.iter().sum::<f64>() / intervals.len() as f64))
        };

        Some(Self {
            date: DateTime::<Local>::from(ended_at),
            end_reason,
            hits: state.hits,
            duration_seconds: round2(duration.as_secs_f64()),
            hit_log,
            mean_interval_seconds,
            feedback: None,
        })
    }

    /// End time down to the millisecond, shared by every file of one session.
    pub fn stamp(&self) -> String {
        self.date.format("%Y%m%d-%H%M%S-%3f").to_string()
    }

    pub fn file_name(&self) -> String {
        format!("game_log_{}.json", self.stamp())
    }

    /// Write the summary as pretty JSON into `dir`, returning the file path.
    pub fn write_json<P: AsRef<Path>>(&self, dir: P) -> Result<PathBuf> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name());
        let data = serde_json::to_vec_pretty(self)?;
        fs::write(&path, data)?;
        log::info!("session log saved to {}", path.display());
        Ok(path)
    }
}

fn seconds_between(start: SystemTime, at: SystemTime) -> f64 {
    at.duration_since(start).unwrap_or_default().as_secs_f64()
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
