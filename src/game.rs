use log::{debug, info};
use std::time::{Duration, SystemTime};

use crate::clock::{Clock, SystemClock};
use crate::end_condition::{self, EndDecision};
use crate::error::SessionError;
use crate::geometry::Point;
use crate::hit::is_hit;
use crate::layout::{Target, TargetLayout};
use crate::notify::{HighlightCommand, HighlightSink, NullSink};
use crate::session::{EndReason, SessionConfig, SessionState};
use crate::summary::SessionSummary;
use crate::visit_order::{NextTarget, OrderPicker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NotStarted,
    Active,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceResult {
    Advanced { hit: usize, next: Option<usize> },
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    /// No session running.
    Inactive,
    /// Nothing to test this tick.
    NoSample,
    Miss,
    Hit { target_id: usize, next: Option<usize> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    pub input: InputOutcome,
    /// Set on the tick that ended the session.
    pub ended: Option<EndReason>,
}

/// One touch-the-dots session: target sequencing, hit handling and the
/// terminal transition. A new `start` discards the previous session.
pub struct DotGame<S: HighlightSink = NullSink, C: Clock = SystemClock> {
    layout: TargetLayout,
    sink: S,
    clock: C,
    seed: Option<u64>,
    phase: Phase,
    config: Option<SessionConfig>,
    state: SessionState,
    picker: Option<OrderPicker>,
    summary: Option<SessionSummary>,
}

impl DotGame {
    pub fn new(layout: TargetLayout) -> Self {
        Self::with_parts(layout, NullSink, SystemClock)
    }
}

impl<S: HighlightSink, C: Clock> DotGame<S, C> {
    pub fn with_parts(layout: TargetLayout, sink: S, clock: C) -> Self {
        Self {
            layout,
            sink,
            clock,
            seed: None,
            phase: Phase::NotStarted,
            config: None,
            state: SessionState::default(),
            picker: None,
            summary: None,
        }
    }

    /// Fix the random-order seed for reproducible sessions.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Begin a fresh session. A refused config leaves everything as it was.
    pub fn start(&mut self, config: SessionConfig) -> Result<(), SessionError> {
        if self.layout.is_empty() {
            return Err(SessionError::EmptyLayout);
        }
        if config.targets_to_win == 0 {
            return Err(SessionError::ZeroTargetsToWin);
        }
        config.visit_order.validate(self.layout.len())?;

        if self.phase == Phase::Active {
            if let Some(id) = self.state.active_target_id {
                self.sink.highlight(HighlightCommand::Off, id);
            }
        }

        self.picker = Some(config.visit_order.picker(self.layout.len(), self.seed));
        self.state = SessionState::started(self.clock.now());
        self.summary = None;
        self.phase = Phase::Active;
        info!(
            "session started: {} targets to win, max {:?}",
            config.targets_to_win, config.max_duration
        );
        self.config = Some(config);

        self.sink.tracker(HighlightCommand::On);
        self.activate_next();
        Ok(())
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn has_started(&self) -> bool {
        self.phase != Phase::NotStarted
    }

    pub fn has_finished(&self) -> bool {
        self.phase == Phase::Ended
    }

    pub fn current_target(&self) -> Option<usize> {
        self.state.active_target_id
    }

    pub fn active_target(&self) -> Option<&Target> {
        self.state
            .active_target_id
            .and_then(|id| self.layout.get(id))
    }

    pub fn layout(&self) -> &TargetLayout {
        &self.layout
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn config(&self) -> Option<&SessionConfig> {
        self.config.as_ref()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn now(&self) -> SystemTime {
        self.clock.now()
    }

    /// Running time, frozen once the session has ended.
    pub fn elapsed(&self) -> Duration {
        match self.state.duration {
            Some(d) => d,
            None => self.state.elapsed(self.clock.now()),
        }
    }

    /// Credit a hit on the active target. Callers check the geometry first.
    pub fn confirm_hit(&mut self, at: SystemTime) -> AdvanceResult {
        if self.phase != Phase::Active {
            debug!("hit rejected: session is {:?}", self.phase);
            return AdvanceResult::Rejected;
        }
        let Some(hit) = self.state.active_target_id else {
            debug!("hit rejected: visit order exhausted");
            return AdvanceResult::Rejected;
        };

        self.state.record_hit(at, hit);
        self.sink.highlight(HighlightCommand::Off, hit);
        let next = self.activate_next();
        debug!("hit on target {} ({} total), next {:?}", hit, self.state.hits, next);
        AdvanceResult::Advanced { hit, next }
    }

    /// Run one tick with this tick's normalized point, if any.
    pub fn process(&mut self, point: Option<Point>) -> TickOutcome {
        if self.phase != Phase::Active {
            return TickOutcome {
                input: InputOutcome::Inactive,
                ended: None,
            };
        }

        let input = match point {
            None => InputOutcome::NoSample,
            Some(p) if self.active_target().is_some_and(|t| is_hit(p, t)) => {
                let at = self.clock.now();
                match self.confirm_hit(at) {
                    AdvanceResult::Advanced { hit, next } => InputOutcome::Hit {
                        target_id: hit,
                        next,
                    },
                    AdvanceResult::Rejected => InputOutcome::Miss,
                }
            }
            Some(_) => InputOutcome::Miss,
        };

        TickOutcome {
            input,
            ended: self.tick(),
        }
    }

    pub fn evaluate(&self) -> EndDecision {
        match &self.config {
            Some(config) => end_condition::evaluate(&self.state, config, self.clock.now()),
            None => EndDecision::Continue,
        }
    }

    /// Check win/timeout without input; returns the reason if the session ended now.
    pub fn tick(&mut self) -> Option<EndReason> {
        if self.phase != Phase::Active {
            return None;
        }
        let reason = self.evaluate().end_reason()?;
        self.conclude(reason).then_some(reason)
    }

    /// User-requested exit. Only an active session can be aborted.
    pub fn abort(&mut self) -> bool {
        if self.phase != Phase::Active {
            return false;
        }
        self.conclude(EndReason::EarlyAbort)
    }

    pub fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }

    /// Hand the summary to a logger; yields it once per session.
    pub fn take_summary(&mut self) -> Option<SessionSummary> {
        self.summary.take()
    }

    fn activate_next(&mut self) -> Option<usize> {
        let picker = self.picker.as_mut()?;
        let next = picker.next_target(self.state.cursor_in_order, self.state.active_target_id);
        if next.is_some() {
            self.state.cursor_in_order += 1;
        }
        self.state.active_target_id = next;
        if let Some(id) = next {
            self.sink.highlight(HighlightCommand::On, id);
        }
        next
    }

    fn conclude(&mut self, reason: EndReason) -> bool {
        if !self.state.conclude(reason, self.clock.now()) {
            return false;
        }
        self.phase = Phase::Ended;
        if let Some(id) = self.state.active_target_id.take() {
            self.sink.highlight(HighlightCommand::Off, id);
        }
        self.sink.tracker(HighlightCommand::Off);
        self.summary = SessionSummary::from_state(&self.state);
        info!(
            "session ended: {} after {:.2}s with {} hits",
            reason,
            self.state.duration.unwrap_or_default().as_secs_f64(),
            self.state.hits
        );
        true
    }
}
