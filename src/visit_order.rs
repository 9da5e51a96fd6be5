use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// Decides which target lights up next.
pub trait NextTarget {
    /// `cursor` counts the activations handed out so far in this session;
    /// `current` is the target that was active before this call.
    fn next_target(&mut self, cursor: usize, current: Option<usize>) -> Option<usize>;
}

/// Walks a prescribed list of ids. Repeats are allowed, back-to-back included.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedSequence {
    ids: Vec<usize>,
}

impl FixedSequence {
    pub fn new(ids: Vec<usize>) -> Self {
        Self { ids }
    }
}

impl NextTarget for FixedSequence {
    fn next_target(&mut self, cursor: usize, _current: Option<usize>) -> Option<usize> {
        self.ids.get(cursor).copied()
    }
}

/// Uniform over every id except the one currently active. Never runs out.
#[derive(Debug, Clone)]
pub struct RandomExcludingCurrent {
    target_count: usize,
    rng: StdRng,
}

impl RandomExcludingCurrent {
    pub fn new(target_count: usize) -> Self {
        Self {
            target_count,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(target_count: usize, seed: u64) -> Self {
        Self {
            target_count,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl NextTarget for RandomExcludingCurrent {
    fn next_target(&mut self, _cursor: usize, current: Option<usize>) -> Option<usize> {
        match current {
            Some(cur) if cur < self.target_count => {
                if self.target_count < 2 {
                    return None;
                }
                let pick = self.rng.gen_range(0..self.target_count - 1);
                Some(if pick >= cur { pick + 1 } else { pick })
            }
            _ if self.target_count == 0 => None,
            _ => Some(self.rng.gen_range(0..self.target_count)),
        }
    }
}

/// Configuration value selecting the ordering rule for a level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitOrder {
    Fixed(Vec<usize>),
    Random,
}

impl VisitOrder {
    pub fn validate(&self, target_count: usize) -> Result<(), SessionError> {
        match self {
            VisitOrder::Fixed(ids) if ids.is_empty() => Err(SessionError::EmptyVisitOrder),
            VisitOrder::Fixed(ids) => match ids.iter().find(|&&id| id >= target_count) {
                Some(&id) => Err(SessionError::UnknownTarget {
                    id,
                    count: target_count,
                }),
                None => Ok(()),
            },
            VisitOrder::Random => Ok(()),
        }
    }

    /// Number of activations the order can hand out, `None` if unbounded.
    pub fn len(&self) -> Option<usize> {
        match self {
            VisitOrder::Fixed(ids) => Some(ids.len()),
            VisitOrder::Random => None,
        }
    }

    pub fn picker(&self, target_count: usize, seed: Option<u64>) -> OrderPicker {
        match self {
            VisitOrder::Fixed(ids) => OrderPicker::Fixed(FixedSequence::new(ids.clone())),
            VisitOrder::Random => OrderPicker::Random(match seed {
                Some(seed) => RandomExcludingCurrent::seeded(target_count, seed),
                None => RandomExcludingCurrent::new(target_count),
            }),
        }
    }
}

/// The picker a running session owns.
#[derive(Debug, Clone)]
pub enum OrderPicker {
    Fixed(FixedSequence),
    Random(RandomExcludingCurrent),
}

impl NextTarget for OrderPicker {
    fn next_target(&mut self, cursor: usize, current: Option<usize>) -> Option<usize> {
        match self {
            OrderPicker::Fixed(f) => f.next_target(cursor, current),
            OrderPicker::Random(r) => r.next_target(cursor, current),
        }
    }
}
