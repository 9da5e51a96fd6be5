//! Fingertip positions as delivered by the hand tracker, one per tick.

use serde::Deserialize;
use std::collections::VecDeque;
use std::io::Read;
use std::path::Path;

use crate::error::Result;
use crate::geometry::Point;

/// Given the current camera frame, the fingertip pixel or nothing.
pub trait FingertipSource {
    fn next_fingertip(&mut self) -> Option<Point>;
}

#[derive(Debug, Deserialize)]
struct FeedRow {
    x: Option<f64>,
    y: Option<f64>,
}

/// Replays recorded camera-space fingertip samples. Rows with an empty
/// coordinate stand for frames without a detected finger.
#[derive(Debug, Clone, Default)]
pub struct ReplayFeed {
    samples: VecDeque<Option<Point>>,
}

impl ReplayFeed {
    pub fn new<I: IntoIterator<Item = Option<Point>>>(samples: I) -> Self {
        Self {
            samples: samples.into_iter().collect(),
        }
    }

    /// Reads a headed `x,y` CSV.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        let mut samples = VecDeque::new();
        for row in rdr.deserialize() {
            let row: FeedRow = row?;
            samples.push_back(match (row.x, row.y) {
                (Some(x), Some(y)) => Some(Point::new(x, y)),
                _ => None,
            });
        }
        Ok(Self { samples })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn remaining(&self) -> usize {
        self.samples.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.samples.is_empty()
    }
}

impl FingertipSource for ReplayFeed {
    fn next_fingertip(&mut self) -> Option<Point> {
        self.samples.pop_front().flatten()
    }
}
