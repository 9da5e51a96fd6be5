use serde::{Deserialize, Serialize};

use crate::geometry::{Point, ScreenSize};

pub const TARGET_RADIUS: f64 = 20.0;
/// Side of the square area the standard grid is spread over.
pub const STANDARD_AREA_SIDE: f64 = 600.0;

const COLUMN_STEP_PERCENT: f64 = 100.0 / 3.0;
const ROW_STEP_PERCENT: f64 = 25.0;

/// A circular region the participant has to touch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub id: usize,
    pub center: Point,
    pub radius: f64,
}

/// Ordered, immutable set of targets. Ids are `0..len()`.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetLayout {
    targets: Vec<Target>,
}

impl TargetLayout {
    /// Each center is `anchor + offset% * extent`; ids follow offset order.
    pub fn build(anchor: Point, width: f64, height: f64, percent_offsets: &[Point]) -> Self {
        let targets = percent_offsets
            .iter()
            .enumerate()
            .map(|(id, offset)| Target {
                id,
                center: Point::new(
                    anchor.x + offset.x / 100.0 * width,
                    anchor.y + offset.y / 100.0 * height,
                ),
                radius: TARGET_RADIUS,
            })
            .collect();
        Self { targets }
    }

    /// The 4 rows × 3 columns board centered on the screen.
    pub fn standard_grid(screen: ScreenSize) -> Self {
        Self::build(
            screen.center(),
            STANDARD_AREA_SIDE,
            STANDARD_AREA_SIDE,
            &standard_grid_offsets(),
        )
    }

    pub fn get(&self, id: usize) -> Option<&Target> {
        self.targets.get(id)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Target> {
        self.targets.iter()
    }
}

/// Row-major from the top-left: ids 0..=2 are the top row, 9..=11 the bottom.
pub fn standard_grid_offsets() -> Vec<Point> {
    let rows = [-1.5, -0.5, 0.5, 1.5];
    let cols = [-1.0, 0.0, 1.0];
    rows.iter()
        .flat_map(|r| {
            cols.iter()
                .map(move |c| Point::new(c * COLUMN_STEP_PERCENT, r * ROW_STEP_PERCENT))
        })
        .collect()
}
