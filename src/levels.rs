use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::session::SessionConfig;
use crate::visit_order::VisitOrder;

pub const DEFAULT_MAX_DURATION: Duration = Duration::from_secs(5 * 60);

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    #[strum(to_string = "Connect the Dots")]
    ConnectTheDots,
    #[strum(to_string = "Circle the Dots")]
    CircleTheDots,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    #[strum(to_string = "Level 1")]
    #[value(name = "1")]
    One,
    #[strum(to_string = "Level 2")]
    #[value(name = "2")]
    Two,
    #[strum(to_string = "Level 3")]
    #[value(name = "3")]
    Three,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::One, Level::Two, Level::Three];
}

impl GameMode {
    pub const ALL: [GameMode; 2] = [GameMode::ConnectTheDots, GameMode::CircleTheDots];
}

/// Target ids on the standard 4×3 grid, in the order they light up.
pub fn visit_order(mode: GameMode, level: Level) -> Vec<usize> {
    match (mode, level) {
        (GameMode::ConnectTheDots, Level::One) => vec![9, 10, 11, 6, 7, 8, 3, 4, 5, 0, 1, 2],
        (GameMode::ConnectTheDots, Level::Two) => vec![9, 7, 5, 4, 3, 7, 11, 1, 9],
        (GameMode::ConnectTheDots, Level::Three) => {
            vec![9, 7, 5, 4, 3, 6, 9, 10, 11, 8, 5, 1, 3, 7, 11]
        }
        (GameMode::CircleTheDots, Level::One) => vec![7, 4, 8, 10, 6],
        (GameMode::CircleTheDots, Level::Two) => vec![7, 4, 8, 10, 6, 3, 1, 5, 11, 9],
        (GameMode::CircleTheDots, Level::Three) => vec![10, 7, 4, 0, 1, 2],
    }
}

/// A level is won by touching every dot of its order once.
pub fn session_config(mode: GameMode, level: Level, max_duration: Duration) -> SessionConfig {
    let order = visit_order(mode, level);
    SessionConfig {
        targets_to_win: order.len(),
        max_duration,
        visit_order: VisitOrder::Fixed(order),
    }
}

/// Free play: `targets` random dots, never the same one twice in a row.
pub fn random_config(targets: usize, max_duration: Duration) -> SessionConfig {
    SessionConfig {
        targets_to_win: targets,
        max_duration,
        visit_order: VisitOrder::Random,
    }
}
