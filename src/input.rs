use serde::{Deserialize, Serialize};

use crate::calibration::{map_point, CalibrationTransform};
use crate::geometry::{GameArea, Point, ScreenSize};
use crate::layout::STANDARD_AREA_SIDE;

/// Border of the projected game frame that is pushed below the screen edge.
pub const BOARD_FRAME_BORDER: f64 = 8.0;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InputMode {
    Mouse,
    Finger,
}

/// Region fingertip positions are squeezed into.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RescaleArea {
    /// The 600x600 dot area in the middle of the screen.
    Dots,
    /// The projected game frame: half the screen wide, five sixths high,
    /// flush with the bottom edge.
    Board,
}

impl RescaleArea {
    pub fn area(self, screen: ScreenSize) -> GameArea {
        match self {
            RescaleArea::Dots => {
                GameArea::centered(screen, STANDARD_AREA_SIDE, STANDARD_AREA_SIDE)
            }
            RescaleArea::Board => GameArea::bottom_anchored(
                screen,
                screen.width / 2.0,
                screen.height * 5.0 / 6.0,
                BOARD_FRAME_BORDER,
            ),
        }
    }
}

/// Turns one tick's raw positional signal into a screen-space point.
/// `None` means "nothing to evaluate this tick".
pub trait InputNormalizer {
    fn normalize(&self, sample: Option<Point>) -> Option<Point>;
}

/// Mouse pixels are already in screen space.
#[derive(Debug, Clone, Copy, Default)]
pub struct MouseSource;

impl InputNormalizer for MouseSource {
    fn normalize(&self, sample: Option<Point>) -> Option<Point> {
        sample
    }
}

/// Camera-space fingertip pixels, mapped through the calibration and then
/// optionally squeezed into the game area.
#[derive(Debug, Clone)]
pub struct CameraSource {
    calibration: Option<CalibrationTransform>,
    screen: ScreenSize,
    game_area: Option<GameArea>,
}

impl CameraSource {
    pub fn new(calibration: Option<CalibrationTransform>, screen: ScreenSize) -> Self {
        Self {
            calibration,
            screen,
            game_area: None,
        }
    }

    pub fn with_game_area(mut self, area: GameArea) -> Self {
        self.game_area = Some(area);
        self
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibration.is_some()
    }

    fn rescale(&self, p: Point) -> Point {
        match self.game_area {
            Some(area) if area.width < self.screen.width => Point::new(
                p.x / self.screen.width * area.width + area.origin.x,
                p.y / self.screen.height * area.height + area.origin.y,
            ),
            _ => p,
        }
    }
}

impl InputNormalizer for CameraSource {
    fn normalize(&self, sample: Option<Point>) -> Option<Point> {
        let raw = sample?;
        let on_screen = map_point(self.calibration.as_ref(), raw, self.screen);
        Some(self.rescale(on_screen))
    }
}

/// The normalizer chosen once per session.
#[derive(Debug, Clone)]
pub enum InputSource {
    Mouse(MouseSource),
    Camera(CameraSource),
}

impl InputSource {
    pub fn mode(&self) -> InputMode {
        match self {
            InputSource::Mouse(_) => InputMode::Mouse,
            InputSource::Camera(_) => InputMode::Finger,
        }
    }
}

impl InputNormalizer for InputSource {
    fn normalize(&self, sample: Option<Point>) -> Option<Point> {
        match self {
            InputSource::Mouse(m) => m.normalize(sample),
            InputSource::Camera(c) => c.normalize(sample),
        }
    }
}
