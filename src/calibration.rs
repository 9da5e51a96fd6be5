//! Camera-to-screen perspective calibration.
//!
//! Four corners of the projected screen are picked in the camera image in the
//! order top-left, top-right, bottom-right, bottom-left. The planar homography
//! that sends them onto the screen rectangle is used to map every fingertip
//! position afterwards. Without a calibration, points pass through unchanged.

use log::{info, warn};
use nalgebra::{SMatrix, SVector};
use serde::{Deserialize, Serialize};

use crate::error::CalibrationError;
use crate::geometry::{Point, ScreenSize};

pub const CORNER_COUNT: usize = 4;

/// Perspective denominators smaller than this are treated as points at infinity.
const MIN_W: f64 = 1e-12;

/// Row-major 3×3 homography with h33 normalized to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationTransform {
    matrix: [[f64; 3]; 3],
}

impl CalibrationTransform {
    pub fn from_matrix(matrix: [[f64; 3]; 3]) -> Self {
        Self { matrix }
    }

    pub fn identity() -> Self {
        Self::from_matrix([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]])
    }

    pub fn matrix(&self) -> [[f64; 3]; 3] {
        self.matrix
    }

    /// Solve the homography mapping `corners` onto the screen rectangle
    /// `(0,0) (w,0) (w,h) (0,h)`, in the same winding order.
    pub fn compute(corners: &[Point], screen: ScreenSize) -> Result<Self, CalibrationError> {
        if corners.len() != CORNER_COUNT {
            return Err(CalibrationError::CornerCount { got: corners.len() });
        }
        if corners.iter().any(|p| !p.is_finite()) {
            return Err(CalibrationError::NonFinite);
        }
        if has_collinear_triple(corners) {
            return Err(CalibrationError::Degenerate);
        }

        let targets = screen_corners(screen);
        let mut a = SMatrix::<f64, 8, 8>::zeros();
        let mut b = SVector::<f64, 8>::zeros();

        for (i, (src, dst)) in corners.iter().zip(targets.iter()).enumerate() {
            let (x, y) = (src.x, src.y);
            let (u, v) = (dst.x, dst.y);
            let r = 2 * i;

            a[(r, 0)] = x;
            a[(r, 1)] = y;
            a[(r, 2)] = 1.0;
            a[(r, 6)] = -u * x;
            a[(r, 7)] = -u * y;
            b[r] = u;

            a[(r + 1, 3)] = x;
            a[(r + 1, 4)] = y;
            a[(r + 1, 5)] = 1.0;
            a[(r + 1, 6)] = -v * x;
            a[(r + 1, 7)] = -v * y;
            b[r + 1] = v;
        }

        let h = a.lu().solve(&b).ok_or(CalibrationError::Degenerate)?;
        if h.iter().any(|v| !v.is_finite()) {
            return Err(CalibrationError::Degenerate);
        }

        Ok(Self::from_matrix([
            [h[0], h[1], h[2]],
            [h[3], h[4], h[5]],
            [h[6], h[7], 1.0],
        ]))
    }

    /// Raw projection, without clamping.
    pub fn project(&self, p: Point) -> Point {
        let m = &self.matrix;
        let x = m[0][0] * p.x + m[0][1] * p.y + m[0][2];
        let y = m[1][0] * p.x + m[1][1] * p.y + m[1][2];
        let mut w = m[2][0] * p.x + m[2][1] * p.y + m[2][2];
        if w.abs() < MIN_W {
            w = MIN_W.copysign(w);
        }
        Point::new(x / w, y / w)
    }

    /// Project and clamp onto the visible canvas.
    pub fn apply(&self, p: Point, screen: ScreenSize) -> Point {
        screen.clamp(self.project(p))
    }
}

/// Map a raw point through an optional transform. Absent means identity.
pub fn map_point(transform: Option<&CalibrationTransform>, raw: Point, screen: ScreenSize) -> Point {
    match transform {
        Some(t) => t.apply(raw, screen),
        None => raw,
    }
}

fn screen_corners(screen: ScreenSize) -> [Point; CORNER_COUNT] {
    [
        Point::new(0.0, 0.0),
        Point::new(screen.width, 0.0),
        Point::new(screen.width, screen.height),
        Point::new(0.0, screen.height),
    ]
}

fn has_collinear_triple(points: &[Point]) -> bool {
    let scale = points
        .iter()
        .flat_map(|p| [p.x.abs(), p.y.abs()])
        .fold(1.0_f64, f64::max);
    let eps = 1e-9 * scale * scale;

    for i in 0..points.len() {
        for j in (i + 1)..points.len() {
            for k in (j + 1)..points.len() {
                let (a, b, c) = (points[i], points[j], points[k]);
                let cross = (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x);
                if cross.abs() <= eps {
                    return true;
                }
            }
        }
    }
    false
}

/// The 4 camera-space corners together with the transform they produced.
/// This is the value handed to the rest of the system and persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    pub corners: [Point; CORNER_COUNT],
    pub transform: CalibrationTransform,
}

/// Holds the current calibration, if any.
#[derive(Debug, Clone)]
pub struct Calibrator {
    screen: ScreenSize,
    current: Option<Calibration>,
}

impl Calibrator {
    pub fn new(screen: ScreenSize) -> Self {
        Self {
            screen,
            current: None,
        }
    }

    pub fn with_calibration(screen: ScreenSize, calibration: Option<Calibration>) -> Self {
        Self {
            screen,
            current: calibration,
        }
    }

    /// Replace the calibration with one computed from `clicked`. On failure
    /// the previous calibration stays in place.
    pub fn calibrate(&mut self, clicked: &[Point]) -> Result<Calibration, CalibrationError> {
        match CalibrationTransform::compute(clicked, self.screen) {
            Ok(transform) => {
                let mut corners = [Point::default(); CORNER_COUNT];
                corners.copy_from_slice(clicked);
                let calibration = Calibration { corners, transform };
                self.current = Some(calibration);
                info!("calibration completed from corners {:?}", corners);
                Ok(calibration)
            }
            Err(e) => {
                warn!("calibration aborted: {}", e);
                Err(e)
            }
        }
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn calibration(&self) -> Option<&Calibration> {
        self.current.as_ref()
    }

    pub fn transform(&self) -> Option<&CalibrationTransform> {
        self.current.as_ref().map(|c| &c.transform)
    }

    pub fn screen(&self) -> ScreenSize {
        self.screen
    }

    pub fn map(&self, raw: Point) -> Point {
        map_point(self.transform(), raw, self.screen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const TOLERANCE: f64 = 1e-6;

    fn screen() -> ScreenSize {
        ScreenSize::new(1792.0, 1008.0)
    }

    fn skewed_corners() -> Vec<Point> {
        vec![
            Point::new(102.0, 81.0),
            Point::new(538.0, 63.0),
            Point::new(601.0, 422.0),
            Point::new(48.0, 397.0),
        ]
    }

    fn assert_close(a: Point, b: Point) {
        assert!(
            (a.x - b.x).abs() < TOLERANCE && (a.y - b.y).abs() < TOLERANCE,
            "{a:?} != {b:?}"
        );
    }

    #[test]
    fn corners_map_onto_screen_corners() {
        let corners = skewed_corners();
        let t = CalibrationTransform::compute(&corners, screen()).unwrap();
        for (src, dst) in corners.iter().zip(screen_corners(screen()).iter()) {
            assert_close(t.apply(*src, screen()), *dst);
        }
    }

    #[test]
    fn axis_aligned_corners_give_pure_scaling() {
        let corners = vec![
            Point::new(0.0, 0.0),
            Point::new(640.0, 0.0),
            Point::new(640.0, 480.0),
            Point::new(0.0, 480.0),
        ];
        let t = CalibrationTransform::compute(&corners, ScreenSize::new(1920.0, 1080.0)).unwrap();
        let m = t.matrix();
        assert!((m[0][0] - 3.0).abs() < TOLERANCE);
        assert!((m[1][1] - 2.25).abs() < TOLERANCE);
        assert!(m[2][0].abs() < TOLERANCE && m[2][1].abs() < TOLERANCE);
        assert_close(t.project(Point::new(320.0, 240.0)), Point::new(960.0, 540.0));
    }

    #[test]
    fn points_outside_calibration_are_clamped() {
        let t = CalibrationTransform::compute(&skewed_corners(), screen()).unwrap();
        for raw in [
            Point::new(0.0, 0.0),
            Point::new(700.0, 10.0),
            Point::new(640.0, 480.0),
            Point::new(-300.0, 900.0),
            Point::new(5000.0, -5000.0),
        ] {
            let mapped = t.apply(raw, screen());
            assert!(screen().contains(mapped), "{raw:?} mapped to {mapped:?}");
        }
    }

    #[test]
    fn wrong_corner_count_is_refused() {
        let mut corners = skewed_corners();
        corners.pop();
        assert_eq!(
            CalibrationTransform::compute(&corners, screen()),
            Err(CalibrationError::CornerCount { got: 3 })
        );
        corners.extend(skewed_corners());
        assert_matches!(
            CalibrationTransform::compute(&corners, screen()),
            Err(CalibrationError::CornerCount { got: 7 })
        );
    }

    #[test]
    fn collinear_corners_are_degenerate() {
        let corners = vec![
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(200.0, 0.0),
            Point::new(0.0, 100.0),
        ];
        assert_eq!(
            CalibrationTransform::compute(&corners, screen()),
            Err(CalibrationError::Degenerate)
        );
    }

    #[test]
    fn non_finite_corners_are_refused() {
        let mut corners = skewed_corners();
        corners[2] = Point::new(f64::NAN, 4.0);
        assert_eq!(
            CalibrationTransform::compute(&corners, screen()),
            Err(CalibrationError::NonFinite)
        );
    }

    #[test]
    fn map_point_without_transform_is_identity() {
        let raw = Point::new(2500.0, -40.0);
        assert_eq!(map_point(None, raw, screen()), raw);
    }

    #[test]
    fn failed_calibration_keeps_previous_transform() {
        let mut calibrator = Calibrator::new(screen());
        let first = calibrator.calibrate(&skewed_corners()).unwrap();

        let three = &skewed_corners()[..3];
        assert_matches!(
            calibrator.calibrate(three),
            Err(CalibrationError::CornerCount { got: 3 })
        );
        assert_eq!(calibrator.calibration(), Some(&first));
    }

    #[test]
    fn calibrator_without_calibration_passes_through() {
        let calibrator = Calibrator::new(screen());
        assert!(calibrator.transform().is_none());
        assert_eq!(calibrator.map(Point::new(12.0, 34.0)), Point::new(12.0, 34.0));
    }

    #[test]
    fn calibration_serializes() {
        let mut calibrator = Calibrator::new(screen());
        let calibration = calibrator.calibrate(&skewed_corners()).unwrap();
        let json = serde_json::to_string(&calibration).unwrap();
        let back: Calibration = serde_json::from_str(&json).unwrap();
        assert_eq!(back.corners, calibration.corners);
    }
}
