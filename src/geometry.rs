use serde::{Deserialize, Serialize};

/// A position in pixels. Used for both camera space and screen space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_squared(&self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Point {
    fn from(v: (f64, f64)) -> Self {
        Point { x: v.0, y: v.1 }
    }
}

impl From<Point> for (f64, f64) {
    fn from(p: Point) -> Self {
        (p.x, p.y)
    }
}

/// Canonical screen extent; screen space runs from (0, 0) to (width, height).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenSize {
    pub width: f64,
    pub height: f64,
}

impl ScreenSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Both extents finite and positive.
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    /// Pull a point back onto the canvas, each axis independently.
    pub fn clamp(&self, p: Point) -> Point {
        let clamp_axis = |v: f64, max: f64| {
            if v.is_nan() {
                0.0
            } else {
                v.min(max).max(0.0)
            }
        };
        Point::new(clamp_axis(p.x, self.width), clamp_axis(p.y, self.height))
    }

    pub fn contains(&self, p: Point) -> bool {
        (0.0..=self.width).contains(&p.x) && (0.0..=self.height).contains(&p.y)
    }
}

/// Sub-rectangle of the screen the game is drawn into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GameArea {
    pub origin: Point,
    pub width: f64,
    pub height: f64,
}

impl GameArea {
    pub fn centered(screen: ScreenSize, width: f64, height: f64) -> Self {
        Self {
            origin: Point::new(
                (screen.width - width) / 2.0,
                (screen.height - height) / 2.0,
            ),
            width,
            height,
        }
    }

    /// Horizontally centered, pushed down so the lower border sits below the
    /// visible edge of the screen.
    pub fn bottom_anchored(screen: ScreenSize, width: f64, height: f64, border: f64) -> Self {
        Self {
            origin: Point::new(
                (screen.width - width) / 2.0,
                screen.height - height + border,
            ),
            width,
            height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_squared_is_symmetric() {
        let a = Point::new(1.0, 2.0);
        let b = Point::new(4.0, 6.0);
        assert_eq!(a.distance_squared(b), 25.0);
        assert_eq!(b.distance_squared(a), 25.0);
    }

    #[test]
    fn clamp_pulls_each_axis_independently() {
        let screen = ScreenSize::new(100.0, 50.0);
        assert_eq!(screen.clamp(Point::new(-5.0, 20.0)), Point::new(0.0, 20.0));
        assert_eq!(screen.clamp(Point::new(30.0, 80.0)), Point::new(30.0, 50.0));
        assert_eq!(
            screen.clamp(Point::new(f64::INFINITY, f64::NEG_INFINITY)),
            Point::new(100.0, 0.0)
        );
    }

    #[test]
    fn degenerate_screens_are_invalid_and_never_panic() {
        assert!(ScreenSize::new(1792.0, 1008.0).is_valid());
        for bad in [
            ScreenSize::new(-1.0, 1008.0),
            ScreenSize::new(1792.0, 0.0),
            ScreenSize::new(f64::NAN, 10.0),
            ScreenSize::new(f64::INFINITY, 10.0),
        ] {
            assert!(!bad.is_valid());
            let p = bad.clamp(Point::new(10.0, 10.0));
            assert!(p.x >= 0.0 && p.y >= 0.0);
        }
    }

    #[test]
    fn game_area_placement() {
        let screen = ScreenSize::new(1792.0, 1008.0);
        let centered = GameArea::centered(screen, 600.0, 600.0);
        assert_eq!(centered.origin, Point::new(596.0, 204.0));

        let anchored = GameArea::bottom_anchored(screen, 896.0, 840.0, 8.0);
        assert_eq!(anchored.origin, Point::new(448.0, 176.0));
    }

    #[test]
    fn tuple_conversions() {
        let p: Point = (3.0, 4.0).into();
        let back: (f64, f64) = p.into();
        assert_eq!(back, (3.0, 4.0));
    }
}
