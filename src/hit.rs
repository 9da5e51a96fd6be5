use crate::geometry::Point;
use crate::layout::Target;

/// Inclusive point-in-circle test; a point exactly on the rim counts.
pub fn is_hit(point: Point, target: &Target) -> bool {
    point.distance_squared(target.center) <= target.radius * target.radius
}
