//! Geometric utility functions for distance calculations and spatial operations.

use geo::algorithm::Distance;
use geo::{Euclidean, Point, Rect, coord};

/// A position in the environment plane.
pub type Position = Point<f32>;

/// Builds the rectangle `[0, width] x [0, height]`.
pub fn extent(width: f32, height: f32) -> Rect<f32> {
    Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: width, y: height })
}

/// Euclidean distance between two positions.
pub fn get_distance(a: Position, b: Position) -> f32 {
    Euclidean.distance(a, b)
}

/// Returns the point of `rect` closest to `point`.
///
/// Points inside the rectangle map onto themselves.
pub fn closest_point_on_rect(point: Position, rect: &Rect<f32>) -> Position {
    let min = rect.min();
    let max = rect.max();
    Point::new(point.x().clamp(min.x, max.x), point.y().clamp(min.y, max.y))
}

/// Minimum Euclidean distance between `point` and any point of `rect`.
///
/// # Arguments
///
/// * `point` - Query position
/// * `rect` - Axis-aligned rectangle
///
/// # Returns
///
/// `0.0` when the point lies inside the rectangle, otherwise the distance to its boundary.
pub fn distance_to_rect(point: Position, rect: &Rect<f32>) -> f32 {
    get_distance(point, closest_point_on_rect(point, rect))
}

/// Checks whether `point` lies inside `rect`, edges included.
///
/// `NaN` coordinates are never contained.
pub fn contains_inclusive(rect: &Rect<f32>, point: Position) -> bool {
    let min = rect.min();
    let max = rect.max();
    point.x() >= min.x && point.x() <= max.x && point.y() >= min.y && point.y() <= max.y
}

/// Clamps a position into `rect`.
///
/// `NaN` coordinates collapse onto the rectangle's minimum corner.
pub fn clamp_to_rect(point: Position, rect: &Rect<f32>) -> Position {
    let min = rect.min();
    let x = if point.x().is_nan() { min.x } else { point.x() };
    let y = if point.y().is_nan() { min.y } else { point.y() };
    closest_point_on_rect(Point::new(x, y), rect)
}
