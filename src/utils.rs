//! Coordinate helpers shared by the drawing and extraction code.

pub mod safe_cast;

use opencv::core::Point;
use safe_cast::f64_to_i32_clamp;

/// Nearest pixel to a sub-pixel position, clamped to `[0, width) x [0, height)`
///
/// An empty extent clamps to the origin.
#[must_use]
pub fn pixel_point(x: f64, y: f64, width: i32, height: i32) -> Point {
    Point::new(
        f64_to_i32_clamp(x, 0, (width - 1).max(0)),
        f64_to_i32_clamp(y, 0, (height - 1).max(0)),
    )
}
