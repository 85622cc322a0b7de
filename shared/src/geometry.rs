//! Path geometry for drawing gestures
//!
//! Everything here is pure: no state is carried between calls, so the same
//! inputs always produce the same path.

use crate::limits::CIRCLE_STEPS;
use std::f64::consts::PI;

/// A point on a synthesized pointer path, in screen space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathPoint {
    pub x: f64,
    pub y: f64,
}

impl PathPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Integer pointer location as reported by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Rectangular screen area, origin at the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

/// Compute the `draw_circle` path: `CIRCLE_STEPS` points in angular order
/// starting at angle 0.
///
/// Radius is not validated. A negative radius mirrors the circle through the
/// center and a zero radius collapses every point onto the center. NaN and
/// infinite inputs propagate into the output.
pub fn circle_path(radius: f64, center_x: f64, center_y: f64) -> Vec<PathPoint> {
    circle_path_with_steps(radius, center_x, center_y, CIRCLE_STEPS)
}

/// Circle path with an explicit angular resolution
pub fn circle_path_with_steps(
    radius: f64,
    center_x: f64,
    center_y: f64,
    steps: usize,
) -> Vec<PathPoint> {
    (0..steps)
        .map(|i| {
            let angle = 2.0 * PI * i as f64 / steps as f64;
            PathPoint::new(
                center_x + radius * angle.cos(),
                center_y + radius * angle.sin(),
            )
        })
        .collect()
}

/// Outline of a rectangle anchored at `origin`, ending back on it.
///
/// The outline goes right by `width`, up by `height`, back left, then down to
/// the starting corner.
pub fn rectangle_path(origin: Point, height: i32, width: i32) -> [PathPoint; 4] {
    let x = origin.x as f64;
    let y = origin.y as f64;
    let w = width as f64;
    let h = height as f64;

    [
        PathPoint::new(x + w, y),
        PathPoint::new(x + w, y - h),
        PathPoint::new(x, y - h),
        PathPoint::new(x, y),
    ]
}

/// Square region of side `side` centered on `center`.
///
/// The corner saturates at the edge of the coordinate space.
pub fn capture_region(center: Point, side: u32) -> Region {
    let half = i32::try_from(side / 2).unwrap_or(i32::MAX);
    Region {
        left: center.x.saturating_sub(half),
        top: center.y.saturating_sub(half),
        width: side,
        height: side,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_circle_has_fixed_resolution() {
        assert_eq!(circle_path(10.0, 0.0, 0.0).len(), 314);
        assert_eq!(circle_path(5000.0, 20.0, 30.0).len(), 314);
        assert_eq!(circle_path(0.5, 20.0, 30.0).len(), 314);
    }

    #[test]
    fn test_circle_starts_at_angle_zero() {
        let path = circle_path(50.0, 100.0, 200.0);
        assert!(approx_eq(path[0].x, 150.0));
        assert!(approx_eq(path[0].y, 200.0));
    }

    #[test]
    fn test_circle_quarter_turn() {
        // 314 is not divisible by 4, so check the exact formula instead
        let path = circle_path(10.0, 0.0, 0.0);
        let angle = 2.0 * PI * 78.0 / 314.0;
        assert!(approx_eq(path[78].x, 10.0 * angle.cos()));
        assert!(approx_eq(path[78].y, 10.0 * angle.sin()));
        assert!(path[78].y > 9.9);
    }

    #[test]
    fn test_circle_points_in_increasing_angle() {
        let path = circle_path(25.0, 0.0, 0.0);
        let mut last = -1.0;
        for p in &path {
            let mut angle = p.y.atan2(p.x);
            if angle < 0.0 {
                angle += 2.0 * PI;
            }
            assert!(angle > last, "angle {} not after {}", angle, last);
            last = angle;
        }
    }

    #[test]
    fn test_circle_is_deterministic() {
        assert_eq!(circle_path(33.0, 7.0, 9.0), circle_path(33.0, 7.0, 9.0));
    }

    #[test]
    fn test_zero_radius_collapses_to_center() {
        let path = circle_path(0.0, 12.0, 34.0);
        assert!(path.iter().all(|p| *p == PathPoint::new(12.0, 34.0)));
    }

    #[test]
    fn test_negative_radius_mirrors() {
        let pos = circle_path(10.0, 0.0, 0.0);
        let neg = circle_path(-10.0, 0.0, 0.0);
        for (a, b) in pos.iter().zip(neg.iter()) {
            assert!(approx_eq(a.x, -b.x));
            assert!(approx_eq(a.y, -b.y));
        }
    }

    #[test]
    fn test_nan_propagates() {
        let path = circle_path(f64::NAN, 0.0, 0.0);
        assert_eq!(path.len(), 314);
        assert!(path.iter().all(|p| p.x.is_nan() && p.y.is_nan()));
    }

    #[test]
    fn test_custom_steps() {
        assert!(circle_path_with_steps(1.0, 0.0, 0.0, 0).is_empty());
        let square = circle_path_with_steps(1.0, 0.0, 0.0, 4);
        assert_eq!(square.len(), 4);
        assert!(approx_eq(square[2].x, -1.0));
    }

    #[test]
    fn test_rectangle_outline() {
        let path = rectangle_path(Point::new(10, 100), 30, 50);
        assert_eq!(
            path,
            [
                PathPoint::new(60.0, 100.0),
                PathPoint::new(60.0, 70.0),
                PathPoint::new(10.0, 70.0),
                PathPoint::new(10.0, 100.0),
            ]
        );
    }

    #[test]
    fn test_capture_region_centered() {
        let region = capture_region(Point::new(300, 300), 200);
        assert_eq!(
            region,
            Region {
                left: 200,
                top: 200,
                width: 200,
                height: 200
            }
        );
    }

    #[test]
    fn test_capture_region_saturates_at_edge() {
        let region = capture_region(Point::new(i32::MIN, i32::MIN), 200);
        assert_eq!(region.left, i32::MIN);
        assert_eq!(region.top, i32::MIN);
        assert_eq!(region.width, 200);

        let region = capture_region(Point::new(i32::MIN + 50, 0), u32::MAX);
        assert_eq!(region.left, i32::MIN);
        assert_eq!(region.top, -(i32::MAX));
    }
}
