// SPDX-License-Identifier: MIT OR Apache-2.0
//! Snapping: quantizing angles, positions and sizes to a step grid.

use super::{Point, Size};

/// Distance from a right angle at which a one-degree snap is nudged onto it
pub const RIGHT_ANGLE_NUDGE: f64 = 1.0;

/// How far past the nudge distance the raw angle may be and still be nudged
pub const RIGHT_ANGLE_TOLERANCE: f64 = 0.9;

/// Normalize an angle in degrees into `[0, 360)`
pub fn normalize_angle(degrees: f64) -> f64 {
    if !degrees.is_finite() {
        return 0.0;
    }
    let r = degrees.rem_euclid(360.0);
    // rem_euclid can round tiny negatives up to exactly 360; `+ 0.0` drops -0.0
    if r >= 360.0 {
        0.0
    } else {
        r + 0.0
    }
}

/// Snap a rotation angle (degrees) to multiples of `step`.
///
/// Small rotations below the first step resist snapping until the pointer is
/// within a threshold of that step, so a node does not jump away from 0° the
/// moment the user starts rotating. A non-positive `step` disables snapping.
/// The result is always in `[0, 360)`.
pub fn snap_angle(angle: f64, step: f64) -> f64 {
    if !angle.is_finite() {
        return 0.0;
    }
    if !step.is_finite() || step <= 0.0 {
        return normalize_angle(angle);
    }

    let n = (angle / step).round();
    if n == 0.0 && step > 1.0 {
        return 0.0;
    }

    let half = step / 2.0;
    let threshold = (half - 1.0).floor().max(1.0).min(half - 1.0);
    let magnitude = angle.abs();
    if magnitude < step && step - magnitude > threshold {
        return 0.0;
    }

    let mut snapped = n * step;
    if step == 1.0 {
        snapped = nudge_to_right_angle(angle, snapped);
    }
    normalize_angle(snapped)
}

fn nudge_to_right_angle(raw: f64, snapped: f64) -> f64 {
    let right = (snapped / 90.0).round() * 90.0;
    let off_by_one = ((snapped - right).abs() - RIGHT_ANGLE_NUDGE).abs() < f64::EPSILON;
    if off_by_one && (raw - right).abs() - RIGHT_ANGLE_NUDGE < RIGHT_ANGLE_TOLERANCE {
        right
    } else {
        snapped
    }
}

/// Round `value` to the nearest multiple of `step`; a non-positive step is a no-op
pub fn snap_to_step(value: f64, step: f64) -> f64 {
    if step.is_finite() && step > 0.0 {
        (value / step).round() * step + 0.0
    } else {
        value
    }
}

/// Snap a point (delta or position) per axis
pub fn snap_point(point: Point, step: Size) -> Point {
    Point::new(snap_to_step(point.x, step.width), snap_to_step(point.y, step.height))
}

/// Snap a size per axis, never going below `min`
pub fn snap_size(size: Size, step: Size, min: Size) -> Size {
    Size::new(
        snap_to_step(size.width, step.width).max(min.width),
        snap_to_step(size.height, step.height).max(min.height),
    )
}

/// Angle in degrees of `point` around `center`, with 0° pointing up and
/// increasing clockwise (screen coordinates, y down)
pub fn angle_around(center: Point, point: Point) -> f64 {
    let d = point - center;
    normalize_angle(d.x.atan2(-d.y).to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snap_angle_examples() {
        assert_eq!(snap_angle(13.0, 5.0), 15.0);
        assert_eq!(snap_angle(12.0, 5.0), 10.0);
        assert_eq!(snap_angle(-13.0, 5.0), 345.0);
        assert_eq!(snap_angle(0.4, 5.0), 0.0);
        assert_eq!(snap_angle(88.7, 1.0), 90.0);
    }

    #[test]
    fn test_snap_angle_zero_and_full_turn() {
        for step in [1.0, 5.0, 15.0, 45.0, 90.0] {
            assert_eq!(snap_angle(0.0, step), 0.0);
            assert_eq!(snap_angle(360.0, step), snap_angle(0.0, step));
        }
    }

    #[test]
    fn test_snap_angle_range() {
        let mut angle = -1080.0;
        while angle <= 1080.0 {
            for step in [1.0, 2.0, 5.0, 7.5, 15.0] {
                let snapped = snap_angle(angle, step);
                assert!((0.0..360.0).contains(&snapped), "{angle} / {step} -> {snapped}");
            }
            angle += 0.7;
        }
    }

    #[test]
    fn test_snap_angle_hysteresis_near_zero() {
        // 3 is more than the threshold away from 5: stays at rest
        assert_eq!(snap_angle(3.0, 5.0), 0.0);
        // 4 is within the threshold: commits to the first step
        assert_eq!(snap_angle(4.0, 5.0), 5.0);
        assert_eq!(snap_angle(-4.0, 5.0), 355.0);
    }

    #[test]
    fn test_snap_angle_disabled_step() {
        assert_eq!(snap_angle(-30.0, 0.0), 330.0);
        assert_eq!(snap_angle(f64::NAN, 5.0), 0.0);
    }

    #[test]
    fn test_right_angle_nudge_only_for_unit_step() {
        assert_eq!(snap_angle(91.2, 1.0), 90.0);
        assert_eq!(snap_angle(268.8, 1.0), 270.0);
        assert_eq!(snap_angle(45.2, 1.0), 45.0);
        assert_eq!(snap_angle(88.7, 2.0), 88.0);
    }

    #[test]
    fn test_snap_to_step() {
        assert_eq!(snap_to_step(14.0, 10.0), 10.0);
        assert_eq!(snap_to_step(15.0, 10.0), 20.0);
        assert_eq!(snap_to_step(-14.0, 10.0), -10.0);
        assert_eq!(snap_to_step(7.3, 0.0), 7.3);
    }

    #[test]
    fn test_snap_size_respects_minimum() {
        let snapped = snap_size(Size::new(3.0, 47.0), Size::new(10.0, 10.0), Size::new(10.0, 10.0));
        assert_eq!(snapped, Size::new(10.0, 50.0));
    }

    #[test]
    fn test_angle_around() {
        let c = Point::new(50.0, 50.0);
        assert_eq!(angle_around(c, Point::new(50.0, 0.0)), 0.0);
        assert!((angle_around(c, Point::new(100.0, 50.0)) - 90.0).abs() < 1e-9);
        assert!((angle_around(c, Point::new(50.0, 100.0)) - 180.0).abs() < 1e-9);
        assert!((angle_around(c, Point::new(0.0, 50.0)) - 270.0).abs() < 1e-9);
    }
}
