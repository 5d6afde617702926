// SPDX-License-Identifier: MIT OR Apache-2.0
//! Geometry primitives and the pure geometry engine.
//!
//! - [`routing`]: edge path computation (straight, bezier, orthogonal, manual)
//! - [`snapping`]: rotation, drag and resize quantization
//!
//! All coordinates are flow-space `f64` unless a function says otherwise.

pub mod routing;
pub mod snapping;

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// A point (or vector) in 2D space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate
    pub y: f64,
}

impl Point {
    /// The origin
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Create a new point
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(self, other: Point) -> f64 {
        (other - self).length()
    }

    /// Length of this point treated as a vector
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Whether both coordinates are finite
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Rotate around `origin` by `degrees` (clockwise in screen space)
    pub fn rotate_around(self, origin: Point, degrees: f64) -> Point {
        if degrees == 0.0 {
            return self;
        }
        let (sin, cos) = degrees.to_radians().sin_cos();
        let d = self - origin;
        Point::new(
            origin.x + d.x * cos - d.y * sin,
            origin.y + d.x * sin + d.y * cos,
        )
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

/// Width and height
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    /// Horizontal extent
    pub width: f64,
    /// Vertical extent
    pub height: f64,
}

impl Size {
    /// Create a new size
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Whether both extents are finite and non-negative
    pub fn is_valid(self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width >= 0.0 && self.height >= 0.0
    }
}

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub x: f64,
    /// Top edge
    pub y: f64,
    /// Horizontal extent
    pub width: f64,
    /// Vertical extent
    pub height: f64,
}

impl Rect {
    /// Create a rectangle from its origin and size
    pub fn new(origin: Point, size: Size) -> Self {
        Self {
            x: origin.x,
            y: origin.y,
            width: size.width,
            height: size.height,
        }
    }

    /// Smallest rectangle containing both corner points
    pub fn from_corners(a: Point, b: Point) -> Self {
        let min_x = a.x.min(b.x);
        let min_y = a.y.min(b.y);
        Self {
            x: min_x,
            y: min_y,
            width: a.x.max(b.x) - min_x,
            height: a.y.max(b.y) - min_y,
        }
    }

    /// Top-left corner
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Extent
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Right edge
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Center point
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Check whether a point lies inside (edges inclusive)
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// Smallest rectangle containing both
    pub fn union(&self, other: &Rect) -> Rect {
        Rect::from_corners(
            Point::new(self.x.min(other.x), self.y.min(other.y)),
            Point::new(self.right().max(other.right()), self.bottom().max(other.bottom())),
        )
    }

    /// Grow the rectangle by `padding` on every side
    pub fn expand(&self, padding: f64) -> Rect {
        Rect {
            x: self.x - padding,
            y: self.y - padding,
            width: self.width + padding * 2.0,
            height: self.height + padding * 2.0,
        }
    }

    /// Axis-aligned bounds of this rectangle rotated around its center
    pub fn rotated_bounds(&self, degrees: f64) -> Rect {
        if degrees.rem_euclid(360.0) == 0.0 {
            return *self;
        }
        let center = self.center();
        let corners = [
            Point::new(self.x, self.y),
            Point::new(self.right(), self.y),
            Point::new(self.right(), self.bottom()),
            Point::new(self.x, self.bottom()),
        ]
        .map(|c| c.rotate_around(center, degrees));

        bounding_box(corners).unwrap_or(*self)
    }
}

/// Smallest rectangle containing all points, or `None` for an empty input
pub fn bounding_box(points: impl IntoIterator<Item = Point>) -> Option<Rect> {
    let mut iter = points.into_iter();
    let first = iter.next()?;
    let (mut min, mut max) = (first, first);
    for p in iter {
        min = Point::new(min.x.min(p.x), min.y.min(p.y));
        max = Point::new(max.x.max(p.x), max.y.max(p.y));
    }
    Some(Rect::from_corners(min, max))
}

/// Which side of a node a port sits on; doubles as the outward direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Facing up
    Top,
    /// Facing right
    #[default]
    Right,
    /// Facing down
    Bottom,
    /// Facing left
    Left,
}

impl Side {
    /// Unit vector pointing away from the node
    pub fn outward(self) -> Point {
        match self {
            Self::Top => Point::new(0.0, -1.0),
            Self::Right => Point::new(1.0, 0.0),
            Self::Bottom => Point::new(0.0, 1.0),
            Self::Left => Point::new(-1.0, 0.0),
        }
    }

    /// Whether the outward direction is horizontal
    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }

    /// The side facing the other way
    pub fn opposite(self) -> Side {
        match self {
            Self::Top => Self::Bottom,
            Self::Right => Self::Left,
            Self::Bottom => Self::Top,
            Self::Left => Self::Right,
        }
    }

    /// The side of `from` that faces `toward` most directly
    pub fn facing(from: Point, toward: Point) -> Side {
        let d = toward - from;
        if d.x.abs() >= d.y.abs() {
            if d.x >= 0.0 {
                Self::Right
            } else {
                Self::Left
            }
        } else if d.y >= 0.0 {
            Self::Bottom
        } else {
            Self::Top
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_union_and_expand() {
        let a = Rect::new(Point::new(0.0, 0.0), Size::new(10.0, 10.0));
        let b = Rect::new(Point::new(20.0, 5.0), Size::new(10.0, 20.0));
        let u = a.union(&b);
        assert_eq!(u, Rect::new(Point::new(0.0, 0.0), Size::new(30.0, 25.0)));
        assert_eq!(u.expand(5.0), Rect::new(Point::new(-5.0, -5.0), Size::new(40.0, 35.0)));
    }

    #[test]
    fn test_rotated_bounds_quarter_turn() {
        let r = Rect::new(Point::new(0.0, 0.0), Size::new(40.0, 20.0));
        let rotated = r.rotated_bounds(90.0);
        assert!((rotated.width - 20.0).abs() < 1e-9);
        assert!((rotated.height - 40.0).abs() < 1e-9);
        assert!(rotated.center().distance(r.center()) < 1e-9);
    }

    #[test]
    fn test_side_facing() {
        let origin = Point::ZERO;
        assert_eq!(Side::facing(origin, Point::new(10.0, 2.0)), Side::Right);
        assert_eq!(Side::facing(origin, Point::new(-10.0, 2.0)), Side::Left);
        assert_eq!(Side::facing(origin, Point::new(1.0, -20.0)), Side::Top);
        assert_eq!(Side::facing(origin, Point::new(1.0, 20.0)), Side::Bottom);
    }
}
