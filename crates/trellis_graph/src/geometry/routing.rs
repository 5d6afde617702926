// SPDX-License-Identifier: MIT OR Apache-2.0
//! Edge routing strategies.
//!
//! Routing is a pure function of the two anchors (point + outward side) and a
//! strategy. Output is both the polyline/control points and SVG path data the
//! renderer can use verbatim.

use super::{Point, Side};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Points closer than this are treated as the same point
const EPSILON: f64 = 1e-9;

/// Edge routing strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Routing {
    /// Direct segment
    Straight,
    /// Cubic curve with control points along the port directions
    #[default]
    Bezier,
    /// Right-angle segments with rounded corners
    Orthogonal,
    /// Explicit waypoints, never recomputed
    Manual,
}

/// Whether the engine recomputes the edge's points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutingMode {
    /// Points are derived from the anchors on every change
    #[default]
    Auto,
    /// Points are owned by the user
    Manual,
}

/// Where an edge attaches and which way it leaves
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    /// Attachment point in flow coordinates
    pub point: Point,
    /// Side of the node the edge leaves from
    pub side: Side,
}

impl Anchor {
    /// Create a new anchor
    pub fn new(point: Point, side: Side) -> Self {
        Self { point, side }
    }
}

/// Tunables for the routing strategies
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingOptions {
    /// Length of the segment leaving/entering each port before the first turn
    pub first_last_segment_length: f64,
    /// Upper bound on orthogonal corner rounding
    pub max_corner_radius: f64,
    /// Distance of bezier control points from their endpoints
    pub bezier_control_offset: f64,
}

impl Default for RoutingOptions {
    fn default() -> Self {
        Self {
            first_last_segment_length: 20.0,
            max_corner_radius: 15.0,
            bezier_control_offset: 100.0,
        }
    }
}

/// Computed edge geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutedEdge {
    /// Polyline points, or `[start, control1, control2, end]` for bezier
    pub points: Vec<Point>,
    /// SVG path data
    pub path: String,
}

/// Route an edge between two anchors.
///
/// Returns `None` for [`Routing::Manual`]: manual points are never recomputed.
pub fn route(
    routing: Routing,
    source: Anchor,
    target: Anchor,
    options: &RoutingOptions,
) -> Option<RoutedEdge> {
    let routed = match routing {
        Routing::Straight => {
            let points = vec![source.point, target.point];
            RoutedEdge {
                path: polyline_path(&points),
                points,
            }
        }
        Routing::Bezier => {
            let points = bezier_points(source, target, options.bezier_control_offset);
            let mut path = String::new();
            let [p0, c1, c2, p3] = [points[0], points[1], points[2], points[3]];
            let _ = write!(
                path,
                "M {} {} C {} {} {} {} {} {}",
                p0.x, p0.y, c1.x, c1.y, c2.x, c2.y, p3.x, p3.y
            );
            RoutedEdge { points, path }
        }
        Routing::Orthogonal => {
            let points = orthogonal_points(source, target, options.first_last_segment_length);
            RoutedEdge {
                path: rounded_path(&points, options.max_corner_radius),
                points,
            }
        }
        Routing::Manual => return None,
    };
    Some(routed)
}

/// Control points for a cubic bezier leaving each anchor along its side
pub fn bezier_points(source: Anchor, target: Anchor, offset: f64) -> Vec<Point> {
    vec![
        source.point,
        source.point + source.side.outward() * offset,
        target.point + target.side.outward() * offset,
        target.point,
    ]
}

/// Right-angle polyline from `source` to `target`.
///
/// The second and second-to-last points sit exactly
/// `first_last_segment_length` away from the anchors along their sides.
pub fn orthogonal_points(source: Anchor, target: Anchor, first_last_segment_length: f64) -> Vec<Point> {
    let length = first_last_segment_length.max(0.0);
    let s_out = source.side.outward();
    let t_out = target.side.outward();
    let s1 = source.point + s_out * length;
    let t1 = target.point + t_out * length;

    let mut points = vec![source.point, s1];
    match (source.side.is_horizontal(), target.side.is_horizontal()) {
        (true, true) => {
            if source.side == target.side {
                let x = if source.side == Side::Right { s1.x.max(t1.x) } else { s1.x.min(t1.x) };
                points.extend([Point::new(x, s1.y), Point::new(x, t1.y)]);
            } else if (t1.x - s1.x) * s_out.x >= 0.0 {
                let mid = (s1.x + t1.x) / 2.0;
                points.extend([Point::new(mid, s1.y), Point::new(mid, t1.y)]);
            } else {
                let mid = (s1.y + t1.y) / 2.0;
                points.extend([Point::new(s1.x, mid), Point::new(t1.x, mid)]);
            }
        }
        (false, false) => {
            if source.side == target.side {
                let y = if source.side == Side::Bottom { s1.y.max(t1.y) } else { s1.y.min(t1.y) };
                points.extend([Point::new(s1.x, y), Point::new(t1.x, y)]);
            } else if (t1.y - s1.y) * s_out.y >= 0.0 {
                let mid = (s1.y + t1.y) / 2.0;
                points.extend([Point::new(s1.x, mid), Point::new(t1.x, mid)]);
            } else {
                let mid = (s1.x + t1.x) / 2.0;
                points.extend([Point::new(mid, s1.y), Point::new(mid, t1.y)]);
            }
        }
        (true, false) => {
            let corner = Point::new(t1.x, s1.y);
            if (corner.x - s1.x) * s_out.x >= 0.0 && (corner.y - t1.y) * t_out.y >= 0.0 {
                points.push(corner);
            } else {
                points.push(Point::new(s1.x, t1.y));
            }
        }
        (false, true) => {
            let corner = Point::new(s1.x, t1.y);
            if (corner.y - s1.y) * s_out.y >= 0.0 && (corner.x - t1.x) * t_out.x >= 0.0 {
                points.push(corner);
            } else {
                points.push(Point::new(t1.x, s1.y));
            }
        }
    }
    points.extend([t1, target.point]);

    points.dedup_by(|a, b| a.distance(*b) < EPSILON);
    points
}

/// Radius actually used at each interior point of a polyline.
///
/// A corner is rounded up to `max_radius`, clamped to half of each adjacent
/// segment so neighbouring arcs never overlap. Straight-through points get 0.
pub fn corner_radii(points: &[Point], max_radius: f64) -> Vec<f64> {
    if points.len() < 3 {
        return Vec::new();
    }
    points
        .windows(3)
        .map(|w| {
            let (prev, corner, next) = (w[0], w[1], w[2]);
            if is_straight_through(prev, corner, next) {
                return 0.0;
            }
            let half_in = prev.distance(corner) / 2.0;
            let half_out = corner.distance(next) / 2.0;
            max_radius.max(0.0).min(half_in).min(half_out)
        })
        .collect()
}

/// SVG path for a polyline with straight segments only
pub fn polyline_path(points: &[Point]) -> String {
    let mut path = String::new();
    for (i, p) in points.iter().enumerate() {
        let cmd = if i == 0 { 'M' } else { 'L' };
        if i > 0 {
            path.push(' ');
        }
        let _ = write!(path, "{cmd} {} {}", p.x, p.y);
    }
    path
}

/// SVG path for a polyline whose corners are rounded with quadratic arcs
pub fn rounded_path(points: &[Point], max_radius: f64) -> String {
    let radii = corner_radii(points, max_radius);
    if radii.iter().all(|r| *r <= 0.0) {
        return polyline_path(points);
    }

    let mut path = String::new();
    let Some(first) = points.first() else {
        return path;
    };
    let _ = write!(path, "M {} {}", first.x, first.y);

    for (i, radius) in radii.iter().enumerate() {
        let (prev, corner, next) = (points[i], points[i + 1], points[i + 2]);
        if *radius <= 0.0 {
            let _ = write!(path, " L {} {}", corner.x, corner.y);
            continue;
        }
        let start = corner + unit(prev - corner) * *radius;
        let end = corner + unit(next - corner) * *radius;
        let _ = write!(
            path,
            " L {} {} Q {} {} {} {}",
            start.x, start.y, corner.x, corner.y, end.x, end.y
        );
    }

    if let Some(last) = points.last() {
        let _ = write!(path, " L {} {}", last.x, last.y);
    }
    path
}

fn unit(v: Point) -> Point {
    let len = v.length();
    if len < EPSILON {
        Point::ZERO
    } else {
        v * (1.0 / len)
    }
}

fn is_straight_through(prev: Point, corner: Point, next: Point) -> bool {
    let a = corner - prev;
    let b = next - corner;
    let cross = a.x * b.y - a.y * b.x;
    let dot = a.x * b.x + a.y * b.y;
    cross.abs() < EPSILON && dot >= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchor(x: f64, y: f64, side: Side) -> Anchor {
        Anchor::new(Point::new(x, y), side)
    }

    #[test]
    fn test_straight_route() {
        let routed = route(
            Routing::Straight,
            anchor(0.0, 0.0, Side::Right),
            anchor(100.0, 50.0, Side::Left),
            &RoutingOptions::default(),
        )
        .unwrap();
        assert_eq!(routed.points, vec![Point::new(0.0, 0.0), Point::new(100.0, 50.0)]);
        assert_eq!(routed.path, "M 0 0 L 100 50");
    }

    #[test]
    fn test_bezier_control_points_follow_port_direction() {
        let options = RoutingOptions {
            bezier_control_offset: 40.0,
            ..Default::default()
        };
        let routed = route(
            Routing::Bezier,
            anchor(0.0, 0.0, Side::Right),
            anchor(200.0, 0.0, Side::Left),
            &options,
        )
        .unwrap();
        assert_eq!(routed.points[1], Point::new(40.0, 0.0));
        assert_eq!(routed.points[2], Point::new(160.0, 0.0));
        assert_eq!(routed.path, "M 0 0 C 40 0 160 0 200 0");
    }

    #[test]
    fn test_manual_routing_is_not_recomputed() {
        let routed = route(
            Routing::Manual,
            anchor(0.0, 0.0, Side::Right),
            anchor(10.0, 10.0, Side::Left),
            &RoutingOptions::default(),
        );
        assert!(routed.is_none());
    }

    #[test]
    fn test_orthogonal_first_last_segments() {
        // Two bottom ports 200px apart
        let points = orthogonal_points(anchor(0.0, 0.0, Side::Bottom), anchor(200.0, 0.0, Side::Bottom), 30.0);
        assert_eq!(
            points,
            vec![
                Point::new(0.0, 0.0),
                Point::new(0.0, 30.0),
                Point::new(200.0, 30.0),
                Point::new(200.0, 0.0),
            ]
        );
        assert_eq!(points[0].distance(points[1]), 30.0);
        let n = points.len();
        assert_eq!(points[n - 2].distance(points[n - 1]), 30.0);
    }

    #[test]
    fn test_orthogonal_opposite_ports_turn_at_midpoint() {
        let points = orthogonal_points(anchor(0.0, 0.0, Side::Right), anchor(200.0, 100.0, Side::Left), 30.0);
        assert_eq!(points[1], Point::new(30.0, 0.0));
        assert_eq!(points[2], Point::new(100.0, 0.0));
        assert_eq!(points[3], Point::new(100.0, 100.0));
        assert_eq!(points[4], Point::new(170.0, 100.0));
        for w in points.windows(2) {
            assert!(w[0].x == w[1].x || w[0].y == w[1].y, "segment is not axis aligned");
        }
    }

    #[test]
    fn test_orthogonal_backwards_target_goes_around() {
        let points = orthogonal_points(anchor(0.0, 0.0, Side::Right), anchor(-100.0, 80.0, Side::Left), 20.0);
        assert_eq!(points[1], Point::new(20.0, 0.0));
        // Turns vertically first instead of doubling back over the source
        assert_eq!(points[2], Point::new(20.0, 40.0));
    }

    #[test]
    fn test_corner_radius_clamped_by_short_segments() {
        let points = vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 10.0),
            Point::new(100.0, 10.0),
            Point::new(100.0, 100.0),
        ];
        let radii = corner_radii(&points, 15.0);
        assert_eq!(radii, vec![5.0, 15.0]);
    }

    #[test]
    fn test_collinear_points_are_not_rounded() {
        let points = vec![Point::new(0.0, 0.0), Point::new(30.0, 0.0), Point::new(100.0, 0.0)];
        assert_eq!(corner_radii(&points, 15.0), vec![0.0]);
        assert_eq!(rounded_path(&points, 15.0), "M 0 0 L 30 0 L 100 0");
    }

    #[test]
    fn test_rounded_path_uses_quadratic_corners() {
        let points = vec![Point::new(0.0, 0.0), Point::new(0.0, 40.0), Point::new(40.0, 40.0)];
        assert_eq!(rounded_path(&points, 10.0), "M 0 0 L 0 30 Q 0 40 10 40 L 40 40");
    }
}
