// SPDX-License-Identifier: MIT OR Apache-2.0
//! Viewport math: client/flow transforms, zoom clamping and zoom-to-fit.
//!
//! Client space is the host's pixel space; flow space is the diagram's.
//! `flow = (client - translation) / scale`.

use crate::config::ZoomConfig;
use trellis_graph::{Point, Rect, Size, Viewport};

/// Convert a client position to flow coordinates
pub fn client_to_flow(viewport: &Viewport, client: Point) -> Point {
    Point::new(
        (client.x - viewport.x) / viewport.scale,
        (client.y - viewport.y) / viewport.scale,
    )
}

/// Convert a flow position to client coordinates
pub fn flow_to_client(viewport: &Viewport, flow: Point) -> Point {
    Point::new(flow.x * viewport.scale + viewport.x, flow.y * viewport.scale + viewport.y)
}

/// Convert a client-space distance to flow space
pub fn client_delta_to_flow(viewport: &Viewport, delta: Point) -> Point {
    delta * (1.0 / viewport.scale)
}

/// Clamp a scale into the configured range
pub fn clamp_scale(scale: f64, zoom: &ZoomConfig) -> f64 {
    if scale.is_finite() {
        scale.clamp(zoom.min, zoom.max)
    } else {
        zoom.min.max(1.0_f64.min(zoom.max))
    }
}

/// Same translation, clamped scale
pub fn clamped(viewport: Viewport, zoom: &ZoomConfig) -> Viewport {
    Viewport::new(viewport.x, viewport.y, clamp_scale(viewport.scale, zoom))
}

/// Translate by a client-space delta
pub fn pan(viewport: Viewport, delta: Point) -> Viewport {
    Viewport::new(viewport.x + delta.x, viewport.y + delta.y, viewport.scale)
}

/// Multiply the scale by `factor`, keeping the flow point under the client
/// position `pivot` fixed on screen
pub fn zoom_at(viewport: Viewport, factor: f64, pivot: Point, zoom: &ZoomConfig) -> Viewport {
    let scale = clamp_scale(viewport.scale * factor, zoom);
    let anchor = client_to_flow(&viewport, pivot);
    Viewport::new(pivot.x - anchor.x * scale, pivot.y - anchor.y * scale, scale)
}

/// Viewport that centers `bounds` inside a client area of `size`, leaving
/// `padding` pixels on every side; `None` when the area is unknown or empty
pub fn fit(bounds: Rect, size: Size, padding: f64, zoom: &ZoomConfig) -> Option<Viewport> {
    if !(size.width > 0.0 && size.height > 0.0) {
        return None;
    }
    let available = Size::new(
        (size.width - 2.0 * padding).max(1.0),
        (size.height - 2.0 * padding).max(1.0),
    );

    let fit_x = (bounds.width > 0.0).then(|| available.width / bounds.width);
    let fit_y = (bounds.height > 0.0).then(|| available.height / bounds.height);
    let scale = match (fit_x, fit_y) {
        (Some(x), Some(y)) => x.min(y),
        (Some(s), None) | (None, Some(s)) => s,
        (None, None) => 1.0,
    };
    let scale = clamp_scale(scale, zoom);

    let center = bounds.center();
    Some(Viewport::new(
        size.width / 2.0 - center.x * scale,
        size.height / 2.0 - center.y * scale,
        scale,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_roundtrip() {
        let viewport = Viewport::new(100.0, -50.0, 2.0);
        let flow = client_to_flow(&viewport, Point::new(300.0, 150.0));
        assert_eq!(flow, Point::new(100.0, 100.0));
        assert_eq!(flow_to_client(&viewport, flow), Point::new(300.0, 150.0));
        assert_eq!(client_delta_to_flow(&viewport, Point::new(10.0, 4.0)), Point::new(5.0, 2.0));
    }

    #[test]
    fn test_zoom_is_clamped() {
        let zoom = ZoomConfig::default();
        let zoomed = zoom_at(Viewport::default(), 1000.0, Point::ZERO, &zoom);
        assert_eq!(zoomed.scale, 10.0);
        let zoomed = zoom_at(Viewport::default(), 0.0001, Point::ZERO, &zoom);
        assert_eq!(zoomed.scale, 0.1);
        assert_eq!(clamp_scale(f64::NAN, &zoom), 1.0);
    }

    #[test]
    fn test_zoom_keeps_pivot_fixed() {
        let zoom = ZoomConfig::default();
        let viewport = Viewport::new(20.0, 10.0, 1.0);
        let pivot = Point::new(200.0, 100.0);
        let before = client_to_flow(&viewport, pivot);
        let zoomed = zoom_at(viewport, 2.0, pivot, &zoom);
        let after = client_to_flow(&zoomed, pivot);
        assert!(before.distance(after) < 1e-9);
    }

    #[test]
    fn test_fit_centers_bounds() {
        let zoom = ZoomConfig::default();
        let bounds = Rect::new(Point::new(0.0, 0.0), Size::new(400.0, 200.0));
        let viewport = fit(bounds, Size::new(1000.0, 800.0), 100.0, &zoom).unwrap();
        assert_eq!(viewport.scale, 2.0);
        assert_eq!(flow_to_client(&viewport, bounds.center()), Point::new(500.0, 400.0));
        assert!(fit(bounds, Size::new(0.0, 0.0), 0.0, &zoom).is_none());
    }
}
