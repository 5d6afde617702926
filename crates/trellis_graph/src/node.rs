// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions.

use crate::geometry::routing::Anchor;
use crate::geometry::{Point, Rect, Side, Size};
use crate::port::{Port, PortId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a node
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    /// Create a new random node ID
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow the raw id
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn default_node_type() -> String {
    "default".to_string()
}

fn default_true() -> bool {
    true
}

/// A node instance in the diagram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique instance ID
    pub id: NodeId,
    /// Type discriminator, interpreted by the renderer
    #[serde(rename = "type", default = "default_node_type")]
    pub node_type: String,
    /// Top-left corner in flow coordinates
    #[serde(default)]
    pub position: Point,
    /// Measured or explicit size
    #[serde(default)]
    pub size: Option<Size>,
    /// Whether the renderer sizes the node from its content
    #[serde(default = "default_true")]
    pub auto_size: bool,
    /// Opaque payload
    #[serde(default)]
    pub data: Value,
    /// Rotation in degrees, `[0, 360)`
    #[serde(default)]
    pub rotation: f64,
    /// Whether resize handles apply
    #[serde(default = "default_true")]
    pub resizable: bool,
    /// Whether the rotate handle applies
    #[serde(default = "default_true")]
    pub rotatable: bool,
    /// Whether this node is a group container
    #[serde(default)]
    pub is_group: bool,
    /// Containing group, if any
    #[serde(default)]
    pub group_id: Option<NodeId>,
    /// Whether the node is part of the selection
    #[serde(default)]
    pub selected: bool,
    /// Stacking order
    #[serde(default)]
    pub z_index: i64,
    /// Attachment points
    #[serde(default)]
    pub ports: Vec<Port>,
}

impl Node {
    /// Create a new node at the origin
    pub fn new(id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            node_type: default_node_type(),
            position: Point::ZERO,
            size: None,
            auto_size: true,
            data: Value::Null,
            rotation: 0.0,
            resizable: true,
            rotatable: true,
            is_group: false,
            group_id: None,
            selected: false,
            z_index: 0,
            ports: Vec::new(),
        }
    }

    /// Create a new group node
    pub fn group(id: impl Into<NodeId>) -> Self {
        Self {
            node_type: "group".to_string(),
            is_group: true,
            ..Self::new(id)
        }
    }

    /// Set the position
    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.position = Point::new(x, y);
        self
    }

    /// Set an explicit size
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.size = Some(Size::new(width, height));
        self.auto_size = false;
        self
    }

    /// Place the node inside a group
    pub fn in_group(mut self, group_id: impl Into<NodeId>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    /// Attach a port
    pub fn with_port(mut self, port: Port) -> Self {
        self.ports.push(port);
        self
    }

    /// Set the payload
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    /// Set the stacking order
    pub fn with_z_index(mut self, z_index: i64) -> Self {
        self.z_index = z_index;
        self
    }

    /// Get a port by ID
    pub fn port(&self, port_id: &PortId) -> Option<&Port> {
        self.ports.iter().find(|p| p.id == *port_id)
    }

    /// Unrotated bounds; an unmeasured node is a point
    pub fn rect(&self) -> Rect {
        Rect::new(self.position, self.size.unwrap_or_default())
    }

    /// Axis-aligned bounds including rotation
    pub fn bounds(&self) -> Rect {
        self.rect().rotated_bounds(self.rotation)
    }

    /// Center point
    pub fn center(&self) -> Point {
        self.rect().center()
    }

    /// Anchor for an edge attached to `port_id`, in flow coordinates
    pub fn port_anchor(&self, port_id: &PortId) -> Option<Anchor> {
        let port = self.port(port_id)?;
        let rect = self.rect();
        let local = port.offset.unwrap_or_else(|| side_midpoint(rect.size(), port.side));
        let point = (self.position + local).rotate_around(rect.center(), self.rotation);
        Some(Anchor::new(point, rotate_side(port.side, self.rotation)))
    }

    /// Anchor for a floating edge end: the middle of the side facing `toward`
    pub fn floating_anchor(&self, toward: Point) -> Anchor {
        let rect = self.rect();
        let side = Side::facing(rect.center(), toward);
        Anchor::new(self.position + side_midpoint(rect.size(), side), side)
    }
}

fn side_midpoint(size: Size, side: Side) -> Point {
    match side {
        Side::Top => Point::new(size.width / 2.0, 0.0),
        Side::Right => Point::new(size.width, size.height / 2.0),
        Side::Bottom => Point::new(size.width / 2.0, size.height),
        Side::Left => Point::new(0.0, size.height / 2.0),
    }
}

/// Rotate a side by the nearest number of quarter turns
fn rotate_side(side: Side, degrees: f64) -> Side {
    let turns = (degrees / 90.0).round().rem_euclid(4.0) as u8;
    (0..turns).fold(side, |s, _| match s {
        Side::Top => Side::Right,
        Side::Right => Side::Bottom,
        Side::Bottom => Side::Left,
        Side::Left => Side::Top,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_anchor_defaults_to_side_midpoint() {
        let node = Node::new("a")
            .with_position(100.0, 100.0)
            .with_size(80.0, 40.0)
            .with_port(Port::new("out", Side::Right))
            .with_port(Port::new("in", Side::Left).with_offset(0.0, 10.0));

        let out = node.port_anchor(&"out".into()).unwrap();
        assert_eq!(out.point, Point::new(180.0, 120.0));
        assert_eq!(out.side, Side::Right);

        let input = node.port_anchor(&"in".into()).unwrap();
        assert_eq!(input.point, Point::new(100.0, 110.0));
        assert!(node.port_anchor(&"missing".into()).is_none());
    }

    #[test]
    fn test_port_anchor_follows_rotation() {
        let mut node = Node::new("a").with_size(100.0, 100.0).with_port(Port::new("out", Side::Right));
        node.rotation = 90.0;
        let anchor = node.port_anchor(&"out".into()).unwrap();
        assert_eq!(anchor.side, Side::Bottom);
        assert!(anchor.point.distance(Point::new(50.0, 100.0)) < 1e-9);
    }

    #[test]
    fn test_floating_anchor_faces_target() {
        let node = Node::new("a").with_size(100.0, 50.0);
        let anchor = node.floating_anchor(Point::new(500.0, 30.0));
        assert_eq!(anchor.side, Side::Right);
        assert_eq!(anchor.point, Point::new(100.0, 25.0));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let node: Node = serde_json::from_str(r#"{ "id": "n1", "isGroup": true }"#).unwrap();
        assert_eq!(node.id, NodeId::from("n1"));
        assert!(node.is_group);
        assert!(node.resizable);
        assert_eq!(node.node_type, "default");
    }
}
