// SPDX-License-Identifier: MIT OR Apache-2.0
//! Edge definitions for the diagram.

use crate::geometry::routing::{Routing, RoutingMode};
use crate::geometry::Point;
use crate::node::NodeId;
use crate::port::PortId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Unique identifier for an edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub String);

impl EdgeId {
    /// Create a new random edge ID
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow the raw id
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EdgeId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for EdgeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EdgeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A connection between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    /// Unique edge ID
    pub id: EdgeId,
    /// Source node ID
    pub source: NodeId,
    /// Target node ID
    pub target: NodeId,
    /// Source port; absent means the edge floats on the source node
    #[serde(default)]
    pub source_port: Option<PortId>,
    /// Target port; absent means the edge floats on the target node
    #[serde(default)]
    pub target_port: Option<PortId>,
    /// Routing strategy; `None` uses the configured default
    #[serde(default)]
    pub routing: Option<Routing>,
    /// Whether points are recomputed
    #[serde(default)]
    pub routing_mode: RoutingMode,
    /// Computed or user-provided waypoints
    #[serde(default)]
    pub points: Vec<Point>,
    /// SVG path data for the current points
    #[serde(default)]
    pub path: String,
    /// Opaque payload
    #[serde(default)]
    pub data: Value,
    /// Whether the edge is part of the selection
    #[serde(default)]
    pub selected: bool,
    /// Stacking order
    #[serde(default)]
    pub z_index: i64,
}

impl Edge {
    /// Create a new floating edge between two nodes
    pub fn new(id: impl Into<EdgeId>, source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            source_port: None,
            target_port: None,
            routing: None,
            routing_mode: RoutingMode::Auto,
            points: Vec::new(),
            path: String::new(),
            data: Value::Null,
            selected: false,
            z_index: 0,
        }
    }

    /// Attach the ends to ports
    pub fn with_ports(mut self, source_port: impl Into<PortId>, target_port: impl Into<PortId>) -> Self {
        self.source_port = Some(source_port.into());
        self.target_port = Some(target_port.into());
        self
    }

    /// Set the routing strategy
    pub fn with_routing(mut self, routing: Routing) -> Self {
        self.routing = Some(routing);
        self
    }

    /// Use explicit waypoints
    pub fn with_manual_points(mut self, points: Vec<Point>) -> Self {
        self.routing = Some(Routing::Manual);
        self.routing_mode = RoutingMode::Manual;
        self.points = points;
        self
    }

    /// Set the payload
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    /// Check if this edge involves a specific node
    pub fn involves_node(&self, node_id: &NodeId) -> bool {
        self.source == *node_id || self.target == *node_id
    }

    /// Whether the engine owns this edge's points
    pub fn is_auto_routed(&self) -> bool {
        self.routing_mode == RoutingMode::Auto && self.routing != Some(Routing::Manual)
    }
}

/// A not-yet-finalized edge shown while linking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporaryEdge {
    /// Node the link started from
    pub source: NodeId,
    /// Port the link started from
    pub source_port: Option<PortId>,
    /// Node currently hovered as a drop target
    #[serde(default)]
    pub target: Option<NodeId>,
    /// Port currently hovered as a drop target
    #[serde(default)]
    pub target_port: Option<PortId>,
    /// Current free end, in flow coordinates
    pub target_position: Point,
    /// Computed geometry of the preview
    #[serde(default)]
    pub points: Vec<Point>,
    /// SVG path data of the preview
    #[serde(default)]
    pub path: String,
    /// Payload built by the temporary edge builder
    #[serde(default)]
    pub data: Value,
}
