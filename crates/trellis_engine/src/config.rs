// SPDX-License-Identifier: MIT OR Apache-2.0
//! Engine configuration.
//!
//! [`EngineConfig`] is plain data, loadable from RON. Behavior that cannot be
//! serialized (snapping predicates, edge builders) lives in [`Strategies`].

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use trellis_graph::{Edge, EdgeId, Node, NodeId, PortId, Routing, RoutingOptions, Size, TemporaryEdge};

/// Zoom-to-fit behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomToFitConfig {
    /// Fit all nodes once when the engine is initialized
    pub on_init: bool,
    /// Client-space margin around the fitted content
    pub padding: f64,
}

impl Default for ZoomToFitConfig {
    fn default() -> Self {
        Self {
            on_init: false,
            padding: 50.0,
        }
    }
}

/// Zoom limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
    /// Smallest allowed scale
    pub min: f64,
    /// Largest allowed scale
    pub max: f64,
    /// Relative scale change for one zoom step
    pub step: f64,
    /// Zoom-to-fit behavior
    pub zoom_to_fit: ZoomToFitConfig,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            min: 0.1,
            max: 10.0,
            step: 0.1,
            zoom_to_fit: ZoomToFitConfig::default(),
        }
    }
}

/// Orthogonal routing tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrthogonalConfig {
    /// Length of the segments leaving/entering each port before turning
    pub first_last_segment_length: f64,
    /// Maximum corner rounding
    pub max_corner_radius: f64,
}

impl Default for OrthogonalConfig {
    fn default() -> Self {
        let defaults = RoutingOptions::default();
        Self {
            first_last_segment_length: defaults.first_last_segment_length,
            max_corner_radius: defaults.max_corner_radius,
        }
    }
}

/// Bezier routing tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BezierConfig {
    /// Distance of control points from their endpoints
    pub bezier_control_offset: f64,
}

impl Default for BezierConfig {
    fn default() -> Self {
        Self {
            bezier_control_offset: RoutingOptions::default().bezier_control_offset,
        }
    }
}

/// Edge routing settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Routing for edges that do not choose one
    pub default_routing: Routing,
    /// Orthogonal tunables
    pub orthogonal: OrthogonalConfig,
    /// Bezier tunables
    pub bezier: BezierConfig,
}

impl RoutingConfig {
    /// Flatten into the geometry engine's options
    pub fn options(&self) -> RoutingOptions {
        RoutingOptions {
            first_last_segment_length: self.orthogonal.first_last_segment_length,
            max_corner_radius: self.orthogonal.max_corner_radius,
            bezier_control_offset: self.bezier.bezier_control_offset,
        }
    }
}

/// Snapping defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnappingConfig {
    /// Snap drags when no predicate is configured
    pub snap_drag: bool,
    /// Step used when no drag step function is configured
    pub default_drag_snap: Size,
    /// Snap resizes when no predicate is configured
    pub snap_resize: bool,
    /// Step used when no resize step function is configured
    pub default_resize_snap: Size,
    /// Snap rotations when no predicate is configured
    pub snap_rotation: bool,
    /// Rotation step in degrees when no angle function is configured
    pub rotation_step: f64,
    /// Smallest size a resize may produce
    pub min_node_size: Size,
}

impl Default for SnappingConfig {
    fn default() -> Self {
        Self {
            snap_drag: false,
            default_drag_snap: Size::new(10.0, 10.0),
            snap_resize: false,
            default_resize_snap: Size::new(10.0, 10.0),
            snap_rotation: true,
            rotation_step: 15.0,
            min_node_size: Size::new(10.0, 10.0),
        }
    }
}

/// Grouping settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupingConfig {
    /// Recompute group bounds after children move or resize
    pub allow_group_auto_resize: bool,
    /// Margin between children and the group border
    pub group_padding: f64,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            allow_group_auto_resize: true,
            group_padding: 20.0,
        }
    }
}

/// Undo history settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of undo entries
    pub max_depth: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_depth: 100 }
    }
}

/// Input interpretation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Client pixels the pointer must travel before a drag starts moving nodes
    pub drag_threshold: f64,
    /// Scale change per wheel delta unit
    pub wheel_zoom_speed: f64,
    /// Arrow key nudge distance in flow units
    pub keyboard_move_step: f64,
    /// Flow-space radius for port hit testing
    pub port_hit_radius: f64,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            drag_threshold: 0.0,
            wheel_zoom_speed: 0.001,
            keyboard_move_step: 10.0,
            port_hit_radius: 8.0,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Zoom limits
    pub zoom: ZoomConfig,
    /// Edge routing
    pub routing: RoutingConfig,
    /// Snapping defaults
    pub snapping: SnappingConfig,
    /// Grouping
    pub grouping: GroupingConfig,
    /// Undo history
    pub history: HistoryConfig,
    /// Input interpretation
    pub input: InputConfig,
}

impl EngineConfig {
    /// Parse from RON and validate
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a RON file and validate
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_ron(&text)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        let zoom = &self.zoom;
        if !(zoom.min.is_finite() && zoom.min > 0.0) {
            return Err(ConfigError::Invalid(format!("zoom.min must be positive, got {}", zoom.min)));
        }
        if !(zoom.max.is_finite() && zoom.max >= zoom.min) {
            return Err(ConfigError::Invalid(format!(
                "zoom.max ({}) must not be below zoom.min ({})",
                zoom.max, zoom.min
            )));
        }
        if self.routing.orthogonal.first_last_segment_length < 0.0 || self.routing.orthogonal.max_corner_radius < 0.0 {
            return Err(ConfigError::Invalid("orthogonal lengths must not be negative".to_string()));
        }
        if self.history.max_depth == 0 {
            return Err(ConfigError::Invalid("history.max_depth must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Everything a final-edge builder needs to know about a completed link
#[derive(Debug, Clone, PartialEq)]
pub struct LinkDraft {
    /// Node the link started from
    pub source: NodeId,
    /// Port the link started from
    pub source_port: Option<PortId>,
    /// Node the link was dropped on
    pub target: NodeId,
    /// Port the link was dropped on
    pub target_port: Option<PortId>,
    /// Payload of the temporary edge at drop time
    pub data: Value,
}

impl LinkDraft {
    /// Default finalization: a fresh id, the configured default routing
    pub fn into_edge(self) -> Edge {
        let mut edge = Edge::new(EdgeId::new(), self.source, self.target).with_data(self.data);
        edge.source_port = self.source_port;
        edge.target_port = self.target_port;
        edge
    }
}

/// Per-node predicate
pub type NodePredicate = dyn Fn(&Node) -> bool + Send + Sync;
/// Per-node snap step
pub type NodeStep = dyn Fn(&Node) -> Size + Send + Sync;
/// Per-node snap angle
pub type NodeAngle = dyn Fn(&Node) -> f64 + Send + Sync;
/// Builds the payload of the in-progress link preview
pub type TemporaryEdgeBuilder = dyn Fn(&TemporaryEdge) -> Value + Send + Sync;
/// Builds the edge committed when a link is dropped on a valid port
pub type FinalEdgeBuilder = dyn Fn(LinkDraft) -> Edge + Send + Sync;

/// Pluggable behavior consulted by the geometry and input layers
#[derive(Clone, Default)]
pub struct Strategies {
    /// Whether dragging this node snaps
    pub should_snap_drag_for_node: Option<Arc<NodePredicate>>,
    /// Drag step for this node
    pub compute_snap_for_node_drag: Option<Arc<NodeStep>>,
    /// Whether resizing this node snaps
    pub should_snap_resize_for_node: Option<Arc<NodePredicate>>,
    /// Resize step for this node
    pub compute_snap_for_node_size: Option<Arc<NodeStep>>,
    /// Whether rotating this node snaps
    pub should_snap_rotation_for_node: Option<Arc<NodePredicate>>,
    /// Rotation step for this node
    pub compute_snap_angle_for_node: Option<Arc<NodeAngle>>,
    /// Link preview payload builder
    pub temporary_edge_data_builder: Option<Arc<TemporaryEdgeBuilder>>,
    /// Final edge builder
    pub final_edge_data_builder: Option<Arc<FinalEdgeBuilder>>,
}

impl Strategies {
    /// Drag snap step for `node`, or `None` when it moves freely
    pub fn drag_step(&self, config: &SnappingConfig, node: &Node) -> Option<Size> {
        let enabled = self
            .should_snap_drag_for_node
            .as_ref()
            .map_or(config.snap_drag, |f| f(node));
        enabled.then(|| {
            self.compute_snap_for_node_drag
                .as_ref()
                .map_or(config.default_drag_snap, |f| f(node))
        })
    }

    /// Resize snap step for `node`, or `None` when it resizes freely
    pub fn resize_step(&self, config: &SnappingConfig, node: &Node) -> Option<Size> {
        let enabled = self
            .should_snap_resize_for_node
            .as_ref()
            .map_or(config.snap_resize, |f| f(node));
        enabled.then(|| {
            self.compute_snap_for_node_size
                .as_ref()
                .map_or(config.default_resize_snap, |f| f(node))
        })
    }

    /// Rotation snap step for `node`, or `None` when it rotates freely
    pub fn rotation_step(&self, config: &SnappingConfig, node: &Node) -> Option<f64> {
        let enabled = self
            .should_snap_rotation_for_node
            .as_ref()
            .map_or(config.snap_rotation, |f| f(node));
        enabled.then(|| {
            self.compute_snap_angle_for_node
                .as_ref()
                .map_or(config.rotation_step, |f| f(node))
        })
    }

    /// Payload for a link preview
    pub fn temporary_edge_data(&self, edge: &TemporaryEdge) -> Value {
        self.temporary_edge_data_builder
            .as_ref()
            .map_or(Value::Null, |f| f(edge))
    }

    /// Finalize a dropped link
    pub fn final_edge(&self, draft: LinkDraft) -> Edge {
        match &self.final_edge_data_builder {
            Some(f) => f(draft),
            None => draft.into_edge(),
        }
    }
}

impl fmt::Debug for Strategies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Strategies")
            .field("should_snap_drag_for_node", &self.should_snap_drag_for_node.is_some())
            .field("compute_snap_for_node_drag", &self.compute_snap_for_node_drag.is_some())
            .field("should_snap_resize_for_node", &self.should_snap_resize_for_node.is_some())
            .field("compute_snap_for_node_size", &self.compute_snap_for_node_size.is_some())
            .field("should_snap_rotation_for_node", &self.should_snap_rotation_for_node.is_some())
            .field("compute_snap_angle_for_node", &self.compute_snap_angle_for_node.is_some())
            .field("temporary_edge_data_builder", &self.temporary_edge_data_builder.is_some())
            .field("final_edge_data_builder", &self.final_edge_data_builder.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.routing.default_routing, Routing::Bezier);
        assert_eq!(config.history.max_depth, 100);
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config = EngineConfig::from_ron(
            "(zoom: (min: 0.5, max: 2.0), routing: (default_routing: orthogonal, orthogonal: (first_last_segment_length: 30.0)))",
        )
        .unwrap();
        assert_eq!(config.zoom.min, 0.5);
        assert_eq!(config.zoom.step, 0.1);
        assert_eq!(config.routing.default_routing, Routing::Orthogonal);
        assert_eq!(config.routing.options().first_last_segment_length, 30.0);
        assert_eq!(config.routing.options().max_corner_radius, 15.0);
        assert!(config.grouping.allow_group_auto_resize);
    }

    #[test]
    fn test_invalid_zoom_rejected() {
        let err = EngineConfig::from_ron("(zoom: (min: 2.0, max: 1.0))").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_strategies_fall_back_to_config() {
        let config = SnappingConfig {
            snap_drag: true,
            ..Default::default()
        };
        let node = Node::new("n");
        let strategies = Strategies::default();
        assert_eq!(strategies.drag_step(&config, &node), Some(Size::new(10.0, 10.0)));
        assert_eq!(strategies.resize_step(&config, &node), None);
        assert_eq!(strategies.rotation_step(&config, &node), Some(15.0));

        let strategies = Strategies {
            should_snap_drag_for_node: Some(Arc::new(|n: &Node| n.id.as_str() != "n")),
            compute_snap_for_node_size: Some(Arc::new(|_: &Node| Size::new(25.0, 5.0))),
            should_snap_resize_for_node: Some(Arc::new(|_: &Node| true)),
            ..Default::default()
        };
        assert_eq!(strategies.drag_step(&config, &node), None);
        assert_eq!(strategies.resize_step(&config, &node), Some(Size::new(25.0, 5.0)));
    }

    #[test]
    fn test_default_final_edge() {
        let edge = Strategies::default().final_edge(LinkDraft {
            source: "a".into(),
            source_port: Some("out".into()),
            target: "b".into(),
            target_port: Some("in".into()),
            data: Value::Null,
        });
        assert_eq!(edge.source, NodeId::from("a"));
        assert_eq!(edge.target_port, Some(PortId::from("in")));
        assert!(!edge.id.as_str().is_empty());
    }
}
