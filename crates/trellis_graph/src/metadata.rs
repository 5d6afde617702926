// SPDX-License-Identifier: MIT OR Apache-2.0
//! Model metadata: viewport plus transient and extension state.

use crate::edge::TemporaryEdge;
use crate::geometry::Size;
use crate::node::NodeId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Translation and zoom of the flow space relative to client space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Horizontal translation in client pixels
    pub x: f64,
    /// Vertical translation in client pixels
    pub y: f64,
    /// Zoom factor
    pub scale: f64,
}

impl Viewport {
    /// Create a new viewport
    pub const fn new(x: f64, y: f64, scale: f64) -> Self {
        Self { x, y, scale }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }
}

/// Model-wide metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Metadata {
    /// Current viewport
    pub viewport: Viewport,
    /// Client size of the viewport, once known
    pub viewport_size: Option<Size>,
    /// Group currently highlighted as a drop target
    pub highlighted_group: Option<NodeId>,
    /// In-progress link preview
    pub temporary_edge: Option<TemporaryEdge>,
    /// Middleware-defined data, keyed by middleware name
    pub extensions: IndexMap<String, Value>,
}

impl Metadata {
    /// Copy the fields that never enter undo history from `other`
    pub fn keep_transient_from(&mut self, other: &Metadata) {
        self.viewport = other.viewport;
        self.viewport_size = other.viewport_size;
        self.highlighted_group.clone_from(&other.highlighted_group);
        self.temporary_edge.clone_from(&other.temporary_edge);
    }
}
