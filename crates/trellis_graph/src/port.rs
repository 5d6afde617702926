// SPDX-License-Identifier: MIT OR Apache-2.0
//! Port definitions: named attachment points on a node.

use crate::geometry::{Point, Side};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for a port, unique within its node
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortId(pub String);

impl PortId {
    /// Borrow the raw id
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PortId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for PortId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which ends of an edge a port accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortKind {
    /// Edges may only start here
    Source,
    /// Edges may only end here
    Target,
    /// Either end
    #[default]
    Both,
}

/// A port on a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    /// Port ID
    pub id: PortId,
    /// Side of the node the port sits on
    #[serde(default)]
    pub side: Side,
    /// Accepted edge ends
    #[serde(default)]
    pub kind: PortKind,
    /// Center of the port relative to the node's top-left corner.
    /// `None` places it in the middle of its side.
    #[serde(default)]
    pub offset: Option<Point>,
}

impl Port {
    /// Create a new port on the given side
    pub fn new(id: impl Into<PortId>, side: Side) -> Self {
        Self {
            id: id.into(),
            side,
            kind: PortKind::Both,
            offset: None,
        }
    }

    /// Create a port that only starts edges
    pub fn source(id: impl Into<PortId>, side: Side) -> Self {
        Self {
            kind: PortKind::Source,
            ..Self::new(id, side)
        }
    }

    /// Create a port that only ends edges
    pub fn target(id: impl Into<PortId>, side: Side) -> Self {
        Self {
            kind: PortKind::Target,
            ..Self::new(id, side)
        }
    }

    /// Set an explicit offset
    pub fn with_offset(mut self, x: f64, y: f64) -> Self {
        self.offset = Some(Point::new(x, y));
        self
    }

    /// Whether an edge may start at this port
    pub fn accepts_source(&self) -> bool {
        matches!(self.kind, PortKind::Source | PortKind::Both)
    }

    /// Whether an edge may end at this port
    pub fn accepts_target(&self) -> bool {
        matches!(self.kind, PortKind::Target | PortKind::Both)
    }
}
