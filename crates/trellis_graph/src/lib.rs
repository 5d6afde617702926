// SPDX-License-Identifier: MIT OR Apache-2.0
//! Diagram entity model and geometry for Trellis.
//!
//! This crate holds everything about a diagram that is a pure function of
//! its data:
//! - Nodes, ports, edges and group back-references
//! - The [`ModelState`] arena with invariant checks
//! - Edge routing strategies (straight, bezier, orthogonal, manual)
//! - Rotation, drag and resize snapping
//!
//! ## Architecture
//!
//! Nothing here mutates shared state or performs I/O. The engine crate owns
//! the canonical model and drives these functions from its command pipeline.

pub mod edge;
pub mod geometry;
pub mod graph;
pub mod metadata;
pub mod node;
pub mod port;

pub use edge::{Edge, EdgeId, TemporaryEdge};
pub use geometry::routing::{Anchor, RoutedEdge, Routing, RoutingMode, RoutingOptions};
pub use geometry::{Point, Rect, Side, Size};
pub use graph::{InvariantViolation, ModelState};
pub use metadata::{Metadata, Viewport};
pub use node::{Node, NodeId};
pub use port::{Port, PortId, PortKind};
