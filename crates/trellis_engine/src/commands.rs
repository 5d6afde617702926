// SPDX-License-Identifier: MIT OR Apache-2.0
//! Named commands and their effect on a draft state.
//!
//! A command is checked in two stages. [`Command::validate`] rejects
//! malformed payloads before any draft exists. [`Command::apply`] then
//! performs the edit on the draft and raises [`ReferenceError`] for ids the
//! draft does not contain. Middleware runs after `apply` and sees the
//! command's direct effect.

use crate::config::EngineConfig;
use crate::error::{ReferenceError, Result, ValidationError};
use crate::grouping;
use crate::viewport;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use trellis_graph::geometry::snapping::normalize_angle;
use trellis_graph::{
    Edge, EdgeId, ModelState, Node, NodeId, Point, PortId, Routing, RoutingMode, Size, TemporaryEdge, Viewport,
};

/// A graph-editing command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "payload", rename_all = "camelCase")]
pub enum Command {
    /// Insert new nodes
    AddNodes {
        /// Nodes to insert; ids must be new
        nodes: Vec<Node>,
    },
    /// Insert new edges between existing nodes
    AddEdges {
        /// Edges to insert; ids must be new
        edges: Vec<Edge>,
    },
    /// Remove nodes with their edges; children of removed groups are detached
    RemoveNodes {
        /// Nodes to remove
        ids: Vec<NodeId>,
    },
    /// Remove edges
    RemoveEdges {
        /// Edges to remove
        ids: Vec<EdgeId>,
    },
    /// Remove every selected node and edge
    DeleteSelection,
    /// Translate nodes (and descendants of moved groups)
    MoveNodesBy {
        /// Nodes to move
        nodes: Vec<NodeId>,
        /// Flow-space translation
        delta: Point,
    },
    /// Set a node's explicit size, optionally moving it
    ResizeNode {
        /// Node to resize
        id: NodeId,
        /// New size
        size: Size,
        /// New top-left corner when resizing from the left or top
        #[serde(default)]
        position: Option<Point>,
    },
    /// Set a node's rotation
    RotateNodeTo {
        /// Node to rotate
        node_id: NodeId,
        /// Angle in degrees, normalized into `[0, 360)`
        angle: f64,
    },
    /// Replace a node's payload
    UpdateNodeData {
        /// Node to update
        id: NodeId,
        /// New payload
        data: Value,
    },
    /// Change an edge's routing
    SetEdgeRouting {
        /// Edge to update
        id: EdgeId,
        /// New routing; `None` uses the configured default
        #[serde(default)]
        routing: Option<Routing>,
        /// Whether points are recomputed
        #[serde(default)]
        mode: RoutingMode,
    },
    /// Give an edge explicit waypoints, switching it to manual mode
    SetEdgePoints {
        /// Edge to update
        id: EdgeId,
        /// New waypoints
        points: Vec<Point>,
    },
    /// Select nodes and edges
    Select {
        /// Nodes to select
        #[serde(default)]
        node_ids: Vec<NodeId>,
        /// Edges to select
        #[serde(default)]
        edge_ids: Vec<EdgeId>,
        /// Keep the existing selection
        #[serde(default)]
        preserve_selection: bool,
    },
    /// Remove nodes and edges from the selection
    Deselect {
        /// Nodes to deselect
        #[serde(default)]
        node_ids: Vec<NodeId>,
        /// Edges to deselect
        #[serde(default)]
        edge_ids: Vec<EdgeId>,
    },
    /// Clear the selection
    DeselectAll,
    /// Select every node and edge
    SelectAll,
    /// Put nodes into a group
    AddToGroup {
        /// Target group
        group_id: NodeId,
        /// Nodes to add
        node_ids: Vec<NodeId>,
    },
    /// Detach nodes from their group
    RemoveFromGroup {
        /// Nodes to detach
        node_ids: Vec<NodeId>,
    },
    /// Mark a group as the drop target for `nodes`
    HighlightGroup {
        /// Group to highlight
        group_id: NodeId,
        /// Nodes being dragged over it
        #[serde(default)]
        nodes: Vec<NodeId>,
    },
    /// Clear the drop-target highlight
    HighlightGroupClear,
    /// Raise above everything; empty lists mean the current selection
    BringToFront {
        /// Nodes to raise
        #[serde(default)]
        node_ids: Vec<NodeId>,
        /// Edges to raise
        #[serde(default)]
        edge_ids: Vec<EdgeId>,
    },
    /// Lower below everything; empty lists mean the current selection
    SendToBack {
        /// Nodes to lower
        #[serde(default)]
        node_ids: Vec<NodeId>,
        /// Edges to lower
        #[serde(default)]
        edge_ids: Vec<EdgeId>,
    },
    /// Replace the viewport (scale is clamped)
    SetViewport {
        /// New viewport
        viewport: Viewport,
    },
    /// Pan by a client-space delta
    MoveViewportBy {
        /// Client-space translation
        delta: Point,
    },
    /// Zoom by a factor around a client-space pivot
    ZoomBy {
        /// Scale multiplier
        factor: f64,
        /// Client position that stays fixed; the viewport center when absent
        #[serde(default)]
        pivot: Option<Point>,
    },
    /// Fit all nodes into the viewport
    ZoomToFit {
        /// Client-space margin; the configured padding when absent
        #[serde(default)]
        padding: Option<f64>,
    },
    /// Record the client size of the viewport
    SetViewportSize {
        /// Client size
        size: Size,
    },
    /// Show, update or clear the link preview
    SetTemporaryEdge {
        /// New preview, or `None` to discard it
        #[serde(default)]
        edge: Option<TemporaryEdge>,
    },
    /// Store middleware-defined metadata
    SetMetadataExtension {
        /// Extension key
        key: String,
        /// Extension value; `null` removes the key
        value: Value,
    },
}

impl Command {
    /// Wire name of the command
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddNodes { .. } => "addNodes",
            Self::AddEdges { .. } => "addEdges",
            Self::RemoveNodes { .. } => "removeNodes",
            Self::RemoveEdges { .. } => "removeEdges",
            Self::DeleteSelection => "deleteSelection",
            Self::MoveNodesBy { .. } => "moveNodesBy",
            Self::ResizeNode { .. } => "resizeNode",
            Self::RotateNodeTo { .. } => "rotateNodeTo",
            Self::UpdateNodeData { .. } => "updateNodeData",
            Self::SetEdgeRouting { .. } => "setEdgeRouting",
            Self::SetEdgePoints { .. } => "setEdgePoints",
            Self::Select { .. } => "select",
            Self::Deselect { .. } => "deselect",
            Self::DeselectAll => "deselectAll",
            Self::SelectAll => "selectAll",
            Self::AddToGroup { .. } => "addToGroup",
            Self::RemoveFromGroup { .. } => "removeFromGroup",
            Self::HighlightGroup { .. } => "highlightGroup",
            Self::HighlightGroupClear => "highlightGroupClear",
            Self::BringToFront { .. } => "bringToFront",
            Self::SendToBack { .. } => "sendToBack",
            Self::SetViewport { .. } => "setViewport",
            Self::MoveViewportBy { .. } => "moveViewportBy",
            Self::ZoomBy { .. } => "zoomBy",
            Self::ZoomToFit { .. } => "zoomToFit",
            Self::SetViewportSize { .. } => "setViewportSize",
            Self::SetTemporaryEdge { .. } => "setTemporaryEdge",
            Self::SetMetadataExtension { .. } => "setMetadataExtension",
        }
    }

    /// Whether a commit of this command enters undo history
    pub fn records_history(&self) -> bool {
        !matches!(
            self,
            Self::HighlightGroup { .. }
                | Self::HighlightGroupClear
                | Self::SetViewport { .. }
                | Self::MoveViewportBy { .. }
                | Self::ZoomBy { .. }
                | Self::ZoomToFit { .. }
                | Self::SetViewportSize { .. }
                | Self::SetTemporaryEdge { .. }
        )
    }

    /// Reject structurally invalid payloads
    pub fn validate(&self, state: &ModelState) -> Result<()> {
        let command = self.name();
        match self {
            Self::AddNodes { nodes } => {
                non_empty(command, "nodes", nodes)?;
                unique_ids(command, "nodes", nodes.iter().map(|n| n.id.as_str()))?;
                for node in nodes {
                    if state.contains_node(&node.id) {
                        return Err(ValidationError::AlreadyExists {
                            command,
                            id: node.id.to_string(),
                        }
                        .into());
                    }
                    finite_point(command, "position", node.position)?;
                    finite(command, "rotation", node.rotation)?;
                    if let Some(size) = node.size {
                        valid_size(command, "size", size)?;
                    }
                    if let Some(group) = &node.group_id {
                        non_empty_id(command, "groupId", group.as_str())?;
                    }
                }
            }
            Self::AddEdges { edges } => {
                non_empty(command, "edges", edges)?;
                unique_ids(command, "edges", edges.iter().map(|e| e.id.as_str()))?;
                for edge in edges {
                    if state.contains_edge(&edge.id) {
                        return Err(ValidationError::AlreadyExists {
                            command,
                            id: edge.id.to_string(),
                        }
                        .into());
                    }
                    non_empty_id(command, "source", edge.source.as_str())?;
                    non_empty_id(command, "target", edge.target.as_str())?;
                    for point in &edge.points {
                        finite_point(command, "points", *point)?;
                    }
                }
            }
            Self::RemoveNodes { ids } => {
                non_empty(command, "ids", ids)?;
                ids_non_empty(command, "ids", ids.iter().map(NodeId::as_str))?;
            }
            Self::RemoveEdges { ids } => {
                non_empty(command, "ids", ids)?;
                ids_non_empty(command, "ids", ids.iter().map(EdgeId::as_str))?;
            }
            Self::MoveNodesBy { nodes, delta } => {
                non_empty(command, "nodes", nodes)?;
                ids_non_empty(command, "nodes", nodes.iter().map(NodeId::as_str))?;
                finite_point(command, "delta", *delta)?;
            }
            Self::ResizeNode { id, size, position } => {
                non_empty_id(command, "id", id.as_str())?;
                valid_size(command, "size", *size)?;
                if let Some(position) = position {
                    finite_point(command, "position", *position)?;
                }
            }
            Self::RotateNodeTo { node_id, angle } => {
                non_empty_id(command, "nodeId", node_id.as_str())?;
                finite(command, "angle", *angle)?;
            }
            Self::UpdateNodeData { id, .. } => non_empty_id(command, "id", id.as_str())?,
            Self::SetEdgeRouting { id, .. } => non_empty_id(command, "id", id.as_str())?,
            Self::SetEdgePoints { id, points } => {
                non_empty_id(command, "id", id.as_str())?;
                if points.len() < 2 {
                    return Err(ValidationError::OutOfRange {
                        command,
                        field: "points",
                        reason: format!("need at least 2 points, got {}", points.len()),
                    }
                    .into());
                }
                for point in points {
                    finite_point(command, "points", *point)?;
                }
            }
            Self::Select { node_ids, edge_ids, .. }
            | Self::Deselect { node_ids, edge_ids }
            | Self::BringToFront { node_ids, edge_ids }
            | Self::SendToBack { node_ids, edge_ids } => {
                ids_non_empty(command, "nodeIds", node_ids.iter().map(NodeId::as_str))?;
                ids_non_empty(command, "edgeIds", edge_ids.iter().map(EdgeId::as_str))?;
            }
            Self::AddToGroup { group_id, node_ids } => {
                non_empty_id(command, "groupId", group_id.as_str())?;
                non_empty(command, "nodeIds", node_ids)?;
                ids_non_empty(command, "nodeIds", node_ids.iter().map(NodeId::as_str))?;
            }
            Self::RemoveFromGroup { node_ids } => {
                non_empty(command, "nodeIds", node_ids)?;
                ids_non_empty(command, "nodeIds", node_ids.iter().map(NodeId::as_str))?;
            }
            Self::HighlightGroup { group_id, .. } => non_empty_id(command, "groupId", group_id.as_str())?,
            Self::SetViewport { viewport } => {
                finite_point(command, "viewport", Point::new(viewport.x, viewport.y))?;
                positive(command, "scale", viewport.scale)?;
            }
            Self::MoveViewportBy { delta } => finite_point(command, "delta", *delta)?,
            Self::ZoomBy { factor, pivot } => {
                positive(command, "factor", *factor)?;
                if let Some(pivot) = pivot {
                    finite_point(command, "pivot", *pivot)?;
                }
            }
            Self::ZoomToFit { padding } => {
                if let Some(padding) = padding {
                    finite(command, "padding", *padding)?;
                }
            }
            Self::SetViewportSize { size } => valid_size(command, "size", *size)?,
            Self::SetTemporaryEdge { edge } => {
                if let Some(edge) = edge {
                    non_empty_id(command, "source", edge.source.as_str())?;
                    finite_point(command, "targetPosition", edge.target_position)?;
                }
            }
            Self::SetMetadataExtension { key, .. } => {
                if key.is_empty() {
                    return Err(ValidationError::EmptyId { command, field: "key" }.into());
                }
            }
            Self::DeleteSelection | Self::DeselectAll | Self::SelectAll | Self::HighlightGroupClear => {}
        }
        Ok(())
    }

    /// Perform the command's edit on `draft`
    pub fn apply(&self, draft: &mut ModelState, config: &EngineConfig) -> Result<()> {
        match self {
            Self::AddNodes { nodes } => {
                for node in nodes {
                    draft.insert_node(node.clone());
                }
                for node in nodes {
                    if let Some(group_id) = &node.group_id {
                        grouping::require_group(draft, group_id)?;
                    }
                }
            }
            Self::AddEdges { edges } => {
                for edge in edges {
                    require_endpoint(draft, &edge.source, edge.source_port.as_ref())?;
                    require_endpoint(draft, &edge.target, edge.target_port.as_ref())?;
                    draft.insert_edge(edge.clone());
                }
            }
            Self::RemoveNodes { ids } => {
                for id in ids {
                    draft
                        .remove_node(id)
                        .ok_or_else(|| ReferenceError::NodeNotFound(id.clone()))?;
                }
            }
            Self::RemoveEdges { ids } => {
                for id in ids {
                    draft
                        .remove_edge(id)
                        .ok_or_else(|| ReferenceError::EdgeNotFound(id.clone()))?;
                }
            }
            Self::DeleteSelection => {
                for id in draft.selected_edge_ids() {
                    draft.remove_edge(&id);
                }
                for id in draft.selected_node_ids() {
                    draft.remove_node(&id);
                }
            }
            Self::MoveNodesBy { nodes, delta } => {
                for id in moved_set(draft, nodes)? {
                    if let Some(node) = draft.node_mut(&id) {
                        node.position = node.position + *delta;
                    }
                }
            }
            Self::ResizeNode { id, size, position } => {
                let node = node_mut(draft, id)?;
                node.size = Some(*size);
                node.auto_size = false;
                if let Some(position) = position {
                    node.position = *position;
                }
            }
            Self::RotateNodeTo { node_id, angle } => {
                node_mut(draft, node_id)?.rotation = normalize_angle(*angle);
            }
            Self::UpdateNodeData { id, data } => {
                node_mut(draft, id)?.data = data.clone();
            }
            Self::SetEdgeRouting { id, routing, mode } => {
                let edge = edge_mut(draft, id)?;
                edge.routing = *routing;
                edge.routing_mode = *mode;
            }
            Self::SetEdgePoints { id, points } => {
                let edge = edge_mut(draft, id)?;
                edge.points.clone_from(points);
                edge.routing_mode = RoutingMode::Manual;
            }
            Self::Select {
                node_ids,
                edge_ids,
                preserve_selection,
            } => {
                require_all(draft, node_ids, edge_ids)?;
                if !preserve_selection {
                    set_all_selected(draft, false);
                }
                set_selected(draft, node_ids, edge_ids, true);
            }
            Self::Deselect { node_ids, edge_ids } => {
                require_all(draft, node_ids, edge_ids)?;
                set_selected(draft, node_ids, edge_ids, false);
            }
            Self::DeselectAll => set_all_selected(draft, false),
            Self::SelectAll => set_all_selected(draft, true),
            Self::AddToGroup { group_id, node_ids } => grouping::add_to_group(draft, group_id, node_ids)?,
            Self::RemoveFromGroup { node_ids } => grouping::remove_from_group(draft, node_ids)?,
            Self::HighlightGroup { group_id, nodes } => grouping::highlight(draft, group_id, nodes)?,
            Self::HighlightGroupClear => grouping::clear_highlight(draft),
            Self::BringToFront { node_ids, edge_ids } => {
                let (nodes, edges) = stacking_targets(draft, node_ids, edge_ids)?;
                let start = draft.max_z_index() + 1;
                restack(draft, &nodes, &edges, start);
            }
            Self::SendToBack { node_ids, edge_ids } => {
                let (nodes, edges) = stacking_targets(draft, node_ids, edge_ids)?;
                let count = i64::try_from(nodes.len() + edges.len()).unwrap_or(i64::MAX);
                let start = draft.min_z_index().saturating_sub(count);
                restack(draft, &nodes, &edges, start);
            }
            Self::SetViewport { viewport } => {
                draft.metadata.viewport = viewport::clamped(*viewport, &config.zoom);
            }
            Self::MoveViewportBy { delta } => {
                draft.metadata.viewport = viewport::pan(draft.metadata.viewport, *delta);
            }
            Self::ZoomBy { factor, pivot } => {
                let size = draft.metadata.viewport_size.unwrap_or_default();
                let pivot = pivot.unwrap_or(Point::new(size.width / 2.0, size.height / 2.0));
                draft.metadata.viewport = viewport::zoom_at(draft.metadata.viewport, *factor, pivot, &config.zoom);
            }
            Self::ZoomToFit { padding } => {
                let padding = padding.unwrap_or(config.zoom.zoom_to_fit.padding);
                if let Some(fitted) = fit_viewport(draft, padding, config) {
                    draft.metadata.viewport = fitted;
                }
            }
            Self::SetViewportSize { size } => draft.metadata.viewport_size = Some(*size),
            Self::SetTemporaryEdge { edge } => {
                if let Some(edge) = edge {
                    require_endpoint(draft, &edge.source, edge.source_port.as_ref())?;
                }
                draft.metadata.temporary_edge.clone_from(edge);
            }
            Self::SetMetadataExtension { key, value } => {
                if value.is_null() {
                    draft.metadata.extensions.shift_remove(key);
                } else {
                    draft.metadata.extensions.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(())
    }
}

/// Viewport fitting every node into the known viewport size
pub(crate) fn fit_viewport(state: &ModelState, padding: f64, config: &EngineConfig) -> Option<Viewport> {
    let size = state.metadata.viewport_size?;
    let bounds = state.bounds()?;
    viewport::fit(bounds, size, padding, &config.zoom)
}

fn non_empty<T>(command: &'static str, field: &'static str, items: &[T]) -> Result<()> {
    if items.is_empty() {
        return Err(ValidationError::Empty { command, field }.into());
    }
    Ok(())
}

fn non_empty_id(command: &'static str, field: &'static str, id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(ValidationError::EmptyId { command, field }.into());
    }
    Ok(())
}

fn ids_non_empty<'a>(command: &'static str, field: &'static str, ids: impl IntoIterator<Item = &'a str>) -> Result<()> {
    ids.into_iter().try_for_each(|id| non_empty_id(command, field, id))
}

fn unique_ids<'a>(command: &'static str, field: &'static str, ids: impl IntoIterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for id in ids {
        non_empty_id(command, field, id)?;
        if !seen.insert(id) {
            return Err(ValidationError::DuplicateId {
                command,
                id: id.to_string(),
            }
            .into());
        }
    }
    Ok(())
}

fn finite(command: &'static str, field: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(ValidationError::NotFinite { command, field }.into());
    }
    Ok(())
}

fn finite_point(command: &'static str, field: &'static str, point: Point) -> Result<()> {
    if !point.is_finite() {
        return Err(ValidationError::NotFinite { command, field }.into());
    }
    Ok(())
}

fn positive(command: &'static str, field: &'static str, value: f64) -> Result<()> {
    finite(command, field, value)?;
    if value <= 0.0 {
        return Err(ValidationError::OutOfRange {
            command,
            field,
            reason: format!("must be positive, got {value}"),
        }
        .into());
    }
    Ok(())
}

fn valid_size(command: &'static str, field: &'static str, size: Size) -> Result<()> {
    finite_point(command, field, Point::new(size.width, size.height))?;
    if !size.is_valid() {
        return Err(ValidationError::OutOfRange {
            command,
            field,
            reason: format!("{} x {} is negative", size.width, size.height),
        }
        .into());
    }
    Ok(())
}

fn node_mut<'a>(state: &'a mut ModelState, id: &NodeId) -> Result<&'a mut Node> {
    state
        .node_mut(id)
        .ok_or_else(|| ReferenceError::NodeNotFound(id.clone()).into())
}

fn edge_mut<'a>(state: &'a mut ModelState, id: &EdgeId) -> Result<&'a mut Edge> {
    state
        .edge_mut(id)
        .ok_or_else(|| ReferenceError::EdgeNotFound(id.clone()).into())
}

fn require_endpoint(state: &ModelState, node_id: &NodeId, port: Option<&PortId>) -> Result<()> {
    let node = state
        .node(node_id)
        .ok_or_else(|| ReferenceError::NodeNotFound(node_id.clone()))?;
    if let Some(port) = port {
        if node.port(port).is_none() {
            return Err(ReferenceError::PortNotFound {
                node: node_id.clone(),
                port: port.clone(),
            }
            .into());
        }
    }
    Ok(())
}

fn require_all(state: &ModelState, node_ids: &[NodeId], edge_ids: &[EdgeId]) -> Result<()> {
    if let Some(id) = node_ids.iter().find(|id| !state.contains_node(id)) {
        return Err(ReferenceError::NodeNotFound(id.clone()).into());
    }
    if let Some(id) = edge_ids.iter().find(|id| !state.contains_edge(id)) {
        return Err(ReferenceError::EdgeNotFound(id.clone()).into());
    }
    Ok(())
}

fn set_all_selected(state: &mut ModelState, selected: bool) {
    for node in state.nodes_mut() {
        node.selected = selected;
    }
    for edge in state.edges_mut() {
        edge.selected = selected;
    }
}

fn set_selected(state: &mut ModelState, node_ids: &[NodeId], edge_ids: &[EdgeId], selected: bool) {
    for id in node_ids {
        if let Some(node) = state.node_mut(id) {
            node.selected = selected;
        }
    }
    for id in edge_ids {
        if let Some(edge) = state.edge_mut(id) {
            edge.selected = selected;
        }
    }
}

/// Requested nodes plus descendants of requested groups, each once
fn moved_set(state: &ModelState, nodes: &[NodeId]) -> Result<Vec<NodeId>> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for id in nodes {
        let node = state
            .node(id)
            .ok_or_else(|| ReferenceError::NodeNotFound(id.clone()))?;
        if seen.insert(id.clone()) {
            out.push(id.clone());
        }
        if node.is_group {
            for child in state.descendants_of(id) {
                if seen.insert(child.clone()) {
                    out.push(child);
                }
            }
        }
    }
    Ok(out)
}

/// Resolve restacking targets in current render order; groups bring their
/// descendants along so children stay above them
fn stacking_targets(state: &ModelState, node_ids: &[NodeId], edge_ids: &[EdgeId]) -> Result<(Vec<NodeId>, Vec<EdgeId>)> {
    require_all(state, node_ids, edge_ids)?;
    let (node_ids, edge_ids) = if node_ids.is_empty() && edge_ids.is_empty() {
        (state.selected_node_ids(), state.selected_edge_ids())
    } else {
        (node_ids.to_vec(), edge_ids.to_vec())
    };

    let mut wanted: HashSet<NodeId> = HashSet::new();
    for id in &node_ids {
        wanted.insert(id.clone());
        if state.node(id).is_some_and(|n| n.is_group) {
            wanted.extend(state.descendants_of(id));
        }
    }
    let nodes = state
        .nodes_in_render_order()
        .into_iter()
        .filter(|n| wanted.contains(&n.id))
        .map(|n| n.id.clone())
        .collect();

    let wanted: HashSet<&EdgeId> = edge_ids.iter().collect();
    let edges = state
        .edges_in_render_order()
        .into_iter()
        .filter(|e| wanted.contains(&e.id))
        .map(|e| e.id.clone())
        .collect();
    Ok((nodes, edges))
}

fn restack(state: &mut ModelState, nodes: &[NodeId], edges: &[EdgeId], start: i64) {
    let mut z = start;
    for id in nodes {
        if let Some(node) = state.node_mut(id) {
            node.z_index = z;
            z += 1;
        }
    }
    for id in edges {
        if let Some(edge) = state.edge_mut(id) {
            edge.z_index = z;
            z += 1;
        }
    }
}
