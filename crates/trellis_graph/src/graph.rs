// SPDX-License-Identifier: MIT OR Apache-2.0
//! Diagram model containing nodes, edges and metadata.
//!
//! Group membership is stored only as a child-to-group back-reference
//! (`Node::group_id`); children of a group are computed by scanning.

use crate::edge::{Edge, EdgeId};
use crate::geometry::routing::Anchor;
use crate::geometry::{bounding_box, Point, Rect};
use crate::metadata::Metadata;
use crate::node::{Node, NodeId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A complete diagram state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelState {
    /// Nodes in insertion order
    nodes: IndexMap<NodeId, Node>,
    /// Edges in insertion order
    edges: IndexMap<EdgeId, Edge>,
    /// Viewport and extension data
    pub metadata: Metadata,
}

impl ModelState {
    /// Create a new empty model
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a model from nodes and edges, later duplicates replacing earlier ones
    pub fn from_parts(nodes: impl IntoIterator<Item = Node>, edges: impl IntoIterator<Item = Edge>) -> Self {
        let mut model = Self::new();
        for node in nodes {
            model.insert_node(node);
        }
        for edge in edges {
            model.insert_edge(edge);
        }
        model
    }

    /// Insert or replace a node, keeping its insertion slot on replace
    pub fn insert_node(&mut self, node: Node) -> Option<Node> {
        self.nodes.insert(node.id.clone(), node)
    }

    /// Remove a node, its edges, its children's group reference and any
    /// highlight or link preview pointing at it
    pub fn remove_node(&mut self, node_id: &NodeId) -> Option<Node> {
        let removed = self.nodes.shift_remove(node_id)?;
        self.edges.retain(|_, e| !e.involves_node(node_id));
        for node in self.nodes.values_mut() {
            if node.group_id.as_ref() == Some(node_id) {
                node.group_id = None;
            }
        }
        self.drop_stale_transients();
        Some(removed)
    }

    /// Clear the group highlight and link preview when they refer to nodes
    /// that no longer exist
    pub fn drop_stale_transients(&mut self) {
        let metadata = &mut self.metadata;
        if metadata
            .highlighted_group
            .as_ref()
            .is_some_and(|id| !self.nodes.contains_key(id))
        {
            metadata.highlighted_group = None;
        }
        if let Some(preview) = &mut metadata.temporary_edge {
            if !self.nodes.contains_key(&preview.source) {
                metadata.temporary_edge = None;
            } else if preview.target.as_ref().is_some_and(|id| !self.nodes.contains_key(id)) {
                preview.target = None;
                preview.target_port = None;
            }
        }
    }

    /// Get a node by ID
    pub fn node(&self, node_id: &NodeId) -> Option<&Node> {
        self.nodes.get(node_id)
    }

    /// Get a mutable node by ID
    pub fn node_mut(&mut self, node_id: &NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(node_id)
    }

    /// Check whether a node exists
    pub fn contains_node(&self, node_id: &NodeId) -> bool {
        self.nodes.contains_key(node_id)
    }

    /// Get all nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Get all nodes mutably
    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.values_mut()
    }

    /// Get all node IDs
    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Insert or replace an edge
    pub fn insert_edge(&mut self, edge: Edge) -> Option<Edge> {
        self.edges.insert(edge.id.clone(), edge)
    }

    /// Remove an edge
    pub fn remove_edge(&mut self, edge_id: &EdgeId) -> Option<Edge> {
        self.edges.shift_remove(edge_id)
    }

    /// Get an edge by ID
    pub fn edge(&self, edge_id: &EdgeId) -> Option<&Edge> {
        self.edges.get(edge_id)
    }

    /// Get a mutable edge by ID
    pub fn edge_mut(&mut self, edge_id: &EdgeId) -> Option<&mut Edge> {
        self.edges.get_mut(edge_id)
    }

    /// Check whether an edge exists
    pub fn contains_edge(&self, edge_id: &EdgeId) -> bool {
        self.edges.contains_key(edge_id)
    }

    /// Get all edges in insertion order
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Get all edges mutably
    pub fn edges_mut(&mut self) -> impl Iterator<Item = &mut Edge> {
        self.edges.values_mut()
    }

    /// Get the number of edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Get edges involving a node
    pub fn edges_for_node<'a>(&'a self, node_id: &'a NodeId) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.values().filter(move |e| e.involves_node(node_id))
    }

    /// Direct children of a group
    pub fn children_of<'a>(&'a self, group_id: &'a NodeId) -> impl Iterator<Item = &'a Node> + 'a {
        self.nodes.values().filter(move |n| n.group_id.as_ref() == Some(group_id))
    }

    /// All nested children of a group, breadth first
    pub fn descendants_of(&self, group_id: &NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut seen = HashSet::from([group_id.clone()]);
        let mut frontier = vec![group_id.clone()];
        while let Some(current) = frontier.pop() {
            for child in self.children_of(&current) {
                if seen.insert(child.id.clone()) {
                    out.push(child.id.clone());
                    frontier.push(child.id.clone());
                }
            }
        }
        out
    }

    /// Whether `ancestor` contains `node_id`, directly or through nested groups
    pub fn is_ancestor(&self, ancestor: &NodeId, node_id: &NodeId) -> bool {
        let mut seen = HashSet::new();
        let mut current = self.node(node_id).and_then(|n| n.group_id.clone());
        while let Some(id) = current {
            if id == *ancestor {
                return true;
            }
            if !seen.insert(id.clone()) {
                return false;
            }
            current = self.node(&id).and_then(|n| n.group_id.clone());
        }
        false
    }

    /// IDs of selected nodes
    pub fn selected_node_ids(&self) -> Vec<NodeId> {
        self.nodes.values().filter(|n| n.selected).map(|n| n.id.clone()).collect()
    }

    /// IDs of selected edges
    pub fn selected_edge_ids(&self) -> Vec<EdgeId> {
        self.edges.values().filter(|e| e.selected).map(|e| e.id.clone()).collect()
    }

    /// Highest z-index among nodes and edges
    pub fn max_z_index(&self) -> i64 {
        self.nodes
            .values()
            .map(|n| n.z_index)
            .chain(self.edges.values().map(|e| e.z_index))
            .max()
            .unwrap_or(0)
    }

    /// Lowest z-index among nodes and edges
    pub fn min_z_index(&self) -> i64 {
        self.nodes
            .values()
            .map(|n| n.z_index)
            .chain(self.edges.values().map(|e| e.z_index))
            .min()
            .unwrap_or(0)
    }

    /// Nodes back to front; ties keep insertion order
    pub fn nodes_in_render_order(&self) -> Vec<&Node> {
        let mut nodes: Vec<&Node> = self.nodes.values().collect();
        nodes.sort_by_key(|n| n.z_index);
        nodes
    }

    /// Edges back to front; ties keep insertion order
    pub fn edges_in_render_order(&self) -> Vec<&Edge> {
        let mut edges: Vec<&Edge> = self.edges.values().collect();
        edges.sort_by_key(|e| e.z_index);
        edges
    }

    /// Bounds of all nodes
    pub fn bounds(&self) -> Option<Rect> {
        self.nodes
            .values()
            .map(Node::bounds)
            .reduce(|acc, r| acc.union(&r))
    }

    /// Bounds of a set of nodes
    pub fn bounds_of<'a>(&self, ids: impl IntoIterator<Item = &'a NodeId>) -> Option<Rect> {
        ids.into_iter()
            .filter_map(|id| self.node(id))
            .map(Node::bounds)
            .reduce(|acc, r| acc.union(&r))
    }

    /// Source and target anchors for an edge.
    ///
    /// Port ends attach to their port; floating ends attach to the side of
    /// the node facing the other end.
    pub fn edge_anchors(&self, edge: &Edge) -> Option<(Anchor, Anchor)> {
        let source = self.node(&edge.source)?;
        let target = self.node(&edge.target)?;
        let source_anchor = edge.source_port.as_ref().and_then(|p| source.port_anchor(p));
        let target_anchor = edge.target_port.as_ref().and_then(|p| target.port_anchor(p));

        let source_anchor = source_anchor.unwrap_or_else(|| {
            source.floating_anchor(target_anchor.map_or_else(|| target.center(), |a| a.point))
        });
        let target_anchor = target_anchor.unwrap_or_else(|| target.floating_anchor(source_anchor.point));
        Some((source_anchor, target_anchor))
    }

    /// Check the structural invariants of the model
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        for (id, node) in &self.nodes {
            if *id != node.id {
                return Err(InvariantViolation::KeyMismatch(id.0.clone()));
            }
            if let Some(group_id) = &node.group_id {
                match self.nodes.get(group_id) {
                    None => {
                        return Err(InvariantViolation::DanglingGroup {
                            node: node.id.clone(),
                            group: group_id.clone(),
                        })
                    }
                    Some(group) if !group.is_group => {
                        return Err(InvariantViolation::NotAGroup {
                            node: node.id.clone(),
                            group: group_id.clone(),
                        })
                    }
                    Some(_) => {}
                }
                if self.is_ancestor(&node.id, &node.id) {
                    return Err(InvariantViolation::GroupCycle(node.id.clone()));
                }
            }
        }

        for (id, edge) in &self.edges {
            if *id != edge.id {
                return Err(InvariantViolation::KeyMismatch(id.0.clone()));
            }
            for end in [&edge.source, &edge.target] {
                if !self.nodes.contains_key(end) {
                    return Err(InvariantViolation::DanglingEdge {
                        edge: edge.id.clone(),
                        node: end.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Bounding box of `rects` grown by `padding` on every side
pub fn padded_bounds(rects: impl IntoIterator<Item = Rect>, padding: f64) -> Option<Rect> {
    let corners = rects
        .into_iter()
        .flat_map(|r| [r.origin(), Point::new(r.right(), r.bottom())]);
    bounding_box(corners).map(|r| r.expand(padding))
}

/// A broken model invariant
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvariantViolation {
    /// Arena key differs from the entity's id
    #[error("Entity stored under a different key: {0}")]
    KeyMismatch(String),

    /// Edge references a missing node
    #[error("Edge {edge} references missing node {node}")]
    DanglingEdge {
        /// Offending edge
        edge: EdgeId,
        /// Missing node
        node: NodeId,
    },

    /// Node references a missing group
    #[error("Node {node} references missing group {group}")]
    DanglingGroup {
        /// Offending node
        node: NodeId,
        /// Missing group
        group: NodeId,
    },

    /// Node references a node that is not a group
    #[error("Node {node} references {group}, which is not a group")]
    NotAGroup {
        /// Offending node
        node: NodeId,
        /// Referenced node
        group: NodeId,
    },

    /// Node is its own ancestor
    #[error("Group cycle through node {0}")]
    GroupCycle(NodeId),
}
