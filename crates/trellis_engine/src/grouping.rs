// SPDX-License-Identifier: MIT OR Apache-2.0
//! Group membership, drop-target highlighting and group auto-resize.
//!
//! All functions operate on a draft [`ModelState`]; the dispatcher decides
//! whether the result is committed.

use crate::error::{ReferenceError, Result, ValidationError};
use std::collections::HashSet;
use trellis_graph::graph::padded_bounds;
use trellis_graph::{ModelState, Node, NodeId, Size};

/// Look up `group_id` and require it to be a group node
pub fn require_group<'a>(state: &'a ModelState, group_id: &NodeId) -> Result<&'a Node> {
    let group = state
        .node(group_id)
        .ok_or_else(|| ReferenceError::NodeNotFound(group_id.clone()))?;
    if !group.is_group {
        return Err(ReferenceError::NotAGroup(group_id.clone()).into());
    }
    Ok(group)
}

/// Put `node_ids` into `group_id`.
///
/// Children are raised above the group in z-order so they render on top of
/// it. Adding a node to itself or to one of its own descendants is rejected.
pub fn add_to_group(state: &mut ModelState, group_id: &NodeId, node_ids: &[NodeId]) -> Result<()> {
    require_group(state, group_id)?;
    for id in node_ids {
        if !state.contains_node(id) {
            return Err(ReferenceError::NodeNotFound(id.clone()).into());
        }
        if id == group_id || state.is_ancestor(id, group_id) {
            return Err(ValidationError::GroupCycle {
                group: group_id.clone(),
                node: id.clone(),
            }
            .into());
        }
    }

    for id in node_ids {
        if let Some(node) = state.node_mut(id) {
            node.group_id = Some(group_id.clone());
        }
        raise_above_parent(state, id);
    }
    Ok(())
}

/// Detach `node_ids` from whatever group holds them
pub fn remove_from_group(state: &mut ModelState, node_ids: &[NodeId]) -> Result<()> {
    for id in node_ids {
        let node = state
            .node_mut(id)
            .ok_or_else(|| ReferenceError::NodeNotFound(id.clone()))?;
        node.group_id = None;
    }
    Ok(())
}

/// Mark `group_id` as the current drop target
pub fn highlight(state: &mut ModelState, group_id: &NodeId, dragged: &[NodeId]) -> Result<()> {
    require_group(state, group_id)?;
    if let Some(node) = dragged
        .iter()
        .find(|id| *id == group_id || state.is_ancestor(id, group_id))
    {
        return Err(ValidationError::GroupCycle {
            group: group_id.clone(),
            node: node.clone(),
        }
        .into());
    }
    state.metadata.highlighted_group = Some(group_id.clone());
    Ok(())
}

/// Clear the drop-target highlight
pub fn clear_highlight(state: &mut ModelState) {
    state.metadata.highlighted_group = None;
}

/// Give `node_id` and its descendants a z-index above their group
fn raise_above_parent(state: &mut ModelState, node_id: &NodeId) {
    let mut order = vec![node_id.clone()];
    order.extend(state.descendants_of(node_id));
    for id in order {
        let parent_z = state
            .node(&id)
            .and_then(|n| n.group_id.as_ref())
            .and_then(|g| state.node(g))
            .map(|g| g.z_index);
        if let (Some(parent_z), Some(node)) = (parent_z, state.node_mut(&id)) {
            if node.z_index <= parent_z {
                node.z_index = parent_z + 1;
            }
        }
    }
}

/// Number of groups above a node
fn depth(state: &ModelState, node_id: &NodeId) -> usize {
    let mut depth = 0;
    let mut seen = HashSet::new();
    let mut current = state.node(node_id).and_then(|n| n.group_id.clone());
    while let Some(id) = current {
        if !seen.insert(id.clone()) {
            break;
        }
        depth += 1;
        current = state.node(&id).and_then(|n| n.group_id.clone());
    }
    depth
}

/// Groups whose bounds depend on a change between `prior` and `draft`.
///
/// A node counts as changed when its geometry or membership differs or it
/// was added or removed. Groups that changed geometry themselves are left
/// alone: the user sized or moved them explicitly.
pub fn groups_to_resize(prior: &ModelState, draft: &ModelState) -> Vec<NodeId> {
    let mut changed_groups: HashSet<NodeId> = HashSet::new();
    let mut affected: Vec<NodeId> = Vec::new();
    let push_chain = |start: Option<NodeId>, affected: &mut Vec<NodeId>| {
        let mut seen = HashSet::new();
        let mut current = start;
        while let Some(id) = current {
            if !seen.insert(id.clone()) {
                break;
            }
            if !affected.contains(&id) {
                affected.push(id.clone());
            }
            current = draft.node(&id).and_then(|n| n.group_id.clone());
        }
    };

    for node in draft.nodes() {
        let changed = match prior.node(&node.id) {
            None => true,
            Some(old) => {
                old.position != node.position
                    || old.size != node.size
                    || old.rotation != node.rotation
                    || old.group_id != node.group_id
            }
        };
        if !changed {
            continue;
        }
        if node.is_group && prior.contains_node(&node.id) {
            changed_groups.insert(node.id.clone());
        }
        push_chain(node.group_id.clone(), &mut affected);
        if let Some(old_group) = prior.node(&node.id).and_then(|n| n.group_id.clone()) {
            push_chain(Some(old_group), &mut affected);
        }
    }
    for old in prior.nodes() {
        if !draft.contains_node(&old.id) {
            push_chain(old.group_id.clone(), &mut affected);
        }
    }

    affected.retain(|id| draft.node(id).is_some_and(|n| n.is_group) && !changed_groups.contains(id));
    // innermost groups first so outer groups see their children's new bounds
    affected.sort_by_key(|id| std::cmp::Reverse(depth(draft, id)));
    affected
}

/// Fit each group in `groups` (innermost first) around its children plus
/// `padding`; groups without children keep their bounds
pub fn fit_groups(state: &mut ModelState, groups: &[NodeId], padding: f64) {
    for group_id in groups {
        let bounds = padded_bounds(state.children_of(group_id).map(Node::bounds), padding);
        let (Some(bounds), Some(group)) = (bounds, state.node_mut(group_id)) else {
            continue;
        };
        group.position = bounds.origin();
        group.size = Some(Size::new(bounds.width, bounds.height));
        group.auto_size = false;
    }
}
