// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pointer gesture state machine.
//!
//! One gesture at a time, owned by the pointer that started it. Each state
//! carries the context it needs, so transitions are plain moves between
//! enum variants.

use super::hit_test::{self, hit_test};
use super::{InputInterpreter, PointerButton, PointerEvent, PointerKind, PointerTarget};
use crate::commands::Command;
use crate::config::LinkDraft;
use crate::error::Result;
use crate::history::GestureId;
use crate::viewport::client_delta_to_flow;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::trace;
use trellis_graph::geometry::snapping::{angle_around, normalize_angle, snap_angle, snap_point, snap_size};
use trellis_graph::{ModelState, NodeId, Point, PortId, Rect, Size, TemporaryEdge};

/// Resize handle on a node's border
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResizeHandle {
    /// Top edge
    Top,
    /// Right edge
    Right,
    /// Bottom edge
    Bottom,
    /// Left edge
    Left,
    /// Top-left corner
    TopLeft,
    /// Top-right corner
    TopRight,
    /// Bottom-right corner
    BottomRight,
    /// Bottom-left corner
    BottomLeft,
}

impl ResizeHandle {
    /// Horizontal and vertical growth direction: -1, 0 or 1 per axis
    pub fn direction(self) -> (f64, f64) {
        match self {
            Self::Top => (0.0, -1.0),
            Self::Right => (1.0, 0.0),
            Self::Bottom => (0.0, 1.0),
            Self::Left => (-1.0, 0.0),
            Self::TopLeft => (-1.0, -1.0),
            Self::TopRight => (1.0, -1.0),
            Self::BottomRight => (1.0, 1.0),
            Self::BottomLeft => (-1.0, 1.0),
        }
    }
}

/// Pointer pressed, not yet dragging
#[derive(Debug)]
pub(super) struct Press {
    pointer: u32,
    origin: Point,
    node: Option<NodeId>,
    /// Node was already selected; a plain click narrows the selection to it
    collapse_on_click: bool,
    draggable: bool,
    additive: bool,
}

#[derive(Debug)]
pub(super) struct Drag {
    pointer: u32,
    gesture: GestureId,
    origin: Point,
    nodes: Vec<NodeId>,
    step: Option<Size>,
    applied: Point,
    highlighted: Option<NodeId>,
}

#[derive(Debug)]
pub(super) struct Resize {
    pointer: u32,
    gesture: GestureId,
    node: NodeId,
    handle: ResizeHandle,
    origin: Point,
    start: Rect,
    rotation: f64,
    step: Option<Size>,
    last: Rect,
}

#[derive(Debug)]
pub(super) struct Rotate {
    pointer: u32,
    gesture: GestureId,
    node: NodeId,
    center: Point,
    grab_angle: f64,
    start_rotation: f64,
    step: Option<f64>,
    last: f64,
}

#[derive(Debug)]
pub(super) struct Link {
    pointer: u32,
    preview: TemporaryEdge,
}

#[derive(Debug)]
pub(super) struct Pan {
    pointer: u32,
    last: Point,
}

/// Active pointer gesture
#[derive(Debug, Default)]
pub(super) enum Gesture {
    #[default]
    Idle,
    Selecting(Press),
    Dragging(Drag),
    Resizing(Resize),
    Rotating(Rotate),
    Linking(Link),
    Panning(Pan),
}

impl Gesture {
    pub(super) fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Selecting(_) => "selecting",
            Self::Dragging(_) => "dragging",
            Self::Resizing(_) => "resizing",
            Self::Rotating(_) => "rotating",
            Self::Linking(_) => "linking",
            Self::Panning(_) => "panning",
        }
    }

    fn pointer(&self) -> Option<u32> {
        match self {
            Self::Idle => None,
            Self::Selecting(g) => Some(g.pointer),
            Self::Dragging(g) => Some(g.pointer),
            Self::Resizing(g) => Some(g.pointer),
            Self::Rotating(g) => Some(g.pointer),
            Self::Linking(g) => Some(g.pointer),
            Self::Panning(g) => Some(g.pointer),
        }
    }
}

impl InputInterpreter {
    /// Handle a pointer event
    pub async fn handle_pointer(&mut self, event: &PointerEvent) -> Result<()> {
        if event.kind == PointerKind::Down {
            return match self.gesture {
                Gesture::Idle => self.pointer_down(event).await,
                _ => Ok(()),
            };
        }
        if self.gesture.pointer() != Some(event.pointer_id) {
            return Ok(());
        }
        match event.kind {
            PointerKind::Move => self.pointer_move(event).await,
            PointerKind::Up => self.pointer_up(event).await,
            PointerKind::Cancel => self.cancel().await,
            PointerKind::Down => Ok(()),
        }
    }

    /// Abort the active gesture, undoing whatever it committed
    pub async fn cancel(&mut self) -> Result<()> {
        match self.take_gesture() {
            Gesture::Dragging(drag) => {
                self.dispatcher.revert_gesture(drag.gesture).await;
                if drag.highlighted.is_some() {
                    self.emit(Command::HighlightGroupClear, None).await?;
                }
            }
            Gesture::Resizing(Resize { gesture, .. }) | Gesture::Rotating(Rotate { gesture, .. }) => {
                self.dispatcher.revert_gesture(gesture).await;
            }
            Gesture::Linking(_) => {
                self.emit(Command::SetTemporaryEdge { edge: None }, None).await?;
            }
            Gesture::Idle | Gesture::Selecting(_) | Gesture::Panning(_) => {}
        }
        Ok(())
    }

    fn take_gesture(&mut self) -> Gesture {
        let previous = std::mem::take(&mut self.gesture);
        if !matches!(previous, Gesture::Idle) {
            trace!(from = previous.name(), to = "idle", "Gesture ended");
        }
        previous
    }

    fn enter(&mut self, next: Gesture) {
        trace!(from = self.gesture.name(), to = next.name(), "Gesture transition");
        self.gesture = next;
    }

    fn resolve_target(&self, state: &ModelState, event: &PointerEvent) -> PointerTarget {
        event
            .target
            .clone()
            .unwrap_or_else(|| hit_test(state, self.to_flow(event.position), &self.hit_options()))
    }

    async fn pointer_down(&mut self, event: &PointerEvent) -> Result<()> {
        let pointer = event.pointer_id;
        match event.button {
            PointerButton::Middle => {
                self.enter(Gesture::Panning(Pan {
                    pointer,
                    last: event.position,
                }));
                return Ok(());
            }
            PointerButton::Secondary => return Ok(()),
            PointerButton::Primary => {}
        }

        let state = self.snapshot();
        let target = self.resolve_target(&state, event);
        let flow = self.to_flow(event.position);

        match target {
            PointerTarget::Port { node, port } => {
                let accepts = state
                    .node(&node)
                    .and_then(|n| n.port(&port))
                    .is_some_and(trellis_graph::Port::accepts_source);
                if accepts {
                    return self.start_link(pointer, node, port, flow).await;
                }
                self.press_node(event, &state, node).await
            }
            PointerTarget::ResizeHandle { node, handle } => match state.node(&node) {
                Some(n) if n.resizable => {
                    let step = self.strategies.resize_step(&self.config.snapping, n);
                    let start = n.rect();
                    self.enter(Gesture::Resizing(Resize {
                        pointer,
                        gesture: GestureId::next(),
                        node,
                        handle,
                        origin: event.position,
                        start,
                        rotation: n.rotation,
                        step,
                        last: start,
                    }));
                    Ok(())
                }
                Some(_) => self.press_node(event, &state, node).await,
                None => Ok(()),
            },
            PointerTarget::RotateHandle(node) => match state.node(&node) {
                Some(n) if n.rotatable => {
                    let center = n.center();
                    self.enter(Gesture::Rotating(Rotate {
                        pointer,
                        gesture: GestureId::next(),
                        node: node.clone(),
                        center,
                        grab_angle: angle_around(center, flow),
                        start_rotation: n.rotation,
                        step: self.strategies.rotation_step(&self.config.snapping, n),
                        last: n.rotation,
                    }));
                    Ok(())
                }
                Some(_) => self.press_node(event, &state, node).await,
                None => Ok(()),
            },
            PointerTarget::Node(node) => self.press_node(event, &state, node).await,
            PointerTarget::Edge(edge) => {
                let selected = state.edge(&edge).is_some_and(|e| e.selected);
                let command = match (event.modifiers.primary, selected) {
                    (true, true) => Command::Deselect {
                        node_ids: Vec::new(),
                        edge_ids: vec![edge],
                    },
                    (additive, _) => Command::Select {
                        node_ids: Vec::new(),
                        edge_ids: vec![edge],
                        preserve_selection: additive,
                    },
                };
                self.emit(command, None).await?;
                self.enter(Gesture::Selecting(Press {
                    pointer,
                    origin: event.position,
                    node: None,
                    collapse_on_click: false,
                    draggable: false,
                    additive: true,
                }));
                Ok(())
            }
            PointerTarget::Canvas => {
                self.enter(Gesture::Selecting(Press {
                    pointer,
                    origin: event.position,
                    node: None,
                    collapse_on_click: false,
                    draggable: false,
                    additive: event.modifiers.primary,
                }));
                Ok(())
            }
        }
    }

    async fn press_node(&mut self, event: &PointerEvent, state: &ModelState, node: NodeId) -> Result<()> {
        let Some(selected) = state.node(&node).map(|n| n.selected) else {
            return Ok(());
        };
        let additive = event.modifiers.primary;
        let (command, draggable, collapse_on_click) = match (additive, selected) {
            (true, true) => (
                Some(Command::Deselect {
                    node_ids: vec![node.clone()],
                    edge_ids: Vec::new(),
                }),
                false,
                false,
            ),
            (false, true) => (None, true, true),
            (_, false) => (
                Some(Command::Select {
                    node_ids: vec![node.clone()],
                    edge_ids: Vec::new(),
                    preserve_selection: additive,
                }),
                true,
                false,
            ),
        };
        if let Some(command) = command {
            self.emit(command, None).await?;
        }
        self.enter(Gesture::Selecting(Press {
            pointer: event.pointer_id,
            origin: event.position,
            node: Some(node),
            collapse_on_click,
            draggable,
            additive,
        }));
        Ok(())
    }

    async fn start_link(&mut self, pointer: u32, source: NodeId, port: PortId, flow: Point) -> Result<()> {
        let mut preview = TemporaryEdge {
            source,
            source_port: Some(port),
            target: None,
            target_port: None,
            target_position: flow,
            points: Vec::new(),
            path: String::new(),
            data: serde_json::Value::Null,
        };
        preview.data = self.strategies.temporary_edge_data(&preview);
        self.emit(
            Command::SetTemporaryEdge {
                edge: Some(preview.clone()),
            },
            None,
        )
        .await?;
        self.enter(Gesture::Linking(Link { pointer, preview }));
        Ok(())
    }

    async fn pointer_move(&mut self, event: &PointerEvent) -> Result<()> {
        let drag = match self.gesture {
            Gesture::Selecting(ref press) => {
                let moved_enough = press.origin.distance(event.position) > self.config.input.drag_threshold;
                match press.node {
                    Some(ref anchor) if press.draggable && moved_enough => self.start_drag(press, anchor),
                    _ => None,
                }
            }
            Gesture::Dragging(_) => return self.drag_to(event).await,
            Gesture::Resizing(_) => return self.resize_to(event).await,
            Gesture::Rotating(_) => return self.rotate_to(event).await,
            Gesture::Linking(_) => return self.link_to(event).await,
            Gesture::Panning(_) => return self.pan_to(event).await,
            Gesture::Idle => None,
        };
        match drag {
            Some(drag) => {
                self.enter(Gesture::Dragging(drag));
                self.drag_to(event).await
            }
            None => Ok(()),
        }
    }

    async fn pan_to(&mut self, event: &PointerEvent) -> Result<()> {
        let Gesture::Panning(pan) = &mut self.gesture else {
            return Ok(());
        };
        let delta = event.position - pan.last;
        pan.last = event.position;
        if delta == Point::ZERO {
            return Ok(());
        }
        self.emit(Command::MoveViewportBy { delta }, None).await.map(|_| ())
    }

    fn start_drag(&self, press: &Press, anchor: &NodeId) -> Option<Drag> {
        let state = self.snapshot();
        let anchor_node = state.node(anchor)?;
        let nodes: Vec<NodeId> = state.selected_node_ids();
        if nodes.is_empty() {
            return None;
        }
        Some(Drag {
            pointer: press.pointer,
            gesture: GestureId::next(),
            origin: press.origin,
            nodes,
            step: self.strategies.drag_step(&self.config.snapping, anchor_node),
            applied: Point::ZERO,
            highlighted: None,
        })
    }

    async fn drag_to(&mut self, event: &PointerEvent) -> Result<()> {
        let state = self.snapshot();
        let viewport = state.metadata.viewport;
        let flow = self.to_flow(event.position);
        let Gesture::Dragging(drag) = &mut self.gesture else {
            return Ok(());
        };

        let raw = client_delta_to_flow(&viewport, event.position - drag.origin);
        let target = match drag.step {
            Some(step) => snap_point(raw, step),
            None => raw,
        };
        let increment = target - drag.applied;
        let (nodes, gesture) = (drag.nodes.clone(), drag.gesture);
        let hovered = hit_test::group_at(&state, flow, &nodes);
        let highlight_changed = hovered != drag.highlighted;
        drag.highlighted.clone_from(&hovered);

        if increment != Point::ZERO {
            self.emit(
                Command::MoveNodesBy {
                    nodes: nodes.clone(),
                    delta: increment,
                },
                Some(gesture),
            )
            .await?;
            if let Gesture::Dragging(drag) = &mut self.gesture {
                drag.applied = target;
            }
        }

        if highlight_changed {
            let command = match hovered {
                Some(group_id) => Command::HighlightGroup { group_id, nodes },
                None => Command::HighlightGroupClear,
            };
            self.emit(command, None).await?;
        }
        Ok(())
    }

    async fn resize_to(&mut self, event: &PointerEvent) -> Result<()> {
        let viewport = self.snapshot().metadata.viewport;
        let min = self.config.snapping.min_node_size;
        let Gesture::Resizing(resize) = &mut self.gesture else {
            return Ok(());
        };

        let raw = client_delta_to_flow(&viewport, event.position - resize.origin);
        let local = raw.rotate_around(Point::ZERO, -resize.rotation);
        let (dx, dy) = resize.handle.direction();
        let start = resize.start;
        let size = Size::new(start.width + dx * local.x, start.height + dy * local.y);
        let size = match resize.step {
            Some(step) => snap_size(size, step, min),
            None => Size::new(size.width.max(min.width), size.height.max(min.height)),
        };
        let next = pinned_resize(start, size, (dx, dy), resize.rotation);
        if next == resize.last {
            return Ok(());
        }
        resize.last = next;
        let (id, gesture) = (resize.node.clone(), resize.gesture);

        self.emit(
            Command::ResizeNode {
                id,
                size,
                position: Some(next.origin()),
            },
            Some(gesture),
        )
        .await
        .map(|_| ())
    }

    async fn rotate_to(&mut self, event: &PointerEvent) -> Result<()> {
        let flow = self.to_flow(event.position);
        let Gesture::Rotating(rotate) = &mut self.gesture else {
            return Ok(());
        };

        let raw = rotate.start_rotation + angle_around(rotate.center, flow) - rotate.grab_angle;
        let angle = match rotate.step {
            Some(step) => snap_angle(normalize_angle(raw), step),
            None => normalize_angle(raw),
        };
        if angle == rotate.last {
            return Ok(());
        }
        rotate.last = angle;
        let (node_id, gesture) = (rotate.node.clone(), rotate.gesture);

        self.emit(Command::RotateNodeTo { node_id, angle }, Some(gesture))
            .await
            .map(|_| ())
    }

    /// Valid drop port under the pointer, if any
    fn link_target(&self, state: &ModelState, event: &PointerEvent, source: &NodeId) -> Option<(NodeId, PortId)> {
        match self.resolve_target(state, event) {
            PointerTarget::Port { node, port } if node != *source => {
                let accepts = state
                    .node(&node)
                    .and_then(|n| n.port(&port))
                    .is_some_and(trellis_graph::Port::accepts_target);
                accepts.then_some((node, port))
            }
            _ => None,
        }
    }

    async fn link_to(&mut self, event: &PointerEvent) -> Result<()> {
        let state = self.snapshot();
        let flow = self.to_flow(event.position);
        let Gesture::Linking(link) = &self.gesture else {
            return Ok(());
        };

        let target = self.link_target(&state, event, &link.preview.source);
        let mut preview = link.preview.clone();
        preview.target_position = flow;
        (preview.target, preview.target_port) = target.map_or((None, None), |(n, p)| (Some(n), Some(p)));
        preview.data = self.strategies.temporary_edge_data(&preview);

        if let Gesture::Linking(link) = &mut self.gesture {
            link.preview = preview.clone();
        }
        self.emit(Command::SetTemporaryEdge { edge: Some(preview) }, None)
            .await
            .map(|_| ())
    }

    async fn pointer_up(&mut self, event: &PointerEvent) -> Result<()> {
        match self.take_gesture() {
            Gesture::Selecting(press) => match press.node {
                Some(node) if press.collapse_on_click => {
                    let command = Command::Select {
                        node_ids: vec![node],
                        edge_ids: Vec::new(),
                        preserve_selection: false,
                    };
                    self.emit(command, None).await.map(|_| ())
                }
                None if !press.additive => self.emit(Command::DeselectAll, None).await.map(|_| ()),
                _ => Ok(()),
            },
            Gesture::Dragging(drag) => self.drop_nodes(drag).await,
            Gesture::Linking(link) => {
                let state = self.snapshot();
                let target = self.link_target(&state, event, &link.preview.source);
                self.emit(Command::SetTemporaryEdge { edge: None }, None).await?;
                let Some((target, target_port)) = target else {
                    return Ok(());
                };
                let mut preview = link.preview;
                preview.target = Some(target.clone());
                preview.target_port = Some(target_port.clone());
                let edge = self.strategies.final_edge(LinkDraft {
                    data: self.strategies.temporary_edge_data(&preview),
                    source: preview.source,
                    source_port: preview.source_port,
                    target,
                    target_port: Some(target_port),
                });
                self.emit(Command::AddEdges { edges: vec![edge] }, None)
                    .await
                    .map(|_| ())
            }
            Gesture::Resizing(_) | Gesture::Rotating(_) | Gesture::Panning(_) | Gesture::Idle => Ok(()),
        }
    }

    async fn drop_nodes(&mut self, drag: Drag) -> Result<()> {
        let Some(group_id) = drag.highlighted else {
            return Ok(());
        };
        let state = self.snapshot();
        let dragged: HashSet<&NodeId> = drag.nodes.iter().collect();
        let joining: Vec<NodeId> = drag
            .nodes
            .iter()
            .filter_map(|id| state.node(id))
            .filter(|n| {
                n.group_id.as_ref() != Some(&group_id)
                    && !dragged.iter().any(|other| *other != &n.id && state.is_ancestor(other, &n.id))
            })
            .map(|n| n.id.clone())
            .collect();

        let grouped = if joining.is_empty() {
            Ok(())
        } else {
            self.emit(
                Command::AddToGroup {
                    group_id,
                    node_ids: joining,
                },
                Some(drag.gesture),
            )
            .await
            .map(|_| ())
        };
        self.emit(Command::HighlightGroupClear, None).await?;
        grouped
    }
}

/// Resize `start` to `size` keeping the edge opposite the dragged handle in
/// place on screen, for a node drawn rotated by `rotation` around its center
fn pinned_resize(start: Rect, size: Size, (dx, dy): (f64, f64), rotation: f64) -> Rect {
    let x = if dx < 0.0 { start.right() - size.width } else { start.x };
    let y = if dy < 0.0 { start.bottom() - size.height } else { start.y };
    let aligned = Rect::new(Point::new(x, y), size);

    // Same unrotated point in both rects; the center shift moves it on screen
    let pinned = Point::new(
        if dx < 0.0 { start.right() } else { start.x },
        if dy < 0.0 { start.bottom() } else { start.y },
    );
    let drift = pinned.rotate_around(start.center(), rotation) - pinned.rotate_around(aligned.center(), rotation);
    Rect::new(aligned.origin() + drift, size)
}
