// SPDX-License-Identifier: MIT OR Apache-2.0
//! Raw input events and the interpreter that turns them into commands.
//!
//! Pointer input runs through an explicit gesture state machine
//! (see [`pointer`]); keyboard and wheel input go through small stateless
//! handlers. Every command the interpreter emits goes through the same
//! dispatcher as programmatic commands.

mod keyboard;
mod pointer;
mod wheel;

pub use hit_test::{hit_test, HitOptions};
pub use keyboard::{Key, KeyEvent};
pub use pointer::ResizeHandle;
pub use wheel::WheelEvent;

use crate::commands::Command;
use crate::config::{EngineConfig, Strategies};
use crate::error::Result;
use crate::history::GestureId;
use crate::pipeline::{Dispatcher, Outcome};
use crate::viewport::client_to_flow;
use pointer::Gesture;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use trellis_graph::{EdgeId, ModelState, NodeId, Point, PortId};

/// Modifier keys held during an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    /// Ctrl on most platforms, Cmd on macOS
    pub primary: bool,
    /// Shift
    pub shift: bool,
    /// Alt / Option
    pub alt: bool,
}

impl Modifiers {
    /// Only the primary modifier held
    pub const PRIMARY: Self = Self {
        primary: true,
        shift: false,
        alt: false,
    };

    /// Only shift held
    pub const SHIFT: Self = Self {
        primary: false,
        shift: true,
        alt: false,
    };
}

/// Pointer button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerButton {
    /// Left button, pen or touch contact
    #[default]
    Primary,
    /// Wheel button
    Middle,
    /// Right button
    Secondary,
}

/// Phase of a pointer event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerKind {
    /// Contact started
    Down,
    /// Pointer moved
    Move,
    /// Contact ended
    Up,
    /// The platform aborted the contact
    Cancel,
}

/// What the pointer is over
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PointerTarget {
    /// Empty canvas
    Canvas,
    /// Node body
    Node(NodeId),
    /// Edge line
    Edge(EdgeId),
    /// Resize handle of a node
    ResizeHandle {
        /// Node being resized
        node: NodeId,
        /// Which handle
        handle: ResizeHandle,
    },
    /// Rotate handle of a node
    RotateHandle(NodeId),
    /// A port of a node
    Port {
        /// Owning node
        node: NodeId,
        /// Port on it
        port: PortId,
    },
}

/// A pointer event in client coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    /// Identifies the contact; gestures follow a single pointer
    #[serde(default)]
    pub pointer_id: u32,
    /// Event phase
    pub kind: PointerKind,
    /// Client position
    pub position: Point,
    /// Target reported by the host; hit-tested when absent
    #[serde(default)]
    pub target: Option<PointerTarget>,
    /// Held modifiers
    #[serde(default)]
    pub modifiers: Modifiers,
    /// Pressed button
    #[serde(default)]
    pub button: PointerButton,
}

impl PointerEvent {
    /// A primary-button event with no modifiers
    pub fn new(kind: PointerKind, x: f64, y: f64) -> Self {
        Self {
            pointer_id: 0,
            kind,
            position: Point::new(x, y),
            target: None,
            modifiers: Modifiers::default(),
            button: PointerButton::Primary,
        }
    }

    /// Set the reported target
    pub fn on(mut self, target: PointerTarget) -> Self {
        self.target = Some(target);
        self
    }

    /// Set held modifiers
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Set the pressed button
    pub fn with_button(mut self, button: PointerButton) -> Self {
        self.button = button;
        self
    }
}

/// Any input event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    /// Pointer event
    Pointer(PointerEvent),
    /// Key press
    Key(KeyEvent),
    /// Wheel event
    Wheel(WheelEvent),
}

/// Turns raw input into commands
pub struct InputInterpreter {
    dispatcher: Arc<Dispatcher>,
    config: Arc<EngineConfig>,
    strategies: Strategies,
    gesture: Gesture,
}

impl std::fmt::Debug for InputInterpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputInterpreter")
            .field("gesture", &self.gesture)
            .finish_non_exhaustive()
    }
}

impl InputInterpreter {
    /// Create an idle interpreter
    pub fn new(dispatcher: Arc<Dispatcher>, config: Arc<EngineConfig>, strategies: Strategies) -> Self {
        Self {
            dispatcher,
            config,
            strategies,
            gesture: Gesture::Idle,
        }
    }

    /// Handle any input event
    pub async fn handle(&mut self, event: InputEvent) -> Result<()> {
        match event {
            InputEvent::Pointer(event) => self.handle_pointer(&event).await,
            InputEvent::Key(event) => self.handle_key(&event).await,
            InputEvent::Wheel(mut event) => self.handle_wheel(&mut event).await.map(|_| ()),
        }
    }

    /// Name of the active gesture state
    pub fn state_name(&self) -> &'static str {
        self.gesture.name()
    }

    /// Whether no gesture is in progress
    pub fn is_idle(&self) -> bool {
        matches!(self.gesture, Gesture::Idle)
    }

    fn snapshot(&self) -> Arc<ModelState> {
        self.dispatcher.store().snapshot()
    }

    fn to_flow(&self, client: Point) -> Point {
        client_to_flow(&self.snapshot().metadata.viewport, client)
    }

    fn hit_options(&self) -> HitOptions {
        let scale = self.snapshot().metadata.viewport.scale;
        HitOptions {
            port_radius: self.config.input.port_hit_radius / scale,
            edge_radius: HitOptions::default().edge_radius / scale,
            default_routing: self.config.routing.default_routing,
        }
    }

    async fn emit(&self, command: Command, gesture: Option<GestureId>) -> Result<Outcome> {
        self.dispatcher.emit(command, gesture).await
    }
}
