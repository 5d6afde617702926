// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyboard shortcuts.

use super::{InputInterpreter, Modifiers};
use crate::commands::Command;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use trellis_graph::Point;

/// Arrow nudges with shift held move this many steps
const FAST_NUDGE: f64 = 10.0;

/// A pressed key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Key {
    /// Delete
    Delete,
    /// Backspace
    Backspace,
    /// Escape
    Escape,
    /// Up arrow
    ArrowUp,
    /// Down arrow
    ArrowDown,
    /// Left arrow
    ArrowLeft,
    /// Right arrow
    ArrowRight,
    /// A printable character
    Char(char),
}

/// A key press
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyEvent {
    /// Pressed key
    pub key: Key,
    /// Held modifiers
    #[serde(default)]
    pub modifiers: Modifiers,
}

impl KeyEvent {
    /// A key press without modifiers
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::default(),
        }
    }

    /// Set held modifiers
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

enum Action {
    Cancel,
    Command(Command),
    Undo,
    Redo,
}

impl InputInterpreter {
    /// Handle a key press
    pub async fn handle_key(&mut self, event: &KeyEvent) -> Result<()> {
        let Some(action) = self.key_action(event) else {
            return Ok(());
        };
        match action {
            Action::Cancel => self.cancel().await,
            _ if !self.is_idle() => Ok(()),
            Action::Command(command) => self.emit(command, None).await.map(|_| ()),
            Action::Undo => self.undo_if_possible().await,
            Action::Redo => self.redo_if_possible().await,
        }
    }

    fn key_action(&self, event: &KeyEvent) -> Option<Action> {
        let Modifiers { primary, shift, .. } = event.modifiers;
        let nudge = self.config.input.keyboard_move_step * if shift { FAST_NUDGE } else { 1.0 };
        let delta = match event.key {
            Key::Escape => return Some(Action::Cancel),
            Key::Delete | Key::Backspace => return Some(Action::Command(Command::DeleteSelection)),
            Key::Char(c) if primary => {
                return match c.to_ascii_lowercase() {
                    'z' if shift => Some(Action::Redo),
                    'z' => Some(Action::Undo),
                    'y' => Some(Action::Redo),
                    'a' => Some(Action::Command(Command::SelectAll)),
                    _ => None,
                };
            }
            Key::Char(_) => return None,
            Key::ArrowUp => Point::new(0.0, -nudge),
            Key::ArrowDown => Point::new(0.0, nudge),
            Key::ArrowLeft => Point::new(-nudge, 0.0),
            Key::ArrowRight => Point::new(nudge, 0.0),
        };

        let nodes = self.snapshot().selected_node_ids();
        (!nodes.is_empty()).then_some(Action::Command(Command::MoveNodesBy { nodes, delta }))
    }

    async fn undo_if_possible(&self) -> Result<()> {
        if self.dispatcher.store().can_undo() {
            self.dispatcher.undo().await?;
        }
        Ok(())
    }

    async fn redo_if_possible(&self) -> Result<()> {
        if self.dispatcher.store().can_redo() {
            self.dispatcher.redo().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EngineConfig, Strategies};
    use crate::input::{PointerEvent, PointerKind, PointerTarget};
    use crate::middleware::default_chain;
    use crate::pipeline::Dispatcher;
    use crate::store::ModelStore;
    use std::sync::Arc;
    use trellis_graph::{Edge, ModelState, Node, NodeId};

    fn interpreter() -> InputInterpreter {
        let mut a = Node::new("a").with_size(100.0, 50.0);
        a.selected = true;
        let state = ModelState::from_parts(
            [a, Node::new("b").with_position(300.0, 0.0).with_size(100.0, 50.0)],
            [Edge::new("e", "a", "b")],
        );
        let config = Arc::new(EngineConfig::default());
        let store = Arc::new(ModelStore::new(state, 100));
        let dispatcher = Arc::new(Dispatcher::new(store, default_chain(), Arc::clone(&config)));
        InputInterpreter::new(dispatcher, config, Strategies::default())
    }

    fn primary(c: char) -> KeyEvent {
        KeyEvent::new(Key::Char(c)).with_modifiers(Modifiers::PRIMARY)
    }

    #[tokio::test]
    async fn test_arrows_nudge_selection() {
        let mut input = interpreter();
        input.handle_key(&KeyEvent::new(Key::ArrowRight)).await.unwrap();
        input
            .handle_key(&KeyEvent::new(Key::ArrowDown).with_modifiers(Modifiers::SHIFT))
            .await
            .unwrap();
        let state = input.snapshot();
        assert_eq!(state.node(&"a".into()).unwrap().position, Point::new(10.0, 100.0));
        assert_eq!(state.node(&"b".into()).unwrap().position, Point::new(300.0, 0.0));
    }

    #[tokio::test]
    async fn test_undo_redo_shortcuts() {
        let mut input = interpreter();
        input.handle_key(&KeyEvent::new(Key::ArrowLeft)).await.unwrap();
        input.handle_key(&primary('z')).await.unwrap();
        assert_eq!(input.snapshot().node(&"a".into()).unwrap().position, Point::ZERO);

        let redo = KeyEvent::new(Key::Char('Z')).with_modifiers(Modifiers {
            primary: true,
            shift: true,
            alt: false,
        });
        input.handle_key(&redo).await.unwrap();
        assert_eq!(input.snapshot().node(&"a".into()).unwrap().position, Point::new(-10.0, 0.0));

        // nothing left to redo is not an error
        input.handle_key(&primary('y')).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_and_select_all() {
        let mut input = interpreter();
        input.handle_key(&KeyEvent::new(Key::Delete)).await.unwrap();
        let state = input.snapshot();
        assert!(state.node(&"a".into()).is_none());
        assert_eq!(state.edge_count(), 0);

        input.handle_key(&primary('a')).await.unwrap();
        assert_eq!(input.snapshot().selected_node_ids(), vec![NodeId::from("b")]);
    }

    #[tokio::test]
    async fn test_keys_wait_for_active_gesture() {
        let mut input = interpreter();
        let press = PointerEvent::new(PointerKind::Down, 310.0, 10.0).on(PointerTarget::Node("b".into()));
        input.handle_pointer(&press).await.unwrap();
        input.handle_key(&KeyEvent::new(Key::Delete)).await.unwrap();
        assert!(input.snapshot().node(&"b".into()).is_some());

        input.handle_key(&KeyEvent::new(Key::Escape)).await.unwrap();
        assert!(input.is_idle());
    }
}
