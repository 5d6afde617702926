// SPDX-License-Identifier: MIT OR Apache-2.0
//! Wheel zoom and pan.

use super::{InputInterpreter, Modifiers};
use crate::commands::Command;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use trellis_graph::Point;

/// A wheel or trackpad scroll event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WheelEvent {
    /// Client position of the pointer
    pub position: Point,
    /// Scroll delta in client pixels
    pub delta: Point,
    /// Held modifiers
    #[serde(default)]
    pub modifiers: Modifiers,
    /// Set once a listener has consumed the event
    #[serde(default)]
    pub handled: bool,
}

impl WheelEvent {
    /// An unhandled wheel event without modifiers
    pub fn new(position: Point, delta: Point) -> Self {
        Self {
            position,
            delta,
            modifiers: Modifiers::default(),
            handled: false,
        }
    }

    /// Set held modifiers
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

impl InputInterpreter {
    /// Zoom around the pointer with the primary modifier held, pan otherwise.
    ///
    /// Returns whether this call consumed the event; an event another
    /// listener already handled is left alone.
    pub async fn handle_wheel(&mut self, event: &mut WheelEvent) -> Result<bool> {
        if event.handled {
            return Ok(false);
        }
        event.handled = true;

        let command = if event.modifiers.primary {
            Command::ZoomBy {
                factor: (-event.delta.y * self.config.input.wheel_zoom_speed).exp(),
                pivot: Some(event.position),
            }
        } else {
            Command::MoveViewportBy {
                delta: Point::new(-event.delta.x, -event.delta.y),
            }
        };
        self.emit(command, None).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EngineConfig, Strategies};
    use crate::pipeline::Dispatcher;
    use crate::store::ModelStore;
    use crate::viewport::client_to_flow;
    use std::sync::Arc;
    use trellis_graph::ModelState;

    fn interpreter() -> InputInterpreter {
        let config = Arc::new(EngineConfig::default());
        let store = Arc::new(ModelStore::new(ModelState::new(), 100));
        let dispatcher = Arc::new(Dispatcher::new(store, Vec::new(), Arc::clone(&config)));
        InputInterpreter::new(dispatcher, config, Strategies::default())
    }

    #[tokio::test]
    async fn test_wheel_pans() {
        let mut input = interpreter();
        let mut event = WheelEvent::new(Point::new(100.0, 100.0), Point::new(0.0, 40.0));
        assert!(input.handle_wheel(&mut event).await.unwrap());
        let viewport = input.snapshot().metadata.viewport;
        assert_eq!((viewport.x, viewport.y, viewport.scale), (0.0, -40.0, 1.0));
    }

    #[tokio::test]
    async fn test_primary_wheel_zooms_around_pointer() {
        let mut input = interpreter();
        let pivot = Point::new(200.0, 150.0);
        let before = client_to_flow(&input.snapshot().metadata.viewport, pivot);

        let mut event = WheelEvent::new(pivot, Point::new(0.0, -500.0)).with_modifiers(Modifiers::PRIMARY);
        input.handle_wheel(&mut event).await.unwrap();

        let viewport = input.snapshot().metadata.viewport;
        assert!((viewport.scale - 0.5_f64.exp()).abs() < 1e-9);
        let after = client_to_flow(&viewport, pivot);
        assert!(before.distance(after) < 1e-9);
    }

    #[tokio::test]
    async fn test_handled_event_is_skipped() {
        let mut input = interpreter();
        let mut event = WheelEvent::new(Point::ZERO, Point::new(0.0, 40.0));
        event.handled = true;
        assert!(!input.handle_wheel(&mut event).await.unwrap());
        assert!(!input.dispatcher.store().can_undo());
        assert_eq!(input.snapshot().metadata.viewport.y, 0.0);

        let mut fresh = WheelEvent::new(Point::ZERO, Point::new(0.0, 40.0));
        input.handle_wheel(&mut fresh).await.unwrap();
        assert!(fresh.handled);
        assert!(!input.handle_wheel(&mut fresh).await.unwrap());
    }
}
