// SPDX-License-Identifier: MIT OR Apache-2.0
//! The engine facade: one store, one dispatcher, one input interpreter.
//!
//! Hosts build an engine once, [`init`](DiagramEngine::init) it with the
//! initial model and drive it with commands or raw input events. The engine
//! is passed around explicitly; nothing is global.

use crate::commands::{self, Command};
use crate::config::{EngineConfig, Strategies};
use crate::error::{ConfigError, Result};
use crate::input::{InputEvent, InputInterpreter, WheelEvent};
use crate::middleware::{default_chain, route_edges};
use crate::pipeline::{Dispatcher, Middleware, Outcome};
use crate::store::{ChangeEvent, ModelDiff, ModelStore, SubscriptionId};
use crate::viewport::client_to_flow;
use std::fmt;
use std::sync::Arc;
use tracing::info;
use trellis_graph::{Edge, Metadata, ModelState, Node, Point, Size};

/// Configures and builds a [`DiagramEngine`]
pub struct EngineBuilder {
    config: EngineConfig,
    strategies: Strategies,
    middleware: Vec<Arc<dyn Middleware>>,
    default_middleware: bool,
}

impl EngineBuilder {
    /// Pluggable snapping and linking behavior
    pub fn strategies(mut self, strategies: Strategies) -> Self {
        self.strategies = strategies;
        self
    }

    /// Append a middleware after the built-in chain
    pub fn middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Append an already shared middleware
    pub fn shared_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Leave out tracing, group auto-resize and edge routing
    pub fn without_default_middleware(mut self) -> Self {
        self.default_middleware = false;
        self
    }

    /// Validate the configuration and assemble the engine
    pub fn build(self) -> std::result::Result<DiagramEngine, ConfigError> {
        self.config.validate()?;
        Ok(self.assemble())
    }

    fn assemble(self) -> DiagramEngine {
        let mut chain = if self.default_middleware {
            default_chain()
        } else {
            Vec::new()
        };
        chain.extend(self.middleware);

        let config = Arc::new(self.config);
        let store = Arc::new(ModelStore::new(ModelState::new(), config.history.max_depth));
        let dispatcher = Arc::new(Dispatcher::new(store, chain, Arc::clone(&config)));
        let interpreter = InputInterpreter::new(Arc::clone(&dispatcher), Arc::clone(&config), self.strategies);

        DiagramEngine {
            config,
            dispatcher,
            interpreter: tokio::sync::Mutex::new(interpreter),
        }
    }
}

/// An interactive diagram: model, history, commands and input
pub struct DiagramEngine {
    config: Arc<EngineConfig>,
    dispatcher: Arc<Dispatcher>,
    interpreter: tokio::sync::Mutex<InputInterpreter>,
}

impl fmt::Debug for DiagramEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagramEngine")
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

impl DiagramEngine {
    /// Start configuring an engine
    pub fn builder(config: EngineConfig) -> EngineBuilder {
        EngineBuilder {
            config,
            strategies: Strategies::default(),
            middleware: Vec::new(),
            default_middleware: true,
        }
    }

    /// Engine with default configuration and middleware
    pub fn new() -> Self {
        Self::builder(EngineConfig::default()).assemble()
    }

    /// Seed the model, forgetting any previous state and history.
    ///
    /// Edges are routed right away, and the viewport is fitted to the content
    /// when `zoom.zoom_to_fit.on_init` is set and a viewport size is known.
    pub async fn init(&self, viewport_size: Option<Size>, nodes: Vec<Node>, edges: Vec<Edge>) -> Result<()> {
        let mut state = ModelState::new();
        state.metadata.viewport_size = viewport_size;
        let (node_count, edge_count) = (nodes.len(), edges.len());

        for command in [Command::AddNodes { nodes }, Command::AddEdges { edges }] {
            let empty = match &command {
                Command::AddNodes { nodes } => nodes.is_empty(),
                Command::AddEdges { edges } => edges.is_empty(),
                _ => false,
            };
            if !empty {
                command.validate(&state)?;
                command.apply(&mut state, &self.config)?;
            }
        }
        state.check_invariants()?;
        route_edges(&mut state, &self.config.routing);

        let fit = &self.config.zoom.zoom_to_fit;
        if fit.on_init {
            if let Some(viewport) = commands::fit_viewport(&state, fit.padding, &self.config) {
                state.metadata.viewport = viewport;
            }
        }

        self.interpreter.lock().await.cancel().await?;
        self.dispatcher.reset(state).await;
        info!(nodes = node_count, edges = edge_count, "Engine initialized");
        Ok(())
    }

    /// Drop every subscriber; the model stays readable
    pub fn teardown(&self) {
        self.dispatcher.store().clear_subscribers();
        info!("Engine torn down");
    }

    /// Dispatch a command
    pub async fn emit(&self, command: Command) -> Result<Outcome> {
        self.dispatcher.emit(command, None).await
    }

    /// Undo the last recorded step
    pub async fn undo(&self) -> Result<ModelDiff> {
        self.dispatcher.undo().await
    }

    /// Redo the last undone step
    pub async fn redo(&self) -> Result<ModelDiff> {
        self.dispatcher.redo().await
    }

    /// Whether there is a step to undo
    pub fn can_undo(&self) -> bool {
        self.dispatcher.store().can_undo()
    }

    /// Whether there is a step to redo
    pub fn can_redo(&self) -> bool {
        self.dispatcher.store().can_redo()
    }

    /// Feed a raw input event through the gesture interpreter
    pub async fn handle_input(&self, event: InputEvent) -> Result<()> {
        self.interpreter.lock().await.handle(event).await
    }

    /// Feed a wheel event, marking it handled; returns whether it was consumed
    pub async fn handle_wheel(&self, event: &mut WheelEvent) -> Result<bool> {
        self.interpreter.lock().await.handle_wheel(event).await
    }

    /// Abort the active gesture
    pub async fn cancel_gesture(&self) -> Result<()> {
        self.interpreter.lock().await.cancel().await
    }

    /// Name of the active gesture state
    pub async fn gesture_state(&self) -> &'static str {
        self.interpreter.lock().await.state_name()
    }

    /// Be told about every state change
    pub fn subscribe(&self, listener: impl Fn(&ChangeEvent) + Send + Sync + 'static) -> SubscriptionId {
        self.dispatcher.store().subscribe(listener)
    }

    /// Stop a subscription; returns whether it existed
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.dispatcher.store().unsubscribe(id)
    }

    /// Flow coordinates under a client position, for placing new entities
    pub fn client_to_flow_position(&self, client: Point) -> Point {
        client_to_flow(&self.dispatcher.store().snapshot().metadata.viewport, client)
    }

    /// Current model
    pub fn snapshot(&self) -> Arc<ModelState> {
        self.dispatcher.store().snapshot()
    }

    /// Current nodes, in insertion order
    pub fn nodes(&self) -> Vec<Node> {
        self.dispatcher.store().nodes()
    }

    /// Current edges, in insertion order
    pub fn edges(&self) -> Vec<Edge> {
        self.dispatcher.store().edges()
    }

    /// Current metadata
    pub fn metadata(&self) -> Metadata {
        self.dispatcher.store().metadata()
    }

    /// Effective configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The underlying dispatcher
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }
}

impl Default for DiagramEngine {
    fn default() -> Self {
        Self::new()
    }
}
