// SPDX-License-Identifier: MIT OR Apache-2.0
//! Command dispatch through an ordered middleware chain.
//!
//! Each command is validated, applied to a private draft, passed through
//! every middleware in configuration order and only then committed. Commands
//! are processed strictly one at a time: the next command does not start
//! until the previous one has committed, been dropped or failed.

use crate::commands::Command;
use crate::config::EngineConfig;
use crate::error::{EngineError, MiddlewareError, Result};
use crate::history::GestureId;
use crate::semaphore::SemaphorePermit;
use crate::store::{ChangeCause, ModelDiff, ModelStore, Record};
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};
use trellis_graph::ModelState;

/// Everything a middleware may look at or change for one command
#[derive(Debug)]
pub struct PipelineContext {
    /// The command being dispatched
    pub command: Command,
    /// Committed state when the command started
    pub prior: Arc<ModelState>,
    /// Proposed next state
    pub draft: ModelState,
    /// Engine configuration
    pub config: Arc<EngineConfig>,
    /// Gesture the command belongs to, if any
    pub gesture: Option<GestureId>,
    /// Name of the middleware most recently entered
    entered: Option<String>,
    /// Whether the end of the chain was reached
    reached_end: bool,
}

impl PipelineContext {
    /// Create a context for `command` with the draft already holding its effect
    pub fn new(command: Command, prior: Arc<ModelState>, draft: ModelState, config: Arc<EngineConfig>) -> Self {
        Self {
            command,
            prior,
            draft,
            config,
            gesture: None,
            entered: None,
            reached_end: false,
        }
    }
}

/// One link of the chain.
///
/// A middleware inspects or edits `ctx.draft`, then either calls
/// `next.run(ctx)` to continue, returns `Ok(())` without calling it to drop
/// the command, or returns an error to abort it. Commands a middleware does
/// not care about should go straight to `next`.
pub trait Middleware: Send + Sync {
    /// Name used in logs and errors
    fn name(&self) -> &str;

    /// Process one command
    fn handle<'a>(&'a self, ctx: &'a mut PipelineContext, next: Next<'a>) -> BoxFuture<'a, std::result::Result<(), MiddlewareError>>;
}

/// Continuation to the rest of the chain
pub struct Next<'a> {
    chain: &'a [Arc<dyn Middleware>],
    permit: Option<SemaphorePermit<'a>>,
}

impl<'a> Next<'a> {
    /// Start a chain
    pub fn new(chain: &'a [Arc<dyn Middleware>]) -> Self {
        Self { chain, permit: None }
    }

    /// Hold `permit` until the rest of the chain is entered, or until this
    /// continuation is dropped unused
    pub fn holding(mut self, permit: SemaphorePermit<'a>) -> Self {
        self.permit = Some(permit);
        self
    }

    /// Run the remaining middleware
    pub fn run<'b>(self, ctx: &'b mut PipelineContext) -> BoxFuture<'b, std::result::Result<(), MiddlewareError>>
    where
        'a: 'b,
    {
        let Self { chain, permit } = self;
        drop(permit);
        match chain.split_first() {
            Some((head, rest)) => {
                ctx.entered = Some(head.name().to_string());
                head.handle(ctx, Next::new(rest))
            }
            None => {
                ctx.reached_end = true;
                Box::pin(async { Ok(()) })
            }
        }
    }

    /// Middleware still to run
    pub fn remaining(&self) -> usize {
        self.chain.len()
    }
}

impl fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("remaining", &self.chain.len())
            .field("holding_permit", &self.permit.is_some())
            .finish()
    }
}

/// Result of a dispatched command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The draft was committed
    Committed(ModelDiff),
    /// The command had no effect; nothing was committed
    Unchanged,
    /// A middleware did not continue the chain
    Dropped {
        /// Middleware that stopped the chain
        by: String,
    },
}

impl Outcome {
    /// Whether a commit happened
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed(_))
    }
}

/// Serializes commands through the chain into the store
pub struct Dispatcher {
    store: Arc<ModelStore>,
    chain: Vec<Arc<dyn Middleware>>,
    config: Arc<EngineConfig>,
    turn: tokio::sync::Mutex<()>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("chain", &self.chain.iter().map(|m| m.name().to_string()).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Create a dispatcher over `store` with a fixed chain
    pub fn new(store: Arc<ModelStore>, chain: Vec<Arc<dyn Middleware>>, config: Arc<EngineConfig>) -> Self {
        Self {
            store,
            chain,
            config,
            turn: tokio::sync::Mutex::new(()),
        }
    }

    /// The store commands are committed to
    pub fn store(&self) -> &Arc<ModelStore> {
        &self.store
    }

    /// Names of the middleware, in order
    pub fn middleware_names(&self) -> Vec<String> {
        self.chain.iter().map(|m| m.name().to_string()).collect()
    }

    /// Dispatch one command
    pub async fn emit(&self, command: Command, gesture: Option<GestureId>) -> Result<Outcome> {
        let _turn = self.turn.lock().await;
        let name = command.name();

        let prior = self.store.snapshot();
        command.validate(&prior).map_err(|e| rejected(name, e))?;
        let mut draft = (*prior).clone();
        command.apply(&mut draft, &self.config).map_err(|e| rejected(name, e))?;

        let mut ctx = PipelineContext::new(command, Arc::clone(&prior), draft, Arc::clone(&self.config));
        ctx.gesture = gesture;
        Next::new(&self.chain)
            .run(&mut ctx)
            .await
            .map_err(|e| rejected(name, e.into()))?;

        if !ctx.reached_end {
            let by = ctx.entered.unwrap_or_default();
            debug!(command = name, middleware = %by, "Command dropped");
            return Ok(Outcome::Dropped { by });
        }

        ctx.draft.check_invariants().map_err(|e| rejected(name, e.into()))?;
        if ctx.draft == *prior {
            debug!(command = name, "Command had no effect");
            return Ok(Outcome::Unchanged);
        }

        let record = if ctx.command.records_history() {
            Record::Entry {
                description: name.to_string(),
                gesture,
            }
        } else {
            Record::Skip
        };
        let diff = self.store.commit(ctx.draft, record, ChangeCause::Command(name.to_string()));
        debug!(command = name, "Command committed");
        Ok(Outcome::Committed(diff))
    }

    /// Undo the last recorded step, in order with dispatched commands
    pub async fn undo(&self) -> Result<ModelDiff> {
        let _turn = self.turn.lock().await;
        Ok(self.store.undo()?)
    }

    /// Redo the last undone step, in order with dispatched commands
    pub async fn redo(&self) -> Result<ModelDiff> {
        let _turn = self.turn.lock().await;
        Ok(self.store.redo()?)
    }

    /// Roll back everything `gesture` committed to history
    pub async fn revert_gesture(&self, gesture: GestureId) -> bool {
        let _turn = self.turn.lock().await;
        self.store.revert_gesture(gesture)
    }

    /// Replace the model outright, clearing history
    pub async fn reset(&self, state: ModelState) {
        let _turn = self.turn.lock().await;
        self.store.reset(state);
    }
}

fn rejected(command: &str, error: EngineError) -> EngineError {
    warn!(command, "Command rejected: {}", error);
    error
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;
    use trellis_graph::{Edge, Node, Point};

    /// Records the order it was entered and optionally misbehaves
    struct Recorder {
        name: String,
        log: Arc<Mutex<Vec<String>>>,
        mode: RecorderMode,
    }

    #[derive(Clone, Copy)]
    enum RecorderMode {
        Pass,
        Drop,
        Fail,
        Tag,
    }

    impl Recorder {
        fn new(name: &str, log: &Arc<Mutex<Vec<String>>>, mode: RecorderMode) -> Arc<dyn Middleware> {
            Arc::new(Self {
                name: name.to_string(),
                log: Arc::clone(log),
                mode,
            })
        }
    }

    impl Middleware for Recorder {
        fn name(&self) -> &str {
            &self.name
        }

        fn handle<'a>(&'a self, ctx: &'a mut PipelineContext, next: Next<'a>) -> BoxFuture<'a, std::result::Result<(), MiddlewareError>> {
            Box::pin(async move {
                self.log.lock().push(self.name.clone());
                match self.mode {
                    RecorderMode::Pass => next.run(ctx).await,
                    RecorderMode::Drop => Ok(()),
                    RecorderMode::Fail => {
                        ctx.draft = ModelState::new();
                        Err(MiddlewareError::new(&self.name, "refused"))
                    }
                    RecorderMode::Tag => {
                        tokio::task::yield_now().await;
                        ctx.draft.metadata.extensions.insert(self.name.clone(), json!(true));
                        next.run(ctx).await
                    }
                }
            })
        }
    }

    fn dispatcher(chain: Vec<Arc<dyn Middleware>>) -> Dispatcher {
        let store = Arc::new(ModelStore::new(
            ModelState::from_parts([Node::new("1"), Node::new("2")], []),
            100,
        ));
        Dispatcher::new(store, chain, Arc::new(EngineConfig::default()))
    }

    #[tokio::test]
    async fn test_chain_runs_in_order_and_commits() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = dispatcher(vec![
            Recorder::new("a", &log, RecorderMode::Pass),
            Recorder::new("b", &log, RecorderMode::Tag),
        ]);
        let outcome = dispatcher
            .emit(
                Command::AddEdges {
                    edges: vec![Edge::new("e", "1", "2")],
                },
                None,
            )
            .await
            .unwrap();
        assert!(outcome.is_committed());
        assert_eq!(*log.lock(), vec!["a", "b"]);
        let state = dispatcher.store().snapshot();
        assert_eq!(state.edge_count(), 1);
        assert_eq!(state.metadata.extensions["b"], json!(true));
    }

    #[tokio::test]
    async fn test_failing_middleware_leaves_state_untouched() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = dispatcher(vec![
            Recorder::new("a", &log, RecorderMode::Pass),
            Recorder::new("broken", &log, RecorderMode::Fail),
            Recorder::new("never", &log, RecorderMode::Pass),
        ]);
        let before = dispatcher.store().snapshot();
        let err = dispatcher.emit(Command::SelectAll, None).await.unwrap_err();
        assert_eq!(err, EngineError::Middleware(MiddlewareError::new("broken", "refused")));
        assert_eq!(dispatcher.store().snapshot(), before);
        assert_eq!(*log.lock(), vec!["a", "broken"]);
        assert!(!dispatcher.store().can_undo());
    }

    #[tokio::test]
    async fn test_short_circuit_drops_command() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = dispatcher(vec![Recorder::new("gate", &log, RecorderMode::Drop)]);
        let outcome = dispatcher.emit(Command::SelectAll, None).await.unwrap();
        assert_eq!(outcome, Outcome::Dropped { by: "gate".into() });
        assert!(dispatcher.store().snapshot().selected_node_ids().is_empty());
    }

    #[tokio::test]
    async fn test_reference_error_leaves_edges_unchanged() {
        let dispatcher = dispatcher(vec![]);
        dispatcher
            .emit(
                Command::AddEdges {
                    edges: vec![Edge::new("e1", "1", "2")],
                },
                None,
            )
            .await
            .unwrap();
        let err = dispatcher
            .emit(
                Command::AddEdges {
                    edges: vec![Edge::new("e2", "x", "2")],
                },
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Reference(_)));
        let edges: Vec<_> = dispatcher.store().edges().into_iter().map(|e| e.id).collect();
        assert_eq!(edges, vec!["e1".into()]);
    }

    #[tokio::test]
    async fn test_zero_move_is_unchanged_and_not_recorded() {
        let dispatcher = dispatcher(vec![]);
        let before = dispatcher.store().snapshot();
        let outcome = dispatcher
            .emit(
                Command::MoveNodesBy {
                    nodes: vec!["1".into()],
                    delta: Point::ZERO,
                },
                None,
            )
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Unchanged);
        assert_eq!(dispatcher.store().snapshot(), before);
        assert!(!dispatcher.store().can_undo());
    }

    #[tokio::test]
    async fn test_concurrent_emits_commit_in_call_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = dispatcher(vec![Recorder::new("slow", &log, RecorderMode::Tag)]);
        let first = dispatcher.emit(
            Command::MoveNodesBy {
                nodes: vec!["1".into()],
                delta: Point::new(1.0, 0.0),
            },
            None,
        );
        let second = dispatcher.emit(
            Command::MoveNodesBy {
                nodes: vec!["1".into()],
                delta: Point::new(0.0, 1.0),
            },
            None,
        );
        let (a, b) = futures::join!(first, second);
        assert!(a.unwrap().is_committed());
        assert!(b.unwrap().is_committed());
        assert_eq!(
            dispatcher.store().snapshot().node(&"1".into()).unwrap().position,
            Point::new(1.0, 1.0)
        );
        assert_eq!(dispatcher.store().history_stats().undo_count, 2);
    }

    #[tokio::test]
    async fn test_undo_redo_through_dispatcher() {
        let dispatcher = dispatcher(vec![]);
        let before = dispatcher.store().snapshot();
        dispatcher.emit(Command::SelectAll, None).await.unwrap();
        let after = dispatcher.store().snapshot();

        dispatcher.undo().await.unwrap();
        assert_eq!(dispatcher.store().snapshot(), before);
        dispatcher.redo().await.unwrap();
        assert_eq!(dispatcher.store().snapshot(), after);
        assert!(matches!(dispatcher.redo().await, Err(EngineError::History(_))));
    }
}
