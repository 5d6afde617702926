// SPDX-License-Identifier: MIT OR Apache-2.0
//! Canonical model storage, history and change notification.
//!
//! The store is the only owner of the current [`ModelState`]. Readers get a
//! shared snapshot; writers go through the dispatcher, which calls
//! [`ModelStore::commit`] once per accepted command.

use crate::error::HistoryError;
use crate::history::{GestureId, History, HistoryEntry, HistoryStats};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;
use trellis_graph::{Edge, EdgeId, Metadata, ModelState, Node, NodeId};

/// Why the model changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeCause {
    /// The model was seeded by engine initialization
    Init,
    /// A command was committed
    Command(String),
    /// An undo restored an earlier snapshot
    Undo,
    /// A redo restored a later snapshot
    Redo,
    /// A cancelled gesture was rolled back
    Revert,
}

/// Entity-level difference between two states
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDiff {
    /// Nodes present only in the new state
    pub added_nodes: Vec<NodeId>,
    /// Nodes present only in the old state
    pub removed_nodes: Vec<NodeId>,
    /// Nodes present in both but changed
    pub updated_nodes: Vec<NodeId>,
    /// Edges present only in the new state
    pub added_edges: Vec<EdgeId>,
    /// Edges present only in the old state
    pub removed_edges: Vec<EdgeId>,
    /// Edges present in both but changed
    pub updated_edges: Vec<EdgeId>,
    /// Whether metadata differs
    pub metadata_changed: bool,
}

impl ModelDiff {
    /// Compute the difference from `before` to `after`
    pub fn between(before: &ModelState, after: &ModelState) -> Self {
        let mut diff = Self::default();

        for node in after.nodes() {
            match before.node(&node.id) {
                None => diff.added_nodes.push(node.id.clone()),
                Some(old) if old != node => diff.updated_nodes.push(node.id.clone()),
                Some(_) => {}
            }
        }
        diff.removed_nodes = before
            .node_ids()
            .filter(|id| !after.contains_node(id))
            .cloned()
            .collect();

        for edge in after.edges() {
            match before.edge(&edge.id) {
                None => diff.added_edges.push(edge.id.clone()),
                Some(old) if old != edge => diff.updated_edges.push(edge.id.clone()),
                Some(_) => {}
            }
        }
        diff.removed_edges = before
            .edges()
            .filter(|e| !after.contains_edge(&e.id))
            .map(|e| e.id.clone())
            .collect();

        diff.metadata_changed = before.metadata != after.metadata;
        diff
    }

    /// Whether nothing changed
    pub fn is_empty(&self) -> bool {
        self.added_nodes.is_empty()
            && self.removed_nodes.is_empty()
            && self.updated_nodes.is_empty()
            && self.added_edges.is_empty()
            && self.removed_edges.is_empty()
            && self.updated_edges.is_empty()
            && !self.metadata_changed
    }
}

/// Delivered to subscribers after every change
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    /// The new canonical state
    pub state: Arc<ModelState>,
    /// What changed relative to the previous state
    pub diff: ModelDiff,
    /// What caused the change
    pub cause: ChangeCause,
}

/// Handle returned by [`ModelStore::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Change listener
pub type Listener = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

/// How a commit interacts with history
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Record {
    /// Not recorded (transient state)
    Skip,
    /// Recorded under a description, optionally coalesced by gesture
    Entry {
        description: String,
        gesture: Option<GestureId>,
    },
}

#[derive(Debug)]
struct StoreInner {
    state: Arc<ModelState>,
    history: History,
}

/// Owner of the canonical model
pub struct ModelStore {
    inner: RwLock<StoreInner>,
    listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
    next_subscription: AtomicU64,
}

impl std::fmt::Debug for ModelStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelStore")
            .field("inner", &self.inner)
            .field("listeners", &self.listeners.lock().len())
            .finish()
    }
}

impl Default for ModelStore {
    fn default() -> Self {
        Self::new(ModelState::new(), crate::history::MAX_HISTORY)
    }
}

impl ModelStore {
    /// Create a store holding `state`
    pub fn new(state: ModelState, max_history: usize) -> Self {
        Self {
            inner: RwLock::new(StoreInner {
                state: Arc::new(state),
                history: History::with_max_depth(max_history),
            }),
            listeners: Mutex::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
        }
    }

    /// Shared snapshot of the current state
    pub fn snapshot(&self) -> Arc<ModelState> {
        Arc::clone(&self.inner.read().state)
    }

    /// All nodes, in insertion order
    pub fn nodes(&self) -> Vec<Node> {
        self.inner.read().state.nodes().cloned().collect()
    }

    /// All edges, in insertion order
    pub fn edges(&self) -> Vec<Edge> {
        self.inner.read().state.edges().cloned().collect()
    }

    /// Current metadata
    pub fn metadata(&self) -> Metadata {
        self.inner.read().state.metadata.clone()
    }

    /// Atomically replace the state and notify subscribers
    pub(crate) fn commit(&self, next: ModelState, record: Record, cause: ChangeCause) -> ModelDiff {
        let next = Arc::new(next);
        let (previous, diff) = {
            let mut inner = self.inner.write();
            let previous = std::mem::replace(&mut inner.state, Arc::clone(&next));
            if let Record::Entry { description, gesture } = record {
                inner
                    .history
                    .record(HistoryEntry::new(description, Arc::clone(&previous), Arc::clone(&next)).with_gesture(gesture));
            }
            let diff = ModelDiff::between(&previous, &next);
            (previous, diff)
        };
        drop(previous);
        self.notify(&ChangeEvent {
            state: next,
            diff: diff.clone(),
            cause,
        });
        diff
    }

    /// Replace the state wholesale and forget all history
    pub(crate) fn reset(&self, state: ModelState) {
        {
            let mut inner = self.inner.write();
            inner.state = Arc::new(state);
            inner.history.clear();
        }
        let state = self.snapshot();
        let diff = ModelDiff::between(&ModelState::new(), &state);
        self.notify(&ChangeEvent {
            state,
            diff,
            cause: ChangeCause::Init,
        });
    }

    /// Restore the state before the last recorded step
    pub(crate) fn undo(&self) -> Result<ModelDiff, HistoryError> {
        let entry = self.inner.write().history.undo()?;
        info!("Undo: {}", entry.description);
        Ok(self.restore(&entry.before, ChangeCause::Undo))
    }

    /// Re-apply the last undone step
    pub(crate) fn redo(&self) -> Result<ModelDiff, HistoryError> {
        let entry = self.inner.write().history.redo()?;
        info!("Redo: {}", entry.description);
        Ok(self.restore(&entry.after, ChangeCause::Redo))
    }

    /// Roll back everything `gesture` recorded; returns whether anything was reverted
    pub(crate) fn revert_gesture(&self, gesture: GestureId) -> bool {
        let entry = self.inner.write().history.revert_gesture(gesture);
        match entry {
            Some(entry) => {
                self.restore(&entry.before, ChangeCause::Revert);
                true
            }
            None => false,
        }
    }

    /// Swap in a recorded snapshot, keeping the live transient metadata
    fn restore(&self, snapshot: &ModelState, cause: ChangeCause) -> ModelDiff {
        let (next, diff) = {
            let mut inner = self.inner.write();
            let mut next = snapshot.clone();
            next.metadata.keep_transient_from(&inner.state.metadata);
            next.drop_stale_transients();
            let next = Arc::new(next);
            let diff = ModelDiff::between(&inner.state, &next);
            inner.state = Arc::clone(&next);
            (next, diff)
        };
        self.notify(&ChangeEvent {
            state: next,
            diff: diff.clone(),
            cause,
        });
        diff
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        self.inner.read().history.can_undo()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        self.inner.read().history.can_redo()
    }

    /// History statistics
    pub fn history_stats(&self) -> HistoryStats {
        self.inner.read().history.stats()
    }

    /// Register a change listener
    pub fn subscribe(&self, listener: impl Fn(&ChangeEvent) + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().push((id, Arc::new(listener)));
        id
    }

    /// Remove a change listener; returns whether it was registered
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Remove every listener
    pub(crate) fn clear_subscribers(&self) {
        self.listeners.lock().clear();
    }

    /// Listeners run without any store lock held, so they may read the store
    fn notify(&self, event: &ChangeEvent) {
        let listeners: Vec<Listener> = self.listeners.lock().iter().map(|(_, l)| Arc::clone(l)).collect();
        for listener in listeners {
            listener(event);
        }
    }
}
