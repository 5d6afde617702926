// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error taxonomy for the engine.
//!
//! Validation runs before any draft exists; reference errors come from the
//! component that finds the dangling id; middleware errors abort the whole
//! command. Every error reaches the `emit` caller.

use thiserror::Error;
use trellis_graph::{EdgeId, InvariantViolation, NodeId, PortId};

/// Malformed command payload
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required list was empty
    #[error("{command}: `{field}` must not be empty")]
    Empty {
        /// Command name
        command: &'static str,
        /// Field name
        field: &'static str,
    },

    /// An id was the empty string
    #[error("{command}: empty id in `{field}`")]
    EmptyId {
        /// Command name
        command: &'static str,
        /// Field name
        field: &'static str,
    },

    /// The same id appears twice in one payload
    #[error("{command}: duplicate id `{id}`")]
    DuplicateId {
        /// Command name
        command: &'static str,
        /// Repeated id
        id: String,
    },

    /// An entity with this id already exists
    #[error("{command}: id `{id}` already exists")]
    AlreadyExists {
        /// Command name
        command: &'static str,
        /// Existing id
        id: String,
    },

    /// A number was NaN or infinite
    #[error("{command}: `{field}` must be finite")]
    NotFinite {
        /// Command name
        command: &'static str,
        /// Field name
        field: &'static str,
    },

    /// A value was outside its allowed range
    #[error("{command}: `{field}` out of range: {reason}")]
    OutOfRange {
        /// Command name
        command: &'static str,
        /// Field name
        field: &'static str,
        /// Human-readable explanation
        reason: String,
    },

    /// Grouping would make a node its own ancestor
    #[error("Adding {node} to {group} would create a group cycle")]
    GroupCycle {
        /// Group being added to
        group: NodeId,
        /// Node being added
        node: NodeId,
    },
}

/// A command referenced an entity that does not exist
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReferenceError {
    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Edge not found
    #[error("Edge not found: {0}")]
    EdgeNotFound(EdgeId),

    /// Port not found on a node
    #[error("Port {port} not found on node {node}")]
    PortNotFound {
        /// Node that was searched
        node: NodeId,
        /// Missing port
        port: PortId,
    },

    /// Group id does not reference a group node
    #[error("Node {0} is not a group")]
    NotAGroup(NodeId),
}

/// A middleware signalled failure
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Middleware `{middleware}` failed: {message}")]
pub struct MiddlewareError {
    /// Name of the failing middleware
    pub middleware: String,
    /// Failure description
    pub message: String,
}

impl MiddlewareError {
    /// Create a new middleware error
    pub fn new(middleware: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            middleware: middleware.into(),
            message: message.into(),
        }
    }
}

/// Semaphore misuse
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConcurrencyError {
    /// A semaphore must start with at least one permit
    #[error("Semaphore needs at least one permit")]
    NoPermits,

    /// `release` called more often than `acquire`
    #[error("Semaphore released without a matching acquire")]
    UnbalancedRelease,
}

/// History errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    /// Nothing to undo
    #[error("Nothing to undo")]
    NothingToUndo,

    /// Nothing to redo
    #[error("Nothing to redo")]
    NothingToRedo,
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("File read error: {0}")]
    Io(#[from] std::io::Error),

    /// RON could not be parsed
    #[error("Deserialization error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// A value is out of its allowed range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Any error surfaced by the engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Malformed command
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Dangling reference
    #[error(transparent)]
    Reference(#[from] ReferenceError),

    /// Middleware failure
    #[error(transparent)]
    Middleware(#[from] MiddlewareError),

    /// Semaphore misuse
    #[error(transparent)]
    Concurrency(#[from] ConcurrencyError),

    /// Undo/redo at the history bounds
    #[error(transparent)]
    History(#[from] HistoryError),

    /// The draft broke a model invariant and was not committed
    #[error("Draft rejected: {0}")]
    Invariant(#[from] InvariantViolation),
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
