// SPDX-License-Identifier: MIT OR Apache-2.0
//! Interactive diagram editing engine for Trellis.
//!
//! Everything that changes a diagram goes through one path:
//!
//! ```text
//! input events ──► InputInterpreter ──┐
//!                                     ├──► Dispatcher ──► middleware chain ──► ModelStore
//! host code ──────► Command ──────────┘                                         │
//!                                                     subscribers ◄─────────────┘
//! ```
//!
//! - [`commands`]: the typed command set, validated then applied to a draft
//! - [`pipeline`]: the dispatcher and the [`Middleware`] chain
//! - [`middleware`]: built-in tracing, group auto-resize and edge routing
//! - [`store`] and [`history`]: immutable snapshots with undo/redo
//! - [`input`]: pointer gestures, keyboard shortcuts and wheel zoom/pan
//! - [`grouping`] and [`viewport`]: group membership and pan/zoom math
//! - [`semaphore`]: FIFO counting semaphore for bounding async middleware
//!
//! [`DiagramEngine`] wires these together.

pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod grouping;
pub mod history;
pub mod input;
pub mod middleware;
pub mod pipeline;
pub mod semaphore;
pub mod store;
pub mod viewport;

pub use commands::Command;
pub use config::{EngineConfig, LinkDraft, Strategies};
pub use engine::{DiagramEngine, EngineBuilder};
pub use error::{
    ConcurrencyError, ConfigError, EngineError, HistoryError, MiddlewareError, ReferenceError, Result,
    ValidationError,
};
pub use history::GestureId;
pub use input::{InputEvent, InputInterpreter, Key, KeyEvent, Modifiers, PointerEvent, PointerKind, PointerTarget};
pub use middleware::{Bounded, EdgeRoutingMiddleware, GroupAutoResizeMiddleware, TracingMiddleware};
pub use pipeline::{Dispatcher, Middleware, Next, Outcome, PipelineContext};
pub use semaphore::{Semaphore, SemaphorePermit};
pub use store::{ChangeCause, ChangeEvent, ModelDiff, ModelStore, SubscriptionId};
