// SPDX-License-Identifier: MIT OR Apache-2.0
//! Recorded session files.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use trellis_engine::{Command, EngineConfig, InputEvent};
use trellis_graph::{Edge, Node, Size};

/// Session loading errors
#[derive(Debug, Error)]
pub enum SessionError {
    /// The file could not be read
    #[error("Failed to read session: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not a valid session
    #[error("Failed to parse session: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

/// One recorded step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Step {
    /// Raw input for the gesture interpreter
    Input(InputEvent),
    /// A command dispatched directly
    Emit(Command),
    /// Undo the last recorded step
    Undo,
    /// Redo the last undone step
    Redo,
}

/// Initial model plus the steps applied to it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
    /// Engine configuration
    pub config: EngineConfig,
    /// Client area size
    pub viewport_size: Option<Size>,
    /// Initial nodes
    pub nodes: Vec<Node>,
    /// Initial edges
    pub edges: Vec<Edge>,
    /// Steps to replay, in order
    pub steps: Vec<Step>,
}

impl Session {
    /// Parse a session from RON text
    pub fn from_ron(text: &str) -> Result<Self, SessionError> {
        Ok(ron::from_str(text)?)
    }

    /// Read a session file
    pub fn load(path: &Path) -> Result<Self, SessionError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_ron(&text)
    }
}
