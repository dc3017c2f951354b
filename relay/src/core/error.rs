//! Structural errors raised by the relay core.
//!
//! A failing command is never an error here: it is recorded as data inside an
//! [`ExecutionResult`](crate::core::types::ExecutionResult). Every variant below
//! is raised before any mutation, so the session is left exactly as it was.

use std::fmt;

use thiserror::Error;

use crate::core::types::Mode;

/// Controller/planner operation names, used in error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    BeginBatch,
    ResolveWithResult,
    Interrupt,
    Resume,
    Complete,
    Plan,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::BeginBatch => "begin_batch",
            Operation::ResolveWithResult => "resolve_with_result",
            Operation::Interrupt => "interrupt",
            Operation::Resume => "resume",
            Operation::Complete => "complete",
            Operation::Plan => "plan",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    /// Empty or malformed batch; nothing was attempted.
    #[error("invalid batch: {0}")]
    InvalidBatch(String),
    /// Execution result that does not describe the in-flight batch.
    #[error("invalid result: {0}")]
    InvalidResult(String),
    #[error("{operation} is not allowed while the session is {mode}")]
    WrongMode { operation: Operation, mode: Mode },
    #[error("session is closed: {operation} rejected")]
    SessionClosed { operation: Operation },
}

impl RelayError {
    /// True for caller logic errors (`WrongMode` / `SessionClosed`).
    pub fn is_mode_error(&self) -> bool {
        matches!(
            self,
            RelayError::WrongMode { .. } | RelayError::SessionClosed { .. }
        )
    }
}
