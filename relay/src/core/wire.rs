//! Agent-facing wire encoding.
//!
//! A batch arrives as `{"data": "<cmd>"}` or `{"data": ["<cmd>", ...]}`; both
//! shapes decode to a [`CommandBatch`], and a bare string is exactly a
//! one-element batch. Responses list every attempted command in batch order,
//! stopping at the first failure.

use serde::{Deserialize, Serialize};

use crate::core::error::RelayError;
use crate::core::types::{CommandBatch, ExecutionResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchMessage {
    pub data: CommandData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandData {
    Single(String),
    Sequence(Vec<String>),
}

impl CommandData {
    pub fn into_commands(self) -> Vec<String> {
        match self {
            CommandData::Single(command) => vec![command],
            CommandData::Sequence(commands) => commands,
        }
    }
}

impl BatchMessage {
    pub fn into_batch(self) -> Result<CommandBatch, RelayError> {
        CommandBatch::from_commands(self.data.into_commands())
    }

    /// Encode `batch` (always as a sequence).
    pub fn from_batch(batch: &CommandBatch) -> Self {
        Self {
            data: CommandData::Sequence(batch.iter().map(|spec| spec.command.clone()).collect()),
        }
    }
}

/// Response for one executed batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResponse {
    pub success: bool,
    pub data: Vec<CommandReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandReport {
    pub command: String,
    pub success: bool,
    pub exit_code: Option<i32>,
    pub output: String,
}

impl From<&ExecutionResult> for BatchResponse {
    fn from(result: &ExecutionResult) -> Self {
        let data = result
            .outcomes
            .iter()
            .map(|outcome| CommandReport {
                command: outcome.command.clone(),
                success: outcome.is_success(),
                exit_code: outcome.status.code(),
                output: outcome.output.to_text_lossy().into_owned(),
            })
            .collect();
        Self {
            success: result.is_success(),
            data,
        }
    }
}
