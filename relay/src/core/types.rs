//! Shared deterministic types for the relay core.
//!
//! These are the value objects embedded in a session transcript. They carry no
//! behaviour beyond construction-time validation and simple queries, and they
//! serialize to a stable JSON shape for the session store.

use std::borrow::Cow;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::error::RelayError;

/// Session mode (the controller's state machine).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Planning,
    AwaitingExecution,
    Interrupted,
    Completed,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Planning => "planning",
            Mode::AwaitingExecution => "awaiting_execution",
            Mode::Interrupted => "interrupted",
            Mode::Completed => "completed",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One command proposed by the agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    /// Advisory only; `None` means nobody has classified the command yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dangerous: Option<bool>,
}

impl CommandSpec {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            rationale: None,
            dangerous: None,
        }
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = Some(rationale.into());
        self
    }

    pub fn is_dangerous(&self) -> bool {
        self.dangerous == Some(true)
    }
}

/// Ordered, non-empty list of commands executed as one fail-fast unit.
///
/// Deserialization does not validate; [`CommandBatch::validate`] runs again at
/// every boundary that accepts a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandBatch {
    commands: Vec<CommandSpec>,
}

impl CommandBatch {
    pub fn new(commands: Vec<CommandSpec>) -> Result<Self, RelayError> {
        let batch = Self { commands };
        batch.validate()?;
        Ok(batch)
    }

    /// Build a batch from bare command strings.
    pub fn from_commands<I, S>(commands: I) -> Result<Self, RelayError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(commands.into_iter().map(CommandSpec::new).collect())
    }

    pub fn validate(&self) -> Result<(), RelayError> {
        if self.commands.is_empty() {
            return Err(RelayError::InvalidBatch("batch is empty".to_string()));
        }
        if let Some(pos) = self
            .commands
            .iter()
            .position(|spec| spec.command.trim().is_empty())
        {
            return Err(RelayError::InvalidBatch(format!(
                "command {} is blank",
                pos + 1
            )));
        }
        Ok(())
    }

    pub fn commands(&self) -> &[CommandSpec] {
        &self.commands
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CommandSpec> {
        self.commands.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, CommandSpec> {
        self.commands.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Exit status of one attempted command, already judged against the exit policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExitStatus {
    Success { code: i32 },
    Failure { code: i32 },
    /// No usable exit code: killed, timed out, or the executor could not run it.
    Abnormal { reason: String },
}

impl ExitStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, ExitStatus::Success { .. })
    }

    pub fn code(&self) -> Option<i32> {
        match self {
            ExitStatus::Success { code } | ExitStatus::Failure { code } => Some(*code),
            ExitStatus::Abnormal { .. } => None,
        }
    }
}

/// Captured command output, treated as an opaque byte blob.
///
/// Serialized as (lossy) UTF-8 text so transcripts stay readable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputBlob(Vec<u8>);

impl OutputBlob {
    pub fn to_text_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }
}

impl From<Vec<u8>> for OutputBlob {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&str> for OutputBlob {
    fn from(text: &str) -> Self {
        Self(text.as_bytes().to_vec())
    }
}

impl Serialize for OutputBlob {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_text_lossy())
    }
}

impl<'de> Deserialize<'de> for OutputBlob {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(Self(text.into_bytes()))
    }
}

/// Record of one command the coordinator dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutcome {
    pub command: String,
    pub status: ExitStatus,
    pub output: OutputBlob,
    pub attempted: bool,
}

impl CommandOutcome {
    pub fn attempted(
        command: impl Into<String>,
        status: ExitStatus,
        output: impl Into<OutputBlob>,
    ) -> Self {
        Self {
            command: command.into(),
            status,
            output: output.into(),
            attempted: true,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Outcomes for a prefix of a batch, truncated at the first failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub outcomes: Vec<CommandOutcome>,
    /// Length of the batch this result was produced from.
    pub batch_len: usize,
}

impl ExecutionResult {
    /// True when every command in the batch was attempted and succeeded.
    pub fn is_success(&self) -> bool {
        self.outcomes.len() == self.batch_len && self.outcomes.iter().all(|o| o.is_success())
    }

    /// The failing outcome, which is always the last one present.
    pub fn failed_outcome(&self) -> Option<&CommandOutcome> {
        self.outcomes.last().filter(|o| !o.is_success())
    }

    /// Number of commands past the halt point that were never attempted.
    pub fn not_attempted(&self) -> usize {
        self.batch_len.saturating_sub(self.outcomes.len())
    }

    /// Check that this result is a well-formed record of `batch`.
    ///
    /// - `batch_len` matches and outcomes are a prefix of the batch, in order
    /// - every outcome is marked attempted
    /// - a failure, if any, is the last outcome
    /// - a result shorter than the batch ends in a failure
    pub fn check_prefix_of(&self, batch: &CommandBatch) -> Result<(), String> {
        if self.batch_len != batch.len() {
            return Err(format!(
                "result is for a batch of {} commands, in-flight batch has {}",
                self.batch_len,
                batch.len()
            ));
        }
        if self.outcomes.len() > batch.len() {
            return Err(format!(
                "result has {} outcomes for a batch of {}",
                self.outcomes.len(),
                batch.len()
            ));
        }
        for (pos, (outcome, spec)) in self.outcomes.iter().zip(batch.iter()).enumerate() {
            if outcome.command != spec.command {
                return Err(format!(
                    "outcome {} is for '{}', expected '{}'",
                    pos + 1,
                    outcome.command,
                    spec.command
                ));
            }
            if !outcome.attempted {
                return Err(format!("outcome {} is not marked attempted", pos + 1));
            }
            let is_last = pos + 1 == self.outcomes.len();
            if !outcome.is_success() && !is_last {
                return Err(format!(
                    "outcome {} failed but later commands were recorded",
                    pos + 1
                ));
            }
        }
        if self.outcomes.len() < batch.len() && self.failed_outcome().is_none() {
            return Err(format!(
                "result stops after {} of {} commands without a failure",
                self.outcomes.len(),
                batch.len()
            ));
        }
        Ok(())
    }
}

/// Free-form human input that suspended an in-flight batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatInterrupt {
    pub text: String,
    /// Turn index of the interrupted batch.
    pub interrupted_batch: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnKind {
    CommandBatch,
    ExecutionResult,
    ChatInterrupt,
    FinalReport,
}

impl TurnKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TurnKind::CommandBatch => "command_batch",
            TurnKind::ExecutionResult => "execution_result",
            TurnKind::ChatInterrupt => "chat_interrupt",
            TurnKind::FinalReport => "final_report",
        }
    }
}

impl fmt::Display for TurnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum TurnPayload {
    CommandBatch(CommandBatch),
    ExecutionResult(ExecutionResult),
    ChatInterrupt(ChatInterrupt),
    FinalReport(String),
}

impl TurnPayload {
    pub fn kind(&self) -> TurnKind {
        match self {
            TurnPayload::CommandBatch(_) => TurnKind::CommandBatch,
            TurnPayload::ExecutionResult(_) => TurnKind::ExecutionResult,
            TurnPayload::ChatInterrupt(_) => TurnKind::ChatInterrupt,
            TurnPayload::FinalReport(_) => TurnKind::FinalReport,
        }
    }
}

/// Immutable transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub index: u64,
    pub payload: TurnPayload,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn kind(&self) -> TurnKind {
        self.payload.kind()
    }
}
