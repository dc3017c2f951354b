//! Session aggregate and the transcript/resume state machine.
//!
//! ```text
//! Planning --begin_batch--> AwaitingExecution
//! AwaitingExecution --resolve_with_result--> Planning
//! AwaitingExecution --interrupt--> Interrupted
//! Interrupted --resume--> Planning
//! Planning --complete--> Completed (terminal)
//! ```
//!
//! Every operation checks its guards before touching any field, so a rejected
//! call leaves the session unchanged and does not consume a turn index.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::error::{Operation, RelayError};
use crate::core::planner::PlannerRecord;
use crate::core::signal::{HumanSignal, classify_reply};
use crate::core::types::{
    ChatInterrupt, CommandBatch, ExecutionResult, Mode, Turn, TurnKind, TurnPayload,
};

/// State of one agent/human interaction for a single task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    id: String,
    goal: String,
    turns: Vec<Turn>,
    mode: Mode,
    /// Next turn index (monotonically increasing).
    next_index: u64,
    /// Advisory for the planner: the last resolved batch had a failing command.
    last_batch_failed: bool,
    /// Turn index of the batch awaiting execution, if any.
    in_flight: Option<u64>,
}

impl Session {
    pub fn new(goal: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), goal)
    }

    pub fn with_id(id: impl Into<String>, goal: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            goal: goal.into(),
            turns: Vec::new(),
            mode: Mode::Planning,
            next_index: 0,
            last_batch_failed: false,
            in_flight: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn goal(&self) -> &str {
        &self.goal
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn turn_count(&self) -> usize {
        self.turns.len()
    }

    pub fn last_batch_failed(&self) -> bool {
        self.last_batch_failed
    }

    pub fn in_flight_batch(&self) -> Option<&CommandBatch> {
        let index = self.in_flight?;
        self.turns.iter().find_map(|turn| match &turn.payload {
            TurnPayload::CommandBatch(batch) if turn.index == index => Some(batch),
            _ => None,
        })
    }

    pub fn is_closed(&self) -> bool {
        self.mode == Mode::Completed
    }

    /// Issue a batch. Valid only in `Planning`.
    pub fn begin_batch(&mut self, batch: CommandBatch) -> Result<u64, RelayError> {
        self.guard(Operation::BeginBatch, Mode::Planning)?;
        batch.validate()?;
        let index = self.append(TurnPayload::CommandBatch(batch));
        self.in_flight = Some(index);
        self.mode = Mode::AwaitingExecution;
        Ok(index)
    }

    /// Record the result of the in-flight batch. Valid only in `AwaitingExecution`.
    ///
    /// A failing result returns the session to `Planning` with the
    /// `last_batch_failed` advisory set; what happens next is the planner's call.
    pub fn resolve_with_result(&mut self, result: ExecutionResult) -> Result<u64, RelayError> {
        self.guard(Operation::ResolveWithResult, Mode::AwaitingExecution)?;
        let batch = self.in_flight_batch().ok_or_else(|| {
            RelayError::InvalidResult("no in-flight batch to resolve".to_string())
        })?;
        result
            .check_prefix_of(batch)
            .map_err(RelayError::InvalidResult)?;

        let failed = !result.is_success();
        let index = self.append(TurnPayload::ExecutionResult(result));
        self.last_batch_failed = failed;
        self.in_flight = None;
        self.mode = Mode::Planning;
        Ok(index)
    }

    /// Suspend the in-flight batch with a free-form question.
    ///
    /// The batch is left permanently unresolved: no partial result is ever
    /// synthesized for it.
    pub fn interrupt(&mut self, text: impl Into<String>) -> Result<u64, RelayError> {
        self.guard(Operation::Interrupt, Mode::AwaitingExecution)?;
        let interrupt = ChatInterrupt {
            text: text.into(),
            interrupted_batch: self.in_flight,
        };
        let index = self.append(TurnPayload::ChatInterrupt(interrupt));
        self.in_flight = None;
        self.mode = Mode::Interrupted;
        Ok(index)
    }

    /// Return to `Planning` after an interruption. Requires an explicit call.
    pub fn resume(&mut self) -> Result<(), RelayError> {
        self.guard(Operation::Resume, Mode::Interrupted)?;
        self.mode = Mode::Planning;
        Ok(())
    }

    /// Close the session with a final report. Valid only in `Planning`.
    pub fn complete(&mut self, report: impl Into<String>) -> Result<u64, RelayError> {
        self.guard(Operation::Complete, Mode::Planning)?;
        let index = self.append(TurnPayload::FinalReport(report.into()));
        self.mode = Mode::Completed;
        Ok(index)
    }

    /// Interpret a human reply: the continue token resumes, anything else interrupts.
    pub fn apply_human_reply(
        &mut self,
        text: &str,
        continue_token: &str,
    ) -> Result<HumanSignal, RelayError> {
        let signal = classify_reply(text, continue_token);
        match &signal {
            HumanSignal::Continue => self.resume()?,
            HumanSignal::Chat(question) => {
                self.interrupt(question.clone())?;
            }
        }
        Ok(signal)
    }

    /// Read-only view assembled for the planner.
    ///
    /// `last_interrupt` only looks at turns after the latest execution result:
    /// once a batch resolves, earlier questions are history.
    pub fn record(&self) -> PlannerRecord<'_> {
        let last_interrupt = self
            .turns
            .iter()
            .rev()
            .take_while(|turn| turn.kind() != TurnKind::ExecutionResult)
            .find_map(|turn| match &turn.payload {
                TurnPayload::ChatInterrupt(interrupt) => Some(interrupt.text.as_str()),
                _ => None,
            });
        PlannerRecord {
            session_id: &self.id,
            goal: &self.goal,
            mode: self.mode,
            last_batch_failed: self.last_batch_failed,
            last_interrupt,
            turns: &self.turns,
        }
    }

    /// Number of turns of `kind` in the transcript.
    pub fn count_kind(&self, kind: TurnKind) -> usize {
        self.turns.iter().filter(|turn| turn.kind() == kind).count()
    }

    pub(crate) fn guard(&self, operation: Operation, required: Mode) -> Result<(), RelayError> {
        if self.is_closed() {
            return Err(RelayError::SessionClosed { operation });
        }
        if self.mode != required {
            return Err(RelayError::WrongMode {
                operation,
                mode: self.mode,
            });
        }
        Ok(())
    }

    fn append(&mut self, payload: TurnPayload) -> u64 {
        let index = self.next_index;
        self.turns.push(Turn {
            index,
            payload,
            timestamp: Utc::now(),
        });
        self.next_index += 1;
        index
    }
}
