//! Batch planner contract.
//!
//! Decision policy (turning a goal into commands) lives outside the core. This
//! module fixes the three decision shapes, the read-only record a planner sees,
//! and the precondition on when a decision may be requested.

use crate::core::error::{Operation, RelayError};
use crate::core::session::Session;
use crate::core::types::{CommandBatch, ExecutionResult, Mode, Turn, TurnPayload};

/// Next unit of work chosen by a planner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannerDecision {
    IssueBatch(CommandBatch),
    EmitReport(String),
    AwaitHumanReply,
}

/// Read-only view of a session, assembled by the controller.
#[derive(Debug, Clone, Copy)]
pub struct PlannerRecord<'a> {
    pub session_id: &'a str,
    pub goal: &'a str,
    pub mode: Mode,
    /// Advisory: the last resolved batch had a failing command.
    pub last_batch_failed: bool,
    /// Text of the latest chat interrupt not yet followed by an execution result.
    pub last_interrupt: Option<&'a str>,
    pub turns: &'a [Turn],
}

impl<'a> PlannerRecord<'a> {
    /// Execution results in transcript order.
    pub fn results(self) -> impl Iterator<Item = &'a ExecutionResult> {
        self.turns.iter().filter_map(|turn| match &turn.payload {
            TurnPayload::ExecutionResult(result) => Some(result),
            _ => None,
        })
    }

    pub fn last_result(self) -> Option<&'a ExecutionResult> {
        self.results().last()
    }

    pub fn resolved_batches(self) -> usize {
        self.results().count()
    }
}

/// Decision policy. Implementations must not depend on anything but the record.
pub trait Planner {
    fn decide(&self, record: &PlannerRecord<'_>) -> PlannerDecision;
}

/// Ask `planner` for the next decision. Valid only while the session is `Planning`.
pub fn next<P: Planner + ?Sized>(
    session: &Session,
    planner: &P,
) -> Result<PlannerDecision, RelayError> {
    session.guard(Operation::Plan, Mode::Planning)?;
    Ok(planner.decide(&session.record()))
}
