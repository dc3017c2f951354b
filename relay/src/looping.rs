//! Drive loop for `relay play`: planner, controller, gate, coordinator.

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::coordinator::ExecutionCoordinator;
use crate::core::danger::DangerPolicy;
use crate::core::planner::{self, Planner, PlannerDecision};
use crate::core::session::Session;
use crate::core::types::TurnKind;
use crate::io::executor::CommandExecutor;
use crate::io::human::{GateDecision, HumanGate};

/// Reason why `run_loop` stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopStop {
    /// The planner emitted a final report; the session is closed.
    Completed { report: String },
    /// The operator interrupted the in-flight batch with a question.
    Interrupted { question: String },
    /// The planner wants a human reply before deciding again.
    AwaitingHuman,
    /// Issuing another batch would exceed `max_batches`.
    MaxBatchesExceeded { issued: u32, max_batches: u32 },
}

/// Summary of a loop invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopOutcome {
    pub session_id: String,
    /// Batches issued over the whole session, including earlier invocations.
    pub batches_issued: u32,
    pub stop: LoopStop,
}

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub max_batches: u32,
    pub danger: DangerPolicy,
}

/// Run the session forward until it completes, is interrupted, waits for a
/// human, or hits `max_batches`.
///
/// `max_batches` bounds the batches issued over the whole session, so
/// resuming after an interrupt continues the same count.
///
/// `on_turn` runs after every appended turn (the CLI persists the session
/// there). Structural errors and `on_turn` failures stop the loop with `Err`.
pub fn run_loop<P, E, G, F>(
    session: &mut Session,
    planner: &P,
    coordinator: &ExecutionCoordinator,
    executor: &mut E,
    gate: &mut G,
    config: &LoopConfig,
    mut on_turn: F,
) -> Result<LoopOutcome>
where
    P: Planner + ?Sized,
    E: CommandExecutor + ?Sized,
    G: HumanGate + ?Sized,
    F: FnMut(&Session) -> Result<()>,
{
    let mut issued =
        u32::try_from(session.count_kind(TurnKind::CommandBatch)).unwrap_or(u32::MAX);
    let outcome = |session: &Session, issued: u32, stop: LoopStop| LoopOutcome {
        session_id: session.id().to_string(),
        batches_issued: issued,
        stop,
    };

    loop {
        match planner::next(session, planner)? {
            PlannerDecision::IssueBatch(mut batch) => {
                if issued >= config.max_batches {
                    return Ok(outcome(
                        session,
                        issued,
                        LoopStop::MaxBatchesExceeded {
                            issued,
                            max_batches: config.max_batches,
                        },
                    ));
                }
                let flagged = config.danger.annotate(&mut batch);
                let index = session.begin_batch(batch.clone())?;
                issued += 1;
                info!(index, commands = batch.len(), flagged, "batch issued");
                on_turn(session).context("record issued batch")?;

                match gate.review(index, &batch)? {
                    GateDecision::Run => {
                        let result = coordinator.execute(executor, &batch)?;
                        debug!(index, success = result.is_success(), "batch resolved");
                        session.resolve_with_result(result)?;
                        on_turn(session).context("record execution result")?;
                    }
                    GateDecision::Interrupt(question) => {
                        session.interrupt(question.clone())?;
                        info!(index, "batch interrupted");
                        on_turn(session).context("record interrupt")?;
                        return Ok(outcome(
                            session,
                            issued,
                            LoopStop::Interrupted { question },
                        ));
                    }
                }
            }
            PlannerDecision::EmitReport(report) => {
                session.complete(report.clone())?;
                info!(turns = session.turn_count(), "session completed");
                on_turn(session).context("record final report")?;
                return Ok(outcome(session, issued, LoopStop::Completed { report }));
            }
            PlannerDecision::AwaitHumanReply => {
                return Ok(outcome(session, issued, LoopStop::AwaitingHuman));
            }
        }
    }
}
