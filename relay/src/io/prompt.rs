//! Markdown rendering of a session record for humans.

use anyhow::{Context, Result};
use minijinja::{Environment, context};
use serde::Serialize;
use tracing::debug;

use crate::core::planner::PlannerRecord;
use crate::core::types::{ExitStatus, Turn, TurnPayload};

const RECORD_TEMPLATE: &str = include_str!("prompts/record.md");

#[derive(Debug, Clone, Serialize)]
struct CommandView {
    command: String,
    rationale: Option<String>,
    dangerous: bool,
}

#[derive(Debug, Clone, Serialize)]
struct OutcomeView {
    command: String,
    status: String,
    output: String,
}

/// Flattened turn for the template (one shape for every kind).
#[derive(Debug, Clone, Serialize)]
struct TurnView {
    index: u64,
    kind: &'static str,
    timestamp: String,
    commands: Vec<CommandView>,
    outcomes: Vec<OutcomeView>,
    not_attempted: usize,
    text: Option<String>,
    interrupted_batch: Option<u64>,
}

impl TurnView {
    fn from_turn(turn: &Turn) -> Self {
        let mut view = Self {
            index: turn.index,
            kind: turn.kind().as_str(),
            timestamp: turn.timestamp.to_rfc3339(),
            commands: Vec::new(),
            outcomes: Vec::new(),
            not_attempted: 0,
            text: None,
            interrupted_batch: None,
        };
        match &turn.payload {
            TurnPayload::CommandBatch(batch) => {
                view.commands = batch
                    .iter()
                    .map(|spec| CommandView {
                        command: spec.command.clone(),
                        rationale: spec.rationale.clone(),
                        dangerous: spec.is_dangerous(),
                    })
                    .collect();
            }
            TurnPayload::ExecutionResult(result) => {
                view.outcomes = result
                    .outcomes
                    .iter()
                    .map(|outcome| OutcomeView {
                        command: outcome.command.clone(),
                        status: describe_status(&outcome.status),
                        output: outcome.output.to_text_lossy().trim_end().to_string(),
                    })
                    .collect();
                view.not_attempted = result.not_attempted();
            }
            TurnPayload::ChatInterrupt(interrupt) => {
                view.text = Some(interrupt.text.clone());
                view.interrupted_batch = interrupt.interrupted_batch;
            }
            TurnPayload::FinalReport(report) => {
                view.text = Some(report.clone());
            }
        }
        view
    }
}

fn describe_status(status: &ExitStatus) -> String {
    match status {
        ExitStatus::Success { code } => format!("ok (exit {code})"),
        ExitStatus::Failure { code } => format!("failed (exit {code})"),
        ExitStatus::Abnormal { reason } => format!("abnormal ({reason})"),
    }
}

/// Render `record` as Markdown.
pub fn render_record(record: &PlannerRecord<'_>) -> Result<String> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.add_template("record", RECORD_TEMPLATE)
        .context("load record template")?;
    let turns: Vec<TurnView> = record.turns.iter().map(TurnView::from_turn).collect();
    let template = env.get_template("record")?;
    let rendered = template
        .render(context! {
            id => record.session_id,
            goal => record.goal.trim(),
            mode => record.mode.as_str(),
            last_batch_failed => record.last_batch_failed,
            last_interrupt => record.last_interrupt.map(str::trim).filter(|s| !s.is_empty()),
            turns => turns,
        })
        .context("render record template")?;
    debug!(bytes = rendered.len(), turns = record.turns.len(), "rendered record");
    Ok(rendered)
}
