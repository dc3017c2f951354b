//! Deterministic planner driven by a TOML playbook.
//!
//! ```toml
//! goal = "inspect the build directory"
//!
//! [[batches]]
//! commands = ["pwd", { command = "ls -l build", rationale = "list artifacts" }]
//! ```
//!
//! Decisions depend only on the planner record: a failed batch ends the run
//! with a report, otherwise batch `k` is issued where `k` is the number of
//! resolved batches. An interrupted batch was never resolved, so it is issued
//! again after resume.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

use crate::core::planner::{Planner, PlannerDecision, PlannerRecord};
use crate::core::types::{CommandBatch, CommandSpec, ExitStatus};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct PlaybookFile {
    goal: String,
    #[serde(default)]
    batches: Vec<PlaybookBatch>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct PlaybookBatch {
    commands: Vec<PlaybookCommand>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum PlaybookCommand {
    Plain(String),
    Detailed {
        command: String,
        rationale: Option<String>,
    },
}

impl PlaybookCommand {
    fn into_spec(self) -> CommandSpec {
        match self {
            PlaybookCommand::Plain(command) => CommandSpec::new(command),
            PlaybookCommand::Detailed { command, rationale } => CommandSpec {
                command,
                rationale,
                dangerous: None,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybookPlanner {
    goal: String,
    batches: Vec<CommandBatch>,
}

impl PlaybookPlanner {
    pub fn new(goal: impl Into<String>, batches: Vec<CommandBatch>) -> Self {
        Self {
            goal: goal.into(),
            batches,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("load playbook {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let file: PlaybookFile = toml::from_str(contents).context("parse playbook toml")?;
        if file.goal.trim().is_empty() {
            return Err(anyhow!("playbook goal must not be blank"));
        }
        let batches = file
            .batches
            .into_iter()
            .enumerate()
            .map(|(pos, batch)| {
                let specs = batch
                    .commands
                    .into_iter()
                    .map(PlaybookCommand::into_spec)
                    .collect();
                CommandBatch::new(specs).with_context(|| format!("batch {}", pos + 1))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(file.goal, batches))
    }

    pub fn goal(&self) -> &str {
        &self.goal
    }

    pub fn batches(&self) -> &[CommandBatch] {
        &self.batches
    }
}

impl Planner for PlaybookPlanner {
    fn decide(&self, record: &PlannerRecord<'_>) -> PlannerDecision {
        let resolved = record.resolved_batches();
        if record.last_batch_failed {
            let detail = record
                .last_result()
                .and_then(|result| result.failed_outcome())
                .map(|outcome| {
                    format!(
                        "`{}` {}",
                        outcome.command,
                        describe_failure(&outcome.status)
                    )
                })
                .unwrap_or_else(|| "a command failed".to_string());
            return PlannerDecision::EmitReport(format!(
                "Stopped after batch {resolved} of {}: {detail}.",
                self.batches.len()
            ));
        }
        match self.batches.get(resolved) {
            Some(batch) => PlannerDecision::IssueBatch(batch.clone()),
            None => PlannerDecision::EmitReport(format!(
                "Completed {} batches for goal: {}",
                self.batches.len(),
                record.goal.trim()
            )),
        }
    }
}

fn describe_failure(status: &ExitStatus) -> String {
    match status {
        ExitStatus::Failure { code } => format!("exited with {code}"),
        ExitStatus::Abnormal { reason } => format!("did not finish ({reason})"),
        ExitStatus::Success { code } => format!("exited with {code}"),
    }
}
