//! Test-only fakes for the executor, human gate, and planner seams.

use std::cell::RefCell;
use std::collections::VecDeque;

use anyhow::{Result, anyhow};

use crate::core::planner::{Planner, PlannerDecision, PlannerRecord};
use crate::core::types::CommandBatch;
use crate::io::executor::{CommandExecutor, RunOutput};
use crate::io::human::{GateDecision, HumanGate};

/// One scripted executor reply.
#[derive(Debug, Clone)]
pub enum ScriptedRun {
    Output(RunOutput),
    /// The command could not be run at all.
    Error(String),
}

/// Executor that replays scripted replies in order and records every call.
///
/// Once the script is exhausted every command exits `0` with no output.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    script: VecDeque<ScriptedRun>,
    calls: Vec<String>,
}

impl ScriptedExecutor {
    pub fn new(script: Vec<ScriptedRun>) -> Self {
        Self {
            script: script.into(),
            calls: Vec::new(),
        }
    }

    pub fn all_ok() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[String] {
        &self.calls
    }
}

impl CommandExecutor for ScriptedExecutor {
    fn run(&mut self, command: &str) -> Result<RunOutput> {
        self.calls.push(command.to_string());
        match self.script.pop_front() {
            Some(ScriptedRun::Output(output)) => Ok(output),
            Some(ScriptedRun::Error(message)) => Err(anyhow!(message)),
            None => Ok(RunOutput::exited(0, Vec::new())),
        }
    }
}

/// Executor whose `fail_at`-th call (0-based) exits `1`; every other call exits `0`.
#[derive(Debug, Default)]
pub struct CountingExecutor {
    fail_at: Option<usize>,
    calls: usize,
}

impl CountingExecutor {
    pub fn new(fail_at: Option<usize>) -> Self {
        Self { fail_at, calls: 0 }
    }

    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl CommandExecutor for CountingExecutor {
    fn run(&mut self, command: &str) -> Result<RunOutput> {
        let call = self.calls;
        self.calls += 1;
        if self.fail_at == Some(call) {
            return Ok(RunOutput::exited(1, format!("{command}: failed\n")));
        }
        Ok(RunOutput::exited(0, format!("{command}: ok\n")))
    }
}

/// Gate that replays scripted decisions, then runs everything.
#[derive(Debug, Default)]
pub struct ScriptedGate {
    script: VecDeque<GateDecision>,
    reviewed: Vec<u64>,
}

impl ScriptedGate {
    pub fn new(script: Vec<GateDecision>) -> Self {
        Self {
            script: script.into(),
            reviewed: Vec::new(),
        }
    }

    pub fn always_run() -> Self {
        Self::default()
    }

    /// Turn indices of the batches this gate has reviewed.
    pub fn reviewed(&self) -> &[u64] {
        &self.reviewed
    }
}

impl HumanGate for ScriptedGate {
    fn review(&mut self, index: u64, _batch: &CommandBatch) -> Result<GateDecision> {
        self.reviewed.push(index);
        Ok(self.script.pop_front().unwrap_or(GateDecision::Run))
    }
}

/// Planner that replays scripted decisions, then emits a report.
#[derive(Debug, Default)]
pub struct ScriptedPlanner {
    script: RefCell<VecDeque<PlannerDecision>>,
}

impl ScriptedPlanner {
    pub fn new(script: Vec<PlannerDecision>) -> Self {
        Self {
            script: RefCell::new(script.into()),
        }
    }
}

impl Planner for ScriptedPlanner {
    fn decide(&self, _record: &PlannerRecord<'_>) -> PlannerDecision {
        self.script
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| PlannerDecision::EmitReport("script exhausted".to_string()))
    }
}
