//! Human gate: the operator decides whether an issued batch runs.
//!
//! [`HumanGate`] is the seam the drive loop talks to. [`LineGate`] reads
//! replies line by line (stdin in the CLI) and writes prompts to a separate
//! writer so product output on stdout stays clean.

use std::io::{BufRead, Write};

use anyhow::{Context, Result, anyhow};
use tracing::debug;

use crate::core::signal::{HumanSignal, classify_reply};
use crate::core::types::CommandBatch;

/// Operator verdict on an issued batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Run,
    /// Free-form question that suspends the batch.
    Interrupt(String),
}

pub trait HumanGate {
    /// Show batch `index` to the operator and wait for a verdict.
    fn review(&mut self, index: u64, batch: &CommandBatch) -> Result<GateDecision>;
}

/// Line-oriented gate over any reader/writer pair.
///
/// An empty line or the continue token runs the batch; any other text
/// interrupts it.
pub struct LineGate<R, W> {
    input: R,
    prompt: W,
    continue_token: String,
}

impl<R: BufRead, W: Write> LineGate<R, W> {
    pub fn new(input: R, prompt: W, continue_token: impl Into<String>) -> Self {
        Self {
            input,
            prompt,
            continue_token: continue_token.into(),
        }
    }

    pub fn continue_token(&self) -> &str {
        &self.continue_token
    }

    /// Read one reply line; `None` on end of input.
    pub fn read_reply(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .context("read human reply")?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    /// Write a line to the prompt stream.
    pub fn say(&mut self, message: &str) -> Result<()> {
        writeln!(self.prompt, "{message}").context("write prompt")?;
        self.prompt.flush().context("flush prompt")
    }
}

impl<R: BufRead, W: Write> HumanGate for LineGate<R, W> {
    fn review(&mut self, index: u64, batch: &CommandBatch) -> Result<GateDecision> {
        self.say(&format_batch(index, batch))?;
        self.say(&format!(
            "Press Enter or type `{}` to run; anything else interrupts.",
            self.continue_token
        ))?;
        let reply = self
            .read_reply()?
            .ok_or_else(|| anyhow!("input closed while batch {index} awaited review"))?;
        debug!(index, bytes = reply.len(), "received gate reply");
        if reply.trim().is_empty() {
            return Ok(GateDecision::Run);
        }
        Ok(match classify_reply(&reply, &self.continue_token) {
            HumanSignal::Continue => GateDecision::Run,
            HumanSignal::Chat(text) => GateDecision::Interrupt(text),
        })
    }
}

/// Human-readable listing of a batch with advisory danger markers.
pub fn format_batch(index: u64, batch: &CommandBatch) -> String {
    let mut out = format!("batch {index} ({} commands):", batch.len());
    for (pos, spec) in batch.iter().enumerate() {
        out.push_str(&format!("\n  {}. {}", pos + 1, spec.command));
        if spec.is_dangerous() {
            out.push_str("  [dangerous]");
        }
        if let Some(rationale) = &spec.rationale {
            out.push_str(&format!("  # {rationale}"));
        }
    }
    out
}
