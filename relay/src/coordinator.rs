//! Fail-fast execution of one command batch.
//!
//! Commands run strictly in order, one executor call each. Every raw result is
//! judged by the exit policy; the first non-success outcome ends the batch and
//! is always the last outcome recorded. Nothing is retried.

use tracing::{debug, info, instrument, warn};

use crate::core::error::RelayError;
use crate::core::exit_policy::ExitPolicy;
use crate::core::types::{CommandBatch, CommandOutcome, ExecutionResult, ExitStatus, OutputBlob};
use crate::io::executor::CommandExecutor;

#[derive(Debug, Clone, Default)]
pub struct ExecutionCoordinator {
    policy: ExitPolicy,
}

impl ExecutionCoordinator {
    pub fn new(policy: ExitPolicy) -> Self {
        Self { policy }
    }

    /// Run `batch` through `executor`, halting at the first failure.
    ///
    /// The only error is `InvalidBatch`, raised before anything runs. An
    /// executor `Err` is recorded as an `Abnormal` outcome.
    #[instrument(skip_all, fields(commands = batch.len()))]
    pub fn execute<E: CommandExecutor + ?Sized>(
        &self,
        executor: &mut E,
        batch: &CommandBatch,
    ) -> Result<ExecutionResult, RelayError> {
        batch.validate()?;

        let mut outcomes = Vec::with_capacity(batch.len());
        for (pos, spec) in batch.iter().enumerate() {
            let step = pos + 1;
            debug!(step, command = %spec.command, "dispatching command");
            let outcome = match executor.run(&spec.command) {
                Ok(raw) => {
                    let status = self.policy.judge(&spec.command, raw.exit_code, raw.timed_out);
                    CommandOutcome::attempted(spec.command.as_str(), status, raw.output)
                }
                Err(err) => CommandOutcome::attempted(
                    spec.command.as_str(),
                    ExitStatus::Abnormal {
                        reason: format!("{err:#}"),
                    },
                    OutputBlob::default(),
                ),
            };

            let success = outcome.is_success();
            info!(step, command = %spec.command, status = ?outcome.status, "command finished");
            outcomes.push(outcome);
            if !success {
                warn!(
                    step,
                    skipped = batch.len() - step,
                    "batch halted at failing command"
                );
                break;
            }
        }

        Ok(ExecutionResult {
            outcomes,
            batch_len: batch.len(),
        })
    }
}
