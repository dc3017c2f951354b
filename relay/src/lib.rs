//! Human-in-the-loop command relay between a planning agent and an operator.
//!
//! An agent proposes batches of shell commands; the operator lets them run or
//! interrupts with a question; results flow back to the agent. The crate keeps
//! the same split throughout:
//!
//! - **[`core`]**: Pure, deterministic logic (session state machine, planner
//!   contract, exit policy, wire types). No I/O.
//! - **[`io`]**: Side effects (config, process spawning, persistence, schema
//!   validation, rendering). Isolated behind traits so tests can script them.
//!
//! Orchestration modules ([`coordinator`], [`looping`], [`playbook`]) combine
//! the two to implement the CLI commands.

pub mod coordinator;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod looping;
pub mod playbook;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
