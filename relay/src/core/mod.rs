//! Deterministic, pure logic shared by the relay.
//!
//! Core modules must be free of I/O side effects (reading the wall clock for
//! turn timestamps is the one exception). They operate on in-memory data and
//! return deterministic outputs suitable for tests.

pub mod danger;
pub mod error;
pub mod exit_policy;
pub mod planner;
pub mod session;
pub mod signal;
pub mod types;
pub mod wire;
