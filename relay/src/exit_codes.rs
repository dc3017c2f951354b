//! Stable exit codes for relay CLI commands.

/// Command succeeded (batch ran clean, session completed, file written).
pub const OK: i32 = 0;
/// Invalid input, config, or session, or any other error.
pub const INVALID: i32 = 1;
/// `relay exec` ran the batch and a command failed.
pub const BATCH_FAILED: i32 = 2;
/// `relay play` stopped waiting for a human reply.
pub const AWAITING_HUMAN: i32 = 3;
/// `relay play` hit `max_batches`.
pub const LIMIT: i32 = 4;
