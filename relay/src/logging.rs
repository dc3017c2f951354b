//! Development-time tracing for debugging the relay.
//!
//! Tracing goes to stderr and is controlled by `RUST_LOG`. Product output
//! (JSON responses, rendered transcripts) goes to stdout, and session files
//! under `.relay/sessions/` are always written regardless of the filter.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG`, defaulting to `warn`. Output: stderr, compact format.
///
/// # Example
/// ```bash
/// RUST_LOG=relay=debug relay exec --message '{"data": "pwd"}'
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
