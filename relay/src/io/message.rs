//! Parse agent batch messages with JSON Schema validation.

use anyhow::{Context, Result, bail};
use jsonschema::Draft;
use serde_json::Value;
use tracing::debug;

use crate::core::types::CommandBatch;
use crate::core::wire::{BatchMessage, BatchResponse};

/// Bundled schema for `{"data": ...}` messages.
pub const BATCH_MESSAGE_SCHEMA: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/schemas/batch_message.schema.json"
));

/// Parse, validate, and decode a raw message into a batch.
pub fn parse_batch_message(raw: &str) -> Result<CommandBatch> {
    let instance: Value = serde_json::from_str(raw).context("parse message json")?;
    validate_message(&instance)?;
    let message: BatchMessage =
        serde_json::from_value(instance).context("decode batch message")?;
    let batch = message.into_batch()?;
    debug!(commands = batch.len(), "batch message accepted");
    Ok(batch)
}

/// Validate a message against the bundled schema (Draft 2020-12).
pub fn validate_message(instance: &Value) -> Result<()> {
    let schema: Value =
        serde_json::from_str(BATCH_MESSAGE_SCHEMA).context("parse bundled message schema")?;
    let compiled = jsonschema::options()
        .with_draft(Draft::Draft202012)
        .build(&schema)
        .context("compile message schema")?;
    let messages: Vec<String> = compiled
        .iter_errors(instance)
        .map(|err| err.to_string())
        .collect();
    if !messages.is_empty() {
        bail!("message schema validation failed:\n- {}", messages.join("\n- "));
    }
    Ok(())
}

/// Render a response as pretty JSON with a trailing newline.
pub fn render_response(response: &BatchResponse) -> Result<String> {
    let mut buf = serde_json::to_string_pretty(response).context("serialize response")?;
    buf.push('\n');
    Ok(buf)
}
