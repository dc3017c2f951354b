//! Classification of free-form human replies.

/// What a human reply means to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HumanSignal {
    /// The distinguished continue token: resume after an interruption.
    Continue,
    /// Anything else: a question that interrupts the in-flight batch.
    Chat(String),
}

/// Classify `text` against `continue_token` (trimmed, ASCII case-insensitive).
///
/// Chat text is kept verbatim apart from surrounding whitespace.
pub fn classify_reply(text: &str, continue_token: &str) -> HumanSignal {
    let trimmed = text.trim();
    if trimmed.eq_ignore_ascii_case(continue_token.trim()) {
        HumanSignal::Continue
    } else {
        HumanSignal::Chat(trimmed.to_string())
    }
}
