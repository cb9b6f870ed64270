//! Shared wording for errors and warnings.
//!
//! Messages can carry fragments of server responses, so they are flattened to
//! a single line and capped before they reach the log.

const MAX_MESSAGE_LEN: usize = 240;

/// Normalize a message for `bail!`/`with_context`.
pub fn error_message(msg: impl Into<String>) -> String {
    let msg: String = msg.into();
    let mut flat = msg.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > MAX_MESSAGE_LEN {
        flat = flat.chars().take(MAX_MESSAGE_LEN).collect();
        flat.push_str("...");
    }
    flat
}

/// Log a recoverable problem; the dashboard keeps going.
pub fn warn(msg: impl Into<String>) {
    tracing::warn!("{}", error_message(msg));
}
