//! Message classification for the bridge reader task.

use super::protocol::BridgeResponse;
use serde_json::Value;

/// Classification of an incoming frame.
#[derive(Debug, PartialEq)]
pub enum MessageKind {
    /// Answer to one of our requests (has `result` or `error`).
    Response(BridgeResponse),
    /// Unsolicited message with a `method` and no result (log lines,
    /// progress events). Absorbed without touching pending requests.
    Notification { method: String },
    /// Anything else; discarded.
    Unrecognized,
}

/// Classify a frame by its `result` / `error` / `method` fields.
pub fn classify_message(json: &Value) -> MessageKind {
    if let Some(response) = BridgeResponse::from_value(json) {
        return MessageKind::Response(response);
    }
    match json.get("method").and_then(Value::as_str) {
        Some(method) => MessageKind::Notification {
            method: method.to_string(),
        },
        None => MessageKind::Unrecognized,
    }
}
