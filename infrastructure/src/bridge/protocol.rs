//! Wire types for the bridge protocol.
//!
//! Requests are `{ "id": <string>, "method": <tool>, "params": <mapping> }`.
//! Responses carry the same id with either `result` or `error`. Peers are
//! loose about the id type, so numeric ids are normalized to strings.

use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};

/// Per-channel request id counter; ids start at "1".
#[derive(Debug)]
pub struct RequestIds(AtomicU64);

impl RequestIds {
    pub fn new() -> Self {
        Self(AtomicU64::new(1))
    }

    /// Next id, with its sequence number for ordering pending requests.
    pub fn next(&self) -> (u64, String) {
        let seq = self.0.fetch_add(1, Ordering::SeqCst);
        (seq, seq.to_string())
    }
}

impl Default for RequestIds {
    fn default() -> Self {
        Self::new()
    }
}

/// Outgoing request frame
#[derive(Debug, Clone, Serialize)]
pub struct BridgeRequest {
    pub id: String,
    pub method: String,
    pub params: Value,
}

impl BridgeRequest {
    pub fn new(id: impl Into<String>, method: impl Into<String>, params: Value) -> Self {
        Self {
            id: id.into(),
            method: method.into(),
            params,
        }
    }
}

/// Error object reported by the peer
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteError {
    pub code: i64,
    pub message: String,
}

/// Incoming response frame
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeResponse {
    /// `None` when the peer omitted the id or sent null
    pub id: Option<String>,
    pub outcome: std::result::Result<Value, RemoteError>,
}

impl BridgeResponse {
    /// Parse a response frame. Returns `None` when the value carries neither
    /// `result` nor `error`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let id = object.get("id").and_then(normalize_id);

        if let Some(error) = object.get("error").filter(|e| !e.is_null()) {
            return Some(Self {
                id,
                outcome: Err(parse_remote_error(error)),
            });
        }

        object.get("result").map(|result| Self {
            id,
            outcome: Ok(result.clone()),
        })
    }
}

fn normalize_id(id: &Value) -> Option<String> {
    match id {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_remote_error(error: &Value) -> RemoteError {
    match error {
        Value::Object(map) => RemoteError {
            code: map.get("code").and_then(Value::as_i64).unwrap_or(-1),
            message: map
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string()),
        },
        Value::String(message) => RemoteError {
            code: -1,
            message: message.clone(),
        },
        other => RemoteError {
            code: -1,
            message: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_ids_start_at_one() {
        let ids = RequestIds::new();
        assert_eq!(ids.next(), (1, "1".to_string()));
        assert_eq!(ids.next(), (2, "2".to_string()));
    }

    #[test]
    fn test_request_serialization() {
        let request = BridgeRequest::new("7", "read_memory", json!({"address": 4096, "size": 16}));
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({"id": "7", "method": "read_memory", "params": {"address": 4096, "size": 16}})
        );
    }

    #[test]
    fn test_response_with_numeric_id() {
        let response = BridgeResponse::from_value(&json!({"id": 3, "result": {"ok": true}})).unwrap();
        assert_eq!(response.id.as_deref(), Some("3"));
        assert_eq!(response.outcome, Ok(json!({"ok": true})));
    }

    #[test]
    fn test_response_without_id() {
        let response = BridgeResponse::from_value(&json!({"id": null, "result": 1})).unwrap();
        assert_eq!(response.id, None);
    }

    #[test]
    fn test_error_object_and_string() {
        let response = BridgeResponse::from_value(
            &json!({"id": "1", "error": {"code": -32601, "message": "no such method"}}),
        )
        .unwrap();
        assert_eq!(
            response.outcome,
            Err(RemoteError {
                code: -32601,
                message: "no such method".into()
            })
        );

        let response = BridgeResponse::from_value(&json!({"id": "2", "error": "boom"})).unwrap();
        assert_eq!(response.outcome.unwrap_err().message, "boom");
    }

    #[test]
    fn test_null_error_falls_back_to_result() {
        let response =
            BridgeResponse::from_value(&json!({"id": "1", "result": 5, "error": null})).unwrap();
        assert_eq!(response.outcome, Ok(json!(5)));
    }

    #[test]
    fn test_not_a_response() {
        assert!(BridgeResponse::from_value(&json!({"method": "log"})).is_none());
        assert!(BridgeResponse::from_value(&json!([1, 2])).is_none());
    }
}
