//! Wire format of the host protocol.
//!
//! Version: 1
//! One JSON object per line in each direction. Requests name a method and
//! carry positional parameters; every request gets exactly one response
//! echoing its `id`.
//!
//! Failure is signalled only by `ok: false` with an error body; a failed
//! call never answers `result: false`.

use screenbridge_common::error::ScreenBridgeError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Protocol version - increment when breaking changes occur
pub const PROTOCOL_VERSION: u32 = 1;

/// A call from the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub id: Option<u64>,
    pub method: String,
    #[serde(default)]
    pub params: Vec<Value>,
}

/// The answer to one [`Request`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: Option<u64>,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl Response {
    pub fn success(id: Option<u64>, result: Value) -> Self {
        Self {
            id,
            ok: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Option<u64>, error: BridgeError) -> Self {
        Self {
            id,
            ok: false,
            result: None,
            error: Some(ErrorBody {
                kind: error.kind,
                message: error.message,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
}

/// Error categories reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ParseError,
    UnknownMethod,
    InvalidArgument,
    InvalidState,
    NotFound,
    PermissionDenied,
    Unsupported,
    Engine,
    Platform,
    Internal,
}

/// A failed call, ready to be sent back to the host.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind:?}: {message}")]
pub struct BridgeError {
    pub kind: ErrorKind,
    pub message: String,
}

impl BridgeError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }
}

impl From<ScreenBridgeError> for BridgeError {
    fn from(err: ScreenBridgeError) -> Self {
        let kind = match &err {
            ScreenBridgeError::Capture { .. } | ScreenBridgeError::Engine { .. } => {
                ErrorKind::Engine
            }
            ScreenBridgeError::Platform { .. } => ErrorKind::Platform,
            ScreenBridgeError::Config { .. } => ErrorKind::InvalidArgument,
            ScreenBridgeError::InvalidState { .. } => ErrorKind::InvalidState,
            ScreenBridgeError::SourceNotFound { .. } | ScreenBridgeError::FileNotFound { .. } => {
                ErrorKind::NotFound
            }
            ScreenBridgeError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            ScreenBridgeError::Unsupported { .. } => ErrorKind::Unsupported,
            ScreenBridgeError::Io(_) | ScreenBridgeError::Json(_) | ScreenBridgeError::Other(_) => {
                ErrorKind::Internal
            }
        };
        Self::new(kind, err.to_string())
    }
}

/// Parse one request line.
pub fn parse_request(line: &str) -> Result<Request, BridgeError> {
    serde_json::from_str(line)
        .map_err(|e| BridgeError::new(ErrorKind::ParseError, format!("Invalid request: {e}")))
}

/// Serialize a message to a JSONL string (with newline).
///
/// # Errors
/// Returns `serde_json::Error` if serialization fails.
pub fn to_jsonl<T: Serialize>(msg: &T) -> Result<String, serde_json::Error> {
    let mut json = serde_json::to_string(msg)?;
    json.push('\n');
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_defaults_id_and_params() {
        let req = parse_request(r#"{"method":"listDisplays"}"#).unwrap();
        assert_eq!(req.id, None);
        assert!(req.params.is_empty());
    }

    #[test]
    fn malformed_lines_are_parse_errors() {
        let err = parse_request("{not json").unwrap_err();
        assert_eq!(err.kind, ErrorKind::ParseError);
        let err = parse_request(r#"{"id":1}"#).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ParseError);
    }

    #[test]
    fn success_keeps_null_result() {
        let line = to_jsonl(&Response::success(Some(4), Value::Null)).unwrap();
        assert_eq!(line, "{\"id\":4,\"ok\":true,\"result\":null}\n");
    }

    #[test]
    fn failure_carries_kind_and_message() {
        let resp = Response::failure(
            Some(2),
            ScreenBridgeError::source_not_found("Window 9 not found").into(),
        );
        assert_eq!(
            serde_json::to_value(&resp).unwrap(),
            json!({
                "id": 2,
                "ok": false,
                "error": {"kind": "not_found", "message": "Capture source not found: Window 9 not found"}
            })
        );
    }

    #[test]
    fn error_kinds_map_from_manager_errors() {
        let kind = |e: ScreenBridgeError| BridgeError::from(e).kind;
        assert_eq!(kind(ScreenBridgeError::config("bad")), ErrorKind::InvalidArgument);
        assert_eq!(kind(ScreenBridgeError::invalid_state("x")), ErrorKind::InvalidState);
        assert_eq!(kind(ScreenBridgeError::unsupported("x")), ErrorKind::Unsupported);
        assert_eq!(kind(ScreenBridgeError::engine("x")), ErrorKind::Engine);
        assert_eq!(kind(ScreenBridgeError::platform("x")), ErrorKind::Platform);
        assert_eq!(
            kind(ScreenBridgeError::permission_denied("x")),
            ErrorKind::PermissionDenied
        );
    }
}
