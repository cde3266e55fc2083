//! Method dispatch: typed calls into the capture manager.

use std::path::PathBuf;

use screenbridge_capture_engine::{CaptureManager, RecordingConfig};
use screenbridge_common::config::RecordingDefaults;
use serde::Serialize;
use serde_json::{json, Value};

use crate::options::{RecordingOptions, WindowListOptions};
use crate::protocol::{parse_request, BridgeError, ErrorKind, Request, Response, PROTOCOL_VERSION};

/// Every method the bridge answers.
pub const METHODS: [&str; 12] = [
    "init",
    "shutdown",
    "listDisplays",
    "listWindows",
    "startRecording",
    "stopRecording",
    "checkScreenPermission",
    "requestScreenPermission",
    "setSystemAudioEnabled",
    "isCaptureAudioSupported",
    "status",
    "version",
];

/// Routes requests to a [`CaptureManager`].
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    defaults: RecordingDefaults,
}

impl Dispatcher {
    /// `defaults` seed every `startRecording` before host options apply.
    pub fn new(defaults: RecordingDefaults) -> Self {
        Self { defaults }
    }

    /// Parse and answer one protocol line.
    pub fn handle_line(&self, manager: &mut CaptureManager, line: &str) -> Response {
        match parse_request(line) {
            Ok(request) => self.dispatch(manager, &request),
            Err(e) => {
                tracing::warn!(error = %e, "Rejected malformed request");
                Response::failure(None, e)
            }
        }
    }

    pub fn dispatch(&self, manager: &mut CaptureManager, request: &Request) -> Response {
        tracing::debug!(id = ?request.id, method = %request.method, "Dispatching request");
        match self.call(manager, &request.method, &request.params) {
            Ok(result) => Response::success(request.id, result),
            Err(e) => {
                tracing::warn!(method = %request.method, error = %e, "Request failed");
                Response::failure(request.id, e)
            }
        }
    }

    fn call(
        &self,
        manager: &mut CaptureManager,
        method: &str,
        params: &[Value],
    ) -> Result<Value, BridgeError> {
        match method {
            "init" => {
                manager.initialize()?;
                Ok(Value::Bool(true))
            }
            "shutdown" => {
                manager.shutdown();
                Ok(Value::Null)
            }
            "listDisplays" => to_json(&manager.displays()?),
            "listWindows" => {
                let opts = WindowListOptions::from_param(params.first())?;
                to_json(&manager.windows(opts.filter())?)
            }
            "startRecording" => {
                let output = output_path(params.first())?;
                let config = RecordingOptions::from_param(params.get(1))?
                    .apply(RecordingConfig::from(&self.defaults))?;
                manager.start_recording(&output, &config)?;
                Ok(Value::Bool(true))
            }
            "stopRecording" => to_json(&manager.stop_recording()?),
            "checkScreenPermission" => Ok(Value::Bool(manager.check_screen_permission())),
            "requestScreenPermission" => Ok(Value::Bool(manager.request_screen_permission())),
            "setSystemAudioEnabled" => {
                let enabled = params.first().and_then(Value::as_bool).ok_or_else(|| {
                    BridgeError::invalid_argument("setSystemAudioEnabled expects a boolean")
                })?;
                Ok(Value::Bool(manager.set_system_audio_enabled(enabled)))
            }
            "isCaptureAudioSupported" => Ok(Value::Bool(manager.is_capture_audio_supported())),
            "status" => to_json(&manager.status()),
            "version" => Ok(json!({
                "protocol": PROTOCOL_VERSION,
                "version": env!("CARGO_PKG_VERSION"),
                "methods": METHODS,
            })),
            other => Err(BridgeError::new(
                ErrorKind::UnknownMethod,
                format!("Unknown method '{other}'"),
            )),
        }
    }
}

fn output_path(param: Option<&Value>) -> Result<PathBuf, BridgeError> {
    match param.and_then(Value::as_str) {
        Some(path) if !path.trim().is_empty() => Ok(PathBuf::from(path)),
        _ => Err(BridgeError::invalid_argument("Output path required")),
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, BridgeError> {
    serde_json::to_value(value).map_err(|e| {
        BridgeError::new(ErrorKind::Internal, format!("Failed to encode result: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_must_be_a_non_empty_string() {
        assert_eq!(
            output_path(Some(&json!("/tmp/a.mp4"))).unwrap(),
            PathBuf::from("/tmp/a.mp4")
        );
        for bad in [None, Some(json!(42)), Some(json!("  "))] {
            let err = output_path(bad.as_ref()).unwrap_err();
            assert_eq!(err.kind, ErrorKind::InvalidArgument);
            assert_eq!(err.message, "Output path required");
        }
    }
}
