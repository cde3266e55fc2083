//! Error types shared across ScreenBridge crates.

use std::path::PathBuf;

/// Top-level error type for ScreenBridge operations.
#[derive(Debug, thiserror::Error)]
pub enum ScreenBridgeError {
    #[error("Capture error: {message}")]
    Capture { message: String },

    #[error("Media engine error: {message}")]
    Engine { message: String },

    #[error("Platform error: {message}")]
    Platform { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid state: {message}")]
    InvalidState { message: String },

    #[error("Capture source not found: {message}")]
    SourceNotFound { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using ScreenBridgeError.
pub type ScreenBridgeResult<T> = Result<T, ScreenBridgeError>;

impl ScreenBridgeError {
    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture {
            message: msg.into(),
        }
    }

    pub fn engine(msg: impl Into<String>) -> Self {
        Self::Engine {
            message: msg.into(),
        }
    }

    pub fn platform(msg: impl Into<String>) -> Self {
        Self::Platform {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState {
            message: msg.into(),
        }
    }

    pub fn source_not_found(msg: impl Into<String>) -> Self {
        Self::SourceNotFound {
            message: msg.into(),
        }
    }

    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helpers_render_category_prefix() {
        let err = ScreenBridgeError::invalid_state("not initialized");
        assert_eq!(err.to_string(), "Invalid state: not initialized");

        let err = ScreenBridgeError::source_not_found("display 42");
        assert_eq!(err.to_string(), "Capture source not found: display 42");
    }

    #[test]
    fn io_errors_convert_transparently() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: ScreenBridgeError = io.into();
        assert_eq!(err.to_string(), "gone");
    }
}
