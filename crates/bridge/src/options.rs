//! Translation of host option objects into typed configuration.

use screenbridge_capture_engine::{RecordingConfig, SourceType};
use screenbridge_platform_core::WindowFilter;
use serde::Deserialize;
use serde_json::Value;

use crate::protocol::BridgeError;

/// An identifier the host may send as a string or a number.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum IdValue {
    Number(u64),
    Text(String),
}

impl IdValue {
    fn into_text(self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s,
        }
    }

    fn into_u64(self, key: &str) -> Result<u64, BridgeError> {
        match self {
            Self::Number(n) => Ok(n),
            Self::Text(s) => s.trim().parse().map_err(|_| {
                BridgeError::invalid_argument(format!("{key} must be a number, got '{s}'"))
            }),
        }
    }
}

/// Source type as a numeric code or a name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SourceTypeValue {
    Code(u64),
    Name(String),
}

impl SourceTypeValue {
    fn resolve(self) -> Result<SourceType, BridgeError> {
        match self {
            Self::Code(code) => SourceType::from_code(code).ok_or_else(|| {
                BridgeError::invalid_argument(format!(
                    "sourceType must be 0 (display), 1 (window) or 2 (application), got {code}"
                ))
            }),
            Self::Name(name) => name.parse().map_err(BridgeError::from),
        }
    }
}

/// Options accepted by `startRecording`. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecordingOptions {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fps: Option<u32>,
    #[serde(alias = "display_id")]
    pub display_id: Option<IdValue>,
    #[serde(alias = "window_id")]
    pub window_id: Option<IdValue>,
    #[serde(alias = "application_id")]
    pub application_id: Option<String>,
    #[serde(alias = "source_type")]
    pub source_type: Option<SourceTypeValue>,
    #[serde(alias = "video_bitrate")]
    pub video_bitrate: Option<u32>,
    #[serde(alias = "audio_bitrate")]
    pub audio_bitrate: Option<u32>,
    #[serde(alias = "capture_cursor")]
    pub capture_cursor: Option<bool>,
    #[serde(alias = "capture_audio")]
    pub capture_audio: Option<bool>,
}

impl RecordingOptions {
    /// Read options from a positional parameter. Anything but an object is
    /// treated as "no options".
    pub fn from_param(param: Option<&Value>) -> Result<Self, BridgeError> {
        match param {
            Some(value @ Value::Object(_)) => Self::deserialize(value).map_err(|e| {
                BridgeError::invalid_argument(format!("Invalid recording options: {e}"))
            }),
            _ => Ok(Self::default()),
        }
    }

    /// Overlay these options on `base`.
    ///
    /// `windowId` implies a window source and `applicationId` an application
    /// source (window wins when both are given); an explicit `sourceType`
    /// overrides either implication.
    pub fn apply(self, mut base: RecordingConfig) -> Result<RecordingConfig, BridgeError> {
        if let Some(width) = self.width {
            base.width = width;
        }
        if let Some(height) = self.height {
            base.height = height;
        }
        if let Some(fps) = self.fps {
            base.fps = fps;
        }
        if let Some(display_id) = self.display_id {
            base.display_id = display_id.into_text();
        }
        if let Some(application_id) = self.application_id {
            base.application_id = application_id;
            base.source_type = SourceType::Application;
        }
        if let Some(window_id) = self.window_id {
            base.window_id = window_id.into_u64("windowId")?;
            base.source_type = SourceType::Window;
        }
        if let Some(source_type) = self.source_type {
            base.source_type = source_type.resolve()?;
        }
        if let Some(kbps) = self.video_bitrate {
            base.video_bitrate_kbps = kbps;
        }
        if let Some(kbps) = self.audio_bitrate {
            base.audio_bitrate_kbps = kbps;
        }
        if let Some(cursor) = self.capture_cursor {
            base.capture_cursor = cursor;
        }
        if let Some(audio) = self.capture_audio {
            base.capture_audio = audio;
        }
        Ok(base)
    }
}

/// Options accepted by `listWindows`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WindowListOptions {
    #[serde(alias = "show_empty_names")]
    pub show_empty_names: bool,
    #[serde(alias = "show_hidden_windows")]
    pub show_hidden_windows: bool,
}

impl WindowListOptions {
    pub fn from_param(param: Option<&Value>) -> Result<Self, BridgeError> {
        match param {
            Some(value @ Value::Object(_)) => Self::deserialize(value).map_err(|e| {
                BridgeError::invalid_argument(format!("Invalid window list options: {e}"))
            }),
            _ => Ok(Self::default()),
        }
    }

    pub fn filter(&self) -> WindowFilter {
        WindowFilter {
            include_untitled: self.show_empty_names,
            include_hidden: self.show_hidden_windows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ErrorKind;
    use serde_json::json;

    fn apply(opts: Value) -> Result<RecordingConfig, BridgeError> {
        RecordingOptions::from_param(Some(&opts))?.apply(RecordingConfig::default())
    }

    #[test]
    fn missing_or_non_object_options_keep_defaults() {
        let config = RecordingOptions::from_param(None)
            .unwrap()
            .apply(RecordingConfig::default())
            .unwrap();
        assert_eq!(config, RecordingConfig::default());
        assert_eq!(
            RecordingOptions::from_param(Some(&json!("fast"))).unwrap(),
            RecordingOptions::default()
        );
    }

    #[test]
    fn resolution_and_bitrates_override_defaults() {
        let config = apply(json!({
            "width": 1280, "height": 720, "fps": 30,
            "videoBitrate": 2500, "audio_bitrate": 96
        }))
        .unwrap();
        assert_eq!((config.width, config.height, config.fps), (1280, 720, 30));
        assert_eq!(config.video_bitrate_kbps, 2500);
        assert_eq!(config.audio_bitrate_kbps, 96);
    }

    #[test]
    fn display_id_accepts_string_or_number() {
        assert_eq!(apply(json!({"displayId": "69733382"})).unwrap().display_id, "69733382");
        assert_eq!(apply(json!({"displayId": 2})).unwrap().display_id, "2");
    }

    #[test]
    fn window_id_implies_window_source() {
        let config = apply(json!({"windowId": 4242})).unwrap();
        assert_eq!(config.source_type, SourceType::Window);
        assert_eq!(config.window_id, 4242);

        let config = apply(json!({"window_id": "77"})).unwrap();
        assert_eq!(config.window_id, 77);

        let err = apply(json!({"windowId": "abc"})).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);
    }

    #[test]
    fn application_id_implies_application_source() {
        let config = apply(json!({"applicationId": "Safari"})).unwrap();
        assert_eq!(config.source_type, SourceType::Application);
        assert_eq!(config.application_id, "Safari");

        let both = apply(json!({"applicationId": "Safari", "windowId": 5})).unwrap();
        assert_eq!(both.source_type, SourceType::Window);
    }

    #[test]
    fn explicit_source_type_wins() {
        let config = apply(json!({"windowId": 9, "sourceType": 0})).unwrap();
        assert_eq!(config.source_type, SourceType::Display);
        assert_eq!(config.window_id, 9);

        let config = apply(json!({"source_type": "application", "applicationId": "mpv"})).unwrap();
        assert_eq!(config.source_type, SourceType::Application);

        assert!(apply(json!({"sourceType": 7})).is_err());
        assert!(apply(json!({"sourceType": "region"})).is_err());
    }

    #[test]
    fn capture_flags_accept_both_spellings() {
        let config = apply(json!({"capture_audio": false, "captureCursor": false})).unwrap();
        assert!(!config.capture_audio);
        assert!(!config.capture_cursor);
    }

    #[test]
    fn unknown_keys_are_ignored_but_bad_types_are_not() {
        assert!(apply(json!({"hide_obs": true, "fps": 24})).is_ok());
        let err = apply(json!({"fps": "sixty"})).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);
    }

    #[test]
    fn window_list_options_build_filter() {
        let opts =
            WindowListOptions::from_param(Some(&json!({"showEmptyNames": true}))).unwrap();
        assert_eq!(
            opts.filter(),
            WindowFilter {
                include_untitled: true,
                include_hidden: false
            }
        );
        assert_eq!(
            WindowListOptions::from_param(None).unwrap().filter(),
            WindowFilter::default()
        );
    }
}
