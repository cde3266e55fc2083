//! Recording configuration.

use std::fmt;
use std::str::FromStr;

use screenbridge_common::config::RecordingDefaults;
use screenbridge_common::error::{ScreenBridgeError, ScreenBridgeResult};
use serde::{Deserialize, Serialize};

const MAX_DIMENSION: u32 = 8192;
const MAX_FPS: u32 = 240;

/// What kind of source a recording captures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// A whole display.
    #[default]
    Display,
    /// A single window, by id.
    Window,
    /// The main window of an application, by owner name.
    Application,
}

impl SourceType {
    /// Source type from its numeric code (0 display, 1 window, 2 application).
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(Self::Display),
            1 => Some(Self::Window),
            2 => Some(Self::Application),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Display => "display",
            Self::Window => "window",
            Self::Application => "application",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceType {
    type Err = ScreenBridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "display" | "screen" | "monitor" => Ok(Self::Display),
            "window" => Ok(Self::Window),
            "application" | "app" => Ok(Self::Application),
            other => Err(ScreenBridgeError::config(format!(
                "Unknown source type '{other}' (expected display, window, or application)"
            ))),
        }
    }
}

/// Parameters of a single recording.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    pub source_type: SourceType,

    /// Display to record; empty selects the primary display.
    pub display_id: String,

    /// Window to record when `source_type` is `Window`.
    pub window_id: u64,

    /// Owning application name when `source_type` is `Application`.
    pub application_id: String,

    /// Output resolution in pixels.
    pub width: u32,
    pub height: u32,

    /// Output frame rate.
    pub fps: u32,

    pub video_bitrate_kbps: u32,
    pub audio_bitrate_kbps: u32,

    /// Audio sample rate in Hz.
    pub audio_sample_rate: u32,

    pub capture_cursor: bool,
    pub capture_audio: bool,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self::from(&RecordingDefaults::default())
    }
}

impl From<&RecordingDefaults> for RecordingConfig {
    fn from(defaults: &RecordingDefaults) -> Self {
        Self {
            source_type: SourceType::Display,
            display_id: String::new(),
            window_id: 0,
            application_id: String::new(),
            width: defaults.width,
            height: defaults.height,
            fps: defaults.fps,
            video_bitrate_kbps: defaults.video_bitrate_kbps,
            audio_bitrate_kbps: defaults.audio_bitrate_kbps,
            audio_sample_rate: defaults.audio_sample_rate,
            capture_cursor: defaults.capture_cursor,
            capture_audio: defaults.capture_audio,
        }
    }
}

impl RecordingConfig {
    /// Check that the encoder can be configured from these values.
    pub fn validate(&self) -> ScreenBridgeResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ScreenBridgeError::config(format!(
                "Output resolution must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if self.width > MAX_DIMENSION || self.height > MAX_DIMENSION {
            return Err(ScreenBridgeError::config(format!(
                "Output resolution {}x{} exceeds {MAX_DIMENSION}x{MAX_DIMENSION}",
                self.width, self.height
            )));
        }
        // x264 only accepts 4:2:0 input with even dimensions.
        if self.width % 2 != 0 || self.height % 2 != 0 {
            return Err(ScreenBridgeError::config(format!(
                "Output resolution must be even, got {}x{}",
                self.width, self.height
            )));
        }
        if self.fps == 0 || self.fps > MAX_FPS {
            return Err(ScreenBridgeError::config(format!(
                "Frame rate must be between 1 and {MAX_FPS}, got {}",
                self.fps
            )));
        }
        if self.video_bitrate_kbps == 0 {
            return Err(ScreenBridgeError::config("Video bitrate must be non-zero"));
        }
        if self.capture_audio && (self.audio_bitrate_kbps == 0 || self.audio_sample_rate == 0) {
            return Err(ScreenBridgeError::config(
                "Audio bitrate and sample rate must be non-zero when capturing audio",
            ));
        }

        match self.source_type {
            SourceType::Display => {}
            SourceType::Window if self.window_id == 0 => {
                return Err(ScreenBridgeError::config(
                    "Window capture requires a non-zero window id",
                ));
            }
            SourceType::Window => {}
            SourceType::Application if self.application_id.trim().is_empty() => {
                return Err(ScreenBridgeError::config(
                    "Application capture requires an application id",
                ));
            }
            SourceType::Application => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_recording_defaults() {
        let config = RecordingConfig::default();
        assert_eq!(config.source_type, SourceType::Display);
        assert_eq!((config.width, config.height, config.fps), (1920, 1080, 60));
        assert_eq!(config.video_bitrate_kbps, 8000);
        assert_eq!(config.audio_bitrate_kbps, 160);
        assert!(config.capture_cursor);
        assert!(config.capture_audio);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn source_type_parses_codes_and_names() {
        assert_eq!(SourceType::from_code(1), Some(SourceType::Window));
        assert_eq!(SourceType::from_code(3), None);
        assert_eq!("Application".parse::<SourceType>().unwrap(), SourceType::Application);
        assert_eq!("screen".parse::<SourceType>().unwrap(), SourceType::Display);
        assert!("region".parse::<SourceType>().is_err());
    }

    #[test]
    fn validate_rejects_unencodable_output() {
        let mut config = RecordingConfig {
            width: 1921,
            ..RecordingConfig::default()
        };
        assert!(config.validate().unwrap_err().to_string().contains("even"));

        config.width = 0;
        assert!(config.validate().is_err());

        config = RecordingConfig {
            fps: 0,
            ..RecordingConfig::default()
        };
        assert!(config.validate().is_err());

        config = RecordingConfig {
            audio_bitrate_kbps: 0,
            ..RecordingConfig::default()
        };
        assert!(config.validate().is_err());
        config.capture_audio = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_requires_target_for_window_and_application() {
        let window = RecordingConfig {
            source_type: SourceType::Window,
            ..RecordingConfig::default()
        };
        assert!(window.validate().is_err());

        let app = RecordingConfig {
            source_type: SourceType::Application,
            application_id: "  ".to_string(),
            ..RecordingConfig::default()
        };
        assert!(app.validate().is_err());
    }
}
