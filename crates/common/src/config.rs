//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Default recording settings.
    pub recording: RecordingDefaults,

    /// Media engine settings.
    pub engine: EngineConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Default recording parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingDefaults {
    /// Output width in pixels.
    pub width: u32,

    /// Output height in pixels.
    pub height: u32,

    /// Output frame rate.
    pub fps: u32,

    /// Video bitrate in kbit/s.
    pub video_bitrate_kbps: u32,

    /// Audio bitrate in kbit/s.
    pub audio_bitrate_kbps: u32,

    /// Audio sample rate in Hz.
    pub audio_sample_rate: u32,

    /// Whether the cursor is drawn into the capture.
    pub capture_cursor: bool,

    /// Whether system audio is recorded alongside video.
    pub capture_audio: bool,
}

/// Media engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Extra directories scanned for media plugins.
    pub plugin_paths: Vec<PathBuf>,

    /// Also scan plugin directories next to the executable and the
    /// platform's usual install locations.
    pub scan_default_plugin_paths: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "screenbridge=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for RecordingDefaults {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            fps: 60,
            video_bitrate_kbps: 8000,
            audio_bitrate_kbps: 160,
            audio_sample_rate: 48000,
            capture_cursor: true,
            capture_audio: true,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            plugin_paths: Vec::new(),
            scan_default_plugin_paths: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_file_path())
    }

    /// Load config from an explicit path, falling back to defaults.
    pub fn load_from(config_path: &Path) -> Self {
        if config_path.exists() {
            match std::fs::read_to_string(config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        self.save_to(&config_file_path())
    }

    /// Save config to an explicit path.
    pub fn save_to(&self, config_path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("screenbridge").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults_for_missing_fields() {
        let config: AppConfig =
            serde_json::from_str(r#"{ "recording": { "fps": 30 } }"#).unwrap();
        assert_eq!(config.recording.fps, 30);
        assert_eq!(config.recording.width, 1920);
        assert_eq!(config.recording.video_bitrate_kbps, 8000);
        assert!(config.engine.scan_default_plugin_paths);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn save_then_load_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = AppConfig::default();
        config.engine.plugin_paths.push(PathBuf::from("/opt/gst/plugins"));
        config.recording.capture_audio = false;
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path);
        assert_eq!(loaded.engine, config.engine);
        assert_eq!(loaded.recording, config.recording);
    }

    #[test]
    fn invalid_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let loaded = AppConfig::load_from(&path);
        assert_eq!(loaded.recording, RecordingDefaults::default());
    }
}
