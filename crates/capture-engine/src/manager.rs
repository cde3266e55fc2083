//! The process-wide recording manager.
//!
//! ```text
//! Uninitialized --initialize--> Idle <--start/stop--> Recording
//!                                 |                       |
//!                                 +------shutdown---------+--> ShutDown --initialize--> Idle
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use screenbridge_common::clock::RecordingClock;
use screenbridge_common::config::AppConfig;
use screenbridge_common::error::{ScreenBridgeError, ScreenBridgeResult};
use screenbridge_platform_core::{default_display, DisplayInfo, DisplayServer, WindowFilter, WindowInfo};
use serde::Serialize;

use crate::backend::{get_backend, CaptureBackend, CaptureTarget, SourceElement};
use crate::engine::{default_engine, EngineSettings, MediaEngine};
use crate::pipeline::{AudioPlan, CapturePipeline, Container, RecordingPlan, AUDIO_CHAIN};
use crate::recording::{RecordingConfig, SourceType};

/// Lifecycle state of the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ManagerState {
    Uninitialized,
    Idle,
    Recording,
    ShutDown,
}

impl ManagerState {
    pub fn is_initialized(&self) -> bool {
        matches!(self, Self::Idle | Self::Recording)
    }
}

/// Snapshot of the manager for status queries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerStatus {
    pub state: ManagerState,
    pub engine: &'static str,
    pub display_server: DisplayServer,
    pub system_audio_enabled: bool,
    /// Output file of the active recording.
    pub output: Option<PathBuf>,
    /// Seconds since the active recording started.
    pub elapsed_secs: Option<f64>,
    /// Wall-clock start of the active recording (RFC 3339).
    pub started_at: Option<String>,
}

/// Result of a finished recording.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingSummary {
    pub path: PathBuf,
    pub duration_secs: f64,
    /// Size of the output file; zero when nothing was written.
    pub bytes_written: u64,
}

struct ActiveRecording {
    output: PathBuf,
    pipeline: Box<dyn CapturePipeline>,
    clock: RecordingClock,
}

/// Owns the capture backend and media engine and serializes recording
/// control.
pub struct CaptureManager {
    backend: Box<dyn CaptureBackend>,
    engine: Box<dyn MediaEngine>,
    settings: EngineSettings,
    state: ManagerState,
    active: Option<ActiveRecording>,
    system_audio_enabled: bool,
}

static GLOBAL: OnceLock<Mutex<CaptureManager>> = OnceLock::new();

impl CaptureManager {
    pub fn new(
        backend: Box<dyn CaptureBackend>,
        engine: Box<dyn MediaEngine>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            backend,
            engine,
            settings,
            state: ManagerState::Uninitialized,
            active: None,
            system_audio_enabled: true,
        }
    }

    /// Manager for this platform and build, configured from `config`.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            get_backend(),
            default_engine(),
            EngineSettings::from(&config.engine),
        )
    }

    /// The process-wide manager, created from the standard config file on
    /// first use.
    pub fn global() -> &'static Mutex<CaptureManager> {
        GLOBAL.get_or_init(|| Mutex::new(Self::from_config(&AppConfig::load())))
    }

    /// The process-wide manager, created from `config` if it does not exist
    /// yet.
    pub fn global_with(config: &AppConfig) -> &'static Mutex<CaptureManager> {
        GLOBAL.get_or_init(|| Mutex::new(Self::from_config(config)))
    }

    pub fn state(&self) -> ManagerState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == ManagerState::Recording
    }

    /// Bring the backend and media engine up. Calling it again while
    /// initialized is a no-op.
    pub fn initialize(&mut self) -> ScreenBridgeResult<()> {
        if self.state.is_initialized() {
            tracing::debug!("Capture manager already initialized");
            return Ok(());
        }

        self.backend.init()?;

        let mut settings = self.settings.clone();
        settings.require(&self.backend.required_elements());
        if let Err(e) = self.engine.startup(&settings) {
            tracing::error!(engine = self.engine.name(), error = %e, "Media engine startup failed");
            self.engine.shutdown();
            return Err(e);
        }

        self.state = ManagerState::Idle;
        tracing::info!(
            engine = self.engine.name(),
            display_server = ?self.backend.display_server(),
            "Capture manager initialized"
        );
        Ok(())
    }

    /// Stop any recording and release the media engine.
    pub fn shutdown(&mut self) {
        if !self.state.is_initialized() {
            return;
        }

        if self.active.is_some() {
            if let Err(e) = self.stop_recording() {
                tracing::warn!(error = %e, "Failed to stop recording during shutdown");
            }
        }

        self.engine.shutdown();
        self.state = ManagerState::ShutDown;
        tracing::info!("Capture manager shut down");
    }

    pub fn displays(&self) -> ScreenBridgeResult<Vec<DisplayInfo>> {
        self.backend.list_displays()
    }

    pub fn windows(&self, filter: WindowFilter) -> ScreenBridgeResult<Vec<WindowInfo>> {
        Ok(filter.apply(self.backend.list_windows()?))
    }

    /// Start recording to `output`.
    pub fn start_recording(
        &mut self,
        output: &Path,
        config: &RecordingConfig,
    ) -> ScreenBridgeResult<()> {
        match self.state {
            ManagerState::Idle => {}
            ManagerState::Recording => {
                return Err(ScreenBridgeError::invalid_state("A recording is already in progress"));
            }
            ManagerState::Uninitialized | ManagerState::ShutDown => {
                return Err(ScreenBridgeError::invalid_state(
                    "Capture manager is not initialized",
                ));
            }
        }

        config.validate()?;
        let container = Container::from_path(output)?;
        let target = self.resolve_target(config)?;
        tracing::info!(source = %target.describe(), output = %output.display(), "Starting recording");

        let video = self.backend.video_source(&target, config.capture_cursor)?;
        let audio = if config.capture_audio && self.system_audio_enabled {
            self.audio_plan(config)
        } else {
            None
        };

        let plan = RecordingPlan {
            output: output.to_path_buf(),
            container,
            video,
            width: config.width,
            height: config.height,
            fps: config.fps,
            video_bitrate_kbps: config.video_bitrate_kbps,
            audio,
        };

        let mut pipeline = self.engine.build(&plan)?;
        pipeline.start()?;

        self.active = Some(ActiveRecording {
            output: plan.output,
            pipeline,
            clock: RecordingClock::start(),
        });
        self.state = ManagerState::Recording;
        Ok(())
    }

    /// Stop the active recording and finalize its file. Returns `None` when
    /// nothing was recording.
    pub fn stop_recording(&mut self) -> ScreenBridgeResult<Option<RecordingSummary>> {
        let Some(mut active) = self.active.take() else {
            tracing::debug!("stop_recording called without an active recording");
            return Ok(None);
        };
        self.state = ManagerState::Idle;

        let duration_secs = active.clock.elapsed_secs();
        active.pipeline.stop()?;

        let bytes_written = std::fs::metadata(&active.output)
            .map(|m| m.len())
            .unwrap_or(0);
        tracing::info!(
            output = %active.output.display(),
            duration_secs,
            bytes_written,
            "Recording stopped"
        );

        Ok(Some(RecordingSummary {
            path: active.output,
            duration_secs,
            bytes_written,
        }))
    }

    /// Toggle system audio for subsequent recordings.
    pub fn set_system_audio_enabled(&mut self, enabled: bool) -> bool {
        self.system_audio_enabled = enabled;
        tracing::info!(enabled, "System audio capture toggled");
        true
    }

    pub fn is_capture_audio_supported(&self) -> bool {
        self.backend
            .system_audio_source()
            .is_some_and(|source| self.audio_chain_available(&source))
    }

    pub fn check_screen_permission(&self) -> bool {
        self.backend.screen_permission()
    }

    pub fn request_screen_permission(&mut self) -> bool {
        self.backend.request_screen_permission()
    }

    pub fn status(&self) -> ManagerStatus {
        ManagerStatus {
            state: self.state,
            engine: self.engine.name(),
            display_server: self.backend.display_server(),
            system_audio_enabled: self.system_audio_enabled,
            output: self.active.as_ref().map(|a| a.output.clone()),
            elapsed_secs: self.active.as_ref().map(|a| a.clock.elapsed_secs()),
            started_at: self
                .active
                .as_ref()
                .map(|a| a.clock.epoch_wall().to_string()),
        }
    }

    /// Resolve the configured source against the current enumeration.
    pub fn resolve_target(&self, config: &RecordingConfig) -> ScreenBridgeResult<CaptureTarget> {
        match config.source_type {
            SourceType::Display => {
                let displays = self.backend.list_displays()?;
                let wanted = config.display_id.trim();
                let (index, display) = if wanted.is_empty() {
                    default_display(&displays)
                        .ok_or_else(|| ScreenBridgeError::source_not_found("No displays detected"))?
                } else {
                    displays
                        .iter()
                        .enumerate()
                        .find(|(_, d)| d.id == wanted)
                        .ok_or_else(|| {
                            ScreenBridgeError::source_not_found(format!(
                                "Display '{wanted}' not found. Available displays: {}",
                                display_list_for_error(&displays)
                            ))
                        })?
                };
                Ok(CaptureTarget::Display {
                    display: display.clone(),
                    index,
                })
            }
            SourceType::Window => {
                if config.window_id == 0 {
                    return Err(ScreenBridgeError::source_not_found("Window id 0 is not a window"));
                }
                self.backend
                    .list_windows()?
                    .into_iter()
                    .find(|w| w.id == config.window_id)
                    .map(CaptureTarget::Window)
                    .ok_or_else(|| {
                        ScreenBridgeError::source_not_found(format!(
                            "Window {} not found",
                            config.window_id
                        ))
                    })
            }
            SourceType::Application => {
                let owner = config.application_id.trim();
                let matching: Vec<WindowInfo> = self
                    .backend
                    .list_windows()?
                    .into_iter()
                    .filter(|w| w.is_owned_by(owner))
                    .collect();
                let best = matching
                    .iter()
                    .position(|w| w.on_screen && w.has_title())
                    .unwrap_or(0);
                matching
                    .into_iter()
                    .nth(best)
                    .map(CaptureTarget::Window)
                    .ok_or_else(|| {
                        ScreenBridgeError::source_not_found(format!(
                            "No window owned by application '{owner}'"
                        ))
                    })
            }
        }
    }

    fn audio_plan(&self, config: &RecordingConfig) -> Option<AudioPlan> {
        let Some(source) = self.backend.system_audio_source() else {
            tracing::warn!("System audio capture is not available on this platform; recording video only");
            return None;
        };
        if !self.audio_chain_available(&source) {
            tracing::warn!(
                element = source.factory,
                "System audio elements missing; recording video only"
            );
            return None;
        }
        Some(AudioPlan {
            source,
            bitrate_kbps: config.audio_bitrate_kbps,
            sample_rate: config.audio_sample_rate,
        })
    }

    fn audio_chain_available(&self, source: &SourceElement) -> bool {
        self.engine.has_element(source.factory)
            && AUDIO_CHAIN.iter().all(|e| self.engine.has_element(e))
    }
}

impl Drop for CaptureManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn display_list_for_error(displays: &[DisplayInfo]) -> String {
    if displays.is_empty() {
        return "none".to_string();
    }
    displays
        .iter()
        .map(|d| {
            format!(
                "{}:{}({}x{}@{},{}{})",
                d.id,
                d.name,
                d.width,
                d.height,
                d.x,
                d.y,
                if d.primary { ",primary" } else { "" }
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}
