//! Media engines: the library that turns a [`RecordingPlan`] into a running
//! pipeline.

use std::path::PathBuf;

use screenbridge_common::config::EngineConfig;
use screenbridge_common::error::{ScreenBridgeError, ScreenBridgeResult};

use crate::pipeline::{CapturePipeline, RecordingPlan};

/// Elements every recording needs regardless of platform.
pub const CORE_ELEMENTS: [&str; 7] = [
    "queue",
    "videoconvert",
    "videoscale",
    "videorate",
    "x264enc",
    "h264parse",
    "filesink",
];

/// Startup parameters of a media engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineSettings {
    /// Extra plugin directories to register.
    pub plugin_paths: Vec<PathBuf>,

    /// Also register bundled and system-wide plugin directories.
    pub scan_default_plugin_paths: bool,

    /// Element factories that must exist for startup to succeed.
    pub required_elements: Vec<String>,
}

impl From<&EngineConfig> for EngineSettings {
    fn from(config: &EngineConfig) -> Self {
        Self {
            plugin_paths: config.plugin_paths.clone(),
            scan_default_plugin_paths: config.scan_default_plugin_paths,
            required_elements: CORE_ELEMENTS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl EngineSettings {
    /// Add element factories to the required set, skipping duplicates.
    pub fn require(&mut self, elements: &[&str]) {
        for element in elements {
            if !self.required_elements.iter().any(|e| e == element) {
                self.required_elements.push(element.to_string());
            }
        }
    }

    /// Plugin directories to register: explicit ones first, then (when
    /// enabled) those shipped next to the executable and the platform's
    /// usual install locations.
    pub fn plugin_search_paths(&self) -> Vec<PathBuf> {
        let mut paths = self.plugin_paths.clone();
        if self.scan_default_plugin_paths {
            for path in bundled_plugin_paths().into_iter().chain(platform_plugin_paths()) {
                if !paths.contains(&path) {
                    paths.push(path);
                }
            }
        }
        paths
    }
}

/// Plugin directories of a relocatable install: `gstreamer-1.0` next to the
/// executable or in its sibling `lib` directory.
fn bundled_plugin_paths() -> Vec<PathBuf> {
    let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(PathBuf::from))
    else {
        return Vec::new();
    };

    vec![
        exe_dir.join("gstreamer-1.0"),
        exe_dir.join("..").join("lib").join("gstreamer-1.0"),
    ]
}

/// System-wide GStreamer plugin directories for this platform.
fn platform_plugin_paths() -> Vec<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        vec![
            PathBuf::from("/usr/lib/gstreamer-1.0"),
            PathBuf::from("/usr/lib/x86_64-linux-gnu/gstreamer-1.0"),
            PathBuf::from("/usr/lib/aarch64-linux-gnu/gstreamer-1.0"),
            PathBuf::from("/usr/lib64/gstreamer-1.0"),
            PathBuf::from("/usr/local/lib/gstreamer-1.0"),
        ]
    }
    #[cfg(target_os = "macos")]
    {
        vec![
            PathBuf::from("/opt/homebrew/lib/gstreamer-1.0"),
            PathBuf::from("/usr/local/lib/gstreamer-1.0"),
            PathBuf::from("/Library/Frameworks/GStreamer.framework/Versions/1.0/lib/gstreamer-1.0"),
        ]
    }
    #[cfg(target_os = "windows")]
    {
        let mut paths: Vec<PathBuf> = [
            "GSTREAMER_1_0_ROOT_MSVC_X86_64",
            "GSTREAMER_1_0_ROOT_X86_64",
        ]
        .iter()
        .filter_map(|var| std::env::var_os(var))
        .map(|root| PathBuf::from(root).join("lib").join("gstreamer-1.0"))
        .collect();
        paths.push(PathBuf::from(
            "C:\\Program Files\\gstreamer\\1.0\\msvc_x86_64\\lib\\gstreamer-1.0",
        ));
        paths
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    {
        Vec::new()
    }
}

/// Interface to the media library.
pub trait MediaEngine: Send {
    /// Short engine name for status reports.
    fn name(&self) -> &'static str;

    /// Initialise the library, register plugins, and verify required
    /// elements.
    fn startup(&mut self, settings: &EngineSettings) -> ScreenBridgeResult<()>;

    /// Whether an element factory is available.
    fn has_element(&self, factory: &str) -> bool;

    /// Build a pipeline for `plan`, ready to start.
    fn build(&self, plan: &RecordingPlan) -> ScreenBridgeResult<Box<dyn CapturePipeline>>;

    /// Release engine resources.
    fn shutdown(&mut self);

    /// Element factories of `plan` this engine lacks.
    fn missing_elements(&self, plan: &RecordingPlan) -> Vec<&'static str> {
        plan.required_elements()
            .into_iter()
            .filter(|element| !self.has_element(element))
            .collect()
    }
}

/// Get the engine compiled into this build.
pub fn default_engine() -> Box<dyn MediaEngine> {
    #[cfg(feature = "gstreamer")]
    {
        Box::new(GstEngine::new())
    }
    #[cfg(not(feature = "gstreamer"))]
    {
        Box::new(SimulatedEngine::new())
    }
}

#[cfg(feature = "gstreamer")]
pub use gst_engine::GstEngine;

#[cfg(feature = "gstreamer")]
mod gst_engine {
    use gstreamer as gst;
    use screenbridge_common::error::{ScreenBridgeError, ScreenBridgeResult};

    use super::{EngineSettings, MediaEngine};
    use crate::pipeline::{init_gstreamer, CapturePipeline, GstCapturePipeline, RecordingPlan};

    /// GStreamer-backed engine.
    #[derive(Debug, Default)]
    pub struct GstEngine {
        started: bool,
    }

    impl GstEngine {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl MediaEngine for GstEngine {
        fn name(&self) -> &'static str {
            "gstreamer"
        }

        fn startup(&mut self, settings: &EngineSettings) -> ScreenBridgeResult<()> {
            init_gstreamer()?;

            let registry = gst::Registry::get();
            for path in settings.plugin_search_paths() {
                if !path.is_dir() {
                    continue;
                }
                let changed = registry.scan_path(&path);
                tracing::debug!(path = %path.display(), changed, "Scanned plugin path");
            }

            let missing: Vec<&str> = settings
                .required_elements
                .iter()
                .map(String::as_str)
                .filter(|name| !self.has_element(name))
                .collect();
            if !missing.is_empty() {
                return Err(ScreenBridgeError::engine(format!(
                    "Missing GStreamer elements: {} (install the matching plugin packages)",
                    missing.join(", ")
                )));
            }

            let (major, minor, micro, _) = gst::version();
            tracing::info!(version = %format!("{major}.{minor}.{micro}"), "GStreamer initialized");
            self.started = true;
            Ok(())
        }

        fn has_element(&self, factory: &str) -> bool {
            init_gstreamer().is_ok() && gst::ElementFactory::find(factory).is_some()
        }

        fn build(&self, plan: &RecordingPlan) -> ScreenBridgeResult<Box<dyn CapturePipeline>> {
            if !self.started {
                return Err(ScreenBridgeError::invalid_state("GStreamer engine is not started"));
            }

            let missing = self.missing_elements(plan);
            if !missing.is_empty() {
                return Err(ScreenBridgeError::engine(format!(
                    "Missing GStreamer elements for this recording: {}",
                    missing.join(", ")
                )));
            }

            let launch = plan.launch_description();
            tracing::debug!(%launch, "Building recording pipeline");
            Ok(Box::new(GstCapturePipeline::from_launch("recording", &launch)?))
        }

        fn shutdown(&mut self) {
            // GStreamer cannot be re-initialised after deinit, so the library
            // stays loaded for the life of the process.
            self.started = false;
        }
    }
}

/// Engine used when no media library is compiled in.
///
/// Pipelines only track their running state and write nothing.
#[derive(Debug, Default)]
pub struct SimulatedEngine {
    started: bool,
}

impl SimulatedEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MediaEngine for SimulatedEngine {
    fn name(&self) -> &'static str {
        "simulated"
    }

    fn startup(&mut self, settings: &EngineSettings) -> ScreenBridgeResult<()> {
        tracing::info!(
            plugin_paths = settings.plugin_search_paths().len(),
            "No media library compiled in; recordings will be simulated"
        );
        self.started = true;
        Ok(())
    }

    fn has_element(&self, _factory: &str) -> bool {
        true
    }

    fn build(&self, plan: &RecordingPlan) -> ScreenBridgeResult<Box<dyn CapturePipeline>> {
        if !self.started {
            return Err(ScreenBridgeError::invalid_state(
                "Simulated engine is not started",
            ));
        }
        Ok(Box::new(SimulatedPipeline {
            output: plan.output.clone(),
            running: false,
        }))
    }

    fn shutdown(&mut self) {
        self.started = false;
    }
}

struct SimulatedPipeline {
    output: PathBuf,
    running: bool,
}

impl CapturePipeline for SimulatedPipeline {
    fn start(&mut self) -> ScreenBridgeResult<()> {
        tracing::info!(output = %self.output.display(), "Starting mock recording");
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) -> ScreenBridgeResult<()> {
        tracing::info!(output = %self.output.display(), "Stopping mock recording");
        self.running = false;
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running
    }
}
