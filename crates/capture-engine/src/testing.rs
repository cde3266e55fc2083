//! In-memory backend and engine for driving a [`CaptureManager`] without a
//! display server or media library.
//!
//! [`CaptureManager`]: crate::CaptureManager

use std::sync::{Arc, Mutex};

use screenbridge_common::error::{ScreenBridgeError, ScreenBridgeResult};
use screenbridge_platform_core::{DisplayInfo, DisplayServer, WindowInfo};

use crate::backend::{CaptureBackend, CaptureTarget, SourceElement};
use crate::engine::{EngineSettings, MediaEngine};
use crate::pipeline::{CapturePipeline, RecordingPlan};

/// Backend with a fixed set of displays and windows.
#[derive(Debug, Clone)]
pub struct FakeBackend {
    pub displays: Vec<DisplayInfo>,
    pub windows: Vec<WindowInfo>,
    pub audio: bool,
    pub permission: bool,
    pub fail_init: bool,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self {
            displays: vec![
                fake_display("1", "Built-in", 0, false),
                fake_display("2", "External", 1920, true),
            ],
            windows: vec![
                fake_window(101, "Inbox", "thunderbird", true),
                fake_window(102, "", "thunderbird", true),
                fake_window(103, "Notes", "gedit", false),
                fake_window(104, "Docs", "Firefox", true),
            ],
            audio: true,
            permission: true,
            fail_init: false,
        }
    }
}

pub fn fake_display(id: &str, name: &str, x: i32, primary: bool) -> DisplayInfo {
    DisplayInfo {
        id: id.to_string(),
        name: name.to_string(),
        width: 1920,
        height: 1080,
        x,
        y: 0,
        primary,
    }
}

pub fn fake_window(id: u64, name: &str, owner: &str, on_screen: bool) -> WindowInfo {
    WindowInfo {
        id,
        name: name.to_string(),
        owner: owner.to_string(),
        width: 1024,
        height: 768,
        x: 40,
        y: 40,
        on_screen,
    }
}

impl CaptureBackend for FakeBackend {
    fn init(&mut self) -> ScreenBridgeResult<()> {
        if self.fail_init {
            return Err(ScreenBridgeError::platform("fake backend refused to start"));
        }
        Ok(())
    }

    fn display_server(&self) -> DisplayServer {
        DisplayServer::Unknown
    }

    fn list_displays(&self) -> ScreenBridgeResult<Vec<DisplayInfo>> {
        Ok(self.displays.clone())
    }

    fn list_windows(&self) -> ScreenBridgeResult<Vec<WindowInfo>> {
        Ok(self.windows.clone())
    }

    fn video_source(
        &self,
        target: &CaptureTarget,
        capture_cursor: bool,
    ) -> ScreenBridgeResult<SourceElement> {
        let element = SourceElement::new("fakevideosrc").with("cursor", capture_cursor);
        Ok(match target {
            CaptureTarget::Display { display, .. } => element.with("display", &display.id),
            CaptureTarget::Window(window) => element.with("window", window.id),
        })
    }

    fn system_audio_source(&self) -> Option<SourceElement> {
        self.audio.then(|| SourceElement::new("fakeaudiosrc"))
    }

    fn required_elements(&self) -> Vec<&'static str> {
        vec!["fakevideosrc"]
    }

    fn screen_permission(&self) -> bool {
        self.permission
    }

    fn request_screen_permission(&mut self) -> bool {
        self.permission = true;
        true
    }
}

/// What a [`FakeEngine`] has been asked to do.
#[derive(Debug, Default)]
pub struct EngineLog {
    pub startups: usize,
    pub shutdowns: usize,
    pub plans: Vec<RecordingPlan>,
}

/// Engine that records plans and writes a few bytes to the output on stop.
#[derive(Debug, Clone, Default)]
pub struct FakeEngine {
    pub log: Arc<Mutex<EngineLog>>,
    pub fail_startup: bool,
    pub fail_start: bool,
    pub missing: Vec<&'static str>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_log<R>(&self, f: impl FnOnce(&mut EngineLog) -> R) -> R {
        let mut log = self.log.lock().unwrap_or_else(|p| p.into_inner());
        f(&mut log)
    }
}

impl MediaEngine for FakeEngine {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn startup(&mut self, settings: &EngineSettings) -> ScreenBridgeResult<()> {
        self.with_log(|log| log.startups += 1);
        if self.fail_startup {
            return Err(ScreenBridgeError::engine("fake engine startup failure"));
        }
        if let Some(missing) = settings
            .required_elements
            .iter()
            .find(|e| !self.has_element(e))
        {
            return Err(ScreenBridgeError::engine(format!(
                "Missing elements: {missing}"
            )));
        }
        Ok(())
    }

    fn has_element(&self, factory: &str) -> bool {
        !self.missing.iter().any(|m| *m == factory)
    }

    fn build(&self, plan: &RecordingPlan) -> ScreenBridgeResult<Box<dyn CapturePipeline>> {
        self.with_log(|log| log.plans.push(plan.clone()));
        Ok(Box::new(FakePipeline {
            plan: plan.clone(),
            fail_start: self.fail_start,
            running: false,
        }))
    }

    fn shutdown(&mut self) {
        self.with_log(|log| log.shutdowns += 1);
    }
}

struct FakePipeline {
    plan: RecordingPlan,
    fail_start: bool,
    running: bool,
}

impl CapturePipeline for FakePipeline {
    fn start(&mut self) -> ScreenBridgeResult<()> {
        if self.fail_start {
            return Err(ScreenBridgeError::engine("fake pipeline failed to start"));
        }
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) -> ScreenBridgeResult<()> {
        self.running = false;
        std::fs::write(&self.plan.output, self.plan.launch_description())?;
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running
    }
}
