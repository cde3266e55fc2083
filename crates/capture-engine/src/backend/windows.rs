use screenbridge_common::error::ScreenBridgeResult;
use screenbridge_platform_core::{DisplayInfo, DisplayServer, WindowInfo};
use screenbridge_platform_windows as platform_windows;

use crate::backend::{CaptureBackend, CaptureTarget, SourceElement};

/// Direct3D11 desktop duplication / Windows Graphics Capture through
/// `d3d11screencapturesrc`, desktop audio through WASAPI loopback.
pub struct WindowsBackend;

impl WindowsBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WindowsBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureBackend for WindowsBackend {
    fn init(&mut self) -> ScreenBridgeResult<()> {
        tracing::info!("Windows capture backend ready");
        Ok(())
    }

    fn display_server(&self) -> DisplayServer {
        DisplayServer::Windows
    }

    fn list_displays(&self) -> ScreenBridgeResult<Vec<DisplayInfo>> {
        platform_windows::detect_displays()
    }

    fn list_windows(&self) -> ScreenBridgeResult<Vec<WindowInfo>> {
        platform_windows::detect_windows()
    }

    fn video_source(
        &self,
        target: &CaptureTarget,
        capture_cursor: bool,
    ) -> ScreenBridgeResult<SourceElement> {
        let element = SourceElement::new("d3d11screencapturesrc");
        Ok(match target {
            CaptureTarget::Display { display, .. } => element
                .with("monitor-handle", &display.id)
                .with("show-cursor", capture_cursor),
            // Window capture is only offered by the WGC API.
            CaptureTarget::Window(window) => element
                .with("capture-api", "wgc")
                .with("window-handle", window.id)
                .with("show-cursor", capture_cursor),
        })
    }

    fn system_audio_source(&self) -> Option<SourceElement> {
        Some(
            SourceElement::new("wasapisrc")
                .with("loopback", true)
                .with("low-latency", true),
        )
    }

    fn required_elements(&self) -> Vec<&'static str> {
        vec!["d3d11screencapturesrc"]
    }
}
