use screenbridge_common::error::{ScreenBridgeError, ScreenBridgeResult};
use screenbridge_platform_core::{DisplayInfo, DisplayServer, WindowInfo};
use screenbridge_platform_macos as platform_macos;

use crate::backend::{CaptureBackend, CaptureTarget, SourceElement};

/// AVFoundation screen capture through `avfvideosrc`.
///
/// `avfvideosrc` can only record whole displays and has no loopback audio
/// input, so window capture is refused and recordings are video-only.
pub struct MacOSBackend;

impl MacOSBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MacOSBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureBackend for MacOSBackend {
    fn init(&mut self) -> ScreenBridgeResult<()> {
        if !platform_macos::has_screen_capture_permission() {
            tracing::warn!(
                "Screen Recording permission not granted; recordings will only show the desktop background"
            );
        }
        Ok(())
    }

    fn display_server(&self) -> DisplayServer {
        DisplayServer::MacOS
    }

    fn list_displays(&self) -> ScreenBridgeResult<Vec<DisplayInfo>> {
        platform_macos::detect_displays()
    }

    fn list_windows(&self) -> ScreenBridgeResult<Vec<WindowInfo>> {
        platform_macos::detect_windows()
    }

    fn video_source(
        &self,
        target: &CaptureTarget,
        capture_cursor: bool,
    ) -> ScreenBridgeResult<SourceElement> {
        match target {
            CaptureTarget::Display { index, .. } => Ok(SourceElement::new("avfvideosrc")
                .with("capture-screen", true)
                .with("capture-screen-cursor", capture_cursor)
                .with("device-index", index)),
            CaptureTarget::Window(window) => Err(ScreenBridgeError::unsupported(format!(
                "Window capture is not available on macOS (window {})",
                window.id
            ))),
        }
    }

    fn system_audio_source(&self) -> Option<SourceElement> {
        None
    }

    fn required_elements(&self) -> Vec<&'static str> {
        vec!["avfvideosrc"]
    }

    fn screen_permission(&self) -> bool {
        platform_macos::has_screen_capture_permission()
    }

    fn request_screen_permission(&mut self) -> bool {
        platform_macos::request_screen_capture_permission()
    }
}
