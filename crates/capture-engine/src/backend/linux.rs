use screenbridge_common::error::{ScreenBridgeError, ScreenBridgeResult};
use screenbridge_platform_core::{DisplayInfo, DisplayServer, WindowInfo};
use screenbridge_platform_linux::permissions::{has_screen_capture_permission, has_system_audio_server};
use screenbridge_platform_linux::{detect_display_server, detect_displays, detect_windows};

use crate::backend::{CaptureBackend, CaptureTarget, SourceElement};

/// X11 capture through `ximagesrc`, desktop audio through the PulseAudio
/// default sink monitor.
pub struct LinuxBackend {
    display_server: DisplayServer,
}

impl LinuxBackend {
    pub fn new() -> Self {
        Self {
            display_server: DisplayServer::Unknown,
        }
    }
}

impl Default for LinuxBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureBackend for LinuxBackend {
    fn init(&mut self) -> ScreenBridgeResult<()> {
        self.display_server = detect_display_server();
        tracing::info!(display_server = ?self.display_server, "Detected display server on Linux backend");

        match self.display_server {
            DisplayServer::X11 => Ok(()),
            DisplayServer::Wayland if std::env::var("DISPLAY").is_ok() => {
                tracing::warn!(
                    "Wayland session detected; only XWayland clients are visible to X11 capture"
                );
                Ok(())
            }
            _ => Err(ScreenBridgeError::platform(
                "No X11 display available (DISPLAY is not set)",
            )),
        }
    }

    fn display_server(&self) -> DisplayServer {
        self.display_server
    }

    fn list_displays(&self) -> ScreenBridgeResult<Vec<DisplayInfo>> {
        detect_displays()
    }

    fn list_windows(&self) -> ScreenBridgeResult<Vec<WindowInfo>> {
        detect_windows()
    }

    fn video_source(
        &self,
        target: &CaptureTarget,
        capture_cursor: bool,
    ) -> ScreenBridgeResult<SourceElement> {
        // `use-damage=false` ensures full frame delivery (no incremental
        // damage updates that can miss regions).
        let element = SourceElement::new("ximagesrc")
            .with("use-damage", false)
            .with("show-pointer", capture_cursor);

        match target {
            CaptureTarget::Display { display, .. } => {
                let (startx, starty, endx, endy) =
                    x11_capture_region(display.x, display.y, display.width, display.height)?;
                Ok(element
                    .with("startx", startx)
                    .with("starty", starty)
                    .with("endx", endx)
                    .with("endy", endy))
            }
            CaptureTarget::Window(window) => {
                let xid = u32::try_from(window.id).map_err(|_| {
                    ScreenBridgeError::source_not_found(format!(
                        "Window id {} is not an X11 window",
                        window.id
                    ))
                })?;
                Ok(element.with("xid", xid))
            }
        }
    }

    fn system_audio_source(&self) -> Option<SourceElement> {
        if !has_system_audio_server() {
            tracing::debug!("No PulseAudio-compatible server socket found");
            return None;
        }
        Some(SourceElement::new("pulsesrc").with("device", "@DEFAULT_MONITOR@"))
    }

    fn required_elements(&self) -> Vec<&'static str> {
        vec!["ximagesrc"]
    }

    fn screen_permission(&self) -> bool {
        has_screen_capture_permission()
    }
}

/// Inclusive `ximagesrc` crop coordinates for a display rectangle.
fn x11_capture_region(
    x: i32,
    y: i32,
    width: u32,
    height: u32,
) -> ScreenBridgeResult<(u32, u32, u32, u32)> {
    if width == 0 || height == 0 {
        return Err(ScreenBridgeError::capture(format!(
            "Invalid X11 capture region {width}x{height} at ({x},{y})"
        )));
    }

    let startx = u32::try_from(x)
        .map_err(|_| ScreenBridgeError::capture(format!("X11 capture x origin is negative: {x}")))?;
    let starty = u32::try_from(y)
        .map_err(|_| ScreenBridgeError::capture(format!("X11 capture y origin is negative: {y}")))?;

    let endx = startx
        .checked_add(width - 1)
        .ok_or_else(|| ScreenBridgeError::capture("X11 capture region x-range overflow"))?;
    let endy = starty
        .checked_add(height - 1)
        .ok_or_else(|| ScreenBridgeError::capture("X11 capture region y-range overflow"))?;

    Ok((startx, starty, endx, endy))
}
