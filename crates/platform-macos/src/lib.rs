//! macOS platform integration.
//!
//! Displays and windows are enumerated through CoreGraphics. Capturing
//! either requires the Screen Recording permission, which can be checked
//! and requested here.

use screenbridge_common::error::ScreenBridgeResult;
use screenbridge_platform_core::{DisplayInfo, WindowInfo};

#[cfg(target_os = "macos")]
mod quartz;

/// Detect active displays.
pub fn detect_displays() -> ScreenBridgeResult<Vec<DisplayInfo>> {
    #[cfg(target_os = "macos")]
    {
        quartz::detect_displays()
    }
    #[cfg(not(target_os = "macos"))]
    {
        Err(unavailable("display enumeration"))
    }
}

/// Detect windows known to the window server, on screen or not.
pub fn detect_windows() -> ScreenBridgeResult<Vec<WindowInfo>> {
    #[cfg(target_os = "macos")]
    {
        quartz::detect_windows()
    }
    #[cfg(not(target_os = "macos"))]
    {
        Err(unavailable("window enumeration"))
    }
}

/// Whether this process may record the screen.
pub fn has_screen_capture_permission() -> bool {
    #[cfg(target_os = "macos")]
    {
        quartz::preflight_screen_capture_access()
    }
    #[cfg(not(target_os = "macos"))]
    {
        true
    }
}

/// Ask the user for the Screen Recording permission.
///
/// The system prompt is shown at most once per process; the return value
/// reflects the state after the request.
pub fn request_screen_capture_permission() -> bool {
    #[cfg(target_os = "macos")]
    {
        quartz::request_screen_capture_access()
    }
    #[cfg(not(target_os = "macos"))]
    {
        true
    }
}

#[cfg(not(target_os = "macos"))]
fn unavailable(what: &str) -> screenbridge_common::error::ScreenBridgeError {
    screenbridge_common::error::ScreenBridgeError::unsupported(format!(
        "macOS {what} is only available on macOS"
    ))
}
