//! Windows platform integration.
//!
//! Monitors come from `EnumDisplayMonitors` and are identified by their
//! `HMONITOR` value, which is also what `d3d11screencapturesrc` accepts as
//! `monitor-handle`. Windows come from `EnumWindows` and are identified by
//! their `HWND` value.

use screenbridge_common::error::ScreenBridgeResult;
use screenbridge_platform_core::{DisplayInfo, WindowInfo};

#[cfg(target_os = "windows")]
mod win32;

/// Detect monitors in the order Windows reports them.
pub fn detect_displays() -> ScreenBridgeResult<Vec<DisplayInfo>> {
    #[cfg(target_os = "windows")]
    {
        win32::detect_displays()
    }
    #[cfg(not(target_os = "windows"))]
    {
        Err(unavailable("monitor enumeration"))
    }
}

/// Detect top-level windows in Z order.
pub fn detect_windows() -> ScreenBridgeResult<Vec<WindowInfo>> {
    #[cfg(target_os = "windows")]
    {
        win32::detect_windows()
    }
    #[cfg(not(target_os = "windows"))]
    {
        Err(unavailable("window enumeration"))
    }
}

/// Decode a NUL-terminated UTF-16 buffer filled by a Win32 call.
pub fn wide_to_string(buf: &[u16]) -> String {
    let len = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    String::from_utf16_lossy(&buf[..len]).trim().to_string()
}

/// Final path component of an executable path, without its extension.
pub fn executable_stem(path: &str) -> Option<String> {
    let file = path.rsplit(['\\', '/']).next()?;
    let stem = match file.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file,
    };
    (!stem.is_empty()).then(|| stem.to_string())
}

#[cfg(not(target_os = "windows"))]
fn unavailable(what: &str) -> screenbridge_common::error::ScreenBridgeError {
    screenbridge_common::error::ScreenBridgeError::unsupported(format!(
        "Windows {what} is only available on Windows"
    ))
}
