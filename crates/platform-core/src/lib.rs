//! ScreenBridge platform core contracts.
//!
//! This crate contains the cross-platform display/window descriptors shared
//! by the platform crates, the capture engine, and the host bridge, without
//! coupling to a concrete OS backend.

use serde::{Deserialize, Serialize};

/// A connected display that can be recorded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DisplayInfo {
    /// Platform handle rendered as a string (RandR output id,
    /// CGDirectDisplayID, or HMONITOR value).
    pub id: String,
    /// Human readable name ("HDMI-1", "Display 1", "\\\\.\\DISPLAY1").
    pub name: String,
    /// Resolution in physical pixels.
    pub width: u32,
    pub height: u32,
    /// Position in the virtual desktop (pixels).
    pub x: i32,
    pub y: i32,
    /// Whether this display is the primary one.
    #[serde(default)]
    pub primary: bool,
}

/// A top-level window that can be recorded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WindowInfo {
    /// Platform handle (X11 window id, CGWindowID, or HWND value).
    pub id: u64,
    /// Window title. May be empty.
    pub name: String,
    /// Name of the owning process (or window class when unavailable).
    pub owner: String,
    pub width: u32,
    pub height: u32,
    pub x: i32,
    pub y: i32,
    /// Whether the window is currently mapped/visible on screen.
    #[serde(default = "default_on_screen")]
    pub on_screen: bool,
}

fn default_on_screen() -> bool {
    true
}

impl WindowInfo {
    /// Whether the window has a non-blank title.
    pub fn has_title(&self) -> bool {
        !self.name.trim().is_empty()
    }

    /// Whether `owner` names this window's owning application
    /// (case-insensitive, ignoring a trailing `.exe`).
    pub fn is_owned_by(&self, owner: &str) -> bool {
        let wanted = owner.trim();
        if wanted.is_empty() {
            return false;
        }
        let strip = |s: &str| {
            let lower = s.to_lowercase();
            lower
                .strip_suffix(".exe")
                .map(str::to_string)
                .unwrap_or(lower)
        };
        strip(&self.owner) == strip(wanted)
    }
}

/// Which windows an enumeration returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowFilter {
    /// Keep windows whose title is empty.
    pub include_untitled: bool,
    /// Keep windows that are not currently visible on screen.
    pub include_hidden: bool,
}

impl WindowFilter {
    /// A filter that keeps every window.
    pub fn all() -> Self {
        Self {
            include_untitled: true,
            include_hidden: true,
        }
    }

    /// Whether `window` passes this filter.
    pub fn accepts(&self, window: &WindowInfo) -> bool {
        (self.include_untitled || window.has_title()) && (self.include_hidden || window.on_screen)
    }

    /// Apply this filter to an enumeration result, keeping order.
    pub fn apply(&self, windows: Vec<WindowInfo>) -> Vec<WindowInfo> {
        windows.into_iter().filter(|w| self.accepts(w)).collect()
    }
}

/// Display server / platform family used for capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DisplayServer {
    Wayland,
    X11,
    Windows,
    MacOS,
    #[default]
    Unknown,
}

/// A system capability that recording may need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capability {
    pub name: String,
    pub description: String,
    pub available: bool,
    pub required: bool,
    pub fix_instructions: Option<String>,
}

impl Capability {
    /// Build a capability, attaching the fix only when it is missing.
    pub fn probe(
        name: impl Into<String>,
        description: impl Into<String>,
        available: bool,
        required: bool,
        fix: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            available,
            required,
            fix_instructions: if available { None } else { Some(fix.into()) },
        }
    }
}

/// Print a user-friendly capability report.
pub fn print_capability_report(capabilities: &[Capability]) {
    println!("ScreenBridge System Capabilities:");
    println!("{}", "-".repeat(60));

    for cap in capabilities {
        let status = if cap.available {
            "[OK]"
        } else if cap.required {
            "[MISSING - REQUIRED]"
        } else {
            "[MISSING - OPTIONAL]"
        };

        println!("  {} {}: {}", status, cap.name, cap.description);

        if let Some(ref fix) = cap.fix_instructions {
            println!("    Fix: {fix}");
        }
    }
}

/// Pick the display a capture should default to: the primary one, else the
/// first reported.
pub fn default_display(displays: &[DisplayInfo]) -> Option<(usize, &DisplayInfo)> {
    displays
        .iter()
        .enumerate()
        .find(|(_, d)| d.primary)
        .or_else(|| displays.iter().enumerate().next())
}

/// Compute virtual desktop bounds that include all connected displays.
/// Returns `(min_x, min_y, width, height)` in physical pixels.
pub fn virtual_desktop_bounds(displays: &[DisplayInfo]) -> (i32, i32, u32, u32) {
    if displays.is_empty() {
        return (0, 0, 1920, 1080);
    }

    let min_x = displays.iter().map(|d| d.x).min().unwrap_or(0);
    let min_y = displays.iter().map(|d| d.y).min().unwrap_or(0);
    let max_x = displays
        .iter()
        .map(|d| d.x + d.width as i32)
        .max()
        .unwrap_or(1920);
    let max_y = displays
        .iter()
        .map(|d| d.y + d.height as i32)
        .max()
        .unwrap_or(1080);

    let width = (max_x - min_x).max(1) as u32;
    let height = (max_y - min_y).max(1) as u32;
    (min_x, min_y, width, height)
}
