use std::fmt;

use screenbridge_common::error::ScreenBridgeResult;
use screenbridge_platform_core::{DisplayInfo, DisplayServer, WindowInfo};

/// A resolved capture source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureTarget {
    /// A display, with its position in the enumeration.
    Display { display: DisplayInfo, index: usize },
    /// A single window.
    Window(WindowInfo),
}

impl CaptureTarget {
    /// Short human readable description for logs and errors.
    pub fn describe(&self) -> String {
        match self {
            Self::Display { display, index } => {
                format!("display {} ({}, #{index})", display.id, display.name)
            }
            Self::Window(window) => {
                format!("window {} ('{}' of {})", window.id, window.name, window.owner)
            }
        }
    }
}

/// A media source element: factory name plus properties, rendered into a
/// launch description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceElement {
    pub factory: &'static str,
    pub properties: Vec<(&'static str, String)>,
}

impl SourceElement {
    pub fn new(factory: &'static str) -> Self {
        Self {
            factory,
            properties: Vec::new(),
        }
    }

    /// Set a property, keeping insertion order.
    pub fn with(mut self, key: &'static str, value: impl fmt::Display) -> Self {
        self.properties.push((key, value.to_string()));
        self
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for SourceElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.factory)?;
        for (key, value) in &self.properties {
            if value.is_empty() || value.contains(char::is_whitespace) {
                write!(f, " {key}=\"{}\"", value.replace('"', "\\\""))?;
            } else {
                write!(f, " {key}={value}")?;
            }
        }
        Ok(())
    }
}

/// Abstract interface for platform-specific capture capabilities.
pub trait CaptureBackend: Send {
    /// Initialize the backend (e.g. detect the display server).
    fn init(&mut self) -> ScreenBridgeResult<()>;

    /// Display server or platform family in use.
    fn display_server(&self) -> DisplayServer;

    /// Enumerate displays.
    fn list_displays(&self) -> ScreenBridgeResult<Vec<DisplayInfo>>;

    /// Enumerate every top-level window, unfiltered.
    fn list_windows(&self) -> ScreenBridgeResult<Vec<WindowInfo>>;

    /// Source element that captures `target`.
    fn video_source(
        &self,
        target: &CaptureTarget,
        capture_cursor: bool,
    ) -> ScreenBridgeResult<SourceElement>;

    /// Source element for desktop audio, if the platform has one.
    fn system_audio_source(&self) -> Option<SourceElement>;

    /// Element factories this backend's sources need.
    fn required_elements(&self) -> Vec<&'static str>;

    /// Whether screen recording is currently permitted.
    fn screen_permission(&self) -> bool {
        true
    }

    /// Ask the OS for screen recording permission.
    fn request_screen_permission(&mut self) -> bool {
        true
    }
}

pub mod linux;
pub mod macos;
pub mod windows;

pub use linux::LinuxBackend;
pub use macos::MacOSBackend;
pub use windows::WindowsBackend;

/// Get the platform-specific backend.
///
/// Unix platforms other than macOS use the X11 backend.
pub fn get_backend() -> Box<dyn CaptureBackend> {
    #[cfg(target_os = "windows")]
    {
        Box::new(WindowsBackend::new())
    }
    #[cfg(target_os = "macos")]
    {
        Box::new(MacOSBackend::new())
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        Box::new(LinuxBackend::new())
    }
}
