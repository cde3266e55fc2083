//! ScreenBridge Linux Platform Integration
//!
//! Platform-specific implementations for Linux:
//! - **Display Detection:** RandR output enumeration
//! - **Window Detection:** EWMH client list with process ownership
//! - **Permissions:** Capability detection and user guidance

pub mod display;
pub mod permissions;
pub mod window;

mod x11;

pub use display::*;
pub use window::*;
