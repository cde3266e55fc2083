//! Shared X11 connection helpers.

use screenbridge_common::error::{ScreenBridgeError, ScreenBridgeResult};
use x11rb::rust_connection::RustConnection;

x11rb::atom_manager! {
    pub(crate) Atoms: AtomsCookie {
        _NET_CLIENT_LIST,
        _NET_WM_NAME,
        _NET_WM_PID,
        UTF8_STRING,
    }
}

/// Connect to the X server named by `DISPLAY`.
pub(crate) fn connect() -> ScreenBridgeResult<(RustConnection, usize)> {
    RustConnection::connect(None).map_err(|e| {
        ScreenBridgeError::platform(format!(
            "Failed to connect to X11 display (is DISPLAY set?): {e}"
        ))
    })
}

/// Map any X11 error into a platform error with context.
pub(crate) fn x11_err<E: std::fmt::Display>(
    context: &'static str,
) -> impl FnOnce(E) -> ScreenBridgeError {
    move |e| ScreenBridgeError::platform(format!("{context}: {e}"))
}
