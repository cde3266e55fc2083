//! Capability detection and guidance for Linux.
//!
//! Recording on Linux needs an X11 display with RandR. Window listing
//! relies on an EWMH window manager, and system audio on a PulseAudio
//! compatible sound server.

use std::path::PathBuf;

use screenbridge_platform_core::Capability;
use x11rb::connection::Connection;
use x11rb::protocol::randr;

use crate::x11::connect;

/// Check all capabilities and report status.
pub fn check_capabilities() -> Vec<Capability> {
    let mut capabilities = Vec::new();

    match connect() {
        Ok((conn, _)) => {
            capabilities.push(Capability::probe(
                "X11 Display",
                "Connection to the X server named by DISPLAY",
                true,
                true,
                "",
            ));
            capabilities.push(check_randr(&conn));
        }
        Err(e) => {
            tracing::debug!(error = %e, "X11 connection failed during capability check");
            capabilities.push(Capability::probe(
                "X11 Display",
                "Connection to the X server named by DISPLAY",
                false,
                true,
                "Run inside a graphical X11 session, or export DISPLAY=:0",
            ));
        }
    }

    capabilities.push(check_native_x11_session());
    capabilities.push(check_pulse_server());
    capabilities
}

/// Screen recording needs no user consent on X11.
pub fn has_screen_capture_permission() -> bool {
    true
}

fn check_randr(conn: &impl Connection) -> Capability {
    let available = conn
        .extension_information(randr::X11_EXTENSION_NAME)
        .map(|info| info.is_some())
        .unwrap_or(false);

    Capability::probe(
        "XRandR",
        "RandR extension for display enumeration",
        available,
        true,
        "Enable the RANDR extension in your X server configuration",
    )
}

fn check_native_x11_session() -> Capability {
    let wayland = std::env::var("WAYLAND_DISPLAY").is_ok();

    Capability::probe(
        "Native X11 Session",
        "Capture of every application (XWayland only exposes X11 clients)",
        !wayland,
        false,
        "Log into an X11 session to record native Wayland windows",
    )
}

fn check_pulse_server() -> Capability {
    Capability::probe(
        "System Audio",
        "PulseAudio-compatible server for desktop audio capture",
        has_system_audio_server(),
        false,
        "Install and start PipeWire with pipewire-pulse, or PulseAudio",
    )
}

/// Native socket of the user's PulseAudio server.
fn pulse_socket_path() -> PathBuf {
    if let Ok(server) = std::env::var("PULSE_SERVER") {
        let path = server.strip_prefix("unix:").unwrap_or(&server);
        return PathBuf::from(path);
    }

    let runtime_dir = std::env::var("XDG_RUNTIME_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| default_runtime_dir());
    runtime_dir.join("pulse").join("native")
}

#[cfg(unix)]
fn default_runtime_dir() -> PathBuf {
    // SAFETY: getuid has no preconditions and cannot fail.
    let uid = unsafe { libc::getuid() };
    PathBuf::from(format!("/run/user/{uid}"))
}

#[cfg(not(unix))]
fn default_runtime_dir() -> PathBuf {
    std::env::temp_dir()
}

/// Whether a PulseAudio-compatible server socket is present.
pub fn has_system_audio_server() -> bool {
    pulse_socket_path().exists()
}
