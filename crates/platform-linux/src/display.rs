//! Display detection through the RandR extension.

use screenbridge_common::error::ScreenBridgeResult;
use screenbridge_platform_core::{DisplayInfo, DisplayServer};
use x11rb::connection::Connection;
use x11rb::protocol::randr::{self, ConnectionExt as RandrConnectionExt};

use crate::x11::{connect, x11_err};

/// Detect connected displays.
///
/// Every connected RandR output that drives a CRTC becomes one display,
/// identified by its output id. When RandR reports nothing usable the whole
/// root window is returned as a single display.
pub fn detect_displays() -> ScreenBridgeResult<Vec<DisplayInfo>> {
    tracing::debug!("Detecting displays via RandR");

    let (conn, screen_num) = connect()?;
    let screen = &conn.setup().roots[screen_num];
    let root = screen.root;

    let resources = conn
        .randr_get_screen_resources_current(root)
        .map_err(x11_err("RandR screen resources request failed"))?
        .reply()
        .map_err(x11_err("Failed to get RandR screen resources"))?;

    let primary_output = conn
        .randr_get_output_primary(root)
        .ok()
        .and_then(|cookie| cookie.reply().ok())
        .map(|reply| reply.output);

    let mut displays = Vec::new();
    for &output in &resources.outputs {
        let info = match conn
            .randr_get_output_info(output, resources.config_timestamp)
            .map_err(x11_err("RandR output info request failed"))?
            .reply()
        {
            Ok(info) => info,
            Err(e) => {
                tracing::debug!(output, error = %e, "Skipping RandR output");
                continue;
            }
        };

        if info.connection != randr::Connection::CONNECTED || info.crtc == 0 {
            continue;
        }

        let crtc = match conn
            .randr_get_crtc_info(info.crtc, resources.config_timestamp)
            .map_err(x11_err("RandR CRTC info request failed"))?
            .reply()
        {
            Ok(crtc) => crtc,
            Err(e) => {
                tracing::debug!(output, crtc = info.crtc, error = %e, "Skipping RandR CRTC");
                continue;
            }
        };

        if crtc.width == 0 || crtc.height == 0 {
            continue;
        }

        displays.push(display_from_output(
            output,
            &info.name,
            (crtc.x, crtc.y, crtc.width, crtc.height),
            primary_output == Some(output),
        ));
    }

    if displays.is_empty() {
        tracing::debug!("RandR reported no active outputs; using the root window");
        displays.push(DisplayInfo {
            id: screen_num.to_string(),
            name: format!("Screen {screen_num}"),
            width: u32::from(screen.width_in_pixels),
            height: u32::from(screen.height_in_pixels),
            x: 0,
            y: 0,
            primary: true,
        });
    }

    Ok(displays)
}

/// Build a display descriptor from a RandR output and its CRTC geometry.
fn display_from_output(
    output: u32,
    name: &[u8],
    (x, y, width, height): (i16, i16, u16, u16),
    primary: bool,
) -> DisplayInfo {
    let name = String::from_utf8_lossy(name).trim().to_string();
    DisplayInfo {
        id: output.to_string(),
        name: if name.is_empty() {
            format!("Output {output}")
        } else {
            name
        },
        width: u32::from(width),
        height: u32::from(height),
        x: i32::from(x),
        y: i32::from(y),
        primary,
    }
}

/// Detect the current display server.
pub fn detect_display_server() -> DisplayServer {
    if std::env::var("WAYLAND_DISPLAY").is_ok() {
        DisplayServer::Wayland
    } else if std::env::var("DISPLAY").is_ok() {
        DisplayServer::X11
    } else {
        DisplayServer::Unknown
    }
}
