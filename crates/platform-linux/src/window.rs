//! Top-level window detection through EWMH.

use screenbridge_common::error::ScreenBridgeResult;
use screenbridge_platform_core::WindowInfo;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{AtomEnum, ConnectionExt, MapState, Window, WindowClass};
use x11rb::rust_connection::RustConnection;

use crate::x11::{connect, x11_err, Atoms};

/// Detect top-level windows, in stacking order as reported by the window
/// manager.
///
/// Uses `_NET_CLIENT_LIST` when the window manager publishes it, otherwise
/// the children of the root window. Windows that disappear mid-enumeration
/// are skipped.
pub fn detect_windows() -> ScreenBridgeResult<Vec<WindowInfo>> {
    let (conn, screen_num) = connect()?;
    let root = conn.setup().roots[screen_num].root;
    let atoms = Atoms::new(&conn)
        .map_err(x11_err("Atom intern request failed"))?
        .reply()
        .map_err(x11_err("Failed to intern EWMH atoms"))?;

    let (ids, managed) = match client_list(&conn, root, &atoms)? {
        Some(ids) => (ids, true),
        None => {
            tracing::debug!("_NET_CLIENT_LIST unavailable; falling back to root children");
            let tree = conn
                .query_tree(root)
                .map_err(x11_err("QueryTree request failed"))?
                .reply()
                .map_err(x11_err("Failed to query root window children"))?;
            (tree.children, false)
        }
    };

    let mut windows = Vec::with_capacity(ids.len());
    for id in ids {
        match describe_window(&conn, root, &atoms, id, managed) {
            Ok(Some(window)) => windows.push(window),
            Ok(None) => {}
            Err(e) => tracing::debug!(window = id, error = %e, "Skipping window"),
        }
    }

    tracing::debug!(count = windows.len(), "Detected windows");
    Ok(windows)
}

fn client_list(
    conn: &RustConnection,
    root: Window,
    atoms: &Atoms,
) -> ScreenBridgeResult<Option<Vec<Window>>> {
    let reply = conn
        .get_property(
            false,
            root,
            atoms._NET_CLIENT_LIST,
            AtomEnum::WINDOW,
            0,
            u32::MAX,
        )
        .map_err(x11_err("GetProperty request failed"))?
        .reply()
        .map_err(x11_err("Failed to read _NET_CLIENT_LIST"))?;

    Ok(reply
        .value32()
        .map(|ids| ids.collect::<Vec<_>>())
        .filter(|ids| !ids.is_empty()))
}

fn describe_window(
    conn: &RustConnection,
    root: Window,
    atoms: &Atoms,
    id: Window,
    managed: bool,
) -> ScreenBridgeResult<Option<WindowInfo>> {
    let attrs = conn
        .get_window_attributes(id)
        .map_err(x11_err("GetWindowAttributes request failed"))?
        .reply()
        .map_err(x11_err("Failed to read window attributes"))?;

    if attrs.class == WindowClass::INPUT_ONLY || (!managed && attrs.override_redirect) {
        return Ok(None);
    }

    let geometry = conn
        .get_geometry(id)
        .map_err(x11_err("GetGeometry request failed"))?
        .reply()
        .map_err(x11_err("Failed to read window geometry"))?;

    let origin = conn
        .translate_coordinates(id, root, 0, 0)
        .map_err(x11_err("TranslateCoordinates request failed"))?
        .reply()
        .map_err(x11_err("Failed to translate window coordinates"))?;

    let name = read_text_property(conn, id, atoms._NET_WM_NAME, atoms.UTF8_STRING.into())?
        .or(read_text_property(
            conn,
            id,
            AtomEnum::WM_NAME.into(),
            AtomEnum::ANY.into(),
        )?)
        .unwrap_or_default();

    let owner = match window_pid(conn, id, atoms)? {
        Some(pid) => process_name(pid),
        None => None,
    };
    let owner = match owner {
        Some(owner) => owner,
        None => read_raw_property(conn, id, AtomEnum::WM_CLASS.into(), AtomEnum::STRING.into())?
            .as_deref()
            .and_then(parse_wm_class)
            .unwrap_or_default(),
    };

    Ok(Some(WindowInfo {
        id: u64::from(id),
        name,
        owner,
        width: u32::from(geometry.width),
        height: u32::from(geometry.height),
        x: i32::from(origin.dst_x),
        y: i32::from(origin.dst_y),
        on_screen: attrs.map_state == MapState::VIEWABLE,
    }))
}

fn read_raw_property(
    conn: &RustConnection,
    id: Window,
    property: u32,
    type_: u32,
) -> ScreenBridgeResult<Option<Vec<u8>>> {
    let reply = conn
        .get_property(false, id, property, type_, 0, 1024)
        .map_err(x11_err("GetProperty request failed"))?
        .reply()
        .map_err(x11_err("Failed to read window property"))?;

    if reply.value.is_empty() {
        Ok(None)
    } else {
        Ok(Some(reply.value))
    }
}

fn read_text_property(
    conn: &RustConnection,
    id: Window,
    property: u32,
    type_: u32,
) -> ScreenBridgeResult<Option<String>> {
    Ok(read_raw_property(conn, id, property, type_)?
        .map(|raw| decode_text(&raw))
        .filter(|text| !text.is_empty()))
}

fn window_pid(conn: &RustConnection, id: Window, atoms: &Atoms) -> ScreenBridgeResult<Option<u32>> {
    let reply = conn
        .get_property(false, id, atoms._NET_WM_PID, AtomEnum::CARDINAL, 0, 1)
        .map_err(x11_err("GetProperty request failed"))?
        .reply()
        .map_err(x11_err("Failed to read _NET_WM_PID"))?;

    Ok(reply.value32().and_then(|mut values| values.next()))
}

/// Short process name from procfs.
fn process_name(pid: u32) -> Option<String> {
    std::fs::read_to_string(format!("/proc/{pid}/comm"))
        .ok()
        .map(|comm| comm.trim().to_string())
        .filter(|comm| !comm.is_empty())
}

/// Decode an X11 text property, dropping NUL padding.
fn decode_text(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .trim_end_matches('\0')
        .trim()
        .to_string()
}

/// `WM_CLASS` holds `instance\0class\0`; the class names the application.
fn parse_wm_class(raw: &[u8]) -> Option<String> {
    let mut parts = raw
        .split(|b| *b == 0)
        .map(|part| String::from_utf8_lossy(part).trim().to_string())
        .filter(|part| !part.is_empty());
    let instance = parts.next();
    parts.next().or(instance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wm_class_prefers_class_over_instance() {
        assert_eq!(
            parse_wm_class(b"navigator\0Firefox\0").as_deref(),
            Some("Firefox")
        );
        assert_eq!(parse_wm_class(b"xterm\0").as_deref(), Some("xterm"));
        assert_eq!(parse_wm_class(b"\0\0"), None);
    }

    #[test]
    fn text_properties_drop_nul_padding() {
        assert_eq!(decode_text(b"Terminal\0\0"), "Terminal");
        assert_eq!(decode_text("Caf\u{e9}".as_bytes()), "Caf\u{e9}");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn process_name_reads_own_comm() {
        let name = process_name(std::process::id());
        assert!(name.is_some_and(|n| !n.is_empty()));
    }
}
