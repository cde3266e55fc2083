//! CoreGraphics (Quartz) enumeration.

use std::ffi::c_void;

use core_foundation::base::{CFType, TCFType};
use core_foundation::boolean::CFBoolean;
use core_foundation::dictionary::{CFDictionary, CFDictionaryRef};
use core_foundation::number::CFNumber;
use core_foundation::string::CFString;
use core_graphics::display::CGDisplay;
use core_graphics::window::{
    copy_window_info, kCGNullWindowID, kCGWindowListExcludeDesktopElements,
    kCGWindowListOptionAll,
};
use screenbridge_common::error::{ScreenBridgeError, ScreenBridgeResult};
use screenbridge_platform_core::{DisplayInfo, WindowInfo};

#[link(name = "CoreGraphics", kind = "framework")]
extern "C" {
    fn CGPreflightScreenCaptureAccess() -> bool;
    fn CGRequestScreenCaptureAccess() -> bool;
}

type WindowDict = CFDictionary<CFString, CFType>;

pub(crate) fn detect_displays() -> ScreenBridgeResult<Vec<DisplayInfo>> {
    let ids = CGDisplay::active_displays().map_err(|code| {
        ScreenBridgeError::platform(format!("CGGetActiveDisplayList failed (error {code})"))
    })?;

    Ok(ids
        .into_iter()
        .enumerate()
        .map(|(index, id)| {
            let display = CGDisplay::new(id);
            let bounds = display.bounds();
            DisplayInfo {
                id: id.to_string(),
                name: format!("Display {}", index + 1),
                width: display.pixels_wide() as u32,
                height: display.pixels_high() as u32,
                x: bounds.origin.x as i32,
                y: bounds.origin.y as i32,
                primary: display.is_main(),
            }
        })
        .collect())
}

pub(crate) fn detect_windows() -> ScreenBridgeResult<Vec<WindowInfo>> {
    let list = copy_window_info(
        kCGWindowListOptionAll | kCGWindowListExcludeDesktopElements,
        kCGNullWindowID,
    )
    .ok_or_else(|| ScreenBridgeError::platform("CGWindowListCopyWindowInfo returned no list"))?;

    let mut windows = Vec::with_capacity(list.len() as usize);
    for item in list.iter() {
        // SAFETY: every element of the window info array is a CFDictionary
        // owned by the array, which outlives this borrow.
        let dict: WindowDict =
            unsafe { CFDictionary::wrap_under_get_rule(*item as CFDictionaryRef) };
        if let Some(window) = window_from_dict(&dict) {
            windows.push(window);
        }
    }

    tracing::debug!(count = windows.len(), "Detected windows");
    Ok(windows)
}

pub(crate) fn preflight_screen_capture_access() -> bool {
    // SAFETY: plain query without arguments.
    unsafe { CGPreflightScreenCaptureAccess() }
}

pub(crate) fn request_screen_capture_access() -> bool {
    // SAFETY: plain request without arguments; shows the system prompt.
    unsafe { CGRequestScreenCaptureAccess() }
}

fn window_from_dict(dict: &WindowDict) -> Option<WindowInfo> {
    let id = number(dict, "kCGWindowNumber")?;
    let owner = string(dict, "kCGWindowOwnerName")?;
    let name = string(dict, "kCGWindowName").unwrap_or_default();
    let on_screen = dict
        .find(CFString::from_static_string("kCGWindowIsOnscreen"))
        .and_then(|value| value.downcast::<CFBoolean>())
        .map(bool::from)
        .unwrap_or(false);

    let bounds = dict
        .find(CFString::from_static_string("kCGWindowBounds"))
        .and_then(|value| as_dictionary(&value));
    let (x, y, width, height) = bounds
        .as_ref()
        .map(|b| {
            (
                number(b, "X").unwrap_or(0),
                number(b, "Y").unwrap_or(0),
                number(b, "Width").unwrap_or(0),
                number(b, "Height").unwrap_or(0),
            )
        })
        .unwrap_or_default();

    Some(WindowInfo {
        id: u64::try_from(id).ok()?,
        name,
        owner,
        width: width.max(0) as u32,
        height: height.max(0) as u32,
        x: x as i32,
        y: y as i32,
        on_screen,
    })
}

fn as_dictionary(value: &CFType) -> Option<WindowDict> {
    if value.type_of() != CFDictionary::<*const c_void, *const c_void>::type_id() {
        return None;
    }
    // SAFETY: the type id check above guarantees a CFDictionary.
    Some(unsafe { CFDictionary::wrap_under_get_rule(value.as_CFTypeRef() as CFDictionaryRef) })
}

fn number(dict: &WindowDict, key: &'static str) -> Option<i64> {
    dict.find(CFString::from_static_string(key))
        .and_then(|value| value.downcast::<CFNumber>())
        .and_then(|n| n.to_i64().or_else(|| n.to_f64().map(|f| f as i64)))
}

fn string(dict: &WindowDict, key: &'static str) -> Option<String> {
    dict.find(CFString::from_static_string(key))
        .and_then(|value| value.downcast::<CFString>())
        .map(|s| s.to_string())
}
