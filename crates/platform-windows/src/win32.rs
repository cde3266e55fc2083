//! Win32 enumeration.

use screenbridge_common::error::{ScreenBridgeError, ScreenBridgeResult};
use screenbridge_platform_core::{DisplayInfo, WindowInfo};
use windows::core::PWSTR;
use windows::Win32::Foundation::{CloseHandle, BOOL, HWND, LPARAM, RECT};
use windows::Win32::Graphics::Gdi::{
    EnumDisplayMonitors, GetMonitorInfoW, HDC, HMONITOR, MONITORINFO, MONITORINFOEXW,
};
use windows::Win32::System::Threading::{
    OpenProcess, QueryFullProcessImageNameW, PROCESS_NAME_WIN32,
    PROCESS_QUERY_LIMITED_INFORMATION,
};
use windows::Win32::UI::WindowsAndMessaging::{
    EnumWindows, GetClassNameW, GetWindowRect, GetWindowTextW, GetWindowThreadProcessId,
    IsWindowVisible, MONITORINFOF_PRIMARY,
};

use crate::{executable_stem, wide_to_string};

pub(crate) fn detect_displays() -> ScreenBridgeResult<Vec<DisplayInfo>> {
    let mut monitors: Vec<HMONITOR> = Vec::new();

    unsafe extern "system" fn cb(hmon: HMONITOR, _: HDC, _: *mut RECT, data: LPARAM) -> BOOL {
        let list = data.0 as *mut Vec<HMONITOR>;
        unsafe { (*list).push(hmon) };
        BOOL(1)
    }

    // SAFETY: the callback only runs during this call, while `monitors`
    // is alive and exclusively borrowed through the LPARAM.
    let ok = unsafe {
        EnumDisplayMonitors(
            HDC::default(),
            None,
            Some(cb),
            LPARAM(&mut monitors as *mut _ as isize),
        )
    };
    if !ok.as_bool() {
        return Err(ScreenBridgeError::platform("EnumDisplayMonitors failed"));
    }

    let mut displays = Vec::with_capacity(monitors.len());
    for hmon in monitors {
        let mut info = MONITORINFOEXW::default();
        info.monitorInfo.cbSize = std::mem::size_of::<MONITORINFOEXW>() as u32;
        // SAFETY: cbSize announces the extended struct we pass in.
        let ok = unsafe {
            GetMonitorInfoW(hmon, &mut info as *mut MONITORINFOEXW as *mut MONITORINFO)
        };
        if !ok.as_bool() {
            tracing::debug!(monitor = ?hmon, "Skipping monitor without info");
            continue;
        }

        let rc = info.monitorInfo.rcMonitor;
        let index = displays.len();
        let name = wide_to_string(&info.szDevice);
        displays.push(DisplayInfo {
            id: (hmon.0 as usize).to_string(),
            name: if name.is_empty() {
                format!("Display {}", index + 1)
            } else {
                name
            },
            width: (rc.right - rc.left).max(0) as u32,
            height: (rc.bottom - rc.top).max(0) as u32,
            x: rc.left,
            y: rc.top,
            primary: info.monitorInfo.dwFlags & MONITORINFOF_PRIMARY != 0,
        });
    }

    tracing::debug!(count = displays.len(), "Detected monitors");
    Ok(displays)
}

pub(crate) fn detect_windows() -> ScreenBridgeResult<Vec<WindowInfo>> {
    let mut handles: Vec<HWND> = Vec::new();

    unsafe extern "system" fn cb(hwnd: HWND, data: LPARAM) -> BOOL {
        let list = data.0 as *mut Vec<HWND>;
        unsafe { (*list).push(hwnd) };
        BOOL(1)
    }

    // SAFETY: as above, `handles` outlives the enumeration.
    unsafe { EnumWindows(Some(cb), LPARAM(&mut handles as *mut _ as isize)) }
        .map_err(|e| ScreenBridgeError::platform(format!("EnumWindows failed: {e}")))?;

    let windows = handles.into_iter().filter_map(describe_window).collect::<Vec<_>>();
    tracing::debug!(count = windows.len(), "Detected windows");
    Ok(windows)
}

fn describe_window(hwnd: HWND) -> Option<WindowInfo> {
    let mut rect = RECT::default();
    // SAFETY: hwnd came from EnumWindows; stale handles only make the call fail.
    unsafe { GetWindowRect(hwnd, &mut rect) }.ok()?;

    let mut title = [0u16; 512];
    // SAFETY: the buffer length is passed through the slice.
    let len = unsafe { GetWindowTextW(hwnd, &mut title) };
    let name = wide_to_string(&title[..len.max(0) as usize]);

    let owner = process_name(hwnd).unwrap_or_else(|| class_name(hwnd));
    // SAFETY: read-only query on a window handle.
    let on_screen = unsafe { IsWindowVisible(hwnd) }.as_bool();

    Some(WindowInfo {
        id: hwnd.0 as usize as u64,
        name,
        owner,
        width: (rect.right - rect.left).max(0) as u32,
        height: (rect.bottom - rect.top).max(0) as u32,
        x: rect.left,
        y: rect.top,
        on_screen,
    })
}

fn process_name(hwnd: HWND) -> Option<String> {
    let mut pid = 0u32;
    // SAFETY: pid is a valid out pointer for the duration of the call.
    unsafe { GetWindowThreadProcessId(hwnd, Some(&mut pid as *mut u32)) };
    if pid == 0 {
        return None;
    }

    // SAFETY: the handle is closed below on every path.
    let process = unsafe { OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, pid) }.ok()?;
    let mut buf = [0u16; 1024];
    let mut size = buf.len() as u32;
    let queried = unsafe {
        QueryFullProcessImageNameW(
            process,
            PROCESS_NAME_WIN32,
            PWSTR(buf.as_mut_ptr()),
            &mut size,
        )
    };
    let _ = unsafe { CloseHandle(process) };
    queried.ok()?;

    executable_stem(&String::from_utf16_lossy(&buf[..size as usize]))
}

fn class_name(hwnd: HWND) -> String {
    let mut buf = [0u16; 256];
    // SAFETY: the buffer length is passed through the slice.
    let len = unsafe { GetClassNameW(hwnd, &mut buf) };
    wide_to_string(&buf[..len.max(0) as usize])
}
