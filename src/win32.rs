//! [`WindowSystem`] implementation on top of the Win32 API.
//!
//! Every call is a thin wrapper around one `user32` function.  Window and
//! monitor handles are carried around as plain integers and only turned
//! back into pointers at the call site.

use crate::command::{MonitorHandle, MonitorInfo, WindowHandle};
use crate::geometry::Rect;
use crate::traits::WindowSystem;
use log::debug;
use std::ptr;
use winapi::shared::minwindef::{BOOL, DWORD, FALSE, LPARAM, TRUE};
use winapi::shared::windef::{HDC, HMONITOR, HWND, LPRECT, POINT, RECT};
use winapi::um::errhandlingapi::GetLastError;
use winapi::um::libloaderapi::GetModuleHandleW;
use winapi::um::winuser::{
    CreateWindowExW, DestroyWindow, EnumDisplayMonitors, EnumWindows, GetCursorPos,
    DispatchMessageW, GetMonitorInfoW, GetShellWindow, GetWindowRect, GetWindowTextLengthW,
    GetWindowTextW, IsWindow, IsWindowVisible, MonitorFromPoint, MonitorFromWindow, MoveWindow,
    PeekMessageW, PostMessageW, ShowWindow, TranslateMessage, LPMONITORINFO, MONITORINFOEXW,
    MONITOR_DEFAULTTONULL, MSG, PM_REMOVE, SW_HIDE, SW_SHOWNA, WM_CLOSE, WM_QUIT,
    WS_EX_NOACTIVATE, WS_EX_TOOLWINDOW, WS_POPUP,
};

/// A failed `user32` call and the thread's last-error code.
#[derive(Debug, thiserror::Error)]
#[error("{call} failed (error {code})")]
pub struct Win32Error {
    call: &'static str,
    code: DWORD,
}

impl Win32Error {
    fn last(call: &'static str) -> Self {
        Self {
            call,
            code: unsafe { GetLastError() },
        }
    }
}

const ERROR_INVALID_WINDOW_HANDLE: DWORD = 1400;

fn hwnd(window: WindowHandle) -> HWND {
    window.0 as usize as HWND
}

fn window_handle(hwnd: HWND) -> WindowHandle {
    WindowHandle(hwnd as usize as u64)
}

fn monitor_handle(hmon: HMONITOR) -> Option<MonitorHandle> {
    if hmon.is_null() {
        None
    } else {
        Some(MonitorHandle(hmon as usize as u64))
    }
}

fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

fn from_wide(buf: &[u16]) -> String {
    let len = buf.iter().position(|c| *c == 0).unwrap_or(buf.len());
    String::from_utf16_lossy(&buf[..len])
}

/// The desktop of the current Windows session.
#[derive(Debug, Default)]
pub struct Win32Desktop;

impl Win32Desktop {
    pub fn new() -> Self {
        Self
    }

    fn monitor_info(hmon: HMONITOR) -> MonitorInfo {
        let mut info: MONITORINFOEXW = unsafe { std::mem::zeroed() };
        info.cbSize = std::mem::size_of::<MONITORINFOEXW>() as DWORD;
        let ok = unsafe { GetMonitorInfoW(hmon, &mut info as *mut MONITORINFOEXW as LPMONITORINFO) };
        let r = info.rcMonitor;
        MonitorInfo {
            handle: MonitorHandle(hmon as usize as u64),
            bounds: Rect::new(r.left, r.top, r.right, r.bottom),
            name: from_wide(&info.szDevice),
            valid: ok != FALSE,
        }
    }
}

unsafe extern "system" fn collect_monitor(
    hmon: HMONITOR,
    _hdc: HDC,
    _clip: LPRECT,
    data: LPARAM,
) -> BOOL {
    let out = &mut *(data as *mut Vec<HMONITOR>);
    out.push(hmon);
    TRUE
}

unsafe extern "system" fn collect_window(hwnd: HWND, data: LPARAM) -> BOOL {
    let out = &mut *(data as *mut Vec<WindowHandle>);
    out.push(window_handle(hwnd));
    TRUE
}

impl WindowSystem for Win32Desktop {
    type Error = Win32Error;

    fn monitors(&self) -> Result<Vec<MonitorInfo>, Win32Error> {
        let mut handles: Vec<HMONITOR> = Vec::new();
        let ok = unsafe {
            EnumDisplayMonitors(
                ptr::null_mut(),
                ptr::null(),
                Some(collect_monitor),
                &mut handles as *mut Vec<HMONITOR> as LPARAM,
            )
        };
        if ok == FALSE {
            return Err(Win32Error::last("EnumDisplayMonitors"));
        }
        Ok(handles.into_iter().map(Self::monitor_info).collect())
    }

    fn top_level_windows(&self) -> Result<Vec<WindowHandle>, Win32Error> {
        let mut windows: Vec<WindowHandle> = Vec::new();
        let ok = unsafe {
            EnumWindows(
                Some(collect_window),
                &mut windows as *mut Vec<WindowHandle> as LPARAM,
            )
        };
        if ok == FALSE {
            return Err(Win32Error::last("EnumWindows"));
        }
        Ok(windows)
    }

    fn is_window(&self, window: WindowHandle) -> bool {
        unsafe { IsWindow(hwnd(window)) != FALSE }
    }

    fn is_visible(&self, window: WindowHandle) -> bool {
        unsafe { IsWindowVisible(hwnd(window)) != FALSE }
    }

    fn window_title(&self, window: WindowHandle) -> String {
        let hwnd = hwnd(window);
        let capacity = unsafe { GetWindowTextLengthW(hwnd) };
        if capacity <= 0 {
            return String::new();
        }
        // The length may be an overestimate, never an underestimate.
        let mut buf = vec![0u16; capacity as usize + 1];
        let len = unsafe { GetWindowTextW(hwnd, buf.as_mut_ptr(), buf.len() as i32) };
        if len <= 0 {
            return String::new();
        }
        from_wide(&buf[..len as usize])
    }

    fn shell_window(&self) -> Option<WindowHandle> {
        let shell = unsafe { GetShellWindow() };
        if shell.is_null() {
            None
        } else {
            Some(window_handle(shell))
        }
    }

    fn window_rect(&self, window: WindowHandle) -> Result<Rect, Win32Error> {
        let mut r = RECT {
            left: 0,
            top: 0,
            right: 0,
            bottom: 0,
        };
        if unsafe { GetWindowRect(hwnd(window), &mut r) } == FALSE {
            return Err(Win32Error::last("GetWindowRect"));
        }
        Ok(Rect::new(r.left, r.top, r.right, r.bottom))
    }

    fn set_window_rect(&self, window: WindowHandle, rect: &Rect) -> Result<(), Win32Error> {
        let ok = unsafe {
            MoveWindow(
                hwnd(window),
                rect.left,
                rect.top,
                rect.width(),
                rect.height(),
                TRUE,
            )
        };
        if ok == FALSE {
            return Err(Win32Error::last("MoveWindow"));
        }
        Ok(())
    }

    fn set_visible(&self, window: WindowHandle, visible: bool) -> Result<(), Win32Error> {
        // ShowWindow returns the previous visibility, not success.
        if !self.is_window(window) {
            return Err(Win32Error {
                call: "ShowWindow",
                code: ERROR_INVALID_WINDOW_HANDLE,
            });
        }
        let cmd = if visible { SW_SHOWNA } else { SW_HIDE };
        unsafe { ShowWindow(hwnd(window), cmd) };
        Ok(())
    }

    fn request_close(&self, window: WindowHandle) -> Result<(), Win32Error> {
        if unsafe { PostMessageW(hwnd(window), WM_CLOSE, 0, 0) } == FALSE {
            return Err(Win32Error::last("PostMessageW"));
        }
        Ok(())
    }

    fn monitor_from_window(&self, window: WindowHandle) -> Option<MonitorHandle> {
        monitor_handle(unsafe { MonitorFromWindow(hwnd(window), MONITOR_DEFAULTTONULL) })
    }

    fn cursor_monitor(&self) -> Option<MonitorHandle> {
        let mut pt = POINT { x: 0, y: 0 };
        if unsafe { GetCursorPos(&mut pt) } == FALSE {
            return None;
        }
        monitor_handle(unsafe { MonitorFromPoint(pt, MONITOR_DEFAULTTONULL) })
    }

    fn create_marker(&self, monitor: &MonitorInfo) -> Result<WindowHandle, Win32Error> {
        let class = wide("STATIC");
        let b = monitor.bounds;
        let marker = unsafe {
            CreateWindowExW(
                WS_EX_TOOLWINDOW | WS_EX_NOACTIVATE,
                class.as_ptr(),
                ptr::null(),
                WS_POPUP,
                b.left,
                b.top,
                b.width(),
                b.height(),
                ptr::null_mut(),
                ptr::null_mut(),
                GetModuleHandleW(ptr::null()),
                ptr::null_mut(),
            )
        };
        if marker.is_null() {
            return Err(Win32Error::last("CreateWindowExW"));
        }
        debug!("marker {:p} covers {}", marker, b);
        Ok(window_handle(marker))
    }

    fn destroy_marker(&self, marker: WindowHandle) -> Result<(), Win32Error> {
        if unsafe { DestroyWindow(hwnd(marker)) } == FALSE {
            return Err(Win32Error::last("DestroyWindow"));
        }
        Ok(())
    }

    fn process_messages(&self) -> bool {
        let mut msg: MSG = unsafe { std::mem::zeroed() };
        while unsafe { PeekMessageW(&mut msg, ptr::null_mut(), 0, 0, PM_REMOVE) } != FALSE {
            if msg.message == WM_QUIT {
                debug!("WM_QUIT received");
                return false;
            }
            unsafe {
                TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
        }
        true
    }
}
