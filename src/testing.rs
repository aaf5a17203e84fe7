//! In-memory [`WindowSystem`] used by the unit tests.
//!
//! Models just enough of a desktop: displays that can be added, removed or
//! renumbered, windows with a title, a rectangle and a visibility flag,
//! marker windows, and a pointer position.  Every mutating request is
//! recorded so tests can assert on it.

use crate::command::{MonitorHandle, MonitorInfo, WindowHandle};
use crate::geometry::Rect;
use crate::traits::WindowSystem;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashSet};

#[derive(Debug, Clone)]
pub struct FakeWindow {
    pub title: String,
    pub rect: Rect,
    pub visible: bool,
}

#[derive(Debug, Default)]
struct FakeState {
    monitors: Vec<MonitorInfo>,
    windows: BTreeMap<WindowHandle, FakeWindow>,
    markers: BTreeSet<WindowHandle>,
    shell: Option<WindowHandle>,
    cursor: (i32, i32),
    next_handle: u64,
    close_requests: Vec<WindowHandle>,
    moves: Vec<(WindowHandle, Rect)>,
    failing: HashSet<WindowHandle>,
    enumeration_broken: bool,
    pumped: usize,
    quit_posted: bool,
}

#[derive(Debug, Default)]
pub struct FakeDesktop {
    state: RefCell<FakeState>,
}

#[derive(Debug, thiserror::Error)]
#[error("fake desktop: {0}")]
pub struct FakeError(String);

fn overlap(a: &Rect, b: &Rect) -> i64 {
    let w = (a.right.min(b.right) - a.left.max(b.left)).max(0) as i64;
    let h = (a.bottom.min(b.bottom) - a.top.max(b.top)).max(0) as i64;
    w * h
}

impl FakeDesktop {
    pub const LEFT: MonitorHandle = MonitorHandle(0x1001);
    pub const RIGHT: MonitorHandle = MonitorHandle(0x1002);

    /// A 1920×1080 display at the origin with a 2560×1440 display to its
    /// right.  The pointer starts on the left one.
    pub fn two_monitors() -> Self {
        let desk = Self::default();
        desk.add_monitor(Self::LEFT, Rect::from_origin_size(0, 0, 1920, 1080));
        desk.add_monitor(Self::RIGHT, Rect::from_origin_size(1920, 0, 2560, 1440));
        {
            let mut s = desk.state.borrow_mut();
            s.next_handle = 0x100;
            s.cursor = (100, 100);
        }
        desk
    }

    pub fn add_monitor(&self, handle: MonitorHandle, bounds: Rect) {
        self.state.borrow_mut().monitors.push(MonitorInfo {
            handle,
            bounds,
            name: format!("DISPLAY{}", handle.0 & 0xff),
            valid: true,
        });
    }

    pub fn remove_monitor(&self, handle: MonitorHandle) {
        self.state.borrow_mut().monitors.retain(|m| m.handle != handle);
    }

    /// Give the display known as `old` a fresh handle, as the window system
    /// does after a configuration change.
    pub fn renumber_monitor(&self, old: MonitorHandle, new: MonitorHandle) {
        for m in self.state.borrow_mut().monitors.iter_mut() {
            if m.handle == old {
                m.handle = new;
            }
        }
    }

    /// Report the display as present but unreadable.
    pub fn invalidate_monitor(&self, handle: MonitorHandle) {
        for m in self.state.borrow_mut().monitors.iter_mut() {
            if m.handle == handle {
                m.valid = false;
            }
        }
    }

    pub fn set_shell(&self, window: WindowHandle) {
        self.state.borrow_mut().shell = Some(window);
    }

    pub fn add_window(&self, title: &str, rect: Rect) -> WindowHandle {
        let mut s = self.state.borrow_mut();
        s.next_handle += 1;
        let h = WindowHandle(s.next_handle);
        s.windows.insert(
            h,
            FakeWindow {
                title: title.into(),
                rect,
                visible: true,
            },
        );
        h
    }

    /// Simulate the window going away on its own.
    pub fn close_window(&self, window: WindowHandle) {
        self.state.borrow_mut().windows.remove(&window);
    }

    pub fn window(&self, window: WindowHandle) -> Option<FakeWindow> {
        self.state.borrow().windows.get(&window).cloned()
    }

    /// Make every request targeting `window` fail.
    pub fn fail_requests_for(&self, window: WindowHandle) {
        self.state.borrow_mut().failing.insert(window);
    }

    pub fn break_enumeration(&self) {
        self.state.borrow_mut().enumeration_broken = true;
    }

    /// Put the pointer in the middle of `monitor`.
    pub fn point_at(&self, monitor: MonitorHandle) {
        let mut s = self.state.borrow_mut();
        if let Some(b) = s.monitors.iter().find(|m| m.handle == monitor).map(|m| m.bounds) {
            s.cursor = ((b.left + b.right) / 2, (b.top + b.bottom) / 2);
        }
    }

    pub fn markers(&self) -> Vec<WindowHandle> {
        self.state.borrow().markers.iter().copied().collect()
    }

    pub fn close_requests(&self) -> Vec<WindowHandle> {
        self.state.borrow().close_requests.clone()
    }

    /// How many times the message queue was drained.
    pub fn pumped(&self) -> usize {
        self.state.borrow().pumped
    }

    /// Make the next message drain report a quit request.
    pub fn post_quit(&self) {
        self.state.borrow_mut().quit_posted = true;
    }

    pub fn moves(&self) -> Vec<(WindowHandle, Rect)> {
        self.state.borrow().moves.clone()
    }

    fn check(&self, window: WindowHandle) -> Result<(), FakeError> {
        let s = self.state.borrow();
        if s.failing.contains(&window) {
            return Err(FakeError(format!("access denied for {}", window)));
        }
        if !s.windows.contains_key(&window) {
            return Err(FakeError(format!("invalid window handle {}", window)));
        }
        Ok(())
    }
}

impl WindowSystem for FakeDesktop {
    type Error = FakeError;

    fn monitors(&self) -> Result<Vec<MonitorInfo>, FakeError> {
        let s = self.state.borrow();
        if s.enumeration_broken {
            return Err(FakeError("EnumDisplayMonitors failed".into()));
        }
        Ok(s.monitors.clone())
    }

    fn top_level_windows(&self) -> Result<Vec<WindowHandle>, FakeError> {
        let s = self.state.borrow();
        if s.enumeration_broken {
            return Err(FakeError("EnumWindows failed".into()));
        }
        Ok(s.windows.keys().copied().collect())
    }

    fn is_window(&self, window: WindowHandle) -> bool {
        self.state.borrow().windows.contains_key(&window)
    }

    fn is_visible(&self, window: WindowHandle) -> bool {
        self.state
            .borrow()
            .windows
            .get(&window)
            .map(|w| w.visible)
            .unwrap_or(false)
    }

    fn window_title(&self, window: WindowHandle) -> String {
        self.state
            .borrow()
            .windows
            .get(&window)
            .map(|w| w.title.clone())
            .unwrap_or_default()
    }

    fn shell_window(&self) -> Option<WindowHandle> {
        self.state.borrow().shell
    }

    fn window_rect(&self, window: WindowHandle) -> Result<Rect, FakeError> {
        self.check(window)?;
        Ok(self.state.borrow().windows[&window].rect)
    }

    fn set_window_rect(&self, window: WindowHandle, rect: &Rect) -> Result<(), FakeError> {
        self.check(window)?;
        let mut s = self.state.borrow_mut();
        s.moves.push((window, *rect));
        if let Some(w) = s.windows.get_mut(&window) {
            w.rect = *rect;
        }
        Ok(())
    }

    fn set_visible(&self, window: WindowHandle, visible: bool) -> Result<(), FakeError> {
        self.check(window)?;
        if let Some(w) = self.state.borrow_mut().windows.get_mut(&window) {
            w.visible = visible;
        }
        Ok(())
    }

    fn request_close(&self, window: WindowHandle) -> Result<(), FakeError> {
        self.check(window)?;
        self.state.borrow_mut().close_requests.push(window);
        Ok(())
    }

    fn monitor_from_window(&self, window: WindowHandle) -> Option<MonitorHandle> {
        let s = self.state.borrow();
        let rect = s.windows.get(&window)?.rect;
        s.monitors
            .iter()
            .map(|m| (overlap(&m.bounds, &rect), m.handle))
            .filter(|(area, _)| *area > 0)
            .max_by_key(|(area, _)| *area)
            .map(|(_, h)| h)
    }

    fn cursor_monitor(&self) -> Option<MonitorHandle> {
        let s = self.state.borrow();
        let (x, y) = s.cursor;
        s.monitors
            .iter()
            .find(|m| m.bounds.contains(x, y))
            .map(|m| m.handle)
    }

    fn create_marker(&self, monitor: &MonitorInfo) -> Result<WindowHandle, FakeError> {
        let mut s = self.state.borrow_mut();
        s.next_handle += 1;
        let h = WindowHandle(s.next_handle);
        s.windows.insert(
            h,
            FakeWindow {
                title: String::new(),
                rect: monitor.bounds,
                visible: false,
            },
        );
        s.markers.insert(h);
        Ok(h)
    }

    fn destroy_marker(&self, marker: WindowHandle) -> Result<(), FakeError> {
        let mut s = self.state.borrow_mut();
        if !s.markers.remove(&marker) {
            return Err(FakeError(format!("{} is not a marker", marker)));
        }
        s.windows.remove(&marker);
        Ok(())
    }

    fn process_messages(&self) -> bool {
        let mut s = self.state.borrow_mut();
        s.pumped += 1;
        !s.quit_posted
    }
}
