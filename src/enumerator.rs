//! Discovery of manageable top-level windows.
//!
//! [`scan_windows`] walks every top-level window, drops the ones the
//! [`IgnoreFilter`] rejects, and records each survivor under the display it
//! currently lies on, together with its monitor-relative rectangle.  It only
//! reads window state; merging the result into the containers is up to the
//! caller.

use crate::command::{MonitorHandle, MonitorInfo, WindowHandle, WindowRef};
use crate::error::CoreError;
use crate::geometry::to_relative;
use crate::traits::WindowSystem;
use log::{debug, warn};
use std::collections::{BTreeMap, HashMap};

/// Windows found on each display, keyed by handle.
pub type WindowScan = HashMap<MonitorHandle, BTreeMap<WindowHandle, WindowRef>>;

/// Decides which windows are never managed.
///
/// Always skipped: the shell's desktop background, the interactive surface
/// of deskbox itself, hidden windows and windows without a title.  Extra
/// titles can be skipped through configuration.
#[derive(Debug, Clone, Default)]
pub struct IgnoreFilter {
    surface: Option<WindowHandle>,
    titles: Vec<String>,
}

impl IgnoreFilter {
    pub fn new(titles: Vec<String>) -> Self {
        Self {
            surface: None,
            titles,
        }
    }

    /// Register the window that hosts the interactive surface.
    pub fn set_surface(&mut self, surface: Option<WindowHandle>) {
        self.surface = surface;
    }

    pub fn ignores<W: WindowSystem>(&self, ws: &W, window: WindowHandle) -> bool {
        if ws.shell_window() == Some(window) {
            return true;
        }
        if self.surface == Some(window) {
            return true;
        }
        if !ws.is_visible(window) {
            return true;
        }
        let title = ws.window_title(window);
        title.is_empty() || self.titles.iter().any(|t| *t == title)
    }
}

/// Collect every manageable window, grouped by the display it lies on.
///
/// Windows on a display that is not in `monitors` (or on none at all) are
/// skipped, as are windows whose rectangle can no longer be read.
pub fn scan_windows<W: WindowSystem>(
    ws: &W,
    monitors: &[MonitorInfo],
    filter: &IgnoreFilter,
) -> Result<WindowScan, CoreError> {
    let handles = ws.top_level_windows().map_err(CoreError::os)?;
    let mut scan = WindowScan::new();

    for window in handles {
        if filter.ignores(ws, window) {
            continue;
        }
        let Some(hmon) = ws.monitor_from_window(window) else {
            continue;
        };
        let Some(monitor) = monitors.iter().find(|m| m.handle == hmon) else {
            debug!("window {} is on unknown display {}", window, hmon);
            continue;
        };
        let rect = match ws.window_rect(window) {
            Ok(r) => r,
            Err(e) => {
                warn!("cannot read rect of {}: {}", window, e);
                continue;
            }
        };
        let rel = match to_relative(&monitor.bounds, &rect) {
            Ok(r) => r,
            Err(e) => {
                warn!("skipping {}: {}", window, e);
                continue;
            }
        };
        scan.entry(hmon).or_default().insert(
            window,
            WindowRef {
                handle: window,
                rect: rel,
            },
        );
    }

    Ok(scan)
}
