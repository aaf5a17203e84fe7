//! Tracking of live displays across configuration changes.
//!
//! The window system is free to hand out new display handles whenever the
//! display configuration changes (sleep/wake, cable unplug, resolution
//! change, …).  To keep a container bound to "the same physical display",
//! [`MonitorTracker`] parks one invisible marker window on every display it
//! sees.  On the next scan it asks the window system which display each
//! marker lies on now:
//!
//! * same handle: nothing happened;
//! * a different live handle: the display was renumbered
//!   ([`DisplayChange::Renumbered`]);
//! * no display at all: the display is gone ([`DisplayChange::Removed`]),
//!   and the marker is destroyed.
//!
//! Displays without a marker get one.  The returned changes are applied to
//! the display assignments by the registry.

use crate::command::{MonitorHandle, MonitorInfo, WindowHandle};
use crate::error::CoreError;
use crate::traits::WindowSystem;
use log::{debug, info, warn};
use std::collections::BTreeMap;

/// What happened to a previously tracked display since the last scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayChange {
    /// The display still exists but now goes by a different handle.
    Renumbered {
        from: MonitorHandle,
        to: MonitorHandle,
    },
    /// The display is no longer attached.
    Removed(MonitorHandle),
}

/// Owns the marker windows and the display list of the latest scan.
#[derive(Debug, Default)]
pub struct MonitorTracker {
    /// `display handle at marker creation (or last renumbering) -> marker`
    markers: BTreeMap<MonitorHandle, WindowHandle>,
    displays: Vec<MonitorInfo>,
}

impl MonitorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enumerate the live displays, dropping any with unusable information.
    pub fn scan_displays<W: WindowSystem>(ws: &W) -> Result<Vec<MonitorInfo>, CoreError> {
        let all = ws.monitors().map_err(CoreError::os)?;
        Ok(all
            .into_iter()
            .filter(|m| {
                let usable = m.valid && m.width() > 0 && m.height() > 0;
                if !usable {
                    debug!("discarding display {}", m);
                }
                usable
            })
            .collect())
    }

    /// Re-validate every marker against `displays` and create markers for
    /// displays that have none.
    pub fn reconcile<W: WindowSystem>(
        &mut self,
        ws: &W,
        displays: &[MonitorInfo],
    ) -> Vec<DisplayChange> {
        let is_live = |h: MonitorHandle| displays.iter().any(|m| m.handle == h);
        let mut changes = Vec::new();
        let mut kept = BTreeMap::new();
        let mut moved = Vec::new();

        for (old, marker) in std::mem::take(&mut self.markers) {
            match ws.monitor_from_window(marker) {
                Some(now) if now == old && is_live(now) => {
                    kept.insert(old, marker);
                }
                Some(now) if is_live(now) => moved.push((old, now, marker)),
                _ => {
                    info!("display {} is gone", old);
                    self.destroy(ws, marker);
                    changes.push(DisplayChange::Removed(old));
                }
            }
        }

        // Renumbered markers are placed after every unchanged one so a
        // stale duplicate never displaces a marker that is still valid.
        for (old, now, marker) in moved {
            if kept.contains_key(&now) {
                debug!("display {} already tracked as {}", old, now);
                self.destroy(ws, marker);
                changes.push(DisplayChange::Removed(old));
            } else {
                info!("display {} is now known as {}", old, now);
                kept.insert(now, marker);
                changes.push(DisplayChange::Renumbered { from: old, to: now });
            }
        }

        for display in displays {
            if kept.contains_key(&display.handle) {
                continue;
            }
            match ws.create_marker(display) {
                Ok(marker) => {
                    debug!("tracking HMONITOR={} with HWND={}", display.handle, marker);
                    kept.insert(display.handle, marker);
                }
                Err(e) => warn!("cannot create marker for {}: {}", display.handle, e),
            }
        }

        self.markers = kept;
        changes
    }

    /// Enumerate displays and reconcile the markers against them.
    ///
    /// On failure nothing is changed.
    pub fn scan<W: WindowSystem>(&mut self, ws: &W) -> Result<Vec<DisplayChange>, CoreError> {
        let displays = Self::scan_displays(ws)?;
        let changes = self.reconcile(ws, &displays);
        self.displays = displays;
        Ok(changes)
    }

    /// Displays seen by the latest scan.
    pub fn displays(&self) -> &[MonitorInfo] {
        &self.displays
    }

    /// Look up a display of the latest scan.
    pub fn display(&self, handle: MonitorHandle) -> Option<&MonitorInfo> {
        self.displays.iter().find(|m| m.handle == handle)
    }

    /// `(display handle, marker window)` pairs.
    pub fn markers(&self) -> impl Iterator<Item = (MonitorHandle, WindowHandle)> + '_ {
        self.markers.iter().map(|(h, m)| (*h, *m))
    }

    /// Destroy every marker window.
    pub fn release<W: WindowSystem>(&mut self, ws: &W) {
        for (_, marker) in std::mem::take(&mut self.markers) {
            self.destroy(ws, marker);
        }
    }

    fn destroy<W: WindowSystem>(&self, ws: &W, marker: WindowHandle) {
        if let Err(e) = ws.destroy_marker(marker) {
            warn!("cannot destroy marker {}: {}", marker, e);
        }
    }
}
