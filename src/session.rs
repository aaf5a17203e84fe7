//! The orchestrator that ties the window system, the monitor tracker and
//! the container registry together.
//!
//! [`Session`] is the one explicitly constructed owner of all process-wide
//! state: the container table, the display assignments and the marker
//! windows.  Every operation runs to completion on the caller's thread;
//! rescans are synchronous and finish before any state is mutated.
//!
//! Operations that touch many windows (show, hide, move, close) are best
//! effort: a window that refuses is logged and skipped, and windows already
//! handled stay handled.

use crate::command::{MonitorHandle, WindowHandle};
use crate::config::Config;
use crate::enumerator::{scan_windows, IgnoreFilter};
use crate::error::CoreError;
use crate::geometry::to_absolute;
use crate::registry::{Container, ContainerId, ContainerRegistry};
use crate::tracker::MonitorTracker;
use crate::traits::WindowSystem;
use log::{debug, info, warn};
use std::collections::BTreeSet;

/// Owns every piece of tracking state for one run of deskbox.
///
/// The session is generic over any [`WindowSystem`], so it can be driven by
/// the real desktop or by an in-memory fake.
///
/// # Typical usage
///
/// ```ignore
/// let mut session = Session::new(Win32Desktop::new(), Config::default())?;
/// session.switch_to("work")?;
/// ```
pub struct Session<W: WindowSystem> {
    ws: W,
    registry: ContainerRegistry,
    tracker: MonitorTracker,
    filter: IgnoreFilter,
    config: Config,
    /// Windows hidden by `:release` that no container tracks any more.
    released: BTreeSet<WindowHandle>,
}

impl<W: WindowSystem> Session<W> {
    /// Create a session and run the initial scan.
    ///
    /// Fails only if the window system cannot enumerate displays or
    /// windows, which makes deskbox unusable.
    pub fn new(ws: W, config: Config) -> Result<Self, CoreError> {
        let mut session = Self {
            ws,
            registry: ContainerRegistry::new(config.naming.clone()),
            tracker: MonitorTracker::new(),
            filter: IgnoreFilter::new(config.ignore.titles.clone()),
            config,
            released: BTreeSet::new(),
        };
        session.scan()?;
        info!(
            "found {} display(s), {} container(s)",
            session.tracker.displays().len(),
            session.registry.len()
        );
        Ok(session)
    }

    pub fn window_system(&self) -> &W {
        &self.ws
    }

    pub fn registry(&self) -> &ContainerRegistry {
        &self.registry
    }

    pub fn tracker(&self) -> &MonitorTracker {
        &self.tracker
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Register the window hosting the input surface so scans never adopt
    /// it into a container.
    pub fn set_surface(&mut self, surface: Option<WindowHandle>) {
        self.filter.set_surface(surface);
    }

    //  Scanning

    /// Re-enumerate displays and windows and fold the result into the
    /// registry.
    ///
    /// Containers whose display disappeared are hidden and left
    /// unassigned.  Visible windows are adopted by the container of the
    /// display they are on, creating one if needed.
    pub fn scan(&mut self) -> Result<(), CoreError> {
        let changes = self.tracker.scan(&self.ws)?;
        let live: Vec<MonitorHandle> = self.tracker.displays().iter().map(|m| m.handle).collect();
        for id in self.registry.apply_display_changes(&changes, &live) {
            if let Some(name) = self.registry.name_of(id) {
                info!("display of {:?} went away, hiding it", name);
            }
            self.set_visible(id, false);
        }

        let scan = scan_windows(&self.ws, self.tracker.displays(), &self.filter)?;
        let ws = &self.ws;
        self.registry.merge_scan(scan, |h| ws.is_window(h))?;

        // A released window shown again by the user is adopted above.
        self.released
            .retain(|h| ws.is_window(*h) && !ws.is_visible(*h));
        Ok(())
    }

    /// Windows released while hidden and not adopted since.
    pub fn released(&self) -> impl Iterator<Item = WindowHandle> + '_ {
        self.released.iter().copied()
    }

    /// The display under the pointer, if it was seen by the latest scan.
    pub fn current_display(&self) -> Option<MonitorHandle> {
        self.ws
            .cursor_monitor()
            .filter(|h| self.tracker.display(*h).is_some())
    }

    /// The container shown on the display under the pointer.
    pub fn current_container(&self) -> Option<&Container> {
        self.ws
            .cursor_monitor()
            .and_then(|h| self.registry.assigned(h))
    }

    fn require_display(&self) -> Result<MonitorHandle, CoreError> {
        self.current_display()
            .ok_or_else(|| CoreError::NotFound("no display under the pointer".into()))
    }

    fn require_current(&self) -> Result<(MonitorHandle, ContainerId), CoreError> {
        self.ws
            .cursor_monitor()
            .and_then(|h| self.registry.assigned(h).map(|c| (h, c.id())))
            .ok_or_else(|| CoreError::NotFound("no container is shown here".into()))
    }

    //  Operations

    /// Register an empty container without showing it.  Without a name,
    /// one is generated.
    ///
    /// This is the registry half of [`new_desktop`](Session::new_desktop),
    /// which also rescans and puts the container on the current display.
    pub fn new_container(&mut self, name: Option<&str>) -> Result<ContainerId, CoreError> {
        self.registry.create(name)
    }

    /// Put a fresh, empty container on the current display.
    ///
    /// With a name this is [`switch_to`](Session::switch_to) a container
    /// that must not exist yet.  Without one, the current container is kept
    /// if it is already empty, otherwise it is hidden and replaced by a new
    /// generated one.
    pub fn new_desktop(&mut self, name: Option<&str>) -> Result<(), CoreError> {
        self.scan()?;
        if let Some(name) = name.filter(|n| !n.is_empty()) {
            // Registered before switching, so the rescan in switch_to can
            // never generate a container under the same name.
            self.require_display()?;
            self.new_container(Some(name))?;
            return self.switch_to(name);
        }

        let display = self.require_display()?;
        let current = self
            .registry
            .assigned(display)
            .map(|c| (c.id(), c.is_empty()));
        if let Some((_, true)) = current {
            debug!("current container is already empty");
            return Ok(());
        }

        let id = self.new_container(None)?;
        if let Some((cur, _)) = current {
            self.set_visible(cur, false);
        }
        self.registry.assign(display, id);
        Ok(())
    }

    /// Show the container called `name` on the current display, creating
    /// it if it does not exist.
    ///
    /// The container shown there before is hidden, and deleted if it holds
    /// no windows.  Switching to the container that is already shown does
    /// nothing.  A container shown on another display is moved here.
    pub fn switch_to(&mut self, name: &str) -> Result<(), CoreError> {
        if name.is_empty() {
            return Err(CoreError::Usage("a container name is required".into()));
        }
        info!("switch to {:?}", name);
        self.scan()?;
        let display = self.require_display()?;

        let current = self.registry.assigned(display).map(|c| (c.id(), c.name() == name));
        if let Some((_, true)) = current {
            debug!("already on {:?}", name);
            return Ok(());
        }

        let next = match self.registry.get(name) {
            Some(c) => c.id(),
            None => {
                debug!("container {:?} not found, creating it", name);
                self.registry.create(Some(name))?
            }
        };

        if let Some((cur, _)) = current {
            self.set_visible(cur, false);
        }
        self.move_to_display(next, display);

        if let Some((cur, _)) = current {
            if self.registry.by_id(cur).is_some_and(|c| c.is_empty()) {
                self.registry.remove(cur);
            }
        }
        self.set_visible(next, true);
        Ok(())
    }

    /// Give the current container a new name.
    pub fn rename_current(&mut self, new_name: &str) -> Result<(), CoreError> {
        let (_, id) = self.require_current()?;
        self.registry.rename(id, new_name)
    }

    /// Remove the current container from the registry.
    ///
    /// Its windows are hidden, or shown again when
    /// [`Config::release_reveals_windows`] is set.  Hidden ones are kept
    /// aside so [`shutdown`](Session::shutdown) can still restore them.
    pub fn delete_current(&mut self) -> Result<(), CoreError> {
        let (display, id) = self.require_current()?;
        let reveal = self.config.release_reveals_windows;
        self.set_visible(id, reveal);
        if !reveal {
            let handles = self.window_handles(id);
            self.released.extend(handles);
        }
        self.registry.unassign(display);
        self.registry.remove(id);
        Ok(())
    }

    /// Ask every window of the current container to close.
    ///
    /// Returns how many requests were posted.  The windows disappear from
    /// the container on a later scan, once they are actually gone.
    pub fn kill_current_windows(&mut self) -> Result<usize, CoreError> {
        let (_, id) = self.require_current()?;
        let mut posted = 0;
        for handle in self.window_handles(id) {
            match self.ws.request_close(handle) {
                Ok(()) => posted += 1,
                Err(e) => warn!("cannot close {}: {}", handle, e),
            }
        }
        Ok(posted)
    }

    /// Describe markers, displays and containers, one line per item.
    pub fn info(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for (display, marker) in self.tracker.markers() {
            let now = self
                .ws
                .monitor_from_window(marker)
                .map(|h| h.to_string())
                .unwrap_or_else(|| "none".into());
            lines.push(format!(
                "tracking HWND={} was on HMONITOR={} is now on HMONITOR={}",
                marker, display, now
            ));
        }
        for display in self.tracker.displays() {
            let shown = self
                .registry
                .assigned(display.handle)
                .map(|c| c.name().to_string())
                .unwrap_or_else(|| "-".into());
            lines.push(format!("{} showing {:?}", display, shown));
        }
        let here = self
            .current_display()
            .and_then(|h| self.tracker.display(h));
        for c in self.registry.iter() {
            let place = match self.registry.display_of(c.id()) {
                Some(h) if self.registry.assigned(h).is_some() => format!("on {}", h),
                _ => "hidden".into(),
            };
            lines.push(format!("{} ({} windows, {})", c.name(), c.len(), place));
            for w in c.windows() {
                let abs = here
                    .and_then(|m| to_absolute(&m.bounds, &w.rect).ok())
                    .map(|r| r.to_string())
                    .unwrap_or_default();
                lines.push(format!(
                    "  {} {} HWND={} Title={}",
                    w.rect,
                    abs,
                    w.handle,
                    self.ws.window_title(w.handle)
                ));
            }
        }
        lines
    }

    /// Show the windows of every container, and every released window.
    pub fn show_all(&self) {
        for c in self.registry.iter() {
            self.set_visible(c.id(), true);
        }
        for handle in &self.released {
            if let Err(e) = self.ws.set_visible(*handle, true) {
                warn!("cannot show {}: {}", handle, e);
            }
        }
    }

    /// Tear down before exit: optionally reveal everything, then destroy
    /// the marker windows.
    pub fn shutdown(&mut self) {
        if self.config.restore_on_exit {
            info!("restoring all windows");
            self.show_all();
            self.released.clear();
        }
        self.tracker.release(&self.ws);
    }

    //  Helpers

    fn window_handles(&self, id: ContainerId) -> Vec<WindowHandle> {
        self.registry
            .by_id(id)
            .map(|c| c.windows().map(|w| w.handle).collect())
            .unwrap_or_default()
    }

    /// Show or hide every window of a container.  The recorded geometry is
    /// left untouched.
    fn set_visible(&self, id: ContainerId, visible: bool) {
        for handle in self.window_handles(id) {
            if let Err(e) = self.ws.set_visible(handle, visible) {
                warn!(
                    "cannot {} {}: {}",
                    if visible { "show" } else { "hide" },
                    handle,
                    e
                );
            }
        }
    }

    /// Assign `id` to `display` and place each of its windows at its
    /// recorded relative position on that display.
    fn move_to_display(&mut self, id: ContainerId, display: MonitorHandle) {
        self.registry.assign(display, id);
        let Some(bounds) = self.tracker.display(display).map(|m| m.bounds) else {
            return;
        };
        let Some(container) = self.registry.by_id(id) else {
            return;
        };
        for w in container.windows() {
            let target = match to_absolute(&bounds, &w.rect) {
                Ok(r) => r,
                Err(e) => {
                    warn!("cannot place {}: {}", w.handle, e);
                    continue;
                }
            };
            if let Err(e) = self.ws.set_window_rect(w.handle, &target) {
                warn!("cannot move {}: {}", w.handle, e);
            }
        }
    }
}
