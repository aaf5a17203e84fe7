//! The container table and the display assignments.
//!
//! [`ContainerRegistry`] owns every [`Container`] in a single name-keyed
//! table.  Which container is shown on which display is kept in a second
//! table that only stores [`ContainerId`]s.  An id is resolved against the
//! name table at lookup time, so an assignment whose container was deleted
//! simply reads as "nothing shown there".  Ids are never reused.

use crate::command::{MonitorHandle, WindowHandle, WindowRef};
use crate::config::NamingConfig;
use crate::enumerator::WindowScan;
use crate::error::CoreError;
use crate::tracker::DisplayChange;
use log::{debug, info};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Stable identity of a container, independent of its (renameable) name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerId(u64);

/// A named group of windows that is shown and hidden as a unit.
#[derive(Debug, Clone)]
pub struct Container {
    id: ContainerId,
    name: String,
    windows: BTreeMap<WindowHandle, WindowRef>,
}

impl Container {
    pub fn id(&self) -> ContainerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn windows(&self) -> impl Iterator<Item = &WindowRef> {
        self.windows.values()
    }

    pub fn window(&self, handle: WindowHandle) -> Option<&WindowRef> {
        self.windows.get(&handle)
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

#[derive(Debug)]
pub struct ContainerRegistry {
    containers: BTreeMap<String, Container>,
    /// `display -> container shown there`.  Never owns the container.
    assignments: HashMap<MonitorHandle, ContainerId>,
    next_id: u64,
    naming: NamingConfig,
}

impl Default for ContainerRegistry {
    fn default() -> Self {
        Self::new(NamingConfig::default())
    }
}

impl ContainerRegistry {
    pub fn new(naming: NamingConfig) -> Self {
        Self {
            containers: BTreeMap::new(),
            assignments: HashMap::new(),
            next_id: 1,
            naming,
        }
    }

    //  Names

    /// The name the next unnamed container would get: the configured first
    /// name while the registry is empty, otherwise the first free
    /// `"<prefix> N"` with `N >= 1`.
    pub fn generate_name(&self) -> String {
        if self.containers.is_empty() {
            return self.naming.first.clone();
        }
        (1..)
            .map(|n| format!("{} {}", self.naming.prefix, n))
            .find(|name| !self.containers.contains_key(name))
            .unwrap_or_default()
    }

    /// Register a new empty container.
    ///
    /// `None` (or an empty name) picks a generated one.  Fails without
    /// touching the registry if the name is taken.
    pub fn create(&mut self, name: Option<&str>) -> Result<ContainerId, CoreError> {
        let name = match name {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => self.generate_name(),
        };
        if self.containers.contains_key(&name) {
            return Err(CoreError::NameInUse(name));
        }
        let id = ContainerId(self.next_id);
        self.next_id += 1;
        info!("new container {:?}", name);
        self.containers.insert(
            name.clone(),
            Container {
                id,
                name,
                windows: BTreeMap::new(),
            },
        );
        Ok(id)
    }

    /// Re-key a container under `new_name`.
    pub fn rename(&mut self, id: ContainerId, new_name: &str) -> Result<(), CoreError> {
        if new_name.is_empty() {
            return Err(CoreError::Usage("a new name is required".into()));
        }
        if self.containers.contains_key(new_name) {
            return Err(CoreError::NameInUse(new_name.into()));
        }
        let old = self
            .name_of(id)
            .ok_or_else(|| CoreError::NotFound(format!("container #{}", id.0)))?
            .to_string();
        if let Some(mut c) = self.containers.remove(&old) {
            info!("rename {:?} -> {:?}", old, new_name);
            c.name = new_name.to_string();
            self.containers.insert(c.name.clone(), c);
        }
        Ok(())
    }

    /// Drop a container.  Assignments pointing at it go stale and read as
    /// unassigned from now on.
    pub fn remove(&mut self, id: ContainerId) -> Option<Container> {
        let name = self.name_of(id)?.to_string();
        info!("delete container {:?}", name);
        self.containers.remove(&name)
    }

    //  Lookup

    pub fn get(&self, name: &str) -> Option<&Container> {
        self.containers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.containers.contains_key(name)
    }

    pub fn by_id(&self, id: ContainerId) -> Option<&Container> {
        self.containers.values().find(|c| c.id == id)
    }

    pub fn name_of(&self, id: ContainerId) -> Option<&str> {
        self.by_id(id).map(|c| c.name.as_str())
    }

    /// All containers, ordered by name.
    pub fn iter(&self) -> impl Iterator<Item = &Container> {
        self.containers.values()
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    //  Display assignments

    /// The container shown on `display`, if any still exists.
    pub fn assigned(&self, display: MonitorHandle) -> Option<&Container> {
        self.assignments
            .get(&display)
            .and_then(|id| self.by_id(*id))
    }

    /// The display `id` is shown on, if any.
    pub fn display_of(&self, id: ContainerId) -> Option<MonitorHandle> {
        self.assignments
            .iter()
            .find(|(_, c)| **c == id)
            .map(|(h, _)| *h)
    }

    /// Show `id` on `display`, taking it off any other display first.
    pub fn assign(&mut self, display: MonitorHandle, id: ContainerId) {
        self.assignments.retain(|_, c| *c != id);
        self.assignments.insert(display, id);
    }

    pub fn unassign(&mut self, display: MonitorHandle) -> Option<ContainerId> {
        self.assignments.remove(&display)
    }

    /// `(display, container)` for every assignment that still resolves.
    pub fn assignments(&self) -> impl Iterator<Item = (MonitorHandle, &Container)> {
        self.assignments
            .iter()
            .filter_map(|(h, id)| self.by_id(*id).map(|c| (*h, c)))
    }

    /// Carry the assignments over a display reconfiguration.
    ///
    /// Renumbered displays keep their container under the new handle.
    /// Assignments to removed displays, or to any handle not in `live`, are
    /// dropped.  Returns the containers that lost their display and must be
    /// hidden.
    pub fn apply_display_changes(
        &mut self,
        changes: &[DisplayChange],
        live: &[MonitorHandle],
    ) -> Vec<ContainerId> {
        let mut renumbered = HashMap::new();
        let mut removed = HashSet::new();
        for change in changes {
            match *change {
                DisplayChange::Renumbered { from, to } => {
                    renumbered.insert(from, to);
                }
                DisplayChange::Removed(h) => {
                    removed.insert(h);
                }
            }
        }

        let mut orphaned = Vec::new();
        let mut next = HashMap::new();
        let mut untouched = Vec::new();
        for (display, id) in std::mem::take(&mut self.assignments) {
            if let Some(to) = renumbered.get(&display) {
                next.insert(*to, id);
            } else if removed.contains(&display) {
                orphaned.push(id);
            } else {
                untouched.push((display, id));
            }
        }
        for (display, id) in untouched {
            if next.contains_key(&display) || !live.contains(&display) {
                debug!("dropping stale assignment on {}", display);
                orphaned.push(id);
            } else {
                next.insert(display, id);
            }
        }
        self.assignments = next;

        orphaned.retain(|id| self.by_id(*id).is_some());
        orphaned
    }

    //  Windows

    /// Merge the result of a window scan.
    ///
    /// Windows that no longer exist (per `alive`) are dropped everywhere.
    /// Every scanned window ends up in the container of the display it was
    /// seen on, and in no other; a display with windows but no container
    /// gets a new one.
    pub fn merge_scan(
        &mut self,
        scan: WindowScan,
        alive: impl Fn(WindowHandle) -> bool,
    ) -> Result<(), CoreError> {
        for Container { name, windows, .. } in self.containers.values_mut() {
            windows.retain(|h, _| {
                let keep = alive(*h);
                if !keep {
                    debug!("window {} left {:?}", h, name);
                }
                keep
            });
        }

        let mut displays: Vec<_> = scan.into_iter().collect();
        displays.sort_by_key(|(h, _)| *h);

        for (display, windows) in displays {
            let existing = self.assigned(display).map(|c| c.id);
            let target = match existing {
                Some(id) => id,
                None => {
                    let id = self.create(None)?;
                    self.assign(display, id);
                    id
                }
            };
            for (handle, window) in windows {
                for c in self.containers.values_mut() {
                    if c.id != target {
                        c.windows.remove(&handle);
                    }
                }
                if let Some(c) = self.containers.values_mut().find(|c| c.id == target) {
                    c.windows.insert(handle, window);
                }
            }
        }
        Ok(())
    }
}
