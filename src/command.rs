//! Types shared by every component of deskbox.
//!
//! [`WindowHandle`] and [`MonitorHandle`] are opaque ids handed out by the
//! window system.  [`MonitorInfo`] and [`WindowRef`] are the records the
//! tracking core keeps about them, and [`InputEvent`] is what the input
//! surface delivers into the core.

use crate::geometry::{Rect, RelativeRect};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque id of a top-level window.  Unique while the window exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WindowHandle(pub u64);

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Opaque id of a display.
///
/// The window system may hand out a different id for the same physical
/// display after any configuration change, so a handle from a previous
/// scan is only meaningful after the tracker has re-validated it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MonitorHandle(pub u64);

impl fmt::Display for MonitorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// One live display as seen by the most recent scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorInfo {
    pub handle: MonitorHandle,
    /// Absolute bounds on the virtual screen.
    pub bounds: Rect,
    /// Device name reported by the window system (e.g. `\\.\DISPLAY1`).
    pub name: String,
    /// Whether the window system returned complete information.
    pub valid: bool,
}

impl MonitorInfo {
    pub fn width(&self) -> i32 {
        self.bounds.width()
    }

    pub fn height(&self) -> i32 {
        self.bounds.height()
    }
}

impl fmt::Display for MonitorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} HMONITOR={} Name={}",
            self.bounds, self.handle, self.name
        )
    }
}

/// A managed window and where it sat on its display when last observed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowRef {
    pub handle: WindowHandle,
    pub rect: RelativeRect,
}

/// Events the input surface delivers into the core.
///
/// On the wire (see [`LineSource`](crate::input::LineSource)) each event is
/// one line of JSON:
///
/// ```json
/// {"TextChanged":"ma"}
/// {"Confirmed":"main"}
/// "Abort"
/// {"Hotkey":{"modifiers":2,"key":38}}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputEvent {
    /// The text in the input field changed; produce a preview.
    TextChanged(String),
    /// The user confirmed the current text; execute it.
    Confirmed(String),
    /// The user dismissed the input field.
    Abort,
    /// A registered global hotkey fired.
    Hotkey { modifiers: u32, key: u32 },
}

//  Hotkey vocabulary

pub const MOD_ALT: u32 = 0x0001;
pub const MOD_CONTROL: u32 = 0x0002;
pub const MOD_SHIFT: u32 = 0x0004;
pub const MOD_WIN: u32 = 0x0008;
/// Suppress auto-repeat while the key is held.  Not part of the match.
pub const MOD_NOREPEAT: u32 = 0x4000;

pub const VK_UP: u32 = 0x26;

/// A key combination bound to a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hotkey {
    pub modifiers: u32,
    pub key: u32,
}

impl Hotkey {
    /// Whether a fired `(modifiers, key)` pair triggers this binding.
    ///
    /// The window system reports fired hotkeys without the no-repeat bit,
    /// so it is ignored on both sides.
    pub fn matches(&self, modifiers: u32, key: u32) -> bool {
        (self.modifiers & !MOD_NOREPEAT) == (modifiers & !MOD_NOREPEAT) && self.key == key
    }
}

impl Default for Hotkey {
    fn default() -> Self {
        Self {
            modifiers: MOD_CONTROL | MOD_NOREPEAT,
            key: VK_UP,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_display_as_hex() {
        assert_eq!(WindowHandle(0xbeef).to_string(), "0xbeef");
        assert_eq!(MonitorHandle(65537).to_string(), "0x10001");
    }

    #[test]
    fn hotkey_ignores_norepeat() {
        let hk = Hotkey::default();
        assert!(hk.matches(MOD_CONTROL, VK_UP));
        assert!(hk.matches(MOD_CONTROL | MOD_NOREPEAT, VK_UP));
        assert!(!hk.matches(MOD_CONTROL | MOD_SHIFT, VK_UP));
        assert!(!hk.matches(MOD_CONTROL, 0x28));
        assert!(!hk.matches(MOD_ALT, VK_UP));
    }

    #[test]
    fn input_event_wire_format() {
        let ev: InputEvent = serde_json::from_str(r#"{"Confirmed":"main"}"#).unwrap();
        assert_eq!(ev, InputEvent::Confirmed("main".into()));
        let ev: InputEvent = serde_json::from_str(r#""Abort""#).unwrap();
        assert_eq!(ev, InputEvent::Abort);
        let ev: InputEvent =
            serde_json::from_str(r#"{"Hotkey":{"modifiers":2,"key":38}}"#).unwrap();
        assert_eq!(
            ev,
            InputEvent::Hotkey {
                modifiers: MOD_CONTROL,
                key: VK_UP
            }
        );
    }

    #[test]
    fn monitor_info_display() {
        let m = MonitorInfo {
            handle: MonitorHandle(0x10),
            bounds: Rect::new(0, 0, 1920, 1080),
            name: "DISPLAY1".into(),
            valid: true,
        };
        assert_eq!(m.to_string(), "(0,0)-(1920,1080) HMONITOR=0x10 Name=DISPLAY1");
        assert_eq!(m.width(), 1920);
        assert_eq!(m.height(), 1080);
    }
}
