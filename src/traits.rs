//! Core traits that decouple deskbox from any specific window system or
//! input transport.
//!
//! Every concrete backend (the Win32 desktop, a test fake, a line-based
//! input reader, …) implements one of these traits.  The
//! [`Session`](crate::session::Session) and
//! [`Dispatcher`](crate::dispatch::Dispatcher) only depend on these
//! abstractions.

use crate::command::{InputEvent, MonitorHandle, MonitorInfo, WindowHandle};
use crate::geometry::Rect;
use std::sync::mpsc;

/// Abstraction over the window system queries the tracking core needs.
///
/// An implementation might call straight into the Win32 API, or it might be
/// an in-memory fake used in tests.  Every method is a plain synchronous
/// query or request; nothing here blocks waiting on another window.
pub trait WindowSystem {
    /// The error type produced by this window system.
    type Error: std::error::Error + Send + 'static;

    /// Enumerate every live display.
    ///
    /// Displays whose information could not be read are still returned,
    /// with [`MonitorInfo::valid`] set to `false`.
    fn monitors(&self) -> Result<Vec<MonitorInfo>, Self::Error>;

    /// Enumerate every top-level window, in the system's z-order.
    fn top_level_windows(&self) -> Result<Vec<WindowHandle>, Self::Error>;

    /// Whether `window` still refers to an existing window.
    fn is_window(&self, window: WindowHandle) -> bool;

    /// Whether `window` is currently shown.
    fn is_visible(&self, window: WindowHandle) -> bool;

    /// The window's title, or an empty string if it has none.
    fn window_title(&self, window: WindowHandle) -> String;

    /// The shell's desktop background window, if there is one.
    fn shell_window(&self) -> Option<WindowHandle>;

    /// The window's absolute screen rectangle.
    fn window_rect(&self, window: WindowHandle) -> Result<Rect, Self::Error>;

    /// Move and resize the window to `rect`.
    fn set_window_rect(&self, window: WindowHandle, rect: &Rect) -> Result<(), Self::Error>;

    /// Show or hide the window.
    fn set_visible(&self, window: WindowHandle, visible: bool) -> Result<(), Self::Error>;

    /// Ask the window to close.  Returns once the request is posted; the
    /// window may take any amount of time to actually go away.
    fn request_close(&self, window: WindowHandle) -> Result<(), Self::Error>;

    /// The display the window currently lies on, if any.
    fn monitor_from_window(&self, window: WindowHandle) -> Option<MonitorHandle>;

    /// The display under the pointer, if any.
    fn cursor_monitor(&self) -> Option<MonitorHandle>;

    /// Create an invisible marker window covering `monitor`.
    ///
    /// [`monitor_from_window`](WindowSystem::monitor_from_window) on the
    /// marker later reveals which handle the display goes by now.
    fn create_marker(&self, monitor: &MonitorInfo) -> Result<WindowHandle, Self::Error>;

    /// Destroy a marker previously returned by
    /// [`create_marker`](WindowSystem::create_marker).
    fn destroy_marker(&self, marker: WindowHandle) -> Result<(), Self::Error>;

    /// Handle every message queued for windows owned by the calling
    /// thread (the markers), without blocking.
    ///
    /// Returns `false` once the system asked the thread to quit.  Backends
    /// without a message queue keep the default.
    fn process_messages(&self) -> bool {
        true
    }
}

//  Input Source

/// A source of [`InputEvent`]s.
///
/// Implementations listen on some transport (standard input, a named pipe,
/// an in-memory channel, …) and forward parsed events into the provided
/// [`mpsc::Sender`].
///
/// # Contract
///
/// * [`run`](InputSource::run) **blocks** until the source is exhausted or
///   an unrecoverable error occurs.
/// * Each received event must be sent through `sink` exactly once.
/// * Implementations must be [`Send`] so they can run on a dedicated thread.
///   The core itself only ever runs on the thread that owns the receiver.
pub trait InputSource: Send {
    /// The error type produced by this source.
    type Error: std::error::Error + Send + 'static;

    /// Start listening and forward every incoming [`InputEvent`] into `sink`.
    fn run(&mut self, sink: mpsc::Sender<InputEvent>) -> Result<(), Self::Error>;
}
