//! **deskbox**: named window containers for desktops without virtual
//! desktops.
//!
//! Top-level windows are grouped into *containers*.  A container is shown
//! on at most one display at a time; switching hides the container shown
//! there and brings another one in, restoring each window's position
//! relative to the display so it scales across displays of different size.
//!
//! # Architecture
//!
//! The crate is organised around two core traits:
//!
//! * [`traits::WindowSystem`]: the window and display queries the tracking
//!   core needs, so the core is not tied to one desktop API.
//! * [`traits::InputSource`]: the transport that delivers typed commands
//!   and hotkeys, so the event loop is not tied to one input surface.
//!
//! [`session::Session`] owns every piece of state (containers, display
//! assignments, marker windows) and [`dispatch::Dispatcher`] turns command
//! lines into session operations.  The Win32 backend lives in `win32`.

pub mod command;
pub mod config;
pub mod dispatch;
pub mod enumerator;
pub mod error;
pub mod geometry;
pub mod input;
pub mod registry;
pub mod session;
#[cfg(test)]
mod testing;
pub mod tracker;
pub mod traits;
#[cfg(windows)]
pub mod win32;
