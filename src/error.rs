//! Error type shared by the tracking core.

/// Everything a core operation can fail with.
///
/// Failures are reported to the log by the dispatcher; none of them is
/// fatal to the process.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A referenced container, display or window does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A container with this name is already registered.
    #[error("container name already in use: {0:?}")]
    NameInUse(String),

    /// A coordinate transform was asked to divide by a display with no area.
    #[error("invalid display geometry {width}x{height}")]
    InvalidGeometry { width: i32, height: i32 },

    /// The window system rejected a call.  Carries the system's own text.
    #[error("window system error: {0}")]
    OsOperationFailed(String),

    /// A command was invoked without the arguments it requires.
    #[error("usage: {0}")]
    Usage(String),
}

impl CoreError {
    /// Wrap a backend error as [`CoreError::OsOperationFailed`].
    pub fn os(e: impl std::fmt::Display) -> Self {
        CoreError::OsOperationFailed(e.to_string())
    }
}
