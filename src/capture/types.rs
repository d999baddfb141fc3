//! Data types for screenshot capture functionality.

use chrono::{DateTime, Local};
use std::{fmt, path::Path, str::FromStr, time::Duration};
use thiserror::Error;

/// Scope of a screenshot capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureMode {
    /// Every monitor combined.
    FullScreen,
    /// The monitor under the pointer.
    CurrentScreen,
    /// The currently focused window.
    ActiveWindow,
    /// A user-selected rectangle.
    RectangularRegion,
}

impl CaptureMode {
    /// Modes in the order the mode picker lists them.
    pub const ALL: [CaptureMode; 4] = [
        CaptureMode::FullScreen,
        CaptureMode::CurrentScreen,
        CaptureMode::ActiveWindow,
        CaptureMode::RectangularRegion,
    ];

    /// Maps a UI token onto a mode. Tokens are case-sensitive.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "fullScreen" => Some(CaptureMode::FullScreen),
            "currentScreen" => Some(CaptureMode::CurrentScreen),
            "activeWindow" => Some(CaptureMode::ActiveWindow),
            "rectangularRegion" => Some(CaptureMode::RectangularRegion),
            _ => None,
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            CaptureMode::FullScreen => "fullScreen",
            CaptureMode::CurrentScreen => "currentScreen",
            CaptureMode::ActiveWindow => "activeWindow",
            CaptureMode::RectangularRegion => "rectangularRegion",
        }
    }

    /// Position of the mode in the picker, as persisted in `capture_mode_index`.
    pub fn index(self) -> u32 {
        match self {
            CaptureMode::FullScreen => 0,
            CaptureMode::CurrentScreen => 1,
            CaptureMode::ActiveWindow => 2,
            CaptureMode::RectangularRegion => 3,
        }
    }

    /// Inverse of [`CaptureMode::index`]; unknown indices fall back to full screen.
    pub fn from_index(index: u32) -> Self {
        Self::ALL.get(index as usize).copied().unwrap_or_else(|| {
            log::warn!("Unknown capture mode index {}, using full screen", index);
            CaptureMode::FullScreen
        })
    }

    /// Whether the backend needs to ask the user to pick something.
    pub fn is_interactive(self) -> bool {
        matches!(
            self,
            CaptureMode::ActiveWindow | CaptureMode::RectangularRegion
        )
    }
}

impl fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for CaptureMode {
    type Err = CaptureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_token(s).ok_or_else(|| CaptureError::InvalidMode(s.to_string()))
    }
}

/// A validated request for the capture backend.
///
/// Only [`resolve_capture_request`](super::resolve_capture_request) builds one,
/// and the backend takes it by value.
#[derive(Debug, PartialEq, Eq)]
pub struct CaptureRequest {
    pub(super) mode: CaptureMode,
    pub(super) delay_ms: u64,
    pub(super) include_pointer: bool,
    pub(super) include_decorations: bool,
}

impl CaptureRequest {
    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    pub fn delay_ms(&self) -> u64 {
        self.delay_ms
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn include_pointer(&self) -> bool {
        self.include_pointer
    }

    pub fn include_decorations(&self) -> bool {
        self.include_decorations
    }
}

/// Image handed back by the capture backend.
#[derive(Debug, Clone)]
pub struct CapturedImage {
    /// Encoded PNG bytes.
    pub data: Vec<u8>,
    /// `None` for images loaded from disk rather than captured.
    pub mode: Option<CaptureMode>,
    pub captured_at: DateTime<Local>,
    /// Title of the captured window. The portal does not report one, so this
    /// is `None` for portal captures and `%T` in filename templates expands
    /// to nothing.
    pub window_title: Option<String>,
}

impl CapturedImage {
    pub fn new(data: Vec<u8>, mode: Option<CaptureMode>) -> Self {
        Self {
            data,
            mode,
            captured_at: Local::now(),
            window_title: None,
        }
    }

    /// Loads an already encoded image from disk.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        Ok(Self::new(std::fs::read(path)?, None))
    }
}

/// Outcome of a capture attempt.
#[derive(Debug, Clone)]
pub enum CaptureOutcome {
    Success(CapturedImage),
    Failed(String),
    Cancelled(String),
    TimedOut(Duration),
}

/// Outcome tagged with the attempt that produced it.
#[derive(Debug, Clone)]
pub struct CaptureEvent {
    pub attempt: u64,
    pub outcome: CaptureOutcome,
}

/// Errors that can occur during screenshot capture.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Invalid capture mode '{0}'")]
    InvalidMode(String),

    #[error("A capture is already in progress")]
    Busy,

    #[error("Capture manager not running")]
    ManagerStopped,

    #[error("Screenshot permission denied by user")]
    PermissionDenied,

    #[error("D-Bus communication error: {0}")]
    DBusError(#[from] zbus::Error),

    #[error("Failed to read screenshot: {0}")]
    Io(#[from] std::io::Error),

    #[error("Portal returned invalid response: {0}")]
    InvalidResponse(String),

    #[error("Capture cancelled: {0}")]
    Cancelled(String),
}

/// Status of the capture manager's current job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureStatus {
    Idle,
    /// Sleeping through the requested delay.
    Delaying,
    /// Waiting for the backend to deliver an image.
    AwaitingBackend,
    Success,
    Failed(String),
    Cancelled(String),
    TimedOut,
}
