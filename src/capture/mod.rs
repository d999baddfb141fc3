//! Screenshot capture path.
//!
//! This module provides:
//! - Capture-mode resolution from UI tokens into validated requests
//! - The visibility state machine that hides the surface around a capture
//! - A background manager that drives the capture backend with a timeout
//! - The default xdg-desktop-portal backend

pub mod portal;
pub mod types;

mod dependencies;
mod manager;
mod resolver;
mod visibility;

pub use dependencies::{CaptureBackend, PortalBackend};
pub use manager::CaptureManager;
pub use resolver::{delay_ms_from_seconds, resolve_capture_request};
pub use types::{
    CaptureError, CaptureEvent, CaptureMode, CaptureOutcome, CaptureRequest, CaptureStatus,
    CapturedImage,
};
pub use visibility::{VisibilityState, VisibilityStateMachine};
