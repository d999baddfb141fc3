//! Screenshot capture front-end.
//!
//! The capture path resolves the UI's capture parameters into a request,
//! hides the surface and drives a capture backend. The export path discovers
//! send-to targets, keeps them in a sealed menu and dispatches a selection to
//! a typed export action. [`Frontend`] ties both together for one session.

pub mod capture;
pub mod config;
pub mod export;
pub mod frontend;
pub mod notification;
pub mod save;

pub use config::Config;
pub use frontend::Frontend;
