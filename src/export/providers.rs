//! Contracts for the external subsystems that contribute send-to targets.

use std::path::Path;

use super::types::{ExportError, IconHandle};

/// MIME type advertised when asking for image handlers.
pub const IMAGE_MIME_TYPE: &str = "image/png";

/// A handler registered with the system for some MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEntry {
    pub service_id: String,
    pub display_name: String,
    pub icon: IconHandle,
}

/// A resolved, invocable "open with this application" handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceHandler {
    pub service_id: String,
    /// Full argument vector, image path already substituted.
    pub argv: Vec<String>,
}

/// Application registry of the desktop (freedesktop `.desktop` files by default).
pub trait SystemServiceRegistry: Send + Sync {
    /// Handlers able to open files of `mime_type`, in any order.
    fn handlers_for(&self, mime_type: &str) -> Result<Vec<ServiceEntry>, ExportError>;

    /// Resolves `service_id` into a command line for `image`. `None` when the
    /// service is not installed.
    fn lookup(&self, service_id: &str, image: &Path) -> Option<ServiceHandler>;
}

/// A loaded export plugin. `group` is stable for the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginInfo {
    pub group: u32,
    pub name: String,
}

/// One action a plugin contributes to the menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginAction {
    pub action_id: i64,
    pub display_name: String,
    pub icon: IconHandle,
}

/// Host owning third-party export plugins. Its lifecycle is not ours.
pub trait PluginHost: Send + Sync {
    /// Loaded export plugins in load order.
    fn loaded_plugins(&self) -> Vec<PluginInfo>;

    /// Actions of `plugin`, in the plugin's own order.
    fn actions(&self, plugin: &PluginInfo) -> Result<Vec<PluginAction>, ExportError>;

    /// Runs `action_id` against the image stored at `image`.
    fn invoke(&self, action_id: i64, image: &Path) -> Result<(), ExportError>;
}
