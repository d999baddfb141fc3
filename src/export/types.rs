//! Data types for send-to export targets.

use serde::Serialize;
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Opaque key identifying one target within a discovery generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ExportTargetId(pub(crate) u32);

impl fmt::Display for ExportTargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ExportTargetId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(ExportTargetId)
    }
}

/// Freedesktop icon name or path. Rendering is the UI's business.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct IconHandle(pub String);

impl IconHandle {
    pub fn named(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Built-in destinations that need no discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum HardcodedAction {
    Clipboard,
    OpenWithApplication,
}

/// How a target is invoked. One variant per provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ExportPayload {
    Hardcoded { action: HardcodedAction },
    SystemService { service_id: String },
    PluginExport { action_id: i64, plugin_group: u32 },
}

/// One entry of the send-to menu. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportTargetDescriptor {
    id: ExportTargetId,
    display_name: String,
    icon: IconHandle,
    payload: ExportPayload,
}

impl ExportTargetDescriptor {
    pub(crate) fn new(
        id: ExportTargetId,
        display_name: impl Into<String>,
        icon: IconHandle,
        payload: ExportPayload,
    ) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            icon,
            payload,
        }
    }

    pub fn id(&self) -> ExportTargetId {
        self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn icon(&self) -> &IconHandle {
        &self.icon
    }

    pub fn payload(&self) -> &ExportPayload {
        &self.payload
    }
}

/// What the send-to menu holds, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum MenuEntry {
    Target(ExportTargetDescriptor),
    Separator,
}

/// Items yielded by the aggregator. `Done` is always last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryEvent {
    Entry(ExportTargetDescriptor),
    Separator,
    Done,
}

/// Typed request handed to the export collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportAction {
    CopyToClipboard,
    OpenWithApplication,
    InvokeSystemService(String),
    InvokePluginAction(i64),
}

impl fmt::Display for ExportAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportAction::CopyToClipboard => f.write_str("copy to clipboard"),
            ExportAction::OpenWithApplication => f.write_str("open with application"),
            ExportAction::InvokeSystemService(id) => write!(f, "open with service {}", id),
            ExportAction::InvokePluginAction(id) => write!(f, "plugin action {}", id),
        }
    }
}

/// Errors raised on the export path.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Unknown export target '{0}'")]
    UnknownTarget(String),

    #[error("Export menu is complete and can no longer change")]
    MenuSealed,

    #[error("Duplicate export target id {0}")]
    DuplicateTarget(ExportTargetId),

    #[error("No screenshot to export")]
    NoImage,

    #[error("System service '{0}' is not available")]
    ServiceNotFound(String),

    #[error("Unknown plugin action {0}")]
    UnknownPluginAction(i64),

    #[error("Provider enumeration failed: {0}")]
    Provider(String),

    #[error("Clipboard operation failed: {0}")]
    Clipboard(String),

    #[error("Failed to launch '{command}': {message}")]
    Launch { command: String, message: String },

    #[error("Failed to write screenshot: {0}")]
    Io(#[from] std::io::Error),

    #[error("Export task failed: {0}")]
    Task(String),
}
