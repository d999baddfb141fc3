//! Send-to export path.
//!
//! Targets are discovered from three providers (built-in actions, system
//! services able to open images, export plugins) by
//! [`ExportTargetAggregator`], collected into a sealed [`ExportMenu`] and
//! turned into typed [`ExportAction`]s by the dispatcher. [`perform_export`]
//! executes an action against a captured image through the collaborators in
//! [`ExportDependencies`].

pub mod clipboard;
pub mod desktop;
pub mod plugins;
pub mod providers;
pub mod types;

mod aggregator;
mod dependencies;
mod dispatch;
mod menu;
mod pipeline;
#[cfg(test)]
mod tests;

pub use aggregator::ExportTargetAggregator;
pub use dependencies::{
    CommandLauncher, ExportDependencies, ImageClipboard, ProcessLauncher, WaylandClipboard,
};
pub use desktop::DesktopEntryRegistry;
pub use dispatch::{dispatch, dispatch_selection};
pub use menu::ExportMenu;
pub use pipeline::perform_export;
pub use plugins::ManifestPluginHost;
pub use providers::{
    IMAGE_MIME_TYPE, PluginAction, PluginHost, PluginInfo, ServiceEntry, ServiceHandler,
    SystemServiceRegistry,
};
pub use types::{
    DiscoveryEvent, ExportAction, ExportError, ExportPayload, ExportTargetDescriptor,
    ExportTargetId, HardcodedAction, IconHandle, MenuEntry,
};

/// Runs discovery to completion and returns the sealed menu.
pub fn discover_menu(
    services: &dyn SystemServiceRegistry,
    plugins: &dyn PluginHost,
) -> ExportMenu {
    ExportMenu::from_discovery(ExportTargetAggregator::new(services, plugins))
}
