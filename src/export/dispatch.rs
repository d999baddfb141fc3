use super::{
    menu::ExportMenu,
    types::{ExportAction, ExportError, ExportPayload, ExportTargetId, HardcodedAction},
};

/// Maps a target payload onto the single export action it stands for.
pub fn dispatch(payload: &ExportPayload) -> ExportAction {
    match payload {
        ExportPayload::Hardcoded {
            action: HardcodedAction::Clipboard,
        } => ExportAction::CopyToClipboard,
        ExportPayload::Hardcoded {
            action: HardcodedAction::OpenWithApplication,
        } => ExportAction::OpenWithApplication,
        ExportPayload::SystemService { service_id } => {
            ExportAction::InvokeSystemService(service_id.clone())
        }
        ExportPayload::PluginExport { action_id, .. } => {
            ExportAction::InvokePluginAction(*action_id)
        }
    }
}

/// Looks `id` up in `menu` and dispatches its payload.
///
/// An id the menu does not know is an internal error: it is logged and
/// returned rather than ignored.
pub fn dispatch_selection(
    menu: &ExportMenu,
    id: ExportTargetId,
) -> Result<ExportAction, ExportError> {
    match menu.get(id) {
        Some(descriptor) => {
            let action = dispatch(descriptor.payload());
            log::debug!("'{}' dispatched as {}", descriptor.display_name(), action);
            Ok(action)
        }
        None => {
            log::error!("Selection {} does not name an export target; this is a bug", id);
            Err(ExportError::UnknownTarget(id.to_string()))
        }
    }
}
