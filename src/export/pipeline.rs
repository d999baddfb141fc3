use std::{path::PathBuf, sync::Arc};

use tokio::task;

use crate::{capture::CapturedImage, save};

use super::{
    dependencies::ExportDependencies,
    desktop::split_exec,
    types::{ExportAction, ExportError},
};

/// Carries out `action` for `image`.
///
/// Clipboard copies send the PNG bytes directly. Every other action first
/// stages the image as a file in the staging directory and hands that path to
/// the external program. Blocking work runs on the blocking pool.
pub async fn perform_export(
    action: ExportAction,
    image: &CapturedImage,
    dependencies: Arc<ExportDependencies>,
) -> Result<(), ExportError> {
    log::info!("Starting export: {}", action);

    match action {
        ExportAction::CopyToClipboard => {
            let data = image.data.clone();
            run_blocking(move || dependencies.clipboard.copy_image(&data)).await
        }
        ExportAction::OpenWithApplication => {
            let path = stage(image, &dependencies).await?;
            let mut argv = split_exec(&dependencies.open_with_command);
            argv.push(path.to_string_lossy().into_owned());
            run_blocking(move || dependencies.launcher.launch(&argv)).await
        }
        ExportAction::InvokeSystemService(service_id) => {
            let path = stage(image, &dependencies).await?;
            run_blocking(move || {
                let handler = dependencies
                    .services
                    .lookup(&service_id, &path)
                    .ok_or_else(|| ExportError::ServiceNotFound(service_id.clone()))?;
                dependencies.launcher.launch(&handler.argv)
            })
            .await
        }
        ExportAction::InvokePluginAction(action_id) => {
            let path = stage(image, &dependencies).await?;
            run_blocking(move || dependencies.plugins.invoke(action_id, &path)).await
        }
    }
}

async fn stage(
    image: &CapturedImage,
    dependencies: &ExportDependencies,
) -> Result<PathBuf, ExportError> {
    let image = image.clone();
    let dir = dependencies.staging_dir.clone();
    let path = task::spawn_blocking(move || save::stage_for_export(&image, &dir))
        .await
        .map_err(|e| ExportError::Task(format!("Staging task failed: {}", e)))??;
    log::debug!("Staged screenshot at {}", path.display());
    Ok(path)
}

async fn run_blocking<F>(f: F) -> Result<(), ExportError>
where
    F: FnOnce() -> Result<(), ExportError> + Send + 'static,
{
    task::spawn_blocking(f)
        .await
        .map_err(|e| ExportError::Task(e.to_string()))?
}
