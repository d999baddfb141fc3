//! One capture-and-export session.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::{Context, Result, anyhow};
use tokio::{sync::mpsc, task};

use crate::{
    capture::{
        CaptureBackend, CaptureError, CaptureEvent, CaptureManager, CaptureMode, CaptureOutcome,
        CapturedImage, PortalBackend, VisibilityState, VisibilityStateMachine,
        resolve_capture_request,
    },
    config::{Config, ConfigStore},
    export::{
        ExportAction, ExportDependencies, ExportError, ExportMenu, ExportTargetId, discover_menu,
        dispatch_selection, perform_export,
    },
    save::{self, SaveOptions},
};

/// Owns the persisted settings, the visibility state, the capture manager and
/// the sealed send-to menu for one session.
///
/// The capture path and the export path only meet at the current image.
pub struct Frontend {
    store: ConfigStore,
    visibility: VisibilityStateMachine,
    capture: CaptureManager,
    events: mpsc::UnboundedReceiver<CaptureEvent>,
    menu: ExportMenu,
    export: Arc<ExportDependencies>,
    current_image: Option<CapturedImage>,
}

impl Frontend {
    /// Session using the portal backend and the default export collaborators.
    pub fn new(store: ConfigStore, runtime_handle: &tokio::runtime::Handle) -> Self {
        let export = Arc::new(ExportDependencies::from_config(store.config()));
        Self::with_parts(store, runtime_handle, Arc::new(PortalBackend), export)
    }

    pub fn with_parts(
        store: ConfigStore,
        runtime_handle: &tokio::runtime::Handle,
        backend: Arc<dyn CaptureBackend>,
        export: Arc<ExportDependencies>,
    ) -> Self {
        let timeout = Duration::from_secs(store.config().capture.timeout_secs);
        let (capture, events) = CaptureManager::with_backend(runtime_handle, backend, timeout);
        let menu = discover_menu(export.services.as_ref(), export.plugins.as_ref());
        log::info!("Send-to menu ready with {} entries", menu.len());

        Self {
            store,
            visibility: VisibilityStateMachine::new(),
            capture,
            events,
            menu,
            export,
            current_image: None,
        }
    }

    pub fn config(&self) -> &Config {
        self.store.config()
    }

    pub fn visibility(&self) -> VisibilityState {
        self.visibility.state()
    }

    pub fn menu(&self) -> &ExportMenu {
        &self.menu
    }

    pub fn current_image(&self) -> Option<&CapturedImage> {
        self.current_image.as_ref()
    }

    /// Replaces the current image, e.g. with one loaded from disk.
    pub fn set_image(&mut self, image: CapturedImage) {
        self.current_image = Some(image);
    }

    /// Resolves the UI's capture parameters, hides the surface and hands the
    /// request to the capture manager. Returns the attempt number.
    ///
    /// An unknown mode token is logged and returned without touching the
    /// visibility state.
    pub fn capture(
        &mut self,
        mode_token: &str,
        delay_seconds: f64,
        include_pointer: bool,
        include_decorations: bool,
    ) -> Result<u64, CaptureError> {
        let request = resolve_capture_request(
            mode_token,
            delay_seconds,
            include_pointer,
            include_decorations,
        )
        .inspect_err(|e| log::warn!("Capture not started: {}", e))?;

        let attempt = self.visibility.begin_capture().ok_or(CaptureError::Busy)?;
        log::info!(
            "Capture attempt {}: {} after {} ms",
            attempt,
            request.mode(),
            request.delay_ms()
        );
        if let Err(e) = self.capture.submit(attempt, request) {
            log::error!("Failed to submit capture: {}", e);
            self.visibility.finish_capture(attempt);
            return Err(e);
        }
        Ok(attempt)
    }

    /// Waits for the next event from the capture manager.
    pub async fn next_event(&mut self) -> Option<CaptureEvent> {
        self.events.recv().await
    }

    /// Applies a capture event. Returns `false` for events of stale or
    /// already finished attempts, which change nothing.
    pub fn handle_outcome(&mut self, event: CaptureEvent) -> bool {
        if !self.visibility.finish_capture(event.attempt) {
            return false;
        }
        match event.outcome {
            CaptureOutcome::Success(image) => {
                log::info!("Screenshot ready ({} bytes)", image.data.len());
                self.current_image = Some(image);
            }
            CaptureOutcome::Cancelled(reason) => log::info!("Capture cancelled: {}", reason),
            CaptureOutcome::Failed(message) => log::warn!("Capture failed: {}", message),
            CaptureOutcome::TimedOut(after) => {
                log::warn!("Capture timed out after {:?}", after)
            }
        }
        true
    }

    /// Cancels the capture in flight, if any, and drops the current image.
    pub fn discard(&mut self) {
        if self.visibility.cancel() {
            log::info!("Capture cancelled by user");
        }
        self.current_image = None;
    }

    pub fn save_checkbox_states(
        &mut self,
        include_pointer: bool,
        include_decorations: bool,
    ) -> Result<()> {
        self.store
            .set_checkbox_states(include_pointer, include_decorations)
    }

    pub fn save_capture_mode(&mut self, mode: CaptureMode) -> Result<()> {
        self.store.set_capture_mode_index(mode.index())
    }

    pub fn record_window_position(&mut self, x: i32, y: i32) -> Result<()> {
        self.store.set_window_position(x, y)
    }

    /// Sends the current image to the menu target `id`.
    pub async fn send_to(&self, id: ExportTargetId) -> Result<ExportAction, ExportError> {
        let image = self.current_image.as_ref().ok_or(ExportError::NoImage)?;
        let action = dispatch_selection(&self.menu, id)?;
        perform_export(action.clone(), image, Arc::clone(&self.export)).await?;
        Ok(action)
    }

    /// Quick save into the configured location. Copies the saved path to the
    /// clipboard when configured to.
    pub async fn save(&self) -> Result<PathBuf> {
        let image = self
            .current_image
            .clone()
            .ok_or_else(|| anyhow!("No screenshot to save"))?;
        let options = SaveOptions::from_config(&self.config().save);
        let copy_location = options.copy_location_to_clipboard;

        let path = task::spawn_blocking(move || save::save_screenshot(&image, &options))
            .await
            .context("Save task failed")?
            .context("Failed to save screenshot")?;

        if copy_location {
            let clipboard = Arc::clone(&self.export.clipboard);
            let text = path.to_string_lossy().into_owned();
            match task::spawn_blocking(move || clipboard.copy_text(&text)).await {
                Ok(Ok(())) => log::info!("Copied save location to clipboard"),
                Ok(Err(e)) => log::warn!("Failed to copy save location: {}", e),
                Err(e) => log::warn!("Clipboard task failed: {}", e),
            }
        }
        Ok(path)
    }

    /// Saves the current image to exactly `path`.
    pub async fn save_as(&self, path: &Path) -> Result<()> {
        let image = self
            .current_image
            .as_ref()
            .ok_or_else(|| anyhow!("No screenshot to save"))?;
        let data = image.data.clone();
        let target = path.to_path_buf();
        task::spawn_blocking(move || save::write_image(&data, &target))
            .await
            .context("Save task failed")?
            .with_context(|| format!("Failed to save screenshot to {}", path.display()))
    }
}
