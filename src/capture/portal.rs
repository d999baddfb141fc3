//! xdg-desktop-portal integration for screenshot capture.

use super::types::{CaptureError, CaptureMode};
use futures::StreamExt;
use std::collections::HashMap;
use std::time::Duration;
use zbus::zvariant::{OwnedValue, Value};
use zbus::{Connection, proxy};

/// How many times the portal's output file is polled before giving up.
const READ_ATTEMPTS: usize = 60;
const READ_RETRY_DELAY: Duration = Duration::from_millis(50);

/// D-Bus proxy for the xdg-desktop-portal Screenshot interface.
#[proxy(
    interface = "org.freedesktop.portal.Screenshot",
    default_service = "org.freedesktop.portal.Desktop",
    default_path = "/org/freedesktop/portal/desktop"
)]
trait Screenshot {
    /// Returns the object path of a `Request` that later emits `Response`.
    async fn screenshot(
        &self,
        parent_window: &str,
        options: HashMap<String, Value<'_>>,
    ) -> zbus::Result<zbus::zvariant::OwnedObjectPath>;
}

/// D-Bus proxy for org.freedesktop.portal.Request.
#[proxy(
    interface = "org.freedesktop.portal.Request",
    default_service = "org.freedesktop.portal.Desktop"
)]
trait Request {
    /// `response`: 0 = success, 1 = cancelled, 2 = other error.
    #[zbus(signal)]
    fn response(&self, response: u32, results: HashMap<String, OwnedValue>) -> zbus::Result<()>;
}

/// Asks the portal for a screenshot and returns the `file://` URI it wrote.
pub async fn capture_via_portal(mode: CaptureMode) -> Result<String, CaptureError> {
    log::debug!("Initiating portal screenshot capture: {}", mode);

    let connection = Connection::session().await?;
    let proxy = ScreenshotProxy::new(&connection).await?;

    let request_path = proxy
        .screenshot("", build_portal_options(mode))
        .await
        .map_err(|e| {
            log::error!("Portal screenshot call failed: {}", e);
            let message = e.to_string();
            if message.contains("Cancelled") || message.contains("denied") {
                CaptureError::PermissionDenied
            } else {
                CaptureError::DBusError(e)
            }
        })?;

    log::debug!("Screenshot request created: {:?}", request_path);

    let request_proxy = RequestProxy::builder(&connection)
        .path(request_path)?
        .build()
        .await?;
    let mut responses = request_proxy.receive_response().await?;

    let signal = responses
        .next()
        .await
        .ok_or_else(|| CaptureError::InvalidResponse("No Response signal received".into()))?;
    let args = signal.args().map_err(|e| {
        CaptureError::InvalidResponse(format!("Failed to parse response args: {}", e))
    })?;

    match args.response {
        0 => {
            let uri = args
                .results
                .get("uri")
                .ok_or_else(|| CaptureError::InvalidResponse("No 'uri' field in response".into()))?;
            let uri: &str = uri.downcast_ref().map_err(|e| {
                CaptureError::InvalidResponse(format!("URI is not a string: {}", e))
            })?;
            log::info!("Portal captured screenshot: {}", uri);
            Ok(uri.to_string())
        }
        1 => Err(CaptureError::Cancelled("dismissed in portal dialog".into())),
        code => Err(CaptureError::InvalidResponse(format!(
            "Portal returned error code {}",
            code
        ))),
    }
}

/// Portal options for a capture mode.
///
/// The portal has no notion of "current screen" or "active window", so those
/// fall back to full-screen and interactive picking respectively.
fn build_portal_options(mode: CaptureMode) -> HashMap<String, Value<'static>> {
    let mut options = HashMap::new();
    options.insert("modal".to_string(), false.into());
    options.insert("interactive".to_string(), mode.is_interactive().into());
    options
}

/// Reads the image the portal wrote at `uri` and removes the file.
///
/// Some portals return before the file is flushed, so empty or missing files
/// are retried for a few seconds.
pub async fn read_image_from_uri(uri: &str) -> Result<Vec<u8>, CaptureError> {
    let path = url::Url::parse(uri)
        .map_err(|e| CaptureError::InvalidResponse(format!("Invalid file URI '{}': {}", uri, e)))?
        .to_file_path()
        .map_err(|_| CaptureError::InvalidResponse(format!("Cannot convert URI to path: {}", uri)))?;

    let mut last_error = None;
    for attempt in 1..=READ_ATTEMPTS {
        match tokio::fs::read(&path).await {
            Ok(bytes) if !bytes.is_empty() => {
                if let Err(e) = tokio::fs::remove_file(&path).await {
                    log::warn!("Failed to remove portal temp file {}: {}", path.display(), e);
                }
                log::debug!("Read {} bytes from {}", bytes.len(), path.display());
                return Ok(bytes);
            }
            Ok(_) => log::trace!("{} still empty (attempt {})", path.display(), attempt),
            Err(e) => {
                log::trace!("{} not ready (attempt {}): {}", path.display(), attempt, e);
                last_error = Some(e);
            }
        }
        tokio::time::sleep(READ_RETRY_DELAY).await;
    }

    Err(match last_error {
        Some(e) => CaptureError::Io(e),
        None => CaptureError::InvalidResponse(format!(
            "Portal screenshot file {} stayed empty",
            path.display()
        )),
    })
}
