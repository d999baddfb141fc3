use async_trait::async_trait;

use crate::capture::{
    portal,
    types::{CaptureError, CaptureRequest},
};

/// Abstraction over the subsystem that actually grabs pixels.
///
/// The request's delay has already elapsed when `capture` is called.
#[async_trait]
pub trait CaptureBackend: Send + Sync {
    /// Returns encoded PNG bytes.
    async fn capture(&self, request: CaptureRequest) -> Result<Vec<u8>, CaptureError>;
}

/// Captures through xdg-desktop-portal.
#[derive(Debug, Default, Clone, Copy)]
pub struct PortalBackend;

#[async_trait]
impl CaptureBackend for PortalBackend {
    async fn capture(&self, request: CaptureRequest) -> Result<Vec<u8>, CaptureError> {
        if !request.include_pointer() || !request.include_decorations() {
            log::debug!(
                "Portal backend ignores pointer/decoration flags (pointer={}, decorations={})",
                request.include_pointer(),
                request.include_decorations()
            );
        }
        let uri = portal::capture_via_portal(request.mode()).await?;
        portal::read_image_from_uri(&uri).await
    }
}
