use std::{sync::Arc, time::Duration};

use tokio::sync::{Mutex, mpsc};

use crate::capture::{
    dependencies::{CaptureBackend, PortalBackend},
    types::{
        CaptureError, CaptureEvent, CaptureOutcome, CaptureRequest, CaptureStatus, CapturedImage,
    },
};

struct PendingCapture {
    attempt: u64,
    request: CaptureRequest,
}

/// Drives the capture backend on a background task.
///
/// Requests go in through [`CaptureManager::submit`]; every request produces
/// exactly one [`CaptureEvent`] on the receiver returned at construction,
/// including when the backend hangs past the timeout.
#[derive(Clone)]
pub struct CaptureManager {
    request_tx: mpsc::UnboundedSender<PendingCapture>,
    status: Arc<Mutex<CaptureStatus>>,
}

impl CaptureManager {
    /// Create a manager backed by xdg-desktop-portal.
    pub fn new(
        runtime_handle: &tokio::runtime::Handle,
        timeout: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<CaptureEvent>) {
        Self::with_backend(runtime_handle, Arc::new(PortalBackend), timeout)
    }

    /// Create a manager with a custom backend (useful for testing).
    pub fn with_backend(
        runtime_handle: &tokio::runtime::Handle,
        backend: Arc<dyn CaptureBackend>,
        timeout: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<CaptureEvent>) {
        let (request_tx, mut request_rx) = mpsc::unbounded_channel::<PendingCapture>();
        let (event_tx, event_rx) = mpsc::unbounded_channel::<CaptureEvent>();
        let status = Arc::new(Mutex::new(CaptureStatus::Idle));

        let status_clone = status.clone();
        runtime_handle.spawn(async move {
            while let Some(PendingCapture { attempt, request }) = request_rx.recv().await {
                let mode = request.mode();
                log::debug!("Processing capture attempt {}: {:?}", attempt, request);

                if request.delay_ms() > 0 {
                    *status_clone.lock().await = CaptureStatus::Delaying;
                    tokio::time::sleep(request.delay()).await;
                }

                *status_clone.lock().await = CaptureStatus::AwaitingBackend;
                let (status, outcome) =
                    match tokio::time::timeout(timeout, backend.capture(request)).await {
                        Ok(Ok(data)) => {
                            log::info!("Capture successful ({} bytes)", data.len());
                            (
                                CaptureStatus::Success,
                                CaptureOutcome::Success(CapturedImage::new(data, Some(mode))),
                            )
                        }
                        Ok(Err(CaptureError::Cancelled(reason))) => {
                            log::info!("Capture cancelled: {}", reason);
                            (
                                CaptureStatus::Cancelled(reason.clone()),
                                CaptureOutcome::Cancelled(reason),
                            )
                        }
                        Ok(Err(e)) => {
                            let message = e.to_string();
                            log::error!("Capture failed: {}", message);
                            (
                                CaptureStatus::Failed(message.clone()),
                                CaptureOutcome::Failed(message),
                            )
                        }
                        Err(_) => {
                            log::error!("Capture backend did not answer within {:?}", timeout);
                            (CaptureStatus::TimedOut, CaptureOutcome::TimedOut(timeout))
                        }
                    };

                *status_clone.lock().await = status;
                if event_tx.send(CaptureEvent { attempt, outcome }).is_err() {
                    log::debug!("Capture event receiver dropped; stopping manager task");
                    break;
                }
            }
        });

        (Self { request_tx, status }, event_rx)
    }

    /// Queue `request` as capture `attempt`. Non-blocking.
    pub fn submit(&self, attempt: u64, request: CaptureRequest) -> Result<(), CaptureError> {
        self.request_tx
            .send(PendingCapture { attempt, request })
            .map_err(|_| CaptureError::ManagerStopped)
    }

    pub async fn get_status(&self) -> CaptureStatus {
        self.status.lock().await.clone()
    }
}

#[cfg(test)]
impl CaptureManager {
    pub(crate) fn with_closed_channel_for_test() -> Self {
        let (tx, rx) = mpsc::unbounded_channel::<PendingCapture>();
        drop(rx);
        Self {
            request_tx: tx,
            status: Arc::new(Mutex::new(CaptureStatus::Idle)),
        }
    }
}
