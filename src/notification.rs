//! Desktop notifications via freedesktop D-Bus.

use std::collections::HashMap;
use zbus::{Connection, proxy};

const APP_NAME: &str = "Shotgenie";
const DEFAULT_ICON: &str = "camera-photo";
const EXPIRE_TIMEOUT_MS: i32 = 3000;

#[proxy(
    interface = "org.freedesktop.Notifications",
    default_service = "org.freedesktop.Notifications",
    default_path = "/org/freedesktop/Notifications"
)]
trait Notifications {
    /// Returns the notification id.
    fn notify(
        &self,
        app_name: &str,
        replaces_id: u32,
        app_icon: &str,
        summary: &str,
        body: &str,
        actions: Vec<&str>,
        hints: HashMap<&str, zbus::zvariant::Value<'_>>,
        expire_timeout: i32,
    ) -> zbus::Result<u32>;
}

/// Shows a notification; `icon` defaults to `camera-photo`.
pub async fn send_notification(summary: &str, body: &str, icon: Option<&str>) -> zbus::Result<u32> {
    let connection = Connection::session().await?;
    let proxy = NotificationsProxy::new(&connection).await?;
    proxy
        .notify(
            APP_NAME,
            0,
            icon.unwrap_or(DEFAULT_ICON),
            summary,
            body,
            vec![],
            HashMap::new(),
            EXPIRE_TIMEOUT_MS,
        )
        .await
}

/// Like [`send_notification`], but failures are only logged.
pub async fn notify_or_log(summary: &str, body: &str) {
    if let Err(e) = send_notification(summary, body, None).await {
        log::warn!("Failed to send notification: {}", e);
    }
}
