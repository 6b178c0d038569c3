//! Desktop notifications via `notify-send`

use std::sync::Mutex;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Whether notifications may be shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPermission {
    Granted,
    Denied,
    /// Not decided yet; asked on the first notification
    Default,
}

/// What happened to a notification request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Shown,
    /// Permission was undetermined; it has been requested instead
    PermissionRequested(NotificationPermission),
    Dropped,
}

/// Notification sink holding the current permission state
#[derive(Debug)]
pub struct Notifier {
    command: String,
    permission: Mutex<NotificationPermission>,
}

impl Notifier {
    pub fn new(command: impl Into<String>, permission: NotificationPermission) -> Self {
        Self {
            command: command.into(),
            permission: Mutex::new(permission),
        }
    }

    pub fn permission(&self) -> NotificationPermission {
        self.permission
            .lock()
            .map(|p| *p)
            .unwrap_or(NotificationPermission::Denied)
    }

    fn set_permission(&self, permission: NotificationPermission) {
        if let Ok(mut current) = self.permission.lock() {
            *current = permission;
        }
    }

    /// Show a notification if permitted. An undetermined permission is requested first and the
    /// notification itself is skipped.
    pub async fn notify(&self, title: &str, body: &str) -> Result<Delivery, String> {
        match self.permission() {
            NotificationPermission::Granted => {
                send_notification(&self.command, title, body).await?;
                Ok(Delivery::Shown)
            }
            NotificationPermission::Denied => {
                debug!("Notification permission denied, dropping \"{}\"", title);
                Ok(Delivery::Dropped)
            }
            NotificationPermission::Default => {
                let permission = request_permission(&self.command).await;
                self.set_permission(permission);
                Ok(Delivery::PermissionRequested(permission))
            }
        }
    }
}

/// Probe for the notification command: available means granted
pub async fn request_permission(command: &str) -> NotificationPermission {
    match Command::new(command).arg("--version").output().await {
        Ok(output) if output.status.success() => {
            info!("{} is available, notifications granted", command);
            NotificationPermission::Granted
        }
        Ok(_) | Err(_) => {
            warn!("{} is not available, notifications denied", command);
            NotificationPermission::Denied
        }
    }
}

/// Show a desktop notification
pub async fn send_notification(command: &str, title: &str, body: &str) -> Result<(), String> {
    debug!("Showing notification: {}", title);

    let output = Command::new(command)
        .args(["--app-name=pomodoro-server", title, body])
        .output()
        .await
        .map_err(|e| format!("Failed to execute {}: {}", command, e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("{} failed: {}", command, stderr));
    }

    Ok(())
}
