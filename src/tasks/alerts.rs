//! Alert dispatch background task

use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

use crate::{
    services::{AlarmPlayer, Delivery, Notifier},
    state::TimerEvent,
};

/// Forwards alarm and notification requests from the controller to their sinks.
/// Returns once the event channel closes.
pub async fn alert_dispatch_task(
    mut events: broadcast::Receiver<TimerEvent>,
    player: AlarmPlayer,
    notifier: Arc<Notifier>,
) {
    info!("Starting alert dispatch task");

    loop {
        match events.recv().await {
            Ok(TimerEvent::AlarmRequested { volume }) => {
                // Playback lasts as long as the sound file, don't hold up notifications
                let player = player.clone();
                tokio::spawn(async move {
                    if let Err(e) = player.play(volume).await {
                        warn!("Failed to play alarm: {}", e);
                    }
                });
            }
            Ok(TimerEvent::NotificationRequested { title, body }) => {
                match notifier.notify(&title, &body).await {
                    Ok(Delivery::Shown) => debug!("Notification shown: {}", title),
                    Ok(Delivery::PermissionRequested(permission)) => {
                        info!("Notification permission is now {:?}", permission)
                    }
                    Ok(Delivery::Dropped) => {}
                    Err(e) => warn!("Failed to show notification: {}", e),
                }
            }
            Ok(TimerEvent::SessionCompleted) => info!("Pomodoro cycle completed"),
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                warn!("Alert dispatcher lagged, {} events skipped", skipped);
            }
            Err(RecvError::Closed) => {
                info!("Event channel closed, stopping alert dispatch");
                return;
            }
        }
    }
}
