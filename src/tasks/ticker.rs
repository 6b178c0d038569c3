//! Session ticker background task

use std::sync::Arc;

use tokio::time::{interval_at, Instant};
use tracing::{debug, error, info, warn};

use crate::state::AppState;

/// Drives the controller's countdown while it is running.
///
/// Sleeps on the running flag while paused. Once running, ticks at `state.tick_interval` until the
/// controller stops itself (phase gating, end of cycle) or a command pauses it.
pub async fn session_ticker_task(state: Arc<AppState>) {
    info!("Starting session ticker task");

    let mut running_rx = state.running_tx.subscribe();

    loop {
        if !*running_rx.borrow_and_update() {
            if running_rx.changed().await.is_err() {
                warn!("Running flag channel closed, stopping ticker");
                return;
            }
            continue;
        }

        debug!("Countdown running, ticking every {:?}", state.tick_interval);
        let mut interval = interval_at(Instant::now() + state.tick_interval, state.tick_interval);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match state.tick() {
                        Ok(snapshot) if !snapshot.is_running => {
                            debug!("Countdown stopped at {} ({})", snapshot.display, snapshot.phase_label);
                            break;
                        }
                        Ok(_) => {}
                        Err(e) => {
                            error!("Failed to advance timer: {}", e);
                            break;
                        }
                    }
                }

                changed = running_rx.changed() => {
                    if changed.is_err() {
                        warn!("Running flag channel closed, stopping ticker");
                        return;
                    }
                    if !*running_rx.borrow_and_update() {
                        debug!("Countdown paused");
                        break;
                    }
                }
            }
        }
    }
}
