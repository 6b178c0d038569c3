//! Main application state management

use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use super::{BroadcastSink, Phase, Preferences, SessionController, TimerEvent};
use crate::{storage::PreferencesStore, utils::format::{format_time, window_title}};

/// Point-in-time view of the controller for clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub phase: Phase,
    pub phase_label: String,
    pub time_left_seconds: u32,
    /// `MM:SS`
    pub display: String,
    pub title: String,
    pub is_running: bool,
    pub current_session: u32,
    pub study_sessions: u32,
    pub completed_sessions: u32,
    pub progress: f64,
}

impl TimerSnapshot {
    fn of(controller: &SessionController) -> Self {
        let state = controller.state();
        let study_sessions = controller.config().study_sessions;
        Self {
            phase: state.phase,
            phase_label: state.phase.label().to_string(),
            time_left_seconds: state.time_left_seconds,
            display: format_time(state.time_left_seconds),
            title: window_title(state.time_left_seconds, state.phase, state.current_session, study_sessions),
            is_running: state.is_running,
            current_session: state.current_session,
            study_sessions,
            completed_sessions: state.completed_sessions,
            progress: controller.progress(),
        }
    }
}

/// Shared state: the session controller plus preferences, persistence and server metadata
pub struct AppState {
    /// The one controller for this process
    pub controller: Arc<Mutex<SessionController>>,
    pub preferences: Arc<Mutex<Preferences>>,
    pub store: Arc<dyn PreferencesStore>,
    /// Countdown cadence, one second outside of tests
    pub tick_interval: Duration,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Arc<Mutex<Option<String>>>,
    pub last_action_time: Arc<Mutex<Option<DateTime<Utc>>>>,
    /// Controller events for async listeners
    pub event_tx: broadcast::Sender<TimerEvent>,
    /// Whether the countdown is running; the ticker task waits on this
    pub running_tx: watch::Sender<bool>,
    /// Keep the receiver alive to prevent channel closure
    pub _running_rx: watch::Receiver<bool>,
}

impl AppState {
    /// Create the state with a paused controller built from `preferences`
    pub fn new(
        port: u16,
        host: String,
        preferences: Preferences,
        store: Arc<dyn PreferencesStore>,
        tick_interval: Duration,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        let (running_tx, running_rx) = watch::channel(false);

        let mut controller = SessionController::new(preferences.timer, preferences.alert_settings());
        controller.register_sink(BroadcastSink(event_tx.clone()));

        Self {
            controller: Arc::new(Mutex::new(controller)),
            preferences: Arc::new(Mutex::new(preferences)),
            store,
            tick_interval,
            start_time: Instant::now(),
            port,
            host,
            last_action: Arc::new(Mutex::new(None)),
            last_action_time: Arc::new(Mutex::new(None)),
            event_tx,
            running_tx,
            _running_rx: running_rx,
        }
    }

    /// Subscribe to controller events
    pub fn subscribe(&self) -> broadcast::Receiver<TimerEvent> {
        self.event_tx.subscribe()
    }

    /// Apply a command to the controller, record it and publish the running flag
    pub fn with_controller<F>(&self, action: &str, command: F) -> Result<TimerSnapshot, String>
    where
        F: FnOnce(&mut SessionController),
    {
        let snapshot = self.apply(command)?;
        self.record_action(action);
        Ok(snapshot)
    }

    pub fn start(&self) -> Result<TimerSnapshot, String> {
        info!("Starting timer");
        self.with_controller("start", SessionController::start)
    }

    pub fn pause(&self) -> Result<TimerSnapshot, String> {
        info!("Pausing timer");
        self.with_controller("pause", SessionController::pause)
    }

    /// Start when paused, pause when running
    pub fn toggle(&self) -> Result<TimerSnapshot, String> {
        self.with_controller("toggle", |controller| {
            if controller.is_running() {
                controller.pause();
            } else {
                controller.start();
            }
        })
    }

    pub fn reset(&self) -> Result<TimerSnapshot, String> {
        self.with_controller("reset", SessionController::reset)
    }

    /// One countdown step, driven by the ticker task
    pub fn tick(&self) -> Result<TimerSnapshot, String> {
        self.apply(SessionController::tick)
    }

    /// Get current timer snapshot
    pub fn snapshot(&self) -> Result<TimerSnapshot, String> {
        self.controller
            .lock()
            .map(|controller| TimerSnapshot::of(&controller))
            .map_err(|e| format!("Failed to lock controller: {}", e))
    }

    pub fn get_preferences(&self) -> Result<Preferences, String> {
        self.preferences
            .lock()
            .map(|prefs| prefs.clone())
            .map_err(|e| format!("Failed to lock preferences: {}", e))
    }

    /// Replace the preferences, hand them to the controller and persist them.
    /// `preferences` must already be validated.
    pub fn update_preferences(&self, preferences: Preferences) -> Result<Preferences, String> {
        self.store_preferences("preferences", |prefs| *prefs = preferences)
    }

    /// Flip the alarm sound on or off
    pub fn toggle_sound(&self) -> Result<Preferences, String> {
        self.store_preferences("toggle-sound", |prefs| prefs.sound_enabled = !prefs.sound_enabled)
    }

    fn store_preferences<F>(&self, action: &str, updater: F) -> Result<Preferences, String>
    where
        F: FnOnce(&mut Preferences),
    {
        let mut prefs = self.preferences.lock()
            .map_err(|e| format!("Failed to lock preferences: {}", e))?;

        updater(&mut *prefs);
        let updated = prefs.clone();

        // Applied while still holding the preferences lock so both stay in step
        self.apply(|controller| {
            controller.update_config(updated.timer);
            controller.update_alerts(updated.alert_settings());
        })?;
        drop(prefs);

        self.record_action(action);
        self.persist(updated.clone());
        Ok(updated)
    }

    /// Save in the background; failures are logged only
    fn persist(&self, preferences: Preferences) {
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            if let Err(e) = store.save(&preferences).await {
                warn!("Failed to save preferences to {} store: {}", store.name(), e);
            }
        });
    }

    fn apply<F>(&self, command: F) -> Result<TimerSnapshot, String>
    where
        F: FnOnce(&mut SessionController),
    {
        let mut controller = self.controller.lock()
            .map_err(|e| format!("Failed to lock controller: {}", e))?;

        command(&mut *controller);
        let snapshot = TimerSnapshot::of(&controller);
        drop(controller); // Release the lock early

        let running = snapshot.is_running;
        self.running_tx.send_if_modified(|current| {
            if *current == running {
                return false;
            }
            debug!("Timer running state changed to {}", running);
            *current = running;
            true
        });

        Ok(snapshot)
    }

    fn record_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }
}
