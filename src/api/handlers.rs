//! HTTP endpoint handlers

use std::{convert::Infallible, sync::Arc};

use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
};
use futures::stream::{self, Stream};
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

use super::responses::{ApiResponse, HealthResponse, MessageResponse, PreferencesResponse, StatusResponse};
use crate::state::{AppState, Preferences, TimerSnapshot};

fn command_response(
    result: Result<TimerSnapshot, String>,
    message: &str,
) -> Result<Json<ApiResponse>, StatusCode> {
    match result {
        Ok(timer) => {
            info!("{} ({} left)", message, timer.display);
            Ok(Json(ApiResponse::new(message.to_string(), timer)))
        }
        Err(e) => {
            error!("Timer command failed: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /timer/start
pub async fn start_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, StatusCode> {
    command_response(state.start(), "Timer started")
}

/// Handle POST /timer/pause
pub async fn pause_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, StatusCode> {
    command_response(state.pause(), "Timer paused")
}

/// Handle POST /timer/toggle - Start when paused, pause when running
pub async fn toggle_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, StatusCode> {
    command_response(state.toggle(), "Timer toggled")
}

/// Handle POST /timer/reset
pub async fn reset_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, StatusCode> {
    command_response(state.reset(), "Timer reset")
}

/// Handle GET /status - Return timer snapshot and server metadata
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, StatusCode> {
    let timer = match state.snapshot() {
        Ok(t) => t,
        Err(e) => {
            error!("Failed to get timer state: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        timer,
        store: state.store.name().to_string(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /preferences
pub async fn get_preferences_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Preferences>, StatusCode> {
    state.get_preferences().map(Json).map_err(|e| {
        error!("Failed to get preferences: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

/// Handle PUT /preferences - Validate, apply and persist
pub async fn put_preferences_handler(
    State(state): State<Arc<AppState>>,
    Json(preferences): Json<Preferences>,
) -> Result<Json<PreferencesResponse>, (StatusCode, Json<MessageResponse>)> {
    if let Err(e) = preferences.validate() {
        warn!("Rejected preferences: {}", e);
        return Err((StatusCode::BAD_REQUEST, Json(MessageResponse { message: e.to_string() })));
    }

    match state.update_preferences(preferences) {
        Ok(preferences) => {
            info!("Preferences updated");
            Ok(Json(PreferencesResponse {
                message: "Preferences updated successfully".to_string(),
                store: state.store.name().to_string(),
                preferences,
            }))
        }
        Err(e) => {
            error!("Failed to update preferences: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(MessageResponse { message: "Error updating preferences".to_string() }),
            ))
        }
    }
}

/// Handle POST /preferences/sound - Toggle the alarm sound
pub async fn toggle_sound_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PreferencesResponse>, StatusCode> {
    match state.toggle_sound() {
        Ok(preferences) => {
            let message = if preferences.sound_enabled { "Sound enabled" } else { "Sound muted" };
            info!("{}", message);
            Ok(Json(PreferencesResponse {
                message: message.to_string(),
                store: state.store.name().to_string(),
                preferences,
            }))
        }
        Err(e) => {
            error!("Failed to toggle sound: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle GET /events - Stream controller events as server-sent events
pub async fn events_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let events = state.subscribe();

    let stream = stream::unfold(events, |mut events| async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    let sse = Event::default()
                        .event(event.name())
                        .json_data(&event)
                        .unwrap_or_else(|e| Event::default().event("error").data(e.to_string()));
                    return Some((Ok::<_, Infallible>(sse), events));
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Event stream lagged, {} events skipped", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
