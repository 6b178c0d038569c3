//! Pomodoro Server - A state-managed Pomodoro session server
//!
//! This is the main entry point for the pomodoro-server application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use pomodoro_server::{
    api::create_router,
    config::Config,
    services::{AlarmPlayer, Notifier},
    state::AppState,
    storage::{load_initial_preferences, select_store},
    tasks::{alert_dispatch_task, session_ticker_task},
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("pomodoro_server={},tower_http=info", config.log_level()))
        .init();

    info!("Starting pomodoro-server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, authenticated={}",
          config.host, config.port, config.is_authenticated());

    // Preferences come from the backend when signed in, from the local file otherwise
    let store = select_store(
        &config.preferences_file,
        config.backend_url.as_deref(),
        config.token.as_deref(),
    );
    let preferences = load_initial_preferences(store.as_ref()).await;
    info!("Loaded preferences: {} x {}min focus, {}min break, {}min long break",
          preferences.timer.study_sessions, preferences.timer.study_length,
          preferences.timer.break_length, preferences.timer.long_break_length);

    let state = Arc::new(AppState::new(
        config.port,
        config.host.clone(),
        preferences,
        store,
        config.tick_interval(),
    ));

    // Alarm and notification sinks
    let notifier = Arc::new(Notifier::new(config.notify_command.clone(), config.notification_permission));
    let player = AlarmPlayer::new(config.alarm_command.clone(), config.alarm_file.clone());
    tokio::spawn(alert_dispatch_task(state.subscribe(), player, notifier));

    // Start the countdown background task
    let ticker_state = Arc::clone(&state);
    let ticker = tokio::spawn(async move {
        session_ticker_task(ticker_state).await;
    });

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /timer/start        - Start the countdown");
    info!("  POST /timer/pause        - Pause the countdown");
    info!("  POST /timer/toggle       - Start or pause");
    info!("  POST /timer/reset        - Back to the first focus session");
    info!("  GET  /status             - Current timer and server status");
    info!("  GET  /preferences        - Current preferences");
    info!("  PUT  /preferences        - Update preferences");
    info!("  POST /preferences/sound  - Toggle the alarm sound");
    info!("  GET  /events             - Timer event stream (SSE)");
    info!("  GET  /health             - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        signal = shutdown_signal() => {
            if let Err(e) = signal {
                tracing::error!("Failed to listen for shutdown signals: {}", e);
            }
            info!("Shutdown signal received");
        }
    }

    // Cancelling the countdown is a pause plus stopping the ticker
    if let Err(e) = state.pause() {
        tracing::error!("Failed to pause timer: {}", e);
    }
    ticker.abort();

    info!("Server shutdown complete");
    Ok(())
}
