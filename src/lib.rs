//! Pomodoro Server - A state-managed Pomodoro session server
//!
//! This library provides the Pomodoro session controller (focus/break cycling, long-break
//! insertion, session counting), the preferences it runs on with local or remote persistence,
//! and the HTTP server and background tasks that drive it.

pub mod config;
pub mod error;
pub mod state;
pub mod storage;
pub mod api;
pub mod services;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use error::{StoreError, ValidationError};
pub use state::{AppState, Phase, Preferences, SessionController, TimerConfig, TimerEvent};
pub use storage::{select_store, PreferencesStore};
pub use api::create_router;
pub use utils::signals::shutdown_signal;
