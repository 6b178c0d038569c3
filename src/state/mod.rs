//! State management module
//!
//! The session controller, the configuration it consumes, and the shared application state
//! that serialises access to it.

pub mod app_state;
pub mod controller;
pub mod preferences;
pub mod session;

// Re-export main types
pub use app_state::{AppState, TimerSnapshot};
pub use controller::{progress, BroadcastSink, SessionController, TimerEventSink};
pub use preferences::{AlertSettings, Preferences, TimerConfig};
pub use session::{Phase, SessionState, TimerEvent};
