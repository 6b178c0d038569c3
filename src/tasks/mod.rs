//! Background tasks module
//!
//! This module contains background tasks that run alongside the HTTP server.

pub mod alerts;
pub mod ticker;

// Re-export main functions
pub use alerts::alert_dispatch_task;
pub use ticker::session_ticker_task;
