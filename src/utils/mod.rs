//! Utility functions module
//!
//! Countdown formatting and process signal handling.

pub mod format;
pub mod signals;

// Re-export main functions
pub use format::{format_time, window_title};
pub use signals::shutdown_signal;
