//! Side-effect sinks
//!
//! Alarm playback and desktop notifications, driven by controller events.

pub mod alarm;
pub mod notifier;

// Re-export main types
pub use alarm::AlarmPlayer;
pub use notifier::{Delivery, NotificationPermission, Notifier};
