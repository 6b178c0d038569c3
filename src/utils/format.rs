//! Countdown display helpers

use crate::state::Phase;

/// `MM:SS`, minutes unbounded
pub fn format_time(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Window title such as `24:59 - Focus (1/4)`
pub fn window_title(time_left_seconds: u32, phase: Phase, current_session: u32, study_sessions: u32) -> String {
    format!(
        "{} - {} ({}/{})",
        format_time(time_left_seconds),
        phase.label(),
        current_session,
        study_sessions
    )
}
