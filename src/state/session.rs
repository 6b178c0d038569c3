//! Session state and the events the controller emits

use serde::{Deserialize, Serialize};

/// Which countdown is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Focus,
    Break,
    LongBreak,
}

impl Phase {
    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Focus => "Focus",
            Phase::Break => "Break",
            Phase::LongBreak => "Long Break",
        }
    }

    pub fn is_break(&self) -> bool {
        !matches!(self, Phase::Focus)
    }
}

/// Live countdown state, owned by the controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub time_left_seconds: u32,
    pub is_running: bool,
    pub phase: Phase,
    /// 1-based index of the focus session in the current cycle
    pub current_session: u32,
    pub completed_sessions: u32,
    /// Length of the current phase, fixed when the phase was entered
    pub phase_duration_seconds: u32,
}

impl SessionState {
    /// Fresh state at the start of a focus session
    pub fn new(study_seconds: u32) -> Self {
        Self {
            time_left_seconds: study_seconds,
            is_running: false,
            phase: Phase::Focus,
            current_session: 1,
            completed_sessions: 0,
            phase_duration_seconds: study_seconds,
        }
    }

    /// Enter `phase` with a full countdown of `duration_seconds`
    pub fn enter(&mut self, phase: Phase, duration_seconds: u32) {
        self.phase = phase;
        self.time_left_seconds = duration_seconds;
        self.phase_duration_seconds = duration_seconds;
    }
}

/// Observations emitted to registered sinks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimerEvent {
    TimeUpdated { time_left_seconds: u32 },
    PhaseEnded { phase: Phase },
    PhaseStarted { phase: Phase, duration_seconds: u32 },
    /// Volume in [0, 1]
    AlarmRequested { volume: f32 },
    NotificationRequested { title: String, body: String },
    /// The last break of the cycle ended
    SessionCompleted,
}

impl TimerEvent {
    /// Name used for server-sent events
    pub fn name(&self) -> &'static str {
        match self {
            TimerEvent::TimeUpdated { .. } => "time_updated",
            TimerEvent::PhaseEnded { .. } => "phase_ended",
            TimerEvent::PhaseStarted { .. } => "phase_started",
            TimerEvent::AlarmRequested { .. } => "alarm_requested",
            TimerEvent::NotificationRequested { .. } => "notification_requested",
            TimerEvent::SessionCompleted => "session_completed",
        }
    }
}
