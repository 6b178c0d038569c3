//! Timer configuration and the persisted preferences record

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Longest phase length, in minutes, whose duration in seconds still fits a `u32`
pub const MAX_LENGTH_MINUTES: u32 = u32::MAX / 60;

/// Session cycle configuration consumed by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimerConfig {
    /// Focus sessions per cycle
    pub study_sessions: u32,
    /// Focus length in minutes
    pub study_length: u32,
    /// Short break length in minutes
    pub break_length: u32,
    /// Long break length in minutes
    pub long_break_length: u32,
    pub enable_long_breaks: bool,
    /// Keep counting down when a break begins
    pub auto_start_breaks: bool,
    /// Keep counting down when the next focus session begins
    pub auto_start_pomodoros: bool,
}

impl TimerConfig {
    /// Focus duration in seconds
    pub fn study_seconds(&self) -> u32 {
        self.study_length.saturating_mul(60)
    }

    /// Short break duration in seconds
    pub fn break_seconds(&self) -> u32 {
        self.break_length.saturating_mul(60)
    }

    /// Long break duration in seconds
    pub fn long_break_seconds(&self) -> u32 {
        self.long_break_length.saturating_mul(60)
    }

    /// Check the bounds on every length and the session count
    pub fn validate(&self) -> Result<(), ValidationError> {
        let fields = [
            ("studySessions", self.study_sessions),
            ("studyLength", self.study_length),
            ("breakLength", self.break_length),
            ("longBreakLength", self.long_break_length),
        ];

        for (field, value) in fields {
            if value < 1 {
                return Err(ValidationError::BelowMinimum { field, value });
            }
        }

        for (field, value) in &fields[1..] {
            if *value > MAX_LENGTH_MINUTES {
                return Err(ValidationError::AboveMaximum {
                    field,
                    value: *value,
                    max: MAX_LENGTH_MINUTES,
                });
            }
        }

        Ok(())
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            study_sessions: 4,
            study_length: 25,
            break_length: 5,
            long_break_length: 15,
            enable_long_breaks: true,
            auto_start_breaks: false,
            auto_start_pomodoros: false,
        }
    }
}

/// Gates for the alarm and notification requests raised when a phase ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertSettings {
    pub sound_enabled: bool,
    /// Alarm volume, 0..=100
    pub sound_volume: u32,
    pub notifications: bool,
}

impl AlertSettings {
    /// Volume scaled to [0, 1]
    pub fn volume(&self) -> f32 {
        (self.sound_volume as f32 / 100.0).clamp(0.0, 1.0)
    }
}

impl Default for AlertSettings {
    fn default() -> Self {
        Preferences::default().alert_settings()
    }
}

/// Everything a user can change on the preferences screen, stored as one flat record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(flatten)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub dark_mode: bool,
    #[serde(default = "default_true")]
    pub notifications: bool,
    #[serde(default = "default_true")]
    pub sound_enabled: bool,
    #[serde(default = "default_sound_volume")]
    pub sound_volume: u32,
}

const fn default_true() -> bool {
    true
}

const fn default_sound_volume() -> u32 {
    75
}

impl Preferences {
    /// Validate the timer fields and the volume range
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.timer.validate()?;
        if self.sound_volume > 100 {
            return Err(ValidationError::VolumeOutOfRange(self.sound_volume));
        }
        Ok(())
    }

    pub fn alert_settings(&self) -> AlertSettings {
        AlertSettings {
            sound_enabled: self.sound_enabled,
            sound_volume: self.sound_volume,
            notifications: self.notifications,
        }
    }
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            timer: TimerConfig::default(),
            dark_mode: false,
            notifications: default_true(),
            sound_enabled: default_true(),
            sound_volume: default_sound_volume(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_new_account_values() {
        let prefs = Preferences::default();
        assert_eq!(prefs.timer.study_sessions, 4);
        assert_eq!(prefs.timer.study_length, 25);
        assert_eq!(prefs.timer.break_length, 5);
        assert_eq!(prefs.timer.long_break_length, 15);
        assert!(prefs.timer.enable_long_breaks);
        assert!(!prefs.timer.auto_start_breaks);
        assert!(!prefs.timer.auto_start_pomodoros);
        assert!(!prefs.dark_mode);
        assert!(prefs.notifications);
        assert!(prefs.sound_enabled);
        assert_eq!(prefs.sound_volume, 75);
    }

    #[test]
    fn test_flat_camel_case_wire_format() {
        let json = serde_json::to_value(Preferences::default()).unwrap();
        assert_eq!(json["studySessions"], 4);
        assert_eq!(json["longBreakLength"], 15);
        assert_eq!(json["autoStartPomodoros"], false);
        assert_eq!(json["soundVolume"], 75);
        assert!(json.get("timer").is_none());
    }

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let prefs: Preferences =
            serde_json::from_str(r#"{"studyLength": 50, "soundEnabled": false}"#).unwrap();
        assert_eq!(prefs.timer.study_length, 50);
        assert_eq!(prefs.timer.study_sessions, 4);
        assert!(!prefs.sound_enabled);
        assert!(prefs.notifications);
        assert_eq!(prefs.sound_volume, 75);
    }

    #[test]
    fn test_validate_rejects_zero_lengths() {
        let mut prefs = Preferences::default();
        prefs.timer.break_length = 0;
        assert_eq!(
            prefs.validate(),
            Err(ValidationError::BelowMinimum { field: "breakLength", value: 0 })
        );
    }

    #[test]
    fn test_validate_rejects_lengths_that_overflow_seconds() {
        let mut prefs = Preferences::default();
        prefs.timer.study_length = 80_000_000;
        assert_eq!(
            prefs.validate(),
            Err(ValidationError::AboveMaximum {
                field: "studyLength",
                value: 80_000_000,
                max: MAX_LENGTH_MINUTES,
            })
        );

        prefs.timer.study_length = MAX_LENGTH_MINUTES;
        assert!(prefs.validate().is_ok());

        // session count has no upper bound
        prefs.timer.study_sessions = u32::MAX;
        assert!(prefs.validate().is_ok());
    }

    #[test]
    fn test_durations_saturate_instead_of_overflowing() {
        let timer = TimerConfig {
            study_length: u32::MAX,
            break_length: 80_000_000,
            long_break_length: MAX_LENGTH_MINUTES,
            ..TimerConfig::default()
        };
        assert_eq!(timer.study_seconds(), u32::MAX);
        assert_eq!(timer.break_seconds(), u32::MAX);
        assert_eq!(timer.long_break_seconds(), MAX_LENGTH_MINUTES * 60);
    }

    #[test]
    fn test_validate_rejects_loud_volume() {
        let prefs = Preferences { sound_volume: 101, ..Preferences::default() };
        assert_eq!(prefs.validate(), Err(ValidationError::VolumeOutOfRange(101)));
        assert!(Preferences::default().validate().is_ok());
    }

    #[test]
    fn test_volume_is_scaled_and_clamped() {
        let alerts = AlertSettings { sound_enabled: true, sound_volume: 75, notifications: true };
        assert!((alerts.volume() - 0.75).abs() < f32::EPSILON);

        let loud = AlertSettings { sound_volume: 250, ..alerts };
        assert_eq!(loud.volume(), 1.0);
    }
}
