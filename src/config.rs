//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};

use clap::Parser;

use crate::services::NotificationPermission;

/// CLI argument parsing structure
#[derive(Debug, Parser)]
#[command(name = "pomodoro-server")]
#[command(about = "A state-managed Pomodoro session server with persisted preferences")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, env = "POMODORO_PORT", default_value = "5001")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, env = "POMODORO_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Local preferences file, used when not signed in to a backend
    #[arg(long, env = "POMODORO_PREFERENCES", default_value = "pomodoro-preferences.json")]
    pub preferences_file: PathBuf,

    /// Preferences backend base URL
    #[arg(long, env = "POMODORO_BACKEND_URL")]
    pub backend_url: Option<String>,

    /// Session token for the preferences backend; enables remote preferences
    #[arg(long, env = "POMODORO_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Desktop notification permission
    #[arg(long, value_enum, env = "POMODORO_NOTIFICATIONS", default_value = "default")]
    pub notification_permission: NotificationPermission,

    /// Command used to show notifications
    #[arg(long, default_value = "notify-send")]
    pub notify_command: String,

    /// Audio player used for the alarm
    #[arg(long, env = "POMODORO_ALARM_COMMAND", default_value = "paplay")]
    pub alarm_command: String,

    /// Alarm sound file
    #[arg(long, env = "POMODORO_ALARM_FILE", default_value = "alarm.wav")]
    pub alarm_file: PathBuf,

    /// Countdown step in milliseconds
    #[arg(long, default_value = "1000", value_parser = clap::value_parser!(u64).range(1..))]
    pub tick_millis: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_millis)
    }

    /// Signed in to the preferences backend
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}
