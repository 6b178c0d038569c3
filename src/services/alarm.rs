//! Alarm playback through an external audio player

use std::path::PathBuf;

use tokio::process::Command;
use tracing::{debug, info};

/// Full-scale volume understood by `paplay --volume`
const PLAYER_FULL_VOLUME: f32 = 65536.0;

/// Plays the alarm file with a PulseAudio-compatible player
#[derive(Debug, Clone)]
pub struct AlarmPlayer {
    pub command: String,
    pub sound_file: PathBuf,
}

impl AlarmPlayer {
    pub fn new(command: impl Into<String>, sound_file: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            sound_file: sound_file.into(),
        }
    }

    /// Player arguments for `volume` in [0, 1]
    pub fn args(&self, volume: f32) -> Vec<String> {
        let scaled = (volume.clamp(0.0, 1.0) * PLAYER_FULL_VOLUME).round() as u32;
        vec![
            format!("--volume={}", scaled),
            self.sound_file.display().to_string(),
        ]
    }

    /// Play the alarm and wait for the player to exit
    pub async fn play(&self, volume: f32) -> Result<(), String> {
        debug!("Playing alarm {} at volume {:.2}", self.sound_file.display(), volume);

        let output = Command::new(&self.command)
            .args(self.args(volume))
            .output()
            .await
            .map_err(|e| format!("Failed to execute {}: {}", self.command, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!("{} failed: {}", self.command, stderr));
        }

        info!("Alarm played");
        Ok(())
    }
}
