use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{GhostiesError, Result};

/// Top-level configuration structure for the application.
///
/// Built once at startup and handed to each component by reference; nothing
/// mutates it afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub audio: AudioConfig,
    pub window: WindowConfig,
    pub animation: AnimationConfig,
}

impl AppConfig {
    /// Parses a configuration document. Missing sections and fields fall back
    /// to their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses the configuration file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Rejects values the audio and render paths cannot operate with.
    pub fn validate(&self) -> Result<()> {
        let exponent = self.audio.exponent;
        if !exponent.is_finite() || exponent <= 0.0 {
            return Err(GhostiesError::InvalidConfig(format!(
                "exponent must be a positive finite number, got {exponent}"
            )));
        }
        if self.audio.block_frames == 0 {
            return Err(GhostiesError::InvalidConfig(
                "audio block size must hold at least one frame".to_string(),
            ));
        }
        if self.window.width == 0 || self.window.height == 0 {
            return Err(GhostiesError::InvalidConfig(format!(
                "window must have a non-zero size, got {}x{}",
                self.window.width, self.window.height
            )));
        }
        if self.window.target_fps == 0 {
            return Err(GhostiesError::InvalidConfig(
                "target frame rate must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration specific to the audio subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub soundtrack: PathBuf,
    /// Power-law exponent applied to every sample. `1.0` leaves audio untouched.
    pub exponent: f32,
    /// Stereo frames handed to the processor per callback.
    pub block_frames: usize,
    /// Re-queue the soundtrack when it reaches the end.
    pub looping: bool,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            soundtrack: PathBuf::from("resources/soundtrack.mp3"),
            exponent: 1.0,
            block_frames: 1024,
            looping: true,
        }
    }
}

/// Window and frame pacing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    /// Logical screen width that scene coordinates are expressed in.
    pub width: u32,
    /// Logical screen height that scene coordinates are expressed in.
    pub height: u32,
    pub target_fps: u32,
    /// Opacity of the black overlay painted every frame; lower leaves longer trails.
    pub fade_alpha: u8,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "talking ghosties".to_string(),
            width: 800,
            height: 450,
            target_fps: 60,
            fade_alpha: 30,
        }
    }
}

/// Constants that shape ghost motion and mouth response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    pub left_sway: f32,
    pub right_sway: f32,
    pub bob: f32,
    /// Phase offset of the right ghost relative to the left one, in radians.
    pub phase_shift: f32,
    pub mouth_base: f32,
    pub mouth_gain: f32,
    pub mouth_max: f32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            left_sway: 10.0,
            right_sway: 20.0,
            bob: 50.0,
            phase_shift: 1.0,
            mouth_base: 10.0,
            mouth_gain: 800.0,
            mouth_max: 100.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.audio.exponent, 1.0);
        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.height, 450);
    }

    #[test]
    fn partial_documents_fill_in_defaults() {
        let config = AppConfig::from_json_str(r#"{ "audio": { "exponent": 2.5 } }"#).unwrap();

        assert_eq!(config.audio.exponent, 2.5);
        assert_eq!(config.audio.block_frames, 1024);
        assert_eq!(config.window, WindowConfig::default());
        assert_eq!(config.animation, AnimationConfig::default());
    }

    #[test]
    fn rejects_non_positive_exponent() {
        let mut config = AppConfig::default();
        config.audio.exponent = 0.0;
        assert!(matches!(
            config.validate(),
            Err(GhostiesError::InvalidConfig(_))
        ));

        config.audio.exponent = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_frame_rate() {
        let mut config = AppConfig::default();
        config.window.target_fps = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = AppConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, GhostiesError::Config(_)));
    }
}
