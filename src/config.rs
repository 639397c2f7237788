//! Application configuration
//!
//! Loaded from a TOML file in the platform config directory when present,
//! otherwise built from the defaults in [`crate::constants`].

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{FRAME_SAMPLES, JITTER_FRAMES, SAMPLE_RATE, SEND_QUEUE_DEPTH};
use crate::error::{Error, Result};

/// Streaming core parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Sample rate in Hz shared by capture, transport, and playback
    pub sample_rate: u32,

    /// Samples per mono frame
    pub frame_samples: usize,

    /// Playback buffer capacity in frames (the jitter budget)
    pub jitter_frames: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            frame_samples: FRAME_SAMPLES,
            jitter_frames: JITTER_FRAMES,
        }
    }
}

impl StreamConfig {
    /// Duration of one frame in seconds
    pub fn frame_duration(&self) -> f64 {
        self.frame_samples as f64 / self.sample_rate as f64
    }

    /// Serialized frame size in bytes
    pub fn frame_bytes(&self) -> usize {
        self.frame_samples * std::mem::size_of::<f32>()
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(Error::Config("sample_rate must be positive".into()));
        }
        if self.frame_samples == 0 {
            return Err(Error::Config("frame_samples must be positive".into()));
        }
        if self.jitter_frames == 0 {
            return Err(Error::Config("jitter_frames must be positive".into()));
        }
        Ok(())
    }
}

/// Mesh group membership
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupConfig {
    /// Group name shared out-of-band by every participant of one broadcast
    pub name: String,
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            name: "RadioGroup".to_string(),
        }
    }
}

/// Mesh transport tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshConfig {
    /// Depth of the non-blocking send queue, in packets
    pub send_queue_depth: usize,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            send_queue_depth: SEND_QUEUE_DEPTH,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub stream: StreamConfig,
    pub group: GroupConfig,
    pub mesh: MeshConfig,
}

impl AppConfig {
    /// Platform config file location, when one can be determined
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "mesh-radio").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load from the platform config dir, falling back to defaults when no
    /// file exists.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load and validate a specific TOML file
    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.stream.validate()?;
        if self.group.name.is_empty() {
            return Err(Error::Config("group name must not be empty".into()));
        }
        if self.mesh.send_queue_depth == 0 {
            return Err(Error::Config("send_queue_depth must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.stream.frame_bytes(), FRAME_SAMPLES * 4);
    }

    #[test]
    fn test_frame_duration() {
        let config = StreamConfig {
            sample_rate: 44_100,
            frame_samples: 1024,
            jitter_frames: 6,
        };
        let duration = config.frame_duration();
        assert!((duration - 0.02322).abs() < 1e-4);
    }

    #[test]
    fn test_parse_toml() {
        let parsed: AppConfig = toml::from_str(
            r#"
            [stream]
            sample_rate = 48000
            frame_samples = 512

            [group]
            name = "late-night-show"
            "#,
        )
        .unwrap();

        assert_eq!(parsed.stream.sample_rate, 48_000);
        assert_eq!(parsed.stream.frame_samples, 512);
        assert_eq!(parsed.stream.jitter_frames, JITTER_FRAMES);
        assert_eq!(parsed.group.name, "late-night-show");
        assert_eq!(parsed.mesh.send_queue_depth, SEND_QUEUE_DEPTH);
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_frame_samples() {
        let mut config = AppConfig::default();
        config.stream.frame_samples = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_group_name() {
        let mut config = AppConfig::default();
        config.group.name.clear();
        assert!(config.validate().is_err());
    }
}
