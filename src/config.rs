//! Configuration management for the metronome engine
//!
//! Runtime configuration is loaded from a JSON file so stream parameters,
//! defaults, and sound assets can be changed without recompilation. A missing
//! or malformed file is never fatal: defaults are used and a warning logged.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::audio::AudioFormat;
use crate::engine::pattern::{BeatKind, BeatPattern};
use crate::engine::tempo::DEFAULT_BPM;
use crate::error::AudioError;

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub audio: AudioConfig,
    pub metronome: MetronomeConfig,
    pub sounds: SoundConfig,
}

/// Output stream parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Sample rate requested from the device and required of every sound
    pub sample_rate: u32,
    /// Interleaved output channels
    pub channel_count: u16,
    /// Device burst size hint; `None` lets the backend choose
    pub frames_per_burst: Option<u32>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            channel_count: 2,
            frames_per_burst: None,
        }
    }
}

impl AudioConfig {
    /// Apply the host's preferred stream values.
    ///
    /// Hosts that know the device's native rate and burst size push them here
    /// before `init`. Zero values are ignored.
    pub fn set_default_stream_values(&mut self, sample_rate: u32, frames_per_burst: u32) {
        if sample_rate > 0 {
            self.sample_rate = sample_rate;
        }
        if frames_per_burst > 0 {
            self.frames_per_burst = Some(frames_per_burst);
        }
    }

    pub fn format(&self) -> Result<AudioFormat, AudioError> {
        AudioFormat::new(self.channel_count, self.sample_rate).ok_or_else(|| {
            AudioError::StreamOpenFailed {
                reason: format!(
                    "invalid stream format: {} channels at {} Hz",
                    self.channel_count, self.sample_rate
                ),
            }
        })
    }
}

/// Playback defaults applied when the engine is created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetronomeConfig {
    pub default_bpm: i32,
    pub default_pattern: BeatPattern,
}

impl Default for MetronomeConfig {
    fn default() -> Self {
        Self {
            default_bpm: DEFAULT_BPM as i32,
            default_pattern: BeatPattern::new(vec![
                BeatKind::Accent,
                BeatKind::Normal,
                BeatKind::Normal,
                BeatKind::Normal,
            ]),
        }
    }
}

/// Sound asset names, resolved by the configured decoder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundConfig {
    /// Directory the WAV decoder reads from
    pub asset_dir: String,
    pub normal: String,
    pub accent: String,
    pub medium: String,
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            asset_dir: "assets/sounds".to_string(),
            normal: "a_m_wood_light_tip.wav".to_string(),
            accent: "a_m_wet_wood_vinyl_hit_to.wav".to_string(),
            medium: "a_m_wood_hit_pi.wav".to_string(),
        }
    }
}

impl SoundConfig {
    /// Asset backing an audible beat kind; `None` for silence.
    pub fn asset_for(&self, kind: BeatKind) -> Option<&str> {
        match kind {
            BeatKind::Normal => Some(&self.normal),
            BeatKind::Accent => Some(&self.accent),
            BeatKind::Medium => Some(&self.medium),
            BeatKind::Silence => None,
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// Falls back to [`AppConfig::default`] when the file is missing or the
    /// JSON is invalid. Missing fields take their default values.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Android builds bundle no config file; the host pushes stream values
    /// through [`AudioConfig::set_default_stream_values`] instead.
    #[cfg(target_os = "android")]
    pub fn load_android() -> Self {
        log::info!("[Config] Using default configuration on Android");
        Self::default()
    }

    /// Load configuration for non-Android platforms
    #[cfg(not(target_os = "android"))]
    pub fn load() -> Self {
        Self::load_from_file("assets/metronome_config.json")
    }
}
