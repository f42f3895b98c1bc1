// Audio engine error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Audio error code constants exposed to the host
///
/// These constants provide a single source of truth for error codes
/// shared between Rust and the host application.
///
/// Error code range: 1001-1009
pub struct AudioErrorCodes {}

impl AudioErrorCodes {
    /// BPM value is invalid (must be > 0)
    pub const BPM_INVALID: i32 = 1001;

    /// Audio engine is already initialized
    pub const ALREADY_RUNNING: i32 = 1002;

    /// Hardware error occurred
    pub const HARDWARE_ERROR: i32 = 1003;

    /// Failed to open audio stream
    pub const STREAM_OPEN_FAILED: i32 = 1004;

    /// Mutex/RwLock was poisoned
    pub const LOCK_POISONED: i32 = 1005;

    /// Beat pattern has no beats
    pub const PATTERN_EMPTY: i32 = 1006;

    /// A required sound could not be decoded
    pub const SOUND_UNAVAILABLE: i32 = 1007;

    /// Mixer cannot accept more tracks
    pub const MIXER_FULL: i32 = 1008;

    /// Android context was not initialized before the output stream was opened
    pub const CONTEXT_NOT_INITIALIZED: i32 = 1009;
}

/// Log an audio error with structured context
///
/// This function logs audio errors with structured fields including:
/// - error_code: Numeric error code for programmatic handling
/// - component: The component where the error occurred
/// - message: Human-readable error message
/// - context: Additional contextual information
///
/// The logging is non-blocking and will not panic on failure.
pub fn log_audio_error(err: &AudioError, context: &str) {
    error!(
        "Audio error in {}: code={}, component=Metronome, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Audio-related errors
///
/// These errors cover engine setup, output stream management and playback
/// control. None of them can originate on the render path.
///
/// Error code ranges: 1001-1009
#[derive(Debug, Clone, PartialEq)]
pub enum AudioError {
    /// BPM value is invalid (must be > 0)
    BpmInvalid { bpm: i32 },

    /// Audio engine is already initialized
    AlreadyRunning,

    /// Hardware error occurred
    HardwareError { details: String },

    /// Failed to open audio stream
    StreamOpenFailed { reason: String },

    /// Mutex/RwLock was poisoned
    LockPoisoned { component: String },

    /// Playback requested with an empty beat pattern
    PatternEmpty,

    /// A required sound failed to decode
    SoundUnavailable { sound: String, reason: String },

    /// Mixer track table is full
    MixerFull { limit: usize },

    /// Android context was not initialized before the output stream was opened
    ContextNotInitialized,
}

impl ErrorCode for AudioError {
    fn code(&self) -> i32 {
        match self {
            AudioError::BpmInvalid { .. } => AudioErrorCodes::BPM_INVALID,
            AudioError::AlreadyRunning => AudioErrorCodes::ALREADY_RUNNING,
            AudioError::HardwareError { .. } => AudioErrorCodes::HARDWARE_ERROR,
            AudioError::StreamOpenFailed { .. } => AudioErrorCodes::STREAM_OPEN_FAILED,
            AudioError::LockPoisoned { .. } => AudioErrorCodes::LOCK_POISONED,
            AudioError::PatternEmpty => AudioErrorCodes::PATTERN_EMPTY,
            AudioError::SoundUnavailable { .. } => AudioErrorCodes::SOUND_UNAVAILABLE,
            AudioError::MixerFull { .. } => AudioErrorCodes::MIXER_FULL,
            AudioError::ContextNotInitialized => AudioErrorCodes::CONTEXT_NOT_INITIALIZED,
        }
    }

    fn message(&self) -> String {
        match self {
            AudioError::BpmInvalid { bpm } => {
                format!("BPM must be greater than 0 (got {})", bpm)
            }
            AudioError::AlreadyRunning => {
                "Metronome already initialized. Call end() first.".to_string()
            }
            AudioError::HardwareError { details } => {
                format!("Hardware error: {}", details)
            }
            AudioError::StreamOpenFailed { reason } => {
                format!("Failed to open audio stream: {}", reason)
            }
            AudioError::LockPoisoned { component } => {
                format!("Lock poisoned on {}", component)
            }
            AudioError::PatternEmpty => {
                "Beat pattern is empty. Call set_pattern() with at least one beat.".to_string()
            }
            AudioError::SoundUnavailable { sound, reason } => {
                format!("Could not load source data for {} sound: {}", sound, reason)
            }
            AudioError::MixerFull { limit } => {
                format!("Mixer already holds the maximum of {} tracks", limit)
            }
            AudioError::ContextNotInitialized => {
                "Android context not initialized. Load the library through JNI first.".to_string()
            }
        }
    }
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AudioError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for AudioError {}

impl From<std::io::Error> for AudioError {
    fn from(err: std::io::Error) -> Self {
        AudioError::HardwareError {
            details: err.to_string(),
        }
    }
}
