// Error types for the metronome engine
//
// This module defines custom error types for engine setup, playback control and
// sound decoding, providing structured error handling with error codes suitable
// for reporting across the host boundary.

mod audio;
mod decode;

pub use audio::{log_audio_error, AudioError, AudioErrorCodes};
pub use decode::{log_decode_error, DecodeError, DecodeErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// the host boundary.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
