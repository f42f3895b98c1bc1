// Sound decoding error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Decode error code constants
///
/// Error code range: 2001-2006
pub struct DecodeErrorCodes {}

impl DecodeErrorCodes {
    /// Asset does not exist in the resource store
    pub const ASSET_NOT_FOUND: i32 = 2001;

    /// Asset exists but could not be read
    pub const READ_FAILED: i32 = 2002;

    /// Decoder produced zero samples
    pub const EMPTY_PAYLOAD: i32 = 2003;

    /// Source sample rate differs from the target format
    pub const SAMPLE_RATE_MISMATCH: i32 = 2004;

    /// Source channel count differs from the target format
    pub const CHANNEL_COUNT_MISMATCH: i32 = 2005;

    /// Asset encoding is not supported
    pub const UNSUPPORTED_FORMAT: i32 = 2006;
}

/// Log a decode error with structured context
pub fn log_decode_error(err: &DecodeError, context: &str) {
    error!(
        "Decode error in {}: code={}, component=AssetDecoder, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors reported by the asset decode service
///
/// Decoding never resamples or remixes: a source that does not match the
/// target [`AudioFormat`](crate::audio::AudioFormat) is rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeError {
    AssetNotFound { asset: String },

    ReadFailed { asset: String, reason: String },

    EmptyPayload { asset: String },

    SampleRateMismatch {
        asset: String,
        expected: u32,
        found: u32,
    },

    ChannelCountMismatch {
        asset: String,
        expected: u16,
        found: u16,
    },

    UnsupportedFormat { asset: String, reason: String },
}

impl ErrorCode for DecodeError {
    fn code(&self) -> i32 {
        match self {
            DecodeError::AssetNotFound { .. } => DecodeErrorCodes::ASSET_NOT_FOUND,
            DecodeError::ReadFailed { .. } => DecodeErrorCodes::READ_FAILED,
            DecodeError::EmptyPayload { .. } => DecodeErrorCodes::EMPTY_PAYLOAD,
            DecodeError::SampleRateMismatch { .. } => DecodeErrorCodes::SAMPLE_RATE_MISMATCH,
            DecodeError::ChannelCountMismatch { .. } => DecodeErrorCodes::CHANNEL_COUNT_MISMATCH,
            DecodeError::UnsupportedFormat { .. } => DecodeErrorCodes::UNSUPPORTED_FORMAT,
        }
    }

    fn message(&self) -> String {
        match self {
            DecodeError::AssetNotFound { asset } => format!("Asset {} not found", asset),
            DecodeError::ReadFailed { asset, reason } => {
                format!("Failed to read {}: {}", asset, reason)
            }
            DecodeError::EmptyPayload { asset } => {
                format!("Decoding {} produced no samples", asset)
            }
            DecodeError::SampleRateMismatch {
                asset,
                expected,
                found,
            } => format!(
                "{} has sample rate {} Hz, expected {} Hz",
                asset, found, expected
            ),
            DecodeError::ChannelCountMismatch {
                asset,
                expected,
                found,
            } => format!("{} has {} channels, expected {}", asset, found, expected),
            DecodeError::UnsupportedFormat { asset, reason } => {
                format!("Unsupported encoding in {}: {}", asset, reason)
            }
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DecodeError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for DecodeError {}
