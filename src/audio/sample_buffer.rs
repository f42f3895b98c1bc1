//! Immutable decoded sound data.

use super::format::AudioFormat;
use crate::error::DecodeError;

/// Decoded interleaved PCM samples plus their format.
///
/// A buffer is created once per distinct sound at engine setup and never
/// mutated afterwards. Wrap it in an `Arc` to share it between players.
/// Construction guarantees at least one whole frame, so a player holding a
/// buffer always has something to read.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    samples: Box<[f32]>,
    format: AudioFormat,
    frame_count: usize,
}

impl SampleBuffer {
    /// Build a buffer from interleaved samples already in `format`.
    ///
    /// A trailing partial frame is dropped. Returns `None` if no whole frame
    /// remains.
    pub fn new(mut samples: Vec<f32>, format: AudioFormat) -> Option<Self> {
        let frame_count = format.frames_in(samples.len());
        if frame_count == 0 {
            return None;
        }
        samples.truncate(frame_count * format.channel_count() as usize);
        Some(Self {
            samples: samples.into_boxed_slice(),
            format,
            frame_count,
        })
    }

    /// Validate a decoder's output against the requested target format.
    ///
    /// No sample-rate conversion or channel remixing is attempted: any
    /// mismatch is a configuration error.
    pub fn from_decoded(
        asset: &str,
        samples: Vec<f32>,
        source: AudioFormat,
        target: AudioFormat,
    ) -> Result<Self, DecodeError> {
        if samples.is_empty() {
            return Err(DecodeError::EmptyPayload {
                asset: asset.to_string(),
            });
        }
        if source.sample_rate() != target.sample_rate() {
            return Err(DecodeError::SampleRateMismatch {
                asset: asset.to_string(),
                expected: target.sample_rate(),
                found: source.sample_rate(),
            });
        }
        if source.channel_count() != target.channel_count() {
            return Err(DecodeError::ChannelCountMismatch {
                asset: asset.to_string(),
                expected: target.channel_count(),
                found: source.channel_count(),
            });
        }

        Self::new(samples, target).ok_or_else(|| DecodeError::EmptyPayload {
            asset: asset.to_string(),
        })
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Samples of one frame, one per channel.
    #[inline]
    pub fn frame(&self, index: usize) -> &[f32] {
        let channels = self.format.channel_count() as usize;
        let start = index * channels;
        &self.samples[start..start + channels]
    }
}
