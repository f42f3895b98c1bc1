//! Audio format shared by decoded sounds and the output stream.

use serde::{Deserialize, Serialize};

/// Channel layout and sample rate of a PCM stream.
///
/// Every [`SampleBuffer`](super::SampleBuffer) played by the engine and the
/// output stream itself share one `AudioFormat`. Both fields are strictly
/// positive; use [`AudioFormat::new`] to enforce that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AudioFormat {
    channel_count: u16,
    sample_rate: u32,
}

impl AudioFormat {
    /// Stereo at 48 kHz, the format the engine requests by default.
    pub const STEREO_48K: AudioFormat = AudioFormat {
        channel_count: 2,
        sample_rate: 48_000,
    };

    /// Returns `None` when either field is zero.
    pub fn new(channel_count: u16, sample_rate: u32) -> Option<Self> {
        if channel_count == 0 || sample_rate == 0 {
            return None;
        }
        Some(Self {
            channel_count,
            sample_rate,
        })
    }

    pub fn channel_count(&self) -> u16 {
        self.channel_count
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of whole frames contained in `sample_count` interleaved samples.
    #[inline]
    pub fn frames_in(&self, sample_count: usize) -> usize {
        sample_count / self.channel_count as usize
    }

    /// Number of frames covering `duration_ms` at this sample rate.
    pub fn frames_for_ms(&self, duration_ms: f32) -> usize {
        (self.sample_rate as f32 * duration_ms / 1000.0) as usize
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self::STEREO_48K
    }
}
