//! Output backends - hand a [`Mixer`] to an audio stream.
//!
//! A backend opens a stream in the requested format, tells the mixer how many
//! channels the stream actually has, and moves the mixer into the stream's
//! render callback. From then on the mixer is only touched by the render
//! thread.

use crate::audio::{AudioFormat, Mixer};
use crate::config::AudioConfig;
use crate::error::AudioError;

/// Platform audio output consumed by the metronome.
pub trait AudioOutput: Send {
    /// Open and start a stream that renders `mixer`.
    ///
    /// Returns the stream's channel count. Fails with `AlreadyRunning` if a
    /// stream is already open.
    fn start(&mut self, format: AudioFormat, mixer: Mixer) -> Result<u16, AudioError>;

    /// Stop and close the stream. Safe to call when nothing is open.
    fn stop(&mut self) -> Result<(), AudioError>;

    /// Channel count of the open stream, if any.
    fn channel_count(&self) -> Option<u16>;
}

#[cfg(target_os = "android")]
mod oboe;
#[cfg(target_os = "android")]
pub use self::oboe::{mark_context_initialized, OboeOutput};

#[cfg(not(target_os = "android"))]
mod cpal;
#[cfg(not(target_os = "android"))]
pub use self::cpal::CpalOutput;

mod stub;
pub use stub::{StubOutput, StubRenderHandle};

/// Real device output for the current platform.
pub fn platform_output(config: &AudioConfig) -> Box<dyn AudioOutput> {
    #[cfg(target_os = "android")]
    {
        Box::new(OboeOutput::new(config.frames_per_burst))
    }

    #[cfg(not(target_os = "android"))]
    {
        Box::new(CpalOutput::new(config.frames_per_burst))
    }
}
