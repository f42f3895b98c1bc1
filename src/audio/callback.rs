//! Audio Output Callback - Oboe trait implementation driving the mixer
//!
//! Oboe hands the callback a slice of stereo frames. The mixer renders into a
//! flat interleaved scratch buffer, which is then copied frame by frame into
//! Oboe's tuple layout.
//!
//! # Real-Time Safety
//! - Scratch storage is allocated once, at construction
//! - Large callbacks are rendered in scratch-sized chunks
//! - No locks: players are steered through atomics only

use oboe::{AudioOutputCallback, AudioOutputStreamSafe, DataCallbackResult};

use super::mixer::Mixer;

/// Frames rendered per mixer pass.
const CHUNK_FRAMES: usize = 1024;
const CHANNELS: usize = 2;

/// Output callback that owns the mixer for the lifetime of the stream.
pub struct OutputCallback {
    mixer: Mixer,
    scratch: Vec<f32>,
}

impl OutputCallback {
    pub fn new(mut mixer: Mixer) -> Self {
        mixer.set_channel_count(CHANNELS as u16);
        Self {
            mixer,
            scratch: vec![0.0; CHUNK_FRAMES * CHANNELS],
        }
    }
}

impl AudioOutputCallback for OutputCallback {
    type FrameType = (f32, oboe::Stereo);

    fn on_audio_ready(
        &mut self,
        _stream: &mut dyn AudioOutputStreamSafe,
        frames: &mut [(f32, f32)],
    ) -> DataCallbackResult {
        for chunk in frames.chunks_mut(CHUNK_FRAMES) {
            let len = chunk.len() * CHANNELS;
            self.mixer.render_audio(&mut self.scratch[..len], chunk.len());

            for (frame, pair) in chunk.iter_mut().zip(self.scratch.chunks_exact(CHANNELS)) {
                *frame = (pair[0], pair[1]);
            }
        }

        DataCallbackResult::Continue
    }
}
