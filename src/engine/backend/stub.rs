//! Device-less output used for tests and offline rendering.
//!
//! There is no audio thread: whoever holds the [`StubRenderHandle`] pulls
//! audio by calling `render`, playing the role of the hardware callback.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::AudioOutput;
use crate::audio::{AudioFormat, Mixer};
use crate::error::AudioError;

#[derive(Default)]
struct StubStream {
    mixer: Option<Mixer>,
    format: Option<AudioFormat>,
    opens: u32,
}

fn lock(shared: &Mutex<StubStream>) -> MutexGuard<'_, StubStream> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Output backend with no device behind it.
pub struct StubOutput {
    shared: Arc<Mutex<StubStream>>,
    fail_with: Option<String>,
}

/// Pulls audio from a [`StubOutput`]'s stream.
#[derive(Clone)]
pub struct StubRenderHandle {
    shared: Arc<Mutex<StubStream>>,
}

impl StubOutput {
    pub fn new() -> (Self, StubRenderHandle) {
        let shared = Arc::new(Mutex::new(StubStream::default()));
        (
            Self {
                shared: Arc::clone(&shared),
                fail_with: None,
            },
            StubRenderHandle { shared },
        )
    }

    /// An output whose stream never opens.
    pub fn failing(reason: impl Into<String>) -> (Self, StubRenderHandle) {
        let (mut output, handle) = Self::new();
        output.fail_with = Some(reason.into());
        (output, handle)
    }
}

impl AudioOutput for StubOutput {
    fn start(&mut self, format: AudioFormat, mut mixer: Mixer) -> Result<u16, AudioError> {
        if let Some(reason) = &self.fail_with {
            return Err(AudioError::StreamOpenFailed {
                reason: reason.clone(),
            });
        }

        let mut stream = lock(&self.shared);
        if stream.mixer.is_some() {
            return Err(AudioError::AlreadyRunning);
        }

        mixer.set_channel_count(format.channel_count());
        stream.mixer = Some(mixer);
        stream.format = Some(format);
        stream.opens += 1;
        Ok(format.channel_count())
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        lock(&self.shared).mixer = None;
        Ok(())
    }

    fn channel_count(&self) -> Option<u16> {
        let stream = lock(&self.shared);
        stream
            .mixer
            .as_ref()
            .and(stream.format)
            .map(|format| format.channel_count())
    }
}

impl StubRenderHandle {
    /// Render `num_frames` frames of interleaved audio.
    ///
    /// Yields silence once the stream is closed, and an empty buffer if no
    /// stream was ever opened.
    pub fn render(&self, num_frames: usize) -> Vec<f32> {
        let channels = self.format().map_or(0, |f| f.channel_count() as usize);
        let mut output = vec![0.0; num_frames * channels];
        self.render_into(&mut output);
        output
    }

    /// Render as many whole frames as fit in `output`; returns frames written.
    pub fn render_into(&self, output: &mut [f32]) -> usize {
        let mut stream = lock(&self.shared);
        let channels = stream.format.map_or(0, |f| f.channel_count() as usize);
        if channels == 0 {
            output.fill(0.0);
            return 0;
        }

        let frames = output.len() / channels;
        match stream.mixer.as_mut() {
            Some(mixer) => mixer.render_audio(output, frames),
            None => output.fill(0.0),
        }
        frames
    }

    /// Whether a stream is currently open.
    pub fn is_open(&self) -> bool {
        lock(&self.shared).mixer.is_some()
    }

    /// Format of the most recently opened stream.
    pub fn format(&self) -> Option<AudioFormat> {
        lock(&self.shared).format
    }

    /// Number of times a stream has been opened.
    pub fn open_count(&self) -> u32 {
        lock(&self.shared).opens
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::Renderable;

    struct Constant(f32);

    impl Renderable for Constant {
        fn render(&mut self, output: &mut [f32], _num_frames: usize, _channel_count: usize) {
            output.iter_mut().for_each(|s| *s += self.0);
        }
    }

    fn mixer_with(value: f32) -> Mixer {
        let mut mixer = Mixer::new();
        mixer.add_track(Constant(value)).unwrap();
        mixer
    }

    #[test]
    fn test_render_before_start_is_empty() {
        let (_output, handle) = StubOutput::new();
        assert!(handle.render(16).is_empty());
        assert!(!handle.is_open());
    }

    #[test]
    fn test_start_sets_channel_count_and_renders() {
        let (mut output, handle) = StubOutput::new();
        let channels = output.start(AudioFormat::STEREO_48K, mixer_with(0.25)).unwrap();
        assert_eq!(channels, 2);
        assert_eq!(output.channel_count(), Some(2));

        let audio = handle.render(4);
        assert_eq!(audio, vec![0.25; 8]);
    }

    #[test]
    fn test_render_after_stop_is_silence() {
        let (mut output, handle) = StubOutput::new();
        output.start(AudioFormat::STEREO_48K, mixer_with(0.5)).unwrap();
        output.stop().unwrap();

        assert_eq!(output.channel_count(), None);
        assert_eq!(handle.render(3), vec![0.0; 6]);
    }

    #[test]
    fn test_double_start_rejected() {
        let (mut output, handle) = StubOutput::new();
        output.start(AudioFormat::STEREO_48K, Mixer::new()).unwrap();
        assert_eq!(
            output.start(AudioFormat::STEREO_48K, Mixer::new()),
            Err(AudioError::AlreadyRunning)
        );
        assert_eq!(handle.open_count(), 1);
    }

    #[test]
    fn test_stop_without_start_is_safe() {
        let (mut output, _handle) = StubOutput::new();
        assert!(output.stop().is_ok());
    }

    #[test]
    fn test_failing_output() {
        let (mut output, handle) = StubOutput::failing("no device");
        assert_eq!(
            output.start(AudioFormat::STEREO_48K, Mixer::new()),
            Err(AudioError::StreamOpenFailed {
                reason: "no device".to_string()
            })
        );
        assert!(!handle.is_open());
    }
}
