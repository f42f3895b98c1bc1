//! Oboe output backend for Android.

use std::sync::atomic::{AtomicBool, Ordering};

use oboe::{
    AudioStream, AudioStreamAsync, AudioStreamBuilder, Output, PerformanceMode, SharingMode,
};

use super::AudioOutput;
use crate::audio::callback::OutputCallback;
use crate::audio::{AudioFormat, Mixer};
use crate::error::{log_audio_error, AudioError};

const CHANNELS: u16 = 2;

static CONTEXT_READY: AtomicBool = AtomicBool::new(false);

/// Record that `ndk_context` has been initialized (done in `JNI_OnLoad`).
pub fn mark_context_initialized() {
    CONTEXT_READY.store(true, Ordering::Release);
}

/// Low-latency exclusive stereo output through Oboe.
pub struct OboeOutput {
    frames_per_burst: Option<u32>,
    stream: Option<AudioStreamAsync<Output, OutputCallback>>,
}

// SAFETY: the stream is only touched through `&mut self`, from one control thread at a time.
unsafe impl Send for OboeOutput {}

impl OboeOutput {
    pub fn new(frames_per_burst: Option<u32>) -> Self {
        Self {
            frames_per_burst,
            stream: None,
        }
    }
}

impl AudioOutput for OboeOutput {
    fn start(&mut self, format: AudioFormat, mixer: Mixer) -> Result<u16, AudioError> {
        if !CONTEXT_READY.load(Ordering::Acquire) {
            return Err(AudioError::ContextNotInitialized);
        }
        if self.stream.is_some() {
            return Err(AudioError::AlreadyRunning);
        }
        if format.channel_count() != CHANNELS {
            return Err(AudioError::StreamOpenFailed {
                reason: format!(
                    "Oboe output is stereo only, requested {} channels",
                    format.channel_count()
                ),
            });
        }

        let mut builder = AudioStreamBuilder::default()
            .set_performance_mode(PerformanceMode::LowLatency)
            .set_sharing_mode(SharingMode::Exclusive)
            .set_direction::<Output>()
            .set_sample_rate(format.sample_rate() as i32)
            .set_channel_count::<oboe::Stereo>()
            .set_format::<f32>();
        if let Some(frames) = self.frames_per_burst {
            builder = builder.set_frames_per_callback(frames as i32);
        }

        let mut stream = builder
            .set_callback(OutputCallback::new(mixer))
            .open_stream()
            .map_err(|e| AudioError::StreamOpenFailed {
                reason: format!("Output stream: {:?}", e),
            })?;

        stream.start().map_err(|e| {
            let err = AudioError::HardwareError {
                details: format!("Failed to start output stream: {:?}", e),
            };
            log_audio_error(&err, "OboeOutput::start");
            err
        })?;

        log::info!("Oboe output started @ {} Hz", format.sample_rate());
        self.stream = Some(stream);
        Ok(CHANNELS)
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        if let Some(mut stream) = self.stream.take() {
            stream.stop().map_err(|e| AudioError::HardwareError {
                details: format!("Failed to stop output stream: {:?}", e),
            })?;
            log::info!("Oboe output stopped");
        }
        Ok(())
    }

    fn channel_count(&self) -> Option<u16> {
        self.stream.as_ref().map(|_| CHANNELS)
    }
}

impl Drop for OboeOutput {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
