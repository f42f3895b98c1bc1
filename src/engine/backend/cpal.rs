//! CPAL output backend for desktop platforms (Linux, macOS, Windows)
//!
//! `cpal::Stream` is not `Send` on every host, so the stream lives on a small
//! owner thread. `start` waits for that thread to report whether the stream
//! opened; `stop` signals it and joins, which drops the stream.

use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use super::AudioOutput;
use crate::audio::{AudioFormat, Mixer};
use crate::error::{log_audio_error, AudioError};

struct StreamThread {
    stop_tx: mpsc::Sender<()>,
    handle: JoinHandle<()>,
    channel_count: u16,
}

/// Default output device through cpal.
pub struct CpalOutput {
    frames_per_burst: Option<u32>,
    stream: Option<StreamThread>,
}

impl CpalOutput {
    pub fn new(frames_per_burst: Option<u32>) -> Self {
        Self {
            frames_per_burst,
            stream: None,
        }
    }
}

impl AudioOutput for CpalOutput {
    fn start(&mut self, format: AudioFormat, mixer: Mixer) -> Result<u16, AudioError> {
        if self.stream.is_some() {
            return Err(AudioError::AlreadyRunning);
        }

        let (ready_tx, ready_rx) = mpsc::channel();
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let frames_per_burst = self.frames_per_burst;

        let handle = thread::Builder::new()
            .name("metronome-output".to_string())
            .spawn(move || match open_stream(format, frames_per_burst, mixer) {
                Ok((stream, channels)) => {
                    let _ = ready_tx.send(Ok(channels));
                    // Park until stop is requested or the owner goes away.
                    let _ = stop_rx.recv();
                    drop(stream);
                }
                Err(err) => {
                    let _ = ready_tx.send(Err(err));
                }
            })?;

        let result = ready_rx.recv().unwrap_or_else(|_| {
            Err(AudioError::HardwareError {
                details: "output thread exited before opening the stream".to_string(),
            })
        });

        match result {
            Ok(channel_count) => {
                log::info!(
                    "Output stream started: {} ch @ {} Hz",
                    channel_count,
                    format.sample_rate()
                );
                self.stream = Some(StreamThread {
                    stop_tx,
                    handle,
                    channel_count,
                });
                Ok(channel_count)
            }
            Err(err) => {
                let _ = handle.join();
                log_audio_error(&err, "CpalOutput::start");
                Err(err)
            }
        }
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        let Some(stream) = self.stream.take() else {
            return Ok(());
        };

        let _ = stream.stop_tx.send(());
        stream.handle.join().map_err(|_| AudioError::HardwareError {
            details: "output thread panicked".to_string(),
        })?;

        log::info!("Output stream stopped");
        Ok(())
    }

    fn channel_count(&self) -> Option<u16> {
        self.stream.as_ref().map(|stream| stream.channel_count)
    }
}

impl Drop for CpalOutput {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

fn open_stream(
    format: AudioFormat,
    frames_per_burst: Option<u32>,
    mut mixer: Mixer,
) -> Result<(cpal::Stream, u16), AudioError> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| AudioError::StreamOpenFailed {
            reason: "No default output device found".to_string(),
        })?;

    let supported = device
        .default_output_config()
        .map_err(|e| AudioError::StreamOpenFailed {
            reason: format!("Failed to get default output config: {:?}", e),
        })?;

    if supported.sample_format() != cpal::SampleFormat::F32 {
        return Err(AudioError::StreamOpenFailed {
            reason: "Only F32 sample format is currently supported for output".to_string(),
        });
    }

    let stream_config = cpal::StreamConfig {
        channels: format.channel_count(),
        sample_rate: cpal::SampleRate(format.sample_rate()),
        buffer_size: match frames_per_burst {
            Some(frames) => cpal::BufferSize::Fixed(frames),
            None => cpal::BufferSize::Default,
        },
    };
    let channels = stream_config.channels;
    mixer.set_channel_count(channels);

    let err_fn = |err| log::error!("Output stream error: {}", err);

    let stream = device
        .build_output_stream(
            &stream_config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let frames = data.len() / channels as usize;
                mixer.render_audio(data, frames);
            },
            err_fn,
            None,
        )
        .map_err(|e| AudioError::StreamOpenFailed {
            reason: format!("{:?}", e),
        })?;

    stream.play().map_err(|e| AudioError::HardwareError {
        details: format!("Failed to start output stream: {:?}", e),
    })?;

    Ok((stream, channels))
}
