// WAV asset decoding backed by hound

use std::path::{Path, PathBuf};

use super::AssetDecoder;
use crate::audio::{AudioFormat, SampleBuffer};
use crate::error::DecodeError;

/// Loads `.wav` assets from a directory.
///
/// Integer PCM is scaled to [-1.0, 1.0]; float PCM is passed through.
#[derive(Debug, Clone)]
pub struct WavAssetDecoder {
    root: PathBuf,
}

impl WavAssetDecoder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetDecoder for WavAssetDecoder {
    fn decode(&self, asset: &str, target: AudioFormat) -> Result<SampleBuffer, DecodeError> {
        let path = self.root.join(asset);
        if !path.is_file() {
            return Err(DecodeError::AssetNotFound {
                asset: asset.to_string(),
            });
        }

        let (samples, source) = read_wav(asset, &path)?;
        let buffer = SampleBuffer::from_decoded(asset, samples, source, target)?;

        log::debug!(
            "Decoded {} ({} frames, {} ch @ {} Hz)",
            asset,
            buffer.frame_count(),
            source.channel_count(),
            source.sample_rate()
        );
        Ok(buffer)
    }
}

fn read_wav(asset: &str, path: &Path) -> Result<(Vec<f32>, AudioFormat), DecodeError> {
    let read_failed = |err: hound::Error| DecodeError::ReadFailed {
        asset: asset.to_string(),
        reason: err.to_string(),
    };

    let mut reader = hound::WavReader::open(path).map_err(|err| match err {
        hound::Error::FormatError(reason) => DecodeError::UnsupportedFormat {
            asset: asset.to_string(),
            reason: reason.to_string(),
        },
        hound::Error::Unsupported => DecodeError::UnsupportedFormat {
            asset: asset.to_string(),
            reason: "unsupported wav encoding".to_string(),
        },
        other => read_failed(other),
    })?;
    let spec = reader.spec();

    let source = AudioFormat::new(spec.channels, spec.sample_rate).ok_or_else(|| {
        DecodeError::UnsupportedFormat {
            asset: asset.to_string(),
            reason: format!(
                "{} channels at {} Hz",
                spec.channels, spec.sample_rate
            ),
        }
    })?;

    let samples = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|sample| sample.map_err(read_failed))
            .collect::<Result<Vec<f32>, DecodeError>>()?,
        hound::SampleFormat::Int => match spec.bits_per_sample {
            bits @ (8 | 16 | 24 | 32) => {
                let max = ((1i64 << (bits - 1)) - 1) as f32;
                reader
                    .samples::<i32>()
                    .map(|sample| sample.map(|value| value as f32 / max).map_err(read_failed))
                    .collect::<Result<Vec<f32>, DecodeError>>()?
            }
            other => {
                return Err(DecodeError::UnsupportedFormat {
                    asset: asset.to_string(),
                    reason: format!("{} bits per sample", other),
                })
            }
        },
    };

    Ok((samples, source))
}
