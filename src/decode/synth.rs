// Procedural click sounds exposed through the asset decoder interface

use std::collections::HashMap;

use super::AssetDecoder;
use crate::audio::{generate_click_sample, AudioFormat, ClickTone, SampleBuffer};
use crate::config::SoundConfig;
use crate::engine::pattern::BeatKind;
use crate::error::DecodeError;

/// Decoder that synthesizes clicks instead of reading files.
///
/// Each registered asset name maps to a [`ClickTone`]; unknown names are
/// reported as missing, like a file that is not in the resource store.
#[derive(Debug, Clone, Default)]
pub struct SynthAssetDecoder {
    tones: HashMap<String, ClickTone>,
}

impl SynthAssetDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the default tones under the asset names in `sounds`.
    pub fn for_sounds(sounds: &SoundConfig) -> Self {
        let mut decoder = Self::new();
        for kind in BeatKind::ALL {
            if let (Some(asset), Some(tone)) = (sounds.asset_for(kind), tone_for(kind)) {
                decoder.insert(asset, tone);
            }
        }
        decoder
    }

    pub fn insert(&mut self, asset: impl Into<String>, tone: ClickTone) {
        self.tones.insert(asset.into(), tone);
    }

    /// Drop an asset, making later decodes of it fail.
    pub fn remove(&mut self, asset: &str) -> Option<ClickTone> {
        self.tones.remove(asset)
    }
}

fn tone_for(kind: BeatKind) -> Option<ClickTone> {
    match kind {
        BeatKind::Normal => Some(ClickTone::NORMAL),
        BeatKind::Accent => Some(ClickTone::ACCENT),
        BeatKind::Medium => Some(ClickTone::MEDIUM),
        BeatKind::Silence => None,
    }
}

impl AssetDecoder for SynthAssetDecoder {
    fn decode(&self, asset: &str, target: AudioFormat) -> Result<SampleBuffer, DecodeError> {
        let tone = self
            .tones
            .get(asset)
            .ok_or_else(|| DecodeError::AssetNotFound {
                asset: asset.to_string(),
            })?;
        let samples = generate_click_sample(tone, target);
        SampleBuffer::from_decoded(asset, samples, target, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_sounds_registers_audible_kinds() {
        let sounds = SoundConfig::default();
        let decoder = SynthAssetDecoder::for_sounds(&sounds);

        for asset in [&sounds.normal, &sounds.accent, &sounds.medium] {
            let buffer = decoder.decode(asset, AudioFormat::STEREO_48K).unwrap();
            assert!(buffer.frame_count() > 0);
            assert_eq!(buffer.format(), AudioFormat::STEREO_48K);
        }
    }

    #[test]
    fn test_unknown_asset_not_found() {
        let decoder = SynthAssetDecoder::new();
        assert_eq!(
            decoder.decode("missing.wav", AudioFormat::STEREO_48K),
            Err(DecodeError::AssetNotFound {
                asset: "missing.wav".to_string()
            })
        );
    }

    #[test]
    fn test_remove_makes_asset_unavailable() {
        let sounds = SoundConfig::default();
        let mut decoder = SynthAssetDecoder::for_sounds(&sounds);
        assert!(decoder.remove(&sounds.medium).is_some());
        assert!(decoder.decode(&sounds.medium, AudioFormat::STEREO_48K).is_err());
    }

    #[test]
    fn test_decoded_in_target_format() {
        let mut decoder = SynthAssetDecoder::new();
        decoder.insert("tick", ClickTone::NORMAL);
        let mono = AudioFormat::new(1, 44_100).unwrap();
        let buffer = decoder.decode("tick", mono).unwrap();
        assert_eq!(buffer.format(), mono);
        assert_eq!(buffer.frame_count(), 882);
    }
}
