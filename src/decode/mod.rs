//! Asset decoding - turns named sound assets into [`SampleBuffer`]s
//!
//! The engine never touches files or codecs directly. It asks an
//! [`AssetDecoder`] for a buffer in the output format and treats any failure as
//! "sound unavailable".

pub mod synth;
pub mod wav;

pub use synth::SynthAssetDecoder;
pub use wav::WavAssetDecoder;

use crate::audio::{AudioFormat, SampleBuffer};
use crate::error::DecodeError;

/// Resolves an asset name to decoded PCM matching `target` exactly.
///
/// Implementations must not resample or remix; a source in any other format is
/// reported as a mismatch.
pub trait AssetDecoder: Send + Sync {
    fn decode(&self, asset: &str, target: AudioFormat) -> Result<SampleBuffer, DecodeError>;
}
