//! Click synthesis - built-in beat sounds
//!
//! Produces short percussive clicks for the three audible beat kinds so the
//! engine can run without any asset files (CLI render mode, tests, desktop
//! demos). Output is deterministic: the noise component uses a fixed seed, so
//! identical tones always yield identical samples.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::format::AudioFormat;

/// Decay time constant relative to click length; 5 time constants fit in one click.
const DECAY_DIVISOR: f32 = 5.0;

/// Parameters of one synthesized click.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClickTone {
    pub frequency_hz: f32,
    pub duration_ms: f32,
    /// Peak amplitude, kept below 1.0 so two overlapping clicks stay sane.
    pub gain: f32,
    /// Share of white noise mixed into the sine, in [0, 1].
    pub noise: f32,
}

impl ClickTone {
    pub const ACCENT: ClickTone = ClickTone {
        frequency_hz: 1500.0,
        duration_ms: 30.0,
        gain: 0.9,
        noise: 0.25,
    };

    pub const NORMAL: ClickTone = ClickTone {
        frequency_hz: 1000.0,
        duration_ms: 20.0,
        gain: 0.6,
        noise: 0.35,
    };

    pub const MEDIUM: ClickTone = ClickTone {
        frequency_hz: 1250.0,
        duration_ms: 25.0,
        gain: 0.75,
        noise: 0.3,
    };
}

/// Generate an interleaved click in `format`.
///
/// The same mono waveform is written to every channel. Every sample is within
/// [-1.0, 1.0]. Always returns at least one frame.
pub fn generate_click_sample(tone: &ClickTone, format: AudioFormat) -> Vec<f32> {
    let num_frames = format.frames_for_ms(tone.duration_ms).max(1);
    let channels = format.channel_count() as usize;
    let sample_rate = format.sample_rate() as f32;

    let mut rng = StdRng::seed_from_u64(42);
    let noise = tone.noise.clamp(0.0, 1.0);
    let tau = num_frames as f32 / DECAY_DIVISOR;

    let mut samples = Vec::with_capacity(num_frames * channels);
    for n in 0..num_frames {
        let t = n as f32 / sample_rate;
        let sine = (2.0 * std::f32::consts::PI * tone.frequency_hz * t).sin();
        let white: f32 = rng.gen_range(-1.0..1.0);
        let envelope = (-(n as f32) / tau).exp();

        let value = (((1.0 - noise) * sine + noise * white) * envelope * tone.gain).clamp(-1.0, 1.0);
        for _ in 0..channels {
            samples.push(value);
        }
    }

    samples
}
