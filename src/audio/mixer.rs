//! Mixer - sums every registered track into the output buffer
//!
//! The mixer is moved into the output stream's render callback once setup is
//! complete. `render_audio` runs on the real-time thread: it zeroes the output
//! region and asks each track to add its contribution in place. Summation is
//! plain addition, there is no clipping or limiting stage.

use crate::error::AudioError;

/// Upper bound on registered tracks; storage is reserved up front.
pub const MAX_TRACKS: usize = 100;

/// Anything that can add audio into an interleaved output buffer.
///
/// Implementations are called from the real-time thread and must not block,
/// allocate, or perform I/O. They must add into `output` rather than
/// overwrite it.
pub trait Renderable: Send {
    fn render(&mut self, output: &mut [f32], num_frames: usize, channel_count: usize);
}

/// Combines independently triggered tracks into one output buffer.
pub struct Mixer {
    tracks: Vec<Box<dyn Renderable>>,
    channel_count: usize,
}

impl Mixer {
    pub fn new() -> Self {
        Self {
            tracks: Vec::with_capacity(MAX_TRACKS),
            channel_count: 0,
        }
    }

    /// Register a track. Registration order is render order only.
    pub fn add_track<R: Renderable + 'static>(&mut self, track: R) -> Result<(), AudioError> {
        if self.tracks.len() >= MAX_TRACKS {
            return Err(AudioError::MixerFull { limit: MAX_TRACKS });
        }
        self.tracks.push(Box::new(track));
        Ok(())
    }

    /// Declare the output buffer's interleaved channel count.
    pub fn set_channel_count(&mut self, channel_count: u16) {
        self.channel_count = channel_count as usize;
    }

    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Render `num_frames` frames of the mix into `output`.
    ///
    /// Never allocates. If no channel count has been set the whole output is
    /// silenced.
    pub fn render_audio(&mut self, output: &mut [f32], num_frames: usize) {
        if self.channel_count == 0 {
            output.fill(0.0);
            return;
        }

        let len = (num_frames * self.channel_count).min(output.len());
        let region = &mut output[..len];
        region.fill(0.0);

        let frames = len / self.channel_count;
        for track in self.tracks.iter_mut() {
            track.render(region, frames, self.channel_count);
        }
    }
}

impl Default for Mixer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioFormat, Player, SampleBuffer};
    use std::sync::Arc;

    fn constant_player(value: f32, frames: usize) -> Player {
        let format = AudioFormat::new(1, 48_000).unwrap();
        let buffer = SampleBuffer::new(vec![value; frames], format).unwrap();
        Player::new(Arc::new(buffer))
    }

    struct Constant(f32);

    impl Renderable for Constant {
        fn render(&mut self, output: &mut [f32], _num_frames: usize, _channel_count: usize) {
            for sample in output.iter_mut() {
                *sample += self.0;
            }
        }
    }

    #[test]
    fn test_two_players_sum() {
        let a = constant_player(0.5, 10);
        let b = constant_player(0.25, 10);
        let (ha, hb) = (a.handle(), b.handle());

        let mut mixer = Mixer::new();
        mixer.add_track(a).unwrap();
        mixer.add_track(b).unwrap();
        mixer.set_channel_count(1);

        ha.set_playing(true);
        hb.set_playing(true);

        let mut out = vec![9.0; 16];
        mixer.render_audio(&mut out, 16);
        assert!(out[..10].iter().all(|&s| s == 0.75));
        assert!(out[10..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_render_zeroes_stale_output() {
        let mut mixer = Mixer::new();
        mixer.set_channel_count(2);
        let mut out = vec![1.0; 8];
        mixer.render_audio(&mut out, 4);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_render_without_channel_count_is_silent() {
        let mut mixer = Mixer::new();
        mixer.add_track(Constant(0.5)).unwrap();
        let mut out = vec![1.0; 8];
        mixer.render_audio(&mut out, 8);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_render_respects_num_frames() {
        let mut mixer = Mixer::new();
        mixer.add_track(Constant(0.5)).unwrap();
        mixer.set_channel_count(2);

        let mut out = vec![7.0; 8];
        mixer.render_audio(&mut out, 2);
        assert_eq!(&out[..4], &[0.5; 4]);
        assert_eq!(&out[4..], &[7.0; 4]);
    }

    #[test]
    fn test_no_clipping_stage() {
        let mut mixer = Mixer::new();
        mixer.add_track(Constant(0.75)).unwrap();
        mixer.add_track(Constant(0.75)).unwrap();
        mixer.set_channel_count(1);

        let mut out = vec![0.0; 4];
        mixer.render_audio(&mut out, 4);
        assert!(out.iter().all(|&s| s == 1.5));
    }

    #[test]
    fn test_track_limit() {
        let mut mixer = Mixer::new();
        for _ in 0..MAX_TRACKS {
            mixer.add_track(Constant(0.0)).unwrap();
        }
        assert_eq!(
            mixer.add_track(Constant(0.0)),
            Err(AudioError::MixerFull { limit: MAX_TRACKS })
        );
        assert_eq!(mixer.track_count(), MAX_TRACKS);
    }
}
