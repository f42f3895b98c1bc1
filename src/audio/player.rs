//! Player - streams one decoded sound into the mix
//!
//! A `Player` lives inside the [`Mixer`](super::Mixer) and is only touched by
//! the real-time audio thread. Control threads talk to it through a
//! [`PlayerHandle`], which shares a small block of atomics with the player.
//!
//! # Trigger protocol
//! The playback state is a single `AtomicU8`:
//! - `IDLE`: render adds nothing
//! - `TRIGGERED`: a control thread asked for playback from frame 0
//! - `PLAYING`: the render thread owns the cursor and is streaming
//!
//! Only the render thread moves `TRIGGERED -> PLAYING`, and it resets the cursor
//! in the same step. Because the request and the rewind travel through one
//! atomic, the render thread can never observe "playing" paired with a stale
//! cursor.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use super::mixer::Renderable;
use super::sample_buffer::SampleBuffer;

const IDLE: u8 = 0;
const TRIGGERED: u8 = 1;
const PLAYING: u8 = 2;

#[derive(Debug)]
struct PlayerControl {
    state: AtomicU8,
    looping: AtomicBool,
}

impl PlayerControl {
    fn new() -> Self {
        Self {
            state: AtomicU8::new(IDLE),
            looping: AtomicBool::new(false),
        }
    }
}

/// Thread-safe control surface for a [`Player`].
///
/// Cloning is cheap; all clones steer the same player.
#[derive(Debug, Clone)]
pub struct PlayerHandle {
    control: Arc<PlayerControl>,
}

impl PlayerHandle {
    /// Create a handle not yet bound to any player.
    ///
    /// Flags set before a player is attached are picked up by the first
    /// render once the handle is passed to [`Player::with_handle`].
    pub fn new() -> Self {
        Self {
            control: Arc::new(PlayerControl::new()),
        }
    }

    /// Start (or restart) playback from frame 0, or stop it.
    ///
    /// There is no acknowledgement: the render thread picks the request up on
    /// its next callback.
    pub fn set_playing(&self, playing: bool) {
        let state = if playing { TRIGGERED } else { IDLE };
        self.control.state.store(state, Ordering::Release);
    }

    /// Whether reaching the end of the sound wraps to frame 0 instead of
    /// stopping.
    pub fn set_looping(&self, looping: bool) {
        self.control.looping.store(looping, Ordering::Relaxed);
    }

    /// True while a trigger is pending or the sound is still streaming.
    pub fn is_playing(&self) -> bool {
        self.control.state.load(Ordering::Acquire) != IDLE
    }

    pub fn is_looping(&self) -> bool {
        self.control.looping.load(Ordering::Relaxed)
    }
}

impl Default for PlayerHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders one [`SampleBuffer`] into the output, frame by frame.
///
/// Several players may share the same buffer, e.g. to overlap two hits of the
/// same sound.
///
/// # Real-Time Safety
/// `render` never allocates, locks, or performs I/O. When idle it adds
/// nothing, so a player can always be rendered safely.
pub struct Player {
    buffer: Arc<SampleBuffer>,
    read_cursor: usize,
    control: Arc<PlayerControl>,
}

impl Player {
    pub fn new(buffer: Arc<SampleBuffer>) -> Self {
        Self::with_handle(buffer, &PlayerHandle::new())
    }

    /// Create a player steered by an existing handle.
    pub fn with_handle(buffer: Arc<SampleBuffer>, handle: &PlayerHandle) -> Self {
        Self {
            buffer,
            read_cursor: 0,
            control: Arc::clone(&handle.control),
        }
    }

    pub fn handle(&self) -> PlayerHandle {
        PlayerHandle {
            control: Arc::clone(&self.control),
        }
    }

    pub fn set_playing(&self, playing: bool) {
        self.handle().set_playing(playing);
    }

    pub fn set_looping(&self, looping: bool) {
        self.control.looping.store(looping, Ordering::Relaxed);
    }

    pub fn is_playing(&self) -> bool {
        self.control.state.load(Ordering::Acquire) != IDLE
    }

    /// Frame index the next render reads from.
    pub fn read_cursor(&self) -> usize {
        self.read_cursor
    }

    pub fn buffer(&self) -> &Arc<SampleBuffer> {
        &self.buffer
    }

    /// Claim a pending trigger and report whether the player should stream.
    #[inline]
    fn begin_render(&mut self) -> bool {
        match self.control.state.load(Ordering::Acquire) {
            PLAYING => true,
            TRIGGERED => {
                // Fails only if a control thread stopped us in between.
                if self
                    .control
                    .state
                    .compare_exchange(TRIGGERED, PLAYING, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok()
                {
                    self.read_cursor = 0;
                    true
                } else {
                    false
                }
            }
            _ => false,
        }
    }

    #[inline]
    fn finish(&mut self) {
        self.read_cursor = 0;
        // A concurrent re-trigger leaves TRIGGERED in place for the next callback.
        let _ = self.control.state.compare_exchange(
            PLAYING,
            IDLE,
            Ordering::AcqRel,
            Ordering::Relaxed,
        );
    }
}

impl Renderable for Player {
    fn render(&mut self, output: &mut [f32], num_frames: usize, channel_count: usize) {
        if channel_count == 0 || !self.begin_render() {
            return;
        }

        let frames = num_frames.min(output.len() / channel_count);
        let frame_count = self.buffer.frame_count();
        let looping = self.control.looping.load(Ordering::Relaxed);

        for out_frame in output.chunks_exact_mut(channel_count).take(frames) {
            let source = self.buffer.frame(self.read_cursor);
            for (channel, sample) in out_frame.iter_mut().enumerate() {
                *sample += source[channel % source.len()];
            }

            self.read_cursor += 1;
            if self.read_cursor >= frame_count {
                if looping {
                    self.read_cursor = 0;
                } else {
                    self.finish();
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioFormat;

    fn ramp_player(frames: usize) -> Player {
        let format = AudioFormat::new(1, 48_000).unwrap();
        let samples = (1..=frames).map(|i| i as f32).collect();
        Player::new(Arc::new(SampleBuffer::new(samples, format).unwrap()))
    }

    fn render(player: &mut Player, frames: usize) -> Vec<f32> {
        let mut out = vec![0.0; frames];
        player.render(&mut out, frames, 1);
        out
    }

    #[test]
    fn test_idle_player_renders_nothing() {
        let mut player = ramp_player(4);
        let mut out = vec![0.3; 8];
        player.render(&mut out, 8, 1);
        assert!(out.iter().all(|&s| s == 0.3));
    }

    #[test]
    fn test_trigger_plays_whole_buffer_then_stops() {
        let mut player = ramp_player(10);
        player.set_playing(true);

        let out = render(&mut player, 16);
        assert_eq!(&out[..10], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0]);
        assert!(out[10..].iter().all(|&s| s == 0.0));
        assert!(!player.is_playing());

        // Silence indefinitely until re-triggered
        let out = render(&mut player, 32);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_exactly_frame_count_frames_across_callbacks() {
        let mut player = ramp_player(10);
        player.set_playing(true);

        let mut rendered = Vec::new();
        for _ in 0..5 {
            rendered.extend(render(&mut player, 3));
        }
        let non_silent = rendered.iter().filter(|&&s| s != 0.0).count();
        assert_eq!(non_silent, 10);
        assert!(!player.is_playing());
    }

    #[test]
    fn test_retrigger_restarts_from_frame_zero() {
        let mut player = ramp_player(10);
        player.set_playing(true);

        let first = render(&mut player, 4);
        assert_eq!(first, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(player.read_cursor(), 4);

        player.set_playing(true);
        let second = render(&mut player, 3);
        assert_eq!(second, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_looping_never_stops() {
        let mut player = ramp_player(3);
        player.set_looping(true);
        player.set_playing(true);

        let out = render(&mut player, 9);
        assert_eq!(out, vec![1.0, 2.0, 3.0, 1.0, 2.0, 3.0, 1.0, 2.0, 3.0]);
        assert!(player.is_playing());
    }

    #[test]
    fn test_disabling_loop_stops_at_end() {
        let mut player = ramp_player(3);
        player.set_looping(true);
        player.set_playing(true);
        render(&mut player, 2);

        player.set_looping(false);
        let out = render(&mut player, 4);
        assert_eq!(out, vec![3.0, 0.0, 0.0, 0.0]);
        assert!(!player.is_playing());
    }

    #[test]
    fn test_stop_silences_next_render() {
        let mut player = ramp_player(10);
        player.set_playing(true);
        render(&mut player, 2);

        player.set_playing(false);
        let out = render(&mut player, 4);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_render_adds_into_output() {
        let mut player = ramp_player(2);
        player.set_playing(true);
        let mut out = vec![0.5; 2];
        player.render(&mut out, 2, 1);
        assert_eq!(out, vec![1.5, 2.5]);
    }

    #[test]
    fn test_mono_source_replicated_across_output_channels() {
        let mut player = ramp_player(2);
        player.set_playing(true);
        let mut out = vec![0.0; 4];
        player.render(&mut out, 2, 2);
        assert_eq!(out, vec![1.0, 1.0, 2.0, 2.0]);
    }

    #[test]
    fn test_stereo_source_keeps_channels() {
        let format = AudioFormat::new(2, 48_000).unwrap();
        let buffer = SampleBuffer::new(vec![0.1, 0.2, 0.3, 0.4], format).unwrap();
        let mut player = Player::new(Arc::new(buffer));
        player.set_playing(true);

        let mut out = vec![0.0; 4];
        player.render(&mut out, 2, 2);
        assert_eq!(out, vec![0.1, 0.2, 0.3, 0.4]);
    }

    #[test]
    fn test_handle_flags_set_before_attach() {
        let handle = PlayerHandle::new();
        handle.set_looping(true);
        handle.set_playing(true);

        let format = AudioFormat::new(1, 48_000).unwrap();
        let buffer = Arc::new(SampleBuffer::new(vec![0.5; 2], format).unwrap());
        let mut player = Player::with_handle(buffer, &handle);

        let out = render(&mut player, 4);
        assert_eq!(out, vec![0.5; 4]);
        assert!(handle.is_playing());
        assert!(handle.is_looping());
    }

    #[test]
    fn test_num_frames_bounded_by_output_length() {
        let mut player = ramp_player(10);
        player.set_playing(true);
        let mut out = vec![0.0; 3];
        player.render(&mut out, 100, 1);
        assert_eq!(out, vec![1.0, 2.0, 3.0]);
        assert_eq!(player.read_cursor(), 3);
    }
}
