//! Host-side measure editing.
//!
//! A [`Measure`] is what a metronome screen edits: the tempo, the beats of one
//! bar, and whether it is playing. Editing is bounded to what the UI offers;
//! push the result to the engine with
//! [`Metronome::apply_measure`](crate::Metronome::apply_measure).

use serde::{Deserialize, Serialize};

use crate::engine::pattern::{BeatKind, BeatPattern};

pub const MAX_BEATS: usize = 16;
pub const MIN_BEATS: usize = 1;
pub const MIN_BPM: i32 = 20;
pub const MAX_BPM: i32 = 600;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measure {
    bpm: i32,
    beats: Vec<BeatKind>,
    playing: bool,
}

impl Measure {
    /// Build a measure, clamping `bpm` and the beat count into range.
    ///
    /// Missing beats are filled with `Normal`; extra beats are dropped.
    pub fn new(bpm: i32, mut beats: Vec<BeatKind>) -> Self {
        beats.truncate(MAX_BEATS);
        if beats.len() < MIN_BEATS {
            beats.resize(MIN_BEATS, BeatKind::Normal);
        }
        Self {
            bpm: bpm.clamp(MIN_BPM, MAX_BPM),
            beats,
            playing: false,
        }
    }

    pub fn bpm(&self) -> i32 {
        self.bpm
    }

    pub fn beats(&self) -> &[BeatKind] {
        &self.beats
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn pattern(&self) -> BeatPattern {
        BeatPattern::new(self.beats.clone())
    }

    /// Append a `Normal` beat; returns false at [`MAX_BEATS`].
    pub fn add_beat(&mut self) -> bool {
        if self.beats.len() >= MAX_BEATS {
            return false;
        }
        self.beats.push(BeatKind::Normal);
        true
    }

    /// Drop the last beat; returns false at [`MIN_BEATS`].
    pub fn remove_beat(&mut self) -> bool {
        if self.beats.len() <= MIN_BEATS {
            return false;
        }
        self.beats.pop();
        true
    }

    /// Advance the beat at `index` to its next kind; `None` if out of range.
    pub fn cycle_beat(&mut self, index: usize) -> Option<BeatKind> {
        let beat = self.beats.get_mut(index)?;
        *beat = beat.next();
        Some(*beat)
    }

    /// Raise the tempo by `step`, saturating at [`MAX_BPM`].
    pub fn increase_bpm(&mut self, step: i32) -> i32 {
        if step > 0 {
            self.bpm = self.bpm.saturating_add(step).min(MAX_BPM);
        }
        self.bpm
    }

    /// Lower the tempo by `step`, saturating at [`MIN_BPM`].
    pub fn decrease_bpm(&mut self, step: i32) -> i32 {
        if step > 0 {
            self.bpm = self.bpm.saturating_sub(step).max(MIN_BPM);
        }
        self.bpm
    }

    pub fn toggle_playing(&mut self) -> bool {
        self.playing = !self.playing;
        self.playing
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
    }
}

impl Default for Measure {
    fn default() -> Self {
        Self::new(
            60,
            vec![
                BeatKind::Accent,
                BeatKind::Normal,
                BeatKind::Normal,
                BeatKind::Normal,
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_clamps_inputs() {
        let measure = Measure::new(5, Vec::new());
        assert_eq!(measure.bpm(), MIN_BPM);
        assert_eq!(measure.beats(), &[BeatKind::Normal]);

        let measure = Measure::new(1000, vec![BeatKind::Accent; 20]);
        assert_eq!(measure.bpm(), MAX_BPM);
        assert_eq!(measure.beats().len(), MAX_BEATS);
    }

    #[test]
    fn test_add_beat_stops_at_max() {
        let mut measure = Measure::new(60, vec![BeatKind::Accent; MAX_BEATS - 1]);
        assert!(measure.add_beat());
        assert_eq!(measure.beats().last(), Some(&BeatKind::Normal));
        assert!(!measure.add_beat());
        assert_eq!(measure.beats().len(), MAX_BEATS);
    }

    #[test]
    fn test_remove_beat_keeps_one() {
        let mut measure = Measure::new(60, vec![BeatKind::Accent, BeatKind::Medium]);
        assert!(measure.remove_beat());
        assert_eq!(measure.beats(), &[BeatKind::Accent]);
        assert!(!measure.remove_beat());
        assert_eq!(measure.beats().len(), 1);
    }

    #[test]
    fn test_cycle_beat() {
        let mut measure = Measure::default();
        assert_eq!(measure.cycle_beat(1), Some(BeatKind::Silence));
        assert_eq!(measure.cycle_beat(1), Some(BeatKind::Accent));
        assert_eq!(measure.cycle_beat(1), Some(BeatKind::Medium));
        assert_eq!(measure.cycle_beat(1), Some(BeatKind::Normal));
        assert_eq!(measure.cycle_beat(10), None);
    }

    #[test]
    fn test_bpm_steps_clamped() {
        let mut measure = Measure::new(590, vec![BeatKind::Normal]);
        assert_eq!(measure.increase_bpm(5), 595);
        assert_eq!(measure.increase_bpm(50), MAX_BPM);

        let mut measure = Measure::new(25, vec![BeatKind::Normal]);
        assert_eq!(measure.decrease_bpm(10), MIN_BPM);
    }

    #[test]
    fn test_non_positive_steps_ignored() {
        let mut measure = Measure::default();
        assert_eq!(measure.increase_bpm(0), 60);
        assert_eq!(measure.increase_bpm(-10), 60);
        assert_eq!(measure.decrease_bpm(-10), 60);
    }

    #[test]
    fn test_toggle_playing() {
        let mut measure = Measure::default();
        assert!(measure.toggle_playing());
        assert!(!measure.toggle_playing());
    }
}
