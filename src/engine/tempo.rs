//! Tempo - BPM and the derived beat interval.

use std::time::Duration;

use crate::error::AudioError;

/// Milliseconds per minute.
pub const MS_PER_MINUTE: u32 = 60_000;

pub const DEFAULT_BPM: u32 = 60;

/// A validated tempo.
///
/// `interval_ms` is `60000 / bpm` using integer division, so intervals of
/// non-divisor tempos are truncated (e.g. 7 BPM -> 8571 ms). It never drops
/// below 1 ms, which caps the beat rate of absurd tempos.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tempo {
    bpm: u32,
    interval_ms: u32,
}

impl Tempo {
    /// Reject zero and negative values; any positive value is accepted.
    pub fn from_bpm(bpm: i32) -> Result<Self, AudioError> {
        if bpm <= 0 {
            return Err(AudioError::BpmInvalid { bpm });
        }
        let bpm = bpm as u32;
        Ok(Self {
            bpm,
            interval_ms: interval_for(bpm),
        })
    }

    /// Rebuild a tempo from a BPM that already passed validation.
    pub(crate) fn from_valid(bpm: u32) -> Self {
        let bpm = bpm.max(1);
        Self {
            bpm,
            interval_ms: interval_for(bpm),
        }
    }

    pub fn bpm(&self) -> u32 {
        self.bpm
    }

    pub fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms as u64)
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self {
            bpm: DEFAULT_BPM,
            interval_ms: interval_for(DEFAULT_BPM),
        }
    }
}

/// Beat interval in whole milliseconds for a positive `bpm`, at least 1 ms.
#[inline]
pub fn interval_for(bpm: u32) -> u32 {
    (MS_PER_MINUTE / bpm.max(1)).max(1)
}
