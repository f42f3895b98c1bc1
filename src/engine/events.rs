//! Metronome event broadcast.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::pattern::BeatKind;

/// Buffered events per receiver before the oldest are dropped.
pub const EVENT_CHANNEL_CAPACITY: usize = 128;

/// Event emitted by the metronome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetronomeEvent {
    /// Milliseconds since the engine was created
    pub timestamp_ms: u64,
    pub kind: MetronomeEventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MetronomeEventKind {
    Started { bpm: u32 },
    Stopped,
    BpmChanged { bpm: u32 },
    PatternChanged { beats: Vec<BeatKind> },
    /// One scheduler tick; `measure` counts cycles through the pattern from 1.
    Beat { index: usize, kind: BeatKind, measure: u64 },
}

/// Sending half shared by the facade and the scheduler thread.
#[derive(Debug, Clone)]
pub struct EventPublisher {
    tx: broadcast::Sender<MetronomeEvent>,
    start_instant: Instant,
}

impl EventPublisher {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            tx,
            start_instant: Instant::now(),
        }
    }

    /// Never blocks; events are dropped when nobody listens.
    pub fn publish(&self, kind: MetronomeEventKind) {
        let timestamp_ms = Instant::now()
            .saturating_duration_since(self.start_instant)
            .as_millis() as u64;
        let _ = self.tx.send(MetronomeEvent { timestamp_ms, kind });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MetronomeEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}
