//! Engine module housing tempo, pattern, scheduling, and the facade.
//!
//! `backend` adapts platform output streams; `metronome` wires the audio core
//! to a scheduler and exposes the host-facing control surface.

pub mod backend;
pub mod events;
pub mod metronome;
pub mod pattern;
pub mod scheduler;
pub mod tempo;

#[cfg(not(target_os = "android"))]
pub use backend::CpalOutput;
#[cfg(target_os = "android")]
pub use backend::OboeOutput;
pub use backend::{platform_output, AudioOutput, StubOutput, StubRenderHandle};
pub use events::{EventPublisher, MetronomeEvent, MetronomeEventKind};
pub use metronome::Metronome;
pub use pattern::{BeatKind, BeatPattern, ParsePatternError};
pub use scheduler::{BeatObserver, BeatScheduler, BeatSink};
pub use tempo::Tempo;
