// Audio module - sample storage, playback, and mixing

pub mod click;
pub mod format;
pub mod mixer;
pub mod player;
pub mod sample_buffer;

#[cfg(target_os = "android")]
pub mod callback;

// Re-export commonly used types for convenience
pub use click::{generate_click_sample, ClickTone};
pub use format::AudioFormat;
pub use mixer::{Mixer, Renderable, MAX_TRACKS};
pub use player::{Player, PlayerHandle};
pub use sample_buffer::SampleBuffer;
