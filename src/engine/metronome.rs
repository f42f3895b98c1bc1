//! Metronome - the engine facade
//!
//! Composes the decoded sounds, one [`Player`] per audible beat kind, the
//! [`Mixer`] handed to the output stream, and the [`BeatScheduler`]. Every
//! method takes `&self`, so a host can share one instance between its UI
//! thread and whatever thread delivers lifecycle callbacks.
//!
//! # Lifecycle
//! ```text
//! new()  ->  init()  ->  start_playing() / stop_playing() ...  ->  end()
//! ```
//! `init` decodes every sound before opening the stream; if any sound is
//! unavailable nothing is opened. Tempo and pattern may be changed at any
//! time and apply from the next beat.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::broadcast;

use super::backend::{platform_output, AudioOutput};
use super::events::{EventPublisher, MetronomeEvent, MetronomeEventKind};
use super::pattern::{BeatKind, BeatPattern};
use super::scheduler::{BeatScheduler, BeatSink};
use super::tempo::Tempo;
use crate::audio::{AudioFormat, Mixer, Player, PlayerHandle};
use crate::config::AppConfig;
use crate::decode::{AssetDecoder, WavAssetDecoder};
use crate::error::{log_audio_error, log_decode_error, AudioError, ErrorCode};
use crate::measure::Measure;

/// Order in which sounds are decoded and registered with the mixer.
const TRACK_ORDER: [BeatKind; 3] = [BeatKind::Normal, BeatKind::Medium, BeatKind::Accent];

/// Trigger handles for the three audible beat kinds.
#[derive(Debug, Default)]
struct BeatVoices {
    normal: PlayerHandle,
    accent: PlayerHandle,
    medium: PlayerHandle,
}

impl BeatVoices {
    fn handle(&self, kind: BeatKind) -> Option<&PlayerHandle> {
        match kind {
            BeatKind::Normal => Some(&self.normal),
            BeatKind::Accent => Some(&self.accent),
            BeatKind::Medium => Some(&self.medium),
            BeatKind::Silence => None,
        }
    }

    fn silence_all(&self) {
        for handle in [&self.normal, &self.accent, &self.medium] {
            handle.set_playing(false);
        }
    }
}

impl BeatSink for BeatVoices {
    fn trigger(&self, kind: BeatKind) {
        if let Some(handle) = self.handle(kind) {
            handle.set_playing(true);
        }
    }
}

/// Real-time metronome engine.
pub struct Metronome {
    config: AppConfig,
    format: AudioFormat,
    decoder: Arc<dyn AssetDecoder>,
    output: Mutex<Box<dyn AudioOutput>>,
    initialized: AtomicBool,
    voices: Arc<BeatVoices>,
    scheduler: BeatScheduler,
    events: EventPublisher,
}

impl Metronome {
    /// Create an engine from configuration, a sound decoder, and an output.
    ///
    /// Nothing is decoded or opened until [`Metronome::init`].
    pub fn new(
        config: AppConfig,
        decoder: Arc<dyn AssetDecoder>,
        output: Box<dyn AudioOutput>,
    ) -> Result<Self, AudioError> {
        let format = config.audio.format()?;
        let tempo = Tempo::from_bpm(config.metronome.default_bpm)?;

        let voices = Arc::new(BeatVoices::default());
        let events = EventPublisher::new();
        let scheduler = BeatScheduler::new(voices.clone(), events.clone());
        scheduler.set_tempo(tempo);
        scheduler.set_pattern(config.metronome.default_pattern.clone());

        Ok(Self {
            config,
            format,
            decoder,
            output: Mutex::new(output),
            initialized: AtomicBool::new(false),
            voices,
            scheduler,
            events,
        })
    }

    /// WAV sounds from the configured asset directory, played on the
    /// platform's default output device.
    pub fn platform_default(config: AppConfig) -> Result<Self, AudioError> {
        let decoder = Arc::new(WavAssetDecoder::new(&config.sounds.asset_dir));
        let output = platform_output(&config.audio);
        Self::new(config, decoder, output)
    }

    fn lock_output(&self) -> Result<MutexGuard<'_, Box<dyn AudioOutput>>, AudioError> {
        self.output.lock().map_err(|_| AudioError::LockPoisoned {
            component: "audio_output".to_string(),
        })
    }

    /// Decode the sounds, build the mixer, and open the output stream.
    ///
    /// Fails with `AlreadyRunning` if already initialized and with
    /// `SoundUnavailable` if any sound cannot be decoded, in which case no
    /// stream is opened.
    pub fn init(&self) -> Result<(), AudioError> {
        let mut output = self.lock_output()?;
        if self.initialized.load(Ordering::Acquire) {
            return Err(AudioError::AlreadyRunning);
        }

        let mixer = self.build_mixer().inspect_err(|err| {
            log_audio_error(err, "Metronome::init");
        })?;
        let tracks = mixer.track_count();

        let channel_count = output.start(self.format, mixer).inspect_err(|err| {
            log_audio_error(err, "Metronome::init");
        })?;

        self.initialized.store(true, Ordering::Release);
        log::info!(
            "Metronome initialized: {} tracks, {} ch @ {} Hz",
            tracks,
            channel_count,
            self.format.sample_rate()
        );
        Ok(())
    }

    fn build_mixer(&self) -> Result<Mixer, AudioError> {
        let mut mixer = Mixer::new();

        for kind in TRACK_ORDER {
            let (Some(asset), Some(handle)) =
                (self.config.sounds.asset_for(kind), self.voices.handle(kind))
            else {
                continue;
            };

            let buffer = self.decoder.decode(asset, self.format).map_err(|err| {
                log_decode_error(&err, "Metronome::init");
                AudioError::SoundUnavailable {
                    sound: kind.label().to_string(),
                    reason: err.message(),
                }
            })?;

            log::debug!("Loaded {} sound: {} frames", kind, buffer.frame_count());
            mixer.add_track(Player::with_handle(Arc::new(buffer), handle))?;
        }

        Ok(mixer)
    }

    /// Stop playback and close the output stream.
    ///
    /// Safe to call repeatedly or without a prior `init`.
    pub fn end(&self) -> Result<(), AudioError> {
        self.stop_playing()?;

        let mut output = self.lock_output()?;
        output.stop()?;
        self.voices.silence_all();

        if self.initialized.swap(false, Ordering::AcqRel) {
            log::info!("Metronome shut down");
        }
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Channel count of the open output stream.
    pub fn channel_count(&self) -> Option<u16> {
        self.lock_output().ok().and_then(|output| output.channel_count())
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// Change tempo; applies from the next beat.
    ///
    /// Zero or negative values are rejected and the previous tempo is kept.
    pub fn set_bpm(&self, bpm: i32) -> Result<(), AudioError> {
        let tempo = Tempo::from_bpm(bpm).inspect_err(|err| {
            log_audio_error(err, "Metronome::set_bpm");
        })?;

        self.scheduler.set_tempo(tempo);
        self.events.publish(MetronomeEventKind::BpmChanged { bpm: tempo.bpm() });
        log::debug!("BPM set to {} ({} ms)", tempo.bpm(), tempo.interval_ms());
        Ok(())
    }

    pub fn tempo(&self) -> Tempo {
        self.scheduler.tempo()
    }

    pub fn bpm(&self) -> u32 {
        self.tempo().bpm()
    }

    pub fn interval_ms(&self) -> u32 {
        self.tempo().interval_ms()
    }

    /// Replace the beat pattern; applies from the next beat.
    ///
    /// An empty pattern is stored, but playback cannot start on it and a
    /// running metronome rests until a non-empty pattern arrives.
    pub fn set_pattern(&self, pattern: impl Into<BeatPattern>) {
        let pattern = pattern.into();
        let beats = pattern.beats().to_vec();
        self.scheduler.set_pattern(pattern);
        self.events
            .publish(MetronomeEventKind::PatternChanged { beats });
    }

    pub fn pattern(&self) -> BeatPattern {
        self.scheduler.pattern()
    }

    /// Start the beat loop. `Ok(false)` if it was already running.
    pub fn start_playing(&self) -> Result<bool, AudioError> {
        let started = self.scheduler.start().inspect_err(|err| {
            log_audio_error(err, "Metronome::start_playing");
        })?;

        if started {
            let bpm = self.bpm();
            self.events.publish(MetronomeEventKind::Started { bpm });
            log::info!("Metronome started at {} BPM", bpm);
        }
        Ok(started)
    }

    /// Stop the beat loop and wait for it to exit. `Ok(false)` if it was not
    /// running.
    pub fn stop_playing(&self) -> Result<bool, AudioError> {
        let stopped = self.scheduler.stop()?;
        if stopped {
            self.events.publish(MetronomeEventKind::Stopped);
            log::info!("Metronome stopped");
        }
        Ok(stopped)
    }

    /// Flip between playing and stopped; returns the new playing state.
    pub fn toggle_playing(&self) -> Result<bool, AudioError> {
        if self.is_playing() {
            self.stop_playing()?;
            Ok(false)
        } else {
            self.start_playing()?;
            Ok(true)
        }
    }

    pub fn is_playing(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Index of the most recently played beat.
    pub fn current_beat(&self) -> usize {
        self.scheduler.current_beat()
    }

    /// Total beats dispatched since creation.
    pub fn beat_count(&self) -> u64 {
        self.scheduler.ticks()
    }

    /// Measures started since playback last began.
    pub fn measure(&self) -> u64 {
        self.scheduler.measures()
    }

    /// Called on the scheduler thread once per beat with its index.
    ///
    /// Must not call `stop_playing` or `end` expecting them to wait; keep it
    /// short and hand work off to the host's own thread.
    pub fn set_beat_observer<F>(&self, observer: F)
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.scheduler.set_observer(Some(Arc::new(observer)));
    }

    pub fn clear_beat_observer(&self) {
        self.scheduler.set_observer(None);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MetronomeEvent> {
        self.events.subscribe()
    }

    /// Trigger handle of the player behind `kind`; `None` for silence.
    pub fn player_handle(&self, kind: BeatKind) -> Option<PlayerHandle> {
        self.voices.handle(kind).cloned()
    }

    /// Push a host-side measure: tempo, pattern, and play state.
    pub fn apply_measure(&self, measure: &Measure) -> Result<(), AudioError> {
        self.set_bpm(measure.bpm())?;
        self.set_pattern(measure.pattern());

        if measure.is_playing() {
            self.start_playing()?;
        } else {
            self.stop_playing()?;
        }
        Ok(())
    }
}

impl Drop for Metronome {
    fn drop(&mut self) {
        if let Err(err) = self.end() {
            log_audio_error(&err, "Metronome::drop");
        }
    }
}
