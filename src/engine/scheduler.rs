//! BeatScheduler - tempo-driven timing thread
//!
//! While running, a dedicated thread walks the beat pattern once per tempo
//! interval and hands each beat kind to a [`BeatSink`], which flips the
//! matching player's trigger flag. The render thread never waits on this
//! thread: the only link between them is that flag.
//!
//! # Timing
//! Waits are deadline based: each tick is scheduled one interval after the
//! previous deadline, so processing time does not accumulate as drift. A new
//! BPM applies to the next wait only. Waits block on a condvar so `stop` wakes
//! the thread immediately instead of after the remaining interval.
//!
//! # Shutdown
//! `stop` clears the running flag, wakes the thread, and joins it. Once `stop`
//! returns no further dispatch, observer call, or beat event can happen.

use std::sync::atomic::{AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, RwLock};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Instant;

use super::events::{EventPublisher, MetronomeEventKind};
use super::pattern::{BeatKind, BeatPattern};
use super::tempo::Tempo;
use crate::error::AudioError;

/// Receives beat dispatches on the scheduler thread.
///
/// Implementations must return quickly; they run inside the timing loop.
pub trait BeatSink: Send + Sync {
    fn trigger(&self, kind: BeatKind);
}

/// Callback invoked once per tick with the beat index.
pub type BeatObserver = Arc<dyn Fn(usize) + Send + Sync>;

struct SchedulerShared {
    running: Mutex<bool>,
    wake: Condvar,
    pattern: RwLock<BeatPattern>,
    bpm: AtomicU32,
    current_beat: AtomicUsize,
    ticks: AtomicU64,
    measures: AtomicU64,
    observer: RwLock<Option<BeatObserver>>,
    thread_id: Mutex<Option<ThreadId>>,
}

impl SchedulerShared {
    fn running(&self) -> MutexGuard<'_, bool> {
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn observer(&self) -> Option<BeatObserver> {
        self.observer
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn on_scheduler_thread(&self) -> bool {
        *self.thread_id.lock().unwrap_or_else(PoisonError::into_inner)
            == Some(thread::current().id())
    }

    /// Clear the running flag and wake the loop; returns the previous value.
    fn halt(&self) -> bool {
        let was_running = std::mem::replace(&mut *self.running(), false);
        self.wake.notify_all();
        was_running
    }
}

/// Owns the timing thread and the pattern/tempo it plays.
pub struct BeatScheduler {
    shared: Arc<SchedulerShared>,
    sink: Arc<dyn BeatSink>,
    events: EventPublisher,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl BeatScheduler {
    pub fn new(sink: Arc<dyn BeatSink>, events: EventPublisher) -> Self {
        Self {
            shared: Arc::new(SchedulerShared {
                running: Mutex::new(false),
                wake: Condvar::new(),
                pattern: RwLock::new(BeatPattern::default()),
                bpm: AtomicU32::new(Tempo::default().bpm()),
                current_beat: AtomicUsize::new(0),
                ticks: AtomicU64::new(0),
                measures: AtomicU64::new(0),
                observer: RwLock::new(None),
                thread_id: Mutex::new(None),
            }),
            sink,
            events,
            thread: Mutex::new(None),
        }
    }

    /// Spawn the timing thread.
    ///
    /// Returns `Ok(false)` if already running (nothing changes) and
    /// `Err(PatternEmpty)` if there is nothing to play. The first beat is
    /// dispatched immediately from index 0. Ignored when called from the
    /// observer callback.
    pub fn start(&self) -> Result<bool, AudioError> {
        if self.shared.on_scheduler_thread() {
            return Ok(false);
        }
        let mut slot = self.thread.lock().unwrap_or_else(PoisonError::into_inner);

        if slot.is_some() {
            if *self.shared.running() {
                return Ok(false);
            }
            // Stopped from the observer callback; reap it now.
            if let Some(handle) = slot.take() {
                join_scheduler(handle)?;
            }
        }

        if self.pattern().is_empty() {
            return Err(AudioError::PatternEmpty);
        }

        self.shared.current_beat.store(0, Ordering::Relaxed);
        self.shared.measures.store(0, Ordering::Relaxed);
        *self.shared.running() = true;

        let shared = Arc::clone(&self.shared);
        let sink = Arc::clone(&self.sink);
        let events = self.events.clone();
        let handle = thread::Builder::new()
            .name("metronome-scheduler".to_string())
            .spawn(move || run_scheduler(shared, sink, events))
            .map_err(|err| {
                *self.shared.running() = false;
                AudioError::HardwareError {
                    details: format!("failed to spawn scheduler thread: {}", err),
                }
            })?;

        *slot = Some(handle);
        Ok(true)
    }

    /// Stop the timing thread and wait for it to exit.
    ///
    /// Returns `Ok(false)` when it was not running. Calling this from the
    /// observer callback stops the loop but cannot wait for it; the thread is
    /// reaped by the next `start` or `stop` from another thread.
    pub fn stop(&self) -> Result<bool, AudioError> {
        if self.shared.on_scheduler_thread() {
            return Ok(self.shared.halt());
        }

        let mut slot = self.thread.lock().unwrap_or_else(PoisonError::into_inner);
        let was_running = self.shared.halt();
        if let Some(handle) = slot.take() {
            join_scheduler(handle)?;
        }
        Ok(was_running)
    }

    pub fn is_running(&self) -> bool {
        *self.shared.running()
    }

    /// Replace the pattern; the running loop picks it up on its next tick.
    pub fn set_pattern(&self, pattern: BeatPattern) {
        *self
            .shared
            .pattern
            .write()
            .unwrap_or_else(PoisonError::into_inner) = pattern;
    }

    pub fn pattern(&self) -> BeatPattern {
        self.shared
            .pattern
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Takes effect on the next interval; a wait in progress is not shortened.
    pub fn set_tempo(&self, tempo: Tempo) {
        self.shared.bpm.store(tempo.bpm(), Ordering::Relaxed);
    }

    pub fn tempo(&self) -> Tempo {
        Tempo::from_valid(self.shared.bpm.load(Ordering::Relaxed))
    }

    /// Index of the most recently dispatched beat.
    pub fn current_beat(&self) -> usize {
        self.shared.current_beat.load(Ordering::Relaxed)
    }

    /// Ticks dispatched since the scheduler was created.
    pub fn ticks(&self) -> u64 {
        self.shared.ticks.load(Ordering::Acquire)
    }

    /// Completed passes through index 0 since the last start.
    pub fn measures(&self) -> u64 {
        self.shared.measures.load(Ordering::Relaxed)
    }

    pub fn set_observer(&self, observer: Option<BeatObserver>) {
        *self
            .shared
            .observer
            .write()
            .unwrap_or_else(PoisonError::into_inner) = observer;
    }
}

impl Drop for BeatScheduler {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            log::warn!("Scheduler did not shut down cleanly: {}", err);
        }
    }
}

fn join_scheduler(handle: JoinHandle<()>) -> Result<(), AudioError> {
    handle.join().map_err(|_| AudioError::HardwareError {
        details: "scheduler thread panicked".to_string(),
    })
}

fn run_scheduler(shared: Arc<SchedulerShared>, sink: Arc<dyn BeatSink>, events: EventPublisher) {
    // Recorded before the first dispatch so an observer can recognise its own thread.
    *shared
        .thread_id
        .lock()
        .unwrap_or_else(PoisonError::into_inner) = Some(thread::current().id());
    tracing::info!("[Scheduler] Timing loop started");

    let mut index = 0usize;
    let mut deadline = Instant::now();

    loop {
        if !*shared.running() {
            break;
        }

        let beat = {
            let pattern = shared.pattern.read().unwrap_or_else(PoisonError::into_inner);
            if pattern.is_empty() {
                None
            } else {
                // Pattern may have shrunk since the last tick.
                index %= pattern.len();
                pattern.get(index)
            }
        };

        match beat {
            Some(kind) => {
                sink.trigger(kind);

                let measure = if index == 0 {
                    shared.measures.fetch_add(1, Ordering::Relaxed) + 1
                } else {
                    shared.measures.load(Ordering::Relaxed)
                };
                shared.current_beat.store(index, Ordering::Relaxed);
                shared.ticks.fetch_add(1, Ordering::Release);

                if let Some(observer) = shared.observer() {
                    observer(index);
                }
                events.publish(MetronomeEventKind::Beat {
                    index,
                    kind,
                    measure,
                });
                tracing::trace!("[Scheduler] Beat {} ({}) measure {}", index, kind, measure);
            }
            None => {
                tracing::debug!("[Scheduler] Pattern empty, resting");
            }
        }

        let interval = Tempo::from_valid(shared.bpm.load(Ordering::Relaxed)).interval();
        deadline += interval;
        let now = Instant::now();
        if deadline < now {
            // Fell behind (e.g. process suspended); resync instead of bursting.
            deadline = now;
        }

        let running = shared.running();
        let (running, _) = shared
            .wake
            .wait_timeout_while(running, deadline - now, |running| *running)
            .unwrap_or_else(PoisonError::into_inner);
        if !*running {
            break;
        }
        drop(running);

        index = index.wrapping_add(1);
    }

    tracing::info!("[Scheduler] Timing loop exited");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const POLL_INTERVAL: Duration = Duration::from_millis(1);

    #[derive(Default)]
    struct RecordingSink {
        beats: Mutex<Vec<BeatKind>>,
    }

    impl RecordingSink {
        fn beats(&self) -> Vec<BeatKind> {
            self.beats.lock().unwrap().clone()
        }
    }

    impl BeatSink for RecordingSink {
        fn trigger(&self, kind: BeatKind) {
            self.beats.lock().unwrap().push(kind);
        }
    }

    fn scheduler(bpm: i32, pattern: &str) -> (BeatScheduler, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let scheduler = BeatScheduler::new(sink.clone(), EventPublisher::new());
        scheduler.set_tempo(Tempo::from_bpm(bpm).unwrap());
        scheduler.set_pattern(pattern.parse().unwrap());
        (scheduler, sink)
    }

    fn wait_for_ticks(scheduler: &BeatScheduler, ticks: u64) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while scheduler.ticks() < ticks {
            assert!(Instant::now() < deadline, "timed out waiting for {} ticks", ticks);
            thread::sleep(POLL_INTERVAL);
        }
    }

    #[test]
    fn test_empty_pattern_refuses_to_start() {
        let (scheduler, sink) = scheduler(120, "");
        assert_eq!(scheduler.start(), Err(AudioError::PatternEmpty));
        assert!(!scheduler.is_running());
        thread::sleep(Duration::from_millis(20));
        assert!(sink.beats().is_empty());
        assert_eq!(scheduler.ticks(), 0);
    }

    #[test]
    fn test_start_while_running_is_noop() {
        let (scheduler, _sink) = scheduler(60, "A");
        assert_eq!(scheduler.start(), Ok(true));
        assert_eq!(scheduler.start(), Ok(false));
        assert_eq!(scheduler.stop(), Ok(true));
    }

    #[test]
    fn test_stop_without_start_is_safe() {
        let (scheduler, _sink) = scheduler(60, "A");
        assert_eq!(scheduler.stop(), Ok(false));
        assert_eq!(scheduler.stop(), Ok(false));
    }

    #[test]
    fn test_first_beat_dispatched_immediately() {
        let (scheduler, sink) = scheduler(1, "AN");
        scheduler.start().unwrap();
        wait_for_ticks(&scheduler, 1);
        scheduler.stop().unwrap();
        assert_eq!(sink.beats(), vec![BeatKind::Accent]);
    }

    #[test]
    fn test_stop_interrupts_long_wait() {
        // 1 BPM: one minute between beats
        let (scheduler, _sink) = scheduler(1, "N");
        scheduler.start().unwrap();
        wait_for_ticks(&scheduler, 1);

        let started = Instant::now();
        scheduler.stop().unwrap();
        assert!(started.elapsed() < Duration::from_millis(500));
        assert!(!scheduler.is_running());
    }

    #[test]
    fn test_dispatch_follows_pattern_and_skips_silence() {
        let (scheduler, sink) = scheduler(6000, "ANSM");
        scheduler.start().unwrap();
        wait_for_ticks(&scheduler, 8);
        scheduler.stop().unwrap();

        let beats = sink.beats();
        let expected = [BeatKind::Accent, BeatKind::Normal, BeatKind::Medium];
        assert!(beats.len() >= 6);
        for (i, kind) in beats.iter().enumerate() {
            assert_eq!(*kind, expected[i % 3]);
        }
    }

    #[test]
    fn test_observer_sees_cyclic_indices() {
        let (scheduler, _sink) = scheduler(6000, "ANM");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let observed = Arc::clone(&seen);
        scheduler.set_observer(Some(Arc::new(move |index| {
            observed.lock().unwrap().push(index);
        })));

        scheduler.start().unwrap();
        wait_for_ticks(&scheduler, 7);
        scheduler.stop().unwrap();

        let seen = seen.lock().unwrap().clone();
        assert!(seen.len() >= 7);
        for (tick, index) in seen.iter().enumerate() {
            assert_eq!(*index, tick % 3);
        }
        assert_eq!(seen.len() as u64, scheduler.ticks());
    }

    #[test]
    fn test_no_dispatch_after_stop_returns() {
        let (scheduler, sink) = scheduler(6000, "N");
        scheduler.start().unwrap();
        scheduler.stop().unwrap();

        let ticks = scheduler.ticks();
        let beats = sink.beats().len();
        thread::sleep(Duration::from_millis(50));
        assert_eq!(scheduler.ticks(), ticks);
        assert_eq!(sink.beats().len(), beats);
    }

    #[test]
    fn test_pattern_shrink_while_running_wraps_index() {
        let (scheduler, _sink) = scheduler(6000, "NNNNNNNN");
        scheduler.start().unwrap();
        wait_for_ticks(&scheduler, 5);

        scheduler.set_pattern("AN".parse().unwrap());
        let resume = scheduler.ticks() + 1;
        wait_for_ticks(&scheduler, resume + 4);
        scheduler.stop().unwrap();

        assert!(scheduler.current_beat() < 2);
    }

    #[test]
    fn test_measures_count_passes_through_first_beat() {
        let (scheduler, _sink) = scheduler(6000, "AN");
        scheduler.start().unwrap();
        wait_for_ticks(&scheduler, 5);
        scheduler.stop().unwrap();

        let ticks = scheduler.ticks();
        assert_eq!(scheduler.measures(), ticks.div_ceil(2));
    }

    #[test]
    fn test_restart_resets_index() {
        let (scheduler, sink) = scheduler(6000, "AN");
        scheduler.start().unwrap();
        wait_for_ticks(&scheduler, 2);
        scheduler.stop().unwrap();

        let before = sink.beats().len();
        scheduler.start().unwrap();
        wait_for_ticks(&scheduler, scheduler.ticks() + 1);
        scheduler.stop().unwrap();

        assert_eq!(sink.beats()[before], BeatKind::Accent);
    }

    #[test]
    fn test_stop_from_observer_does_not_deadlock() {
        let (scheduler, _sink) = scheduler(6000, "N");
        let scheduler = Arc::new(scheduler);
        let weak = Arc::downgrade(&scheduler);
        scheduler.set_observer(Some(Arc::new(move |_| {
            if let Some(scheduler) = weak.upgrade() {
                scheduler.stop().unwrap();
            }
        })));

        scheduler.start().unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        while scheduler.is_running() {
            assert!(Instant::now() < deadline);
            thread::sleep(POLL_INTERVAL);
        }
        scheduler.set_observer(None);
        assert_eq!(scheduler.start(), Ok(true));
        scheduler.stop().unwrap();
    }

    #[test]
    fn test_repeated_stop_on_first_beat_never_self_joins() {
        let (scheduler, _sink) = scheduler(6000, "N");
        let scheduler = Arc::new(scheduler);
        let weak = Arc::downgrade(&scheduler);
        scheduler.set_observer(Some(Arc::new(move |index| {
            if index == 0 {
                if let Some(scheduler) = weak.upgrade() {
                    scheduler.stop().unwrap();
                }
            }
        })));

        for _ in 0..500 {
            // Reaps the previous thread; a panicked thread fails the join.
            assert_eq!(scheduler.start(), Ok(true));
            let deadline = Instant::now() + Duration::from_secs(5);
            while scheduler.is_running() {
                assert!(Instant::now() < deadline);
                thread::yield_now();
            }
        }

        scheduler.set_observer(None);
        assert_eq!(scheduler.stop(), Ok(false));
    }

    #[test]
    fn test_tick_spacing_matches_interval() {
        // 600 BPM -> 100 ms
        let (scheduler, _sink) = scheduler(600, "N");
        let stamps = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&stamps);
        scheduler.set_observer(Some(Arc::new(move |_| {
            recorded.lock().unwrap().push(Instant::now());
        })));

        scheduler.start().unwrap();
        wait_for_ticks(&scheduler, 6);
        scheduler.stop().unwrap();

        let stamps = stamps.lock().unwrap().clone();
        let total = stamps[5].duration_since(stamps[0]);
        let average = total / 5;
        assert!(
            average >= Duration::from_millis(90) && average <= Duration::from_millis(130),
            "average tick spacing {:?}",
            average
        );
    }
}
