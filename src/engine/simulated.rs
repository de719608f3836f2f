//! In-process engine that plays a virtual clock instead of real media
//!
//! Used by the command-line front end and by tests that need an engine
//! with realistic timing. Position advances with the tokio clock, so tests
//! running on a paused runtime can step through a whole session.

use crate::engine::{
    Engine, EngineFactory, EngineListener, EngineState, SizeConstraint, SourceDescriptor,
    TrackFormat, TrackGroup, TrackKind, VideoSize,
};
use crate::utils::error::{PlayerError, Result};
use log::{debug, info};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Description of the virtual media
#[derive(Debug, Clone)]
pub struct SimulatedMedia {
    pub duration_ms: u64,
    pub renditions: Vec<VideoSize>,

    /// Report a runtime error once playback reaches this position
    pub fail_at_ms: Option<u64>,
}

impl Default for SimulatedMedia {
    fn default() -> Self {
        Self {
            duration_ms: 120_000,
            renditions: vec![
                VideoSize { width: 1920, height: 1080 },
                VideoSize { width: 1280, height: 720 },
                VideoSize { width: 854, height: 480 },
            ],
            fail_at_ms: None,
        }
    }
}

/// Creates a fresh [`SimulatedEngine`] for every session
#[derive(Debug, Clone, Default)]
pub struct SimulatedEngineFactory {
    media: SimulatedMedia,
}

impl SimulatedEngineFactory {
    pub fn new(media: SimulatedMedia) -> Self {
        Self { media }
    }
}

impl EngineFactory for SimulatedEngineFactory {
    fn create(&self, listener: EngineListener) -> Result<Box<dyn Engine>> {
        Ok(Box::new(SimulatedEngine::new(self.media.clone(), listener)))
    }
}

#[derive(Debug)]
struct Clock {
    media: SimulatedMedia,
    prepared: bool,
    play_when_ready: bool,
    released: bool,

    /// Position at the last anchor
    base_ms: u64,

    /// Set while playing
    anchor: Option<Instant>,
    speed: f32,
    constraint: SizeConstraint,
}

impl Clock {
    fn position(&self) -> u64 {
        let elapsed = self
            .anchor
            .map(|a| (a.elapsed().as_millis() as f64 * self.speed as f64) as u64)
            .unwrap_or(0);
        (self.base_ms + elapsed).min(self.media.duration_ms)
    }

    fn freeze(&mut self) {
        self.base_ms = self.position();
        if self.anchor.is_some() {
            self.anchor = Some(Instant::now());
        }
    }

    /// Position of the next terminal event and whether it is a failure
    fn next_deadline(&self) -> (u64, bool) {
        match self.media.fail_at_ms {
            Some(fail) if fail < self.media.duration_ms && fail >= self.base_ms => (fail, true),
            _ => (self.media.duration_ms, false),
        }
    }
}

/// Virtual-clock engine
pub struct SimulatedEngine {
    clock: Arc<Mutex<Clock>>,
    listener: EngineListener,
    deadline: Option<JoinHandle<()>>,
}

impl SimulatedEngine {
    pub fn new(media: SimulatedMedia, listener: EngineListener) -> Self {
        Self {
            clock: Arc::new(Mutex::new(Clock {
                media,
                prepared: false,
                play_when_ready: false,
                released: false,
                base_ms: 0,
                anchor: None,
                speed: 1.0,
                constraint: SizeConstraint::Unconstrained,
            })),
            listener,
            deadline: None,
        }
    }

    /// Constraint last applied by the player
    pub fn constraint(&self) -> SizeConstraint {
        self.clock.lock().constraint
    }

    fn start_clock(&mut self) {
        {
            let mut clock = self.clock.lock();
            if clock.anchor.is_some() || clock.released {
                return;
            }
            clock.anchor = Some(Instant::now());
        }
        self.listener.playing_changed(true);
        self.reschedule_deadline();
    }

    fn stop_clock(&mut self) {
        let was_playing = {
            let mut clock = self.clock.lock();
            let was_playing = clock.anchor.is_some();
            clock.base_ms = clock.position();
            clock.anchor = None;
            was_playing
        };
        self.cancel_deadline();
        if was_playing {
            self.listener.playing_changed(false);
        }
    }

    fn cancel_deadline(&mut self) {
        if let Some(task) = self.deadline.take() {
            task.abort();
        }
    }

    /// Arm a task that reports end of media or the injected failure
    fn reschedule_deadline(&mut self) {
        self.cancel_deadline();

        let (wait, fails) = {
            let clock = self.clock.lock();
            if clock.anchor.is_none() {
                return;
            }
            let (at_ms, fails) = clock.next_deadline();
            let remaining = at_ms.saturating_sub(clock.position());
            let wait = Duration::from_millis((remaining as f64 / clock.speed as f64) as u64);
            (wait, fails)
        };

        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                debug!("No runtime available, simulated media will not end on its own");
                return;
            }
        };

        let clock = Arc::clone(&self.clock);
        let listener = self.listener.clone();
        self.deadline = Some(handle.spawn(async move {
            tokio::time::sleep(wait).await;

            {
                let mut clock = clock.lock();
                if clock.released {
                    return;
                }
                clock.base_ms = clock.position();
                clock.anchor = None;
            }

            listener.playing_changed(false);
            if fails {
                listener.error("Simulated source failure");
            } else {
                listener.state_changed(EngineState::Ended);
            }
        }));
    }
}

impl Engine for SimulatedEngine {
    fn prepare(&mut self, source: &SourceDescriptor) -> Result<()> {
        if source.url.trim().is_empty() {
            return Err(PlayerError::engine_error("Empty source URL"));
        }
        info!("Simulated engine preparing {:?} source {}", source.kind, source.url);

        let play_when_ready = {
            let mut clock = self.clock.lock();
            clock.prepared = true;
            clock.play_when_ready
        };

        self.listener.state_changed(EngineState::Buffering);
        self.listener.state_changed(EngineState::Ready);

        if play_when_ready {
            self.start_clock();
        }
        Ok(())
    }

    fn play(&mut self) {
        let prepared = {
            let mut clock = self.clock.lock();
            clock.play_when_ready = true;
            clock.prepared
        };
        if prepared {
            self.start_clock();
        }
    }

    fn pause(&mut self) {
        self.clock.lock().play_when_ready = false;
        self.stop_clock();
    }

    fn seek_to(&mut self, position_ms: u64) {
        let prepared = {
            let mut clock = self.clock.lock();
            clock.base_ms = position_ms.min(clock.media.duration_ms);
            if clock.anchor.is_some() {
                clock.anchor = Some(Instant::now());
            }
            clock.prepared
        };

        if prepared {
            self.listener.state_changed(EngineState::Buffering);
            self.listener.state_changed(EngineState::Ready);
        }
        self.reschedule_deadline();
    }

    fn set_playback_speed(&mut self, speed: f32) {
        {
            let mut clock = self.clock.lock();
            clock.freeze();
            clock.speed = speed;
        }
        self.reschedule_deadline();
    }

    fn current_position(&self) -> u64 {
        self.clock.lock().position()
    }

    fn duration(&self) -> Option<u64> {
        let clock = self.clock.lock();
        clock.prepared.then_some(clock.media.duration_ms)
    }

    fn buffered_percentage(&self) -> u8 {
        let clock = self.clock.lock();
        if !clock.prepared || clock.media.duration_ms == 0 {
            return 0;
        }
        let ahead = (clock.position() + 30_000).min(clock.media.duration_ms);
        (ahead * 100 / clock.media.duration_ms) as u8
    }

    fn is_playing(&self) -> bool {
        self.clock.lock().anchor.is_some()
    }

    fn set_track_size_constraints(&mut self, constraint: SizeConstraint) {
        debug!("Simulated engine constraint: {:?}", constraint);
        self.clock.lock().constraint = constraint;
    }

    fn current_tracks(&self) -> Vec<TrackGroup> {
        let clock = self.clock.lock();
        if !clock.prepared {
            return Vec::new();
        }

        vec![
            TrackGroup {
                kind: TrackKind::Video,
                tracks: clock
                    .media
                    .renditions
                    .iter()
                    .map(|size| TrackFormat::video(size.width, size.height))
                    .collect(),
            },
            TrackGroup {
                kind: TrackKind::Audio,
                tracks: vec![TrackFormat {
                    width: None,
                    height: None,
                    supported: true,
                }],
            },
        ]
    }

    fn release(&mut self) {
        self.cancel_deadline();
        let mut clock = self.clock.lock();
        clock.base_ms = clock.position();
        clock.anchor = None;
        clock.released = true;
        info!("Simulated engine released at {} ms", clock.base_ms);
    }
}

impl Drop for SimulatedEngine {
    fn drop(&mut self) {
        self.cancel_deadline();
    }
}
