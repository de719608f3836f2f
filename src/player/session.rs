//! Playback session
//!
//! Owns the engine instance for the lifetime of one launch, translates
//! engine events into [`PlaybackState`] transitions and produces the
//! single outcome of the session when it terminates.

use crate::bridge::{LaunchRequest, RelatedContentSignal, SessionOutcome, SessionResult};
use crate::catalog::Rendition;
use crate::engine::{
    Engine, EngineEvent, EngineFactory, EngineListener, EngineState, SizeConstraint,
    SourceDescriptor, TrackGroup, SD_MAX_SIZE,
};
use crate::player::{PlayGlyph, PlaybackState, ProgressSnapshot};
use crate::utils::config::Config;
use crate::utils::clamp;
use crate::utils::error::{PlayerError, Result};
use log::{debug, error, info, warn};

/// Why a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationReason {
    /// Back/close action or host teardown
    Closed,

    /// Engine reached the end of the media
    Ended,

    /// Engine runtime failure
    Failed(String),

    /// Caller asked for related content mid-playback
    RelatedContent,
}

/// What the controller has to react to after an engine event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionSignal {
    /// Nothing visible changed
    None,

    /// Show the loading indicator
    Buffering,

    /// Hide the loading indicator, refresh renditions, sync the glyph
    Ready { playing: bool },

    /// Engine playing flag changed
    PlayingChanged(bool),

    /// Session must terminate
    Finished(TerminationReason),
}

/// Engine ownership across the session lifecycle
enum EngineSlot {
    /// No engine created yet
    Unstarted,

    Active(Box<dyn Engine>),

    /// Engine released; the session is over
    Released,
}

/// Clamp `current + delta` into `[0, duration]`.
///
/// Without a known duration only the lower bound applies.
pub fn relative_target(current_ms: u64, delta_ms: i64, duration_ms: Option<u64>) -> u64 {
    let target = (current_ms as i128 + delta_ms as i128).max(0) as u64;
    match duration_ms {
        Some(duration) => target.min(duration),
        None => target,
    }
}

/// Map a scrub fraction to a position; the fraction is clamped to `[0, 1]`
pub fn position_for_fraction(fraction: f64, duration_ms: u64) -> u64 {
    let fraction = if fraction.is_nan() { 0.0 } else { clamp(fraction, 0.0, 1.0) };
    ((duration_ms as f64) * fraction).round().min(duration_ms as f64) as u64
}

/// One playback lifecycle from launch to termination
pub struct PlaybackSession {
    slot: EngineSlot,
    state: PlaybackState,

    /// Last readings, used when the engine can no longer be asked
    last_position_ms: u64,
    last_duration_ms: Option<u64>,
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackSession {
    pub fn new() -> Self {
        Self {
            slot: EngineSlot::Unstarted,
            state: PlaybackState::Idle,
            last_position_ms: 0,
            last_duration_ms: None,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.slot, EngineSlot::Active(_))
    }

    pub fn is_released(&self) -> bool {
        matches!(self.slot, EngineSlot::Released)
    }

    fn engine(&self) -> Option<&dyn Engine> {
        match &self.slot {
            EngineSlot::Active(engine) => Some(engine.as_ref()),
            _ => None,
        }
    }

    fn engine_mut(&mut self) -> Option<&mut Box<dyn Engine>> {
        match &mut self.slot {
            EngineSlot::Active(engine) => Some(engine),
            _ => None,
        }
    }

    /// Create the engine, open the source and start playing.
    ///
    /// Fails with `InvalidArgument` for an empty URL before anything is
    /// created. An `Engine` error means the engine exists but could not
    /// open the source; the caller must terminate the session.
    pub fn start(
        &mut self,
        request: &LaunchRequest,
        factory: &dyn EngineFactory,
        listener: EngineListener,
        config: &Config,
    ) -> Result<()> {
        if request.source_url.trim().is_empty() {
            return Err(PlayerError::InvalidArgument("Video URL is required".to_string()));
        }
        if !matches!(self.slot, EngineSlot::Unstarted) {
            return Err(PlayerError::Internal("Session already started".to_string()));
        }

        let source = SourceDescriptor::for_url(&request.source_url, &config.network);
        info!("Starting session for {} ({:?})", source.url, source.kind);

        let mut engine = factory.create(listener)?;
        if config.session.cap_initial_quality_sd {
            engine.set_track_size_constraints(SizeConstraint::AtMost(SD_MAX_SIZE));
        }

        self.state = PlaybackState::Buffering;
        let prepared = engine.prepare(&source);
        self.slot = EngineSlot::Active(engine);
        prepared?;

        if let Some(engine) = self.engine_mut() {
            if request.start_position_ms > 0 {
                debug!("Seeking to start position {} ms", request.start_position_ms);
                engine.seek_to(request.start_position_ms);
            }
            engine.play();
        }

        Ok(())
    }

    /// Translate one engine event into a state transition
    pub fn on_engine_event(&mut self, event: EngineEvent) -> SessionSignal {
        if !self.is_active() {
            debug!("Engine event after release ignored: {:?}", event);
            return SessionSignal::None;
        }

        match event {
            EngineEvent::StateChanged(EngineState::Buffering) => {
                self.transition(PlaybackState::Buffering);
                SessionSignal::Buffering
            }
            EngineEvent::StateChanged(EngineState::Ready) => {
                let playing = self.is_playing();
                self.transition(if playing { PlaybackState::Playing } else { PlaybackState::Ready });
                self.refresh_readings();
                SessionSignal::Ready { playing }
            }
            EngineEvent::StateChanged(EngineState::Ended) => {
                self.transition(PlaybackState::Ended);
                SessionSignal::Finished(TerminationReason::Ended)
            }
            EngineEvent::StateChanged(EngineState::Idle) => SessionSignal::None,
            EngineEvent::PlayingChanged(true) => {
                if self.state != PlaybackState::Buffering {
                    self.transition(PlaybackState::Playing);
                }
                SessionSignal::PlayingChanged(true)
            }
            EngineEvent::PlayingChanged(false) => {
                if self.state == PlaybackState::Playing {
                    self.transition(PlaybackState::Paused);
                }
                SessionSignal::PlayingChanged(false)
            }
            EngineEvent::Error(message) => {
                error!("Playback error: {}", message);
                self.transition(PlaybackState::Error);
                SessionSignal::Finished(TerminationReason::Failed(message))
            }
        }
    }

    fn transition(&mut self, next: PlaybackState) {
        if self.state.is_terminal() || self.state == next {
            return;
        }
        info!("Playback state changed to: {:?}", next);
        self.state = next;
    }

    fn refresh_readings(&mut self) {
        if let Some(engine) = self.engine() {
            let position = engine.current_position();
            let duration = engine.duration();
            self.last_position_ms = position;
            if duration.is_some() {
                self.last_duration_ms = duration;
            }
        }
    }

    pub fn is_playing(&self) -> bool {
        self.engine().map(|e| e.is_playing()).unwrap_or(false)
    }

    /// Pause when the engine is playing, resume otherwise.
    ///
    /// Returns the glyph the button should show afterwards.
    pub fn toggle_play_pause(&mut self) -> Option<PlayGlyph> {
        let engine = self.engine_mut()?;
        if engine.is_playing() {
            engine.pause();
            Some(PlayGlyph::Play)
        } else {
            engine.play();
            Some(PlayGlyph::Pause)
        }
    }

    /// Pause without touching the glyph logic (host went to background)
    pub fn pause(&mut self) {
        if let Some(engine) = self.engine_mut() {
            engine.pause();
        }
    }

    /// Seek by `delta_ms`, clamped to the media. Returns the target.
    pub fn seek_relative(&mut self, delta_ms: i64) -> Option<u64> {
        let engine = self.engine_mut()?;
        let target = relative_target(engine.current_position(), delta_ms, engine.duration());
        engine.seek_to(target);
        self.last_position_ms = target;
        Some(target)
    }

    /// Seek to `fraction` of the duration. No-op while the duration is unknown.
    pub fn seek_absolute(&mut self, fraction: f64) -> Option<u64> {
        let engine = self.engine_mut()?;
        let Some(duration) = engine.duration() else {
            debug!("Scrub ignored, duration unknown");
            return None;
        };
        let target = position_for_fraction(fraction, duration);
        engine.seek_to(target);
        self.last_position_ms = target;
        Some(target)
    }

    pub fn set_speed(&mut self, speed: f32) {
        if let Some(engine) = self.engine_mut() {
            info!("Playback speed set to: {:.2}x", speed);
            engine.set_playback_speed(speed);
        }
    }

    pub fn set_rendition(&mut self, rendition: &Rendition) {
        if let Some(engine) = self.engine_mut() {
            info!("Rendition set to: {}", rendition.label);
            engine.set_track_size_constraints(rendition.constraint());
        }
    }

    pub fn tracks(&self) -> Vec<TrackGroup> {
        self.engine().map(|e| e.current_tracks()).unwrap_or_default()
    }

    /// Progress reading for the current tick
    pub fn progress(&mut self) -> Option<ProgressSnapshot> {
        self.refresh_readings();
        let engine = self.engine()?;
        Some(ProgressSnapshot::new(
            self.last_position_ms,
            self.last_duration_ms,
            engine.buffered_percentage(),
        ))
    }

    /// End the session and release the engine.
    ///
    /// Produces the outcome the first time only; every later call returns
    /// `None` without side effects.
    pub fn terminate(&mut self, reason: TerminationReason) -> Option<SessionOutcome> {
        let slot = std::mem::replace(&mut self.slot, EngineSlot::Released);
        match slot {
            EngineSlot::Released => {
                debug!("Session already terminated, ignoring {:?}", reason);
                return None;
            }
            EngineSlot::Active(mut engine) => {
                self.last_position_ms = engine.current_position();
                if let Some(duration) = engine.duration() {
                    self.last_duration_ms = Some(duration);
                }
                engine.release();
            }
            EngineSlot::Unstarted => {
                warn!("Terminating a session whose engine never started");
            }
        }

        info!("Session terminated: {:?}", reason);
        let position_ms = self.last_position_ms;
        Some(match reason {
            TerminationReason::RelatedContent => {
                SessionOutcome::RelatedContent(RelatedContentSignal { position_ms })
            }
            reason => SessionOutcome::Finished(SessionResult {
                position_ms,
                duration_ms: self.last_duration_ms.unwrap_or(0),
                completed: reason == TerminationReason::Ended,
            }),
        })
    }
}
