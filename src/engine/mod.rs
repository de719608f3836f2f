//! Playback engine boundary
//!
//! The engine does decoding, buffering, adaptive bitrate and network fetch.
//! None of that lives in this crate: the player core only consumes the
//! capability set below and reacts to the events the engine posts through
//! its [`EngineListener`].

mod simulated;
mod source;

pub use simulated::{SimulatedEngine, SimulatedEngineFactory, SimulatedMedia};
pub use source::{HttpSettings, SourceDescriptor, StreamKind};

use crate::player::PlayerEvent;
use crate::utils::error::Result;
use tokio::sync::mpsc;

/// Largest frame size of the SD cap applied to the first load
pub const SD_MAX_SIZE: VideoSize = VideoSize { width: 848, height: 480 };

/// Playback engine trait
///
/// Commands are fire-and-forget: their effect shows up in the next state
/// event or progress reading. Only `prepare` can fail synchronously.
pub trait Engine: Send {
    /// Open the source and start buffering
    fn prepare(&mut self, source: &SourceDescriptor) -> Result<()>;

    /// Start or resume playback once ready
    fn play(&mut self);

    /// Pause playback
    fn pause(&mut self);

    /// Seek to an absolute position in milliseconds
    fn seek_to(&mut self, position_ms: u64);

    /// Set playback speed multiplier (1.0 = normal)
    fn set_playback_speed(&mut self, speed: f32);

    /// Current position in milliseconds
    fn current_position(&self) -> u64;

    /// Media duration in milliseconds, `None` while unknown
    fn duration(&self) -> Option<u64>;

    /// Buffered share of the media (0 to 100)
    fn buffered_percentage(&self) -> u8;

    /// Whether the engine is actually playing right now
    fn is_playing(&self) -> bool;

    /// Restrict which video renditions adaptive selection may pick
    fn set_track_size_constraints(&mut self, constraint: SizeConstraint);

    /// Track groups of the loaded media
    fn current_tracks(&self) -> Vec<TrackGroup>;

    /// Release all engine resources. No other call follows this one.
    fn release(&mut self);
}

/// Creates engine instances bound to a listener
pub trait EngineFactory: Send + Sync {
    fn create(&self, listener: EngineListener) -> Result<Box<dyn Engine>>;
}

impl<F> EngineFactory for F
where
    F: Fn(EngineListener) -> Result<Box<dyn Engine>> + Send + Sync,
{
    fn create(&self, listener: EngineListener) -> Result<Box<dyn Engine>> {
        self(listener)
    }
}

/// Engine playback state as reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Buffering,
    Ready,
    Ended,
}

/// Events an engine posts back to the player
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Engine playback state changed
    StateChanged(EngineState),

    /// The engine's actual playing flag changed
    PlayingChanged(bool),

    /// Runtime failure; the engine is unusable afterwards
    Error(String),
}

/// Sending side handed to an engine so it can post events
#[derive(Debug, Clone)]
pub struct EngineListener {
    tx: mpsc::UnboundedSender<PlayerEvent>,
}

impl EngineListener {
    pub fn new(tx: mpsc::UnboundedSender<PlayerEvent>) -> Self {
        Self { tx }
    }

    pub fn state_changed(&self, state: EngineState) {
        self.post(EngineEvent::StateChanged(state));
    }

    pub fn playing_changed(&self, playing: bool) {
        self.post(EngineEvent::PlayingChanged(playing));
    }

    pub fn error<S: Into<String>>(&self, message: S) {
        self.post(EngineEvent::Error(message.into()));
    }

    fn post(&self, event: EngineEvent) {
        // The receiver only goes away after the session is over
        let _ = self.tx.send(PlayerEvent::Engine(event));
    }
}

/// Track type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Video,
    Audio,
    Text,
}

/// Format of a single track inside a group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackFormat {
    pub width: Option<u32>,
    pub height: Option<u32>,

    /// Whether the device can play this track
    pub supported: bool,
}

impl TrackFormat {
    pub fn video(width: u32, height: u32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            supported: true,
        }
    }

    pub fn unsupported(mut self) -> Self {
        self.supported = false;
        self
    }
}

/// Group of interchangeable tracks of one kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackGroup {
    pub kind: TrackKind,
    pub tracks: Vec<TrackFormat>,
}

/// Video frame size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VideoSize {
    pub width: u32,
    pub height: u32,
}

/// Video size constraint for adaptive track selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeConstraint {
    /// Engine picks freely
    Unconstrained,

    /// Min and max pinned to the same size
    Exact(VideoSize),

    /// Upper bound only
    AtMost(VideoSize),
}

impl SizeConstraint {
    /// Whether a track of the given size may be selected
    pub fn admits(&self, size: VideoSize) -> bool {
        match self {
            SizeConstraint::Unconstrained => true,
            SizeConstraint::Exact(pinned) => *pinned == size,
            SizeConstraint::AtMost(max) => size.width <= max.width && size.height <= max.height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_constraint_admits() {
        let hd = VideoSize { width: 1280, height: 720 };
        let sd = VideoSize { width: 640, height: 360 };

        assert!(SizeConstraint::Unconstrained.admits(hd));
        assert!(SizeConstraint::Exact(hd).admits(hd));
        assert!(!SizeConstraint::Exact(hd).admits(sd));
        assert!(SizeConstraint::AtMost(SD_MAX_SIZE).admits(sd));
        assert!(!SizeConstraint::AtMost(SD_MAX_SIZE).admits(hd));
    }

    #[test]
    fn test_listener_posts_engine_events() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let listener = EngineListener::new(tx);

        listener.state_changed(EngineState::Buffering);
        listener.playing_changed(true);
        listener.error("decoder init failed");

        assert_eq!(
            rx.try_recv().unwrap(),
            PlayerEvent::Engine(EngineEvent::StateChanged(EngineState::Buffering))
        );
        assert_eq!(rx.try_recv().unwrap(), PlayerEvent::Engine(EngineEvent::PlayingChanged(true)));
        assert_eq!(
            rx.try_recv().unwrap(),
            PlayerEvent::Engine(EngineEvent::Error("decoder init failed".to_string()))
        );
    }

    #[test]
    fn test_listener_survives_closed_receiver() {
        let (tx, rx) = mpsc::unbounded_channel();
        let listener = EngineListener::new(tx);
        drop(rx);
        listener.state_changed(EngineState::Ended);
    }
}
