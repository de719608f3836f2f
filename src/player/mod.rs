//! Player controller module
//!
//! This module owns the playback session and orchestrates the controls,
//! catalogs, timers and the result bridge. Everything that can change
//! player state arrives as a [`PlayerEvent`] on a single queue and is
//! handled by [`PlayerController::handle`], one event at a time.

mod controller;
mod host;
mod scheduler;
mod session;

pub use controller::PlayerController;
pub use host::{PlayerHandle, PlayerHost};
pub use scheduler::{
    ManualScheduler, ManualTimer, ManualTimers, Scheduler, TimerHandle, TokioScheduler,
};
pub use session::{
    position_for_fraction, relative_target, PlaybackSession, SessionSignal, TerminationReason,
};

use crate::bridge::LaunchRequest;
use crate::catalog::{MenuEntry, RenditionCatalog, SpeedCatalog};
use crate::controls::{ControlProjection, ControlsVisibility, LockController};
use crate::engine::EngineEvent;
use crate::utils::format_time;

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Session not started
    Idle,

    /// Waiting for media data
    Buffering,

    /// Ready but not playing
    Ready,

    /// Currently playing
    Playing,

    /// Playback paused
    Paused,

    /// End of media reached
    Ended,

    /// Engine failure
    Error,
}

impl PlaybackState {
    pub fn is_terminal(self) -> bool {
        matches!(self, PlaybackState::Ended | PlaybackState::Error)
    }
}

/// Scheduled task kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// One-shot overlay auto-hide
    AutoHide,

    /// Repeating progress cadence
    Progress,
}

/// A timer firing, tagged with the arming it belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerEvent {
    pub kind: TimerKind,
    pub id: u64,
}

/// User input from the overlay and the video surface
#[derive(Debug, Clone, PartialEq)]
pub enum UserCommand {
    TogglePlayPause,
    SeekBackward,
    SeekForward,

    /// Scrub bar touch-down
    ScrubStart,

    /// Scrub bar moved to a fraction of the duration
    ScrubTo(f64),

    /// Scrub bar touch-up
    ScrubEnd,

    /// Confirmed single tap on the video surface
    SurfaceTap,

    /// Double tap on the video surface
    SurfaceDoubleTap { x: f32, surface_width: f32 },

    ToggleSettings,
    OpenQuality,
    OpenSpeed,

    /// Explicit close button or tap outside a panel
    ClosePanel,

    SelectQuality(String),
    SelectSpeed(f32),
    ToggleLock,

    /// Switch the surface between fit and fill
    ToggleResizeMode,

    /// On-screen back/close button
    Close,

    /// System back action
    SystemBack,

    /// Leave the player and show related content (episode list)
    ShowRelatedContent,
}

/// Host lifecycle notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    /// Host moved to the background
    Backgrounded,

    /// Host is going away
    Destroyed,
}

/// Everything the dispatcher reacts to
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    Engine(EngineEvent),
    Timer(TimerEvent),
    User(UserCommand),
    Host(HostEvent),
}

impl From<UserCommand> for PlayerEvent {
    fn from(command: UserCommand) -> Self {
        PlayerEvent::User(command)
    }
}

/// Icon on the play/pause button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayGlyph {
    Play,
    Pause,
}

/// Surface scaling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeMode {
    Fit,
    Fill,
}

impl ResizeMode {
    pub fn toggled(self) -> Self {
        match self {
            ResizeMode::Fit => ResizeMode::Fill,
            ResizeMode::Fill => ResizeMode::Fit,
        }
    }
}

/// Snapshot of everything the overlay renders.
///
/// Published as a whole after each handled event.
#[derive(Debug, Clone, PartialEq)]
pub struct UiState {
    pub title: String,

    /// Shown only when present
    pub subtitle: Option<String>,

    pub playback: PlaybackState,
    pub loading: bool,
    pub glyph: PlayGlyph,
    pub visibility: ControlsVisibility,
    pub locked: bool,
    pub controls: ControlProjection,
    pub renditions: Vec<MenuEntry>,
    pub speeds: Vec<MenuEntry>,
    pub resize_mode: ResizeMode,
    pub terminated: bool,
}

impl UiState {
    /// Snapshot shown before the session starts
    pub fn initial(request: &LaunchRequest) -> Self {
        let lock = LockController::new();
        Self {
            title: request.title.clone(),
            subtitle: Some(request.subtitle.clone()).filter(|s| !s.is_empty()),
            playback: PlaybackState::Idle,
            loading: false,
            glyph: PlayGlyph::Play,
            visibility: ControlsVisibility::VISIBLE,
            locked: lock.is_locked(),
            controls: lock.projection(),
            renditions: RenditionCatalog::new().entries(),
            speeds: SpeedCatalog::new().entries(),
            resize_mode: ResizeMode::Fit,
            terminated: false,
        }
    }
}

/// Progress reading taken on each cadence tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub position_ms: u64,
    pub duration_ms: Option<u64>,
    pub buffered_percent: u8,

    /// Scrub bar position, 0 to 1000
    pub scrub_permille: u16,

    /// Buffered bar position, 0 to 1000
    pub buffered_permille: u16,

    pub position_label: String,
    pub duration_label: String,
}

impl ProgressSnapshot {
    pub fn new(position_ms: u64, duration_ms: Option<u64>, buffered_percent: u8) -> Self {
        let buffered_percent = buffered_percent.min(100);
        let scrub_permille = match duration_ms {
            Some(duration) if duration > 0 => (position_ms.min(duration) * 1000 / duration) as u16,
            _ => 0,
        };

        Self {
            position_ms,
            duration_ms,
            buffered_percent,
            scrub_permille,
            buffered_permille: buffered_percent as u16 * 10,
            position_label: format_time(position_ms as i64),
            duration_label: format_time(duration_ms.unwrap_or(0) as i64),
        }
    }
}
