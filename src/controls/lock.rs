//! Screen lock
//!
//! While locked every on-screen control except the lock button is hidden
//! and inert. Tapping the surface to show or hide the overlay keeps
//! working.

use crate::player::UserCommand;
use log::info;

/// Which on-screen controls are shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlProjection {
    pub play_pause: bool,
    pub seek_buttons: bool,
    pub scrub_bar: bool,
    pub speed: bool,
    pub quality: bool,
    pub settings: bool,
    pub episodes: bool,
    pub close: bool,
    pub resize: bool,
    pub lock: bool,
}

impl ControlProjection {
    fn all(shown: bool) -> Self {
        Self {
            play_pause: shown,
            seek_buttons: shown,
            scrub_bar: shown,
            speed: shown,
            quality: shown,
            settings: shown,
            episodes: shown,
            close: shown,
            resize: shown,
            lock: true,
        }
    }
}

/// Lock state holder
#[derive(Debug, Clone, Copy, Default)]
pub struct LockController {
    locked: bool,
}

impl LockController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Flip the lock and return the new state
    pub fn toggle(&mut self) -> bool {
        self.locked = !self.locked;
        info!("Controls {}", if self.locked { "locked" } else { "unlocked" });
        self.locked
    }

    pub fn projection(&self) -> ControlProjection {
        ControlProjection::all(!self.locked)
    }

    /// Whether `command` may run in the current lock state.
    ///
    /// System back is not an on-screen control and stays available; a
    /// double tap is let through so the gesture router can consume it.
    pub fn permits(&self, command: &UserCommand) -> bool {
        if !self.locked {
            return true;
        }
        matches!(
            command,
            UserCommand::ToggleLock
                | UserCommand::SurfaceTap
                | UserCommand::SurfaceDoubleTap { .. }
                | UserCommand::SystemBack
                | UserCommand::ScrubEnd
        )
    }
}
