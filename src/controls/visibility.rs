//! Overlay visibility and auto-hide state machine
//!
//! The controller never touches timers itself. Every transition returns a
//! [`TimerDirective`] and the dispatcher arms or cancels the auto-hide
//! timer accordingly.

use crate::controls::{ControlsVisibility, Panel};
use crate::player::PlaybackState;
use log::debug;

/// What the dispatcher must do with the auto-hide timer after a transition
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerDirective {
    /// Cancel any pending timer and start a fresh one
    Arm,

    /// Cancel any pending timer
    Disarm,

    /// Leave the timer as it is
    Keep,
}

/// Overlay visibility controller
#[derive(Debug, Clone)]
pub struct VisibilityController {
    current: ControlsVisibility,

    /// Scrub bar is being dragged
    scrubbing: bool,
}

impl Default for VisibilityController {
    fn default() -> Self {
        Self::new()
    }
}

impl VisibilityController {
    /// Controls start out visible
    pub fn new() -> Self {
        Self {
            current: ControlsVisibility::VISIBLE,
            scrubbing: false,
        }
    }

    pub fn state(&self) -> ControlsVisibility {
        self.current
    }

    pub fn open_panel(&self) -> Panel {
        self.current.open_panel
    }

    fn replace(&mut self, next: ControlsVisibility) {
        debug_assert!(next.is_consistent());
        if next != self.current {
            debug!("Controls visibility {:?} -> {:?}", self.current, next);
        }
        self.current = next;
    }

    /// Whether a timer firing now could hide the overlay
    pub fn wants_auto_hide(&self) -> bool {
        self.current.overlay_visible && self.current.open_panel == Panel::None && !self.scrubbing
    }

    /// Button press or other interaction with the overlay
    pub fn interaction(&mut self) -> TimerDirective {
        if self.current.open_panel != Panel::None {
            return TimerDirective::Keep;
        }
        self.replace(ControlsVisibility::VISIBLE);
        if self.scrubbing {
            TimerDirective::Keep
        } else {
            TimerDirective::Arm
        }
    }

    /// Confirmed single tap on the video surface
    pub fn toggle(&mut self) -> TimerDirective {
        if self.current.overlay_visible {
            self.replace(ControlsVisibility::HIDDEN);
            TimerDirective::Disarm
        } else {
            self.replace(ControlsVisibility::VISIBLE);
            TimerDirective::Arm
        }
    }

    pub fn show_panel(&mut self, panel: Panel) -> TimerDirective {
        if panel == Panel::None {
            return self.close_panel();
        }
        self.replace(ControlsVisibility {
            overlay_visible: true,
            open_panel: panel,
        });
        TimerDirective::Disarm
    }

    /// Open `panel`, or close it when it is already the open one
    pub fn toggle_panel(&mut self, panel: Panel) -> TimerDirective {
        if self.current.open_panel == panel {
            self.close_panel()
        } else {
            self.show_panel(panel)
        }
    }

    /// Close whatever panel is open (explicit close, outside tap, back)
    pub fn close_panel(&mut self) -> TimerDirective {
        if self.current.open_panel == Panel::None {
            return TimerDirective::Keep;
        }
        self.replace(ControlsVisibility::VISIBLE);
        TimerDirective::Arm
    }

    pub fn scrub_started(&mut self) -> TimerDirective {
        self.scrubbing = true;
        if self.current.open_panel == Panel::None {
            self.replace(ControlsVisibility::VISIBLE);
        }
        TimerDirective::Disarm
    }

    pub fn scrub_finished(&mut self) -> TimerDirective {
        if !self.scrubbing {
            return TimerDirective::Keep;
        }
        self.scrubbing = false;
        if self.wants_auto_hide() {
            TimerDirective::Arm
        } else {
            TimerDirective::Keep
        }
    }

    /// Auto-hide timer expired. Returns true when the overlay was hidden.
    pub fn timer_fired(&mut self, playback: PlaybackState, locked: bool) -> bool {
        if self.wants_auto_hide() && playback == PlaybackState::Playing && !locked {
            self.replace(ControlsVisibility::HIDDEN);
            true
        } else {
            debug!(
                "Auto-hide ignored (visibility {:?}, playback {:?}, locked {})",
                self.current, playback, locked
            );
            false
        }
    }
}
