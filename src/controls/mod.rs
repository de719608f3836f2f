//! On-screen controls
//!
//! Overlay visibility with auto-hide, the screen lock and surface gesture
//! routing. These components hold plain state and return decisions; the
//! player controller applies them.

mod gesture;
mod lock;
mod visibility;

pub use gesture::{GestureCommand, GestureRouter};
pub use lock::{ControlProjection, LockController};
pub use visibility::{TimerDirective, VisibilityController};

/// Slide-in panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    None,
    Settings,
    Quality,
    Speed,
}

/// Overlay visibility record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlsVisibility {
    pub overlay_visible: bool,
    pub open_panel: Panel,
}

impl ControlsVisibility {
    pub const VISIBLE: Self = Self {
        overlay_visible: true,
        open_panel: Panel::None,
    };

    pub const HIDDEN: Self = Self {
        overlay_visible: false,
        open_panel: Panel::None,
    };

    /// An open panel implies a visible overlay
    pub fn is_consistent(&self) -> bool {
        self.open_panel == Panel::None || self.overlay_visible
    }
}

/// Tap recognised on the video surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TapGesture {
    /// Single tap confirmed (no second tap followed)
    SingleConfirmed,

    /// Double tap at horizontal position `x`
    Double { x: f32, surface_width: f32 },
}
