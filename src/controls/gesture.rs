//! Video surface gesture routing

use crate::controls::TapGesture;

/// Command produced by a surface gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureCommand {
    ToggleVisibility,

    /// Relative seek in milliseconds
    SeekRelative(i64),

    /// Gesture swallowed without effect
    Consumed,
}

/// Maps taps on the video surface to commands
#[derive(Debug, Clone, Copy)]
pub struct GestureRouter {
    seek_step_ms: i64,
}

impl GestureRouter {
    pub fn new(seek_step_ms: u64) -> Self {
        Self {
            seek_step_ms: seek_step_ms as i64,
        }
    }

    /// Left half of the surface rewinds, right half (midpoint included)
    /// fast-forwards. A locked screen swallows double taps.
    pub fn route(&self, gesture: TapGesture, locked: bool) -> GestureCommand {
        match gesture {
            TapGesture::SingleConfirmed => GestureCommand::ToggleVisibility,
            TapGesture::Double { .. } if locked => GestureCommand::Consumed,
            TapGesture::Double { x, surface_width } => {
                if x < surface_width / 2.0 {
                    GestureCommand::SeekRelative(-self.seek_step_ms)
                } else {
                    GestureCommand::SeekRelative(self.seek_step_ms)
                }
            }
        }
    }
}
