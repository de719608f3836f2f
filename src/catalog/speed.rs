//! Playback speed catalog

use crate::catalog::MenuEntry;

/// Offered playback speeds, slowest first
pub const SPEEDS: [f32; 7] = [0.5, 0.75, 1.0, 1.25, 1.5, 1.75, 2.0];

pub const DEFAULT_SPEED: f32 = 1.0;

/// Fixed speed list plus the current selection
#[derive(Debug, Clone)]
pub struct SpeedCatalog {
    selected: usize,
}

impl Default for SpeedCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeedCatalog {
    pub fn new() -> Self {
        Self {
            selected: Self::index_of(DEFAULT_SPEED).unwrap_or(2),
        }
    }

    fn index_of(speed: f32) -> Option<usize> {
        SPEEDS.iter().position(|s| (s - speed).abs() < 0.001)
    }

    /// Select one of the offered speeds; anything else is rejected
    pub fn select(&mut self, speed: f32) -> Option<f32> {
        let index = Self::index_of(speed)?;
        self.selected = index;
        Some(SPEEDS[index])
    }

    pub fn selected(&self) -> f32 {
        SPEEDS[self.selected]
    }

    pub fn label(speed: f32) -> String {
        if speed == DEFAULT_SPEED {
            "Normal".to_string()
        } else {
            format!("{:?}x", speed)
        }
    }

    pub fn entries(&self) -> Vec<MenuEntry> {
        SPEEDS
            .iter()
            .enumerate()
            .map(|(i, s)| MenuEntry::new(Self::label(*s), i == self.selected))
            .collect()
    }
}
