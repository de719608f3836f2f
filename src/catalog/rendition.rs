//! Rendition (quality) catalog

use crate::catalog::MenuEntry;
use crate::engine::{SizeConstraint, TrackGroup, TrackKind, VideoSize};
use log::{debug, info};
use std::collections::HashSet;

/// Label of the unconstrained entry
pub const AUTO_LABEL: &str = "Auto";

/// A selectable quality variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendition {
    pub label: String,

    /// `None` for Auto
    pub size: Option<VideoSize>,
}

impl Rendition {
    pub fn auto() -> Self {
        Self {
            label: AUTO_LABEL.to_string(),
            size: None,
        }
    }

    pub fn fixed(size: VideoSize) -> Self {
        Self {
            label: format!("{}p", size.height),
            size: Some(size),
        }
    }

    pub fn is_auto(&self) -> bool {
        self.size.is_none()
    }

    /// Engine constraint that selects exactly this rendition
    pub fn constraint(&self) -> SizeConstraint {
        match self.size {
            None => SizeConstraint::Unconstrained,
            Some(size) => SizeConstraint::Exact(size),
        }
    }
}

/// Result of rebuilding the catalog from fresh track metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildOutcome {
    /// Selection still present
    Kept,

    /// Selected rendition disappeared; selection is Auto again
    FellBack,
}

/// Available renditions plus the current selection
#[derive(Debug, Clone)]
pub struct RenditionCatalog {
    renditions: Vec<Rendition>,
    selected: usize,
}

impl Default for RenditionCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl RenditionCatalog {
    pub fn new() -> Self {
        Self {
            renditions: vec![Rendition::auto()],
            selected: 0,
        }
    }

    /// Rebuild from the engine's current tracks.
    ///
    /// Only supported video tracks with known dimensions are listed, one
    /// entry per height, in the order the engine reports them. A track
    /// without a width cannot be pinned exactly, so it is skipped.
    pub fn rebuild(&mut self, groups: &[TrackGroup]) -> RebuildOutcome {
        let previous = self.selected().label.clone();

        let mut seen = HashSet::new();
        let mut renditions = vec![Rendition::auto()];
        for group in groups.iter().filter(|g| g.kind == TrackKind::Video) {
            for track in group.tracks.iter().filter(|t| t.supported) {
                let (Some(width), Some(height)) = (track.width, track.height.filter(|h| *h > 0)) else {
                    continue;
                };
                if !seen.insert(height) {
                    continue;
                }
                renditions.push(Rendition::fixed(VideoSize { width, height }));
            }
        }

        self.renditions = renditions;
        match self.renditions.iter().position(|r| r.label == previous) {
            Some(index) => {
                self.selected = index;
                debug!("Rendition catalog rebuilt with {} entries", self.renditions.len());
                RebuildOutcome::Kept
            }
            None => {
                self.selected = 0;
                info!("Rendition {} no longer available, falling back to {}", previous, AUTO_LABEL);
                RebuildOutcome::FellBack
            }
        }
    }

    /// Select by label; unknown labels leave the selection unchanged
    pub fn select(&mut self, label: &str) -> Option<&Rendition> {
        let index = self
            .renditions
            .iter()
            .position(|r| r.label.eq_ignore_ascii_case(label))?;
        self.selected = index;
        Some(&self.renditions[index])
    }

    pub fn selected(&self) -> &Rendition {
        &self.renditions[self.selected]
    }

    pub fn renditions(&self) -> &[Rendition] {
        &self.renditions
    }

    pub fn entries(&self) -> Vec<MenuEntry> {
        self.renditions
            .iter()
            .enumerate()
            .map(|(i, r)| MenuEntry::new(r.label.clone(), i == self.selected))
            .collect()
    }
}
