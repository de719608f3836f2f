//! Selection catalogs for the quality and speed panels
//!
//! Both catalogs keep exactly one highlighted entry and expose their
//! contents as [`MenuEntry`] rows for the panels.

mod rendition;
mod speed;

pub use rendition::{RebuildOutcome, Rendition, RenditionCatalog, AUTO_LABEL};
pub use speed::{SpeedCatalog, DEFAULT_SPEED, SPEEDS};

/// One row of a selection panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub label: String,
    pub selected: bool,
}

impl MenuEntry {
    pub fn new<S: Into<String>>(label: S, selected: bool) -> Self {
        Self {
            label: label.into(),
            selected,
        }
    }
}
