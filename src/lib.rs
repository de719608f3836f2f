//! Lockstep Player - fullscreen playback control core
//!
//! Owns playback state, overlay visibility, the screen lock, rendition and
//! speed selection, gesture routing and the launch/result contract. Media
//! decoding stays behind the [`engine::Engine`] trait.

pub mod bridge;
pub mod catalog;
pub mod controls;
pub mod engine;
pub mod player;
pub mod utils;

pub use bridge::{LaunchParams, LaunchRequest, PlayerPlugin, SessionOutcome};
pub use player::{PlayerController, PlayerEvent, UserCommand};
pub use utils::{Config, PlayerError, Result};
