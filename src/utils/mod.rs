//! Utility module for the player core
//!
//! This module provides common utilities used throughout the crate:
//! - Error handling with custom error types
//! - Configuration management
//! - Time label formatting

pub mod config;
pub mod error;

// Re-export commonly used items
pub use config::{Config, ControlsConfig, GeneralConfig, NetworkConfig, SessionConfig};
pub use error::{IntoPlayerError, PlayerError, Result};

/// Initialize the application configuration
///
/// Loads configuration from:
/// 1. Default values
/// 2. System configuration file
/// 3. User configuration file
/// 4. Environment variables
pub fn load_config() -> Result<Config> {
    Config::load()
}

/// Format a millisecond position for the time labels
///
/// Negative input is treated as zero. Positions under an hour render as
/// "M:SS", longer ones as "H:MM:SS".
pub fn format_time(millis: i64) -> String {
    let total_secs = millis.max(0) / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

/// Clamp a value between min and max
pub fn clamp<T: PartialOrd>(value: T, min: T, max: T) -> T {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}
