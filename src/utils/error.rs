//! Error types for the player core
//!
//! This module defines the error type shared by the session, the result
//! bridge and configuration loading. We use thiserror for the library
//! error type and leave anyhow to the binary.

use thiserror::Error;

/// Main error type for the player core
#[derive(Error, Debug)]
pub enum PlayerError {
    /// Launch request failed validation (missing or empty source URL)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// No launching context is available to host the player
    #[error("Context unavailable: {0}")]
    ContextUnavailable(String),

    /// Playback engine runtime failure
    #[error("Engine error: {0}")]
    Engine(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("File error: {0}")]
    FileIO(#[from] std::io::Error),

    /// Generic error for unexpected situations
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlayerError {
    /// Create an engine error from string
    pub fn engine_error<S: Into<String>>(msg: S) -> Self {
        PlayerError::Engine(msg.into())
    }

    /// Whether this error was raised before any session existed
    pub fn is_rejection(&self) -> bool {
        matches!(self, PlayerError::InvalidArgument(_) | PlayerError::ContextUnavailable(_))
    }
}

/// Convenience type alias for Results in the player core
pub type Result<T> = std::result::Result<T, PlayerError>;

/// Extension trait for converting other errors to PlayerError
pub trait IntoPlayerError<T> {
    /// Convert this error into a PlayerError with the given context
    fn engine_err(self, context: &str) -> Result<T>;
    fn config_err(self, context: &str) -> Result<T>;
}

impl<T, E: std::fmt::Display> IntoPlayerError<T> for std::result::Result<T, E> {
    fn engine_err(self, context: &str) -> Result<T> {
        self.map_err(|e| PlayerError::Engine(format!("{}: {}", context, e)))
    }

    fn config_err(self, context: &str) -> Result<T> {
        self.map_err(|e| PlayerError::Config(format!("{}: {}", context, e)))
    }
}
