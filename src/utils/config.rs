//! Configuration management for the player core
//!
//! This module handles loading and managing configuration from config
//! files and environment variables.

use crate::utils::error::{IntoPlayerError, PlayerError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// On-screen controls behaviour
    pub controls: ControlsConfig,

    /// Playback session settings
    pub session: SessionConfig,

    /// Settings handed to the engine's HTTP data source
    pub network: NetworkConfig,

    /// General application settings
    pub general: GeneralConfig,
}

/// Controls configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    /// Inactivity delay before the overlay auto-hides
    pub auto_hide_ms: u64,

    /// Step used by the rewind/forward buttons and double-tap gestures
    pub seek_step_ms: u64,
}

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Progress cadence
    pub progress_interval_ms: u64,

    /// Cap the first load at SD until the user picks a rendition
    pub cap_initial_quality_sd: bool,
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub user_agent: String,
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
    pub allow_cross_protocol_redirects: bool,
}

/// General application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            auto_hide_ms: 4000,
            seek_step_ms: 10_000,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            progress_interval_ms: 1000,
            cap_initial_quality_sd: true,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Linux; Android 12) AppleWebKit/537.36 Chrome/120.0.0.0 Mobile Safari/537.36"
                .to_string(),
            connect_timeout_ms: 15_000,
            read_timeout_ms: 15_000,
            allow_cross_protocol_redirects: true,
        }
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl ControlsConfig {
    pub fn auto_hide_delay(&self) -> Duration {
        Duration::from_millis(self.auto_hide_ms)
    }
}

impl SessionConfig {
    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }
}

impl Config {
    /// Load configuration from various sources
    ///
    /// Configuration is loaded in the following order (later sources override earlier):
    /// 1. Default values
    /// 2. System config file (/etc/lockstep-player/config.toml on Linux)
    /// 3. User config file (~/.config/lockstep-player/config.toml on Linux)
    /// 4. Environment variables (LOCKSTEP_* prefix)
    pub fn load() -> Result<Self> {
        let layers: Vec<PathBuf> = [Self::system_config_path(), Self::user_config_path()]
            .into_iter()
            .flatten()
            .filter(|path| path.exists())
            .collect();

        Self::load_layered(&layers)
    }

    /// Load configuration from an explicit file, then apply environment overrides
    pub fn load_from(path: &Path) -> Result<Self> {
        Self::load_layered(&[path])
    }

    /// Merge config files over the defaults in order, then apply environment overrides.
    ///
    /// Keys a file omits keep the value from the files before it.
    pub fn load_layered<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let toml::Value::Table(mut merged) =
            toml::Value::try_from(Self::default()).config_err("Failed to serialize defaults")?
        else {
            return Err(PlayerError::Config("Defaults are not a table".to_string()));
        };

        for path in paths {
            merge_tables(&mut merged, Self::read_table(path.as_ref())?);
        }

        let mut config: Self = toml::Value::Table(merged)
            .try_into()
            .config_err("Failed to parse config file")?;
        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Save configuration to the given path, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).config_err("Failed to create config directory")?;
        }

        let toml = toml::to_string_pretty(self).config_err("Failed to serialize config")?;
        std::fs::write(path, toml).config_err("Failed to write config file")?;

        Ok(())
    }

    fn read_table(path: &Path) -> Result<toml::Table> {
        let contents = std::fs::read_to_string(path).config_err("Failed to read config file")?;
        toml::from_str(&contents).config_err("Failed to parse config file")
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(value) = std::env::var("LOCKSTEP_AUTO_HIDE_MS") {
            self.controls.auto_hide_ms = value
                .parse()
                .map_err(|_| PlayerError::Config("Invalid LOCKSTEP_AUTO_HIDE_MS".to_string()))?;
        }

        if let Ok(value) = std::env::var("LOCKSTEP_SEEK_STEP_MS") {
            self.controls.seek_step_ms = value
                .parse()
                .map_err(|_| PlayerError::Config("Invalid LOCKSTEP_SEEK_STEP_MS".to_string()))?;
        }

        if let Ok(log_level) = std::env::var("LOCKSTEP_LOG_LEVEL") {
            self.general.log_level = log_level;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.controls.auto_hide_ms == 0 {
            return Err(PlayerError::Config("Auto-hide delay must be non-zero".to_string()));
        }

        if self.controls.seek_step_ms == 0 {
            return Err(PlayerError::Config("Seek step must be non-zero".to_string()));
        }

        if self.session.progress_interval_ms == 0 {
            return Err(PlayerError::Config("Progress interval must be non-zero".to_string()));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.general.log_level.as_str()) {
            return Err(PlayerError::Config(format!(
                "Invalid log level '{}', must be one of: {:?}",
                self.general.log_level, valid_log_levels
            )));
        }

        Ok(())
    }

    /// Get system config file path
    fn system_config_path() -> Option<PathBuf> {
        #[cfg(target_os = "linux")]
        return Some(PathBuf::from("/etc/lockstep-player/config.toml"));

        #[cfg(target_os = "windows")]
        return std::env::var("PROGRAMDATA")
            .ok()
            .map(|p| PathBuf::from(p).join("LockstepPlayer").join("config.toml"));

        #[cfg(target_os = "macos")]
        return Some(PathBuf::from("/Library/Application Support/LockstepPlayer/config.toml"));

        #[allow(unreachable_code)]
        None
    }

    /// Get user config file path
    fn user_config_path() -> Option<PathBuf> {
        #[cfg(target_os = "linux")]
        return dirs::config_dir().map(|p| p.join("lockstep-player").join("config.toml"));

        #[cfg(not(target_os = "linux"))]
        return dirs::config_dir().map(|p| p.join("LockstepPlayer").join("config.toml"));
    }
}

/// Overlay `layer` onto `base`, descending into tables present in both
fn merge_tables(base: &mut toml::Table, layer: toml::Table) {
    for (key, value) in layer {
        match value {
            toml::Value::Table(incoming) if matches!(base.get(&key), Some(toml::Value::Table(_))) => {
                if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
                    merge_tables(existing, incoming);
                }
            }
            value => {
                base.insert(key, value);
            }
        }
    }
}
