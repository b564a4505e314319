//! Maintenance configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default step budget for one action
pub const DEFAULT_MAX_STEPS_PER_ACTION: u64 = 1_000_000;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Scheduler settings
    pub maintenance: MaintenanceConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .maintenance.yml
        let local_config = PathBuf::from(".maintenance.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/maintenance/maintenance.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("maintenance").join("maintenance.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Scheduler settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaintenanceConfig {
    /// Worker threads started by `mt run`; 0 runs everything inline
    pub threads: usize,

    /// Seconds an equal description stays blocked after its action finished
    #[serde(rename = "seconds-actions-block")]
    pub seconds_actions_block: u64,

    /// Upper bound on successful steps per action
    ///
    /// An action still asking for more work at the limit is failed, so a
    /// step that never returns false cannot pin a worker forever. `~` (null)
    /// removes the bound.
    #[serde(rename = "max-steps-per-action")]
    pub max_steps_per_action: Option<u64>,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            threads: 2,
            seconds_actions_block: 2,
            max_steps_per_action: Some(DEFAULT_MAX_STEPS_PER_ACTION),
        }
    }
}

impl MaintenanceConfig {
    /// Get the cooldown window as a Duration
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.seconds_actions_block)
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Log file; stderr when unset
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}
