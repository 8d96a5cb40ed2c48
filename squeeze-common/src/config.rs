//! Configuration management for squeeze tools.
//!
//! Shared settings live in `~/.squeeze/config.json`. Module-specific settings
//! (the engine's screening, portfolio and pair parameters) live in sibling
//! files loaded through [`crate::config_loader`].
//!
//! # Configuration Priority
//!
//! 1. Environment variables (SQUEEZE_* prefix)
//! 2. Explicit config file values
//! 3. Default values
//!
//! # Environment Variable Mapping
//!
//! - `SQUEEZE_LOG_LEVEL` → observability.log_level
//! - `SQUEEZE_LOG_FORMAT` → observability.log_format
//! - `SQUEEZE_UNIVERSE_PATH` → data.universe_path

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".squeeze"),
        |dirs| dirs.home_dir().join(".squeeze"),
    )
}

/// Get the configuration file path.
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Expand `~` and environment variables in a user supplied path.
pub fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::full(raw).map_or_else(|_| raw.to_string(), |p| p.into_owned()))
}

// ============================================================================
// Observability Configuration
// ============================================================================

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level", alias = "level")]
    pub log_level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format", alias = "format")]
    pub log_format: String,

    /// Additional module targets to hold at `warn`.
    #[serde(default)]
    pub excluded_targets: Vec<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            excluded_targets: Vec::new(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}

// ============================================================================
// Data Configuration
// ============================================================================

/// Where the data collaborator drops universe snapshots.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataConfig {
    /// Default universe snapshot (JSON array of security records)
    #[serde(default)]
    pub universe_path: Option<String>,
}

impl DataConfig {
    /// The configured universe path with `~` expanded.
    pub fn resolved_universe_path(&self) -> Option<PathBuf> {
        self.universe_path.as_deref().map(expand_path)
    }
}

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration shared by squeeze binaries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Logging
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Data snapshot locations
    #[serde(default)]
    pub data: DataConfig,
}

impl Config {
    /// Load configuration from the default path.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            tracing::debug!("Config file not found, using defaults");
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Load configuration with environment variable overrides applied.
    pub fn load_with_env() -> Result<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(level) = lookup("SQUEEZE_LOG_LEVEL") {
            self.observability.log_level = level;
        }
        if let Some(format) = lookup("SQUEEZE_LOG_FORMAT") {
            self.observability.log_format = format;
        }
        if let Some(path) = lookup("SQUEEZE_UNIVERSE_PATH") {
            self.data.universe_path = Some(path);
        }
    }

    /// Save configuration to the default path.
    pub fn save(&self) -> Result<()> {
        let dir = config_dir();
        if !dir.exists() {
            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create config directory {}", dir.display()))?;
        }

        let path = config_path();
        let content = serde_json::to_string_pretty(self)?;
        fs::write(&path, content)
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }
}
