//! Configuration management for Surveyor.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides. The engine turns the `[scan]` and
//! `[workers]` sections into a resolved scan plan before a run starts.

use crate::error::{ConfigError, ConfigResult};
use crate::types::{Intensity, ParameterValue};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration.
///
/// This is loaded from `~/.config/surveyor/config.toml` (or platform
/// equivalent). If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// General settings
    pub general: GeneralConfig,
    /// Traversal policy
    pub scan: ScanConfig,
    /// Per-worker overrides, keyed by worker ID
    pub workers: BTreeMap<String, WorkerOverride>,
}

impl AppConfig {
    /// Load configuration from the default path, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load and validate configuration from a specific file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.display().to_string(),
            });
        }

        tracing::debug!("Loading config from {}", path.display());
        let contents = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `SURVEYOR_MAX_DEPTH`: Override the traversal depth limit
    /// - `SURVEYOR_MAX_INTENSITY`: Override the intensity ceiling
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup function.
    ///
    /// Unparseable values are rejected rather than silently ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("SURVEYOR_MAX_DEPTH") {
            let depth = val.trim().parse().map_err(|_| ConfigError::InvalidValue {
                field: "SURVEYOR_MAX_DEPTH".to_string(),
                reason: format!("expected a non-negative integer, got '{val}'"),
            })?;
            self.scan.max_depth = Some(depth);
            tracing::debug!("Override scan.max_depth from env: {}", depth);
        }

        if let Some(val) = lookup("SURVEYOR_MAX_INTENSITY") {
            let intensity = val
                .parse::<Intensity>()
                .map_err(|e| ConfigError::InvalidValue {
                    field: "SURVEYOR_MAX_INTENSITY".to_string(),
                    reason: e.to_string(),
                })?;
            self.scan.max_intensity = intensity;
            tracing::debug!("Override scan.max_intensity from env: {}", intensity);
        }

        Ok(())
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.scan.concurrency_cap == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "scan.concurrency_cap".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        for (id, worker) in &self.workers {
            if worker.concurrency == Some(0) {
                return Err(ConfigError::InvalidValue {
                    field: format!("workers.{id}.concurrency"),
                    reason: "must be at least 1".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Save configuration to the default path.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to a specific file.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        let config_dir = path.parent().ok_or_else(|| ConfigError::InvalidValue {
            field: "config_path".to_string(),
            reason: "no parent directory".to_string(),
        })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/surveyor/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs =
            ProjectDirs::from("com", "surveyor", "surveyor").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Override entry for one worker, if configured.
    #[must_use]
    pub fn worker(&self, id: &str) -> Option<&WorkerOverride> {
        self.workers.get(id)
    }
}

/// General settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Default `tracing` filter directive when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_filter: "info,surveyor=debug".to_string(),
        }
    }
}

/// Traversal policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Most invasive intensity allowed to run
    pub max_intensity: Intensity,
    /// Values deeper than this are never dispatched (unlimited if unset)
    pub max_depth: Option<u32>,
    /// Explicit allow-list of worker IDs; empty means every worker within the intensity ceiling
    pub enabled: Vec<String>,
    /// Worker IDs that never run
    pub disabled: Vec<String>,
    /// Upper bound applied to every worker's concurrency
    pub concurrency_cap: Option<u32>,
}

/// Per-worker configuration override.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerOverride {
    /// Force the worker on or off regardless of scan policy
    pub enabled: Option<bool>,
    /// Replacement for the descriptor's concurrency
    pub concurrency: Option<u32>,
    /// Parameter overrides, type-checked against the worker's schema
    pub parameters: BTreeMap<String, ParameterValue>,
}
