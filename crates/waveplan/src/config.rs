//! Planner configuration.
//!
//! Loaded from `waveplan.toml` in the working directory or a user-specified
//! path. All thresholds are plain configuration constants; nothing here is
//! derived from input data.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Top-level configuration for the wave planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Number of waves to plan per environment.
    pub target_waves: usize,

    /// Preferred lower bound on wave population. Informational only: the
    /// validator reports breaches, the repair engine does not enforce it.
    pub min_wave_size: usize,

    /// Preferred upper bound on wave population. Informational only.
    pub max_wave_size: usize,

    /// Sources at or above this BCP score must have all same-environment
    /// application dependencies in their own wave.
    pub colocation_bcp_threshold: f64,

    /// Sources at or above this BCP score with heavy edges must have the
    /// target in the same or immediately preceding wave.
    pub critical_bcp_threshold: f64,

    /// Edge weight above which a critical source's dependency counts as
    /// heavy.
    pub critical_weight_threshold: f64,

    /// Applications at or above this BCP score must not sit in the first or
    /// last wave of their environment.
    pub mission_critical_bcp_threshold: f64,

    /// Cap on full repair passes.
    pub max_repair_passes: usize,

    /// Cap on the secondary sequencing-correction passes that run after the
    /// main repair loop.
    pub max_sequencing_passes: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            target_waves: 8,
            min_wave_size: 15,
            max_wave_size: 25,
            colocation_bcp_threshold: 8.0,
            critical_bcp_threshold: 7.0,
            critical_weight_threshold: 7.0,
            mission_critical_bcp_threshold: 9.0,
            max_repair_passes: 40,
            max_sequencing_passes: 40,
        }
    }
}

impl PlannerConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed(path.into(), e))?;
        let parsed: Self =
            toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(path.into(), e))?;
        parsed.validate()?;
        Ok(parsed)
    }

    /// Discover and load configuration.
    ///
    /// Search order:
    /// 1. Explicit path (if provided)
    /// 2. `./waveplan.toml`
    ///
    /// Returns defaults when no config file is found.
    pub fn discover(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit_path {
            return Self::load(path);
        }
        let candidate = PathBuf::from("waveplan.toml");
        if candidate.exists() {
            return Self::load(&candidate);
        }
        Ok(Self::default())
    }

    /// Serialize this configuration to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::SerializeFailed)
    }

    /// Reject configurations the planner cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_waves == 0 {
            return Err(ConfigError::ValidationFailed(
                "target_waves must be at least 1".to_string(),
            ));
        }
        if self.min_wave_size > self.max_wave_size {
            return Err(ConfigError::ValidationFailed(format!(
                "min_wave_size ({}) exceeds max_wave_size ({})",
                self.min_wave_size, self.max_wave_size
            )));
        }
        if self.max_repair_passes == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_repair_passes must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

// -- Errors --

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),

    #[error("failed to parse config file {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),

    #[error("failed to serialize config: {0}")]
    SerializeFailed(toml::ser::Error),

    #[error("config validation failed: {0}")]
    ValidationFailed(String),
}
