//! Configuration management for diffsync
//!
//! This module provides configuration structures and defaults for the line
//! matcher, the sync controller and the text buffers.

use std::path::Path;
use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{DiffSyncError, Result};
use crate::matcher::MatchAlgorithm;

/// Global configuration for diffsync
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffSyncConfig {
    /// Line matcher configuration
    pub matcher: MatcherConfig,
    /// Recompute scheduling configuration
    pub sync: SyncConfig,
    /// Text buffer configuration
    pub buffer: BufferConfig,
}

/// Configuration for the line matcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Compare lines with all whitespace removed
    pub ignore_whitespace: bool,
    /// Minimum similarity (0.0 - 1.0) for a changed region to get intra-line highlighting
    pub similarity_threshold: f32,
    /// Sequence matching algorithm
    pub algorithm: MatchAlgorithm,
    /// Largest edit cost searched before giving up on an alignment
    pub max_edit_cost: usize,
    /// Time limit for one alignment in milliseconds (0 disables it)
    pub deadline_ms: u64,
    /// Number of refined changed regions kept in the highlight cache
    pub refine_cache_size: usize,
}

/// How much of the buffers a recompute matches again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecomputeScope {
    /// Always match the whole buffers
    Full,
    /// Skip the edges the previous alignment and the edits prove unchanged
    #[default]
    Scoped,
}

/// Configuration for the sync controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Recompute scoping
    pub scope: RecomputeScope,
    /// Quiet period after the last edit before a render tick recomputes
    pub debounce_ms: u64,
    /// Run recomputes on a background worker thread
    pub background: bool,
}

/// Configuration for text buffers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Maximum number of undo steps kept per buffer
    pub undo_limit: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            ignore_whitespace: false,
            similarity_threshold: 0.5,
            algorithm: MatchAlgorithm::Myers,
            max_edit_cost: 4096,
            deadline_ms: 2000,
            refine_cache_size: 500,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            scope: RecomputeScope::Scoped,
            debounce_ms: 30,
            background: false,
        }
    }
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self { undo_limit: 1000 }
    }
}

impl MatcherConfig {
    /// Get the alignment deadline, if any
    pub fn deadline(&self) -> Option<Duration> {
        (self.deadline_ms > 0).then(|| Duration::from_millis(self.deadline_ms))
    }
}

impl SyncConfig {
    /// Get debounce duration
    pub fn debounce_duration(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Configuration loading and management
impl DiffSyncConfig {
    /// Parse configuration from TOML text; missing keys take defaults
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| DiffSyncError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| DiffSyncError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    /// Serialize configuration to TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| DiffSyncError::Config(e.to_string()))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Override fields with environment variables if present
    pub fn apply_env(&mut self) {
        if let Ok(val) = std::env::var("DIFFSYNC_IGNORE_WHITESPACE") {
            if let Ok(flag) = val.parse::<bool>() {
                self.matcher.ignore_whitespace = flag;
            }
        }

        if let Ok(val) = std::env::var("DIFFSYNC_SIMILARITY_THRESHOLD") {
            if let Ok(threshold) = val.parse::<f32>() {
                self.matcher.similarity_threshold = threshold;
            }
        }

        if let Ok(val) = std::env::var("DIFFSYNC_MAX_EDIT_COST") {
            if let Ok(cost) = val.parse::<usize>() {
                self.matcher.max_edit_cost = cost;
            }
        }

        if let Ok(val) = std::env::var("DIFFSYNC_SCOPE") {
            if let Ok(scope) = RecomputeScope::from_str(&val, true) {
                self.sync.scope = scope;
            }
        }

        if let Ok(val) = std::env::var("DIFFSYNC_DEBOUNCE_MS") {
            if let Ok(ms) = val.parse::<u64>() {
                self.sync.debounce_ms = ms;
            }
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let threshold = self.matcher.similarity_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(DiffSyncError::Config(format!(
                "similarity_threshold must be between 0.0 and 1.0, got {}",
                threshold
            )));
        }

        if self.matcher.max_edit_cost == 0 {
            return Err(DiffSyncError::Config(
                "max_edit_cost must be greater than 0".to_string(),
            ));
        }

        if self.matcher.refine_cache_size == 0 {
            return Err(DiffSyncError::Config(
                "refine_cache_size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DiffSyncConfig::default();

        assert!(!config.matcher.ignore_whitespace);
        assert_eq!(config.matcher.similarity_threshold, 0.5);
        assert_eq!(config.sync.scope, RecomputeScope::Scoped);
        assert_eq!(config.buffer.undo_limit, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = DiffSyncConfig::default();
        config.matcher.similarity_threshold = 1.5;
        assert!(config.validate().is_err());

        config.matcher.similarity_threshold = 0.0;
        config.matcher.max_edit_cost = 0;
        assert!(config.validate().is_err());

        config.matcher.max_edit_cost = 10;
        config.matcher.refine_cache_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duration_conversions() {
        let config = DiffSyncConfig::default();

        assert_eq!(config.sync.debounce_duration(), Duration::from_millis(30));
        assert_eq!(config.matcher.deadline(), Some(Duration::from_secs(2)));

        let matcher = MatcherConfig {
            deadline_ms: 0,
            ..MatcherConfig::default()
        };
        assert_eq!(matcher.deadline(), None);
    }

    #[test]
    fn test_toml_round_trip() {
        let text = r#"
            [matcher]
            ignore_whitespace = true
            algorithm = "patience"

            [sync]
            scope = "full"
        "#;
        let config = DiffSyncConfig::from_toml_str(text).unwrap();
        assert!(config.matcher.ignore_whitespace);
        assert_eq!(config.matcher.algorithm, MatchAlgorithm::Patience);
        assert_eq!(config.sync.scope, RecomputeScope::Full);
        assert_eq!(config.sync.debounce_ms, 30);

        let rendered = config.to_toml_string().unwrap();
        assert_eq!(DiffSyncConfig::from_toml_str(&rendered).unwrap(), config);
    }

    #[test]
    fn test_invalid_toml_is_a_config_error() {
        let text = "[matcher]\nsimilarity_threshold = 2.0";
        let err = DiffSyncConfig::from_toml_str(text).unwrap_err();
        assert!(matches!(err, DiffSyncError::Config(_)));
    }

    #[test]
    fn test_env_config_loading() {
        std::env::set_var("DIFFSYNC_SCOPE", "full");
        std::env::set_var("DIFFSYNC_DEBOUNCE_MS", "75");

        let config = DiffSyncConfig::from_env();

        assert_eq!(config.sync.scope, RecomputeScope::Full);
        assert_eq!(config.sync.debounce_ms, 75);

        // Cleanup
        std::env::remove_var("DIFFSYNC_SCOPE");
        std::env::remove_var("DIFFSYNC_DEBOUNCE_MS");
    }
}
