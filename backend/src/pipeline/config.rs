//! Pipeline configuration
//!
//! Every field has a default, so an empty JSON object is a valid config.
//!
//! # Example
//!
//! ```rust
//! use check_fraud_core_rs::pipeline::PipelineConfig;
//!
//! let config = PipelineConfig::from_json(r#"{"rng_seed": 7, "holistic_timeout_ms": 500}"#).unwrap();
//! assert_eq!(config.rng_seed, 7);
//! assert_eq!(config.history_window_days, 365);
//! assert!(config.validate().is_ok());
//! ```

use crate::core::clock::{MAX_WINDOW_DAYS, MAX_WINDOW_HOURS};
use crate::repository::HistoryWindows;
use crate::voting::{default_weights, AnalyzerWeights, VotingAggregator, VotingConstants};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Settings for one [`Pipeline`](crate::pipeline::Pipeline)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Seed the detector RNG is reset to at the start of every run
    pub rng_seed: u64,

    pub analyzer_weights: AnalyzerWeights,
    pub voting: VotingConstants,

    /// Upper bound on a holistic reviewer call
    pub holistic_timeout_ms: u64,

    pub history_window_days: i64,
    pub velocity_window_hours: i64,
    pub new_account_days: i64,

    /// Dollars
    pub large_amount_threshold: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            rng_seed: 42,
            analyzer_weights: default_weights(),
            voting: VotingConstants::default(),
            holistic_timeout_ms: 30_000,
            history_window_days: 365,
            velocity_window_hours: 24,
            new_account_days: 90,
            large_amount_threshold: 5000.0,
        }
    }
}

impl PipelineConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Builder: override the seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng_seed = seed;
        self
    }

    /// Builder: override the holistic timeout
    pub fn with_holistic_timeout(mut self, timeout: Duration) -> Self {
        self.holistic_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (analyzer, weight) in &self.analyzer_weights {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "weight for {} must be finite and >= 0 (got {})",
                    analyzer, weight
                )));
            }
        }

        let default_weight = self.voting.default_weight;
        if !default_weight.is_finite() || default_weight < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "voting.default_weight must be finite and >= 0 (got {})",
                default_weight
            )));
        }

        for (name, value) in self.voting.unit_interval_fields() {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "voting.{} must be within [0, 1] (got {})",
                    name, value
                )));
            }
        }

        if self.voting.max_recommendations == 0 {
            return Err(ConfigError::Invalid(
                "voting.max_recommendations must be > 0".to_string(),
            ));
        }

        if self.holistic_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "holistic_timeout_ms must be > 0".to_string(),
            ));
        }

        for (name, value, max) in [
            ("history_window_days", self.history_window_days, MAX_WINDOW_DAYS),
            ("velocity_window_hours", self.velocity_window_hours, MAX_WINDOW_HOURS),
            ("new_account_days", self.new_account_days, MAX_WINDOW_DAYS),
        ] {
            if value <= 0 {
                return Err(ConfigError::Invalid(format!("{} must be > 0", name)));
            }
            if value > max {
                return Err(ConfigError::Invalid(format!(
                    "{} must be <= {} (got {})",
                    name, max, value
                )));
            }
        }

        if !self.large_amount_threshold.is_finite() || self.large_amount_threshold < 0.0 {
            return Err(ConfigError::Invalid(
                "large_amount_threshold must be finite and >= 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn holistic_timeout(&self) -> Duration {
        Duration::from_millis(self.holistic_timeout_ms)
    }

    /// History windows derived from this config
    pub fn windows(&self) -> HistoryWindows {
        HistoryWindows {
            history_days: self.history_window_days,
            velocity_hours: self.velocity_window_hours,
            new_account_days: self.new_account_days,
            large_amount_threshold: self.large_amount_threshold,
        }
    }

    pub fn aggregator(&self) -> VotingAggregator {
        VotingAggregator::new(self.analyzer_weights.clone(), self.voting.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.analyzer_weights.get("holistic_review"), Some(&1.5));
    }

    #[test]
    fn test_empty_json_uses_defaults() {
        let config = PipelineConfig::from_json("{}").unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn test_negative_weight_rejected() {
        let mut config = PipelineConfig::default();
        config.analyzer_weights.insert("policy_analysis".to_string(), -1.0);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = PipelineConfig {
            holistic_timeout_ms: 0,
            ..PipelineConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(err.to_string(), "invalid config: holistic_timeout_ms must be > 0");
    }

    #[test]
    fn test_oversized_windows_rejected() {
        let config = PipelineConfig::from_json(r#"{"history_window_days": 10000000000}"#).unwrap();
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid config: history_window_days must be <= 36525 (got 10000000000)"
        );

        let config = PipelineConfig {
            velocity_window_hours: MAX_WINDOW_HOURS + 1,
            ..PipelineConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = PipelineConfig {
            history_window_days: MAX_WINDOW_DAYS,
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_threshold_outside_unit_interval_rejected() {
        let mut config = PipelineConfig::default();
        config.voting.consensus_threshold = 1.5;
        assert!(config.validate().is_err());
    }
}
