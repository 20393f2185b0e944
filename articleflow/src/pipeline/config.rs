//! Pipeline configuration.

use super::retry::RetryPolicy;
use crate::core::StageName;
use crate::errors::ConfigError;
use crate::stages::QualityScoring;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Environment variable overriding `max_retries`.
pub const ENV_MAX_RETRIES: &str = "ARTICLEFLOW_MAX_RETRIES";
/// Environment variable overriding `quality_threshold`.
pub const ENV_QUALITY_THRESHOLD: &str = "ARTICLEFLOW_QUALITY_THRESHOLD";
/// Environment variable overriding `retry_stages` (comma separated).
pub const ENV_RETRY_STAGES: &str = "ARTICLEFLOW_RETRY_STAGES";

/// Configuration for an [`ArticlePipeline`](super::ArticlePipeline).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Maximum number of retry passes after the first pass.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Minimum quality score for a pass to be accepted.
    #[serde(default = "default_quality_threshold")]
    pub quality_threshold: f64,
    /// Stages re-run on a retry pass, executed in canonical order. Must
    /// include the quality gate so every pass is scored afresh.
    #[serde(default = "StageName::default_retry_subset")]
    pub retry_stages: Vec<StageName>,
    /// Delay between passes.
    #[serde(default)]
    pub retry_policy: RetryPolicy,
    /// Where the quality score comes from.
    #[serde(default)]
    pub quality_scoring: QualityScoring,
    /// Maximum characters of content sent to the backend.
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,
}

fn default_max_retries() -> u32 {
    3
}

fn default_quality_threshold() -> f64 {
    0.6
}

fn default_max_content_chars() -> usize {
    10_000
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            quality_threshold: default_quality_threshold(),
            retry_stages: StageName::default_retry_subset(),
            retry_policy: RetryPolicy::default(),
            quality_scoring: QualityScoring::default(),
            max_content_chars: default_max_content_chars(),
        }
    }
}

impl PipelineConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the retry budget.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the acceptance threshold.
    #[must_use]
    pub fn with_quality_threshold(mut self, threshold: f64) -> Self {
        self.quality_threshold = threshold;
        self
    }

    /// Sets the retry subset.
    #[must_use]
    pub fn with_retry_stages(mut self, stages: impl IntoIterator<Item = StageName>) -> Self {
        self.retry_stages = stages.into_iter().collect();
        self
    }

    /// Sets the backoff policy.
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Sets the quality scoring mode.
    #[must_use]
    pub fn with_quality_scoring(mut self, scoring: QualityScoring) -> Self {
        self.quality_scoring = scoring;
        self
    }

    /// Sets the content limit for backend requests.
    #[must_use]
    pub fn with_max_content_chars(mut self, max_chars: usize) -> Self {
        self.max_content_chars = max_chars;
        self
    }

    /// Returns true if `stage` is re-run on retry passes.
    #[must_use]
    pub fn is_retry_stage(&self, stage: StageName) -> bool {
        self.retry_stages.contains(&stage)
    }

    /// Checks the configuration for values no run could honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.quality_threshold) {
            return Err(ConfigError::InvalidThreshold(self.quality_threshold));
        }
        if self.retry_stages.is_empty() {
            return Err(ConfigError::EmptyRetryStages);
        }
        if !self.is_retry_stage(StageName::QualityGate) {
            return Err(ConfigError::RetryWithoutQualityGate);
        }
        let mut seen = HashSet::new();
        for stage in &self.retry_stages {
            if !seen.insert(*stage) {
                return Err(ConfigError::DuplicateRetryStage(*stage));
            }
        }
        if self.max_content_chars == 0 {
            return Err(ConfigError::invalid_value(
                "max_content_chars",
                "must be greater than zero",
            ));
        }
        if self.retry_policy.max_delay_ms < self.retry_policy.base_delay_ms {
            return Err(ConfigError::invalid_value(
                "retry_policy.max_delay_ms",
                "must not be below base_delay_ms",
            ));
        }
        Ok(())
    }

    /// Parses and validates a JSON configuration. Missing keys take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Builds a configuration from defaults overridden by `ARTICLEFLOW_*`
    /// environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup`, keyed by the `ARTICLEFLOW_*` names,
    /// then validates.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_MAX_RETRIES) {
            self.max_retries = raw
                .trim()
                .parse()
                .map_err(|e| ConfigError::invalid_value(ENV_MAX_RETRIES, format!("{e}")))?;
        }

        if let Some(raw) = lookup(ENV_QUALITY_THRESHOLD) {
            self.quality_threshold = raw
                .trim()
                .parse()
                .map_err(|e| ConfigError::invalid_value(ENV_QUALITY_THRESHOLD, format!("{e}")))?;
        }

        if let Some(raw) = lookup(ENV_RETRY_STAGES) {
            self.retry_stages = raw
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(|part| {
                    part.parse::<StageName>()
                        .map_err(|e| ConfigError::invalid_value(ENV_RETRY_STAGES, e))
                })
                .collect::<Result<_, _>>()?;
        }

        self.validate()?;
        Ok(self)
    }
}
