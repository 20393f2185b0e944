//! Quality gate decision taken after every pass.

use super::config::PipelineConfig;
use crate::errors::StageExecutionError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What the executor does after a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateDecision {
    /// The pass met the threshold; project as accepted.
    Accept,
    /// Start another pass over the retry subset.
    Retry,
    /// Stop and project as degraded.
    Degrade,
}

impl fmt::Display for GateDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accept => write!(f, "accept"),
            Self::Retry => write!(f, "retry"),
            Self::Degrade => write!(f, "degrade"),
        }
    }
}

/// Decides the outcome of a pass.
///
/// A pass that ended in a stage failure is never accepted. Failures that
/// another pass cannot fix (rejected input, missing upstream data, foreign
/// writes) degrade at once instead of spending the retry budget. Backend
/// failures of any status are retried while budget remains.
#[must_use]
pub fn evaluate(
    quality_score: f64,
    failure: Option<&StageExecutionError>,
    retry_count: u32,
    config: &PipelineConfig,
) -> GateDecision {
    match failure {
        Some(error) if !error.is_retryable() => return GateDecision::Degrade,
        None if quality_score >= config.quality_threshold => return GateDecision::Accept,
        _ => {}
    }

    if retry_count < config.max_retries {
        GateDecision::Retry
    } else {
        GateDecision::Degrade
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StageName;
    use crate::errors::BackendError;

    fn config() -> PipelineConfig {
        PipelineConfig::default().with_max_retries(3)
    }

    #[test]
    fn test_accepts_at_threshold() {
        assert_eq!(evaluate(0.6, None, 0, &config()), GateDecision::Accept);
        assert_eq!(evaluate(0.9, None, 3, &config()), GateDecision::Accept);
    }

    #[test]
    fn test_retries_below_threshold_until_budget_spent() {
        assert_eq!(evaluate(0.3, None, 0, &config()), GateDecision::Retry);
        assert_eq!(evaluate(0.3, None, 2, &config()), GateDecision::Retry);
        assert_eq!(evaluate(0.3, None, 3, &config()), GateDecision::Degrade);
    }

    #[test]
    fn test_zero_retry_budget_degrades() {
        let config = config().with_max_retries(0);
        assert_eq!(evaluate(0.1, None, 0, &config), GateDecision::Degrade);
    }

    #[test]
    fn test_failed_pass_is_not_accepted() {
        let failure = StageExecutionError::backend(
            StageName::Summarization,
            BackendError::Timeout { after_ms: 100 },
        );
        assert_eq!(evaluate(0.95, Some(&failure), 0, &config()), GateDecision::Retry);
        assert_eq!(evaluate(0.95, Some(&failure), 3, &config()), GateDecision::Degrade);
    }

    #[test]
    fn test_backend_client_errors_are_retried() {
        for status in [400, 404, 408] {
            let failure = StageExecutionError::backend(
                StageName::Summarization,
                BackendError::Status { status, body: String::new() },
            );
            assert_eq!(evaluate(0.9, Some(&failure), 0, &config()), GateDecision::Retry);
            assert_eq!(evaluate(0.9, Some(&failure), 3, &config()), GateDecision::Degrade);
        }
    }

    #[test]
    fn test_unfixable_failure_degrades_immediately() {
        let failure = StageExecutionError::invalid_input(StageName::Intake, "url has no scheme");
        assert_eq!(evaluate(0.0, Some(&failure), 0, &config()), GateDecision::Degrade);
    }
}
