//! Output projection of a finished run.

use super::{ArticleState, ContentStructure, RunStatus, Sentiment, StageName};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A non-fatal problem encountered during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunWarning {
    /// A stage failed; its output was discarded for that pass.
    StageFailed {
        /// The failing stage.
        stage: StageName,
        /// Pass number (1-based) in which the failure happened.
        pass: u32,
        /// Error description.
        message: String,
    },
    /// The gate never accepted the result within the retry budget.
    RetryExhausted {
        /// Retries performed.
        retries: u32,
        /// Score of the final pass.
        quality_score: f64,
        /// Threshold that was not met.
        threshold: f64,
    },
}

impl fmt::Display for RunWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StageFailed { stage, pass, message } => {
                write!(f, "stage '{stage}' failed on pass {pass}: {message}")
            }
            Self::RetryExhausted {
                retries,
                quality_score,
                threshold,
            } => write!(
                f,
                "quality {quality_score:.2} below threshold {threshold:.2} after {retries} retries"
            ),
        }
    }
}

/// The serializable result returned for one article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleResult {
    /// Article identifier, equal to the input id.
    pub id: String,
    /// Generated summary.
    pub summary: Option<String>,
    /// Topic labels in the order the classifier returned them.
    pub topics: Option<Vec<String>>,
    /// Sentiment analysis.
    pub sentiment: Option<Sentiment>,
    /// Final quality score in `[0, 1]`.
    pub quality_score: f64,
    /// Extracted structure.
    pub structure: Option<ContentStructure>,
    /// Whether the gate accepted the result.
    pub status: RunStatus,
    /// Number of retry passes performed.
    pub retry_count: u32,
    /// Total passes executed, including the first.
    pub passes: u32,
    /// Non-fatal problems met along the way.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<RunWarning>,
    /// Identifier of the run that produced this result.
    pub run_id: Uuid,
    /// When the result was projected.
    pub processed_at: DateTime<Utc>,
}

impl ArticleResult {
    /// Projects a final state record into a result. Pure apart from the timestamp.
    #[must_use]
    pub fn from_state(
        state: &ArticleState,
        status: RunStatus,
        warnings: Vec<RunWarning>,
        run_id: Uuid,
    ) -> Self {
        Self {
            id: state.article_id().to_string(),
            summary: state.summary().map(str::to_string),
            topics: state.topics().map(<[String]>::to_vec),
            sentiment: state.sentiment().cloned(),
            quality_score: state.quality_score(),
            structure: state.structure().cloned(),
            status,
            retry_count: state.retry_count(),
            passes: state.retry_count() + 1,
            warnings,
            run_id,
            processed_at: Utc::now(),
        }
    }

    /// Returns true if the gate accepted the result.
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        self.status == RunStatus::Accepted
    }

    /// Returns true if the result is degraded.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.status == RunStatus::Degraded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ArticleInput, StageUpdate, Urgency};
    use pretty_assertions::assert_eq;

    fn finished_state() -> ArticleState {
        let state = ArticleState::from_input(ArticleInput::new("a1", "text", "http://x", "wire"));
        let state = StageUpdate::Summary("short".to_string()).apply(state);
        let state = StageUpdate::Topics(vec!["policy".to_string()]).apply(state);
        let state =
            StageUpdate::Sentiment(Sentiment::new("neutral", 0.8, Urgency::Low)).apply(state);
        StageUpdate::QualityScore(0.9).apply(state)
    }

    #[test]
    fn test_projection_copies_fields() {
        let state = finished_state();
        let result = ArticleResult::from_state(&state, RunStatus::Accepted, Vec::new(), Uuid::new_v4());

        assert_eq!(result.id, "a1");
        assert_eq!(result.summary.as_deref(), Some("short"));
        assert_eq!(result.topics, Some(vec!["policy".to_string()]));
        assert_eq!(result.quality_score, 0.9);
        assert!(result.structure.is_none());
        assert_eq!(result.passes, 1);
        assert!(result.is_accepted());
    }

    #[test]
    fn test_result_json_shape() {
        let result =
            ArticleResult::from_state(&finished_state(), RunStatus::Degraded, Vec::new(), Uuid::nil());
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["status"], "degraded");
        assert_eq!(json["structure"], serde_json::Value::Null);
        assert_eq!(json["sentiment"]["urgency"], "low");
        assert!(json.get("warnings").is_none());
    }

    #[test]
    fn test_warning_display() {
        let warning = RunWarning::RetryExhausted {
            retries: 3,
            quality_score: 0.3,
            threshold: 0.6,
        };
        assert_eq!(warning.to_string(), "quality 0.30 below threshold 0.60 after 3 retries");

        let warning = RunWarning::StageFailed {
            stage: StageName::Summarization,
            pass: 2,
            message: "timeout".to_string(),
        };
        assert!(warning.to_string().contains("summarization"));
    }
}
