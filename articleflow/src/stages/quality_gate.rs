//! Quality gate: scores the accumulated analysis.
//!
//! The gate only produces `quality_score`; the accept/retry/degrade decision
//! belongs to the executor.

use super::Stage;
use crate::backend::{AnalysisBackend, QualityRequest};
use crate::core::{ArticleState, StageName, StageUpdate};
use crate::errors::StageExecutionError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

const SUMMARY_WEIGHT: f64 = 0.30;
const TOPICS_WEIGHT: f64 = 0.20;
const SENTIMENT_WEIGHT: f64 = 0.25;
const STRUCTURE_WEIGHT: f64 = 0.25;

const SUMMARY_TARGET_WORDS: std::ops::RangeInclusive<usize> = 150..=200;

/// Where the quality score comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityScoring {
    /// Ask the analysis backend.
    #[default]
    Backend,
    /// Score completeness locally with [`local_quality_score`].
    Local,
}

/// Scores how complete the analysis is, in `[0, 1]`.
///
/// Summary length is judged against a 150 to 200 word target; sentiment is
/// weighted toward objectivity; structure by how many of its lists are filled.
#[must_use]
pub fn local_quality_score(state: &ArticleState) -> f64 {
    let summary = state.summary().map_or(0.0, summary_score);

    let topics = match state.topics() {
        Some(topics) if !topics.is_empty() => 1.0,
        _ => 0.0,
    };

    let sentiment = state
        .sentiment()
        .map_or(0.0, |s| 0.5 + 0.5 * s.objectivity.clamp(0.0, 1.0));

    let structure = state
        .structure()
        .map_or(0.0, |s| s.populated_sections() as f64 / 3.0);

    (summary * SUMMARY_WEIGHT
        + topics * TOPICS_WEIGHT
        + sentiment * SENTIMENT_WEIGHT
        + structure * STRUCTURE_WEIGHT)
        .clamp(0.0, 1.0)
}

fn summary_score(summary: &str) -> f64 {
    let words = summary.split_whitespace().count();
    if words == 0 {
        0.0
    } else if SUMMARY_TARGET_WORDS.contains(&words) {
        1.0
    } else if words < *SUMMARY_TARGET_WORDS.start() {
        0.5 + 0.5 * words as f64 / *SUMMARY_TARGET_WORDS.start() as f64
    } else {
        (*SUMMARY_TARGET_WORDS.end() as f64 / words as f64).max(0.5)
    }
}

/// Writes `quality_score` from the backend or the local scorer.
pub struct QualityGateStage {
    backend: Arc<dyn AnalysisBackend>,
    scoring: QualityScoring,
}

impl QualityGateStage {
    /// Creates a new quality gate stage.
    #[must_use]
    pub fn new(backend: Arc<dyn AnalysisBackend>, scoring: QualityScoring) -> Self {
        Self { backend, scoring }
    }
}

impl fmt::Debug for QualityGateStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QualityGateStage")
            .field("scoring", &self.scoring)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Stage for QualityGateStage {
    fn name(&self) -> StageName {
        StageName::QualityGate
    }

    async fn execute(&self, state: &ArticleState) -> Result<StageUpdate, StageExecutionError> {
        let score = match self.scoring {
            QualityScoring::Local => local_quality_score(state),
            QualityScoring::Backend => {
                let request = QualityRequest {
                    article_id: state.article_id().to_string(),
                    summary: state.summary().map(str::to_string),
                    topics: state.topics().map(<[String]>::to_vec),
                    sentiment: state.sentiment().cloned(),
                    structure: state.structure().cloned(),
                };
                self.backend
                    .score_quality(&request)
                    .await
                    .map_err(|e| StageExecutionError::backend(StageName::QualityGate, e))?
            }
        };

        if !(0.0..=1.0).contains(&score) {
            return Err(StageExecutionError::invalid_response(
                StageName::QualityGate,
                format!("quality score {score} is outside [0, 1]"),
            ));
        }

        Ok(StageUpdate::QualityScore(score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockAnalysisBackend;
    use crate::core::{ArticleInput, ContentStructure, Sentiment, Urgency};

    fn empty_state() -> ArticleState {
        ArticleState::from_input(ArticleInput::new("a1", "text", "http://x", "wire"))
    }

    fn complete_state(summary_words: usize) -> ArticleState {
        let summary = vec!["word"; summary_words].join(" ");
        let state = StageUpdate::Structure(ContentStructure {
            entities: vec!["EU".to_string()],
            dates: vec!["2024-05-01".to_string()],
            key_points: vec!["vote".to_string()],
        })
        .apply(empty_state());
        let state = StageUpdate::Summary(summary).apply(state);
        let state = StageUpdate::Topics(vec!["policy".to_string()]).apply(state);
        StageUpdate::Sentiment(Sentiment::new("neutral", 1.0, Urgency::Low)).apply(state)
    }

    #[test]
    fn test_local_score_bounds() {
        assert_eq!(local_quality_score(&empty_state()), 0.0);
        let full = local_quality_score(&complete_state(175));
        assert!((full - 1.0).abs() < 1e-9, "got {full}");
    }

    #[test]
    fn test_local_score_penalises_summary_length() {
        let on_target = local_quality_score(&complete_state(160));
        let short = local_quality_score(&complete_state(15));
        let long = local_quality_score(&complete_state(800));
        assert!(short < on_target);
        assert!(long < on_target);
    }

    #[tokio::test]
    async fn test_local_scoring_skips_backend() {
        let backend = MockAnalysisBackend::new();
        let stage = QualityGateStage::new(Arc::new(backend), QualityScoring::Local);

        let state = stage.run(complete_state(175)).await.unwrap();
        assert!(state.quality_score() > 0.99);
    }

    #[tokio::test]
    async fn test_backend_request_carries_current_fields() {
        let mut backend = MockAnalysisBackend::new();
        backend
            .expect_score_quality()
            .withf(|request| {
                request.summary.is_some()
                    && request.topics.as_deref() == Some(&["policy".to_string()][..])
                    && request.structure.is_some()
            })
            .returning(|_| Ok(0.72));

        let stage = QualityGateStage::new(Arc::new(backend), QualityScoring::Backend);
        let update = stage.execute(&complete_state(20)).await.unwrap();
        assert_eq!(update, StageUpdate::QualityScore(0.72));
    }

    #[tokio::test]
    async fn test_out_of_range_score_is_invalid() {
        let mut backend = MockAnalysisBackend::new();
        backend.expect_score_quality().returning(|_| Ok(1.2));

        let stage = QualityGateStage::new(Arc::new(backend), QualityScoring::Backend);
        let err = stage.execute(&empty_state()).await.unwrap_err();
        assert!(matches!(err, StageExecutionError::InvalidResponse { .. }));
    }

    #[test]
    fn test_scoring_serde() {
        let scoring: QualityScoring = serde_json::from_str(r#""local""#).unwrap();
        assert_eq!(scoring, QualityScoring::Local);
        assert_eq!(QualityScoring::default(), QualityScoring::Backend);
    }
}
