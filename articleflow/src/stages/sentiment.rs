//! Sentiment analysis: tone, objectivity, and urgency.

use super::Stage;
use crate::backend::{AnalysisBackend, SentimentRequest};
use crate::core::{ArticleState, Sentiment, StageName, StageUpdate};
use crate::errors::StageExecutionError;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Writes `sentiment` from `content`.
pub struct SentimentAnalysisStage {
    backend: Arc<dyn AnalysisBackend>,
    max_content_chars: usize,
}

impl SentimentAnalysisStage {
    /// Creates a new sentiment analysis stage.
    #[must_use]
    pub fn new(backend: Arc<dyn AnalysisBackend>, max_content_chars: usize) -> Self {
        Self {
            backend,
            max_content_chars,
        }
    }
}

impl fmt::Debug for SentimentAnalysisStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SentimentAnalysisStage")
            .field("max_content_chars", &self.max_content_chars)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Stage for SentimentAnalysisStage {
    fn name(&self) -> StageName {
        StageName::SentimentAnalysis
    }

    async fn execute(&self, state: &ArticleState) -> Result<StageUpdate, StageExecutionError> {
        let request = SentimentRequest {
            article_id: state.article_id().to_string(),
            content: state.content_excerpt(self.max_content_chars),
        };

        let sentiment = self
            .backend
            .analyze_sentiment(&request)
            .await
            .map_err(|e| StageExecutionError::backend(StageName::SentimentAnalysis, e))?;

        if !(0.0..=1.0).contains(&sentiment.objectivity) {
            return Err(StageExecutionError::invalid_response(
                StageName::SentimentAnalysis,
                format!("objectivity {} is outside [0, 1]", sentiment.objectivity),
            ));
        }
        let tone = sentiment.tone.trim();
        if tone.is_empty() {
            return Err(StageExecutionError::invalid_response(
                StageName::SentimentAnalysis,
                "tone is blank",
            ));
        }

        Ok(StageUpdate::Sentiment(Sentiment::new(
            tone,
            sentiment.objectivity,
            sentiment.urgency,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockAnalysisBackend;
    use crate::core::{ArticleInput, Urgency};

    fn state() -> ArticleState {
        ArticleState::from_input(ArticleInput::new("a1", "text", "http://x", "wire"))
    }

    #[tokio::test]
    async fn test_does_not_need_structure() {
        let mut backend = MockAnalysisBackend::new();
        backend
            .expect_analyze_sentiment()
            .times(1)
            .returning(|_| Ok(Sentiment::new("neutral", 0.8, Urgency::Medium)));

        let stage = SentimentAnalysisStage::new(Arc::new(backend), 100);
        let state = stage.run(state()).await.unwrap();

        assert_eq!(state.sentiment(), Some(&Sentiment::new("neutral", 0.8, Urgency::Medium)));
        assert!(state.structure().is_none());
    }

    #[tokio::test]
    async fn test_rejects_out_of_range_objectivity() {
        for objectivity in [1.5, -0.1, f64::NAN] {
            let mut backend = MockAnalysisBackend::new();
            backend
                .expect_analyze_sentiment()
                .returning(move |_| Ok(Sentiment::new("neutral", objectivity, Urgency::Low)));

            let stage = SentimentAnalysisStage::new(Arc::new(backend), 100);
            let err = stage.execute(&state()).await.unwrap_err();
            assert!(matches!(err, StageExecutionError::InvalidResponse { .. }));
        }
    }
}
