//! Summarization: produces the article summary.

use super::{require_structure, Stage};
use crate::backend::{AnalysisBackend, SummaryRequest};
use crate::core::{ArticleState, StageName, StageUpdate};
use crate::errors::StageExecutionError;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Writes `summary` from `content` and `structure`.
pub struct SummarizationStage {
    backend: Arc<dyn AnalysisBackend>,
    max_content_chars: usize,
}

impl SummarizationStage {
    /// Creates a new summarization stage.
    #[must_use]
    pub fn new(backend: Arc<dyn AnalysisBackend>, max_content_chars: usize) -> Self {
        Self {
            backend,
            max_content_chars,
        }
    }
}

impl fmt::Debug for SummarizationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SummarizationStage")
            .field("max_content_chars", &self.max_content_chars)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Stage for SummarizationStage {
    fn name(&self) -> StageName {
        StageName::Summarization
    }

    async fn execute(&self, state: &ArticleState) -> Result<StageUpdate, StageExecutionError> {
        let request = SummaryRequest {
            article_id: state.article_id().to_string(),
            content: state.content_excerpt(self.max_content_chars),
            structure: require_structure(StageName::Summarization, state)?,
        };

        let summary = self
            .backend
            .summarize(&request)
            .await
            .map_err(|e| StageExecutionError::backend(StageName::Summarization, e))?;

        let summary = summary.trim();
        if summary.is_empty() {
            return Err(StageExecutionError::invalid_response(
                StageName::Summarization,
                "summary is blank",
            ));
        }

        Ok(StageUpdate::Summary(summary.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockAnalysisBackend;
    use crate::core::{ArticleInput, ContentStructure};

    fn analysed_state() -> ArticleState {
        let state = ArticleState::from_input(ArticleInput::new("a1", "text", "http://x", "wire"));
        StageUpdate::Structure(ContentStructure {
            key_points: vec!["vote".to_string()],
            ..ContentStructure::default()
        })
        .apply(state)
    }

    #[tokio::test]
    async fn test_request_carries_structure() {
        let mut backend = MockAnalysisBackend::new();
        backend
            .expect_summarize()
            .withf(|request| request.structure.key_points == vec!["vote".to_string()])
            .returning(|_| Ok("  A vote happened.  ".to_string()));

        let stage = SummarizationStage::new(Arc::new(backend), 100);
        let update = stage.execute(&analysed_state()).await.unwrap();
        assert_eq!(update, StageUpdate::Summary("A vote happened.".to_string()));
    }

    #[tokio::test]
    async fn test_blank_summary_is_invalid() {
        let mut backend = MockAnalysisBackend::new();
        backend.expect_summarize().returning(|_| Ok("\n".to_string()));

        let stage = SummarizationStage::new(Arc::new(backend), 100);
        let err = stage.execute(&analysed_state()).await.unwrap_err();
        assert!(matches!(err, StageExecutionError::InvalidResponse { .. }));
    }

    #[tokio::test]
    async fn test_rerun_overwrites_summary() {
        let mut backend = MockAnalysisBackend::new();
        backend.expect_summarize().returning(|_| Ok("Same summary.".to_string()));
        let stage = SummarizationStage::new(Arc::new(backend), 100);

        let once = stage.run(analysed_state()).await.unwrap();
        let twice = stage.run(once.clone()).await.unwrap();

        assert_eq!(once, twice);
        assert_eq!(twice.summary(), Some("Same summary."));
    }
}
