//! Classification: assigns ordered topic labels.

use super::{require_structure, Stage};
use crate::backend::{AnalysisBackend, ClassificationRequest};
use crate::core::{ArticleState, StageName, StageUpdate};
use crate::errors::StageExecutionError;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Writes `topics` from `content` and `structure`.
pub struct ClassificationStage {
    backend: Arc<dyn AnalysisBackend>,
    max_content_chars: usize,
}

impl ClassificationStage {
    /// Creates a new classification stage.
    #[must_use]
    pub fn new(backend: Arc<dyn AnalysisBackend>, max_content_chars: usize) -> Self {
        Self {
            backend,
            max_content_chars,
        }
    }
}

impl fmt::Debug for ClassificationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassificationStage")
            .field("max_content_chars", &self.max_content_chars)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Stage for ClassificationStage {
    fn name(&self) -> StageName {
        StageName::Classification
    }

    async fn execute(&self, state: &ArticleState) -> Result<StageUpdate, StageExecutionError> {
        let request = ClassificationRequest {
            article_id: state.article_id().to_string(),
            content: state.content_excerpt(self.max_content_chars),
            structure: require_structure(StageName::Classification, state)?,
        };

        let labels = self
            .backend
            .classify(&request)
            .await
            .map_err(|e| StageExecutionError::backend(StageName::Classification, e))?;

        // Order is meaningful; only blanks and repeats are dropped.
        let mut topics: Vec<String> = Vec::with_capacity(labels.len());
        for label in labels {
            let label = label.trim();
            if !label.is_empty() && !topics.iter().any(|t| t == label) {
                topics.push(label.to_string());
            }
        }

        if topics.is_empty() {
            return Err(StageExecutionError::invalid_response(
                StageName::Classification,
                "no topic labels returned",
            ));
        }

        Ok(StageUpdate::Topics(topics))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockAnalysisBackend;
    use crate::core::{ArticleInput, ContentStructure};

    fn analysed_state() -> ArticleState {
        let state = ArticleState::from_input(ArticleInput::new("a1", "text", "http://x", "wire"));
        StageUpdate::Structure(ContentStructure::default()).apply(state)
    }

    #[tokio::test]
    async fn test_keeps_order_and_drops_blanks_and_repeats() {
        let mut backend = MockAnalysisBackend::new();
        backend.expect_classify().returning(|_| {
            Ok(vec![
                "government".to_string(),
                " ".to_string(),
                "policy ".to_string(),
                "government".to_string(),
            ])
        });

        let stage = ClassificationStage::new(Arc::new(backend), 100);
        let update = stage.execute(&analysed_state()).await.unwrap();
        assert_eq!(
            update,
            StageUpdate::Topics(vec!["government".to_string(), "policy".to_string()])
        );
    }

    #[tokio::test]
    async fn test_empty_labels_are_invalid() {
        let mut backend = MockAnalysisBackend::new();
        backend.expect_classify().returning(|_| Ok(Vec::new()));

        let stage = ClassificationStage::new(Arc::new(backend), 100);
        let err = stage.execute(&analysed_state()).await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_requires_structure() {
        let backend = MockAnalysisBackend::new();
        let stage = ClassificationStage::new(Arc::new(backend), 100);
        let state = ArticleState::from_input(ArticleInput::new("a1", "text", "http://x", "wire"));

        let err = stage.execute(&state).await.unwrap_err();
        assert_eq!(
            err,
            StageExecutionError::missing_input(StageName::Classification, "structure")
        );
    }
}
