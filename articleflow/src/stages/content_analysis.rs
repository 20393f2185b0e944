//! Content analysis: extracts the article's structure.

use super::Stage;
use crate::backend::{AnalysisBackend, StructureRequest};
use crate::core::{ArticleState, ContentStructure, StageName, StageUpdate};
use crate::errors::StageExecutionError;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Writes `structure` from the backend's structural analysis of `content`.
pub struct ContentAnalysisStage {
    backend: Arc<dyn AnalysisBackend>,
    max_content_chars: usize,
}

impl ContentAnalysisStage {
    /// Creates a new content analysis stage.
    #[must_use]
    pub fn new(backend: Arc<dyn AnalysisBackend>, max_content_chars: usize) -> Self {
        Self {
            backend,
            max_content_chars,
        }
    }
}

impl fmt::Debug for ContentAnalysisStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentAnalysisStage")
            .field("max_content_chars", &self.max_content_chars)
            .finish_non_exhaustive()
    }
}

fn clean(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

#[async_trait]
impl Stage for ContentAnalysisStage {
    fn name(&self) -> StageName {
        StageName::ContentAnalysis
    }

    async fn execute(&self, state: &ArticleState) -> Result<StageUpdate, StageExecutionError> {
        let request = StructureRequest {
            article_id: state.article_id().to_string(),
            content: state.content_excerpt(self.max_content_chars),
        };

        let structure = self
            .backend
            .analyze_structure(&request)
            .await
            .map_err(|e| StageExecutionError::backend(StageName::ContentAnalysis, e))?;

        let structure = ContentStructure {
            entities: clean(structure.entities),
            dates: clean(structure.dates),
            key_points: clean(structure.key_points),
        };

        debug!(
            article_id = state.article_id(),
            entities = structure.entities.len(),
            key_points = structure.key_points.len(),
            "Structure extracted"
        );

        Ok(StageUpdate::Structure(structure))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockAnalysisBackend;
    use crate::core::ArticleInput;
    use crate::errors::BackendError;

    fn state() -> ArticleState {
        ArticleState::from_input(ArticleInput::new("a1", "abcdefghij", "http://x", "wire"))
    }

    #[tokio::test]
    async fn test_truncates_content_and_cleans_lists() {
        let mut backend = MockAnalysisBackend::new();
        backend
            .expect_analyze_structure()
            .withf(|request| request.content == "abcd" && request.article_id == "a1")
            .times(1)
            .returning(|_| {
                Ok(ContentStructure {
                    entities: vec!["  EU ".to_string(), String::new()],
                    dates: vec!["2024-05-01".to_string()],
                    key_points: vec!["   ".to_string()],
                })
            });

        let stage = ContentAnalysisStage::new(Arc::new(backend), 4);
        let update = stage.execute(&state()).await.unwrap();

        assert_eq!(
            update,
            StageUpdate::Structure(ContentStructure {
                entities: vec!["EU".to_string()],
                dates: vec!["2024-05-01".to_string()],
                key_points: Vec::new(),
            })
        );
    }

    #[tokio::test]
    async fn test_backend_failure_is_stage_error() {
        let mut backend = MockAnalysisBackend::new();
        backend
            .expect_analyze_structure()
            .returning(|_| Err(BackendError::Timeout { after_ms: 50 }));

        let stage = ContentAnalysisStage::new(Arc::new(backend), 100);
        let err = stage.execute(&state()).await.unwrap_err();

        assert_eq!(
            err,
            StageExecutionError::backend(
                StageName::ContentAnalysis,
                BackendError::Timeout { after_ms: 50 }
            )
        );
    }
}
