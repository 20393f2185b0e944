//! Stage trait and the six article stages.
//!
//! Stages are the units of work the pipeline threads an [`ArticleState`]
//! through. A stage reads the state, optionally calls the analysis backend,
//! and returns a [`StageUpdate`] for the one field it owns.

mod classification;
mod content_analysis;
mod intake;
mod quality_gate;
mod sentiment;
mod summarization;

pub use classification::ClassificationStage;
pub use content_analysis::ContentAnalysisStage;
pub use intake::IntakeStage;
pub use quality_gate::{local_quality_score, QualityGateStage, QualityScoring};
pub use sentiment::SentimentAnalysisStage;
pub use summarization::SummarizationStage;

use crate::backend::AnalysisBackend;
use crate::core::{ArticleState, StageName, StageUpdate};
use crate::errors::StageExecutionError;
use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

/// Trait for pipeline stages.
///
/// Implementations must be idempotent: executing twice against the same
/// inputs and a stable backend yields the same update.
#[async_trait]
pub trait Stage: Send + Sync + Debug {
    /// Returns the name of the stage.
    fn name(&self) -> StageName;

    /// Computes the stage's update from the current state.
    ///
    /// # Errors
    ///
    /// Returns a [`StageExecutionError`] when the backend fails, answers with
    /// an unusable response, or a required upstream field is absent.
    async fn execute(&self, state: &ArticleState) -> Result<StageUpdate, StageExecutionError>;

    /// Runs the stage on an owned state and returns the updated state.
    ///
    /// On failure the state comes back untouched inside [`StageFailure`].
    /// An update for a field the stage does not own is a failure.
    async fn run(&self, state: ArticleState) -> Result<ArticleState, StageFailure> {
        match self.execute(&state).await {
            Ok(update) if update.owner() == self.name() => Ok(update.apply(state)),
            Ok(update) => Err(StageFailure {
                state,
                error: StageExecutionError::foreign_update(self.name(), update.owner()),
            }),
            Err(error) => Err(StageFailure { state, error }),
        }
    }
}

/// A failed stage run: the unchanged state and the error.
#[derive(Debug)]
pub struct StageFailure {
    /// The state as it was before the stage ran.
    pub state: ArticleState,
    /// Why the stage failed.
    pub error: StageExecutionError,
}

/// Builds the default stage implementation for `name`.
#[must_use]
pub fn default_stage(
    name: StageName,
    backend: &Arc<dyn AnalysisBackend>,
    max_content_chars: usize,
    scoring: QualityScoring,
) -> Arc<dyn Stage> {
    match name {
        StageName::Intake => Arc::new(IntakeStage::new()),
        StageName::ContentAnalysis => {
            Arc::new(ContentAnalysisStage::new(backend.clone(), max_content_chars))
        }
        StageName::Summarization => {
            Arc::new(SummarizationStage::new(backend.clone(), max_content_chars))
        }
        StageName::Classification => {
            Arc::new(ClassificationStage::new(backend.clone(), max_content_chars))
        }
        StageName::SentimentAnalysis => {
            Arc::new(SentimentAnalysisStage::new(backend.clone(), max_content_chars))
        }
        StageName::QualityGate => Arc::new(QualityGateStage::new(backend.clone(), scoring)),
    }
}

/// Returns the structure, or the error a stage reports when it is absent.
pub(crate) fn require_structure(
    stage: StageName,
    state: &ArticleState,
) -> Result<crate::core::ContentStructure, StageExecutionError> {
    state
        .structure()
        .cloned()
        .ok_or_else(|| StageExecutionError::missing_input(stage, "structure"))
}
