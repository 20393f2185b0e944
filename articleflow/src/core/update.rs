//! Stage updates: the single field a stage is allowed to write.

use super::{ArticleState, ContentStructure, Sentiment, StageName};
use serde::{Deserialize, Serialize};

/// The result of a successful stage execution.
///
/// Each variant carries the value of exactly one state field, so applying an
/// update can never touch a field owned by another stage. Applying the same
/// update twice leaves the state unchanged after the first application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum StageUpdate {
    /// Intake accepted the article; nothing is written.
    Validated,
    /// New `structure`.
    Structure(ContentStructure),
    /// New `summary`.
    Summary(String),
    /// New `topics`.
    Topics(Vec<String>),
    /// New `sentiment`.
    Sentiment(Sentiment),
    /// New `quality_score`.
    QualityScore(f64),
}

impl StageUpdate {
    /// Returns the stage entitled to produce this update.
    #[must_use]
    pub const fn owner(&self) -> StageName {
        match self {
            Self::Validated => StageName::Intake,
            Self::Structure(_) => StageName::ContentAnalysis,
            Self::Summary(_) => StageName::Summarization,
            Self::Topics(_) => StageName::Classification,
            Self::Sentiment(_) => StageName::SentimentAnalysis,
            Self::QualityScore(_) => StageName::QualityGate,
        }
    }

    /// Writes the update into the state and hands the state back.
    #[must_use]
    pub fn apply(self, mut state: ArticleState) -> ArticleState {
        match self {
            Self::Validated => {}
            Self::Structure(structure) => state.structure = Some(structure),
            Self::Summary(summary) => state.summary = Some(summary),
            Self::Topics(topics) => state.topics = Some(topics),
            Self::Sentiment(sentiment) => state.sentiment = Some(sentiment),
            Self::QualityScore(score) => state.quality_score = score,
        }
        state
    }
}
