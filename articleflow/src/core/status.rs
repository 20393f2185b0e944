//! Stage names and run status enums.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The six stages of the article pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageName {
    /// Validates the raw article fields.
    Intake,
    /// Extracts entities, dates, and key points.
    ContentAnalysis,
    /// Produces the article summary.
    Summarization,
    /// Assigns topic labels.
    Classification,
    /// Determines tone, objectivity, and urgency.
    SentimentAnalysis,
    /// Scores the accumulated analysis.
    QualityGate,
}

impl StageName {
    /// All stages in pipeline order.
    pub const ALL: [Self; 6] = [
        Self::Intake,
        Self::ContentAnalysis,
        Self::Summarization,
        Self::Classification,
        Self::SentimentAnalysis,
        Self::QualityGate,
    ];

    /// Stages re-run when the quality gate rejects a pass.
    #[must_use]
    pub fn default_retry_subset() -> Vec<Self> {
        vec![
            Self::Summarization,
            Self::Classification,
            Self::SentimentAnalysis,
            Self::QualityGate,
        ]
    }

    /// Returns the snake_case identifier of the stage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Intake => "intake",
            Self::ContentAnalysis => "content_analysis",
            Self::Summarization => "summarization",
            Self::Classification => "classification",
            Self::SentimentAnalysis => "sentiment_analysis",
            Self::QualityGate => "quality_gate",
        }
    }

    /// Returns the state field the stage writes, if any.
    #[must_use]
    pub const fn writes(self) -> Option<&'static str> {
        match self {
            Self::Intake => None,
            Self::ContentAnalysis => Some("structure"),
            Self::Summarization => Some("summary"),
            Self::Classification => Some("topics"),
            Self::SentimentAnalysis => Some("sentiment"),
            Self::QualityGate => Some("quality_score"),
        }
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StageName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|stage| stage.as_str() == normalized)
            .ok_or_else(|| format!("unknown stage '{}'", s.trim()))
    }
}

/// Final status of a processed article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// The quality gate accepted the result.
    Accepted,
    /// Retries ran out before the quality gate accepted the result.
    Degraded,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accepted => write!(f, "accepted"),
            Self::Degraded => write!(f, "degraded"),
        }
    }
}

/// Phase of a single pipeline run.
///
/// `Created -> Stage(k) -> GateEvaluated -> {Accepted | Retrying -> Stage(subset)
/// -> GateEvaluated | Degraded} -> Projected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// State record built, no stage run yet.
    Created,
    /// A stage is executing.
    Stage(StageName),
    /// The gate decision for the current pass has been taken.
    GateEvaluated,
    /// Waiting to start a retry pass.
    Retrying,
    /// The gate accepted the result.
    Accepted,
    /// Retries are exhausted.
    Degraded,
    /// The output record has been produced.
    Projected,
}

impl RunPhase {
    /// Returns true if moving from `self` to `next` is a legal transition.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        match (self, next) {
            (Self::Created | Self::Retrying, Self::Stage(_)) => true,
            (Self::Stage(current), Self::Stage(following)) => current < following,
            (Self::Stage(_), Self::GateEvaluated) => true,
            (Self::GateEvaluated, Self::Retrying | Self::Accepted | Self::Degraded) => true,
            (Self::Accepted | Self::Degraded, Self::Projected) => true,
            _ => false,
        }
    }
}
