//! Analysis backend contract.
//!
//! The backend supplies the actual inference results for each analysing
//! stage. Every method takes a typed request carrying only the state fields
//! the stage reads, and reports failures as [`BackendError`] rather than an
//! empty result.

#[cfg(feature = "http")]
mod http;

#[cfg(feature = "http")]
pub use http::{HttpAnalysisBackend, HttpBackendConfig};

use crate::core::{ContentStructure, Sentiment};
use crate::errors::BackendError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Request for structural analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureRequest {
    /// Article identifier, for correlation.
    pub article_id: String,
    /// Article text.
    pub content: String,
}

/// Request for a summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRequest {
    /// Article identifier, for correlation.
    pub article_id: String,
    /// Article text.
    pub content: String,
    /// Structure produced by content analysis.
    pub structure: ContentStructure,
}

/// Request for topic labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationRequest {
    /// Article identifier, for correlation.
    pub article_id: String,
    /// Article text.
    pub content: String,
    /// Structure produced by content analysis.
    pub structure: ContentStructure,
}

/// Request for sentiment analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentRequest {
    /// Article identifier, for correlation.
    pub article_id: String,
    /// Article text.
    pub content: String,
}

/// Request for a quality score over the accumulated analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityRequest {
    /// Article identifier, for correlation.
    pub article_id: String,
    /// Current summary.
    pub summary: Option<String>,
    /// Current topic labels.
    pub topics: Option<Vec<String>>,
    /// Current sentiment.
    pub sentiment: Option<Sentiment>,
    /// Current structure.
    pub structure: Option<ContentStructure>,
}

/// An external analysis service.
///
/// Implementations must be safe to share between concurrent runs; any
/// connection pooling or backpressure is the implementation's concern.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Extracts entities, dates, and key points.
    async fn analyze_structure(
        &self,
        request: &StructureRequest,
    ) -> Result<ContentStructure, BackendError>;

    /// Produces a summary of the article.
    async fn summarize(&self, request: &SummaryRequest) -> Result<String, BackendError>;

    /// Returns ordered topic labels.
    async fn classify(&self, request: &ClassificationRequest) -> Result<Vec<String>, BackendError>;

    /// Determines tone, objectivity, and urgency.
    async fn analyze_sentiment(&self, request: &SentimentRequest)
        -> Result<Sentiment, BackendError>;

    /// Scores the completeness and confidence of the analysis, in `[0, 1]`.
    async fn score_quality(&self, request: &QualityRequest) -> Result<f64, BackendError>;
}
