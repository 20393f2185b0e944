//! Error types for articleflow.
//!
//! Only [`ValidationError`], [`ConfigError`] and cancellation abort a call.
//! [`StageExecutionError`] is contained by the executor's retry loop and ends
//! up as a warning on the result.

use crate::core::StageName;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// The main error type returned by public entry points.
#[derive(Debug, Error)]
pub enum ArticleflowError {
    /// The article data was malformed or incomplete.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// The pipeline configuration is invalid.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// The caller cancelled the run.
    #[error("Pipeline cancelled before stage '{stage}': {reason}")]
    Cancelled {
        /// The stage that was about to run.
        stage: StageName,
        /// The cancellation reason.
        reason: String,
    },
}

impl ArticleflowError {
    /// Returns true if the error is a validation failure.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if the run was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Error raised when article data is missing required fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    /// The error message.
    pub message: String,
    /// The offending fields.
    pub fields: Vec<String>,
    /// The article id, when one was supplied.
    pub article_id: Option<String>,
}

impl ValidationError {
    /// Creates a new validation error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            fields: Vec::new(),
            article_id: None,
        }
    }

    /// Creates an error listing required fields that are missing or blank.
    #[must_use]
    pub fn missing_fields(fields: Vec<String>) -> Self {
        Self {
            message: format!("Article is missing required fields: {}", fields.join(", ")),
            fields,
            article_id: None,
        }
    }

    /// Attaches the article id, ignoring empty ids.
    #[must_use]
    pub fn with_article_id(mut self, article_id: &str) -> Self {
        if !article_id.is_empty() {
            self.article_id = Some(article_id.to_string());
        }
        self
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("type".to_string(), serde_json::json!("ValidationError"));
        map.insert("message".to_string(), serde_json::json!(self.message));
        map.insert("fields".to_string(), serde_json::json!(self.fields));
        if let Some(ref id) = self.article_id {
            map.insert("article_id".to_string(), serde_json::json!(id));
        }
        map
    }
}

/// Errors reported by an analysis backend.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendError {
    /// The call did not complete in time.
    #[error("Backend call timed out after {after_ms}ms")]
    Timeout {
        /// The timeout that elapsed.
        after_ms: u64,
    },

    /// The backend refused the call (overloaded, rate limited, shutting down).
    #[error("Backend unavailable: {reason}")]
    Unavailable {
        /// Why the backend is unavailable.
        reason: String,
    },

    /// The connection failed.
    #[error("Backend transport error: {reason}")]
    Transport {
        /// Transport-level failure description.
        reason: String,
    },

    /// The backend answered with a non-success status.
    #[error("Backend returned status {status}: {body}")]
    Status {
        /// HTTP-like status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },

    /// The response could not be decoded.
    #[error("Backend response could not be decoded: {reason}")]
    Decode {
        /// Decoder error description.
        reason: String,
    },
}

impl BackendError {
    /// Creates an unavailable error.
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Creates a transport error.
    #[must_use]
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport {
            reason: reason.into(),
        }
    }

    /// Creates a decode error.
    #[must_use]
    pub fn decode(reason: impl Into<String>) -> Self {
        Self::Decode {
            reason: reason.into(),
        }
    }
}

/// Errors raised by a single stage execution.
///
/// A failed stage writes nothing to the state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StageExecutionError {
    /// The backend call failed.
    #[error("Stage '{stage}' backend call failed: {source}")]
    Backend {
        /// The failing stage.
        stage: StageName,
        /// The backend error.
        #[source]
        source: BackendError,
    },

    /// The backend answered, but the answer is unusable.
    #[error("Stage '{stage}' received an invalid response: {reason}")]
    InvalidResponse {
        /// The failing stage.
        stage: StageName,
        /// What was wrong with the response.
        reason: String,
    },

    /// A field written by an upstream stage is absent.
    #[error("Stage '{stage}' requires '{field}', which has not been produced")]
    MissingInput {
        /// The failing stage.
        stage: StageName,
        /// The absent state field.
        field: String,
    },

    /// Intake rejected the article.
    #[error("Stage '{stage}' rejected the article: {reason}")]
    InvalidInput {
        /// The failing stage.
        stage: StageName,
        /// Why the article was rejected.
        reason: String,
    },

    /// The stage produced an update for a field it does not own.
    #[error("Stage '{stage}' tried to write '{field}', which belongs to '{owner}'")]
    ForeignUpdate {
        /// The offending stage.
        stage: StageName,
        /// The field the update targets.
        field: String,
        /// The stage that owns the field.
        owner: StageName,
    },
}

impl StageExecutionError {
    /// Creates a backend error.
    #[must_use]
    pub fn backend(stage: StageName, source: BackendError) -> Self {
        Self::Backend { stage, source }
    }

    /// Creates an invalid response error.
    #[must_use]
    pub fn invalid_response(stage: StageName, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            stage,
            reason: reason.into(),
        }
    }

    /// Creates a missing input error.
    #[must_use]
    pub fn missing_input(stage: StageName, field: impl Into<String>) -> Self {
        Self::MissingInput {
            stage,
            field: field.into(),
        }
    }

    /// Creates an invalid input error.
    #[must_use]
    pub fn invalid_input(stage: StageName, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            stage,
            reason: reason.into(),
        }
    }

    /// Creates a foreign update error for `stage` returning a value owned by `owner`.
    #[must_use]
    pub fn foreign_update(stage: StageName, owner: StageName) -> Self {
        Self::ForeignUpdate {
            stage,
            field: owner.writes().unwrap_or("nothing").to_string(),
            owner,
        }
    }

    /// Returns the failing stage.
    #[must_use]
    pub fn stage(&self) -> StageName {
        match self {
            Self::Backend { stage, .. }
            | Self::InvalidResponse { stage, .. }
            | Self::MissingInput { stage, .. }
            | Self::InvalidInput { stage, .. }
            | Self::ForeignUpdate { stage, .. } => *stage,
        }
    }

    /// Returns true if another pass may clear the failure.
    ///
    /// Every backend failure goes back through the retry loop. Rejected
    /// input, missing upstream fields and foreign writes fail the same way
    /// every time.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Backend { .. } | Self::InvalidResponse { .. } => true,
            Self::MissingInput { .. } | Self::InvalidInput { .. } | Self::ForeignUpdate { .. } => {
                false
            }
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();

        match self {
            Self::Backend { source, .. } => {
                map.insert("type".to_string(), serde_json::json!("StageBackendError"));
                map.insert(
                    "backend_error".to_string(),
                    serde_json::to_value(source).unwrap_or(serde_json::Value::Null),
                );
            }
            Self::InvalidResponse { reason, .. } => {
                map.insert("type".to_string(), serde_json::json!("StageInvalidResponse"));
                map.insert("reason".to_string(), serde_json::json!(reason));
            }
            Self::MissingInput { field, .. } => {
                map.insert("type".to_string(), serde_json::json!("StageMissingInput"));
                map.insert("field".to_string(), serde_json::json!(field));
            }
            Self::InvalidInput { reason, .. } => {
                map.insert("type".to_string(), serde_json::json!("StageInvalidInput"));
                map.insert("reason".to_string(), serde_json::json!(reason));
            }
            Self::ForeignUpdate { field, owner, .. } => {
                map.insert("type".to_string(), serde_json::json!("StageForeignUpdate"));
                map.insert("field".to_string(), serde_json::json!(field));
                map.insert("owner".to_string(), serde_json::json!(owner));
            }
        }

        map.insert("stage".to_string(), serde_json::json!(self.stage()));
        map.insert("retryable".to_string(), serde_json::json!(self.is_retryable()));
        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        map
    }
}

/// Errors raised while building or loading a pipeline configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The quality threshold is outside `[0, 1]`.
    #[error("quality_threshold must be within [0, 1], got {0}")]
    InvalidThreshold(f64),

    /// The retry subset is empty.
    #[error("retry_stages must name at least one stage")]
    EmptyRetryStages,

    /// The retry subset leaves out the quality gate.
    #[error("retry_stages must include 'quality_gate'")]
    RetryWithoutQualityGate,

    /// A stage appears twice in the retry subset.
    #[error("retry_stages lists '{0}' more than once")]
    DuplicateRetryStage(StageName),

    /// A configuration value could not be interpreted.
    #[error("invalid value for '{key}': {reason}")]
    InvalidValue {
        /// The configuration key.
        key: String,
        /// Why the value is invalid.
        reason: String,
    },

    /// The configuration document is malformed.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Creates an invalid value error.
    #[must_use]
    pub fn invalid_value(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
