//! # Articleflow
//!
//! A quality-gated article analysis pipeline.
//!
//! An article is threaded through six stages (intake, content analysis,
//! summarization, classification, sentiment analysis, quality gate). When
//! the quality score falls below the configured threshold, the retry subset
//! is re-run until the score passes or the retry budget is spent, and the
//! result is marked accepted or degraded accordingly.
//!
//! - **Typed state**: each stage writes exactly one field through a [`StageUpdate`](core::StageUpdate)
//! - **Pluggable analysis**: stages delegate inference to an [`AnalysisBackend`](backend::AnalysisBackend)
//! - **Observability**: structured `tracing` logs and pipeline events
//! - **Cancellation**: runs stop cleanly at stage boundaries
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use articleflow::prelude::*;
//!
//! let backend = Arc::new(HttpAnalysisBackend::new(HttpBackendConfig::new("http://analysis:8080"))?);
//! let pipeline = ArticlePipeline::new(backend, PipelineConfig::from_env()?)?;
//!
//! let result = pipeline
//!     .process(ArticleInput::new("a1", text, "https://news.example/a1", "wire"))
//!     .await?;
//! println!("{}", serde_json::to_string_pretty(&result)?);
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod backend;
pub mod cancellation;
pub mod core;
pub mod errors;
pub mod events;
pub mod observability;
pub mod pipeline;
pub mod stages;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    #[cfg(feature = "http")]
    pub use crate::backend::{HttpAnalysisBackend, HttpBackendConfig};
    pub use crate::backend::AnalysisBackend;
    pub use crate::cancellation::CancellationToken;
    pub use crate::core::{
        ArticleInput, ArticleResult, ArticleState, ContentStructure, RunStatus, RunWarning,
        Sentiment, StageName, StageUpdate, Urgency,
    };
    pub use crate::errors::{
        ArticleflowError, BackendError, ConfigError, StageExecutionError, ValidationError,
    };
    pub use crate::events::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::observability::{init_tracing, LogFormat};
    pub use crate::pipeline::{
        ArticlePipeline, BatchReport, PipelineBuilder, PipelineConfig, RetryPolicy,
    };
    pub use crate::stages::{QualityScoring, Stage};
    pub use std::sync::Arc;
}
