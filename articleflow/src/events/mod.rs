//! Event sinks for pipeline observability.
//!
//! The executor reports each step of a run as a named event with a JSON
//! payload. Payloads always carry `article_id` and `run_id`.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

/// A run began for an article.
pub const ARTICLE_STARTED: &str = "article.started";
/// A stage is about to execute.
pub const STAGE_STARTED: &str = "stage.started";
/// A stage finished and its update was applied.
pub const STAGE_COMPLETED: &str = "stage.completed";
/// A stage failed; its output was discarded.
pub const STAGE_FAILED: &str = "stage.failed";
/// The quality gate decided the outcome of a pass.
pub const GATE_EVALUATED: &str = "gate.evaluated";
/// A retry pass is about to start.
pub const PIPELINE_RETRYING: &str = "pipeline.retrying";
/// The run ended without meeting the quality threshold.
pub const PIPELINE_DEGRADED: &str = "pipeline.degraded";
/// The run was cancelled at a stage boundary.
pub const PIPELINE_CANCELLED: &str = "pipeline.cancelled";
/// The result was projected.
pub const ARTICLE_COMPLETED: &str = "article.completed";
