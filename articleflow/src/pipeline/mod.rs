//! Pipeline building and execution.
//!
//! This module provides:
//! - Pipeline configuration with file and environment loading
//! - The builder with per-stage overrides
//! - The executor and its quality-gated retry loop
//! - Batch processing

mod batch;
mod builder;
mod config;
mod executor;
mod gate;
mod retry;


pub use batch::{BatchFailure, BatchReport};
pub use builder::PipelineBuilder;
pub use config::{PipelineConfig, ENV_MAX_RETRIES, ENV_QUALITY_THRESHOLD, ENV_RETRY_STAGES};
pub use executor::ArticlePipeline;
pub use gate::{evaluate as evaluate_gate, GateDecision};
pub use retry::{BackoffStrategy, JitterStrategy, RetryPolicy};
