//! Testing utilities for article pipelines.
//!
//! This module provides:
//! - A scripted, recording analysis backend
//! - Article fixtures
//! - Assertions for article results

mod assertions;
mod backend;
mod fixtures;

pub use assertions::{
    assert_accepted, assert_degraded, assert_fully_analysed, assert_retry_count,
    assert_retry_exhausted,
};
pub use backend::{RecordedCall, ScriptedBackend};
pub use fixtures::{
    article_input, article_inputs, article_with_id, article_without_content, SAMPLE_CONTENT,
};
