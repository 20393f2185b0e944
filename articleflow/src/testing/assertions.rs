//! Assertions for article results.

use crate::core::{ArticleResult, RunStatus, RunWarning};

/// Asserts that the result was accepted by the quality gate.
pub fn assert_accepted(result: &ArticleResult) {
    assert_eq!(
        result.status,
        RunStatus::Accepted,
        "Expected accepted, got degraded with warnings: {:?}",
        result.warnings
    );
}

/// Asserts that the result was degraded.
pub fn assert_degraded(result: &ArticleResult) {
    assert_eq!(
        result.status,
        RunStatus::Degraded,
        "Expected degraded, got accepted with quality {}",
        result.quality_score
    );
}

/// Asserts the number of retry passes.
pub fn assert_retry_count(result: &ArticleResult, expected: u32) {
    assert_eq!(
        result.retry_count, expected,
        "Expected {} retries, got {} (quality {})",
        expected, result.retry_count, result.quality_score
    );
    assert_eq!(result.passes, expected + 1);
}

/// Asserts that the result carries a retry-exhausted warning.
pub fn assert_retry_exhausted(result: &ArticleResult) {
    assert!(
        result
            .warnings
            .iter()
            .any(|w| matches!(w, RunWarning::RetryExhausted { .. })),
        "Expected a retry-exhausted warning, got: {:?}",
        result.warnings
    );
}

/// Asserts that every analysed field is populated.
pub fn assert_fully_analysed(result: &ArticleResult) {
    assert!(result.structure.is_some(), "structure is missing");
    assert!(result.summary.is_some(), "summary is missing");
    assert!(result.topics.is_some(), "topics are missing");
    assert!(result.sentiment.is_some(), "sentiment is missing");
}
