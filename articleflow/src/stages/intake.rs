//! Intake: validates the article before any analysis runs.

use super::Stage;
use crate::core::{ArticleState, StageName, StageUpdate};
use crate::errors::StageExecutionError;
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;

#[allow(clippy::expect_used)]
static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i)https?://[^\s/?#]+[^\s]*$").expect("URL pattern is a valid regex")
});

/// Checks content, URL, and source. Writes nothing and calls no backend.
#[derive(Debug, Clone, Default)]
pub struct IntakeStage;

impl IntakeStage {
    /// Creates a new intake stage.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Stage for IntakeStage {
    fn name(&self) -> StageName {
        StageName::Intake
    }

    async fn execute(&self, state: &ArticleState) -> Result<StageUpdate, StageExecutionError> {
        if state.content().trim().is_empty() {
            return Err(StageExecutionError::invalid_input(
                StageName::Intake,
                "content is blank",
            ));
        }
        if !URL_PATTERN.is_match(state.url().trim()) {
            return Err(StageExecutionError::invalid_input(
                StageName::Intake,
                format!("'{}' is not an http(s) URL", state.url()),
            ));
        }
        if state.source().trim().is_empty() {
            return Err(StageExecutionError::invalid_input(
                StageName::Intake,
                "source is blank",
            ));
        }
        Ok(StageUpdate::Validated)
    }
}
