//! Pipeline builder with validation.

use super::config::PipelineConfig;
use super::executor::ArticlePipeline;
use crate::backend::AnalysisBackend;
use crate::core::StageName;
use crate::errors::ConfigError;
use crate::events::{EventSink, NoOpEventSink};
use crate::stages::{default_stage, Stage};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Builder for creating validated pipelines.
///
/// Every stage slot is filled with its default implementation unless an
/// override was registered with [`with_stage`](Self::with_stage).
#[derive(Default)]
pub struct PipelineBuilder {
    backend: Option<Arc<dyn AnalysisBackend>>,
    config: PipelineConfig,
    event_sink: Option<Arc<dyn EventSink>>,
    overrides: HashMap<StageName, Arc<dyn Stage>>,
}

impl PipelineBuilder {
    /// Creates a new pipeline builder with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the analysis backend used by the default stages.
    #[must_use]
    pub fn with_backend(mut self, backend: Arc<dyn AnalysisBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Sets the configuration.
    #[must_use]
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the event sink. Defaults to [`NoOpEventSink`].
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = Some(sink);
        self
    }

    /// Replaces the implementation of the stage named by `stage.name()`.
    ///
    /// The stage keeps its canonical position in the pipeline.
    #[must_use]
    pub fn with_stage(mut self, stage: Arc<dyn Stage>) -> Self {
        self.overrides.insert(stage.name(), stage);
        self
    }

    /// Returns the configuration the pipeline will be built with.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Builds the pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or no backend was set.
    pub fn build(self) -> Result<ArticlePipeline, ConfigError> {
        self.config.validate()?;

        let backend = self
            .backend
            .ok_or_else(|| ConfigError::invalid_value("backend", "no analysis backend set"))?;

        let mut overrides = self.overrides;
        let stages: Vec<Arc<dyn Stage>> = StageName::ALL
            .into_iter()
            .map(|name| {
                overrides.remove(&name).unwrap_or_else(|| {
                    default_stage(
                        name,
                        &backend,
                        self.config.max_content_chars,
                        self.config.quality_scoring,
                    )
                })
            })
            .collect();

        let event_sink = self
            .event_sink
            .unwrap_or_else(|| Arc::new(NoOpEventSink));

        Ok(ArticlePipeline::from_parts(stages, self.config, event_sink))
    }
}

impl fmt::Debug for PipelineBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut overridden: Vec<StageName> = self.overrides.keys().copied().collect();
        overridden.sort();
        f.debug_struct("PipelineBuilder")
            .field("has_backend", &self.backend.is_some())
            .field("config", &self.config)
            .field("overrides", &overridden)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedBackend;

    #[test]
    fn test_build_requires_backend() {
        let err = PipelineBuilder::new().build().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "backend"));
    }

    #[test]
    fn test_build_validates_config() {
        let err = PipelineBuilder::new()
            .with_backend(Arc::new(ScriptedBackend::new()))
            .with_config(PipelineConfig::new().with_quality_threshold(-0.1))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidThreshold(_)));
    }

    #[test]
    fn test_override_keeps_canonical_position() {
        let backend: Arc<dyn AnalysisBackend> = Arc::new(ScriptedBackend::new());
        let replacement = default_stage(
            StageName::Summarization,
            &backend,
            50,
            crate::stages::QualityScoring::Local,
        );

        let builder = PipelineBuilder::new()
            .with_stage(replacement)
            .with_backend(backend);
        assert!(format!("{builder:?}").contains("Summarization"));

        let pipeline = builder.build().unwrap();
        assert_eq!(pipeline.stage_names(), StageName::ALL.to_vec());
    }
}
