//! The article pipeline executor.
//!
//! A run threads one owned [`ArticleState`] through the stage list, lets the
//! quality gate decide after every pass, re-runs the retry subset while the
//! budget lasts, and projects the final state into an [`ArticleResult`].

use super::builder::PipelineBuilder;
use super::config::PipelineConfig;
use super::gate::{self, GateDecision};
use crate::backend::AnalysisBackend;
use crate::cancellation::CancellationToken;
use crate::core::{
    ArticleInput, ArticleResult, ArticleState, RunPhase, RunStatus, RunWarning, StageName,
};
use crate::errors::{ArticleflowError, ConfigError, StageExecutionError};
use crate::events::{self, EventSink};
use crate::observability::SpanTimer;
use crate::stages::{Stage, StageFailure};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn, Span};
use uuid::Uuid;

/// Bookkeeping for one run.
struct RunContext<'a> {
    run_id: Uuid,
    article_id: String,
    phase: RunPhase,
    pass: u32,
    succeeded: HashSet<StageName>,
    warnings: Vec<RunWarning>,
    cancel: &'a CancellationToken,
}

impl RunContext<'_> {
    fn advance(&mut self, next: RunPhase) {
        debug_assert!(
            self.phase.can_transition_to(next),
            "illegal run transition {:?} -> {next:?}",
            self.phase
        );
        self.phase = next;
    }

    fn payload(&self, extra: Value) -> Value {
        let mut payload = json!({
            "article_id": self.article_id,
            "run_id": self.run_id.to_string(),
            "pass": self.pass,
        });
        if let (Some(target), Value::Object(fields)) = (payload.as_object_mut(), extra) {
            target.extend(fields);
        }
        payload
    }
}

/// What a pass left behind.
struct PassOutcome {
    state: ArticleState,
    failure: Option<StageExecutionError>,
}

/// Runs articles through the six stages with a quality-gated retry loop.
///
/// The pipeline holds no per-article state; one instance can serve many
/// concurrent runs.
pub struct ArticlePipeline {
    stages: Vec<Arc<dyn Stage>>,
    config: PipelineConfig,
    event_sink: Arc<dyn EventSink>,
}

impl ArticlePipeline {
    /// Creates a pipeline with the default stages over `backend`.
    pub fn new(
        backend: Arc<dyn AnalysisBackend>,
        config: PipelineConfig,
    ) -> Result<Self, ConfigError> {
        PipelineBuilder::new()
            .with_backend(backend)
            .with_config(config)
            .build()
    }

    /// Returns a builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub(super) fn from_parts(
        stages: Vec<Arc<dyn Stage>>,
        config: PipelineConfig,
        event_sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            stages,
            config,
            event_sink,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Returns the stage names in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<StageName> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Upper bound on stage invocations for a single run.
    #[must_use]
    pub fn max_stage_invocations(&self) -> usize {
        self.stages.len() + self.config.max_retries as usize * self.config.retry_stages.len()
    }

    /// Processes one article.
    ///
    /// # Errors
    ///
    /// Returns [`ArticleflowError::Validation`] when a required input field is
    /// blank. Stage failures never surface here; they end as a degraded result.
    pub async fn process(&self, input: ArticleInput) -> Result<ArticleResult, ArticleflowError> {
        self.process_with_cancellation(input, &CancellationToken::new())
            .await
    }

    /// Processes one article, stopping at the next stage boundary once
    /// `cancel` fires.
    ///
    /// # Errors
    ///
    /// Returns [`ArticleflowError::Validation`] for blank input and
    /// [`ArticleflowError::Cancelled`] when the token fired before a stage.
    #[instrument(
        name = "article.process",
        skip_all,
        fields(article_id = %input.id, run_id = tracing::field::Empty)
    )]
    pub async fn process_with_cancellation(
        &self,
        input: ArticleInput,
        cancel: &CancellationToken,
    ) -> Result<ArticleResult, ArticleflowError> {
        input.validate()?;

        let mut run = RunContext {
            run_id: Uuid::new_v4(),
            article_id: input.id.clone(),
            phase: RunPhase::Created,
            pass: 1,
            succeeded: HashSet::new(),
            warnings: Vec::new(),
            cancel,
        };
        Span::current().record("run_id", tracing::field::display(run.run_id));

        info!(source = %input.source, "Processing article");
        self.emit(&run, events::ARTICLE_STARTED, json!({ "url": input.url }))
            .await;

        let mut state = ArticleState::from_input(input);
        let status = loop {
            let plan = self.pass_plan(&run);
            let outcome = self.run_pass(state, &plan, &mut run).await?;
            state = outcome.state;

            run.advance(RunPhase::GateEvaluated);
            let decision = gate::evaluate(
                state.quality_score(),
                outcome.failure.as_ref(),
                state.retry_count(),
                &self.config,
            );
            debug!(
                pass = run.pass,
                quality_score = state.quality_score(),
                decision = %decision,
                "Gate evaluated"
            );
            self.emit(
                &run,
                events::GATE_EVALUATED,
                json!({
                    "quality_score": state.quality_score(),
                    "threshold": self.config.quality_threshold,
                    "stage_failed": outcome.failure.as_ref().map(StageExecutionError::stage),
                    "decision": decision,
                }),
            )
            .await;

            match decision {
                GateDecision::Accept => {
                    run.advance(RunPhase::Accepted);
                    break RunStatus::Accepted;
                }
                GateDecision::Degrade => {
                    run.advance(RunPhase::Degraded);
                    let exhausted = outcome
                        .failure
                        .as_ref()
                        .map_or(true, StageExecutionError::is_retryable);
                    if exhausted {
                        run.warnings.push(RunWarning::RetryExhausted {
                            retries: state.retry_count(),
                            quality_score: state.quality_score(),
                            threshold: self.config.quality_threshold,
                        });
                    }
                    warn!(
                        retries = state.retry_count(),
                        quality_score = state.quality_score(),
                        "Article degraded"
                    );
                    self.emit(
                        &run,
                        events::PIPELINE_DEGRADED,
                        json!({
                            "retries": state.retry_count(),
                            "quality_score": state.quality_score(),
                            "retry_exhausted": exhausted,
                        }),
                    )
                    .await;
                    break RunStatus::Degraded;
                }
                GateDecision::Retry => {
                    run.advance(RunPhase::Retrying);
                    state.begin_retry();
                    run.pass += 1;

                    let delay = self.config.retry_policy.delay_for(state.retry_count());
                    info!(
                        retry = state.retry_count(),
                        max_retries = self.config.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying article"
                    );
                    self.emit(
                        &run,
                        events::PIPELINE_RETRYING,
                        json!({
                            "retry": state.retry_count(),
                            "delay_ms": delay.as_millis() as u64,
                        }),
                    )
                    .await;
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        };

        let warnings = std::mem::take(&mut run.warnings);
        let result = ArticleResult::from_state(&state, status, warnings, run.run_id);
        run.advance(RunPhase::Projected);

        info!(
            status = %result.status,
            quality_score = result.quality_score,
            retry_count = result.retry_count,
            "Article processed"
        );
        self.emit(
            &run,
            events::ARTICLE_COMPLETED,
            json!({
                "status": result.status,
                "quality_score": result.quality_score,
                "retry_count": result.retry_count,
                "warnings": result.warnings.len(),
            }),
        )
        .await;

        Ok(result)
    }

    /// Selects the stages of the current pass.
    ///
    /// The first pass runs everything. A retry pass runs the retry subset
    /// plus any stage that has not yet succeeded, in canonical order.
    fn pass_plan(&self, run: &RunContext<'_>) -> Vec<Arc<dyn Stage>> {
        self.stages
            .iter()
            .filter(|stage| {
                let name = stage.name();
                run.pass == 1
                    || self.config.is_retry_stage(name)
                    || !run.succeeded.contains(&name)
            })
            .cloned()
            .collect()
    }

    /// Runs one pass. Stops at the first failing stage.
    async fn run_pass(
        &self,
        mut state: ArticleState,
        plan: &[Arc<dyn Stage>],
        run: &mut RunContext<'_>,
    ) -> Result<PassOutcome, ArticleflowError> {
        for stage in plan {
            let name = stage.name();

            if run.cancel.is_cancelled() {
                let reason = run
                    .cancel
                    .reason()
                    .unwrap_or_else(|| "cancelled".to_string());
                warn!(stage = %name, reason = %reason, "Run cancelled");
                self.emit(
                    run,
                    events::PIPELINE_CANCELLED,
                    json!({ "stage": name, "reason": reason }),
                )
                .await;
                return Err(ArticleflowError::Cancelled { stage: name, reason });
            }

            run.advance(RunPhase::Stage(name));
            self.emit(run, events::STAGE_STARTED, json!({ "stage": name }))
                .await;
            let timer = SpanTimer::start(name.as_str());

            match stage.run(state).await {
                Ok(next) => {
                    let duration_ms = timer.finish();
                    debug!(stage = %name, pass = run.pass, duration_ms, "Stage completed");
                    run.succeeded.insert(name);
                    self.emit(
                        run,
                        events::STAGE_COMPLETED,
                        json!({ "stage": name, "duration_ms": duration_ms }),
                    )
                    .await;
                    state = next;
                }
                Err(StageFailure { state, error }) => {
                    let duration_ms = timer.finish();
                    warn!(
                        stage = %name,
                        pass = run.pass,
                        retryable = error.is_retryable(),
                        error = %error,
                        "Stage failed"
                    );
                    run.warnings.push(RunWarning::StageFailed {
                        stage: name,
                        pass: run.pass,
                        message: error.to_string(),
                    });
                    self.emit(
                        run,
                        events::STAGE_FAILED,
                        json!({
                            "stage": name,
                            "duration_ms": duration_ms,
                            "retryable": error.is_retryable(),
                            "error": error.to_dict(),
                        }),
                    )
                    .await;
                    return Ok(PassOutcome {
                        state,
                        failure: Some(error),
                    });
                }
            }
        }

        Ok(PassOutcome {
            state,
            failure: None,
        })
    }

    async fn emit(&self, run: &RunContext<'_>, event_type: &str, extra: Value) {
        self.event_sink
            .emit(event_type, Some(run.payload(extra)))
            .await;
    }
}

impl fmt::Debug for ArticlePipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArticlePipeline")
            .field("stages", &self.stage_names())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{article_input, ScriptedBackend};

    fn pipeline(backend: ScriptedBackend) -> ArticlePipeline {
        ArticlePipeline::new(Arc::new(backend), PipelineConfig::default()).unwrap()
    }

    #[test]
    fn test_stage_names_in_order() {
        let pipeline = pipeline(ScriptedBackend::new());
        assert_eq!(pipeline.stage_names(), StageName::ALL.to_vec());
        assert_eq!(pipeline.max_stage_invocations(), 6 + 3 * 4);
    }

    #[test]
    fn test_payload_merges_run_fields() {
        let token = CancellationToken::new();
        let run = RunContext {
            run_id: Uuid::nil(),
            article_id: "a1".to_string(),
            phase: RunPhase::Created,
            pass: 2,
            succeeded: HashSet::new(),
            warnings: Vec::new(),
            cancel: &token,
        };

        let payload = run.payload(json!({ "stage": "intake" }));
        assert_eq!(payload["article_id"], "a1");
        assert_eq!(payload["pass"], 2);
        assert_eq!(payload["stage"], "intake");
    }

    #[test]
    fn test_retry_plan_adds_unfinished_stages() {
        let pipeline = pipeline(ScriptedBackend::new());
        let token = CancellationToken::new();
        let mut run = RunContext {
            run_id: Uuid::nil(),
            article_id: "a1".to_string(),
            phase: RunPhase::Created,
            pass: 1,
            succeeded: HashSet::from([StageName::Intake]),
            warnings: Vec::new(),
            cancel: &token,
        };

        assert_eq!(pipeline.pass_plan(&run).len(), 6);

        run.pass = 2;
        let names: Vec<StageName> = pipeline.pass_plan(&run).iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec![
                StageName::ContentAnalysis,
                StageName::Summarization,
                StageName::Classification,
                StageName::SentimentAnalysis,
                StageName::QualityGate,
            ]
        );

        run.succeeded.insert(StageName::ContentAnalysis);
        assert_eq!(pipeline.pass_plan(&run).len(), 4);
    }

    #[tokio::test]
    async fn test_process_accepts_good_article() {
        let result = pipeline(ScriptedBackend::new())
            .process(article_input())
            .await
            .unwrap();

        assert_eq!(result.id, "a1");
        assert_eq!(result.status, RunStatus::Accepted);
        assert_eq!(result.passes, 1);
    }
}
