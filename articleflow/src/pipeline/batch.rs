//! Concurrent processing of many articles.

use super::executor::ArticlePipeline;
use crate::cancellation::CancellationToken;
use crate::core::{ArticleInput, ArticleResult, RunStatus};
use crate::errors::ArticleflowError;
use futures::stream::{self, StreamExt};
use tracing::{info, warn};

/// An article that produced no result.
#[derive(Debug)]
pub struct BatchFailure {
    /// Position of the article in the submitted batch.
    pub index: usize,
    /// The article id as submitted.
    pub article_id: String,
    /// Why the article was rejected.
    pub error: ArticleflowError,
}

/// Outcome of [`ArticlePipeline::process_batch`].
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Results in submission order.
    pub results: Vec<ArticleResult>,
    /// Rejected articles in submission order.
    pub failures: Vec<BatchFailure>,
    /// Number of accepted results.
    pub accepted: usize,
    /// Number of degraded results.
    pub degraded: usize,
}

impl BatchReport {
    /// Returns the number of articles submitted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.results.len() + self.failures.len()
    }

    /// Returns true if every article produced a result.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, index: usize, article_id: String, outcome: Result<ArticleResult, ArticleflowError>) {
        match outcome {
            Ok(result) => {
                match result.status {
                    RunStatus::Accepted => self.accepted += 1,
                    RunStatus::Degraded => self.degraded += 1,
                }
                self.results.push(result);
            }
            Err(error) => {
                warn!(article_id = %article_id, index, error = %error, "Article rejected");
                self.failures.push(BatchFailure {
                    index,
                    article_id,
                    error,
                });
            }
        }
    }
}

impl ArticlePipeline {
    /// Processes `inputs` with at most `concurrency` articles in flight.
    ///
    /// Every article gets its own state; one rejected article does not stop
    /// the others. A `concurrency` of 0 is treated as 1.
    pub async fn process_batch(&self, inputs: Vec<ArticleInput>, concurrency: usize) -> BatchReport {
        self.process_batch_with_cancellation(inputs, concurrency, &CancellationToken::new())
            .await
    }

    /// Like [`process_batch`](Self::process_batch), sharing one cancellation
    /// token across all runs.
    pub async fn process_batch_with_cancellation(
        &self,
        inputs: Vec<ArticleInput>,
        concurrency: usize,
        cancel: &CancellationToken,
    ) -> BatchReport {
        let submitted = inputs.len();
        let outcomes: Vec<_> = stream::iter(inputs.into_iter().enumerate())
            .map(|(index, input)| async move {
                let article_id = input.id.clone();
                let outcome = self.process_with_cancellation(input, cancel).await;
                (index, article_id, outcome)
            })
            .buffered(concurrency.max(1))
            .collect()
            .await;

        let mut report = BatchReport::default();
        for (index, article_id, outcome) in outcomes {
            report.record(index, article_id, outcome);
        }

        info!(
            submitted,
            accepted = report.accepted,
            degraded = report.degraded,
            failed = report.failures.len(),
            "Batch processed"
        );
        report
    }
}
