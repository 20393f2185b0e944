//! A deterministic analysis backend for tests and benchmarks.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};

use crate::backend::{
    AnalysisBackend, ClassificationRequest, QualityRequest, SentimentRequest, StructureRequest,
    SummaryRequest,
};
use crate::core::{ContentStructure, Sentiment, StageName, Urgency};
use crate::errors::BackendError;

const SUMMARY_WORDS: usize = 25;
const MAX_ENTITIES: usize = 5;

/// A backend request captured by [`ScriptedBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    /// `analyze_structure` request.
    Structure(StructureRequest),
    /// `summarize` request.
    Summary(SummaryRequest),
    /// `classify` request.
    Classification(ClassificationRequest),
    /// `analyze_sentiment` request.
    Sentiment(SentimentRequest),
    /// `score_quality` request.
    Quality(QualityRequest),
}

impl RecordedCall {
    /// Returns the stage that issued the request.
    #[must_use]
    pub fn stage(&self) -> StageName {
        match self {
            Self::Structure(_) => StageName::ContentAnalysis,
            Self::Summary(_) => StageName::Summarization,
            Self::Classification(_) => StageName::Classification,
            Self::Sentiment(_) => StageName::SentimentAnalysis,
            Self::Quality(_) => StageName::QualityGate,
        }
    }

    /// Returns the article the request was made for.
    #[must_use]
    pub fn article_id(&self) -> &str {
        match self {
            Self::Structure(r) => &r.article_id,
            Self::Summary(r) => &r.article_id,
            Self::Classification(r) => &r.article_id,
            Self::Sentiment(r) => &r.article_id,
            Self::Quality(r) => &r.article_id,
        }
    }
}

#[derive(Debug)]
struct Script {
    quality_scores: VecDeque<f64>,
    failures: HashMap<StageName, VecDeque<BackendError>>,
    topics: Vec<String>,
    sentiment: Sentiment,
    numbered_summaries: bool,
    calls: Vec<RecordedCall>,
}

/// An in-memory [`AnalysisBackend`] with scripted answers.
///
/// Quality scores are served in order and the last one repeats. Failures can
/// be queued per stage and are returned before any scripted answer. Every
/// request is recorded.
#[derive(Debug)]
pub struct ScriptedBackend {
    script: Mutex<Script>,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self {
            script: Mutex::new(Script {
                quality_scores: VecDeque::from([0.9]),
                failures: HashMap::new(),
                topics: vec!["government".to_string(), "policy".to_string()],
                sentiment: Sentiment::new("neutral", 0.8, Urgency::Medium),
                numbered_summaries: false,
                calls: Vec::new(),
            }),
        }
    }
}

impl ScriptedBackend {
    /// Creates a backend that scores every pass 0.9.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves these quality scores in order; the last one repeats.
    #[must_use]
    pub fn with_quality_scores(self, scores: impl IntoIterator<Item = f64>) -> Self {
        {
            let mut script = self.script.lock();
            let scores: VecDeque<f64> = scores.into_iter().collect();
            if !scores.is_empty() {
                script.quality_scores = scores;
            }
        }
        self
    }

    /// Sets the topic labels returned by `classify`.
    #[must_use]
    pub fn with_topics(self, topics: &[&str]) -> Self {
        self.script.lock().topics = topics.iter().map(ToString::to_string).collect();
        self
    }

    /// Sets the sentiment returned by `analyze_sentiment`.
    #[must_use]
    pub fn with_sentiment(self, sentiment: Sentiment) -> Self {
        self.script.lock().sentiment = sentiment;
        self
    }

    /// Appends the call number to each summary so passes can be told apart.
    #[must_use]
    pub fn with_numbered_summaries(self) -> Self {
        self.script.lock().numbered_summaries = true;
        self
    }

    /// Queues a failure for the next call issued by `stage`.
    #[must_use]
    pub fn failing(self, stage: StageName, error: BackendError) -> Self {
        self.fail_next(stage, error);
        self
    }

    /// Queues a failure for the next call issued by `stage`.
    pub fn fail_next(&self, stage: StageName, error: BackendError) {
        self.script
            .lock()
            .failures
            .entry(stage)
            .or_default()
            .push_back(error);
    }

    /// Returns every recorded request in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.script.lock().calls.clone()
    }

    /// Returns the number of requests issued by `stage`.
    #[must_use]
    pub fn call_count(&self, stage: StageName) -> usize {
        self.script
            .lock()
            .calls
            .iter()
            .filter(|call| call.stage() == stage)
            .count()
    }

    /// Returns the total number of requests.
    #[must_use]
    pub fn total_calls(&self) -> usize {
        self.script.lock().calls.len()
    }

    /// Clears recorded requests.
    pub fn reset_calls(&self) {
        self.script.lock().calls.clear();
    }

    /// Records the call and returns a queued failure for its stage, if any.
    fn record(&self, call: RecordedCall) -> Result<(), BackendError> {
        let mut script = self.script.lock();
        let stage = call.stage();
        script.calls.push(call);
        match script.failures.get_mut(&stage).and_then(VecDeque::pop_front) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

fn first_sentence(content: &str) -> Option<String> {
    let end = content
        .find(['.', '!', '?'])
        .map_or(content.len(), |index| index + 1);
    let sentence = content[..end].trim();
    (!sentence.is_empty()).then(|| sentence.to_string())
}

fn capitalised_words(content: &str) -> Vec<String> {
    let mut entities: Vec<String> = Vec::new();
    for word in content.split_whitespace().skip(1) {
        let word = word.trim_matches(|c: char| !c.is_alphanumeric());
        if word.chars().next().is_some_and(char::is_uppercase)
            && !entities.iter().any(|e| e == word)
        {
            entities.push(word.to_string());
        }
        if entities.len() == MAX_ENTITIES {
            break;
        }
    }
    entities
}

fn years(content: &str) -> Vec<String> {
    content
        .split_whitespace()
        .map(|word| word.trim_matches(|c: char| !c.is_ascii_digit()))
        .filter(|word| word.len() == 4 && word.starts_with(['1', '2']))
        .map(ToString::to_string)
        .collect()
}

#[async_trait]
impl AnalysisBackend for ScriptedBackend {
    async fn analyze_structure(
        &self,
        request: &StructureRequest,
    ) -> Result<ContentStructure, BackendError> {
        self.record(RecordedCall::Structure(request.clone()))?;
        Ok(ContentStructure {
            entities: capitalised_words(&request.content),
            dates: years(&request.content),
            key_points: first_sentence(&request.content).into_iter().collect(),
        })
    }

    async fn summarize(&self, request: &SummaryRequest) -> Result<String, BackendError> {
        self.record(RecordedCall::Summary(request.clone()))?;
        let words: Vec<&str> = request.content.split_whitespace().take(SUMMARY_WORDS).collect();
        let mut summary = words.join(" ");

        let script = self.script.lock();
        if script.numbered_summaries {
            let draft = script
                .calls
                .iter()
                .filter(|call| matches!(call, RecordedCall::Summary(_)))
                .count();
            summary.push_str(&format!(" [draft {draft}]"));
        }
        Ok(summary)
    }

    async fn classify(&self, request: &ClassificationRequest) -> Result<Vec<String>, BackendError> {
        self.record(RecordedCall::Classification(request.clone()))?;
        Ok(self.script.lock().topics.clone())
    }

    async fn analyze_sentiment(&self, request: &SentimentRequest) -> Result<Sentiment, BackendError> {
        self.record(RecordedCall::Sentiment(request.clone()))?;
        Ok(self.script.lock().sentiment.clone())
    }

    async fn score_quality(&self, request: &QualityRequest) -> Result<f64, BackendError> {
        self.record(RecordedCall::Quality(request.clone()))?;
        let mut script = self.script.lock();
        let score = if script.quality_scores.len() > 1 {
            script.quality_scores.pop_front()
        } else {
            script.quality_scores.front().copied()
        };
        Ok(score.unwrap_or(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn quality_request() -> QualityRequest {
        QualityRequest {
            article_id: "a1".to_string(),
            summary: None,
            topics: None,
            sentiment: None,
            structure: None,
        }
    }

    #[tokio::test]
    async fn test_scores_served_in_order_last_repeats() {
        let backend = ScriptedBackend::new().with_quality_scores([0.3, 0.8]);
        let request = quality_request();

        assert_eq!(backend.score_quality(&request).await.unwrap(), 0.3);
        assert_eq!(backend.score_quality(&request).await.unwrap(), 0.8);
        assert_eq!(backend.score_quality(&request).await.unwrap(), 0.8);
        assert_eq!(backend.call_count(StageName::QualityGate), 3);
    }

    #[tokio::test]
    async fn test_queued_failure_is_returned_once() {
        let backend = ScriptedBackend::new()
            .failing(StageName::QualityGate, BackendError::Timeout { after_ms: 10 });
        let request = quality_request();

        assert!(backend.score_quality(&request).await.is_err());
        assert!(backend.score_quality(&request).await.is_ok());
    }

    #[tokio::test]
    async fn test_structure_is_derived_from_content() {
        let backend = ScriptedBackend::new();
        let structure = backend
            .analyze_structure(&StructureRequest {
                article_id: "a1".to_string(),
                content: "The European Parliament voted in 2024. Talks continue.".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(structure.entities, vec!["European", "Parliament"]);
        assert_eq!(structure.dates, vec!["2024"]);
        assert_eq!(structure.key_points, vec!["The European Parliament voted in 2024."]);
    }

    #[tokio::test]
    async fn test_numbered_summaries() {
        let backend = ScriptedBackend::new().with_numbered_summaries();
        let request = SummaryRequest {
            article_id: "a1".to_string(),
            content: "Short text".to_string(),
            structure: ContentStructure::default(),
        };

        assert_eq!(backend.summarize(&request).await.unwrap(), "Short text [draft 1]");
        assert_eq!(backend.summarize(&request).await.unwrap(), "Short text [draft 2]");
    }
}
