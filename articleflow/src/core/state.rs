//! The article input and the per-run state record.

use crate::errors::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw article data submitted by the caller.
///
/// Missing fields deserialize to empty strings so that [`ArticleInput::validate`]
/// can report them instead of failing inside serde.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleInput {
    /// Caller-assigned article identifier.
    #[serde(default)]
    pub id: String,
    /// Full article text.
    #[serde(default)]
    pub content: String,
    /// Canonical article URL.
    #[serde(default)]
    pub url: String,
    /// Publication or feed the article came from.
    #[serde(default)]
    pub source: String,
}

impl ArticleInput {
    /// Creates a new article input.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        content: impl Into<String>,
        url: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            url: url.into(),
            source: source.into(),
        }
    }

    /// Checks that every field is present and not blank.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let fields = [
            ("id", &self.id),
            ("content", &self.content),
            ("url", &self.url),
            ("source", &self.source),
        ];

        let missing: Vec<String> = fields
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| (*name).to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::missing_fields(missing).with_article_id(self.id.trim()))
        }
    }
}

/// Entities, dates, and key points extracted from the article.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentStructure {
    /// Named entities (people, organisations, places).
    #[serde(default)]
    pub entities: Vec<String>,
    /// Dates mentioned in the article.
    #[serde(default)]
    pub dates: Vec<String>,
    /// The article's main points.
    #[serde(default)]
    pub key_points: Vec<String>,
}

impl ContentStructure {
    /// Returns true if none of the three lists has an entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.dates.is_empty() && self.key_points.is_empty()
    }

    /// Number of non-empty lists, between 0 and 3.
    #[must_use]
    pub fn populated_sections(&self) -> usize {
        [&self.entities, &self.dates, &self.key_points]
            .iter()
            .filter(|section| !section.is_empty())
            .count()
    }
}

/// How pressing the article's subject is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    /// Background or evergreen content.
    Low,
    /// Ordinary news.
    #[default]
    Medium,
    /// Breaking or time-critical content.
    High,
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Tone, objectivity, and urgency of the article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    /// Free-form tone label, e.g. "neutral" or "alarmed".
    pub tone: String,
    /// Objectivity score in `[0, 1]`.
    pub objectivity: f64,
    /// Urgency level.
    pub urgency: Urgency,
}

impl Sentiment {
    /// Creates a new sentiment result.
    #[must_use]
    pub fn new(tone: impl Into<String>, objectivity: f64, urgency: Urgency) -> Self {
        Self {
            tone: tone.into(),
            objectivity,
            urgency,
        }
    }
}

/// The state record threaded through the pipeline for one article.
///
/// The identifiers and content are fixed at creation. Analysis fields are only
/// written through [`crate::core::StageUpdate::apply`], and `retry_count` only by
/// the executor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleState {
    article_id: String,
    url: String,
    source: String,
    content: String,
    pub(crate) structure: Option<ContentStructure>,
    pub(crate) summary: Option<String>,
    pub(crate) topics: Option<Vec<String>>,
    pub(crate) sentiment: Option<Sentiment>,
    pub(crate) quality_score: f64,
    retry_count: u32,
}

impl ArticleState {
    /// Builds a fresh state record from validated input.
    #[must_use]
    pub fn from_input(input: ArticleInput) -> Self {
        Self {
            article_id: input.id,
            url: input.url,
            source: input.source,
            content: input.content,
            structure: None,
            summary: None,
            topics: None,
            sentiment: None,
            quality_score: 0.0,
            retry_count: 0,
        }
    }

    /// Returns the article identifier.
    #[must_use]
    pub fn article_id(&self) -> &str {
        &self.article_id
    }

    /// Returns the article URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the article source.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the article text.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the extracted structure, if content analysis has run.
    #[must_use]
    pub fn structure(&self) -> Option<&ContentStructure> {
        self.structure.as_ref()
    }

    /// Returns the summary, if summarization has run.
    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// Returns the topic labels, if classification has run.
    #[must_use]
    pub fn topics(&self) -> Option<&[String]> {
        self.topics.as_deref()
    }

    /// Returns the sentiment, if sentiment analysis has run.
    #[must_use]
    pub fn sentiment(&self) -> Option<&Sentiment> {
        self.sentiment.as_ref()
    }

    /// Returns the latest quality score (0 until the gate has run).
    #[must_use]
    pub fn quality_score(&self) -> f64 {
        self.quality_score
    }

    /// Returns how many retry passes have started.
    #[must_use]
    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub(crate) fn begin_retry(&mut self) {
        self.retry_count += 1;
    }

    /// Returns the content cut to at most `max_chars` characters.
    #[must_use]
    pub fn content_excerpt(&self, max_chars: usize) -> String {
        match self.content.char_indices().nth(max_chars) {
            Some((byte_index, _)) => self.content[..byte_index].to_string(),
            None => self.content.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn input() -> ArticleInput {
        ArticleInput::new("a1", "Parliament passed the bill.", "http://x", "wire")
    }

    #[test]
    fn test_validate_accepts_complete_input() {
        assert!(input().validate().is_ok());
    }

    #[test]
    fn test_validate_reports_every_missing_field() {
        let mut bad = input();
        bad.content = String::new();
        bad.source = "   ".to_string();

        let err = bad.validate().unwrap_err();
        assert_eq!(err.fields, vec!["content".to_string(), "source".to_string()]);
        assert_eq!(err.article_id.as_deref(), Some("a1"));
    }

    #[test]
    fn test_missing_json_field_deserializes_empty() {
        let parsed: ArticleInput =
            serde_json::from_str(r#"{"id": "a1", "url": "http://x", "source": "wire"}"#).unwrap();
        assert!(parsed.content.is_empty());
        assert!(parsed.validate().is_err());
    }

    #[test]
    fn test_from_input_defaults() {
        let state = ArticleState::from_input(input());
        assert_eq!(state.article_id(), "a1");
        assert_eq!(state.source(), "wire");
        assert!(state.structure().is_none());
        assert!(state.summary().is_none());
        assert_eq!(state.quality_score(), 0.0);
        assert_eq!(state.retry_count(), 0);
    }

    #[test]
    fn test_content_excerpt_respects_char_boundaries() {
        let state = ArticleState::from_input(ArticleInput::new("a", "héllo wörld", "http://x", "s"));
        assert_eq!(state.content_excerpt(4), "héll");
        assert_eq!(state.content_excerpt(100), "héllo wörld");
    }

    #[test]
    fn test_structure_sections() {
        let structure = ContentStructure {
            entities: vec!["EU".to_string()],
            dates: Vec::new(),
            key_points: vec!["A vote".to_string()],
        };
        assert_eq!(structure.populated_sections(), 2);
        assert!(!structure.is_empty());
        assert!(ContentStructure::default().is_empty());
    }
}
