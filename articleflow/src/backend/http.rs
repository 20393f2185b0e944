//! HTTP adapter for a remote analysis service.
//!
//! Each analysing stage maps to one JSON endpoint under the configured base
//! URL: `structure`, `summary`, `classification`, `sentiment`, `quality`.

use super::{
    AnalysisBackend, ClassificationRequest, QualityRequest, SentimentRequest, StructureRequest,
    SummaryRequest,
};
use crate::core::{ContentStructure, Sentiment};
use crate::errors::{BackendError, ConfigError};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const MAX_ERROR_BODY_CHARS: usize = 512;

/// Configuration for [`HttpAnalysisBackend`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpBackendConfig {
    /// Base URL of the analysis service.
    pub base_url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: f64,
    /// Optional bearer token.
    #[serde(default)]
    pub api_key: Option<String>,
    /// User agent string.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout() -> f64 {
    30.0
}

fn default_user_agent() -> String {
    "articleflow/0.1".to_string()
}

impl HttpBackendConfig {
    /// Creates a configuration for the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_seconds: default_timeout(),
            api_key: None,
            user_agent: default_user_agent(),
        }
    }

    /// Sets the timeout.
    #[must_use]
    pub fn with_timeout(mut self, seconds: f64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Sets the bearer token.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Gets timeout as Duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_seconds)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::invalid_value("base_url", "must not be empty"));
        }
        if !self.timeout_seconds.is_finite() || self.timeout_seconds <= 0.0 {
            return Err(ConfigError::invalid_value(
                "timeout_seconds",
                format!("must be positive, got {}", self.timeout_seconds),
            ));
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct SummaryEnvelope {
    summary: String,
}

#[derive(Deserialize)]
struct ClassificationEnvelope {
    topics: Vec<String>,
}

#[derive(Deserialize)]
struct QualityEnvelope {
    score: f64,
}

/// Analysis backend that calls a JSON-over-HTTP service.
#[derive(Clone)]
pub struct HttpAnalysisBackend {
    client: reqwest::Client,
    config: HttpBackendConfig,
}

impl std::fmt::Debug for HttpAnalysisBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpAnalysisBackend")
            .field("base_url", &self.config.base_url)
            .field("timeout_seconds", &self.config.timeout_seconds)
            .field("has_api_key", &self.config.api_key.is_some())
            .finish()
    }
}

impl HttpAnalysisBackend {
    /// Creates a backend from a validated configuration.
    pub fn new(config: HttpBackendConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ConfigError::invalid_value("http_client", e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Returns the full URL of an endpoint.
    #[must_use]
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), endpoint)
    }

    fn map_error(&self, error: &reqwest::Error) -> BackendError {
        if error.is_timeout() {
            BackendError::Timeout {
                after_ms: u64::try_from(self.config.timeout().as_millis()).unwrap_or(u64::MAX),
            }
        } else if error.is_connect() {
            BackendError::unavailable(error.to_string())
        } else if error.is_decode() {
            BackendError::decode(error.to_string())
        } else {
            BackendError::transport(error.to_string())
        }
    }

    async fn post<Req, Resp>(&self, endpoint: &str, request: &Req) -> Result<Resp, BackendError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let url = self.endpoint_url(endpoint);
        debug!(url = %url, "Calling analysis backend");

        let mut builder = self.client.post(&url).json(request);
        if let Some(ref key) = self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| self.map_error(&e))?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        response
            .json::<Resp>()
            .await
            .map_err(|e| BackendError::decode(e.to_string()))
    }
}

#[async_trait]
impl AnalysisBackend for HttpAnalysisBackend {
    async fn analyze_structure(
        &self,
        request: &StructureRequest,
    ) -> Result<ContentStructure, BackendError> {
        self.post("structure", request).await
    }

    async fn summarize(&self, request: &SummaryRequest) -> Result<String, BackendError> {
        let envelope: SummaryEnvelope = self.post("summary", request).await?;
        Ok(envelope.summary)
    }

    async fn classify(&self, request: &ClassificationRequest) -> Result<Vec<String>, BackendError> {
        let envelope: ClassificationEnvelope = self.post("classification", request).await?;
        Ok(envelope.topics)
    }

    async fn analyze_sentiment(
        &self,
        request: &SentimentRequest,
    ) -> Result<Sentiment, BackendError> {
        self.post("sentiment", request).await
    }

    async fn score_quality(&self, request: &QualityRequest) -> Result<f64, BackendError> {
        let envelope: QualityEnvelope = self.post("quality", request).await?;
        Ok(envelope.score)
    }
}
