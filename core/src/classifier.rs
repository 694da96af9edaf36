//! Client for the external intelligence service.
//!
//! The service suggests a category, a priority and a sentiment label for a
//! title/description pair. It is advisory: every failure mode collapses into
//! [`Classification::Unavailable`] and the caller falls back to defaults.

use std::str::FromStr;
use std::time::Duration;
use std::time::Instant;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;

use crate::model::Category;
use crate::model::Priority;

/// Default upper bound for a single classify call.
pub const DEFAULT_CLASSIFIER_TIMEOUT: Duration = Duration::from_secs(5);

/// Signals returned by a successful classify call.
///
/// A missing or unrecognised category or priority is `None` without
/// affecting the other signals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifierSuggestion {
    #[serde(default, deserialize_with = "lenient_variant")]
    pub suggested_category: Option<Category>,
    #[serde(default, deserialize_with = "lenient_variant")]
    pub suggested_priority: Option<Priority>,
    pub sentiment: String,
}

/// Accept any JSON value; only a known variant name yields `Some`.
fn lenient_variant<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .and_then(|name| T::from_str(name).ok()))
}

/// Outcome of a classify call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Available(ClassifierSuggestion),
    /// The service could not be used; no detail is carried.
    Unavailable,
}

/// Source of category/priority/sentiment suggestions.
///
/// Implementations make a single attempt per call and never fail: problems
/// are reported as [`Classification::Unavailable`].
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, title: &str, description: &str) -> Classification;
}

/// Connection settings for [`HttpClassifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierConfig {
    /// Base URL; `/analyze` is appended.
    pub endpoint: String,
    pub timeout: Duration,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:3003".to_string(),
            timeout: DEFAULT_CLASSIFIER_TIMEOUT,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server error: HTTP {status} - {body}")]
    ServerError { status: u16, body: String },

    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    title: &'a str,
    description: &'a str,
}

/// [`Classifier`] backed by `POST {endpoint}/analyze`.
pub struct HttpClassifier {
    client: reqwest::Client,
    url: String,
}

impl HttpClassifier {
    pub fn new(config: &ClassifierConfig) -> Result<Self, ClassifierError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self::with_client(client, &config.endpoint))
    }

    /// Use a preconfigured HTTP client (tests, custom TLS).
    pub fn with_client(client: reqwest::Client, endpoint: &str) -> Self {
        Self {
            client,
            url: format!("{}/analyze", endpoint.trim_end_matches('/')),
        }
    }

    async fn analyze(
        &self,
        title: &str,
        description: &str,
    ) -> Result<ClassifierSuggestion, ClassifierError> {
        let response = self
            .client
            .post(&self.url)
            .json(&AnalyzeRequest { title, description })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifierError::ServerError {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let suggestion: ClassifierSuggestion = serde_json::from_str(&body)
            .map_err(|e| ClassifierError::MalformedPayload(e.to_string()))?;
        if suggestion.sentiment.trim().is_empty() {
            return Err(ClassifierError::MalformedPayload(
                "empty sentiment".to_string(),
            ));
        }
        Ok(suggestion)
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn classify(&self, title: &str, description: &str) -> Classification {
        let start = Instant::now();
        match self.analyze(title, description).await {
            Ok(suggestion) => {
                tracing::debug!(
                    latency_ms = start.elapsed().as_millis() as u64,
                    category = ?suggestion.suggested_category,
                    priority = ?suggestion.suggested_priority,
                    "classifier responded"
                );
                Classification::Available(suggestion)
            }
            Err(e) => {
                tracing::warn!(
                    latency_ms = start.elapsed().as_millis() as u64,
                    "classifier unavailable: {e}"
                );
                Classification::Unavailable
            }
        }
    }
}
