/// Similarity client: the single point of entry for the external scoring model.
///
/// ARCHITECTURAL RULE: No other module may call the similarity endpoint directly.
/// The ranking service only sees `Arc<dyn SimilarityProvider>`.
///
/// Wire contract (Hugging Face sentence-similarity pipeline):
///   request  `{"inputs": {"source_sentence": <jd>, "sentences": [<resume>]}}`
///   response `[<similarity>]`
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;
use crate::ranking::normalize::SimilarityScale;

#[cfg(test)]
pub mod stub;

/// First retry waits this long; each further retry doubles it.
const BASE_BACKOFF: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider timed out after {0:?}")]
    Timeout(Duration),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("provider returned a non-finite similarity ({0})")]
    NonFinite(f64),

    #[error("resume text is empty")]
    EmptyInput,

    #[error("scoring task aborted: {0}")]
    Aborted(String),
}

/// A black-box scorer for one (job description, resume) pair.
///
/// Implementations declare the numeric contract of the value they return via
/// `scale()`; the ranking service normalizes with it and never guesses.
#[async_trait]
pub trait SimilarityProvider: Send + Sync {
    async fn score(&self, job_description: &str, resume_text: &str) -> Result<f64, ProviderError>;

    fn scale(&self) -> SimilarityScale;

    /// Label reported alongside results, for transparency.
    fn name(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct SimilarityRequest<'a> {
    inputs: SimilarityInputs<'a>,
}

#[derive(Debug, Serialize)]
struct SimilarityInputs<'a> {
    source_sentence: &'a str,
    sentences: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: String,
}

/// HTTP adapter for a hosted similarity model.
/// Retries on connection errors, 429 and 5xx with exponential backoff.
#[derive(Clone)]
pub struct HttpSimilarityClient {
    client: Client,
    api_url: String,
    api_key: String,
    scale: SimilarityScale,
    max_attempts: u32,
    base_backoff: Duration,
    timeout: Duration,
}

impl HttpSimilarityClient {
    pub fn new(config: &Config) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(config.provider_timeout).build()?;

        Ok(Self {
            client,
            api_url: config.similarity_api_url.clone(),
            api_key: config.similarity_api_key.clone(),
            scale: config.similarity_scale,
            max_attempts: config.provider_max_attempts.max(1),
            base_backoff: BASE_BACKOFF,
            timeout: config.provider_timeout,
        })
    }

    #[cfg(test)]
    fn with_backoff(mut self, base_backoff: Duration) -> Self {
        self.base_backoff = base_backoff;
        self
    }

    /// Worst-case wall time of one `score` call: every attempt runs to its
    /// timeout and every backoff sleep is taken. Callers that bound the whole
    /// call must allow at least this much or retries after a timeout never run.
    pub fn call_budget(&self) -> Duration {
        let retries = self.max_attempts.saturating_sub(1);
        // Backoffs double from `base_backoff`: b + 2b + ... = b * (2^retries - 1).
        let total_backoff = self
            .base_backoff
            .saturating_mul(2u32.saturating_pow(retries) - 1);
        self.timeout
            .saturating_mul(self.max_attempts)
            .saturating_add(total_backoff)
    }

    fn map_send_error(&self, e: reqwest::Error) -> ProviderError {
        if e.is_timeout() {
            ProviderError::Timeout(self.timeout)
        } else {
            ProviderError::Http(e)
        }
    }
}

#[async_trait]
impl SimilarityProvider for HttpSimilarityClient {
    async fn score(&self, job_description: &str, resume_text: &str) -> Result<f64, ProviderError> {
        // The hosted pipeline rejects empty sentences with a 400; skip the round trip.
        if resume_text.trim().is_empty() {
            return Err(ProviderError::EmptyInput);
        }

        let request_body = SimilarityRequest {
            inputs: SimilarityInputs {
                source_sentence: job_description,
                sentences: [resume_text],
            },
        };

        let mut last_error: Option<ProviderError> = None;

        for attempt in 0..self.max_attempts {
            if attempt > 0 {
                let delay = self.base_backoff.saturating_mul(2u32.saturating_pow(attempt - 1));
                warn!(
                    "Similarity call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&self.api_url)
                .bearer_auth(&self.api_key)
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(self.map_send_error(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("Similarity API returned {}: {}", status, body);
                last_error = Some(ProviderError::Api {
                    status: status.as_u16(),
                    message: api_error_message(body),
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(ProviderError::Api {
                    status: status.as_u16(),
                    message: api_error_message(body),
                });
            }

            let body = response.text().await.map_err(|e| self.map_send_error(e))?;
            let similarity = parse_similarity(&body)?;

            debug!("Similarity call succeeded: similarity={similarity}");

            return Ok(similarity);
        }

        Err(last_error.unwrap_or(ProviderError::MalformedResponse(
            "no attempt was made".to_string(),
        )))
    }

    fn scale(&self) -> SimilarityScale {
        self.scale
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// Extracts the first similarity from a `[f64, ...]` response body.
fn parse_similarity(body: &str) -> Result<f64, ProviderError> {
    let values: Vec<f64> = serde_json::from_str(body.trim()).map_err(|e| {
        ProviderError::MalformedResponse(format!("expected a JSON array of numbers: {e}"))
    })?;

    let similarity = values
        .first()
        .copied()
        .ok_or_else(|| ProviderError::MalformedResponse("empty similarity array".to_string()))?;

    if !similarity.is_finite() {
        return Err(ProviderError::NonFinite(similarity));
    }

    Ok(similarity)
}

/// Pulls `error` out of `{"error": "..."}` bodies, falling back to the raw text.
fn api_error_message(body: String) -> String {
    serde_json::from_str::<ApiErrorBody>(&body)
        .map(|e| e.error)
        .unwrap_or(body)
}
