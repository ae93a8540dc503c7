//! Deterministic in-memory provider for tests. Outcomes are keyed by resume text.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::{ProviderError, SimilarityProvider};
use crate::ranking::normalize::SimilarityScale;

#[derive(Debug, Clone, Copy)]
pub enum StubOutcome {
    Score(f64),
    /// Fails with an `Api` error carrying this status.
    Fail(u16),
    /// Never resolves; only a timeout or cancellation ends the call.
    Hang,
}

pub struct StubProvider {
    outcomes: HashMap<String, StubOutcome>,
    scale: SimilarityScale,
    latency: Option<Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl StubProvider {
    pub fn new(scale: SimilarityScale) -> Self {
        Self {
            outcomes: HashMap::new(),
            scale,
            latency: None,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with(mut self, resume_text: &str, outcome: StubOutcome) -> Self {
        self.outcomes.insert(resume_text.to_string(), outcome);
        self
    }

    /// Every call sleeps this long before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SimilarityProvider for StubProvider {
    async fn score(&self, _job_description: &str, resume_text: &str) -> Result<f64, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let outcome = self
            .outcomes
            .get(resume_text)
            .copied()
            .unwrap_or(StubOutcome::Fail(404));

        let result = match outcome {
            StubOutcome::Score(similarity) => Ok(similarity),
            StubOutcome::Fail(status) => Err(ProviderError::Api {
                status,
                message: format!("stub failure for '{resume_text}'"),
            }),
            StubOutcome::Hang => std::future::pending().await,
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn scale(&self) -> SimilarityScale {
        self.scale
    }

    fn name(&self) -> &str {
        "stub"
    }
}
