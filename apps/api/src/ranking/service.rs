//! Ranking Service: scores a batch of resumes against one job description.
//!
//! Flow: validate → fan out one provider call per resume (bounded, timed) →
//!       normalize → stable sort → assign ranks.
//!
//! Per-resume provider failures are captured in that resume's result and never
//! abort the batch. Failed resumes are retained, ranked after every scored one.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::ranking::models::{RankedResult, RankingReport, RankingRequest, RawScore, ScoreStatus};
use crate::ranking::normalize::{normalize, MatchTier, SimilarityScale};
use crate::similarity::{ProviderError, SimilarityProvider};

/// Stateless between requests; one instance is shared by all handlers.
pub struct RankingService {
    provider: Arc<dyn SimilarityProvider>,
    max_concurrency: usize,
    call_timeout: Duration,
}

impl RankingService {
    pub fn new(
        provider: Arc<dyn SimilarityProvider>,
        max_concurrency: usize,
        call_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            max_concurrency: max_concurrency.max(1),
            call_timeout,
        }
    }

    pub fn scale(&self) -> SimilarityScale {
        self.provider.scale()
    }

    /// Ranks every resume in `request` by similarity to its job description.
    ///
    /// Fails only on request-level validation, before any provider call.
    /// Dropping the returned future aborts all still-pending provider calls.
    pub async fn rank_resumes(&self, request: &RankingRequest) -> Result<RankingReport, AppError> {
        request.validate()?;

        let request_id = Uuid::new_v4();
        info!(
            %request_id,
            resumes = request.resumes.len(),
            provider = self.provider.name(),
            "Ranking batch started"
        );

        let raw_scores = self.collect_raw_scores(request).await;
        let results = rank_raw_scores(raw_scores, self.provider.scale());

        let failed = results
            .iter()
            .filter(|r| r.status == ScoreStatus::Failed)
            .count();
        let scored = results.len() - failed;

        info!(%request_id, scored, failed, "Ranking batch finished");

        Ok(RankingReport {
            request_id,
            ranked_at: Utc::now(),
            provider: self.provider.name().to_string(),
            scale: self.provider.scale(),
            scored,
            failed,
            results,
        })
    }

    /// Issues one provider call per resume and returns raw scores in input order.
    async fn collect_raw_scores(&self, request: &RankingRequest) -> Vec<RawScore> {
        let job_description: Arc<str> = Arc::from(request.job_description.as_str());
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks = JoinSet::new();

        for (index, resume) in request.resumes.iter().enumerate() {
            let provider = Arc::clone(&self.provider);
            let semaphore = Arc::clone(&semaphore);
            let job_description = Arc::clone(&job_description);
            let text = resume.text.clone();
            let call_timeout = self.call_timeout;

            tasks.spawn(async move {
                // The semaphore is never closed, so acquisition cannot fail.
                let _permit = semaphore.acquire_owned().await;
                let outcome =
                    match tokio::time::timeout(call_timeout, provider.score(&job_description, &text))
                        .await
                    {
                        Ok(outcome) => outcome,
                        Err(_) => Err(ProviderError::Timeout(call_timeout)),
                    };
                (index, outcome)
            });
        }

        let mut slots: Vec<Option<Result<f64, ProviderError>>> =
            request.resumes.iter().map(|_| None).collect();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => slots[index] = Some(outcome),
                // The slot stays empty and is reported as failed below.
                Err(e) => warn!("Scoring task did not complete: {e}"),
            }
        }

        request
            .resumes
            .iter()
            .zip(slots)
            .map(|(resume, slot)| {
                let outcome = slot.unwrap_or_else(|| {
                    Err(ProviderError::Aborted(
                        "task panicked or was cancelled".to_string(),
                    ))
                });
                match &outcome {
                    Ok(similarity) => debug!("Scored {}: similarity={similarity}", resume.filename),
                    Err(e) => warn!("Failed to score {}: {e}", resume.filename),
                }
                RawScore {
                    filename: resume.filename.clone(),
                    outcome,
                }
            })
            .collect()
    }
}

/// Normalizes raw scores and orders them.
///
/// Scored results come first, by percentage descending; equal percentages keep
/// input order. Failed results follow in input order. Ranks run 1..=N.
pub fn rank_raw_scores(raw_scores: Vec<RawScore>, scale: SimilarityScale) -> Vec<RankedResult> {
    let mut results: Vec<RankedResult> = raw_scores
        .into_iter()
        .map(|raw| {
            let outcome = raw.outcome.and_then(|similarity| {
                if similarity.is_finite() {
                    Ok(similarity)
                } else {
                    Err(ProviderError::NonFinite(similarity))
                }
            });
            match outcome {
                Ok(similarity) => {
                    let percentage = normalize(similarity, scale);
                    RankedResult {
                        rank: 0,
                        filename: raw.filename,
                        percentage: Some(percentage),
                        status: ScoreStatus::Scored,
                        tier: Some(MatchTier::from_percentage(percentage)),
                        similarity: Some(similarity),
                        error: None,
                    }
                }
                Err(e) => RankedResult {
                    rank: 0,
                    filename: raw.filename,
                    percentage: None,
                    status: ScoreStatus::Failed,
                    tier: None,
                    similarity: None,
                    error: Some(e.to_string()),
                },
            }
        })
        .collect();

    // `None < Some(_)`, so descending puts failed entries last. `sort_by` is stable.
    results.sort_by(|a, b| b.percentage.cmp(&a.percentage));

    for (position, result) in results.iter_mut().enumerate() {
        result.rank = position + 1;
    }

    results
}
