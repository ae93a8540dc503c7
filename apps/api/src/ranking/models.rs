use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::ranking::normalize::{MatchTier, SimilarityScale};
use crate::similarity::ProviderError;

/// One resume in a ranking batch. `filename` is a display key, not a unique id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeInput {
    pub filename: String,
    /// Extracted plain text. Empty when extraction failed upstream.
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingRequest {
    pub job_description: String,
    pub resumes: Vec<ResumeInput>,
}

impl RankingRequest {
    /// Request-level checks. Runs before any provider call.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.job_description.trim().is_empty() {
            return Err(AppError::Validation(
                "job_description cannot be empty".to_string(),
            ));
        }
        if self.resumes.is_empty() {
            return Err(AppError::Validation(
                "at least one resume is required".to_string(),
            ));
        }
        if let Some(position) = self
            .resumes
            .iter()
            .position(|r| r.filename.trim().is_empty())
        {
            return Err(AppError::Validation(format!(
                "resume at position {} has an empty filename",
                position + 1
            )));
        }
        Ok(())
    }
}

/// Outcome of the single provider call made for one resume.
#[derive(Debug)]
pub struct RawScore {
    pub filename: String,
    pub outcome: Result<f64, ProviderError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreStatus {
    Scored,
    Failed,
}

/// A resume's place in the ranked output.
///
/// `percentage`, `similarity` and `tier` are present only when `status` is
/// `scored`; `error` only when it is `failed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedResult {
    pub rank: usize,
    pub filename: String,
    pub percentage: Option<u8>,
    pub status: ScoreStatus,
    pub tier: Option<MatchTier>,
    pub similarity: Option<f64>,
    pub error: Option<String>,
}

/// Full ranking report returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingReport {
    pub request_id: Uuid,
    pub ranked_at: DateTime<Utc>,
    pub provider: String, // provider label, for transparency
    pub scale: SimilarityScale,
    pub scored: usize,
    pub failed: usize,
    pub results: Vec<RankedResult>,
}
