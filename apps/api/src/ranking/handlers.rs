//! Axum route handlers for the Ranking API.

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::ranking::extract::{extract_text_blocking, ExtractionIssue};
use crate::ranking::models::{RankingReport, RankingRequest, ResumeInput};
use crate::state::AppState;

const JOB_DESCRIPTION_FIELD: &str = "job_description";
const RESUMES_FIELD: &str = "resumes";

#[derive(Debug, Serialize)]
pub struct UploadRankingResponse {
    #[serde(flatten)]
    pub report: RankingReport,
    pub extraction_errors: Vec<ExtractionIssue>,
}

/// POST /api/v1/rankings
///
/// Ranks already-extracted resume texts against a job description.
pub async fn handle_rank(
    State(state): State<AppState>,
    Json(request): Json<RankingRequest>,
) -> Result<Json<RankingReport>, AppError> {
    let report = state.ranker.rank_resumes(&request).await?;
    Ok(Json(report))
}

/// POST /api/v1/rankings/upload
///
/// Multipart form: one `job_description` text field and one or more `resumes`
/// file fields. Files that fail extraction are still ranked (with empty text)
/// and listed under `extraction_errors`.
pub async fn handle_rank_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadRankingResponse>, AppError> {
    let mut job_description: Option<String> = None;
    let mut files: Vec<(String, Bytes)> = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(JOB_DESCRIPTION_FIELD) => {
                job_description = Some(field.text().await.map_err(multipart_error)?);
            }
            Some(RESUMES_FIELD) => {
                let filename = match field.file_name() {
                    Some(name) if !name.trim().is_empty() => name.to_string(),
                    _ => {
                        return Err(AppError::Validation(format!(
                            "'{RESUMES_FIELD}' part {} has no filename",
                            files.len() + 1
                        )))
                    }
                };
                let bytes = field.bytes().await.map_err(multipart_error)?;
                debug!("Received resume upload {filename} ({} bytes)", bytes.len());
                files.push((filename, bytes));
            }
            other => debug!("Ignoring unexpected multipart field {other:?}"),
        }
    }

    let job_description = job_description.ok_or_else(|| {
        AppError::Validation(format!("missing '{JOB_DESCRIPTION_FIELD}' field"))
    })?;
    if files.is_empty() {
        return Err(AppError::Validation(format!(
            "at least one '{RESUMES_FIELD}' file is required"
        )));
    }

    let mut resumes = Vec::with_capacity(files.len());
    let mut extraction_errors = Vec::new();

    for (filename, bytes) in files {
        let text = match extract_text_blocking(filename.clone(), bytes).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Text extraction failed for {filename}: {e}");
                extraction_errors.push(ExtractionIssue {
                    filename: filename.clone(),
                    reason: e.to_string(),
                });
                String::new()
            }
        };
        resumes.push(ResumeInput { filename, text });
    }

    let request = RankingRequest {
        job_description,
        resumes,
    };
    let report = state.ranker.rank_resumes(&request).await?;

    Ok(Json(UploadRankingResponse {
        report,
        extraction_errors,
    }))
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::UnprocessableEntity(e.body_text())
    }
}
