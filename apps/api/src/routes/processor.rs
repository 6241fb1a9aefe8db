//! Processor endpoints — the screening capability itself, one POST per operation.
//!
//! Served from whatever backend this instance runs, so another instance
//! configured with `SCREENING_BACKEND=remote` can delegate here.

use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;

use crate::errors::AppError;
use crate::screening::backend::remote::{
    EMAIL_PATH, INGEST_PATH, PARSE_JOB_PATH, PARSE_RESUMES_PATH, RANK_PATH, SCORE_PATH,
};
use crate::screening::backend::ScreeningBackend;
use crate::screening::models::{
    CandidateScore, EmailRequest, EmailResponse, IngestRequest, IngestionResult, JobRequirements,
    ParseResumesRequest, ParsedResumes, RankCandidatesRequest, RankedCandidate,
    ScoreCandidatesRequest,
};

type Backend = Arc<dyn ScreeningBackend>;

#[derive(Debug, Deserialize)]
pub struct ParseJobRequest {
    #[serde(default)]
    pub job_description: String,
}

pub fn processor_router(backend: Backend) -> Router {
    Router::new()
        .route(INGEST_PATH, post(ingest_inputs))
        .route(PARSE_JOB_PATH, post(parse_job_description))
        .route(PARSE_RESUMES_PATH, post(parse_resumes))
        .route(SCORE_PATH, post(score_candidates))
        .route(RANK_PATH, post(rank_candidates))
        .route(EMAIL_PATH, post(generate_email_templates))
        .with_state(backend)
}

async fn ingest_inputs(
    State(backend): State<Backend>,
    Json(request): Json<IngestRequest>,
) -> Result<Json<IngestionResult>, AppError> {
    if request.job_description.text.trim().is_empty() {
        return Err(AppError::Validation(
            "job_description.text cannot be empty".to_string(),
        ));
    }
    Ok(Json(backend.ingest(&request).await?))
}

async fn parse_job_description(
    State(backend): State<Backend>,
    Json(request): Json<ParseJobRequest>,
) -> Result<Json<JobRequirements>, AppError> {
    if request.job_description.trim().is_empty() {
        return Err(AppError::Validation(
            "No job description text provided".to_string(),
        ));
    }
    Ok(Json(
        backend.parse_job_description(&request.job_description).await?,
    ))
}

async fn parse_resumes(
    State(backend): State<Backend>,
    Json(request): Json<ParseResumesRequest>,
) -> Result<Json<ParsedResumes>, AppError> {
    Ok(Json(backend.parse_resumes(&request.resume_files).await?))
}

async fn score_candidates(
    State(backend): State<Backend>,
    Json(request): Json<ScoreCandidatesRequest>,
) -> Result<Json<Vec<CandidateScore>>, AppError> {
    Ok(Json(
        backend
            .score_candidates(&request.parsed_requirements, &request.parsed_resumes)
            .await?,
    ))
}

async fn rank_candidates(
    State(backend): State<Backend>,
    Json(request): Json<RankCandidatesRequest>,
) -> Result<Json<Vec<RankedCandidate>>, AppError> {
    Ok(Json(backend.rank_candidates(&request.candidate_scores).await?))
}

/// Unlike the operator-facing email endpoint, failures here are real errors:
/// the calling screener turns them into a placeholder body.
async fn generate_email_templates(
    State(backend): State<Backend>,
    Json(request): Json<EmailRequest>,
) -> Result<Json<EmailResponse>, AppError> {
    Ok(Json(backend.generate_email(&request).await?))
}
