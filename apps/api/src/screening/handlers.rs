//! Axum route handlers for the Screening API.

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AppError;
use crate::screening::email::{generate_batch_emails, generate_email, EmailBatch, EmailDraft};
use crate::screening::ingest::encode_resume_bytes;
use crate::screening::models::{EmailType, JobRequirements, RankedCandidate, ResumeFile};
use crate::screening::pipeline::{PipelineRun, ScreeningInput, Stage};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ScreeningResponse {
    pub results: Vec<RankedCandidate>,
}

#[derive(Debug, Serialize)]
pub struct StageOutputResponse {
    pub stage_index: usize,
    pub stage: Stage,
    pub label: &'static str,
    pub output: Value,
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub cancelled: bool,
}

#[derive(Debug, Deserialize)]
pub struct EmailDraftRequest {
    pub candidate: RankedCandidate,
    pub email_type: EmailType,
    /// Defaults to the parsed job description cached by the current run.
    #[serde(default)]
    pub job_description: Option<JobRequirements>,
}

#[derive(Debug, Deserialize)]
pub struct BatchEmailRequest {
    /// How many of the top-ranked candidates get an invitation.
    #[serde(default = "default_top_x")]
    pub top_x: usize,
    /// Defaults to the ranked results of the current run.
    #[serde(default)]
    pub candidates: Option<Vec<RankedCandidate>>,
    #[serde(default)]
    pub job_description: Option<JobRequirements>,
}

fn default_top_x() -> usize {
    2
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/screenings
///
/// Runs the full pipeline on a JSON body (resumes as base64) and returns the
/// ranked candidates. Poll `/current` meanwhile for progress.
pub async fn handle_screen(
    State(state): State<AppState>,
    Json(input): Json<ScreeningInput>,
) -> Result<Json<ScreeningResponse>, AppError> {
    check_file_limit(input.resume_files.len(), state.config.max_resume_files)?;
    run(&state, input).await
}

/// POST /api/v1/screenings/upload
///
/// Multipart variant: a `job_description` (or `job_url`) text field plus one
/// file part per PDF resume.
pub async fn handle_screen_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ScreeningResponse>, AppError> {
    let mut job_text = String::new();
    let mut job_url = String::new();
    let mut resume_files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if let Some(filename) = field.file_name().map(str::to_string) {
            if !filename.to_ascii_lowercase().ends_with(".pdf") {
                return Err(AppError::Validation(format!(
                    "'{filename}' is not a PDF; only .pdf resumes are accepted"
                )));
            }
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Could not read '{filename}': {e}")))?;
            resume_files.push(ResumeFile {
                filename,
                content: encode_resume_bytes(&bytes),
            });
            check_file_limit(resume_files.len(), state.config.max_resume_files)?;
            continue;
        }

        let target = match name.as_str() {
            "job_description" => &mut job_text,
            "job_url" => &mut job_url,
            _ => continue,
        };
        *target = field
            .text()
            .await
            .map_err(|e| AppError::Validation(format!("Could not read '{name}': {e}")))?;
    }

    // Pasted text wins over a URL when both are sent.
    let job_description = if job_text.trim().is_empty() {
        job_url
    } else {
        job_text
    };

    run(
        &state,
        ScreeningInput {
            job_description,
            resume_files,
        },
    )
    .await
}

/// GET /api/v1/screenings/current
///
/// Progress display: cursor, status, every cached stage output and results.
pub async fn handle_current(State(state): State<AppState>) -> Json<PipelineRun> {
    Json(state.screener.snapshot())
}

/// GET /api/v1/screenings/current/stages/:index
///
/// Raw output of one completed stage of the current run.
pub async fn handle_stage_output(
    State(state): State<AppState>,
    Path(stage_index): Path<usize>,
) -> Result<Json<StageOutputResponse>, AppError> {
    let stage = Stage::from_index(stage_index).ok_or_else(|| {
        AppError::NotFound(format!(
            "Stage index {stage_index} does not exist (valid: 0-{})",
            Stage::ALL.len() - 1
        ))
    })?;

    let output = state.screener.get_output(stage_index).ok_or_else(|| {
        AppError::NotFound(format!(
            "Stage {} ({}) has no output in the current run",
            stage.number(),
            stage.label()
        ))
    })?;

    Ok(Json(StageOutputResponse {
        stage_index,
        stage,
        label: stage.label(),
        output,
    }))
}

/// POST /api/v1/screenings/current/cancel
pub async fn handle_cancel(State(state): State<AppState>) -> Json<CancelResponse> {
    Json(CancelResponse {
        cancelled: state.screener.cancel(),
    })
}

/// POST /api/v1/emails
///
/// Drafts an accept/reject email for one candidate. Always 200 once the
/// request is valid; generation failures come back as a placeholder body.
pub async fn handle_email(
    State(state): State<AppState>,
    Json(request): Json<EmailDraftRequest>,
) -> Result<Json<EmailDraft>, AppError> {
    let job_requirements = resolve_job_requirements(&state, request.job_description)?;

    let draft = generate_email(
        state.screener.backend().as_ref(),
        &request.candidate,
        request.email_type,
        &job_requirements,
    )
    .await;

    Ok(Json(draft))
}

/// POST /api/v1/emails/batch
///
/// Invitations for the top `top_x` ranked candidates, rejections for the rest.
/// Per-candidate failures come back as placeholder bodies.
pub async fn handle_batch_email(
    State(state): State<AppState>,
    Json(request): Json<BatchEmailRequest>,
) -> Result<Json<EmailBatch>, AppError> {
    let candidates = request
        .candidates
        .unwrap_or_else(|| state.screener.ranked_results());
    if candidates.is_empty() {
        return Err(AppError::Validation(
            "No ranked candidates available; run a screening first".to_string(),
        ));
    }
    let job_requirements = resolve_job_requirements(&state, request.job_description)?;

    let batch = generate_batch_emails(
        state.screener.backend().as_ref(),
        &candidates,
        request.top_x,
        &job_requirements,
    )
    .await;

    Ok(Json(batch))
}

fn resolve_job_requirements(
    state: &AppState,
    explicit: Option<JobRequirements>,
) -> Result<JobRequirements, AppError> {
    explicit
        .or_else(|| state.screener.job_requirements())
        .ok_or_else(|| {
            AppError::Validation(
                "No parsed job description available; run a screening first".to_string(),
            )
        })
}

async fn run(state: &AppState, input: ScreeningInput) -> Result<Json<ScreeningResponse>, AppError> {
    let results = state.screener.run_pipeline(input).await?;
    Ok(Json(ScreeningResponse { results }))
}

fn check_file_limit(count: usize, max: usize) -> Result<(), AppError> {
    if count > max {
        return Err(AppError::Validation(format!(
            "At most {max} resume files can be screened at once (got {count})"
        )));
    }
    Ok(())
}
