//! HTTP backend: delegates every operation to a processor service.
//!
//! The service exposes one POST endpoint per operation (see
//! `routes::processor`), so a screener instance can point at another one.

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use tracing::debug;

use crate::errors::BackendError;
use crate::screening::backend::ScreeningBackend;
use crate::screening::models::{
    CandidateScore, EmailRequest, EmailResponse, IngestRequest, IngestedResume, IngestionResult,
    JobRequirements, ParsedResumes, RankCandidatesRequest, RankedCandidate,
    ScoreCandidatesRequest,
};

pub const INGEST_PATH: &str = "/ingest_inputs";
pub const PARSE_JOB_PATH: &str = "/parse_job_description";
pub const PARSE_RESUMES_PATH: &str = "/parse_resumes";
pub const SCORE_PATH: &str = "/score_candidates";
pub const RANK_PATH: &str = "/rank_candidates";
pub const EMAIL_PATH: &str = "/generate_email_templates";

/// Longest slice of an error body echoed back in error messages.
const MAX_ERROR_BODY: usize = 512;

#[derive(Clone)]
pub struct RemoteBackend {
    http: Client,
    base_url: String,
}

impl RemoteBackend {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, BackendError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {url}");

        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| BackendError::Transport(format!("POST {path}: {e}")))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| BackendError::Transport(format!("POST {path}: {e}")))?;

        if !status.is_success() {
            let body = String::from_utf8_lossy(&bytes);
            let body: String = body.chars().take(MAX_ERROR_BODY).collect();
            return Err(BackendError::Transport(format!(
                "POST {path} returned status {}: {body}",
                status.as_u16()
            )));
        }

        serde_json::from_slice(&bytes)
            .map_err(|e| BackendError::MalformedResponse(format!("POST {path}: {e}")))
    }
}

#[async_trait]
impl ScreeningBackend for RemoteBackend {
    async fn ingest(&self, request: &IngestRequest) -> Result<IngestionResult, BackendError> {
        self.post(INGEST_PATH, request).await
    }

    async fn parse_job_description(
        &self,
        job_description: &str,
    ) -> Result<JobRequirements, BackendError> {
        self.post(PARSE_JOB_PATH, &json!({ "job_description": job_description }))
            .await
    }

    async fn parse_resumes(
        &self,
        resumes: &[IngestedResume],
    ) -> Result<ParsedResumes, BackendError> {
        self.post(PARSE_RESUMES_PATH, &json!({ "resume_files": resumes }))
            .await
    }

    async fn score_candidates(
        &self,
        requirements: &JobRequirements,
        resumes: &ParsedResumes,
    ) -> Result<Vec<CandidateScore>, BackendError> {
        let request = ScoreCandidatesRequest {
            parsed_requirements: requirements.clone(),
            parsed_resumes: resumes.clone(),
        };
        self.post(SCORE_PATH, &request).await
    }

    async fn rank_candidates(
        &self,
        scores: &[CandidateScore],
    ) -> Result<Vec<RankedCandidate>, BackendError> {
        let request = RankCandidatesRequest {
            candidate_scores: scores.to_vec(),
        };
        self.post(RANK_PATH, &request).await
    }

    async fn generate_email(&self, request: &EmailRequest) -> Result<EmailResponse, BackendError> {
        self.post(EMAIL_PATH, request).await
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::Value;

    use super::*;
    use crate::routes::processor::processor_router;
    use crate::screening::backend::MockBackend;
    use crate::screening::models::{JobDescriptionInput, ResumeFile};

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn backend(base: String) -> RemoteBackend {
        RemoteBackend::new(Client::new(), base)
    }

    #[tokio::test]
    async fn test_round_trip_through_processor_routes() {
        let base = serve(processor_router(Arc::new(MockBackend::new(0)))).await;
        let remote = backend(base);

        let ingestion = remote
            .ingest(&IngestRequest {
                job_description: JobDescriptionInput {
                    text: "Backend engineer, Go".to_string(),
                },
                resume_files: vec![ResumeFile {
                    filename: "alice.pdf".to_string(),
                    content: "QWxpY2U=".to_string(),
                }],
            })
            .await
            .unwrap();
        assert_eq!(ingestion.resumes.len(), 1);

        let requirements = remote
            .parse_job_description(&ingestion.job_description)
            .await
            .unwrap();
        let parsed = remote.parse_resumes(&ingestion.resumes).await.unwrap();
        let scores = remote
            .score_candidates(&requirements, &parsed)
            .await
            .unwrap();
        let ranked = remote.rank_candidates(&scores).await.unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].name(), "alice");
    }

    #[tokio::test]
    async fn test_non_success_status_is_transport_error() {
        let app = Router::new().route(
            PARSE_JOB_PATH,
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "model unavailable") }),
        );
        let remote = backend(serve(app).await);

        let err = remote.parse_job_description("anything").await.unwrap_err();
        match err {
            BackendError::Transport(message) => {
                assert!(message.contains("500"));
                assert!(message.contains("model unavailable"));
            }
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unexpected_shape_is_malformed_response() {
        let app = Router::new().route(
            RANK_PATH,
            post(|| async { Json(serde_json::json!({"unexpected": true})) }),
        );
        let remote = backend(serve(app).await);

        let err = remote.rank_candidates(&[]).await.unwrap_err();
        assert!(matches!(err, BackendError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_transport_error() {
        // Bind then drop to get a port nobody listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let remote = backend(format!("http://{addr}/"));
        let err = remote
            .generate_email(&EmailRequest {
                candidate: RankedCandidate {
                    score: CandidateScore::failed(Some("Bob"), "n/a"),
                    avg_score: 0.0,
                },
                email_type: crate::screening::models::EmailType::Reject,
                job_description: JobRequirements::default(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Transport(_)));
    }

    #[tokio::test]
    async fn test_request_bodies_use_processor_field_names() {
        let app = Router::new().route(
            PARSE_RESUMES_PATH,
            post(|Json(body): Json<Value>| async move {
                let count = body["resume_files"].as_array().map(Vec::len).unwrap_or(0);
                Json(serde_json::json!({
                    "parsed_resumes": vec![serde_json::json!({"error": "stub"}); count]
                }))
            }),
        );
        let remote = backend(serve(app).await);

        let parsed = remote
            .parse_resumes(&[
                IngestedResume::text("a.pdf", "a"),
                IngestedResume::text("b.pdf", "b"),
            ])
            .await
            .unwrap();
        assert_eq!(parsed.parsed_resumes.len(), 2);
        assert!(parsed.parsed_resumes.iter().all(|e| e.is_error()));
    }
}
