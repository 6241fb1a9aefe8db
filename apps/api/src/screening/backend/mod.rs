//! Screening capability — pluggable, trait-based backend behind the pipeline.
//!
//! One operation per pipeline stage plus email generation. The orchestrator
//! only sequences calls; how each call is fulfilled is the backend's concern.
//!
//! `AppState` holds an `Arc<dyn ScreeningBackend>`, picked at startup via
//! `SCREENING_BACKEND`.

use async_trait::async_trait;

use crate::errors::BackendError;
use crate::screening::models::{
    CandidateScore, EmailRequest, EmailResponse, IngestRequest, IngestedResume, IngestionResult,
    JobRequirements, ParsedResumes, RankedCandidate,
};

pub mod llm;
pub mod mock;
pub mod remote;

pub use llm::LlmBackend;
pub use mock::MockBackend;
pub use remote::RemoteBackend;

/// The screening capability. Implement this to swap backends without
/// touching the orchestrator, handlers, or email task.
///
/// Contract for the batch operations: a failure scoped to one resume or one
/// candidate is folded into the returned batch (an `error` entry or a
/// zero-scored entry) and output order follows input order. `Err` is reserved
/// for failures of the call itself.
#[async_trait]
pub trait ScreeningBackend: Send + Sync {
    async fn ingest(&self, request: &IngestRequest) -> Result<IngestionResult, BackendError>;

    async fn parse_job_description(
        &self,
        job_description: &str,
    ) -> Result<JobRequirements, BackendError>;

    async fn parse_resumes(
        &self,
        resumes: &[IngestedResume],
    ) -> Result<ParsedResumes, BackendError>;

    async fn score_candidates(
        &self,
        requirements: &JobRequirements,
        resumes: &ParsedResumes,
    ) -> Result<Vec<CandidateScore>, BackendError>;

    async fn rank_candidates(
        &self,
        scores: &[CandidateScore],
    ) -> Result<Vec<RankedCandidate>, BackendError>;

    async fn generate_email(&self, request: &EmailRequest) -> Result<EmailResponse, BackendError>;

    /// Short name for logs and the health endpoint.
    fn name(&self) -> &'static str;
}
