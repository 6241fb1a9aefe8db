//! In-process backend: Claude for parsing, scoring and email; pdf-extract for ingest.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use tracing::{info, warn};

use crate::errors::BackendError;
use crate::llm_client::prompts::{FAIRNESS_INSTRUCTION, JSON_ONLY_SYSTEM};
use crate::llm_client::{LlmClient, LlmError};
use crate::screening::backend::ScreeningBackend;
use crate::screening::ingest::{normalize_job_description, package_resume};
use crate::screening::models::{
    CandidateScore, EmailRequest, EmailResponse, EmailType, IngestRequest, IngestedResume,
    IngestionResult, JobRequirements, ParsedResume, ParsedResumeEntry, ParsedResumes,
    RankedCandidate,
};
use crate::screening::prompts::{
    fill_template, ACCEPT_INSTRUCTION, EMAIL_PROMPT_TEMPLATE, EMAIL_SYSTEM,
    JD_PARSE_PROMPT_TEMPLATE, JD_PARSE_SYSTEM, REJECT_INSTRUCTION, RESUME_PARSE_PROMPT_TEMPLATE,
    RESUME_PARSE_SYSTEM, SCORE_PROMPT_TEMPLATE, SCORE_SYSTEM,
};
use crate::screening::ranking::rank_candidates;

pub struct LlmBackend {
    llm: LlmClient,
    http: Client,
    /// Max in-flight LLM calls within one batch stage.
    item_concurrency: usize,
}

impl LlmBackend {
    pub fn new(llm: LlmClient, http: Client, item_concurrency: usize) -> Self {
        Self {
            llm,
            http,
            item_concurrency: item_concurrency.max(1),
        }
    }

    async fn parse_one(&self, resume: &IngestedResume) -> ParsedResumeEntry {
        if let Some(error) = &resume.error {
            return ParsedResumeEntry::Failed {
                error: format!("Resume '{}' was not ingested: {error}", resume.filename),
            };
        }

        let prompt = resume_parse_prompt(resume.text.as_deref().unwrap_or_default());
        let system = format!("{RESUME_PARSE_SYSTEM} {JSON_ONLY_SYSTEM}");
        let result = self.llm.call_json::<ParsedResume>(&prompt, &system).await;
        parsed_entry(&resume.filename, result)
    }

    async fn score_one(&self, job_json: &str, resume: &ParsedResume) -> CandidateScore {
        let result = match serde_json::to_string_pretty(resume) {
            Ok(resume_json) => {
                let prompt = score_prompt(job_json, &resume_json);
                let system = format!("{SCORE_SYSTEM} {FAIRNESS_INSTRUCTION} {JSON_ONLY_SYSTEM}");
                self.llm.call_json::<CandidateScore>(&prompt, &system).await
            }
            Err(e) => Err(LlmError::Parse(e)),
        };
        scored_entry(resume, result)
    }
}

#[async_trait]
impl ScreeningBackend for LlmBackend {
    async fn ingest(&self, request: &IngestRequest) -> Result<IngestionResult, BackendError> {
        let job_description =
            normalize_job_description(&request.job_description.text, &self.http).await?;

        let packaging = request.resume_files.iter().map(package_resume).collect::<Vec<_>>();
        let resumes = stream::iter(packaging)
            .buffered(self.item_concurrency)
            .collect::<Vec<_>>()
            .await;

        info!("Ingested {} resume(s)", resumes.len());
        Ok(IngestionResult {
            job_description,
            resumes,
        })
    }

    async fn parse_job_description(
        &self,
        job_description: &str,
    ) -> Result<JobRequirements, BackendError> {
        if job_description.trim().is_empty() {
            return Err(BackendError::MalformedResponse(
                "No job description text provided".to_string(),
            ));
        }
        let prompt = fill_template(JD_PARSE_PROMPT_TEMPLATE, &[("jd_text", job_description)]);
        let system = format!("{JD_PARSE_SYSTEM} {JSON_ONLY_SYSTEM}");
        Ok(self.llm.call_json::<JobRequirements>(&prompt, &system).await?)
    }

    async fn parse_resumes(
        &self,
        resumes: &[IngestedResume],
    ) -> Result<ParsedResumes, BackendError> {
        // Futures are built up front; `buffered` keeps them in input order.
        let calls = resumes.iter().map(|resume| self.parse_one(resume)).collect::<Vec<_>>();
        let parsed_resumes = stream::iter(calls)
            .buffered(self.item_concurrency)
            .collect::<Vec<_>>()
            .await;
        Ok(ParsedResumes { parsed_resumes })
    }

    async fn score_candidates(
        &self,
        requirements: &JobRequirements,
        resumes: &ParsedResumes,
    ) -> Result<Vec<CandidateScore>, BackendError> {
        let job_json = serde_json::to_string_pretty(requirements)
            .map_err(|e| BackendError::MalformedResponse(e.to_string()))?;

        let job_json = job_json.as_str();
        let calls = resumes
            .profiles()
            .map(|resume| self.score_one(job_json, resume))
            .collect::<Vec<_>>();
        let scores = stream::iter(calls)
            .buffered(self.item_concurrency)
            .collect::<Vec<_>>()
            .await;
        Ok(scores)
    }

    async fn rank_candidates(
        &self,
        scores: &[CandidateScore],
    ) -> Result<Vec<RankedCandidate>, BackendError> {
        Ok(rank_candidates(scores.to_vec()))
    }

    async fn generate_email(&self, request: &EmailRequest) -> Result<EmailResponse, BackendError> {
        let prompt = email_prompt(request)
            .map_err(|e| BackendError::MalformedResponse(e.to_string()))?;
        let email_body = self.llm.call_text(&prompt, EMAIL_SYSTEM).await?;
        Ok(EmailResponse { email_body })
    }

    fn name(&self) -> &'static str {
        "llm"
    }
}

fn resume_parse_prompt(resume_text: &str) -> String {
    fill_template(RESUME_PARSE_PROMPT_TEMPLATE, &[("resume_text", resume_text)])
}

fn score_prompt(job_json: &str, resume_json: &str) -> String {
    fill_template(
        SCORE_PROMPT_TEMPLATE,
        &[("job_json", job_json), ("resume_json", resume_json)],
    )
}

pub(crate) fn email_prompt(request: &EmailRequest) -> Result<String, serde_json::Error> {
    let instruction = match request.email_type {
        EmailType::Accept => ACCEPT_INSTRUCTION,
        EmailType::Reject => REJECT_INSTRUCTION,
    };
    let job_json = serde_json::to_string_pretty(&request.job_description)?;
    let candidate_json = serde_json::to_string_pretty(&request.candidate)?;
    Ok(fill_template(
        EMAIL_PROMPT_TEMPLATE,
        &[
            ("job_json", job_json.as_str()),
            ("candidate_json", candidate_json.as_str()),
            ("instruction", instruction),
        ],
    ))
}

fn parsed_entry(filename: &str, result: Result<ParsedResume, LlmError>) -> ParsedResumeEntry {
    match result {
        Ok(resume) => ParsedResumeEntry::Parsed(resume),
        Err(e) => {
            warn!("Resume '{filename}' could not be parsed: {e}");
            ParsedResumeEntry::Failed {
                error: format!("Failed to parse resume using LLM: {e}"),
            }
        }
    }
}

fn scored_entry(resume: &ParsedResume, result: Result<CandidateScore, LlmError>) -> CandidateScore {
    match result {
        Ok(mut score) => {
            if score.name.trim().is_empty() {
                score.name = resume.name.clone();
            }
            score.resume = Some(resume.clone());
            score
        }
        Err(e) => {
            warn!("Candidate '{}' could not be scored: {e}", resume.name);
            CandidateScore::failed(Some(&resume.name), e)
        }
    }
}
