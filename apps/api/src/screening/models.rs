//! Wire shapes exchanged with the screening capability.
//!
//! Field names follow the processor service's JSON contract so the same types
//! serve the in-process backend, the remote backend and the processor routes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ────────────────────────────────────────────────────────────────────────────
// Stage 1: ingest
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDescriptionInput {
    /// Raw job description text, or a URL to fetch it from.
    pub text: String,
}

/// A resume as uploaded: file name plus base64 content
/// (optionally prefixed with a `data:...;base64,` header).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeFile {
    pub filename: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestRequest {
    pub job_description: JobDescriptionInput,
    pub resume_files: Vec<ResumeFile>,
}

/// One packaged resume. Carries `error` instead of `text` when the file
/// could not be decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestedResume {
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IngestedResume {
    pub fn text(filename: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            text: Some(text.into()),
            error: None,
        }
    }

    pub fn failed(filename: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            text: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionResult {
    /// Normalized job description text (fetched content when a URL was given).
    pub job_description: String,
    pub resumes: Vec<IngestedResume>,
}

// ────────────────────────────────────────────────────────────────────────────
// Stage 2: parse job description
// ────────────────────────────────────────────────────────────────────────────

/// Structured job requirements extracted from the job description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobRequirements {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    #[serde(default)]
    pub benefits: Vec<String>,
    /// Free-form: models answer with a string ("3+ years") or a number.
    #[serde(default)]
    pub experience: Value,
}

// ────────────────────────────────────────────────────────────────────────────
// Stage 3: parse resumes
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedResume {
    pub name: String,
    #[serde(default)]
    pub work_experiences: Vec<String>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub education: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certifications: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub languages: Option<Vec<String>>,
}

/// One entry of a parse-resumes batch: either a profile or an item-level error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParsedResumeEntry {
    Failed { error: String },
    Parsed(ParsedResume),
}

impl ParsedResumeEntry {
    pub fn profile(&self) -> Option<&ParsedResume> {
        match self {
            ParsedResumeEntry::Parsed(resume) => Some(resume),
            ParsedResumeEntry::Failed { .. } => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ParsedResumeEntry::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseResumesRequest {
    pub resume_files: Vec<IngestedResume>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedResumes {
    pub parsed_resumes: Vec<ParsedResumeEntry>,
}

impl ParsedResumes {
    pub fn profiles(&self) -> impl Iterator<Item = &ParsedResume> {
        self.parsed_resumes.iter().filter_map(ParsedResumeEntry::profile)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Stage 4 / 5: score and rank
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreCandidatesRequest {
    pub parsed_requirements: JobRequirements,
    pub parsed_resumes: ParsedResumes,
}

/// Sub-scores for one candidate, each on a 0–100 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    pub name: String,
    pub relevance: f64,
    pub experience: f64,
    pub skills: f64,
    pub overall: f64,
    pub comment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume: Option<ParsedResume>,
}

impl CandidateScore {
    /// Zero-scored placeholder recorded when a candidate could not be evaluated.
    pub fn failed(name: Option<&str>, reason: impl std::fmt::Display) -> Self {
        Self {
            name: name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or("Unknown")
                .to_string(),
            relevance: 0.0,
            experience: 0.0,
            skills: 0.0,
            overall: 0.0,
            comment: format!("Error during evaluation: {reason}"),
            resume: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankCandidatesRequest {
    pub candidate_scores: Vec<CandidateScore>,
}

/// A scored candidate with its derived average. This is what the operator
/// sees in the results table and what the email task receives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    #[serde(flatten)]
    pub score: CandidateScore,
    pub avg_score: f64,
}

impl RankedCandidate {
    pub fn name(&self) -> &str {
        &self.score.name
    }
}

// ────────────────────────────────────────────────────────────────────────────
// On-demand email
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailType {
    Accept,
    Reject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailRequest {
    pub candidate: RankedCandidate,
    pub email_type: EmailType,
    pub job_description: JobRequirements,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailResponse {
    pub email_body: String,
}
