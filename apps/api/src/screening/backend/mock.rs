//! Mock backend — placeholder parsing and random scoring with simulated delays.
//!
//! Useful for demos and UI work without an API key. Scores are random but
//! internally consistent: the skills score really is the share of required
//! skills the mock profile happens to list.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::errors::BackendError;
use crate::screening::backend::ScreeningBackend;
use crate::screening::ingest::decode_resume_bytes;
use crate::screening::models::{
    CandidateScore, EmailRequest, EmailResponse, EmailType, IngestRequest, IngestedResume,
    IngestionResult, JobRequirements, ParsedResume, ParsedResumeEntry, ParsedResumes,
    RankedCandidate,
};
use crate::screening::ranking::rank_candidates;

const SKILL_POOL: &[&str] = &["JavaScript", "React", "Node.js", "TypeScript", "Python", "Java"];
const DEGREES: &[&str] = &["PhD", "Master's Degree", "Bachelor's Degree"];

pub struct MockBackend {
    delay: Duration,
}

impl MockBackend {
    /// `delay_ms` is slept once per operation to mimic model latency.
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
        }
    }

    async fn simulate_latency(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

#[async_trait]
impl ScreeningBackend for MockBackend {
    async fn ingest(&self, request: &IngestRequest) -> Result<IngestionResult, BackendError> {
        self.simulate_latency().await;
        let resumes = request
            .resume_files
            .iter()
            .map(|file| match decode_resume_bytes(file) {
                Ok(bytes) => {
                    IngestedResume::text(&file.filename, String::from_utf8_lossy(&bytes))
                }
                Err(e) => IngestedResume::failed(&file.filename, e),
            })
            .collect();
        Ok(IngestionResult {
            job_description: request.job_description.text.clone(),
            resumes,
        })
    }

    async fn parse_job_description(
        &self,
        job_description: &str,
    ) -> Result<JobRequirements, BackendError> {
        self.simulate_latency().await;
        Ok(mock_requirements(job_description, &mut rand::thread_rng()))
    }

    async fn parse_resumes(
        &self,
        resumes: &[IngestedResume],
    ) -> Result<ParsedResumes, BackendError> {
        self.simulate_latency().await;
        let mut rng = rand::thread_rng();
        let parsed_resumes = resumes
            .iter()
            .map(|resume| match &resume.error {
                Some(error) => ParsedResumeEntry::Failed {
                    error: error.clone(),
                },
                None => ParsedResumeEntry::Parsed(mock_profile(&resume.filename, &mut rng)),
            })
            .collect();
        Ok(ParsedResumes { parsed_resumes })
    }

    async fn score_candidates(
        &self,
        requirements: &JobRequirements,
        resumes: &ParsedResumes,
    ) -> Result<Vec<CandidateScore>, BackendError> {
        self.simulate_latency().await;
        Ok(resumes
            .profiles()
            .map(|resume| mock_score(requirements, resume))
            .collect())
    }

    async fn rank_candidates(
        &self,
        scores: &[CandidateScore],
    ) -> Result<Vec<RankedCandidate>, BackendError> {
        self.simulate_latency().await;
        Ok(rank_candidates(scores.to_vec()))
    }

    async fn generate_email(&self, request: &EmailRequest) -> Result<EmailResponse, BackendError> {
        self.simulate_latency().await;
        Ok(EmailResponse {
            email_body: mock_email(request),
        })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

fn mock_requirements(job_description: &str, rng: &mut impl Rng) -> JobRequirements {
    let years = rng.gen_range(1..=5);
    let title = job_description
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("Untitled role")
        .chars()
        .take(80)
        .collect();

    JobRequirements {
        title,
        requirements: random_skills(rng, 0.7),
        experience: format!("{years}+ years").into(),
        ..Default::default()
    }
}

fn mock_profile(filename: &str, rng: &mut impl Rng) -> ParsedResume {
    let name = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or(filename)
        .to_string();
    let years: u32 = rng.gen_range(1..=10);
    let degree = DEGREES.choose(rng).copied().unwrap_or("Bachelor's Degree");

    ParsedResume {
        name,
        work_experiences: vec![format!("{years} years of experience")],
        skills: random_skills(rng, 0.5),
        education: vec![degree.to_string()],
        ..Default::default()
    }
}

fn random_skills(rng: &mut impl Rng, keep: f64) -> Vec<String> {
    SKILL_POOL
        .iter()
        .filter(|_| rng.gen_bool(keep))
        .map(|s| s.to_string())
        .collect()
}

fn mock_score(requirements: &JobRequirements, resume: &ParsedResume) -> CandidateScore {
    let skills = skills_score(&resume.skills, &requirements.requirements);
    let experience = experience_score(
        leading_number(resume.work_experiences.first().map(String::as_str)),
        leading_number(requirements.experience.as_str()),
    );
    let education = education_score(resume.education.first().map(String::as_str));
    let overall = skills * 0.5 + experience * 0.3 + education * 0.2;
    debug!("Mock score for {}: {overall:.1}", resume.name);

    CandidateScore {
        name: resume.name.clone(),
        relevance: skills,
        experience,
        skills,
        overall,
        comment: format!(
            "Mock evaluation: {} of {} required skills matched.",
            matched_skills(&resume.skills, &requirements.requirements),
            requirements.requirements.len()
        ),
        resume: Some(resume.clone()),
    }
}

fn matched_skills(candidate: &[String], required: &[String]) -> usize {
    candidate.iter().filter(|s| required.contains(s)).count()
}

fn skills_score(candidate: &[String], required: &[String]) -> f64 {
    if required.is_empty() {
        return 0.0;
    }
    matched_skills(candidate, required) as f64 / required.len() as f64 * 100.0
}

fn experience_score(candidate_years: Option<u32>, required_years: Option<u32>) -> f64 {
    match (candidate_years, required_years) {
        (Some(have), Some(need)) if need > 0 && have < need => have as f64 / need as f64 * 100.0,
        (Some(_), _) => 100.0,
        (None, _) => 0.0,
    }
}

fn education_score(education: Option<&str>) -> f64 {
    match education {
        Some("PhD") => 100.0,
        Some("Master's Degree") => 90.0,
        Some("Bachelor's Degree") => 80.0,
        _ => 70.0,
    }
}

/// "3+ years" -> 3
fn leading_number(text: Option<&str>) -> Option<u32> {
    let digits: String = text?
        .trim_start()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

fn mock_email(request: &EmailRequest) -> String {
    let name = request.candidate.name();
    let title = if request.job_description.title.is_empty() {
        "the open position"
    } else {
        request.job_description.title.as_str()
    };
    match request.email_type {
        EmailType::Accept => format!(
            "Hi {name},\n\nThank you for applying for {title}. We were impressed by your \
             background and would like to invite you to a quick call. Please reply with a few \
             times that work for you this week.\n\nBest regards,\nThe Hiring Team"
        ),
        EmailType::Reject => format!(
            "Hi {name},\n\nThank you for applying for {title}. After careful review we have \
             decided not to move forward with your application. Feedback from our evaluation: \
             {}\n\nWe wish you the best in your search.\n\nBest regards,\nThe Hiring Team",
            request.candidate.score.comment
        ),
    }
}
