//! On-demand candidate email — one accept/reject draft per call, or a batch
//! that invites the top X of a ranked list and rejects the rest.
//!
//! Independent of the pipeline run: it only needs ranked candidates and the
//! parsed job description, and it never fails. A backend error becomes a
//! readable placeholder body the operator can see in the draft editor.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::screening::backend::ScreeningBackend;
use crate::screening::models::{EmailRequest, EmailType, JobRequirements, RankedCandidate};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailDraft {
    pub candidate_name: String,
    pub email_type: EmailType,
    pub body: String,
    /// False when `body` is an error placeholder rather than a generated email.
    pub generated: bool,
}

/// Generates one email draft. Exactly one backend call, no retry.
pub async fn generate_email(
    backend: &dyn ScreeningBackend,
    candidate: &RankedCandidate,
    decision: EmailType,
    job_requirements: &JobRequirements,
) -> EmailDraft {
    let request = EmailRequest {
        candidate: candidate.clone(),
        email_type: decision,
        job_description: job_requirements.clone(),
    };

    let (body, generated) = match backend.generate_email(&request).await {
        Ok(response) if !response.email_body.trim().is_empty() => (response.email_body, true),
        Ok(_) => {
            warn!("Email generation for '{}' returned an empty body", candidate.name());
            (
                "Error generating email: the generator returned an empty message.".to_string(),
                false,
            )
        }
        Err(e) => {
            warn!("Email generation for '{}' failed: {e}", candidate.name());
            (format!("Error generating email: {e}"), false)
        }
    };

    if generated {
        info!("Generated {decision:?} email for '{}'", candidate.name());
    }

    EmailDraft {
        candidate_name: candidate.name().to_string(),
        email_type: decision,
        body,
        generated,
    }
}

/// Drafts for a whole ranked list, split by decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailBatch {
    pub invitations: Vec<EmailDraft>,
    pub rejections: Vec<EmailDraft>,
}

/// Invites the first `top_x` candidates of `ranked` and rejects the rest.
/// One backend call per candidate; a failed call only affects its own draft.
pub async fn generate_batch_emails(
    backend: &dyn ScreeningBackend,
    ranked: &[RankedCandidate],
    top_x: usize,
    job_requirements: &JobRequirements,
) -> EmailBatch {
    let calls = ranked
        .iter()
        .enumerate()
        .map(|(position, candidate)| {
            let decision = if position < top_x {
                EmailType::Accept
            } else {
                EmailType::Reject
            };
            generate_email(backend, candidate, decision, job_requirements)
        })
        .collect::<Vec<_>>();

    let (invitations, rejections): (Vec<_>, Vec<_>) = join_all(calls)
        .await
        .into_iter()
        .partition(|draft| draft.email_type == EmailType::Accept);

    let failed = invitations
        .iter()
        .chain(&rejections)
        .filter(|d| !d.generated)
        .count();
    info!(
        "Drafted {} invitation(s) and {} rejection(s), {failed} failed",
        invitations.len(),
        rejections.len()
    );

    EmailBatch {
        invitations,
        rejections,
    }
}
