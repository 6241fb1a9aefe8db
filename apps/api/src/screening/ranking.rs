//! Candidate ranking: derive `avg_score` and order descending.
//!
//! `avg_score` is the unweighted mean of relevance, experience, skills and
//! overall. `overall` is itself an aggregate produced by the scorer, so it is
//! effectively counted twice; kept as-is to match the scoring contract.

use crate::screening::models::{CandidateScore, RankedCandidate};

/// Unweighted mean of the four sub-scores.
pub fn average_score(score: &CandidateScore) -> f64 {
    (score.relevance + score.experience + score.skills + score.overall) / 4.0
}

/// Attaches `avg_score` to each candidate and sorts descending.
///
/// The sort is stable: candidates with equal averages keep their input order.
pub fn rank_candidates(scores: Vec<CandidateScore>) -> Vec<RankedCandidate> {
    let mut ranked = scores
        .into_iter()
        .map(|score| RankedCandidate {
            avg_score: average_score(&score),
            score,
        })
        .collect::<Vec<_>>();
    // total_cmp keeps the order total even if a backend hands us NaN.
    ranked.sort_by(|a, b| b.avg_score.total_cmp(&a.avg_score));
    ranked
}
