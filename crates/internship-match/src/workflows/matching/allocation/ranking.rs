use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::workflows::matching::domain::{QuotaCategory, StudentId};
use crate::workflows::matching::scoring::MatchScore;

/// A scored student competing for seats on one posting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub student_id: StudentId,
    pub category: Option<QuotaCategory>,
    pub registered_at: DateTime<Utc>,
    pub score: MatchScore,
}

/// Total order used for every ranking decision: overall score, then affirmative-action
/// score (both descending), then earlier registration, then lower student id.
pub fn rank_order(a: &Candidate, b: &Candidate) -> Ordering {
    b.score
        .overall
        .total_cmp(&a.score.overall)
        .then_with(|| {
            b.score
                .affirmative_action
                .total_cmp(&a.score.affirmative_action)
        })
        .then_with(|| a.registered_at.cmp(&b.registered_at))
        .then_with(|| a.student_id.cmp(&b.student_id))
}

pub fn rank(candidates: &mut [Candidate]) {
    candidates.sort_by(rank_order);
}
