mod quota;
mod ranking;

pub use quota::{scaled_quotas, SeatCapacity};
pub use ranking::{rank, rank_order, Candidate};

use serde::Serialize;

use super::domain::{QuotaCategory, SeatKind, StudentId};
use super::scoring::MatchScore;

/// Outcome for one candidate in an allocation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", content = "seat", rename_all = "snake_case")]
pub enum Decision {
    Offered(SeatKind),
    Waitlisted,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationDecision {
    pub student_id: StudentId,
    pub decision: Decision,
    /// 1-based position in the posting's ranking.
    pub rank: u32,
    pub score: MatchScore,
}

/// Quota-aware seat allocator for a single posting.
#[derive(Debug, Clone, Copy)]
pub struct Allocator {
    waitlist_margin: f64,
}

impl Allocator {
    pub fn new(waitlist_margin: f64) -> Self {
        Self { waitlist_margin }
    }

    /// Assign offers over the open capacity. Output follows ranking order.
    pub fn allocate(
        &self,
        capacity: &SeatCapacity,
        mut candidates: Vec<Candidate>,
    ) -> Vec<AllocationDecision> {
        if candidates.is_empty() {
            return Vec::new();
        }
        rank(&mut candidates);

        let mut decisions: Vec<Option<Decision>> = vec![None; candidates.len()];
        let mut offered: u32 = 0;

        for category in QuotaCategory::PRIORITY {
            let mut room = capacity.reserved_room(category);
            for (index, candidate) in candidates.iter().enumerate() {
                if room == 0 {
                    break;
                }
                if candidate.category == Some(category) && decisions[index].is_none() {
                    decisions[index] = Some(Decision::Offered(SeatKind::Reserved(category)));
                    room -= 1;
                    offered += 1;
                }
            }
        }

        let mut general_room = capacity.open_seats.saturating_sub(offered);
        for slot in decisions.iter_mut() {
            if general_room == 0 {
                break;
            }
            if slot.is_none() {
                *slot = Some(Decision::Offered(SeatKind::General));
                general_room -= 1;
            }
        }

        let lowest_offered = candidates
            .iter()
            .zip(&decisions)
            .filter(|(_, decision)| matches!(decision, Some(Decision::Offered(_))))
            .map(|(candidate, _)| candidate.score.overall)
            .min_by(f64::total_cmp);

        candidates
            .into_iter()
            .zip(decisions)
            .enumerate()
            .map(|(index, (candidate, decision))| {
                let decision = decision.unwrap_or_else(|| match lowest_offered {
                    Some(lowest) if lowest - candidate.score.overall <= self.waitlist_margin => {
                        Decision::Waitlisted
                    }
                    _ => Decision::Rejected,
                });
                AllocationDecision {
                    student_id: candidate.student_id,
                    decision,
                    rank: index as u32 + 1,
                    score: candidate.score,
                }
            })
            .collect()
    }
}
