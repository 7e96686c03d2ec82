use std::collections::BTreeMap;

use serde::Serialize;

use crate::workflows::matching::domain::{Internship, QuotaCategory};
use crate::workflows::matching::error::ValidationError;
use crate::workflows::matching::repository::SeatLedger;

/// Reserved sub-capacities after soft-ceiling scaling.
///
/// When the declared quotas sum past the posting's total, each bucket gets the floor of
/// its proportional share and the leftover seats go to the largest fractional parts,
/// ties resolved by bucket priority. The scaled sum then equals the total exactly.
pub fn scaled_quotas(
    posting: &Internship,
) -> Result<BTreeMap<QuotaCategory, u32>, ValidationError> {
    let total = u64::from(posting.total_positions);
    let declared = posting.quotas.sum();

    if declared <= total {
        return Ok(QuotaCategory::PRIORITY
            .iter()
            .map(|category| (*category, posting.quotas.get(*category)))
            .collect());
    }

    let mut shares: Vec<(QuotaCategory, u64, u64)> = QuotaCategory::PRIORITY
        .iter()
        .map(|category| {
            let weighted = u64::from(posting.quotas.get(*category)) * total;
            (*category, weighted / declared, weighted % declared)
        })
        .collect();

    let floored: u64 = shares.iter().map(|(_, floor, _)| floor).sum();
    let mut leftover = total.saturating_sub(floored);

    let mut by_remainder: Vec<usize> = (0..shares.len()).collect();
    by_remainder.sort_by(|a, b| shares[*b].2.cmp(&shares[*a].2).then(a.cmp(b)));
    for index in by_remainder {
        if leftover == 0 {
            break;
        }
        if shares[index].2 > 0 {
            shares[index].1 += 1;
            leftover -= 1;
        }
    }

    let scaled: u64 = shares.iter().map(|(_, seats, _)| seats).sum();
    if scaled > total {
        return Err(ValidationError::QuotaOverflow {
            internship: posting.id,
            scaled,
            total: posting.total_positions,
        });
    }

    Ok(shares
        .into_iter()
        .map(|(category, seats, _)| (category, seats as u32))
        .collect())
}

/// Seats still available to a fresh allocation, net of accepted placements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeatCapacity {
    pub open_seats: u32,
    reserved: BTreeMap<QuotaCategory, u32>,
}

impl SeatCapacity {
    pub fn for_posting(posting: &Internship, ledger: &SeatLedger) -> Result<Self, ValidationError> {
        let scaled = scaled_quotas(posting)?;
        let open_seats = posting.total_positions.saturating_sub(ledger.filled);

        let mut budget = open_seats;
        let mut reserved = BTreeMap::new();
        for category in QuotaCategory::PRIORITY {
            let cap = scaled.get(&category).copied().unwrap_or(0);
            let room = cap
                .saturating_sub(ledger.reserved_filled(category))
                .min(budget);
            budget -= room;
            reserved.insert(category, room);
        }

        Ok(Self {
            open_seats,
            reserved,
        })
    }

    pub fn reserved_room(&self, category: QuotaCategory) -> u32 {
        self.reserved.get(&category).copied().unwrap_or(0)
    }
}
