use super::common::*;
use crate::workflows::matching::allocation::{Allocator, Decision, SeatCapacity};
use crate::workflows::matching::domain::{QuotaCategory, QuotaTable, SeatKind, StudentId};
use crate::workflows::matching::repository::SeatLedger;

fn allocator() -> Allocator {
    Allocator::new(10.0)
}

fn decision_for(
    decisions: &[crate::workflows::matching::allocation::AllocationDecision],
    id: u64,
) -> Decision {
    decisions
        .iter()
        .find(|decision| decision.student_id == StudentId(id))
        .map(|decision| decision.decision)
        .expect("student decided")
}

#[test]
fn rural_candidate_takes_the_only_reserved_seat() {
    let single = posting(
        PUNE_POSTING,
        1,
        QuotaTable {
            rural: 1,
            ..QuotaTable::default()
        },
    );
    let candidates = vec![
        candidate(1, None, 90.0, 0.0),
        candidate(2, Some(QuotaCategory::Rural), 40.0, 100.0),
    ];

    let decisions = allocator().allocate(&capacity(&single), candidates);

    assert_eq!(
        decision_for(&decisions, 2),
        Decision::Offered(SeatKind::Reserved(QuotaCategory::Rural))
    );
    assert!(!matches!(decision_for(&decisions, 1), Decision::Offered(_)));
    assert_eq!(decision_for(&decisions, 1), Decision::Waitlisted);
}

#[test]
fn unused_reserved_seats_fall_back_to_general_pool() {
    let two_seats = posting(
        PUNE_POSTING,
        2,
        QuotaTable {
            rural: 1,
            ..QuotaTable::default()
        },
    );
    let candidates = vec![
        candidate(1, None, 80.0, 0.0),
        candidate(2, None, 70.0, 0.0),
        candidate(3, None, 30.0, 0.0),
    ];

    let decisions = allocator().allocate(&capacity(&two_seats), candidates);

    assert_eq!(decision_for(&decisions, 1), Decision::Offered(SeatKind::General));
    assert_eq!(decision_for(&decisions, 2), Decision::Offered(SeatKind::General));
    assert_eq!(decision_for(&decisions, 3), Decision::Rejected);
}

#[test]
fn waitlist_margin_is_measured_from_lowest_offer() {
    let one_seat = posting(PUNE_POSTING, 1, QuotaTable::default());
    let candidates = vec![
        candidate(1, None, 75.0, 0.0),
        candidate(2, None, 65.0, 0.0),
        candidate(3, None, 64.99, 0.0),
    ];

    let decisions = allocator().allocate(&capacity(&one_seat), candidates);

    assert_eq!(decision_for(&decisions, 1), Decision::Offered(SeatKind::General));
    assert_eq!(decision_for(&decisions, 2), Decision::Waitlisted);
    assert_eq!(decision_for(&decisions, 3), Decision::Rejected);
}

#[test]
fn full_posting_rejects_everyone() {
    let mut full = posting(PUNE_POSTING, 2, QuotaTable::default());
    full.filled_positions = 2;
    let candidates = vec![candidate(1, None, 99.0, 0.0), candidate(2, None, 98.0, 0.0)];

    let decisions = allocator().allocate(&capacity(&full), candidates);

    assert!(decisions
        .iter()
        .all(|decision| decision.decision == Decision::Rejected));
}

#[test]
fn empty_pool_yields_no_decisions() {
    let open = pune_posting();
    assert!(allocator().allocate(&capacity(&open), Vec::new()).is_empty());
}

#[test]
fn allocation_is_independent_of_input_order() {
    let open = posting(
        PUNE_POSTING,
        3,
        QuotaTable {
            rural: 1,
            sc: 1,
            ..QuotaTable::default()
        },
    );
    let pool = vec![
        candidate(1, None, 70.0, 0.0),
        candidate(2, Some(QuotaCategory::ScheduledCaste), 70.0, 100.0),
        candidate(3, Some(QuotaCategory::Rural), 55.0, 100.0),
        candidate(4, None, 70.0, 0.0),
        candidate(5, Some(QuotaCategory::Rural), 60.0, 100.0),
    ];
    let mut reversed = pool.clone();
    reversed.reverse();

    let forward = allocator().allocate(&capacity(&open), pool);
    let backward = allocator().allocate(&capacity(&open), reversed);

    assert_eq!(forward, backward);
    let order: Vec<u64> = forward.iter().map(|decision| decision.student_id.0).collect();
    assert_eq!(order, vec![2, 1, 4, 5, 3]);
    assert_eq!(
        decision_for(&forward, 5),
        Decision::Offered(SeatKind::Reserved(QuotaCategory::Rural))
    );
    assert_eq!(
        decision_for(&forward, 2),
        Decision::Offered(SeatKind::Reserved(QuotaCategory::ScheduledCaste))
    );
    assert_eq!(decision_for(&forward, 1), Decision::Offered(SeatKind::General));
    assert_eq!(decision_for(&forward, 4), Decision::Waitlisted);
}

#[test]
fn reserved_room_nets_out_accepted_reserved_seats() {
    let open = posting(
        PUNE_POSTING,
        3,
        QuotaTable {
            rural: 2,
            ..QuotaTable::default()
        },
    );
    let mut ledger = SeatLedger::seeded(&open);
    ledger.filled = 1;
    ledger.reserved.insert(QuotaCategory::Rural, 1);

    let capacity = SeatCapacity::for_posting(&open, &ledger).expect("valid posting");
    assert_eq!(capacity.open_seats, 2);
    assert_eq!(capacity.reserved_room(QuotaCategory::Rural), 1);

    let decisions = allocator().allocate(
        &capacity,
        vec![
            candidate(1, Some(QuotaCategory::Rural), 50.0, 100.0),
            candidate(2, Some(QuotaCategory::Rural), 49.0, 100.0),
            candidate(3, None, 90.0, 0.0),
        ],
    );
    assert_eq!(
        decision_for(&decisions, 1),
        Decision::Offered(SeatKind::Reserved(QuotaCategory::Rural))
    );
    assert_eq!(decision_for(&decisions, 3), Decision::Offered(SeatKind::General));
    assert_eq!(decision_for(&decisions, 2), Decision::Waitlisted);
}

#[test]
fn ranks_are_one_based_and_contiguous() {
    let open = pune_posting();
    let decisions = allocator().allocate(
        &capacity(&open),
        vec![
            candidate(3, None, 10.0, 0.0),
            candidate(1, None, 30.0, 0.0),
            candidate(2, None, 20.0, 0.0),
        ],
    );
    let ranks: Vec<u32> = decisions.iter().map(|decision| decision.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3]);
    assert_eq!(decisions[0].student_id, StudentId(1));
}
