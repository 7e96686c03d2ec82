use super::common::*;
use crate::workflows::matching::domain::QuotaTable;
use crate::workflows::matching::scoring::{EngineConfig, Exclusion, ScoreEngine};

fn engine() -> ScoreEngine {
    ScoreEngine::new(EngineConfig::default())
}

#[test]
fn pune_student_scores_against_pune_posting() {
    let mut student = asha();
    student.current_location = Some("Pune".to_string());
    student.preferred_locations = None;
    let posting = pune_posting();

    let score = engine().score(&student, &posting, &capacity(&posting));

    assert_eq!(score.skills, 66.67);
    assert_eq!(score.location, 100.0);
    assert_eq!(score.academic, 80.0);
    assert!(score.academic >= 60.0);
    assert_eq!(score.affirmative_action, 0.0);
}

#[test]
fn rural_student_earns_affirmative_credit_only_while_room_remains() {
    let student = bilal();
    let mut posting = pune_posting();

    let open = engine().score(&student, &posting, &capacity(&posting));
    assert_eq!(open.affirmative_action, 100.0);

    posting.quotas = QuotaTable::default();
    let closed = engine().score(&student, &posting, &capacity(&posting));
    assert_eq!(closed.affirmative_action, 0.0);
    assert!(closed.overall < open.overall);
}

#[test]
fn same_region_mismatch_earns_partial_location_credit() {
    let student = bilal();
    let posting = pune_posting();

    let score = engine().score(&student, &posting, &capacity(&posting));
    assert_eq!(score.location, 50.0);
}

#[test]
fn every_component_stays_within_bounds() {
    let posting = pune_posting();
    let mut weak = student(
        crate::workflows::matching::domain::StudentId(9),
        "Weak",
        "",
        "Chennai, Tamil Nadu",
    );
    weak.cgpa = Some(0.0);
    let mut strong = chen();
    strong.cgpa = Some(12.0);
    strong.course = Some("B.Tech Computer Science".to_string());

    let mut demanding = posting.clone();
    demanding.year_of_study_requirement = Some("Final Year".to_string());
    demanding.preferred_course = Some("B.Tech".to_string());

    for (candidate, target) in [
        (&weak, &posting),
        (&weak, &demanding),
        (&strong, &posting),
        (&strong, &demanding),
    ] {
        let score = engine().score(candidate, target, &capacity(target));
        for value in [
            score.skills,
            score.location,
            score.academic,
            score.affirmative_action,
            score.overall,
        ] {
            assert!(
                (0.0..=100.0).contains(&value),
                "component {value} out of range for {:?}",
                candidate.id
            );
        }
    }
}

#[test]
fn year_requirement_adjusts_academic_score() {
    let student = chen();
    let mut posting = pune_posting();

    posting.year_of_study_requirement = Some("3rd Year".to_string());
    let matched = engine().score(&student, &posting, &capacity(&posting));
    posting.year_of_study_requirement = Some("Final Year".to_string());
    let mismatched = engine().score(&student, &posting, &capacity(&posting));

    assert_eq!(matched.academic, 100.0);
    assert_eq!(mismatched.academic, 80.0);
}

#[test]
fn screening_excludes_incomplete_and_underqualified_students() {
    let posting = pune_posting();

    let mut sparse = asha();
    sparse.phone = None;
    sparse.institution = None;
    sparse.course = None;
    sparse.sector_interests = None;
    sparse.technical_skills = None;
    sparse.soft_skills = None;
    match engine().screen(&sparse, &posting, now()) {
        Err(Exclusion::IncompleteProfile { score, threshold }) => {
            assert_eq!(score, 60);
            assert_eq!(threshold, 70);
        }
        other => panic!("expected incomplete profile exclusion, got {other:?}"),
    }

    let mut low = asha();
    low.cgpa = Some(5.5);
    match engine().screen(&low, &posting, now()) {
        Err(Exclusion::BelowMinimumGpa { gpa, minimum }) => {
            assert_eq!(gpa, 5.5);
            assert_eq!(minimum, 6.0);
        }
        other => panic!("expected minimum GPA exclusion, got {other:?}"),
    }

    let mut missing = asha();
    missing.cgpa = None;
    assert!(matches!(
        engine().screen(&missing, &posting, now()),
        Err(Exclusion::MissingGpa { .. })
    ));
}

#[test]
fn screening_rejects_postings_past_deadline() {
    let mut posting = pune_posting();
    posting.application_deadline = Some(at(1, 8));

    assert_eq!(
        engine().screen(&asha(), &posting, now()),
        Err(Exclusion::PostingClosed)
    );

    posting.application_deadline = Some(at(2, 8));
    assert_eq!(engine().screen(&asha(), &posting, now()), Ok(()));
}
