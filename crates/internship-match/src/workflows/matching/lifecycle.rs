//! Forward-only state machines for matches and applications.

use chrono::{DateTime, Utc};

use super::domain::{
    Actor, ApplicationRecord, ApplicationStatus, DepartmentId, MatchStatus, TransitionRequest,
};
use super::error::{EngineError, TransitionSubject};
use super::repository::MatchRecord;

impl MatchStatus {
    /// Accepted and declined matches are never touched by a recompute.
    pub const fn is_terminal(self) -> bool {
        matches!(self, MatchStatus::Accepted | MatchStatus::Declined)
    }

    /// Statuses that still represent a claim on the posting's pool.
    pub const fn is_live(self) -> bool {
        matches!(
            self,
            MatchStatus::Pending | MatchStatus::Offered | MatchStatus::Waitlisted
        )
    }

    /// Explicit transitions; engine recomputes overwrite non-terminal rows instead.
    pub fn can_transition_to(self, next: MatchStatus) -> bool {
        use MatchStatus::*;
        matches!(
            (self, next),
            (Pending, Offered)
                | (Pending, Waitlisted)
                | (Pending, Rejected)
                | (Waitlisted, Offered)
                | (Waitlisted, Rejected)
                | (Waitlisted, Expired)
                | (Pending, Expired)
                | (Offered, Accepted)
                | (Offered, Declined)
                | (Offered, Expired)
        )
    }
}

impl ApplicationStatus {
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            ApplicationStatus::Accepted | ApplicationStatus::Rejected | ApplicationStatus::Withdrawn
        )
    }

    pub fn can_transition_to(self, next: ApplicationStatus) -> bool {
        use ApplicationStatus::*;
        if next == Withdrawn {
            return !self.is_terminal();
        }
        matches!(
            (self, next),
            (Pending, UnderReview)
                | (UnderReview, InterviewScheduled)
                | (UnderReview, Rejected)
                | (InterviewScheduled, Offered)
                | (InterviewScheduled, Rejected)
                | (Offered, Accepted)
                | (Offered, Rejected)
        )
    }

    /// Transitions a student may drive on their own application.
    const fn student_driven(self) -> bool {
        matches!(self, ApplicationStatus::Withdrawn | ApplicationStatus::Accepted)
    }
}

/// Move a match to `next`, stamping the decision time.
pub fn transition_match(
    record: &mut MatchRecord,
    next: MatchStatus,
    now: DateTime<Utc>,
) -> Result<(), EngineError> {
    if !record.status.can_transition_to(next) {
        return Err(EngineError::InvalidTransition(TransitionSubject::Match {
            id: record.id,
            from: record.status,
            to: next,
        }));
    }
    record.status = next;
    record.decided_at = Some(now);
    Ok(())
}

/// Apply a requested application transition on behalf of `actor`.
///
/// `posting_owner` is the department that owns the application's posting.
pub fn transition_application(
    record: &ApplicationRecord,
    request: &TransitionRequest,
    actor: Actor,
    posting_owner: DepartmentId,
    now: DateTime<Utc>,
) -> Result<ApplicationRecord, EngineError> {
    let next = request.status;
    authorize(record, next, actor, posting_owner)?;

    if !record.status.can_transition_to(next) {
        return Err(EngineError::InvalidTransition(
            TransitionSubject::Application {
                id: record.id,
                from: record.status,
                to: next,
            },
        ));
    }

    let mut updated = record.clone();
    updated.status = next;
    updated.updated_at = now;

    match next {
        ApplicationStatus::InterviewScheduled => {
            updated.interview_date = Some(request.interview_at.unwrap_or(now));
        }
        ApplicationStatus::Offered | ApplicationStatus::Rejected | ApplicationStatus::Accepted => {
            updated.response_date = Some(now);
        }
        _ => {}
    }

    if let Some(notes) = &request.department_notes {
        if !matches!(actor, Actor::Student(_)) {
            updated.department_notes = Some(notes.clone());
        }
    }

    Ok(updated)
}

/// Reject an application whose posting stopped taking candidates.
///
/// Closure is engine driven, so the department transition table does not apply.
/// Returns `None` for applications that are already terminal.
pub fn close_application(
    record: &ApplicationRecord,
    now: DateTime<Utc>,
) -> Option<ApplicationRecord> {
    if record.status.is_terminal() {
        return None;
    }
    let mut closed = record.clone();
    closed.status = ApplicationStatus::Rejected;
    closed.updated_at = now;
    closed.response_date = Some(now);
    Some(closed)
}

fn authorize(
    record: &ApplicationRecord,
    next: ApplicationStatus,
    actor: Actor,
    posting_owner: DepartmentId,
) -> Result<(), EngineError> {
    let permitted = match actor {
        Actor::Student(id) => id == record.student_id && next.student_driven(),
        Actor::Department(id) => id == posting_owner && !next.student_driven(),
        Actor::Admin(_) => !next.student_driven(),
    };

    if permitted {
        Ok(())
    } else {
        Err(EngineError::Forbidden(format!(
            "move application {} to {}",
            record.id.0,
            next.label()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::matching::domain::{AdminId, ApplicationId, InternshipId, StudentId};
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, hour, 0, 0).unwrap()
    }

    fn application(status: ApplicationStatus) -> ApplicationRecord {
        ApplicationRecord {
            id: ApplicationId(11),
            student_id: StudentId(1),
            internship_id: InternshipId(2),
            cover_letter: None,
            portfolio_url: None,
            additional_notes: None,
            department_notes: None,
            status,
            applied_at: at(8),
            updated_at: at(8),
            interview_date: None,
            response_date: None,
        }
    }

    const OWNER: DepartmentId = DepartmentId(5);

    #[test]
    fn interview_stamps_requested_date() {
        let request = TransitionRequest {
            status: ApplicationStatus::InterviewScheduled,
            department_notes: Some("panel on Friday".to_string()),
            interview_at: Some(at(15)),
        };
        let updated = transition_application(
            &application(ApplicationStatus::UnderReview),
            &request,
            Actor::Department(OWNER),
            OWNER,
            at(10),
        )
        .expect("transition allowed");
        assert_eq!(updated.interview_date, Some(at(15)));
        assert_eq!(updated.response_date, None);
        assert_eq!(updated.department_notes.as_deref(), Some("panel on Friday"));
        assert_eq!(updated.updated_at, at(10));
    }

    #[test]
    fn offer_and_acceptance_stamp_response_date() {
        let offered = transition_application(
            &application(ApplicationStatus::InterviewScheduled),
            &TransitionRequest::to(ApplicationStatus::Offered),
            Actor::Admin(AdminId(1)),
            OWNER,
            at(11),
        )
        .expect("admin may offer");
        assert_eq!(offered.response_date, Some(at(11)));

        let accepted = transition_application(
            &offered,
            &TransitionRequest::to(ApplicationStatus::Accepted),
            Actor::Student(StudentId(1)),
            OWNER,
            at(12),
        )
        .expect("student accepts");
        assert_eq!(accepted.status, ApplicationStatus::Accepted);
        assert_eq!(accepted.response_date, Some(at(12)));
    }

    #[test]
    fn closing_rejects_open_applications_and_skips_terminal_ones() {
        let closed = close_application(&application(ApplicationStatus::InterviewScheduled), at(13))
            .expect("open application closes");
        assert_eq!(closed.status, ApplicationStatus::Rejected);
        assert_eq!(closed.response_date, Some(at(13)));
        assert_eq!(closed.updated_at, at(13));

        assert_eq!(
            close_application(&application(ApplicationStatus::Withdrawn), at(13)),
            None
        );
    }

    #[test]
    fn backward_and_skip_transitions_are_rejected() {
        for (from, to) in [
            (ApplicationStatus::UnderReview, ApplicationStatus::Pending),
            (ApplicationStatus::Pending, ApplicationStatus::Offered),
            (ApplicationStatus::Offered, ApplicationStatus::InterviewScheduled),
            (ApplicationStatus::Rejected, ApplicationStatus::UnderReview),
        ] {
            match transition_application(
                &application(from),
                &TransitionRequest::to(to),
                Actor::Department(OWNER),
                OWNER,
                at(9),
            ) {
                Err(EngineError::InvalidTransition(_)) => {}
                other => panic!("expected invalid transition {from:?} -> {to:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn withdrawal_allowed_until_terminal() {
        assert!(ApplicationStatus::InterviewScheduled.can_transition_to(ApplicationStatus::Withdrawn));
        assert!(!ApplicationStatus::Accepted.can_transition_to(ApplicationStatus::Withdrawn));
        assert!(!ApplicationStatus::Withdrawn.can_transition_to(ApplicationStatus::Withdrawn));
    }

    #[test]
    fn actors_are_limited_to_their_side_of_the_workflow() {
        let record = application(ApplicationStatus::Pending);
        let review = TransitionRequest::to(ApplicationStatus::UnderReview);

        assert!(matches!(
            transition_application(&record, &review, Actor::Student(StudentId(1)), OWNER, at(9)),
            Err(EngineError::Forbidden(_))
        ));
        assert!(matches!(
            transition_application(
                &record,
                &review,
                Actor::Department(DepartmentId(99)),
                OWNER,
                at(9)
            ),
            Err(EngineError::Forbidden(_))
        ));
        assert!(matches!(
            transition_application(
                &record,
                &TransitionRequest::to(ApplicationStatus::Withdrawn),
                Actor::Student(StudentId(2)),
                OWNER,
                at(9)
            ),
            Err(EngineError::Forbidden(_))
        ));
    }

    #[test]
    fn match_transitions_only_move_forward() {
        assert!(MatchStatus::Offered.can_transition_to(MatchStatus::Accepted));
        assert!(!MatchStatus::Declined.can_transition_to(MatchStatus::Accepted));
        assert!(!MatchStatus::Accepted.can_transition_to(MatchStatus::Offered));
        assert!(!MatchStatus::Expired.can_transition_to(MatchStatus::Offered));
        assert!(MatchStatus::Accepted.is_terminal());
        assert!(!MatchStatus::Expired.is_terminal());
    }
}
