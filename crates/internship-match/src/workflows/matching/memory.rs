//! Mutex-backed store implementing every repository trait, used by the service binary
//! and tests. One lock guards all tables so seat commits are atomic.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::domain::{
    ApplicationId, ApplicationRecord, ApplicationStatus, ApplicationSubmission, Department,
    DepartmentId, Internship, InternshipId, MatchId, MatchStatus, Student, StudentId,
};
use super::repository::{
    ApplicationRepository, MatchDraft, MatchRecord, MatchRepository, ProfileDirectory,
    RepositoryError, SeatCommit, SeatLedger, UpsertOutcome,
};

/// Seed data loaded from JSON.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub departments: Vec<Department>,
    #[serde(default)]
    pub students: Vec<Student>,
    #[serde(default)]
    pub internships: Vec<Internship>,
}

#[derive(Default)]
struct Tables {
    departments: BTreeMap<DepartmentId, Department>,
    students: BTreeMap<StudentId, Student>,
    internships: BTreeMap<InternshipId, Internship>,
    matches: BTreeMap<MatchId, MatchRecord>,
    match_pairs: BTreeMap<(StudentId, InternshipId), MatchId>,
    matches_by_student: BTreeMap<StudentId, BTreeSet<MatchId>>,
    matches_by_internship: BTreeMap<InternshipId, BTreeSet<MatchId>>,
    ledgers: BTreeMap<InternshipId, SeatLedger>,
    applications: BTreeMap<ApplicationId, ApplicationRecord>,
    application_pairs: BTreeMap<(StudentId, InternshipId), ApplicationId>,
    next_match: u64,
    next_application: u64,
}

impl Tables {
    fn collect_matches(&self, ids: Option<&BTreeSet<MatchId>>) -> Vec<MatchRecord> {
        ids.map(|ids| {
            ids.iter()
                .filter_map(|id| self.matches.get(id).cloned())
                .collect()
        })
        .unwrap_or_default()
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn from_fixture(fixture: Fixture) -> Result<Self, RepositoryError> {
        let store = Self::default();
        for department in fixture.departments {
            store.put_department(department)?;
        }
        for student in fixture.students {
            store.put_student(student)?;
        }
        for internship in fixture.internships {
            store.put_internship(internship)?;
        }
        Ok(store)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
    }

    pub fn put_department(&self, department: Department) -> Result<(), RepositoryError> {
        let mut tables = self.lock()?;
        tables.departments.insert(department.id, department);
        Ok(())
    }

    /// Insert or replace a student; emails stay unique across students.
    pub fn put_student(&self, student: Student) -> Result<(), RepositoryError> {
        let mut tables = self.lock()?;
        let email = student.email.trim().to_lowercase();
        let taken = tables
            .students
            .values()
            .any(|other| other.id != student.id && other.email.trim().to_lowercase() == email);
        if taken {
            return Err(RepositoryError::Conflict);
        }
        tables.students.insert(student.id, student);
        Ok(())
    }

    pub fn put_internship(&self, internship: Internship) -> Result<(), RepositoryError> {
        let mut tables = self.lock()?;
        tables.internships.insert(internship.id, internship);
        Ok(())
    }
}

impl ProfileDirectory for InMemoryStore {
    fn student(&self, id: StudentId) -> Result<Option<Student>, RepositoryError> {
        Ok(self.lock()?.students.get(&id).cloned())
    }

    fn students(&self) -> Result<Vec<Student>, RepositoryError> {
        Ok(self.lock()?.students.values().cloned().collect())
    }

    fn internship(&self, id: InternshipId) -> Result<Option<Internship>, RepositoryError> {
        Ok(self.lock()?.internships.get(&id).cloned())
    }

    fn internships(&self) -> Result<Vec<Internship>, RepositoryError> {
        Ok(self.lock()?.internships.values().cloned().collect())
    }

    fn department(&self, id: DepartmentId) -> Result<Option<Department>, RepositoryError> {
        Ok(self.lock()?.departments.get(&id).cloned())
    }
}

impl MatchRepository for InMemoryStore {
    fn fetch(&self, id: MatchId) -> Result<Option<MatchRecord>, RepositoryError> {
        Ok(self.lock()?.matches.get(&id).cloned())
    }

    fn fetch_pair(
        &self,
        student: StudentId,
        internship: InternshipId,
    ) -> Result<Option<MatchRecord>, RepositoryError> {
        let tables = self.lock()?;
        Ok(tables
            .match_pairs
            .get(&(student, internship))
            .and_then(|id| tables.matches.get(id))
            .cloned())
    }

    fn upsert(
        &self,
        draft: MatchDraft,
        now: DateTime<Utc>,
    ) -> Result<UpsertOutcome, RepositoryError> {
        let mut tables = self.lock()?;
        let key = (draft.student_id, draft.internship_id);

        if let Some(id) = tables.match_pairs.get(&key).copied() {
            let existing = tables.matches.get_mut(&id).ok_or(RepositoryError::NotFound)?;
            if existing.status.is_terminal() {
                return Ok(UpsertOutcome::Skipped(existing.clone()));
            }
            if existing.agrees_with(&draft) {
                return Ok(UpsertOutcome::Unchanged(existing.clone()));
            }
            if existing.status != draft.status {
                existing.decided_at = Some(now);
            }
            existing.score = draft.score;
            existing.status = draft.status;
            existing.seat = draft.seat;
            existing.rank = draft.rank;
            existing.computed_at = now;
            return Ok(UpsertOutcome::Updated(existing.clone()));
        }

        tables.next_match += 1;
        let id = MatchId(tables.next_match);
        let record = MatchRecord {
            id,
            student_id: draft.student_id,
            internship_id: draft.internship_id,
            score: draft.score,
            status: draft.status,
            seat: draft.seat,
            rank: draft.rank,
            computed_at: now,
            decided_at: (draft.status != MatchStatus::Pending).then_some(now),
        };
        tables.match_pairs.insert(key, id);
        tables
            .matches_by_student
            .entry(draft.student_id)
            .or_default()
            .insert(id);
        tables
            .matches_by_internship
            .entry(draft.internship_id)
            .or_default()
            .insert(id);
        tables.matches.insert(id, record.clone());
        Ok(UpsertOutcome::Created(record))
    }

    fn update_status(
        &self,
        id: MatchId,
        expected: MatchStatus,
        next: MatchStatus,
        now: DateTime<Utc>,
    ) -> Result<MatchRecord, RepositoryError> {
        let mut tables = self.lock()?;
        let record = tables.matches.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        if record.status != expected {
            return Err(RepositoryError::Stale);
        }
        record.status = next;
        record.decided_at = Some(now);
        Ok(record.clone())
    }

    fn for_student(&self, id: StudentId) -> Result<Vec<MatchRecord>, RepositoryError> {
        let tables = self.lock()?;
        Ok(tables.collect_matches(tables.matches_by_student.get(&id)))
    }

    fn for_internship(&self, id: InternshipId) -> Result<Vec<MatchRecord>, RepositoryError> {
        let tables = self.lock()?;
        Ok(tables.collect_matches(tables.matches_by_internship.get(&id)))
    }

    fn ledger(&self, id: InternshipId) -> Result<Option<SeatLedger>, RepositoryError> {
        Ok(self.lock()?.ledgers.get(&id).cloned())
    }

    fn commit_seat(&self, commit: SeatCommit) -> Result<MatchRecord, RepositoryError> {
        let mut tables = self.lock()?;
        let internship_id = commit.ledger.internship_id;

        let current_version = tables
            .ledgers
            .get(&internship_id)
            .map(|ledger| ledger.version)
            .unwrap_or(0);
        if current_version != commit.expected_version {
            return Err(RepositoryError::Stale);
        }

        let record = tables
            .matches
            .get(&commit.match_id)
            .ok_or(RepositoryError::NotFound)?;
        if record.status != commit.expected_status
            || record.seat != commit.expected_seat
            || record.internship_id != internship_id
        {
            return Err(RepositoryError::Stale);
        }

        let filled = commit.ledger.filled;
        tables.ledgers.insert(internship_id, commit.ledger);
        if let Some(internship) = tables.internships.get_mut(&internship_id) {
            internship.filled_positions = filled;
        }

        let record = tables
            .matches
            .get_mut(&commit.match_id)
            .ok_or(RepositoryError::NotFound)?;
        record.status = commit.next_status;
        record.decided_at = Some(commit.decided_at);
        Ok(record.clone())
    }
}

impl ApplicationRepository for InMemoryStore {
    fn insert(
        &self,
        submission: &ApplicationSubmission,
        now: DateTime<Utc>,
    ) -> Result<ApplicationRecord, RepositoryError> {
        let mut tables = self.lock()?;
        let key = (submission.student_id, submission.internship_id);
        if tables.application_pairs.contains_key(&key) {
            return Err(RepositoryError::Conflict);
        }

        tables.next_application += 1;
        let record = ApplicationRecord {
            id: ApplicationId(tables.next_application),
            student_id: submission.student_id,
            internship_id: submission.internship_id,
            cover_letter: submission.cover_letter.clone(),
            portfolio_url: submission.portfolio_url.clone(),
            additional_notes: submission.additional_notes.clone(),
            department_notes: None,
            status: ApplicationStatus::Pending,
            applied_at: now,
            updated_at: now,
            interview_date: None,
            response_date: None,
        };
        tables.application_pairs.insert(key, record.id);
        tables.applications.insert(record.id, record.clone());
        Ok(record)
    }

    fn fetch(&self, id: ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Ok(self.lock()?.applications.get(&id).cloned())
    }

    fn update(
        &self,
        record: ApplicationRecord,
        expected: ApplicationStatus,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.lock()?;
        let stored = tables
            .applications
            .get_mut(&record.id)
            .ok_or(RepositoryError::NotFound)?;
        if stored.status != expected {
            return Err(RepositoryError::Stale);
        }
        *stored = record;
        Ok(())
    }

    fn for_student(&self, id: StudentId) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        Ok(self
            .lock()?
            .applications
            .values()
            .filter(|record| record.student_id == id)
            .cloned()
            .collect())
    }

    fn for_internship(
        &self,
        id: InternshipId,
    ) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        Ok(self
            .lock()?
            .applications
            .values()
            .filter(|record| record.internship_id == id)
            .cloned()
            .collect())
    }
}
