use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    ApplicationId, ApplicationRecord, ApplicationStatus, ApplicationSubmission, Department,
    DepartmentId, Internship, InternshipId, MatchId, MatchStatus, QuotaCategory, SeatKind,
    Student, StudentId,
};
use super::scoring::MatchScore;

/// Persisted engine output for one (student, posting) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: MatchId,
    pub student_id: StudentId,
    pub internship_id: InternshipId,
    pub score: MatchScore,
    pub status: MatchStatus,
    pub seat: Option<SeatKind>,
    pub rank: Option<u32>,
    pub computed_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

impl MatchRecord {
    /// Whether a fresh draft would leave this row as it is.
    pub fn agrees_with(&self, draft: &MatchDraft) -> bool {
        self.score == draft.score
            && self.status == draft.status
            && self.seat == draft.seat
            && self.rank == draft.rank
    }
}

/// Recompute output keyed by pair; the repository assigns the id on first write.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchDraft {
    pub student_id: StudentId,
    pub internship_id: InternshipId,
    pub score: MatchScore,
    pub status: MatchStatus,
    pub seat: Option<SeatKind>,
    pub rank: Option<u32>,
}

/// Result of writing a draft.
#[derive(Debug, Clone, PartialEq)]
pub enum UpsertOutcome {
    Created(MatchRecord),
    Updated(MatchRecord),
    Unchanged(MatchRecord),
    /// The stored row is terminal and was left untouched.
    Skipped(MatchRecord),
}

/// Versioned seat counters for one posting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatLedger {
    pub internship_id: InternshipId,
    pub version: u64,
    pub filled: u32,
    pub reserved: BTreeMap<QuotaCategory, u32>,
}

impl SeatLedger {
    /// Initial ledger for a posting nobody has accepted through the engine yet.
    pub fn seeded(posting: &Internship) -> Self {
        Self {
            internship_id: posting.id,
            version: 0,
            filled: posting.filled_positions,
            reserved: BTreeMap::new(),
        }
    }

    pub fn reserved_filled(&self, category: QuotaCategory) -> u32 {
        self.reserved.get(&category).copied().unwrap_or(0)
    }
}

/// Atomic status change plus ledger replacement, guarded by ledger version and the
/// match's status and seat kind.
#[derive(Debug, Clone, PartialEq)]
pub struct SeatCommit {
    pub match_id: MatchId,
    pub expected_status: MatchStatus,
    /// Seat the ledger delta was computed for.
    pub expected_seat: Option<SeatKind>,
    pub next_status: MatchStatus,
    pub expected_version: u64,
    pub ledger: SeatLedger,
    pub decided_at: DateTime<Utc>,
}

/// Read models for students and postings, owned by the outer CRUD layer.
pub trait ProfileDirectory: Send + Sync {
    fn student(&self, id: StudentId) -> Result<Option<Student>, RepositoryError>;
    fn students(&self) -> Result<Vec<Student>, RepositoryError>;
    fn internship(&self, id: InternshipId) -> Result<Option<Internship>, RepositoryError>;
    fn internships(&self) -> Result<Vec<Internship>, RepositoryError>;
    fn department(&self, id: DepartmentId) -> Result<Option<Department>, RepositoryError>;
}

/// Storage for match rows and seat ledgers.
pub trait MatchRepository: Send + Sync {
    fn fetch(&self, id: MatchId) -> Result<Option<MatchRecord>, RepositoryError>;
    fn fetch_pair(
        &self,
        student: StudentId,
        internship: InternshipId,
    ) -> Result<Option<MatchRecord>, RepositoryError>;
    /// Insert or overwrite the row for the draft's pair; terminal rows are skipped.
    fn upsert(&self, draft: MatchDraft, now: DateTime<Utc>)
        -> Result<UpsertOutcome, RepositoryError>;
    /// Compare-and-set status change; `Stale` when the stored status is not `expected`.
    fn update_status(
        &self,
        id: MatchId,
        expected: MatchStatus,
        next: MatchStatus,
        now: DateTime<Utc>,
    ) -> Result<MatchRecord, RepositoryError>;
    fn for_student(&self, id: StudentId) -> Result<Vec<MatchRecord>, RepositoryError>;
    fn for_internship(&self, id: InternshipId) -> Result<Vec<MatchRecord>, RepositoryError>;
    fn ledger(&self, id: InternshipId) -> Result<Option<SeatLedger>, RepositoryError>;
    /// Apply a seat commit atomically; `Stale` when the version or status moved.
    fn commit_seat(&self, commit: SeatCommit) -> Result<MatchRecord, RepositoryError>;
}

/// Storage for student-initiated applications.
pub trait ApplicationRepository: Send + Sync {
    /// `Conflict` when the pair already has an application.
    fn insert(
        &self,
        submission: &ApplicationSubmission,
        now: DateTime<Utc>,
    ) -> Result<ApplicationRecord, RepositoryError>;
    fn fetch(&self, id: ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError>;
    /// Replace the row if its stored status still equals `expected`.
    fn update(
        &self,
        record: ApplicationRecord,
        expected: ApplicationStatus,
    ) -> Result<(), RepositoryError>;
    fn for_student(&self, id: StudentId) -> Result<Vec<ApplicationRecord>, RepositoryError>;
    fn for_internship(&self, id: InternshipId)
        -> Result<Vec<ApplicationRecord>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("record changed since it was read")]
    Stale,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
