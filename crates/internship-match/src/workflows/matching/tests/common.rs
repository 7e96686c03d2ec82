use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::matching::allocation::{Candidate, SeatCapacity};
use crate::workflows::matching::clock::FixedClock;
use crate::workflows::matching::domain::{
    Department, DepartmentId, Internship, InternshipId, MatchId, MatchStatus, QuotaCategory,
    QuotaTable, SeatKind, Student, StudentId,
};
use crate::workflows::matching::memory::InMemoryStore;
use crate::workflows::matching::repository::{
    MatchDraft, MatchRecord, MatchRepository, ProfileDirectory, RepositoryError, SeatCommit,
    SeatLedger, UpsertOutcome,
};
use crate::workflows::matching::scoring::{EngineConfig, MatchScore};
use crate::workflows::matching::service::MatchingService;

pub(super) const OWNER: DepartmentId = DepartmentId(7);
pub(super) const PUNE_POSTING: InternshipId = InternshipId(100);
pub(super) const REMOTE_POSTING: InternshipId = InternshipId(200);

/// Urban general-category student in Pune; 58.33 overall on the Pune posting.
pub(super) const ASHA: StudentId = StudentId(1);
/// Rural student from Nagpur; 61.67 overall on the Pune posting, holds the rural seat.
pub(super) const BILAL: StudentId = StudentId(2);
/// Strongest general candidate; 72.5 overall on the Pune posting.
pub(super) const CHEN: StudentId = StudentId(3);

pub(super) type MemoryService = MatchingService<InMemoryStore, InMemoryStore, InMemoryStore>;

pub(super) fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, day, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn now() -> DateTime<Utc> {
    at(1, 9)
}

pub(super) fn student(id: StudentId, name: &str, skills: &str, location: &str) -> Student {
    Student {
        id,
        email: format!("{}@example.edu", name.to_lowercase()),
        name: name.to_string(),
        phone: Some("+91-98000-00000".to_string()),
        externally_authenticated: false,
        institution: Some("College of Engineering".to_string()),
        course: Some("B.Tech".to_string()),
        year_of_study: Some(3),
        cgpa: Some(8.0),
        technical_skills: Some(skills.to_string()),
        soft_skills: Some("Communication".to_string()),
        sector_interests: Some("Technology".to_string()),
        preferred_locations: Some(location.to_string()),
        current_location: Some(location.to_string()),
        social_category: Some("General".to_string()),
        district_type: Some("Urban".to_string()),
        home_district: Some("Haveli".to_string()),
        previous_internships: Some(0),
        pm_scheme_participant: Some(false),
        created_at: at(1, 0) - chrono::Duration::days(30) + chrono::Duration::minutes(id.0 as i64),
    }
}

pub(super) fn asha() -> Student {
    student(ASHA, "Asha", "Python, SQL", "Pune, Maharashtra")
}

pub(super) fn bilal() -> Student {
    let mut bilal = student(BILAL, "Bilal", "Python", "Nagpur, Maharashtra");
    bilal.preferred_locations = Some("Nagpur".to_string());
    bilal.cgpa = Some(7.0);
    bilal.district_type = Some("Rural".to_string());
    bilal
}

pub(super) fn chen() -> Student {
    let mut chen = student(CHEN, "Chen", "Python, SQL, AWS", "Pune, Maharashtra");
    chen.cgpa = Some(9.0);
    chen
}

pub(super) fn posting(id: InternshipId, total: u32, quotas: QuotaTable) -> Internship {
    Internship {
        id,
        department_id: OWNER,
        title: "Data Engineering Intern".to_string(),
        sector: Some("Technology".to_string()),
        location: Some("Pune, Maharashtra".to_string()),
        required_skills: Some("Python, SQL, AWS".to_string()),
        preferred_course: None,
        min_cgpa: Some(6.0),
        year_of_study_requirement: None,
        total_positions: total,
        filled_positions: 0,
        quotas,
        is_active: true,
        application_deadline: None,
        created_at: at(1, 0),
    }
}

pub(super) fn pune_posting() -> Internship {
    posting(
        PUNE_POSTING,
        2,
        QuotaTable {
            rural: 1,
            ..QuotaTable::default()
        },
    )
}

pub(super) fn remote_posting() -> Internship {
    let mut remote = posting(REMOTE_POSTING, 1, QuotaTable::default());
    remote.title = "Analytics Intern".to_string();
    remote.location = Some("Remote".to_string());
    remote.required_skills = Some("SQL".to_string());
    remote.min_cgpa = None;
    remote
}

/// Three complete students and the two-seat Pune posting with one rural seat.
pub(super) fn seeded_store() -> Arc<InMemoryStore> {
    let store = InMemoryStore::default();
    for student in [asha(), bilal(), chen()] {
        store.put_student(student).expect("seed student");
    }
    store.put_internship(pune_posting()).expect("seed posting");
    Arc::new(store)
}

pub(super) fn build_service(store: Arc<InMemoryStore>) -> (Arc<MemoryService>, Arc<FixedClock>) {
    let clock = Arc::new(FixedClock::new(now()));
    let service = MatchingService::with_clock(
        store.clone(),
        store.clone(),
        store,
        EngineConfig::default(),
        clock.clone(),
    )
    .expect("default configuration is valid");
    (Arc::new(service), clock)
}

pub(super) fn match_of(
    store: &InMemoryStore,
    student: StudentId,
    internship: InternshipId,
) -> MatchRecord {
    store
        .fetch_pair(student, internship)
        .expect("store reachable")
        .expect("match exists")
}

pub(super) fn filled(store: &InMemoryStore, internship: InternshipId) -> u32 {
    store
        .internship(internship)
        .expect("store reachable")
        .expect("posting exists")
        .filled_positions
}

pub(super) fn score(overall: f64, affirmative_action: f64) -> MatchScore {
    MatchScore {
        skills: overall,
        location: overall,
        academic: overall,
        affirmative_action,
        overall,
    }
}

pub(super) fn candidate(
    id: u64,
    category: Option<QuotaCategory>,
    overall: f64,
    affirmative_action: f64,
) -> Candidate {
    Candidate {
        student_id: StudentId(id),
        category,
        registered_at: at(1, 0),
        score: score(overall, affirmative_action),
    }
}

pub(super) fn capacity(posting: &Internship) -> SeatCapacity {
    SeatCapacity::for_posting(posting, &SeatLedger::seeded(posting)).expect("valid posting")
}

/// Match store whose first seat commit loses to an identical commit applied just before it,
/// as if another request accepted the same offer at the same moment.
/// What lands in the store just before the first seat commit.
#[derive(Clone, Copy)]
enum Race {
    /// The same commit succeeds once, so the real one goes stale.
    DoubleCommit,
    /// A recompute re-issues the offer on a general seat.
    ReissueAsGeneral,
}

pub(super) struct RacingStore {
    pub(super) inner: Arc<InMemoryStore>,
    race: Race,
    raced: AtomicBool,
}

impl RacingStore {
    pub(super) fn new(inner: Arc<InMemoryStore>) -> Self {
        Self {
            inner,
            race: Race::DoubleCommit,
            raced: AtomicBool::new(false),
        }
    }

    pub(super) fn reissuing(inner: Arc<InMemoryStore>) -> Self {
        Self {
            inner,
            race: Race::ReissueAsGeneral,
            raced: AtomicBool::new(false),
        }
    }

    fn interleave(&self, commit: &SeatCommit) -> Result<(), RepositoryError> {
        match self.race {
            Race::DoubleCommit => self.inner.commit_seat(commit.clone()).map(|_| ()),
            Race::ReissueAsGeneral => {
                let record = MatchRepository::fetch(&*self.inner, commit.match_id)?
                    .ok_or(RepositoryError::NotFound)?;
                let draft = MatchDraft {
                    student_id: record.student_id,
                    internship_id: record.internship_id,
                    score: record.score,
                    status: MatchStatus::Offered,
                    seat: Some(SeatKind::General),
                    rank: record.rank,
                };
                self.inner.upsert(draft, record.computed_at).map(|_| ())
            }
        }
    }
}

impl MatchRepository for RacingStore {
    fn fetch(&self, id: MatchId) -> Result<Option<MatchRecord>, RepositoryError> {
        MatchRepository::fetch(&*self.inner, id)
    }

    fn fetch_pair(
        &self,
        student: StudentId,
        internship: InternshipId,
    ) -> Result<Option<MatchRecord>, RepositoryError> {
        self.inner.fetch_pair(student, internship)
    }

    fn upsert(
        &self,
        draft: MatchDraft,
        now: DateTime<Utc>,
    ) -> Result<UpsertOutcome, RepositoryError> {
        self.inner.upsert(draft, now)
    }

    fn update_status(
        &self,
        id: MatchId,
        expected: MatchStatus,
        next: MatchStatus,
        now: DateTime<Utc>,
    ) -> Result<MatchRecord, RepositoryError> {
        self.inner.update_status(id, expected, next, now)
    }

    fn for_student(&self, id: StudentId) -> Result<Vec<MatchRecord>, RepositoryError> {
        MatchRepository::for_student(&*self.inner, id)
    }

    fn for_internship(&self, id: InternshipId) -> Result<Vec<MatchRecord>, RepositoryError> {
        self.inner.for_internship(id)
    }

    fn ledger(&self, id: InternshipId) -> Result<Option<SeatLedger>, RepositoryError> {
        self.inner.ledger(id)
    }

    fn commit_seat(&self, commit: SeatCommit) -> Result<MatchRecord, RepositoryError> {
        if !self.raced.swap(true, Ordering::SeqCst) {
            self.interleave(&commit)?;
        }
        self.inner.commit_seat(commit)
    }
}

pub(super) struct UnavailableDirectory;

impl ProfileDirectory for UnavailableDirectory {
    fn student(&self, _id: StudentId) -> Result<Option<Student>, RepositoryError> {
        Err(RepositoryError::Unavailable("profile store offline".to_string()))
    }

    fn students(&self) -> Result<Vec<Student>, RepositoryError> {
        Err(RepositoryError::Unavailable("profile store offline".to_string()))
    }

    fn internship(&self, _id: InternshipId) -> Result<Option<Internship>, RepositoryError> {
        Err(RepositoryError::Unavailable("profile store offline".to_string()))
    }

    fn internships(&self) -> Result<Vec<Internship>, RepositoryError> {
        Err(RepositoryError::Unavailable("profile store offline".to_string()))
    }

    fn department(&self, _id: DepartmentId) -> Result<Option<Department>, RepositoryError> {
        Err(RepositoryError::Unavailable("profile store offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
