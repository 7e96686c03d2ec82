use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::allocation::{
    scaled_quotas, AllocationDecision, Allocator, Candidate, Decision, SeatCapacity,
};
use super::clock::{Clock, SystemClock};
use super::completeness::{self, CompletenessReport};
use super::domain::{
    Actor, ApplicationId, ApplicationRecord, ApplicationSubmission, Internship, InternshipId,
    ApplicationStatus, MatchId, MatchStatus, QuotaCategory, SeatKind, Student, StudentId,
    TransitionRequest,
};
use super::error::{EngineError, TransitionSubject, ValidationError};
use super::lifecycle::{close_application, transition_application, transition_match};
use super::repository::{
    ApplicationRepository, MatchDraft, MatchRecord, MatchRepository, ProfileDirectory,
    RepositoryError, SeatCommit, SeatLedger, UpsertOutcome,
};
use super::scoring::{EngineConfig, MatchScore, ScoreEngine};

/// Attempts made for a compare-and-commit before reporting a conflict.
const COMMIT_ATTEMPTS: usize = 2;

/// Counts reported by every recompute entry point.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecomputeSummary {
    pub postings: u32,
    pub created: u32,
    pub updated: u32,
    pub unchanged: u32,
    /// Pairs whose match is already terminal.
    pub skipped: u32,
    pub expired: u32,
    pub excluded: u32,
    /// Applications rejected because their posting closed.
    pub applications_closed: u32,
    pub failures: Vec<PostingFailure>,
}

impl RecomputeSummary {
    pub fn absorb(&mut self, other: RecomputeSummary) {
        self.postings += other.postings;
        self.created += other.created;
        self.updated += other.updated;
        self.unchanged += other.unchanged;
        self.skipped += other.skipped;
        self.expired += other.expired;
        self.excluded += other.excluded;
        self.applications_closed += other.applications_closed;
        self.failures.extend(other.failures);
    }

    fn record(&mut self, outcome: &UpsertOutcome) {
        match outcome {
            UpsertOutcome::Created(_) => self.created += 1,
            UpsertOutcome::Updated(_) => self.updated += 1,
            UpsertOutcome::Unchanged(_) => self.unchanged += 1,
            UpsertOutcome::Skipped(_) => self.skipped += 1,
        }
    }
}

/// A posting whose allocation could not be completed during a multi-posting run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostingFailure {
    pub internship_id: Option<InternshipId>,
    pub error: String,
}

/// Dashboard row for a posting's candidate list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCandidate {
    pub rank: u32,
    pub student: Student,
    pub category: Option<QuotaCategory>,
    pub score: MatchScore,
}

struct Pool {
    students: HashMap<StudentId, Student>,
    candidates: Vec<Candidate>,
    excluded: u32,
}

/// Service composing scoring, allocation, and lifecycle persistence.
pub struct MatchingService<D, M, A> {
    directory: Arc<D>,
    matches: Arc<M>,
    applications: Arc<A>,
    clock: Arc<dyn Clock>,
    config: RwLock<Arc<EngineConfig>>,
    posting_locks: Mutex<HashMap<InternshipId, Arc<Mutex<()>>>>,
}

impl<D, M, A> MatchingService<D, M, A>
where
    D: ProfileDirectory + 'static,
    M: MatchRepository + 'static,
    A: ApplicationRepository + 'static,
{
    pub fn new(
        directory: Arc<D>,
        matches: Arc<M>,
        applications: Arc<A>,
        config: EngineConfig,
    ) -> Result<Self, ValidationError> {
        Self::with_clock(directory, matches, applications, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        directory: Arc<D>,
        matches: Arc<M>,
        applications: Arc<A>,
        config: EngineConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ValidationError> {
        config.validate()?;
        Ok(Self {
            directory,
            matches,
            applications,
            clock,
            config: RwLock::new(Arc::new(config)),
            posting_locks: Mutex::new(HashMap::new()),
        })
    }

    /// The configuration a new invocation would run with.
    pub fn config(&self) -> Arc<EngineConfig> {
        match self.config.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Swap in a new configuration. Runs already in flight keep their snapshot.
    pub fn reconfigure(&self, config: EngineConfig) -> Result<(), ValidationError> {
        config.validate()?;
        let next = Arc::new(config);
        match self.config.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
        info!("engine configuration replaced");
        Ok(())
    }

    pub fn evaluate_completeness(
        &self,
        student_id: StudentId,
    ) -> Result<CompletenessReport, EngineError> {
        let student = self.load_student(student_id)?;
        Ok(completeness::evaluate(&student))
    }

    /// Re-run the allocation of one posting and persist its decisions.
    pub fn recompute_for_posting(
        &self,
        internship_id: InternshipId,
    ) -> Result<RecomputeSummary, EngineError> {
        let config = self.config();
        self.allocate_posting(&config, internship_id, self.clock.now())
    }

    /// Re-run every posting the student competes in or already holds a match on.
    pub fn recompute_for_student(
        &self,
        student_id: StudentId,
    ) -> Result<RecomputeSummary, EngineError> {
        let config = self.config();
        let now = self.clock.now();
        let student = self.load_student(student_id)?;
        student.validate()?;

        let engine = ScoreEngine::new((*config).clone());
        let held: BTreeSet<InternshipId> = self
            .matches
            .for_student(student_id)?
            .into_iter()
            .map(|record| record.internship_id)
            .collect();

        let postings: Vec<InternshipId> = self
            .directory
            .internships()?
            .into_iter()
            .filter(|posting| {
                held.contains(&posting.id) || engine.screen(&student, posting, now).is_ok()
            })
            .map(|posting| posting.id)
            .collect();

        let summary = self.run_isolated(&config, &postings, now);
        info!(
            student = student_id.0,
            postings = summary.postings,
            created = summary.created,
            updated = summary.updated,
            failures = summary.failures.len(),
            "student recompute finished"
        );
        Ok(summary)
    }

    /// Re-run every posting. A failing posting never aborts the rest of the run.
    pub fn recompute_all(&self) -> Result<RecomputeSummary, EngineError> {
        let config = self.config();
        let now = self.clock.now();
        let postings = self.posting_ids()?;

        let summary = self.run_isolated(&config, &postings, now);
        info!(
            postings = summary.postings,
            created = summary.created,
            updated = summary.updated,
            unchanged = summary.unchanged,
            skipped = summary.skipped,
            expired = summary.expired,
            applications_closed = summary.applications_closed,
            failures = summary.failures.len(),
            "batch recompute finished"
        );
        Ok(summary)
    }

    pub fn posting_ids(&self) -> Result<Vec<InternshipId>, EngineError> {
        Ok(self
            .directory
            .internships()?
            .into_iter()
            .map(|posting| posting.id)
            .collect())
    }

    fn run_isolated(
        &self,
        config: &EngineConfig,
        postings: &[InternshipId],
        now: DateTime<Utc>,
    ) -> RecomputeSummary {
        let mut summary = RecomputeSummary::default();
        for internship_id in postings {
            match self.allocate_posting(config, *internship_id, now) {
                Ok(posting_summary) => summary.absorb(posting_summary),
                Err(err) => {
                    warn!(internship = internship_id.0, error = %err, "posting recompute failed");
                    summary.failures.push(PostingFailure {
                        internship_id: Some(*internship_id),
                        error: err.to_string(),
                    });
                }
            }
        }
        summary
    }

    fn posting_lock(&self, internship_id: InternshipId) -> Arc<Mutex<()>> {
        let mut locks = match self.posting_locks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Arc::clone(locks.entry(internship_id).or_default())
    }

    fn allocate_posting(
        &self,
        config: &EngineConfig,
        internship_id: InternshipId,
        now: DateTime<Utc>,
    ) -> Result<RecomputeSummary, EngineError> {
        let lock = self.posting_lock(internship_id);
        let _serialized = match lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let posting = self.load_internship(internship_id)?;
        posting.validate()?;
        let existing = self.matches.for_internship(internship_id)?;

        let mut summary = RecomputeSummary {
            postings: 1,
            ..RecomputeSummary::default()
        };

        let department_active = self.department_active(&posting)?;
        if !department_active || !posting.is_open(now) {
            let deactivated = !department_active || !posting.is_active;
            summary.expired = self.expire_live(&existing, &BTreeSet::new(), now);
            summary.applications_closed =
                self.close_applications(internship_id, deactivated, now)?;
            debug!(
                internship = internship_id.0,
                expired = summary.expired,
                applications_closed = summary.applications_closed,
                "posting closed; live matches expired"
            );
            return Ok(summary);
        }

        let ledger = self.ledger_for(&posting)?;
        let capacity = SeatCapacity::for_posting(&posting, &ledger)?;
        let engine = ScoreEngine::new(config.clone());

        let settled: BTreeSet<StudentId> = existing
            .iter()
            .filter(|record| record.status.is_terminal())
            .map(|record| record.student_id)
            .collect();
        let pool = self.build_pool(&engine, &posting, &capacity, &settled, now)?;
        summary.excluded = pool.excluded;

        let decisions = Allocator::new(config.waitlist_margin).allocate(&capacity, pool.candidates);
        let mut decided = BTreeSet::new();
        for decision in &decisions {
            decided.insert(decision.student_id);
            let outcome = self.matches.upsert(draft_for(internship_id, decision), now)?;
            if let UpsertOutcome::Skipped(record) = &outcome {
                debug!(
                    match_id = record.id.0,
                    status = record.status.label(),
                    "terminal match left untouched"
                );
            }
            summary.record(&outcome);
        }

        summary.expired = self.expire_live(&existing, &decided, now);

        info!(
            internship = internship_id.0,
            candidates = decisions.len(),
            open_seats = capacity.open_seats,
            created = summary.created,
            updated = summary.updated,
            unchanged = summary.unchanged,
            skipped = summary.skipped,
            expired = summary.expired,
            excluded = summary.excluded,
            "posting allocation persisted"
        );
        Ok(summary)
    }

    /// Expire live matches whose student is not in `keep`.
    fn expire_live(
        &self,
        existing: &[MatchRecord],
        keep: &BTreeSet<StudentId>,
        now: DateTime<Utc>,
    ) -> u32 {
        let mut expired = 0;
        for record in existing {
            if !record.status.is_live() || keep.contains(&record.student_id) {
                continue;
            }
            match self
                .matches
                .update_status(record.id, record.status, MatchStatus::Expired, now)
            {
                Ok(_) => expired += 1,
                Err(err) => warn!(
                    match_id = record.id.0,
                    error = %err,
                    "could not expire match; it changed concurrently"
                ),
            }
        }
        expired
    }

    /// Reject the applications a closed posting can no longer decide on.
    ///
    /// A passed deadline only stops intake, so applications already under review
    /// survive it; a deactivated posting closes every open application.
    fn close_applications(
        &self,
        internship_id: InternshipId,
        deactivated: bool,
        now: DateTime<Utc>,
    ) -> Result<u32, EngineError> {
        let mut closed = 0;
        for record in self.applications.for_internship(internship_id)? {
            if !deactivated && record.status != ApplicationStatus::Pending {
                continue;
            }
            let Some(rejected) = close_application(&record, now) else {
                continue;
            };
            match self.applications.update(rejected, record.status) {
                Ok(()) => closed += 1,
                Err(RepositoryError::Stale) => debug!(
                    application = record.id.0,
                    "application moved before the posting closed it"
                ),
                Err(err) => return Err(err.into()),
            }
        }
        Ok(closed)
    }

    /// Postings of an inactive department stop matching; an unknown department is
    /// owned outside the directory and counts as active.
    fn department_active(&self, posting: &Internship) -> Result<bool, EngineError> {
        Ok(self
            .directory
            .department(posting.department_id)?
            .map(|department| department.is_active)
            .unwrap_or(true))
    }

    fn posting_open(&self, posting: &Internship, now: DateTime<Utc>) -> Result<bool, EngineError> {
        Ok(posting.is_open(now) && self.department_active(posting)?)
    }

    fn build_pool(
        &self,
        engine: &ScoreEngine,
        posting: &Internship,
        capacity: &SeatCapacity,
        settled: &BTreeSet<StudentId>,
        now: DateTime<Utc>,
    ) -> Result<Pool, EngineError> {
        let mut pool = Pool {
            students: HashMap::new(),
            candidates: Vec::new(),
            excluded: 0,
        };

        for student in self.directory.students()? {
            if settled.contains(&student.id) {
                continue;
            }
            if let Err(err) = student.validate() {
                warn!(student = student.id.0, error = %err, "invalid student profile skipped");
                pool.excluded += 1;
                continue;
            }
            if let Err(exclusion) = engine.screen(&student, posting, now) {
                debug!(
                    student = student.id.0,
                    internship = posting.id.0,
                    ?exclusion,
                    "student excluded from candidate pool"
                );
                pool.excluded += 1;
                continue;
            }

            pool.candidates.push(Candidate {
                student_id: student.id,
                category: student.reservation_category(),
                registered_at: student.created_at,
                score: engine.score(&student, posting, capacity),
            });
            pool.students.insert(student.id, student);
        }

        Ok(pool)
    }

    pub fn list_matches_for_student(
        &self,
        student_id: StudentId,
    ) -> Result<Vec<MatchRecord>, EngineError> {
        self.load_student(student_id)?;
        let mut records = self.matches.for_student(student_id)?;
        records.sort_by(|a, b| {
            b.score
                .overall
                .total_cmp(&a.score.overall)
                .then_with(|| a.internship_id.cmp(&b.internship_id))
        });
        Ok(records)
    }

    /// Eligible candidates for a posting in allocation order. Read only.
    pub fn list_candidates_for_posting(
        &self,
        internship_id: InternshipId,
    ) -> Result<Vec<RankedCandidate>, EngineError> {
        let config = self.config();
        let now = self.clock.now();
        let posting = self.load_internship(internship_id)?;
        posting.validate()?;
        if !self.posting_open(&posting, now)? {
            return Ok(Vec::new());
        }

        let ledger = self.ledger_for(&posting)?;
        let capacity = SeatCapacity::for_posting(&posting, &ledger)?;
        let engine = ScoreEngine::new((*config).clone());
        let settled: BTreeSet<StudentId> = self
            .matches
            .for_internship(internship_id)?
            .into_iter()
            .filter(|record| record.status.is_terminal())
            .map(|record| record.student_id)
            .collect();

        let Pool {
            mut students,
            mut candidates,
            ..
        } = self.build_pool(&engine, &posting, &capacity, &settled, now)?;
        super::allocation::rank(&mut candidates);

        Ok(candidates
            .into_iter()
            .enumerate()
            .filter_map(|(index, candidate)| {
                students
                    .remove(&candidate.student_id)
                    .map(|student| RankedCandidate {
                        rank: index as u32 + 1,
                        student,
                        category: candidate.category,
                        score: candidate.score,
                    })
            })
            .collect())
    }

    /// Accept an offered match, consuming one seat on the posting.
    pub fn accept_offer(&self, match_id: MatchId, actor: Actor) -> Result<MatchRecord, EngineError> {
        let mut reason = String::new();

        for attempt in 0..COMMIT_ATTEMPTS {
            let now = self.clock.now();
            let record = self.load_match(match_id)?;
            authorize_match(&record, actor, "accept")?;

            match record.status {
                MatchStatus::Offered => {}
                MatchStatus::Accepted => {
                    return Err(EngineError::ConcurrencyConflict {
                        subject: format!("match {}", match_id.0),
                        reason: "offer was already accepted".to_string(),
                    })
                }
                other => {
                    return Err(EngineError::InvalidTransition(TransitionSubject::Match {
                        id: match_id,
                        from: other,
                        to: MatchStatus::Accepted,
                    }))
                }
            }

            let posting = self.load_internship(record.internship_id)?;
            if !self.posting_open(&posting, now)? {
                if let Err(err) = self.matches.update_status(
                    match_id,
                    MatchStatus::Offered,
                    MatchStatus::Expired,
                    now,
                ) {
                    debug!(match_id = match_id.0, error = %err, "lapsed offer already moved");
                }
                return Err(EngineError::InvalidTransition(TransitionSubject::Match {
                    id: match_id,
                    from: MatchStatus::Expired,
                    to: MatchStatus::Accepted,
                }));
            }

            let ledger = self.ledger_for(&posting)?;
            let next = match claim_seat(&posting, &ledger, record.seat)? {
                Ok(next) => next,
                Err(full) => {
                    warn!(match_id = match_id.0, attempt, reason = full, "no seat to claim");
                    reason = full.to_string();
                    continue;
                }
            };

            let commit = SeatCommit {
                match_id,
                expected_status: MatchStatus::Offered,
                expected_seat: record.seat,
                next_status: MatchStatus::Accepted,
                expected_version: ledger.version,
                ledger: next,
                decided_at: now,
            };
            match self.matches.commit_seat(commit) {
                Ok(accepted) => {
                    info!(
                        match_id = match_id.0,
                        internship = accepted.internship_id.0,
                        "offer accepted"
                    );
                    return Ok(accepted);
                }
                Err(RepositoryError::Stale) => {
                    warn!(match_id = match_id.0, attempt, "seat commit raced; retrying");
                    reason = "seat counters changed before commit".to_string();
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(EngineError::ConcurrencyConflict {
            subject: format!("match {}", match_id.0),
            reason,
        })
    }

    /// Decline an offered match. Offers hold no seat, so the ledger is untouched.
    pub fn decline_offer(&self, match_id: MatchId, actor: Actor) -> Result<MatchRecord, EngineError> {
        for attempt in 0..COMMIT_ATTEMPTS {
            let record = self.load_match(match_id)?;
            authorize_match(&record, actor, "decline")?;
            let now = self.clock.now();
            let mut declined = record.clone();
            transition_match(&mut declined, MatchStatus::Declined, now)?;

            match self
                .matches
                .update_status(match_id, record.status, declined.status, now)
            {
                Ok(declined) => {
                    info!(match_id = match_id.0, "offer declined");
                    return Ok(declined);
                }
                Err(RepositoryError::Stale) => {
                    warn!(match_id = match_id.0, attempt, "decline raced; retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(EngineError::ConcurrencyConflict {
            subject: format!("match {}", match_id.0),
            reason: "match status changed before commit".to_string(),
        })
    }

    /// Expire offers on postings that closed or passed their deadline.
    pub fn expire_lapsed_offers(&self) -> Result<u32, EngineError> {
        let now = self.clock.now();
        let mut expired = 0;
        for posting in self.directory.internships()? {
            if self.posting_open(&posting, now)? {
                continue;
            }
            for record in self.matches.for_internship(posting.id)? {
                if record.status != MatchStatus::Offered {
                    continue;
                }
                match self.matches.update_status(
                    record.id,
                    MatchStatus::Offered,
                    MatchStatus::Expired,
                    now,
                ) {
                    Ok(_) => expired += 1,
                    Err(RepositoryError::Stale) => {}
                    Err(err) => return Err(err.into()),
                }
            }
        }
        if expired > 0 {
            info!(expired, "lapsed offers expired");
        }
        Ok(expired)
    }

    /// Manual application; completeness is not required.
    pub fn submit_application(
        &self,
        submission: ApplicationSubmission,
        actor: Actor,
    ) -> Result<ApplicationRecord, EngineError> {
        let permitted = match actor {
            Actor::Student(id) => id == submission.student_id,
            Actor::Admin(_) => true,
            Actor::Department(_) => false,
        };
        if !permitted {
            return Err(EngineError::Forbidden(
                "submit an application for another student".to_string(),
            ));
        }

        let now = self.clock.now();
        self.load_student(submission.student_id)?;
        let posting = self.load_internship(submission.internship_id)?;
        if !self.posting_open(&posting, now)? {
            return Err(ValidationError::PostingClosed {
                internship: posting.id,
            }
            .into());
        }

        match self.applications.insert(&submission, now) {
            Ok(record) => {
                info!(
                    application = record.id.0,
                    student = record.student_id.0,
                    internship = record.internship_id.0,
                    "application submitted"
                );
                Ok(record)
            }
            Err(RepositoryError::Conflict) => Err(EngineError::DuplicateApplication {
                student: submission.student_id,
                internship: submission.internship_id,
            }),
            Err(err) => Err(err.into()),
        }
    }

    pub fn record_application_transition(
        &self,
        application_id: ApplicationId,
        request: TransitionRequest,
        actor: Actor,
    ) -> Result<ApplicationRecord, EngineError> {
        for attempt in 0..COMMIT_ATTEMPTS {
            let record = self
                .applications
                .fetch(application_id)?
                .ok_or_else(|| EngineError::not_found_application(application_id))?;
            let posting = self.load_internship(record.internship_id)?;
            let updated = transition_application(
                &record,
                &request,
                actor,
                posting.department_id,
                self.clock.now(),
            )?;

            match self.applications.update(updated.clone(), record.status) {
                Ok(()) => {
                    info!(
                        application = application_id.0,
                        from = record.status.label(),
                        to = updated.status.label(),
                        "application transitioned"
                    );
                    return Ok(updated);
                }
                Err(RepositoryError::Stale) => {
                    warn!(application = application_id.0, attempt, "transition raced; retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(EngineError::ConcurrencyConflict {
            subject: format!("application {}", application_id.0),
            reason: "status changed before commit".to_string(),
        })
    }

    pub fn applications_for_student(
        &self,
        student_id: StudentId,
    ) -> Result<Vec<ApplicationRecord>, EngineError> {
        self.load_student(student_id)?;
        Ok(self.applications.for_student(student_id)?)
    }

    fn ledger_for(&self, posting: &Internship) -> Result<SeatLedger, EngineError> {
        Ok(self
            .matches
            .ledger(posting.id)?
            .unwrap_or_else(|| SeatLedger::seeded(posting)))
    }

    fn load_student(&self, id: StudentId) -> Result<Student, EngineError> {
        self.directory
            .student(id)?
            .ok_or_else(|| EngineError::not_found_student(id))
    }

    fn load_internship(&self, id: InternshipId) -> Result<Internship, EngineError> {
        self.directory
            .internship(id)?
            .ok_or_else(|| EngineError::not_found_internship(id))
    }

    fn load_match(&self, id: MatchId) -> Result<MatchRecord, EngineError> {
        self.matches
            .fetch(id)?
            .ok_or_else(|| EngineError::not_found_match(id))
    }
}

fn draft_for(internship_id: InternshipId, decision: &AllocationDecision) -> MatchDraft {
    let (status, seat) = match decision.decision {
        Decision::Offered(seat) => (MatchStatus::Offered, Some(seat)),
        Decision::Waitlisted => (MatchStatus::Waitlisted, None),
        Decision::Rejected => (MatchStatus::Rejected, None),
    };
    MatchDraft {
        student_id: decision.student_id,
        internship_id,
        score: decision.score,
        status,
        seat,
        rank: Some(decision.rank),
    }
}

fn authorize_match(record: &MatchRecord, actor: Actor, verb: &str) -> Result<(), EngineError> {
    match actor {
        Actor::Student(id) if id == record.student_id => Ok(()),
        Actor::Admin(_) => Ok(()),
        _ => Err(EngineError::Forbidden(format!("{verb} match {}", record.id.0))),
    }
}

/// Next ledger after claiming a seat, or the reason no seat is left.
///
/// The outer `Result` carries validation failures of the posting itself.
fn claim_seat(
    posting: &Internship,
    ledger: &SeatLedger,
    seat: Option<SeatKind>,
) -> Result<Result<SeatLedger, &'static str>, ValidationError> {
    if ledger.filled >= posting.total_positions {
        return Ok(Err("posting is full"));
    }

    let mut next = ledger.clone();
    next.version += 1;
    next.filled += 1;

    if let Some(SeatKind::Reserved(category)) = seat {
        let cap = scaled_quotas(posting)?.get(&category).copied().unwrap_or(0);
        let taken = ledger.reserved_filled(category);
        if taken >= cap {
            return Ok(Err("reserved seats for the category are exhausted"));
        }
        next.reserved.insert(category, taken + 1);
    }

    Ok(Ok(next))
}
