//! Student to internship matching: profile screening, weighted scoring,
//! quota-aware seat allocation, and the offer/application lifecycles.

pub mod allocation;
pub mod batch;
pub mod clock;
pub mod completeness;
pub mod domain;
pub mod error;
pub mod lifecycle;
pub mod memory;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;

pub use allocation::{AllocationDecision, Allocator, Candidate, Decision, SeatCapacity};
pub use batch::recompute_all_parallel;
pub use clock::{Clock, FixedClock, SystemClock};
pub use completeness::CompletenessReport;
pub use domain::{
    Actor, AdminId, ApplicationId, ApplicationRecord, ApplicationStatus, ApplicationSubmission,
    Department, DepartmentId, Internship, InternshipId, MatchId, MatchStatus, QuotaCategory,
    QuotaTable, SeatKind, Student, StudentId, TransitionRequest,
};
pub use error::{EngineError, TransitionSubject, ValidationError};
pub use memory::{Fixture, InMemoryStore};
pub use repository::{
    ApplicationRepository, MatchRecord, MatchRepository, ProfileDirectory, RepositoryError,
    SeatLedger,
};
pub use router::matching_router;
pub use scoring::{AcademicScale, EngineConfig, MatchScore, ScoreEngine, ScoreWeights};
pub use service::{MatchingService, PostingFailure, RankedCandidate, RecomputeSummary};

#[cfg(test)]
mod tests;
