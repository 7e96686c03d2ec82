use super::domain::{
    ApplicationId, ApplicationStatus, InternshipId, MatchId, MatchStatus, QuotaCategory,
    StudentId,
};
use super::repository::RepositoryError;

/// Malformed or out-of-range input, rejected before anything is written.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("student {}: email address is malformed", .student.0)]
    InvalidEmail { student: StudentId },
    #[error("student {}: GPA {value} must be finite and non-negative", .student.0)]
    InvalidGpa { student: StudentId, value: f64 },
    #[error("internship {}: minimum GPA {value} must be finite and non-negative", .internship.0)]
    InvalidMinimumGpa { internship: InternshipId, value: f64 },
    #[error("internship {}: filled positions {filled} exceed total {total}", .internship.0)]
    FilledExceedsTotal {
        internship: InternshipId,
        filled: u32,
        total: u32,
    },
    #[error("internship {}: {} quota {quota} exceeds total {total}", .internship.0, .category.label())]
    QuotaExceedsTotal {
        internship: InternshipId,
        category: QuotaCategory,
        quota: u32,
        total: u32,
    },
    #[error("internship {}: scaled quotas ({scaled}) still exceed capacity {total}", .internship.0)]
    QuotaOverflow {
        internship: InternshipId,
        scaled: u64,
        total: u32,
    },
    #[error("internship {}: no longer accepting applications", .internship.0)]
    PostingClosed { internship: InternshipId },
    #[error("score weights must sum to 1.0 (found {sum:.4})")]
    WeightsDoNotSumToOne { sum: f64 },
    #[error("score weight for {field} must be finite and non-negative")]
    InvalidWeight { field: &'static str },
    #[error("completeness threshold {0} must be within 0..=100")]
    ThresholdOutOfRange(u8),
    #[error("waitlist margin {0} must be finite and non-negative")]
    InvalidWaitlistMargin(f64),
    #[error("academic scale is inconsistent: {0}")]
    InvalidAcademicScale(&'static str),
}

/// Lifecycle entity a rejected transition belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionSubject {
    Match { id: MatchId, from: MatchStatus, to: MatchStatus },
    Application {
        id: ApplicationId,
        from: ApplicationStatus,
        to: ApplicationStatus,
    },
}

impl std::fmt::Display for TransitionSubject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransitionSubject::Match { id, from, to } => write!(
                f,
                "match {} cannot move from {} to {}",
                id.0,
                from.label(),
                to.label()
            ),
            TransitionSubject::Application { id, from, to } => write!(
                f,
                "application {} cannot move from {} to {}",
                id.0,
                from.label(),
                to.label()
            ),
        }
    }
}

/// Error raised by the matching service.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("invalid transition: {0}")]
    InvalidTransition(TransitionSubject),
    #[error("{subject} lost a concurrent update: {reason}")]
    ConcurrencyConflict { subject: String, reason: String },
    #[error("{0} not found")]
    NotFound(String),
    #[error("actor is not permitted to {0}")]
    Forbidden(String),
    #[error("an application already exists for student {} and internship {}", .student.0, .internship.0)]
    DuplicateApplication {
        student: StudentId,
        internship: InternshipId,
    },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl EngineError {
    pub(crate) fn not_found_student(id: StudentId) -> Self {
        Self::NotFound(format!("student {}", id.0))
    }

    pub(crate) fn not_found_internship(id: InternshipId) -> Self {
        Self::NotFound(format!("internship {}", id.0))
    }

    pub(crate) fn not_found_match(id: MatchId) -> Self {
        Self::NotFound(format!("match {}", id.0))
    }

    pub(crate) fn not_found_application(id: ApplicationId) -> Self {
        Self::NotFound(format!("application {}", id.0))
    }

    /// Whether the caller may reasonably retry the same request.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EngineError::ConcurrencyConflict { .. }
                | EngineError::Repository(RepositoryError::Unavailable(_))
        )
    }
}
