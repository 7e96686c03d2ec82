use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::ValidationError;

/// Identifier wrapper for student profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StudentId(pub u64);

/// Identifier wrapper for internship postings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InternshipId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DepartmentId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AdminId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MatchId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationId(pub u64);

/// Student read model as delivered by the profile store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    /// Set when the student signs in through an external identity provider only.
    #[serde(default)]
    pub externally_authenticated: bool,
    #[serde(default)]
    pub institution: Option<String>,
    #[serde(default)]
    pub course: Option<String>,
    #[serde(default)]
    pub year_of_study: Option<u8>,
    #[serde(default)]
    pub cgpa: Option<f64>,
    #[serde(default)]
    pub technical_skills: Option<String>,
    #[serde(default)]
    pub soft_skills: Option<String>,
    #[serde(default)]
    pub sector_interests: Option<String>,
    #[serde(default)]
    pub preferred_locations: Option<String>,
    #[serde(default)]
    pub current_location: Option<String>,
    #[serde(default)]
    pub social_category: Option<String>,
    #[serde(default)]
    pub district_type: Option<String>,
    #[serde(default)]
    pub home_district: Option<String>,
    #[serde(default)]
    pub previous_internships: Option<u32>,
    #[serde(default)]
    pub pm_scheme_participant: Option<bool>,
    pub created_at: DateTime<Utc>,
}

impl Student {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.email.contains('@') {
            return Err(ValidationError::InvalidEmail { student: self.id });
        }
        if let Some(cgpa) = self.cgpa {
            if !cgpa.is_finite() || cgpa < 0.0 {
                return Err(ValidationError::InvalidGpa {
                    student: self.id,
                    value: cgpa,
                });
            }
        }
        Ok(())
    }

    /// The single reservation bucket the student competes in, if any.
    ///
    /// Rural district wins over social category; among social categories SC > ST > OBC.
    pub fn reservation_category(&self) -> Option<QuotaCategory> {
        let rural = self
            .district_type
            .as_deref()
            .map(|value| value.trim().eq_ignore_ascii_case("rural"))
            .unwrap_or(false);
        if rural {
            return Some(QuotaCategory::Rural);
        }

        let social = self.social_category.as_deref()?.trim().to_ascii_uppercase();
        match social.as_str() {
            "SC" => Some(QuotaCategory::ScheduledCaste),
            "ST" => Some(QuotaCategory::ScheduledTribe),
            "OBC" => Some(QuotaCategory::OtherBackwardClass),
            _ => None,
        }
    }
}

/// Reserved sub-capacity categories, declared in allocation priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaCategory {
    Rural,
    ScheduledCaste,
    ScheduledTribe,
    OtherBackwardClass,
}

impl QuotaCategory {
    pub const PRIORITY: [QuotaCategory; 4] = [
        QuotaCategory::Rural,
        QuotaCategory::ScheduledCaste,
        QuotaCategory::ScheduledTribe,
        QuotaCategory::OtherBackwardClass,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            QuotaCategory::Rural => "rural",
            QuotaCategory::ScheduledCaste => "sc",
            QuotaCategory::ScheduledTribe => "st",
            QuotaCategory::OtherBackwardClass => "obc",
        }
    }
}

/// Declared reserved seats per category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaTable {
    #[serde(default)]
    pub rural: u32,
    #[serde(default)]
    pub sc: u32,
    #[serde(default)]
    pub st: u32,
    #[serde(default)]
    pub obc: u32,
}

impl QuotaTable {
    pub const fn get(&self, category: QuotaCategory) -> u32 {
        match category {
            QuotaCategory::Rural => self.rural,
            QuotaCategory::ScheduledCaste => self.sc,
            QuotaCategory::ScheduledTribe => self.st,
            QuotaCategory::OtherBackwardClass => self.obc,
        }
    }

    pub fn sum(&self) -> u64 {
        QuotaCategory::PRIORITY
            .iter()
            .map(|category| u64::from(self.get(*category)))
            .sum()
    }
}

/// Posting read model owned by a department.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Internship {
    pub id: InternshipId,
    pub department_id: DepartmentId,
    pub title: String,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub required_skills: Option<String>,
    #[serde(default)]
    pub preferred_course: Option<String>,
    #[serde(default)]
    pub min_cgpa: Option<f64>,
    #[serde(default)]
    pub year_of_study_requirement: Option<String>,
    pub total_positions: u32,
    #[serde(default)]
    pub filled_positions: u32,
    #[serde(default)]
    pub quotas: QuotaTable,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub application_deadline: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl Internship {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.filled_positions > self.total_positions {
            return Err(ValidationError::FilledExceedsTotal {
                internship: self.id,
                filled: self.filled_positions,
                total: self.total_positions,
            });
        }
        for category in QuotaCategory::PRIORITY {
            let quota = self.quotas.get(category);
            if quota > self.total_positions {
                return Err(ValidationError::QuotaExceedsTotal {
                    internship: self.id,
                    category,
                    quota,
                    total: self.total_positions,
                });
            }
        }
        if let Some(min) = self.min_cgpa {
            if !min.is_finite() || min < 0.0 {
                return Err(ValidationError::InvalidMinimumGpa {
                    internship: self.id,
                    value: min,
                });
            }
        }
        Ok(())
    }

    /// Whether the posting still takes candidates at `now`.
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.is_active
            && self
                .application_deadline
                .map(|deadline| now <= deadline)
                .unwrap_or(true)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: DepartmentId,
    pub name: String,
    pub created_by: AdminId,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

/// Authenticated caller identity supplied by the outer authentication layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Actor {
    Student(StudentId),
    Department(DepartmentId),
    Admin(AdminId),
}

/// Status of an engine-computed match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Pending,
    Offered,
    Waitlisted,
    Rejected,
    Accepted,
    Declined,
    Expired,
}

impl MatchStatus {
    pub const fn label(self) -> &'static str {
        match self {
            MatchStatus::Pending => "pending",
            MatchStatus::Offered => "offered",
            MatchStatus::Waitlisted => "waitlisted",
            MatchStatus::Rejected => "rejected",
            MatchStatus::Accepted => "accepted",
            MatchStatus::Declined => "declined",
            MatchStatus::Expired => "expired",
        }
    }
}

/// Which pool an offer was drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "pool", content = "category", rename_all = "snake_case")]
pub enum SeatKind {
    Reserved(QuotaCategory),
    General,
}

/// Status of a student-initiated application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    UnderReview,
    InterviewScheduled,
    Offered,
    Accepted,
    Rejected,
    Withdrawn,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::UnderReview => "under_review",
            ApplicationStatus::InterviewScheduled => "interview_scheduled",
            ApplicationStatus::Offered => "offered",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Withdrawn => "withdrawn",
        }
    }
}

/// Inbound request to create an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationSubmission {
    pub student_id: StudentId,
    pub internship_id: InternshipId,
    #[serde(default)]
    pub cover_letter: Option<String>,
    #[serde(default)]
    pub portfolio_url: Option<String>,
    #[serde(default)]
    pub additional_notes: Option<String>,
}

/// Persisted application row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: ApplicationId,
    pub student_id: StudentId,
    pub internship_id: InternshipId,
    pub cover_letter: Option<String>,
    pub portfolio_url: Option<String>,
    pub additional_notes: Option<String>,
    pub department_notes: Option<String>,
    pub status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub interview_date: Option<DateTime<Utc>>,
    pub response_date: Option<DateTime<Utc>>,
}

/// Requested application status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRequest {
    pub status: ApplicationStatus,
    #[serde(default)]
    pub department_notes: Option<String>,
    #[serde(default)]
    pub interview_at: Option<DateTime<Utc>>,
}

impl TransitionRequest {
    pub fn to(status: ApplicationStatus) -> Self {
        Self {
            status,
            department_notes: None,
            interview_at: None,
        }
    }
}
