mod config;
pub(crate) mod rules;

pub use config::{AcademicScale, EngineConfig, ScoreWeights};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::allocation::SeatCapacity;
use super::completeness;
use super::domain::{Internship, Student};
use rules::round2;

/// Compatibility of one student with one posting. Every field lies in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchScore {
    pub skills: f64,
    pub location: f64,
    pub academic: f64,
    pub affirmative_action: f64,
    pub overall: f64,
}

/// Why a student was left out of a posting's candidate pool.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Exclusion {
    IncompleteProfile { score: u8, threshold: u8 },
    BelowMinimumGpa { gpa: f64, minimum: f64 },
    MissingGpa { minimum: f64 },
    PostingClosed,
}

/// Stateless calculator applying one configuration snapshot.
#[derive(Debug, Clone)]
pub struct ScoreEngine {
    config: EngineConfig,
}

impl ScoreEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn score(
        &self,
        student: &Student,
        posting: &Internship,
        capacity: &SeatCapacity,
    ) -> MatchScore {
        let skills = round2(rules::skills_score(student, posting));
        let location = round2(rules::location_score(student, posting, &self.config));
        let academic = round2(rules::academic_score(student, posting, &self.config));
        let affirmative_action = round2(rules::affirmative_action_score(student, capacity));

        let weights = &self.config.weights;
        let overall = round2(
            skills * weights.skills
                + academic * weights.academic
                + location * weights.location
                + affirmative_action * weights.affirmative_action,
        );

        MatchScore {
            skills,
            location,
            academic,
            affirmative_action,
            overall,
        }
    }

    /// Hard eligibility for automatic matching; manual applications bypass this.
    pub fn screen(
        &self,
        student: &Student,
        posting: &Internship,
        now: DateTime<Utc>,
    ) -> Result<(), Exclusion> {
        if !posting.is_open(now) {
            return Err(Exclusion::PostingClosed);
        }

        let report = completeness::evaluate(student);
        if !report.meets(self.config.completeness_threshold) {
            return Err(Exclusion::IncompleteProfile {
                score: report.score,
                threshold: self.config.completeness_threshold,
            });
        }

        if let Some(minimum) = posting.min_cgpa {
            match student.cgpa {
                Some(gpa) if gpa < minimum => {
                    return Err(Exclusion::BelowMinimumGpa { gpa, minimum })
                }
                None => return Err(Exclusion::MissingGpa { minimum }),
                Some(_) => {}
            }
        }

        Ok(())
    }
}
