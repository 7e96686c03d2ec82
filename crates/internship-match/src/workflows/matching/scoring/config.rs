use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::workflows::matching::error::ValidationError;

const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Relative contribution of each sub-score to the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub skills: f64,
    pub academic: f64,
    pub location: f64,
    pub affirmative_action: f64,
}

impl ScoreWeights {
    pub fn sum(&self) -> f64 {
        self.skills + self.academic + self.location + self.affirmative_action
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            ("skills", self.skills),
            ("academic", self.academic),
            ("location", self.location),
            ("affirmative_action", self.affirmative_action),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ValidationError::InvalidWeight { field });
            }
        }

        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(ValidationError::WeightsDoNotSumToOne { sum });
        }
        Ok(())
    }
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            skills: 0.35,
            academic: 0.25,
            location: 0.15,
            affirmative_action: 0.25,
        }
    }
}

/// Shape of the academic sub-score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AcademicScale {
    /// Score awarded for a GPA exactly at the posting minimum.
    pub baseline: f64,
    /// GPA that earns the full GPA component.
    pub gpa_ceiling: f64,
    pub year_match_bonus: f64,
    pub year_mismatch_penalty: f64,
    pub course_bonus: f64,
    /// Year of study treated as "Final Year".
    pub final_year: u8,
}

impl Default for AcademicScale {
    fn default() -> Self {
        Self {
            baseline: 60.0,
            gpa_ceiling: 10.0,
            year_match_bonus: 10.0,
            year_mismatch_penalty: 10.0,
            course_bonus: 5.0,
            final_year: 4,
        }
    }
}

/// Engine configuration passed explicitly into every scoring and allocation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Minimum completeness score for inclusion in automatic matching.
    pub completeness_threshold: u8,
    pub weights: ScoreWeights,
    /// Maximum gap below the lowest offered overall score that still earns a waitlist spot.
    pub waitlist_margin: f64,
    pub academic: AcademicScale,
    /// Location credit for a same-region mismatch.
    pub region_credit: f64,
    /// Optional city to region taxonomy, keys and values compared case-insensitively.
    #[serde(default)]
    pub regions: BTreeMap<String, String>,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.completeness_threshold > 100 {
            return Err(ValidationError::ThresholdOutOfRange(
                self.completeness_threshold,
            ));
        }
        self.weights.validate()?;
        if !self.waitlist_margin.is_finite() || self.waitlist_margin < 0.0 {
            return Err(ValidationError::InvalidWaitlistMargin(self.waitlist_margin));
        }

        let academic = &self.academic;
        if !(0.0..=100.0).contains(&academic.baseline) {
            return Err(ValidationError::InvalidAcademicScale(
                "baseline must be within 0..=100",
            ));
        }
        if !academic.gpa_ceiling.is_finite() || academic.gpa_ceiling <= 0.0 {
            return Err(ValidationError::InvalidAcademicScale(
                "gpa ceiling must be positive",
            ));
        }
        if !(0.0..=100.0).contains(&self.region_credit) {
            return Err(ValidationError::InvalidAcademicScale(
                "region credit must be within 0..=100",
            ));
        }
        Ok(())
    }

    /// Region for a city name, using the configured taxonomy.
    pub fn region_of(&self, city: &str) -> Option<String> {
        let needle = city.trim().to_lowercase();
        self.regions
            .iter()
            .find(|(key, _)| key.trim().to_lowercase() == needle)
            .map(|(_, region)| region.trim().to_lowercase())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            completeness_threshold: 70,
            weights: ScoreWeights::default(),
            waitlist_margin: 10.0,
            academic: AcademicScale::default(),
            region_credit: 50.0,
            regions: BTreeMap::new(),
        }
    }
}
