use std::collections::BTreeSet;

use super::config::{AcademicScale, EngineConfig};
use crate::workflows::matching::allocation::SeatCapacity;
use crate::workflows::matching::domain::{Internship, Student};

pub(crate) const FULL: f64 = 100.0;

const LIST_DELIMITERS: [char; 5] = [',', ';', '|', '/', '\n'];

/// Lowercased, trimmed, de-duplicated entries of a free-text list.
pub(crate) fn token_set(raw: Option<&str>) -> BTreeSet<String> {
    raw.map(|text| {
        text.split(|c: char| LIST_DELIMITERS.contains(&c))
            .map(|token| token.trim().to_lowercase())
            .filter(|token| !token.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

pub(crate) fn round2(value: f64) -> f64 {
    (value.clamp(0.0, FULL) * 100.0).round() / 100.0
}

/// Share of the posting's required skills the student declares.
pub(crate) fn skills_score(student: &Student, posting: &Internship) -> f64 {
    let required = token_set(posting.required_skills.as_deref());
    if required.is_empty() {
        return FULL;
    }

    let declared = token_set(student.technical_skills.as_deref());
    let matched = required.intersection(&declared).count();
    FULL * matched as f64 / required.len() as f64
}

struct Place {
    city: String,
    region: Option<String>,
}

impl Place {
    fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw
            .split(',')
            .map(|part| part.trim().to_lowercase())
            .filter(|part| !part.is_empty());
        let city = parts.next()?;
        let region = parts.last();
        Some(Self { city, region })
    }

    fn region(&self, config: &EngineConfig) -> Option<String> {
        self.region
            .clone()
            .or_else(|| config.region_of(&self.city))
    }
}

pub(crate) fn location_score(
    student: &Student,
    posting: &Internship,
    config: &EngineConfig,
) -> f64 {
    let target = match posting.location.as_deref().and_then(Place::parse) {
        Some(place) if place.city != "remote" => place,
        _ => return FULL,
    };

    let preferred = token_set(student.preferred_locations.as_deref());
    let current = student.current_location.as_deref().and_then(Place::parse);

    let current_city_matches = current
        .as_ref()
        .map(|place| place.city == target.city)
        .unwrap_or(false);
    if preferred.contains(&target.city) || current_city_matches {
        return FULL;
    }

    let Some(region) = target.region(config) else {
        return 0.0;
    };

    let preferred_in_region = preferred.iter().any(|token| {
        *token == region || config.region_of(token).as_deref() == Some(region.as_str())
    });
    let current_in_region = current
        .as_ref()
        .and_then(|place| place.region(config))
        .map(|current_region| current_region == region)
        .unwrap_or(false);

    if preferred_in_region || current_in_region {
        config.region_credit
    } else {
        0.0
    }
}

/// Parsed form of a posting's year-of-study requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum YearRequirement {
    Any,
    Exact(u8),
    Final,
}

impl YearRequirement {
    pub(crate) fn parse(raw: Option<&str>) -> Self {
        let Some(text) = raw.map(|value| value.trim().to_lowercase()) else {
            return Self::Any;
        };
        if text.contains("final") {
            return Self::Final;
        }
        let digits: String = text
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits.parse().map(Self::Exact).unwrap_or(Self::Any)
    }

    fn matches(self, year: u8, final_year: u8) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(required) => year == required,
            Self::Final => year >= final_year,
        }
    }
}

fn gpa_component(cgpa: Option<f64>, minimum: Option<f64>, scale: &AcademicScale) -> f64 {
    let gpa = match (cgpa, minimum) {
        (Some(gpa), _) => gpa,
        (None, Some(_)) => return 0.0,
        (None, None) => return scale.baseline,
    };
    let minimum = minimum.unwrap_or(0.0);

    if gpa < minimum {
        return scale.baseline * gpa / minimum;
    }
    if scale.gpa_ceiling <= minimum {
        return FULL;
    }

    let progress = ((gpa - minimum) / (scale.gpa_ceiling - minimum)).min(1.0);
    scale.baseline + (FULL - scale.baseline) * progress
}

pub(crate) fn academic_score(
    student: &Student,
    posting: &Internship,
    config: &EngineConfig,
) -> f64 {
    let scale = &config.academic;
    let mut score = gpa_component(student.cgpa, posting.min_cgpa, scale);

    match YearRequirement::parse(posting.year_of_study_requirement.as_deref()) {
        YearRequirement::Any => {}
        requirement => {
            let matched = student
                .year_of_study
                .map(|year| requirement.matches(year, scale.final_year))
                .unwrap_or(false);
            if matched {
                score += scale.year_match_bonus;
            } else {
                score -= scale.year_mismatch_penalty;
            }
        }
    }

    if let (Some(preferred), Some(course)) = (&posting.preferred_course, &student.course) {
        let preferred = preferred.trim().to_lowercase();
        let course = course.trim().to_lowercase();
        if !preferred.is_empty()
            && !course.is_empty()
            && (course.contains(&preferred) || preferred.contains(&course))
        {
            score += scale.course_bonus;
        }
    }

    score
}

/// Full credit when the student's reservation bucket still has room on the posting.
pub(crate) fn affirmative_action_score(student: &Student, capacity: &SeatCapacity) -> f64 {
    match student.reservation_category() {
        Some(category) if capacity.reserved_room(category) > 0 => FULL,
        _ => 0.0,
    }
}
