use serde::Serialize;

use super::domain::Student;

/// Profile fields that contribute to completeness, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProfileField {
    Name,
    Email,
    Phone,
    Institution,
    Course,
    YearOfStudy,
    Cgpa,
    TechnicalSkills,
    SoftSkills,
    SectorInterests,
    CurrentLocation,
    PreferredLocations,
    SocialCategory,
    DistrictType,
    HomeDistrict,
    PreviousInternships,
    PmSchemeParticipant,
}

const FIELD_WEIGHTS: [(ProfileField, u8, &str); 17] = [
    (ProfileField::Name, 10, "Full Name"),
    (ProfileField::Email, 10, "Email"),
    (ProfileField::Phone, 5, "Phone Number"),
    (ProfileField::Institution, 10, "Institution"),
    (ProfileField::Course, 5, "Course/Degree"),
    (ProfileField::YearOfStudy, 5, "Year of Study"),
    (ProfileField::Cgpa, 5, "CGPA/Percentage"),
    (ProfileField::TechnicalSkills, 10, "Technical Skills"),
    (ProfileField::SoftSkills, 5, "Soft Skills"),
    (ProfileField::SectorInterests, 5, "Sector Interests"),
    (ProfileField::CurrentLocation, 5, "Current Location"),
    (ProfileField::PreferredLocations, 5, "Preferred Locations"),
    (ProfileField::SocialCategory, 3, "Social Category"),
    (ProfileField::DistrictType, 3, "District Type"),
    (ProfileField::HomeDistrict, 4, "Home District"),
    (ProfileField::PreviousInternships, 5, "Number of Previous Internships"),
    (ProfileField::PmSchemeParticipant, 5, "PM Scheme Participant"),
];

/// Outcome of a completeness evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletenessReport {
    pub score: u8,
    pub missing: Vec<&'static str>,
}

impl CompletenessReport {
    pub fn meets(&self, threshold: u8) -> bool {
        self.score >= threshold
    }
}

fn text_present(value: Option<&str>) -> bool {
    value.map(|text| !text.trim().is_empty()).unwrap_or(false)
}

fn field_present(student: &Student, field: ProfileField) -> bool {
    match field {
        ProfileField::Name => text_present(Some(&student.name)),
        ProfileField::Email => text_present(Some(&student.email)),
        ProfileField::Phone => text_present(student.phone.as_deref()),
        ProfileField::Institution => text_present(student.institution.as_deref()),
        ProfileField::Course => text_present(student.course.as_deref()),
        ProfileField::YearOfStudy => student.year_of_study.is_some(),
        ProfileField::Cgpa => student.cgpa.is_some(),
        ProfileField::TechnicalSkills => text_present(student.technical_skills.as_deref()),
        ProfileField::SoftSkills => text_present(student.soft_skills.as_deref()),
        ProfileField::SectorInterests => text_present(student.sector_interests.as_deref()),
        ProfileField::CurrentLocation => text_present(student.current_location.as_deref()),
        ProfileField::PreferredLocations => {
            text_present(student.preferred_locations.as_deref())
        }
        ProfileField::SocialCategory => text_present(student.social_category.as_deref()),
        ProfileField::DistrictType => text_present(student.district_type.as_deref()),
        ProfileField::HomeDistrict => text_present(student.home_district.as_deref()),
        ProfileField::PreviousInternships => student.previous_internships.is_some(),
        ProfileField::PmSchemeParticipant => student.pm_scheme_participant.is_some(),
    }
}

/// Weighted field presence for a student profile.
pub fn evaluate(student: &Student) -> CompletenessReport {
    let mut score: u32 = 0;
    let mut missing = Vec::new();

    for (field, weight, label) in FIELD_WEIGHTS {
        if field_present(student, field) {
            score += u32::from(weight);
        } else {
            missing.push(label);
        }
    }

    CompletenessReport {
        score: score.min(100) as u8,
        missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::matching::domain::StudentId;
    use chrono::{TimeZone, Utc};

    fn bare_student() -> Student {
        Student {
            id: StudentId(1),
            email: "asha@example.edu".to_string(),
            name: "Asha".to_string(),
            phone: None,
            externally_authenticated: true,
            institution: None,
            course: None,
            year_of_study: None,
            cgpa: None,
            technical_skills: None,
            soft_skills: None,
            sector_interests: None,
            preferred_locations: None,
            current_location: None,
            social_category: None,
            district_type: None,
            home_district: None,
            previous_internships: None,
            pm_scheme_participant: None,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn weights_sum_to_one_hundred() {
        let total: u32 = FIELD_WEIGHTS.iter().map(|(_, w, _)| u32::from(*w)).sum();
        assert_eq!(total, 100);
    }

    #[test]
    fn bare_profile_reports_missing_fields_in_table_order() {
        let report = evaluate(&bare_student());
        assert_eq!(report.score, 20);
        assert_eq!(report.missing.first(), Some(&"Phone Number"));
        assert_eq!(report.missing.last(), Some(&"PM Scheme Participant"));
        assert_eq!(report.missing.len(), 15);
    }

    #[test]
    fn whitespace_text_counts_as_missing() {
        let mut student = bare_student();
        student.phone = Some("   ".to_string());
        student.institution = Some("IIT Bombay".to_string());
        let report = evaluate(&student);
        assert_eq!(report.score, 30);
        assert!(report.missing.contains(&"Phone Number"));
        assert!(!report.missing.contains(&"Institution"));
    }

    #[test]
    fn fully_populated_profile_scores_exactly_one_hundred() {
        let mut student = bare_student();
        student.phone = Some("+91-98000-00000".to_string());
        student.institution = Some("IIT Bombay".to_string());
        student.course = Some("B.Tech".to_string());
        student.year_of_study = Some(3);
        student.cgpa = Some(8.2);
        student.technical_skills = Some("Python".to_string());
        student.soft_skills = Some("Writing".to_string());
        student.sector_interests = Some("Technology".to_string());
        student.current_location = Some("Pune".to_string());
        student.preferred_locations = Some("Pune".to_string());
        student.social_category = Some("General".to_string());
        student.district_type = Some("Urban".to_string());
        student.home_district = Some("Haveli".to_string());
        student.previous_internships = Some(1);
        student.pm_scheme_participant = Some(true);

        let report = evaluate(&student);
        assert_eq!(report.score, 100);
        assert!(report.missing.is_empty());
    }

    #[test]
    fn missing_contact_and_academic_fields_fall_below_default_threshold() {
        let mut student = bare_student();
        student.year_of_study = Some(3);
        student.cgpa = Some(8.2);
        student.technical_skills = Some("Python".to_string());
        student.soft_skills = Some("Writing".to_string());
        student.current_location = Some("Pune".to_string());
        student.preferred_locations = Some("Pune".to_string());
        student.social_category = Some("General".to_string());
        student.district_type = Some("Urban".to_string());
        student.home_district = Some("Haveli".to_string());
        student.previous_internships = Some(1);
        student.pm_scheme_participant = Some(true);

        let report = evaluate(&student);
        assert_eq!(report.score, 75);
        assert_eq!(
            report.missing,
            vec!["Phone Number", "Institution", "Course/Degree", "Sector Interests"]
        );

        student.technical_skills = None;
        let report = evaluate(&student);
        assert_eq!(report.score, 65);
        assert!(!report.meets(70));
    }

    #[test]
    fn zero_and_false_values_are_present() {
        let mut student = bare_student();
        student.previous_internships = Some(0);
        student.pm_scheme_participant = Some(false);
        let report = evaluate(&student);
        assert_eq!(report.score, 30);
        assert!(!report.meets(70));
    }
}
