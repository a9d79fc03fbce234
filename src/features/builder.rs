//! Feature Builder
//!
//! Maps a validated [`RawInputRecord`] into a named feature frame, then
//! selects a fixed-order numeric vector against a loaded [`FeatureSchema`].
//! Column names here must match the names the training batch wrote into
//! `feature_columns.json` / `rec_feature_columns.json` byte for byte.

use crate::constants::{DAYS_PER_WEEK, STRESS_RATIO_DENOMINATOR_FLOOR};
use crate::schema::{FeatureSchema, SchemaError};

use super::record::{parse_yes_no, Gender, InputValidationError, RawInputRecord};

// ============================================================================
// FEATURE COLUMN NAMES
// ============================================================================

pub const COL_AGE: &str = "Age";
pub const COL_GPA: &str = "Academic Performance (GPA)";
pub const COL_STUDY_HOURS: &str = "Study Hours Per Week";
pub const COL_SOCIAL_MEDIA: &str = "Social_Media_Usage_per_week";
pub const COL_SLEEP: &str = "Sleep Duration (Hours per night)";
pub const COL_EXERCISE: &str = "Physical Exercise (Hours per week)";
pub const COL_FAMILY_SUPPORT: &str = "Family Support";
pub const COL_FINANCIAL_STRESS: &str = "Financial Stress";
pub const COL_PEER_PRESSURE: &str = "Peer Pressure";
pub const COL_RELATIONSHIP_STRESS: &str = "Relationship Stress";
pub const COL_COUNSELING: &str = "Counseling Attendance";
pub const COL_DIET_QUALITY: &str = "Diet Quality";
pub const COL_COGNITIVE_DISTORTIONS: &str = "Cognitive Distortions";
pub const COL_FAMILY_MENTAL_HISTORY: &str = "Family Mental Health History";
pub const COL_MEDICAL_CONDITION: &str = "Medical Condition";
pub const COL_SUBSTANCE_USE: &str = "Substance Use";
pub const COL_GENDER_FEMALE: &str = "Gender_Female";
pub const COL_GENDER_MALE: &str = "Gender_Male";
pub const COL_GENDER_OTHER: &str = "Gender_Other";
pub const COL_STRESS_RATIO: &str = "Stress_Ratio";

// ============================================================================
// FEATURE FRAME
// ============================================================================

/// Named feature values computed from one input record.
///
/// Ordering is deliberately NOT part of this type: a fixed order is only
/// applied when selecting against a loaded schema, so the frame can serve
/// both the classifier and the recommendation column sets.
#[derive(Debug, Clone)]
pub struct FeatureFrame {
    values: Vec<(&'static str, f32)>,
}

impl FeatureFrame {
    pub fn get(&self, name: &str) -> Option<f32> {
        self.values
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| *v)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Select exactly the schema's columns, in schema order.
    ///
    /// A schema column absent from the frame is a fatal artifact/schema
    /// mismatch, never a silent fill.
    pub fn select(&self, schema: &FeatureSchema) -> Result<Vec<f32>, SchemaError> {
        let mut out = Vec::with_capacity(schema.len());
        for column in &schema.columns {
            match self.get(column) {
                Some(value) => out.push(value),
                None => {
                    return Err(SchemaError::MissingFeature {
                        column: column.clone(),
                    })
                }
            }
        }
        Ok(out)
    }
}

// ============================================================================
// FEATURE BUILDING
// ============================================================================

/// Build the full named feature frame from a raw record.
///
/// Performs the domain checks, yes/no and gender encodings, the per-day →
/// per-week social media conversion, and the derived Stress_Ratio.
pub fn build_feature_frame(record: &RawInputRecord) -> Result<FeatureFrame, InputValidationError> {
    check_finite("age", record.age)?;
    check_finite("gpa", record.gpa)?;
    check_finite("study_hours", record.study_hours)?;
    check_finite("social_media", record.social_media)?;
    check_finite("sleep", record.sleep)?;
    check_finite("exercise", record.exercise)?;

    if record.age <= 0.0 {
        return Err(InputValidationError::new("age", "must be positive"));
    }
    check_non_negative("gpa", record.gpa)?;
    check_non_negative("study_hours", record.study_hours)?;
    check_non_negative("social_media", record.social_media)?;
    check_non_negative("sleep", record.sleep)?;
    check_non_negative("exercise", record.exercise)?;

    let counseling = parse_yes_no("counseling", &record.counseling)?;
    let family_history = parse_yes_no("family_mental_history", &record.family_mental_history)?;
    let medical = parse_yes_no("medical_condition", &record.medical_condition)?;
    let gender = Gender::parse("gender", &record.gender)?;

    let family_support = record.family_support as f32;
    let financial_stress = record.financial_stress as f32;
    let peer_pressure = record.peer_pressure as f32;
    let relationship_stress = record.relationship_stress as f32;
    let diet_quality = record.diet_quality as f32;

    let stress_ratio = stress_ratio(
        financial_stress,
        peer_pressure,
        relationship_stress,
        family_support,
        diet_quality,
        record.exercise,
    );

    let values = vec![
        (COL_AGE, record.age),
        (COL_GPA, record.gpa),
        (COL_STUDY_HOURS, record.study_hours),
        (COL_SOCIAL_MEDIA, record.social_media * DAYS_PER_WEEK),
        (COL_SLEEP, record.sleep),
        (COL_EXERCISE, record.exercise),
        (COL_FAMILY_SUPPORT, family_support),
        (COL_FINANCIAL_STRESS, financial_stress),
        (COL_PEER_PRESSURE, peer_pressure),
        (COL_RELATIONSHIP_STRESS, relationship_stress),
        (COL_COUNSELING, counseling),
        (COL_DIET_QUALITY, diet_quality),
        (COL_COGNITIVE_DISTORTIONS, record.cognitive_distortions as f32),
        (COL_FAMILY_MENTAL_HISTORY, family_history),
        (COL_MEDICAL_CONDITION, medical),
        (COL_SUBSTANCE_USE, record.substance_use as f32),
        (COL_GENDER_FEMALE, if gender == Gender::Female { 1.0 } else { 0.0 }),
        (COL_GENDER_MALE, if gender == Gender::Male { 1.0 } else { 0.0 }),
        (COL_GENDER_OTHER, if gender == Gender::Other { 1.0 } else { 0.0 }),
        (COL_STRESS_RATIO, stress_ratio),
    ];

    Ok(FeatureFrame { values })
}

/// Derived composite: pressure sources over support sources.
///
/// An exactly-zero denominator is substituted with a small positive floor.
/// Smoothing policy from training, not an error path; must stay numerically
/// identical for parity with persisted historical assessments.
pub fn stress_ratio(
    financial_stress: f32,
    peer_pressure: f32,
    relationship_stress: f32,
    family_support: f32,
    diet_quality: f32,
    exercise_hours: f32,
) -> f32 {
    let numerator = financial_stress + peer_pressure + relationship_stress;
    let mut denominator = family_support + diet_quality + exercise_hours;
    if denominator == 0.0 {
        denominator = STRESS_RATIO_DENOMINATOR_FLOOR;
    }
    numerator / denominator
}

fn check_finite(field: &'static str, value: f32) -> Result<(), InputValidationError> {
    if !value.is_finite() {
        return Err(InputValidationError::new(field, "must be a finite number"));
    }
    Ok(())
}

fn check_non_negative(field: &'static str, value: f32) -> Result<(), InputValidationError> {
    if value < 0.0 {
        return Err(InputValidationError::new(field, "must not be negative"));
    }
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
