//! Raw Input Record
//!
//! The caller-supplied self-assessment. The external request layer hands
//! this to the pipeline either as an already-typed struct (serde) or as a
//! loose JSON object coerced field by field via [`RawInputRecord::from_json`].
//! Any missing or unparseable field fails the whole request, naming the
//! offending field.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// VALIDATION ERROR
// ============================================================================

/// A missing, unparseable, or out-of-domain input field.
///
/// Recoverable: the request boundary maps this to a 400-equivalent payload.
#[derive(Debug, Clone)]
pub struct InputValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl InputValidationError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self { field, reason: reason.into() }
    }
}

impl std::fmt::Display for InputValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid input field '{}': {}", self.field, self.reason)
    }
}

impl std::error::Error for InputValidationError {}

// ============================================================================
// CATEGORICAL VALUES
// ============================================================================

/// Gender categories the artifacts were fit on (one-hot expanded).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Female,
    Male,
    Other,
}

impl Gender {
    /// Parse a textual gender value. Unmapped values are an error, not a
    /// silent all-zero one-hot row.
    pub fn parse(field: &'static str, value: &str) -> Result<Self, InputValidationError> {
        match value.trim() {
            "Female" => Ok(Gender::Female),
            "Male" => Ok(Gender::Male),
            "Other" => Ok(Gender::Other),
            other => Err(InputValidationError::new(
                field,
                format!("expected one of Female/Male/Other, got '{}'", other),
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Female => "Female",
            Gender::Male => "Male",
            Gender::Other => "Other",
        }
    }
}

/// Map a yes/no textual flag to {1, 0}. Unmapped values are an error.
pub fn parse_yes_no(field: &'static str, value: &str) -> Result<f32, InputValidationError> {
    match value.trim() {
        "Yes" => Ok(1.0),
        "No" => Ok(0.0),
        other => Err(InputValidationError::new(
            field,
            format!("expected Yes or No, got '{}'", other),
        )),
    }
}

// ============================================================================
// RAW INPUT RECORD
// ============================================================================

/// One student self-report, exactly as the request layer receives it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawInputRecord {
    // Numeric fields
    pub age: f32,
    pub gpa: f32,
    pub study_hours: f32,
    /// Social media usage, hours per DAY (converted to per-week downstream)
    pub social_media: f32,
    pub sleep: f32,
    pub exercise: f32,

    // Ordinal ratings
    pub family_support: i64,
    pub financial_stress: i64,
    pub peer_pressure: i64,
    pub relationship_stress: i64,
    pub diet_quality: i64,
    pub cognitive_distortions: i64,
    pub substance_use: i64,

    // Yes/No flags (kept textual; mapped during feature building)
    pub counseling: String,
    pub family_mental_history: String,
    pub medical_condition: String,

    pub gender: String,

    /// Coping mechanisms the student already uses
    #[serde(default)]
    pub current_mechanisms: Vec<String>,
}

impl RawInputRecord {
    /// Coerce a loose JSON object into a record, field by field.
    ///
    /// Mirrors the coercion contract of the request layer: each field must
    /// be present and parse to its declared type, otherwise the whole
    /// pipeline fails with the offending field name.
    pub fn from_json(data: &Value) -> Result<Self, InputValidationError> {
        Ok(Self {
            age: get_f32(data, "age")?,
            gpa: get_f32(data, "gpa")?,
            study_hours: get_f32(data, "study_hours")?,
            social_media: get_f32(data, "social_media")?,
            sleep: get_f32(data, "sleep")?,
            exercise: get_f32(data, "exercise")?,
            family_support: get_i64(data, "family_support")?,
            financial_stress: get_i64(data, "financial_stress")?,
            peer_pressure: get_i64(data, "peer_pressure")?,
            relationship_stress: get_i64(data, "relationship_stress")?,
            diet_quality: get_i64(data, "diet_quality")?,
            cognitive_distortions: get_i64(data, "cognitive_distortions")?,
            substance_use: get_i64(data, "substance_use")?,
            counseling: get_string(data, "counseling")?,
            family_mental_history: get_string(data, "family_mental_history")?,
            medical_condition: get_string(data, "medical_condition")?,
            gender: get_string(data, "gender")?,
            current_mechanisms: get_string_list(data, "current_mechanisms")?,
        })
    }
}

// ============================================================================
// FIELD COERCION HELPERS
// ============================================================================

fn get_field<'a>(data: &'a Value, field: &'static str) -> Result<&'a Value, InputValidationError> {
    data.get(field)
        .ok_or_else(|| InputValidationError::new(field, "field is missing"))
}

fn get_f32(data: &Value, field: &'static str) -> Result<f32, InputValidationError> {
    let value = get_field(data, field)?;
    match value {
        Value::Number(n) => n
            .as_f64()
            .map(|v| v as f32)
            .ok_or_else(|| InputValidationError::new(field, "not representable as a float")),
        // Form layers often submit numbers as strings
        Value::String(s) => s
            .trim()
            .parse::<f32>()
            .map_err(|_| InputValidationError::new(field, format!("cannot parse '{}' as a float", s))),
        other => Err(InputValidationError::new(
            field,
            format!("expected a number, got {}", type_name(other)),
        )),
    }
}

fn get_i64(data: &Value, field: &'static str) -> Result<i64, InputValidationError> {
    let value = get_field(data, field)?;
    match value {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| InputValidationError::new(field, "not representable as an integer")),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| InputValidationError::new(field, format!("cannot parse '{}' as an integer", s))),
        other => Err(InputValidationError::new(
            field,
            format!("expected an integer, got {}", type_name(other)),
        )),
    }
}

fn get_string(data: &Value, field: &'static str) -> Result<String, InputValidationError> {
    match get_field(data, field)? {
        Value::String(s) => Ok(s.clone()),
        other => Err(InputValidationError::new(
            field,
            format!("expected a string, got {}", type_name(other)),
        )),
    }
}

fn get_string_list(data: &Value, field: &'static str) -> Result<Vec<String>, InputValidationError> {
    match data.get(field) {
        // Optional field
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                other => Err(InputValidationError::new(
                    field,
                    format!("expected a list of strings, found {}", type_name(other)),
                )),
            })
            .collect(),
        Some(other) => Err(InputValidationError::new(
            field,
            format!("expected a list of strings, got {}", type_name(other)),
        )),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ============================================================================
// TESTS
// ============================================================================
