//! Shared test fixtures: a synthetic artifact directory and a stub
//! probability model, so the pipeline can be exercised without a real
//! ONNX export.

use serde_json::json;
use std::io::Write;
use std::path::Path;

use crate::constants::{
    COHORT_FILE, FEATURE_COLUMNS_FILE, IMPUTER_FILE, LABEL_MAP_FILE, NEIGHBOR_INDEX_FILE,
    REC_FEATURE_COLUMNS_FILE, SCALER_FILE,
};
use crate::features::builder::*;
use crate::features::RawInputRecord;
use crate::model::classifier::{InferenceError, ProbabilityModel};

/// Capture `log` output in tests (`RUST_LOG=debug cargo test -- --nocapture`).
/// Safe to call from every test; only the first call installs the logger.
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Training column order, matching the artifact set below.
pub fn test_columns() -> Vec<&'static str> {
    vec![
        COL_AGE,
        COL_GPA,
        COL_STUDY_HOURS,
        COL_SOCIAL_MEDIA,
        COL_SLEEP,
        COL_EXERCISE,
        COL_FAMILY_SUPPORT,
        COL_FINANCIAL_STRESS,
        COL_PEER_PRESSURE,
        COL_RELATIONSHIP_STRESS,
        COL_COUNSELING,
        COL_DIET_QUALITY,
        COL_COGNITIVE_DISTORTIONS,
        COL_FAMILY_MENTAL_HISTORY,
        COL_MEDICAL_CONDITION,
        COL_SUBSTANCE_USE,
        COL_GENDER_FEMALE,
        COL_GENDER_MALE,
        COL_GENDER_OTHER,
        COL_STRESS_RATIO,
    ]
}

pub const TEST_FEATURE_COUNT: usize = 20;

/// Fixed-distribution stand-in for the ONNX classifier.
pub struct StubModel {
    probs: Vec<f32>,
}

impl StubModel {
    pub fn with_probs(probs: [f32; 3]) -> Self {
        Self { probs: probs.to_vec() }
    }

    pub fn uniform() -> Self {
        Self {
            probs: vec![1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0],
        }
    }
}

impl ProbabilityModel for StubModel {
    fn predict_proba(&self, features: &[f32]) -> Result<Vec<f32>, InferenceError> {
        if features.len() != TEST_FEATURE_COUNT {
            return Err(InferenceError(format!(
                "feature vector has width {}, model was fit on {}",
                features.len(),
                TEST_FEATURE_COUNT
            )));
        }
        Ok(self.probs.clone())
    }

    fn input_width(&self) -> usize {
        TEST_FEATURE_COUNT
    }
}

/// Write a small, mutually consistent artifact set (everything except the
/// ONNX model) into `dir`.
pub fn write_artifact_dir(dir: &Path) {
    let columns = test_columns();
    let columns_json = serde_json::to_string(&columns).unwrap();
    std::fs::write(dir.join(FEATURE_COLUMNS_FILE), &columns_json).unwrap();
    std::fs::write(dir.join(REC_FEATURE_COLUMNS_FILE), &columns_json).unwrap();

    let imputer = json!({
        "strategy": "mean",
        "statistics": vec![0.0; TEST_FEATURE_COUNT],
    });
    std::fs::write(dir.join(IMPUTER_FILE), imputer.to_string()).unwrap();

    let scaler = json!({
        "mean": vec![0.0; TEST_FEATURE_COUNT],
        "scale": vec![1.0; TEST_FEATURE_COUNT],
    });
    std::fs::write(dir.join(SCALER_FILE), scaler.to_string()).unwrap();

    std::fs::write(
        dir.join(LABEL_MAP_FILE),
        r#"{"0": "Low", "1": "Medium", "2": "High"}"#,
    )
    .unwrap();

    // Six cohort rows; vectors only differ in the first component so
    // neighbor order is easy to reason about
    let cohort = [
        ("Exercise, Reading, Meditation", "Low"),
        ("Yoga, Exercise", "Low"),
        ("Meditation", "Low"),
        ("Gaming", "High"),
        ("Journaling, Walking", "Medium"),
        ("Walking", "Low"),
    ];

    let vectors: Vec<Vec<f32>> = (0..cohort.len())
        .map(|row| {
            let mut v = vec![0.0f32; TEST_FEATURE_COUNT];
            v[0] = row as f32;
            v
        })
        .collect();
    let index = json!({
        "metric": "euclidean",
        "dim": TEST_FEATURE_COUNT,
        "vectors": vectors,
    });
    std::fs::write(dir.join(NEIGHBOR_INDEX_FILE), index.to_string()).unwrap();

    let mut cohort_file = std::fs::File::create(dir.join(COHORT_FILE)).unwrap();
    for (mechanisms, outcome) in cohort {
        writeln!(
            cohort_file,
            "{}",
            json!({"mechanisms": mechanisms, "outcome": outcome})
        )
        .unwrap();
    }
}

/// The reference scenario record: 22-year-old, gender Female, already using
/// Exercise and Reading.
pub fn sample_record() -> RawInputRecord {
    RawInputRecord {
        age: 22.0,
        gpa: 3.5,
        study_hours: 25.0,
        social_media: 3.0,
        sleep: 7.0,
        exercise: 5.0,
        family_support: 4,
        financial_stress: 2,
        peer_pressure: 3,
        relationship_stress: 2,
        diet_quality: 4,
        cognitive_distortions: 2,
        substance_use: 1,
        counseling: "No".to_string(),
        family_mental_history: "No".to_string(),
        medical_condition: "No".to_string(),
        gender: "Female".to_string(),
        current_mechanisms: vec!["Exercise".to_string(), "Reading".to_string()],
    }
}
