//! Central Configuration Constants
//!
//! Single source of truth for pipeline defaults and artifact file names.
//! To point the pipeline at a different artifact set, only edit this file
//! or set the environment overrides below.

use std::path::PathBuf;

/// App name (used for platform data directories)
pub const APP_NAME: &str = "stress-assessment";

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default number of cohort neighbors retrieved per recommendation call
pub const DEFAULT_NEIGHBOR_COUNT: usize = 50;

/// Default number of recommendations returned (top-m)
pub const DEFAULT_RECOMMENDATION_COUNT: usize = 5;

/// Substituted for an exactly-zero Stress_Ratio denominator.
/// Smoothing policy inherited from training; changing it breaks numeric
/// parity with persisted historical assessments.
pub const STRESS_RATIO_DENOMINATOR_FLOOR: f32 = 0.001;

/// Social media usage is reported per day but the artifacts were fit on a
/// per-week column. Unit contract; must not change without retraining.
pub const DAYS_PER_WEEK: f32 = 7.0;

// ============================================
// Artifact file names (within the artifact directory)
// ============================================

pub const IMPUTER_FILE: &str = "imputer.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const CLASSIFIER_FILE: &str = "stress_model.onnx";
pub const NEIGHBOR_INDEX_FILE: &str = "knn_index.json";
pub const LABEL_MAP_FILE: &str = "label_map.json";
pub const FEATURE_COLUMNS_FILE: &str = "feature_columns.json";
pub const REC_FEATURE_COLUMNS_FILE: &str = "rec_feature_columns.json";
pub const COHORT_FILE: &str = "cohort.jsonl";

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Get artifact directory from environment or use the platform data dir
pub fn get_artifact_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("STRESS_ARTIFACT_DIR") {
        return PathBuf::from(dir);
    }
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
        .join("models")
}

/// Get assessment history directory from environment or use the platform data dir
pub fn get_history_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("STRESS_HISTORY_DIR") {
        return PathBuf::from(dir);
    }
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
        .join("history")
}
