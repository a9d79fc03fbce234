//! Assessment Pipeline
//!
//! One synchronous, stateless pass: feature building → schema selection →
//! impute → scale → classify → label resolution → neighbor recommendation →
//! drop probability. A call either yields a fully populated
//! [`AssessmentResult`] or an error; there are no partial responses.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::artifacts::ArtifactStore;
use crate::constants::{DEFAULT_NEIGHBOR_COUNT, DEFAULT_RECOMMENDATION_COUNT};
use crate::features::{build_feature_frame, InputValidationError, RawInputRecord};
use crate::model::classifier::{argmax, validate_distribution, InferenceError};
use crate::model::StressLevel;
use crate::recommend::{recommend, Recommendation};
use crate::schema::SchemaError;

// ============================================================================
// METRICS
// ============================================================================

/// Latency stats
static LATENCY_SUM: AtomicU64 = AtomicU64::new(0);
static ASSESS_COUNT: AtomicU64 = AtomicU64::new(0);

/// Pipeline status for status endpoints / dashboards
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineStatus {
    pub avg_latency_ms: f32,
    pub assess_count: u64,
}

pub fn get_status() -> PipelineStatus {
    let sum = LATENCY_SUM.load(Ordering::Relaxed);
    let count = ASSESS_COUNT.load(Ordering::Relaxed);
    let avg = if count > 0 { (sum as f32 / count as f32) / 1000.0 } else { 0.0 };

    PipelineStatus {
        avg_latency_ms: avg,
        assess_count: count,
    }
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

/// Request-time pipeline failure.
#[derive(Debug)]
pub enum AssessError {
    /// Bad user input; the boundary maps this to a 400-equivalent payload
    Input(InputValidationError),
    /// Vector/artifact disagreement; a deployment bug, fail loudly (5xx)
    Schema(SchemaError),
    /// Model runtime failure or garbage output; fail loudly (5xx)
    Inference(InferenceError),
}

impl AssessError {
    /// Whether the failure is the caller's fault (400) rather than a broken
    /// deployment (5xx).
    pub fn is_client_error(&self) -> bool {
        matches!(self, AssessError::Input(_))
    }
}

impl std::fmt::Display for AssessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssessError::Input(e) => write!(f, "{}", e),
            AssessError::Schema(e) => write!(f, "{}", e),
            AssessError::Inference(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for AssessError {}

impl From<InputValidationError> for AssessError {
    fn from(err: InputValidationError) -> Self {
        AssessError::Input(err)
    }
}

impl From<SchemaError> for AssessError {
    fn from(err: SchemaError) -> Self {
        AssessError::Schema(err)
    }
}

impl From<InferenceError> for AssessError {
    fn from(err: InferenceError) -> Self {
        AssessError::Inference(err)
    }
}

// ============================================================================
// RESPONSE TYPES
// ============================================================================

/// Calibrated 3-class distribution, index-aligned Low/Medium/High.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassProbabilities {
    #[serde(rename = "Low")]
    pub low: f32,
    #[serde(rename = "Medium")]
    pub medium: f32,
    #[serde(rename = "High")]
    pub high: f32,
}

impl ClassProbabilities {
    pub fn from_slice(probs: &[f32]) -> Result<Self, InferenceError> {
        validate_distribution(probs)?;
        Ok(Self {
            low: probs[0],
            medium: probs[1],
            high: probs[2],
        })
    }

    pub fn get(&self, level: StressLevel) -> f32 {
        match level {
            StressLevel::Low => self.low,
            StressLevel::Medium => self.medium,
            StressLevel::High => self.high,
        }
    }

    pub fn sum(&self) -> f32 {
        self.low + self.medium + self.high
    }
}

/// The pipeline's sole externally visible output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub predicted_label: String,
    pub probabilities: ClassProbabilities,
    pub drop_probability: f32,
    pub recommendations: Vec<Recommendation>,
}

/// Tunables for one assessment call.
#[derive(Debug, Clone, Copy)]
pub struct AssessOptions {
    /// Cohort neighbors retrieved (k)
    pub neighbor_count: usize,
    /// Recommendations returned (top-m)
    pub recommendation_count: usize,
}

impl Default for AssessOptions {
    fn default() -> Self {
        Self {
            neighbor_count: DEFAULT_NEIGHBOR_COUNT,
            recommendation_count: DEFAULT_RECOMMENDATION_COUNT,
        }
    }
}

// ============================================================================
// DROP PROBABILITY
// ============================================================================

/// Probability mass assigned to categories strictly better than the
/// predicted one. Pure function; the exact branching is a compatibility
/// contract with persisted historical assessments.
pub fn drop_probability(predicted: StressLevel, probabilities: &ClassProbabilities) -> f32 {
    match predicted {
        StressLevel::High => probabilities.low + probabilities.medium,
        StressLevel::Medium => probabilities.low,
        StressLevel::Low => 0.0,
    }
}

// ============================================================================
// ASSESSMENT
// ============================================================================

/// Run the full inference-and-recommendation pipeline for one record.
pub fn assess(
    store: &ArtifactStore,
    record: &RawInputRecord,
    options: &AssessOptions,
) -> Result<AssessmentResult, AssessError> {
    let start_time = std::time::Instant::now();

    // Feature engineering and fixed-order selection
    let frame = build_feature_frame(record)?;
    let mut vector = frame.select(&store.feature_schema)?;

    // Impute and scale on the raw array, already in fitted column order
    store.imputer.transform(&mut vector)?;
    store.scaler.transform(&mut vector)?;

    // Classify
    let probs = store.model().predict_proba(&vector)?;
    let probabilities = ClassProbabilities::from_slice(&probs)?;
    let predicted_index = argmax(&probs)
        .ok_or_else(|| InferenceError("model produced an empty distribution".to_string()))?;
    let predicted = StressLevel::from_index(predicted_index).ok_or_else(|| {
        InferenceError(format!("predicted class index {} out of range", predicted_index))
    })?;
    let predicted_label = store
        .labels
        .label(predicted_index)
        .ok_or_else(|| {
            InferenceError(format!("label map has no entry for class {}", predicted_index))
        })?
        .to_string();

    // Neighbor-based recommendations (raw recommendation feature space)
    let rec_vector = frame.select(&store.rec_feature_schema)?;
    let recommendations = recommend(
        &store.index,
        &store.cohort,
        &rec_vector,
        &record.current_mechanisms,
        options.neighbor_count,
        options.recommendation_count,
    )?;

    let p_drop = drop_probability(predicted, &probabilities);

    let elapsed_us = start_time.elapsed().as_micros() as u64;
    LATENCY_SUM.fetch_add(elapsed_us, Ordering::Relaxed);
    ASSESS_COUNT.fetch_add(1, Ordering::Relaxed);

    log::debug!(
        "Assessment: predicted={} p_drop={:.3} recommendations={} ({} us)",
        predicted_label,
        p_drop,
        recommendations.len(),
        elapsed_us,
    );

    Ok(AssessmentResult {
        predicted_label,
        probabilities,
        drop_probability: p_drop,
        recommendations,
    })
}

// ============================================================================
// TESTS
// ============================================================================
