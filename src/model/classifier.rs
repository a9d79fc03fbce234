//! Classifier - ONNX Runtime Integration
//!
//! Loads and runs the exported stress classifier. Kept behind a small trait
//! so the pipeline can be exercised with a stub model in tests.

use ndarray::Array2;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use parking_lot::Mutex;
use std::path::Path;

use super::labels::StressLevel;

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug)]
pub struct InferenceError(pub String);

impl std::fmt::Display for InferenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "InferenceError: {}", self.0)
    }
}

impl std::error::Error for InferenceError {}

// ============================================================================
// PROBABILITY MODEL TRAIT
// ============================================================================

/// Trait for 3-class probability classifiers (ONNX in production, stubs in
/// tests).
pub trait ProbabilityModel: Send + Sync {
    /// Predict the class probability distribution for one feature vector.
    /// The vector must already be imputed, scaled, and in fitted order.
    fn predict_proba(&self, features: &[f32]) -> Result<Vec<f32>, InferenceError>;

    /// Width of the feature vector the model was fit on
    fn input_width(&self) -> usize;
}

// ============================================================================
// ARGMAX
// ============================================================================

/// Index of the maximum probability, `None` for an empty slice.
///
/// Ties break to the LOWEST index, i.e. Low is preferred over Medium over
/// High. This materially changes the risk message shown to the student, so
/// it is deliberate and tested, not an accident of iteration order.
pub fn argmax(probabilities: &[f32]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (index, &p) in probabilities.iter().enumerate() {
        let better = match best {
            Some(current) => p > probabilities[current],
            None => true,
        };
        if better {
            best = Some(index);
        }
    }
    best
}

/// Validate a model output distribution before it reaches a caller.
/// Garbage output fails loudly instead of producing a plausible response.
pub fn validate_distribution(probabilities: &[f32]) -> Result<(), InferenceError> {
    if probabilities.len() != StressLevel::COUNT {
        return Err(InferenceError(format!(
            "model produced {} class probabilities, expected {}",
            probabilities.len(),
            StressLevel::COUNT
        )));
    }
    let sum: f32 = probabilities.iter().sum();
    if !sum.is_finite() || (sum - 1.0).abs() > 1e-3 {
        return Err(InferenceError(format!(
            "model probabilities sum to {}, expected 1.0",
            sum
        )));
    }
    Ok(())
}

// ============================================================================
// ONNX IMPLEMENTATION
// ============================================================================

/// Classifier artifact backed by an ONNX Runtime session.
pub struct OnnxClassifier {
    // Session::run needs exclusive access; concurrent assessments serialize
    // on this lock while everything else stays share-only.
    session: Mutex<Session>,
    input_width: usize,
    output_names: Vec<String>,
}

impl OnnxClassifier {
    /// Load the classifier from an .onnx file.
    pub fn load(model_path: &Path, input_width: usize) -> Result<Self, InferenceError> {
        log::info!("Loading ONNX classifier from: {}", model_path.display());

        if !model_path.exists() {
            return Err(InferenceError(format!(
                "Model not found: {}",
                model_path.display()
            )));
        }

        let session = Session::builder()
            .map_err(|e| InferenceError(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| InferenceError(format!("Failed to set optimization: {}", e)))?
            .commit_from_file(model_path)
            .map_err(|e| InferenceError(format!("Failed to load model: {}", e)))?;

        let output_names: Vec<String> = session.outputs.iter().map(|o| o.name.clone()).collect();
        if output_names.is_empty() {
            return Err(InferenceError("Model defines no outputs".to_string()));
        }

        log::info!("ONNX classifier loaded successfully");

        Ok(Self {
            session: Mutex::new(session),
            input_width,
            output_names,
        })
    }
}

impl ProbabilityModel for OnnxClassifier {
    fn predict_proba(&self, features: &[f32]) -> Result<Vec<f32>, InferenceError> {
        if features.len() != self.input_width {
            return Err(InferenceError(format!(
                "feature vector has width {}, model was fit on {}",
                features.len(),
                self.input_width
            )));
        }

        let input_array = Array2::<f32>::from_shape_vec((1, features.len()), features.to_vec())
            .map_err(|e| InferenceError(format!("Array error: {}", e)))?;

        let input_tensor = Value::from_array(input_array)
            .map_err(|e| InferenceError(format!("Tensor error: {}", e)))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| InferenceError(format!("Inference failed: {}", e)))?;

        // Classifier exports commonly carry a label output ahead of the
        // probability output; take the first output that extracts as an f32
        // tensor of class width.
        for name in &self.output_names {
            let Some(output) = outputs.get(name) else {
                continue;
            };
            if let Ok(tensor) = output.try_extract_tensor::<f32>() {
                let data = tensor.1;
                if data.len() == StressLevel::COUNT {
                    return Ok(data.to_vec());
                }
            }
        }

        Err(InferenceError(
            "no model output is an f32 tensor of class width".to_string(),
        ))
    }

    fn input_width(&self) -> usize {
        self.input_width
    }
}

// ============================================================================
// TESTS
// ============================================================================
