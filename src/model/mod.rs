//! Model Module - Fitted Transformers & Classifier
//!
//! The impute → scale → classify chain, plus label resolution. Every part
//! here consumes a vector that is already in its fitted column order; the
//! schema layer upstream owns that contract.

pub mod classifier;
pub mod imputer;
pub mod labels;
pub mod scaler;

// Re-export common types
pub use classifier::{argmax, InferenceError, OnnxClassifier, ProbabilityModel};
pub use imputer::MeanImputer;
pub use labels::{LabelMap, LabelMapError, StressLevel};
pub use scaler::StandardScaler;
