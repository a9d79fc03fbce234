//! Features Module - Input Validation & Feature Engineering
//!
//! Turns a raw self-report into the fixed-order numeric vectors the fitted
//! artifacts expect. Column order is applied only at selection time against
//! a loaded schema.

pub mod builder;
pub mod record;

// Re-export common types
pub use builder::{build_feature_frame, stress_ratio, FeatureFrame};
pub use record::{Gender, InputValidationError, RawInputRecord};
