//! Student Stress Assessment - Inference & Recommendation Core
//!
//! The algorithmic core behind the assessment service: deterministic
//! feature engineering, a fixed-order column selection contract,
//! imputation/scaling, 3-class stress classification, nearest-neighbor
//! retrieval over a historical cohort, and coping-mechanism ranking.
//!
//! The surrounding web server, authentication, and persistence are external
//! collaborators: they validate/authenticate a request, call
//! [`pipeline::assess`] with a [`features::RawInputRecord`] and a shared
//! [`artifacts::ArtifactStore`], and store or display the returned
//! [`pipeline::AssessmentResult`].
//!
//! ## Architecture
//! - `schema/` - ordered feature column contract, validated per call
//! - `features/` - input validation and feature engineering
//! - `model/` - impute → scale → classify (ONNX) → label resolution
//! - `recommend/` - cohort neighbor retrieval and mechanism ranking
//! - `artifacts` - load-once immutable artifact set, atomic swap on retrain
//! - `pipeline` - one synchronous assessment pass
//! - `history` - persistence hand-off payload for the storage collaborator

pub mod artifacts;
pub mod constants;
pub mod features;
pub mod history;
pub mod model;
pub mod pipeline;
pub mod recommend;
pub mod schema;

#[cfg(test)]
pub(crate) mod testing;

// Re-export the request-facing surface
pub use artifacts::{ArtifactError, ArtifactSlot, ArtifactStore};
pub use features::{InputValidationError, RawInputRecord};
pub use pipeline::{
    assess, drop_probability, AssessError, AssessOptions, AssessmentResult, ClassProbabilities,
};
pub use recommend::Recommendation;
pub use schema::{FeatureSchema, SchemaError};
