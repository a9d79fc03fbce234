//! Recommendation Module - Cohort Retrieval & Mechanism Ranking
//!
//! Nearest-neighbor retrieval over the historical cohort plus per-mechanism
//! success aggregation. Deterministic end to end.

pub mod cohort;
pub mod engine;

// Re-export common types
pub use cohort::{load_cohort, split_mechanisms, CohortError, CohortRecord};
pub use engine::{
    aggregate_mechanisms, normalize_mechanism, recommend, IndexError, MechanismStat,
    NeighborIndex, NeighborIndexArtifact, Recommendation,
};
