//! Artifact Store
//!
//! Loads the fitted artifact set produced by the offline training batch and
//! cross-validates it as one unit. Read-only after load; shared across
//! concurrent assessments via `Arc`. Retraining regenerates the files and
//! the store is replaced through [`ArtifactSlot::swap`], never mutated in
//! place.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::constants::{
    CLASSIFIER_FILE, COHORT_FILE, FEATURE_COLUMNS_FILE, IMPUTER_FILE, LABEL_MAP_FILE,
    NEIGHBOR_INDEX_FILE, REC_FEATURE_COLUMNS_FILE, SCALER_FILE,
};
use crate::model::classifier::InferenceError;
use crate::model::labels::{LabelMapError, StressLevel};
use crate::model::{LabelMap, MeanImputer, OnnxClassifier, ProbabilityModel, StandardScaler};
use crate::recommend::cohort::CohortError;
use crate::recommend::engine::IndexError;
use crate::recommend::{load_cohort, CohortRecord, NeighborIndex};
use crate::schema::{FeatureSchema, SchemaError};

// ============================================================================
// ERROR HANDLING
// ============================================================================

/// Any failure while loading or cross-validating an artifact set.
/// Loading aborts on the first failure; a half-loaded store never exists.
#[derive(Debug)]
pub enum ArtifactError {
    Io { file: PathBuf, source: std::io::Error },
    Json { file: PathBuf, source: serde_json::Error },
    Schema(SchemaError),
    Labels(LabelMapError),
    Index(IndexError),
    Cohort(CohortError),
    Model(InferenceError),
    /// Artifacts individually valid but mutually inconsistent
    Inconsistent(String),
}

impl std::fmt::Display for ArtifactError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactError::Io { file, source } => {
                write!(f, "Artifact IO error ({}): {}", file.display(), source)
            }
            ArtifactError::Json { file, source } => {
                write!(f, "Artifact parse error ({}): {}", file.display(), source)
            }
            ArtifactError::Schema(e) => write!(f, "{}", e),
            ArtifactError::Labels(e) => write!(f, "{}", e),
            ArtifactError::Index(e) => write!(f, "{}", e),
            ArtifactError::Cohort(e) => write!(f, "{}", e),
            ArtifactError::Model(e) => write!(f, "{}", e),
            ArtifactError::Inconsistent(msg) => write!(f, "Inconsistent artifact set: {}", msg),
        }
    }
}

impl std::error::Error for ArtifactError {}

impl From<SchemaError> for ArtifactError {
    fn from(err: SchemaError) -> Self {
        ArtifactError::Schema(err)
    }
}

impl From<LabelMapError> for ArtifactError {
    fn from(err: LabelMapError) -> Self {
        ArtifactError::Labels(err)
    }
}

impl From<IndexError> for ArtifactError {
    fn from(err: IndexError) -> Self {
        ArtifactError::Index(err)
    }
}

impl From<CohortError> for ArtifactError {
    fn from(err: CohortError) -> Self {
        ArtifactError::Cohort(err)
    }
}

impl From<InferenceError> for ArtifactError {
    fn from(err: InferenceError) -> Self {
        ArtifactError::Model(err)
    }
}

// ============================================================================
// ARTIFACT STORE
// ============================================================================

/// Metadata about a loaded artifact set, for status reporting.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ArtifactMetadata {
    pub directory: PathBuf,
    pub loaded_at: DateTime<Utc>,
    pub feature_layout_hash: u32,
    pub rec_feature_layout_hash: u32,
    pub cohort_size: usize,
}

/// One immutable, cross-validated artifact set.
pub struct ArtifactStore {
    pub feature_schema: FeatureSchema,
    pub rec_feature_schema: FeatureSchema,
    pub imputer: MeanImputer,
    pub scaler: StandardScaler,
    pub labels: LabelMap,
    pub index: NeighborIndex,
    pub cohort: Vec<CohortRecord>,
    pub metadata: ArtifactMetadata,
    model: Box<dyn ProbabilityModel>,
}

impl std::fmt::Debug for ArtifactStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactStore")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

impl ArtifactStore {
    /// Load the full artifact set with the production ONNX classifier.
    pub fn load(dir: &Path) -> Result<Self, ArtifactError> {
        let feature_schema = FeatureSchema::load(&dir.join(FEATURE_COLUMNS_FILE))?;
        let model = OnnxClassifier::load(&dir.join(CLASSIFIER_FILE), feature_schema.len())?;
        Self::load_with_model(dir, Box::new(model))
    }

    /// Load the tabular artifacts around a caller-supplied model.
    /// Production calls this through [`ArtifactStore::load`]; tests inject a
    /// stub [`ProbabilityModel`].
    pub fn load_with_model(
        dir: &Path,
        model: Box<dyn ProbabilityModel>,
    ) -> Result<Self, ArtifactError> {
        let feature_schema = FeatureSchema::load(&dir.join(FEATURE_COLUMNS_FILE))?;
        let rec_feature_schema = FeatureSchema::load(&dir.join(REC_FEATURE_COLUMNS_FILE))?;
        let imputer: MeanImputer = read_json(&dir.join(IMPUTER_FILE))?;
        let scaler: StandardScaler = read_json(&dir.join(SCALER_FILE))?;
        let labels = LabelMap::load(&dir.join(LABEL_MAP_FILE))?;
        let index = NeighborIndex::load(&dir.join(NEIGHBOR_INDEX_FILE))?;

        labels.expect_classes(StressLevel::COUNT)?;
        let success_label = labels
            .label(StressLevel::Low.index())
            .ok_or_else(|| {
                ArtifactError::Inconsistent("label map has no entry for class 0".to_string())
            })?
            .to_string();
        let cohort = load_cohort(&dir.join(COHORT_FILE), &success_label)?;

        let metadata = ArtifactMetadata {
            directory: dir.to_path_buf(),
            loaded_at: Utc::now(),
            feature_layout_hash: feature_schema.layout_hash,
            rec_feature_layout_hash: rec_feature_schema.layout_hash,
            cohort_size: cohort.len(),
        };

        let store = Self {
            feature_schema,
            rec_feature_schema,
            imputer,
            scaler,
            labels,
            index,
            cohort,
            metadata,
            model,
        };
        store.validate()?;

        log::info!(
            "Artifact set loaded from {} (features v{} hash {:08x}, rec features v{} hash {:08x}, cohort rows: {})",
            store.metadata.directory.display(),
            store.feature_schema.version,
            store.feature_schema.layout_hash,
            store.rec_feature_schema.version,
            store.rec_feature_schema.layout_hash,
            store.cohort.len(),
        );

        Ok(store)
    }

    pub fn model(&self) -> &dyn ProbabilityModel {
        self.model.as_ref()
    }

    /// Cross-validate the artifact set as one unit.
    fn validate(&self) -> Result<(), ArtifactError> {
        self.feature_schema
            .validate_width("imputer statistics", self.imputer.len())?;
        self.feature_schema
            .validate_width("scaler statistics", self.scaler.len())?;
        self.feature_schema
            .validate_width("classifier input", self.model.input_width())?;
        self.rec_feature_schema
            .validate_width("neighbor index", self.index.dim())?;

        if self.index.rows() != self.cohort.len() {
            return Err(ArtifactError::Inconsistent(format!(
                "neighbor index has {} rows but cohort table has {} records",
                self.index.rows(),
                self.cohort.len()
            )));
        }
        Ok(())
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let data = std::fs::read(path).map_err(|source| ArtifactError::Io {
        file: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&data).map_err(|source| ArtifactError::Json {
        file: path.to_path_buf(),
        source,
    })
}

// ============================================================================
// ARTIFACT SLOT (atomic swap)
// ============================================================================

/// Shareable slot holding the current artifact set.
///
/// `get` hands out a cheap `Arc` clone; in-flight assessments keep using
/// the set they started with. `swap` replaces the whole set atomically
/// after retraining; a partially-updated set is never observable.
pub struct ArtifactSlot {
    current: RwLock<Arc<ArtifactStore>>,
}

impl ArtifactSlot {
    pub fn new(store: ArtifactStore) -> Self {
        Self {
            current: RwLock::new(Arc::new(store)),
        }
    }

    pub fn get(&self) -> Arc<ArtifactStore> {
        self.current.read().clone()
    }

    pub fn swap(&self, store: ArtifactStore) {
        let store = Arc::new(store);
        log::info!(
            "Swapping artifact set (cohort rows: {}, feature hash {:08x})",
            store.metadata.cohort_size,
            store.metadata.feature_layout_hash,
        );
        *self.current.write() = store;
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{init_test_logging, write_artifact_dir, StubModel};

    #[test]
    fn test_load_with_model() {
        init_test_logging();
        let dir = tempfile::tempdir().unwrap();
        write_artifact_dir(dir.path());

        let store =
            ArtifactStore::load_with_model(dir.path(), Box::new(StubModel::uniform())).unwrap();
        assert_eq!(store.feature_schema.len(), store.imputer.len());
        assert_eq!(store.index.rows(), store.cohort.len());
        assert_eq!(store.labels.label(0), Some("Low"));
    }

    #[test]
    fn test_load_rejects_width_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        write_artifact_dir(dir.path());
        // Corrupt the imputer: one statistic too few
        std::fs::write(
            dir.path().join(IMPUTER_FILE),
            r#"{"strategy":"mean","statistics":[0.0]}"#,
        )
        .unwrap();

        let err = ArtifactStore::load_with_model(dir.path(), Box::new(StubModel::uniform()))
            .unwrap_err();
        assert!(matches!(err, ArtifactError::Schema(_)));
    }

    #[test]
    fn test_load_rejects_cohort_index_row_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        write_artifact_dir(dir.path());
        // Drop a cohort line so it no longer aligns with the index
        let cohort_path = dir.path().join(COHORT_FILE);
        let contents = std::fs::read_to_string(&cohort_path).unwrap();
        let truncated: Vec<&str> = contents.lines().skip(1).collect();
        std::fs::write(&cohort_path, truncated.join("\n")).unwrap();

        let err = ArtifactStore::load_with_model(dir.path(), Box::new(StubModel::uniform()))
            .unwrap_err();
        assert!(matches!(err, ArtifactError::Inconsistent(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        write_artifact_dir(dir.path());
        std::fs::remove_file(dir.path().join(SCALER_FILE)).unwrap();

        let err = ArtifactStore::load_with_model(dir.path(), Box::new(StubModel::uniform()))
            .unwrap_err();
        assert!(matches!(err, ArtifactError::Io { .. }));
    }

    #[test]
    fn test_slot_swap_is_atomic_reference_swap() {
        let dir = tempfile::tempdir().unwrap();
        write_artifact_dir(dir.path());

        let first =
            ArtifactStore::load_with_model(dir.path(), Box::new(StubModel::uniform())).unwrap();
        let slot = ArtifactSlot::new(first);

        let held = slot.get();
        let second =
            ArtifactStore::load_with_model(dir.path(), Box::new(StubModel::uniform())).unwrap();
        slot.swap(second);

        // The in-flight reference still sees the old set; new calls get the new one
        assert!(!Arc::ptr_eq(&held, &slot.get()));
    }
}
