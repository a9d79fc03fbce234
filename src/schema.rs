//! Feature Schema - Ordered Column Contract
//!
//! **CRITICAL: column order is the compatibility contract with the fitted
//! artifacts.** A vector built in a different order than the order the
//! imputer/scaler/classifier were fit on silently corrupts predictions, so
//! the schema is loaded from the artifact set itself and validated (width
//! and name) before every inference call.
//!
//! ## Rules (NEVER break these):
//! 1. Retrain → regenerate the schema files together with the models
//! 2. Never reorder or hand-edit a schema file independently of retraining

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ============================================================================
// SCHEMA ERRORS
// ============================================================================

/// Mismatch between a feature vector (or artifact) and the loaded schema.
///
/// Always indicates a deployment/versioning bug, never user input. Must
/// propagate uncaught rather than be silently coerced.
#[derive(Debug, Clone)]
pub enum SchemaError {
    /// A schema column could not be computed from the input record
    MissingFeature { column: String },
    /// Vector or artifact width disagrees with the schema width
    WidthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    /// Schema document is empty or structurally invalid
    InvalidSchema { reason: String },
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaError::MissingFeature { column } => {
                write!(f, "Schema mismatch: feature column '{}' is not produced by the feature builder", column)
            }
            SchemaError::WidthMismatch { what, expected, actual } => {
                write!(f, "Schema mismatch: {} has width {} but schema expects {}", what, actual, expected)
            }
            SchemaError::InvalidSchema { reason } => {
                write!(f, "Invalid feature schema: {}", reason)
            }
        }
    }
}

impl std::error::Error for SchemaError {}

// ============================================================================
// FEATURE SCHEMA
// ============================================================================

/// Ordered feature column list loaded alongside an artifact set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureSchema {
    /// Schema version (defaults to 1 for bare-array documents)
    pub version: u8,
    /// Column names in the exact order the artifacts were fit on
    pub columns: Vec<String>,
    /// CRC32 hash of version + ordered names, for mismatch logging
    pub layout_hash: u32,
}

/// On-disk representation: either a bare `["col", ...]` array (the format
/// the training batch emits) or a versioned `{version, columns}` object.
#[derive(Deserialize)]
#[serde(untagged)]
enum SchemaDocument {
    Columns(Vec<String>),
    Versioned { version: u8, columns: Vec<String> },
}

impl FeatureSchema {
    pub fn new(version: u8, columns: Vec<String>) -> Result<Self, SchemaError> {
        if columns.is_empty() {
            return Err(SchemaError::InvalidSchema {
                reason: "schema has no columns".to_string(),
            });
        }
        let layout_hash = compute_layout_hash(version, &columns);
        Ok(Self { version, columns, layout_hash })
    }

    /// Load a schema document from disk, tolerating both on-disk shapes.
    pub fn load(path: &Path) -> Result<Self, SchemaError> {
        let data = std::fs::read(path).map_err(|e| SchemaError::InvalidSchema {
            reason: format!("{}: {}", path.display(), e),
        })?;
        let doc: SchemaDocument =
            serde_json::from_slice(&data).map_err(|e| SchemaError::InvalidSchema {
                reason: format!("{}: {}", path.display(), e),
            })?;
        match doc {
            SchemaDocument::Columns(columns) => Self::new(1, columns),
            SchemaDocument::Versioned { version, columns } => Self::new(version, columns),
        }
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Get column index by name (O(n) but schemas are small)
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Get column name by index
    pub fn column(&self, index: usize) -> Option<&str> {
        self.columns.get(index).map(|s| s.as_str())
    }

    /// Validate that a vector or fitted artifact has this schema's width
    pub fn validate_width(&self, what: &'static str, actual: usize) -> Result<(), SchemaError> {
        if actual != self.columns.len() {
            return Err(SchemaError::WidthMismatch {
                what,
                expected: self.columns.len(),
                actual,
            });
        }
        Ok(())
    }
}

/// Compute CRC32 hash of a schema layout.
/// Used to log which layout an artifact set was validated against.
pub fn compute_layout_hash(version: u8, columns: &[String]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(&[version]);
    for name in columns {
        hasher.update(name.as_bytes());
        hasher.update(&[0]); // Separator
    }
    hasher.finalize()
}

// ============================================================================
// TESTS
// ============================================================================
