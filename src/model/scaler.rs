//! Standard Scaler
//!
//! Per-column standardization with the statistics fitted offline:
//! `(x - mean) / scale`. Same ordering contract as the imputer.

use serde::{Deserialize, Serialize};

use crate::schema::SchemaError;

/// Fitted scaler artifact (`scaler.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Per-column fitted mean, in schema order
    pub mean: Vec<f32>,
    /// Per-column fitted scale (standard deviation), in schema order
    pub scale: Vec<f32>,
}

impl StandardScaler {
    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    /// Standardize the vector in place.
    pub fn transform(&self, vector: &mut [f32]) -> Result<(), SchemaError> {
        if self.mean.len() != self.scale.len() {
            return Err(SchemaError::WidthMismatch {
                what: "scaler artifact (mean vs scale)",
                expected: self.mean.len(),
                actual: self.scale.len(),
            });
        }
        if vector.len() != self.mean.len() {
            return Err(SchemaError::WidthMismatch {
                what: "scaler input",
                expected: self.mean.len(),
                actual: vector.len(),
            });
        }
        for i in 0..vector.len() {
            // Constant columns are fitted with scale 0; the training library
            // treats that as 1 and so do we.
            let scale = if self.scale[i] == 0.0 { 1.0 } else { self.scale[i] };
            vector[i] = (vector[i] - self.mean[i]) / scale;
        }
        Ok(())
    }
}
