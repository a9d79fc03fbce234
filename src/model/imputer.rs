//! Mean Imputer
//!
//! Applies the training batch's fitted per-column mean to missing entries.
//! Operates on a raw numeric slice already in the fitted column order; the
//! caller owns that guarantee (name-based reordering happens earlier, at
//! schema selection).

use serde::{Deserialize, Serialize};

use crate::schema::SchemaError;

/// Fitted imputer artifact (`imputer.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeanImputer {
    /// Fitting strategy recorded by the training batch ("mean")
    pub strategy: String,
    /// Per-column fitted statistic, in schema order
    pub statistics: Vec<f32>,
}

impl MeanImputer {
    pub fn len(&self) -> usize {
        self.statistics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statistics.is_empty()
    }

    /// Replace non-finite entries with the fitted per-column statistic.
    ///
    /// Width mismatches fail loudly; they are never broadcast or truncated.
    pub fn transform(&self, vector: &mut [f32]) -> Result<(), SchemaError> {
        if vector.len() != self.statistics.len() {
            return Err(SchemaError::WidthMismatch {
                what: "imputer input",
                expected: self.statistics.len(),
                actual: vector.len(),
            });
        }
        for (value, statistic) in vector.iter_mut().zip(self.statistics.iter()) {
            if !value.is_finite() {
                *value = *statistic;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn imputer(statistics: Vec<f32>) -> MeanImputer {
        MeanImputer { strategy: "mean".to_string(), statistics }
    }

    #[test]
    fn test_fills_missing_with_mean() {
        let imp = imputer(vec![1.0, 2.0, 3.0]);
        let mut x = [10.0, f32::NAN, 30.0];
        imp.transform(&mut x).unwrap();
        assert_eq!(x, [10.0, 2.0, 30.0]);
    }

    #[test]
    fn test_leaves_present_values_untouched() {
        let imp = imputer(vec![5.0, 5.0]);
        let mut x = [0.25, -1.5];
        imp.transform(&mut x).unwrap();
        assert_eq!(x, [0.25, -1.5]);
    }

    #[test]
    fn test_width_mismatch_is_fatal() {
        let imp = imputer(vec![1.0, 2.0]);
        let mut x = [1.0, 2.0, 3.0];
        assert!(matches!(
            imp.transform(&mut x),
            Err(SchemaError::WidthMismatch { expected: 2, actual: 3, .. })
        ));
    }
}
