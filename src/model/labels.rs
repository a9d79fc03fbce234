//! Stress Level Labels
//!
//! The three ordinal stress classes and the label map artifact that binds
//! them to the classifier's integer outputs. The on-disk map may be stored
//! in either direction (label→int from older training runs, int→label from
//! newer ones); it is normalized to int→label at load time.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

// ============================================================================
// STRESS LEVEL
// ============================================================================

/// Ordinal stress categories, index-aligned with the classifier output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StressLevel {
    /// Index 0
    Low,
    /// Index 1
    Medium,
    /// Index 2
    High,
}

impl StressLevel {
    pub const COUNT: usize = 3;

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(StressLevel::Low),
            1 => Some(StressLevel::Medium),
            2 => Some(StressLevel::High),
            _ => None,
        }
    }

    pub fn index(&self) -> usize {
        match self {
            StressLevel::Low => 0,
            StressLevel::Medium => 1,
            StressLevel::High => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StressLevel::Low => "Low",
            StressLevel::Medium => "Medium",
            StressLevel::High => "High",
        }
    }
}

impl std::fmt::Display for StressLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// LABEL MAP
// ============================================================================

#[derive(Debug, Clone)]
pub struct LabelMapError(pub String);

impl std::fmt::Display for LabelMapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Label map error: {}", self.0)
    }
}

impl std::error::Error for LabelMapError {}

/// Normalized int→label mapping loaded from `label_map.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelMap {
    /// Labels indexed by class, 0..n
    labels: Vec<String>,
}

impl LabelMap {
    /// Build from a JSON object, auto-detecting its direction.
    ///
    /// `{"Low": 0, "Medium": 1, ...}` (all-integer values) is inverted;
    /// `{"0": "Low", "1": "Medium", ...}` is cast. Indices must be exactly
    /// 0..n with no gaps.
    pub fn from_json(value: &Value) -> Result<Self, LabelMapError> {
        let object = value
            .as_object()
            .ok_or_else(|| LabelMapError("expected a JSON object".to_string()))?;
        if object.is_empty() {
            return Err(LabelMapError("label map is empty".to_string()));
        }

        let forward = object.values().all(|v| v.is_i64() || v.is_u64());

        let mut pairs: Vec<(usize, String)> = Vec::with_capacity(object.len());
        for (key, val) in object {
            let (index, label) = if forward {
                // label → int
                let index = val
                    .as_i64()
                    .ok_or_else(|| LabelMapError(format!("non-integer index for '{}'", key)))?;
                (index, key.clone())
            } else {
                // int (as string key) → label
                let index = key.parse::<i64>().map_err(|_| {
                    LabelMapError(format!("key '{}' is neither an index nor mapped to one", key))
                })?;
                let label = val
                    .as_str()
                    .ok_or_else(|| LabelMapError(format!("non-string label for index {}", key)))?;
                (index, label.to_string())
            };
            if index < 0 {
                return Err(LabelMapError(format!("negative class index {}", index)));
            }
            pairs.push((index as usize, label));
        }

        pairs.sort_by_key(|(index, _)| *index);
        for (position, (index, _)) in pairs.iter().enumerate() {
            if *index != position {
                return Err(LabelMapError(format!(
                    "class indices are not contiguous from 0 (found {})",
                    index
                )));
            }
        }

        Ok(Self {
            labels: pairs.into_iter().map(|(_, label)| label).collect(),
        })
    }

    pub fn load(path: &Path) -> Result<Self, LabelMapError> {
        let data = std::fs::read(path)
            .map_err(|e| LabelMapError(format!("{}: {}", path.display(), e)))?;
        let value: Value = serde_json::from_slice(&data)
            .map_err(|e| LabelMapError(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&value)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Resolve a class index to its human label
    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(|s| s.as_str())
    }

    /// Require exactly `n` classes (artifact consistency check)
    pub fn expect_classes(&self, n: usize) -> Result<(), LabelMapError> {
        if self.labels.len() != n {
            return Err(LabelMapError(format!(
                "expected {} classes, label map has {}",
                n,
                self.labels.len()
            )));
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_forward_map_inverted() {
        // label → int, as written by older training runs
        let map = LabelMap::from_json(&json!({"Low": 0, "Medium": 1, "High": 2})).unwrap();
        assert_eq!(map.label(0), Some("Low"));
        assert_eq!(map.label(2), Some("High"));
    }

    #[test]
    fn test_inverse_map_cast() {
        // int → label, as written by the current training batch
        let map = LabelMap::from_json(&json!({"0": "Low", "1": "Medium", "2": "High"})).unwrap();
        assert_eq!(map.label(0), Some("Low"));
        assert_eq!(map.label(1), Some("Medium"));
        assert_eq!(map.label(3), None);
    }

    #[test]
    fn test_non_contiguous_rejected() {
        let err = LabelMap::from_json(&json!({"0": "Low", "2": "High"})).unwrap_err();
        assert!(err.0.contains("contiguous"));
    }

    #[test]
    fn test_empty_rejected() {
        assert!(LabelMap::from_json(&json!({})).is_err());
    }

    #[test]
    fn test_expect_classes() {
        let map = LabelMap::from_json(&json!({"0": "Low", "1": "Medium", "2": "High"})).unwrap();
        assert!(map.expect_classes(3).is_ok());
        assert!(map.expect_classes(2).is_err());
    }

    #[test]
    fn test_stress_level_round_trip() {
        for index in 0..StressLevel::COUNT {
            let level = StressLevel::from_index(index).unwrap();
            assert_eq!(level.index(), index);
        }
        assert!(StressLevel::from_index(3).is_none());
    }
}
