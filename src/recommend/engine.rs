//! Recommendation Engine
//!
//! Retrieves the k nearest cohort records under Euclidean distance in the
//! recommendation feature space, aggregates per-mechanism success among
//! them, excludes what the student already does, and returns the top-m.
//! Fully deterministic: brute-force search ordered by (distance, row),
//! stable ranking, no randomness at inference time.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::schema::SchemaError;

use super::cohort::CohortRecord;

// ============================================================================
// NEIGHBOR INDEX
// ============================================================================

/// On-disk neighbor index artifact (`knn_index.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeighborIndexArtifact {
    /// Distance metric recorded by the training batch ("euclidean")
    pub metric: String,
    /// Feature-space width
    pub dim: usize,
    /// Cohort vectors, row i aligned with cohort record i
    pub vectors: Vec<Vec<f32>>,
}

#[derive(Debug)]
pub struct IndexError(pub String);

impl std::fmt::Display for IndexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Neighbor index error: {}", self.0)
    }
}

impl std::error::Error for IndexError {}

/// In-memory cohort matrix for nearest-neighbor retrieval.
#[derive(Debug, Clone)]
pub struct NeighborIndex {
    matrix: Array2<f32>,
}

impl NeighborIndex {
    pub fn from_artifact(artifact: NeighborIndexArtifact) -> Result<Self, IndexError> {
        if artifact.metric != "euclidean" {
            return Err(IndexError(format!(
                "unsupported metric '{}', only euclidean is supported",
                artifact.metric
            )));
        }
        let rows = artifact.vectors.len();
        let mut data = Vec::with_capacity(rows * artifact.dim);
        for (row, vector) in artifact.vectors.iter().enumerate() {
            if vector.len() != artifact.dim {
                return Err(IndexError(format!(
                    "row {} has width {}, index declares dim {}",
                    row,
                    vector.len(),
                    artifact.dim
                )));
            }
            // A non-finite entry would poison every distance comparison
            // against this row, so the whole artifact is rejected at load
            if let Some(column) = vector.iter().position(|v| !v.is_finite()) {
                return Err(IndexError(format!(
                    "row {} has a non-finite value in column {}",
                    row, column
                )));
            }
            data.extend_from_slice(vector);
        }
        let matrix = Array2::from_shape_vec((rows, artifact.dim), data)
            .map_err(|e| IndexError(format!("matrix shape error: {}", e)))?;
        Ok(Self { matrix })
    }

    pub fn load(path: &Path) -> Result<Self, IndexError> {
        let data = std::fs::read(path)
            .map_err(|e| IndexError(format!("{}: {}", path.display(), e)))?;
        let artifact: NeighborIndexArtifact = serde_json::from_slice(&data)
            .map_err(|e| IndexError(format!("{}: {}", path.display(), e)))?;
        Self::from_artifact(artifact)
    }

    /// Number of cohort rows
    pub fn rows(&self) -> usize {
        self.matrix.nrows()
    }

    /// Feature-space width
    pub fn dim(&self) -> usize {
        self.matrix.ncols()
    }

    /// Indices of the k nearest rows to the query, closest first.
    ///
    /// Equal distances order by row index, so retrieval is reproducible
    /// across runs. k is capped at the row count.
    pub fn kneighbors(&self, query: &[f32], k: usize) -> Result<Vec<usize>, SchemaError> {
        if query.len() != self.dim() {
            return Err(SchemaError::WidthMismatch {
                what: "neighbor query",
                expected: self.dim(),
                actual: query.len(),
            });
        }

        let mut distances: Vec<(f32, usize)> = self
            .matrix
            .rows()
            .into_iter()
            .enumerate()
            .map(|(row, vector)| {
                let squared: f32 = vector
                    .iter()
                    .zip(query.iter())
                    .map(|(a, b)| (a - b) * (a - b))
                    .sum();
                (squared, row)
            })
            .collect();

        // Stable by construction: ties on distance fall back to row order
        distances.sort_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.1.cmp(&b.1))
        });

        Ok(distances
            .into_iter()
            .take(k.min(self.rows()))
            .map(|(_, row)| row)
            .collect())
    }
}

// ============================================================================
// MECHANISM AGGREGATION
// ============================================================================

/// Per-mechanism usage/success accumulator over a neighbor subset.
#[derive(Debug, Clone)]
pub struct MechanismStat {
    /// Display name: first-encountered trimmed form
    pub name: String,
    /// Normalized key used for identity and exclusion
    key: String,
    pub used: u32,
    pub success: u32,
}

impl MechanismStat {
    pub fn success_rate(&self) -> f32 {
        // used is never 0: a stat only exists once a neighbor used it
        self.success as f32 / self.used as f32
    }
}

/// One ranked recommendation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub mechanism: String,
    pub success_rate: f32,
}

/// Case/whitespace normalization for mechanism identity.
pub fn normalize_mechanism(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Aggregate mechanism stats over the given cohort records, preserving
/// first-encountered order.
pub fn aggregate_mechanisms(neighbors: &[&CohortRecord]) -> Vec<MechanismStat> {
    let mut stats: Vec<MechanismStat> = Vec::new();
    for record in neighbors {
        for mechanism in &record.mechanisms {
            let key = normalize_mechanism(mechanism);
            if key.is_empty() {
                continue;
            }
            let stat = match stats.iter_mut().find(|s| s.key == key) {
                Some(stat) => stat,
                None => {
                    stats.push(MechanismStat {
                        name: mechanism.trim().to_string(),
                        key,
                        used: 0,
                        success: 0,
                    });
                    stats.last_mut().unwrap()
                }
            };
            stat.used += 1;
            if record.success {
                stat.success += 1;
            }
        }
    }
    stats
}

/// Full recommendation pass: retrieve, aggregate, exclude, rank, truncate.
///
/// An empty result (all neighbor mechanisms excluded, or no neighbors) is a
/// valid outcome, not an error.
pub fn recommend(
    index: &NeighborIndex,
    cohort: &[CohortRecord],
    query: &[f32],
    current_mechanisms: &[String],
    k: usize,
    m: usize,
) -> Result<Vec<Recommendation>, SchemaError> {
    if index.rows() != cohort.len() {
        return Err(SchemaError::WidthMismatch {
            what: "neighbor index rows vs cohort records",
            expected: cohort.len(),
            actual: index.rows(),
        });
    }

    let neighbor_rows = index.kneighbors(query, k)?;
    let neighbors: Vec<&CohortRecord> = neighbor_rows.iter().map(|&row| &cohort[row]).collect();

    let stats = aggregate_mechanisms(&neighbors);

    let excluded: Vec<String> = current_mechanisms
        .iter()
        .map(|m| normalize_mechanism(m))
        .collect();

    let mut ranked: Vec<MechanismStat> = stats
        .into_iter()
        .filter(|stat| !excluded.contains(&stat.key))
        .collect();

    // Stable sort: equal success rates keep first-encountered order
    ranked.sort_by(|a, b| {
        b.success_rate()
            .partial_cmp(&a.success_rate())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(m);

    Ok(ranked
        .into_iter()
        .map(|stat| Recommendation {
            success_rate: stat.success_rate(),
            mechanism: stat.name,
        })
        .collect())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommend::cohort::split_mechanisms;

    fn record(mechanisms: &str, success: bool) -> CohortRecord {
        CohortRecord {
            mechanisms: split_mechanisms(mechanisms),
            outcome: if success { "Low" } else { "High" }.to_string(),
            success,
        }
    }

    fn index(vectors: Vec<Vec<f32>>) -> NeighborIndex {
        let dim = vectors[0].len();
        NeighborIndex::from_artifact(NeighborIndexArtifact {
            metric: "euclidean".to_string(),
            dim,
            vectors,
        })
        .unwrap()
    }

    #[test]
    fn test_kneighbors_orders_by_distance() {
        let idx = index(vec![vec![10.0], vec![1.0], vec![5.0]]);
        assert_eq!(idx.kneighbors(&[0.0], 3).unwrap(), vec![1, 2, 0]);
        assert_eq!(idx.kneighbors(&[0.0], 2).unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_kneighbors_tie_orders_by_row() {
        // Rows 0 and 2 are equidistant from the query
        let idx = index(vec![vec![2.0], vec![5.0], vec![-2.0]]);
        assert_eq!(idx.kneighbors(&[0.0], 3).unwrap(), vec![0, 2, 1]);
    }

    #[test]
    fn test_kneighbors_k_capped_at_rows() {
        let idx = index(vec![vec![1.0], vec![2.0]]);
        assert_eq!(idx.kneighbors(&[0.0], 50).unwrap().len(), 2);
    }

    #[test]
    fn test_kneighbors_width_mismatch_is_fatal() {
        let idx = index(vec![vec![1.0, 2.0]]);
        assert!(idx.kneighbors(&[0.0], 1).is_err());
    }

    #[test]
    fn test_bad_artifact_row_width_rejected() {
        let artifact = NeighborIndexArtifact {
            metric: "euclidean".to_string(),
            dim: 2,
            vectors: vec![vec![1.0, 2.0], vec![3.0]],
        };
        assert!(NeighborIndex::from_artifact(artifact).is_err());
    }

    #[test]
    fn test_non_finite_artifact_entry_rejected() {
        // A NaN row would compare Equal against every query and corrupt
        // neighbor ordering; it must never make it past load
        let artifact = NeighborIndexArtifact {
            metric: "euclidean".to_string(),
            dim: 2,
            vectors: vec![vec![1.0, 2.0], vec![f32::NAN, 0.0]],
        };
        let err = NeighborIndex::from_artifact(artifact).unwrap_err();
        assert!(err.0.contains("non-finite"));

        let infinite = NeighborIndexArtifact {
            metric: "euclidean".to_string(),
            dim: 1,
            vectors: vec![vec![f32::INFINITY]],
        };
        assert!(NeighborIndex::from_artifact(infinite).is_err());
    }

    #[test]
    fn test_aggregate_counts_and_order() {
        let records = [
            record("Exercise, Reading", true),
            record("Reading, Yoga", false),
            record("Exercise", true),
        ];
        let refs: Vec<&CohortRecord> = records.iter().collect();
        let stats = aggregate_mechanisms(&refs);

        // First-encountered order preserved
        let names: Vec<&str> = stats.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Exercise", "Reading", "Yoga"]);

        assert_eq!(stats[0].used, 2);
        assert_eq!(stats[0].success, 2);
        assert_eq!(stats[1].used, 2);
        assert_eq!(stats[1].success, 1);
        assert_eq!(stats[2].used, 1);
        assert_eq!(stats[2].success, 0);
    }

    #[test]
    fn test_aggregate_normalizes_identity() {
        let records = [record("Exercise", true), record(" exercise ", false)];
        let refs: Vec<&CohortRecord> = records.iter().collect();
        let stats = aggregate_mechanisms(&refs);

        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].name, "Exercise");
        assert_eq!(stats[0].used, 2);
    }

    #[test]
    fn test_recommend_excludes_current_mechanisms() {
        let idx = index(vec![vec![0.0], vec![1.0], vec![2.0]]);
        let cohort = vec![
            record("Exercise, Reading", true),
            record("Yoga", true),
            record("Gaming", false),
        ];
        let current = vec!["exercise".to_string(), " Reading ".to_string()];

        let recs = recommend(&idx, &cohort, &[0.0], &current, 3, 5).unwrap();
        let names: Vec<&str> = recs.iter().map(|r| r.mechanism.as_str()).collect();
        assert!(!names.contains(&"Exercise"));
        assert!(!names.contains(&"Reading"));
        assert!(names.contains(&"Yoga"));
    }

    #[test]
    fn test_recommend_ranks_by_success_rate() {
        let idx = index(vec![vec![0.0], vec![1.0], vec![2.0], vec![3.0]]);
        let cohort = vec![
            record("Gaming", false),
            record("Gaming, Yoga", true),
            record("Yoga", true),
            record("Meditation", true),
        ];

        let recs = recommend(&idx, &cohort, &[0.0], &[], 4, 5).unwrap();
        assert_eq!(recs.len(), 3);
        // Yoga 2/2 and Meditation 1/1 tie at 1.0; Yoga was encountered first
        assert_eq!(recs[0].mechanism, "Yoga");
        assert_eq!(recs[1].mechanism, "Meditation");
        // Gaming 1/2 ranks last
        assert_eq!(recs[2].mechanism, "Gaming");
        assert_eq!(recs[2].success_rate, 0.5);
    }

    #[test]
    fn test_recommend_tie_keeps_first_encountered_order() {
        let idx = index(vec![vec![0.0], vec![1.0]]);
        let cohort = vec![record("Yoga", true), record("Meditation", true)];

        let recs = recommend(&idx, &cohort, &[0.0], &[], 2, 5).unwrap();
        assert_eq!(recs[0].mechanism, "Yoga");
        assert_eq!(recs[1].mechanism, "Meditation");
        assert_eq!(recs[0].success_rate, 1.0);
        assert_eq!(recs[1].success_rate, 1.0);
    }

    #[test]
    fn test_recommend_truncates_to_m() {
        let idx = index(vec![vec![0.0]]);
        let cohort = vec![record("A, B, C, D, E, F, G", true)];

        let recs = recommend(&idx, &cohort, &[0.0], &[], 1, 5).unwrap();
        assert_eq!(recs.len(), 5);
    }

    #[test]
    fn test_recommend_all_excluded_is_empty_not_error() {
        let idx = index(vec![vec![0.0]]);
        let cohort = vec![record("Exercise", true)];
        let current = vec!["Exercise".to_string()];

        let recs = recommend(&idx, &cohort, &[0.0], &current, 1, 5).unwrap();
        assert!(recs.is_empty());
    }

    #[test]
    fn test_recommend_row_count_mismatch_is_fatal() {
        let idx = index(vec![vec![0.0], vec![1.0]]);
        let cohort = vec![record("Exercise", true)];
        assert!(recommend(&idx, &cohort, &[0.0], &[], 1, 5).is_err());
    }
}
