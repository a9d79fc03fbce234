//! Reference Cohort
//!
//! The historical population behind the neighbor-based recommendations.
//! Loaded once from a JSONL table (one record per line) and read-only for
//! the process lifetime.

use serde::{Deserialize, Serialize};
use std::io::BufRead;
use std::path::Path;

/// One cohort line as written by the training batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CohortLine {
    /// Comma-delimited free text, e.g. "Exercise, Reading, Yoga"
    mechanisms: String,
    /// Observed outcome category, e.g. "Low"
    outcome: String,
}

/// A historical record, ready for aggregation.
#[derive(Debug, Clone)]
pub struct CohortRecord {
    /// Mechanism names, split and trimmed, empty entries dropped
    pub mechanisms: Vec<String>,
    /// Observed outcome category
    pub outcome: String,
    /// Single success rule, precomputed at load: outcome equals the
    /// success label (the class-0 category, "Low")
    pub success: bool,
}

#[derive(Debug)]
pub enum CohortError {
    Io(std::io::Error),
    Parse { line: usize, source: serde_json::Error },
}

impl std::fmt::Display for CohortError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CohortError::Io(e) => write!(f, "Cohort IO error: {}", e),
            CohortError::Parse { line, source } => {
                write!(f, "Cohort parse error on line {}: {}", line, source)
            }
        }
    }
}

impl std::error::Error for CohortError {}

impl From<std::io::Error> for CohortError {
    fn from(err: std::io::Error) -> Self {
        CohortError::Io(err)
    }
}

/// Split a comma-delimited mechanism list, trimming surrounding whitespace
/// and dropping empty entries.
pub fn split_mechanisms(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|m| m.trim())
        .filter(|m| !m.is_empty())
        .map(|m| m.to_string())
        .collect()
}

/// Load the cohort table, precomputing the success flag against the given
/// success label (case-sensitive match on the trimmed outcome).
pub fn load_cohort(path: &Path, success_label: &str) -> Result<Vec<CohortRecord>, CohortError> {
    let file = std::fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);

    let mut records = Vec::new();
    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let parsed: CohortLine = serde_json::from_str(&line).map_err(|source| {
            CohortError::Parse { line: number + 1, source }
        })?;
        let outcome = parsed.outcome.trim().to_string();
        records.push(CohortRecord {
            mechanisms: split_mechanisms(&parsed.mechanisms),
            success: outcome == success_label,
            outcome,
        });
    }
    Ok(records)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_split_mechanisms_trims() {
        assert_eq!(
            split_mechanisms("Exercise, Reading ,Yoga"),
            vec!["Exercise", "Reading", "Yoga"]
        );
    }

    #[test]
    fn test_split_mechanisms_drops_empty() {
        assert_eq!(split_mechanisms("Exercise,,  ,Reading"), vec!["Exercise", "Reading"]);
        assert!(split_mechanisms("").is_empty());
    }

    #[test]
    fn test_load_cohort() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cohort.jsonl");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, r#"{{"mechanisms": "Exercise, Reading", "outcome": "Low"}}"#).unwrap();
        writeln!(file).unwrap();
        writeln!(file, r#"{{"mechanisms": "Gaming", "outcome": "High"}}"#).unwrap();

        let cohort = load_cohort(&path, "Low").unwrap();
        assert_eq!(cohort.len(), 2);
        assert!(cohort[0].success);
        assert_eq!(cohort[0].mechanisms, vec!["Exercise", "Reading"]);
        assert!(!cohort[1].success);
    }

    #[test]
    fn test_load_cohort_bad_line_reports_number() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cohort.jsonl");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, r#"{{"mechanisms": "Exercise", "outcome": "Low"}}"#).unwrap();
        writeln!(file, "not json").unwrap();

        match load_cohort(&path, "Low") {
            Err(CohortError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected parse error, got {:?}", other.map(|v| v.len())),
        }
    }
}
