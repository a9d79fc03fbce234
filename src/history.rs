//! Assessment History - Persistence Hand-off
//!
//! The storage collaborator owns real persistence; this module only defines
//! the hand-off payload and a local append-only JSONL log of completed
//! assessments, rotated by size. The pipeline itself never writes here.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;

use crate::constants::get_history_dir;
use crate::features::RawInputRecord;
use crate::pipeline::AssessmentResult;

const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024; // 10 MB

/// One completed assessment: full raw input plus the pipeline output,
/// associated with an optional profile and timestamped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentRecord {
    pub profile_id: Option<i64>,
    pub recorded_at: DateTime<Utc>,
    pub input: RawInputRecord,
    pub result: AssessmentResult,
}

impl AssessmentRecord {
    pub fn new(profile_id: Option<i64>, input: RawInputRecord, result: AssessmentResult) -> Self {
        Self {
            profile_id,
            recorded_at: Utc::now(),
            input,
            result,
        }
    }
}

pub struct HistoryWriter {
    file: Mutex<Option<File>>,
    base_dir: PathBuf,
}

impl HistoryWriter {
    pub fn new() -> Self {
        Self::from_path(get_history_dir())
    }

    pub fn from_path(base_dir: PathBuf) -> Self {
        if let Err(e) = fs::create_dir_all(&base_dir) {
            log::warn!("Failed to create history directory: {}", e);
        }

        Self {
            file: Mutex::new(None),
            base_dir,
        }
    }

    /// Append a record to the history log.
    /// Handles file rotation automatically.
    pub fn append(&self, record: &AssessmentRecord) -> io::Result<()> {
        let mut file_guard = self.file.lock();

        // If file not open, continue the latest log or start a new one
        if file_guard.is_none() {
            let latest = self.find_latest_log_file()?;
            if let Some(path) = latest {
                let f = OpenOptions::new().create(true).append(true).open(&path)?;
                if f.metadata()?.len() < MAX_FILE_SIZE {
                    *file_guard = Some(f);
                } else {
                    *file_guard = Some(self.create_new_file()?);
                }
            } else {
                *file_guard = Some(self.create_new_file()?);
            }
        }

        let should_rotate = if let Some(f) = file_guard.as_ref() {
            f.metadata()?.len() >= MAX_FILE_SIZE
        } else {
            false
        };

        if should_rotate {
            *file_guard = Some(self.create_new_file()?);
        }

        if let Some(file) = file_guard.as_mut() {
            let json = serde_json::to_string(record)?;
            writeln!(file, "{}", json)?;
        }

        Ok(())
    }

    fn create_new_file(&self) -> io::Result<File> {
        let now = Utc::now();
        // timestamp format: YYYY-MM-DD-HHMMSS
        let filename = format!("assessments-{}.jsonl", now.format("%Y-%m-%d-%H%M%S"));
        let path = self.base_dir.join(filename);

        OpenOptions::new().create(true).append(true).open(path)
    }

    fn find_latest_log_file(&self) -> io::Result<Option<PathBuf>> {
        let mut entries = fs::read_dir(&self.base_dir)?
            .filter_map(|res| res.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().map_or(false, |ext| ext == "jsonl"))
            .collect::<Vec<_>>();

        if entries.is_empty() {
            return Ok(None);
        }

        // Sort by filename (timestamp ensures order)
        entries.sort();
        Ok(entries.last().cloned())
    }
}

impl Default for HistoryWriter {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
