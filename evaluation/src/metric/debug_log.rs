//! Append-only JSONL log of low-scoring translations for manual review

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Category contributions that made up a score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreParts {
    pub sentinel: f64,
    pub hard: f64,
    pub soft: f64,
}

/// One line of the debug log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LowScoreRecord {
    pub original: String,
    pub translated: String,
    pub rationale: String,
    pub score_parts: ScoreParts,
}

/// Best-effort writer: failures are logged, never returned.
#[derive(Debug, Clone)]
pub struct DebugLog {
    path: PathBuf,
}

impl DebugLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &LowScoreRecord) {
        let json = match serde_json::to_string(record) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize low-score record: {e}");
                return;
            }
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    warn!("Failed to create debug log directory: {e}");
                    return;
                }
            }
        }

        match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
        {
            Ok(mut file) => {
                if let Err(e) = writeln!(file, "{json}") {
                    warn!("Failed to append low-score record: {e}");
                } else {
                    debug!(path = %self.path.display(), "Logged low-scoring translation");
                }
            }
            Err(e) => warn!("Failed to open debug log: {e}"),
        }
    }

    /// Read every record back, skipping lines that fail to parse.
    pub fn read_all(&self) -> Vec<LowScoreRecord> {
        std::fs::read_to_string(&self.path)
            .map(|content| {
                content
                    .lines()
                    .filter_map(|line| serde_json::from_str(line).ok())
                    .collect()
            })
            .unwrap_or_default()
    }
}
