//! Persisted score log and failure ledger
//!
//! The score log is append-only text, one line per scored file:
//!
//! ```text
//! Owner.java: score=0.625 (ran 8 tests, 5 passing)
//! ```
//!
//! Lines are never rewritten. The set of identifiers in the log is the
//! skip-set for resumed runs. Failed conversions go to a separate JSONL
//! ledger so the score log keeps its format.

use crate::error::{EvalError, EvalResult};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static RECORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+?): score=(-?[\d.]+) \(ran (\d+) tests?, (\d+) passing\)")
        .expect("RECORD_RE regex should compile")
});

/// One scored file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionRecord {
    pub identifier: String,
    pub fidelity_score: f64,
    pub tests_run: u64,
    /// Never exceeds `tests_run`
    pub tests_passed: u64,
}

impl ConversionRecord {
    /// Build a record from verification counts. Negative pass counts clamp
    /// to zero.
    pub fn new(identifier: impl Into<String>, score: f64, runnable: i64, passed: i64) -> Self {
        let tests_run = runnable.max(0) as u64;
        let tests_passed = (passed.max(0) as u64).min(tests_run);
        Self {
            identifier: identifier.into(),
            fidelity_score: score,
            tests_run,
            tests_passed,
        }
    }

    /// Parse one log line; `None` for lines in any other shape.
    pub fn parse_line(line: &str) -> Option<Self> {
        let caps = RECORD_RE.captures(line.trim_end())?;
        Some(Self {
            identifier: caps[1].trim().to_string(),
            fidelity_score: caps[2].parse().ok()?,
            tests_run: caps[3].parse().ok()?,
            tests_passed: caps[4].parse().ok()?,
        })
    }
}

impl std::fmt::Display for ConversionRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: score={} (ran {} tests, {} passing)",
            self.identifier,
            format_score(self.fidelity_score),
            self.tests_run,
            self.tests_passed
        )
    }
}

/// Plain decimal rendering: `1.0`, `0.625`, never exponent notation.
pub fn format_score(score: f64) -> String {
    if score.is_finite() && score.fract() == 0.0 {
        format!("{score:.1}")
    } else {
        format!("{score}")
    }
}

/// Append-only score log on disk
#[derive(Debug, Clone)]
pub struct ScoreLog {
    path: PathBuf,
}

impl ScoreLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Identifiers already present, i.e. the text before the first `": "`
    /// of every line. A missing log is an empty set.
    pub fn load_identifiers(&self) -> EvalResult<HashSet<String>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashSet::new()),
            Err(e) => return Err(EvalError::io(&self.path, e)),
        };

        Ok(content
            .lines()
            .filter_map(|line| line.split_once(": ").map(|(id, _)| id.to_string()))
            .collect())
    }

    /// Every well-formed record in file order
    pub fn read_records(&self) -> EvalResult<Vec<ConversionRecord>> {
        let content =
            std::fs::read_to_string(&self.path).map_err(|e| EvalError::io(&self.path, e))?;
        Ok(parse_records(&content))
    }

    pub fn append(&self, record: &ConversionRecord) -> EvalResult<()> {
        if record.identifier.contains(": ") {
            return Err(EvalError::ScoreLog {
                path: self.path.clone(),
                message: format!("identifier {:?} contains \": \"", record.identifier),
            });
        }
        append_line(&self.path, &record.to_string())
    }
}

/// Parse score-log text, skipping lines that do not match the format
pub fn parse_records(content: &str) -> Vec<ConversionRecord> {
    content
        .lines()
        .filter_map(ConversionRecord::parse_line)
        .collect()
}

/// Pipeline stage at which a file failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    /// Original could not be read or moved aside
    Prepare,
    Conversion,
    /// Translation could not be written into the tree
    Write,
    /// Score log or artifacts could not be persisted
    Record,
}

impl std::fmt::Display for FailureStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Prepare => write!(f, "prepare"),
            Self::Conversion => write!(f, "conversion"),
            Self::Write => write!(f, "write"),
            Self::Record => write!(f, "record"),
        }
    }
}

/// One failed file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub identifier: String,
    pub stage: FailureStage,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

impl FailureRecord {
    pub fn new(identifier: impl Into<String>, stage: FailureStage, reason: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            stage,
            reason: reason.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Append-only JSONL ledger of failed files
#[derive(Debug, Clone)]
pub struct FailureLog {
    path: PathBuf,
}

impl FailureLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn append(&self, record: &FailureRecord) -> EvalResult<()> {
        let json = serde_json::to_string(record)?;
        append_line(&self.path, &json)
    }

    pub fn read_all(&self) -> EvalResult<Vec<FailureRecord>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(EvalError::io(&self.path, e)),
        };
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(EvalError::from))
            .collect()
    }
}

fn append_line(path: &Path, line: &str) -> EvalResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| EvalError::io(parent, e))?;
        }
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| EvalError::io(path, e))?;
    writeln!(file, "{line}").map_err(|e| EvalError::io(path, e))
}
