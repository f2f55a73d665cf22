//! Report Aggregator — Test reports to a normalized fidelity score
//!
//! Folds any number of JUnit-style report fragments into one
//! [`VerificationSummary`] and a score in `[0, 1]`. A run with no runnable
//! tests (typically because the translated file did not compile, so no
//! reports were written) collapses to a caller-supplied floor instead of an
//! error or NaN.
//!
//! ```text
//! runnable = tests - skipped
//! passed   = runnable - failures - errors
//! score    = clamp(passed / runnable, 0, 1)      (floor when runnable <= 0)
//! ```
//!
//! Totals saturate at the `i64` bounds, so absurd attribute values still
//! yield a finite score.

pub mod junit;

pub use junit::{parse_suites, ReportError, SuiteCounts};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Normalized counts from one verification run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationSummary {
    /// Total declared tests
    pub tests: i64,
    pub skipped: i64,
    pub failures: i64,
    pub errors: i64,
    /// `tests - skipped`
    pub runnable: i64,
    /// `runnable - failures - errors`, not clamped
    pub passed: i64,
}

impl VerificationSummary {
    /// The all-zero summary used whenever nothing could be run
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Human-readable one-liner for progress output
    pub fn detail(&self) -> String {
        format!(
            "{} tests, {} skipped, {} failures, {} errors ({} of {} runnable passing)",
            self.tests, self.skipped, self.failures, self.errors, self.passed, self.runnable
        )
    }
}

/// Result of folding a set of report fragments
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    /// Fidelity score, or the floor when nothing was runnable
    pub score: f64,
    pub summary: VerificationSummary,
    /// Fragments that failed to parse and contributed nothing
    pub rejected: Vec<ReportError>,
}

/// Stateless aggregator over JUnit-style report fragments
pub struct ReportAggregator;

impl ReportAggregator {
    /// Aggregate in-memory report documents.
    pub fn aggregate<S: AsRef<str>>(fragments: &[S], floor: f64) -> Aggregate {
        let parsed = fragments
            .iter()
            .map(|fragment| parse_suites(fragment.as_ref()))
            .collect::<Vec<_>>();
        Self::fold(parsed, floor)
    }

    /// Read and aggregate report files. Unreadable files are rejected like
    /// malformed ones.
    pub fn aggregate_files(paths: &[PathBuf], floor: f64) -> Aggregate {
        let parsed = paths
            .iter()
            .map(|path| Self::read_fragment(path).and_then(|doc| parse_suites(&doc)))
            .collect::<Vec<_>>();
        Self::fold(parsed, floor)
    }

    fn read_fragment(path: &Path) -> Result<String, ReportError> {
        std::fs::read_to_string(path).map_err(|e| ReportError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    fn fold(parsed: Vec<Result<Vec<SuiteCounts>, ReportError>>, floor: f64) -> Aggregate {
        let mut totals = SuiteCounts::default();
        let mut rejected = Vec::new();

        for fragment in parsed {
            match fragment {
                Ok(suites) => {
                    for suite in suites {
                        totals.tests = totals.tests.saturating_add(suite.tests);
                        totals.failures = totals.failures.saturating_add(suite.failures);
                        totals.errors = totals.errors.saturating_add(suite.errors);
                        totals.skipped = totals.skipped.saturating_add(suite.skipped);
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping malformed test report");
                    rejected.push(e);
                }
            }
        }

        let runnable = totals.tests.saturating_sub(totals.skipped);
        if runnable <= 0 {
            return Aggregate {
                score: floor,
                summary: VerificationSummary::empty(),
                rejected,
            };
        }

        let passed = runnable.saturating_sub(totals.failures.saturating_add(totals.errors));
        let score = (passed as f64 / runnable as f64).clamp(0.0, 1.0);

        Aggregate {
            score,
            summary: VerificationSummary {
                tests: totals.tests,
                skipped: totals.skipped,
                failures: totals.failures,
                errors: totals.errors,
                runnable,
                passed,
            },
            rejected,
        }
    }
}
