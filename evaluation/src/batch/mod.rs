//! Batch Conversion — One full evaluation pass over a corpus
//!
//! For every eligible source file, in order:
//!
//! ```text
//! read original → journal + remove original → convert → write translation
//!   → verify (clean, test, aggregate) → persist artifacts → append score line
//!   → restore original (always)
//! ```
//!
//! Files already present in the score log are skipped, so an interrupted run
//! resumes where it stopped. Paths containing the exclusion marker (`test`)
//! are never touched. A file that fails to convert is restored and recorded
//! in the failure ledger, never in the score log.

pub mod converter;
pub mod restore;
pub mod runner;
pub mod score_log;
pub mod walker;

pub use converter::{ConversionError, ConversionRequest, Converter, ReplayConverter};
pub use restore::{InFlightEntry, Journal, RestoreGuard};
pub use runner::{identifier_of, BatchConfig, BatchConverter, BatchReport, FileOutcome};
pub use score_log::{
    format_score, parse_records, ConversionRecord, FailureLog, FailureRecord, FailureStage,
    ScoreLog,
};
pub use walker::{is_excluded, SourceWalker};
