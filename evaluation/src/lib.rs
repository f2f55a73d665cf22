//! Java → Kotlin Translation Evaluation
//!
//! This library provides:
//! - Behavioural scoring: swap a source file for its translation, build and
//!   test the project, aggregate JUnit-style reports into a pass rate
//! - Batch conversion over a corpus with resumable score logs and
//!   guaranteed restoration of every original file
//! - Static quality scoring of a translation without building anything
//!
//! # Modules
//!
//! - `report`: JUnit XML parsing and the report aggregator
//! - `verifier`: clean + test runner for Gradle and Maven projects
//! - `batch`: converters, score log, restore journal and the batch driver
//! - `metric`: output-marker gate, hard checks and soft checks
//! - `analytics`, `dataset`, `polish`: offline reports over past runs
//!
//! # Usage
//!
//! ```bash
//! # Convert and score every file of a project with stored translations
//! j2k --project ./petclinic convert --replay-dir ./translations
//!
//! # Summarise the score log
//! j2k analyze scores.txt
//! ```

#![allow(clippy::uninlined_format_args)]

pub mod analytics;
pub mod batch;
pub mod dataset;
pub mod error;
pub mod metric;
pub mod polish;
pub mod report;
pub mod verifier;

pub use analytics::ScoreSummary;
pub use batch::{
    BatchConfig, BatchConverter, BatchReport, ConversionError, ConversionRecord, Converter,
    FileOutcome, ReplayConverter,
};
pub use error::{EvalError, EvalResult};
pub use metric::{MetricConfig, QualityMetric, TranslationPair};
pub use report::{ReportAggregator, VerificationSummary};
pub use verifier::{BuildVerifier, Verification, VerificationOutcome, Verifier, VerifierConfig};
