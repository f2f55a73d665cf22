//! Verifier Module — Build and test the project with a translated file in place
//!
//! Verification is the behavioural half of the evaluation: after a source
//! file has been swapped for its translation, the project is cleaned and its
//! test suite executed. The verifier never fails; every problem collapses to
//! the floor score and is recorded in [`VerificationOutcome`].
//!
//! # Pipeline
//!
//! ```text
//! clean (timeout) → test (timeout) → discover report files → ReportAggregator
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use evaluation::verifier::{BuildVerifier, Verifier, VerifierConfig};
//!
//! let verifier = BuildVerifier::new("/path/to/project", VerifierConfig::gradle());
//! let verification = verifier.verify(0.0).await;
//! println!("score={} ({})", verification.score, verification.summary.detail());
//! ```

pub mod build_system;
pub mod pipeline;

pub use build_system::BuildSystem;
pub use pipeline::{BuildVerifier, VerifierConfig};

use crate::report::{Aggregate, VerificationSummary};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Why a verification produced the score it did
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VerificationOutcome {
    /// Tests ran (possibly with failures) and reports were aggregated
    Completed {
        reports_found: usize,
        reports_rejected: usize,
    },
    /// The clean step failed; tests were not attempted
    SetupFailed { message: String },
    /// The test step exceeded its time budget
    TimedOut { after: Duration },
    /// The test command could not be started
    TestStepFailed { message: String },
}

impl VerificationOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

impl std::fmt::Display for VerificationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed {
                reports_found,
                reports_rejected,
            } => write!(
                f,
                "completed ({} reports, {} rejected)",
                reports_found, reports_rejected
            ),
            Self::SetupFailed { message } => write!(f, "setup failed: {message}"),
            Self::TimedOut { after } => write!(f, "timed out after {}s", after.as_secs()),
            Self::TestStepFailed { message } => write!(f, "test step failed: {message}"),
        }
    }
}

/// Score, summary and outcome of one verification
#[derive(Debug, Clone, PartialEq)]
pub struct Verification {
    pub score: f64,
    pub summary: VerificationSummary,
    pub outcome: VerificationOutcome,
}

impl Verification {
    /// A verification that could not run any tests
    pub fn floored(floor: f64, outcome: VerificationOutcome) -> Self {
        Self {
            score: floor,
            summary: VerificationSummary::empty(),
            outcome,
        }
    }

    pub fn from_aggregate(aggregate: Aggregate, reports_found: usize) -> Self {
        Self {
            score: aggregate.score,
            summary: aggregate.summary,
            outcome: VerificationOutcome::Completed {
                reports_found,
                reports_rejected: aggregate.rejected.len(),
            },
        }
    }
}

/// The external build+test capability.
///
/// Implementations run against the ambient project directory with the
/// translated file already in place.
#[async_trait]
pub trait Verifier: Send + Sync {
    async fn verify(&self, floor: f64) -> Verification;
}
