//! Quality Metric — Static scoring of a single translation
//!
//! Scores an (original Java, translated Kotlin) pair without building
//! anything. The translated text is raw model output: reasoning first, then
//! an output marker, then the code. Only the text after the first marker is
//! inspected as code.
//!
//! ```text
//! marker absent                → 0 (nothing else is computed)
//! score = w_sentinel · 1
//!       + w_hard     · mean(hard checks)
//!       + w_soft     · Σ(weight · soft check) / Σ weight
//! ```
//!
//! Defaults are 0.4 / 0.4 / 0.2 with hard checks `single_sentinel` and
//! `valid_syntax` and all three soft checks at weight 1. Pairs scoring below
//! the debug threshold are appended to a JSONL log,
//! [`DEFAULT_DEBUG_LOG`] unless configured otherwise.

pub mod checks;
pub mod debug_log;
pub mod syntax;

pub use checks::{HardCheck, SoftCheck, WeightedCheck};
pub use debug_log::{DebugLog, LowScoreRecord, ScoreParts};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Marker that separates model reasoning from the emitted code
pub const DEFAULT_SENTINEL: &str = "<<START_J2K>>";

/// Where low-scoring pairs go unless configured otherwise
pub const DEFAULT_DEBUG_LOG: &str = "metric_debug/bad_preds.jsonl";

/// Scoring configuration. Several configurations can coexist.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricConfig {
    pub sentinel: String,
    pub sentinel_weight: f64,
    pub hard_weight: f64,
    pub soft_weight: f64,
    pub hard_checks: Vec<HardCheck>,
    pub soft_checks: Vec<WeightedCheck>,
    /// Java imports expected to vanish because Kotlin has them built in
    pub ignored_imports: Vec<String>,
    /// Java-only library calls that do not exist in Kotlin's stdlib
    pub source_only_apis: Vec<String>,
    /// Pairs scoring strictly below this are logged
    pub debug_threshold: f64,
    /// Low-score log; an empty path disables it
    pub debug_log: Option<PathBuf>,
}

impl Default for MetricConfig {
    fn default() -> Self {
        Self {
            sentinel: DEFAULT_SENTINEL.to_string(),
            sentinel_weight: 0.4,
            hard_weight: 0.4,
            soft_weight: 0.2,
            hard_checks: vec![HardCheck::SingleSentinel, HardCheck::ValidSyntax],
            soft_checks: vec![
                WeightedCheck::new(SoftCheck::ImportsPreserved, 1.0),
                WeightedCheck::new(SoftCheck::OpenClassesMatch, 1.0),
                WeightedCheck::new(SoftCheck::MutabilityMatch, 1.0),
            ],
            ignored_imports: [
                "java.util.List",
                "java.util.Set",
                "java.util.Map",
                "java.util.ArrayList",
                "java.util.HashSet",
                "java.util.HashMap",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            source_only_apis: vec!["equalsIgnoreCase".to_string()],
            debug_threshold: 0.6,
            debug_log: Some(PathBuf::from(DEFAULT_DEBUG_LOG)),
        }
    }
}

impl MetricConfig {
    /// Default checks plus the Java-only API hard check
    pub fn strict() -> Self {
        let mut config = Self::default();
        config.hard_checks.push(HardCheck::NoSourceOnlyApis);
        config
    }

    pub fn with_debug_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.debug_log = Some(path.into());
        self
    }

    pub fn without_debug_log(mut self) -> Self {
        self.debug_log = None;
        self
    }
}

/// An original source and its translation, plus any reasoning the model
/// produced alongside it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationPair {
    #[serde(rename = "java_code", alias = "original_code")]
    pub original_code: String,
    #[serde(rename = "kotlin_code", alias = "translated_code")]
    pub translated_code: String,
    #[serde(rename = "rationale", alias = "auxiliary_rationale", default)]
    pub auxiliary_rationale: String,
}

impl TranslationPair {
    pub fn new(original: impl Into<String>, translated: impl Into<String>) -> Self {
        Self {
            original_code: original.into(),
            translated_code: translated.into(),
            auxiliary_rationale: String::new(),
        }
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.auxiliary_rationale = rationale.into();
        self
    }
}

/// Result of one named check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    pub weight: f64,
}

/// Per-category contributions and the individual check results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub parts: ScoreParts,
    pub total: f64,
    pub hard_checks: Vec<CheckResult>,
    pub soft_checks: Vec<CheckResult>,
}

/// Outcome of scoring one pair
#[derive(Debug, Clone, PartialEq)]
pub enum MetricOutcome {
    /// No output marker: the score is forced to zero
    MissingSentinel,
    Scored(ScoreBreakdown),
}

impl MetricOutcome {
    pub fn total(&self) -> f64 {
        match self {
            Self::MissingSentinel => 0.0,
            Self::Scored(breakdown) => breakdown.total,
        }
    }
}

/// Text after the first occurrence of `sentinel`, if any
pub fn after_sentinel<'a>(text: &'a str, sentinel: &str) -> Option<&'a str> {
    text.split_once(sentinel).map(|(_, code)| code)
}

/// Composite static quality metric
#[derive(Debug, Clone)]
pub struct QualityMetric {
    config: MetricConfig,
    debug_log: Option<DebugLog>,
}

impl Default for QualityMetric {
    fn default() -> Self {
        Self::new(MetricConfig::default())
    }
}

impl QualityMetric {
    pub fn new(config: MetricConfig) -> Self {
        let debug_log = config
            .debug_log
            .clone()
            .filter(|path| !path.as_os_str().is_empty())
            .map(DebugLog::new);
        Self { config, debug_log }
    }

    pub fn config(&self) -> &MetricConfig {
        &self.config
    }

    /// Compute the breakdown without side effects.
    pub fn evaluate(&self, pair: &TranslationPair) -> MetricOutcome {
        let translated = pair.translated_code.as_str();
        let Some(code) = after_sentinel(translated, &self.config.sentinel) else {
            return MetricOutcome::MissingSentinel;
        };

        let hard_checks: Vec<CheckResult> = self
            .config
            .hard_checks
            .iter()
            .map(|check| CheckResult {
                name: check.name().to_string(),
                passed: check.run(translated, code, &self.config),
                weight: 1.0,
            })
            .collect();

        let soft_checks: Vec<CheckResult> = self
            .config
            .soft_checks
            .iter()
            .map(|weighted| CheckResult {
                name: weighted.check.name().to_string(),
                passed: weighted.check.run(&pair.original_code, code, &self.config),
                weight: weighted.weight,
            })
            .collect();

        let parts = ScoreParts {
            sentinel: self.config.sentinel_weight,
            hard: self.config.hard_weight * weighted_mean(&hard_checks),
            soft: self.config.soft_weight * weighted_mean(&soft_checks),
        };

        MetricOutcome::Scored(ScoreBreakdown {
            total: parts.sentinel + parts.hard + parts.soft,
            parts,
            hard_checks,
            soft_checks,
        })
    }

    /// Score a pair, logging it for review when it falls below the
    /// debug threshold.
    pub fn score(&self, pair: &TranslationPair) -> f64 {
        let outcome = self.evaluate(pair);
        self.record(pair, &outcome)
    }

    /// Log an already evaluated pair the way [`score`](Self::score) does
    /// and return its total.
    pub fn record(&self, pair: &TranslationPair, outcome: &MetricOutcome) -> f64 {
        let breakdown = match outcome {
            MetricOutcome::MissingSentinel => {
                tracing::debug!("Output marker missing, score forced to 0");
                return 0.0;
            }
            MetricOutcome::Scored(breakdown) => breakdown,
        };

        tracing::debug!(
            score = breakdown.total,
            sentinel = breakdown.parts.sentinel,
            hard = breakdown.parts.hard,
            soft = breakdown.parts.soft,
            "Scored translation"
        );

        if breakdown.total < self.config.debug_threshold {
            if let Some(ref log) = self.debug_log {
                log.append(&LowScoreRecord {
                    original: pair.original_code.clone(),
                    translated: pair.translated_code.clone(),
                    rationale: pair.auxiliary_rationale.clone(),
                    score_parts: breakdown.parts,
                });
            }
        }

        breakdown.total
    }

    pub fn debug_log(&self) -> Option<&DebugLog> {
        self.debug_log.as_ref()
    }
}

/// Weighted pass rate; an empty or zero-weight set passes vacuously.
fn weighted_mean(results: &[CheckResult]) -> f64 {
    let total_weight: f64 = results.iter().map(|r| r.weight).sum();
    if total_weight <= 0.0 {
        return 1.0;
    }
    let passed: f64 = results
        .iter()
        .filter(|r| r.passed)
        .map(|r| r.weight)
        .sum();
    passed / total_weight
}
