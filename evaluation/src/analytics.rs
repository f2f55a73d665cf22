//! Score-log analytics

use crate::batch::score_log::{parse_records, ConversionRecord};
use serde::Serialize;

/// Aggregate view of a score log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreSummary {
    pub files_analysed: usize,
    /// Files whose verification ran at least one test
    pub compiled: usize,
    /// Mean score among compiled files; `None` when nothing compiled
    pub mean_compiled_score: Option<f64>,
    /// Compiled files where every runnable test passed
    pub fully_passing: usize,
}

impl ScoreSummary {
    pub fn from_records(records: &[ConversionRecord]) -> Self {
        let compiled: Vec<&ConversionRecord> = records.iter().filter(|r| r.tests_run > 0).collect();
        let mean_compiled_score = if compiled.is_empty() {
            None
        } else {
            Some(compiled.iter().map(|r| r.fidelity_score).sum::<f64>() / compiled.len() as f64)
        };

        Self {
            files_analysed: records.len(),
            compiled: compiled.len(),
            mean_compiled_score,
            fully_passing: compiled
                .iter()
                .filter(|r| r.tests_passed == r.tests_run)
                .count(),
        }
    }

    /// Summarise raw score-log text; malformed lines are ignored.
    pub fn from_log_text(text: &str) -> Self {
        Self::from_records(&parse_records(text))
    }
}

impl std::fmt::Display for ScoreSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{} files were analysed", self.files_analysed)?;
        writeln!(f, "{} compiled and ran some tests", self.compiled)?;
        match self.mean_compiled_score {
            Some(mean) => writeln!(f, "{mean:.4} was the average score of the ones that compiled")?,
            None => writeln!(f, "no file compiled, so there is no average score")?,
        }
        write!(f, "{} files achieved 100% on tests", self.fully_passing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "\
Owner.java: score=1.0 (ran 4 tests, 4 passing)
Pet.java: score=0.5 (ran 4 tests, 2 passing)
Vet.java: score=0.0 (ran 0 tests, 0 passing)
this line is noise
Visit.java: score=1.0 (ran 1 test, 1 passing)
";

    #[test]
    fn test_summary_counts() {
        let summary = ScoreSummary::from_log_text(LOG);
        assert_eq!(summary.files_analysed, 4);
        assert_eq!(summary.compiled, 3);
        assert_eq!(summary.fully_passing, 2);
        let mean = summary.mean_compiled_score.unwrap();
        assert!((mean - 2.5 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_summary_without_compiled_files() {
        let summary = ScoreSummary::from_log_text("Vet.java: score=0.0 (ran 0 tests, 0 passing)\n");
        assert_eq!(summary.compiled, 0);
        assert_eq!(summary.mean_compiled_score, None);
        assert!(summary.to_string().contains("no file compiled"));
    }

    #[test]
    fn test_summary_empty_log() {
        let summary = ScoreSummary::from_log_text("");
        assert_eq!(summary.files_analysed, 0);
        assert_eq!(summary.fully_passing, 0);
    }
}
