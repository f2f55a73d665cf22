//! Batch driver: convert, verify, score and restore one file at a time

use super::converter::{ConversionRequest, Converter};
use super::restore::{InFlightEntry, Journal, RestoreGuard};
use super::score_log::{ConversionRecord, FailureLog, FailureRecord, FailureStage, ScoreLog};
use super::walker::{is_excluded, SourceWalker};
use crate::error::{EvalError, EvalResult};
use crate::verifier::Verifier;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Where the batch reads sources and writes its logs.
///
/// Relative log paths resolve against the working directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub project_root: PathBuf,
    /// Walked for sources, relative to `project_root`
    pub source_dir: PathBuf,
    pub source_extension: String,
    pub target_extension: String,
    /// Paths containing this (case-insensitive) are never converted
    pub exclude_marker: String,
    pub score_log: PathBuf,
    /// Originals and translations are copied here per file
    pub artifact_dir: PathBuf,
    pub failure_log: Option<PathBuf>,
    /// Defaults to `<artifact_dir>/in-flight.json`
    pub journal: Option<PathBuf>,
    /// Score recorded when no test could run
    pub floor: f64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            source_dir: PathBuf::from("src"),
            source_extension: "java".to_string(),
            target_extension: "kt".to_string(),
            exclude_marker: "test".to_string(),
            score_log: PathBuf::from("scores.txt"),
            artifact_dir: PathBuf::from("logs"),
            failure_log: Some(PathBuf::from("failures.jsonl")),
            journal: None,
            floor: 0.0,
        }
    }
}

impl BatchConfig {
    pub fn for_project(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            ..Self::default()
        }
    }

    pub fn source_root(&self) -> PathBuf {
        self.project_root.join(&self.source_dir)
    }

    pub fn journal_path(&self) -> PathBuf {
        self.journal
            .clone()
            .unwrap_or_else(|| self.artifact_dir.join("in-flight.json"))
    }
}

/// Result of the per-file pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    Scored(ConversionRecord),
    Failed(FailureRecord),
}

impl FileOutcome {
    pub fn identifier(&self) -> &str {
        match self {
            Self::Scored(record) => &record.identifier,
            Self::Failed(failure) => &failure.identifier,
        }
    }
}

/// What one batch run did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub discovered: usize,
    pub excluded: usize,
    /// Already present in the score log
    pub skipped: usize,
    /// Identifier restored from an abandoned journal at start-up
    pub recovered: Option<String>,
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn scored(&self) -> impl Iterator<Item = &ConversionRecord> {
        self.outcomes.iter().filter_map(|o| match o {
            FileOutcome::Scored(record) => Some(record),
            FileOutcome::Failed(_) => None,
        })
    }

    pub fn failed(&self) -> impl Iterator<Item = &FailureRecord> {
        self.outcomes.iter().filter_map(|o| match o {
            FileOutcome::Failed(failure) => Some(failure),
            FileOutcome::Scored(_) => None,
        })
    }
}

/// Sequential conversion pass over a corpus
pub struct BatchConverter {
    config: BatchConfig,
    converter: Box<dyn Converter>,
    verifier: Box<dyn Verifier>,
    score_log: ScoreLog,
    failure_log: Option<FailureLog>,
}

impl BatchConverter {
    pub fn new(
        config: BatchConfig,
        converter: Box<dyn Converter>,
        verifier: Box<dyn Verifier>,
    ) -> Self {
        let score_log = ScoreLog::new(&config.score_log);
        let failure_log = config.failure_log.clone().map(FailureLog::new);
        Self {
            config,
            converter,
            verifier,
            score_log,
            failure_log,
        }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    pub fn journal(&self) -> Journal {
        Journal::new(self.config.journal_path())
    }

    /// Run over every eligible file. Per-file failures are recorded and
    /// skipped; only errors that endanger the corpus are returned.
    pub async fn run(&self) -> EvalResult<BatchReport> {
        let recovered = self.journal().recover()?;
        let done = self.score_log.load_identifiers()?;
        let files = SourceWalker::new(self.config.source_root(), &self.config.source_extension)
            .files();

        info!(
            converter = self.converter.name(),
            discovered = files.len(),
            already_scored = done.len(),
            "Starting batch"
        );

        let mut report = BatchReport {
            discovered: files.len(),
            recovered,
            ..BatchReport::default()
        };

        for path in &files {
            if is_excluded(&self.config.project_root, path, &self.config.exclude_marker) {
                debug!(path = %path.display(), "Excluded");
                report.excluded += 1;
                continue;
            }
            if done.contains(&identifier_of(path)) {
                report.skipped += 1;
                continue;
            }
            let outcome = self.process_file(path).await?;
            report.outcomes.push(outcome);
        }

        info!(
            scored = report.scored().count(),
            failed = report.failed().count(),
            skipped = report.skipped,
            excluded = report.excluded,
            "Batch complete"
        );
        Ok(report)
    }

    /// Convert, verify and score one file, then put the original back.
    ///
    /// A file abandoned by an earlier run is restored first so its journal
    /// entry is never overwritten.
    pub async fn process_file(&self, path: &Path) -> EvalResult<FileOutcome> {
        if let Some(abandoned) = self.journal().recover()? {
            info!(identifier = %abandoned, "Restored abandoned file before processing");
        }
        let identifier = identifier_of(path);

        let source = match std::fs::read_to_string(path) {
            Ok(source) => source,
            Err(e) => {
                return Ok(self.fail(FailureRecord::new(
                    identifier,
                    FailureStage::Prepare,
                    format!("failed to read {}: {e}", path.display()),
                )))
            }
        };

        let translated_path = path.with_extension(&self.config.target_extension);
        let entry = InFlightEntry::new(&identifier, path, &translated_path, source);
        let guard = match RestoreGuard::arm(self.journal(), entry) {
            Ok(guard) => guard,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                return Ok(self.fail(FailureRecord::new(
                    identifier,
                    FailureStage::Prepare,
                    e.to_string(),
                )))
            }
        };

        let result = self.convert_and_score(guard.entry()).await;
        guard.restore()?;

        Ok(match result {
            Ok(record) => {
                info!(identifier = %record.identifier, score = record.fidelity_score, "{record}");
                FileOutcome::Scored(record)
            }
            Err(failure) => self.fail(failure),
        })
    }

    async fn convert_and_score(
        &self,
        entry: &InFlightEntry,
    ) -> Result<ConversionRecord, FailureRecord> {
        let identifier = entry.identifier.as_str();
        let request = ConversionRequest {
            identifier,
            source_path: &entry.original_path,
            source: &entry.original_content,
        };

        let translated = self.converter.convert(&request).await.map_err(|e| {
            FailureRecord::new(identifier, FailureStage::Conversion, e.to_string())
        })?;

        std::fs::write(&entry.translated_path, &translated).map_err(|e| {
            FailureRecord::new(
                identifier,
                FailureStage::Write,
                format!("failed to write {}: {e}", entry.translated_path.display()),
            )
        })?;

        let verification = self.verifier.verify(self.config.floor).await;
        debug!(identifier, outcome = %verification.outcome, "Verification finished");

        let record = ConversionRecord::new(
            identifier,
            verification.score,
            verification.summary.runnable,
            verification.summary.passed,
        );

        self.persist_artifacts(entry, &translated)
            .and_then(|()| self.score_log.append(&record))
            .map_err(|e| FailureRecord::new(identifier, FailureStage::Record, e.to_string()))?;

        Ok(record)
    }

    fn persist_artifacts(&self, entry: &InFlightEntry, translated: &str) -> EvalResult<()> {
        let dir = &self.config.artifact_dir;
        std::fs::create_dir_all(dir).map_err(|e| EvalError::io(dir, e))?;

        let original = dir.join(&entry.identifier);
        std::fs::write(&original, &entry.original_content)
            .map_err(|e| EvalError::io(&original, e))?;

        let translated_name = Path::new(&entry.identifier).with_extension(&self.config.target_extension);
        let target = dir.join(translated_name);
        std::fs::write(&target, translated).map_err(|e| EvalError::io(&target, e))
    }

    fn fail(&self, failure: FailureRecord) -> FileOutcome {
        warn!(
            identifier = %failure.identifier,
            stage = %failure.stage,
            "Conversion failed, original restored: {}",
            failure.reason
        );
        if let Some(ref log) = self.failure_log {
            if let Err(e) = log.append(&failure) {
                warn!("Failed to record failure: {e}");
            }
        }
        FileOutcome::Failed(failure)
    }
}

/// File name used as the score-log key
pub fn identifier_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::converter::ConversionError;
    use crate::report::VerificationSummary;
    use crate::verifier::{Verification, VerificationOutcome};
    use async_trait::async_trait;

    struct Upper;

    #[async_trait]
    impl Converter for Upper {
        fn name(&self) -> &str {
            "upper"
        }

        async fn convert(&self, request: &ConversionRequest<'_>) -> Result<String, ConversionError> {
            if request.source.contains("BROKEN") {
                return Err(ConversionError::MissingSentinel("<<START_J2K>>".into()));
            }
            Ok(request.source.to_uppercase())
        }
    }

    struct AllPass;

    #[async_trait]
    impl Verifier for AllPass {
        async fn verify(&self, _floor: f64) -> Verification {
            Verification {
                score: 1.0,
                summary: VerificationSummary {
                    tests: 4,
                    runnable: 4,
                    passed: 4,
                    ..VerificationSummary::default()
                },
                outcome: VerificationOutcome::Completed {
                    reports_found: 1,
                    reports_rejected: 0,
                },
            }
        }
    }

    fn config(dir: &Path) -> BatchConfig {
        BatchConfig {
            score_log: dir.join("scores.txt"),
            artifact_dir: dir.join("logs"),
            failure_log: Some(dir.join("failures.jsonl")),
            ..BatchConfig::for_project(dir.join("project"))
        }
    }

    fn write_source(dir: &Path, name: &str, content: &str) -> PathBuf {
        let pkg = dir.join("project/src/main/java/org/petclinic");
        std::fs::create_dir_all(&pkg).unwrap();
        let path = pkg.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_config_defaults() {
        let config = BatchConfig::default();
        assert_eq!(config.source_root(), PathBuf::from("./src"));
        assert_eq!(config.journal_path(), PathBuf::from("logs/in-flight.json"));
        assert_eq!(config.exclude_marker, "test");
        assert_eq!(config.floor, 0.0);
    }

    #[test]
    fn test_identifier_is_file_name() {
        assert_eq!(identifier_of(Path::new("/a/b/Owner.java")), "Owner.java");
    }

    #[tokio::test]
    async fn test_process_file_scores_and_persists_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_source(dir.path(), "Owner.java", "class owner");
        let batch = BatchConverter::new(config(dir.path()), Box::new(Upper), Box::new(AllPass));

        let outcome = batch.process_file(&path).await.unwrap();
        let FileOutcome::Scored(record) = outcome else {
            panic!("expected a score");
        };
        assert_eq!(record.to_string(), "Owner.java: score=1.0 (ran 4 tests, 4 passing)");

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "class owner");
        assert!(!path.with_extension("kt").exists());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("logs/Owner.kt")).unwrap(),
            "CLASS OWNER"
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("logs/Owner.java")).unwrap(),
            "class owner"
        );
        assert!(!dir.path().join("logs/in-flight.json").exists());
    }

    #[tokio::test]
    async fn test_process_file_recovers_abandoned_entry_first() {
        let dir = tempfile::tempdir().unwrap();
        let owner = write_source(dir.path(), "Owner.java", "class owner");
        let pet = write_source(dir.path(), "Pet.java", "class pet");
        let batch = BatchConverter::new(config(dir.path()), Box::new(Upper), Box::new(AllPass));

        // Pet was mid-conversion when an earlier run died
        let abandoned = InFlightEntry::new("Pet.java", &pet, pet.with_extension("kt"), "class pet".to_string());
        batch.journal().begin(&abandoned).unwrap();
        std::fs::remove_file(&pet).unwrap();
        std::fs::write(pet.with_extension("kt"), "CLASS PET").unwrap();

        let outcome = batch.process_file(&owner).await.unwrap();
        assert!(matches!(outcome, FileOutcome::Scored(_)));

        assert_eq!(std::fs::read_to_string(&pet).unwrap(), "class pet");
        assert!(!pet.with_extension("kt").exists());
        assert!(batch.journal().pending().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_conversion_failure_goes_to_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_source(dir.path(), "Vet.java", "BROKEN");
        let batch = BatchConverter::new(config(dir.path()), Box::new(Upper), Box::new(AllPass));

        let outcome = batch.process_file(&path).await.unwrap();
        assert!(matches!(
            outcome,
            FileOutcome::Failed(FailureRecord {
                stage: FailureStage::Conversion,
                ..
            })
        ));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "BROKEN");
        assert!(!dir.path().join("scores.txt").exists());

        let ledger = FailureLog::new(dir.path().join("failures.jsonl")).read_all().unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0].identifier, "Vet.java");
    }
}
