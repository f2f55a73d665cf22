//! Verifier Pipeline — clean, test, aggregate
//!
//! Both steps run through `tokio::process::Command` with an enforced
//! timeout via `tokio::time::timeout(step_timeout_secs)`. A failing clean
//! step short-circuits to the floor score without attempting tests. A
//! non-zero exit from the test step is expected whenever a test fails and
//! is not treated as an error; the reports on disk decide the score.

use super::build_system::BuildSystem;
use super::{Verification, VerificationOutcome, Verifier};
use crate::report::ReportAggregator;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::{Duration, Instant};

/// Configuration for the build verifier
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Build tool whose default commands and report locations apply
    pub build_system: BuildSystem,
    /// Override for the clean command
    pub clean_command: Option<Vec<String>>,
    /// Override for the test command
    pub test_command: Option<Vec<String>>,
    /// Override for report glob patterns (relative to the project root)
    pub report_patterns: Option<Vec<String>>,
    /// Maximum wall-clock time per step (seconds)
    pub step_timeout_secs: u64,
    /// Truncate captured stderr to this many bytes in outcome messages
    pub stderr_max_bytes: usize,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self::gradle()
    }
}

impl VerifierConfig {
    fn for_build_system(build_system: BuildSystem) -> Self {
        Self {
            build_system,
            clean_command: None,
            test_command: None,
            report_patterns: None,
            step_timeout_secs: 1800,
            stderr_max_bytes: 4096,
        }
    }

    /// Gradle wrapper with the standard `build/test-results` layout
    pub fn gradle() -> Self {
        Self::for_build_system(BuildSystem::Gradle)
    }

    /// Maven with Surefire reports
    pub fn maven() -> Self {
        Self::for_build_system(BuildSystem::Maven)
    }

    /// Pick the build system from marker files, falling back to Gradle
    pub fn detect(project_root: &Path) -> Self {
        match BuildSystem::detect(project_root) {
            Some(bs) => Self::for_build_system(bs),
            None => {
                tracing::warn!(
                    root = %project_root.display(),
                    "No build file found, assuming Gradle"
                );
                Self::gradle()
            }
        }
    }

    pub fn clean_command(&self) -> Vec<String> {
        self.clean_command
            .clone()
            .unwrap_or_else(|| self.build_system.clean_command())
    }

    pub fn test_command(&self) -> Vec<String> {
        self.test_command
            .clone()
            .unwrap_or_else(|| self.build_system.test_command())
    }

    pub fn report_patterns(&self) -> Vec<String> {
        self.report_patterns
            .clone()
            .unwrap_or_else(|| self.build_system.report_patterns())
    }

    pub fn step_timeout(&self) -> Duration {
        Duration::from_secs(self.step_timeout_secs)
    }
}

/// Why a step did not produce output
#[derive(Debug)]
enum StepError {
    Spawn(String),
    Timeout(Duration),
}

/// Runs the project's build tool against the working tree
pub struct BuildVerifier {
    /// Project root (where the build file lives)
    project_root: PathBuf,
    config: VerifierConfig,
}

impl BuildVerifier {
    pub fn new(project_root: impl AsRef<Path>, config: VerifierConfig) -> Self {
        Self {
            project_root: project_root.as_ref().to_path_buf(),
            config,
        }
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Run one command in the project root with the step timeout.
    ///
    /// The child gets its own process group on Unix and is killed when the
    /// future is dropped, so a timeout does not leave a build running.
    async fn run_step(&self, step: &str, command: &[String]) -> Result<Output, StepError> {
        let Some((program, args)) = command.split_first() else {
            return Err(StepError::Spawn(format!("{step} command is empty")));
        };

        // "./gradlew" must resolve against the project, not our own cwd
        let program = if program.starts_with("./") {
            self.project_root.join(program).display().to_string()
        } else {
            program.clone()
        };

        let mut cmd = tokio::process::Command::new(&program);
        cmd.args(args)
            .current_dir(&self.project_root)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        tracing::debug!(step, program = %program, ?args, "Running verification step");

        let timeout = self.config.step_timeout();
        match tokio::time::timeout(timeout, cmd.output()).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(StepError::Spawn(format!("Failed to execute {program}: {e}"))),
            Err(_) => Err(StepError::Timeout(timeout)),
        }
    }

    /// All report files matching the configured patterns, deduplicated and
    /// sorted.
    pub fn discover_reports(&self) -> Vec<PathBuf> {
        let root = glob::Pattern::escape(&self.project_root.to_string_lossy());
        let mut found = BTreeSet::new();

        for pattern in self.config.report_patterns() {
            let full = format!("{}/{}", root.trim_end_matches('/'), pattern);
            match glob::glob(&full) {
                Ok(paths) => {
                    for path in paths.flatten() {
                        if path.is_file() {
                            found.insert(path);
                        }
                    }
                }
                Err(e) => tracing::warn!(pattern = %full, error = %e, "Invalid report pattern"),
            }
        }

        found.into_iter().collect()
    }

    fn truncate_stderr(&self, stderr: &[u8]) -> String {
        let s = String::from_utf8_lossy(stderr);
        let max = self.config.stderr_max_bytes;
        if s.len() <= max {
            return s.to_string();
        }
        let mut cut = max;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}...\n[truncated at {} bytes]", &s[..cut], s.len())
    }
}

#[async_trait]
impl Verifier for BuildVerifier {
    async fn verify(&self, floor: f64) -> Verification {
        let start = Instant::now();

        match self.run_step("clean", &self.config.clean_command()).await {
            Ok(output) if output.status.success() => {}
            Ok(output) => {
                let message = format!(
                    "clean exited with {:?}: {}",
                    output.status.code(),
                    self.truncate_stderr(&output.stderr)
                );
                tracing::warn!(%message, "Clean step failed, skipping tests");
                return Verification::floored(floor, VerificationOutcome::SetupFailed { message });
            }
            Err(StepError::Spawn(message)) => {
                tracing::warn!(%message, "Clean step could not start");
                return Verification::floored(floor, VerificationOutcome::SetupFailed { message });
            }
            Err(StepError::Timeout(after)) => {
                let message = format!("clean timed out after {}s", after.as_secs());
                tracing::warn!(%message, "Clean step timed out");
                return Verification::floored(floor, VerificationOutcome::SetupFailed { message });
            }
        }

        match self.run_step("test", &self.config.test_command()).await {
            Ok(output) => {
                tracing::debug!(
                    exit_code = ?output.status.code(),
                    "Test step finished"
                );
            }
            Err(StepError::Timeout(after)) => {
                tracing::warn!(secs = after.as_secs(), "Test step timed out");
                return Verification::floored(floor, VerificationOutcome::TimedOut { after });
            }
            Err(StepError::Spawn(message)) => {
                tracing::warn!(%message, "Test step could not start");
                return Verification::floored(
                    floor,
                    VerificationOutcome::TestStepFailed { message },
                );
            }
        }

        let reports = self.discover_reports();
        let aggregate = ReportAggregator::aggregate_files(&reports, floor);
        let verification = Verification::from_aggregate(aggregate, reports.len());

        tracing::info!(
            score = verification.score,
            runnable = verification.summary.runnable,
            passed = verification.summary.passed,
            reports = reports.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Verification complete"
        );

        verification
    }
}
