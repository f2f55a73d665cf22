//! JVM build systems the verifier knows how to drive

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Supported build tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildSystem {
    Gradle,
    Maven,
}

impl BuildSystem {
    /// Detect the build tool from marker files in the project root.
    ///
    /// Gradle wins when both are present since the wrapper pins its version.
    pub fn detect(project_root: &Path) -> Option<Self> {
        let gradle_markers = ["gradlew", "build.gradle", "build.gradle.kts"];
        if gradle_markers
            .iter()
            .any(|marker| project_root.join(marker).exists())
        {
            return Some(Self::Gradle);
        }
        if project_root.join("pom.xml").exists() {
            return Some(Self::Maven);
        }
        None
    }

    /// Command that wipes previous build outputs and stale reports
    pub fn clean_command(&self) -> Vec<String> {
        match self {
            Self::Gradle => vec!["./gradlew".into(), "clean".into()],
            Self::Maven => vec!["mvn".into(), "-q".into(), "clean".into()],
        }
    }

    /// Command that compiles and runs the whole test suite.
    ///
    /// Both variants keep going past failing modules so that as many
    /// reports as possible are written.
    pub fn test_command(&self) -> Vec<String> {
        match self {
            Self::Gradle => vec![
                "./gradlew".into(),
                "test".into(),
                "--no-daemon".into(),
                "--continue".into(),
                "--rerun-tasks".into(),
            ],
            Self::Maven => vec!["mvn".into(), "test".into(), "-fae".into()],
        }
    }

    /// Glob patterns (relative to the project root) where reports land
    pub fn report_patterns(&self) -> Vec<String> {
        match self {
            Self::Gradle => vec![
                "**/build/test-results/test/*.xml".into(),
                "**/build/test-results/*Test/*.xml".into(),
                "**/build/test-results/*/*.xml".into(),
            ],
            Self::Maven => vec!["**/target/surefire-reports/*.xml".into()],
        }
    }
}

impl std::fmt::Display for BuildSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gradle => write!(f, "gradle"),
            Self::Maven => write!(f, "maven"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_gradle_and_maven() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(BuildSystem::detect(dir.path()), None);

        std::fs::write(dir.path().join("pom.xml"), "<project/>").unwrap();
        assert_eq!(BuildSystem::detect(dir.path()), Some(BuildSystem::Maven));

        std::fs::write(dir.path().join("build.gradle.kts"), "").unwrap();
        assert_eq!(BuildSystem::detect(dir.path()), Some(BuildSystem::Gradle));
    }

    #[test]
    fn test_gradle_commands() {
        let gradle = BuildSystem::Gradle;
        assert_eq!(gradle.clean_command(), vec!["./gradlew", "clean"]);
        assert!(gradle.test_command().contains(&"--continue".to_string()));
        assert_eq!(gradle.report_patterns().len(), 3);
    }
}
