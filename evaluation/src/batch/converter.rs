//! Conversion capability seam
//!
//! The batch driver only needs `source text in, translated text out`. Model
//! backed implementations live with the agents; [`ReplayConverter`] serves
//! translations that were generated earlier and stored on disk.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Why a conversion produced nothing usable
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    #[error("Conversion request failed: {0}")]
    Request(String),

    #[error("Model output has no output marker {0}")]
    MissingSentinel(String),

    #[error("Model output contains no code")]
    EmptyOutput,

    #[error("No translation available: {0}")]
    Unavailable(String),
}

/// One file to translate
#[derive(Debug, Clone, Copy)]
pub struct ConversionRequest<'a> {
    /// Unique key of the file (its file name)
    pub identifier: &'a str,
    /// Location of the original file
    pub source_path: &'a Path,
    /// Original file content
    pub source: &'a str,
}

/// The external translation capability
#[async_trait]
pub trait Converter: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    async fn convert(&self, request: &ConversionRequest<'_>) -> Result<String, ConversionError>;
}

/// Serves translations from a directory mirroring `src/main`.
///
/// `<project>/src/main/java/org/x/Owner.java` maps to
/// `<replay_root>/java/org/x/Owner.kt`.
#[derive(Debug, Clone)]
pub struct ReplayConverter {
    replay_root: PathBuf,
    target_extension: String,
}

impl ReplayConverter {
    pub fn new(replay_root: impl Into<PathBuf>) -> Self {
        Self {
            replay_root: replay_root.into(),
            target_extension: "kt".to_string(),
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.target_extension = extension.into();
        self
    }

    /// Where the stored translation for `source_path` should be
    pub fn replay_path(&self, source_path: &Path) -> Option<PathBuf> {
        let components: Vec<Component<'_>> = source_path.components().collect();
        let main_at = components.windows(2).position(|pair| {
            pair[0].as_os_str() == "src" && pair[1].as_os_str() == "main"
        })?;

        let tail: PathBuf = components[main_at + 2..].iter().collect();
        if tail.as_os_str().is_empty() {
            return None;
        }
        Some(
            self.replay_root
                .join(tail)
                .with_extension(&self.target_extension),
        )
    }
}

#[async_trait]
impl Converter for ReplayConverter {
    fn name(&self) -> &str {
        "replay"
    }

    async fn convert(&self, request: &ConversionRequest<'_>) -> Result<String, ConversionError> {
        let path = self.replay_path(request.source_path).ok_or_else(|| {
            ConversionError::Unavailable(format!(
                "{} is not under src/main",
                request.source_path.display()
            ))
        })?;

        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| ConversionError::Unavailable(format!("{}: {e}", path.display())))
    }
}
