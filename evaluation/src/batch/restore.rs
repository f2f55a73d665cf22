//! Restoration of original sources
//!
//! A file under conversion is moved aside while its translation is built and
//! tested. Two layers make sure the original always comes back:
//!
//! - [`Journal`]: a write-ahead record of the in-flight file, written
//!   atomically before the original is removed and cleared only after it is
//!   restored. A crashed run leaves the journal behind and the next run (or
//!   `j2k recover`) restores from it.
//! - [`RestoreGuard`]: restores on an explicit [`RestoreGuard::restore`],
//!   and on drop if the owning future is cancelled or panics.

use crate::error::{EvalError, EvalResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Everything needed to undo one in-flight conversion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InFlightEntry {
    pub identifier: String,
    pub original_path: PathBuf,
    pub translated_path: PathBuf,
    pub original_content: String,
    pub started_at: DateTime<Utc>,
}

impl InFlightEntry {
    pub fn new(
        identifier: impl Into<String>,
        original_path: impl Into<PathBuf>,
        translated_path: impl Into<PathBuf>,
        original_content: impl Into<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            original_path: original_path.into(),
            translated_path: translated_path.into(),
            original_content: original_content.into(),
            started_at: Utc::now(),
        }
    }

    /// Write the original back and delete the translation, if any.
    pub fn restore_files(&self) -> EvalResult<()> {
        if let Some(parent) = self.original_path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| EvalError::RestorationFailed {
                path: self.original_path.clone(),
                source,
            })?;
        }
        std::fs::write(&self.original_path, &self.original_content).map_err(|source| {
            EvalError::RestorationFailed {
                path: self.original_path.clone(),
                source,
            }
        })?;

        if self.translated_path != self.original_path {
            match std::fs::remove_file(&self.translated_path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(source) => {
                    return Err(EvalError::RestorationFailed {
                        path: self.translated_path.clone(),
                        source,
                    })
                }
            }
        }
        Ok(())
    }
}

/// Single-entry write-ahead journal
#[derive(Debug, Clone)]
pub struct Journal {
    path: PathBuf,
}

impl Journal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record `entry` durably. Replaces the file atomically so a reader
    /// never sees a half-written journal.
    pub fn begin(&self, entry: &InFlightEntry) -> EvalResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| EvalError::io(parent, e))?;
            }
        }
        let json = serde_json::to_string_pretty(entry)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| EvalError::io(&tmp, e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| EvalError::io(&self.path, e))
    }

    /// The abandoned entry, if a previous run left one
    pub fn pending(&self) -> EvalResult<Option<InFlightEntry>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(EvalError::io(&self.path, e)),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| EvalError::Journal {
                path: self.path.clone(),
                message: format!("unreadable in-flight record: {e}"),
            })
    }

    pub fn clear(&self) -> EvalResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(EvalError::Journal {
                path: self.path.clone(),
                message: format!("failed to clear: {e}"),
            }),
        }
    }

    /// Restore an abandoned in-flight file. Returns its identifier when
    /// something was recovered.
    pub fn recover(&self) -> EvalResult<Option<String>> {
        let Some(entry) = self.pending()? else {
            return Ok(None);
        };
        warn!(
            identifier = %entry.identifier,
            path = %entry.original_path.display(),
            started_at = %entry.started_at,
            "Recovering file left in flight by an interrupted run"
        );
        entry.restore_files()?;
        self.clear()?;
        info!(identifier = %entry.identifier, "Original restored");
        Ok(Some(entry.identifier))
    }
}

/// Scoped ownership of a moved-aside original
#[derive(Debug)]
pub struct RestoreGuard {
    entry: InFlightEntry,
    journal: Journal,
    armed: bool,
}

impl RestoreGuard {
    /// Journal `entry`, then remove the original from the tree.
    pub fn arm(journal: Journal, entry: InFlightEntry) -> EvalResult<Self> {
        journal.begin(&entry)?;
        if let Err(e) = std::fs::remove_file(&entry.original_path) {
            if let Err(clear_err) = journal.clear() {
                warn!("Failed to clear journal after aborted removal: {clear_err}");
            }
            return Err(EvalError::io(&entry.original_path, e));
        }
        Ok(Self {
            entry,
            journal,
            armed: true,
        })
    }

    pub fn entry(&self) -> &InFlightEntry {
        &self.entry
    }

    /// Restore the original and clear the journal. A failure here is
    /// fatal for the batch; the journal is kept so a later run can retry.
    pub fn restore(mut self) -> EvalResult<()> {
        self.armed = false;
        self.entry.restore_files()?;
        self.journal.clear()
    }
}

impl Drop for RestoreGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match self.entry.restore_files() {
            Ok(()) => {
                warn!(identifier = %self.entry.identifier, "Original restored on unwind");
                if let Err(e) = self.journal.clear() {
                    warn!("Failed to clear journal: {e}");
                }
            }
            Err(e) => error!(
                identifier = %self.entry.identifier,
                journal = %self.journal.path().display(),
                "Failed to restore original, run `j2k recover`: {e}"
            ),
        }
    }
}
