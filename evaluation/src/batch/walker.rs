//! Source discovery using the `ignore` crate

use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Finds source files under a corpus directory, respecting .gitignore.
pub struct SourceWalker {
    root: PathBuf,
    extension: String,
}

impl SourceWalker {
    pub fn new(root: impl AsRef<Path>, extension: impl Into<String>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            extension: extension.into(),
        }
    }

    /// All files with the configured extension, sorted for a stable order.
    pub fn files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        let walker = WalkBuilder::new(&self.root)
            .hidden(true)
            .git_ignore(true)
            .build();

        for entry in walker.flatten() {
            let path = entry.path();
            if path.is_file()
                && path.extension().and_then(|e| e.to_str()) == Some(self.extension.as_str())
            {
                files.push(path.to_path_buf());
            }
        }

        files.sort();
        files
    }
}

/// Whether `path` (relative to `root`) contains `marker`, ignoring case
pub fn is_excluded(root: &Path, path: &Path, marker: &str) -> bool {
    if marker.is_empty() {
        return false;
    }
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .to_string_lossy()
        .to_lowercase()
        .contains(&marker.to_lowercase())
}
