//! How much of a generated translation survived manual polishing

use crate::error::{EvalError, EvalResult};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Edit distance between a generated file and its polished version
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolishDistance {
    pub name: String,
    /// Levenshtein distance in characters
    pub edits: usize,
    pub polished_len: usize,
    /// Share of the polished file that had to be edited
    pub fraction_edited: f64,
}

impl PolishDistance {
    pub fn between(name: impl Into<String>, generated: &str, polished: &str) -> Self {
        let edits = strsim::levenshtein(generated, polished);
        let polished_len = polished.chars().count();
        let fraction_edited = if polished_len == 0 {
            if edits == 0 {
                0.0
            } else {
                1.0
            }
        } else {
            edits as f64 / polished_len as f64
        };
        Self {
            name: name.into(),
            edits,
            polished_len,
            fraction_edited,
        }
    }

    /// Share of the polished file taken unchanged from the generated one
    pub fn fraction_retained(&self) -> f64 {
        (1.0 - self.fraction_edited).max(0.0)
    }
}

impl std::fmt::Display for PolishDistance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} characters changed out of {} total ({:.1}% edited, {:.1}% retained)",
            self.name,
            self.edits,
            self.polished_len,
            self.fraction_edited * 100.0,
            self.fraction_retained() * 100.0
        )
    }
}

/// Pair every `<name>_generated.kt` with `<name>_polished.kt` in `dir` and
/// measure each pair. Unpaired files are ignored.
pub fn measure_dir(dir: &Path) -> EvalResult<Vec<PolishDistance>> {
    let entries = std::fs::read_dir(dir).map_err(|e| EvalError::io(dir, e))?;

    let mut pairs: BTreeMap<String, (Option<PathBuf>, Option<PathBuf>)> = BTreeMap::new();
    for entry in entries.flatten() {
        let path = entry.path();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some(name) = file_name.strip_suffix("_generated.kt") {
            pairs.entry(name.to_string()).or_default().0 = Some(path.clone());
        } else if let Some(name) = file_name.strip_suffix("_polished.kt") {
            pairs.entry(name.to_string()).or_default().1 = Some(path.clone());
        }
    }

    let mut results = Vec::new();
    for (name, pair) in pairs {
        let (Some(generated), Some(polished)) = pair else {
            continue;
        };
        let generated = std::fs::read_to_string(&generated).map_err(|e| EvalError::io(&generated, e))?;
        let polished = std::fs::read_to_string(&polished).map_err(|e| EvalError::io(&polished, e))?;
        results.push(PolishDistance::between(name, &generated, &polished));
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_between() {
        let d = PolishDistance::between("Owner", "class Owner", "open class Owner");
        assert_eq!(d.edits, 5);
        assert_eq!(d.polished_len, 16);
        assert!((d.fraction_edited - 5.0 / 16.0).abs() < 1e-9);
        assert!((d.fraction_retained() - 11.0 / 16.0).abs() < 1e-9);
    }

    #[test]
    fn test_between_empty_polished() {
        assert_eq!(PolishDistance::between("A", "", "").fraction_edited, 0.0);
        assert_eq!(PolishDistance::between("A", "x", "").fraction_retained(), 0.0);
    }

    #[test]
    fn test_measure_dir_pairs_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Owner_generated.kt"), "class Owner").unwrap();
        std::fs::write(dir.path().join("Owner_polished.kt"), "class Owner").unwrap();
        std::fs::write(dir.path().join("Pet_generated.kt"), "class Pet").unwrap();
        std::fs::write(dir.path().join("Pet.java"), "class Pet {}").unwrap();

        let results = measure_dir(dir.path()).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Owner");
        assert_eq!(results[0].edits, 0);
        assert_eq!(results[0].fraction_retained(), 1.0);
    }
}
