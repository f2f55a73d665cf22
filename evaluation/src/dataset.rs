//! Translation datasets as JSONL
//!
//! A conversion-log directory holds `<Name>.java` next to a hand-polished
//! `<Name>_polished.kt`. Both start with a two-line timestamp header that is
//! stripped on export.

use crate::error::{EvalError, EvalResult};
use crate::metric::{QualityMetric, TranslationPair};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

const POLISHED_SUFFIX: &str = "_polished.kt";

/// Drop the first two lines (timestamp header and blank line)
pub fn strip_header(text: &str) -> String {
    text.lines().skip(2).collect::<Vec<_>>().join("\n")
}

/// Collect `(name, pair)` for every `.java` with a polished translation,
/// sorted by name.
pub fn collect_pairs(dir: &Path) -> EvalResult<Vec<(String, TranslationPair)>> {
    let entries = std::fs::read_dir(dir).map_err(|e| EvalError::io(dir, e))?;

    let mut names: Vec<String> = entries
        .flatten()
        .filter_map(|entry| {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("java") {
                return None;
            }
            path.file_stem()
                .and_then(|s| s.to_str())
                .map(str::to_string)
        })
        .collect();
    names.sort();

    let mut pairs = Vec::with_capacity(names.len());
    for name in names {
        let polished = dir.join(format!("{name}{POLISHED_SUFFIX}"));
        if !polished.is_file() {
            warn!(name = %name, "No polished translation, skipping");
            continue;
        }
        let java_path = dir.join(format!("{name}.java"));
        let java = std::fs::read_to_string(&java_path).map_err(|e| EvalError::io(&java_path, e))?;
        let kotlin = std::fs::read_to_string(&polished).map_err(|e| EvalError::io(&polished, e))?;
        pairs.push((
            name,
            TranslationPair::new(strip_header(&java), strip_header(&kotlin)),
        ));
    }
    Ok(pairs)
}

/// Write the pairs of `dir` to `output` as JSONL. Returns the count.
pub fn export_jsonl(dir: &Path, output: &Path) -> EvalResult<usize> {
    let pairs = collect_pairs(dir)?;
    if pairs.is_empty() {
        return Err(EvalError::Dataset {
            message: format!("no java/polished pairs found in {}", dir.display()),
        });
    }

    let mut buf = Vec::new();
    for (_, pair) in &pairs {
        serde_json::to_writer(&mut buf, pair)?;
        buf.push(b'\n');
    }
    let mut file = std::fs::File::create(output).map_err(|e| EvalError::io(output, e))?;
    file.write_all(&buf).map_err(|e| EvalError::io(output, e))?;

    info!(count = pairs.len(), output = %output.display(), "Exported dataset");
    Ok(pairs.len())
}

pub fn load_jsonl(path: &Path) -> EvalResult<Vec<TranslationPair>> {
    let content = std::fs::read_to_string(path).map_err(|e| EvalError::io(path, e))?;
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            serde_json::from_str(line).map_err(|e| EvalError::Dataset {
                message: format!("{}:{}: {e}", path.display(), n + 1),
            })
        })
        .collect()
}

/// Per-pair scores and their mean
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetScore {
    pub scores: Vec<f64>,
    pub mean: Option<f64>,
}

pub fn score_dataset(metric: &QualityMetric, pairs: &[TranslationPair]) -> DatasetScore {
    let scores: Vec<f64> = pairs.iter().map(|pair| metric.score(pair)).collect();
    let mean = if scores.is_empty() {
        None
    } else {
        Some(scores.iter().sum::<f64>() / scores.len() as f64)
    };
    DatasetScore { scores, mean }
}
