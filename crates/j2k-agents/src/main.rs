use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use evaluation::analytics::ScoreSummary;
use evaluation::batch::{BatchConverter, Converter, Journal, ReplayConverter};
use evaluation::dataset;
use evaluation::metric::{HardCheck, MetricConfig, MetricOutcome, QualityMetric, TranslationPair};
use evaluation::polish;
use evaluation::verifier::BuildVerifier;
use j2k_agents::{J2kConfig, ModelConverter};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "j2k", author, version, about = "Java to Kotlin translation evaluation", long_about = None)]
struct Cli {
    /// TOML config overlaying the environment defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Project to convert (overrides `batch.project_root`)
    #[arg(long, global = true)]
    project: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert, verify and score every eligible file of the project
    Convert {
        /// Serve stored translations from this directory instead of a model
        #[arg(long)]
        replay_dir: Option<PathBuf>,
    },
    /// Restore a file left in flight by an interrupted run
    Recover,
    /// Summarise a score log
    Analyze {
        #[arg(default_value = "scores.txt")]
        score_log: PathBuf,
    },
    /// Statically score one translation
    Score {
        original: PathBuf,
        translated: PathBuf,
        /// File holding the model's reasoning, kept in the debug log
        #[arg(long)]
        rationale: Option<PathBuf>,
        /// Also reject Java-only library calls
        #[arg(long)]
        strict: bool,
    },
    /// Statically score every pair of a JSONL dataset
    ScoreDataset {
        dataset: PathBuf,
        #[arg(long)]
        strict: bool,
    },
    /// Export `<Name>.java` + `<Name>_polished.kt` pairs as JSONL
    Export {
        #[arg(default_value = ".")]
        dir: PathBuf,
        #[arg(long, default_value = "j2k_cases.jsonl")]
        output: PathBuf,
    },
    /// Measure how much of each generated file survived polishing
    Polish {
        #[arg(default_value = "conversion-logs/v1")]
        dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let mut config = J2kConfig::load(cli.config.as_deref()).context("Failed to load config")?;
    if let Some(project) = cli.project {
        config.batch.project_root = project;
    }

    match cli.command {
        Commands::Convert { replay_dir } => convert(config, replay_dir).await,
        Commands::Recover => recover(&config),
        Commands::Analyze { score_log } => analyze(score_log),
        Commands::Score {
            original,
            translated,
            rationale,
            strict,
        } => score(&config, original, translated, rationale, strict),
        Commands::ScoreDataset { dataset, strict } => score_dataset(&config, dataset, strict),
        Commands::Export { dir, output } => {
            let count = dataset::export_jsonl(&dir, &output)
                .with_context(|| format!("Failed to export {}", dir.display()))?;
            println!("{count} pairs written to {}", output.display());
            Ok(())
        }
        Commands::Polish { dir } => {
            let results = polish::measure_dir(&dir)
                .with_context(|| format!("Failed to read {}", dir.display()))?;
            for result in &results {
                println!("{result}");
            }
            Ok(())
        }
    }
}

async fn convert(config: J2kConfig, replay_dir: Option<PathBuf>) -> Result<()> {
    let converter: Box<dyn Converter> = match replay_dir {
        Some(dir) => Box::new(ReplayConverter::new(dir)),
        None => Box::new(
            ModelConverter::new(config.endpoint.clone())
                .context("Failed to build HTTP client")?
                .with_sentinel(config.metric.sentinel.clone()),
        ),
    };
    let verifier_config = config.verifier_config();
    info!(
        project = %config.batch.project_root.display(),
        converter = converter.name(),
        build_system = %verifier_config.build_system,
        "j2k starting"
    );

    let verifier = BuildVerifier::new(&config.batch.project_root, verifier_config);
    let batch = BatchConverter::new(config.batch, converter, Box::new(verifier));

    // Dropping the run future restores the in-flight file
    let finished = tokio::select! {
        report = batch.run() => Some(report),
        _ = tokio::signal::ctrl_c() => None,
    };
    let Some(report) = finished else {
        warn!("Interrupted, in-flight file restored");
        bail!("Batch interrupted");
    };
    let report = report.context("Batch aborted")?;

    println!(
        "{} scored, {} failed, {} already scored, {} excluded",
        report.scored().count(),
        report.failed().count(),
        report.skipped,
        report.excluded
    );
    Ok(())
}

fn recover(config: &J2kConfig) -> Result<()> {
    let journal = Journal::new(config.batch.journal_path());
    match journal.recover().context("Recovery failed")? {
        Some(identifier) => println!("Restored {identifier}"),
        None => println!("Nothing in flight"),
    }
    Ok(())
}

fn analyze(score_log: PathBuf) -> Result<()> {
    let text = std::fs::read_to_string(&score_log)
        .with_context(|| format!("Failed to read {}", score_log.display()))?;
    println!("{}", ScoreSummary::from_log_text(&text));
    Ok(())
}

fn metric_config(config: &J2kConfig, strict: bool) -> MetricConfig {
    let mut metric = config.metric.clone();
    if strict && !metric.hard_checks.contains(&HardCheck::NoSourceOnlyApis) {
        metric.hard_checks.push(HardCheck::NoSourceOnlyApis);
    }
    metric
}

fn score(
    config: &J2kConfig,
    original: PathBuf,
    translated: PathBuf,
    rationale: Option<PathBuf>,
    strict: bool,
) -> Result<()> {
    let read = |path: &PathBuf| {
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
    };
    let mut pair = TranslationPair::new(read(&original)?, read(&translated)?);
    if let Some(ref path) = rationale {
        pair = pair.with_rationale(read(path)?);
    }

    let metric = QualityMetric::new(metric_config(config, strict));
    let outcome = metric.evaluate(&pair);
    match outcome {
        MetricOutcome::MissingSentinel => {
            println!("score=0 (output marker {} missing)", metric.config().sentinel)
        }
        MetricOutcome::Scored(ref breakdown) => {
            for check in breakdown.hard_checks.iter().chain(&breakdown.soft_checks) {
                println!(
                    "{:<22} {}",
                    check.name,
                    if check.passed { "pass" } else { "FAIL" }
                );
            }
            println!(
                "score={:.4} (sentinel {:.2}, hard {:.2}, soft {:.2})",
                breakdown.total, breakdown.parts.sentinel, breakdown.parts.hard, breakdown.parts.soft
            );
        }
    }
    metric.record(&pair, &outcome);
    Ok(())
}

fn score_dataset(config: &J2kConfig, path: PathBuf, strict: bool) -> Result<()> {
    let pairs = dataset::load_jsonl(&path)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    if pairs.is_empty() {
        bail!("{} holds no pairs", path.display());
    }
    let metric = QualityMetric::new(metric_config(config, strict));
    let result = dataset::score_dataset(&metric, &pairs);
    for (i, score) in result.scores.iter().enumerate() {
        println!("{i}: {score:.4}");
    }
    if let Some(mean) = result.mean {
        println!("mean={mean:.4} over {} pairs", result.scores.len());
    }
    Ok(())
}
