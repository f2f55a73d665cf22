//! Integration tests for the static quality metric
//!
//! Realistic Java/Kotlin pairs from a Spring petclinic-style codebase,
//! scored through the public `QualityMetric` API.

use evaluation::metric::{
    DebugLog, MetricConfig, MetricOutcome, QualityMetric, ScoreBreakdown, SoftCheck,
    TranslationPair, WeightedCheck, DEFAULT_DEBUG_LOG,
};
use std::path::Path;

const OWNER_JAVA: &str = r#"package org.springframework.samples.petclinic.owner;

import java.util.ArrayList;
import java.util.List;

import org.springframework.core.style.ToStringCreator;
import jakarta.persistence.Entity;

@Entity
public class Owner extends Person {

	private List<Pet> pets = new ArrayList<>();

	public List<Pet> getPets() {
		return this.pets;
	}

	@Override
	public String toString() {
		return new ToStringCreator(this).append("id", this.getId()).toString();
	}

}
"#;

fn owner_kotlin(imports: &str, class_kw: &str, pets_type: &str) -> String {
    format!(
        "Keep imports, open the class, keep the list mutable.\n<<START_J2K>>\n\
package org.springframework.samples.petclinic.owner

{imports}

@Entity
{class_kw} Owner : Person() {{

    private var pets: {pets_type} = ArrayList()

    fun getPets(): {pets_type} {{
        return this.pets
    }}

    override fun toString(): String {{
        return ToStringCreator(this).append(\"id\", this.getId()).toString()
    }}
}}
"
    )
}

const GOOD_IMPORTS: &str =
    "import org.springframework.core.style.ToStringCreator\nimport jakarta.persistence.Entity";

fn breakdown(metric: &QualityMetric, pair: &TranslationPair) -> ScoreBreakdown {
    match metric.evaluate(pair) {
        MetricOutcome::Scored(breakdown) => breakdown,
        MetricOutcome::MissingSentinel => panic!("marker should be present"),
    }
}

fn soft(breakdown: &ScoreBreakdown, name: &str) -> bool {
    breakdown
        .soft_checks
        .iter()
        .find(|c| c.name == name)
        .map(|c| c.passed)
        .unwrap_or_else(|| panic!("no soft check named {name}"))
}

#[test]
fn test_faithful_translation_scores_one() {
    let kotlin = owner_kotlin(GOOD_IMPORTS, "open class", "MutableList<Pet>");
    let metric = QualityMetric::default();
    let pair = TranslationPair::new(OWNER_JAVA, kotlin);

    let b = breakdown(&metric, &pair);
    assert!(b.hard_checks.iter().all(|c| c.passed), "{b:?}");
    assert!((metric.score(&pair) - 1.0).abs() < 1e-9, "{b:?}");
}

#[test]
fn test_missing_marker_scores_exactly_zero() {
    let kotlin = owner_kotlin(GOOD_IMPORTS, "open class", "MutableList<Pet>")
        .replace("<<START_J2K>>", "");
    let metric = QualityMetric::default();
    assert_eq!(metric.score(&TranslationPair::new(OWNER_JAVA, kotlin)), 0.0);
}

#[test]
fn test_import_preservation_boundary() {
    let java = "import org.example.A;\nimport org.example.B;\n\nfinal class Holder {}\n";
    let metric = QualityMetric::default();

    let exact = "<<START_J2K>>\nimport org.example.A\nimport org.example.B\n\nclass Holder\n";
    let b = breakdown(&metric, &TranslationPair::new(java, exact));
    assert!(soft(&b, "imports_preserved"));

    let wildcard = "<<START_J2K>>\nimport org.example.A\nimport org.example.*\n\nclass Holder\n";
    let b = breakdown(&metric, &TranslationPair::new(java, wildcard));
    assert!(!soft(&b, "imports_preserved"));
}

#[test]
fn test_class_modifier_fidelity() {
    let java = "public class Visit extends BaseEntity {}";
    let metric = QualityMetric::default();

    let open = "<<START_J2K>>\nopen class Visit : BaseEntity()\n";
    let b = breakdown(&metric, &TranslationPair::new(java, open));
    assert!(soft(&b, "open_classes_match"));

    let closed = "<<START_J2K>>\nclass Visit : BaseEntity()\n";
    let b = breakdown(&metric, &TranslationPair::new(java, closed));
    assert!(!soft(&b, "open_classes_match"));
}

#[test]
fn test_two_of_three_soft_checks() {
    // read-only List where Java had a mutable one
    let kotlin = owner_kotlin(GOOD_IMPORTS, "open class", "List<Pet>");
    let metric = QualityMetric::default();
    let pair = TranslationPair::new(OWNER_JAVA, kotlin);

    let b = breakdown(&metric, &pair);
    assert!(b.hard_checks.iter().all(|c| c.passed), "{b:?}");
    assert!(soft(&b, "imports_preserved"));
    assert!(soft(&b, "open_classes_match"));
    assert!(!soft(&b, "mutability_match"));

    let expected = 0.4 + 0.4 + 0.2 * (2.0 / 3.0);
    assert!((metric.score(&pair) - expected).abs() < 1e-9);
}

#[test]
fn test_soft_weights_are_normalised() {
    let config = MetricConfig {
        soft_checks: vec![
            WeightedCheck::new(SoftCheck::ImportsPreserved, 1.0),
            WeightedCheck::new(SoftCheck::OpenClassesMatch, 1.0),
            WeightedCheck::new(SoftCheck::MutabilityMatch, 2.0),
        ],
        ..MetricConfig::default()
    };
    let kotlin = owner_kotlin(GOOD_IMPORTS, "open class", "List<Pet>");
    let score = QualityMetric::new(config).score(&TranslationPair::new(OWNER_JAVA, kotlin));
    assert!((score - (0.8 + 0.2 * 0.5)).abs() < 1e-9);
}

#[test]
fn test_low_scores_are_logged_for_review() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("metric_debug/bad_preds.jsonl");
    let metric = QualityMetric::new(MetricConfig::default().with_debug_log(&log_path));

    // Two markers and a closed class: both hard checks fail
    let bad = TranslationPair::new(
        "public class Pet {}",
        "<<START_J2K>>\nclass Pet {\n<<START_J2K>>",
    )
    .with_rationale("1. Drop the public modifier");
    let score = metric.score(&bad);
    assert!(score < 0.6, "score {score}");

    // Above the threshold: not logged
    let good = TranslationPair::new("public class Pet {}", "<<START_J2K>>\nopen class Pet\n");
    assert!(metric.score(&good) >= 0.6);

    let records = DebugLog::new(&log_path).read_all();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].rationale, "1. Drop the public modifier");
    assert!((records[0].score_parts.sentinel - 0.4).abs() < 1e-9);
    assert_eq!(records[0].score_parts.hard, 0.0);
}

#[test]
fn test_default_config_logs_under_metric_debug() {
    let dir = tempfile::tempdir().unwrap();
    let config = MetricConfig::default();
    let default_log = config.debug_log.clone().unwrap();
    assert_eq!(default_log, Path::new(DEFAULT_DEBUG_LOG));

    // Same relative layout, rooted in the temp dir
    let metric = QualityMetric::new(config.with_debug_log(dir.path().join(&default_log)));
    let bad = TranslationPair::new("public class Pet {}", "<<START_J2K>>\nclass Pet {\n<<START_J2K>>");
    assert!(metric.score(&bad) < 0.6);

    let records = DebugLog::new(dir.path().join("metric_debug/bad_preds.jsonl")).read_all();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].original, "public class Pet {}");
}

#[test]
fn test_record_reuses_evaluated_outcome() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("bad.jsonl");
    let metric = QualityMetric::new(MetricConfig::default().with_debug_log(&log_path));
    let bad = TranslationPair::new("public class Pet {}", "<<START_J2K>>\nclass Pet {\n<<START_J2K>>");

    let outcome = metric.evaluate(&bad);
    assert!(!log_path.exists());
    assert_eq!(metric.record(&bad, &outcome), outcome.total());
    assert_eq!(DebugLog::new(&log_path).read_all().len(), 1);

    let missing = TranslationPair::new("public class Pet {}", "class Pet");
    assert_eq!(metric.record(&missing, &metric.evaluate(&missing)), 0.0);
    assert_eq!(DebugLog::new(&log_path).read_all().len(), 1);
}

#[test]
fn test_strict_config_flags_java_only_apis() {
    let java = "final class Name { boolean same(String a, String b) { return a.equalsIgnoreCase(b); } }";
    let kotlin = "<<START_J2K>>\nclass Name {\n    fun same(a: String, b: String): Boolean = a.equalsIgnoreCase(b)\n}\n";
    let pair = TranslationPair::new(java, kotlin);

    let lenient = QualityMetric::default().score(&pair);
    let strict = QualityMetric::new(MetricConfig::strict()).score(&pair);
    assert!((lenient - 1.0).abs() < 1e-9);
    assert!((strict - (0.4 + 0.4 * (2.0 / 3.0) + 0.2)).abs() < 1e-9);
}
