//! Hard and soft checks over a translation
//!
//! Every check yields pass/fail. Hard checks look only at the translated
//! text; soft checks compare the translated code against the original to
//! catch fidelity defects the compiler would accept.

use super::syntax::is_valid_kotlin;
use super::MetricConfig;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Java class declarations, capturing an optional abstract/final modifier.
static JAVA_CLASS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:(public|protected|private)\s+)?(?:(abstract|final)\s+)?class\s+([A-Z]\w*)")
        .expect("JAVA_CLASS_RE regex should compile")
});

static KOTLIN_OPEN_CLASS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bopen\s+class\s+[A-Z]\w*").expect("KOTLIN_OPEN_CLASS_RE regex should compile")
});

/// Generic List/Set/Map usages in Java source.
static JAVA_COLLECTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(java\.util\.)?(List|Set|Map)<").expect("JAVA_COLLECTION_RE regex should compile")
});

static KOTLIN_MUTABLE_TYPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bMutable(List|Set|Map)<").expect("KOTLIN_MUTABLE_TYPE_RE regex should compile")
});

/// `mutableListOf(...)`, also with explicit type arguments.
static KOTLIN_MUTABLE_CTOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bmutable(List|Set|Map)Of\s*(?:<[^()]*>)?\s*\(")
        .expect("KOTLIN_MUTABLE_CTOR_RE regex should compile")
});

/// Binary structural checks. Failing one means the output is unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HardCheck {
    /// The output marker appears exactly once
    SingleSentinel,
    /// The code after the marker parses as Kotlin
    ValidSyntax,
    /// No Java-only library calls that Kotlin's stdlib lacks
    NoSourceOnlyApis,
}

impl HardCheck {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SingleSentinel => "single_sentinel",
            Self::ValidSyntax => "valid_syntax",
            Self::NoSourceOnlyApis => "no_source_only_apis",
        }
    }

    /// `translated` is the full model output, `code` the part after the marker.
    pub fn run(&self, translated: &str, code: &str, config: &MetricConfig) -> bool {
        match self {
            Self::SingleSentinel => translated.matches(config.sentinel.as_str()).count() == 1,
            Self::ValidSyntax => is_valid_kotlin(code),
            Self::NoSourceOnlyApis => !config
                .source_only_apis
                .iter()
                .any(|api| code.contains(api.as_str())),
        }
    }
}

/// Heuristic fidelity checks. Failing one marks a quality defect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoftCheck {
    /// Same number of imports (minus built-in collections), no wildcards
    ImportsPreserved,
    /// Every implicitly extensible Java class became `open`
    OpenClassesMatch,
    /// Every Java generic collection became a Kotlin mutable collection
    MutabilityMatch,
}

impl SoftCheck {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ImportsPreserved => "imports_preserved",
            Self::OpenClassesMatch => "open_classes_match",
            Self::MutabilityMatch => "mutability_match",
        }
    }

    pub fn run(&self, original: &str, code: &str, config: &MetricConfig) -> bool {
        match self {
            Self::ImportsPreserved => imports_preserved(original, code, &config.ignored_imports),
            Self::OpenClassesMatch => open_classes_match(original, code),
            Self::MutabilityMatch => mutability_match(original, code),
        }
    }
}

/// A soft check together with its weight in the soft category
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedCheck {
    pub check: SoftCheck,
    pub weight: f64,
}

impl WeightedCheck {
    pub fn new(check: SoftCheck, weight: f64) -> Self {
        Self { check, weight }
    }
}

/// Trimmed `import ...` lines of a source file
pub fn extract_imports(code: &str) -> Vec<&str> {
    code.lines()
        .map(str::trim)
        .filter(|line| line.starts_with("import "))
        .collect()
}

pub fn is_wildcard_import(line: &str) -> bool {
    line.ends_with(".*") || line.ends_with(".*;")
}

pub fn imports_preserved(original: &str, code: &str, ignored: &[String]) -> bool {
    let expected = extract_imports(original)
        .into_iter()
        .filter(|import| !ignored.iter().any(|ig| import.contains(ig.as_str())))
        .count();
    if expected == 0 {
        return true;
    }

    let translated = extract_imports(code);
    translated.len() == expected && !translated.iter().any(|line| is_wildcard_import(line))
}

/// Java classes declared without `final` or `abstract`
pub fn classes_needing_open(original: &str) -> usize {
    JAVA_CLASS_RE
        .captures_iter(original)
        .filter(|caps| caps.get(2).is_none())
        .count()
}

pub fn open_classes_match(original: &str, code: &str) -> bool {
    let needed = classes_needing_open(original);
    if needed == 0 {
        return true;
    }
    KOTLIN_OPEN_CLASS_RE.find_iter(code).count() == needed
}

pub fn mutable_collections_needed(original: &str) -> usize {
    JAVA_COLLECTION_RE.find_iter(original).count()
}

pub fn mutable_collections_found(code: &str) -> usize {
    KOTLIN_MUTABLE_TYPE_RE.find_iter(code).count() + KOTLIN_MUTABLE_CTOR_RE.find_iter(code).count()
}

pub fn mutability_match(original: &str, code: &str) -> bool {
    let needed = mutable_collections_needed(original);
    if needed == 0 {
        return true;
    }
    mutable_collections_found(code) == needed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ignored() -> Vec<String> {
        MetricConfig::default().ignored_imports
    }

    #[test]
    fn test_imports_preserved_counts_and_ignores_collections() {
        let java = "package a;\n\nimport java.util.List;\nimport org.example.A;\nimport org.example.B;\n";
        let kotlin = "package a\n\nimport org.example.A\nimport org.example.B\n";
        assert!(imports_preserved(java, kotlin, &ignored()));

        let lost = "package a\n\nimport org.example.A\n";
        assert!(!imports_preserved(java, lost, &ignored()));
    }

    #[test]
    fn test_wildcard_import_fails_even_when_count_matches() {
        let java = "import org.example.A;\nimport org.example.B;\n";
        let kotlin = "import org.example.A\nimport org.other.*\n";
        assert!(!imports_preserved(java, kotlin, &ignored()));
    }

    #[test]
    fn test_imports_trivially_pass_without_qualifying_imports() {
        let java = "import java.util.ArrayList;\nimport java.util.HashMap;\nclass A {}";
        assert!(imports_preserved(java, "import kotlin.collections.*", &ignored()));
    }

    #[test]
    fn test_classes_needing_open() {
        let java = "public class Owner extends Person {}\n\
                    public final class Util {}\n\
                    public abstract class BaseEntity {}\n\
                    class Helper {}";
        assert_eq!(classes_needing_open(java), 2);
    }

    #[test]
    fn test_open_classes_match() {
        let java = "public class Vet extends Person {}";
        assert!(open_classes_match(java, "open class Vet : Person()"));
        assert!(!open_classes_match(java, "class Vet : Person()"));
        assert!(open_classes_match("public final class Vet {}", "class Vet"));
    }

    #[test]
    fn test_mutability_match() {
        let java = "private List<Pet> pets = new ArrayList<>();\nprivate Map<String, Visit> visits;";
        assert_eq!(mutable_collections_needed(java), 2);

        let kotlin = "val pets: MutableList<Pet> = ArrayList()\nval visits = mutableMapOf<String, Visit>()";
        assert_eq!(mutable_collections_found(kotlin), 2);
        assert!(mutability_match(java, kotlin));

        let readonly = "val pets: List<Pet> = listOf()\nval visits: Map<String, Visit> = mapOf()";
        assert!(!mutability_match(java, readonly));
    }

    #[test]
    fn test_source_only_apis() {
        let config = MetricConfig::default();
        let check = HardCheck::NoSourceOnlyApis;
        assert!(!check.run("", "name.equalsIgnoreCase(other)", &config));
        assert!(check.run("", "name.equals(other, ignoreCase = true)", &config));
    }

    #[test]
    fn test_single_sentinel() {
        let config = MetricConfig::default();
        let check = HardCheck::SingleSentinel;
        assert!(check.run("think\n<<START_J2K>>\nclass A", "", &config));
        assert!(!check.run("<<START_J2K>>\nclass A\n<<START_J2K>>", "", &config));
        assert!(!check.run("class A", "", &config));
    }
}
