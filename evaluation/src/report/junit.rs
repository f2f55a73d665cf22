//! JUnit-style XML report parsing
//!
//! A fragment is either a single `<testsuite>` document (Gradle, Surefire)
//! or a wrapper such as `<testsuites>` holding nested suites. Only the four
//! count attributes are read; everything else in the document is ignored.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

/// Per-fragment parse failure. The aggregator skips the fragment.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReportError {
    #[error("XML error at byte {position}: {message}")]
    Xml { position: u64, message: String },

    #[error("Attribute {name}=\"{value}\" is not an integer")]
    InvalidAttribute { name: String, value: String },

    #[error("Document has no root element")]
    NoRootElement,

    #[error("Document ended with {open} unclosed element(s)")]
    Truncated { open: usize },

    #[error("Failed to read report {path}: {message}")]
    Io { path: String, message: String },
}

/// Counts declared by one `<testsuite>` element
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SuiteCounts {
    pub tests: i64,
    pub failures: i64,
    pub errors: i64,
    pub skipped: i64,
}

impl SuiteCounts {
    fn from_element(element: &BytesStart<'_>) -> Result<Self, ReportError> {
        let mut counts = Self::default();
        let mut ignored: Option<i64> = None;
        let mut skipped: Option<i64> = None;

        for attr in element.attributes() {
            let attr = attr.map_err(|e| ReportError::Xml {
                position: 0,
                message: e.to_string(),
            })?;
            let name = String::from_utf8_lossy(attr.key.as_ref()).to_string();
            let slot = match name.as_str() {
                "tests" => &mut counts.tests,
                "failures" => &mut counts.failures,
                "errors" => &mut counts.errors,
                "skipped" => {
                    skipped = Some(parse_count(&name, &attr.value)?);
                    continue;
                }
                "ignored" => {
                    ignored = Some(parse_count(&name, &attr.value)?);
                    continue;
                }
                _ => continue,
            };
            *slot = parse_count(&name, &attr.value)?;
        }

        counts.skipped = skipped.or(ignored).unwrap_or(0);
        Ok(counts)
    }
}

fn parse_count(name: &str, raw: &[u8]) -> Result<i64, ReportError> {
    let value = String::from_utf8_lossy(raw);
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| ReportError::InvalidAttribute {
            name: name.to_string(),
            value: value.to_string(),
        })
}

fn is_suite(element: &BytesStart<'_>) -> bool {
    let name = element.local_name();
    String::from_utf8_lossy(name.as_ref())
        .to_ascii_lowercase()
        .ends_with("testsuite")
}

/// Parse one report document into the suites it declares.
///
/// When the root element is itself a suite only the root is counted, even
/// if it nests further suites. Otherwise every suite element at any depth is
/// counted. The whole document must be well formed; a failure anywhere
/// discards the fragment.
pub fn parse_suites(document: &str) -> Result<Vec<SuiteCounts>, ReportError> {
    let mut reader = Reader::from_str(document);
    reader.config_mut().trim_text(true);

    let mut suites = Vec::new();
    let mut depth = 0usize;
    let mut root_is_suite: Option<bool> = None;

    loop {
        let event = reader.read_event().map_err(|e| ReportError::Xml {
            position: reader.buffer_position() as u64,
            message: e.to_string(),
        })?;

        match event {
            Event::Start(ref element) | Event::Empty(ref element) => {
                let self_closing = matches!(event, Event::Empty(_));
                match root_is_suite {
                    None => {
                        let suite = is_suite(element);
                        root_is_suite = Some(suite);
                        if suite {
                            suites.push(SuiteCounts::from_element(element)?);
                        }
                    }
                    Some(false) if is_suite(element) => {
                        suites.push(SuiteCounts::from_element(element)?);
                    }
                    Some(_) => {}
                }
                if !self_closing {
                    depth += 1;
                }
            }
            Event::End(_) => {
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if root_is_suite.is_none() {
        return Err(ReportError::NoRootElement);
    }
    if depth != 0 {
        return Err(ReportError::Truncated { open: depth });
    }

    Ok(suites)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_testsuite() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<testsuite name="OwnerControllerTests" tests="7" skipped="1" failures="2" errors="0" timestamp="2025-07-22T08:42:33">
  <properties/>
  <testcase name="testInitCreationForm" classname="OwnerControllerTests" time="0.12"/>
  <testcase name="testProcessFindFormByLastName" classname="OwnerControllerTests" time="0.03">
    <failure message="expected: 200" type="java.lang.AssertionError">stack</failure>
  </testcase>
  <system-out><![CDATA[]]></system-out>
</testsuite>"#;

        let suites = parse_suites(xml).unwrap();
        assert_eq!(
            suites,
            vec![SuiteCounts {
                tests: 7,
                failures: 2,
                errors: 0,
                skipped: 1,
            }]
        );
    }

    #[test]
    fn test_wrapper_with_nested_suites() {
        let xml = r#"<testsuites>
  <testsuite tests="3" failures="1" errors="0" skipped="0"/>
  <group>
    <testsuite tests="5" failures="0" errors="2"></testsuite>
  </group>
</testsuites>"#;

        let suites = parse_suites(xml).unwrap();
        assert_eq!(suites.len(), 2);
        assert_eq!(suites[1].tests, 5);
        assert_eq!(suites[1].errors, 2);
        assert_eq!(suites[1].skipped, 0);
    }

    #[test]
    fn test_root_suite_ignores_nested_suites() {
        let xml = r#"<testsuite tests="2"><testsuite tests="40"/></testsuite>"#;
        let suites = parse_suites(xml).unwrap();
        assert_eq!(suites.len(), 1);
        assert_eq!(suites[0].tests, 2);
    }

    #[test]
    fn test_ignored_alias_and_missing_attributes() {
        let suites = parse_suites(r#"<testsuite tests="4" ignored="3"/>"#).unwrap();
        assert_eq!(suites[0].skipped, 3);
        assert_eq!(suites[0].failures, 0);
        assert_eq!(suites[0].errors, 0);

        // skipped wins over ignored when both are present
        let suites = parse_suites(r#"<testsuite tests="4" ignored="3" skipped="1"/>"#).unwrap();
        assert_eq!(suites[0].skipped, 1);
    }

    #[test]
    fn test_non_integer_attribute_rejects_fragment() {
        let err = parse_suites(r#"<testsuite tests="many"/>"#).unwrap_err();
        assert!(matches!(err, ReportError::InvalidAttribute { .. }));
    }

    #[test]
    fn test_malformed_documents() {
        assert!(parse_suites("").is_err());
        assert!(parse_suites("not xml at all").is_err());
        assert!(parse_suites(r#"<testsuite tests="1">"#).is_err());
        assert!(parse_suites(r#"<testsuite tests="1"></testcase>"#).is_err());
    }

    #[test]
    fn test_unrelated_root_yields_no_suites() {
        let suites = parse_suites("<coverage lines=\"10\"/>").unwrap();
        assert!(suites.is_empty());
    }
}
