//! Threat categories and their built-in signatures.
//!
//! Patterns are written without inline flags; the catalog compiles every set
//! case-insensitively.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named threat class. Declaration order is classification priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatCategory {
    SqlInjection,
    CrossSiteScripting,
    CommandInjection,
    PromptInjection,
    PathTraversal,
    Ssrf,
    SensitiveDataExposure,
    SecurityMisconfiguration,
}

impl ThreatCategory {
    /// All categories in priority order.
    pub const ALL: [ThreatCategory; 8] = [
        ThreatCategory::SqlInjection,
        ThreatCategory::CrossSiteScripting,
        ThreatCategory::CommandInjection,
        ThreatCategory::PromptInjection,
        ThreatCategory::PathTraversal,
        ThreatCategory::Ssrf,
        ThreatCategory::SensitiveDataExposure,
        ThreatCategory::SecurityMisconfiguration,
    ];

    /// Reason code reported in responses and audit records.
    pub fn reason(&self) -> &'static str {
        match self {
            ThreatCategory::SqlInjection => "SQL Injection",
            ThreatCategory::CrossSiteScripting => "XSS Attack",
            ThreatCategory::CommandInjection => "Command Injection",
            ThreatCategory::PromptInjection => "Prompt Injection",
            ThreatCategory::PathTraversal => "Path Traversal",
            ThreatCategory::Ssrf => "SSRF Attempt",
            ThreatCategory::SensitiveDataExposure => "Sensitive Data Exposure",
            ThreatCategory::SecurityMisconfiguration => "Security Misconfiguration",
        }
    }

    /// Short label used for metrics and config keys.
    pub fn label(&self) -> &'static str {
        match self {
            ThreatCategory::SqlInjection => "sql_injection",
            ThreatCategory::CrossSiteScripting => "cross_site_scripting",
            ThreatCategory::CommandInjection => "command_injection",
            ThreatCategory::PromptInjection => "prompt_injection",
            ThreatCategory::PathTraversal => "path_traversal",
            ThreatCategory::Ssrf => "ssrf",
            ThreatCategory::SensitiveDataExposure => "sensitive_data_exposure",
            ThreatCategory::SecurityMisconfiguration => "security_misconfiguration",
        }
    }

    /// Built-in patterns for this category.
    pub fn builtin_patterns(&self) -> &'static [&'static str] {
        match self {
            ThreatCategory::SqlInjection => SQL_INJECTION,
            ThreatCategory::CrossSiteScripting => CROSS_SITE_SCRIPTING,
            ThreatCategory::CommandInjection => COMMAND_INJECTION,
            ThreatCategory::PromptInjection => PROMPT_INJECTION,
            ThreatCategory::PathTraversal => PATH_TRAVERSAL,
            ThreatCategory::Ssrf => SSRF,
            ThreatCategory::SensitiveDataExposure => SENSITIVE_DATA_EXPOSURE,
            ThreatCategory::SecurityMisconfiguration => SECURITY_MISCONFIGURATION,
        }
    }
}

impl fmt::Display for ThreatCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

const SQL_INJECTION: &[&str] = &[
    r"\bunion\s+(all\s+)?select\b",
    r"\bdrop\s+(table|database|schema)\b",
    r"\binsert\s+into\b",
    r"\bupdate\s+\w+\s+set\b",
    r"\bdelete\s+from\b",
    r#"\bor\s+['"]?1['"]?\s*=\s*['"]?1['"]?\b"#,
    r#"\band\s+['"]?1['"]?\s*=\s*['"]?1['"]?\b"#,
    r"\bexec(ute)?\s*\(",
    r"\bsp_\w+",
    r"\bxp_\w+",
    r"\bselect\s+.*\bfrom\s+information_schema\b",
    r"\bselect\s+.*\bfrom\s+sys\.",
    r"\bselect\s+.*\bfrom\s+mysql\.",
    r"\bselect\s+.*\bfrom\s+pg_",
    r"\bwaitfor\s+delay\b",
    r"\bbenchmark\s*\(",
    r"\bsleep\s*\(",
    r"\bload_file\s*\(",
    r"\binto\s+outfile\b",
    r"\binto\s+dumpfile\b",
];

const CROSS_SITE_SCRIPTING: &[&str] = &[
    r"(?s)<script[^>]*>.*?</script[^>]*>",
    r#"\bon\w+\s*=\s*['"]?[^'"]*['"]?"#,
    r"javascript:\s*[^\s]",
    r"<iframe[^>]*>",
    r"<object[^>]*>",
    r"<embed[^>]*>",
    r"<link[^>]*>",
    r"<meta[^>]*>",
    r"vbscript:",
    r"data:text/html",
    r"expression\s*\(",
    r#"<img[^>]*src\s*=\s*['"]?javascript:"#,
    r"<svg[^>]*onload\s*=",
];

const COMMAND_INJECTION: &[&str] = &[
    r";\s*(rm|del|format|shutdown)",
    r"\|\s*(nc|netcat|wget|curl)",
    r"&&\s*(cat|type|more)",
    r"`[^`]*`",
    r"\$\([^)]*\)",
    r"\\x[0-9a-f]{2}",
    r"%[0-9a-f]{2}",
];

const PROMPT_INJECTION: &[&str] = &[
    r"ignore\s+(all\s+)?(previous|all|your)\s+(instructions|prompts|rules)",
    r"forget\s+(everything|all)\s+(above|before|previous)",
    r"system\s*:\s*you\s+are\s+now",
    r"\[\s*system\s*\].*?\[\s*/\s*system\s*\]",
    r"act\s+as\s+(if\s+you\s+are|a)\s+(different|new)",
    r"pretend\s+(to\s+be|you\s+are)",
    r"roleplay\s+as",
    r"override\s+(your|the)\s+(instructions|rules|system)",
    r"\\n\\n.*?human\s*:",
    r"assistant\s*:\s*i\s+(will|can)\s+help",
    r"jailbreak\s+(the|this)\s+(ai|model|system)",
    r"\bdan\s+mode\b",
    r"developer\s+mode\s+(enabled|on)",
    r"\[\s*jailbreak\s*\]",
    r"simulate\s+(being|a)\s+(different|evil)",
    r"\\n\\n.*?user\s*:",
];

const PATH_TRAVERSAL: &[&str] = &[r"\.\./", r"\.\.\\", r"%2e%2e%2f", r"%2e%2e\\"];

const SSRF: &[&str] = &[
    r"\b(url|uri|target|dest|redirect|callback)\s*=\s*(https?|ftp)://(localhost|127\.\d+\.\d+\.\d+|0\.0\.0\.0|\[::1?\])",
    r"\b(url|uri|target|dest|redirect|callback)\s*=\s*(https?|ftp)://(10\.\d+|192\.168|172\.(1[6-9]|2\d|3[01]))\.",
    r"169\.254\.169\.254",
    r"metadata\.google\.internal",
    r"\b(file|gopher|dict|ldap)://",
];

const SENSITIVE_DATA_EXPOSURE: &[&str] = &[
    r#"\b(password|passwd|pwd|pass)\s*[=:]\s*['"]"#,
    r#"\b(api[_-]?key|secret[_-]?key|access[_-]?token)\s*[=:]\s*['"]?[a-z0-9_\-]{8,}"#,
    r"-----begin\s+(rsa\s+|ec\s+|openssh\s+)?private\s+key-----",
    r"\bakia[0-9a-z]{16}\b",
];

const SECURITY_MISCONFIGURATION: &[&str] = &[
    r"\b(admin|root|administrator):(admin|root|password|toor|1234|12345|123456)\b",
    r"\bdefault\s+(password|credentials)\b",
    r"\bdebug\s*=\s*(true|1|on)\b",
    r"/\.(git|svn|env)\b",
    r"\bweb\.config\b",
    r"\bphpinfo\s*\(",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order_matches_declaration() {
        let mut sorted = ThreatCategory::ALL;
        sorted.sort();
        assert_eq!(sorted, ThreatCategory::ALL);
    }

    #[test]
    fn test_every_category_has_patterns() {
        for category in ThreatCategory::ALL {
            assert!(!category.builtin_patterns().is_empty(), "{category:?}");
        }
    }

    #[test]
    fn test_config_keys_round_trip() {
        let parsed: ThreatCategory = serde_json::from_str("\"cross_site_scripting\"").unwrap();
        assert_eq!(parsed, ThreatCategory::CrossSiteScripting);
        assert_eq!(parsed.label(), "cross_site_scripting");
    }
}
