//! Audit record format.

use serde::{Deserialize, Serialize};

use crate::pipeline::{Decision, RequestDescriptor};

/// One line of the audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Arrival time, RFC 3339.
    pub timestamp: String,
    pub client_ip: String,
    pub method: String,
    /// Path plus query string.
    pub url: String,
    /// Reason code, or "None" when admitted.
    pub threat_type: String,
    pub status_code: u16,
    /// Body length in characters.
    pub body_size: usize,
}

impl AuditRecord {
    pub fn new(request: &RequestDescriptor, decision: &Decision) -> Self {
        Self {
            timestamp: request.received_at_utc().to_rfc3339(),
            client_ip: request.client().to_string(),
            method: request.method().to_string(),
            url: request.url(),
            threat_type: decision.reason_code(),
            status_code: decision.status().as_u16(),
            body_size: request.body_text().chars().count(),
        }
    }

    /// Serialize as a single JSON line, newline included.
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::BlockReason;
    use crate::security::AccessDenial;
    use axum::http::Method;

    #[test]
    fn test_record_fields() {
        let request = RequestDescriptor::builder("10.1.1.1", Method::POST, "/test")
            .query("debug=1")
            .body("hello")
            .build();

        let allowed = AuditRecord::new(&request, &Decision::Allow);
        assert_eq!(allowed.client_ip, "10.1.1.1");
        assert_eq!(allowed.method, "POST");
        assert_eq!(allowed.url, "/test?debug=1");
        assert_eq!(allowed.threat_type, "None");
        assert_eq!(allowed.status_code, 200);
        assert_eq!(allowed.body_size, 5);

        let blocked = AuditRecord::new(
            &request,
            &Decision::Block(BlockReason::Access(AccessDenial::InvalidApiKey)),
        );
        assert_eq!(blocked.threat_type, "Invalid or Missing API Key");
        assert_eq!(blocked.status_code, 401);
    }

    #[test]
    fn test_json_line_has_exact_fields() {
        let request = RequestDescriptor::builder("c", Method::GET, "/").build();
        let line = AuditRecord::new(&request, &Decision::Allow).to_json_line().unwrap();
        assert!(line.ends_with('\n'));

        let value: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
        let mut keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            [
                "body_size",
                "client_ip",
                "method",
                "status_code",
                "threat_type",
                "timestamp",
                "url"
            ]
        );
    }
}
