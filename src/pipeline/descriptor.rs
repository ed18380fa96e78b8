//! Abstract view of one inbound request.

use axum::http::Method;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Instant;

/// Immutable description of one inbound call.
///
/// Built once per request by the binding and discarded after the decision.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    client: String,
    method: Method,
    path: String,
    query: Option<String>,
    body: String,
    body_len: usize,
    headers: HashMap<String, String>,
    received_at: Instant,
    received_at_utc: DateTime<Utc>,
}

impl RequestDescriptor {
    pub fn builder(
        client: impl Into<String>,
        method: Method,
        path: impl Into<String>,
    ) -> RequestDescriptorBuilder {
        RequestDescriptorBuilder {
            inner: RequestDescriptor {
                client: client.into(),
                method,
                path: path.into(),
                query: None,
                body: String::new(),
                body_len: 0,
                headers: HashMap::new(),
                received_at: Instant::now(),
                received_at_utc: Utc::now(),
            },
        }
    }

    /// Client identity, typically the source address.
    pub fn client(&self) -> &str {
        &self.client
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Path plus query string, as logged.
    pub fn url(&self) -> String {
        match &self.query {
            Some(query) => format!("{}?{}", self.path, query),
            None => self.path.clone(),
        }
    }

    /// Body decoded as UTF-8 (invalid sequences replaced).
    pub fn body_text(&self) -> &str {
        &self.body
    }

    /// Body size in raw bytes, before any decoding.
    pub fn body_len(&self) -> usize {
        self.body_len
    }

    /// Header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Monotonic arrival time used by the rate limiter.
    pub fn received_at(&self) -> Instant {
        self.received_at
    }

    /// Wall-clock arrival time used by the audit record.
    pub fn received_at_utc(&self) -> DateTime<Utc> {
        self.received_at_utc
    }
}

/// Builder for [`RequestDescriptor`].
#[derive(Debug)]
pub struct RequestDescriptorBuilder {
    inner: RequestDescriptor,
}

impl RequestDescriptorBuilder {
    pub fn query(mut self, query: impl Into<String>) -> Self {
        let query = query.into();
        self.inner.query = (!query.is_empty()).then_some(query);
        self
    }

    pub fn body(mut self, body: impl AsRef<[u8]>) -> Self {
        let body = body.as_ref();
        self.inner.body = String::from_utf8_lossy(body).into_owned();
        self.inner.body_len = body.len();
        self
    }

    /// Record a body size without buffering the body, for requests
    /// whose length is already known to exceed the limit.
    pub fn declared_len(mut self, len: usize) -> Self {
        self.inner.body_len = len;
        self
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.inner.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn received_at(mut self, at: Instant) -> Self {
        self.inner.received_at = at;
        self
    }

    pub fn build(self) -> RequestDescriptor {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let request = RequestDescriptor::builder("127.0.0.1", Method::POST, "/graphql")
            .query("")
            .header("X-API-Key", "k1")
            .body(b"{\"query\": \"{ a }\"}".as_slice())
            .build();

        assert_eq!(request.client(), "127.0.0.1");
        assert_eq!(request.url(), "/graphql");
        assert_eq!(request.header("x-api-key"), Some("k1"));
        assert_eq!(request.header("X-Api-Key"), Some("k1"));
        assert_eq!(request.body_text(), "{\"query\": \"{ a }\"}");
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let request = RequestDescriptor::builder("c", Method::POST, "/")
            .body([0x61u8, 0xff, 0x62])
            .build();
        assert_eq!(request.body_text(), "a\u{fffd}b");
        assert_eq!(request.body_len(), 3);
    }

    #[test]
    fn test_body_len_counts_raw_bytes() {
        let request = RequestDescriptor::builder("c", Method::POST, "/")
            .body([0xffu8; 10])
            .build();
        assert_eq!(request.body_len(), 10);
        assert!(request.body_text().len() > 10);

        let declared = RequestDescriptor::builder("c", Method::POST, "/")
            .declared_len(2_000_000)
            .build();
        assert_eq!(declared.body_len(), 2_000_000);
        assert_eq!(declared.body_text(), "");
    }
}
