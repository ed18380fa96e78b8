//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the firewall.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::signatures::ThreatCategory;

/// Root configuration for the firewall.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FirewallConfig {
    /// Listener configuration (bind address, client identity).
    pub listener: ListenerConfig,

    /// Optional upstream the firewall forwards admitted requests to.
    pub upstream: UpstreamConfig,

    /// Allowlist and credential checks.
    pub access: AccessConfig,

    /// Sliding-window rate limiting.
    pub rate_limit: RateLimitConfig,

    /// Payload and GraphQL inspection limits.
    pub inspection: InspectionConfig,

    /// Signature catalog overrides.
    pub signatures: SignatureConfig,

    /// Audit record sink.
    pub audit: AuditConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin API settings.
    pub admin: AdminConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,

    /// Use the first `X-Forwarded-For` entry as the client identity.
    pub trust_forwarded_for: bool,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
            trust_forwarded_for: false,
        }
    }
}

/// Upstream application configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Upstream address (e.g., "127.0.0.1:3000"). When unset the built-in
    /// demo routes answer admitted requests.
    pub address: Option<String>,
}

/// Access gate configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Client identities allowed through. Empty disables the check.
    pub allowed_ips: Vec<String>,

    /// Valid API keys. Empty disables the check.
    pub api_keys: Vec<String>,

    /// Header carrying the API key.
    pub api_key_header: String,

    /// Paths that GET requests may reach without a key.
    pub public_paths: Vec<String>,

    /// Reject requests from known scanner user agents.
    pub block_scanner_user_agents: bool,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            allowed_ips: Vec::new(),
            api_keys: Vec::new(),
            api_key_header: "x-api-key".to_string(),
            public_paths: vec!["/".to_string(), "/docs".to_string(), "/openapi.json".to_string()],
            block_scanner_user_agents: false,
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Maximum requests per client within the window.
    pub requests_per_window: usize,

    /// Window length in seconds.
    pub window_secs: u64,

    /// Interval between idle-client sweeps in seconds.
    pub sweep_interval_secs: u64,

    /// Upper bound on tracked clients after a sweep.
    pub max_tracked_clients: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_window: 10,
            window_secs: 60,
            sweep_interval_secs: 60,
            max_tracked_clients: 100_000,
        }
    }
}

/// Content inspection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InspectionConfig {
    /// Requests whose path contains this are inspected as GraphQL.
    pub graphql_path: String,

    /// Maximum selection-set depth for GraphQL queries.
    pub max_graphql_depth: usize,

    /// Brace nesting rejected before the GraphQL parser runs.
    pub max_parse_nesting: usize,

    /// Scanned payloads longer than this (in characters) are flagged.
    pub max_payload_chars: usize,

    /// Maximum raw body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for InspectionConfig {
    fn default() -> Self {
        Self {
            graphql_path: "/graphql".to_string(),
            max_graphql_depth: 5,
            max_parse_nesting: 64,
            max_payload_chars: 10_000,
            max_body_bytes: 1_048_576,
        }
    }
}

/// Signature catalog overrides.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SignatureConfig {
    /// Categories left out of the catalog.
    pub disabled: Vec<ThreatCategory>,

    /// Extra patterns appended to categories.
    pub extra: Vec<ExtraSignatures>,
}

/// Patterns appended to one category.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExtraSignatures {
    pub category: ThreatCategory,
    pub patterns: Vec<String>,
}

/// Audit sink configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Write audit records.
    pub enabled: bool,

    /// JSON-lines file records are appended to.
    pub path: String,

    /// Records buffered before new ones are dropped.
    pub queue_capacity: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "firewall_logs.json".to_string(),
            queue_capacity: 4096,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter used when `RUST_LOG` is unset.
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FirewallConfig::default();
        assert_eq!(config.rate_limit.requests_per_window, 10);
        assert_eq!(config.rate_limit.window_secs, 60);
        assert_eq!(config.inspection.max_graphql_depth, 5);
        assert_eq!(config.inspection.max_payload_chars, 10_000);
        assert_eq!(config.inspection.max_body_bytes, 1_048_576);
        assert!(config.access.allowed_ips.is_empty());
        assert!(config.access.api_keys.is_empty());
    }

    #[test]
    fn test_partial_toml() {
        let config: FirewallConfig = toml::from_str(
            r#"
            [access]
            api_keys = ["k1", "k2"]

            [inspection]
            max_graphql_depth = 8

            [[signatures.extra]]
            category = "command_injection"
            patterns = ['\bpowershell\b']
            "#,
        )
        .unwrap();

        assert_eq!(config.access.api_keys, vec!["k1", "k2"]);
        assert_eq!(config.access.api_key_header, "x-api-key");
        assert_eq!(config.inspection.max_graphql_depth, 8);
        assert_eq!(config.inspection.max_payload_chars, 10_000);
        assert_eq!(config.signatures.extra[0].category, ThreatCategory::CommandInjection);
    }
}
