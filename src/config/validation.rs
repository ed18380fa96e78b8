//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits > 0, addresses parse)
//! - Reject placeholder secrets when the admin API is exposed
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: FirewallConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use axum::http::uri::Authority;
use std::net::SocketAddr;
use std::str::FromStr;
use thiserror::Error;

use crate::config::schema::FirewallConfig;

/// Ceiling for `inspection.max_parse_nesting`; deeper prescans buy nothing.
pub const MAX_PARSE_NESTING: usize = 256;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field} is not a valid socket address: {value}")]
    BadAddress { field: &'static str, value: String },

    #[error("{field} is not a valid host:port authority: {value}")]
    BadAuthority { field: &'static str, value: String },

    #[error("{field} must be at most {max}")]
    TooLarge { field: &'static str, max: usize },

    #[error("{field} must start with '/': {value}")]
    BadPath { field: &'static str, value: String },

    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("admin.api_key must be changed before enabling the admin API")]
    PlaceholderAdminKey,
}

/// Validate a loaded configuration.
pub fn validate_config(config: &FirewallConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let positive = [
        ("rate_limit.requests_per_window", config.rate_limit.requests_per_window),
        ("rate_limit.window_secs", config.rate_limit.window_secs as usize),
        ("rate_limit.sweep_interval_secs", config.rate_limit.sweep_interval_secs as usize),
        ("rate_limit.max_tracked_clients", config.rate_limit.max_tracked_clients),
        ("inspection.max_graphql_depth", config.inspection.max_graphql_depth),
        ("inspection.max_parse_nesting", config.inspection.max_parse_nesting),
        ("inspection.max_payload_chars", config.inspection.max_payload_chars),
        ("inspection.max_body_bytes", config.inspection.max_body_bytes),
        ("audit.queue_capacity", config.audit.queue_capacity),
        ("timeouts.request_secs", config.timeouts.request_secs as usize),
    ];
    for (field, value) in positive {
        if value == 0 {
            errors.push(ValidationError::Zero { field });
        }
    }

    if config.inspection.max_parse_nesting > MAX_PARSE_NESTING {
        errors.push(ValidationError::TooLarge {
            field: "inspection.max_parse_nesting",
            max: MAX_PARSE_NESTING,
        });
    }

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if let Some(upstream) = &config.upstream.address {
        if Authority::from_str(upstream).is_err() {
            errors.push(ValidationError::BadAuthority {
                field: "upstream.address",
                value: upstream.clone(),
            });
        }
    }
    if config.admin.enabled {
        check_address(&mut errors, "admin.bind_address", &config.admin.bind_address);
        if config.admin.api_key.is_empty() || config.admin.api_key == "CHANGE_ME_IN_PRODUCTION" {
            errors.push(ValidationError::PlaceholderAdminKey);
        }
    }
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if !config.inspection.graphql_path.starts_with('/') {
        errors.push(ValidationError::BadPath {
            field: "inspection.graphql_path",
            value: config.inspection.graphql_path.clone(),
        });
    }
    for path in &config.access.public_paths {
        if !path.starts_with('/') {
            errors.push(ValidationError::BadPath {
                field: "access.public_paths",
                value: path.clone(),
            });
        }
    }
    if config.access.api_key_header.trim().is_empty() {
        errors.push(ValidationError::Empty { field: "access.api_key_header" });
    }
    if config.audit.enabled && config.audit.path.trim().is_empty() {
        errors.push(ValidationError::Empty { field: "audit.path" });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BadAddress {
            field,
            value: value.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&FirewallConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = FirewallConfig::default();
        config.rate_limit.requests_per_window = 0;
        config.inspection.graphql_path = "graphql".to_string();
        config.listener.bind_address = "not-an-address".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ValidationError::Zero {
            field: "rate_limit.requests_per_window"
        }));
    }

    #[test]
    fn test_parse_nesting_has_ceiling() {
        let mut config = FirewallConfig::default();
        config.inspection.max_parse_nesting = MAX_PARSE_NESTING;
        assert_eq!(validate_config(&config), Ok(()));

        config.inspection.max_parse_nesting = 1_000_000;
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::TooLarge {
                field: "inspection.max_parse_nesting",
                max: MAX_PARSE_NESTING,
            }])
        );
    }

    #[test]
    fn test_upstream_accepts_host_names() {
        let mut config = FirewallConfig::default();
        config.upstream.address = Some("localhost:3000".to_string());
        assert_eq!(validate_config(&config), Ok(()));

        config.upstream.address = Some("127.0.0.1:8080".to_string());
        assert_eq!(validate_config(&config), Ok(()));

        config.upstream.address = Some("not a host".to_string());
        assert!(matches!(
            validate_config(&config).unwrap_err()[..],
            [ValidationError::BadAuthority { field: "upstream.address", .. }]
        ));
    }

    #[test]
    fn test_admin_requires_real_key() {
        let mut config = FirewallConfig::default();
        config.admin.enabled = true;
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::PlaceholderAdminKey])
        );

        config.admin.api_key = "s3cret".to_string();
        assert_eq!(validate_config(&config), Ok(()));
    }
}
