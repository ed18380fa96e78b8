//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::FirewallConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: {value}")]
    Env { var: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<FirewallConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: FirewallConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply `FIREWALL_*` environment overrides, then re-validate.
pub fn apply_env_overrides(config: &mut FirewallConfig) -> Result<(), ConfigError> {
    apply_overrides(config, |var| std::env::var(var).ok())?;
    validate_config(config).map_err(ConfigError::Validation)
}

fn apply_overrides<F>(config: &mut FirewallConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
{
    if let Some(value) = lookup("FIREWALL_RATE_LIMIT") {
        config.rate_limit.requests_per_window = parse_number("FIREWALL_RATE_LIMIT", value)?;
    }
    if let Some(value) = lookup("FIREWALL_MAX_GRAPHQL_DEPTH") {
        config.inspection.max_graphql_depth = parse_number("FIREWALL_MAX_GRAPHQL_DEPTH", value)?;
    }
    if let Some(value) = lookup("FIREWALL_ALLOWED_IPS") {
        config.access.allowed_ips = split_list(&value);
    }
    if let Some(value) = lookup("FIREWALL_API_KEYS") {
        config.access.api_keys = split_list(&value);
    }
    if let Some(value) = lookup("FIREWALL_AUDIT_PATH") {
        config.audit.path = value;
    }
    Ok(())
}

fn parse_number(var: &'static str, value: String) -> Result<usize, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Env { var, value })
}

/// Split a comma separated list, dropping blanks.
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("FIREWALL_RATE_LIMIT", "25"),
            ("FIREWALL_ALLOWED_IPS", "10.0.0.1, ,10.0.0.2"),
            ("FIREWALL_API_KEYS", "alpha,beta"),
        ]);
        let mut config = FirewallConfig::default();
        apply_overrides(&mut config, |var| env.get(var).map(|v| v.to_string())).unwrap();

        assert_eq!(config.rate_limit.requests_per_window, 25);
        assert_eq!(config.access.allowed_ips, vec!["10.0.0.1", "10.0.0.2"]);
        assert_eq!(config.access.api_keys, vec!["alpha", "beta"]);
        assert_eq!(config.inspection.max_graphql_depth, 5);
    }

    #[test]
    fn test_bad_env_number() {
        let mut config = FirewallConfig::default();
        let err = apply_overrides(&mut config, |var| {
            (var == "FIREWALL_MAX_GRAPHQL_DEPTH").then(|| "deep".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::Env { var: "FIREWALL_MAX_GRAPHQL_DEPTH", .. }));
    }

    #[test]
    fn test_load_config_rejects_invalid_file() {
        let path = std::env::temp_dir().join("api_firewall_invalid_config.toml");
        fs::write(&path, "[rate_limit]\nrequests_per_window = 0\n").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));

        fs::remove_file(&path).unwrap_or_default();
    }
}
