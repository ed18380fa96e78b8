//! Client allowlist and API key enforcement.

use axum::http::Method;
use std::collections::HashSet;

use crate::config::AccessConfig;

/// User agent fragments of common attack tooling.
const SCANNER_AGENTS: &[&str] = &["sqlmap", "nikto", "nmap", "masscan", "zap", "burp"];

/// Why the access gate turned a request away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDenial {
    IpNotAllowed,
    InvalidApiKey,
    SuspiciousUserAgent,
}

/// Stateless access checks, evaluated allowlist first.
#[derive(Debug, Clone, Default)]
pub struct AccessGate {
    allowed_ips: HashSet<String>,
    api_keys: HashSet<String>,
    public_paths: HashSet<String>,
    block_scanners: bool,
}

impl AccessGate {
    pub fn from_config(config: &AccessConfig) -> Self {
        Self {
            allowed_ips: config.allowed_ips.iter().cloned().collect(),
            api_keys: config.api_keys.iter().cloned().collect(),
            public_paths: config.public_paths.iter().cloned().collect(),
            block_scanners: config.block_scanner_user_agents,
        }
    }

    /// Check one request against the configured gates.
    pub fn authorize(
        &self,
        client: &str,
        method: &Method,
        path: &str,
        credential: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<(), AccessDenial> {
        if !self.allowed_ips.is_empty() && !self.allowed_ips.contains(client) {
            return Err(AccessDenial::IpNotAllowed);
        }

        if !self.api_keys.is_empty() && !self.is_public(method, path) {
            match credential {
                Some(key) if self.api_keys.contains(key) => {}
                _ => return Err(AccessDenial::InvalidApiKey),
            }
        }

        if self.block_scanners && user_agent.is_some_and(is_scanner_agent) {
            return Err(AccessDenial::SuspiciousUserAgent);
        }

        Ok(())
    }

    fn is_public(&self, method: &Method, path: &str) -> bool {
        *method == Method::GET && self.public_paths.contains(path)
    }
}

/// True if the user agent names a known scanner.
pub fn is_scanner_agent(user_agent: &str) -> bool {
    let lowered = user_agent.to_lowercase();
    SCANNER_AGENTS.iter().any(|tool| lowered.contains(tool))
}
