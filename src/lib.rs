//! Inline API request-inspection firewall.

pub mod admin;
pub mod audit;
pub mod config;
pub mod http;
pub mod inspection;
pub mod lifecycle;
pub mod observability;
pub mod pipeline;
pub mod security;
pub mod signatures;

pub use config::FirewallConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use pipeline::{AdmissionPipeline, Decision, RequestDescriptor};
