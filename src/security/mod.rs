//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → access_control.rs (allowlist, API key, scanner user agents)
//!     → rate_limit.rs (per-client sliding window)
//!     → Pass to content inspection
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any security check failure
//! - Access checks are stateless; the limiter owns the only mutable state
//! - No trust in client input

pub mod access_control;
pub mod rate_limit;

pub use access_control::{AccessDenial, AccessGate};
pub use rate_limit::SlidingWindowLimiter;
