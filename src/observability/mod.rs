//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Pipeline, limiter, audit writer:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → stdout
//!     → Metrics endpoint (Prometheus scrape)
//! ```

pub mod logging;
pub mod metrics;
