//! Audit subsystem.
//!
//! # Data Flow
//! ```text
//! Pipeline decision
//!     → record.rs (AuditRecord, one per request)
//!     → sink.rs   (QueuedSink → background writer → JsonLinesSink)
//!     → firewall_logs.json (append-only, one JSON object per line)
//! ```
//!
//! # Design Decisions
//! - Emission never blocks or fails a request; sink errors are logged
//! - The log file is only ever opened in append mode

pub mod record;
pub mod sink;

pub use record::AuditRecord;
pub use sink::{AuditError, AuditSink, JsonLinesSink, MemorySink, QueuedSink};
