//! Admission pipeline subsystem.
//!
//! # Data Flow
//! ```text
//! Transport binding
//!     → descriptor.rs (RequestDescriptor: client, method, path, body)
//!     → admission.rs  (access → rate limit → body size → inspection)
//!     → decision.rs   (Allow | Block(reason) → status code)
//!     → audit         (exactly one record per request)
//! ```
//!
//! # Design Decisions
//! - The pipeline knows nothing about HTTP framing; bindings translate
//! - Any fault inside a gate blocks the request with a 500

pub mod admission;
pub mod decision;
pub mod descriptor;

pub use admission::{AdmissionPipeline, StatsSnapshot};
pub use decision::{BlockReason, Decision};
pub use descriptor::{RequestDescriptor, RequestDescriptorBuilder};
