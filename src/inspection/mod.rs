//! Content inspection subsystem.
//!
//! # Data Flow
//! ```text
//! Request body (non-empty)
//!     → graphql.rs   (GraphQL route: JSON, introspection, depth)
//!     → classifier.rs (every other route: signature scan, size fallback)
//! ```
//!
//! A request is inspected by exactly one of the two.

pub mod classifier;
pub mod graphql;

pub use classifier::{Classification, PayloadClassifier};
pub use graphql::{GraphqlInspector, GraphqlViolation};
