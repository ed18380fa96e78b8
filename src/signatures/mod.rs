//! Signature catalog subsystem.
//!
//! # Data Flow
//! ```text
//! SignatureConfig (disabled categories, extra patterns)
//!     → catalog.rs (compile built-in + extra patterns per category)
//!     → SignatureCatalog (immutable, priority ordered)
//!     → shared via Arc with the payload classifier
//! ```
//!
//! # Design Decisions
//! - One `RegexSet` per category: a category matches if any pattern matches
//! - All sets are case-insensitive
//! - Compilation errors are fatal at startup, never at request time

pub mod catalog;
pub mod category;

pub use catalog::{CatalogError, SignatureCatalog, SignatureSet, CATALOG_VERSION};
pub use category::ThreatCategory;
