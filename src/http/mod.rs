//! HTTP binding subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, tower-http layers)
//!     → middleware/firewall.rs (descriptor → pipeline → decision)
//!     → response.rs (block envelope)  |  upstream / demo handler
//!     → Send to client
//! ```

pub mod middleware;
pub mod response;
pub mod server;

pub use server::{AppState, HttpServer, ServerError};
