pub mod firewall;

pub use firewall::{client_identity, firewall_middleware};
