//! Admin API: read-only status and counters behind a bearer key.

pub mod auth;
pub mod handlers;

use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use std::time::Instant;

use self::auth::admin_auth_middleware;
use self::handlers::{get_stats, get_status};
use crate::pipeline::AdmissionPipeline;

#[derive(Clone)]
pub struct AdminState {
    pub pipeline: Arc<AdmissionPipeline>,
    pub api_key: String,
    pub started_at: Instant,
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/stats", get(get_stats))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}
