use axum::{extract::State, Json};
use serde::Serialize;

use crate::admin::AdminState;
use crate::pipeline::StatsSnapshot;
use crate::signatures::CATALOG_VERSION;

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub catalog_version: &'static str,
    pub uptime_secs: u64,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        catalog_version: CATALOG_VERSION,
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

pub async fn get_stats(State(state): State<AdminState>) -> Json<StatsSnapshot> {
    Json(state.pipeline.stats())
}
