use axum::{Json, extract::State};
use shared::models::DashboardSnapshot;

use crate::core::ServerState;
use crate::services::build_snapshot;

/// Full dashboard snapshot
pub async fn snapshot(State(state): State<ServerState>) -> Json<DashboardSnapshot> {
    let today = chrono::Local::now().date_naive();
    Json(build_snapshot(&state.employees(), today))
}
