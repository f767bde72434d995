use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde_json::Value;
use sre_domain::Cluster;

use crate::error::ApiError;
use crate::state::AppState;

pub async fn heartbeat(
    State(state): State<AppState>,
    Extension(cluster): Extension<Cluster>,
) -> Result<StatusCode, ApiError> {
    state.repo.touch_cluster_heartbeat(cluster.id).await?;
    Ok(StatusCode::OK)
}

/// Acknowledge-and-discard (Open Question 2, preserved): no telemetry sink
/// exists yet, so the payload is accepted and dropped.
pub async fn telemetry(Extension(_cluster): Extension<Cluster>, Json(_body): Json<Value>) -> StatusCode {
    StatusCode::OK
}
