pub mod agent;
pub mod auth_handlers;
pub mod clusters;
pub mod health;
pub mod incidents;
pub mod jobs;
pub mod webhook;

use sre_domain::{Cluster, OrgId};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

pub fn parse_uuid(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::bad_request(format!("invalid {what} id: {raw}")))
}

/// Fetches a cluster and verifies it belongs to `org_id`. A cluster owned by
/// another organization is reported as 404, never 403 (§7).
pub async fn authorize_cluster(
    state: &AppState,
    cluster_id: Uuid,
    org_id: OrgId,
) -> Result<Cluster, ApiError> {
    let cluster = state
        .repo
        .get_cluster(cluster_id.into())
        .await?
        .ok_or_else(|| ApiError::not_found(format!("cluster '{cluster_id}' not found")))?;

    if cluster.org_id != org_id {
        return Err(ApiError::not_found(format!("cluster '{cluster_id}' not found")));
    }
    Ok(cluster)
}
