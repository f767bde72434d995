use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sre_domain::{ActorType, AuditEvent, AuditOutcome};
use uuid::Uuid;

use super::{authorize_cluster, parse_uuid};
use crate::error::ApiError;
use crate::state::{AppState, AuthedUser};

#[derive(Debug, Serialize)]
pub struct ClusterSummary {
    pub id: Uuid,
    pub name: String,
    pub status: String,
    pub last_heartbeat: Option<chrono::DateTime<Utc>>,
    pub created_at: chrono::DateTime<Utc>,
}

pub async fn list_clusters(
    State(state): State<AppState>,
    Extension(user): Extension<AuthedUser>,
) -> Result<Json<Vec<ClusterSummary>>, ApiError> {
    let clusters = state.repo.list_clusters_for_org(user.org_id).await?;
    Ok(Json(
        clusters
            .into_iter()
            .map(|c| ClusterSummary {
                id: c.id.as_uuid(),
                name: c.name,
                status: format!("{:?}", c.status).to_lowercase(),
                last_heartbeat: c.last_heartbeat,
                created_at: c.created_at,
            })
            .collect(),
    ))
}

#[derive(Debug, Deserialize)]
pub struct CreateClusterBody {
    pub name: String,
}

/// The bearer token is returned exactly once, here — subsequent reads go
/// through [`ClusterSummary`], which omits it (§6).
pub async fn create_cluster(
    State(state): State<AppState>,
    Extension(user): Extension<AuthedUser>,
    Json(body): Json<CreateClusterBody>,
) -> Result<Json<Value>, ApiError> {
    let cluster = state.repo.create_cluster(user.org_id, &body.name).await?;
    Ok(Json(json!({ "id": cluster.id, "name": cluster.name, "token": cluster.token })))
}

pub async fn get_cluster_health(
    State(state): State<AppState>,
    Extension(user): Extension<AuthedUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let cluster_id = parse_uuid(&id, "cluster")?;
    let cluster = authorize_cluster(&state, cluster_id, user.org_id).await?;
    Ok(Json(json!({
        "status": format!("{:?}", cluster.status).to_lowercase(),
        "last_heartbeat": cluster.last_heartbeat,
    })))
}

pub async fn delete_cluster(
    State(state): State<AppState>,
    Extension(user): Extension<AuthedUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let cluster_id = parse_uuid(&id, "cluster")?;
    authorize_cluster(&state, cluster_id, user.org_id).await?;
    state.repo.delete_cluster(cluster_id.into(), user.org_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_lock(
    State(state): State<AppState>,
    Extension(user): Extension<AuthedUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let cluster_id = parse_uuid(&id, "cluster")?;
    authorize_cluster(&state, cluster_id, user.org_id).await?;
    let locked = state.session_store.is_cluster_locked(&cluster_id.to_string()).await;
    Ok(Json(json!({ "locked": locked })))
}

#[derive(Debug, Deserialize)]
pub struct LockBody {
    pub locked: bool,
}

/// Break-glass: toggles the cluster lock flag and always emits an audit
/// event, even though the lock itself lives in C4 rather than the
/// relational schema (§6).
pub async fn set_lock(
    State(state): State<AppState>,
    Extension(user): Extension<AuthedUser>,
    Path(id): Path<String>,
    Json(body): Json<LockBody>,
) -> Result<Json<Value>, ApiError> {
    let cluster_id = parse_uuid(&id, "cluster")?;
    authorize_cluster(&state, cluster_id, user.org_id).await?;

    let applied = state
        .session_store
        .set_cluster_lock(&cluster_id.to_string(), body.locked)
        .await;

    let event = AuditEvent {
        id: Uuid::new_v4(),
        cluster_id: cluster_id.into(),
        occurred_at: Utc::now(),
        actor_type: ActorType::User,
        actor_id: user.user_id.to_string(),
        action_type: "EMERGENCY_LOCK_TOGGLE".to_string(),
        resource_target: cluster_id.to_string(),
        outcome: if applied { AuditOutcome::Success } else { AuditOutcome::Failed },
        details: Some(json!({ "locked": body.locked }).to_string()),
    };
    if let Err(err) = state.repo.append_audit_event(&event).await {
        tracing::warn!(error = %err, "failed to persist lock-toggle audit event");
    }

    Ok(Json(json!({ "locked": body.locked })))
}

#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    pub limit: Option<u32>,
}

pub async fn list_audit(
    State(state): State<AppState>,
    Extension(user): Extension<AuthedUser>,
    Path(id): Path<String>,
    Query(q): Query<AuditQuery>,
) -> Result<Json<Value>, ApiError> {
    let cluster_id = parse_uuid(&id, "cluster")?;
    authorize_cluster(&state, cluster_id, user.org_id).await?;
    let events = state
        .repo
        .list_audit_events(cluster_id.into(), q.limit.unwrap_or(100))
        .await?;
    Ok(Json(json!(events)))
}
