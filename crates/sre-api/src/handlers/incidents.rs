use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use sre_domain::{Incident, IncidentSeverity};

use super::{authorize_cluster, parse_uuid};
use crate::background;
use crate::error::ApiError;
use crate::state::{AppState, AuthedUser};

pub async fn list_incidents(
    State(state): State<AppState>,
    Extension(user): Extension<AuthedUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let cluster_id = parse_uuid(&id, "cluster")?;
    authorize_cluster(&state, cluster_id, user.org_id).await?;
    let incidents = state.repo.list_incidents_for_cluster(cluster_id.into()).await?;
    Ok(Json(json!(incidents)))
}

#[derive(Debug, Deserialize)]
pub struct TriggerBody {
    pub name: String,
    pub severity: Option<String>,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    #[serde(default)]
    pub annotations: HashMap<String, String>,
}

fn parse_severity(raw: Option<&str>) -> IncidentSeverity {
    match raw.map(str::to_lowercase).as_deref() {
        Some("critical") => IncidentSeverity::Critical,
        Some("high") => IncidentSeverity::High,
        Some("low") => IncidentSeverity::Low,
        _ => IncidentSeverity::Medium,
    }
}

/// Manual investigation launch — the user-facing equivalent of
/// `/webhook/alert` (§6).
pub async fn trigger_investigation(
    State(state): State<AppState>,
    Extension(user): Extension<AuthedUser>,
    Path(id): Path<String>,
    Json(body): Json<TriggerBody>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let cluster_id = parse_uuid(&id, "cluster")?;
    let cluster = authorize_cluster(&state, cluster_id, user.org_id).await?;

    let severity = parse_severity(body.severity.as_deref());
    let incident = Incident::new(cluster.id, body.name.clone(), None, severity);
    state.repo.create_incident(&incident).await?;

    let trigger = sre_engine::Trigger {
        name: body.name,
        severity: body.severity,
        labels: body.labels,
        annotations: body.annotations,
        starts_at: Some(incident.created_at),
    };
    background::spawn_investigation(state, cluster.id, incident.id, trigger);

    Ok((StatusCode::ACCEPTED, Json(json!({ "incident_id": incident.id }))))
}

pub async fn get_logs(
    State(state): State<AppState>,
    Extension(user): Extension<AuthedUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let incident_id = parse_uuid(&id, "incident")?;
    let incident = state
        .repo
        .get_incident(incident_id.into())
        .await?
        .ok_or_else(|| ApiError::not_found(format!("incident '{incident_id}' not found")))?;
    authorize_cluster(&state, incident.cluster_id.as_uuid(), user.org_id).await?;

    let lines = state.session_store.get_logs(&incident_id.to_string()).await;
    Ok(Json(json!({ "lines": lines })))
}

pub async fn get_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthedUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let incident_id = parse_uuid(&id, "incident")?;
    let incident = state
        .repo
        .get_incident(incident_id.into())
        .await?
        .ok_or_else(|| ApiError::not_found(format!("incident '{incident_id}' not found")))?;
    authorize_cluster(&state, incident.cluster_id.as_uuid(), user.org_id).await?;

    let session_key = incident_id.to_string();
    let snapshot: Option<sre_store::SessionSnapshot> = state
        .session_store
        .get(&session_key)
        .await
        .and_then(|raw| serde_json::from_str(&raw).ok());

    Ok(Json(json!({
        "incident_status": incident.status,
        "summary": incident.summary,
        "session": snapshot,
    })))
}

/// Resumes a paused investigation. Single-shot: the snapshot is deleted by
/// [`sre_engine::resume_after_approval`] as it is read (§4.6).
pub async fn approve(
    State(state): State<AppState>,
    Extension(user): Extension<AuthedUser>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let incident_id = parse_uuid(&id, "incident")?;
    let incident = state
        .repo
        .get_incident(incident_id.into())
        .await?
        .ok_or_else(|| ApiError::not_found(format!("incident '{incident_id}' not found")))?;
    authorize_cluster(&state, incident.cluster_id.as_uuid(), user.org_id).await?;

    background::spawn_resume(state, incident.cluster_id, incident.id);
    Ok((StatusCode::ACCEPTED, Json(json!({ "incident_id": incident.id }))))
}
