use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use sre_domain::{Incident, IncidentSeverity};

use crate::auth::resolve_webhook_cluster;
use crate::background;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AlertmanagerPayload {
    #[serde(default)]
    pub alerts: Vec<Alert>,
}

#[derive(Debug, Deserialize)]
pub struct Alert {
    #[serde(default)]
    pub labels: std::collections::HashMap<String, String>,
    #[serde(default)]
    pub annotations: std::collections::HashMap<String, String>,
    #[serde(rename = "startsAt")]
    pub starts_at: Option<chrono::DateTime<chrono::Utc>>,
}

fn map_severity(raw: &str) -> IncidentSeverity {
    match raw.to_lowercase().as_str() {
        "critical" => IncidentSeverity::Critical,
        "high" => IncidentSeverity::High,
        "low" => IncidentSeverity::Low,
        _ => IncidentSeverity::Medium,
    }
}

/// Prometheus Alertmanager-style webhook (§6). Acknowledges with 202 before
/// any heavy work, per §7's webhook failure policy — the investigation runs
/// as a detached background task.
pub async fn alert(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<AlertmanagerPayload>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Some(first) = body.alerts.first() else {
        return Err(ApiError::bad_request("no alerts found"));
    };

    let cluster = resolve_webhook_cluster(&state, &headers)
        .await
        .ok_or_else(|| ApiError::bad_request("no cluster identified for this alert"))?;

    let alert_name = first
        .labels
        .get("alertname")
        .cloned()
        .unwrap_or_else(|| "UnknownAlert".to_string());
    let severity_raw = first.labels.get("severity").cloned().unwrap_or_else(|| "warning".to_string());
    let severity = map_severity(&severity_raw);
    let description = first.annotations.get("description").cloned();

    let incident = Incident::new(cluster.id, alert_name.clone(), description, severity);
    state.repo.create_incident(&incident).await?;

    let trigger = sre_engine::Trigger {
        name: alert_name,
        severity: Some(severity_raw),
        labels: first.labels.clone(),
        annotations: first.annotations.clone(),
        starts_at: first.starts_at,
    };
    background::spawn_investigation(state, cluster.id, incident.id, trigger);

    Ok((StatusCode::ACCEPTED, Json(json!({ "incident_id": incident.id }))))
}
