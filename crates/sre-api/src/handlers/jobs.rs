use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use sre_domain::{Cluster, Job, JobStatus, JobType};

use super::{authorize_cluster, parse_uuid};
use crate::error::ApiError;
use crate::state::{AppState, AuthedUser};

#[derive(Debug, Deserialize)]
pub struct TriggerJobBody {
    pub job_type: JobType,
    pub payload: Option<String>,
}

pub async fn trigger_job(
    State(state): State<AppState>,
    Extension(user): Extension<AuthedUser>,
    Path(id): Path<String>,
    Json(body): Json<TriggerJobBody>,
) -> Result<Json<Value>, ApiError> {
    let cluster_id = parse_uuid(&id, "cluster")?;
    let cluster = authorize_cluster(&state, cluster_id, user.org_id).await?;

    let job = Job::new(cluster.id, body.job_type, body.payload);
    state.repo.create_job(&job).await?;
    Ok(Json(json!(job)))
}

pub async fn list_jobs(
    State(state): State<AppState>,
    Extension(user): Extension<AuthedUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let cluster_id = parse_uuid(&id, "cluster")?;
    authorize_cluster(&state, cluster_id, user.org_id).await?;
    let jobs = state.repo.list_jobs_for_cluster(cluster_id.into()).await?;
    Ok(Json(json!(jobs)))
}

/// Claim, cluster-auth. `ClaimPending` does not itself mark the job
/// `running` — left non-atomic deliberately; the worker reports `Running`
/// explicitly once it picks the job up.
pub async fn claim_pending(
    State(state): State<AppState>,
    Extension(cluster): Extension<Cluster>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    match state.repo.claim_pending(cluster.id).await? {
        Some(job) => Ok((StatusCode::OK, Json(json!(job)))),
        None => Ok((StatusCode::NO_CONTENT, Json(Value::Null))),
    }
}

#[derive(Debug, Deserialize)]
pub struct JobStatusBody {
    pub status: JobStatus,
    pub result: Option<String>,
    pub logs: Option<String>,
}

async fn authorize_job(state: &AppState, cluster: &Cluster, job_id: uuid::Uuid) -> Result<Job, ApiError> {
    let job = state
        .repo
        .get_job(job_id.into())
        .await?
        .ok_or_else(|| ApiError::not_found(format!("job '{job_id}' not found")))?;
    if job.cluster_id != cluster.id {
        return Err(ApiError::not_found(format!("job '{job_id}' not found")));
    }
    Ok(job)
}

pub async fn update_job_status(
    State(state): State<AppState>,
    Extension(cluster): Extension<Cluster>,
    Path(job_id): Path<String>,
    Json(body): Json<JobStatusBody>,
) -> Result<StatusCode, ApiError> {
    let job_uuid = parse_uuid(&job_id, "job")?;
    let job = authorize_job(&state, &cluster, job_uuid).await?;
    state
        .repo
        .update_job_status(job.id, body.status, body.result.as_deref(), body.logs.as_deref())
        .await?;
    Ok(StatusCode::OK)
}

#[derive(Debug, Deserialize)]
pub struct AppendLogsBody {
    pub text: String,
}

pub async fn append_job_logs(
    State(state): State<AppState>,
    Extension(cluster): Extension<Cluster>,
    Path(job_id): Path<String>,
    Json(body): Json<AppendLogsBody>,
) -> Result<StatusCode, ApiError> {
    let job_uuid = parse_uuid(&job_id, "job")?;
    let job = authorize_job(&state, &cluster, job_uuid).await?;
    state.repo.append_job_logs(job.id, &body.text).await?;
    Ok(StatusCode::OK)
}
