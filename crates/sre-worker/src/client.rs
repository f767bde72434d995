use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use sre_domain::{Job, JobId, JobStatus};
use tracing::{debug, error, warn};

use crate::error::WorkerError;

/// HTTP client for the cluster-side job protocol (C1), one `reqwest::Client`
/// with the cluster bearer token preset for every request: poll, report
/// status, stream logs.
pub struct JobPollerClient {
    saas_url: String,
    client: reqwest::Client,
}

impl JobPollerClient {
    pub fn new(saas_url: &str, cluster_token: &str) -> Result<Self, WorkerError> {
        let mut headers = HeaderMap::new();
        let bearer = format!("Bearer {cluster_token}");
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&bearer).map_err(|_| WorkerError::InvalidToken)?,
        );
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(WorkerError::ClientBuild)?;

        Ok(Self {
            saas_url: saas_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Polls `/clusters/jobs/pending`. `Ok(None)` means "no job pending", a
    /// normal outcome that resets the poll loop's backoff; `Err` means the
    /// poll itself failed (transport error or an unexpected/invalid
    /// response), which the poll loop backs off on.
    pub async fn get_pending_job(&self) -> Result<Option<Job>, ()> {
        let url = format!("{}/clusters/jobs/pending", self.saas_url);
        match self.client.get(&url).send().await {
            Ok(response) if response.status() == reqwest::StatusCode::NO_CONTENT => Ok(None),
            Ok(response) if response.status() == reqwest::StatusCode::UNAUTHORIZED => {
                error!("invalid cluster token - check CLUSTER_TOKEN");
                Err(())
            }
            Ok(response) if response.status().is_success() => {
                response.json::<Option<Job>>().await.map_err(|err| {
                    warn!(error = %err, "failed to decode pending job response");
                })
            }
            Ok(response) => {
                warn!(status = %response.status(), "unexpected response polling for jobs");
                Err(())
            }
            Err(err) => {
                debug!(error = %err, "connection error polling for jobs");
                Err(())
            }
        }
    }

    pub async fn update_job_status(
        &self,
        job_id: JobId,
        status: JobStatus,
        result: Option<&str>,
        logs: Option<&str>,
    ) -> bool {
        let url = format!("{}/clusters/jobs/{}/status", self.saas_url, job_id.as_uuid());
        let body = serde_json::json!({ "status": status, "result": result, "logs": logs });
        match self.client.post(&url).json(&body).send().await {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                error!(error = %err, "failed to update job status");
                false
            }
        }
    }

    pub async fn append_job_logs(&self, job_id: JobId, text: &str) -> bool {
        let url = format!("{}/clusters/jobs/{}/logs", self.saas_url, job_id.as_uuid());
        let body = serde_json::json!({ "text": text });
        match self.client.post(&url).json(&body).send().await {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                debug!(error = %err, "failed to append job logs");
                false
            }
        }
    }

    pub async fn heartbeat(&self) -> bool {
        let url = format!("{}/agent/heartbeat", self.saas_url);
        match self.client.post(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                debug!(error = %err, "heartbeat failed");
                false
            }
        }
    }
}
