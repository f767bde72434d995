use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use sre_config::WorkerConfig;
use sre_domain::{ClusterId, IncidentId, Job, JobStatus, JobType};
use sre_engine::{self as engine, EngineDeps, HttpOracle, InvestigationState, Node, ReasoningOracle, ToolCatalogue, Trigger};
use sre_store::{InMemoryRepository, InMemorySessionStore, Repository, SessionStore};
use sre_tools::InvocationContext;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::client::JobPollerClient;
use crate::error::WorkerError;

const LOG_FLUSH_THRESHOLD: usize = 5;
const MAX_BACKOFF_SECONDS: u64 = 60;

/// Process-scoped dependencies the poll loop hands to every job it runs
/// locally. Distinct from the control plane's `AppState`: the worker has no
/// credentials for the control plane's Postgres/Redis, so investigation and
/// remediation jobs claimed off the job queue run against an in-memory
/// repository and session store, scoped to this worker process rather than
/// shared across a fleet (§6 "Edge-worker configuration").
struct WorkerRuntime {
    catalogue: Arc<ToolCatalogue>,
    repo: Arc<dyn Repository>,
    session_store: Arc<dyn SessionStore>,
    oracle: Option<Arc<dyn ReasoningOracle>>,
}

/// Starts the poll loop as a background task. The only way this returns
/// `Err` is a malformed cluster token — the caller (`sre-cli`) is expected to
/// treat `CLUSTER_TOKEN` being absent entirely as "worker disabled" before
/// ever calling this, matching §6's "absent ⇒ worker disabled".
pub async fn start(config: WorkerConfig) -> Result<tokio::task::JoinHandle<()>, WorkerError> {
    let client = JobPollerClient::new(&config.saas_url, &config.cluster_token)?;
    let repo: Arc<dyn Repository> = Arc::new(InMemoryRepository::new());
    let runtime = WorkerRuntime {
        catalogue: Arc::new(ToolCatalogue::from_config(&config.tools, repo.clone())),
        repo,
        session_store: Arc::new(InMemorySessionStore::new()),
        oracle: config
            .oracle_url
            .as_deref()
            .map(|url| Arc::new(HttpOracle::new(url)) as Arc<dyn ReasoningOracle>),
    };
    let poll_interval = Duration::from_secs(config.poll_interval_seconds.max(1));

    Ok(tokio::spawn(poll_loop(client, runtime, poll_interval)))
}

/// Poll, execute, sleep; exponential backoff capped at 60s on repeated
/// polling errors; a normal poll (job or no job) resets the error count.
async fn poll_loop(client: JobPollerClient, runtime: WorkerRuntime, poll_interval: Duration) {
    info!(interval_secs = poll_interval.as_secs(), "starting job poller");
    let mut consecutive_errors: u32 = 0;

    loop {
        tokio::select! {
            _ = shutdown_signal() => {
                info!("job poller shutting down");
                break;
            }
            result = client.get_pending_job() => {
                match result {
                    Ok(Some(job)) => {
                        info!(job_id = %job.id, job_type = ?job.job_type, "received job");
                        consecutive_errors = 0;
                        execute_job(job, &client, &runtime).await;
                        sleep(poll_interval).await;
                    }
                    Ok(None) => {
                        consecutive_errors = 0;
                        sleep(poll_interval).await;
                    }
                    Err(()) => {
                        consecutive_errors += 1;
                        let backoff = backoff_secs(poll_interval.as_secs(), consecutive_errors);
                        warn!(consecutive_errors, backoff_secs = backoff, "polling error, backing off");
                        sleep(Duration::from_secs(backoff)).await;
                    }
                }
            }
        }
    }
}

/// Exponential backoff capped at 60s:
/// `min(base * 2 ^ consecutive_errors, 60)`.
fn backoff_secs(base: u64, consecutive_errors: u32) -> u64 {
    base.saturating_mul(1u64 << consecutive_errors.min(6)).min(MAX_BACKOFF_SECONDS)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        let Ok(mut sigterm) = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        else {
            std::future::pending::<()>().await;
            return;
        };
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

/// Accumulates narration lines and flushes them to `/clusters/jobs/:id/logs`
/// every 5 lines, per §6's edge-worker log-buffer contract.
struct LogBuffer<'a> {
    job_id: sre_domain::JobId,
    client: &'a JobPollerClient,
    pending: Vec<String>,
}

impl<'a> LogBuffer<'a> {
    fn new(job_id: sre_domain::JobId, client: &'a JobPollerClient) -> Self {
        Self { job_id, client, pending: Vec::new() }
    }

    async fn push(&mut self, line: &str) {
        info!(job_id = %self.job_id, "{line}");
        self.pending.push(line.to_string());
        if self.pending.len() >= LOG_FLUSH_THRESHOLD {
            self.flush().await;
        }
    }

    async fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let text = self.pending.join("\n");
        self.pending.clear();
        self.client.append_job_logs(self.job_id, &text).await;
    }
}

async fn execute_job(job: Job, client: &JobPollerClient, runtime: &WorkerRuntime) {
    client.update_job_status(job.id, JobStatus::Running, None, None).await;

    match job.job_type {
        JobType::ConfigureCluster => configure_cluster(job, client, runtime).await,
        JobType::Investigation | JobType::Remediation => run_investigation(job, client, runtime).await,
    }
}

/// The zero-touch configuration path: invokes the locally-reachable
/// Kubernetes tool directly with the kubeconfig payload.
async fn configure_cluster(job: Job, client: &JobPollerClient, runtime: &WorkerRuntime) {
    let mut logs = LogBuffer::new(job.id, client);
    logs.push("Receiving cluster configuration update...").await;

    let payload: serde_json::Value = job
        .payload
        .as_deref()
        .and_then(|p| serde_json::from_str(p).ok())
        .unwrap_or_default();

    let Some(kubeconfig) = payload.get("kubeconfig").and_then(|v| v.as_str()) else {
        logs.push("Configuration failed: no kubeconfig provided in payload").await;
        logs.flush().await;
        client
            .update_job_status(job.id, JobStatus::Failed, Some(r#"{"error":"no kubeconfig provided"}"#), None)
            .await;
        return;
    };

    let Some(kubernetes) = &runtime.catalogue.kubernetes else {
        logs.push("Configuration failed: no kubernetes tool configured for this worker").await;
        logs.flush().await;
        client
            .update_job_status(job.id, JobStatus::Failed, Some(r#"{"error":"kubernetes tool not configured"}"#), None)
            .await;
        return;
    };

    logs.push("Invoking configure_cluster on the Kubernetes tool server...").await;
    let ctx = InvocationContext::new(job.id.to_string(), "configure_cluster");
    let args = json!({ "action": "configure_cluster", "kubeconfig": kubeconfig });

    match kubernetes.call(&ctx, args).await {
        Ok(result) => {
            logs.push("Configuration applied successfully").await;
            logs.flush().await;
            let result_json = json!({ "status": "success", "message": result }).to_string();
            client
                .update_job_status(job.id, JobStatus::Completed, Some(&result_json), None)
                .await;
        }
        Err(tool_err) => {
            logs.push(&format!("Configuration failed: {}", tool_err.error_message)).await;
            logs.flush().await;
            let result_json = json!({ "error": tool_err.error_message }).to_string();
            client
                .update_job_status(job.id, JobStatus::Failed, Some(&result_json), None)
                .await;
        }
    }
}

/// Runs a job-queue-sourced investigation/remediation against the worker's
/// own in-memory engine dependencies, streaming phase narration back as job
/// logs. Distinct from `/webhook/alert` and `/clusters/{id}/trigger`, which
/// always run centrally in the control plane against its shared,
/// circuit-breaker-persisting `ToolCatalogue` (§8 invariant 10) — this path
/// exists for deployments where only the edge worker can reach the cluster's
/// tool servers.
async fn run_investigation(job: Job, client: &JobPollerClient, runtime: &WorkerRuntime) {
    let mut logs = LogBuffer::new(job.id, client);

    let Some(oracle) = runtime.oracle.clone() else {
        logs.push("Cannot run investigation: no reasoning oracle configured (set ORACLE_URL)").await;
        logs.flush().await;
        client
            .update_job_status(
                job.id,
                JobStatus::Failed,
                Some(r#"{"error":"no reasoning oracle configured"}"#),
                None,
            )
            .await;
        return;
    };

    logs.push("Starting investigation for queued job").await;

    let payload: serde_json::Value = job
        .payload
        .as_deref()
        .and_then(|p| serde_json::from_str(p).ok())
        .unwrap_or_default();
    let alert_name = payload
        .get("alert")
        .or_else(|| payload.get("title"))
        .and_then(|v| v.as_str())
        .unwrap_or("Unknown Alert")
        .to_string();
    let severity = payload.get("severity").and_then(|v| v.as_str()).map(String::from);
    let labels = payload
        .get("labels")
        .and_then(|v| v.as_object())
        .map(|m| m.iter().filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string()))).collect())
        .unwrap_or_default();
    let annotations = payload
        .get("annotations")
        .and_then(|v| v.as_object())
        .map(|m| m.iter().filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string()))).collect())
        .unwrap_or_default();

    let trigger = Trigger { name: alert_name, severity, labels, annotations, starts_at: None };
    let deps = EngineDeps {
        oracle,
        catalogue: runtime.catalogue.clone(),
        session_store: runtime.session_store.clone(),
        repo: runtime.repo.clone(),
        cluster_id: ClusterId::new(),
    };

    logs.push("Running investigation engine...").await;
    let initial = InvestigationState::prepare(IncidentId::new(), trigger);
    let (_final_state, outcome) = engine::run(initial, Node::Prepare, &deps).await;

    let (status, result) = match &outcome {
        engine::Outcome::Completed { final_response, resolved } => {
            logs.push("Investigation complete").await;
            (JobStatus::Completed, json!({ "resolved": resolved, "summary": final_response }))
        }
        engine::Outcome::Paused => {
            logs.push("Investigation paused for approval — not resumable via the job queue").await;
            (
                JobStatus::Failed,
                json!({ "error": "plan requires approval; use the incident trigger endpoints for resumable runs" }),
            )
        }
    };

    logs.flush().await;
    client.update_job_status(job.id, status, Some(&result.to_string()), None).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_then_caps_at_sixty() {
        assert_eq!(backoff_secs(5, 0), 5);
        assert_eq!(backoff_secs(5, 1), 10);
        assert_eq!(backoff_secs(5, 2), 20);
        assert_eq!(backoff_secs(5, 4), 60);
        assert_eq!(backoff_secs(5, 20), 60);
    }

    #[tokio::test]
    async fn log_buffer_flushes_at_threshold() {
        let client = JobPollerClient::new("http://localhost:1", "tok").unwrap();
        let job_id = sre_domain::JobId::new();
        let mut logs = LogBuffer::new(job_id, &client);
        for i in 0..4 {
            logs.push(&format!("line {i}")).await;
            assert_eq!(logs.pending.len(), i + 1);
        }
        // 5th line crosses the threshold and triggers a flush attempt
        // (which fails silently against an unreachable host, clearing the buffer regardless).
        logs.push("line 4").await;
        assert!(logs.pending.is_empty());
    }
}
