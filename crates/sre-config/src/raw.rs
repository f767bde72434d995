use serde::{Deserialize, Serialize};

/// One configured base URL per tool domain. A missing domain is silently
/// dropped from the tool catalogue rather than treated as an error (§6).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolCatalogueConfig {
    pub kubernetes_url: Option<String>,
    pub metrics_url: Option<String>,
    pub logs_url: Option<String>,
    pub runbooks_url: Option<String>,
    pub code_host_url: Option<String>,
    pub memory_url: Option<String>,
}

impl ToolCatalogueConfig {
    pub fn is_empty(&self) -> bool {
        self.kubernetes_url.is_none()
            && self.metrics_url.is_none()
            && self.logs_url.is_none()
            && self.runbooks_url.is_none()
            && self.code_host_url.is_none()
            && self.memory_url.is_none()
    }
}

/// Control-plane process configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub database_url: String,
    pub redis_url: Option<String>,
    pub oracle_url: Option<String>,
}

/// Edge worker process configuration (§6 "Edge-worker configuration").
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Control-plane base URL.
    pub saas_url: String,
    /// The worker's identity. Its absence at startup disables the worker.
    pub cluster_token: String,
    pub poll_interval_seconds: u64,
    pub tools: ToolCatalogueConfig,
    /// Reasoning oracle reachable from inside the cluster's network, used
    /// only for job-queue-sourced investigation/remediation runs that the
    /// worker executes locally (§6 "Edge Worker").
    pub oracle_url: Option<String>,
}
