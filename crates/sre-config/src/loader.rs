use std::env;

use tracing::debug;

use crate::error::ConfigError;
use crate::raw::{ServerConfig, ToolCatalogueConfig, WorkerConfig};

fn optional(var: &'static str) -> Option<String> {
    env::var(var).ok().filter(|v| !v.is_empty())
}

fn required(var: &'static str) -> Result<String, ConfigError> {
    optional(var).ok_or(ConfigError::MissingVar(var))
}

/// Reads the same `TOOL_*_URL` variables `load_worker_config` does. Exposed
/// so `sre-cli`'s `serve` command can build the control plane's own
/// `ToolCatalogue` for centrally-run investigations (§4.5) without
/// duplicating the env-var list.
pub fn tool_catalogue_from_env() -> ToolCatalogueConfig {
    let catalogue = ToolCatalogueConfig {
        kubernetes_url: optional("TOOL_KUBERNETES_URL"),
        metrics_url: optional("TOOL_METRICS_URL"),
        logs_url: optional("TOOL_LOGS_URL"),
        runbooks_url: optional("TOOL_RUNBOOKS_URL"),
        code_host_url: optional("TOOL_CODE_HOST_URL"),
        memory_url: optional("TOOL_MEMORY_URL"),
    };
    if catalogue.is_empty() {
        debug!("no tool-server URLs configured; tool catalogue will be empty");
    }
    catalogue
}

/// Loads the control-plane server configuration from the process environment.
pub fn load_server_config() -> Result<ServerConfig, ConfigError> {
    Ok(ServerConfig {
        bind_addr: optional("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
        database_url: required("DATABASE_URL")?,
        redis_url: optional("REDIS_URL"),
        oracle_url: optional("ORACLE_URL"),
    })
}

/// Loads the edge-worker configuration from the process environment.
///
/// Returns [`ConfigError::MissingVar`] when `CLUSTER_TOKEN` is absent — the
/// caller is expected to treat that as "worker disabled" per §6 and exit
/// cleanly rather than panic.
pub fn load_worker_config() -> Result<WorkerConfig, ConfigError> {
    let cluster_token = required("CLUSTER_TOKEN")?;
    let saas_url = optional("SAAS_URL").unwrap_or_else(|| "http://localhost:8080".to_string());
    let poll_interval_seconds = optional("POLL_INTERVAL_SECONDS")
        .and_then(|v| v.parse().ok())
        .unwrap_or(5);

    Ok(WorkerConfig {
        saas_url,
        cluster_token,
        poll_interval_seconds,
        tools: tool_catalogue_from_env(),
        oracle_url: optional("ORACLE_URL"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn worker_config_requires_cluster_token() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::remove_var("CLUSTER_TOKEN");
        let err = load_worker_config().unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("CLUSTER_TOKEN")));
    }

    #[test]
    fn worker_config_defaults_poll_interval() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var("CLUSTER_TOKEN", "tok-123");
        env::remove_var("POLL_INTERVAL_SECONDS");
        let cfg = load_worker_config().unwrap();
        assert_eq!(cfg.poll_interval_seconds, 5);
        env::remove_var("CLUSTER_TOKEN");
    }
}
