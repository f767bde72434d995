use std::sync::Arc;

use serde_json::Value;
use sre_config::ToolCatalogueConfig;
use sre_store::Repository;
use sre_tools::circuit_breaker::CircuitBreaker;
use sre_tools::clients::HttpTool;
use sre_tools::{InvocationContext, ToolError, WrappedTool};

/// One domain's worth of wrapped HTTP tool, present only if its URL was
/// configured — absent domains are silently dropped (§6).
type MaybeTool = Option<WrappedTool<HttpTool>>;

/// The tool catalogue an investigation's domain agents and phases draw from.
/// Each entry is independently wrapped with retry + circuit breaker + audit
/// (C5); a missing domain just means that agent runs without it.
pub struct ToolCatalogue {
    pub kubernetes: MaybeTool,
    pub metrics: MaybeTool,
    pub logs: MaybeTool,
    pub runbooks: MaybeTool,
    pub code_host: MaybeTool,
    pub memory: MaybeTool,
}

impl ToolCatalogue {
    pub fn from_config(config: &ToolCatalogueConfig, repo: Arc<dyn Repository>) -> Self {
        let breaker = CircuitBreaker::new();
        macro_rules! wrap {
            ($ctor:path, $url:expr) => {
                $url.clone()
                    .map(|u| WrappedTool::new($ctor(u), breaker.clone(), repo.clone()))
            };
        }
        Self {
            kubernetes: wrap!(HttpTool::kubernetes, config.kubernetes_url),
            metrics: wrap!(HttpTool::metrics, config.metrics_url),
            logs: wrap!(HttpTool::logs, config.logs_url),
            runbooks: wrap!(HttpTool::runbooks, config.runbooks_url),
            code_host: wrap!(HttpTool::code_host, config.code_host_url),
            memory: wrap!(HttpTool::memory, config.memory_url),
        }
    }

    pub async fn call(
        &self,
        domain: &MaybeTool,
        ctx: &InvocationContext,
        args: Value,
    ) -> Result<Value, ToolError> {
        match domain {
            Some(tool) => tool.call(ctx, args).await,
            None => Err(ToolError {
                tool_name: "unconfigured".to_string(),
                error_message: "tool domain not configured".to_string(),
                retry_count: 0,
                is_recoverable: false,
                suggestion: "Proceed with available data from other tools.".to_string(),
            }),
        }
    }
}
