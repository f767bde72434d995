use std::sync::Arc;

use serde_json::Value;
use sre_domain::ToolAuditStatus;
use sre_store::Repository;
use tracing::error;
use uuid::Uuid;

use crate::circuit_breaker::CircuitBreaker;
use crate::context::InvocationContext;
use crate::error::ToolError;
use crate::retry::invoke_with_retry;
use crate::tool::Tool;

const MAX_AUDIT_RESULT_LEN: usize = 10_000;

fn truncate_result(value: &Value) -> String {
    let text = value.to_string();
    if text.len() > MAX_AUDIT_RESULT_LEN {
        let mut truncated = text[..MAX_AUDIT_RESULT_LEN].to_string();
        truncated.push_str("... (truncated)");
        truncated
    } else {
        text
    }
}

/// Composes a [`Tool`] with retry (inner), circuit breaker (middle), and
/// audit (outer), in that order, exactly as `wrap_all_tools_with_retry`
/// layers `wrap_tool_with_retry` → `wrap_tool_with_circuit_breaker` →
/// `wrap_tool_with_audit`.
pub struct WrappedTool<T: Tool> {
    inner: T,
    breaker: CircuitBreaker,
    repo: Arc<dyn Repository>,
}

impl<T: Tool> WrappedTool<T> {
    pub fn new(inner: T, breaker: CircuitBreaker, repo: Arc<dyn Repository>) -> Self {
        Self {
            inner,
            breaker,
            repo,
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub async fn call(&self, ctx: &InvocationContext, args: Value) -> Result<Value, ToolError> {
        let tool_name = self.inner.name().to_string();
        let audit_id = self
            .repo
            .insert_tool_audit_pending(&ctx.incident_id, &ctx.agent_name, &tool_name, &args.to_string())
            .await
            .unwrap_or_else(|err| {
                error!(tool = %tool_name, error = %err, "failed to write pending audit row");
                Uuid::new_v4()
            });

        if let Err(open) = self.breaker.check(&tool_name) {
            self.finalize(audit_id, &tool_name, Err(&open)).await;
            return Err(open);
        }

        match invoke_with_retry(&self.inner, args).await {
            Ok(value) => {
                self.breaker.record_success(&tool_name);
                self.finalize(audit_id, &tool_name, Ok(&value)).await;
                Ok(value)
            }
            Err(tool_err) => {
                self.breaker.record_failure(&tool_name);
                self.finalize(audit_id, &tool_name, Err(&tool_err)).await;
                Err(tool_err)
            }
        }
    }

    async fn finalize(&self, audit_id: Uuid, tool_name: &str, outcome: Result<&Value, &ToolError>) {
        let (status, result, error_message) = match outcome {
            Ok(value) => (ToolAuditStatus::Success, Some(truncate_result(value)), None),
            Err(err) => (ToolAuditStatus::Failure, None, Some(err.error_message.clone())),
        };
        if let Err(err) = self
            .repo
            .finalize_tool_audit(audit_id, status, result.as_deref(), error_message.as_deref())
            .await
        {
            error!(tool = %tool_name, error = %err, "failed to finalize audit row");
        }
    }
}
