use std::time::Duration;

use serde_json::Value;
use tracing::warn;

use crate::error::{ToolError, ToolInvokeError};
use crate::tool::Tool;

const MAX_ATTEMPTS: u32 = 3;
const MAX_BACKOFF_SECS: u64 = 10;

fn backoff_for(attempt: u32) -> Duration {
    let secs = 1u64.checked_shl(attempt.saturating_sub(1)).unwrap_or(u64::MAX);
    Duration::from_secs(secs.min(MAX_BACKOFF_SECS))
}

/// Innermost layer of the C5 wrapper: up to [`MAX_ATTEMPTS`] calls to `tool`,
/// waiting 1s/2s/4s (capped at 10s) between attempts, mirroring
/// `wrap_tool_with_retry`'s `tenacity` configuration. Returns the structured
/// [`ToolError`] once every attempt is exhausted instead of the raw
/// transport error.
pub async fn invoke_with_retry(tool: &dyn Tool, args: Value) -> Result<Value, ToolError> {
    let mut last_err: Option<ToolInvokeError> = None;
    for attempt in 1..=MAX_ATTEMPTS {
        match tool.invoke(args.clone()).await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt < MAX_ATTEMPTS {
                    warn!(tool = tool.name(), attempt, error = %err, "tool invocation failed, retrying");
                    tokio::time::sleep(backoff_for(attempt)).await;
                }
                last_err = Some(err);
            }
        }
    }
    let message = last_err
        .map(|e| e.to_string())
        .unwrap_or_else(|| "unknown error after retries".to_string());
    Err(ToolError::exhausted(tool.name(), MAX_ATTEMPTS, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct FlakyTool {
        fail_times: u32,
        calls: Arc<AtomicU32>,
    }

    #[async_trait]
    impl Tool for FlakyTool {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn invoke(&self, _args: Value) -> Result<Value, ToolInvokeError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= self.fail_times {
                Err(ToolInvokeError::Status {
                    tool: "flaky".into(),
                    status: 503,
                    body: "unavailable".into(),
                })
            } else {
                Ok(Value::String("ok".into()))
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let tool = FlakyTool {
            fail_times: 2,
            calls: calls.clone(),
        };
        let result = invoke_with_retry(&tool, Value::Null).await;
        assert_eq!(result.unwrap(), Value::String("ok".into()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn returns_structured_error_after_exhausting_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let tool = FlakyTool {
            fail_times: 10,
            calls: calls.clone(),
        };
        let err = invoke_with_retry(&tool, Value::Null).await.unwrap_err();
        assert_eq!(err.retry_count, MAX_ATTEMPTS);
        assert!(!err.is_recoverable);
        assert_eq!(calls.load(Ordering::SeqCst), MAX_ATTEMPTS);
    }
}
