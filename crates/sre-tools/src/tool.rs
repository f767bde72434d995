use async_trait::async_trait;
use serde_json::Value;

use crate::error::ToolInvokeError;

/// A single externally-callable capability (Kubernetes, metrics, logs, a
/// runbook catalogue, a code host, or vector memory): one `name`, one
/// fallible async entry point, no assumption about what's on the other end.
#[async_trait]
pub trait Tool: Send + Sync + 'static {
    fn name(&self) -> &str;

    async fn invoke(&self, args: Value) -> Result<Value, ToolInvokeError>;
}
