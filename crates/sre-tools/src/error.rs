use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raised by a concrete [`crate::Tool`] implementation on a single attempt.
/// Distinct from [`ToolError`], which is the structured record produced once
/// all retries are exhausted.
#[derive(Debug, Error)]
pub enum ToolInvokeError {
    #[error("transport error calling {tool}: {source}")]
    Transport {
        tool: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{tool} returned HTTP {status}: {body}")]
    Status {
        tool: String,
        status: u16,
        body: String,
    },
    #[error("failed to decode {tool} response: {source}")]
    Decode {
        tool: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("circuit breaker open for {tool}, cooling down for {remaining_secs}s")]
    CircuitOpen { tool: String, remaining_secs: u64 },
}

/// Structured error returned to the caller when a tool fails after retries —
/// a graceful-degradation contract: callers check for this instead of
/// propagating a hard failure, so an investigation can proceed without one
/// tool's data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolError {
    pub tool_name: String,
    pub error_message: String,
    pub retry_count: u32,
    pub is_recoverable: bool,
    pub suggestion: String,
}

impl ToolError {
    pub fn exhausted(tool_name: &str, retry_count: u32, error_message: String) -> Self {
        Self {
            tool_name: tool_name.to_string(),
            error_message,
            retry_count,
            is_recoverable: false,
            suggestion: format!(
                "The {tool_name} tool is unavailable. Proceed with data from other tools."
            ),
        }
    }

    pub fn circuit_open(tool_name: &str, remaining_secs: u64) -> Self {
        Self {
            tool_name: tool_name.to_string(),
            error_message: format!("circuit breaker open, cooling down for {remaining_secs}s"),
            retry_count: 0,
            is_recoverable: true,
            suggestion: format!(
                "The {tool_name} tool is temporarily disabled after repeated failures."
            ),
        }
    }

    /// Text form suitable for embedding directly in an agent's observations.
    pub fn to_agent_response(&self) -> String {
        format!(
            "Error: Tool {} failed after {} attempts. Proceeding without this data. (Error: {})",
            self.tool_name, self.retry_count, self.error_message
        )
    }
}
