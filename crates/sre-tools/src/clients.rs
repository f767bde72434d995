use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::ToolInvokeError;
use crate::tool::Tool;

/// A thin `reqwest` client for one domain of the tool catalogue
/// (Kubernetes, metrics, logs, runbooks, code host, vector memory). Each
/// posts `{"tool": name, "args": args}` to its configured base URL.
pub struct HttpTool {
    name: String,
    base_url: String,
    client: reqwest::Client,
}

impl HttpTool {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn kubernetes(base_url: impl Into<String>) -> Self {
        Self::new("kubernetes", base_url)
    }

    pub fn metrics(base_url: impl Into<String>) -> Self {
        Self::new("metrics", base_url)
    }

    pub fn logs(base_url: impl Into<String>) -> Self {
        Self::new("logs", base_url)
    }

    pub fn runbooks(base_url: impl Into<String>) -> Self {
        Self::new("runbooks", base_url)
    }

    pub fn code_host(base_url: impl Into<String>) -> Self {
        Self::new("code_host", base_url)
    }

    pub fn memory(base_url: impl Into<String>) -> Self {
        Self::new("memory", base_url)
    }
}

#[async_trait]
impl Tool for HttpTool {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, args: Value) -> Result<Value, ToolInvokeError> {
        let body = json!({ "tool": self.name, "args": args });
        let response = self
            .client
            .post(self.base_url.trim_end_matches('/'))
            .json(&body)
            .send()
            .await
            .map_err(|source| ToolInvokeError::Transport {
                tool: self.name.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(ToolInvokeError::Status {
                tool: self.name.clone(),
                status: status.as_u16(),
                body: body_text,
            });
        }

        let text = response
            .text()
            .await
            .map_err(|source| ToolInvokeError::Transport {
                tool: self.name.clone(),
                source,
            })?;
        serde_json::from_str(&text).map_err(|source| ToolInvokeError::Decode {
            tool: self.name.clone(),
            source,
        })
    }
}
