use async_trait::async_trait;
use serde_json::Value;
use sre_domain::RemediationPlan;
use thiserror::Error;

use crate::state::ReflectorAnalysis;

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("reasoning oracle transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("reasoning oracle returned unparseable structured output: {0}")]
    Unparseable(String),
}

/// The external reasoning model, treated as a black-box
/// `Prompt -> StructuredResult | Error` operation (§9, "Oracle as a
/// service"). Neither `REFLECTOR` nor `PLANNER` know what's behind this
/// trait; tests substitute [`RecordedOracle`].
#[async_trait]
pub trait ReasoningOracle: Send + Sync + 'static {
    async fn reflect(&self, prompt: &str) -> Result<ReflectorAnalysis, OracleError>;
    async fn plan(&self, prompt: &str) -> Result<RemediationPlan, OracleError>;
}

/// Calls an HTTP reasoning service that accepts `{"prompt": ..., "schema": ...}`
/// and returns the matching structured-output JSON, POSTed the same way
/// `sre-tools::clients::HttpTool` calls a tool server.
pub struct HttpOracle {
    base_url: String,
    client: reqwest::Client,
}

impl HttpOracle {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    async fn call(&self, path: &str, prompt: &str) -> Result<Value, OracleError> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), path);
        let body = serde_json::json!({ "prompt": prompt });
        let response = self.client.post(url).json(&body).send().await?;
        let value = response.json::<Value>().await?;
        Ok(value)
    }
}

#[async_trait]
impl ReasoningOracle for HttpOracle {
    async fn reflect(&self, prompt: &str) -> Result<ReflectorAnalysis, OracleError> {
        let value = self.call("reflect", prompt).await?;
        serde_json::from_value(value).map_err(|e| OracleError::Unparseable(e.to_string()))
    }

    async fn plan(&self, prompt: &str) -> Result<RemediationPlan, OracleError> {
        let value = self.call("plan", prompt).await?;
        serde_json::from_value(value).map_err(|e| OracleError::Unparseable(e.to_string()))
    }
}

/// Fixed-response fake for deterministic engine tests: returns the next
/// queued reflection/plan regardless of prompt content.
#[derive(Default)]
pub struct RecordedOracle {
    pub reflections: std::sync::Mutex<Vec<ReflectorAnalysis>>,
    pub plans: std::sync::Mutex<Vec<RemediationPlan>>,
}

impl RecordedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_reflection(&self, analysis: ReflectorAnalysis) {
        self.reflections.lock().unwrap().push(analysis);
    }

    pub fn queue_plan(&self, plan: RemediationPlan) {
        self.plans.lock().unwrap().push(plan);
    }
}

#[async_trait]
impl ReasoningOracle for RecordedOracle {
    async fn reflect(&self, _prompt: &str) -> Result<ReflectorAnalysis, OracleError> {
        let mut queue = self.reflections.lock().unwrap();
        if queue.is_empty() {
            Err(OracleError::Unparseable("no recorded reflection left".into()))
        } else {
            Ok(queue.remove(0))
        }
    }

    async fn plan(&self, _prompt: &str) -> Result<RemediationPlan, OracleError> {
        let mut queue = self.plans.lock().unwrap();
        if queue.is_empty() {
            Err(OracleError::Unparseable("no recorded plan left".into()))
        } else {
            Ok(queue.remove(0))
        }
    }
}
