use serde_json::json;
use sre_tools::clients::HttpTool;
use sre_tools::{InvocationContext, WrappedTool};

use crate::catalogue::ToolCatalogue;
use crate::state::{AgentOutcome, InvestigationState};

/// One domain agent's pass: call its tool via C5, textify the response.
/// Each agent keeps the contract ("calls one or more tools, returns text
/// findings") without a second oracle round-trip per agent, since the
/// structured hypothesis-forming step already happens once, in REFLECTOR.
async fn run_domain_agent(
    name: &str,
    tool: &WrappedTool<HttpTool>,
    ctx: &InvocationContext,
    args: serde_json::Value,
) -> AgentOutcome {
    match tool.call(ctx, args).await {
        Ok(value) => AgentOutcome::Findings(format!(
            "[{name}] {}",
            serde_json::to_string(&value).unwrap_or_default()
        )),
        Err(err) => AgentOutcome::Error(err.to_agent_response()),
    }
}

pub async fn infra_agent(state: &InvestigationState, catalogue: &ToolCatalogue) -> AgentOutcome {
    let ctx = InvocationContext::new(state.incident_id.to_string(), "infra_agent");
    let args = json!({ "namespace": state.trigger.namespace() });
    match &catalogue.kubernetes {
        Some(tool) => run_domain_agent("infra", tool, &ctx, args).await,
        None => AgentOutcome::Error("kubernetes tool not configured".to_string()),
    }
}

pub async fn metrics_agent(state: &InvestigationState, catalogue: &ToolCatalogue) -> AgentOutcome {
    let ctx = InvocationContext::new(state.incident_id.to_string(), "metrics_agent");
    let args = json!({ "query": state.trigger.name });
    match &catalogue.metrics {
        Some(tool) => run_domain_agent("metrics", tool, &ctx, args).await,
        None => AgentOutcome::Error("metrics tool not configured".to_string()),
    }
}

pub async fn logs_agent(state: &InvestigationState, catalogue: &ToolCatalogue) -> AgentOutcome {
    let ctx = InvocationContext::new(state.incident_id.to_string(), "logs_agent");
    let args = json!({ "namespace": state.trigger.namespace(), "query": state.trigger.name });
    match &catalogue.logs {
        Some(tool) => run_domain_agent("logs", tool, &ctx, args).await,
        None => AgentOutcome::Error("logs tool not configured".to_string()),
    }
}

pub async fn code_agent(state: &InvestigationState, catalogue: &ToolCatalogue) -> Option<AgentOutcome> {
    let ctx = InvocationContext::new(state.incident_id.to_string(), "code_agent");
    let args = json!({ "query": state.trigger.name });
    match &catalogue.code_host {
        Some(tool) => Some(run_domain_agent("code", tool, &ctx, args).await),
        None => None,
    }
}
