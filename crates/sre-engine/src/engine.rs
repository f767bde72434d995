use std::sync::Arc;

use chrono::Utc;
use sre_domain::{ApprovalStatus, ClusterId, IncidentId, IncidentStatus, RemediationPlan};
use sre_store::{Repository, SessionStatus, SessionStore};
use tracing::{info, warn};

use crate::agents;
use crate::catalogue::ToolCatalogue;
use crate::executor;
use crate::oracle::ReasoningOracle;
use crate::policy;
use crate::prompts;
use crate::state::{
    ExecutionOutcome, ExecutionStatus, InvestigationFindings, InvestigationState, OodaPhase,
};
use crate::verifier;

const MAX_INVESTIGATION_COUNT: u32 = 3;
const DEFAULT_SESSION_TTL: u64 = 3600;

/// Which step function runs next, distinct from the OODA phase label stored
/// in [`InvestigationState::phase`] (§9, "state machine as data").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    Prepare,
    InvestigationSwarm,
    Reflector,
    Planner,
    PolicyGate,
    Executor,
    Verifier,
    Aggregate,
}

/// Why the engine returned control to the caller instead of reaching
/// `AGGREGATE`: either it paused for human approval, or it ran to
/// completion. Both are terminal from the driving task's point of view —
/// approval resumes via a freshly spawned task (§4.6).
pub enum Outcome {
    Paused,
    Completed { final_response: String, resolved: bool },
}

pub struct EngineDeps {
    pub oracle: Arc<dyn ReasoningOracle>,
    /// Shared across every investigation in the process — the circuit
    /// breaker state inside each wrapped tool only means anything if it
    /// outlives a single run (§8 invariant 10).
    pub catalogue: Arc<ToolCatalogue>,
    pub session_store: Arc<dyn SessionStore>,
    pub repo: Arc<dyn Repository>,
    pub cluster_id: ClusterId,
}

/// Runs the state machine from `node` until it pauses or reaches
/// `AGGREGATE`. The caller is responsible for updating the Incident's
/// status and persisting logs around this call (§4.5, §4.6).
pub async fn run(
    mut state: InvestigationState,
    mut node: Node,
    deps: &EngineDeps,
) -> (InvestigationState, Outcome) {
    let log_key = state.incident_id.to_string();
    loop {
        node = match node {
            Node::Prepare => {
                narrate(deps, &log_key, "Investigation started").await;
                prepare(&mut state)
            }
            Node::InvestigationSwarm => {
                let next = investigation_swarm(&mut state, deps).await;
                narrate(deps, &log_key, "Step completed: investigation_swarm").await;
                next
            }
            Node::Reflector => {
                let next = reflector(&mut state, deps).await;
                narrate(deps, &log_key, "Step completed: reflector").await;
                next
            }
            Node::Planner => {
                let next = planner(&mut state, deps).await;
                narrate(deps, &log_key, "Step completed: planner").await;
                next
            }
            Node::PolicyGate => {
                let paused = policy_gate(&mut state, deps).await;
                narrate(deps, &log_key, "Step completed: policy_gate").await;
                if let Some(outcome) = paused {
                    return (state, outcome);
                }
                Node::Executor
            }
            Node::Executor => {
                let next = executor_node(&mut state, deps).await;
                narrate(deps, &log_key, "Step completed: executor").await;
                next
            }
            Node::Verifier => {
                let next = verifier_node(&mut state, deps).await;
                narrate(deps, &log_key, "Step completed: verifier").await;
                next
            }
            Node::Aggregate => {
                let outcome = aggregate(&mut state);
                narrate(deps, &log_key, "Investigation Complete").await;
                return (state, outcome);
            }
        };
    }
}

async fn narrate(deps: &EngineDeps, log_key: &str, line: &str) {
    deps.session_store.append_log(log_key, line, DEFAULT_SESSION_TTL).await;
}

fn prepare(state: &mut InvestigationState) -> Node {
    state.phase = OodaPhase::Observe;
    Node::InvestigationSwarm
}

async fn investigation_swarm(state: &mut InvestigationState, deps: &EngineDeps) -> Node {
    state.note_thought("infra_agent", "Inspecting cluster state...");
    state.note_thought("metrics_agent", "Querying metrics...");
    state.note_thought("logs_agent", "Scanning logs...");
    state.note_thought("code_agent", "Checking recent changes...");

    let (infra, metrics, logs, code) = tokio::join!(
        agents::infra_agent(state, &deps.catalogue),
        agents::metrics_agent(state, &deps.catalogue),
        agents::logs_agent(state, &deps.catalogue),
        agents::code_agent(state, &deps.catalogue),
    );

    let infra_text = format!("{}\n{}", infra.text(), metrics.text());
    let logs_text = logs.text().to_string();
    let code_text = code.as_ref().map(|c| c.text().to_string());

    state.agent_results.insert("infra_agent".to_string(), infra);
    state.agent_results.insert("metrics_agent".to_string(), metrics);
    state.agent_results.insert("logs_agent".to_string(), logs);
    if let Some(code_outcome) = code {
        state.agent_results.insert("code_agent".to_string(), code_outcome);
    }

    state.findings = Some(InvestigationFindings {
        infra: infra_text,
        logs: logs_text,
        code: code_text,
    });
    state.investigation_count += 1;
    state.phase = OodaPhase::Orient;
    Node::Reflector
}

async fn reflector(state: &mut InvestigationState, deps: &EngineDeps) -> Node {
    let prompt = prompts::reflector_prompt(state);
    let analysis = match deps.oracle.reflect(&prompt).await {
        Ok(analysis) => analysis,
        Err(err) => {
            warn!(error = %err, "reasoning oracle failed during reflection, using fallback analysis");
            crate::prompts::fallback_reflection(state)
        }
    };

    let deeper_needed = analysis.requires_deeper_investigation
        && !analysis.recommended_agents.is_empty()
        && state.investigation_count < MAX_INVESTIGATION_COUNT;

    state.reflector_analysis = Some(analysis);

    if deeper_needed {
        state.phase = OodaPhase::Observe;
        Node::InvestigationSwarm
    } else {
        state.phase = OodaPhase::Decide;
        Node::Planner
    }
}

async fn planner(state: &mut InvestigationState, deps: &EngineDeps) -> Node {
    let runbook = lookup_runbook(state, deps).await;
    let similar_incidents = recall_similar_incidents(state, deps).await;

    let prompt = prompts::planner_prompt(state, runbook.as_deref(), &similar_incidents);
    let plan_id = format!("plan-{}", Utc::now().to_rfc3339());

    let mut plan = match deps.oracle.plan(&prompt).await {
        Ok(plan) => plan,
        Err(err) => {
            warn!(error = %err, "reasoning oracle failed during planning, using fallback escalation");
            RemediationPlan::fallback_escalation(
                state
                    .reflector_analysis
                    .as_ref()
                    .map(|a| a.hypothesis.clone())
                    .unwrap_or_else(|| "unknown".to_string()),
                plan_id.clone(),
            )
        }
    };
    plan.plan_id = plan_id;
    plan.approval_status = if plan.requires_approval {
        ApprovalStatus::Pending
    } else {
        ApprovalStatus::Approved
    };
    state.approval_status = plan.approval_status;
    state.plan = Some(plan);
    state.phase = OodaPhase::Decide;
    Node::PolicyGate
}

async fn lookup_runbook(state: &InvestigationState, deps: &EngineDeps) -> Option<String> {
    let ctx = sre_tools::InvocationContext::new(state.incident_id.to_string(), "planner");
    let args = serde_json::json!({ "query": state.trigger.name });
    let result = deps
        .catalogue
        .call(&deps.catalogue.runbooks, &ctx, args)
        .await
        .ok()?;
    let text = result.as_str().map(str::to_string).unwrap_or_else(|| result.to_string());
    if text.trim().is_empty() || text == "null" {
        None
    } else {
        Some(text)
    }
}

async fn recall_similar_incidents(state: &InvestigationState, deps: &EngineDeps) -> Vec<String> {
    let ctx = sre_tools::InvocationContext::new(state.incident_id.to_string(), "planner");
    let query = format!(
        "{} {}",
        state.reflector_analysis.as_ref().map(|a| a.hypothesis.clone()).unwrap_or_default(),
        state.reflector_analysis.as_ref().map(|a| a.reasoning.clone()).unwrap_or_default(),
    );
    let args = serde_json::json!({ "tool": "recall_similar_incidents", "query": query });
    let Some(result) = deps.catalogue.call(&deps.catalogue.memory, &ctx, args).await.ok() else {
        return Vec::new();
    };
    let Some(items) = result.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .filter(|item| item.get("similarity").and_then(|s| s.as_f64()).unwrap_or(0.0) >= 0.7)
        .take(3)
        .map(|item| item.to_string())
        .collect()
}

async fn policy_gate(state: &mut InvestigationState, deps: &EngineDeps) -> Option<Outcome> {
    let plan = state.plan.clone()?;
    let verdict = policy::evaluate(&plan, &state.trigger);
    let needs_pause = verdict.is_blocked()
        || (plan.requires_approval && state.approval_status != ApprovalStatus::Approved);

    if needs_pause {
        state.phase = OodaPhase::Act;
        state.approval_status = ApprovalStatus::Pending;
        pause(state, deps, &verdict).await;
        return Some(Outcome::Paused);
    }
    None
}

async fn pause(state: &InvestigationState, deps: &EngineDeps, verdict: &policy::PolicyVerdict) {
    let snapshot = state.to_snapshot(SessionStatus::WaitingApproval, true);
    let key = state.incident_id.to_string();
    deps.session_store
        .set(
            &key,
            &serde_json::to_string(&snapshot).unwrap_or_default(),
            Some(DEFAULT_SESSION_TTL),
        )
        .await;

    let reason = if verdict.is_blocked() {
        format!(
            "Paused for approval: {} action(s) blocked by policy",
            verdict.blocked.len()
        )
    } else {
        "Paused for approval: plan requires manual sign-off".to_string()
    };
    deps.session_store
        .append_log(&key, &reason, DEFAULT_SESSION_TTL)
        .await;
    info!(incident_id = %key, "investigation paused for approval");
}

async fn executor_node(state: &mut InvestigationState, deps: &EngineDeps) -> Node {
    state.phase = OodaPhase::Act;

    if state.approval_status != ApprovalStatus::Approved {
        state.phase = OodaPhase::Complete;
        state.execution = Some(ExecutionOutcome {
            status: ExecutionStatus::Failed,
            actions: Vec::new(),
        });
        return Node::Aggregate;
    }

    if deps.session_store.is_cluster_locked(&deps.cluster_id.to_string()).await {
        state.execution = Some(ExecutionOutcome {
            status: ExecutionStatus::Aborted,
            actions: Vec::new(),
        });
        return Node::Aggregate;
    }

    let outcome = executor::execute(state, &deps.catalogue, &deps.repo, deps.cluster_id).await;
    state.execution = Some(outcome);
    Node::Verifier
}

async fn verifier_node(state: &mut InvestigationState, deps: &EngineDeps) -> Node {
    state.phase = OodaPhase::Verify;
    let record = verifier::verify(state, &deps.catalogue).await;
    state.verification = Some(record);
    Node::Aggregate
}

fn aggregate(state: &mut InvestigationState) -> Outcome {
    state.phase = OodaPhase::Complete;

    let mut response = String::new();
    if let Some(analysis) = &state.reflector_analysis {
        response.push_str(&format!("Hypothesis: {}\n", analysis.hypothesis));
    }
    if let Some(plan) = &state.plan {
        response.push_str(&format!("Plan: {} ({} actions)\n", plan.plan_id, plan.actions.len()));
    }
    if let Some(execution) = &state.execution {
        response.push_str(&format!("Execution: {:?}\n", execution.status));
    }
    let resolved = if let Some(verification) = &state.verification {
        response.push_str(&format!(
            "Verification: {} ({:+.1}% improvement)\n",
            verification.status, verification.improvement_percentage
        ));
        verification.status == "RESOLVED"
    } else {
        false
    };

    state.final_response = Some(response.clone());
    Outcome::Completed {
        final_response: response,
        resolved,
    }
}

/// Rehydrates a paused investigation from its serialised snapshot and
/// resumes at `EXECUTOR`, deleting the snapshot first since approval is
/// single-shot (§4.6).
pub async fn resume_after_approval(
    incident_id: IncidentId,
    deps: &EngineDeps,
) -> Option<(InvestigationState, Outcome)> {
    let key = incident_id.to_string();
    let raw = deps.session_store.get(&key).await?;
    deps.session_store.delete(&key).await;

    let snapshot: sre_store::SessionSnapshot = serde_json::from_str(&raw).ok()?;
    let mut state = InvestigationState::from_snapshot(&snapshot)?;
    state.approval_status = ApprovalStatus::Approved;
    Some(run(state, Node::Executor, deps).await)
}

/// Final Incident status transition a caller applies around [`run`]'s
/// result: `RESOLVED` on verified success, `OPEN` (with a prefixed summary)
/// on any non-resolved terminal outcome, per §7's webhook failure policy.
pub fn incident_status_for(outcome: &Outcome) -> (IncidentStatus, String) {
    match outcome {
        Outcome::Paused => (IncidentStatus::Investigating, "Awaiting approval".to_string()),
        Outcome::Completed { final_response, resolved: true } => {
            (IncidentStatus::Resolved, final_response.clone())
        }
        Outcome::Completed { final_response, resolved: false } => (
            IncidentStatus::Open,
            format!("Investigation Attempt Failed: {final_response}"),
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use sre_domain::{ClusterId, IncidentId, RemediationAction, RiskLevel};
    use sre_store::{InMemoryRepository, InMemorySessionStore};

    use super::*;
    use crate::oracle::RecordedOracle;
    use crate::state::{ReflectorAnalysis, Trigger};

    fn empty_catalogue() -> ToolCatalogue {
        ToolCatalogue {
            kubernetes: None,
            metrics: None,
            logs: None,
            runbooks: None,
            code_host: None,
            memory: None,
        }
    }

    fn trigger(name: &str) -> Trigger {
        Trigger {
            name: name.to_string(),
            severity: Some("critical".to_string()),
            labels: HashMap::new(),
            annotations: HashMap::new(),
            starts_at: None,
        }
    }

    fn deeper_investigation_reflection() -> ReflectorAnalysis {
        ReflectorAnalysis {
            hypothesis: "inconclusive, need more evidence".to_string(),
            confidence: 0.2,
            discrepancies: Vec::new(),
            reasoning: "findings disagree across agents".to_string(),
            recommended_agents: vec!["infra_agent".to_string()],
            requires_deeper_investigation: true,
        }
    }

    fn no_op_plan(plan_id: &str) -> RemediationPlan {
        RemediationPlan {
            plan_id: plan_id.to_string(),
            hypothesis: "noop".to_string(),
            actions: Vec::new(),
            estimated_duration: None,
            risk_level: RiskLevel::Low,
            requires_approval: false,
            verification_metrics: Vec::new(),
            approval_status: ApprovalStatus::Approved,
        }
    }

    fn deps_with(oracle: RecordedOracle) -> EngineDeps {
        EngineDeps {
            oracle: Arc::new(oracle),
            catalogue: Arc::new(empty_catalogue()),
            session_store: Arc::new(InMemorySessionStore::new()),
            repo: Arc::new(InMemoryRepository::new()),
            cluster_id: ClusterId::new(),
        }
    }

    /// §8 invariant 6 / scenario S6: the oracle recommends deeper
    /// investigation on every reflection, but the router caps re-entry into
    /// `INVESTIGATION_SWARM` at three visits and forwards to `PLANNER`
    /// regardless on the fourth opportunity.
    #[tokio::test]
    async fn reflector_caps_reinvestigation_at_three_visits() {
        let oracle = RecordedOracle::new();
        for _ in 0..4 {
            oracle.queue_reflection(deeper_investigation_reflection());
        }
        oracle.queue_plan(no_op_plan("plan-s6"));
        let deps = deps_with(oracle);

        let state = InvestigationState::prepare(IncidentId::new(), trigger("PodCrashLooping"));
        let (state, outcome) = run(state, Node::Prepare, &deps).await;

        assert_eq!(state.investigation_count, MAX_INVESTIGATION_COUNT);
        assert!(state.plan.is_some());
        match outcome {
            Outcome::Completed { .. } => {}
            Outcome::Paused => panic!("expected a terminal completion, not a pause"),
        }
    }

    /// Happy path: a single investigation pass, a reflection that does not
    /// request more digging, and a plan with no actions and no approval
    /// requirement runs straight through to `AGGREGATE`.
    #[tokio::test]
    async fn happy_path_runs_to_completion_without_pausing() {
        let oracle = RecordedOracle::new();
        oracle.queue_reflection(ReflectorAnalysis {
            hypothesis: "transient network blip".to_string(),
            confidence: 0.9,
            discrepancies: Vec::new(),
            reasoning: "all signals point to a single restart".to_string(),
            recommended_agents: Vec::new(),
            requires_deeper_investigation: false,
        });
        oracle.queue_plan(no_op_plan("plan-happy"));
        let deps = deps_with(oracle);

        let state = InvestigationState::prepare(IncidentId::new(), trigger("HighErrorRate"));
        let (state, outcome) = run(state, Node::Prepare, &deps).await;

        assert_eq!(state.investigation_count, 1);
        match outcome {
            Outcome::Completed { resolved, .. } => assert!(!resolved),
            Outcome::Paused => panic!("expected a terminal completion, not a pause"),
        }
    }

    /// A plan with a dangerous action and `requires_approval` pauses at
    /// `POLICY_GATE` rather than reaching `EXECUTOR` (§4.5 POLICY_GATE).
    #[tokio::test]
    async fn plan_requiring_approval_pauses_before_execution() {
        let oracle = RecordedOracle::new();
        oracle.queue_reflection(ReflectorAnalysis {
            hypothesis: "node under memory pressure".to_string(),
            confidence: 0.7,
            discrepancies: Vec::new(),
            reasoning: "OOM kills observed".to_string(),
            recommended_agents: Vec::new(),
            requires_deeper_investigation: false,
        });
        oracle.queue_plan(RemediationPlan {
            plan_id: "plan-approval".to_string(),
            hypothesis: "node under memory pressure".to_string(),
            actions: vec![RemediationAction {
                action_type: "restart".to_string(),
                target: "node-7".to_string(),
                parameters: serde_json::Map::new(),
                safety_check: None,
                rollback: None,
            }],
            estimated_duration: None,
            risk_level: RiskLevel::High,
            requires_approval: true,
            verification_metrics: Vec::new(),
            approval_status: ApprovalStatus::Pending,
        });
        let deps = deps_with(oracle);

        let state = InvestigationState::prepare(IncidentId::new(), trigger("NodeNotReady"));
        let (state, outcome) = run(state, Node::Prepare, &deps).await;

        assert!(state.execution.is_none());
        match outcome {
            Outcome::Paused => {}
            Outcome::Completed { .. } => panic!("expected a pause for approval"),
        }

        let raw = deps.session_store.get(&state.incident_id.to_string()).await;
        assert!(raw.is_some(), "paused investigation must be persisted for resume");
    }
}
