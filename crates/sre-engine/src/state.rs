use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sre_domain::{ApprovalStatus, IncidentId, RemediationPlan};
use sre_store::{SessionSnapshot, SessionStatus, VerificationRecord};

/// Alert context the investigation was triggered from, carried through every
/// phase so the Planner/Policy Gate/Verifier can each derive what they need
/// from labels rather than re-fetching it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trigger {
    pub name: String,
    pub severity: Option<String>,
    pub labels: HashMap<String, String>,
    pub annotations: HashMap<String, String>,
    pub starts_at: Option<DateTime<Utc>>,
}

impl Trigger {
    pub fn environment(&self) -> String {
        self.labels
            .get("environment")
            .or_else(|| self.labels.get("env"))
            .or_else(|| self.labels.get("namespace"))
            .cloned()
            .unwrap_or_else(|| "production".to_string())
    }

    pub fn namespace(&self) -> String {
        self.labels
            .get("namespace")
            .cloned()
            .unwrap_or_else(|| "default".to_string())
    }
}

/// One domain agent's contribution to `agent_results`: either narration text
/// or the error that replaced it. A structured tool error surfaces here as
/// `Error`, not as a panic — the Reflector treats it as missing data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AgentOutcome {
    Findings(String),
    Error(String),
}

impl AgentOutcome {
    pub fn text(&self) -> &str {
        match self {
            AgentOutcome::Findings(s) => s,
            AgentOutcome::Error(s) => s,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, AgentOutcome::Error(_))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvestigationFindings {
    pub infra: String,
    pub logs: String,
    pub code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReflectorAnalysis {
    pub hypothesis: String,
    pub confidence: f64,
    pub discrepancies: Vec<String>,
    pub reasoning: String,
    pub recommended_agents: Vec<String>,
    pub requires_deeper_investigation: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    Completed,
    Partial,
    Failed,
    Aborted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionExecution {
    pub action_type: String,
    pub target: String,
    pub tool_name: String,
    pub success: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub status: ExecutionStatus,
    pub actions: Vec<ActionExecution>,
}

/// The OODA phase label carried in the shared state, distinct from `Node`
/// (engine.rs), which names the step function that runs next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OodaPhase {
    Observe,
    Orient,
    Decide,
    Act,
    Verify,
    Complete,
}

/// The record half of "state machine as data, not control flow" (§9):
/// `Node::next` is a pure function over this plus oracle/tool responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestigationState {
    pub incident_id: IncidentId,
    pub trigger: Trigger,
    pub query: String,
    pub agent_results: HashMap<String, AgentOutcome>,
    pub findings: Option<InvestigationFindings>,
    pub reflector_analysis: Option<ReflectorAnalysis>,
    pub plan: Option<RemediationPlan>,
    pub approval_status: ApprovalStatus,
    pub execution: Option<ExecutionOutcome>,
    pub verification: Option<VerificationRecord>,
    pub phase: OodaPhase,
    pub investigation_count: u32,
    pub thought_trace: HashMap<String, Vec<String>>,
    pub final_response: Option<String>,
}

impl InvestigationState {
    pub fn prepare(incident_id: IncidentId, trigger: Trigger) -> Self {
        let query = trigger.name.clone();
        Self {
            incident_id,
            trigger,
            query,
            agent_results: HashMap::new(),
            findings: None,
            reflector_analysis: None,
            plan: None,
            approval_status: ApprovalStatus::Pending,
            execution: None,
            verification: None,
            phase: OodaPhase::Observe,
            investigation_count: 0,
            thought_trace: HashMap::new(),
            final_response: None,
        }
    }

    pub fn note_thought(&mut self, agent: &str, thought: &str) {
        self.thought_trace
            .entry(agent.to_string())
            .or_default()
            .push(thought.to_string());
    }

    pub fn to_snapshot(&self, status: SessionStatus, approval_required: bool) -> SessionSnapshot {
        SessionSnapshot {
            status,
            phase: format!("{:?}", self.phase).to_uppercase(),
            state: serde_json::to_value(self).ok(),
            plan: self.plan.clone(),
            final_response: self.final_response.clone(),
            verification: self.verification.clone(),
            approval_required,
        }
    }

    pub fn from_snapshot(snapshot: &SessionSnapshot) -> Option<Self> {
        snapshot
            .state
            .as_ref()
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}
