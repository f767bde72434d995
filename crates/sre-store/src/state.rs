use serde::{Deserialize, Serialize};
use sre_domain::RemediationPlan;

/// Lifecycle states a session snapshot can be in while an investigation is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Running,
    WaitingApproval,
    Completed,
    Error,
}

/// A single verification outcome, duplicated here (rather than imported from
/// `sre-engine`) so this crate does not need to depend on the engine —
/// `sre-engine` depends on `sre-store`, not the other way around.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationRecord {
    pub status: String,
    pub original_value: Option<f64>,
    pub current_value: Option<f64>,
    pub improvement_percentage: f64,
    pub golden_signals: serde_json::Value,
    pub next_steps: Vec<String>,
}

/// Live investigation state, keyed by bare session ID (§4.1, §3) — the
/// `SessionStore` implementation owns whatever key-space prefix it needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub phase: String,
    /// The full serialised `InvestigationState`, opaque to this crate.
    pub state: Option<serde_json::Value>,
    pub plan: Option<RemediationPlan>,
    pub final_response: Option<String>,
    pub verification: Option<VerificationRecord>,
    pub approval_required: bool,
}

impl SessionSnapshot {
    pub fn running() -> Self {
        Self {
            status: SessionStatus::Running,
            phase: "OBSERVE".to_string(),
            state: None,
            plan: None,
            final_response: None,
            verification: None,
            approval_required: false,
        }
    }
}

/// The ordered, append-only narration sequence under `logs:{id}` (§3, §4.1).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionLog {
    pub lines: Vec<String>,
}
