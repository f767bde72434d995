use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Base risk score before the action-count and dangerous-action adjustments
    /// the policy gate applies (§4.5 POLICY_GATE).
    pub fn base_score(self) -> f64 {
        match self {
            RiskLevel::Low => 2.0,
            RiskLevel::Medium => 5.0,
            RiskLevel::High => 8.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemediationAction {
    pub action_type: String,
    pub target: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
    pub safety_check: Option<String>,
    pub rollback: Option<String>,
}

impl RemediationAction {
    /// True for `restart`, `rollback`, `delete`, or any type containing "delete" —
    /// the set the policy gate and risk-scorer treat as dangerous.
    pub fn is_dangerous(&self) -> bool {
        matches!(self.action_type.as_str(), "restart" | "rollback" | "delete")
    }

    pub fn is_delete_like(&self) -> bool {
        self.action_type.contains("delete")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemediationPlan {
    pub plan_id: String,
    pub hypothesis: String,
    pub actions: Vec<RemediationAction>,
    pub estimated_duration: Option<String>,
    pub risk_level: RiskLevel,
    pub requires_approval: bool,
    pub verification_metrics: Vec<String>,
    #[serde(default = "default_approval_status")]
    pub approval_status: ApprovalStatus,
}

fn default_approval_status() -> ApprovalStatus {
    ApprovalStatus::Pending
}

impl RemediationPlan {
    /// The fallback plan constructed when the reasoning oracle fails or returns
    /// an unparseable response (§4.5 PLANNER, §7 error handling).
    pub fn fallback_escalation(hypothesis: impl Into<String>, plan_id: String) -> Self {
        Self {
            plan_id,
            hypothesis: hypothesis.into(),
            actions: vec![RemediationAction {
                action_type: "escalate".to_string(),
                target: "manual_review".to_string(),
                parameters: Map::new(),
                safety_check: None,
                rollback: None,
            }],
            estimated_duration: None,
            risk_level: RiskLevel::High,
            requires_approval: true,
            verification_metrics: Vec::new(),
            approval_status: ApprovalStatus::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dangerous_actions_match_policy_gate_set() {
        let restart = RemediationAction {
            action_type: "restart".into(),
            target: "pod-x".into(),
            parameters: Map::new(),
            safety_check: None,
            rollback: None,
        };
        assert!(restart.is_dangerous());

        let patch = RemediationAction {
            action_type: "patch".into(),
            target: "deploy-x".into(),
            parameters: Map::new(),
            safety_check: None,
            rollback: None,
        };
        assert!(!patch.is_dangerous());
    }

    #[test]
    fn delete_like_matches_substring() {
        let action = RemediationAction {
            action_type: "delete_resource".into(),
            target: "cm-x".into(),
            parameters: Map::new(),
            safety_check: None,
            rollback: None,
        };
        assert!(action.is_delete_like());
    }

    #[test]
    fn fallback_plan_always_requires_approval() {
        let plan = RemediationPlan::fallback_escalation("oracle unreachable", "plan-1".into());
        assert_eq!(plan.risk_level, RiskLevel::High);
        assert!(plan.requires_approval);
        assert_eq!(plan.actions.len(), 1);
        assert_eq!(plan.actions[0].action_type, "escalate");
    }
}
