use sre_domain::{RemediationAction, RemediationPlan, RiskLevel};

use crate::state::Trigger;

/// Outcome of evaluating one action against the policy gate's deterministic
/// rules (§4.5 POLICY_GATE). Blocked actions carry the reason for display in
/// a pause narration.
#[derive(Debug, Clone)]
pub struct PolicyVerdict {
    pub blocked: Vec<(usize, String)>,
}

impl PolicyVerdict {
    pub fn is_blocked(&self) -> bool {
        !self.blocked.is_empty()
    }
}

fn risk_score(plan: &RemediationPlan) -> f64 {
    let mut score = plan.risk_level.base_score();
    if plan.actions.len() > 3 {
        score += 1.0;
    }
    if plan.actions.len() > 5 {
        score += 1.0;
    }
    let dangerous = plan.actions.iter().filter(|a| a.is_dangerous()).count();
    score += 0.5 * dangerous as f64;
    score.min(10.0)
}

fn action_blocked(action: &RemediationAction, environment: &str, score: f64) -> Option<String> {
    if environment != "production" {
        return None;
    }
    match action.action_type.as_str() {
        "restart" if score >= 3.0 => Some(format!(
            "restart blocked in production: risk score {score:.1} >= 3"
        )),
        "scale" => {
            let replicas = action
                .parameters
                .get("replicas")
                .and_then(|v| v.as_i64());
            if replicas == Some(0) {
                Some("scale to zero replicas blocked in production".to_string())
            } else {
                None
            }
        }
        "rollback" => {
            let explicit = action
                .parameters
                .get("explicit_approval")
                .and_then(|v| v.as_bool())
                .unwrap_or(false);
            if explicit {
                None
            } else {
                Some("rollback blocked in production without explicit_approval".to_string())
            }
        }
        other if action.is_delete_like() => {
            let _ = other;
            Some("delete-like action blocked unconditionally in production".to_string())
        }
        _ => None,
    }
}

/// Evaluates every action in `plan` against the deterministic safety rules.
/// Environment is derived from `trigger`'s labels, defaulting to
/// `production` for safety when absent.
pub fn evaluate(plan: &RemediationPlan, trigger: &Trigger) -> PolicyVerdict {
    let environment = trigger.environment();
    let score = risk_score(plan);
    let blocked = plan
        .actions
        .iter()
        .enumerate()
        .filter_map(|(i, action)| action_blocked(action, &environment, score).map(|reason| (i, reason)))
        .collect();
    PolicyVerdict { blocked }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn trigger_with_env(env: &str) -> Trigger {
        let mut labels = HashMap::new();
        labels.insert("environment".to_string(), env.to_string());
        Trigger {
            name: "HighCPU".into(),
            severity: None,
            labels,
            annotations: HashMap::new(),
            starts_at: None,
        }
    }

    fn action(action_type: &str, params: serde_json::Value) -> RemediationAction {
        RemediationAction {
            action_type: action_type.into(),
            target: "svc".into(),
            parameters: params.as_object().cloned().unwrap_or_default(),
            safety_check: None,
            rollback: None,
        }
    }

    fn plan_with(actions: Vec<RemediationAction>, risk: RiskLevel) -> RemediationPlan {
        RemediationPlan {
            plan_id: "plan-test".into(),
            hypothesis: "test".into(),
            actions,
            estimated_duration: None,
            risk_level: risk,
            requires_approval: false,
            verification_metrics: vec![],
            approval_status: sre_domain::ApprovalStatus::Approved,
        }
    }

    #[test]
    fn delete_always_blocked_in_production() {
        let plan = plan_with(vec![action("delete_resource", json!({}))], RiskLevel::Low);
        let verdict = evaluate(&plan, &trigger_with_env("production"));
        assert!(verdict.is_blocked());
    }

    #[test]
    fn delete_allowed_outside_production() {
        let plan = plan_with(vec![action("delete_resource", json!({}))], RiskLevel::Low);
        let verdict = evaluate(&plan, &trigger_with_env("staging"));
        assert!(!verdict.is_blocked());
    }

    #[test]
    fn scale_to_zero_blocked_in_production() {
        let plan = plan_with(vec![action("scale", json!({"replicas": 0}))], RiskLevel::Low);
        let verdict = evaluate(&plan, &trigger_with_env("production"));
        assert!(verdict.is_blocked());
    }

    #[test]
    fn rollback_requires_explicit_approval_in_production() {
        let plan = plan_with(vec![action("rollback", json!({}))], RiskLevel::Low);
        assert!(evaluate(&plan, &trigger_with_env("production")).is_blocked());

        let plan = plan_with(
            vec![action("rollback", json!({"explicit_approval": true}))],
            RiskLevel::Low,
        );
        assert!(!evaluate(&plan, &trigger_with_env("production")).is_blocked());
    }

    #[test]
    fn restart_blocked_unless_low_risk_score() {
        let plan = plan_with(vec![action("restart", json!({}))], RiskLevel::High);
        assert!(evaluate(&plan, &trigger_with_env("production")).is_blocked());

        let plan = plan_with(vec![action("restart", json!({}))], RiskLevel::Low);
        assert!(!evaluate(&plan, &trigger_with_env("production")).is_blocked());
    }
}
