use std::sync::Arc;

use serde_json::{json, Map, Value};
use sre_domain::{ActorType, AuditEvent, AuditOutcome, ClusterId, RemediationAction};
use sre_store::Repository;
use sre_tools::InvocationContext;
use uuid::Uuid;

use crate::catalogue::ToolCatalogue;
use crate::state::{ActionExecution, ExecutionOutcome, ExecutionStatus, InvestigationState};

/// Maps a plan action's type (and, for `restart`/`delete`, whether its
/// target looks like a pod) to the concrete tool name invoked against the
/// Kubernetes tool server (§4.5 EXECUTOR).
fn tool_name_for(action: &RemediationAction) -> &'static str {
    let target_is_pod = action.target.starts_with("pod-") || action.target.contains("/pod/");
    match action.action_type.as_str() {
        "restart" if target_is_pod => "delete_pod",
        "restart" => "restart_deployment",
        "scale" => "scale_deployment",
        "rollback" => "rollback_deployment",
        "delete" if target_is_pod => "delete_pod",
        "delete" => "delete_resource",
        "patch" | "config_change" => "patch_resource",
        "revert_commit" => "create_revert_pr",
        _ => "execute_action",
    }
}

/// Builds the JSON argument body for one action: a `namespace` base, then
/// action-type-specific fields, then any `action.parameters` extras that do
/// not collide with a key already set.
fn build_args(action: &RemediationAction, namespace: &str) -> Value {
    let mut args = Map::new();
    args.insert("namespace".to_string(), json!(namespace));

    match action.action_type.as_str() {
        "restart" | "delete" => {
            if action.target.starts_with("pod-") || action.target.contains("/pod/") {
                args.insert("pod_name".to_string(), json!(action.target));
            } else {
                args.insert("deployment_name".to_string(), json!(action.target));
            }
        }
        "scale" => {
            args.insert("deployment_name".to_string(), json!(action.target));
            if let Some(replicas) = action.parameters.get("replicas") {
                args.insert("replicas".to_string(), replicas.clone());
            }
        }
        "rollback" => {
            args.insert("deployment_name".to_string(), json!(action.target));
            if let Some(revision) = action.parameters.get("revision") {
                args.insert("revision".to_string(), revision.clone());
            }
        }
        "revert_commit" => {
            if let Some(sha) = action.parameters.get("commit_sha") {
                args.insert("commit_sha".to_string(), sha.clone());
            }
            args.insert(
                "pr_title".to_string(),
                action
                    .parameters
                    .get("pr_title")
                    .cloned()
                    .unwrap_or_else(|| json!(format!("Revert: {}", action.target))),
            );
        }
        _ => {}
    }

    for (key, value) in action.parameters.iter() {
        args.entry(key.clone()).or_insert_with(|| value.clone());
    }

    Value::Object(args)
}

/// Runs every action in `plan` order. Preconditions (`approval_status ==
/// Approved`, not cluster-locked) are checked by the caller before this is
/// invoked, matching the engine driver's phase-entry gate.
pub async fn execute(
    state: &InvestigationState,
    catalogue: &ToolCatalogue,
    repo: &Arc<dyn Repository>,
    cluster_id: ClusterId,
) -> ExecutionOutcome {
    let namespace = state.trigger.namespace();
    let mut executions = Vec::new();
    let mut any_failure = false;

    let plan = match &state.plan {
        Some(plan) => plan,
        None => {
            return ExecutionOutcome {
                status: ExecutionStatus::Failed,
                actions: Vec::new(),
            }
        }
    };

    let ctx = InvocationContext::new(state.incident_id.to_string(), "executor");

    for action in &plan.actions {
        let tool_name = tool_name_for(action);
        let args = build_args(action, &namespace);

        let target_tool = match tool_name {
            "execute_action" | "delete_pod" | "restart_deployment" | "scale_deployment"
            | "rollback_deployment" | "delete_resource" | "patch_resource" => &catalogue.kubernetes,
            "create_revert_pr" => &catalogue.code_host,
            _ => &catalogue.kubernetes,
        };

        let result = catalogue.call(target_tool, &ctx, args).await;
        let success = result.is_ok();
        if !success {
            any_failure = true;
        }

        write_audit_event(
            repo,
            cluster_id,
            &action.action_type,
            &action.target,
            success,
        )
        .await;

        if let (true, "revert_commit", Ok(value)) = (success, action.action_type.as_str(), &result) {
            if let Some(pr_url) = value.get("pr_url").or_else(|| value.get("pr_number")) {
                let _ = pr_url;
                let comment_args = json!({
                    "pr_url": value.get("pr_url"),
                    "pr_number": value.get("pr_number"),
                    "comment": format!("{}\n\n{}", plan.hypothesis, state.reflector_analysis.as_ref().map(|r| r.reasoning.clone()).unwrap_or_default()),
                });
                let _ = catalogue.call(&catalogue.code_host, &ctx, comment_args).await;
            }
        }

        executions.push(ActionExecution {
            action_type: action.action_type.clone(),
            target: action.target.clone(),
            tool_name: tool_name.to_string(),
            success,
            error: result.err().map(|e| e.error_message),
        });
    }

    ExecutionOutcome {
        status: if any_failure {
            ExecutionStatus::Partial
        } else {
            ExecutionStatus::Completed
        },
        actions: executions,
    }
}

async fn write_audit_event(
    repo: &Arc<dyn Repository>,
    cluster_id: ClusterId,
    action_type: &str,
    target: &str,
    success: bool,
) {
    let event = AuditEvent {
        id: Uuid::new_v4(),
        cluster_id,
        occurred_at: chrono::Utc::now(),
        actor_type: ActorType::Agent,
        actor_id: "investigation-engine".to_string(),
        action_type: action_type.to_string(),
        resource_target: target.to_string(),
        outcome: if success {
            AuditOutcome::Success
        } else {
            AuditOutcome::Failed
        },
        details: None,
    };
    if let Err(err) = repo.append_audit_event(&event).await {
        tracing::error!(error = %err, "failed to write audit event for executor action");
    }
}
