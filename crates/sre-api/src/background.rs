use sre_domain::{ClusterId, IncidentId, IncidentStatus};
use sre_engine::{self as engine, EngineDeps, InvestigationState, Node, Trigger};
use tracing::{error, info};

use crate::state::AppState;

fn engine_deps(state: &AppState, cluster_id: ClusterId) -> EngineDeps {
    EngineDeps {
        oracle: state.oracle.clone(),
        catalogue: state.catalogue.clone(),
        session_store: state.session_store.clone(),
        repo: state.repo.clone(),
        cluster_id,
    }
}

/// Spawns a fresh investigation for `incident_id`. Phase-by-phase narration
/// into `logs:{incident_id}` happens inside [`engine::run`] itself; this
/// function only reconciles the Incident's terminal status against the
/// engine's outcome (§4.6, §7 webhook failure policy).
pub fn spawn_investigation(
    state: AppState,
    cluster_id: ClusterId,
    incident_id: IncidentId,
    trigger: Trigger,
) {
    tokio::spawn(async move {
        let deps = engine_deps(&state, cluster_id);
        if let Err(err) = state
            .repo
            .update_incident_status(incident_id, IncidentStatus::Investigating, None)
            .await
        {
            error!(incident_id = %incident_id, error = %err, "failed to mark incident investigating");
        }

        let initial = InvestigationState::prepare(incident_id, trigger);
        let (_final_state, outcome) = engine::run(initial, Node::Prepare, &deps).await;
        reconcile_outcome(&state, incident_id, &outcome).await;
    });
}

/// Resumes a paused investigation after `POST /incidents/{id}/approve`.
pub fn spawn_resume(state: AppState, cluster_id: ClusterId, incident_id: IncidentId) {
    tokio::spawn(async move {
        let deps = engine_deps(&state, cluster_id);

        match engine::resume_after_approval(incident_id, &deps).await {
            Some((_final_state, outcome)) => {
                reconcile_outcome(&state, incident_id, &outcome).await;
            }
            None => {
                let log_key = incident_id.to_string();
                state
                    .session_store
                    .append_log(&log_key, "No paused session found to resume", 3600)
                    .await;
            }
        }
    });
}

async fn reconcile_outcome(state: &AppState, incident_id: IncidentId, outcome: &engine::Outcome) {
    let (status, summary) = engine::incident_status_for(outcome);
    if let Err(err) = state
        .repo
        .update_incident_status(incident_id, status, Some(&summary))
        .await
    {
        error!(incident_id = %incident_id, error = %err, "failed to persist final incident status");
    } else {
        info!(incident_id = %incident_id, ?status, "investigation reached a terminal status");
    }
}
