use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::{require_cluster_token, require_user_token};
use crate::handlers::{agent, auth_handlers, clusters, health, incidents, jobs, webhook};
use crate::state::AppState;

/// Builds the control-plane HTTP surface (§6). Three auth tiers: open
/// (`/health`, `/auth/*`, `/webhook/alert`), user bearer, and cluster bearer
/// — each tier gets its own sub-router so `route_layer` only wraps the
/// routes that need it (§6 "Authentication").
pub fn build_app(state: AppState) -> Router {
    let user_routes = Router::new()
        .route("/clusters", get(clusters::list_clusters).post(clusters::create_cluster))
        .route("/clusters/:id/health", get(clusters::get_cluster_health))
        .route("/clusters/:id", axum::routing::delete(clusters::delete_cluster))
        .route("/clusters/:id/lock", get(clusters::get_lock).post(clusters::set_lock))
        .route("/clusters/:id/audit", get(clusters::list_audit))
        .route("/clusters/:id/incidents", get(incidents::list_incidents))
        .route("/clusters/:id/trigger", post(incidents::trigger_investigation))
        .route("/clusters/:id/jobs/trigger", post(jobs::trigger_job))
        .route("/clusters/:id/jobs", get(jobs::list_jobs))
        .route("/incidents/:id/logs", get(incidents::get_logs))
        .route("/incidents/:id/status", get(incidents::get_status))
        .route("/incidents/:id/approve", post(incidents::approve))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_user_token));

    let cluster_routes = Router::new()
        .route("/clusters/jobs/pending", get(jobs::claim_pending))
        .route("/clusters/jobs/:job_id/status", post(jobs::update_job_status))
        .route("/clusters/jobs/:job_id/logs", post(jobs::append_job_logs))
        .route("/agent/heartbeat", post(agent::heartbeat))
        .route("/agent/telemetry", post(agent::telemetry))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_cluster_token));

    let open_routes = Router::new()
        .route("/health", get(health::health))
        .route("/auth/register", post(auth_handlers::register))
        .route("/auth/token", post(auth_handlers::token))
        .route("/webhook/alert", post(webhook::alert));

    Router::new()
        .merge(open_routes)
        .merge(user_routes)
        .merge(cluster_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
