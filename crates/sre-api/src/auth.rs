use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use sre_domain::Cluster;

use crate::state::AppState;

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
}

/// Resolves `Authorization: Bearer <user_token>` against the in-process
/// token table and inserts [`crate::state::AuthedUser`] as a request
/// extension. Two disjoint schemes (§6) — this one never accepts a cluster
/// token, since cluster tokens are never present in `user_tokens`.
pub async fn require_user_token(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let Some(token) = bearer_token(request.headers()).map(str::to_string) else {
        return (StatusCode::UNAUTHORIZED, "missing bearer token\n").into_response();
    };

    match state.user_tokens.resolve(&token).await {
        Some(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        None => (StatusCode::UNAUTHORIZED, "invalid or expired token\n").into_response(),
    }
}

/// Resolves `Authorization: Bearer <cluster_token>` against the Cluster
/// table and inserts the resolved [`Cluster`] as a request extension.
pub async fn require_cluster_token(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let Some(token) = bearer_token(request.headers()).map(str::to_string) else {
        return (StatusCode::UNAUTHORIZED, "missing bearer token\n").into_response();
    };

    match state.repo.get_cluster_by_token(&token).await {
        Ok(Some(cluster)) => {
            request.extensions_mut().insert(cluster);
            next.run(request).await
        }
        Ok(None) => (StatusCode::UNAUTHORIZED, "invalid cluster token\n").into_response(),
        Err(err) => {
            tracing::error!(error = %err, "cluster token lookup failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal error\n").into_response()
        }
    }
}

/// Best-effort cluster resolution for `/webhook/alert`, which carries a
/// cluster bearer token to identify its target but is not behind the
/// standard auth middleware chain — the route must stay reachable by any
/// alert source, not only an authenticated dashboard user.
pub async fn resolve_webhook_cluster(state: &AppState, headers: &HeaderMap) -> Option<Cluster> {
    let token = bearer_token(headers)?;
    state.repo.get_cluster_by_token(token).await.ok().flatten()
}
