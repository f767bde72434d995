use std::collections::HashMap;
use std::sync::Arc;

use sre_domain::{OrgId, UserId, UserRole};
use sre_engine::{ReasoningOracle, ToolCatalogue};
use sre_store::{Repository, SessionStore};
use tokio::sync::RwLock;

/// The identity behind an opaque user bearer token, resolved by
/// [`crate::auth::require_user_token`] and carried as a request extension.
#[derive(Debug, Clone, Copy)]
pub struct AuthedUser {
    pub user_id: UserId,
    pub org_id: OrgId,
    pub role: UserRole,
}

/// Opaque-token session table backing `POST /auth/token` — the minimal
/// "verified user identity with an org ID" surface the core requires,
/// deliberately server-side state rather than a JWT so a token can be
/// revoked immediately by dropping it from the map.
#[derive(Default)]
pub struct TokenStore {
    tokens: RwLock<HashMap<String, AuthedUser>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn issue(&self, user: AuthedUser) -> String {
        let token = uuid::Uuid::new_v4().to_string();
        self.tokens.write().await.insert(token.clone(), user);
        token
    }

    pub async fn resolve(&self, token: &str) -> Option<AuthedUser> {
        self.tokens.read().await.get(token).copied()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repository>,
    pub session_store: Arc<dyn SessionStore>,
    pub oracle: Arc<dyn ReasoningOracle>,
    pub catalogue: Arc<ToolCatalogue>,
    pub user_tokens: Arc<TokenStore>,
}
