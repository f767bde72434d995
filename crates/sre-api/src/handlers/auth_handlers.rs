use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::{AppState, AuthedUser};

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
    pub org_name: String,
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::internal(format!("failed to hash password: {e}")))
}

/// Creates an Organization and its first (Admin) User. This is the ambient
/// "verified user identity with an org ID" surface the core requires but
/// does not specify as a feature (§6).
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterBody>,
) -> Result<Json<Value>, ApiError> {
    if body.email.trim().is_empty() || body.password.len() < 8 {
        return Err(ApiError::bad_request(
            "email must be non-empty and password must be at least 8 characters",
        ));
    }

    let org = state.repo.create_organization(&body.org_name).await?;
    let hashed = hash_password(&body.password)?;
    let user = state
        .repo
        .create_user(org.id, &body.email, &hashed, body.full_name.as_deref())
        .await?;

    Ok(Json(json!({ "org_id": org.id, "user_id": user.id })))
}

#[derive(Debug, Deserialize)]
pub struct TokenBody {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Verifies credentials and issues an opaque bearer token backed by the
/// in-process [`crate::state::TokenStore`] (§6).
pub async fn token(
    State(state): State<AppState>,
    Json(body): Json<TokenBody>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = state
        .repo
        .get_user_by_email(&body.email)
        .await?
        .ok_or_else(|| ApiError::unauthorized("invalid email or password"))?;

    if !user.is_active {
        return Err(ApiError::unauthorized("account is disabled"));
    }

    let parsed = PasswordHash::new(&user.hashed_password)
        .map_err(|e| ApiError::internal(format!("corrupt password hash: {e}")))?;
    Argon2::default()
        .verify_password(body.password.as_bytes(), &parsed)
        .map_err(|_| ApiError::unauthorized("invalid email or password"))?;

    let issued = state
        .user_tokens
        .issue(AuthedUser { user_id: user.id, org_id: user.org_id, role: user.role })
        .await;

    Ok(Json(TokenResponse { token: issued }))
}
