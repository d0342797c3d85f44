use axum::routing::post;
use axum::{Json, Router, extract::State};
use serde::{Deserialize, Serialize};

use crate::auth::{AuthUser, verify_password};
use crate::db::users;
use crate::error::AppError;
use crate::models::Role;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub role: Role,
    pub user_id: i64,
    pub name: String,
    pub email: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let user = users::find_auth_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

    if !verify_password(&req.password, &user.password_hash)? {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    let token = state.auth.issue(user.id, user.role, &user.email)?;

    Ok(Json(LoginResponse {
        token,
        role: user.role,
        user_id: user.id,
        name: user.name,
        email: user.email,
    }))
}

/// Exchanges a still-valid token for a fresh one.
async fn refresh(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<LoginResponse>, AppError> {
    let user = users::find_auth_by_id(&state.db, auth.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Account no longer exists".to_string()))?;

    let token = state.auth.issue(user.id, user.role, &user.email)?;

    Ok(Json(LoginResponse {
        token,
        role: user.role,
        user_id: user.id,
        name: user.name,
        email: user.email,
    }))
}
