use axum::{
    extract::{FromRef, State},
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::dto::{ItemResponse, MessageResponse};
use crate::error::{ApiError, ApiResult};
use crate::history::repo::{self as history, ActionKind, NewEntry};
use crate::state::AppState;
use crate::users::repo::User;

use super::dto::{AuthResponse, ChangePasswordRequest, LoginRequest};
use super::jwt::{AuthUser, JwtKeys};
use super::password::{hash_password, verify_password};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
        .route("/auth/password", put(change_password))
}

#[instrument(skip(state, payload))]
async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    payload.username = payload.username.trim().to_string();

    let user = User::find_by_username(&state.db, &payload.username)
        .await?
        .ok_or_else(|| {
            warn!(username = %payload.username, "login unknown username");
            ApiError::Unauthorized("Invalid credentials".into())
        })?;

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    }

    if !user.is_active {
        warn!(user_id = %user.id, "login for deactivated account");
        return Err(ApiError::Unauthorized("Account is deactivated".into()));
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id, user.role)?;

    history::record(
        &state.db,
        NewEntry::new(user.id, ActionKind::Login, "User logged in"),
    )
    .await;

    info!(user_id = %user.id, username = %user.username, "user logged in");
    Ok(Json(AuthResponse {
        success: true,
        token,
        user,
    }))
}

#[instrument(skip(state, auth))]
async fn logout(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<MessageResponse>> {
    history::record(
        &state.db,
        NewEntry::new(auth.id, ActionKind::Logout, "User logged out"),
    )
    .await;

    info!(user_id = %auth.id, "user logged out");
    Ok(Json(MessageResponse::new("Logged out successfully")))
}

#[instrument(skip(state, auth))]
async fn me(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<ItemResponse<User>>> {
    let user = User::find_by_id(&state.db, auth.id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User not found".into()))?;
    Ok(Json(ItemResponse::new(user)))
}

#[instrument(skip(state, auth, payload))]
async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    if payload.new_password.len() < 6 {
        return Err(ApiError::validation(
            "newPassword",
            "New password must be at least 6 characters",
        ));
    }

    let user = User::find_by_id(&state.db, auth.id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User not found".into()))?;

    if !verify_password(&payload.current_password, &user.password_hash)? {
        return Err(ApiError::Unauthorized(
            "Current password is incorrect".into(),
        ));
    }

    let hash = hash_password(&payload.new_password)?;
    User::set_password(&state.db, user.id, &hash).await?;

    info!(user_id = %user.id, "password changed");
    Ok(Json(MessageResponse::new("Password updated successfully")))
}
