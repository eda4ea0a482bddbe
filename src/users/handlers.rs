use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::jwt::AuthUser;
use crate::auth::password::hash_password;
use crate::dto::{ItemResponse, ListResponse, MessageResponse};
use crate::error::{ApiError, ApiResult, FieldError};
use crate::state::AppState;
use crate::validation::is_valid_email;

use super::dto::{CreateUserRequest, UpdateUserRequest, UsersQuery};
use super::repo::{Role, User};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/users/:id/toggle-status", put(toggle_status))
}

fn validate_new_user(req: &CreateUserRequest) -> Result<Role, Vec<FieldError>> {
    let mut errors = Vec::new();
    if req.username.trim().len() < 3 {
        errors.push(FieldError::new(
            "username",
            "Username must be at least 3 characters",
        ));
    }
    if !is_valid_email(&req.email) {
        errors.push(FieldError::new("email", "A valid email is required"));
    }
    if req.password.len() < 6 {
        errors.push(FieldError::new(
            "password",
            "Password must be at least 6 characters",
        ));
    }
    let role = Role::parse(&req.role);
    if role.is_none() {
        errors.push(FieldError::new("role", "Invalid role"));
    }
    match role {
        Some(role) if errors.is_empty() => Ok(role),
        _ => Err(errors),
    }
}

#[instrument(skip(state, auth))]
async fn list_users(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(q): Query<UsersQuery>,
) -> ApiResult<Json<ListResponse<User>>> {
    auth.require(&[Role::Admin, Role::Ra, Role::Manager])?;

    let page = q.page.max(1);
    let limit = q.limit.clamp(1, 100);
    let items = User::list(&state.db, limit, (page - 1) * limit).await?;
    let total = User::count(&state.db).await?;

    Ok(Json(ListResponse::new(items, total, page, limit)))
}

#[instrument(skip(state, auth))]
async fn get_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ItemResponse<User>>> {
    auth.require(&[Role::Admin, Role::Ra, Role::Manager])?;

    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;
    Ok(Json(ItemResponse::new(user)))
}

#[instrument(skip(state, auth, payload))]
async fn create_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(mut payload): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<ItemResponse<User>>)> {
    auth.require(&[Role::Admin])?;

    payload.username = payload.username.trim().to_string();
    payload.email = payload.email.trim().to_lowercase();

    let role = validate_new_user(&payload).map_err(ApiError::Validation)?;

    if User::find_by_username(&state.db, &payload.username)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(
            "User with this username already exists".into(),
        ));
    }

    let hash = hash_password(&payload.password)?;
    let user = User::create(&state.db, &payload.username, &payload.email, &hash, role).await?;

    info!(user_id = %user.id, username = %user.username, "user created");
    Ok((StatusCode::CREATED, Json(ItemResponse::new(user))))
}

#[instrument(skip(state, auth, payload))]
async fn update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> ApiResult<Json<ItemResponse<User>>> {
    auth.require(&[Role::Admin])?;

    let existing = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    let mut errors = Vec::new();
    let username = match payload.username {
        Some(ref u) if u.trim().len() < 3 => {
            errors.push(FieldError::new(
                "username",
                "Username must be at least 3 characters",
            ));
            existing.username.clone()
        }
        Some(u) => u.trim().to_string(),
        None => existing.username.clone(),
    };
    let email = match payload.email {
        Some(ref e) if !is_valid_email(e) => {
            errors.push(FieldError::new("email", "A valid email is required"));
            existing.email.clone()
        }
        Some(e) => e.trim().to_lowercase(),
        None => existing.email.clone(),
    };
    let role = match payload.role.as_deref() {
        Some(r) => Role::parse(r).unwrap_or_else(|| {
            errors.push(FieldError::new("role", "Invalid role"));
            existing.role
        }),
        None => existing.role,
    };
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    if username != existing.username {
        if let Some(other) = User::find_by_username(&state.db, &username).await? {
            if other.id != id {
                return Err(ApiError::Conflict(
                    "User with this username already exists".into(),
                ));
            }
        }
    }

    let user = User::update(&state.db, id, &username, &email, role)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;
    Ok(Json(ItemResponse::new(user)))
}

#[instrument(skip(state, auth))]
async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    auth.require(&[Role::Admin])?;

    if auth.id == id {
        return Err(ApiError::Forbidden("Cannot delete your own account".into()));
    }

    if !User::delete(&state.db, id).await? {
        return Err(ApiError::not_found("User"));
    }

    info!(user_id = %id, deleted_by = %auth.id, "user deleted");
    Ok(Json(MessageResponse::new("User deleted successfully")))
}

#[instrument(skip(state, auth))]
async fn toggle_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ItemResponse<User>>> {
    auth.require(&[Role::Admin])?;

    let existing = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;
    let user = User::set_active(&state.db, id, !existing.is_active)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    info!(user_id = %id, active = user.is_active, "user status toggled");
    Ok(Json(ItemResponse::new(user)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_request() -> CreateUserRequest {
        CreateUserRequest {
            username: "jdoe".into(),
            email: "jdoe@example.com".into(),
            password: "hunter22".into(),
            role: "Viewer".into(),
        }
    }

    #[test]
    fn valid_request_yields_role() {
        assert_eq!(validate_new_user(&base_request()).unwrap(), Role::Viewer);
    }

    #[test]
    fn collects_all_violations() {
        let req = CreateUserRequest {
            username: "ab".into(),
            email: "not-an-email".into(),
            password: "short".into(),
            role: "Root".into(),
        };
        let errors = validate_new_user(&req).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["username", "email", "password", "role"]);
    }
}
