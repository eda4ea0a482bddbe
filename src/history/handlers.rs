use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::auth::jwt::AuthUser;
use crate::dto::ListResponse;
use crate::error::ApiResult;
use crate::state::AppState;
use crate::users::repo::Role;

use super::dto::{HistoryQuery, ResourceHistoryResponse};
use super::repo::{self, HistoryEntry, HistoryFilter};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/history", get(list_history))
        .route("/history/resource/:id", get(resource_history))
}

#[instrument(skip(state, auth))]
async fn list_history(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(q): Query<HistoryQuery>,
) -> ApiResult<Json<ListResponse<HistoryEntry>>> {
    auth.require(&[Role::Admin, Role::Ra, Role::Manager])?;

    let page = q.page.max(1);
    let limit = q.limit.clamp(1, 100);
    let filter = HistoryFilter {
        action: q.action,
        user_id: q.user_id,
        start_date: q.start_date,
        end_date: q.end_date,
    };

    let items = repo::list(&state.db, &filter, limit, (page - 1) * limit).await?;
    let total = repo::count(&state.db, &filter).await?;

    Ok(Json(ListResponse::new(items, total, page, limit)))
}

#[instrument(skip(state, _auth))]
async fn resource_history(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ResourceHistoryResponse>> {
    let items = repo::list_by_resource(&state.db, id).await?;
    Ok(Json(ResourceHistoryResponse {
        success: true,
        items,
    }))
}
