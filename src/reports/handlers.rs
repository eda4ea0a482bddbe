use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::auth::jwt::AuthUser;
use crate::dto::MessageResponse;
use crate::error::ApiResult;
use crate::history::repo::{self as history, ActionKind, NewEntry};
use crate::state::AppState;
use crate::users::repo::Role;

use super::dto::{ExportRequest, StatsResponse, TrendsQuery, TrendsResponse};
use super::repo::{self, DepartmentStats, OverviewStats, SkillCount};

const TOP_SKILLS: usize = 10;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reports/overview", get(overview))
        .route("/reports/department", get(by_department))
        .route("/reports/skills", get(by_skill))
        .route("/reports/trends", get(trends))
        .route("/reports/export", post(export))
}

#[instrument(skip(state, _auth))]
async fn overview(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> ApiResult<Json<StatsResponse<OverviewStats>>> {
    let stats = repo::overview(&state.db).await?;
    Ok(Json(StatsResponse::new(stats)))
}

#[instrument(skip(state, _auth))]
async fn by_department(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> ApiResult<Json<StatsResponse<Vec<DepartmentStats>>>> {
    let stats = repo::by_department(&state.db).await?;
    Ok(Json(StatsResponse::new(stats)))
}

#[instrument(skip(state, _auth))]
async fn by_skill(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> ApiResult<Json<StatsResponse<Vec<SkillCount>>>> {
    let lists = repo::all_skill_lists(&state.db).await?;
    let stats = repo::top_skills(lists, TOP_SKILLS);
    Ok(Json(StatsResponse::new(stats)))
}

#[instrument(skip(state, _auth))]
async fn trends(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(q): Query<TrendsQuery>,
) -> ApiResult<Json<TrendsResponse>> {
    let months = q.months.clamp(1, 24);
    let trends = repo::trends(&state.db, months).await?;
    Ok(Json(TrendsResponse {
        success: true,
        trends,
    }))
}

/// Export is a stub by design: it records the intent in the history log and
/// produces no file.
#[instrument(skip(state, auth, payload))]
async fn export(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<ExportRequest>,
) -> ApiResult<Json<MessageResponse>> {
    auth.require(&[Role::Admin, Role::Ra, Role::Manager])?;

    history::record(
        &state.db,
        NewEntry::new(
            auth.id,
            ActionKind::Export,
            format!("Exported {} report as {}", payload.kind, payload.format),
        ),
    )
    .await;

    info!(user_id = %auth.id, format = %payload.format, kind = %payload.kind, "report export requested");
    Ok(Json(MessageResponse::new(format!(
        "Report exported as {}",
        payload.format
    ))))
}
