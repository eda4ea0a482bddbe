use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::jwt::AuthUser;
use crate::dto::{ItemResponse, ListResponse, MessageResponse};
use crate::error::{ApiError, ApiResult};
use crate::history::repo::{self as history, ActionKind, NewEntry};
use crate::state::AppState;
use crate::users::repo::Role;

use super::dto::{CreateResourceRequest, CvResponse, ResourcesQuery, UpdateResourceRequest};
use super::idle;
use super::repo::{self, Department, NewResource, Resource, ResourceFilter, ResourceStatus};
use super::validate::{validate_create, validate_update};

const CV_PRESIGN_SECONDS: u64 = 600;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/resources", get(list_resources).post(create_resource))
        .route(
            "/resources/:id",
            get(get_resource).put(update_resource).delete(delete_resource),
        )
        .route(
            "/resources/:id/cv",
            post(upload_cv).get(get_cv).layer(DefaultBodyLimit::max(10 * 1024 * 1024)),
        )
}

fn parse_filter(q: &ResourcesQuery) -> ApiResult<ResourceFilter> {
    let department = match q.department.as_deref() {
        None => None,
        Some(d) => Some(
            Department::parse(d)
                .ok_or_else(|| ApiError::validation("department", "Invalid department"))?,
        ),
    };
    let status = match q.status.as_deref() {
        None => None,
        Some(s) => Some(
            ResourceStatus::parse(s)
                .ok_or_else(|| ApiError::validation("status", "Invalid status"))?,
        ),
    };
    let skills = q.skills.as_deref().map(|s| {
        s.split(',')
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
    });

    Ok(ResourceFilter {
        search: q.search.clone().filter(|s| !s.trim().is_empty()),
        department,
        status,
        skills: skills.filter(|s| !s.is_empty()),
        urgent: q.urgent == Some(true),
    })
}

#[instrument(skip(state, _auth))]
async fn list_resources(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(q): Query<ResourcesQuery>,
) -> ApiResult<Json<ListResponse<Resource>>> {
    let filter = parse_filter(&q)?;
    let page = q.page.max(1);
    let limit = q.limit.clamp(1, 100);

    let items = repo::list(&state.db, &filter, limit, (page - 1) * limit).await?;
    let total = repo::count(&state.db, &filter).await?;

    Ok(Json(ListResponse::new(items, total, page, limit)))
}

#[instrument(skip(state, _auth))]
async fn get_resource(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ItemResponse<Resource>>> {
    let resource = repo::get(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Resource"))?;
    Ok(Json(ItemResponse::new(resource)))
}

#[instrument(skip(state, auth, payload))]
async fn create_resource(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(mut payload): Json<CreateResourceRequest>,
) -> ApiResult<(StatusCode, Json<ItemResponse<Resource>>)> {
    auth.require(&[Role::Admin, Role::Ra])?;

    payload.employee_code = payload.employee_code.trim().to_string();
    payload.email = payload.email.trim().to_lowercase();

    let enums = validate_create(&payload).map_err(ApiError::Validation)?;

    if repo::find_by_code(&state.db, &payload.employee_code)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(
            "Resource with this employee code already exists".into(),
        ));
    }

    let idle = idle::derive(payload.idle_from, OffsetDateTime::now_utc());
    let new = NewResource {
        employee_code: payload.employee_code,
        name: payload.name,
        email: payload.email,
        phone: payload.phone,
        department: enums.department,
        job_title: payload.job_title,
        skills: payload.skills,
        experience: payload.experience,
        rate: payload.rate,
        status: enums.status,
        idle_from: payload.idle_from,
        notes: payload.notes,
        created_by: auth.id,
    };
    let resource = repo::insert(&state.db, &new, idle).await?;

    history::record(
        &state.db,
        NewEntry::for_resource(
            auth.id,
            ActionKind::Create,
            Some(resource.id),
            &resource.name,
            format!(
                "Created resource: {} ({})",
                resource.name, resource.employee_code
            ),
        ),
    )
    .await;

    info!(resource_id = %resource.id, code = %resource.employee_code, "resource created");
    Ok((StatusCode::CREATED, Json(ItemResponse::new(resource))))
}

#[instrument(skip(state, auth, payload))]
async fn update_resource(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateResourceRequest>,
) -> ApiResult<Json<ItemResponse<Resource>>> {
    auth.require(&[Role::Admin, Role::Ra])?;

    let mut merged = repo::get(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Resource"))?;
    let old_status = merged.status;

    let enums = validate_update(&payload).map_err(ApiError::Validation)?;

    if let Some(name) = payload.name {
        merged.name = name;
    }
    if let Some(email) = payload.email {
        merged.email = email.trim().to_lowercase();
    }
    if let Some(phone) = payload.phone {
        merged.phone = Some(phone);
    }
    if let Some(department) = enums.department {
        merged.department = department;
    }
    if let Some(job_title) = payload.job_title {
        merged.job_title = job_title;
    }
    if let Some(skills) = payload.skills {
        merged.skills = skills;
    }
    if let Some(experience) = payload.experience {
        merged.experience = experience;
    }
    if let Some(rate) = payload.rate {
        merged.rate = rate;
    }
    if let Some(status) = enums.status {
        merged.status = status;
    }
    if let Some(idle_from) = payload.idle_from {
        merged.idle_from = idle_from;
    }
    if let Some(notes) = payload.notes {
        merged.notes = Some(notes);
    }

    let idle = idle::derive(merged.idle_from, OffsetDateTime::now_utc());
    let resource = repo::update(&state.db, &merged, idle, auth.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Resource"))?;

    let changes = if old_status != resource.status {
        format!(
            "Status: {} → {}",
            old_status.as_str(),
            resource.status.as_str()
        )
    } else {
        "Updated resource details".to_string()
    };
    history::record(
        &state.db,
        NewEntry::for_resource(
            auth.id,
            ActionKind::Update,
            Some(resource.id),
            &resource.name,
            changes,
        ),
    )
    .await;

    Ok(Json(ItemResponse::new(resource)))
}

#[instrument(skip(state, auth))]
async fn delete_resource(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    auth.require(&[Role::Admin])?;

    let resource = repo::get(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Resource"))?;

    if !repo::delete(&state.db, id).await? {
        return Err(ApiError::not_found("Resource"));
    }

    // Hard delete; the log keeps only the name snapshot, no dangling id.
    history::record(
        &state.db,
        NewEntry::for_resource(
            auth.id,
            ActionKind::Delete,
            None,
            &resource.name,
            format!(
                "Deleted resource: {} ({})",
                resource.name, resource.employee_code
            ),
        ),
    )
    .await;

    info!(resource_id = %id, code = %resource.employee_code, "resource deleted");
    Ok(Json(MessageResponse::new("Resource deleted successfully")))
}

fn cv_extension(content_type: &str) -> Option<&'static str> {
    match content_type {
        "application/pdf" => Some("pdf"),
        "application/msword" => Some("doc"),
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => Some("docx"),
        _ => None,
    }
}

#[instrument(skip(state, auth, mp))]
async fn upload_cv(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    mut mp: Multipart,
) -> ApiResult<Json<CvResponse>> {
    auth.require(&[Role::Admin, Role::Ra])?;

    let resource = repo::get(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Resource"))?;

    let mut upload: Option<(Bytes, String)> = None;
    while let Ok(Some(field)) = mp.next_field().await {
        if field.name() == Some("cv") {
            let content_type = field
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "application/octet-stream".into());
            let data = field
                .bytes()
                .await
                .map_err(|e| anyhow::anyhow!("read multipart field: {e}"))?;
            upload = Some((data, content_type));
        }
    }
    let Some((data, content_type)) = upload else {
        return Err(ApiError::validation("cv", "Please upload a file"));
    };
    let ext = cv_extension(&content_type)
        .ok_or_else(|| ApiError::validation("cv", "Only PDF and Word documents are accepted"))?;

    let key = format!("cvs/{}/{}.{}", resource.id, Uuid::new_v4(), ext);
    state.files.put(&key, data, &content_type).await?;

    let idle = idle::derive(resource.idle_from, OffsetDateTime::now_utc());
    let resource = repo::set_cv(&state.db, id, &key, idle, auth.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Resource"))?;

    history::record(
        &state.db,
        NewEntry::for_resource(
            auth.id,
            ActionKind::CvUpload,
            Some(resource.id),
            &resource.name,
            format!("Uploaded CV for {}", resource.name),
        ),
    )
    .await;

    info!(resource_id = %resource.id, key = %key, "cv uploaded");
    Ok(Json(CvResponse {
        success: true,
        cv: key,
    }))
}

#[instrument(skip(state, _auth))]
async fn get_cv(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Redirect> {
    let resource = repo::get(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Resource"))?;
    let key = resource
        .cv
        .as_deref()
        .ok_or_else(|| ApiError::not_found("CV"))?;

    let url = state.files.presign_get(key, CV_PRESIGN_SECONDS).await?;
    Ok(Redirect::temporary(&url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cv_extension_accepts_documents_only() {
        assert_eq!(cv_extension("application/pdf"), Some("pdf"));
        assert_eq!(cv_extension("application/msword"), Some("doc"));
        assert_eq!(
            cv_extension(
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            ),
            Some("docx")
        );
        assert_eq!(cv_extension("image/png"), None);
        assert_eq!(cv_extension("application/octet-stream"), None);
    }

    #[test]
    fn filter_parses_query_parts() {
        let q = ResourcesQuery {
            page: 1,
            limit: 10,
            search: Some("  ".into()),
            department: Some("IT".into()),
            status: None,
            skills: Some("Go, SQL,,".into()),
            urgent: Some(true),
        };
        let filter = parse_filter(&q).expect("valid filter");
        assert!(filter.search.is_none());
        assert_eq!(filter.department, Some(Department::IT));
        assert_eq!(filter.skills, Some(vec!["Go".to_string(), "SQL".to_string()]));
        assert!(filter.urgent);
    }

    #[test]
    fn filter_rejects_unknown_department() {
        let q = ResourcesQuery {
            page: 1,
            limit: 10,
            search: None,
            department: Some("Sales".into()),
            status: None,
            skills: None,
            urgent: None,
        };
        assert!(parse_filter(&q).is_err());
    }
}
