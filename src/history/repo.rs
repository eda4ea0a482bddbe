use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use tracing::error;
use uuid::Uuid;

use crate::users::repo::Role;

/// The closed set of logged actions. No other mutation is observable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "history_action", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    Create,
    Update,
    Delete,
    CvUpload,
    Login,
    Logout,
    Export,
}

/// One immutable log row. There is no update or delete path for these
/// anywhere in the crate.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: Option<String>,
    pub user_role: Option<Role>,
    pub action: ActionKind,
    pub resource_id: Option<Uuid>,
    pub resource_name: Option<String>,
    pub changes: String,
    pub metadata: Option<serde_json::Value>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Payload for a new entry. `resource_name` is a snapshot taken at write
/// time so the log stays readable after the resource is deleted.
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub user_id: Uuid,
    pub action: ActionKind,
    pub resource_id: Option<Uuid>,
    pub resource_name: Option<String>,
    pub changes: String,
    pub metadata: Option<serde_json::Value>,
}

impl NewEntry {
    pub fn new(user_id: Uuid, action: ActionKind, changes: impl Into<String>) -> Self {
        Self {
            user_id,
            action,
            resource_id: None,
            resource_name: None,
            changes: changes.into(),
            metadata: None,
        }
    }

    pub fn for_resource(
        user_id: Uuid,
        action: ActionKind,
        resource_id: Option<Uuid>,
        resource_name: &str,
        changes: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            action,
            resource_id,
            resource_name: Some(resource_name.to_string()),
            changes: changes.into(),
            metadata: None,
        }
    }
}

pub async fn insert(db: &PgPool, entry: &NewEntry) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO history (user_id, action, resource_id, resource_name, changes, metadata)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(entry.user_id)
    .bind(entry.action)
    .bind(entry.resource_id)
    .bind(entry.resource_name.as_deref())
    .bind(&entry.changes)
    .bind(entry.metadata.as_ref())
    .execute(db)
    .await?;
    Ok(())
}

/// Best-effort append, called only after the primary write has committed.
/// A logging failure must never fail the request, so the error is logged
/// and dropped here.
pub async fn record(db: &PgPool, entry: NewEntry) {
    if let Err(e) = insert(db, &entry).await {
        error!(
            error = %e,
            action = ?entry.action,
            user_id = %entry.user_id,
            "history write failed"
        );
    }
}

#[derive(Debug, Default)]
pub struct HistoryFilter {
    pub action: Option<ActionKind>,
    pub user_id: Option<Uuid>,
    pub start_date: Option<OffsetDateTime>,
    pub end_date: Option<OffsetDateTime>,
}

const SELECT_COLUMNS: &str = r#"
    h.id, h.user_id, u.username AS username, u.role AS user_role,
    h.action, h.resource_id, h.resource_name, h.changes, h.metadata, h.created_at
"#;

fn where_clause(filter: &HistoryFilter, next_param: &mut usize) -> String {
    let mut conds = Vec::new();
    if filter.action.is_some() {
        *next_param += 1;
        conds.push(format!("h.action = ${}", next_param));
    }
    if filter.user_id.is_some() {
        *next_param += 1;
        conds.push(format!("h.user_id = ${}", next_param));
    }
    if filter.start_date.is_some() {
        *next_param += 1;
        conds.push(format!("h.created_at >= ${}", next_param));
    }
    if filter.end_date.is_some() {
        *next_param += 1;
        conds.push(format!("h.created_at <= ${}", next_param));
    }
    if conds.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conds.join(" AND "))
    }
}

pub async fn list(
    db: &PgPool,
    filter: &HistoryFilter,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<HistoryEntry>> {
    let mut n = 0;
    let where_sql = where_clause(filter, &mut n);
    let sql = format!(
        r#"
        SELECT {SELECT_COLUMNS}
        FROM history h
        LEFT JOIN users u ON u.id = h.user_id
        {where_sql}
        ORDER BY h.created_at DESC
        LIMIT ${} OFFSET ${}
        "#,
        n + 1,
        n + 2
    );

    let mut q = sqlx::query_as::<_, HistoryEntry>(&sql);
    if let Some(action) = filter.action {
        q = q.bind(action);
    }
    if let Some(user_id) = filter.user_id {
        q = q.bind(user_id);
    }
    if let Some(start) = filter.start_date {
        q = q.bind(start);
    }
    if let Some(end) = filter.end_date {
        q = q.bind(end);
    }
    let rows = q.bind(limit).bind(offset).fetch_all(db).await?;
    Ok(rows)
}

pub async fn count(db: &PgPool, filter: &HistoryFilter) -> anyhow::Result<i64> {
    let mut n = 0;
    let where_sql = where_clause(filter, &mut n);
    let sql = format!("SELECT COUNT(*) FROM history h {where_sql}");

    let mut q = sqlx::query_scalar::<_, i64>(&sql);
    if let Some(action) = filter.action {
        q = q.bind(action);
    }
    if let Some(user_id) = filter.user_id {
        q = q.bind(user_id);
    }
    if let Some(start) = filter.start_date {
        q = q.bind(start);
    }
    if let Some(end) = filter.end_date {
        q = q.bind(end);
    }
    let total = q.fetch_one(db).await?;
    Ok(total)
}

pub async fn list_by_resource(
    db: &PgPool,
    resource_id: Uuid,
) -> anyhow::Result<Vec<HistoryEntry>> {
    let sql = format!(
        r#"
        SELECT {SELECT_COLUMNS}
        FROM history h
        LEFT JOIN users u ON u.id = h.user_id
        WHERE h.resource_id = $1
        ORDER BY h.created_at DESC
        "#
    );
    let rows = sqlx::query_as::<_, HistoryEntry>(&sql)
        .bind(resource_id)
        .fetch_all(db)
        .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_kind_uses_wire_names() {
        assert_eq!(
            serde_json::to_string(&ActionKind::CvUpload).unwrap(),
            "\"CV_UPLOAD\""
        );
        assert_eq!(
            serde_json::to_string(&ActionKind::Create).unwrap(),
            "\"CREATE\""
        );
        let parsed: ActionKind = serde_json::from_str("\"LOGOUT\"").unwrap();
        assert_eq!(parsed, ActionKind::Logout);
    }

    #[test]
    fn where_clause_numbers_params_in_bind_order() {
        let mut n = 0;
        let filter = HistoryFilter {
            action: Some(ActionKind::Update),
            user_id: Some(Uuid::new_v4()),
            start_date: None,
            end_date: Some(OffsetDateTime::now_utc()),
        };
        let sql = where_clause(&filter, &mut n);
        assert_eq!(n, 3);
        assert_eq!(
            sql,
            "WHERE h.action = $1 AND h.user_id = $2 AND h.created_at <= $3"
        );
    }

    #[test]
    fn empty_filter_has_no_where() {
        let mut n = 0;
        assert_eq!(where_clause(&HistoryFilter::default(), &mut n), "");
        assert_eq!(n, 0);
    }
}
