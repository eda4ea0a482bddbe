use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::idle::IdleFields;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "department")]
pub enum Department {
    IT,
    QA,
    BA,
    HR,
    Design,
    DevOps,
}

impl Department {
    pub fn parse(s: &str) -> Option<Department> {
        match s {
            "IT" => Some(Department::IT),
            "QA" => Some(Department::QA),
            "BA" => Some(Department::BA),
            "HR" => Some(Department::HR),
            "Design" => Some(Department::Design),
            "DevOps" => Some(Department::DevOps),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "resource_status")]
pub enum ResourceStatus {
    Available,
    Assigned,
    #[sqlx(rename = "On Hold")]
    #[serde(rename = "On Hold")]
    OnHold,
}

impl ResourceStatus {
    pub fn parse(s: &str) -> Option<ResourceStatus> {
        match s {
            "Available" => Some(ResourceStatus::Available),
            "Assigned" => Some(ResourceStatus::Assigned),
            "On Hold" => Some(ResourceStatus::OnHold),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceStatus::Available => "Available",
            ResourceStatus::Assigned => "Assigned",
            ResourceStatus::OnHold => "On Hold",
        }
    }
}

/// One tracked person on the bench. `idle_duration` and `is_urgent` are
/// recomputed from `idle_from` on every write and never accepted from
/// callers.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: Uuid,
    pub employee_code: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub department: Department,
    pub job_title: String,
    pub skills: Vec<String>,
    pub experience: String,
    pub rate: f64,
    pub status: ResourceStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub idle_from: OffsetDateTime,
    pub idle_duration: i32,
    pub is_urgent: bool,
    pub cv: Option<String>,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Default)]
pub struct ResourceFilter {
    pub search: Option<String>,
    pub department: Option<Department>,
    pub status: Option<ResourceStatus>,
    pub skills: Option<Vec<String>>,
    pub urgent: bool,
}

#[derive(Debug)]
pub struct NewResource {
    pub employee_code: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub department: Department,
    pub job_title: String,
    pub skills: Vec<String>,
    pub experience: String,
    pub rate: f64,
    pub status: ResourceStatus,
    pub idle_from: OffsetDateTime,
    pub notes: Option<String>,
    pub created_by: Uuid,
}

const COLUMNS: &str = r#"
    id, employee_code, name, email, phone, department, job_title, skills,
    experience, rate, status, idle_from, idle_duration, is_urgent, cv, notes,
    created_by, updated_by, created_at, updated_at
"#;

fn where_clause(filter: &ResourceFilter, next_param: &mut usize) -> String {
    let mut conds = Vec::new();
    if filter.search.is_some() {
        *next_param += 1;
        conds.push(format!(
            "(name ILIKE ${n} OR employee_code ILIKE ${n} OR email ILIKE ${n})",
            n = next_param
        ));
    }
    if filter.department.is_some() {
        *next_param += 1;
        conds.push(format!("department = ${}", next_param));
    }
    if filter.status.is_some() {
        *next_param += 1;
        conds.push(format!("status = ${}", next_param));
    }
    if filter.skills.is_some() {
        *next_param += 1;
        conds.push(format!("skills && ${}", next_param));
    }
    if filter.urgent {
        conds.push("is_urgent = TRUE".to_string());
    }
    if conds.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conds.join(" AND "))
    }
}

fn like_pattern(search: &str) -> String {
    format!("%{}%", search)
}

pub async fn list(
    db: &PgPool,
    filter: &ResourceFilter,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<Resource>> {
    let mut n = 0;
    let where_sql = where_clause(filter, &mut n);
    let sql = format!(
        r#"
        SELECT {COLUMNS}
        FROM resources
        {where_sql}
        ORDER BY created_at DESC
        LIMIT ${} OFFSET ${}
        "#,
        n + 1,
        n + 2
    );

    let mut q = sqlx::query_as::<_, Resource>(&sql);
    if let Some(ref search) = filter.search {
        q = q.bind(like_pattern(search));
    }
    if let Some(department) = filter.department {
        q = q.bind(department);
    }
    if let Some(status) = filter.status {
        q = q.bind(status);
    }
    if let Some(ref skills) = filter.skills {
        q = q.bind(skills);
    }
    let rows = q.bind(limit).bind(offset).fetch_all(db).await?;
    Ok(rows)
}

pub async fn count(db: &PgPool, filter: &ResourceFilter) -> anyhow::Result<i64> {
    let mut n = 0;
    let where_sql = where_clause(filter, &mut n);
    let sql = format!("SELECT COUNT(*) FROM resources {where_sql}");

    let mut q = sqlx::query_scalar::<_, i64>(&sql);
    if let Some(ref search) = filter.search {
        q = q.bind(like_pattern(search));
    }
    if let Some(department) = filter.department {
        q = q.bind(department);
    }
    if let Some(status) = filter.status {
        q = q.bind(status);
    }
    if let Some(ref skills) = filter.skills {
        q = q.bind(skills);
    }
    let total = q.fetch_one(db).await?;
    Ok(total)
}

pub async fn get(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Resource>> {
    let row = sqlx::query_as::<_, Resource>(&format!(
        "SELECT {COLUMNS} FROM resources WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn find_by_code(db: &PgPool, employee_code: &str) -> anyhow::Result<Option<Resource>> {
    let row = sqlx::query_as::<_, Resource>(&format!(
        "SELECT {COLUMNS} FROM resources WHERE employee_code = $1"
    ))
    .bind(employee_code)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn insert(
    db: &PgPool,
    new: &NewResource,
    idle: IdleFields,
) -> anyhow::Result<Resource> {
    let row = sqlx::query_as::<_, Resource>(&format!(
        r#"
        INSERT INTO resources
            (employee_code, name, email, phone, department, job_title, skills,
             experience, rate, status, idle_from, idle_duration, is_urgent,
             notes, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(&new.employee_code)
    .bind(&new.name)
    .bind(&new.email)
    .bind(new.phone.as_deref())
    .bind(new.department)
    .bind(&new.job_title)
    .bind(&new.skills)
    .bind(&new.experience)
    .bind(new.rate)
    .bind(new.status)
    .bind(new.idle_from)
    .bind(idle.duration_months)
    .bind(idle.is_urgent)
    .bind(new.notes.as_deref())
    .bind(new.created_by)
    .fetch_one(db)
    .await?;
    Ok(row)
}

/// Persists a merged row. The caller re-derives the idle fields before
/// calling; the employee code is never touched.
pub async fn update(
    db: &PgPool,
    merged: &Resource,
    idle: IdleFields,
    updated_by: Uuid,
) -> anyhow::Result<Option<Resource>> {
    let row = sqlx::query_as::<_, Resource>(&format!(
        r#"
        UPDATE resources
        SET name = $2, email = $3, phone = $4, department = $5, job_title = $6,
            skills = $7, experience = $8, rate = $9, status = $10,
            idle_from = $11, idle_duration = $12, is_urgent = $13, notes = $14,
            updated_by = $15, updated_at = now()
        WHERE id = $1
        RETURNING {COLUMNS}
        "#
    ))
    .bind(merged.id)
    .bind(&merged.name)
    .bind(&merged.email)
    .bind(merged.phone.as_deref())
    .bind(merged.department)
    .bind(&merged.job_title)
    .bind(&merged.skills)
    .bind(&merged.experience)
    .bind(merged.rate)
    .bind(merged.status)
    .bind(merged.idle_from)
    .bind(idle.duration_months)
    .bind(idle.is_urgent)
    .bind(merged.notes.as_deref())
    .bind(updated_by)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM resources WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Attaching a CV is a save, so the idle fields are re-derived here too.
pub async fn set_cv(
    db: &PgPool,
    id: Uuid,
    cv_key: &str,
    idle: IdleFields,
    updated_by: Uuid,
) -> anyhow::Result<Option<Resource>> {
    let row = sqlx::query_as::<_, Resource>(&format!(
        r#"
        UPDATE resources
        SET cv = $2, idle_duration = $3, is_urgent = $4, updated_by = $5,
            updated_at = now()
        WHERE id = $1
        RETURNING {COLUMNS}
        "#
    ))
    .bind(id)
    .bind(cv_key)
    .bind(idle.duration_months)
    .bind(idle.is_urgent)
    .bind(updated_by)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_wire_names_include_the_space() {
        assert_eq!(
            serde_json::to_string(&ResourceStatus::OnHold).unwrap(),
            "\"On Hold\""
        );
        assert_eq!(ResourceStatus::parse("On Hold"), Some(ResourceStatus::OnHold));
        assert_eq!(ResourceStatus::parse("OnHold"), None);
        assert_eq!(ResourceStatus::OnHold.as_str(), "On Hold");
    }

    #[test]
    fn department_parses_exact_names_only() {
        assert_eq!(Department::parse("DevOps"), Some(Department::DevOps));
        assert_eq!(Department::parse("devops"), None);
        assert_eq!(Department::parse("Sales"), None);
    }

    #[test]
    fn search_reuses_one_placeholder_across_columns() {
        let mut n = 0;
        let filter = ResourceFilter {
            search: Some("jane".into()),
            urgent: true,
            ..Default::default()
        };
        let sql = where_clause(&filter, &mut n);
        assert_eq!(n, 1);
        assert_eq!(
            sql,
            "WHERE (name ILIKE $1 OR employee_code ILIKE $1 OR email ILIKE $1) AND is_urgent = TRUE"
        );
    }

    #[test]
    fn combined_filters_number_params_in_bind_order() {
        let mut n = 0;
        let filter = ResourceFilter {
            search: None,
            department: Some(Department::IT),
            status: Some(ResourceStatus::Available),
            skills: Some(vec!["Go".into()]),
            urgent: false,
        };
        let sql = where_clause(&filter, &mut n);
        assert_eq!(n, 3);
        assert_eq!(
            sql,
            "WHERE department = $1 AND status = $2 AND skills && $3"
        );
    }
}
