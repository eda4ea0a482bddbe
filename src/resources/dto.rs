use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourcesQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub search: Option<String>,
    pub department: Option<String>,
    pub status: Option<String>,
    /// Comma-separated skill names; matches resources having any of them.
    pub skills: Option<String>,
    pub urgent: Option<bool>,
}

fn default_page() -> i64 {
    1
}
fn default_limit() -> i64 {
    10
}

/// Department and status arrive as plain strings so unknown values surface
/// as field-level validation errors rather than body rejections. Derived
/// idle fields are deliberately absent.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResourceRequest {
    pub employee_code: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub department: String,
    pub job_title: String,
    pub skills: Vec<String>,
    pub experience: String,
    pub rate: f64,
    pub status: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub idle_from: OffsetDateTime,
    pub notes: Option<String>,
}

/// Partial update. The employee code is immutable after creation and has no
/// field here.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResourceRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub job_title: Option<String>,
    pub skills: Option<Vec<String>>,
    pub experience: Option<String>,
    pub rate: Option<f64>,
    pub status: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub idle_from: Option<OffsetDateTime>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CvResponse {
    pub success: bool,
    pub cv: String,
}
