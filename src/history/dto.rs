use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::{ActionKind, HistoryEntry};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub action: Option<ActionKind>,
    pub user_id: Option<Uuid>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub start_date: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub end_date: Option<OffsetDateTime>,
}

fn default_page() -> i64 {
    1
}
fn default_limit() -> i64 {
    20
}

/// Unpaginated listing for a single resource's timeline.
#[derive(Debug, Serialize)]
pub struct ResourceHistoryResponse {
    pub success: bool,
    pub items: Vec<HistoryEntry>,
}
