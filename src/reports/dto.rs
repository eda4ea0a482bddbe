use serde::{Deserialize, Serialize};

use super::repo::TrendPoint;

#[derive(Debug, Serialize)]
pub struct StatsResponse<T> {
    pub success: bool,
    pub stats: T,
}

impl<T> StatsResponse<T> {
    pub fn new(stats: T) -> Self {
        Self {
            success: true,
            stats,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TrendsResponse {
    pub success: bool,
    pub trends: Vec<TrendPoint>,
}

#[derive(Debug, Deserialize)]
pub struct TrendsQuery {
    #[serde(default = "default_months")]
    pub months: i64,
}

fn default_months() -> i64 {
    6
}

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub format: String,
    #[serde(rename = "type")]
    pub kind: String,
}
