use std::collections::HashMap;

use serde::Serialize;
use sqlx::{FromRow, PgPool};

use crate::resources::repo::Department;

#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OverviewStats {
    pub total_idle: i64,
    pub urgent: i64,
    pub available: i64,
    pub assigned: i64,
    pub avg_idle_duration: f64,
}

pub async fn overview(db: &PgPool) -> anyhow::Result<OverviewStats> {
    let stats = sqlx::query_as::<_, OverviewStats>(
        r#"
        SELECT COUNT(*) AS total_idle,
               COUNT(*) FILTER (WHERE is_urgent) AS urgent,
               COUNT(*) FILTER (WHERE status = 'Available') AS available,
               COUNT(*) FILTER (WHERE status = 'Assigned') AS assigned,
               ROUND(COALESCE(AVG(idle_duration), 0)::numeric, 1)::float8 AS avg_idle_duration
        FROM resources
        "#,
    )
    .fetch_one(db)
    .await?;
    Ok(stats)
}

#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentStats {
    pub name: Department,
    pub count: i64,
    pub available: i64,
    pub urgent: i64,
    pub avg_duration: f64,
}

pub async fn by_department(db: &PgPool) -> anyhow::Result<Vec<DepartmentStats>> {
    let stats = sqlx::query_as::<_, DepartmentStats>(
        r#"
        SELECT department AS name,
               COUNT(*) AS count,
               COUNT(*) FILTER (WHERE status = 'Available') AS available,
               COUNT(*) FILTER (WHERE is_urgent) AS urgent,
               ROUND(COALESCE(AVG(idle_duration), 0)::numeric, 1)::float8 AS avg_duration
        FROM resources
        GROUP BY department
        ORDER BY count DESC
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(stats)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillCount {
    pub name: String,
    pub count: i64,
}

/// Skill lists of all resources in creation order, for in-process counting.
pub async fn all_skill_lists(db: &PgPool) -> anyhow::Result<Vec<Vec<String>>> {
    let lists = sqlx::query_scalar::<_, Vec<String>>(
        "SELECT skills FROM resources ORDER BY created_at ASC",
    )
    .fetch_all(db)
    .await?;
    Ok(lists)
}

/// Flattens skill lists into per-skill counts, descending; the sort is
/// stable so ties keep first-encountered order. Counted in application code
/// because a GROUP BY would not preserve that tie order.
pub fn top_skills(skill_lists: Vec<Vec<String>>, limit: usize) -> Vec<SkillCount> {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, i64> = HashMap::new();
    for skills in skill_lists {
        for skill in skills {
            if !counts.contains_key(&skill) {
                order.push(skill.clone());
            }
            *counts.entry(skill).or_insert(0) += 1;
        }
    }

    let mut out: Vec<SkillCount> = order
        .into_iter()
        .map(|name| {
            let count = counts[&name];
            SkillCount { name, count }
        })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count));
    out.truncate(limit);
    out
}

#[derive(Debug, Serialize, FromRow)]
pub struct TrendPoint {
    pub year: i32,
    pub month: i32,
    pub idle: i64,
    pub assigned: i64,
}

/// Creation counts bucketed by (year, month): the N most recent buckets,
/// returned in chronological order.
pub async fn trends(db: &PgPool, months: i64) -> anyhow::Result<Vec<TrendPoint>> {
    let points = sqlx::query_as::<_, TrendPoint>(
        r#"
        SELECT year, month, idle, assigned
        FROM (
            SELECT EXTRACT(YEAR FROM created_at)::int4 AS year,
                   EXTRACT(MONTH FROM created_at)::int4 AS month,
                   COUNT(*) AS idle,
                   COUNT(*) FILTER (WHERE status = 'Assigned') AS assigned
            FROM resources
            GROUP BY 1, 2
            ORDER BY year DESC, month DESC
            LIMIT $1
        ) buckets
        ORDER BY year ASC, month ASC
        "#,
    )
    .bind(months)
    .fetch_all(db)
    .await?;
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lists(input: &[&[&str]]) -> Vec<Vec<String>> {
        input
            .iter()
            .map(|l| l.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn counts_across_lists_with_ties_in_first_seen_order() {
        let top = top_skills(lists(&[&["Go", "SQL"], &["Go"], &["SQL", "Go"]]), 10);
        assert_eq!(
            top,
            vec![
                SkillCount {
                    name: "Go".into(),
                    count: 3
                },
                SkillCount {
                    name: "SQL".into(),
                    count: 2
                },
            ]
        );
    }

    #[test]
    fn ties_keep_first_encountered_order() {
        let top = top_skills(lists(&[&["Rust", "Kafka"], &["Kafka", "Rust"]]), 10);
        let names: Vec<_> = top.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Rust", "Kafka"]);
    }

    #[test]
    fn truncates_to_limit() {
        let many: Vec<Vec<String>> = (0..15).map(|i| vec![format!("skill-{i}")]).collect();
        let top = top_skills(many, 10);
        assert_eq!(top.len(), 10);
        assert_eq!(top[0].name, "skill-0");
    }

    #[test]
    fn empty_input_is_empty() {
        assert!(top_skills(Vec::new(), 10).is_empty());
    }
}
