//! Search run audit records.

use crate::codec::{from_db_time, to_db_time};
use crate::error::{DatabaseError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};
use std::collections::BTreeMap;

/// One orchestrated search, as recorded at its end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRun {
    /// Row id; `None` until recorded
    pub id: Option<i64>,
    /// Profile the run searched with
    pub profile_name: String,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run finished
    pub completed_at: DateTime<Utc>,
    /// Records yielded across all sources
    pub properties_found: u64,
    /// Sources attempted
    pub sources_used: Vec<String>,
    /// Supported filter names per source
    pub filters_applied: BTreeMap<String, Vec<String>>,
    /// The search criteria used
    pub criteria: serde_json::Value,
    /// Accumulated error messages
    pub errors: Vec<String>,
}

/// Write an audit record and return its id.
pub async fn record_run(pool: &Pool<Sqlite>, run: &SearchRun) -> Result<i64> {
    let properties_found = i64::try_from(run.properties_found).map_err(|_| {
        DatabaseError::Decode(format!("properties_found out of range: {}", run.properties_found))
    })?;

    let result = sqlx::query(
        "INSERT INTO search_runs (profile_name, started_at, completed_at, properties_found, \
         sources_used, filters_applied, criteria, errors) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&run.profile_name)
    .bind(to_db_time(run.started_at))
    .bind(to_db_time(run.completed_at))
    .bind(properties_found)
    .bind(serde_json::to_string(&run.sources_used)?)
    .bind(serde_json::to_string(&run.filters_applied)?)
    .bind(serde_json::to_string(&run.criteria)?)
    .bind(serde_json::to_string(&run.errors)?)
    .execute(pool)
    .await?;

    let id = result.last_insert_rowid();
    tracing::info!(
        run_id = id,
        profile = %run.profile_name,
        properties_found = run.properties_found,
        errors = run.errors.len(),
        "recorded search run"
    );
    Ok(id)
}

/// Completion time of the latest recorded run, optionally for one profile.
pub async fn last_run_timestamp(
    pool: &Pool<Sqlite>,
    profile_name: Option<&str>,
) -> Result<Option<DateTime<Utc>>> {
    let latest: Option<String> = match profile_name {
        Some(profile) => {
            sqlx::query_scalar("SELECT MAX(completed_at) FROM search_runs WHERE profile_name = ?")
                .bind(profile)
                .fetch_one(pool)
                .await?
        }
        None => {
            sqlx::query_scalar("SELECT MAX(completed_at) FROM search_runs")
                .fetch_one(pool)
                .await?
        }
    };

    latest.as_deref().map(from_db_time).transpose()
}

/// Recorded runs, most recent first.
pub async fn list_search_runs(
    pool: &Pool<Sqlite>,
    profile_name: Option<&str>,
    limit: u32,
) -> Result<Vec<SearchRun>> {
    const COLUMNS: &str = "id, profile_name, started_at, completed_at, properties_found, \
                           sources_used, filters_applied, criteria, errors";

    let rows = match profile_name {
        Some(profile) => {
            sqlx::query(&format!(
                "SELECT {COLUMNS} FROM search_runs WHERE profile_name = ? \
                 ORDER BY completed_at DESC, id DESC LIMIT ?"
            ))
            .bind(profile)
            .bind(i64::from(limit))
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query(&format!(
                "SELECT {COLUMNS} FROM search_runs ORDER BY completed_at DESC, id DESC LIMIT ?"
            ))
            .bind(i64::from(limit))
            .fetch_all(pool)
            .await?
        }
    };

    rows.iter().map(run_from_row).collect()
}

fn run_from_row(row: &SqliteRow) -> Result<SearchRun> {
    let started_at: String = row.try_get("started_at")?;
    let completed_at: String = row.try_get("completed_at")?;
    let properties_found: i64 = row.try_get("properties_found")?;
    let sources_used: String = row.try_get("sources_used")?;
    let filters_applied: String = row.try_get("filters_applied")?;
    let criteria: String = row.try_get("criteria")?;
    let errors: String = row.try_get("errors")?;

    Ok(SearchRun {
        id: Some(row.try_get("id")?),
        profile_name: row.try_get("profile_name")?,
        started_at: from_db_time(&started_at)?,
        completed_at: from_db_time(&completed_at)?,
        properties_found: u64::try_from(properties_found).map_err(|_| {
            DatabaseError::Decode(format!("negative properties_found {properties_found}"))
        })?,
        sources_used: serde_json::from_str(&sources_used)?,
        filters_applied: serde_json::from_str(&filters_applied)?,
        criteria: serde_json::from_str(&criteria)?,
        errors: serde_json::from_str(&errors)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use chrono::{Duration, SubsecRound};

    async fn setup() -> Database {
        let db = Database::new(":memory:").await.expect("open database");
        db.run_migrations().await.expect("run migrations");
        db
    }

    fn run(profile: &str, completed_at: DateTime<Utc>) -> SearchRun {
        // Stored precision is microseconds.
        let completed_at = completed_at.trunc_subsecs(6);
        let mut filters = BTreeMap::new();
        filters.insert(
            "landwatch".to_string(),
            vec!["states".to_string(), "priceRange".to_string()],
        );
        SearchRun {
            id: None,
            profile_name: profile.to_string(),
            started_at: completed_at - Duration::seconds(30),
            completed_at,
            properties_found: 12,
            sources_used: vec!["landwatch".to_string()],
            filters_applied: filters,
            criteria: serde_json::json!({ "minAcres": 20.0, "states": ["MT"] }),
            errors: vec!["Error searching landsofamerica: timeout".to_string()],
        }
    }

    #[tokio::test]
    async fn test_record_and_list() {
        let db = setup().await;
        let recorded = run("montana", Utc::now());
        let id = record_run(db.pool(), &recorded).await.expect("record");

        let runs = list_search_runs(db.pool(), Some("montana"), 10)
            .await
            .expect("list");
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].id, Some(id));
        assert_eq!(runs[0].properties_found, 12);
        assert_eq!(runs[0].filters_applied, recorded.filters_applied);
        assert_eq!(runs[0].criteria, recorded.criteria);
        assert_eq!(runs[0].errors, recorded.errors);
        assert_eq!(runs[0].completed_at, recorded.completed_at);
    }

    #[tokio::test]
    async fn test_last_run_timestamp_scoped_by_profile() {
        let db = setup().await;
        assert!(last_run_timestamp(db.pool(), None).await.unwrap().is_none());

        let now = Utc::now();
        let older = now - Duration::hours(2);
        record_run(db.pool(), &run("montana", older)).await.expect("record");
        record_run(db.pool(), &run("idaho", now)).await.expect("record");

        let montana = last_run_timestamp(db.pool(), Some("montana"))
            .await
            .expect("query")
            .expect("montana run");
        assert_eq!(montana, run("montana", older).completed_at);

        let any = last_run_timestamp(db.pool(), None)
            .await
            .expect("query")
            .expect("any run");
        assert_eq!(any, run("idaho", now).completed_at);

        assert!(last_run_timestamp(db.pool(), Some("oregon"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_list_most_recent_first_with_limit() {
        let db = setup().await;
        let now = Utc::now();
        for hours in [3, 1, 2] {
            record_run(db.pool(), &run("montana", now - Duration::hours(hours)))
                .await
                .expect("record");
        }

        let runs = list_search_runs(db.pool(), None, 2).await.expect("list");
        assert_eq!(runs.len(), 2);
        assert!(runs[0].completed_at > runs[1].completed_at);
        assert_eq!(runs[0].completed_at, run("m", now - Duration::hours(1)).completed_at);
    }
}
