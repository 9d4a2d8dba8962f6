//! Snapshots and price history.
//!
//! Both tables are append-only and written only from
//! [`crate::properties::upsert_property`].

use crate::codec::{from_db_time, to_db_time};
use crate::error::Result;
use chrono::{DateTime, Utc};
use landscout_core::{Property, PropertyId};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, Pool, Row, Sqlite};

/// A stored copy of a listing's comparable fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Row id
    pub id: i64,
    /// Listing the snapshot belongs to
    pub property_id: PropertyId,
    /// Comparable fields at scrape time
    pub data: Property,
    /// When the listing was scraped
    pub scraped_at: DateTime<Utc>,
}

/// One recorded price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistoryEntry {
    /// Row id
    pub id: i64,
    /// Listing the price belongs to
    pub property_id: PropertyId,
    /// Asking price
    pub price: f64,
    /// When the price was recorded
    pub recorded_at: DateTime<Utc>,
}

/// Strip everything that is not compared for change detection.
fn comparable_copy(property: &Property) -> Property {
    Property {
        raw_data: None,
        score: None,
        field_completeness: None,
        first_seen: None,
        last_seen: None,
        last_checked: None,
        ..property.clone()
    }
}

pub(crate) async fn insert_snapshot<'e, E>(
    executor: E,
    property: &Property,
    scraped_at: &str,
) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    let data = serde_json::to_string(&comparable_copy(property))?;

    sqlx::query("INSERT INTO property_snapshots (property_id, data, scraped_at) VALUES (?, ?, ?)")
        .bind(property.id.as_str())
        .bind(data)
        .bind(scraped_at)
        .execute(executor)
        .await?;
    Ok(())
}

pub(crate) async fn insert_price_history<'e, E>(
    executor: E,
    property_id: &PropertyId,
    price: f64,
    recorded_at: &str,
) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("INSERT INTO price_history (property_id, price, recorded_at) VALUES (?, ?, ?)")
        .bind(property_id.as_str())
        .bind(price)
        .bind(recorded_at)
        .execute(executor)
        .await?;

    tracing::debug!(property_id = %property_id, price, "recorded price change");
    Ok(())
}

/// Snapshots of a listing, most recent first.
pub async fn snapshots_for(pool: &Pool<Sqlite>, property_id: &PropertyId) -> Result<Vec<Snapshot>> {
    let rows = sqlx::query(
        "SELECT id, property_id, data, scraped_at FROM property_snapshots \
         WHERE property_id = ? ORDER BY scraped_at DESC, id DESC",
    )
    .bind(property_id.as_str())
    .fetch_all(pool)
    .await?;

    rows.iter().map(snapshot_from_row).collect()
}

/// The latest snapshot taken at or before `at`, if any.
pub async fn snapshot_at_or_before(
    pool: &Pool<Sqlite>,
    property_id: &PropertyId,
    at: DateTime<Utc>,
) -> Result<Option<Snapshot>> {
    let row = sqlx::query(
        "SELECT id, property_id, data, scraped_at FROM property_snapshots \
         WHERE property_id = ? AND scraped_at <= ? ORDER BY scraped_at DESC, id DESC LIMIT 1",
    )
    .bind(property_id.as_str())
    .bind(to_db_time(at))
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(snapshot_from_row).transpose()
}

/// Price history of a listing, most recent first.
pub async fn price_history_for(
    pool: &Pool<Sqlite>,
    property_id: &PropertyId,
) -> Result<Vec<PriceHistoryEntry>> {
    let rows = sqlx::query(
        "SELECT id, property_id, price, recorded_at FROM price_history \
         WHERE property_id = ? ORDER BY recorded_at DESC, id DESC",
    )
    .bind(property_id.as_str())
    .fetch_all(pool)
    .await?;

    let mut entries = Vec::with_capacity(rows.len());
    for row in rows {
        let recorded_at: String = row.try_get("recorded_at")?;
        entries.push(PriceHistoryEntry {
            id: row.try_get("id")?,
            property_id: PropertyId::from_stored(row.try_get::<String, _>("property_id")?),
            price: row.try_get("price")?,
            recorded_at: from_db_time(&recorded_at)?,
        });
    }

    Ok(entries)
}

fn snapshot_from_row(row: &SqliteRow) -> Result<Snapshot> {
    let data: String = row.try_get("data")?;
    let scraped_at: String = row.try_get("scraped_at")?;

    Ok(Snapshot {
        id: row.try_get("id")?,
        property_id: PropertyId::from_stored(row.try_get::<String, _>("property_id")?),
        data: serde_json::from_str(&data)?,
        scraped_at: from_db_time(&scraped_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::upsert_property;
    use crate::Database;
    use landscout_core::RawPayload;

    async fn setup() -> Database {
        let db = Database::new(":memory:").await.expect("open database");
        db.run_migrations().await.expect("run migrations");
        db
    }

    fn listing(price: f64) -> Property {
        let mut payload = RawPayload::new();
        payload.insert("mlsNumber".to_string(), "MT-1".into());
        Property {
            price: Some(price),
            raw_data: Some(payload),
            score: Some(3.5),
            ..Property::new("landwatch", "7", "https://example.com/7", "Creek lot")
        }
    }

    #[tokio::test]
    async fn test_snapshot_holds_comparable_fields_only() {
        let db = setup().await;
        let property = listing(100_000.0);
        upsert_property(db.pool(), &property).await.expect("insert");

        let snapshots = snapshots_for(db.pool(), &property.id).await.expect("snapshots");
        assert_eq!(snapshots.len(), 1);

        let data = &snapshots[0].data;
        assert_eq!(data.price, Some(100_000.0));
        assert!(data.raw_data.is_none());
        assert!(data.score.is_none());
        assert!(data.first_seen.is_none());
        assert!(!data.differs_from(&property));
    }

    #[tokio::test]
    async fn test_history_most_recent_first() {
        let db = setup().await;
        for price in [100_000.0, 95_000.0, 90_000.0] {
            upsert_property(db.pool(), &listing(price)).await.expect("upsert");
        }
        let id = listing(0.0).id;

        let history = price_history_for(db.pool(), &id).await.expect("history");
        let prices: Vec<f64> = history.iter().map(|h| h.price).collect();
        assert_eq!(prices, vec![90_000.0, 95_000.0]);

        let snapshots = snapshots_for(db.pool(), &id).await.expect("snapshots");
        assert_eq!(snapshots.len(), 3);
        assert_eq!(snapshots[0].data.price, Some(90_000.0));
        assert_eq!(snapshots[2].data.price, Some(100_000.0));
    }

    #[tokio::test]
    async fn test_snapshot_at_or_before() {
        let db = setup().await;
        upsert_property(db.pool(), &listing(100_000.0)).await.expect("insert");
        let between = Utc::now();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        upsert_property(db.pool(), &listing(80_000.0)).await.expect("update");

        let id = listing(0.0).id;
        let before = snapshot_at_or_before(db.pool(), &id, between)
            .await
            .expect("query")
            .expect("snapshot exists");
        assert_eq!(before.data.price, Some(100_000.0));

        let too_early = between - chrono::Duration::days(1);
        assert!(snapshot_at_or_before(db.pool(), &id, too_early)
            .await
            .expect("query")
            .is_none());
    }
}
