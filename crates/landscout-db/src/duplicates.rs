//! Duplicate link storage.
//!
//! Links are directed edges `duplicate -> canonical`, unique per matcher.
//! Re-asserting an edge, or asserting its reverse for the same matcher, is a
//! silent no-op.

use crate::codec::{from_db_time, to_db_time};
use crate::error::Result;
use chrono::{DateTime, Utc};
use landscout_core::PropertyId;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Row, Sqlite};

/// A stored duplicate edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDuplicate {
    /// Listing kept as canonical
    pub canonical_id: PropertyId,
    /// Listing that duplicates it
    pub duplicate_id: PropertyId,
    /// Name of the matcher that asserted the edge
    pub match_method: String,
    /// Matcher confidence in `[0, 1]`
    pub confidence: f64,
    /// When the edge was first asserted
    pub detected_at: DateTime<Utc>,
}

/// Link each of `duplicate_ids` to `canonical_id`.
///
/// Self-links are skipped. Returns the number of edges actually written.
pub async fn link_duplicates(
    pool: &Pool<Sqlite>,
    canonical_id: &PropertyId,
    duplicate_ids: &[PropertyId],
    method: &str,
    confidence: f64,
) -> Result<u64> {
    let detected_at = to_db_time(Utc::now());
    let mut written = 0;

    for duplicate_id in duplicate_ids {
        if duplicate_id == canonical_id {
            tracing::debug!(property_id = %canonical_id, "skipping self duplicate link");
            continue;
        }

        let result = sqlx::query(
            "INSERT OR IGNORE INTO property_duplicates \
             (canonical_id, duplicate_id, match_method, confidence, detected_at) \
             SELECT ?1, ?2, ?3, ?4, ?5 WHERE NOT EXISTS ( \
                 SELECT 1 FROM property_duplicates \
                 WHERE canonical_id = ?2 AND duplicate_id = ?1 AND match_method = ?3)",
        )
        .bind(canonical_id.as_str())
        .bind(duplicate_id.as_str())
        .bind(method)
        .bind(confidence)
        .bind(&detected_at)
        .execute(pool)
        .await?;

        written += result.rows_affected();
    }

    if written > 0 {
        tracing::info!(
            canonical_id = %canonical_id,
            method,
            written,
            "linked duplicates"
        );
    }
    Ok(written)
}

/// Every edge touching `property_id`, oldest first.
pub async fn duplicates_for(
    pool: &Pool<Sqlite>,
    property_id: &PropertyId,
) -> Result<Vec<StoredDuplicate>> {
    let rows = sqlx::query(
        "SELECT canonical_id, duplicate_id, match_method, confidence, detected_at \
         FROM property_duplicates WHERE canonical_id = ?1 OR duplicate_id = ?1 \
         ORDER BY detected_at, id",
    )
    .bind(property_id.as_str())
    .fetch_all(pool)
    .await?;

    let mut links = Vec::with_capacity(rows.len());
    for row in rows {
        let detected_at: String = row.try_get("detected_at")?;
        links.push(StoredDuplicate {
            canonical_id: PropertyId::from_stored(row.try_get::<String, _>("canonical_id")?),
            duplicate_id: PropertyId::from_stored(row.try_get::<String, _>("duplicate_id")?),
            match_method: row.try_get("match_method")?,
            confidence: row.try_get("confidence")?,
            detected_at: from_db_time(&detected_at)?,
        });
    }

    Ok(links)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::upsert_property;
    use crate::Database;
    use landscout_core::Property;

    async fn setup() -> (Database, PropertyId, PropertyId) {
        let db = Database::new(":memory:").await.expect("open database");
        db.run_migrations().await.expect("run migrations");

        let a = Property::new("landwatch", "1", "https://a.test/1", "A");
        let b = Property::new("lands-of-america", "9", "https://b.test/9", "B");
        upsert_property(db.pool(), &a).await.expect("insert a");
        upsert_property(db.pool(), &b).await.expect("insert b");
        (db, a.id, b.id)
    }

    #[tokio::test]
    async fn test_link_is_idempotent() {
        let (db, a, b) = setup().await;

        let first = link_duplicates(db.pool(), &a, &[b.clone()], "mls-matcher", 1.0)
            .await
            .expect("link");
        let again = link_duplicates(db.pool(), &a, &[b.clone()], "mls-matcher", 1.0)
            .await
            .expect("relink");
        assert_eq!(first, 1);
        assert_eq!(again, 0);

        let links = duplicates_for(db.pool(), &b).await.expect("query");
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].canonical_id, a);
        assert_eq!(links[0].duplicate_id, b);
    }

    #[tokio::test]
    async fn test_reverse_edge_not_stored_twice() {
        let (db, a, b) = setup().await;
        link_duplicates(db.pool(), &a, &[b.clone()], "coordinate-matcher", 0.9)
            .await
            .expect("link");
        let reverse = link_duplicates(db.pool(), &b, &[a.clone()], "coordinate-matcher", 0.9)
            .await
            .expect("reverse link");
        assert_eq!(reverse, 0);
    }

    #[tokio::test]
    async fn test_methods_link_independently() {
        let (db, a, b) = setup().await;
        link_duplicates(db.pool(), &a, &[b.clone()], "mls-matcher", 1.0)
            .await
            .expect("link");
        link_duplicates(db.pool(), &a, &[b.clone()], "coordinate-matcher", 0.7)
            .await
            .expect("link");

        let links = duplicates_for(db.pool(), &a).await.expect("query");
        assert_eq!(links.len(), 2);
    }

    #[tokio::test]
    async fn test_self_link_skipped() {
        let (db, a, _) = setup().await;
        let written = link_duplicates(db.pool(), &a, &[a.clone()], "mls-matcher", 1.0)
            .await
            .expect("link");
        assert_eq!(written, 0);
        assert!(duplicates_for(db.pool(), &a).await.unwrap().is_empty());
    }
}
