//! Landscout Database Layer
//!
//! The listing repository: a `SQLite` store, accessed through `SQLx`, that maps
//! each listing id to its current state, its snapshot and price history, its
//! duplicate links, and the audit trail of search runs.
//!
//! # Architecture
//!
//! - **Change detection**: `upsert` separates changed listings from listings
//!   that were merely seen again
//! - **Migrations**: SQL migrations are embedded and versioned using `SQLx`
//! - **Connection Pooling**: WAL-mode file pools; in-memory databases use a
//!   single connection
//!
//! # Example
//!
//! ```ignore
//! use landscout_db::Database;
//!
//! let db = Database::new("landscout.db").await?;
//! db.run_migrations().await?;
//! let outcome = db.upsert(&property).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod codec;
pub mod connection;
pub mod duplicates;
pub mod error;
pub mod history;
pub mod migrations;
pub mod properties;
pub mod search_runs;

// Re-export commonly used types
pub use duplicates::StoredDuplicate;
pub use error::{DatabaseError, Result};
pub use history::{PriceHistoryEntry, Snapshot};
pub use properties::{PropertyFilters, UpsertOutcome};
pub use search_runs::SearchRun;

use chrono::{DateTime, Utc};
use landscout_core::{Property, PropertyId};
use sqlx::{Pool, Sqlite};
use std::path::Path;

/// High-level repository interface.
///
/// Wraps the connection pool and exposes every repository operation. The
/// orchestrator holds one of these for the lifetime of a run.
#[derive(Debug, Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Open the database at `path` (or `:memory:`).
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let pool = connection::connect(path).await?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    #[must_use]
    pub fn from_pool(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Run all pending database migrations.
    ///
    /// This should be called after opening the database to ensure the schema
    /// is up to date.
    pub async fn run_migrations(&self) -> Result<()> {
        migrations::run_migrations(&self.pool).await
    }

    /// Get the current schema version.
    pub async fn get_schema_version(&self) -> Result<i64> {
        migrations::get_schema_version(&self.pool).await
    }

    /// Get a reference to the underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Close the database connection gracefully.
    pub async fn close(self) {
        self.pool.close().await;
    }

    /// Insert or reconcile a listing.
    pub async fn upsert(&self, property: &Property) -> Result<UpsertOutcome> {
        properties::upsert_property(&self.pool, property).await
    }

    /// Get a listing by id.
    pub async fn find_by_id(&self, id: &PropertyId) -> Result<Option<Property>> {
        properties::find_by_id(&self.pool, id).await
    }

    /// Get listings whose id starts with `prefix`.
    pub async fn find_by_id_prefix(&self, prefix: &str) -> Result<Vec<Property>> {
        properties::find_by_id_prefix(&self.pool, prefix).await
    }

    /// List listings matching `filters`.
    pub async fn find_by_filters(&self, filters: &PropertyFilters) -> Result<Vec<Property>> {
        properties::find_by_filters(&self.pool, filters).await
    }

    /// Snapshots of a listing, most recent first.
    pub async fn snapshots_for(&self, id: &PropertyId) -> Result<Vec<Snapshot>> {
        history::snapshots_for(&self.pool, id).await
    }

    /// The latest snapshot of a listing taken at or before `at`.
    pub async fn snapshot_at_or_before(
        &self,
        id: &PropertyId,
        at: DateTime<Utc>,
    ) -> Result<Option<Snapshot>> {
        history::snapshot_at_or_before(&self.pool, id, at).await
    }

    /// Price history of a listing, most recent first.
    pub async fn price_history_for(&self, id: &PropertyId) -> Result<Vec<PriceHistoryEntry>> {
        history::price_history_for(&self.pool, id).await
    }

    /// Listings first seen after `since`.
    pub async fn new_since(&self, since: DateTime<Utc>) -> Result<Vec<Property>> {
        properties::new_since(&self.pool, since).await
    }

    /// Listings with a price change after `since` (default: last 30 days).
    pub async fn changed_since(&self, since: Option<DateTime<Utc>>) -> Result<Vec<Property>> {
        properties::changed_since(&self.pool, since).await
    }

    /// Completion time of the latest run, optionally for one profile.
    pub async fn last_run_timestamp(
        &self,
        profile_name: Option<&str>,
    ) -> Result<Option<DateTime<Utc>>> {
        search_runs::last_run_timestamp(&self.pool, profile_name).await
    }

    /// Write a search run audit record.
    pub async fn record_run(&self, run: &SearchRun) -> Result<i64> {
        search_runs::record_run(&self.pool, run).await
    }

    /// Recorded runs, most recent first.
    pub async fn list_search_runs(
        &self,
        profile_name: Option<&str>,
        limit: u32,
    ) -> Result<Vec<SearchRun>> {
        search_runs::list_search_runs(&self.pool, profile_name, limit).await
    }

    /// Link duplicates to a canonical listing; returns the edges written.
    pub async fn link_duplicates(
        &self,
        canonical_id: &PropertyId,
        duplicate_ids: &[PropertyId],
        method: &str,
        confidence: f64,
    ) -> Result<u64> {
        duplicates::link_duplicates(&self.pool, canonical_id, duplicate_ids, method, confidence)
            .await
    }

    /// Duplicate edges touching a listing.
    pub async fn duplicates_for(&self, id: &PropertyId) -> Result<Vec<StoredDuplicate>> {
        duplicates::duplicates_for(&self.pool, id).await
    }
}
