//! Listing persistence and change detection.
//!
//! [`upsert_property`] is the only writer of the `properties` table. It
//! distinguishes a content change from a mere re-observation: a change
//! rewrites the row, appends a snapshot and, when the price moved, a price
//! history entry; a re-observation only bumps `last_checked`.

use crate::codec::{decode_json, encode_json, from_db_time, to_db_time};
use crate::error::{DatabaseError, Result};
use crate::history::{insert_price_history, insert_snapshot};
use chrono::{DateTime, Duration, Utc};
use landscout_core::{Coordinates, Property, PropertyId};
use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, Pool, QueryBuilder, Row, Sqlite};

/// Window used by [`changed_since`] when no timestamp is given.
pub const DEFAULT_CHANGE_WINDOW_DAYS: i64 = 30;

const PROPERTY_COLUMNS: &str = "id, source, source_id, url, title, description, acres, price, \
     state, county, city, address, latitude, longitude, water_features, structures, utilities, \
     distance_to_town_minutes, terrain_tags, images, raw_data, score, field_completeness, \
     first_seen, last_seen, last_checked";

/// What an upsert did to the stored listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// First observation; row and first snapshot written
    Inserted,
    /// Comparable content changed; row rewritten and snapshot appended
    Updated {
        /// Whether a price history entry was appended
        price_changed: bool,
    },
    /// Re-observed without changes; only `last_checked` moved
    Unchanged,
}

/// Filters for [`find_by_filters`]. Unset fields do not filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyFilters {
    /// Exact state code
    pub state: Option<String>,
    /// Minimum price, inclusive
    pub min_price: Option<f64>,
    /// Maximum price, inclusive
    pub max_price: Option<f64>,
    /// Minimum acreage, inclusive
    pub min_acres: Option<f64>,
    /// Maximum acreage, inclusive
    pub max_acres: Option<f64>,
    /// Minimum score, inclusive
    pub min_score: Option<f64>,
    /// Maximum number of rows
    pub limit: Option<u32>,
}

/// Nested and derived columns, encoded once per write.
struct EncodedColumns {
    latitude: Option<f64>,
    longitude: Option<f64>,
    water_features: Option<String>,
    structures: Option<String>,
    utilities: Option<String>,
    terrain_tags: Option<String>,
    images: Option<String>,
    raw_data: Option<String>,
    field_completeness: i64,
}

impl EncodedColumns {
    fn new(property: &Property) -> Result<Self> {
        Ok(Self {
            latitude: property.coordinates.map(|c| c.latitude),
            longitude: property.coordinates.map(|c| c.longitude),
            water_features: encode_json(property.water_features.as_ref())?,
            structures: encode_json(property.structures.as_ref())?,
            utilities: encode_json(property.utilities.as_ref())?,
            terrain_tags: encode_json(property.terrain_tags.as_ref())?,
            images: encode_json(property.images.as_ref())?,
            raw_data: encode_json(property.raw_data.as_ref())?,
            field_completeness: i64::from(property.field_completeness()),
        })
    }
}

/// Insert a new listing or reconcile it with the stored one.
///
/// Field completeness is recomputed from the record; score is stored as
/// given. Runs in a single transaction.
pub async fn upsert_property(pool: &Pool<Sqlite>, property: &Property) -> Result<UpsertOutcome> {
    let encoded = EncodedColumns::new(property)?;
    let now = to_db_time(Utc::now());

    let mut tx = pool.begin().await?;
    let existing = fetch_property(&mut *tx, &property.id).await?;

    let outcome = match existing {
        None => {
            insert_row(&mut *tx, property, &encoded, &now).await?;
            insert_snapshot(&mut *tx, property, &now).await?;
            UpsertOutcome::Inserted
        }
        Some(stored) if stored.differs_from(property) => {
            update_row(&mut *tx, property, &encoded, &now).await?;
            insert_snapshot(&mut *tx, property, &now).await?;

            let price_changed = stored.price != property.price && property.price.is_some();
            if let Some(price) = property.price.filter(|_| price_changed) {
                insert_price_history(&mut *tx, &property.id, price, &now).await?;
            }
            UpsertOutcome::Updated { price_changed }
        }
        Some(_) => {
            sqlx::query("UPDATE properties SET last_checked = ? WHERE id = ?")
                .bind(&now)
                .bind(property.id.as_str())
                .execute(&mut *tx)
                .await?;
            UpsertOutcome::Unchanged
        }
    };

    tx.commit().await?;

    tracing::debug!(property_id = %property.id, outcome = ?outcome, "upserted property");
    Ok(outcome)
}

async fn insert_row<'e, E>(
    executor: E,
    property: &Property,
    encoded: &EncodedColumns,
    now: &str,
) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "INSERT INTO properties (id, source, source_id, url, title, description, acres, price, \
         state, county, city, address, latitude, longitude, water_features, structures, \
         utilities, distance_to_town_minutes, terrain_tags, images, raw_data, score, \
         field_completeness, first_seen, last_seen, last_checked) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(property.id.as_str())
    .bind(&property.source)
    .bind(&property.source_id)
    .bind(&property.url)
    .bind(&property.title)
    .bind(&property.description)
    .bind(property.acres)
    .bind(property.price)
    .bind(&property.state)
    .bind(&property.county)
    .bind(&property.city)
    .bind(&property.address)
    .bind(encoded.latitude)
    .bind(encoded.longitude)
    .bind(&encoded.water_features)
    .bind(&encoded.structures)
    .bind(&encoded.utilities)
    .bind(property.distance_to_town_minutes)
    .bind(&encoded.terrain_tags)
    .bind(&encoded.images)
    .bind(&encoded.raw_data)
    .bind(property.score)
    .bind(encoded.field_completeness)
    .bind(now)
    .bind(now)
    .bind(now)
    .execute(executor)
    .await?;
    Ok(())
}

async fn update_row<'e, E>(
    executor: E,
    property: &Property,
    encoded: &EncodedColumns,
    now: &str,
) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "UPDATE properties SET url = ?, title = ?, description = ?, acres = ?, price = ?, \
         state = ?, county = ?, city = ?, address = ?, latitude = ?, longitude = ?, \
         water_features = ?, structures = ?, utilities = ?, distance_to_town_minutes = ?, \
         terrain_tags = ?, images = ?, raw_data = ?, score = ?, field_completeness = ?, \
         last_seen = ?, last_checked = ? WHERE id = ?",
    )
    .bind(&property.url)
    .bind(&property.title)
    .bind(&property.description)
    .bind(property.acres)
    .bind(property.price)
    .bind(&property.state)
    .bind(&property.county)
    .bind(&property.city)
    .bind(&property.address)
    .bind(encoded.latitude)
    .bind(encoded.longitude)
    .bind(&encoded.water_features)
    .bind(&encoded.structures)
    .bind(&encoded.utilities)
    .bind(property.distance_to_town_minutes)
    .bind(&encoded.terrain_tags)
    .bind(&encoded.images)
    .bind(&encoded.raw_data)
    .bind(property.score)
    .bind(encoded.field_completeness)
    .bind(now)
    .bind(now)
    .bind(property.id.as_str())
    .execute(executor)
    .await?;
    Ok(())
}

async fn fetch_property<'e, E>(executor: E, id: &PropertyId) -> Result<Option<Property>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query(&format!(
        "SELECT {PROPERTY_COLUMNS} FROM properties WHERE id = ?"
    ))
    .bind(id.as_str())
    .fetch_optional(executor)
    .await?;

    row.as_ref().map(property_from_row).transpose()
}

/// Get a listing by id.
pub async fn find_by_id(pool: &Pool<Sqlite>, id: &PropertyId) -> Result<Option<Property>> {
    fetch_property(pool, id).await
}

/// Get listings whose id starts with `prefix`.
///
/// Ids are lowercase hex; a prefix with any other character matches nothing.
pub async fn find_by_id_prefix(pool: &Pool<Sqlite>, prefix: &str) -> Result<Vec<Property>> {
    if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_hexdigit()) {
        return Ok(Vec::new());
    }

    let rows = sqlx::query(&format!(
        "SELECT {PROPERTY_COLUMNS} FROM properties WHERE id LIKE ? ORDER BY id"
    ))
    .bind(format!("{}%", prefix.to_ascii_lowercase()))
    .fetch_all(pool)
    .await?;

    rows.iter().map(property_from_row).collect()
}

/// List listings matching `filters`, best score first, then most recently seen.
pub async fn find_by_filters(
    pool: &Pool<Sqlite>,
    filters: &PropertyFilters,
) -> Result<Vec<Property>> {
    let mut builder: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT {PROPERTY_COLUMNS} FROM properties WHERE 1 = 1"));

    if let Some(state) = &filters.state {
        builder.push(" AND state = ").push_bind(state.clone());
    }
    if let Some(min) = filters.min_price {
        builder.push(" AND price >= ").push_bind(min);
    }
    if let Some(max) = filters.max_price {
        builder.push(" AND price <= ").push_bind(max);
    }
    if let Some(min) = filters.min_acres {
        builder.push(" AND acres >= ").push_bind(min);
    }
    if let Some(max) = filters.max_acres {
        builder.push(" AND acres <= ").push_bind(max);
    }
    if let Some(min) = filters.min_score {
        builder.push(" AND score >= ").push_bind(min);
    }

    builder.push(" ORDER BY score DESC, last_seen DESC");
    if let Some(limit) = filters.limit {
        builder.push(" LIMIT ").push_bind(i64::from(limit));
    }

    let rows = builder.build().fetch_all(pool).await?;
    rows.iter().map(property_from_row).collect()
}

/// Listings first persisted strictly after `since`, newest first.
pub async fn new_since(pool: &Pool<Sqlite>, since: DateTime<Utc>) -> Result<Vec<Property>> {
    let rows = sqlx::query(&format!(
        "SELECT {PROPERTY_COLUMNS} FROM properties WHERE first_seen > ? ORDER BY first_seen DESC"
    ))
    .bind(to_db_time(since))
    .fetch_all(pool)
    .await?;

    rows.iter().map(property_from_row).collect()
}

/// Listings with a price history entry recorded strictly after `since`.
///
/// Defaults to the last [`DEFAULT_CHANGE_WINDOW_DAYS`] days.
pub async fn changed_since(
    pool: &Pool<Sqlite>,
    since: Option<DateTime<Utc>>,
) -> Result<Vec<Property>> {
    let since =
        since.unwrap_or_else(|| Utc::now() - Duration::days(DEFAULT_CHANGE_WINDOW_DAYS));

    let rows = sqlx::query(&format!(
        "SELECT {PROPERTY_COLUMNS} FROM properties \
         WHERE id IN (SELECT property_id FROM price_history WHERE recorded_at > ?) \
         ORDER BY last_seen DESC"
    ))
    .bind(to_db_time(since))
    .fetch_all(pool)
    .await?;

    rows.iter().map(property_from_row).collect()
}

fn property_from_row(row: &SqliteRow) -> Result<Property> {
    let latitude: Option<f64> = row.try_get("latitude")?;
    let longitude: Option<f64> = row.try_get("longitude")?;
    let completeness: Option<i64> = row.try_get("field_completeness")?;
    let first_seen: String = row.try_get("first_seen")?;
    let last_seen: String = row.try_get("last_seen")?;
    let last_checked: String = row.try_get("last_checked")?;

    let field_completeness = completeness
        .map(|c| {
            u32::try_from(c)
                .map_err(|_| DatabaseError::Decode(format!("invalid field_completeness {c}")))
        })
        .transpose()?;

    Ok(Property {
        id: PropertyId::from_stored(row.try_get::<String, _>("id")?),
        source: row.try_get("source")?,
        source_id: row.try_get("source_id")?,
        url: row.try_get("url")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        acres: row.try_get("acres")?,
        price: row.try_get("price")?,
        state: row.try_get("state")?,
        county: row.try_get("county")?,
        city: row.try_get("city")?,
        address: row.try_get("address")?,
        coordinates: latitude.zip(longitude).map(|(lat, lon)| Coordinates::new(lat, lon)),
        water_features: decode_json("water_features", row.try_get("water_features")?)?,
        structures: decode_json("structures", row.try_get("structures")?)?,
        utilities: decode_json("utilities", row.try_get("utilities")?)?,
        distance_to_town_minutes: row.try_get("distance_to_town_minutes")?,
        terrain_tags: decode_json("terrain_tags", row.try_get("terrain_tags")?)?,
        images: decode_json("images", row.try_get("images")?)?,
        raw_data: decode_json("raw_data", row.try_get("raw_data")?)?,
        score: row.try_get("score")?,
        field_completeness,
        first_seen: Some(from_db_time(&first_seen)?),
        last_seen: Some(from_db_time(&last_seen)?),
        last_checked: Some(from_db_time(&last_checked)?),
    })
}
