//! Shared types used across Landscout.
//!
//! This module defines common newtypes and enums that provide type safety
//! and clear domain modeling.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Number of hex characters kept from the SHA-256 digest.
const PROPERTY_ID_LEN: usize = 16;

/// Stable identifier of a listing, derived from `(source, source_id)`.
///
/// The same pair always yields the same id, which makes it the idempotency
/// key for persistence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyId(String);

impl PropertyId {
    /// Derive the id for a listing from its source name and source-local id.
    #[must_use]
    pub fn derive(source: &str, source_id: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(format!("{source}:{source_id}").as_bytes());
        let digest = hex::encode(hasher.finalize());
        Self(digest[..PROPERTY_ID_LEN].to_string())
    }

    /// Wrap an id that was previously derived, e.g. when reading it back from storage.
    #[must_use]
    pub fn from_stored(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for PropertyId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Geographic coordinates in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
}

impl Coordinates {
    /// Create a new coordinate pair.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Kind of water present on a parcel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WaterType {
    /// Creek
    Creek,
    /// Pond
    Pond,
    /// Lake
    Lake,
    /// Well
    Well,
    /// River
    River,
    /// Spring
    Spring,
}

/// Kind of structure on a parcel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StructureType {
    /// House
    House,
    /// Cabin
    Cabin,
    /// Barn
    Barn,
    /// No building
    RawLand,
}

/// Terrain tag attached to a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TerrainType {
    /// Forested
    Forested,
    /// Mountain
    Mountain,
    /// Green / pasture
    Green,
    /// Desert
    Desert,
    /// Prairie
    Prairie,
}
