//! The normalized property record.
//!
//! Every source adapter produces [`Property`] values. Identity, provenance
//! and the core attributes come from the adapter; `score` and
//! `field_completeness` are derived by the pipeline and the lifecycle
//! timestamps are owned by the repository.

use crate::types::{Coordinates, PropertyId, StructureType, TerrainType, WaterType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque source-specific payload.
///
/// Participates in identifier extraction for deduplication but never in
/// equality or change comparison.
pub type RawPayload = serde_json::Map<String, serde_json::Value>;

/// Number of required fields (id, source, `source_id`, url, title).
const REQUIRED_FIELD_COUNT: u32 = 5;

/// Water present on a parcel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WaterFeatures {
    /// Whether any water is present
    pub has_water: bool,
    /// Kinds of water present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub types: Option<Vec<WaterType>>,
    /// Whether water is available year-round
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_round: Option<bool>,
}

impl WaterFeatures {
    /// Whether the listed water kinds include `kind`.
    #[must_use]
    pub fn has_type(&self, kind: WaterType) -> bool {
        self.types.as_ref().is_some_and(|types| types.contains(&kind))
    }
}

/// Structures on a parcel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Structures {
    /// Whether the parcel has any structure
    pub has_structures: bool,
    /// Primary structure kind
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub structure_type: Option<StructureType>,
    /// Number of structures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

/// Utility hookups; `None` means the listing does not say.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Utilities {
    /// Electric power
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power: Option<bool>,
    /// Municipal water
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water: Option<bool>,
    /// Sewer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sewer: Option<bool>,
    /// Internet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internet: Option<bool>,
    /// Gas
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas: Option<bool>,
}

impl Utilities {
    fn defined_count(&self) -> u32 {
        [self.power, self.water, self.sewer, self.internet, self.gas]
            .iter()
            .map(|flag| u32::from(flag.is_some()))
            .sum()
    }
}

/// A normalized land listing from one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    /// Stable id derived from `(source, source_id)`
    pub id: PropertyId,
    /// Name of the source that produced the listing
    pub source: String,
    /// Source-local listing id
    pub source_id: String,
    /// Listing URL
    pub url: String,
    /// Listing title
    pub title: String,

    /// Free-text description
    #[serde(default)]
    pub description: Option<String>,
    /// Parcel size in acres
    #[serde(default)]
    pub acres: Option<f64>,
    /// Asking price in dollars
    #[serde(default)]
    pub price: Option<f64>,

    /// Two-letter state code
    #[serde(default)]
    pub state: Option<String>,
    /// County name
    #[serde(default)]
    pub county: Option<String>,
    /// City or town
    #[serde(default)]
    pub city: Option<String>,
    /// Street address
    #[serde(default)]
    pub address: Option<String>,
    /// Location of the parcel
    #[serde(default)]
    pub coordinates: Option<Coordinates>,

    /// Water on the parcel
    #[serde(default)]
    pub water_features: Option<WaterFeatures>,
    /// Buildings on the parcel
    #[serde(default)]
    pub structures: Option<Structures>,
    /// Utility hookups
    #[serde(default)]
    pub utilities: Option<Utilities>,
    /// Driving time to the nearest town, in minutes
    #[serde(default)]
    pub distance_to_town_minutes: Option<f64>,
    /// Terrain tags
    #[serde(default)]
    pub terrain_tags: Option<Vec<TerrainType>>,
    /// Image URLs
    #[serde(default)]
    pub images: Option<Vec<String>>,
    /// Source-specific payload, never compared or scored
    #[serde(default)]
    pub raw_data: Option<RawPayload>,

    /// Desirability score, set by the pipeline
    #[serde(default)]
    pub score: Option<f64>,
    /// Count of populated informational fields, set by the pipeline
    #[serde(default)]
    pub field_completeness: Option<u32>,

    /// When the listing was first persisted
    #[serde(default)]
    pub first_seen: Option<DateTime<Utc>>,
    /// When the listing content last changed
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
    /// When the listing was last observed
    #[serde(default)]
    pub last_checked: Option<DateTime<Utc>>,
}

impl Property {
    /// Create a record with only the required fields; the id is derived
    /// from `source` and `source_id`.
    #[must_use]
    pub fn new(
        source: impl Into<String>,
        source_id: impl Into<String>,
        url: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        let source = source.into();
        let source_id = source_id.into();
        Self {
            id: PropertyId::derive(&source, &source_id),
            source,
            source_id,
            url: url.into(),
            title: title.into(),
            description: None,
            acres: None,
            price: None,
            state: None,
            county: None,
            city: None,
            address: None,
            coordinates: None,
            water_features: None,
            structures: None,
            utilities: None,
            distance_to_town_minutes: None,
            terrain_tags: None,
            images: None,
            raw_data: None,
            score: None,
            field_completeness: None,
            first_seen: None,
            last_seen: None,
            last_checked: None,
        }
    }

    /// Count the populated informational fields.
    ///
    /// Required identity fields contribute a fixed base of 5. Raw payload,
    /// score, completeness and timestamps are never counted.
    #[must_use]
    pub fn field_completeness(&self) -> u32 {
        let mut count = REQUIRED_FIELD_COUNT;

        count += u32::from(self.description.as_deref().is_some_and(|d| !d.is_empty()));
        count += u32::from(self.acres.is_some());
        count += u32::from(self.price.is_some());

        for field in [&self.state, &self.county, &self.city, &self.address] {
            count += u32::from(field.as_deref().is_some_and(|v| !v.is_empty()));
        }
        count += u32::from(self.coordinates.is_some());

        if let Some(water) = self.water_features.as_ref().filter(|w| w.has_water) {
            count += 1;
            count += u32::from(water.types.as_ref().is_some_and(|t| !t.is_empty()));
            count += u32::from(water.year_round.is_some());
        }

        if let Some(structures) = &self.structures {
            count += 1;
            count += u32::from(structures.structure_type.is_some());
            count += u32::from(structures.count.is_some());
        }

        if let Some(utilities) = &self.utilities {
            count += utilities.defined_count();
        }

        count += u32::from(self.distance_to_town_minutes.is_some());
        count += u32::from(self.terrain_tags.as_ref().is_some_and(|t| !t.is_empty()));
        count += u32::from(self.images.as_ref().is_some_and(|i| !i.is_empty()));

        count
    }

    /// Whether any comparable attribute differs from `other`.
    ///
    /// Raw payload, score, completeness and timestamps are ignored; nested
    /// fields compare structurally.
    #[must_use]
    pub fn differs_from(&self, other: &Self) -> bool {
        self.id != other.id
            || self.source != other.source
            || self.source_id != other.source_id
            || self.url != other.url
            || self.title != other.title
            || self.description != other.description
            || self.acres != other.acres
            || self.price != other.price
            || self.state != other.state
            || self.county != other.county
            || self.city != other.city
            || self.address != other.address
            || self.coordinates != other.coordinates
            || self.water_features != other.water_features
            || self.structures != other.structures
            || self.utilities != other.utilities
            || self.distance_to_town_minutes != other.distance_to_town_minutes
            || self.terrain_tags != other.terrain_tags
            || self.images != other.images
    }

    /// Whether the parcel has water.
    #[must_use]
    pub fn has_water(&self) -> bool {
        self.water_features.as_ref().is_some_and(|w| w.has_water)
    }

    /// Whether the parcel has structures.
    #[must_use]
    pub fn has_structures(&self) -> bool {
        self.structures.as_ref().is_some_and(|s| s.has_structures)
    }
}
