//! The uniform contract every listing site adapter implements.

use crate::error::SourceError;
use futures::stream::BoxStream;
use landscout_browser::{BrowserSession, RateLimiter};
use landscout_core::{Property, SearchCriteria};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Search filters a source can apply on the site itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportedFilters {
    /// Restrict by state
    pub states: bool,
    /// Restrict by price range
    pub price_range: bool,
    /// Restrict by acreage range
    pub acreage_range: bool,
    /// Restrict by water features
    pub water_features: bool,
    /// Restrict by structures
    pub structures: bool,
    /// Restrict by terrain
    pub terrain: bool,
    /// Restrict by distance to town
    pub distance_to_town: bool,
}

impl SupportedFilters {
    /// Names of the supported filters, in a fixed order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        [
            (self.states, "states"),
            (self.price_range, "priceRange"),
            (self.acreage_range, "acreageRange"),
            (self.water_features, "waterFeatures"),
            (self.structures, "structures"),
            (self.terrain, "terrain"),
            (self.distance_to_town, "distanceToTown"),
        ]
        .into_iter()
        .filter(|(supported, _)| *supported)
        .map(|(_, name)| name.to_string())
        .collect()
    }
}

/// Descriptive metadata for a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// Stable machine name, used as the `source` of every record it yields
    pub name: String,
    /// Human readable name
    pub display_name: String,
    /// Adapter version
    pub version: String,
    /// Human description
    pub description: String,
    /// Filters applied on the site
    pub supported_filters: SupportedFilters,
}

impl SourceMetadata {
    /// Check that the name is usable as a source key.
    pub fn validate(&self) -> crate::Result<()> {
        if self.name.is_empty() {
            return Err(SourceError::InvalidMetadata {
                name: self.name.clone(),
                reason: "source name cannot be empty".to_string(),
            });
        }

        if !self
            .name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(SourceError::InvalidMetadata {
                name: self.name.clone(),
                reason: "source name must be lowercase alphanumeric or '-'".to_string(),
            });
        }

        if self.display_name.is_empty() {
            return Err(SourceError::InvalidMetadata {
                name: self.name.clone(),
                reason: "display name cannot be empty".to_string(),
            });
        }

        Ok(())
    }
}

/// Progress message callback.
pub type ProgressCallback = Arc<dyn Fn(&str) + Send + Sync>;
/// Error callback.
pub type ErrorCallback = Arc<dyn Fn(&SourceError) + Send + Sync>;
/// Called for every record a source yields.
pub type PropertyCallback = Arc<dyn Fn(&Property) + Send + Sync>;

/// Advisory hooks for logging and telemetry. Nothing depends on them being set.
#[derive(Clone, Default)]
pub struct SearchCallbacks {
    /// Progress messages
    pub on_progress: Option<ProgressCallback>,
    /// Recoverable errors
    pub on_error: Option<ErrorCallback>,
    /// Records as they are found
    pub on_property_found: Option<PropertyCallback>,
}

impl SearchCallbacks {
    /// Report progress.
    pub fn progress(&self, message: &str) {
        if let Some(callback) = &self.on_progress {
            callback(message);
        }
    }

    /// Report an error.
    pub fn error(&self, error: &SourceError) {
        if let Some(callback) = &self.on_error {
            callback(error);
        }
    }

    /// Report a found record.
    pub fn property_found(&self, property: &Property) {
        if let Some(callback) = &self.on_property_found {
            callback(property);
        }
    }
}

impl fmt::Debug for SearchCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchCallbacks")
            .field("on_progress", &self.on_progress.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_property_found", &self.on_property_found.is_some())
            .finish()
    }
}

/// Everything a source gets from the orchestrator besides the criteria.
#[derive(Clone, Copy)]
pub struct SearchContext<'a> {
    /// Advisory callbacks
    pub callbacks: &'a SearchCallbacks,
    /// Shared browser session; `None` lets the adapter launch its own
    pub session: Option<&'a dyn BrowserSession>,
    /// Pacing for this source's page actions
    pub rate_limiter: &'a RateLimiter,
}

/// Finite, non-restartable stream of records from one source.
///
/// Adapters skip listings they cannot parse. An `Err` item means the source
/// as a whole failed.
pub type PropertyStream<'a> = BoxStream<'a, Result<Property, SourceError>>;

/// A listing site adapter.
pub trait PropertySource: Send + Sync {
    /// Metadata describing the source.
    fn metadata(&self) -> &SourceMetadata;

    /// Search the site for listings matching `criteria`.
    fn search<'a>(
        &'a self,
        criteria: &'a SearchCriteria,
        ctx: SearchContext<'a>,
    ) -> PropertyStream<'a>;

    /// Stable machine name.
    fn name(&self) -> &str {
        &self.metadata().name
    }
}
