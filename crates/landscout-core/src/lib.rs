//! Landscout Core - Foundation crate for the land listing aggregator.
//!
//! This crate provides the normalized listing model, search criteria, shared
//! error types and configuration management that every other Landscout crate
//! depends on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths and search profiles
//! - [`types`] - Shared newtypes and enums (`PropertyId`, `WaterType`, `TerrainType`, ...)
//! - [`property`] - The normalized `Property` record, field completeness and change comparison
//! - [`criteria`] - Search criteria and preference weights used for filtering and scoring
//!
//! # Example
//!
//! ```rust
//! use landscout_core::{Property, PropertyId};
//!
//! let property = Property::new("landwatch", "12345", "https://example.com/12345", "40 acres");
//! assert_eq!(property.id, PropertyId::derive("landwatch", "12345"));
//! assert_eq!(property.field_completeness(), 5);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod criteria;
pub mod error;
pub mod property;
pub mod types;

// Re-export commonly used types
pub use config::{AppConfig, DatabaseConfig, ScrapingConfig};
pub use criteria::{
    DistanceRange, PriceBounds, PriceRange, Profile, SearchCriteria, SourceSettings,
    StructurePreference, UtilityWeights, WaterPreference, WaterPreferenceType,
};
pub use error::{ConfigError, ConfigResult, LandscoutError, Result};
pub use property::{Property, RawPayload, Structures, Utilities, WaterFeatures};
pub use types::{Coordinates, PropertyId, StructureType, TerrainType, WaterType};
