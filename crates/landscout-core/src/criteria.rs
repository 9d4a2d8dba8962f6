//! Search criteria and search profiles.
//!
//! Hard constraints (acreage, states, price) are handed to source adapters;
//! weighted preferences drive scoring.
//!
//! Criteria serialize with camelCase keys; the snake_case spellings used in
//! TOML config files are accepted as aliases.

use crate::error::{LandscoutError, Result};
use crate::types::TerrainType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Criteria for one search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCriteria {
    /// Minimum parcel size in acres
    #[serde(default, alias = "min_acres")]
    pub min_acres: f64,
    /// Maximum parcel size in acres
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "max_acres")]
    pub max_acres: Option<f64>,
    /// Two-letter state codes to search
    #[serde(default)]
    pub states: Vec<String>,
    /// Price bounds, optionally per state
    #[serde(default, alias = "price_range")]
    pub price_range: PriceRange,
    /// Preferred driving time to town
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "distance_to_town")]
    pub distance_to_town: Option<DistanceRange>,
    /// Weighted water preferences
    #[serde(default, skip_serializing_if = "Vec::is_empty", alias = "water_preferences")]
    pub water_preferences: Vec<WaterPreference>,
    /// Structure preference
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "structure_preference")]
    pub structure_preference: Option<StructurePreference>,
    /// Preferred terrain tags
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub terrain: Vec<TerrainType>,
    /// Per-utility weights
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "utility_weights")]
    pub utility_weights: Option<UtilityWeights>,
}

impl SearchCriteria {
    /// Price bounds for `state`: a regional override merged field by field
    /// over the default bounds.
    #[must_use]
    pub fn price_for_state(&self, state: &str) -> PriceBounds {
        match self.price_range.by_region.get(state) {
            Some(region) => PriceBounds {
                min: region.min.or(self.price_range.default.min),
                max: region.max.or(self.price_range.default.max),
            },
            None => self.price_range.default,
        }
    }
}

/// Default and per-region price bounds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRange {
    /// Bounds used when no regional override exists
    #[serde(default)]
    pub default: PriceBounds,
    /// Overrides keyed by state code
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty", alias = "by_region")]
    pub by_region: BTreeMap<String, PriceBounds>,
}

/// Inclusive price bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceBounds {
    /// Minimum price
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Maximum price
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

/// Preferred driving time to town, in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceRange {
    /// Lower bound
    pub min: f64,
    /// Upper bound
    pub max: f64,
}

/// A weighted water preference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaterPreference {
    /// Which kind of water is wanted
    #[serde(rename = "type")]
    pub kind: WaterPreferenceType,
    /// Score added when a listing satisfies the preference
    pub weight: f64,
}

/// Kinds of water a search can prefer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WaterPreferenceType {
    /// Water available all year
    YearRoundWater,
    /// Pond or lake
    PondLake,
    /// Well
    Well,
    /// Creek, river or spring
    Creek,
    /// Any water at all
    AnyWater,
}

/// Structure preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StructurePreference {
    /// No buildings
    RawLand,
    /// Has a cabin
    WithCabin,
    /// Has a house
    WithHouse,
    /// No preference
    Any,
}

/// Per-utility weights.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UtilityWeights {
    /// Weight for electric power
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power: Option<f64>,
    /// Weight for municipal water
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water: Option<f64>,
    /// Weight for internet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internet: Option<f64>,
    /// Weight for sewer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sewer: Option<f64>,
}

/// Per-source settings inside a profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSettings {
    /// Whether the source runs for this profile
    #[serde(default)]
    pub enabled: bool,
    /// Scheduling priority, higher first
    #[serde(default)]
    pub priority: i32,
}

/// A named search profile: criteria plus enabled sources.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Profile name
    #[serde(default)]
    pub name: String,
    /// Human description
    #[serde(default)]
    pub description: String,
    /// Search criteria
    #[serde(default)]
    pub criteria: SearchCriteria,
    /// Source settings keyed by source name
    #[serde(default)]
    pub sources: BTreeMap<String, SourceSettings>,
}

impl Profile {
    /// Settings for `source`, if the profile mentions it and it is enabled.
    #[must_use]
    pub fn enabled_source(&self, source: &str) -> Option<SourceSettings> {
        self.sources.get(source).copied().filter(|s| s.enabled)
    }

    /// Reject criteria that no listing could satisfy.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| LandscoutError::InvalidCriteria {
            profile: self.name.clone(),
            reason,
        };
        let criteria = &self.criteria;

        if !criteria.min_acres.is_finite() || criteria.min_acres < 0.0 {
            return Err(invalid(format!(
                "minAcres must be a non-negative number, got {}",
                criteria.min_acres
            )));
        }
        if let Some(max) = criteria.max_acres {
            if max < criteria.min_acres {
                return Err(invalid(format!(
                    "maxAcres {max} is below minAcres {}",
                    criteria.min_acres
                )));
            }
        }

        check_bounds(&criteria.price_range.default).map_err(&invalid)?;
        for state in criteria.price_range.by_region.keys() {
            check_bounds(&criteria.price_for_state(state))
                .map_err(|reason| invalid(format!("{state}: {reason}")))?;
        }

        if let Some(range) = &criteria.distance_to_town {
            if range.min > range.max {
                return Err(invalid(format!(
                    "distanceToTown min {} exceeds max {}",
                    range.min, range.max
                )));
            }
        }

        Ok(())
    }
}

fn check_bounds(bounds: &PriceBounds) -> std::result::Result<(), String> {
    match (bounds.min, bounds.max) {
        (Some(min), Some(max)) if min > max => {
            Err(format!("price min {min} exceeds max {max}"))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn criteria_with_regions() -> SearchCriteria {
        let mut by_region = BTreeMap::new();
        by_region.insert(
            "ID".to_string(),
            PriceBounds {
                min: None,
                max: Some(400_000.0),
            },
        );
        SearchCriteria {
            min_acres: 20.0,
            states: vec!["MT".to_string(), "ID".to_string()],
            price_range: PriceRange {
                default: PriceBounds {
                    min: Some(50_000.0),
                    max: Some(1_200_000.0),
                },
                by_region,
            },
            ..SearchCriteria::default()
        }
    }

    #[test]
    fn test_price_for_state_default() {
        let criteria = criteria_with_regions();
        let bounds = criteria.price_for_state("MT");
        assert_eq!(bounds.min, Some(50_000.0));
        assert_eq!(bounds.max, Some(1_200_000.0));
    }

    #[test]
    fn test_price_for_state_merges_override() {
        let criteria = criteria_with_regions();
        let bounds = criteria.price_for_state("ID");
        assert_eq!(bounds.min, Some(50_000.0));
        assert_eq!(bounds.max, Some(400_000.0));
    }

    #[test]
    fn test_criteria_from_toml() {
        let toml_str = r#"
            min_acres = 20
            states = ["MT"]
            structure_preference = "raw-land"
            terrain = ["forested", "mountain"]

            [price_range.default]
            max = 1200000

            [[water_preferences]]
            type = "year-round-water"
            weight = 20
        "#;
        let criteria: SearchCriteria = toml::from_str(toml_str).expect("parse criteria");
        assert!((criteria.min_acres - 20.0).abs() < f64::EPSILON);
        assert_eq!(criteria.price_range.default.max, Some(1_200_000.0));
        assert_eq!(
            criteria.structure_preference,
            Some(StructurePreference::RawLand)
        );
        assert_eq!(criteria.water_preferences.len(), 1);
        assert_eq!(
            criteria.water_preferences[0].kind,
            WaterPreferenceType::YearRoundWater
        );
    }

    #[test]
    fn test_criteria_serializes_camel_case() {
        let json = serde_json::to_value(criteria_with_regions()).expect("serialize");
        assert_eq!(json["minAcres"], 20.0);
        assert_eq!(json["priceRange"]["default"]["max"], 1_200_000.0);
        assert_eq!(json["priceRange"]["byRegion"]["ID"]["max"], 400_000.0);
        assert!(json.get("min_acres").is_none());

        let back: SearchCriteria = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, criteria_with_regions());
    }

    fn profile_with(criteria: SearchCriteria) -> Profile {
        Profile {
            name: "montana".to_string(),
            criteria,
            ..Profile::default()
        }
    }

    #[test]
    fn test_validate_accepts_sane_criteria() {
        assert!(profile_with(criteria_with_regions()).validate().is_ok());
        assert!(Profile::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_inverted_ranges() {
        let negative = SearchCriteria {
            min_acres: -1.0,
            ..SearchCriteria::default()
        };
        assert!(matches!(
            profile_with(negative).validate(),
            Err(LandscoutError::InvalidCriteria { ref profile, .. }) if profile == "montana"
        ));

        let acres = SearchCriteria {
            min_acres: 40.0,
            max_acres: Some(10.0),
            ..SearchCriteria::default()
        };
        assert!(profile_with(acres).validate().is_err());

        let distance = SearchCriteria {
            distance_to_town: Some(DistanceRange { min: 60.0, max: 15.0 }),
            ..SearchCriteria::default()
        };
        assert!(profile_with(distance).validate().is_err());
    }

    #[test]
    fn test_validate_checks_merged_region_bounds() {
        let mut criteria = criteria_with_regions();
        criteria.price_range.by_region.insert(
            "WY".to_string(),
            PriceBounds {
                min: None,
                max: Some(10_000.0),
            },
        );
        let err = profile_with(criteria).validate().expect_err("WY max below default min");
        assert!(err.to_string().contains("WY"));
    }

    #[test]
    fn test_profile_enabled_source() {
        let mut sources = BTreeMap::new();
        sources.insert(
            "landwatch".to_string(),
            SourceSettings {
                enabled: true,
                priority: 2,
            },
        );
        sources.insert(
            "zillow".to_string(),
            SourceSettings {
                enabled: false,
                priority: 5,
            },
        );
        let profile = Profile {
            name: "default".to_string(),
            sources,
            ..Profile::default()
        };

        assert_eq!(profile.enabled_source("landwatch").map(|s| s.priority), Some(2));
        assert!(profile.enabled_source("zillow").is_none());
        assert!(profile.enabled_source("landsearch").is_none());
    }
}
