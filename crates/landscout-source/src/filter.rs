//! Helpers for adapters: post-filtering listings the site could not filter
//! and parsing the loose price and lot-size strings listing cards carry.

use landscout_core::{Property, SearchCriteria};
use regex::Regex;
use std::sync::OnceLock;

const SQUARE_FEET_PER_ACRE: f64 = 43_560.0;

static PRICE_REGEX: OnceLock<Regex> = OnceLock::new();
static ACRES_REGEX: OnceLock<Regex> = OnceLock::new();
static SQFT_REGEX: OnceLock<Regex> = OnceLock::new();
static NUMBER_REGEX: OnceLock<Regex> = OnceLock::new();

/// Whether a listing satisfies the criteria a site could not apply itself.
///
/// A listing with no price or acreage is never rejected on price or acreage.
/// When a distance preference is set, listings without a distance are
/// rejected; when terrain is requested, listings must share at least one tag.
#[must_use]
pub fn matches_local_filters(property: &Property, criteria: &SearchCriteria) -> bool {
    if let Some(range) = &criteria.distance_to_town {
        match property.distance_to_town_minutes {
            Some(distance) if distance >= range.min && distance <= range.max => {}
            _ => return false,
        }
    }

    if !criteria.terrain.is_empty() {
        let overlaps = property
            .terrain_tags
            .as_ref()
            .is_some_and(|tags| tags.iter().any(|tag| criteria.terrain.contains(tag)));
        if !overlaps {
            return false;
        }
    }

    if let Some(price) = property.price {
        let bounds = criteria.price_for_state(property.state.as_deref().unwrap_or_default());
        if bounds.min.is_some_and(|min| price < min) || bounds.max.is_some_and(|max| price > max) {
            return false;
        }
    }

    if let Some(acres) = property.acres {
        if acres < criteria.min_acres || criteria.max_acres.is_some_and(|max| acres > max) {
            return false;
        }
    }

    true
}

/// Parse the first number in a price string such as `"$1,200,000"`.
#[must_use]
pub fn parse_price(text: &str) -> Option<f64> {
    let regex =
        PRICE_REGEX.get_or_init(|| Regex::new(r"\d[\d,]*(?:\.\d+)?").expect("valid regex"));
    regex
        .find(text)
        .and_then(|m| m.as_str().replace(',', "").parse().ok())
}

/// Parse a lot size into acres.
///
/// Accepts `"40.5 acres"`, `"12 ac"` and square-feet sizes such as
/// `"87,120 sq ft"`; a bare number is taken as acres.
#[must_use]
pub fn parse_acres(text: &str) -> Option<f64> {
    let acres = ACRES_REGEX.get_or_init(|| {
        Regex::new(r"(?i)(\d[\d,]*(?:\.\d+)?)\s*(?:acres?|ac)\b").expect("valid regex")
    });
    if let Some(caps) = acres.captures(text) {
        return caps[1].replace(',', "").parse().ok();
    }

    let sqft = SQFT_REGEX
        .get_or_init(|| Regex::new(r"(?i)(\d[\d,]*)\s*sq\.?\s*f(?:ee)?t").expect("valid regex"));
    if let Some(caps) = sqft.captures(text) {
        return caps[1]
            .replace(',', "")
            .parse::<f64>()
            .ok()
            .map(|feet| feet / SQUARE_FEET_PER_ACRE);
    }

    let number = NUMBER_REGEX.get_or_init(|| Regex::new(r"\d+(?:\.\d+)?").expect("valid regex"));
    number.find(text).and_then(|m| m.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use landscout_core::{DistanceRange, PriceBounds, PriceRange, TerrainType};

    fn listing() -> Property {
        Property::new("landwatch", "1", "https://example.com/1", "Timber parcel")
    }

    fn criteria() -> SearchCriteria {
        SearchCriteria {
            min_acres: 20.0,
            max_acres: Some(200.0),
            states: vec!["MT".to_string()],
            price_range: PriceRange {
                default: PriceBounds {
                    min: None,
                    max: Some(1_200_000.0),
                },
                ..PriceRange::default()
            },
            ..SearchCriteria::default()
        }
    }

    #[test]
    fn test_absent_price_and_acres_pass() {
        assert!(matches_local_filters(&listing(), &criteria()));
    }

    #[test]
    fn test_price_and_acreage_bounds() {
        let mut property = listing();
        property.price = Some(1_500_000.0);
        assert!(!matches_local_filters(&property, &criteria()));

        property.price = Some(800_000.0);
        property.acres = Some(10.0);
        assert!(!matches_local_filters(&property, &criteria()));

        property.acres = Some(40.0);
        assert!(matches_local_filters(&property, &criteria()));

        property.acres = Some(250.0);
        assert!(!matches_local_filters(&property, &criteria()));
    }

    #[test]
    fn test_distance_requires_value_in_range() {
        let criteria = SearchCriteria {
            distance_to_town: Some(DistanceRange {
                min: 10.0,
                max: 45.0,
            }),
            ..criteria()
        };

        let mut property = listing();
        assert!(!matches_local_filters(&property, &criteria));

        property.distance_to_town_minutes = Some(30.0);
        assert!(matches_local_filters(&property, &criteria));

        property.distance_to_town_minutes = Some(60.0);
        assert!(!matches_local_filters(&property, &criteria));
    }

    #[test]
    fn test_terrain_requires_overlap() {
        let criteria = SearchCriteria {
            terrain: vec![TerrainType::Forested, TerrainType::Mountain],
            ..criteria()
        };

        let mut property = listing();
        assert!(!matches_local_filters(&property, &criteria));

        property.terrain_tags = Some(vec![TerrainType::Desert]);
        assert!(!matches_local_filters(&property, &criteria));

        property.terrain_tags = Some(vec![TerrainType::Desert, TerrainType::Mountain]);
        assert!(matches_local_filters(&property, &criteria));
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("$1,200,000"), Some(1_200_000.0));
        assert_eq!(parse_price("Price: $349,900.50 (reduced)"), Some(349_900.5));
        assert_eq!(parse_price("Contact agent"), None);
    }

    #[test]
    fn test_parse_acres() {
        assert_eq!(parse_acres("40.5 acres"), Some(40.5));
        assert_eq!(parse_acres("1,280 Acres"), Some(1280.0));
        assert_eq!(parse_acres("12 ac lot"), Some(12.0));
        assert_eq!(parse_acres("87,120 sq ft"), Some(2.0));
        assert_eq!(parse_acres("25"), Some(25.0));
        assert_eq!(parse_acres("lot size unknown"), None);
    }
}
