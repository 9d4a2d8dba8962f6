//! The five independent score components.
//!
//! Each component reads only the listing and the criteria and returns its
//! contribution; components never depend on each other.

use landscout_core::{
    Property, SearchCriteria, StructurePreference, StructureType, WaterPreferenceType, WaterType,
};

/// Flat bonus for raw land when raw land is preferred.
pub const RAW_LAND_BONUS: f64 = 10.0;
/// Flat bonus for a matching cabin or house.
pub const STRUCTURE_MATCH_BONUS: f64 = 15.0;
/// Points per preferred terrain tag present.
pub const TERRAIN_TAG_POINTS: f64 = 5.0;
/// Peak of the distance-to-town curve.
pub const DISTANCE_PEAK: f64 = 10.0;
/// Penalty when a listing is closer to town than wanted.
pub const TOO_CLOSE_PENALTY: f64 = -10.0;
/// Penalty when a listing is farther from town than wanted.
pub const TOO_FAR_PENALTY: f64 = -5.0;

/// Sum of the weights of every water preference the listing satisfies.
#[must_use]
pub fn water_score(property: &Property, criteria: &SearchCriteria) -> f64 {
    let Some(water) = property.water_features.as_ref().filter(|w| w.has_water) else {
        return 0.0;
    };

    criteria
        .water_preferences
        .iter()
        .filter(|preference| match preference.kind {
            WaterPreferenceType::YearRoundWater => water.year_round == Some(true),
            WaterPreferenceType::PondLake => {
                water.has_type(WaterType::Pond) || water.has_type(WaterType::Lake)
            }
            WaterPreferenceType::Well => water.has_type(WaterType::Well),
            WaterPreferenceType::Creek => {
                water.has_type(WaterType::Creek)
                    || water.has_type(WaterType::River)
                    || water.has_type(WaterType::Spring)
            }
            WaterPreferenceType::AnyWater => true,
        })
        .map(|preference| preference.weight)
        .sum()
}

/// Bonus for matching the structure preference.
#[must_use]
pub fn structure_score(property: &Property, criteria: &SearchCriteria) -> f64 {
    let structure_type = property
        .structures
        .as_ref()
        .filter(|s| s.has_structures)
        .and_then(|s| s.structure_type);

    match criteria.structure_preference {
        None | Some(StructurePreference::Any) => 0.0,
        Some(StructurePreference::RawLand) if !property.has_structures() => RAW_LAND_BONUS,
        Some(StructurePreference::WithCabin) if structure_type == Some(StructureType::Cabin) => {
            STRUCTURE_MATCH_BONUS
        }
        Some(StructurePreference::WithHouse) if structure_type == Some(StructureType::House) => {
            STRUCTURE_MATCH_BONUS
        }
        Some(_) => 0.0,
    }
}

/// Points for each preferred terrain tag the listing carries.
#[must_use]
pub fn terrain_score(property: &Property, criteria: &SearchCriteria) -> f64 {
    let Some(tags) = &property.terrain_tags else {
        return 0.0;
    };

    let matches = criteria
        .terrain
        .iter()
        .filter(|preferred| tags.contains(preferred))
        .count();

    // Tag lists are short.
    #[allow(clippy::cast_precision_loss)]
    let matches = matches as f64;
    TERRAIN_TAG_POINTS * matches
}

/// Sum of the configured weights of utilities the listing has.
#[must_use]
pub fn utility_score(property: &Property, criteria: &SearchCriteria) -> f64 {
    let (Some(weights), Some(utilities)) = (&criteria.utility_weights, &property.utilities) else {
        return 0.0;
    };

    [
        (utilities.power, weights.power),
        (utilities.water, weights.water),
        (utilities.internet, weights.internet),
        (utilities.sewer, weights.sewer),
    ]
    .into_iter()
    .filter_map(|(present, weight)| (present == Some(true)).then_some(weight.unwrap_or(0.0)))
    .sum()
}

/// Triangular score peaking at the middle of the preferred range.
///
/// Below the range is penalized harder than above it.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn distance_score(property: &Property, criteria: &SearchCriteria) -> f64 {
    let (Some(range), Some(distance)) = (&criteria.distance_to_town, property.distance_to_town_minutes)
    else {
        return 0.0;
    };

    if distance < range.min {
        return TOO_CLOSE_PENALTY;
    }
    if distance > range.max {
        return TOO_FAR_PENALTY;
    }

    let midpoint = (range.min + range.max) / 2.0;
    let width = range.max - range.min;
    if width == 0.0 {
        return if distance == midpoint { DISTANCE_PEAK } else { 0.0 };
    }

    (DISTANCE_PEAK * (1.0 - (distance - midpoint).abs() / (width / 2.0))).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use landscout_core::{
        DistanceRange, Structures, TerrainType, UtilityWeights, Utilities, WaterFeatures,
        WaterPreference,
    };

    fn listing() -> Property {
        Property::new("landwatch", "1", "https://example.com/1", "Parcel")
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn water(types: Vec<WaterType>, year_round: Option<bool>) -> Property {
        Property {
            water_features: Some(WaterFeatures {
                has_water: true,
                types: Some(types),
                year_round,
            }),
            ..listing()
        }
    }

    fn water_criteria(kinds: &[(WaterPreferenceType, f64)]) -> SearchCriteria {
        SearchCriteria {
            water_preferences: kinds
                .iter()
                .map(|(kind, weight)| WaterPreference {
                    kind: *kind,
                    weight: *weight,
                })
                .collect(),
            ..SearchCriteria::default()
        }
    }

    fn structures(kind: Option<StructureType>) -> Property {
        Property {
            structures: Some(Structures {
                has_structures: true,
                structure_type: kind,
                count: Some(1),
            }),
            ..listing()
        }
    }

    fn prefer(preference: StructurePreference) -> SearchCriteria {
        SearchCriteria {
            structure_preference: Some(preference),
            ..SearchCriteria::default()
        }
    }

    fn distance(min: f64, max: f64) -> SearchCriteria {
        SearchCriteria {
            distance_to_town: Some(DistanceRange { min, max }),
            ..SearchCriteria::default()
        }
    }

    fn at(minutes: f64) -> Property {
        Property {
            distance_to_town_minutes: Some(minutes),
            ..listing()
        }
    }

    #[test]
    fn test_water_multiple_preferences_accumulate() {
        let criteria = water_criteria(&[
            (WaterPreferenceType::YearRoundWater, 20.0),
            (WaterPreferenceType::Creek, 8.0),
            (WaterPreferenceType::AnyWater, 3.0),
            (WaterPreferenceType::Well, 50.0),
        ]);
        let property = water(vec![WaterType::River], Some(true));
        assert!(approx(water_score(&property, &criteria), 31.0));
    }

    #[test]
    fn test_water_pond_or_lake() {
        let criteria = water_criteria(&[(WaterPreferenceType::PondLake, 12.0)]);
        assert!(approx(water_score(&water(vec![WaterType::Lake], None), &criteria), 12.0));
        assert!(approx(water_score(&water(vec![WaterType::Pond], None), &criteria), 12.0));
        assert!(approx(water_score(&water(vec![WaterType::Well], None), &criteria), 0.0));
    }

    #[test]
    fn test_water_requires_has_water() {
        let criteria = water_criteria(&[(WaterPreferenceType::AnyWater, 5.0)]);
        let dry = Property {
            water_features: Some(WaterFeatures {
                has_water: false,
                types: Some(vec![WaterType::Creek]),
                year_round: Some(true),
            }),
            ..listing()
        };
        assert!(approx(water_score(&dry, &criteria), 0.0));
        assert!(approx(water_score(&listing(), &criteria), 0.0));
    }

    #[test]
    fn test_year_round_needs_explicit_true() {
        let criteria = water_criteria(&[(WaterPreferenceType::YearRoundWater, 20.0)]);
        assert!(approx(water_score(&water(vec![], None), &criteria), 0.0));
        assert!(approx(water_score(&water(vec![], Some(false)), &criteria), 0.0));
    }

    #[test]
    fn test_structure_raw_land() {
        let criteria = prefer(StructurePreference::RawLand);
        assert!(approx(structure_score(&listing(), &criteria), RAW_LAND_BONUS));
        assert!(approx(
            structure_score(&structures(Some(StructureType::Barn)), &criteria),
            0.0
        ));
    }

    #[test]
    fn test_structure_exact_type() {
        let cabin = structures(Some(StructureType::Cabin));
        assert!(approx(
            structure_score(&cabin, &prefer(StructurePreference::WithCabin)),
            STRUCTURE_MATCH_BONUS
        ));
        assert!(approx(
            structure_score(&cabin, &prefer(StructurePreference::WithHouse)),
            0.0
        ));
        assert!(approx(
            structure_score(&structures(None), &prefer(StructurePreference::WithCabin)),
            0.0
        ));
        assert!(approx(
            structure_score(&cabin, &prefer(StructurePreference::Any)),
            0.0
        ));
        assert!(approx(structure_score(&cabin, &SearchCriteria::default()), 0.0));
    }

    #[test]
    fn test_terrain_counts_matches() {
        let criteria = SearchCriteria {
            terrain: vec![TerrainType::Forested, TerrainType::Mountain, TerrainType::Green],
            ..SearchCriteria::default()
        };
        let property = Property {
            terrain_tags: Some(vec![TerrainType::Mountain, TerrainType::Forested]),
            ..listing()
        };
        assert!(approx(terrain_score(&property, &criteria), 10.0));
        assert!(approx(terrain_score(&listing(), &criteria), 0.0));
    }

    #[test]
    fn test_utilities_only_true_flags() {
        let criteria = SearchCriteria {
            utility_weights: Some(UtilityWeights {
                power: Some(5.0),
                water: Some(3.0),
                internet: Some(7.0),
                sewer: None,
            }),
            ..SearchCriteria::default()
        };
        let property = Property {
            utilities: Some(Utilities {
                power: Some(true),
                water: Some(false),
                sewer: Some(true),
                internet: Some(true),
                gas: Some(true),
            }),
            ..listing()
        };
        assert!(approx(utility_score(&property, &criteria), 12.0));
        assert!(approx(utility_score(&listing(), &criteria), 0.0));
    }

    #[test]
    fn test_distance_curve() {
        let criteria = distance(10.0, 30.0);
        assert!(approx(distance_score(&at(20.0), &criteria), 10.0));
        assert!(approx(distance_score(&at(15.0), &criteria), 5.0));
        assert!(approx(distance_score(&at(30.0), &criteria), 0.0));
        assert!(approx(distance_score(&at(10.0), &criteria), 0.0));
        assert!(approx(distance_score(&at(5.0), &criteria), TOO_CLOSE_PENALTY));
        assert!(approx(distance_score(&at(45.0), &criteria), TOO_FAR_PENALTY));
        assert!(approx(distance_score(&listing(), &criteria), 0.0));
    }

    #[test]
    fn test_distance_degenerate_range() {
        let criteria = distance(20.0, 20.0);
        assert!(approx(distance_score(&at(20.0), &criteria), DISTANCE_PEAK));
        assert!(approx(distance_score(&at(21.0), &criteria), TOO_FAR_PENALTY));
    }

    #[test]
    fn test_distance_degenerate_range_exact_match() {
        let criteria = distance(0.3, 0.3);
        assert!(approx(distance_score(&at(0.3), &criteria), DISTANCE_PEAK));
        // 0.1 + 0.2 lands one ulp above 0.3
        assert!(approx(distance_score(&at(0.1 + 0.2), &criteria), TOO_FAR_PENALTY));
    }
}
