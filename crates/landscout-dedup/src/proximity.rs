//! Matching on geographic proximity.

use crate::matcher::{DuplicateMatch, DuplicateMatcher};
use landscout_core::{Coordinates, Property};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Confidence tiers: (maximum distance in meters, confidence).
const TIERS: [(f64, f64); 3] = [(10.0, 1.0), (50.0, 0.9), (100.0, 0.7)];

/// Great-circle distance in meters between two points.
#[must_use]
pub fn haversine_distance(a: Coordinates, b: Coordinates) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let d_phi = (b.latitude - a.latitude).to_radians();
    let d_lambda = (b.longitude - a.longitude).to_radians();

    let h = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}

/// Confidence for a separation in meters, `None` beyond the last tier.
#[must_use]
pub fn confidence_for_distance(meters: f64) -> Option<f64> {
    TIERS
        .iter()
        .find(|(max, _)| meters <= *max)
        .map(|(_, confidence)| *confidence)
}

/// Matches listings whose coordinates are within 100 meters.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProximityMatcher;

impl DuplicateMatcher for ProximityMatcher {
    fn name(&self) -> &str {
        "coordinate-matcher"
    }

    fn find_duplicates(&self, property: &Property, pool: &[Property]) -> Vec<DuplicateMatch> {
        let Some(origin) = property.coordinates else {
            return Vec::new();
        };

        pool.iter()
            .filter(|candidate| candidate.id != property.id)
            .filter_map(|candidate| {
                let coordinates = candidate.coordinates?;
                let confidence = confidence_for_distance(haversine_distance(origin, coordinates))?;
                Some(DuplicateMatch {
                    candidate_id: candidate.id.clone(),
                    confidence,
                })
            })
            .collect()
    }
}
