//! Landscout Scoring - desirability of a listing against search criteria.
//!
//! Scoring is a pure function: the same listing and criteria always give the
//! same score. The score is the sum of five independent components (water,
//! structures, terrain, utilities, distance to town), rounded to two
//! decimal places.
//!
//! # Example
//!
//! ```rust
//! use landscout_core::{Property, SearchCriteria};
//! use landscout_scoring::score_property;
//!
//! let property = Property::new("landwatch", "1", "https://example.com/1", "40 acres");
//! assert_eq!(score_property(&property, &SearchCriteria::default()), 0.0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod components;

use landscout_core::{Property, SearchCriteria};

/// Score a listing against the criteria.
#[must_use]
pub fn score_property(property: &Property, criteria: &SearchCriteria) -> f64 {
    let total = components::water_score(property, criteria)
        + components::structure_score(property, criteria)
        + components::terrain_score(property, criteria)
        + components::utility_score(property, criteria)
        + components::distance_score(property, criteria);

    round_to_cents(total)
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
