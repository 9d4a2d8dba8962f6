//! Landscout Dedup - finding the same parcel listed on several sites.
//!
//! Matching is heuristic. Each [`DuplicateMatcher`] compares one listing
//! against a pool of candidates; [`MatcherSet::find_links`] runs every
//! matcher over a whole batch and turns matches into directed
//! [`DuplicateLink`]s from the canonical listing to its duplicate.
//!
//! # Modules
//!
//! - [`matcher`] - the matcher trait
//! - [`identifier`] - external listing number (MLS) matching
//! - [`proximity`] - great-circle distance matching
//! - [`canonical`] - deterministic canonical selection
//! - [`engine`] - batch matching across all matchers

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_panics_doc)]

pub mod canonical;
pub mod engine;
pub mod identifier;
pub mod matcher;
pub mod proximity;

pub use canonical::select_canonical;
pub use engine::{DuplicateLink, MatcherSet};
pub use identifier::IdentifierMatcher;
pub use matcher::{DuplicateMatch, DuplicateMatcher};
pub use proximity::{haversine_distance, ProximityMatcher};
