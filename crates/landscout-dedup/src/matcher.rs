//! The matcher strategy trait.

use landscout_core::{Property, PropertyId};

/// A candidate judged to be the same parcel.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateMatch {
    /// Id of the matching candidate
    pub candidate_id: PropertyId,
    /// Confidence in `(0, 1]`
    pub confidence: f64,
}

/// One heuristic for spotting duplicate listings.
pub trait DuplicateMatcher: Send + Sync {
    /// Stable name, recorded as the match method on links.
    fn name(&self) -> &str;

    /// Candidates from `pool` that match `property`.
    ///
    /// Implementations skip `property` itself when it appears in the pool.
    fn find_duplicates(&self, property: &Property, pool: &[Property]) -> Vec<DuplicateMatch>;
}
