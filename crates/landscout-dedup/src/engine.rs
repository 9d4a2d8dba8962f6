//! Batch duplicate detection across all matchers.

use crate::canonical::select_canonical;
use crate::identifier::IdentifierMatcher;
use crate::matcher::DuplicateMatcher;
use crate::proximity::ProximityMatcher;
use landscout_core::{Property, PropertyId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// A directed duplicate assertion: `duplicate_id` duplicates `canonical_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateLink {
    /// The listing that represents the pair
    pub canonical_id: PropertyId,
    /// The listing judged a duplicate
    pub duplicate_id: PropertyId,
    /// Name of the matcher that found the pair
    pub method: String,
    /// Matcher confidence
    pub confidence: f64,
}

/// The matchers run over every search batch.
#[derive(Clone)]
pub struct MatcherSet {
    matchers: Vec<Arc<dyn DuplicateMatcher>>,
}

impl Default for MatcherSet {
    /// The identifier and proximity matchers.
    fn default() -> Self {
        Self::new(vec![
            Arc::new(IdentifierMatcher),
            Arc::new(ProximityMatcher),
        ])
    }
}

impl MatcherSet {
    /// A set running exactly the given matchers, in order.
    #[must_use]
    pub fn new(matchers: Vec<Arc<dyn DuplicateMatcher>>) -> Self {
        Self { matchers }
    }

    /// Names of the matchers in the set.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.matchers.iter().map(|m| m.name()).collect()
    }

    /// Compare every listing in the batch against the rest of the batch.
    ///
    /// A pair found from both sides yields one link per matcher. Links point
    /// from the canonical listing to its duplicate.
    #[must_use]
    pub fn find_links(&self, batch: &[Property]) -> Vec<DuplicateLink> {
        let by_id: HashMap<&PropertyId, &Property> = batch.iter().map(|p| (&p.id, p)).collect();
        let mut seen: HashSet<(PropertyId, PropertyId, String)> = HashSet::new();
        let mut links = Vec::new();

        for property in batch {
            for matcher in &self.matchers {
                for found in matcher.find_duplicates(property, batch) {
                    let Some(candidate) = by_id.get(&found.candidate_id) else {
                        continue;
                    };

                    let canonical_id = select_canonical(property, candidate).clone();
                    let duplicate_id = if canonical_id == property.id {
                        candidate.id.clone()
                    } else {
                        property.id.clone()
                    };
                    if canonical_id == duplicate_id {
                        continue;
                    }

                    let key = (
                        canonical_id.clone(),
                        duplicate_id.clone(),
                        matcher.name().to_string(),
                    );
                    if !seen.insert(key) {
                        continue;
                    }

                    debug!(
                        canonical = %canonical_id,
                        duplicate = %duplicate_id,
                        method = matcher.name(),
                        confidence = found.confidence,
                        "duplicate found"
                    );
                    links.push(DuplicateLink {
                        canonical_id,
                        duplicate_id,
                        method: matcher.name().to_string(),
                        confidence: found.confidence,
                    });
                }
            }
        }

        links
    }
}
