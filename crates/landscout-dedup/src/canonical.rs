//! Picking the listing that represents a duplicate pair.

use landscout_core::{Property, PropertyId};
use std::cmp::Ordering;

/// The canonical id of a matched pair.
///
/// The listing with strictly higher field completeness wins; on a tie the
/// lexicographically smaller id wins, so the result does not depend on
/// argument order.
#[must_use]
pub fn select_canonical<'a>(a: &'a Property, b: &'a Property) -> &'a PropertyId {
    match a.field_completeness().cmp(&b.field_completeness()) {
        Ordering::Greater => &a.id,
        Ordering::Less => &b.id,
        Ordering::Equal => std::cmp::min(&a.id, &b.id),
    }
}
