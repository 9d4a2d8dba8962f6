//! Matching on an external listing number such as an MLS number.

use crate::matcher::{DuplicateMatch, DuplicateMatcher};
use landscout_core::Property;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// Raw payload keys that may carry the listing number, in lookup order.
const PAYLOAD_KEYS: [&str; 3] = ["mlsNumber", "mls_number", "mls"];

static MLS_REGEX: OnceLock<Regex> = OnceLock::new();

/// Normalized external listing number of a property, if it has one.
///
/// Structured payload fields win over the description text.
#[must_use]
pub fn extract_identifier(property: &Property) -> Option<String> {
    if let Some(raw) = &property.raw_data {
        for key in PAYLOAD_KEYS {
            let value = match raw.get(key) {
                Some(Value::String(s)) => s.trim().to_uppercase(),
                Some(Value::Number(n)) => n.to_string(),
                _ => continue,
            };
            if !value.is_empty() {
                return Some(value);
            }
        }
    }

    let description = property.description.as_deref()?;
    let regex = MLS_REGEX
        .get_or_init(|| Regex::new(r"(?i)MLS[#:\s]*([A-Z0-9-]+)").expect("valid regex"));
    regex
        .captures(description)
        .map(|caps| caps[1].to_uppercase())
}

/// Matches listings carrying the same external listing number.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentifierMatcher;

impl DuplicateMatcher for IdentifierMatcher {
    fn name(&self) -> &str {
        "mls-matcher"
    }

    fn find_duplicates(&self, property: &Property, pool: &[Property]) -> Vec<DuplicateMatch> {
        let Some(identifier) = extract_identifier(property) else {
            return Vec::new();
        };

        pool.iter()
            .filter(|candidate| candidate.id != property.id)
            .filter(|candidate| {
                extract_identifier(candidate).as_deref() == Some(identifier.as_str())
            })
            .map(|candidate| DuplicateMatch {
                candidate_id: candidate.id.clone(),
                confidence: 1.0,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use landscout_core::RawPayload;

    fn with_payload(source: &str, key: &str, value: Value) -> Property {
        let mut raw = RawPayload::new();
        raw.insert(key.to_string(), value);
        Property {
            raw_data: Some(raw),
            ..Property::new(source, "1", "https://example.com", "Parcel")
        }
    }

    fn with_description(source: &str, text: &str) -> Property {
        Property {
            description: Some(text.to_string()),
            ..Property::new(source, "1", "https://example.com", "Parcel")
        }
    }

    #[test]
    fn test_extract_from_payload_keys() {
        let p = with_payload("landwatch", "mlsNumber", Value::from(" ab-123 "));
        assert_eq!(extract_identifier(&p).as_deref(), Some("AB-123"));

        let p = with_payload("landwatch", "mls_number", Value::from("x9"));
        assert_eq!(extract_identifier(&p).as_deref(), Some("X9"));

        let p = with_payload("landwatch", "mls", Value::from(30_012_345));
        assert_eq!(extract_identifier(&p).as_deref(), Some("30012345"));
    }

    #[test]
    fn test_extract_from_description() {
        let p = with_description("zillow", "Great views. mls# 30012345 call today");
        assert_eq!(extract_identifier(&p).as_deref(), Some("30012345"));

        let p = with_description("zillow", "MLS: ab-77");
        assert_eq!(extract_identifier(&p).as_deref(), Some("AB-77"));
    }

    #[test]
    fn test_no_identifier() {
        let p = with_payload("landwatch", "mlsNumber", Value::from(""));
        assert_eq!(extract_identifier(&p), None);
        assert_eq!(
            extract_identifier(&with_description("zillow", "No listing number here")),
            None
        );
    }

    #[test]
    fn test_matches_across_payload_and_description() {
        let a = with_payload("landwatch", "mlsNumber", Value::from("30012345"));
        let b = with_description("zillow", "MLS #30012345");
        let c = with_description("landsearch", "MLS #99999");

        let pool = vec![a.clone(), b.clone(), c];
        let matches = IdentifierMatcher.find_duplicates(&a, &pool);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].candidate_id, b.id);
        assert!((matches[0].confidence - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_without_identifier_no_matches() {
        let a = with_description("landwatch", "Quiet meadow");
        let b = with_description("zillow", "Quiet meadow");
        assert!(IdentifierMatcher.find_duplicates(&a, &[b]).is_empty());
    }
}
