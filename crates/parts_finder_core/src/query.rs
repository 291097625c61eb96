//! crates/parts_finder_core/src/query.rs
//!
//! Assembles the effective search string from the vehicle descriptor, the user's
//! text, and any description derived from an uploaded image.

use sha2::{Digest, Sha256};

use crate::domain::VehicleDescriptor;

/// Used when every input is blank (e.g. an image the vision model could not describe).
pub const FALLBACK_QUERY: &str = "auto parts";

/// Joins the inputs in precedence order: vehicle prefix, user text, image text.
/// Blank pieces are skipped and the result uses single spaces.
pub fn build_search_query(
    vehicle: Option<&VehicleDescriptor>,
    query: Option<&str>,
    image_description: Option<&str>,
) -> String {
    let mut parts: Vec<&str> = Vec::new();

    if let Some(vehicle) = vehicle {
        parts.extend(vehicle.query_terms());
    }
    parts.extend(query);
    parts.extend(image_description);

    let joined = parts
        .iter()
        .flat_map(|p| p.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ");

    if joined.is_empty() {
        FALLBACK_QUERY.to_string()
    } else {
        joined
    }
}

/// Lower-cased, trimmed, whitespace-collapsed form of a query.
pub fn normalize_query(query: &str) -> String {
    query
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Stable cache key: SHA-256 of the normalized query, hex encoded.
pub fn query_fingerprint(query: &str) -> String {
    let digest = Sha256::digest(normalize_query(query).as_bytes());
    hex::encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vehicle_prefix_comes_first() {
        let vehicle =
            VehicleDescriptor::from_fields(Some("2015"), Some("chevrolet"), Some("silverado"));
        let query = build_search_query(vehicle.as_ref(), Some("brake pads"), None);
        assert_eq!(query, "2015 chevrolet silverado brake pads");
    }

    #[test]
    fn image_text_is_appended_last() {
        let vehicle = VehicleDescriptor::from_fields(None, Some("ford"), None);
        let query =
            build_search_query(vehicle.as_ref(), Some("filter"), Some("oil filter canister"));
        assert_eq!(query, "ford filter oil filter canister");
    }

    #[test]
    fn partial_vehicle_keeps_order() {
        let vehicle = VehicleDescriptor::from_fields(Some("2010"), None, Some("camry"));
        assert_eq!(build_search_query(vehicle.as_ref(), None, None), "2010 camry");
    }

    #[test]
    fn empty_inputs_fall_back() {
        assert_eq!(build_search_query(None, Some("   "), None), FALLBACK_QUERY);
    }

    #[test]
    fn fingerprint_ignores_case_and_spacing() {
        assert_eq!(
            query_fingerprint("  Brake   PADS "),
            query_fingerprint("brake pads")
        );
        assert_ne!(query_fingerprint("brake pads"), query_fingerprint("brake rotors"));
        assert_eq!(query_fingerprint("x").len(), 64);
    }
}
