//! crates/parts_finder_core/src/relevance.rs
//!
//! Keyword allow-list used to judge whether an external listing is automotive.

use crate::domain::{PartType, Product, SearchSource};

/// Listings from the paid search API are kept only if their title mentions one of these.
pub const AUTOMOTIVE_KEYWORDS: &[&str] = &[
    "auto", "car", "truck", "vehicle", "automotive", "oem", "aftermarket", "part", "brake",
    "rotor", "caliper", "pad", "engine", "motor oil", "filter", "spark plug", "ignition",
    "battery", "alternator", "starter", "radiator", "water pump", "thermostat", "belt", "hose",
    "gasket", "sensor", "suspension", "strut", "shock", "control arm", "tie rod", "bearing",
    "axle", "cv joint", "exhaust", "muffler", "catalytic", "transmission", "clutch", "headlight",
    "taillight", "bulb", "wiper", "mirror", "bumper", "fender", "tire", "wheel", "hub",
];

/// Upper bound on relabelled API listings returned to the caller.
pub const MAX_EXTERNAL_RESULTS: usize = 12;

pub fn is_automotive(title: &str) -> bool {
    let lower = title.to_lowercase();
    AUTOMOTIVE_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// Drops non-automotive or unpriced listings and relabels the rest for display.
pub fn filter_and_relabel(products: Vec<Product>) -> Vec<Product> {
    products
        .into_iter()
        .filter(|p| p.price > 0.0 && !p.link.is_empty() && is_automotive(&p.title))
        .take(MAX_EXTERNAL_RESULTS)
        .map(|mut p| {
            p.part_type = PartType::from_title(&p.title);
            p.origin = SearchSource::Api;
            if p.store.trim().is_empty() {
                p.store = "Online Retailer".to_string();
            }
            p
        })
        .collect()
}
