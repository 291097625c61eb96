//! crates/parts_finder_core/src/catalog.rs
//!
//! Static reference data (retailers, vehicles) and the synthetic example listings
//! served when no real product source is configured or reachable.

use url::form_urlencoded;

use crate::domain::{format_price, Availability, PartType, Product, SearchSource};

//=========================================================================================
// Retailers
//=========================================================================================

/// The fixed set of retailers listings link out to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Retailer {
    AutoZone,
    AdvanceAutoParts,
    OReilly,
    Napa,
    RockAuto,
    AmazonAutomotive,
}

impl Retailer {
    pub const ALL: [Retailer; 6] = [
        Retailer::AutoZone,
        Retailer::AdvanceAutoParts,
        Retailer::OReilly,
        Retailer::Napa,
        Retailer::RockAuto,
        Retailer::AmazonAutomotive,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Retailer::AutoZone => "AutoZone",
            Retailer::AdvanceAutoParts => "Advance Auto Parts",
            Retailer::OReilly => "O'Reilly Auto Parts",
            Retailer::Napa => "NAPA",
            Retailer::RockAuto => "RockAuto",
            Retailer::AmazonAutomotive => "Amazon Automotive",
        }
    }

    pub fn base_url(&self) -> &'static str {
        match self {
            Retailer::AutoZone => "https://www.autozone.com",
            Retailer::AdvanceAutoParts => "https://shop.advanceautoparts.com",
            Retailer::OReilly => "https://www.oreillyauto.com",
            Retailer::Napa => "https://www.napaonline.com",
            Retailer::RockAuto => "https://www.rockauto.com",
            Retailer::AmazonAutomotive => "https://www.amazon.com",
        }
    }

    /// Path and query string of the retailer's own search page for `query`.
    pub fn search_path(&self, query: &str) -> String {
        let encoded: String = form_urlencoded::byte_serialize(query.as_bytes()).collect();
        match self {
            Retailer::AutoZone => format!("/c/auto-parts/search?query={}", encoded),
            Retailer::AdvanceAutoParts => format!("/search?searchTerm={}", encoded),
            Retailer::OReilly => format!("/search?q={}", encoded),
            Retailer::Napa => format!("/search?query={}", encoded),
            Retailer::RockAuto => format!(
                "/catalog/x,carcode,1,parttype,{}",
                encoded.replace('+', "%20")
            ),
            Retailer::AmazonAutomotive => {
                format!("/s?k={}+automotive&ref=nb_sb_noss", encoded)
            }
        }
    }

    pub fn search_url(&self, query: &str) -> String {
        format!("{}{}", self.base_url(), self.search_path(query))
    }
}

//=========================================================================================
// Vehicle Reference List
//=========================================================================================

/// Makes and models offered in selection menus. Not enforced at search time.
pub const VEHICLE_MAKES: &[(&str, &[&str])] = &[
    (
        "chevrolet",
        &["silverado", "equinox", "malibu", "tahoe", "suburban", "traverse", "camaro", "corvette"],
    ),
    (
        "ford",
        &["f150", "f250", "f350", "escape", "explorer", "mustang", "edge", "expedition"],
    ),
    (
        "toyota",
        &["camry", "corolla", "rav4", "highlander", "prius", "tacoma", "tundra", "sienna"],
    ),
    (
        "honda",
        &["civic", "accord", "crv", "pilot", "odyssey", "ridgeline", "passport"],
    ),
    (
        "nissan",
        &["altima", "sentra", "rogue", "murano", "pathfinder", "titan", "frontier"],
    ),
    (
        "jeep",
        &["wrangler", "grand cherokee", "cherokee", "compass", "renegade", "gladiator"],
    ),
    ("ram", &["1500", "2500", "3500", "promaster"]),
    ("gmc", &["sierra", "terrain", "acadia", "yukon", "canyon"]),
];

pub const VEHICLE_YEARS: std::ops::RangeInclusive<u16> = 1990..=2024;

pub const COMMON_PARTS: &[&str] = &[
    "brake pads",
    "brake rotors",
    "oil filter",
    "air filter",
    "spark plugs",
    "battery",
    "alternator",
    "starter",
    "radiator",
    "water pump",
];

//=========================================================================================
// Synthetic Listings
//=========================================================================================

pub const SYNTHETIC_RESULT_COUNT: usize = 6;

/// Per-index price ladder before the keyword bucket multiplier is applied.
const BASE_PRICES: [f64; SYNTHETIC_RESULT_COUNT] = [29.99, 45.99, 67.99, 89.99, 124.99, 199.99];

/// Keyword buckets, checked in order; the first match sets the multiplier.
const PRICE_BUCKETS: &[(&[&str], f64)] = &[
    (&["engine", "transmission", "turbo", "catalytic"], 4.0),
    (
        &[
            "alternator",
            "starter",
            "radiator",
            "water pump",
            "rotor",
            "strut",
            "shock",
            "axle",
            "compressor",
        ],
        1.5,
    ),
    (&["brake"], 1.0),
    (&["filter", "spark plug", "wiper", "bulb", "fuse"], 0.35),
];

/// Multiplier applied to the price ladder for a query.
pub fn price_multiplier(query: &str) -> f64 {
    let lower = query.to_lowercase();
    PRICE_BUCKETS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|kw| lower.contains(kw)))
        .map(|(_, multiplier)| *multiplier)
        .unwrap_or(1.0)
}

/// Price of the `index`-th synthetic listing, rounded to cents.
pub fn synthetic_price(query: &str, index: usize) -> f64 {
    let base = BASE_PRICES[index % BASE_PRICES.len()];
    (base * price_multiplier(query) * 100.0).round() / 100.0
}

/// Generates the six example listings for `query`. Deterministic for a given query.
pub fn synthetic_results(query: &str) -> Vec<Product> {
    let title = title_case(query);

    (0..SYNTHETIC_RESULT_COUNT)
        .map(|i| {
            let retailer = Retailer::ALL[i % Retailer::ALL.len()];
            let price = synthetic_price(query, i);
            let oem = i % 2 == 0;

            Product {
                product_id: format!("demo_product_{}", i + 1),
                title: format!(
                    "{} - {}",
                    title,
                    if oem { "Premium OEM" } else { "Aftermarket Quality" }
                ),
                price,
                price_display: format_price(price),
                store: retailer.name().to_string(),
                link: retailer.search_url(query),
                rating: Some(4.0 + i as f32 * 0.1),
                review_count: Some(100 + i as u32 * 50),
                part_type: if oem { PartType::Oem } else { PartType::Aftermarket },
                availability: if i % 3 == 0 {
                    Availability::LimitedStock
                } else {
                    Availability::InStock
                },
                origin: SearchSource::Demo,
            }
        })
        .collect()
}

/// Upper-cases the first letter of every alphabetic run and lower-cases the rest,
/// so `f150 brake pads` becomes `F150 Brake Pads`.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_alpha = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}
