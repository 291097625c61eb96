//! crates/parts_finder_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any web framework or serialization format.

use chrono::{DateTime, Duration, Utc};
use std::fmt;
use uuid::Uuid;

//=========================================================================================
// Identity and Sessions
//=========================================================================================

/// The identity returned by a credential verifier after a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub user_id: String,
    pub email: String,
    pub display_name: String,
    /// Token issued by a remote identity provider, if any.
    pub id_token: Option<String>,
}

/// A browser login session, keyed by the id carried in the signed cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: Uuid,
    pub user_id: String,
    pub display_name: String,
    pub email: String,
    pub login_time: DateTime<Utc>,
}

impl Session {
    /// Creates a fresh session for `identity`, stamped with the current time.
    pub fn for_identity(identity: &UserIdentity) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: identity.user_id.clone(),
            display_name: identity.display_name.clone(),
            email: identity.email.clone(),
            login_time: Utc::now(),
        }
    }

    /// Whether `lifetime` has fully elapsed since login at the instant `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>, lifetime: Duration) -> bool {
        now - self.login_time >= lifetime
    }
}

//=========================================================================================
// Vehicles
//=========================================================================================

/// Optional year/make/model triple used to refine a search query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VehicleDescriptor {
    pub year: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
}

impl VehicleDescriptor {
    /// Builds a descriptor from raw form fields. Blank fields are dropped and an
    /// all-blank descriptor collapses to `None`.
    pub fn from_fields(
        year: Option<&str>,
        make: Option<&str>,
        model: Option<&str>,
    ) -> Option<Self> {
        fn clean(value: Option<&str>) -> Option<String> {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        }

        let descriptor = Self {
            year: clean(year),
            make: clean(make),
            model: clean(model),
        };
        (!descriptor.is_empty()).then_some(descriptor)
    }

    pub fn is_empty(&self) -> bool {
        self.year.is_none() && self.make.is_none() && self.model.is_none()
    }

    /// The query prefix, in the fixed order year, make, model.
    pub fn query_terms(&self) -> impl Iterator<Item = &str> {
        [&self.year, &self.make, &self.model]
            .into_iter()
            .filter_map(|field| field.as_deref())
    }

    /// A human-readable label such as `2015 Chevrolet SILVERADO`.
    pub fn display_label(&self) -> String {
        let mut parts = Vec::with_capacity(3);
        if let Some(year) = &self.year {
            parts.push(year.clone());
        }
        if let Some(make) = &self.make {
            parts.push(crate::catalog::title_case(make));
        }
        if let Some(model) = &self.model {
            parts.push(model.to_uppercase());
        }
        parts.join(" ")
    }
}

//=========================================================================================
// Products
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartType {
    Oem,
    Aftermarket,
}

impl PartType {
    /// Guesses the part type from a listing title.
    pub fn from_title(title: &str) -> Self {
        let lower = title.to_lowercase();
        if ["oem", "genuine", "original equipment", "factory"]
            .iter()
            .any(|kw| lower.contains(kw))
        {
            PartType::Oem
        } else {
            PartType::Aftermarket
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PartType::Oem => "OEM",
            PartType::Aftermarket => "Aftermarket",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    InStock,
    LimitedStock,
    CheckStore,
}

impl Availability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::InStock => "In Stock",
            Availability::LimitedStock => "Limited Stock",
            Availability::CheckStore => "Check Store",
        }
    }
}

/// Where a list of products came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchSource {
    Demo,
    Api,
    Scraped,
}

impl SearchSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchSource::Demo => "demo",
            SearchSource::Api => "api",
            SearchSource::Scraped => "scraped",
        }
    }
}

impl fmt::Display for SearchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single product listing. Created fresh for every search and never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub product_id: String,
    pub title: String,
    pub price: f64,
    pub price_display: String,
    pub store: String,
    pub link: String,
    pub rating: Option<f32>,
    pub review_count: Option<u32>,
    pub part_type: PartType,
    pub availability: Availability,
    pub origin: SearchSource,
}

/// Formats a numeric price the way listings display it, e.g. `$29.99`.
pub fn format_price(amount: f64) -> String {
    format!("${:.2}", amount)
}

//=========================================================================================
// Search Requests and Outcomes
//=========================================================================================

/// Everything a caller may supply to a parts search.
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub query: Option<String>,
    pub image: Option<Vec<u8>>,
    pub vehicle: Option<VehicleDescriptor>,
}

/// The result of a parts search, with enough context for the caller to explain it.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub effective_query: String,
    pub products: Vec<Product>,
    pub source: SearchSource,
    pub image_description: Option<String>,
    pub cached: bool,
}
