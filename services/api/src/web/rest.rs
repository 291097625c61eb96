//! services/api/src/web/rest.rs
//!
//! Contains the API payload structs shared by the handlers and the master
//! definition for the OpenAPI specification.

use chrono::{DateTime, Utc};
use parts_finder_core::catalog::{COMMON_PARTS, VEHICLE_MAKES, VEHICLE_YEARS};
use parts_finder_core::domain::{Product, SearchOutcome, Session, VehicleDescriptor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::{OpenApi, ToSchema};

use crate::web::{auth, pages, search};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::login_handler,
        auth::logout_handler,
        search::search_parts_public_handler,
        search::search_parts_handler,
        pages::vehicles_handler,
        pages::health_handler,
    ),
    components(
        schemas(
            LoginRequest,
            LoginResponse,
            UserResponse,
            ProductResponse,
            SearchInfo,
            SearchResponse,
            ErrorResponse,
            VehicleCatalogResponse,
            HealthResponse,
        )
    ),
    tags(
        (
            name = "Auto Parts Finder API",
            description = "Search automotive replacement parts across US retailers."
        )
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Authentication Payloads
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct UserResponse {
    pub user_id: String,
    pub user_name: String,
    pub user_email: String,
    pub login_time: DateTime<Utc>,
}

impl From<&Session> for UserResponse {
    fn from(session: &Session) -> Self {
        Self {
            user_id: session.user_id.clone(),
            user_name: session.display_name.clone(),
            user_email: session.email.clone(),
            login_time: session.login_time,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserResponse>,
}

/// Body of every error response.
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

//=========================================================================================
// Search Payloads
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct ProductResponse {
    pub product_id: String,
    pub title: String,
    /// Display price, e.g. `$29.99`.
    pub price: String,
    pub price_numeric: f64,
    /// Store name.
    pub source: String,
    pub link: String,
    pub rating: Option<String>,
    pub reviews: Option<String>,
    pub part_type: String,
    pub availability: String,
    /// `demo`, `api` or `scraped`.
    pub search_source: String,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            product_id: p.product_id,
            title: p.title,
            price: p.price_display,
            price_numeric: p.price,
            source: p.store,
            link: p.link,
            rating: p.rating.map(|r| format!("{:.1}", r)),
            reviews: p.review_count.map(|r| r.to_string()),
            part_type: p.part_type.as_str().to_string(),
            availability: p.availability.as_str().to_string(),
            search_source: p.origin.as_str().to_string(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct SearchInfo {
    pub query: String,
    pub effective_query: String,
    pub has_image: bool,
    pub image_description: Option<String>,
    pub vehicle: Option<String>,
    pub source: String,
    pub cached: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize, ToSchema)]
pub struct SearchResponse {
    pub success: bool,
    pub products: Vec<ProductResponse>,
    pub count: usize,
    pub search_info: SearchInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub premium: Option<bool>,
}

impl SearchResponse {
    pub fn from_outcome(
        outcome: SearchOutcome,
        query: String,
        has_image: bool,
        vehicle: Option<&VehicleDescriptor>,
        premium: bool,
    ) -> Self {
        let products: Vec<ProductResponse> =
            outcome.products.into_iter().map(ProductResponse::from).collect();
        Self {
            success: true,
            count: products.len(),
            products,
            search_info: SearchInfo {
                query,
                effective_query: outcome.effective_query,
                has_image,
                image_description: outcome.image_description,
                vehicle: vehicle.map(VehicleDescriptor::display_label),
                source: outcome.source.to_string(),
                cached: outcome.cached,
                timestamp: Utc::now(),
            },
            premium: premium.then_some(true),
        }
    }
}

//=========================================================================================
// Reference and Status Payloads
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct VehicleCatalogResponse {
    pub makes: BTreeMap<String, Vec<String>>,
    pub years: Vec<u16>,
    pub common_parts: Vec<String>,
}

impl VehicleCatalogResponse {
    pub fn build() -> Self {
        Self {
            makes: VEHICLE_MAKES
                .iter()
                .map(|(make, models)| {
                    (
                        make.to_string(),
                        models.iter().map(|m| m.to_string()).collect(),
                    )
                })
                .collect(),
            years: VEHICLE_YEARS.collect(),
            common_parts: COMMON_PARTS.iter().map(|p| p.to_string()).collect(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub search_api: bool,
    pub scraper: bool,
    pub vision: bool,
    pub remote_identity: bool,
}
