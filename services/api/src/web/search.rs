//! services/api/src/web/search.rs
//!
//! The parts search endpoints. Both accept the same multipart form; the
//! session-gated one marks its response as premium.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use parts_finder_core::domain::{SearchRequest, VehicleDescriptor};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::imaging::prepare_for_vision;
use crate::web::rest::{ErrorResponse, SearchResponse};
use crate::web::state::AppState;

const INVALID_IMAGE_MESSAGE: &str = "Invalid image. Use JPG, PNG or WEBP.";

/// The fields of the search form, as submitted.
#[derive(Debug, Default)]
struct SearchForm {
    query: Option<String>,
    vehicle_year: Option<String>,
    vehicle_make: Option<String>,
    vehicle_model: Option<String>,
    image: Option<Vec<u8>>,
}

impl SearchForm {
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = SearchForm::default();

        while let Some(field) = multipart.next_field().await.map_err(|e| {
            warn!("Failed to read multipart field: {}", e);
            ApiError::InvalidInput("Invalid form data".to_string())
        })? {
            let name = field.name().unwrap_or_default().to_string();
            if name == "image" {
                let bytes = field.bytes().await.map_err(|e| {
                    warn!("Failed to read uploaded image: {}", e);
                    ApiError::InvalidInput("Invalid form data".to_string())
                })?;
                // Browsers send an empty part when no file was chosen.
                if !bytes.is_empty() {
                    form.image = Some(bytes.to_vec());
                }
                continue;
            }

            let text = field.text().await.map_err(|e| {
                warn!("Failed to read form field '{}': {}", name, e);
                ApiError::InvalidInput("Invalid form data".to_string())
            })?;
            match name.as_str() {
                "query" => form.query = Some(text),
                "vehicle_year" => form.vehicle_year = Some(text),
                "vehicle_make" => form.vehicle_make = Some(text),
                "vehicle_model" => form.vehicle_model = Some(text),
                _ => {}
            }
        }

        Ok(form)
    }
}

/// Validates the upload and converts it to a bounded RGB JPEG on the blocking pool.
async fn normalize_upload(bytes: Vec<u8>) -> Result<Vec<u8>, ApiError> {
    tokio::task::spawn_blocking(move || prepare_for_vision(&bytes))
        .await
        .map_err(|e| ApiError::Internal(format!("Image task failed: {}", e)))?
        .map_err(|e| {
            info!("Rejected uploaded image: {}", e);
            ApiError::InvalidInput(INVALID_IMAGE_MESSAGE.to_string())
        })
}

/// Reads the form, validates it, runs the search and shapes the response.
async fn run_search(
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
    premium: bool,
) -> Result<Json<SearchResponse>, ApiError> {
    let multipart = multipart.map_err(|e| {
        info!("Rejected search request: {}", e);
        ApiError::InvalidInput("Send the search as multipart form data".to_string())
    })?;
    let form = SearchForm::read(multipart).await?;

    let image = match form.image {
        Some(bytes) => Some(normalize_upload(bytes).await?),
        None => None,
    };

    let vehicle = VehicleDescriptor::from_fields(
        form.vehicle_year.as_deref(),
        form.vehicle_make.as_deref(),
        form.vehicle_model.as_deref(),
    );
    let query = form.query.as_deref().unwrap_or_default().trim().to_string();
    let has_image = image.is_some();

    let outcome = state
        .search
        .search(SearchRequest {
            query: Some(query.clone()),
            image,
            vehicle: vehicle.clone(),
        })
        .await?;

    info!(
        "Search '{}' returned {} products from {}",
        outcome.effective_query,
        outcome.products.len(),
        outcome.source
    );

    Ok(Json(SearchResponse::from_outcome(
        outcome,
        query,
        has_image,
        vehicle.as_ref(),
        premium,
    )))
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /api/search-parts-public - Search without an account
#[utoipa::path(
    post,
    path = "/api/search-parts-public",
    request_body(
        content_type = "multipart/form-data",
        description = "Fields: query, vehicle_year, vehicle_make, vehicle_model, image"
    ),
    responses(
        (status = 200, description = "Search results", body = SearchResponse),
        (status = 400, description = "No query or image, or a bad image", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn search_parts_public_handler(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    run_search(&state, multipart, false).await
}

/// POST /api/search-parts - Search for logged-in users
#[utoipa::path(
    post,
    path = "/api/search-parts",
    request_body(
        content_type = "multipart/form-data",
        description = "Fields: query, vehicle_year, vehicle_make, vehicle_model, image"
    ),
    responses(
        (status = 200, description = "Search results marked premium", body = SearchResponse),
        (status = 400, description = "No query or image, or a bad image", body = ErrorResponse),
        (status = 401, description = "Not logged in", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn search_parts_handler(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    run_search(&state, multipart, true).await
}
