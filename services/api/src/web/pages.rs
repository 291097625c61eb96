//! services/api/src/web/pages.rs
//!
//! The navigational routes (`/`, `/login`, `/search`) and the reference
//! endpoints. The service renders no HTML; these return JSON or redirects.

use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
    Extension, Json,
};
use parts_finder_core::domain::Session;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::web::middleware::session_from_headers;
use crate::web::rest::{HealthResponse, UserResponse, VehicleCatalogResponse};
use crate::web::state::AppState;

/// GET / - Service index
pub async fn index_handler(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Json<Value> {
    let user = session_from_headers(&state, &headers)
        .await
        .map(|session| UserResponse::from(&session));

    Json(json!({
        "name": "Auto Parts Finder",
        "version": env!("CARGO_PKG_VERSION"),
        "logged_in": user.is_some(),
        "user": user,
        "endpoints": {
            "login": "POST /api/login",
            "logout": "GET /logout",
            "search_public": "POST /api/search-parts-public",
            "search": "POST /api/search-parts",
            "vehicles": "GET /api/vehicles",
            "health": "GET /health",
            "docs": "GET /swagger-ui",
        },
        "vehicles": VehicleCatalogResponse::build(),
    }))
}

/// GET /login - Logged-in users go straight to search
pub async fn login_page_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Response {
    if session_from_headers(&state, &headers).await.is_some() {
        return Redirect::to("/search").into_response();
    }

    let mut hint = json!({
        "message": "POST your email and password as JSON to /api/login",
        "login_endpoint": "/api/login",
    });
    if !state.remote_identity {
        hint["demo_account"] = json!({
            "email": crate::adapters::credentials::DEMO_EMAIL,
            "password": crate::adapters::credentials::DEMO_PASSWORD,
        });
    }
    Json(hint).into_response()
}

/// GET /search - The logged-in landing page
pub async fn search_page_handler(Extension(session): Extension<Session>) -> Json<Value> {
    Json(json!({
        "user": UserResponse::from(&session),
        "search_endpoint": "/api/search-parts",
        "form_fields": ["query", "vehicle_year", "vehicle_make", "vehicle_model", "image"],
    }))
}

/// GET /api/vehicles - Makes, models, years and common parts for the search form
#[utoipa::path(
    get,
    path = "/api/vehicles",
    responses(
        (status = 200, description = "Vehicle catalog", body = VehicleCatalogResponse)
    )
)]
pub async fn vehicles_handler() -> Json<VehicleCatalogResponse> {
    Json(VehicleCatalogResponse::build())
}

/// GET /health - Liveness and which optional features are configured
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        search_api: state.search.has_provider(),
        scraper: state.search.has_scraper(),
        vision: state.search.has_describer(),
        remote_identity: state.remote_identity,
    })
}
