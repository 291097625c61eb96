//! services/api/src/web/router.rs
//!
//! Assembles the full application router.

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::web::{
    auth::{login_handler, logout_handler},
    middleware::{require_auth, require_auth_page},
    pages::{
        health_handler, index_handler, login_page_handler, search_page_handler, vehicles_handler,
    },
    rest::ApiDoc,
    search::{search_parts_handler, search_parts_public_handler},
    state::AppState,
};

/// Builds the router with every route, the body limit, CORS, tracing and Swagger UI.
pub fn router(app_state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/", get(index_handler))
        .route("/login", get(login_page_handler))
        .route("/logout", get(logout_handler))
        .route("/health", get(health_handler))
        .route("/api/login", post(login_handler))
        .route("/api/vehicles", get(vehicles_handler))
        .route("/api/search-parts-public", post(search_parts_public_handler));

    // Protected API routes answer 401 JSON
    let protected_api = Router::new()
        .route("/api/search-parts", post(search_parts_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    // Protected pages redirect to the login page
    let protected_pages = Router::new()
        .route("/search", get(search_page_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth_page,
        ));

    let mut api_router = Router::new()
        .merge(public_routes)
        .merge(protected_api)
        .merge(protected_pages)
        .layer(DefaultBodyLimit::max(app_state.config.max_upload_bytes));

    if let Some(origin) = &app_state.config.cors_origin {
        match origin.parse::<HeaderValue>() {
            Ok(origin) => {
                let cors = CorsLayer::new()
                    .allow_origin(origin)
                    .allow_credentials(true)
                    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                    .allow_headers([CONTENT_TYPE, ACCEPT]);
                api_router = api_router.layer(cors);
            }
            Err(e) => warn!("Ignoring invalid CORS_ORIGIN '{}': {}", origin, e),
        }
    }

    // Merge the API router with the Swagger UI router for a complete application.
    Router::new()
        .merge(api_router.with_state(app_state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
}
