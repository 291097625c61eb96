//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use parts_finder_core::domain::Session;
use std::sync::Arc;
use tracing::error;

use crate::error::ApiError;
use crate::web::state::AppState;

/// Resolves the request's session cookie to a live session, if any.
pub async fn session_from_headers(state: &AppState, headers: &HeaderMap) -> Option<Session> {
    let session_id = state.cookies.session_id(headers)?;
    match state.authenticator.current_session(session_id).await {
        Ok(session) => session,
        Err(e) => {
            error!("Failed to look up session {}: {:?}", session_id, e);
            None
        }
    }
}

/// Middleware for API routes: validates the session cookie and inserts the
/// `Session` into request extensions for handlers to use.
///
/// If invalid or missing, returns 401 with a JSON body.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let session = session_from_headers(&state, req.headers())
        .await
        .ok_or(ApiError::Unauthorized)?;

    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}

/// Middleware for HTML-style pages: same check, but anonymous visitors are
/// sent to the login page.
pub async fn require_auth_page(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    match session_from_headers(&state, req.headers()).await {
        Some(session) => {
            req.extensions_mut().insert(session);
            next.run(req).await
        }
        None => Redirect::to("/login").into_response(),
    }
}
