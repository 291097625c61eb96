//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for login and logout.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use std::sync::Arc;
use tracing::{error, info};

use crate::error::ApiError;
use crate::web::rest::{ErrorResponse, LoginRequest, LoginResponse, UserResponse};
use crate::web::state::AppState;

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /api/login - Login with email and password
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in; sets the session cookie", body = LoginResponse),
        (status = 400, description = "Malformed request", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = LoginResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    // 1. Reject anything that is not a JSON object with our fields
    let Json(req) = payload.map_err(|e| {
        info!("Rejected login payload: {}", e);
        ApiError::InvalidInput("Invalid request data".to_string())
    })?;

    // 2. Verify the credentials
    let outcome = state.authenticator.login(&req.email, &req.password).await;
    let identity = match outcome.identity {
        Some(identity) if outcome.success => identity,
        _ => {
            let response = LoginResponse {
                success: false,
                message: outcome.message,
                user: None,
            };
            return Ok((StatusCode::UNAUTHORIZED, Json(response)).into_response());
        }
    };

    // 3. Create the server-side session
    let session = state.authenticator.establish_session(&identity).await?;

    // 4. Create session cookie
    let cookie = state.cookies.set_cookie(session.id).ok_or_else(|| {
        error!("Failed to sign the session cookie");
        ApiError::Internal("Failed to sign the session cookie".to_string())
    })?;

    info!("User {} logged in", session.user_id);

    // 5. Return response with cookie
    let response = LoginResponse {
        success: true,
        message: outcome.message,
        user: Some(UserResponse::from(&session)),
    };
    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)], Json(response)).into_response())
}

/// GET /logout - End the session and return to the home page
#[utoipa::path(
    get,
    path = "/logout",
    responses(
        (status = 303, description = "Session cleared; redirects to /")
    )
)]
pub async fn logout_handler(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    // 1. Drop the server-side session, if the cookie names a genuine one
    if let Some(session_id) = state.cookies.session_id(&headers) {
        if let Err(e) = state.authenticator.clear_session(session_id).await {
            error!("Failed to clear session {}: {:?}", session_id, e);
        }
    }

    // 2. Clear cookie and go home
    (
        [(header::SET_COOKIE, state.cookies.clear_cookie())],
        Redirect::to("/"),
    )
        .into_response()
}
