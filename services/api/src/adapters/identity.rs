//! services/api/src/adapters/identity.rs
//!
//! This module contains the adapter for a remote identity provider (Firebase Auth
//! REST API). It implements the `CredentialVerifier` port from the `core` crate.

use async_trait::async_trait;
use parts_finder_core::domain::UserIdentity;
use parts_finder_core::ports::{CredentialVerifier, PortError, PortResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Error codes the provider uses for a wrong email/password rather than an outage.
const CREDENTIAL_ERRORS: &[&str] = &[
    "EMAIL_NOT_FOUND",
    "INVALID_PASSWORD",
    "INVALID_LOGIN_CREDENTIALS",
    "INVALID_EMAIL",
    "USER_DISABLED",
    "MISSING_PASSWORD",
];

//=========================================================================================
// Wire Types
//=========================================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    email: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `CredentialVerifier` by delegating to Firebase Auth.
#[derive(Clone)]
pub struct FirebaseIdentityAdapter {
    client: Client,
    base_url: String,
    api_key: String,
}

impl FirebaseIdentityAdapter {
    pub fn new(client: Client, base_url: String, api_key: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl CredentialVerifier for FirebaseIdentityAdapter {
    async fn verify(&self, email: &str, password: &str) -> PortResult<UserIdentity> {
        let url = format!("{}/accounts:signInWithPassword", self.base_url);
        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&SignInRequest {
                email,
                password,
                return_secure_token: true,
            })
            .send()
            .await
            .map_err(|e| PortError::Transient(format!("Identity provider unreachable: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            let body: SignInResponse = response
                .json()
                .await
                .map_err(|e| PortError::Unexpected(format!("Bad identity response: {}", e)))?;

            let display_name = body
                .display_name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| body.email.split('@').next().unwrap_or_default().to_string());

            return Ok(UserIdentity {
                user_id: body.local_id,
                email: body.email,
                display_name,
                id_token: body.id_token,
            });
        }

        // Firebase reports bad credentials as 400 with a code such as
        // "INVALID_PASSWORD" or "TOO_MANY_ATTEMPTS_TRY_LATER : ...".
        let code = response
            .json::<ErrorEnvelope>()
            .await
            .map(|e| e.error.message)
            .unwrap_or_default();
        let code = code.split(':').next().unwrap_or_default().trim().to_string();

        if status.as_u16() == 400 && CREDENTIAL_ERRORS.contains(&code.as_str()) {
            return Err(PortError::Unauthorized);
        }

        warn!("Identity provider returned {} ({})", status, code);
        Err(PortError::Transient(format!(
            "Identity provider error {}: {}",
            status, code
        )))
    }
}
