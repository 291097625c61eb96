//! crates/parts_finder_core/src/auth.rs
//!
//! The session authenticator: checks credentials through a pluggable verifier and
//! manages login sessions in a pluggable store.

use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::domain::{Session, UserIdentity};
use crate::ports::{CredentialVerifier, PortError, PortResult, SessionStore};

pub const DEFAULT_SESSION_LIFETIME_SECS: i64 = 2 * 60 * 60;

const MSG_SUCCESS: &str = "Login successful";
const MSG_MISSING_FIELDS: &str = "Email and password are required";
const MSG_BAD_CREDENTIALS: &str = "Invalid email or password";
const MSG_SERVICE_ERROR: &str = "Authentication service unavailable, please try again";

/// Result of a login attempt. A failure always carries a non-empty message.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub success: bool,
    pub message: String,
    pub identity: Option<UserIdentity>,
}

impl LoginOutcome {
    fn failed(message: &str) -> Self {
        Self {
            success: false,
            message: message.to_string(),
            identity: None,
        }
    }
}

#[derive(Clone)]
pub struct Authenticator {
    verifier: Arc<dyn CredentialVerifier>,
    sessions: Arc<dyn SessionStore>,
    lifetime: Duration,
}

impl Authenticator {
    pub fn new(
        verifier: Arc<dyn CredentialVerifier>,
        sessions: Arc<dyn SessionStore>,
        lifetime: Duration,
    ) -> Self {
        Self {
            verifier,
            sessions,
            lifetime,
        }
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Checks the credentials. Never returns an error: every failure is folded into
    /// an unsuccessful outcome with a user-facing message.
    pub async fn login(&self, email: &str, password: &str) -> LoginOutcome {
        let email = email.trim();
        if email.is_empty() || password.trim().is_empty() {
            return LoginOutcome::failed(MSG_MISSING_FIELDS);
        }

        match self.verifier.verify(email, password).await {
            Ok(identity) => {
                info!("Login succeeded for {}", identity.email);
                LoginOutcome {
                    success: true,
                    message: MSG_SUCCESS.to_string(),
                    identity: Some(identity),
                }
            }
            Err(PortError::Unauthorized) => {
                warn!("Rejected login attempt for {}", email);
                LoginOutcome::failed(MSG_BAD_CREDENTIALS)
            }
            Err(e) => {
                error!("Credential verification failed: {:?}", e);
                LoginOutcome::failed(MSG_SERVICE_ERROR)
            }
        }
    }

    /// Records a new session for `identity` and returns it. Sessions that have
    /// outlived the lifetime are swept from the store first.
    pub async fn establish_session(&self, identity: &UserIdentity) -> PortResult<Session> {
        match self.sessions.remove_expired(Utc::now(), self.lifetime).await {
            Ok(0) => {}
            Ok(swept) => debug!("Swept {} expired sessions", swept),
            Err(e) => warn!("Could not sweep expired sessions: {:?}", e),
        }

        let session = Session::for_identity(identity);
        self.sessions.insert(session.clone()).await?;
        Ok(session)
    }

    pub async fn clear_session(&self, session_id: Uuid) -> PortResult<()> {
        self.sessions.remove(session_id).await
    }

    /// Looks up a live session. Expired sessions are removed and reported as absent.
    pub async fn current_session(&self, session_id: Uuid) -> PortResult<Option<Session>> {
        let Some(session) = self.sessions.get(session_id).await? else {
            return Ok(None);
        };

        if session.is_expired_at(Utc::now(), self.lifetime) {
            info!("Session {} expired", session_id);
            self.sessions.remove(session_id).await?;
            return Ok(None);
        }
        Ok(Some(session))
    }

    pub async fn is_authenticated(&self, session_id: Uuid) -> bool {
        match self.current_session(session_id).await {
            Ok(session) => session.is_some(),
            Err(e) => {
                error!("Failed to check session {}: {:?}", session_id, e);
                false
            }
        }
    }
}
