//! services/api/src/web/cookie.rs
//!
//! The signed session cookie: `parts_session=<session uuid>.<hex HMAC-SHA256>`.

use axum::http::{header, HeaderMap};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

pub const SESSION_COOKIE: &str = "parts_session";

#[derive(Clone)]
pub struct SessionCookies {
    key: Vec<u8>,
    max_age_secs: i64,
    secure: bool,
}

impl SessionCookies {
    pub fn new(secret: &str, max_age_secs: i64, secure: bool) -> Self {
        Self {
            key: secret.as_bytes().to_vec(),
            max_age_secs,
            secure,
        }
    }

    fn mac(&self, session_id: &Uuid) -> Option<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.key).ok()?;
        mac.update(session_id.as_bytes());
        Some(mac)
    }

    /// The signed cookie value for a session.
    pub fn encode(&self, session_id: Uuid) -> Option<String> {
        let signature = self.mac(&session_id)?.finalize().into_bytes();
        Some(format!("{}.{}", session_id, hex::encode(signature)))
    }

    /// Returns the session id if the value is well-formed and the signature checks out.
    pub fn decode(&self, value: &str) -> Option<Uuid> {
        let (id, signature) = value.split_once('.')?;
        let session_id = Uuid::parse_str(id).ok()?;
        let expected = hex::decode(signature).ok()?;

        // Constant-time comparison
        self.mac(&session_id)?.verify_slice(&expected).ok()?;
        Some(session_id)
    }

    /// Finds and verifies our cookie in the request's `Cookie` headers.
    pub fn session_id(&self, headers: &HeaderMap) -> Option<Uuid> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .find_map(|c| {
                c.trim()
                    .strip_prefix(&format!("{}=", SESSION_COOKIE))
                    .map(str::to_string)
            })
            .and_then(|value| self.decode(&value))
    }

    /// `Set-Cookie` value establishing the session.
    pub fn set_cookie(&self, session_id: Uuid) -> Option<String> {
        Some(format!(
            "{}={}; HttpOnly;{} SameSite=Lax; Path=/; Max-Age={}",
            SESSION_COOKIE,
            self.encode(session_id)?,
            if self.secure { " Secure;" } else { "" },
            self.max_age_secs
        ))
    }

    /// `Set-Cookie` value that expires the session cookie.
    pub fn clear_cookie(&self) -> String {
        format!(
            "{}=; HttpOnly;{} SameSite=Lax; Path=/; Max-Age=0",
            SESSION_COOKIE,
            if self.secure { " Secure;" } else { "" }
        )
    }
}
