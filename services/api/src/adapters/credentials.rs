//! services/api/src/adapters/credentials.rs
//!
//! In-memory credential verifier for demos. Passwords are held only as argon2 hashes.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use parts_finder_core::domain::UserIdentity;
use parts_finder_core::ports::{CredentialVerifier, PortError, PortResult};
use std::collections::HashMap;

pub const DEMO_EMAIL: &str = "admin@test.com";
pub const DEMO_PASSWORD: &str = "password123";

struct StoredUser {
    password_hash: String,
    identity: UserIdentity,
}

/// A `CredentialVerifier` backed by a fixed set of users held in memory.
pub struct InMemoryCredentialVerifier {
    users: HashMap<String, StoredUser>,
}

impl InMemoryCredentialVerifier {
    pub fn new() -> Self {
        Self {
            users: HashMap::new(),
        }
    }

    /// The verifier with the single demo account.
    pub fn demo() -> PortResult<Self> {
        Self::new().with_user(
            DEMO_EMAIL,
            DEMO_PASSWORD,
            UserIdentity {
                user_id: "demo_user_123".to_string(),
                email: DEMO_EMAIL.to_string(),
                display_name: "Demo User".to_string(),
                id_token: None,
            },
        )
    }

    /// Adds a user, hashing the password with argon2.
    pub fn with_user(
        mut self,
        email: &str,
        password: &str,
        identity: UserIdentity,
    ) -> PortResult<Self> {
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PortError::Unexpected(format!("Failed to hash password: {}", e)))?
            .to_string();

        self.users.insert(
            email.to_string(),
            StoredUser {
                password_hash,
                identity,
            },
        );
        Ok(self)
    }
}

impl Default for InMemoryCredentialVerifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialVerifier for InMemoryCredentialVerifier {
    async fn verify(&self, email: &str, password: &str) -> PortResult<UserIdentity> {
        // Emails are matched exactly, as the demo pair is.
        let user = self.users.get(email).ok_or(PortError::Unauthorized)?;

        let parsed_hash = PasswordHash::new(&user.password_hash)
            .map_err(|e| PortError::Unexpected(format!("Failed to parse password hash: {}", e)))?;

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| PortError::Unauthorized)?;

        Ok(user.identity.clone())
    }
}
