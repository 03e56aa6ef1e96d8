use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::AuthConfig;

/// Account type a token was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    User,
    Member,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "User"),
            Role::Member => write!(f, "Member"),
            Role::Admin => write!(f, "Admin"),
        }
    }
}

/// Payload carried inside a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token encoding failed: {0}")]
    Encode(jsonwebtoken::errors::Error),

    #[error("token rejected: {0}")]
    Invalid(jsonwebtoken::errors::Error),
}

/// Signs and verifies bearer tokens with one shared secret.
/// Expiry comes from the per-role table in [`AuthConfig`].
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    auth: AuthConfig,
}

impl TokenKeys {
    pub fn new(secret: &[u8], auth: AuthConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            auth,
        }
    }

    /// Build keys from config, falling back to a random per-process secret.
    pub fn from_config(auth: &AuthConfig) -> Self {
        match auth.jwt_secret.as_deref().filter(|s| !s.is_empty()) {
            Some(secret) => Self::new(secret.as_bytes(), auth.clone()),
            None => {
                tracing::warn!(
                    "No JWT secret configured; tokens will not survive a restart"
                );
                let secret = generate_secret();
                Self::new(secret.as_bytes(), auth.clone())
            }
        }
    }

    pub fn issue(&self, id: &str, name: &str, email: &str, role: Role) -> Result<String, TokenError> {
        let hours = self.auth.token_hours(role) as i64;
        self.issue_with_ttl(id, name, email, role, Duration::hours(hours))
    }

    pub(crate) fn issue_with_ttl(
        &self,
        id: &str,
        name: &str,
        email: &str,
        role: Role,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            id: id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            role,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(TokenError::Encode)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let validation = Validation::new(Algorithm::HS256);
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(TokenError::Invalid)
    }
}

/// 32 random bytes, hex encoded.
fn generate_secret() -> String {
    use rand::Rng;
    let bytes: [u8; 32] = rand::thread_rng().gen();
    hex::encode(bytes)
}
