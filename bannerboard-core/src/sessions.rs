use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{config::check_secret, ConfigError};

/// Mints and verifies signed session tokens. Nothing about a session is stored server-side,
/// so a token stays valid until it expires.
pub struct SessionIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

/// What a user is allowed to do
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
}

/// Everything a session token asserts about its bearer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// The login of the user
    pub sub: String,
    pub display: Option<String>,
    pub role: Role,
    /// Issued at, in seconds since the epoch
    pub iat: i64,
    /// Expires at, in seconds since the epoch
    pub exp: i64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Session token is malformed")]
    Malformed,
    #[error("Session token signature is invalid")]
    BadSignature,
    #[error("Session token has expired")]
    Expired,
}

impl SessionIssuer {
    const SESSION_DURATION_IN_HOURS: i64 = 24;
    const ALGORITHM: Algorithm = Algorithm::HS256;

    pub fn new(secret: &str) -> Result<Self, ConfigError> {
        check_secret("keys.jwt", secret)?;

        // Expiry is checked by hand in verify_at, so it can't be skewed by leeway
        let mut validation = Validation::new(Self::ALGORITHM);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    /// How long a minted token stays valid
    pub fn session_duration() -> Duration {
        Duration::hours(Self::SESSION_DURATION_IN_HOURS)
    }

    pub fn mint(&self, login: &str, display: Option<&str>, role: Role) -> String {
        self.mint_at(login, display, role, Utc::now())
    }

    pub fn mint_at(
        &self,
        login: &str,
        display: Option<&str>,
        role: Role,
        now: DateTime<Utc>,
    ) -> String {
        let claims = Claims {
            sub: login.to_string(),
            display: display.map(ToString::to_string),
            role,
            iat: now.timestamp(),
            exp: (now + Self::session_duration()).timestamp(),
        };

        encode(&Header::new(Self::ALGORITHM), &claims, &self.encoding_key)
            .expect("HMAC signing of serializable claims cannot fail")
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    TokenError::BadSignature
                }
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            }
        })?;

        if now.timestamp() >= data.claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(data.claims)
    }
}

impl Claims {
    /// The name shown as the author of anything this user publishes
    pub fn author(&self) -> &str {
        self.display.as_deref().unwrap_or(&self.sub)
    }
}
