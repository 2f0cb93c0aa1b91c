use argon2::{
    password_hash::{Encoding, SaltString},
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
};
use log::info;
use rand::rngs::OsRng;
use std::sync::Arc;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::{
    config::check_secret, ConfigError, Database, DatabaseError, HashingConfig, NewUser, UserData,
};

/// Registers users and verifies their passwords.
///
/// Passwords are hashed with Argon2id after the server-wide secret is appended to them,
/// so a leaked database alone is not enough to brute force them offline.
pub struct Auth<Db> {
    db: Arc<Db>,
    argon: Argon2<'static>,
    secret: String,
    /// Verified against when a login doesn't exist, so both cases cost a hash
    dummy_hash: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// Login or password is incorrect
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Invalid user: {0}")]
    Validation(#[from] ValidationErrors),
    /// Something else went wrong with the database
    #[error(transparent)]
    Db(DatabaseError),
    #[error("HashError: {0}")]
    HashError(String),
}

impl<Db> Auth<Db>
where
    Db: Database,
{
    pub fn new(
        db: &Arc<Db>,
        secret: &str,
        hashing: &HashingConfig,
    ) -> Result<Self, ConfigError> {
        check_secret("keys.password", secret)?;

        let params = Params::new(hashing.memory_kib, hashing.iterations, 1, None)
            .map_err(|e| ConfigError::Invalid(format!("hashing: {e}")))?;

        let argon = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let dummy_hash = argon
            .hash_password(b"not-a-password", &SaltString::generate(&mut OsRng))
            .map_err(|e| ConfigError::Invalid(format!("hashing: {e}")))?
            .to_string();

        Ok(Self {
            db: db.clone(),
            argon,
            secret: secret.to_string(),
            dummy_hash,
        })
    }

    /// Creates a user, failing with a conflict if the login or display name is taken
    pub async fn register(&self, new_user: NewPlainUser) -> Result<UserData, AuthError> {
        new_user.validate()?;

        let salt = SaltString::generate(&mut OsRng);
        let hashed_password = self
            .argon
            .hash_password(self.peppered(&new_user.password).as_bytes(), &salt)
            .map_err(|e| AuthError::HashError(e.to_string()))?
            .to_string();

        let user = self
            .db
            .create_user(NewUser {
                login: new_user.login,
                password: hashed_password,
                display_name: new_user.display_name,
            })
            .await
            .map_err(AuthError::Db)?;

        info!("Registered user {}", user.login);
        Ok(user)
    }

    /// Checks a login and password pair, returning the user they belong to.
    ///
    /// An unknown login and a wrong password are both [AuthError::InvalidCredentials].
    pub async fn verify_password(&self, credentials: &Credentials) -> Result<UserData, AuthError> {
        let user = match self.db.user_by_login(&credentials.login).await {
            Ok(user) => user,
            Err(DatabaseError::NotFound { .. }) => {
                let _ = self.check_password(&self.dummy_hash, &credentials.password);
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => return Err(AuthError::Db(e)),
        };

        self.check_password(&user.password, &credentials.password)?;
        Ok(user)
    }

    fn check_password(&self, hash: &str, password: &str) -> Result<(), AuthError> {
        let stored_password = PasswordHash::parse(hash, Encoding::default())
            .map_err(|e| AuthError::HashError(e.to_string()))?;

        self.argon
            .verify_password(self.peppered(password).as_bytes(), &stored_password)
            .map_err(|_| AuthError::InvalidCredentials)
    }

    /// Returns the display name of a user, or their login if they don't have one
    pub async fn display_name(&self, login: &str) -> Result<String, DatabaseError> {
        let user = self.db.user_by_login(login).await?;

        Ok(user.display_name.unwrap_or(user.login))
    }

    fn peppered(&self, password: &str) -> String {
        format!("{password}{}", self.secret)
    }
}

#[derive(Debug)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Validate)]
pub struct NewPlainUser {
    #[validate(length(min = 2, max = 32, message = "login must be 2-32 characters"))]
    pub login: String,
    #[validate(length(min = 6, max = 128, message = "password must be 6-128 characters"))]
    pub password: String,
    #[validate(length(min = 4, max = 32, message = "display name must be 4-32 characters"))]
    pub display_name: Option<String>,
}
