use std::{fs, path::Path};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read config file: {0}")]
    Read(#[from] std::io::Error),
    #[error("Could not parse config file: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// The configuration of a bannerboard instance
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub keys: KeysConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub hashing: HashingConfig,
    pub banners: BannerConfig,
    pub uploads: UploadConfig,
}

/// Server-wide secrets. There are no defaults, both must be provided.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct KeysConfig {
    /// Signs session tokens
    pub jwt: String,
    /// Mixed into every password before it is hashed
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    /// Sets the `Secure` attribute on the session cookie
    pub cookie_secure: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Argon2 cost parameters, only affects newly hashed passwords
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HashingConfig {
    pub memory_kib: u32,
    pub iterations: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BannerConfig {
    /// How many banners are shown on a page
    pub page_size: usize,
    /// Insert an example banner when the database has none
    pub seed_example: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Where uploaded banner images are written to
    pub directory: String,
    /// The path uploaded images are served under
    pub public_path: String,
    pub max_bytes: usize,
}

impl Config {
    pub const MIN_SECRET_LENGTH: usize = 6;
    pub const MAX_SECRET_LENGTH: usize = 128;

    /// Reads and validates a RON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path)?;
        let config: Config = ron::from_str(&data)?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_secret("keys.jwt", &self.keys.jwt)?;
        check_secret("keys.password", &self.keys.password)?;

        if self.banners.page_size == 0 {
            return Err(ConfigError::Invalid(
                "banners.page_size must be at least 1".to_string(),
            ));
        }

        if self.hashing.memory_kib == 0 || self.hashing.iterations == 0 {
            return Err(ConfigError::Invalid(
                "hashing.memory_kib and hashing.iterations must be at least 1".to_string(),
            ));
        }

        let public_path = &self.uploads.public_path;
        if !public_path.starts_with('/') || public_path.ends_with('/') {
            return Err(ConfigError::Invalid(format!(
                "uploads.public_path must start and not end with a slash (got {public_path:?})"
            )));
        }

        Ok(())
    }
}

pub(crate) fn check_secret(name: &str, secret: &str) -> Result<(), ConfigError> {
    let length = secret.chars().count();

    if !(Config::MIN_SECRET_LENGTH..=Config::MAX_SECRET_LENGTH).contains(&length) {
        return Err(ConfigError::Invalid(format!(
            "the length of {name} must be {}-{} characters (got {length})",
            Config::MIN_SECRET_LENGTH,
            Config::MAX_SECRET_LENGTH
        )));
    }

    Ok(())
}

impl std::fmt::Debug for KeysConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeysConfig")
            .field("jwt", &"<redacted>")
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            cookie_secure: false,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://data/db".to_string(),
            max_connections: 5,
        }
    }
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            // Argon2's recommended defaults, around 50ms on a modern machine
            memory_kib: argon2::Params::DEFAULT_M_COST,
            iterations: argon2::Params::DEFAULT_T_COST,
        }
    }
}

impl Default for BannerConfig {
    fn default() -> Self {
        Self {
            page_size: 9,
            seed_example: true,
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            directory: "web/static/img/banners".to_string(),
            public_path: "/static/img/banners".to_string(),
            max_bytes: 8 * 1024 * 1024,
        }
    }
}

#[cfg(test)]
mod test {
    use super::{Config, ConfigError};

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let config: Config = ron::from_str(
            r#"(
                keys: (jwt: "signing-secret", password: "pepper-secret"),
                banners: (page_size: 12),
            )"#,
        )
        .unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.banners.page_size, 12);
        assert!(config.banners.seed_example);
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn missing_or_short_secrets_are_rejected() {
        let config = Config::default();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.keys.jwt = "12345".to_string();
        config.keys.password = "long-enough".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.keys.jwt = "x".repeat(129);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.keys.jwt = "123456".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn example_config_sets_every_section() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../config/config.example.ron");
        let text = std::fs::read_to_string(path).unwrap();

        for section in ["keys", "server", "database", "hashing", "banners", "uploads"] {
            assert!(text.contains(&format!("{section}: (")), "{section} is missing");
        }

        let config = Config::load(path).unwrap();
        assert_eq!(config.hashing.memory_kib, 19456);
        assert_eq!(config.hashing.iterations, 2);
    }

    #[test]
    fn public_path_must_be_nested() {
        let mut config = Config::default();
        config.keys.jwt = "signing-secret".to_string();
        config.keys.password = "pepper-secret".to_string();

        for path in ["/", "static", "/static/"] {
            config.uploads.public_path = path.to_string();
            assert!(config.validate().is_err(), "{path:?} was accepted");
        }

        config.uploads.public_path = "/images".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn secrets_are_not_printed() {
        let mut config = Config::default();
        config.keys.jwt = "do-not-print-me".to_string();

        assert!(!format!("{config:?}").contains("do-not-print-me"));
    }
}
