mod auth;
mod banners;
mod cache;
mod config;
mod db;
mod sessions;
mod util;

#[cfg(test)]
mod testutil;

use std::sync::Arc;

pub use auth::*;
pub use banners::*;
pub use cache::*;
pub use config::*;
pub use db::{
    BannerData, Database, DatabaseError, DatabaseResult, IntoDatabaseError, NewBanner, NewUser,
    PrimaryKey, SqliteDatabase, UserData,
};
pub use sessions::*;

/// The bannerboard system: accounts, sessions, and published banners.
pub struct Board<Db> {
    pub database: Arc<Db>,

    pub auth: Auth<Db>,
    pub sessions: SessionIssuer,
    pub banners: Banners<Db>,
}

impl<Db> Board<Db>
where
    Db: Database,
{
    /// Fails if the secrets or hashing parameters in the config are unusable
    pub fn new(database: Db, config: &Config) -> Result<Self, ConfigError> {
        let database = Arc::new(database);

        Ok(Self {
            auth: Auth::new(&database, &config.keys.password, &config.hashing)?,
            sessions: SessionIssuer::new(&config.keys.jwt)?,
            banners: Banners::new(&database, config.banners.page_size),
            database,
        })
    }

    /// Prepares the board for serving, seeding the example banner if asked to and filling the cache
    pub async fn init(&self, seed_example: bool) -> Result<(), DatabaseError> {
        if seed_example {
            self.banners.seed_example().await?;
        }

        self.banners.cache().refresh().await
    }

    /// Checks credentials and mints a session token for the user
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginData, AuthError> {
        let user = self.auth.verify_password(credentials).await?;
        let display = user.display_name.as_deref().unwrap_or(&user.login);

        let token = self.sessions.mint(&user.login, Some(display), Role::User);

        log::info!("{} logged in", user.login);
        Ok(LoginData { token, user })
    }
}

/// The result of a successful login
#[derive(Debug)]
pub struct LoginData {
    pub token: String,
    pub user: UserData,
}

#[cfg(test)]
mod test {
    use crate::{
        testutil::{test_config, test_database},
        AuthError, Board, Credentials, NewBanner, NewPlainUser, Role,
    };

    #[tokio::test]
    async fn board_rejects_bad_secrets() {
        let mut config = test_config();
        config.keys.jwt = String::new();

        assert!(Board::new(test_database().await, &config).is_err());
    }

    #[tokio::test]
    async fn tokens_carry_the_display_name() {
        let board = Board::new(test_database().await, &test_config()).unwrap();

        board
            .auth
            .register(NewPlainUser {
                login: "bob".to_string(),
                password: "hunter22".to_string(),
                display_name: Some("Bobby".to_string()),
            })
            .await
            .unwrap();

        let login = board
            .login(&Credentials {
                login: "bob".to_string(),
                password: "hunter22".to_string(),
            })
            .await
            .unwrap();

        let claims = board.sessions.verify(&login.token).unwrap();
        assert_eq!(claims.display.as_deref(), Some("Bobby"));
        assert_eq!(claims.author(), "Bobby");
    }

    #[tokio::test]
    async fn login_then_publish() {
        let board = Board::new(test_database().await, &test_config()).unwrap();
        board.init(true).await.unwrap();

        let before = board.banners.cache().snapshot().len();
        assert_eq!(before, 1);

        board
            .auth
            .register(NewPlainUser {
                login: "alice".to_string(),
                password: "secret1".to_string(),
                display_name: None,
            })
            .await
            .unwrap();

        let wrong = board
            .login(&Credentials {
                login: "alice".to_string(),
                password: "wrong".to_string(),
            })
            .await;
        assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));

        let login = board
            .login(&Credentials {
                login: "alice".to_string(),
                password: "secret1".to_string(),
            })
            .await
            .unwrap();

        let claims = board.sessions.verify(&login.token).unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.role, Role::User);
        assert_eq!(claims.author(), "alice");

        board
            .banners
            .create(NewBanner {
                title: "Game One".to_string(),
                description: String::new(),
                author: claims.author().to_string(),
                url: "example.com".to_string(),
                image: None,
            })
            .await
            .unwrap();

        let snapshot = board.banners.cache().snapshot();
        assert_eq!(snapshot.len(), before + 1);
        assert_eq!(snapshot.banners().last().unwrap().title, "Game One");
    }
}
