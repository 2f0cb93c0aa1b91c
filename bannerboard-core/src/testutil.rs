//! Shared test helpers, available to all `#[cfg(test)]` modules in the crate.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::{
    db::Result, BannerData, Config, Database, DatabaseError, HashingConfig, NewBanner, NewUser,
    PrimaryKey, SqliteDatabase, UserData,
};

/// A config with valid secrets and hashing cheap enough for tests
pub fn test_config() -> Config {
    let mut config = Config::default();

    config.keys.jwt = "test-signing-secret".to_string();
    config.keys.password = "test-password-secret".to_string();
    config.hashing = HashingConfig {
        memory_kib: 64,
        iterations: 1,
    };

    config
}

pub async fn test_database() -> SqliteDatabase {
    SqliteDatabase::in_memory().await.unwrap()
}

pub fn banner(id: PrimaryKey, title: &str) -> BannerData {
    BannerData {
        id,
        title: title.to_string(),
        description: String::new(),
        author: "alice".to_string(),
        url: "https://example.com".to_string(),
        image: None,
        created_at: Utc::now(),
    }
}

/// A banner-only database kept in a vector, which can be told to fail
#[derive(Default)]
pub struct FakeDatabase {
    banners: Mutex<Vec<BannerData>>,
    failing: AtomicBool,
    failing_lists: AtomicBool,
}

impl FakeDatabase {
    pub fn push(&self, banner: BannerData) {
        self.banners.lock().push(banner);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Only listing fails, writes still go through
    pub fn set_failing_lists(&self, failing: bool) {
        self.failing_lists.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DatabaseError::Internal("database is unavailable".into()));
        }

        Ok(())
    }
}

#[async_trait]
impl Database for FakeDatabase {
    async fn user_by_login(&self, _login: &str) -> Result<UserData> {
        Err(DatabaseError::NotFound {
            resource: "user",
            identifier: "login",
        })
    }

    async fn create_user(&self, _new_user: NewUser) -> Result<UserData> {
        Err(DatabaseError::Internal("users are not supported".into()))
    }

    async fn banner_by_title(&self, title: &str) -> Result<BannerData> {
        self.check()?;

        self.banners
            .lock()
            .iter()
            .find(|b| b.title == title)
            .cloned()
            .ok_or(DatabaseError::NotFound {
                resource: "banner",
                identifier: "title",
            })
    }

    async fn create_banner(&self, new_banner: NewBanner) -> Result<BannerData> {
        self.check()?;

        let mut banners = self.banners.lock();

        if banners.iter().any(|b| b.title == new_banner.title) {
            return Err(DatabaseError::Conflict {
                resource: "banner",
                field: "title",
                value: new_banner.title,
            });
        }

        let banner = BannerData {
            id: banners.len() as PrimaryKey + 1,
            title: new_banner.title,
            description: new_banner.description,
            author: new_banner.author,
            url: new_banner.url,
            image: new_banner.image,
            created_at: Utc::now(),
        };

        banners.push(banner.clone());
        Ok(banner)
    }

    async fn count_banners(&self) -> Result<u64> {
        self.check()?;
        Ok(self.banners.lock().len() as u64)
    }

    async fn list_banners(&self) -> Result<Vec<BannerData>> {
        self.check()?;

        if self.failing_lists.load(Ordering::SeqCst) {
            return Err(DatabaseError::Internal("listing is unavailable".into()));
        }

        Ok(self.banners.lock().clone())
    }
}
