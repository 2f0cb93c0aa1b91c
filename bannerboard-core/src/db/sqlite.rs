use std::{path::Path, str::FromStr};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{
    query, query_as, query_scalar,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Error as SqlxError, SqlitePool,
};

use crate::{
    db::Result, BannerData, Database, DatabaseError, IntoDatabaseError, NewBanner, NewUser,
    UserData,
};

const CREATE_USERS: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        login TEXT NOT NULL UNIQUE,
        display TEXT UNIQUE,
        password TEXT NOT NULL
    )";

const CREATE_BANNERS: &str = "
    CREATE TABLE IF NOT EXISTS banners (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL UNIQUE,
        description TEXT NOT NULL DEFAULT '',
        author TEXT NOT NULL,
        url TEXT NOT NULL,
        image TEXT,
        created_at TEXT NOT NULL
    )";

/// A SQLite database implementation for bannerboard
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// Connects to the database at `url`, creating the file and tables if they don't exist.
    pub async fn new(url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| e.any())?
            .create_if_missing(true);

        if let Some(parent) = database_directory(url) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DatabaseError::Internal(Box::new(e)))?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| e.any())?;

        Self::with_pool(pool).await
    }

    /// An in-memory database, gone once dropped.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(|e| e.any())?;

        // Every connection to :memory: is its own database, so there can only be one
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| e.any())?;

        Self::with_pool(pool).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self> {
        for statement in [CREATE_USERS, CREATE_BANNERS] {
            query(statement)
                .execute(&pool)
                .await
                .map_err(|e| e.any())?;
        }

        Ok(Self { pool })
    }
}

/// The directory a file-backed database url points into, if any.
fn database_directory(url: &str) -> Option<&Path> {
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))?;
    let path = path.split('?').next().unwrap_or_default();

    if path.is_empty() || path == ":memory:" {
        return None;
    }

    Path::new(path)
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
}

#[async_trait]
impl Database for SqliteDatabase {
    async fn user_by_login(&self, login: &str) -> Result<UserData> {
        query_as::<_, UserData>("SELECT * FROM users WHERE login = ?")
            .bind(login)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("user", "login"))
    }

    async fn create_user(&self, new_user: NewUser) -> Result<UserData> {
        let result = query_as::<_, UserData>(
            "INSERT INTO users (login, display, password) VALUES (?, ?, ?) RETURNING *",
        )
        .bind(&new_user.login)
        .bind(&new_user.display_name)
        .bind(&new_user.password)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(user) => Ok(user),
            // SQLite names only one of the violated columns, and not necessarily the login
            Err(SqlxError::Database(e)) if e.is_unique_violation() => {
                if self.user_by_login(&new_user.login).await.is_ok() {
                    return Err(DatabaseError::Conflict {
                        resource: "user",
                        field: "login",
                        value: new_user.login,
                    });
                }

                Err(SqlxError::Database(e).unique_or(
                    "user",
                    &[("display", "display name", new_user.display_name.as_deref())],
                ))
            }
            Err(e) => Err(e.any()),
        }
    }

    async fn banner_by_title(&self, title: &str) -> Result<BannerData> {
        query_as::<_, BannerData>("SELECT * FROM banners WHERE title = ?")
            .bind(title)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("banner", "title"))
    }

    async fn create_banner(&self, new_banner: NewBanner) -> Result<BannerData> {
        query_as::<_, BannerData>(
            "
            INSERT INTO banners (title, description, author, url, image, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *",
        )
        .bind(&new_banner.title)
        .bind(&new_banner.description)
        .bind(&new_banner.author)
        .bind(&new_banner.url)
        .bind(&new_banner.image)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            e.unique_or(
                "banner",
                &[("title", "title", Some(new_banner.title.as_str()))],
            )
        })
    }

    async fn count_banners(&self) -> Result<u64> {
        let count: i64 = query_scalar("SELECT COUNT(id) FROM banners")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.any())?;

        Ok(count as u64)
    }

    async fn list_banners(&self) -> Result<Vec<BannerData>> {
        query_as::<_, BannerData>("SELECT * FROM banners ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())
    }
}

impl IntoDatabaseError for SqlxError {
    fn any(self) -> DatabaseError {
        DatabaseError::Internal(Box::new(self))
    }

    fn not_found_or(self, resource: &'static str, identifier: &'static str) -> DatabaseError {
        match self {
            SqlxError::RowNotFound => DatabaseError::NotFound {
                resource,
                identifier,
            },
            e => Self::any(e),
        }
    }
}

trait UniqueViolation {
    /// Maps a unique constraint failure on one of the given `(column, field, value)`
    /// candidates into a conflict, anything else into an internal error.
    fn unique_or(
        self,
        resource: &'static str,
        candidates: &[(&str, &'static str, Option<&str>)],
    ) -> DatabaseError;
}

impl UniqueViolation for SqlxError {
    fn unique_or(
        self,
        resource: &'static str,
        candidates: &[(&str, &'static str, Option<&str>)],
    ) -> DatabaseError {
        let SqlxError::Database(db_error) = &self else {
            return self.any();
        };

        if !db_error.is_unique_violation() {
            return self.any();
        }

        // SQLite reports "UNIQUE constraint failed: <table>.<column>"
        let message = db_error.message().to_string();
        let conflict = candidates
            .iter()
            .find(|(column, _, _)| message.ends_with(&format!(".{column}")));

        match conflict {
            Some(&(_, field, value)) => DatabaseError::Conflict {
                resource,
                field,
                value: value.unwrap_or_default().to_string(),
            },
            None => self.any(),
        }
    }
}
