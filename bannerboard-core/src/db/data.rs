use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// The type used for primary keys in the database.
pub type PrimaryKey = i64;

/// A bannerboard account
#[derive(Debug, Clone, FromRow)]
pub struct UserData {
    pub id: PrimaryKey,
    pub login: String,
    /// The argon2 hash in PHC string format
    pub password: String,
    #[sqlx(rename = "display")]
    pub display_name: Option<String>,
}

/// A published banner
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct BannerData {
    pub id: PrimaryKey,
    pub title: String,
    pub description: String,
    /// Display name (or login) of the user that published it
    pub author: String,
    pub url: String,
    /// Filename relative to the upload directory
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}
