use async_trait::async_trait;
use thiserror::Error;
use validator::Validate;

mod data;
pub use data::*;

mod sqlite;
pub use sqlite::*;

pub type Result<T> = std::result::Result<T, DatabaseError>;

#[derive(Debug, Error)]
pub enum DatabaseError {
    /// An unknown or internal error happened with the database
    #[error(transparent)]
    Internal(Box<dyn std::error::Error + Send + Sync>),
    /// A resource already exists
    #[error("{resource} with {field} of value {value} already exists")]
    Conflict {
        /// The resource in question
        resource: &'static str,
        /// The field that is conflicting
        field: &'static str,
        /// The conflicting value
        value: String,
    },
    /// A resource in the database doesn't exist
    #[error("{resource}:{identifier} doesn't exist")]
    NotFound {
        resource: &'static str,
        identifier: &'static str,
    },
}

/// Helper trait to reduce boilerplate
pub trait IntoDatabaseError {
    fn not_found_or(self, resource: &'static str, identifier: &'static str) -> DatabaseError;
    fn any(self) -> DatabaseError;
}

/// Helper trait to reduce boilerplate
pub trait DatabaseResult {
    /// Turns the Result into a conflict error if it's Ok()
    fn conflict_or_ok(self, resource: &'static str, field: &'static str, value: &str)
        -> Result<()>;
}

impl<T> DatabaseResult for Result<T> {
    fn conflict_or_ok(
        self,
        resource: &'static str,
        field: &'static str,
        value: &str,
    ) -> Result<()> {
        match self {
            Ok(_) => Err(DatabaseError::Conflict {
                resource,
                field,
                value: value.to_string(),
            }),
            Err(DatabaseError::NotFound { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// Represents a type that can persist and fetch users and banners.
///
/// Uniqueness of logins, display names and banner titles is enforced by the
/// implementation on insert, so a lookup before an insert is only ever a hint.
#[async_trait]
pub trait Database: Send + Sync + 'static {
    async fn user_by_login(&self, login: &str) -> Result<UserData>;
    async fn create_user(&self, new_user: NewUser) -> Result<UserData>;

    async fn banner_by_title(&self, title: &str) -> Result<BannerData>;
    async fn create_banner(&self, new_banner: NewBanner) -> Result<BannerData>;
    async fn count_banners(&self) -> Result<u64>;
    /// Returns every banner in creation order
    async fn list_banners(&self) -> Result<Vec<BannerData>>;
}

#[derive(Debug)]
pub struct NewUser {
    pub login: String,
    /// Already hashed
    pub password: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Validate)]
pub struct NewBanner {
    #[validate(length(min = 2, max = 128, message = "title must be 2-128 characters"))]
    pub title: String,
    #[validate(length(max = 256, message = "description must be at most 256 characters"))]
    pub description: String,
    pub author: String,
    #[validate(length(min = 1, message = "url is required"))]
    pub url: String,
    /// Filename of the uploaded image, relative to the upload directory
    pub image: Option<String>,
}
