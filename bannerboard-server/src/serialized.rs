//! All schemas that are exposed from endpoints are defined here
//! along with the conversions from core types

use bannerboard_core::{BannerData, BannerPage as CorePage, Claims, UserData};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    id: i64,
    login: String,
    display_name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResult {
    user: User,
}

/// The user a session token belongs to
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    login: String,
    display: Option<String>,
    #[schema(value_type = String, example = "user")]
    role: bannerboard_core::Role,
    /// Seconds since the epoch
    expires_at: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    id: i64,
    title: String,
    description: String,
    author: String,
    url: String,
    /// Public path of the image, if the banner has one
    image: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BannerPage {
    banners: Vec<Banner>,
    page: usize,
    max_page: usize,
    count: usize,
}

/// Helper trait to convert any type into a serialized version
pub trait ToSerialized<T>
where
    T: Serialize,
{
    fn to_serialized(&self) -> T;
}

impl ToSerialized<User> for UserData {
    fn to_serialized(&self) -> User {
        User {
            id: self.id,
            login: self.login.clone(),
            display_name: self.display_name.clone(),
        }
    }
}

impl ToSerialized<LoginResult> for UserData {
    fn to_serialized(&self) -> LoginResult {
        LoginResult {
            user: self.to_serialized(),
        }
    }
}

impl ToSerialized<SessionUser> for Claims {
    fn to_serialized(&self) -> SessionUser {
        SessionUser {
            login: self.sub.clone(),
            display: self.display.clone(),
            role: self.role,
            expires_at: self.exp,
        }
    }
}

/// Banners need to know where images are served from to be serialized
pub struct WithImagePath<'a, T: ?Sized>(pub &'a T, pub &'a str);

impl ToSerialized<Banner> for WithImagePath<'_, BannerData> {
    fn to_serialized(&self) -> Banner {
        let WithImagePath(data, public_path) = self;

        Banner {
            id: data.id,
            title: data.title.clone(),
            description: data.description.clone(),
            author: data.author.clone(),
            url: data.url.clone(),
            image: data
                .image
                .as_ref()
                .map(|name| format!("{}/{name}", public_path.trim_end_matches('/'))),
            created_at: data.created_at,
        }
    }
}

impl ToSerialized<Vec<Banner>> for WithImagePath<'_, [BannerData]> {
    fn to_serialized(&self) -> Vec<Banner> {
        self.0
            .iter()
            .map(|b| WithImagePath(b, self.1).to_serialized())
            .collect()
    }
}

impl ToSerialized<BannerPage> for WithImagePath<'_, CorePage> {
    fn to_serialized(&self) -> BannerPage {
        let WithImagePath(page, public_path) = self;

        BannerPage {
            banners: WithImagePath(page.banners.as_slice(), *public_path).to_serialized(),
            page: page.page,
            max_page: page.max_page,
            count: page.total,
        }
    }
}
