use axum::{response::IntoResponse, Json};
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};

use crate::{
    auth::{self, SESSION_COOKIE},
    banners,
    schemas::{LoginSchema, NewBannerForm, RegisterSchema},
    serialized::{Banner, BannerPage, LoginResult, SessionUser, User},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::register,
        auth::login,
        auth::logout,
        auth::session,
        banners::list_banners,
        banners::all_banners,
        banners::new_banner,
    ),
    components(schemas(
        User,
        LoginResult,
        SessionUser,
        Banner,
        BannerPage,
        LoginSchema,
        RegisterSchema,
        NewBannerForm,
    )),
    modifiers(&Security),
    tags(
        (name = "auth", description = "Accounts and sessions"),
        (name = "banners", description = "Publishing and browsing banners")
    ),
    info(description = "bannerboard-server lets users publish banners and browse them page by page")
)]
pub struct ApiDoc;

struct Security;

impl Modify for Security {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            let scheme = ApiKey::Cookie(ApiKeyValue::new(SESSION_COOKIE));

            components.add_security_scheme("SessionCookie", SecurityScheme::ApiKey(scheme))
        }
    }
}

pub async fn docs() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
