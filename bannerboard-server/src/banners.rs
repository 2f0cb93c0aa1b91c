use std::path::Path;

use axum::{
    extract::{DefaultBodyLimit, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json,
};
use bannerboard_core::{requested_page, BannerError, Config, NewBanner};

use crate::{
    auth::Session,
    errors::ServerResult,
    schemas::{NewBannerForm, PageQuery},
    serialized::{Banner, BannerPage, ToSerialized, WithImagePath},
    uploads::{remove_image, store_image},
    Router, ServerContext,
};

#[utoipa::path(
    get,
    path = "/api/banners",
    tag = "banners",
    params(PageQuery),
    responses(
        (status = 200, body = BannerPage, description = "A page of banners, out of range pages are clamped")
    )
)]
async fn list_banners(
    State(context): State<ServerContext>,
    Query(query): Query<PageQuery>,
) -> Json<BannerPage> {
    let cache = context.board.banners.cache();
    let page = cache.page(requested_page(query.page.as_deref()));

    Json(WithImagePath(&page, &context.config.uploads.public_path).to_serialized())
}

#[utoipa::path(
    get,
    path = "/api/banners/all",
    tag = "banners",
    responses(
        (status = 200, body = Vec<Banner>)
    )
)]
async fn all_banners(State(context): State<ServerContext>) -> Json<Vec<Banner>> {
    let snapshot = context.board.banners.cache().snapshot();

    Json(WithImagePath(snapshot.banners(), &context.config.uploads.public_path).to_serialized())
}

#[utoipa::path(
    post,
    path = "/api/newbanner",
    tag = "banners",
    request_body(content = NewBannerForm, content_type = "multipart/form-data"),
    security(
        ("SessionCookie" = [])
    ),
    responses(
        (status = 201, body = Banner),
        (status = 400, description = "Invalid form or image type"),
        (status = 401, description = "Not logged in"),
        (status = 409, description = "A banner with this title exists")
    )
)]
async fn new_banner(
    State(context): State<ServerContext>,
    Session(claims): Session,
    form: NewBannerForm,
) -> ServerResult<(StatusCode, Json<Banner>)> {
    let banners = &context.board.banners;
    let uploads = &context.config.uploads;
    let directory = Path::new(&uploads.directory);

    // Checked first so a taken title doesn't leave an image behind
    banners.check_title(&form.title).await?;

    let image = match &form.image {
        Some(image) => Some(store_image(directory, image).await?),
        None => None,
    };

    let result = banners
        .create(NewBanner {
            title: form.title,
            description: form.description,
            author: claims.author().to_string(),
            url: form.url,
            image: image.clone(),
        })
        .await;

    let banner = match result {
        Ok(banner) => banner,
        // A banner that was stored keeps its image even if the cache is behind
        Err(e @ BannerError::Refresh { .. }) => return Err(e.into()),
        Err(e) => {
            if let Some(name) = &image {
                remove_image(directory, name).await;
            }

            return Err(e.into());
        }
    };

    let banner: Banner = WithImagePath(&banner, &uploads.public_path).to_serialized();
    Ok((StatusCode::CREATED, Json(banner)))
}

pub fn router(config: &Config) -> Router {
    Router::new()
        .route("/banners", get(list_banners))
        .route("/banners/all", get(all_banners))
        .route(
            "/newbanner",
            post(new_banner).layer(DefaultBodyLimit::max(config.uploads.max_bytes)),
        )
}
