use std::net::{Ipv6Addr, SocketAddr};

use axum::{response::Redirect, routing::get};
use log::info;
use tokio::net::TcpListener;
use tower_cookies::CookieManagerLayer;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
};

mod auth;
mod banners;
mod context;
mod docs;
mod errors;
mod schemas;
mod serialized;
mod uploads;

pub use auth::SESSION_COOKIE;
pub use context::ServerContext;

pub type Router = axum::Router<ServerContext>;

/// Builds the application with every route, layer and the uploaded image files
pub fn app(context: ServerContext) -> axum::Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let config = context.config.clone();
    let api_router = auth::router().merge(banners::router(&config));

    Router::new()
        .route("/", get(|| async { Redirect::to("/api/banners") }))
        .nest("/api", api_router)
        .route("/api.json", get(docs::docs))
        .nest_service(
            &config.uploads.public_path,
            ServeDir::new(&config.uploads.directory),
        )
        .layer(CookieManagerLayer::new())
        .layer(cors)
        .with_state(context)
}

/// Starts the bannerboard server
pub async fn run_server(context: ServerContext) -> std::io::Result<()> {
    let addr: SocketAddr = (Ipv6Addr::UNSPECIFIED, context.config.server.port).into();
    let listener = TcpListener::bind(&addr).await?;

    info!("Listening on {addr}");

    axum::serve(listener, app(context).into_make_service()).await
}
