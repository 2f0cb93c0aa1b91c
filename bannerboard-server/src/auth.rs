use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{request::Parts, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json,
};
use bannerboard_core::{Claims, Credentials, NewPlainUser, SessionIssuer};
use log::debug;
use serde_json::json;
use tower_cookies::{cookie::time::Duration, Cookie, Cookies};

use crate::{
    errors::{ServerError, ServerResult},
    schemas::{LoginSchema, RegisterSchema, ValidatedJson},
    serialized::{LoginResult, SessionUser, ToSerialized, User},
    Router, ServerContext,
};

/// Name of the cookie holding the session token
pub const SESSION_COOKIE: &str = "jwt_token";

/// The verified claims of the session cookie sent with a request.
///
/// Extracting this rejects the request with 401 if there is no valid session,
/// use `Option<Session>` for routes that also serve anonymous users.
pub struct Session(pub Claims);

#[async_trait]
impl FromRequestParts<ServerContext> for Session {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerContext,
    ) -> Result<Self, Self::Rejection> {
        let cookies = Cookies::from_request_parts(parts, state)
            .await
            .map_err(|(_, message)| ServerError::Unknown(message.to_string()))?;

        let cookie = cookies
            .get(SESSION_COOKIE)
            .ok_or(ServerError::Unauthorized)?;

        let claims = state.board.sessions.verify(cookie.value()).map_err(|e| {
            debug!("Rejected session token: {e}");
            ServerError::Unauthorized
        })?;

        Ok(Self(claims))
    }
}

#[utoipa::path(
    post,
    path = "/api/register",
    tag = "auth",
    request_body = RegisterSchema,
    responses(
        (status = 201, body = User),
        (status = 400, description = "Invalid body"),
        (status = 409, description = "Login or display name is taken")
    )
)]
async fn register(
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<RegisterSchema>,
) -> ServerResult<(StatusCode, Json<User>)> {
    let user = context
        .board
        .auth
        .register(NewPlainUser {
            login: body.login,
            password: body.password,
            display_name: body.display_name,
        })
        .await?;

    let user: User = user.to_serialized();
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    post,
    path = "/api/login",
    tag = "auth",
    request_body = LoginSchema,
    responses(
        (status = 202, body = LoginResult, description = "Sets the session cookie"),
        (status = 400, description = "Invalid body or credentials")
    )
)]
async fn login(
    State(context): State<ServerContext>,
    cookies: Cookies,
    ValidatedJson(body): ValidatedJson<LoginSchema>,
) -> ServerResult<(StatusCode, Json<LoginResult>)> {
    let login = context
        .board
        .login(&Credentials {
            login: body.login,
            password: body.password,
        })
        .await?;

    let max_age = SessionIssuer::session_duration().num_seconds();
    let cookie = Cookie::build((SESSION_COOKIE, login.token))
        .max_age(Duration::seconds(max_age))
        .path("/")
        .http_only(true)
        .secure(context.config.server.cookie_secure)
        .build();

    cookies.add(cookie);

    let result: LoginResult = login.user.to_serialized();
    Ok((StatusCode::ACCEPTED, Json(result)))
}

#[utoipa::path(
    post,
    path = "/api/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Removes the session cookie")
    )
)]
async fn logout(cookies: Cookies) -> impl IntoResponse {
    cookies.remove(Cookie::build((SESSION_COOKIE, "")).path("/").build());

    Json(json!({ "message": "Logged out successfully" }))
}

#[utoipa::path(
    get,
    path = "/api/session",
    tag = "auth",
    security(
        ("SessionCookie" = [])
    ),
    responses(
        (status = 200, body = SessionUser, description = "null when not logged in")
    )
)]
async fn session(session: Option<Session>) -> Json<Option<SessionUser>> {
    Json(session.map(|Session(claims)| claims.to_serialized()))
}

pub fn router() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/session", get(session))
}
