use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bannerboard_core::{AuthError, BannerError, DatabaseError, TokenError};
use log::error;
use serde_json::json;
use thiserror::Error;

use crate::schemas::describe;

pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{0}")]
    Validation(String),
    #[error("{resource}:{identifier} not found")]
    NotFound {
        resource: &'static str,
        identifier: &'static str,
    },
    #[error("{resource} with {field} of value {value} already exists")]
    Conflict {
        resource: &'static str,
        field: &'static str,
        value: String,
    },
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Unknown internal error: {0}")]
    Unknown(String),
}

impl ServerError {
    fn as_status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.as_status_code();

        // Internal details stay in the log
        let message = match &self {
            Self::Unknown(_) => {
                error!("{self}");
                "Internal server error".to_string()
            }
            e => e.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<AuthError> for ServerError {
    fn from(value: AuthError) -> Self {
        match value {
            AuthError::InvalidCredentials => Self::InvalidCredentials,
            AuthError::Validation(e) => describe(e),
            AuthError::Db(e) => e.into(),
            e => Self::Unknown(e.to_string()),
        }
    }
}

impl From<BannerError> for ServerError {
    fn from(value: BannerError) -> Self {
        match value {
            BannerError::UnsupportedImage(_) => Self::Validation(value.to_string()),
            BannerError::Validation(e) => describe(e),
            BannerError::Db(e) => e.into(),
            e @ BannerError::Refresh { .. } => Self::Unknown(e.to_string()),
        }
    }
}

impl From<TokenError> for ServerError {
    fn from(_: TokenError) -> Self {
        Self::Unauthorized
    }
}

impl From<std::io::Error> for ServerError {
    fn from(value: std::io::Error) -> Self {
        Self::Unknown(value.to_string())
    }
}

impl From<DatabaseError> for ServerError {
    fn from(value: DatabaseError) -> Self {
        match value {
            DatabaseError::NotFound {
                resource,
                identifier,
            } => Self::NotFound {
                resource,
                identifier,
            },
            DatabaseError::Conflict {
                resource,
                field,
                value,
            } => Self::Conflict {
                resource,
                field,
                value,
            },
            e => Self::Unknown(e.to_string()),
        }
    }
}
