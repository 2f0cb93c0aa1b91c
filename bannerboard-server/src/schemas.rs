use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Multipart, Request},
    Json,
};
use bannerboard_core::image_name;
use serde::{de::DeserializeOwned, Deserialize};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationErrors};

use crate::errors::{ServerError, ServerResult};

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LoginSchema {
    #[validate(length(min = 2, max = 32, message = "login must be 2-32 characters"))]
    pub login: String,
    #[validate(length(min = 6, max = 128, message = "password must be 6-128 characters"))]
    pub password: String,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegisterSchema {
    #[validate(length(min = 2, max = 32, message = "login must be 2-32 characters"))]
    pub login: String,
    #[serde(default, alias = "display")]
    #[validate(length(min = 4, max = 32, message = "display name must be 4-32 characters"))]
    pub display_name: Option<String>,
    #[validate(length(min = 6, max = 128, message = "password must be 6-128 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// 1-based page number, anything invalid means the first page
    pub page: Option<String>,
}

/// The multipart form used to publish a banner
#[derive(Debug, Default, ToSchema, Validate)]
pub struct NewBannerForm {
    #[validate(length(min = 2, max = 128, message = "title must be 2-128 characters"))]
    pub title: String,
    #[validate(length(max = 256, message = "description must be at most 256 characters"))]
    pub description: String,
    #[validate(length(min = 1, message = "url is required"))]
    pub url: String,
    /// A png, jpg, jpeg or webp image
    #[schema(value_type = Option<String>, format = Binary)]
    pub image: Option<UploadedImage>,
}

#[derive(Debug)]
pub struct UploadedImage {
    /// Generated name the image will be stored under
    pub name: String,
    pub bytes: Bytes,
}

pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(body) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ServerError::Validation(e.body_text()))?;

        body.validate().map_err(describe)?;

        Ok(Self(body))
    }
}

#[async_trait]
impl<S> FromRequest<S> for NewBannerForm
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let multipart = Multipart::from_request(req, state)
            .await
            .map_err(|_| ServerError::Validation("multipart/form-data required".to_string()))?;

        let form = Self::read(multipart).await?;
        form.validate().map_err(describe)?;

        Ok(form)
    }
}

impl NewBannerForm {
    async fn read(mut multipart: Multipart) -> ServerResult<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ServerError::Validation(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();

            match name.as_str() {
                "title" | "description" | "url" => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| ServerError::Validation(e.body_text()))?
                        .trim()
                        .to_string();

                    match name.as_str() {
                        "title" => form.title = text,
                        "description" => form.description = text,
                        _ => form.url = text,
                    }
                }
                "image" => {
                    let filename = field.file_name().unwrap_or_default().to_string();
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| ServerError::Validation(e.body_text()))?;

                    // Browsers send an empty part when no file was picked
                    if filename.is_empty() && bytes.is_empty() {
                        continue;
                    }

                    form.image = Some(UploadedImage {
                        name: image_name(&filename)?,
                        bytes,
                    });
                }
                _ => {}
            }
        }

        Ok(form)
    }
}

/// Turns validation errors into a hint naming the offending fields
pub(crate) fn describe(errors: ValidationErrors) -> ServerError {
    let mut hints: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |e| match &e.message {
                Some(message) => message.to_string(),
                None => format!("{field} is invalid"),
            })
        })
        .collect();

    hints.sort();
    ServerError::Validation(hints.join(", "))
}

#[cfg(test)]
mod test {
    use validator::Validate;

    use super::{describe, RegisterSchema};

    #[test]
    fn register_bounds_are_enforced() {
        let body: RegisterSchema = serde_json::from_str(
            r#"{ "login": "a", "display": "Al", "password": "secret1" }"#,
        )
        .unwrap();

        let hint = describe(body.validate().unwrap_err()).to_string();
        assert_eq!(
            hint,
            "display name must be 4-32 characters, login must be 2-32 characters"
        );
    }

    #[test]
    fn display_name_is_optional() {
        let body: RegisterSchema =
            serde_json::from_str(r#"{ "login": "alice", "password": "secret1" }"#).unwrap();

        assert!(body.validate().is_ok());
        assert_eq!(body.display_name, None);
    }
}
