//! Request-shape validation.
//!
//! `ValidatedJson<T>` and `ValidatedQuery<T>` work like `Json<T>` and
//! `Query<T>`, then run `validator::Validate::validate()` on the value.
//! Both reject with `400` and a `field: message` list.

use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::http::AppError;

pub struct ValidatedJson<T>(pub T);

pub struct ValidatedQuery<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::bad_request(rejection.body_text()))?;

        value.validate().map_err(validation_error)?;
        Ok(ValidatedJson(value))
    }
}

#[axum::async_trait]
impl<S, T> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::bad_request(rejection.body_text()))?;

        value.validate().map_err(validation_error)?;
        Ok(ValidatedQuery(value))
    }
}

fn validation_error(errors: ValidationErrors) -> AppError {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            let field = field.to_string();
            errs.iter().map(move |err| {
                let message = err
                    .message
                    .as_ref()
                    .map(|message| message.to_string())
                    .unwrap_or_else(|| err.code.to_string());
                if field == "__all__" {
                    message
                } else {
                    format!("{}: {}", field, message)
                }
            })
        })
        .collect();
    messages.sort();

    if messages.is_empty() {
        AppError::bad_request("validation failed")
    } else {
        AppError::bad_request(messages.join("; "))
    }
}

/// At least 8 characters with at least one letter and one number.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < 8 {
        let mut err = ValidationError::new("password_length");
        err.message = Some("password must be at least 8 characters".into());
        return Err(err);
    }
    let has_letter = password.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !has_letter || !has_digit {
        let mut err = ValidationError::new("password_strength");
        err.message = Some("password must contain at least 1 letter and 1 number".into());
        return Err(err);
    }
    Ok(())
}
