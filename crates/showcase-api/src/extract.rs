//! Extractors that turn malformed input into schema errors

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use showcase_common::{FailureKind, FieldError, Validatable};
use tracing::warn;

use crate::handlers::ApiError;

/// JSON body that has been decoded and checked against its field constraints
///
/// Decode failures and constraint violations both reject with a 422 that
/// lists the offending fields.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validatable + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                warn!("Rejected JSON body: {}", rejection.body_text());
                ApiError::schema(vec![body_error(&rejection)])
            })?;

        data.validate().map_err(|errors| {
            warn!("Body failed validation on {} field(s)", errors.len());
            ApiError::schema(errors)
        })?;

        Ok(ValidatedJson(data))
    }
}

fn body_error(rejection: &JsonRejection) -> FieldError {
    match rejection {
        JsonRejection::JsonDataError(e) => rejection_field_error("body", &e.body_text()),
        JsonRejection::JsonSyntaxError(e) => FieldError::new(
            "body",
            FailureKind::InvalidInput,
            format!("JSON syntax error: {}", e.body_text()),
        ),
        JsonRejection::MissingJsonContentType(_) => FieldError::new(
            "body",
            FailureKind::InvalidInput,
            "Content-Type must be application/json",
        ),
        JsonRejection::BytesRejection(_) => FieldError::new(
            "body",
            FailureKind::InvalidInput,
            "Failed to read request body",
        ),
        _ => FieldError::new("body", FailureKind::InvalidInput, "Invalid JSON payload"),
    }
}

/// Attribute a deserialization failure to the field serde names, or to
/// `fallback` when the message does not name one
pub fn rejection_field_error(fallback: &str, text: &str) -> FieldError {
    match missing_field(text) {
        Some(field) => FieldError::new(field, FailureKind::InvalidInput, "field required"),
        None => FieldError::new(fallback, FailureKind::InvalidInput, text),
    }
}

fn missing_field(text: &str) -> Option<&str> {
    let (_, rest) = text.split_once("missing field `")?;
    let (field, _) = rest.split_once('`')?;

    Some(field).filter(|field| !field.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_is_attributed() {
        let error = rejection_field_error(
            "body",
            "Failed to deserialize the JSON body into the target type: \
             missing field `mem_size_gb` at line 1 column 40",
        );

        assert_eq!(error.field, "mem_size_gb");
        assert_eq!(error.message, "field required");
        assert_eq!(error.kind, FailureKind::InvalidInput);
    }

    #[test]
    fn test_other_failures_use_fallback_field() {
        let error = rejection_field_error("query", "duplicate field `level`");

        assert_eq!(error.field, "query");
        assert_eq!(error.message, "duplicate field `level`");
    }
}
