use thiserror::Error;

use crate::validation::{Failure, FailureKind, FieldError};

/// Response class a failure maps to at the HTTP boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    BadRequest,
    NotFound,
    Unprocessable,
    Internal,
}

impl StatusClass {
    pub fn code(self) -> u16 {
        match self {
            StatusClass::BadRequest => 400,
            StatusClass::NotFound => 404,
            StatusClass::Unprocessable => 422,
            StatusClass::Internal => 500,
        }
    }
}

/// Map a rule failure kind to its status class
pub fn status_for(kind: FailureKind) -> StatusClass {
    match kind {
        FailureKind::SuppressedResult => StatusClass::NotFound,
        FailureKind::OutOfRange
        | FailureKind::TooShort
        | FailureKind::TooLong
        | FailureKind::InvalidEnum
        | FailureKind::InvalidRange
        | FailureKind::InvalidInput
        | FailureKind::MissingSize
        | FailureKind::SizeExceeded => StatusClass::BadRequest,
    }
}

/// Map a rule failure to a status class and the message shown to the caller
pub fn map_failure(failure: &Failure) -> (StatusClass, String) {
    (status_for(failure.kind), failure.message.clone())
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Validation(#[from] Failure),

    #[error("{}", schema_summary(.0))]
    Schema(Vec<FieldError>),

    #[error("{0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn status(&self) -> StatusClass {
        match self {
            Error::Validation(failure) => status_for(failure.kind),
            Error::Schema(_) => StatusClass::Unprocessable,
            Error::NotFound(_) => StatusClass::NotFound,
            Error::Config(_) => StatusClass::Internal,
        }
    }

    /// Per-field detail, present only for schema violations
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            Error::Schema(errors) => errors,
            _ => &[],
        }
    }
}

fn schema_summary(errors: &[FieldError]) -> String {
    match errors {
        [single] => format!("Validation failed for field '{}'", single.field),
        _ => format!("Validation failed for {} fields", errors.len()),
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kinds_map_to_status() {
        assert_eq!(status_for(FailureKind::InvalidRange), StatusClass::BadRequest);
        assert_eq!(status_for(FailureKind::InvalidInput), StatusClass::BadRequest);
        assert_eq!(status_for(FailureKind::MissingSize), StatusClass::BadRequest);
        assert_eq!(status_for(FailureKind::SizeExceeded), StatusClass::BadRequest);
        assert_eq!(status_for(FailureKind::SuppressedResult), StatusClass::NotFound);
    }

    #[test]
    fn test_map_failure_keeps_message() {
        let failure = Failure::new(FailureKind::InvalidRange, "start must be before end");
        let (class, message) = map_failure(&failure);

        assert_eq!(class.code(), 400);
        assert_eq!(message, "start must be before end");
    }

    #[test]
    fn test_error_status() {
        let suppressed: Error = Failure::new(FailureKind::SuppressedResult, "not found").into();
        assert_eq!(suppressed.status(), StatusClass::NotFound);

        assert_eq!(
            Error::Config("HOMEPATH is not set".into()).status().code(),
            500
        );
        assert_eq!(Error::NotFound("vm".into()).status().code(), 404);
    }

    #[test]
    fn test_schema_error_message() {
        let one = Error::Schema(vec![FieldError::new(
            "amount",
            FailureKind::OutOfRange,
            "must be greater than 0",
        )]);
        assert_eq!(one.to_string(), "Validation failed for field 'amount'");
        assert_eq!(one.status().code(), 422);
        assert_eq!(one.field_errors().len(), 1);

        let two = Error::Schema(vec![
            FieldError::new("amount", FailureKind::OutOfRange, "must be greater than 0"),
            FieldError::new("price", FailureKind::OutOfRange, "must be greater than 0"),
        ]);
        assert_eq!(two.to_string(), "Validation failed for 2 fields");
    }
}
