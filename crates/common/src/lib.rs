//! Shared validation rules and error mapping for the showcase services

pub mod error;
pub mod validation;

pub use error::{map_failure, status_for, Error, Result, StatusClass};
pub use validation::{
    check_content_length, check_enum, check_length, check_ordering, check_range, classify_level,
    Bounds, ClosedSet, Failure, FailureKind, FieldError, LevelDecision, LogLevel, Validatable,
    ValidationBuilder, DEFAULT_MAX_CONTENT_LENGTH,
};
