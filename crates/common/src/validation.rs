//! Field validation rules shared by the request handlers
//!
//! Every rule is a pure function: it takes a candidate value plus its
//! declared constraints and returns either the accepted value or a typed
//! [`Failure`]. Body schemas collect failures per field with
//! [`ValidationBuilder`] and expose them through [`Validatable`].

use serde::Serialize;
use std::fmt::Display;
use thiserror::Error;

/// Upper bound for uploaded bodies when no other ceiling is configured (5 MiB)
pub const DEFAULT_MAX_CONTENT_LENGTH: u64 = 5 * 1024 * 1024;

/// Classification of a rule failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Numeric value outside its declared bounds
    OutOfRange,
    /// String shorter than its minimum length
    TooShort,
    /// String longer than its maximum length
    TooLong,
    /// Value not a member of a closed set
    InvalidEnum,
    /// Temporal range with `start >= end`
    InvalidRange,
    /// Absent or unrecognized input
    InvalidInput,
    /// Valid value that policy turns into a not-found outcome
    SuppressedResult,
    /// Content-Length absent or zero
    MissingSize,
    /// Content-Length above the configured ceiling
    SizeExceeded,
}

/// A failed rule, with a human readable message
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Lower and upper limits for a numeric field, each optionally exclusive
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds<T> {
    min: Option<(T, bool)>,
    max: Option<(T, bool)>,
}

impl<T> Default for Bounds<T> {
    fn default() -> Self {
        Self {
            min: None,
            max: None,
        }
    }
}

impl<T> Bounds<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inclusive lower bound
    pub fn ge(mut self, min: T) -> Self {
        self.min = Some((min, false));
        self
    }

    /// Exclusive lower bound
    pub fn gt(mut self, min: T) -> Self {
        self.min = Some((min, true));
        self
    }

    /// Inclusive upper bound
    pub fn le(mut self, max: T) -> Self {
        self.max = Some((max, false));
        self
    }

    /// Exclusive upper bound
    pub fn lt(mut self, max: T) -> Self {
        self.max = Some((max, true));
        self
    }
}

/// Check a numeric value against its bounds
pub fn check_range<T>(value: T, bounds: &Bounds<T>) -> Result<T, Failure>
where
    T: PartialOrd + Display + Copy,
{
    // NaN compares false against everything and would slip through
    if value.partial_cmp(&value).is_none() {
        return Err(Failure::new(FailureKind::OutOfRange, "must be a number"));
    }

    if let Some((min, exclusive)) = bounds.min {
        if exclusive && value <= min {
            return Err(Failure::new(
                FailureKind::OutOfRange,
                format!("must be greater than {}", min),
            ));
        }
        if !exclusive && value < min {
            return Err(Failure::new(
                FailureKind::OutOfRange,
                format!("must be greater than or equal to {}", min),
            ));
        }
    }

    if let Some((max, exclusive)) = bounds.max {
        if exclusive && value >= max {
            return Err(Failure::new(
                FailureKind::OutOfRange,
                format!("must be less than {}", max),
            ));
        }
        if !exclusive && value > max {
            return Err(Failure::new(
                FailureKind::OutOfRange,
                format!("must be less than or equal to {}", max),
            ));
        }
    }

    Ok(value)
}

/// Check a string length (in characters) against `min` and an optional `max`
pub fn check_length(value: &str, min: usize, max: Option<usize>) -> Result<&str, Failure> {
    let len = value.chars().count();
    if len < min {
        return Err(Failure::new(
            FailureKind::TooShort,
            format!("must be at least {} characters", min),
        ));
    }
    if let Some(max) = max {
        if len > max {
            return Err(Failure::new(
                FailureKind::TooLong,
                format!("must be at most {} characters", max),
            ));
        }
    }
    Ok(value)
}

/// An enumeration over a fixed set of string tags
pub trait ClosedSet: Sized + Copy + 'static {
    /// Every member of the set, in declaration order
    fn choices() -> &'static [Self];

    /// The wire tag of this member
    fn tag(&self) -> &'static str;

    /// All wire tags, for reporting valid choices
    fn tags() -> Vec<&'static str> {
        Self::choices().iter().map(Self::tag).collect()
    }

    fn from_tag(tag: &str) -> Option<Self> {
        Self::choices().iter().copied().find(|c| c.tag() == tag)
    }
}

/// Check that `value` names a member of `E`
pub fn check_enum<E: ClosedSet>(value: &str) -> Result<E, Failure> {
    E::from_tag(value).ok_or_else(|| {
        Failure::new(
            FailureKind::InvalidEnum,
            format!("must be one of: {}", E::tags().join(", ")),
        )
    })
}

/// Check that `start` is strictly before `end`
pub fn check_ordering<T: PartialOrd>(start: &T, end: &T) -> Result<(), Failure> {
    if start < end {
        Ok(())
    } else {
        Err(Failure::new(
            FailureKind::InvalidRange,
            "start must be before end",
        ))
    }
}

/// Severity accepted by the log query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl ClosedSet for LogLevel {
    fn choices() -> &'static [Self] {
        &[LogLevel::Info, LogLevel::Warning, LogLevel::Error]
    }

    fn tag(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        }
    }
}

/// Levels that are valid but never produce results
pub const SUPPRESSED_LEVELS: &[LogLevel] = &[LogLevel::Warning];

/// Outcome of the log level policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelDecision {
    Accepted(LogLevel),
    Suppressed(LogLevel),
    Invalid,
}

impl LevelDecision {
    pub fn into_result(self) -> Result<LogLevel, Failure> {
        match self {
            LevelDecision::Accepted(level) => Ok(level),
            LevelDecision::Suppressed(_) => {
                Err(Failure::new(FailureKind::SuppressedResult, "not found"))
            }
            LevelDecision::Invalid => {
                Err(Failure::new(FailureKind::InvalidInput, "invalid log level"))
            }
        }
    }
}

/// Apply the log level policy; an absent level is invalid
pub fn classify_level(level: Option<&str>) -> LevelDecision {
    match level.and_then(LogLevel::from_tag) {
        None => LevelDecision::Invalid,
        Some(level) if SUPPRESSED_LEVELS.contains(&level) => LevelDecision::Suppressed(level),
        Some(level) => LevelDecision::Accepted(level),
    }
}

/// Check a declared Content-Length against `ceiling`
pub fn check_content_length(length: Option<u64>, ceiling: u64) -> Result<u64, Failure> {
    match length {
        None | Some(0) => Err(Failure::new(
            FailureKind::MissingSize,
            "Content-Length header is required",
        )),
        Some(len) if len > ceiling => Err(Failure::new(
            FailureKind::SizeExceeded,
            format!("file too large: {} bytes exceeds limit of {} bytes", len, ceiling),
        )),
        Some(len) => Ok(len),
    }
}

/// A failure attributed to a named field of a request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
    pub kind: FailureKind,
}

impl FieldError {
    pub fn new(field: impl Into<String>, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            kind,
        }
    }

    pub fn from_failure(field: impl Into<String>, failure: Failure) -> Self {
        Self::new(field, failure.kind, failure.message)
    }
}

/// Request bodies that carry field constraints
pub trait Validatable {
    fn validate(&self) -> Result<(), Vec<FieldError>>;
}

/// Accumulates field errors across several checks
#[derive(Debug, Default)]
pub struct ValidationBuilder {
    errors: Vec<FieldError>,
}

impl ValidationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error if the check fails
    pub fn check<T, F>(&mut self, field: &str, rule: F) -> &mut Self
    where
        F: FnOnce() -> Result<T, Failure>,
    {
        if let Err(failure) = rule() {
            self.errors.push(FieldError::from_failure(field, failure));
        }
        self
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn build(&mut self) -> Result<(), Vec<FieldError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(std::mem::take(&mut self.errors))
        }
    }
}
