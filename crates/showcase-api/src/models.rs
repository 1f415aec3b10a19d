//! Request and response bodies for the Showcase API

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use showcase_common::{
    check_enum, check_length, check_range, Bounds, FailureKind, FieldError, LogLevel, Validatable,
    ValidationBuilder,
};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;
use vm_registry::{
    OsImage, VirtualMachine, VmRecord, CPU_COUNT_MAX, CPU_COUNT_MIN, MEM_SIZE_GB_MAX,
    MEM_SIZE_GB_MIN,
};

#[derive(Debug, Error)]
#[error("invalid datetime: {0}")]
pub struct TimestampError(pub String);

/// A point in time that remembers the text it was parsed from
///
/// Ordering and equality use the instant; serialization writes back the
/// original text.
#[derive(Debug, Clone)]
pub struct Timestamp {
    raw: String,
    instant: DateTime<Utc>,
}

impl Timestamp {
    /// Parse RFC 3339, or a naive date/datetime taken as UTC
    pub fn parse(raw: &str) -> Result<Self, TimestampError> {
        let text = raw.trim();

        let instant = DateTime::parse_from_rfc3339(text)
            .map(|dt| dt.with_timezone(&Utc))
            .or_else(|_| {
                NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f").map(|dt| dt.and_utc())
            })
            .or_else(|_| {
                NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f").map(|dt| dt.and_utc())
            })
            .or_else(|_| {
                NaiveDate::parse_from_str(text, "%Y-%m-%d")
                    .map(|date| date.and_time(chrono::NaiveTime::MIN).and_utc())
            })
            .map_err(|_| TimestampError(raw.to_string()))?;

        Ok(Self {
            raw: raw.to_string(),
            instant,
        })
    }

    pub fn from_instant(instant: DateTime<Utc>) -> Self {
        Self {
            raw: instant.to_rfc3339(),
            instant,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        self.instant == other.instant
    }
}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.instant.partial_cmp(&other.instant)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Timestamp::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub message: &'static str,
    pub error: Option<String>,
}

/// Response from the sleep endpoints
#[derive(Debug, Serialize)]
pub struct SleepResponse {
    pub error: Option<String>,
}

/// Service information
#[derive(Debug, Serialize)]
pub struct InfoResponse {
    pub version: &'static str,
    pub time: DateTime<Utc>,
    pub home: String,
}

/// Raw query parameters for `/logs`
#[derive(Debug, Default, Deserialize)]
pub struct LogQueryParams {
    pub start: Option<String>,
    pub end: Option<String>,
    pub level: Option<String>,
}

impl LogQueryParams {
    /// Parse `start` and `end`; missing or malformed values are field errors
    pub fn parse_range(&self) -> Result<(Timestamp, Timestamp), Vec<FieldError>> {
        let mut errors = Vec::new();
        let start = parse_required(&mut errors, "start", self.start.as_deref());
        let end = parse_required(&mut errors, "end", self.end.as_deref());

        match (start, end) {
            (Some(start), Some(end)) => Ok((start, end)),
            _ => Err(errors),
        }
    }
}

fn parse_required(
    errors: &mut Vec<FieldError>,
    field: &str,
    value: Option<&str>,
) -> Option<Timestamp> {
    let Some(value) = value else {
        errors.push(FieldError::new(field, FailureKind::InvalidInput, "field required"));
        return None;
    };

    match Timestamp::parse(value) {
        Ok(timestamp) => Some(timestamp),
        Err(e) => {
            errors.push(FieldError::new(field, FailureKind::InvalidInput, e.to_string()));
            None
        }
    }
}

/// Accepted log query, echoed back to the caller
#[derive(Debug, Serialize)]
pub struct LogQueryResponse {
    pub start: Timestamp,
    pub end: Timestamp,
    pub level: LogLevel,
}

/// Identifier handed out for every stored sale
pub const STUB_SALE_ID: &str = "1234";

/// A single sale
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub time: Timestamp,
    pub customer_id: String,
    pub amount: i64,
    pub price: f64,
}

impl Sale {
    /// The record returned for every sale lookup
    pub fn canned() -> Self {
        Self {
            time: Timestamp::from_instant(
                DateTime::<Utc>::from_timestamp(1_704_110_400, 0).unwrap_or_default(),
            ),
            customer_id: "c-42".to_string(),
            amount: 3,
            price: 19.99,
        }
    }
}

impl Validatable for Sale {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        ValidationBuilder::new()
            .check("customer_id", || check_length(&self.customer_id, 2, None))
            .check("amount", || check_range(self.amount, &Bounds::new().gt(0)))
            .check("price", || check_range(self.price, &Bounds::new().gt(0.0)))
            .build()
    }
}

/// Response carrying the id of a created resource
#[derive(Debug, Serialize)]
pub struct CreatedResponse<T> {
    pub id: T,
}

/// Survey form submission
#[derive(Debug, Deserialize)]
pub struct SurveyForm {
    pub name: String,
    pub happy: String,
    pub course: String,
}

/// What the raw API endpoint saw
#[derive(Debug, Serialize)]
pub struct RawRequestResponse {
    pub method: String,
    pub path: String,
    pub headers: BTreeMap<String, String>,
}

/// Pixel dimensions of an uploaded image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Request to start a VM
#[derive(Debug, Deserialize)]
pub struct StartVmRequest {
    pub cpu_count: i64,
    pub mem_size_gb: i64,
    pub image: String,
}

impl StartVmRequest {
    /// Convert into a registry entry, reporting any field outside its bounds
    pub fn into_vm(self) -> Result<VirtualMachine, Vec<FieldError>> {
        self.validate()?;

        let narrow = |field: &str, value: i64| {
            u32::try_from(value).map_err(|_| {
                vec![FieldError::new(field, FailureKind::OutOfRange, "out of range")]
            })
        };

        Ok(VirtualMachine {
            cpu_count: narrow("cpu_count", self.cpu_count)?,
            mem_size_gb: narrow("mem_size_gb", self.mem_size_gb)?,
            image: check_enum::<OsImage>(&self.image)
                .map_err(|failure| vec![FieldError::from_failure("image", failure)])?,
        })
    }
}

impl Validatable for StartVmRequest {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let cpu_bounds = Bounds::new()
            .ge(i64::from(CPU_COUNT_MIN))
            .le(i64::from(CPU_COUNT_MAX));
        let mem_bounds = Bounds::new()
            .ge(i64::from(MEM_SIZE_GB_MIN))
            .le(i64::from(MEM_SIZE_GB_MAX));

        ValidationBuilder::new()
            .check("cpu_count", || check_range(self.cpu_count, &cpu_bounds))
            .check("mem_size_gb", || check_range(self.mem_size_gb, &mem_bounds))
            .check("image", || check_enum::<OsImage>(&self.image))
            .build()
    }
}

/// A started VM as returned by lookups
#[derive(Debug, Serialize)]
pub struct VmResponse {
    pub id: Uuid,
    pub vm: VirtualMachine,
    pub started_at: DateTime<Utc>,
}

impl VmResponse {
    pub fn new(id: Uuid, record: VmRecord) -> Self {
        Self {
            id,
            vm: record.vm,
            started_at: record.started_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_formats() {
        let aware = Timestamp::parse("2024-01-01T10:00:00+02:00").unwrap();
        let utc = Timestamp::parse("2024-01-01T08:00:00Z").unwrap();
        let naive = Timestamp::parse("2024-01-01T08:00:00").unwrap();
        let spaced = Timestamp::parse("2024-01-01 08:00:00.000").unwrap();

        assert_eq!(aware, utc);
        assert_eq!(utc, naive);
        assert_eq!(naive, spaced);

        let date = Timestamp::parse("2024-01-01").unwrap();
        assert!(date < utc);

        assert!(Timestamp::parse("yesterday").is_err());
        assert!(Timestamp::parse("").is_err());
    }

    #[test]
    fn test_timestamp_serializes_original_text() {
        let ts = Timestamp::parse("2024-01-01T08:00:00Z").unwrap();
        assert_eq!(
            serde_json::to_value(&ts).unwrap(),
            serde_json::json!("2024-01-01T08:00:00Z")
        );
    }

    #[test]
    fn test_log_params_require_both_bounds() {
        let params = LogQueryParams {
            start: Some("not a date".to_string()),
            ..LogQueryParams::default()
        };

        let errors = params.parse_range().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "start");
        assert_eq!(errors[1].field, "end");
        assert_eq!(errors[1].message, "field required");
    }

    #[test]
    fn test_sale_validation() {
        assert!(Sale::canned().validate().is_ok());

        let sale = Sale {
            customer_id: "c".to_string(),
            amount: 0,
            price: 0.0,
            ..Sale::canned()
        };

        let errors = sale.validate().unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["customer_id", "amount", "price"]);
    }

    #[test]
    fn test_start_vm_request_bounds() {
        let request = StartVmRequest {
            cpu_count: 64,
            mem_size_gb: 8,
            image: "alpine:3.20".to_string(),
        };
        let vm = request.into_vm().unwrap();
        assert_eq!(vm.cpu_count, 64);
        assert_eq!(vm.image, OsImage::Alpine320);

        let request = StartVmRequest {
            cpu_count: 0,
            mem_size_gb: 2048,
            image: "windows:11".to_string(),
        };
        let errors = request.into_vm().unwrap_err();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[2].kind, FailureKind::InvalidEnum);
        assert!(errors[2].message.contains("ubuntu:24.04"));
    }
}
