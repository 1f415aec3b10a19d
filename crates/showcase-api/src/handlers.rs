//! API request handlers for the showcase endpoints

use axum::{
    body::Body,
    extract::{
        rejection::{FormRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Form, Json,
};
use chrono::Utc;
use showcase_common::{
    check_content_length, check_ordering, classify_level, map_failure, Error, Failure,
    FailureKind, FieldError, StatusClass,
};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use vm_registry::VmRecord;

use crate::{
    dimensions,
    extract::{rejection_field_error, ValidatedJson},
    models::{
        CreatedResponse, Dimensions, HealthResponse, InfoResponse, LogQueryParams,
        LogQueryResponse, RawRequestResponse, Sale, SleepResponse, StartVmRequest, SurveyForm,
        VmResponse, STUB_SALE_ID,
    },
    AppState,
};

/// API Error type
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub errors: Vec<FieldError>,
}

impl ApiError {
    pub fn schema(errors: Vec<FieldError>) -> Self {
        Error::Schema(errors).into()
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
            errors: Vec::new(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = serde_json::json!({
            "code": self.status.as_u16(),
            "message": self.message,
        });

        if !self.errors.is_empty() {
            body["errors"] = serde_json::to_value(&self.errors).unwrap_or_default();
        }

        (self.status, Json(body)).into_response()
    }
}

fn status_code(class: StatusClass) -> StatusCode {
    StatusCode::from_u16(class.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Validation(failure) => failure.into(),
            other => ApiError {
                status: status_code(other.status()),
                message: other.to_string(),
                errors: other.field_errors().to_vec(),
            },
        }
    }
}

impl From<Failure> for ApiError {
    fn from(failure: Failure) -> Self {
        let (class, message) = map_failure(&failure);

        ApiError {
            status: status_code(class),
            message,
            errors: Vec::new(),
        }
    }
}

/// Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        message: "I am up and running",
        error: None,
    })
}

/// Service version, current time and configured home path
pub async fn info_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<InfoResponse>, ApiError> {
    let home = state
        .home_path
        .clone()
        .ok_or_else(|| Error::Config("HOMEPATH is not set".to_string()))?;

    Ok(Json(InfoResponse {
        version: env!("CARGO_PKG_VERSION"),
        time: Utc::now(),
        home,
    }))
}

/// Blocking wait on a dedicated blocking thread, like a synchronous handler
pub async fn sleep_sys_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SleepResponse>, ApiError> {
    let duration = state.sleep_duration;

    tokio::task::spawn_blocking(move || std::thread::sleep(duration))
        .await
        .map_err(|e| ApiError::internal(format!("Blocking sleep failed: {}", e)))?;

    Ok(Json(SleepResponse { error: None }))
}

/// Blocking wait inside an async handler; stalls the runtime worker running it
pub async fn sleep_async_sys_handler(State(state): State<Arc<AppState>>) -> Json<SleepResponse> {
    std::thread::sleep(state.sleep_duration);

    Json(SleepResponse { error: None })
}

/// Cooperative wait; only this task is suspended
pub async fn sleep_async_aio_handler(State(state): State<Arc<AppState>>) -> Json<SleepResponse> {
    tokio::time::sleep(state.sleep_duration).await;

    Json(SleepResponse { error: None })
}

/// Query logs in a time range
pub async fn logs_handler(
    query: Result<Query<LogQueryParams>, QueryRejection>,
) -> Result<Json<LogQueryResponse>, ApiError> {
    let Query(params) = query.map_err(|rejection| {
        warn!("Rejected log query: {}", rejection.body_text());
        ApiError::schema(vec![rejection_field_error("query", &rejection.body_text())])
    })?;

    let (start, end) = params.parse_range().map_err(ApiError::schema)?;

    check_ordering(&start, &end)?;
    let level = classify_level(params.level.as_deref()).into_result()?;

    info!(
        "Querying {:?} logs from {} to {}",
        level,
        start.as_str(),
        end.as_str()
    );

    Ok(Json(LogQueryResponse { start, end, level }))
}

/// Store a sale
pub async fn create_sale_handler(
    ValidatedJson(sale): ValidatedJson<Sale>,
) -> Json<CreatedResponse<&'static str>> {
    info!(
        "Storing sale for customer {}: {} x {}",
        sale.customer_id, sale.amount, sale.price
    );

    Json(CreatedResponse { id: STUB_SALE_ID })
}

/// Fetch a sale by id
pub async fn get_sale_handler(Path(id): Path<String>) -> Json<Sale> {
    info!("Fetching sale: {}", id);

    Json(Sale::canned())
}

/// Record a survey answer and send the caller to the thank-you page
pub async fn survey_handler(
    State(state): State<Arc<AppState>>,
    form: Result<Form<SurveyForm>, FormRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Form(survey) = form.map_err(|rejection| {
        warn!("Rejected survey form: {}", rejection.body_text());
        ApiError::schema(vec![rejection_field_error("body", &rejection.body_text())])
    })?;

    info!(
        "Survey from {}: happy={}, course={}",
        survey.name, survey.happy, survey.course
    );

    Ok((
        StatusCode::FOUND,
        [(header::LOCATION, state.survey_redirect.clone())],
    ))
}

/// Echo what arrived on the wire
pub async fn raw_request_handler(
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Json<RawRequestResponse> {
    let headers = headers
        .keys()
        .map(|name| {
            let values: Vec<_> = headers
                .get_all(name)
                .iter()
                .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
                .collect();

            (name.as_str().to_string(), values.join(", "))
        })
        .collect();

    Json(RawRequestResponse {
        method: method.to_string(),
        path: uri.path().to_string(),
        headers,
    })
}

/// Report the pixel dimensions of an uploaded image
pub async fn size_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Body,
) -> Result<Json<Dimensions>, ApiError> {
    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok());

    let length = check_content_length(declared, state.max_content_length).map_err(|failure| {
        warn!("Rejected upload: {}", failure);
        failure
    })?;

    let limit = usize::try_from(state.max_content_length).unwrap_or(usize::MAX);
    let data = axum::body::to_bytes(body, limit).await.map_err(|e| {
        warn!("Failed to read upload: {}", e);
        Failure::new(
            FailureKind::SizeExceeded,
            format!("body exceeds limit of {} bytes", state.max_content_length),
        )
    })?;

    let dimensions = dimensions::probe(&data);
    info!(
        "Measured upload of {} bytes (declared {}): {}x{}",
        data.len(),
        length,
        dimensions.width,
        dimensions.height
    );

    Ok(Json(dimensions))
}

/// Start a VM and register it under a fresh id
pub async fn start_vm_handler(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<StartVmRequest>,
) -> Result<Json<CreatedResponse<Uuid>>, ApiError> {
    let vm = request.into_vm().map_err(ApiError::schema)?;

    let id = state.vms.issue(VmRecord::new(vm)).await;
    info!(
        "Started VM {}: {} CPUs, {} GiB, {}",
        id, vm.cpu_count, vm.mem_size_gb, vm.image
    );

    Ok(Json(CreatedResponse { id }))
}

/// Look up a started VM
pub async fn get_vm_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<VmResponse>, ApiError> {
    let id = Uuid::parse_str(&id).map_err(|_| {
        Failure::new(FailureKind::InvalidInput, format!("Invalid VM id: {}", id))
    })?;

    match state.vms.lookup(&id).await {
        Some(record) => Ok(Json(VmResponse::new(id, record))),
        None => Err(Error::NotFound(format!("VM not found: {}", id)).into()),
    }
}
