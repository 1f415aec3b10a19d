//! Showcase REST API
//!
//! A small HTTP surface demonstrating request validation, error-status
//! mapping and an in-memory resource registry.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /sleep/sys` - Blocking wait on a blocking-pool thread
//! - `GET /sleep/async-sys` - Blocking wait inside an async handler
//! - `GET /sleep/async-aio` - Cooperative wait
//! - `GET /info` - Version, time and home path
//! - `GET /logs` - Log query over a time range
//! - `POST /sales/` - Store a sale
//! - `GET /sales/{id}` - Fetch a sale
//! - `POST /survey` - Submit the survey form
//! - `POST /example_raw_api` - Echo the raw request
//! - `POST /size` - Image dimensions of the uploaded body
//! - `POST /vm/start` - Start a VM
//! - `GET /vm/{id}` - Look up a started VM

pub mod config;
pub mod dimensions;
pub mod extract;
pub mod handlers;
pub mod models;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use vm_registry::VmRegistry;

use crate::config::Config;

/// Application state shared across handlers
pub struct AppState {
    /// Registry of started VMs
    pub vms: Arc<VmRegistry>,

    /// How long the sleep endpoints wait
    pub sleep_duration: Duration,

    /// Largest body accepted by `/size`
    pub max_content_length: u64,

    /// Redirect target after a survey submission
    pub survey_redirect: String,

    /// Home path reported by `/info`
    pub home_path: Option<String>,
}

impl AppState {
    /// Create new application state with an empty VM registry
    pub fn new(config: &Config) -> Self {
        Self::with_registry(config, Arc::new(VmRegistry::new()))
    }

    /// Create new application state around an existing VM registry
    pub fn with_registry(config: &Config, vms: Arc<VmRegistry>) -> Self {
        Self {
            vms,
            sleep_duration: config.sleep_duration(),
            max_content_length: config.max_content_length,
            survey_redirect: config.survey_redirect.clone(),
            home_path: config.home_path.clone(),
        }
    }
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    let state = Arc::new(state);

    Router::new()
        // Health and info
        .route("/health", get(handlers::health_handler))
        .route("/info", get(handlers::info_handler))
        // Sleep variants
        .route("/sleep/sys", get(handlers::sleep_sys_handler))
        .route("/sleep/async-sys", get(handlers::sleep_async_sys_handler))
        .route("/sleep/async-aio", get(handlers::sleep_async_aio_handler))
        // Logs
        .route("/logs", get(handlers::logs_handler))
        // Sales
        .route("/sales", post(handlers::create_sale_handler))
        .route("/sales/", post(handlers::create_sale_handler))
        .route("/sales/{id}", get(handlers::get_sale_handler))
        // Forms and raw requests
        .route("/survey", post(handlers::survey_handler))
        .route("/example_raw_api", post(handlers::raw_request_handler))
        .route("/size", post(handlers::size_handler))
        // Virtual machines
        .route("/vm/start", post(handlers::start_vm_handler))
        .route("/vm/{id}", get(handlers::get_vm_handler))
        // Middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
