//! intake-api - HTTP layer for the order intake service
//!
//! Routes:
//! - `POST /api/order` takes a multipart order with its proof file (a JSON
//!   body is validated too, but cannot carry the proof)
//! - `GET /api/qrisdinamis` returns the placeholder QRIS image
//! - `GET /uploads/{filename}` serves stored proof files
//! - `GET /health` liveness probe
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use intake_api::{create_router, AppState};
//! use intake_core::{IntakeConfig, LogRecorder};
//!
//! let config = IntakeConfig::default();
//! let state = AppState::from_config(&config, Arc::new(LogRecorder));
//! let router = create_router(state);
//! ```

pub mod error;
pub mod handlers;
pub mod state;

pub use error::{ApiError, AssetError};
pub use handlers::order::OrderResponse;
pub use state::AppState;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Allowance for the text fields and multipart framing on top of the file
const FORM_OVERHEAD_BYTES: u64 = 1024 * 1024;

/// Create the intake router with the given application state
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let body_limit = usize::try_from(
        state
            .sink()
            .max_bytes()
            .saturating_add(FORM_OVERHEAD_BYTES),
    )
    .unwrap_or(usize::MAX);

    Router::new()
        // Health check
        .route("/health", get(|| async { "OK" }))
        // Placeholder for a dynamic QRIS integration
        .route("/api/qrisdinamis", get(handlers::qris::placeholder_qris))
        // Order intake with proof upload
        .route("/api/order", post(handlers::order::submit_order))
        // Stored proof files, read-only
        .nest_service("/uploads", handlers::uploads::serve_uploads(state.sink().dir()))
        // Middleware
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
