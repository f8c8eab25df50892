//! # Tumbuh HTTP API Module
//!
//! This module implements the HTTP JSON API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /reference` - Loaded reference tables and their fingerprint
//! - `POST /evaluate` - Evaluate one measurement
//! - `POST /evaluate/batch` - Evaluate many measurements
//! - `GET /curve/{standard}/{sex}?z=` - SD line for chart rendering
//!
//! ## Security Configuration (Environment Variables)
//!
//! - `TUMBUH_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)
//! - `TUMBUH_RATE_LIMIT`: Requests per second (default: 100, 0 to disable)
//! - `TUMBUH_API_KEY`: If set, evaluation requests need this key
//! - `TUMBUH_API_KEY_SCOPE`: `evaluate` (default) or `all`

mod auth;
mod cors;
mod handlers;
mod middleware;
mod types;

// Re-exports for external use
pub use auth::{API_KEY_HEADER, ApiKeyGuard, KeyScope};
pub use cors::CorsOrigins;
pub use middleware::{create_rate_limiter, get_rate_limit_from_env};
// Re-export handlers and types for integration tests (via `tumbuh::api::*`)
#[allow(unused_imports)]
pub use handlers::{
    ApiError, batch_handler, curve_handler, evaluate_handler, evaluate_requests, health_handler,
    reference_handler,
};
#[allow(unused_imports)]
pub use types::{
    BatchItem, BatchRequest, BatchResponse, CurveQuery, CurveResponse, ErrorResponse,
    EvaluateResponse, HealthResponse, MeasurementRequest, ReferenceResponse,
};

use axum::{
    Router,
    middleware as axum_middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tumbuh_core::{Evaluator, GrowthError};

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state. The evaluator is immutable, so no lock is needed.
#[derive(Clone)]
pub struct AppState {
    pub evaluator: Arc<Evaluator>,
}

impl AppState {
    #[must_use]
    pub fn new(evaluator: Evaluator) -> Self {
        Self {
            evaluator: Arc::new(evaluator),
        }
    }
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Rate Limiting (if enabled)
/// 4. API key check (if configured, scoped by `TUMBUH_API_KEY_SCOPE`)
pub fn create_router(state: AppState) -> Router {
    let rate_limit = get_rate_limit_from_env();
    let rate_limiter = if rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", rate_limit);
        Some(create_rate_limiter(rate_limit))
    } else {
        tracing::info!("Rate limiting disabled");
        None
    };

    let key_guard = ApiKeyGuard::from_env();
    match &key_guard {
        Some(guard) => tracing::info!(scope = ?guard.scope(), "API key required"),
        None => tracing::warn!(
            "No TUMBUH_API_KEY set - evaluation endpoints are publicly accessible"
        ),
    }

    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/reference", get(handlers::reference_handler))
        .route("/evaluate", post(handlers::evaluate_handler))
        .route("/evaluate/batch", post(handlers::batch_handler))
        .route("/curve/{standard}/{sex}", get(handlers::curve_handler));

    if let Some(guard) = key_guard {
        router = router.layer(axum_middleware::from_fn_with_state(
            Arc::new(guard),
            auth::require_api_key,
        ));
    }

    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsOrigins::from_env().layer())
                .layer(axum::extract::DefaultBodyLimit::max(4 * 1024 * 1024)),
        )
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server. Reference data is already loaded when this runs.
pub async fn run_server(addr: &str, evaluator: Evaluator) -> Result<(), GrowthError> {
    let state = AppState::new(evaluator);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| GrowthError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("Tumbuh HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| GrowthError::IoError(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
