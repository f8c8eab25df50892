//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.
//!
//! Per-indicator failures (invalid value, out of range) are part of a
//! successful 200 response. Only requests that cannot be evaluated at all
//! (bad sex, missing age, oversized batch) are rejected with 400.

use super::{
    AppState,
    types::{
        BatchItem, BatchRequest, BatchResponse, CurveQuery, CurveResponse, ErrorResponse,
        EvaluateResponse, HealthResponse, MeasurementRequest, ReferenceResponse,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tumbuh_core::{
    Evaluator, Measurement, Sex, Standard, ValidationError, primitives::MAX_BATCH_SIZE,
};

/// Rejection returned by handlers.
pub type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(message: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message)))
}

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// REFERENCE HANDLER
// =============================================================================

/// Describe the loaded reference tables.
pub async fn reference_handler(State(state): State<AppState>) -> impl IntoResponse {
    let reference = state.evaluator.reference();
    let response = ReferenceResponse {
        source: reference.source().clone(),
        fingerprint: reference.fingerprint(),
        restrict_tails: state.evaluator.config().restrict_tails,
        tables: reference.summaries(),
    };
    (StatusCode::OK, Json(response))
}

// =============================================================================
// EVALUATE HANDLERS
// =============================================================================

/// Evaluate one measurement.
pub async fn evaluate_handler(
    State(state): State<AppState>,
    Json(request): Json<MeasurementRequest>,
) -> Result<Json<EvaluateResponse>, ApiError> {
    let measurement = request
        .to_measurement()
        .map_err(|e| bad_request(format!("Invalid measurement: {}", e)))?;

    let evaluation = state.evaluator.evaluate(&measurement);
    Ok(Json(EvaluateResponse::new(&measurement, evaluation)))
}

/// Evaluate many measurements. Unusable records are reported in place.
pub async fn batch_handler(
    State(state): State<AppState>,
    Json(request): Json<BatchRequest>,
) -> Result<Json<BatchResponse>, ApiError> {
    if request.measurements.len() > MAX_BATCH_SIZE {
        return Err(bad_request(format!(
            "Batch size {} exceeds maximum {}",
            request.measurements.len(),
            MAX_BATCH_SIZE
        )));
    }

    let results = evaluate_requests(&state.evaluator, &request.measurements);
    tracing::debug!(count = results.len(), "Batch evaluated");
    Ok(Json(BatchResponse::new(results)))
}

/// Evaluate records in order. Each record is converted independently and
/// rejected records keep their position in the output.
pub fn evaluate_requests(evaluator: &Evaluator, requests: &[MeasurementRequest]) -> Vec<BatchItem> {
    let converted: Vec<Result<Measurement, ValidationError>> = requests
        .iter()
        .map(MeasurementRequest::to_measurement)
        .collect();
    let accepted: Vec<Measurement> = converted
        .iter()
        .filter_map(|c| c.as_ref().ok())
        .cloned()
        .collect();
    let mut evaluations = evaluator.evaluate_batch(&accepted).into_iter().zip(accepted);

    converted
        .into_iter()
        .enumerate()
        .map(|(index, conversion)| match conversion {
            Err(e) => BatchItem::error(index, e.to_string()),
            Ok(_) => match evaluations.next() {
                Some((evaluation, measurement)) => {
                    BatchItem::success(index, EvaluateResponse::new(&measurement, evaluation))
                }
                None => BatchItem::error(index, "record was not evaluated"),
            },
        })
        .collect()
}

// =============================================================================
// CURVE HANDLER
// =============================================================================

/// One SD line of a reference table.
pub async fn curve_handler(
    State(state): State<AppState>,
    Path((standard, sex)): Path<(String, String)>,
    Query(query): Query<CurveQuery>,
) -> Result<Json<CurveResponse>, ApiError> {
    let standard: Standard = standard.parse().map_err(|e| bad_request(format!("{}", e)))?;
    let sex: Sex = sex.parse().map_err(|e| bad_request(format!("{}", e)))?;
    if !query.z.is_finite() {
        return Err(bad_request("z must be a finite number"));
    }

    let points = state.evaluator.sd_curve(standard, sex, query.z);
    Ok(Json(CurveResponse {
        standard,
        sex,
        axis: standard.axis(),
        z: query.z,
        points,
    }))
}
