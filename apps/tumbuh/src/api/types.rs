//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API. The same
//! `MeasurementRequest` is the record format of CLI batch files.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tumbuh_core::{
    Axis, CurvePoint, Evaluation, Measurement, MeasurementPosition, ReferenceSource, Sex,
    Standard, Status, TableSummary, ValidationError,
};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// ERROR RESPONSE
// =============================================================================

/// Body of every 4xx response produced by a handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

// =============================================================================
// REFERENCE RESPONSE
// =============================================================================

/// Loaded reference data and evaluator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceResponse {
    pub source: ReferenceSource,
    /// BLAKE3 digest of the loaded tables.
    pub fingerprint: String,
    pub restrict_tails: bool,
    pub tables: Vec<TableSummary>,
}

// =============================================================================
// MEASUREMENT REQUEST
// =============================================================================

/// One measurement as received over the wire.
///
/// Age comes either from `age_in_months` or from `birth_date` plus
/// `measured_on`. When both are present `age_in_months` wins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeasurementRequest {
    /// `MALE` / `FEMALE` (also `L` / `P`, case-insensitive).
    pub sex: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_in_months: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measured_on: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height_cm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_circumference_cm: Option<f64>,
    /// `recumbent` / `standing`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
}

impl MeasurementRequest {
    /// Convert to a core `Measurement`, validating sex, position and age.
    ///
    /// Measured values are not checked here: a non-positive weight becomes an
    /// `invalid` outcome for its indicators, not a rejected request.
    pub fn to_measurement(&self) -> Result<Measurement, ValidationError> {
        let sex: Sex = self.sex.parse()?;

        let mut measurement = match (self.age_in_months, self.birth_date, self.measured_on) {
            (Some(age), _, _) => {
                if !age.is_finite() {
                    return Err(ValidationError::NonFiniteAge);
                }
                Measurement::new(sex, age)
            }
            (None, Some(birth), Some(measured)) => Measurement::from_dates(sex, birth, measured)?,
            _ => return Err(ValidationError::MissingAge),
        };

        measurement.weight_kg = self.weight_kg;
        measurement.height_cm = self.height_cm;
        measurement.head_circumference_cm = self.head_circumference_cm;
        if let Some(position) = self.position.as_deref().filter(|p| !p.trim().is_empty()) {
            measurement.position = Some(position.parse::<MeasurementPosition>()?);
        }
        Ok(measurement)
    }
}

// =============================================================================
// EVALUATE RESPONSE
// =============================================================================

/// Evaluation of one measurement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluateResponse {
    pub sex: Sex,
    pub age_in_months: f64,
    /// Most severe status among the computed indicators.
    pub worst_status: Option<Status>,
    pub evaluation: Evaluation,
}

impl EvaluateResponse {
    #[must_use]
    pub fn new(measurement: &Measurement, evaluation: Evaluation) -> Self {
        Self {
            sex: measurement.sex,
            age_in_months: measurement.age_in_months,
            worst_status: evaluation.worst_status(),
            evaluation,
        }
    }
}

// =============================================================================
// BATCH REQUEST/RESPONSE
// =============================================================================

/// Batch evaluation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
    pub measurements: Vec<MeasurementRequest>,
}

/// Result for one record of a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchItem {
    pub index: usize,
    pub success: bool,
    pub result: Option<EvaluateResponse>,
    pub error: Option<String>,
}

impl BatchItem {
    #[must_use]
    pub fn success(index: usize, result: EvaluateResponse) -> Self {
        Self {
            index,
            success: true,
            result: Some(result),
            error: None,
        }
    }

    #[must_use]
    pub fn error(index: usize, error: impl Into<String>) -> Self {
        Self {
            index,
            success: false,
            result: None,
            error: Some(error.into()),
        }
    }
}

/// Batch evaluation response, in request order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResponse {
    pub count: usize,
    pub rejected: usize,
    pub results: Vec<BatchItem>,
}

impl BatchResponse {
    #[must_use]
    pub fn new(results: Vec<BatchItem>) -> Self {
        Self {
            count: results.len(),
            rejected: results.iter().filter(|r| !r.success).count(),
            results,
        }
    }
}

// =============================================================================
// CURVE QUERY/RESPONSE
// =============================================================================

/// Query string of `GET /curve/{standard}/{sex}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CurveQuery {
    /// SD line to draw. Defaults to the median.
    #[serde(default)]
    pub z: f64,
}

/// An SD line across one reference table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveResponse {
    pub standard: Standard,
    pub sex: Sex,
    pub axis: Axis,
    pub z: f64,
    pub points: Vec<CurvePoint>,
}
