//! # tumbuh-core
//!
//! The WHO child growth standard engine for Tumbuh - THE LOGIC.
//!
//! This crate converts a child's raw anthropometric measurements (weight,
//! length/height, head circumference) plus age and sex into WHO z-scores
//! using Cole's LMS method, and classifies each z-score into a clinical
//! status.
//!
//! ## Pipeline
//!
//! ```text
//! ReferenceSet -> lookup -> lms -> status -> Evaluation
//! ```
//!
//! ## Architectural Constraints
//!
//! - Reference data is loaded and validated once, then shared read-only
//! - Every input produces an outcome; nothing panics on bad data
//! - Indicators are evaluated independently
//! - Has NO async, NO network dependencies (pure Rust)

// =============================================================================
// MODULES
// =============================================================================

pub mod age;
pub mod evaluator;
pub mod lms;
pub mod lookup;
pub mod primitives;
pub mod reference;
pub mod status;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    Axis, GrowthError, Indicator, Measurement, MeasurementPosition, OutOfRange, Quantity, Sex,
    Standard, ValidationError,
};

// =============================================================================
// RE-EXPORTS: Reference Data
// =============================================================================

pub use reference::{LmsParams, LmsRow, ReferenceSet, ReferenceSource, ReferenceTable, TableSummary};

// =============================================================================
// RE-EXPORTS: Evaluation
// =============================================================================

pub use evaluator::{
    CurvePoint, Evaluation, Evaluator, EvaluatorConfig, IndicatorOutcome, ZScoreResult,
};
pub use lookup::{Lookup, LookupError, position_adjusted_height};
pub use status::{Interpretation, Status, classify, interpret, is_implausible};
