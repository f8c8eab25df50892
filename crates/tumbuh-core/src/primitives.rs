//! # Evaluation Primitives
//!
//! Fixed numerical constants for the growth-standard engine.
//!
//! These values are compiled into the binary and are immutable at runtime.
//! They come from the WHO Child Growth Standards (2006) and the WHO Anthro
//! software conventions.

/// Below this magnitude the Box-Cox power `L` is treated as zero.
///
/// The general LMS formula divides by `L`, so `|L| <= LMS_EPSILON` switches
/// to the logarithmic form `ln(v / M) / S`.
pub const LMS_EPSILON: f64 = 1e-6;

/// Youngest supported age for age-indexed indicators (months).
pub const MIN_AGE_MONTHS: f64 = 0.0;

/// Oldest supported age for age-indexed indicators (months).
pub const MAX_AGE_MONTHS: f64 = 60.0;

/// Age at which WHO switches from recumbent length to standing height.
///
/// Children younger than this are assessed against the length tables,
/// children this age or older against the height tables.
pub const LENGTH_HEIGHT_CUTOFF_MONTHS: f64 = 24.0;

/// Ages this close outside `[MIN_AGE_MONTHS, MAX_AGE_MONTHS]` are clamped onto
/// the boundary instead of being reported as out of range.
///
/// Half a day, expressed in months.
pub const AGE_CLAMP_TOLERANCE_MONTHS: f64 = 0.5 / DAYS_PER_MONTH;

/// Tolerance used when comparing table keys (cm or months).
pub const KEY_TOLERANCE: f64 = 1e-6;

/// WHO average month length in days (365.25 / 12).
pub const DAYS_PER_MONTH: f64 = 30.4375;

/// Difference between recumbent length and standing height (cm).
///
/// Standing height is on average 0.7 cm less than recumbent length.
pub const LENGTH_HEIGHT_OFFSET_CM: f64 = 0.7;

// =============================================================================
// STATUS BANDS
// =============================================================================

/// |Z| at or below this value is `normal`.
pub const NORMAL_LIMIT: f64 = 2.0;

/// |Z| at or above this value is `alert`.
pub const ALERT_LIMIT: f64 = 3.0;

// =============================================================================
// INPUT LIMITS
// =============================================================================

/// Maximum number of measurements in a single batch evaluation.
///
/// Batches longer than this are rejected at the API boundary.
pub const MAX_BATCH_SIZE: usize = 5000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_month_is_a_quarter_year_over_three() {
        assert!((DAYS_PER_MONTH * 12.0 - 365.25).abs() < 1e-12);
    }

    #[test]
    fn status_limits_are_ordered() {
        assert!(NORMAL_LIMIT < ALERT_LIMIT);
    }

    #[test]
    fn clamp_tolerance_is_half_a_day() {
        assert!((AGE_CLAMP_TOLERANCE_MONTHS * DAYS_PER_MONTH - 0.5).abs() < 1e-12);
    }
}
