//! # Lookup Module
//!
//! Maps (indicator, sex, age, height) onto the LMS parameters of the matching
//! WHO table.
//!
//! - Age-indexed standards use age in months as the key.
//! - Weight-for-length/height uses the (position-adjusted) length in cm.
//! - Keys between two rows are linearly interpolated, independently for L, M
//!   and S. An exact key returns the row unchanged.
//! - Ages up to half a day outside `[0, 60]` months are clamped onto the
//!   boundary. Anything further out is an `OutOfRange`.

use crate::primitives::{
    AGE_CLAMP_TOLERANCE_MONTHS, KEY_TOLERANCE, LENGTH_HEIGHT_CUTOFF_MONTHS,
    LENGTH_HEIGHT_OFFSET_CM, MAX_AGE_MONTHS, MIN_AGE_MONTHS,
};
use crate::reference::{LmsParams, ReferenceSet, ReferenceTable};
use crate::types::{
    Axis, Indicator, MeasurementPosition, OutOfRange, Quantity, Sex, Standard, ValidationError,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result of resolving an indicator to concrete LMS parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lookup {
    /// The WHO table that served the lookup.
    pub standard: Standard,
    /// Key actually used: clamped age, or adjusted length/height.
    pub lookup_value: f64,
    pub lms: LmsParams,
}

/// Why a lookup produced no parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LookupError {
    #[error(transparent)]
    OutOfRange(#[from] OutOfRange),

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

// =============================================================================
// TABLE INTERPOLATION
// =============================================================================

impl ReferenceTable {
    /// LMS parameters at `x`, linearly interpolated between bracketing rows.
    ///
    /// Age-indexed tables clamp keys within half a day of their domain.
    pub fn interpolate(&self, x: f64) -> Result<LmsParams, OutOfRange> {
        let standard = self.standard();
        let axis = standard.axis();
        let (min, max) = standard.domain();
        let tolerance = match axis {
            Axis::AgeMonths => AGE_CLAMP_TOLERANCE_MONTHS,
            Axis::LengthCm => KEY_TOLERANCE,
        };

        // Negated form so NaN lands here too.
        if !(x >= min - tolerance && x <= max + tolerance) {
            return Err(OutOfRange {
                standard,
                axis,
                value: x,
                min,
                max,
            });
        }
        let x = x.clamp(min, max);

        let rows = self.rows();
        let step = standard.step();
        let position = (x - min) / step;
        let lower = (position.floor() as usize).min(rows.len().saturating_sub(1));

        let low = &rows[lower];
        let Some(high) = rows.get(lower + 1) else {
            return Ok(low.params());
        };

        let fraction = (x - low.key) / (high.key - low.key);
        if fraction.abs() <= KEY_TOLERANCE {
            return Ok(low.params());
        }

        Ok(LmsParams {
            l: lerp(low.l, high.l, fraction),
            m: lerp(low.m, high.m, fraction),
            s: lerp(low.s, high.s, fraction),
        })
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

// =============================================================================
// INDICATOR LOOKUP
// =============================================================================

/// Validate an age and clamp it onto `[0, 60]` within tolerance.
pub fn checked_age(standard: Standard, age_in_months: f64) -> Result<f64, LookupError> {
    if !age_in_months.is_finite() {
        return Err(ValidationError::NonFiniteAge.into());
    }
    if age_in_months < MIN_AGE_MONTHS - AGE_CLAMP_TOLERANCE_MONTHS
        || age_in_months > MAX_AGE_MONTHS + AGE_CLAMP_TOLERANCE_MONTHS
    {
        return Err(OutOfRange {
            standard,
            axis: Axis::AgeMonths,
            value: age_in_months,
            min: MIN_AGE_MONTHS,
            max: MAX_AGE_MONTHS,
        }
        .into());
    }
    Ok(age_in_months.clamp(MIN_AGE_MONTHS, MAX_AGE_MONTHS))
}

impl ReferenceSet {
    /// Resolve an indicator for one child to LMS parameters.
    ///
    /// `height_cm` is required for weight-for-height and must already be
    /// position-adjusted. It is ignored by the age-indexed indicators.
    pub fn lookup(
        &self,
        indicator: Indicator,
        sex: Sex,
        age_in_months: f64,
        height_cm: Option<f64>,
    ) -> Result<Lookup, LookupError> {
        let standard = indicator.standard_for_age(age_in_months);
        let age = checked_age(standard, age_in_months)?;
        let table = self.table(standard, sex);

        let lookup_value = match standard.axis() {
            Axis::AgeMonths => age,
            Axis::LengthCm => {
                let height = height_cm.ok_or(ValidationError::MissingHeight)?;
                Quantity::Height.validate(height)?
            }
        };

        let lms = table.interpolate(lookup_value)?;
        Ok(Lookup {
            standard,
            lookup_value,
            lms,
        })
    }
}

/// Convert a length/height to the position the age's table expects.
///
/// Under 24 months the tables assume recumbent length, so a standing height
/// gains 0.7 cm. From 24 months they assume standing height, so a recumbent
/// length loses 0.7 cm. `None` means the age-appropriate position was used.
#[must_use]
pub fn position_adjusted_height(
    height_cm: f64,
    age_in_months: f64,
    position: Option<MeasurementPosition>,
) -> f64 {
    let expects_recumbent = age_in_months < LENGTH_HEIGHT_CUTOFF_MONTHS;
    match (position, expects_recumbent) {
        (Some(MeasurementPosition::Standing), true) => height_cm + LENGTH_HEIGHT_OFFSET_CM,
        (Some(MeasurementPosition::Recumbent), false) => height_cm - LENGTH_HEIGHT_OFFSET_CM,
        _ => height_cm,
    }
}

// =============================================================================
// TESTS
// =============================================================================
