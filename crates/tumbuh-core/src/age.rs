//! Age at measurement from calendar dates.
//!
//! WHO expresses age in months of 30.4375 days (365.25 / 12).

use crate::primitives::DAYS_PER_MONTH;
use crate::types::ValidationError;
use chrono::NaiveDate;

/// Whole days between birth and measurement.
pub fn age_in_days(birth_date: NaiveDate, measured_on: NaiveDate) -> Result<i64, ValidationError> {
    let days = measured_on.signed_duration_since(birth_date).num_days();
    if days < 0 {
        return Err(ValidationError::MeasuredBeforeBirth {
            birth_date,
            measured_on,
        });
    }
    Ok(days)
}

/// Fractional age in months between birth and measurement.
pub fn age_in_months(birth_date: NaiveDate, measured_on: NaiveDate) -> Result<f64, ValidationError> {
    let days = age_in_days(birth_date, measured_on)?;
    Ok(days as f64 / DAYS_PER_MONTH)
}
