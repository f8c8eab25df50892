//! # Core Type Definitions
//!
//! This module contains the shared vocabulary of the growth engine:
//! - Subject descriptors (`Sex`, `MeasurementPosition`)
//! - Indicator and table identifiers (`Indicator`, `Standard`, `Axis`)
//! - The input record (`Measurement`)
//! - Error types (`GrowthError`, `ValidationError`, `OutOfRange`)
//!
//! ## Outcome Classes
//!
//! - `GrowthError`: fatal, raised while loading reference data or configuration
//! - `ValidationError`: a rejected input for one indicator
//! - `OutOfRange`: a valid input the reference tables do not cover

use crate::primitives::{LENGTH_HEIGHT_CUTOFF_MONTHS, MAX_AGE_MONTHS, MIN_AGE_MONTHS};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// SEX
// =============================================================================

/// Biological sex of the child. WHO publishes separate tables for each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    /// Both sexes, in table order.
    pub const ALL: [Sex; 2] = [Sex::Male, Sex::Female];

    /// Canonical wire name (`MALE` / `FEMALE`).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "MALE",
            Sex::Female => "FEMALE",
        }
    }

    /// Suffix used by WHO file names (`boys` / `girls`).
    #[must_use]
    pub fn file_suffix(&self) -> &'static str {
        match self {
            Sex::Male => "boys",
            Sex::Female => "girls",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Sex::Male => 0,
            Sex::Female => 1,
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sex {
    type Err = ValidationError;

    /// Accepts English and Indonesian spellings, case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" | "m" | "boy" | "boys" | "laki-laki" | "l" => Ok(Sex::Male),
            "female" | "f" | "girl" | "girls" | "perempuan" | "p" => Ok(Sex::Female),
            _ => Err(ValidationError::InvalidSex {
                value: s.to_string(),
            }),
        }
    }
}

// =============================================================================
// MEASUREMENT POSITION
// =============================================================================

/// How length/height was measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementPosition {
    /// Lying down (length board). Expected under 24 months.
    Recumbent,
    /// Standing (stadiometer). Expected from 24 months.
    Standing,
}

impl MeasurementPosition {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            MeasurementPosition::Recumbent => "recumbent",
            MeasurementPosition::Standing => "standing",
        }
    }
}

impl fmt::Display for MeasurementPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MeasurementPosition {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "recumbent" | "lying" | "length" => Ok(MeasurementPosition::Recumbent),
            "standing" | "height" => Ok(MeasurementPosition::Standing),
            _ => Err(ValidationError::InvalidPosition {
                value: s.to_string(),
            }),
        }
    }
}

// =============================================================================
// INDICATOR
// =============================================================================

/// The four clinical growth indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    WeightForAge,
    HeightForAge,
    WeightForHeight,
    HeadCircumferenceForAge,
}

impl Indicator {
    /// All indicators, in evaluation order.
    pub const ALL: [Indicator; 4] = [
        Indicator::WeightForAge,
        Indicator::HeightForAge,
        Indicator::WeightForHeight,
        Indicator::HeadCircumferenceForAge,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Indicator::WeightForAge => "weight_for_age",
            Indicator::HeightForAge => "height_for_age",
            Indicator::WeightForHeight => "weight_for_height",
            Indicator::HeadCircumferenceForAge => "head_circumference_for_age",
        }
    }

    /// The quantity whose z-score this indicator reports.
    #[must_use]
    pub fn quantity(&self) -> Quantity {
        match self {
            Indicator::WeightForAge | Indicator::WeightForHeight => Quantity::Weight,
            Indicator::HeightForAge => Quantity::Height,
            Indicator::HeadCircumferenceForAge => Quantity::HeadCircumference,
        }
    }

    /// Weight-based indicators are eligible for the WHO restricted-tail adjustment.
    #[must_use]
    pub fn is_weight_based(&self) -> bool {
        matches!(self, Indicator::WeightForAge | Indicator::WeightForHeight)
    }

    /// Select the WHO table family for a child of the given age.
    #[must_use]
    pub fn standard_for_age(&self, age_in_months: f64) -> Standard {
        let recumbent = age_in_months < LENGTH_HEIGHT_CUTOFF_MONTHS;
        match self {
            Indicator::WeightForAge => Standard::WeightForAge,
            Indicator::HeadCircumferenceForAge => Standard::HeadCircumferenceForAge,
            Indicator::HeightForAge if recumbent => Standard::LengthForAge,
            Indicator::HeightForAge => Standard::HeightForAge,
            Indicator::WeightForHeight if recumbent => Standard::WeightForLength,
            Indicator::WeightForHeight => Standard::WeightForHeight,
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// STANDARD (WHO TABLE FAMILY)
// =============================================================================

/// Independent variable of a reference table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    /// Age in months.
    AgeMonths,
    /// Recumbent length or standing height in cm.
    LengthCm,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::AgeMonths => f.write_str("age (months)"),
            Axis::LengthCm => f.write_str("length/height (cm)"),
        }
    }
}

/// One published WHO table family.
///
/// | Standard | Axis | Domain | Step |
/// |----------|------|--------|------|
/// | `WeightForAge` | age | 0–60 | 1 |
/// | `LengthForAge` | age | 0–24 | 1 |
/// | `HeightForAge` | age | 24–60 | 1 |
/// | `HeadCircumferenceForAge` | age | 0–60 | 1 |
/// | `WeightForLength` | cm | 45–110 | 0.5 |
/// | `WeightForHeight` | cm | 65–120 | 0.5 |
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Standard {
    WeightForAge,
    LengthForAge,
    HeightForAge,
    HeadCircumferenceForAge,
    WeightForLength,
    WeightForHeight,
}

impl Standard {
    pub const ALL: [Standard; 6] = [
        Standard::WeightForAge,
        Standard::LengthForAge,
        Standard::HeightForAge,
        Standard::HeadCircumferenceForAge,
        Standard::WeightForLength,
        Standard::WeightForHeight,
    ];

    /// Long snake_case name, matching the serde representation.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Standard::WeightForAge => "weight_for_age",
            Standard::LengthForAge => "length_for_age",
            Standard::HeightForAge => "height_for_age",
            Standard::HeadCircumferenceForAge => "head_circumference_for_age",
            Standard::WeightForLength => "weight_for_length",
            Standard::WeightForHeight => "weight_for_height",
        }
    }

    /// Short WHO code, also used for CSV file names.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Standard::WeightForAge => "wfa",
            Standard::LengthForAge => "lfa",
            Standard::HeightForAge => "hfa",
            Standard::HeadCircumferenceForAge => "hcfa",
            Standard::WeightForLength => "wfl",
            Standard::WeightForHeight => "wfh",
        }
    }

    #[must_use]
    pub fn axis(&self) -> Axis {
        match self {
            Standard::WeightForLength | Standard::WeightForHeight => Axis::LengthCm,
            _ => Axis::AgeMonths,
        }
    }

    /// Inclusive `(first, last)` key of the published table.
    #[must_use]
    pub fn domain(&self) -> (f64, f64) {
        match self {
            Standard::WeightForAge | Standard::HeadCircumferenceForAge => {
                (MIN_AGE_MONTHS, MAX_AGE_MONTHS)
            }
            Standard::LengthForAge => (MIN_AGE_MONTHS, LENGTH_HEIGHT_CUTOFF_MONTHS),
            Standard::HeightForAge => (LENGTH_HEIGHT_CUTOFF_MONTHS, MAX_AGE_MONTHS),
            Standard::WeightForLength => (45.0, 110.0),
            Standard::WeightForHeight => (65.0, 120.0),
        }
    }

    /// Distance between consecutive table keys.
    #[must_use]
    pub fn step(&self) -> f64 {
        match self.axis() {
            Axis::AgeMonths => 1.0,
            Axis::LengthCm => 0.5,
        }
    }

    /// Number of rows a complete table has.
    #[must_use]
    pub fn expected_rows(&self) -> usize {
        let (first, last) = self.domain();
        ((last - first) / self.step()).round() as usize + 1
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Standard::WeightForAge => 0,
            Standard::LengthForAge => 1,
            Standard::HeightForAge => 2,
            Standard::HeadCircumferenceForAge => 3,
            Standard::WeightForLength => 4,
            Standard::WeightForHeight => 5,
        }
    }
}

impl fmt::Display for Standard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Standard {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Standard::ALL
            .into_iter()
            .find(|standard| {
                standard.code() == wanted || standard.name() == wanted
            })
            .ok_or(ValidationError::UnknownStandard { value: s.to_string() })
    }
}

// =============================================================================
// QUANTITY
// =============================================================================

/// A measured physical quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quantity {
    Weight,
    Height,
    HeadCircumference,
}

impl Quantity {
    /// Reject values that cannot be physical measurements.
    pub fn validate(self, value: f64) -> Result<f64, ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::NonFiniteValue { quantity: self });
        }
        if value <= 0.0 {
            return Err(ValidationError::NonPositiveValue {
                quantity: self,
                value,
            });
        }
        Ok(value)
    }

    #[must_use]
    pub fn unit(&self) -> &'static str {
        match self {
            Quantity::Weight => "kg",
            Quantity::Height | Quantity::HeadCircumference => "cm",
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quantity::Weight => f.write_str("weight"),
            Quantity::Height => f.write_str("length/height"),
            Quantity::HeadCircumference => f.write_str("head circumference"),
        }
    }
}

// =============================================================================
// MEASUREMENT
// =============================================================================

/// One anthropometric measurement of a child.
///
/// Constructed per request and never persisted by the engine; callers store
/// the raw values alongside the computed z-scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub sex: Sex,
    /// Age at measurement, fractional months.
    pub age_in_months: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height_cm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_circumference_cm: Option<f64>,
    /// How length/height was taken. `None` means the age-appropriate position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<MeasurementPosition>,
}

impl Measurement {
    /// Create a measurement with no measured quantities.
    #[must_use]
    pub fn new(sex: Sex, age_in_months: f64) -> Self {
        Self {
            sex,
            age_in_months,
            weight_kg: None,
            height_cm: None,
            head_circumference_cm: None,
            position: None,
        }
    }

    /// Create a measurement whose age is derived from calendar dates.
    pub fn from_dates(
        sex: Sex,
        birth_date: NaiveDate,
        measured_on: NaiveDate,
    ) -> Result<Self, ValidationError> {
        let age = crate::age::age_in_months(birth_date, measured_on)?;
        Ok(Self::new(sex, age))
    }

    #[must_use]
    pub fn with_weight(mut self, weight_kg: f64) -> Self {
        self.weight_kg = Some(weight_kg);
        self
    }

    #[must_use]
    pub fn with_height(mut self, height_cm: f64) -> Self {
        self.height_cm = Some(height_cm);
        self
    }

    #[must_use]
    pub fn with_head_circumference(mut self, head_circumference_cm: f64) -> Self {
        self.head_circumference_cm = Some(head_circumference_cm);
        self
    }

    #[must_use]
    pub fn with_position(mut self, position: MeasurementPosition) -> Self {
        self.position = Some(position);
        self
    }

    /// Raw value reported by the given indicator, if it was measured.
    #[must_use]
    pub fn value_for(&self, indicator: Indicator) -> Option<f64> {
        match indicator.quantity() {
            Quantity::Weight => self.weight_kg,
            Quantity::Height => self.height_cm,
            Quantity::HeadCircumference => self.head_circumference_cm,
        }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Fatal errors: reference data or configuration cannot be used.
///
/// These are raised at startup. Once a `ReferenceSet` exists, evaluation
/// never produces a `GrowthError`.
#[derive(Debug, Error)]
pub enum GrowthError {
    /// A table required by a supported indicator is absent.
    #[error("Reference table missing: {standard} ({sex})")]
    MissingTable { standard: Standard, sex: Sex },

    /// A table exists but violates the reference-data invariants.
    #[error("Malformed reference table {standard} ({sex}): {reason}")]
    MalformedTable {
        standard: Standard,
        sex: Sex,
        reason: String,
    },

    /// A CSV source could not be parsed.
    #[error("CSV error in {source_name}: {message}")]
    Csv {
        source_name: String,
        message: String,
    },

    /// Configuration could not be read or parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An input record was rejected before evaluation.
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

/// A rejected input value.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    /// Zero or negative measurement.
    #[error("{quantity} must be greater than zero (got {value})")]
    NonPositiveValue { quantity: Quantity, value: f64 },

    /// NaN or infinite measurement.
    #[error("{quantity} must be a finite number")]
    NonFiniteValue { quantity: Quantity },

    /// NaN or infinite age.
    #[error("age must be a finite number of months")]
    NonFiniteAge,

    /// Measurement date precedes the birth date.
    #[error("measurement date {measured_on} is before birth date {birth_date}")]
    MeasuredBeforeBirth {
        birth_date: NaiveDate,
        measured_on: NaiveDate,
    },

    /// Neither an age nor a pair of dates was supplied.
    #[error("age is required: give age_in_months, or birth_date and measured_on")]
    MissingAge,

    /// Weight-for-height needs a height.
    #[error("weight-for-height requires a length/height measurement")]
    MissingHeight,

    /// Sex outside {MALE, FEMALE}.
    #[error("invalid sex '{value}', expected MALE or FEMALE")]
    InvalidSex { value: String },

    /// Unknown measurement position.
    #[error("invalid measurement position '{value}', expected recumbent or standing")]
    InvalidPosition { value: String },

    /// Unknown reference standard code.
    #[error("unknown reference standard '{value}'")]
    UnknownStandard { value: String },
}

/// A valid input that the reference tables do not cover.
///
/// Recoverable: callers still persist the raw measurement.
#[derive(Debug, Clone, Copy, PartialEq, Error, Serialize, Deserialize)]
#[error("{value} is outside the supported {axis} range {min}..={max} for {standard}")]
pub struct OutOfRange {
    pub standard: Standard,
    pub axis: Axis,
    pub value: f64,
    pub min: f64,
    pub max: f64,
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sex_parses_english_and_indonesian() {
        assert_eq!("MALE".parse::<Sex>().ok(), Some(Sex::Male));
        assert_eq!("perempuan".parse::<Sex>().ok(), Some(Sex::Female));
        assert_eq!(" f ".parse::<Sex>().ok(), Some(Sex::Female));
        assert!(matches!(
            "unknown".parse::<Sex>(),
            Err(ValidationError::InvalidSex { .. })
        ));
    }

    #[test]
    fn sex_displays_wire_name() {
        assert_eq!(Sex::Female.to_string(), "FEMALE");
        assert_eq!(Sex::Male.file_suffix(), "boys");
    }

    #[test]
    fn standard_selection_switches_at_24_months() {
        assert_eq!(
            Indicator::HeightForAge.standard_for_age(23.9),
            Standard::LengthForAge
        );
        assert_eq!(
            Indicator::HeightForAge.standard_for_age(24.0),
            Standard::HeightForAge
        );
        assert_eq!(
            Indicator::WeightForHeight.standard_for_age(10.0),
            Standard::WeightForLength
        );
        assert_eq!(
            Indicator::WeightForHeight.standard_for_age(36.0),
            Standard::WeightForHeight
        );
        assert_eq!(
            Indicator::WeightForAge.standard_for_age(59.0),
            Standard::WeightForAge
        );
    }

    #[test]
    fn standard_expected_rows() {
        assert_eq!(Standard::WeightForAge.expected_rows(), 61);
        assert_eq!(Standard::LengthForAge.expected_rows(), 25);
        assert_eq!(Standard::HeightForAge.expected_rows(), 37);
        assert_eq!(Standard::WeightForLength.expected_rows(), 131);
        assert_eq!(Standard::WeightForHeight.expected_rows(), 111);
    }

    #[test]
    fn standard_parses_code_and_name() {
        assert_eq!("wfh".parse::<Standard>().ok(), Some(Standard::WeightForHeight));
        assert_eq!(
            "Length_For_Age".parse::<Standard>().ok(),
            Some(Standard::LengthForAge)
        );
        assert!("bmi".parse::<Standard>().is_err());
    }

    #[test]
    fn quantity_validation_rejects_non_positive() {
        assert!(Quantity::Weight.validate(7.9).is_ok());
        assert!(matches!(
            Quantity::Weight.validate(0.0),
            Err(ValidationError::NonPositiveValue { .. })
        ));
        assert!(matches!(
            Quantity::Height.validate(-1.0),
            Err(ValidationError::NonPositiveValue { .. })
        ));
        assert!(matches!(
            Quantity::HeadCircumference.validate(f64::NAN),
            Err(ValidationError::NonFiniteValue { .. })
        ));
    }

    #[test]
    fn measurement_value_for_indicator() {
        let m = Measurement::new(Sex::Male, 6.0)
            .with_weight(7.9)
            .with_height(67.6);
        assert_eq!(m.value_for(Indicator::WeightForAge), Some(7.9));
        assert_eq!(m.value_for(Indicator::WeightForHeight), Some(7.9));
        assert_eq!(m.value_for(Indicator::HeightForAge), Some(67.6));
        assert_eq!(m.value_for(Indicator::HeadCircumferenceForAge), None);
    }
}
