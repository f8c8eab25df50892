//! Embedded reference data.
//!
//! The WHO Child Growth Standards (2006) LMS tables are embedded at compile
//! time using `include_str!()`, so a binary never depends on files at runtime.
//!
//! Each file has the header `key,l,m,s`. Age tables are monthly, length and
//! height tables use 0.5 cm steps.

use crate::types::{Sex, Standard};

/// Name of the embedded dataset, reported by `ReferenceSet::source()`.
pub const EMBEDDED_DATASET: &str = "WHO Child Growth Standards 2006";

// =============================================================================
// WEIGHT-FOR-AGE (0-60 months)
// =============================================================================

pub const WFA_BOYS: &str = include_str!("../../data/who2006/wfa_boys.csv");
pub const WFA_GIRLS: &str = include_str!("../../data/who2006/wfa_girls.csv");

// =============================================================================
// LENGTH-FOR-AGE (0-24 months) / HEIGHT-FOR-AGE (24-60 months)
// =============================================================================

pub const LFA_BOYS: &str = include_str!("../../data/who2006/lfa_boys.csv");
pub const LFA_GIRLS: &str = include_str!("../../data/who2006/lfa_girls.csv");
pub const HFA_BOYS: &str = include_str!("../../data/who2006/hfa_boys.csv");
pub const HFA_GIRLS: &str = include_str!("../../data/who2006/hfa_girls.csv");

// =============================================================================
// HEAD-CIRCUMFERENCE-FOR-AGE (0-60 months)
// =============================================================================

pub const HCFA_BOYS: &str = include_str!("../../data/who2006/hcfa_boys.csv");
pub const HCFA_GIRLS: &str = include_str!("../../data/who2006/hcfa_girls.csv");

// =============================================================================
// WEIGHT-FOR-LENGTH (45-110 cm) / WEIGHT-FOR-HEIGHT (65-120 cm)
// =============================================================================

pub const WFL_BOYS: &str = include_str!("../../data/who2006/wfl_boys.csv");
pub const WFL_GIRLS: &str = include_str!("../../data/who2006/wfl_girls.csv");
pub const WFH_BOYS: &str = include_str!("../../data/who2006/wfh_boys.csv");
pub const WFH_GIRLS: &str = include_str!("../../data/who2006/wfh_girls.csv");

/// Embedded CSV for one table.
#[must_use]
pub fn csv_for(standard: Standard, sex: Sex) -> &'static str {
    match (standard, sex) {
        (Standard::WeightForAge, Sex::Male) => WFA_BOYS,
        (Standard::WeightForAge, Sex::Female) => WFA_GIRLS,
        (Standard::LengthForAge, Sex::Male) => LFA_BOYS,
        (Standard::LengthForAge, Sex::Female) => LFA_GIRLS,
        (Standard::HeightForAge, Sex::Male) => HFA_BOYS,
        (Standard::HeightForAge, Sex::Female) => HFA_GIRLS,
        (Standard::HeadCircumferenceForAge, Sex::Male) => HCFA_BOYS,
        (Standard::HeadCircumferenceForAge, Sex::Female) => HCFA_GIRLS,
        (Standard::WeightForLength, Sex::Male) => WFL_BOYS,
        (Standard::WeightForLength, Sex::Female) => WFL_GIRLS,
        (Standard::WeightForHeight, Sex::Male) => WFH_BOYS,
        (Standard::WeightForHeight, Sex::Female) => WFH_GIRLS,
    }
}

/// File name used for a table, both for the embedded assets and `from_dir`.
#[must_use]
pub fn file_name(standard: Standard, sex: Sex) -> String {
    format!("{}_{}.csv", standard.code(), sex.file_suffix())
}
