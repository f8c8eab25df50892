//! # LMS Module
//!
//! Cole's LMS transform between a measurement and its z-score.
//!
//! ```text
//! |L| >  1e-6 :  Z = ((v / M)^L - 1) / (L * S)
//! |L| <= 1e-6 :  Z = ln(v / M) / S
//! ```
//!
//! Also provides the inverse transform, the WHO restricted application for
//! weight-based indicators beyond ±3 SD, and the percentile of a z-score.

use crate::primitives::{ALERT_LIMIT, LMS_EPSILON, NORMAL_LIMIT};
use crate::reference::LmsParams;
use crate::types::{Quantity, ValidationError};
use statrs::function::erf::erf;

/// Raw LMS transform. Assumes `value` is finite and positive.
#[must_use]
pub fn transform(value: f64, lms: &LmsParams) -> f64 {
    let ratio = value / lms.m;
    if lms.l.abs() > LMS_EPSILON {
        (ratio.powf(lms.l) - 1.0) / (lms.l * lms.s)
    } else {
        ratio.ln() / lms.s
    }
}

/// Z-score of a measured quantity.
///
/// Rejects non-finite and non-positive values.
pub fn z_score(quantity: Quantity, value: f64, lms: &LmsParams) -> Result<f64, ValidationError> {
    let value = quantity.validate(value)?;
    Ok(transform(value, lms))
}

/// Measurement value at a given z-score (inverse transform).
///
/// `None` when the Box-Cox base is not positive, i.e. the z-score lies
/// beyond what the distribution can represent.
#[must_use]
pub fn value_at(z: f64, lms: &LmsParams) -> Option<f64> {
    let value = if lms.l.abs() > LMS_EPSILON {
        let base = 1.0 + lms.l * lms.s * z;
        if base <= 0.0 {
            return None;
        }
        lms.m * base.powf(1.0 / lms.l)
    } else {
        lms.m * (lms.s * z).exp()
    };
    value.is_finite().then_some(value)
}

/// WHO restricted application of the LMS method.
///
/// Beyond ±3 SD the z-score is extrapolated linearly using the distance
/// between the SD2 and SD3 lines, which keeps extreme weights from being
/// compressed by the skewed tail. Inside ±3 SD `z` is returned unchanged.
#[must_use]
pub fn restricted_z_score(value: f64, z: f64, lms: &LmsParams) -> f64 {
    if z > ALERT_LIMIT {
        match (value_at(ALERT_LIMIT, lms), value_at(NORMAL_LIMIT, lms)) {
            (Some(sd3), Some(sd2)) if sd3 > sd2 => ALERT_LIMIT + (value - sd3) / (sd3 - sd2),
            _ => z,
        }
    } else if z < -ALERT_LIMIT {
        match (value_at(-ALERT_LIMIT, lms), value_at(-NORMAL_LIMIT, lms)) {
            (Some(sd3), Some(sd2)) if sd2 > sd3 => -ALERT_LIMIT + (value - sd3) / (sd2 - sd3),
            _ => z,
        }
    } else {
        z
    }
}

/// Percentile (0-100) of a z-score under the standard normal distribution.
#[must_use]
pub fn percentile(z: f64) -> f64 {
    50.0 * (1.0 + erf(z / std::f64::consts::SQRT_2))
}
