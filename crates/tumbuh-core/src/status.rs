//! # Status Module
//!
//! Turns a z-score into the three-way clinical status, the WHO
//! biologically-implausible flag and an indicator-specific label.
//!
//! | Status | Range |
//! |--------|-------|
//! | `normal` | `-2 <= Z <= 2` |
//! | `warning` | `2 < |Z| < 3` |
//! | `alert` | `|Z| >= 3`, or Z not finite |

use crate::primitives::{ALERT_LIMIT, NORMAL_LIMIT};
use crate::types::Indicator;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Three-way clinical status. Ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Normal,
    Warning,
    Alert,
}

impl Status {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Normal => "normal",
            Status::Warning => "warning",
            Status::Alert => "alert",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a z-score. Total: NaN and infinities are `alert`.
#[must_use]
pub fn classify(z: f64) -> Status {
    let magnitude = z.abs();
    if magnitude <= NORMAL_LIMIT {
        Status::Normal
    } else if magnitude < ALERT_LIMIT {
        Status::Warning
    } else {
        Status::Alert
    }
}

/// WHO flag for a z-score too extreme to be a real measurement.
///
/// Limits follow WHO Anthro: WFA < -6 or > 5, HFA < -6 or > 6,
/// WFH and HCFA < -5 or > 5. Non-finite z-scores are always flagged.
#[must_use]
pub fn is_implausible(indicator: Indicator, z: f64) -> bool {
    let (low, high) = match indicator {
        Indicator::WeightForAge => (-6.0, 5.0),
        Indicator::HeightForAge => (-6.0, 6.0),
        Indicator::WeightForHeight | Indicator::HeadCircumferenceForAge => (-5.0, 5.0),
    };
    !(z >= low && z <= high)
}

// =============================================================================
// INTERPRETATION
// =============================================================================

/// Indicator-specific clinical label for a z-score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpretation {
    Normal,
    SeverelyUnderweight,
    Underweight,
    PossibleGrowthProblem,
    SeverelyStunted,
    Stunted,
    VeryTall,
    SeverelyWasted,
    Wasted,
    PossibleRiskOfOverweight,
    Overweight,
    Obese,
    Microcephaly,
    Macrocephaly,
}

impl Interpretation {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Interpretation::Normal => "normal",
            Interpretation::SeverelyUnderweight => "severely underweight",
            Interpretation::Underweight => "underweight",
            Interpretation::PossibleGrowthProblem => "possible growth problem",
            Interpretation::SeverelyStunted => "severely stunted",
            Interpretation::Stunted => "stunted",
            Interpretation::VeryTall => "very tall",
            Interpretation::SeverelyWasted => "severely wasted",
            Interpretation::Wasted => "wasted",
            Interpretation::PossibleRiskOfOverweight => "possible risk of overweight",
            Interpretation::Overweight => "overweight",
            Interpretation::Obese => "obese",
            Interpretation::Microcephaly => "microcephaly",
            Interpretation::Macrocephaly => "macrocephaly",
        }
    }
}

impl fmt::Display for Interpretation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Label a z-score for one indicator. `None` when z is not finite.
#[must_use]
pub fn interpret(indicator: Indicator, z: f64) -> Option<Interpretation> {
    if !z.is_finite() {
        return None;
    }
    let label = match indicator {
        Indicator::WeightForAge => {
            if z < -3.0 {
                Interpretation::SeverelyUnderweight
            } else if z < -2.0 {
                Interpretation::Underweight
            } else if z > 1.0 {
                Interpretation::PossibleGrowthProblem
            } else {
                Interpretation::Normal
            }
        }
        Indicator::HeightForAge => {
            if z < -3.0 {
                Interpretation::SeverelyStunted
            } else if z < -2.0 {
                Interpretation::Stunted
            } else if z > 3.0 {
                Interpretation::VeryTall
            } else {
                Interpretation::Normal
            }
        }
        Indicator::WeightForHeight => {
            if z < -3.0 {
                Interpretation::SeverelyWasted
            } else if z < -2.0 {
                Interpretation::Wasted
            } else if z > 3.0 {
                Interpretation::Obese
            } else if z > 2.0 {
                Interpretation::Overweight
            } else if z > 1.0 {
                Interpretation::PossibleRiskOfOverweight
            } else {
                Interpretation::Normal
            }
        }
        Indicator::HeadCircumferenceForAge => {
            if z < -2.0 {
                Interpretation::Microcephaly
            } else if z > 2.0 {
                Interpretation::Macrocephaly
            } else {
                Interpretation::Normal
            }
        }
    };
    Some(label)
}
