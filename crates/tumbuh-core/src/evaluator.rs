//! # Evaluator Module
//!
//! Runs the full pipeline for one measurement:
//!
//! ```text
//! validate -> lookup -> LMS transform -> classify
//! ```
//!
//! once per indicator. The outcome of each indicator is independent: a
//! missing head circumference does not stop weight-for-age from being
//! computed, and an out-of-range height does not invalidate the others.
//!
//! The evaluator holds the reference set behind an `Arc` and has no mutable
//! state, so one instance can serve any number of threads.

use crate::lms;
use crate::lookup::{LookupError, position_adjusted_height};
use crate::reference::{LmsParams, ReferenceSet};
use crate::status::{Interpretation, Status, classify, interpret, is_implausible};
use crate::types::{
    Indicator, Measurement, OutOfRange, Quantity, Sex, Standard, ValidationError,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Tunables for an `Evaluator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    /// Apply the WHO restricted application beyond ±3 SD for weight-based
    /// indicators. Off by default, which reports the plain LMS z-score.
    pub restrict_tails: bool,
}

// =============================================================================
// RESULTS
// =============================================================================

/// A computed z-score for one indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZScoreResult {
    pub indicator: Indicator,
    /// The WHO table that served the lookup.
    pub standard: Standard,
    /// Raw measured value.
    pub value: f64,
    /// Length/height after position adjustment, when an adjustment applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adjusted_value: Option<f64>,
    /// Age (months) or length/height (cm) used as the table key.
    pub lookup_value: f64,
    pub lms: LmsParams,
    pub z_score: f64,
    pub status: Status,
    /// Percentile (0-100) under the standard normal distribution.
    pub percentile: f64,
    /// Beyond the WHO biologically-plausible limits.
    pub implausible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpretation: Option<Interpretation>,
}

/// What happened to one indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IndicatorOutcome {
    Computed(ZScoreResult),
    OutOfRange(OutOfRange),
    Invalid { error: ValidationError },
    NotMeasured,
}

impl IndicatorOutcome {
    /// The computed result, if any.
    #[must_use]
    pub fn result(&self) -> Option<&ZScoreResult> {
        match self {
            IndicatorOutcome::Computed(result) => Some(result),
            _ => None,
        }
    }

    #[must_use]
    pub fn z_score(&self) -> Option<f64> {
        self.result().map(|r| r.z_score)
    }

    #[must_use]
    pub fn status(&self) -> Option<Status> {
        self.result().map(|r| r.status)
    }

    /// Short outcome tag, matching the serialized `outcome` field.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            IndicatorOutcome::Computed(_) => "computed",
            IndicatorOutcome::OutOfRange(_) => "out_of_range",
            IndicatorOutcome::Invalid { .. } => "invalid",
            IndicatorOutcome::NotMeasured => "not_measured",
        }
    }
}

impl From<LookupError> for IndicatorOutcome {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::OutOfRange(range) => IndicatorOutcome::OutOfRange(range),
            LookupError::Invalid(error) => IndicatorOutcome::Invalid { error },
        }
    }
}

impl From<ValidationError> for IndicatorOutcome {
    fn from(error: ValidationError) -> Self {
        IndicatorOutcome::Invalid { error }
    }
}

/// Fixed-shape evaluation: exactly one outcome per indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub weight_for_age: IndicatorOutcome,
    pub height_for_age: IndicatorOutcome,
    pub weight_for_height: IndicatorOutcome,
    pub head_circumference_for_age: IndicatorOutcome,
}

impl Evaluation {
    #[must_use]
    pub fn get(&self, indicator: Indicator) -> &IndicatorOutcome {
        match indicator {
            Indicator::WeightForAge => &self.weight_for_age,
            Indicator::HeightForAge => &self.height_for_age,
            Indicator::WeightForHeight => &self.weight_for_height,
            Indicator::HeadCircumferenceForAge => &self.head_circumference_for_age,
        }
    }

    /// Outcomes in indicator order.
    pub fn iter(&self) -> impl Iterator<Item = (Indicator, &IndicatorOutcome)> {
        Indicator::ALL.into_iter().map(|i| (i, self.get(i)))
    }

    /// Outcomes as an ordered map keyed by indicator.
    #[must_use]
    pub fn to_map(&self) -> BTreeMap<Indicator, IndicatorOutcome> {
        self.iter().map(|(i, o)| (i, o.clone())).collect()
    }

    /// Most severe status among computed indicators.
    #[must_use]
    pub fn worst_status(&self) -> Option<Status> {
        self.iter().filter_map(|(_, o)| o.status()).max()
    }

    /// Number of indicators with a computed z-score.
    #[must_use]
    pub fn computed_count(&self) -> usize {
        self.iter().filter(|(_, o)| o.result().is_some()).count()
    }
}

/// One point of an SD line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    /// Age (months) or length/height (cm).
    pub key: f64,
    /// Measurement value at the requested z-score.
    pub value: f64,
}

// =============================================================================
// EVALUATOR
// =============================================================================

/// The evaluation orchestrator.
#[derive(Debug, Clone)]
pub struct Evaluator {
    reference: Arc<ReferenceSet>,
    config: EvaluatorConfig,
}

impl Evaluator {
    #[must_use]
    pub fn new(reference: Arc<ReferenceSet>, config: EvaluatorConfig) -> Self {
        Self { reference, config }
    }

    #[must_use]
    pub fn reference(&self) -> &ReferenceSet {
        &self.reference
    }

    #[must_use]
    pub fn config(&self) -> EvaluatorConfig {
        self.config
    }

    /// Evaluate all four indicators for one measurement.
    #[must_use]
    pub fn evaluate(&self, measurement: &Measurement) -> Evaluation {
        Evaluation {
            weight_for_age: self.evaluate_indicator(measurement, Indicator::WeightForAge),
            height_for_age: self.evaluate_indicator(measurement, Indicator::HeightForAge),
            weight_for_height: self.evaluate_indicator(measurement, Indicator::WeightForHeight),
            head_circumference_for_age: self
                .evaluate_indicator(measurement, Indicator::HeadCircumferenceForAge),
        }
    }

    /// Evaluate many measurements, preserving order.
    #[must_use]
    pub fn evaluate_batch(&self, measurements: &[Measurement]) -> Vec<Evaluation> {
        let evaluations: Vec<Evaluation> =
            measurements.iter().map(|m| self.evaluate(m)).collect();
        tracing::debug!(count = evaluations.len(), "Evaluated batch");
        evaluations
    }

    /// Evaluate a single indicator.
    #[must_use]
    pub fn evaluate_indicator(
        &self,
        measurement: &Measurement,
        indicator: Indicator,
    ) -> IndicatorOutcome {
        let outcome = self.compute(measurement, indicator);
        match &outcome {
            IndicatorOutcome::Computed(result) => tracing::debug!(
                indicator = %indicator,
                standard = %result.standard,
                z_score = result.z_score,
                status = %result.status,
                "Indicator computed"
            ),
            other => tracing::debug!(
                indicator = %indicator,
                outcome = other.kind(),
                "Indicator not computed"
            ),
        }
        outcome
    }

    fn compute(&self, measurement: &Measurement, indicator: Indicator) -> IndicatorOutcome {
        let Some(raw) = measurement.value_for(indicator) else {
            return IndicatorOutcome::NotMeasured;
        };
        let value = match indicator.quantity().validate(raw) {
            Ok(value) => value,
            Err(error) => return error.into(),
        };

        let age = measurement.age_in_months;
        let adjust = |height: f64| position_adjusted_height(height, age, measurement.position);

        // Height-for-age transforms the adjusted height; weight-for-height
        // uses it as the table key. Other indicators ignore height.
        let (height_key, adjusted_value, transformed) = match indicator {
            Indicator::HeightForAge => {
                let adjusted = adjust(value);
                (None, changed(value, adjusted), adjusted)
            }
            Indicator::WeightForHeight => {
                let Some(height) = measurement.height_cm else {
                    return IndicatorOutcome::NotMeasured;
                };
                let height = match Quantity::Height.validate(height) {
                    Ok(height) => height,
                    Err(error) => return error.into(),
                };
                let adjusted = adjust(height);
                (Some(adjusted), changed(height, adjusted), value)
            }
            Indicator::WeightForAge | Indicator::HeadCircumferenceForAge => (None, None, value),
        };

        let lookup = match self
            .reference
            .lookup(indicator, measurement.sex, age, height_key)
        {
            Ok(lookup) => lookup,
            Err(err) => return err.into(),
        };

        let mut z = lms::transform(transformed, &lookup.lms);
        if self.config.restrict_tails && indicator.is_weight_based() {
            z = lms::restricted_z_score(transformed, z, &lookup.lms);
        }

        IndicatorOutcome::Computed(ZScoreResult {
            indicator,
            standard: lookup.standard,
            value,
            adjusted_value,
            lookup_value: lookup.lookup_value,
            lms: lookup.lms,
            z_score: z,
            status: classify(z),
            percentile: lms::percentile(z),
            implausible: is_implausible(indicator, z),
            interpretation: interpret(indicator, z),
        })
    }

    /// Values of the SD line at `z` across a whole table, for chart rendering.
    ///
    /// Keys where the distribution cannot represent `z` are skipped.
    #[must_use]
    pub fn sd_curve(&self, standard: Standard, sex: Sex, z: f64) -> Vec<CurvePoint> {
        self.reference
            .table(standard, sex)
            .rows()
            .iter()
            .filter_map(|row| {
                lms::value_at(z, &row.params()).map(|value| CurvePoint {
                    key: row.key,
                    value,
                })
            })
            .collect()
    }
}

fn changed(raw: f64, adjusted: f64) -> Option<f64> {
    (raw != adjusted).then_some(adjusted)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::types::MeasurementPosition;

    fn evaluator(restrict_tails: bool) -> Evaluator {
        Evaluator::new(
            Arc::new(ReferenceSet::embedded().unwrap()),
            EvaluatorConfig { restrict_tails },
        )
    }

    #[test]
    fn boy_at_median_weight_is_normal() {
        let m = Measurement::new(Sex::Male, 6.0).with_weight(7.9);
        let eval = evaluator(false).evaluate(&m);
        let wfa = eval.weight_for_age.result().unwrap();
        assert!(wfa.z_score.abs() < 0.05);
        assert_eq!(wfa.status, Status::Normal);
        assert_eq!(wfa.standard, Standard::WeightForAge);
        assert_eq!(eval.height_for_age, IndicatorOutcome::NotMeasured);
        assert_eq!(eval.weight_for_height, IndicatorOutcome::NotMeasured);
        assert_eq!(eval.head_circumference_for_age, IndicatorOutcome::NotMeasured);
    }

    #[test]
    fn underweight_girl_is_alert() {
        let m = Measurement::new(Sex::Female, 12.0).with_weight(6.0);
        let eval = evaluator(false).evaluate(&m);
        let wfa = eval.weight_for_age.result().unwrap();
        assert!(wfa.z_score <= -3.0);
        assert_eq!(wfa.status, Status::Alert);
        assert_eq!(
            wfa.interpretation,
            Some(Interpretation::SeverelyUnderweight)
        );
        assert_eq!(eval.worst_status(), Some(Status::Alert));
    }

    #[test]
    fn zero_weight_is_invalid() {
        let m = Measurement::new(Sex::Male, 6.0).with_weight(0.0).with_height(67.6);
        let eval = evaluator(false).evaluate(&m);
        assert!(matches!(
            eval.weight_for_age,
            IndicatorOutcome::Invalid {
                error: ValidationError::NonPositiveValue { .. }
            }
        ));
        assert!(matches!(
            eval.weight_for_height,
            IndicatorOutcome::Invalid { .. }
        ));
        assert!(eval.height_for_age.result().is_some());
    }

    #[test]
    fn age_beyond_range_is_out_of_range_for_every_measured_indicator() {
        let m = Measurement::new(Sex::Male, 61.0)
            .with_weight(19.0)
            .with_height(110.0)
            .with_head_circumference(50.0);
        let eval = evaluator(false).evaluate(&m);
        assert!(matches!(eval.weight_for_age, IndicatorOutcome::OutOfRange(_)));
        assert!(matches!(eval.height_for_age, IndicatorOutcome::OutOfRange(_)));
        assert!(matches!(eval.weight_for_height, IndicatorOutcome::OutOfRange(_)));
        assert!(matches!(
            eval.head_circumference_for_age,
            IndicatorOutcome::OutOfRange(_)
        ));
        assert_eq!(eval.worst_status(), None);
    }

    #[test]
    fn weight_for_height_needs_height() {
        let m = Measurement::new(Sex::Female, 30.0).with_weight(12.0);
        let eval = evaluator(false).evaluate(&m);
        assert_eq!(eval.weight_for_height, IndicatorOutcome::NotMeasured);
    }

    #[test]
    fn height_outside_table_is_out_of_range() {
        let m = Measurement::new(Sex::Female, 30.0)
            .with_weight(12.0)
            .with_height(60.0);
        let eval = evaluator(false).evaluate(&m);
        match &eval.weight_for_height {
            IndicatorOutcome::OutOfRange(range) => {
                assert_eq!(range.standard, Standard::WeightForHeight);
                assert_eq!(range.value, 60.0);
            }
            other => panic!("expected out of range, got {other:?}"),
        }
        assert!(eval.weight_for_age.result().is_some());
    }

    #[test]
    fn standing_infant_gets_length_adjustment() {
        let m = Measurement::new(Sex::Male, 12.0)
            .with_height(75.0)
            .with_position(MeasurementPosition::Standing);
        let eval = evaluator(false).evaluate(&m);
        let hfa = eval.height_for_age.result().unwrap();
        assert_eq!(hfa.value, 75.0);
        assert!((hfa.adjusted_value.unwrap() - 75.7).abs() < 1e-9);
        assert_eq!(hfa.standard, Standard::LengthForAge);
    }

    #[test]
    fn adjusted_height_keys_weight_for_height() {
        let m = Measurement::new(Sex::Male, 36.0)
            .with_weight(14.0)
            .with_height(95.7)
            .with_position(MeasurementPosition::Recumbent);
        let eval = evaluator(false).evaluate(&m);
        let wfh = eval.weight_for_height.result().unwrap();
        assert!((wfh.lookup_value - 95.0).abs() < 1e-9);
        assert_eq!(wfh.value, 14.0);
    }

    #[test]
    fn restricted_tails_only_change_extreme_weights() {
        let plain = evaluator(false);
        let restricted = evaluator(true);

        let normal = Measurement::new(Sex::Female, 12.0).with_weight(9.0);
        assert_eq!(plain.evaluate(&normal), restricted.evaluate(&normal));

        let heavy = Measurement::new(Sex::Male, 6.0).with_weight(14.0);
        let a = plain.evaluate(&heavy).weight_for_age.z_score().unwrap();
        let b = restricted.evaluate(&heavy).weight_for_age.z_score().unwrap();
        assert!(a > 3.0);
        assert!((a - b).abs() > 1e-6);

        let tall = Measurement::new(Sex::Male, 6.0).with_height(80.0);
        assert_eq!(
            plain.evaluate(&tall).height_for_age,
            restricted.evaluate(&tall).height_for_age
        );
    }

    #[test]
    fn evaluation_iterates_in_indicator_order() {
        let m = Measurement::new(Sex::Male, 6.0).with_weight(7.9);
        let eval = evaluator(false).evaluate(&m);
        let order: Vec<Indicator> = eval.iter().map(|(i, _)| i).collect();
        assert_eq!(order, Indicator::ALL.to_vec());
        assert_eq!(eval.to_map().len(), 4);
        assert_eq!(eval.computed_count(), 1);
    }

    #[test]
    fn batch_preserves_order() {
        let ev = evaluator(false);
        let batch = vec![
            Measurement::new(Sex::Male, 6.0).with_weight(7.9),
            Measurement::new(Sex::Female, 12.0).with_weight(6.0),
        ];
        let results = ev.evaluate_batch(&batch);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].worst_status(), Some(Status::Normal));
        assert_eq!(results[1].worst_status(), Some(Status::Alert));
    }

    #[test]
    fn median_curve_follows_table() {
        let ev = evaluator(false);
        let curve = ev.sd_curve(Standard::WeightForAge, Sex::Male, 0.0);
        assert_eq!(curve.len(), 61);
        let table = ev.reference().table(Standard::WeightForAge, Sex::Male);
        for (point, row) in curve.iter().zip(table.rows()) {
            assert_eq!(point.key, row.key);
            assert!((point.value - row.m).abs() < 1e-9);
        }
    }

    #[test]
    fn outcome_serializes_with_tag() {
        let m = Measurement::new(Sex::Male, 6.0).with_weight(7.9);
        let eval = evaluator(false).evaluate(&m);
        assert_eq!(eval.weight_for_age.kind(), "computed");
        assert_eq!(eval.height_for_age.kind(), "not_measured");
    }
}
