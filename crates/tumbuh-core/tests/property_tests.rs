//! # Property-Based Tests
//!
//! Invariants of the growth engine checked with proptest.
//!
//! These tests ensure totality and numerical correctness over arbitrary input.

use proptest::prelude::*;
use std::sync::Arc;
use tumbuh_core::{
    Evaluator, EvaluatorConfig, Indicator, IndicatorOutcome, LmsParams, Measurement,
    ReferenceSet, Sex, Standard, Status, classify, lms,
};

fn evaluator() -> Evaluator {
    Evaluator::new(
        Arc::new(ReferenceSet::embedded().expect("embedded tables")),
        EvaluatorConfig::default(),
    )
}

fn any_sex() -> impl Strategy<Value = Sex> {
    prop_oneof![Just(Sex::Male), Just(Sex::Female)]
}

fn any_standard() -> impl Strategy<Value = Standard> {
    proptest::sample::select(Standard::ALL.to_vec())
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// The median always has z-score zero, on both sides of the L epsilon.
    #[test]
    fn median_is_zero(
        l in prop_oneof![-2.0f64..2.0, -1e-6f64..1e-6],
        m in 0.5f64..150.0,
        s in 0.01f64..0.3,
    ) {
        let params = LmsParams::new(l, m, s);
        prop_assert!(lms::transform(m, &params).abs() < 1e-9);
    }

    /// The classifier is total and follows the band limits.
    #[test]
    fn classifier_partitions_real_line(z in proptest::num::f64::ANY) {
        let status = classify(z);
        let magnitude = z.abs();
        if magnitude <= 2.0 {
            prop_assert_eq!(status, Status::Normal);
        } else if magnitude < 3.0 {
            prop_assert_eq!(status, Status::Warning);
        } else {
            prop_assert_eq!(status, Status::Alert);
        }
    }

    /// Interpolated L, M and S lie between the bracketing rows.
    #[test]
    fn interpolation_is_bracketed(
        standard in any_standard(),
        sex in any_sex(),
        fraction in 0.0f64..1.0,
    ) {
        let set = ReferenceSet::embedded().expect("embedded tables");
        let table = set.table(standard, sex);
        let (min, max) = standard.domain();
        let x = min + fraction * (max - min);
        let params = table.interpolate(x).expect("inside domain");

        let rows = table.rows();
        let upper = rows.iter().position(|r| r.key >= x).expect("bracket");
        let high = rows[upper];
        let low = rows[upper.saturating_sub(1)];
        let between = |v: f64, a: f64, b: f64| v >= a.min(b) - 1e-12 && v <= a.max(b) + 1e-12;
        prop_assert!(between(params.l, low.l, high.l));
        prop_assert!(between(params.m, low.m, high.m));
        prop_assert!(between(params.s, low.s, high.s));
    }

    /// The inverse transform round-trips within the representable range.
    #[test]
    fn value_at_inverts_z(
        standard in any_standard(),
        sex in any_sex(),
        z in -4.0f64..4.0,
    ) {
        let set = ReferenceSet::embedded().expect("embedded tables");
        let row = set.table(standard, sex).rows()[0];
        let params = row.params();
        if let Some(value) = lms::value_at(z, &params) {
            prop_assert!((lms::transform(value, &params) - z).abs() < 1e-6);
        }
    }

    /// Arbitrary ages and values never panic and always yield four outcomes.
    #[test]
    fn evaluation_is_total(
        sex in any_sex(),
        age in proptest::num::f64::ANY,
        weight in proptest::num::f64::ANY,
        height in proptest::num::f64::ANY,
        head in proptest::num::f64::ANY,
    ) {
        let m = Measurement::new(sex, age)
            .with_weight(weight)
            .with_height(height)
            .with_head_circumference(head);
        let eval = evaluator().evaluate(&m);
        prop_assert_eq!(eval.iter().count(), 4);
        for (_, outcome) in eval.iter() {
            prop_assert!(!matches!(outcome, IndicatorOutcome::NotMeasured));
        }
    }

    /// Ages past 60 months are out of range for every age-indexed indicator.
    #[test]
    fn ages_past_sixty_months_out_of_range(
        sex in any_sex(),
        age in 60.1f64..600.0,
        weight in 1.0f64..40.0,
    ) {
        let m = Measurement::new(sex, age).with_weight(weight);
        let eval = evaluator().evaluate(&m);
        prop_assert!(
            matches!(eval.get(Indicator::WeightForAge), IndicatorOutcome::OutOfRange(_)),
            "expected out_of_range for age {}",
            age
        );
    }

    /// Non-positive values are invalid and never carry a z-score.
    #[test]
    fn non_positive_values_invalid(
        sex in any_sex(),
        age in 0.0f64..60.0,
        weight in -100.0f64..=0.0,
    ) {
        let m = Measurement::new(sex, age).with_weight(weight);
        let eval = evaluator().evaluate(&m);
        let is_invalid = matches!(eval.weight_for_age, IndicatorOutcome::Invalid { .. });
        prop_assert!(is_invalid);
        prop_assert_eq!(eval.weight_for_age.z_score(), None);
    }
}
