//! Property-based tests for cb-math numerical functions.
//!
//! Uses proptest to verify mathematical properties hold across many random inputs.

use cb_math::{
    clamp_alpha, combine_mean_var, log_add_exp, log_sum_exp, normalize_log_probs,
    update_mean_variance, weighted_mean_var, ALPHA_MIN,
};
use proptest::prelude::*;

/// Tolerance for floating point comparisons.
const TOL: f64 = 1e-9;

/// Helper to check approximate equality.
fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    if a.is_nan() && b.is_nan() {
        return true;
    }
    if a.is_nan() || b.is_nan() {
        return false;
    }
    if a.is_infinite() && b.is_infinite() {
        return a.signum() == b.signum();
    }
    if a.is_infinite() || b.is_infinite() {
        return false;
    }
    (a - b).abs() <= tol.max(tol * a.abs().max(b.abs()))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// log_sum_exp is commutative: order doesn't matter.
    #[test]
    fn log_sum_exp_commutative(a in -100.0..100.0f64, b in -100.0..100.0f64) {
        let ab = log_sum_exp(&[a, b]);
        let ba = log_sum_exp(&[b, a]);
        prop_assert!(approx_eq(ab, ba, TOL));
    }

    /// log_add_exp agrees with log_sum_exp on two values.
    #[test]
    fn log_add_exp_matches_lse(a in -100.0..100.0f64, b in -100.0..100.0f64) {
        prop_assert!(approx_eq(log_add_exp(a, b), log_sum_exp(&[a, b]), TOL));
    }

    /// Normalized log-probs always exponentiate to a distribution.
    #[test]
    fn normalized_probs_sum_to_one(values in prop::collection::vec(-50.0..50.0f64, 1..8)) {
        let out = normalize_log_probs(&values);
        let total: f64 = out.iter().map(|v| v.exp()).sum();
        prop_assert!(approx_eq(total, 1.0, TOL));
    }

    /// Normalization is invariant under a constant log-domain shift.
    #[test]
    fn normalization_shift_invariant(
        values in prop::collection::vec(-50.0..50.0f64, 1..8),
        shift in -200.0..200.0f64,
    ) {
        let shifted: Vec<f64> = values.iter().map(|v| v + shift).collect();
        let a = normalize_log_probs(&values);
        let b = normalize_log_probs(&shifted);
        for (x, y) in a.iter().zip(&b) {
            prop_assert!(approx_eq(*x, *y, TOL));
        }
    }

    /// Merging aggregates is order-independent.
    #[test]
    fn combine_mean_var_symmetric(
        w_a in 0.1..100.0f64, m_a in -50.0..50.0f64, v_a in 0.0..25.0f64,
        w_b in 0.1..100.0f64, m_b in -50.0..50.0f64, v_b in 0.0..25.0f64,
    ) {
        let (m1, v1) = combine_mean_var(w_a, m_a, v_a, w_b, m_b, v_b);
        let (m2, v2) = combine_mean_var(w_b, m_b, v_b, w_a, m_a, v_a);
        prop_assert!(approx_eq(m1, m2, TOL));
        prop_assert!(approx_eq(v1, v2, TOL));
    }

    /// One-at-a-time streaming matches a single batch update.
    #[test]
    fn streaming_update_matches_batch(
        values in prop::collection::vec(-20.0..20.0f64, 2..16),
    ) {
        let rows: Vec<Vec<f64>> = values.iter().map(|v| vec![*v]).collect();
        let weights = vec![1.0; rows.len()];
        let (batch_mean, batch_var, _) =
            update_mean_variance(0.0, &[0.0], &[0.0], &rows, &weights);

        let mut mean = vec![0.0];
        let mut var = vec![0.0];
        let mut total = 0.0;
        for row in &rows {
            let out = update_mean_variance(total, &mean, &var, &[row.clone()], &[1.0]);
            mean = out.0;
            var = out.1;
            total = out.2;
        }
        prop_assert!(approx_eq(mean[0], batch_mean[0], 1e-8));
        prop_assert!(approx_eq(var[0], batch_var[0], 1e-8));
    }

    /// Integer weights are equivalent to row repetition.
    #[test]
    fn weights_match_repetition(
        values in prop::collection::vec(-20.0..20.0f64, 1..6),
        reps in prop::collection::vec(1u32..4, 1..6),
    ) {
        let n = values.len().min(reps.len());
        let values = &values[..n];
        let reps = &reps[..n];
        let weights: Vec<f64> = reps.iter().map(|r| f64::from(*r)).collect();
        let (mean_w, var_w, _) = weighted_mean_var(values, &weights);

        let mut repeated = Vec::new();
        for (v, r) in values.iter().zip(reps) {
            for _ in 0..*r {
                repeated.push(*v);
            }
        }
        let ones = vec![1.0; repeated.len()];
        let (mean_r, var_r, _) = weighted_mean_var(&repeated, &ones);
        prop_assert!(approx_eq(mean_w, mean_r, 1e-8));
        prop_assert!(approx_eq(var_w, var_r, 1e-8));
    }

    /// Clamped alpha never drops below the floor, never errors on
    /// non-negative input.
    #[test]
    fn clamp_alpha_enforces_floor(values in prop::collection::vec(0.0..2.0f64, 1..6)) {
        let (out, _) = clamp_alpha(&values).unwrap();
        prop_assert!(out.iter().all(|a| *a >= ALPHA_MIN));
    }
}
