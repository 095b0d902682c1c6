//! Numerically stable primitives for log-domain Bayesian math.

/// Stable log(sum(exp(values))).
///
/// Returns NEG_INFINITY for empty input or all -inf inputs.
pub fn log_sum_exp(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NEG_INFINITY;
    }
    if values.iter().any(|v| v.is_nan()) {
        return f64::NAN;
    }
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    if max == f64::INFINITY {
        return f64::INFINITY;
    }
    let mut sum = 0.0;
    for v in values {
        sum += (*v - max).exp();
    }
    max + sum.ln()
}

/// Stable log(exp(a) + exp(b)).
pub fn log_add_exp(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        return f64::NAN;
    }
    if a == f64::NEG_INFINITY {
        return b;
    }
    if b == f64::NEG_INFINITY {
        return a;
    }
    if a == f64::INFINITY || b == f64::INFINITY {
        return f64::INFINITY;
    }
    let m = a.max(b);
    let diff = (a - b).abs();
    m + (-diff).exp().ln_1p()
}

/// Normalize log-domain values so that exp of the result sums to one.
///
/// Returns each value minus log_sum_exp of the whole slice. An all -inf
/// input stays all -inf (there is no mass to distribute).
pub fn normalize_log_probs(values: &[f64]) -> Vec<f64> {
    let lse = log_sum_exp(values);
    if lse == f64::NEG_INFINITY {
        return values.to_vec();
    }
    values.iter().map(|v| v - lse).collect()
}

/// ln that never panics: 0 maps to -inf, negative input to NaN.
///
/// Callers decide whether a -inf result warrants a warning.
pub fn safe_ln(x: f64) -> f64 {
    if x == 0.0 {
        f64::NEG_INFINITY
    } else {
        x.ln()
    }
}
