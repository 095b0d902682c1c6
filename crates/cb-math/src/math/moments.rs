//! Streaming weighted mean/variance aggregation.
//!
//! Implements the parallel combination formula of Chan, Golub and LeVeque,
//! which merges two weighted (count, mean, variance) aggregates without a
//! second pass over the data. Accuracy holds even when batches arrive one
//! sample at a time.

/// Weighted mean and biased variance of a single batch.
///
/// Returns `(mean, variance, total_weight)`. Zero total weight yields
/// NaN moments, mirroring an empty average.
pub fn weighted_mean_var(values: &[f64], weights: &[f64]) -> (f64, f64, f64) {
    debug_assert_eq!(values.len(), weights.len());
    let total: f64 = weights.iter().sum();
    let mean = values
        .iter()
        .zip(weights)
        .map(|(v, w)| v * w)
        .sum::<f64>()
        / total;
    let var = values
        .iter()
        .zip(weights)
        .map(|(v, w)| w * (v - mean) * (v - mean))
        .sum::<f64>()
        / total;
    (mean, var, total)
}

/// Merge two weighted (weight, mean, variance) aggregates.
pub fn combine_mean_var(
    w_a: f64,
    mean_a: f64,
    var_a: f64,
    w_b: f64,
    mean_b: f64,
    var_b: f64,
) -> (f64, f64) {
    if w_b == 0.0 {
        return (mean_a, var_a);
    }
    if w_a == 0.0 {
        return (mean_b, var_b);
    }
    let total = w_a + w_b;
    let mean = (w_a * mean_a + w_b * mean_b) / total;
    let ssd_a = w_a * var_a;
    let ssd_b = w_b * var_b;
    let correction = (w_a * w_b / total) * (mean_a - mean_b) * (mean_a - mean_b);
    let var = (ssd_a + ssd_b + correction) / total;
    (mean, var)
}

/// Update per-feature running (mean, variance) aggregates with a new
/// weighted batch of rows.
///
/// `new_rows` is a slice of rows, each `past_mean.len()` features wide;
/// `new_weights` carries one non-negative weight per row. An empty batch
/// returns the prior aggregates unchanged. Returns
/// `(mean, variance, total_weight)`.
pub fn update_mean_variance(
    past_weight: f64,
    past_mean: &[f64],
    past_var: &[f64],
    new_rows: &[Vec<f64>],
    new_weights: &[f64],
) -> (Vec<f64>, Vec<f64>, f64) {
    debug_assert_eq!(past_mean.len(), past_var.len());
    debug_assert_eq!(new_rows.len(), new_weights.len());
    if new_rows.is_empty() {
        return (past_mean.to_vec(), past_var.to_vec(), past_weight);
    }

    let n_features = past_mean.len();
    let batch_total: f64 = new_weights.iter().sum();
    let mut mean = Vec::with_capacity(n_features);
    let mut var = Vec::with_capacity(n_features);
    let mut column = vec![0.0; new_rows.len()];
    for j in 0..n_features {
        for (i, row) in new_rows.iter().enumerate() {
            column[i] = row[j];
        }
        let (batch_mean, batch_var, batch_weight) = weighted_mean_var(&column, new_weights);
        let (m, v) = combine_mean_var(
            past_weight, past_mean[j], past_var[j], batch_weight, batch_mean, batch_var,
        );
        mean.push(m);
        var.push(v);
    }
    (mean, var, past_weight + batch_total)
}
