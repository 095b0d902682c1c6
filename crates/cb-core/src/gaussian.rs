//! Gaussian naive Bayes.
//!
//! Maintains a running weighted (mean, variance) per (class, feature)
//! through the parallel combination formula, so one `fit` call and any
//! partition of the same data into `partial_fit` calls produce identical
//! statistics. A variance floor of `var_smoothing` times the largest
//! per-feature variance of the incoming batch is re-applied after every
//! update; it is never accumulated.

use crate::data::{Features, Matrix};
use crate::error::{NbError, Result};
use crate::protocol::{
    check_class_prior, check_n_features, check_partial_fit_classes, check_xy, class_indices,
    expand_sample_weight, log_class_prior, sorted_unique, NaiveBayesEstimator, ParamValue,
};
use cb_math::update_mean_variance;
use std::f64::consts::PI;

const FAMILY: &str = "GaussianNb";

/// Gaussian naive Bayes classifier.
#[derive(Debug, Clone)]
pub struct GaussianNb {
    var_smoothing: f64,
    priors: Option<Vec<f64>>,
    state: Option<State>,
}

#[derive(Debug, Clone)]
struct State {
    classes: Vec<i64>,
    class_count: Vec<f64>,
    /// Per-class per-feature means.
    theta: Vec<Vec<f64>>,
    /// Per-class per-feature variances, floor included.
    var: Vec<Vec<f64>>,
    class_prior: Vec<f64>,
    /// Variance floor currently added into `var`.
    epsilon: f64,
}

impl GaussianNb {
    pub fn new() -> Self {
        Self {
            var_smoothing: 1e-9,
            priors: None,
            state: None,
        }
    }

    /// Portion of the largest feature variance added to all variances.
    #[must_use]
    pub fn with_var_smoothing(mut self, var_smoothing: f64) -> Self {
        self.var_smoothing = var_smoothing;
        self
    }

    /// Fixed class prior; when absent the prior is derived from weighted
    /// class counts.
    #[must_use]
    pub fn with_priors(mut self, priors: Vec<f64>) -> Self {
        self.priors = Some(priors);
        self
    }

    /// Fitted per-class feature means.
    pub fn theta(&self) -> Option<&[Vec<f64>]> {
        self.state.as_ref().map(|s| s.theta.as_slice())
    }

    /// Fitted per-class feature variances.
    pub fn var(&self) -> Option<&[Vec<f64>]> {
        self.state.as_ref().map(|s| s.var.as_slice())
    }

    pub fn class_count(&self) -> Option<&[f64]> {
        self.state.as_ref().map(|s| s.class_count.as_slice())
    }

    fn update(
        &mut self,
        x: Features,
        y: &[i64],
        classes: Option<&[i64]>,
        sample_weight: Option<&[f64]>,
        refit: bool,
    ) -> Result<()> {
        check_xy(&x, y)?;
        let weights = expand_sample_weight(x.n_rows(), sample_weight)?;
        if refit {
            self.state = None;
        }

        let (n_rows, n_features) = x.shape();
        let classes = if refit {
            sorted_unique(y)
        } else {
            check_partial_fit_classes(self.state.as_ref().map(|s| s.classes.as_slice()), classes)?
        };
        let n_classes = classes.len();

        if let Some(priors) = &self.priors {
            check_class_prior(priors, n_classes)?;
        }

        let mut state = match self.state.take() {
            Some(state) => {
                check_n_features(FAMILY, state.theta[0].len(), &x)?;
                state
            }
            None => State {
                classes: classes.clone(),
                class_count: vec![0.0; n_classes],
                theta: vec![vec![0.0; n_features]; n_classes],
                var: vec![vec![0.0; n_features]; n_classes],
                class_prior: vec![0.0; n_classes],
                epsilon: 0.0,
            },
        };

        // The floor tracks the current data scale, so remove the previous
        // one before combining and re-apply a fresh one afterwards.
        let epsilon = self.var_smoothing * batch_max_variance(&x);
        for var_c in &mut state.var {
            for v in var_c.iter_mut() {
                *v -= state.epsilon;
            }
        }

        let indices = class_indices(&state.classes, y)?;
        for c in 0..n_classes {
            let mut rows: Vec<Vec<f64>> = Vec::new();
            let mut row_weights: Vec<f64> = Vec::new();
            for i in 0..n_rows {
                if indices[i] == c {
                    rows.push(x.row_dense(i));
                    row_weights.push(weights[i]);
                }
            }
            let (mean, var, total) = update_mean_variance(
                state.class_count[c],
                &state.theta[c],
                &state.var[c],
                &rows,
                &row_weights,
            );
            state.theta[c] = mean;
            state.var[c] = var;
            state.class_count[c] = total;
        }

        for var_c in &mut state.var {
            for v in var_c.iter_mut() {
                *v += epsilon;
            }
        }
        state.epsilon = epsilon;

        state.class_prior = match &self.priors {
            Some(priors) => priors.clone(),
            None => {
                let total: f64 = state.class_count.iter().sum();
                state.class_count.iter().map(|c| c / total).collect()
            }
        };

        self.state = Some(state);
        Ok(())
    }
}

impl Default for GaussianNb {
    fn default() -> Self {
        Self::new()
    }
}

/// Largest unweighted per-feature variance of the batch.
fn batch_max_variance(x: &Features) -> f64 {
    let (n_rows, n_cols) = x.shape();
    if n_rows == 0 {
        return 0.0;
    }
    let mut max_var: f64 = 0.0;
    for j in 0..n_cols {
        let mean: f64 = (0..n_rows).map(|i| x.get(i, j)).sum::<f64>() / n_rows as f64;
        let var: f64 = (0..n_rows)
            .map(|i| {
                let d = x.get(i, j) - mean;
                d * d
            })
            .sum::<f64>()
            / n_rows as f64;
        max_var = max_var.max(var);
    }
    max_var
}

impl NaiveBayesEstimator for GaussianNb {
    fn fit(&mut self, x: Features, y: &[i64], sample_weight: Option<&[f64]>) -> Result<()> {
        self.update(x, y, None, sample_weight, true)
    }

    fn partial_fit(
        &mut self,
        x: Features,
        y: &[i64],
        classes: Option<&[i64]>,
        sample_weight: Option<&[f64]>,
    ) -> Result<()> {
        self.update(x, y, classes, sample_weight, false)
    }

    fn joint_log_likelihood(&self, x: Features) -> Result<Matrix> {
        let state = self
            .state
            .as_ref()
            .ok_or(NbError::NotFitted { family: FAMILY })?;
        check_n_features(FAMILY, state.theta[0].len(), &x)?;

        let (n_rows, n_features) = x.shape();
        let n_classes = state.classes.len();
        let log_prior = log_class_prior(&state.class_prior);
        let mut out = Matrix::zeros(n_rows, n_classes);
        for i in 0..n_rows {
            for c in 0..n_classes {
                let mut acc = log_prior[c];
                for j in 0..n_features {
                    let var = state.var[c][j];
                    let diff = x.get(i, j) - state.theta[c][j];
                    acc += -0.5 * (2.0 * PI * var).ln() - diff * diff / (2.0 * var);
                }
                out.set(i, c, acc);
            }
        }
        Ok(out)
    }

    fn classes(&self) -> Option<&[i64]> {
        self.state.as_ref().map(|s| s.classes.as_slice())
    }

    fn class_prior(&self) -> Option<Vec<f64>> {
        self.state.as_ref().map(|s| s.class_prior.clone())
    }

    fn boxed_clone(&self) -> Box<dyn NaiveBayesEstimator> {
        Box::new(self.clone())
    }

    fn set_param(&mut self, name: &str, value: ParamValue) -> Result<()> {
        match (name, value) {
            ("var_smoothing", ParamValue::Float(v)) => {
                self.var_smoothing = v;
                Ok(())
            }
            ("priors", ParamValue::FloatVec(v)) => {
                self.priors = Some(v);
                Ok(())
            }
            _ => Err(NbError::UnknownParam {
                name: name.to_string(),
            }),
        }
    }

    fn get_param(&self, name: &str) -> Option<ParamValue> {
        match name {
            "var_smoothing" => Some(ParamValue::Float(self.var_smoothing)),
            "priors" => self.priors.clone().map(ParamValue::FloatVec),
            _ => None,
        }
    }
}
