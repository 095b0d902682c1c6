//! Shared classifier protocol.
//!
//! Every likelihood engine and the columnwise composition engine implement
//! [`NaiveBayesEstimator`]: batch `fit`, incremental `partial_fit`, and the
//! joint log-likelihood contract from which `predict`, `predict_proba` and
//! `predict_log_proba` are derived. The validation helpers here (class
//! priors, smoothing parameters, incremental class-set consistency) are
//! shared by all families.

use crate::data::{Features, Matrix};
use crate::error::{NbError, Result};
use cb_math::{clamp_alpha, normalize_log_probs, safe_ln};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Smoothing parameter: a scalar applied to every feature, or one value
/// per feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Alpha {
    Scalar(f64),
    PerFeature(Vec<f64>),
}

impl Default for Alpha {
    fn default() -> Self {
        Alpha::Scalar(1.0)
    }
}

impl From<f64> for Alpha {
    fn from(value: f64) -> Self {
        Alpha::Scalar(value)
    }
}

impl From<Vec<f64>> for Alpha {
    fn from(values: Vec<f64>) -> Self {
        Alpha::PerFeature(values)
    }
}

/// Dynamic hyperparameter value for dotted-name get/set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    Float(f64),
    FloatVec(Vec<f64>),
    Bool(bool),
    Int(i64),
    UsizeVec(Vec<usize>),
}

/// Capability contract for naive Bayes estimators.
///
/// Sub-models of the columnwise engine are held behind this trait; a
/// sub-model unable to honor one of the capabilities reports
/// [`NbError::MissingCapability`] at first use rather than failing at
/// construction.
pub trait NaiveBayesEstimator: Send + Sync {
    /// Full (re)training; replaces all fitted state.
    fn fit(&mut self, x: Features, y: &[i64], sample_weight: Option<&[f64]>) -> Result<()>;

    /// Incremental training. `classes` is required on the very first call
    /// and must never change afterwards.
    fn partial_fit(
        &mut self,
        x: Features,
        y: &[i64],
        classes: Option<&[i64]>,
        sample_weight: Option<&[f64]>,
    ) -> Result<()>;

    /// Unnormalized log P(class) + log P(features | class), one row per
    /// sample, one column per class.
    fn joint_log_likelihood(&self, x: Features) -> Result<Matrix>;

    /// Ordered class registry, present once fitted.
    fn classes(&self) -> Option<&[i64]>;

    /// Class prior as probabilities, if this estimator can expose one.
    fn class_prior(&self) -> Option<Vec<f64>>;

    /// Deep copy behind the trait object.
    fn boxed_clone(&self) -> Box<dyn NaiveBayesEstimator>;

    fn set_param(&mut self, name: &str, _value: ParamValue) -> Result<()> {
        Err(NbError::UnknownParam {
            name: name.to_string(),
        })
    }

    fn get_param(&self, _name: &str) -> Option<ParamValue> {
        None
    }

    /// Class label with the highest posterior for each sample.
    fn predict(&self, x: Features) -> Result<Vec<i64>> {
        let jll = self.joint_log_likelihood(x)?;
        let classes = self.classes().ok_or(NbError::NotFitted {
            family: "NaiveBayesEstimator",
        })?;
        let (n_rows, _) = jll.shape();
        let mut out = Vec::with_capacity(n_rows);
        for i in 0..n_rows {
            let row = jll.row(i);
            let mut best = 0;
            for (k, v) in row.iter().enumerate().skip(1) {
                if *v > row[best] {
                    best = k;
                }
            }
            out.push(classes[best]);
        }
        Ok(out)
    }

    /// Posterior log-probabilities; elementwise log of `predict_proba`.
    fn predict_log_proba(&self, x: Features) -> Result<Matrix> {
        let jll = self.joint_log_likelihood(x)?;
        let (n_rows, n_classes) = jll.shape();
        let mut out = Matrix::zeros(n_rows, n_classes);
        for i in 0..n_rows {
            let normalized = normalize_log_probs(jll.row(i));
            for (k, v) in normalized.iter().enumerate() {
                out.set(i, k, *v);
            }
        }
        Ok(out)
    }

    /// Posterior probabilities; each row sums to one.
    fn predict_proba(&self, x: Features) -> Result<Matrix> {
        let mut log_proba = self.predict_log_proba(x)?;
        let (n_rows, n_classes) = log_proba.shape();
        for i in 0..n_rows {
            for k in 0..n_classes {
                log_proba.set(i, k, log_proba.get(i, k).exp());
            }
        }
        Ok(log_proba)
    }
}

impl Clone for Box<dyn NaiveBayesEstimator> {
    fn clone(&self) -> Self {
        self.boxed_clone()
    }
}

/// Validate a user-supplied class prior vector.
pub fn check_class_prior(prior: &[f64], n_classes: usize) -> Result<()> {
    if prior.len() != n_classes {
        return Err(NbError::PriorLength {
            expected: n_classes,
            got: prior.len(),
        });
    }
    if prior.iter().any(|p| *p < 0.0) {
        return Err(NbError::PriorNegative);
    }
    let sum: f64 = prior.iter().sum();
    if (sum - 1.0).abs() > 1e-8 {
        return Err(NbError::PriorSum { sum });
    }
    Ok(())
}

/// Elementwise log of a prior vector. Zero components become -inf with a
/// single warning per call.
pub fn log_class_prior(prior: &[f64]) -> Vec<f64> {
    if prior.iter().any(|p| *p == 0.0) {
        warn!("divide by zero encountered in log");
    }
    prior.iter().map(|p| safe_ln(*p)).collect()
}

/// Establish or verify the incremental-fit class registry.
///
/// The first call must supply `classes`; every later call must present a
/// set identical (same elements, same order) to the established one.
pub fn check_partial_fit_classes(
    established: Option<&[i64]>,
    supplied: Option<&[i64]>,
) -> Result<Vec<i64>> {
    match (established, supplied) {
        (None, None) => Err(NbError::ClassesMissing),
        (None, Some(s)) => Ok(s.to_vec()),
        (Some(e), None) => Ok(e.to_vec()),
        (Some(e), Some(s)) => {
            if e != s {
                Err(NbError::ClassMismatch { got: s.to_vec() })
            } else {
                Ok(e.to_vec())
            }
        }
    }
}

/// Expand the smoothing parameter to one clamped value per feature.
///
/// Wrong-length vectors fail with a shape error naming the expected
/// feature count; sub-floor values are clamped with one warning per call.
pub fn check_alpha(alpha: &Alpha, n_features: usize) -> Result<Vec<f64>> {
    let expanded = match alpha {
        Alpha::Scalar(a) => vec![*a; n_features],
        Alpha::PerFeature(v) => {
            if v.len() != n_features {
                return Err(NbError::AlphaShape {
                    expected: n_features,
                    got: v.len(),
                });
            }
            v.clone()
        }
    };
    let (clamped, did_clamp) = clamp_alpha(&expanded)?;
    if did_clamp {
        warn!("alpha too small will result in numeric errors, setting alpha = 1.0e-10");
    }
    Ok(clamped)
}

/// Per-row weights: defaults to 1.0, length-checked against X.
pub(crate) fn expand_sample_weight(n_rows: usize, weight: Option<&[f64]>) -> Result<Vec<f64>> {
    match weight {
        None => Ok(vec![1.0; n_rows]),
        Some(w) => {
            if w.len() != n_rows {
                return Err(NbError::WeightLength {
                    expected: n_rows,
                    got: w.len(),
                });
            }
            Ok(w.to_vec())
        }
    }
}

pub(crate) fn check_xy(x: &Features, y: &[i64]) -> Result<()> {
    if x.n_rows() != y.len() {
        return Err(NbError::SampleCountMismatch {
            x_rows: x.n_rows(),
            y_rows: y.len(),
        });
    }
    Ok(())
}

pub(crate) fn check_n_features(
    family: &'static str,
    expected: usize,
    x: &Features,
) -> Result<()> {
    if x.n_cols() != expected {
        return Err(NbError::FeatureCountMismatch {
            family,
            expected,
            got: x.n_cols(),
        });
    }
    Ok(())
}

pub(crate) fn check_non_negative(family: &'static str, x: &Features) -> Result<()> {
    let (n_rows, n_cols) = x.shape();
    for i in 0..n_rows {
        for j in 0..n_cols {
            if x.get(i, j) < 0.0 {
                return Err(NbError::NegativeInput { family });
            }
        }
    }
    Ok(())
}

/// Sorted, deduplicated class labels observed in y.
pub(crate) fn sorted_unique(y: &[i64]) -> Vec<i64> {
    let mut classes = y.to_vec();
    classes.sort_unstable();
    classes.dedup();
    classes
}

/// Map each label in y to its index in the class registry.
pub(crate) fn class_indices(classes: &[i64], y: &[i64]) -> Result<Vec<usize>> {
    y.iter()
        .map(|label| {
            classes
                .iter()
                .position(|c| c == label)
                .ok_or(NbError::UnknownLabel { label: *label })
        })
        .collect()
}
