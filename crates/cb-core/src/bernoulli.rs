//! Bernoulli naive Bayes for binary indicator features.

use crate::data::{Features, Matrix};
use crate::discrete::DiscreteCore;
use crate::error::{NbError, Result};
use crate::protocol::{
    check_alpha, check_n_features, check_xy, class_indices, expand_sample_weight, Alpha,
    NaiveBayesEstimator, ParamValue,
};

const FAMILY: &str = "BernoulliNb";

/// Values strictly above the threshold map to 1. A `None` threshold
/// passes the value through untouched.
fn binarized(threshold: Option<f64>, value: f64) -> f64 {
    match threshold {
        Some(t) => {
            if value > t {
                1.0
            } else {
                0.0
            }
        }
        None => value,
    }
}

/// Bernoulli naive Bayes classifier.
///
/// Each feature is a boolean presence indicator; absent features penalize
/// the likelihood explicitly. Inputs are binarized against a threshold
/// before counting unless `binarize` is disabled.
#[derive(Debug, Clone)]
pub struct BernoulliNb {
    core: DiscreteCore,
    /// Values strictly above this threshold map to 1. `None` means the
    /// input is already binary.
    binarize: Option<f64>,
    feature_count: Option<Vec<Vec<f64>>>,
    feature_log_prob: Option<Vec<Vec<f64>>>,
}

impl BernoulliNb {
    pub fn new() -> Self {
        Self {
            core: DiscreteCore::new(),
            binarize: Some(0.0),
            feature_count: None,
            feature_log_prob: None,
        }
    }

    #[must_use]
    pub fn with_alpha(mut self, alpha: impl Into<Alpha>) -> Self {
        self.core.alpha = alpha.into();
        self
    }

    #[must_use]
    pub fn with_binarize(mut self, binarize: Option<f64>) -> Self {
        self.binarize = binarize;
        self
    }

    #[must_use]
    pub fn with_fit_prior(mut self, fit_prior: bool) -> Self {
        self.core.fit_prior = fit_prior;
        self
    }

    #[must_use]
    pub fn with_class_prior(mut self, prior: Vec<f64>) -> Self {
        self.core.class_prior = Some(prior);
        self
    }

    pub fn feature_count(&self) -> Option<&[Vec<f64>]> {
        self.feature_count.as_deref()
    }

    pub fn feature_log_prob(&self) -> Option<&[Vec<f64>]> {
        self.feature_log_prob.as_deref()
    }

    pub fn class_count(&self) -> Option<&[f64]> {
        self.core.state.as_ref().map(|s| s.class_count.as_slice())
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
        let (n_rows, n_features) = x.shape();
        let alpha = check_alpha(&self.core.alpha, n_features)?;
        if !refit {
            if let Some(fc) = &self.feature_count {
                check_n_features(FAMILY, fc[0].len(), &x)?;
            }
        }

        let (classes, fresh) = self.core.prepare(y, classes, refit)?;
        if fresh {
            self.feature_count = Some(vec![vec![0.0; n_features]; classes.len()]);
        }
        let indices = class_indices(&classes, y)?;
        let binarize = self.binarize;
        let counts = self.feature_count.as_mut().expect("initialized above");
        for i in 0..n_rows {
            let c = indices[i];
            for j in 0..n_features {
                counts[c][j] += weights[i] * binarized(binarize, x.get(i, j));
            }
        }
        self.core.bump_class_counts(&indices, &weights);
        self.core.refresh_log_prior()?;

        // Smoothed per-class hit probability; the denominator counts both
        // outcomes, hence the doubled alpha.
        let state = self.core.state.as_ref().expect("prepared above");
        let mut flp = Vec::with_capacity(classes.len());
        for (c, row) in self
            .feature_count
            .as_ref()
            .expect("initialized above")
            .iter()
            .enumerate()
        {
            let cc = state.class_count[c];
            flp.push(
                row.iter()
                    .zip(&alpha)
                    .map(|(fc, a)| (fc + a).ln() - (cc + 2.0 * a).ln())
                    .collect(),
            );
        }
        self.feature_log_prob = Some(flp);
        Ok(())
    }
}

impl Default for BernoulliNb {
    fn default() -> Self {
        Self::new()
    }
}

impl NaiveBayesEstimator for BernoulliNb {
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
            .core
            .state
            .as_ref()
            .ok_or(NbError::NotFitted { family: FAMILY })?;
        let flp = self
            .feature_log_prob
            .as_ref()
            .ok_or(NbError::NotFitted { family: FAMILY })?;
        check_n_features(FAMILY, flp[0].len(), &x)?;

        let (n_rows, n_features) = x.shape();
        let n_classes = state.classes.len();
        // log(1 - p) for each (class, feature); the all-absent baseline is
        // their per-class sum.
        let mut neg = Vec::with_capacity(n_classes);
        let mut neg_total = Vec::with_capacity(n_classes);
        for row in flp {
            let row_neg: Vec<f64> = row.iter().map(|lp| (-lp.exp()).ln_1p()).collect();
            neg_total.push(row_neg.iter().sum::<f64>());
            neg.push(row_neg);
        }

        let mut out = Matrix::zeros(n_rows, n_classes);
        for i in 0..n_rows {
            for c in 0..n_classes {
                let mut acc = state.class_log_prior[c] + neg_total[c];
                for j in 0..n_features {
                    if binarized(self.binarize, x.get(i, j)) != 0.0 {
                        acc += flp[c][j] - neg[c][j];
                    }
                }
                out.set(i, c, acc);
            }
        }
        Ok(out)
    }

    fn classes(&self) -> Option<&[i64]> {
        self.core.classes()
    }

    fn class_prior(&self) -> Option<Vec<f64>> {
        self.core.class_prior()
    }

    fn boxed_clone(&self) -> Box<dyn NaiveBayesEstimator> {
        Box::new(self.clone())
    }

    fn set_param(&mut self, name: &str, value: ParamValue) -> Result<()> {
        match (name, value) {
            ("binarize", ParamValue::Float(v)) => {
                self.binarize = Some(v);
                Ok(())
            }
            (name, value) => self.core.set_param(name, value),
        }
    }

    fn get_param(&self, name: &str) -> Option<ParamValue> {
        match name {
            "binarize" => self.binarize.map(ParamValue::Float),
            _ => self.core.get_param(name),
        }
    }
}
