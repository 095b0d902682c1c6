//! Multinomial naive Bayes for count-valued features.

use crate::data::{Features, Matrix};
use crate::discrete::DiscreteCore;
use crate::error::{NbError, Result};
use crate::protocol::{
    check_alpha, check_n_features, check_non_negative, check_xy, class_indices,
    expand_sample_weight, Alpha, NaiveBayesEstimator, ParamValue,
};

const FAMILY: &str = "MultinomialNb";

/// Multinomial naive Bayes classifier.
///
/// Suited to discrete counts (word frequencies and the like); fractional
/// counts also work. Feature values must be non-negative.
#[derive(Debug, Clone)]
pub struct MultinomialNb {
    core: DiscreteCore,
    /// Accumulated weighted feature sums per (class, feature).
    feature_count: Option<Vec<Vec<f64>>>,
    feature_log_prob: Option<Vec<Vec<f64>>>,
}

impl MultinomialNb {
    pub fn new() -> Self {
        Self {
            core: DiscreteCore::new(),
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
        check_non_negative(FAMILY, &x)?;
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
        let counts = self.feature_count.as_mut().expect("initialized above");
        for i in 0..n_rows {
            let c = indices[i];
            for j in 0..n_features {
                counts[c][j] += weights[i] * x.get(i, j);
            }
        }
        self.core.bump_class_counts(&indices, &weights);
        self.core.refresh_log_prior()?;

        // Smoothed empirical log-probabilities.
        let mut flp = Vec::with_capacity(classes.len());
        for row in self.feature_count.as_ref().expect("initialized above") {
            let smoothed: Vec<f64> = row.iter().zip(&alpha).map(|(c, a)| c + a).collect();
            let total: f64 = smoothed.iter().sum();
            flp.push(smoothed.iter().map(|s| s.ln() - total.ln()).collect());
        }
        self.feature_log_prob = Some(flp);
        Ok(())
    }
}

impl Default for MultinomialNb {
    fn default() -> Self {
        Self::new()
    }
}

impl NaiveBayesEstimator for MultinomialNb {
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
        check_non_negative(FAMILY, &x)?;
        check_n_features(FAMILY, flp[0].len(), &x)?;

        let (n_rows, n_features) = x.shape();
        let n_classes = state.classes.len();
        let mut out = Matrix::zeros(n_rows, n_classes);
        for i in 0..n_rows {
            for c in 0..n_classes {
                let mut acc = state.class_log_prior[c];
                for j in 0..n_features {
                    let v = x.get(i, j);
                    if v != 0.0 {
                        acc += v * flp[c][j];
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
        self.core.set_param(name, value)
    }

    fn get_param(&self, name: &str) -> Option<ParamValue> {
        self.core.get_param(name)
    }
}
