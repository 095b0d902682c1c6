//! Complement naive Bayes (Rennie et al. 2003).

use crate::data::{Features, Matrix};
use crate::discrete::DiscreteCore;
use crate::error::{NbError, Result};
use crate::protocol::{
    check_alpha, check_n_features, check_non_negative, check_xy, class_indices,
    expand_sample_weight, Alpha, NaiveBayesEstimator, ParamValue,
};

const FAMILY: &str = "ComplementNb";

/// Complement naive Bayes classifier.
///
/// Estimates each class from the statistics of every *other* class, which
/// corrects the multinomial model's bias toward classes with more training
/// mass. Feature values must be non-negative.
#[derive(Debug, Clone)]
pub struct ComplementNb {
    core: DiscreteCore,
    /// Weight normalization from the paper's final step.
    norm: bool,
    feature_count: Option<Vec<Vec<f64>>>,
    /// Per-feature totals over all classes.
    feature_all: Option<Vec<f64>>,
    feature_log_prob: Option<Vec<Vec<f64>>>,
}

impl ComplementNb {
    pub fn new() -> Self {
        Self {
            core: DiscreteCore::new(),
            norm: false,
            feature_count: None,
            feature_all: None,
            feature_log_prob: None,
        }
    }

    #[must_use]
    pub fn with_alpha(mut self, alpha: impl Into<Alpha>) -> Self {
        self.core.alpha = alpha.into();
        self
    }

    #[must_use]
    pub fn with_norm(mut self, norm: bool) -> Self {
        self.norm = norm;
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

    pub fn feature_all(&self) -> Option<&[f64]> {
        self.feature_all.as_deref()
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
            self.feature_all = Some(vec![0.0; n_features]);
        }
        let indices = class_indices(&classes, y)?;
        let counts = self.feature_count.as_mut().expect("initialized above");
        let all = self.feature_all.as_mut().expect("initialized above");
        for i in 0..n_rows {
            let c = indices[i];
            for j in 0..n_features {
                let v = weights[i] * x.get(i, j);
                counts[c][j] += v;
                all[j] += v;
            }
        }
        self.core.bump_class_counts(&indices, &weights);
        self.core.refresh_log_prior()?;

        // Complement counts: everything observed outside the class.
        let counts = self.feature_count.as_ref().expect("initialized above");
        let all = self.feature_all.as_ref().expect("initialized above");
        let mut flp = Vec::with_capacity(classes.len());
        for row in counts {
            let comp: Vec<f64> = (0..n_features)
                .map(|j| alpha[j] + all[j] - row[j])
                .collect();
            let total: f64 = comp.iter().sum();
            let logged: Vec<f64> = comp.iter().map(|c| c.ln() - total.ln()).collect();
            if self.norm {
                let summed: f64 = logged.iter().sum();
                flp.push(logged.iter().map(|l| l / summed).collect());
            } else {
                flp.push(logged.iter().map(|l| -l).collect());
            }
        }
        self.feature_log_prob = Some(flp);
        Ok(())
    }
}

impl Default for ComplementNb {
    fn default() -> Self {
        Self::new()
    }
}

impl NaiveBayesEstimator for ComplementNb {
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
                let mut acc = 0.0;
                for j in 0..n_features {
                    let v = x.get(i, j);
                    if v != 0.0 {
                        acc += v * flp[c][j];
                    }
                }
                // The complement weights already discriminate between
                // classes; the prior only matters when there is nothing
                // to discriminate.
                if n_classes == 1 {
                    acc += state.class_log_prior[c];
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
            ("norm", ParamValue::Bool(v)) => {
                self.norm = v;
                Ok(())
            }
            (name, value) => self.core.set_param(name, value),
        }
    }

    fn get_param(&self, name: &str) -> Option<ParamValue> {
        match name {
            "norm" => Some(ParamValue::Bool(self.norm)),
            _ => self.core.get_param(name),
        }
    }
}
