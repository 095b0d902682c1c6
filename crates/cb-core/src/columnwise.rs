//! Columnwise composition of heterogeneous naive Bayes sub-models.
//!
//! A [`ColumnwiseNb`] owns an ordered registry of named sub-models, each
//! bound to a subset of input columns. Sub-models train independently on
//! their column slices; prediction recombines their joint log-likelihoods
//! into one posterior as if a single model had observed the full feature
//! vector under conditional independence across sub-models.

use crate::data::{Features, Matrix};
use crate::error::{NbError, Result};
use crate::parallel::run_batched;
use crate::protocol::{
    check_class_prior, check_partial_fit_classes, log_class_prior, sorted_unique,
    NaiveBayesEstimator, ParamValue,
};
use crate::selector::ColumnSelector;

const FAMILY: &str = "ColumnwiseNb";

/// Where the composite class prior comes from.
#[derive(Debug, Clone, Default)]
pub enum PriorSpec {
    /// Arithmetic mean of the priors of contributing sub-models.
    #[default]
    Derived,
    /// Caller-supplied probability vector, validated at fit.
    Fixed(Vec<f64>),
    /// Borrowed from the named sub-model after fitting.
    FromEstimator(String),
}

#[derive(Clone)]
struct SubModel {
    name: String,
    estimator: Box<dyn NaiveBayesEstimator>,
    selector: ColumnSelector,
    /// Column indices resolved at the most recent fit call; reused by
    /// prediction, never re-resolved implicitly.
    resolved: Option<Vec<usize>>,
}

#[derive(Clone)]
struct FittedState {
    classes: Vec<i64>,
    class_prior: Vec<f64>,
}

/// Meta-estimator combining per-column-subset naive Bayes sub-models.
#[derive(Clone, Default)]
pub struct ColumnwiseNb {
    subs: Vec<SubModel>,
    priors: PriorSpec,
    /// Worker bound for sub-model dispatch; `<= 1` runs sequentially.
    n_jobs: usize,
    state: Option<FittedState>,
}

impl ColumnwiseNb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a named sub-model bound to a column selector.
    #[must_use]
    pub fn with_estimator(
        mut self,
        name: impl Into<String>,
        estimator: Box<dyn NaiveBayesEstimator>,
        selector: impl Into<ColumnSelector>,
    ) -> Self {
        self.subs.push(SubModel {
            name: name.into(),
            estimator,
            selector: selector.into(),
            resolved: None,
        });
        self
    }

    #[must_use]
    pub fn with_priors(mut self, priors: PriorSpec) -> Self {
        self.priors = priors;
        self
    }

    #[must_use]
    pub fn with_n_jobs(mut self, n_jobs: usize) -> Self {
        self.n_jobs = n_jobs;
        self
    }

    /// The sub-model registered under `name`, if any.
    pub fn estimator(&self, name: &str) -> Option<&dyn NaiveBayesEstimator> {
        self.subs
            .iter()
            .find(|sub| sub.name == name)
            .map(|sub| sub.estimator.as_ref())
    }

    /// Registered (name, sub-model) pairs in registry order.
    pub fn estimators(&self) -> impl Iterator<Item = (&str, &dyn NaiveBayesEstimator)> {
        self.subs
            .iter()
            .map(|sub| (sub.name.as_str(), sub.estimator.as_ref()))
    }

    /// Column indices the named sub-model consumed at the last fit.
    pub fn resolved_columns(&self, name: &str) -> Option<&[usize]> {
        self.subs
            .iter()
            .find(|sub| sub.name == name)
            .and_then(|sub| sub.resolved.as_deref())
    }

    fn check_registry(&self) -> Result<()> {
        if self.subs.is_empty() {
            return Err(NbError::NoEstimators);
        }
        for (i, sub) in self.subs.iter().enumerate() {
            if self.subs[..i].iter().any(|other| other.name == sub.name) {
                return Err(NbError::DuplicateEstimatorName {
                    name: sub.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Resolve every selector against `x` and materialize the column
    /// slices. Empty resolutions yield `None`: the sub-model is skipped in
    /// place, keeping the caller's instance untouched.
    fn resolve_slices(&mut self, x: &Features) -> Result<Vec<Option<Matrix>>> {
        let mut slices = Vec::with_capacity(self.subs.len());
        for sub in &mut self.subs {
            let resolved = sub.selector.resolve(x)?;
            let slice = if resolved.is_empty() {
                None
            } else {
                Some(x.select_columns(&resolved)?)
            };
            sub.resolved = Some(resolved);
            slices.push(slice);
        }
        Ok(slices)
    }

    /// Determine the composite class prior per [`PriorSpec`].
    fn reconcile_prior(&self, n_classes: usize) -> Result<Vec<f64>> {
        match &self.priors {
            PriorSpec::Fixed(prior) => {
                check_class_prior(prior, n_classes)?;
                Ok(prior.clone())
            }
            PriorSpec::FromEstimator(name) => self
                .subs
                .iter()
                .find(|sub| sub.name == *name)
                .and_then(|sub| sub.estimator.class_prior())
                .ok_or_else(|| NbError::PriorExtraction { name: name.clone() }),
            PriorSpec::Derived => {
                let contributing: Vec<&SubModel> = self
                    .subs
                    .iter()
                    .filter(|sub| sub.resolved.as_ref().is_some_and(|r| !r.is_empty()))
                    .collect();
                let priors: Vec<Vec<f64>> = contributing
                    .iter()
                    .filter_map(|sub| sub.estimator.class_prior())
                    .collect();
                if priors.is_empty() {
                    let name = contributing
                        .first()
                        .map(|sub| sub.name.clone())
                        .or_else(|| self.subs.first().map(|sub| sub.name.clone()))
                        .unwrap_or_default();
                    return Err(NbError::PriorExtraction { name });
                }
                let mut mean = vec![0.0; n_classes];
                for prior in &priors {
                    for (m, p) in mean.iter_mut().zip(prior) {
                        *m += p / priors.len() as f64;
                    }
                }
                Ok(mean)
            }
        }
    }

    fn train(
        &mut self,
        x: Features,
        y: &[i64],
        classes: Option<&[i64]>,
        sample_weight: Option<&[f64]>,
        refit: bool,
    ) -> Result<()> {
        self.check_registry()?;
        let classes = if refit {
            sorted_unique(y)
        } else {
            let established = self.state.as_ref().map(|s| s.classes.clone());
            check_partial_fit_classes(established.as_deref(), classes)?
        };

        let slices = self.resolve_slices(&x)?;
        let n_jobs = self.n_jobs;
        let tasks: Vec<_> = self
            .subs
            .iter_mut()
            .zip(slices.iter())
            .filter_map(|(sub, slice)| slice.as_ref().map(|m| (sub, m)))
            .map(|(sub, m)| {
                let classes = classes.as_slice();
                move || {
                    if refit {
                        sub.estimator.fit((m).into(), y, sample_weight)
                    } else {
                        sub.estimator
                            .partial_fit((m).into(), y, Some(classes), sample_weight)
                    }
                }
            })
            .collect();
        for result in run_batched(tasks, n_jobs) {
            result?;
        }

        let class_prior = self.reconcile_prior(classes.len())?;
        self.state = Some(FittedState {
            classes,
            class_prior,
        });
        Ok(())
    }
}

impl NaiveBayesEstimator for ColumnwiseNb {
    fn fit(&mut self, x: Features, y: &[i64], sample_weight: Option<&[f64]>) -> Result<()> {
        self.train(x, y, None, sample_weight, true)
    }

    fn partial_fit(
        &mut self,
        x: Features,
        y: &[i64],
        classes: Option<&[i64]>,
        sample_weight: Option<&[f64]>,
    ) -> Result<()> {
        self.train(x, y, classes, sample_weight, false)
    }

    /// Σ over contributing sub-models of their joint log-likelihood, minus
    /// `(k - 1) · log(prior)` so the embedded prior term survives exactly
    /// once. Classes with zero effective prior short-circuit to `-inf`,
    /// keeping the posterior finite and exactly zero.
    fn joint_log_likelihood(&self, x: Features) -> Result<Matrix> {
        let state = self
            .state
            .as_ref()
            .ok_or(NbError::NotFitted { family: FAMILY })?;
        let contributing: Vec<(&SubModel, Matrix)> = self
            .subs
            .iter()
            .filter_map(|sub| match sub.resolved.as_deref() {
                Some(resolved) if !resolved.is_empty() => Some((sub, resolved)),
                _ => None,
            })
            .map(|(sub, resolved)| Ok((sub, x.select_columns(resolved)?)))
            .collect::<Result<_>>()?;

        let tasks: Vec<_> = contributing
            .iter()
            .map(|(sub, slice)| {
                let estimator = sub.estimator.as_ref();
                move || estimator.joint_log_likelihood(slice.into())
            })
            .collect();
        let sub_jlls = run_batched(tasks, self.n_jobs)
            .into_iter()
            .collect::<Result<Vec<Matrix>>>()?;

        let k = sub_jlls.len();
        let log_prior = log_class_prior(&state.class_prior);
        let (n_rows, _) = x.shape();
        let n_classes = state.classes.len();
        let mut out = Matrix::zeros(n_rows, n_classes);
        for i in 0..n_rows {
            for c in 0..n_classes {
                if state.class_prior[c] == 0.0 {
                    out.set(i, c, f64::NEG_INFINITY);
                    continue;
                }
                let mut acc = -(k as f64 - 1.0) * log_prior[c];
                for jll in &sub_jlls {
                    acc += jll.get(i, c);
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

    /// Routes `sub__param` names through the `__` separator to sub-model
    /// leaves.
    fn set_param(&mut self, name: &str, value: ParamValue) -> Result<()> {
        match name.split_once("__") {
            Some((sub_name, leaf)) => {
                let sub = self
                    .subs
                    .iter_mut()
                    .find(|sub| sub.name == sub_name)
                    .ok_or_else(|| NbError::UnknownParam {
                        name: name.to_string(),
                    })?;
                sub.estimator.set_param(leaf, value)
            }
            None => match (name, value) {
                ("n_jobs", ParamValue::Int(v)) if v >= 0 => {
                    self.n_jobs = v as usize;
                    Ok(())
                }
                _ => Err(NbError::UnknownParam {
                    name: name.to_string(),
                }),
            },
        }
    }

    fn get_param(&self, name: &str) -> Option<ParamValue> {
        match name.split_once("__") {
            Some((sub_name, leaf)) => self
                .subs
                .iter()
                .find(|sub| sub.name == sub_name)
                .and_then(|sub| sub.estimator.get_param(leaf)),
            None => match name {
                "n_jobs" => Some(ParamValue::Int(self.n_jobs as i64)),
                _ => None,
            },
        }
    }
}
