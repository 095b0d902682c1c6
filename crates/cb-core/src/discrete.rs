//! State shared by the count-based families.
//!
//! Multinomial, Bernoulli, Complement and Categorical engines differ only
//! in their per-feature sufficient statistics; the class registry, weighted
//! class counts, smoothing parameter and class log-prior bookkeeping are
//! identical and live here.

use crate::error::{NbError, Result};
use crate::protocol::{
    check_class_prior, check_partial_fit_classes, log_class_prior, sorted_unique, Alpha,
    ParamValue,
};
use cb_math::safe_ln;

#[derive(Debug, Clone)]
pub(crate) struct DiscreteCore {
    pub alpha: Alpha,
    pub fit_prior: bool,
    pub class_prior: Option<Vec<f64>>,
    pub state: Option<DiscreteState>,
}

#[derive(Debug, Clone)]
pub(crate) struct DiscreteState {
    pub classes: Vec<i64>,
    pub class_count: Vec<f64>,
    pub class_log_prior: Vec<f64>,
}

impl DiscreteCore {
    pub fn new() -> Self {
        Self {
            alpha: Alpha::default(),
            fit_prior: true,
            class_prior: None,
            state: None,
        }
    }

    pub fn classes(&self) -> Option<&[i64]> {
        self.state.as_ref().map(|s| s.classes.as_slice())
    }

    pub fn class_prior(&self) -> Option<Vec<f64>> {
        self.state
            .as_ref()
            .map(|s| s.class_log_prior.iter().map(|p| p.exp()).collect())
    }

    /// Establish the class registry for this update. Returns the classes
    /// and whether per-family statistics must be (re)initialized.
    pub fn prepare(
        &mut self,
        y: &[i64],
        classes: Option<&[i64]>,
        refit: bool,
    ) -> Result<(Vec<i64>, bool)> {
        if refit {
            self.state = None;
            let classes = sorted_unique(y);
            self.init_state(&classes);
            return Ok((classes, true));
        }
        let established = self.state.as_ref().map(|s| s.classes.clone());
        let classes = check_partial_fit_classes(established.as_deref(), classes)?;
        let fresh = self.state.is_none();
        if fresh {
            self.init_state(&classes);
        }
        Ok((classes, fresh))
    }

    fn init_state(&mut self, classes: &[i64]) {
        self.state = Some(DiscreteState {
            classes: classes.to_vec(),
            class_count: vec![0.0; classes.len()],
            class_log_prior: vec![0.0; classes.len()],
        });
    }

    /// Add weighted rows to the class counts.
    pub fn bump_class_counts(&mut self, indices: &[usize], weights: &[f64]) {
        let state = self.state.as_mut().expect("prepare() establishes state");
        for (idx, w) in indices.iter().zip(weights) {
            state.class_count[*idx] += w;
        }
    }

    /// Recompute the class log-prior from the fixed prior, the counts, or
    /// the uniform fallback.
    pub fn refresh_log_prior(&mut self) -> Result<()> {
        let fit_prior = self.fit_prior;
        let fixed = self.class_prior.clone();
        let state = self.state.as_mut().expect("prepare() establishes state");
        let n_classes = state.classes.len();
        state.class_log_prior = match fixed {
            Some(prior) => {
                check_class_prior(&prior, n_classes)?;
                log_class_prior(&prior)
            }
            None if fit_prior => {
                let total: f64 = state.class_count.iter().sum();
                state
                    .class_count
                    .iter()
                    .map(|c| safe_ln(*c) - safe_ln(total))
                    .collect()
            }
            None => vec![-(n_classes as f64).ln(); n_classes],
        };
        Ok(())
    }

    pub fn set_param(&mut self, name: &str, value: ParamValue) -> Result<()> {
        match (name, value) {
            ("alpha", ParamValue::Float(v)) => {
                self.alpha = Alpha::Scalar(v);
                Ok(())
            }
            ("alpha", ParamValue::FloatVec(v)) => {
                self.alpha = Alpha::PerFeature(v);
                Ok(())
            }
            ("fit_prior", ParamValue::Bool(v)) => {
                self.fit_prior = v;
                Ok(())
            }
            ("class_prior", ParamValue::FloatVec(v)) => {
                self.class_prior = Some(v);
                Ok(())
            }
            (name, _) => Err(NbError::UnknownParam {
                name: name.to_string(),
            }),
        }
    }

    pub fn get_param(&self, name: &str) -> Option<ParamValue> {
        match name {
            "alpha" => Some(match &self.alpha {
                Alpha::Scalar(v) => ParamValue::Float(*v),
                Alpha::PerFeature(v) => ParamValue::FloatVec(v.clone()),
            }),
            "fit_prior" => Some(ParamValue::Bool(self.fit_prior)),
            "class_prior" => self.class_prior.clone().map(ParamValue::FloatVec),
            _ => None,
        }
    }
}
