//! Categorical naive Bayes for integer-coded nominal features.

use crate::data::{Features, Matrix};
use crate::discrete::DiscreteCore;
use crate::error::{NbError, Result};
use crate::protocol::{
    check_alpha, check_n_features, check_xy, class_indices, expand_sample_weight, Alpha,
    NaiveBayesEstimator, ParamValue,
};

const FAMILY: &str = "CategoricalNb";

/// Minimum number of categories per feature, regardless of what the
/// training data exhibits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MinCategories {
    Scalar(usize),
    PerFeature(Vec<usize>),
}

impl Default for MinCategories {
    fn default() -> Self {
        MinCategories::Scalar(0)
    }
}

impl From<usize> for MinCategories {
    fn from(value: usize) -> Self {
        MinCategories::Scalar(value)
    }
}

impl From<Vec<usize>> for MinCategories {
    fn from(value: Vec<usize>) -> Self {
        MinCategories::PerFeature(value)
    }
}

impl MinCategories {
    fn resolve(&self, n_features: usize) -> Result<Vec<usize>> {
        match self {
            MinCategories::Scalar(v) => Ok(vec![*v; n_features]),
            MinCategories::PerFeature(v) => {
                if v.len() != n_features {
                    return Err(NbError::MinCategoriesShape {
                        expected: n_features,
                        got: v.len(),
                    });
                }
                Ok(v.clone())
            }
        }
    }
}

/// Categorical naive Bayes classifier.
///
/// Each feature carries integer category codes `0..n_categories`. Counts
/// live in one histogram per (feature, class); histograms widen when a
/// larger code appears in a later incremental call and existing columns
/// never move.
#[derive(Debug, Clone)]
pub struct CategoricalNb {
    core: DiscreteCore,
    min_categories: MinCategories,
    /// Per feature: `[n_classes][n_categories_j]` weighted counts.
    category_count: Option<Vec<Vec<Vec<f64>>>>,
}

impl CategoricalNb {
    pub fn new() -> Self {
        Self {
            core: DiscreteCore::new(),
            min_categories: MinCategories::default(),
            category_count: None,
        }
    }

    #[must_use]
    pub fn with_alpha(mut self, alpha: impl Into<Alpha>) -> Self {
        self.core.alpha = alpha.into();
        self
    }

    #[must_use]
    pub fn with_min_categories(mut self, min_categories: impl Into<MinCategories>) -> Self {
        self.min_categories = min_categories.into();
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

    pub fn category_count(&self) -> Option<&[Vec<Vec<f64>>]> {
        self.category_count.as_deref()
    }

    /// Current histogram width per feature.
    pub fn n_categories(&self) -> Option<Vec<usize>> {
        self.category_count
            .as_ref()
            .map(|tables| tables.iter().map(|t| t[0].len()).collect())
    }

    pub fn class_count(&self) -> Option<&[f64]> {
        self.core.state.as_ref().map(|s| s.class_count.as_slice())
    }

    /// Category codes must be non-negative integers.
    fn check_codes(x: &Features) -> Result<()> {
        let (n_rows, n_cols) = x.shape();
        for i in 0..n_rows {
            for j in 0..n_cols {
                let v = x.get(i, j);
                if v < 0.0 {
                    return Err(NbError::NegativeInput { family: FAMILY });
                }
                if v.fract() != 0.0 {
                    return Err(NbError::NonIntegralCategory { family: FAMILY });
                }
            }
        }
        Ok(())
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
        Self::check_codes(&x)?;
        let weights = expand_sample_weight(x.n_rows(), sample_weight)?;
        let (n_rows, n_features) = x.shape();
        check_alpha(&self.core.alpha, n_features)?;
        let min_categories = self.min_categories.resolve(n_features)?;
        if !refit {
            if let Some(tables) = &self.category_count {
                check_n_features(FAMILY, tables.len(), &x)?;
            }
        }

        let (classes, fresh) = self.core.prepare(y, classes, refit)?;
        let n_classes = classes.len();
        if fresh {
            self.category_count = Some(vec![vec![Vec::new(); n_classes]; n_features]);
        }
        let indices = class_indices(&classes, y)?;
        let tables = self.category_count.as_mut().expect("initialized above");

        for (j, table) in tables.iter_mut().enumerate() {
            // Histograms only ever widen; appended columns start at zero.
            let mut width = table[0].len().max(min_categories[j]);
            for i in 0..n_rows {
                width = width.max(x.get(i, j) as usize + 1);
            }
            for hist in table.iter_mut() {
                hist.resize(width, 0.0);
            }
            for i in 0..n_rows {
                table[indices[i]][x.get(i, j) as usize] += weights[i];
            }
        }
        self.core.bump_class_counts(&indices, &weights);
        self.core.refresh_log_prior()
    }
}

impl Default for CategoricalNb {
    fn default() -> Self {
        Self::new()
    }
}

impl NaiveBayesEstimator for CategoricalNb {
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
        let tables = self
            .category_count
            .as_ref()
            .ok_or(NbError::NotFitted { family: FAMILY })?;
        Self::check_codes(&x)?;
        check_n_features(FAMILY, tables.len(), &x)?;
        let (n_rows, n_features) = x.shape();
        let n_classes = state.classes.len();
        let alpha = check_alpha(&self.core.alpha, n_features)?;

        let mut out = Matrix::zeros(n_rows, n_classes);
        for i in 0..n_rows {
            for c in 0..n_classes {
                out.set(i, c, state.class_log_prior[c]);
            }
        }
        for (j, table) in tables.iter().enumerate() {
            let width = table[0].len();
            for c in 0..n_classes {
                let smoothed_total: f64 =
                    table[c].iter().sum::<f64>() + alpha[j] * width as f64;
                for i in 0..n_rows {
                    let cat = x.get(i, j) as usize;
                    // A code past the histogram width is an unseen
                    // category, left at its smoothed zero count.
                    let count = if cat < width { table[c][cat] } else { 0.0 };
                    let lp = (count + alpha[j]).ln() - smoothed_total.ln();
                    out.set(i, c, out.get(i, c) + lp);
                }
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
            ("min_categories", ParamValue::Int(v)) if v >= 0 => {
                self.min_categories = MinCategories::Scalar(v as usize);
                Ok(())
            }
            ("min_categories", ParamValue::UsizeVec(v)) => {
                self.min_categories = MinCategories::PerFeature(v);
                Ok(())
            }
            (name, value) => self.core.set_param(name, value),
        }
    }

    fn get_param(&self, name: &str) -> Option<ParamValue> {
        match name {
            "min_categories" => Some(match &self.min_categories {
                MinCategories::Scalar(v) => ParamValue::Int(*v as i64),
                MinCategories::PerFeature(v) => ParamValue::UsizeVec(v.clone()),
            }),
            _ => self.core.get_param(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn category_width_tracks_observed_maximum() {
        let x = Matrix::from_rows(&[vec![1.0, 4.0], vec![2.0, 5.0]]);
        let y = vec![1, 2];
        let mut clf = CategoricalNb::new().with_alpha(1.0).with_fit_prior(false);
        clf.fit((&x).into(), &y, None).unwrap();
        assert_eq!(clf.n_categories().unwrap(), vec![3, 6]);
    }

    #[test]
    fn smoothed_probabilities_on_two_point_data() {
        let x = Matrix::from_rows(&[vec![1.0, 4.0], vec![2.0, 5.0]]);
        let y = vec![1, 2];
        let mut clf = CategoricalNb::new().with_alpha(1.0).with_fit_prior(false);
        clf.fit((&x).into(), &y, None).unwrap();
        let test = Matrix::from_rows(&[vec![2.0, 5.0]]);
        let proba = clf.predict_proba((&test).into()).unwrap();
        // [1/4 * 1/7, 2/4 * 2/7] normalized.
        assert!(approx_eq(proba.get(0, 0), 0.2, 1e-10));
        assert!(approx_eq(proba.get(0, 1), 0.8, 1e-10));
    }

    #[test]
    fn negative_codes_rejected_on_fit_and_predict() {
        let bad = Matrix::from_rows(&[vec![0.0, -1.0]]);
        let mut clf = CategoricalNb::new();
        let err = clf.fit((&bad).into(), &[1], None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Negative values in data passed to CategoricalNb (input X)"
        );

        let good = Matrix::from_rows(&[vec![0.0, 1.0], vec![1.0, 0.0]]);
        clf.fit((&good).into(), &[0, 1], None).unwrap();
        assert!(matches!(
            clf.joint_log_likelihood((&bad).into()).unwrap_err(),
            NbError::NegativeInput { .. }
        ));
    }

    #[test]
    fn fractional_codes_rejected() {
        let bad = Matrix::from_rows(&[vec![0.5, 1.0]]);
        let mut clf = CategoricalNb::new();
        assert!(matches!(
            clf.fit((&bad).into(), &[1], None).unwrap_err(),
            NbError::NonIntegralCategory { .. }
        ));
    }

    fn weight_scenario() -> (Matrix, Vec<i64>) {
        let x = Matrix::from_rows(&[
            vec![0.0, 0.0],
            vec![0.0, 1.0],
            vec![0.0, 0.0],
            vec![1.0, 1.0],
        ]);
        (x, vec![1, 1, 2, 2])
    }

    #[test]
    fn sample_weight_shifts_decision() {
        let (x, y) = weight_scenario();
        let probe = Matrix::from_rows(&[vec![0.0, 0.0]]);

        let mut plain = CategoricalNb::new().with_alpha(1.0).with_fit_prior(false);
        plain.fit((&x).into(), &y, None).unwrap();
        assert_eq!(plain.predict((&probe).into()).unwrap(), vec![1]);
        assert_eq!(plain.n_categories().unwrap(), vec![2, 2]);

        for factor in [1.0, 0.3, 5.0, 0.0001] {
            let weights: Vec<f64> = [1.0, 1.0, 10.0, 0.1].iter().map(|w| w * factor).collect();
            let mut weighted = CategoricalNb::new().with_alpha(1.0).with_fit_prior(false);
            weighted.fit((&x).into(), &y, Some(&weights)).unwrap();
            assert_eq!(weighted.predict((&probe).into()).unwrap(), vec![2]);
            assert_eq!(weighted.n_categories().unwrap(), vec![2, 2]);
        }
    }

    #[test]
    fn min_categories_scalar_widens_tables() {
        let (x, y) = weight_scenario();
        let mut clf = CategoricalNb::new()
            .with_alpha(1.0)
            .with_fit_prior(false)
            .with_min_categories(3);
        clf.fit((&x).into(), &y, None).unwrap();
        let tables = clf.category_count().unwrap();
        assert_eq!(tables[0], vec![vec![2.0, 0.0, 0.0], vec![1.0, 1.0, 0.0]]);
        assert_eq!(tables[1], vec![vec![1.0, 1.0, 0.0], vec![1.0, 1.0, 0.0]]);
        assert_eq!(clf.n_categories().unwrap(), vec![3, 3]);
        let probe = Matrix::from_rows(&[vec![0.0, 2.0]]);
        assert_eq!(clf.predict((&probe).into()).unwrap(), vec![1]);
    }

    #[test]
    fn min_categories_per_feature_widens_tables() {
        let (x, y) = weight_scenario();
        let mut clf = CategoricalNb::new()
            .with_alpha(1.0)
            .with_fit_prior(false)
            .with_min_categories(vec![3, 4]);
        clf.fit((&x).into(), &y, None).unwrap();
        let tables = clf.category_count().unwrap();
        assert_eq!(tables[0], vec![vec![2.0, 0.0, 0.0], vec![1.0, 1.0, 0.0]]);
        assert_eq!(
            tables[1],
            vec![vec![1.0, 1.0, 0.0, 0.0], vec![1.0, 1.0, 0.0, 0.0]]
        );
        assert_eq!(clf.n_categories().unwrap(), vec![3, 4]);
        let probe = Matrix::from_rows(&[vec![0.0, 3.0]]);
        assert_eq!(clf.predict((&probe).into()).unwrap(), vec![1]);
    }

    #[test]
    fn min_categories_below_observed_is_inert() {
        let (x, y) = weight_scenario();
        let mut clf = CategoricalNb::new()
            .with_alpha(1.0)
            .with_fit_prior(false)
            .with_min_categories(1);
        clf.fit((&x).into(), &y, None).unwrap();
        let tables = clf.category_count().unwrap();
        assert_eq!(tables[0], vec![vec![2.0, 0.0], vec![1.0, 1.0]]);
        assert_eq!(tables[1], vec![vec![1.0, 1.0], vec![1.0, 1.0]]);
        assert_eq!(clf.n_categories().unwrap(), vec![2, 2]);
    }

    #[test]
    fn min_categories_wrong_length_rejected() {
        let (x, y) = weight_scenario();
        let mut clf = CategoricalNb::new().with_min_categories(vec![3, 2, 4]);
        assert!(matches!(
            clf.fit((&x).into(), &y, None).unwrap_err(),
            NbError::MinCategoriesShape { expected: 2, got: 3 }
        ));
    }

    #[test]
    fn later_partial_fit_widens_without_renumbering() {
        let first = Matrix::from_rows(&[vec![0.0], vec![1.0]]);
        let mut clf = CategoricalNb::new().with_alpha(1.0);
        clf.partial_fit((&first).into(), &[0, 1], Some(&[0, 1]), None)
            .unwrap();
        assert_eq!(clf.n_categories().unwrap(), vec![2]);

        let second = Matrix::from_rows(&[vec![3.0]]);
        clf.partial_fit((&second).into(), &[1], None, None).unwrap();
        assert_eq!(clf.n_categories().unwrap(), vec![4]);
        let tables = clf.category_count().unwrap();
        // Original columns kept their positions; new ones appended.
        assert_eq!(tables[0][0], vec![1.0, 0.0, 0.0, 0.0]);
        assert_eq!(tables[0][1], vec![0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn unseen_code_at_predict_gets_smoothed_zero_count() {
        let x = Matrix::from_rows(&[vec![0.0], vec![1.0]]);
        let mut clf = CategoricalNb::new().with_alpha(1.0);
        clf.fit((&x).into(), &[0, 1], None).unwrap();
        let probe = Matrix::from_rows(&[vec![9.0]]);
        let jll = clf.joint_log_likelihood((&probe).into()).unwrap();
        // count 0 with alpha 1 against total 1 + 2*1.
        let expected = 0.5f64.ln() + (1.0f64 / 3.0).ln();
        assert!(approx_eq(jll.get(0, 0), expected, 1e-12));
        assert!(approx_eq(jll.get(0, 1), expected, 1e-12));
    }

    #[test]
    fn incremental_matches_batch() {
        let (x, y) = weight_scenario();
        let mut batch = CategoricalNb::new();
        batch.fit((&x).into(), &y, None).unwrap();

        let mut incr = CategoricalNb::new();
        let first = Matrix::from_rows(&[x.row(0).to_vec(), x.row(3).to_vec()]);
        let second = Matrix::from_rows(&[x.row(1).to_vec(), x.row(2).to_vec()]);
        incr.partial_fit((&first).into(), &[1, 2], Some(&[1, 2]), None)
            .unwrap();
        incr.partial_fit((&second).into(), &[1, 2], None, None).unwrap();

        let a = batch.joint_log_likelihood((&x).into()).unwrap();
        let b = incr.joint_log_likelihood((&x).into()).unwrap();
        for i in 0..4 {
            for k in 0..2 {
                assert!(approx_eq(a.get(i, k), b.get(i, k), 1e-10));
            }
        }
    }
}
