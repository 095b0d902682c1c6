//! Error types for colbayes estimators.
//!
//! All configuration, data, capability and extraction failures surface as
//! [`NbError`] values whose messages name the offending parameter and the
//! violated constraint. Recoverable conditions (alpha clamped to the
//! numeric floor, `log(0)` during prior computation) are warnings, not
//! errors.

use thiserror::Error;

/// Result type alias for colbayes operations.
pub type Result<T> = std::result::Result<T, NbError>;

/// Errors raised by likelihood engines and the columnwise composition
/// engine.
#[derive(Debug, Error)]
pub enum NbError {
    // ── Configuration ───────────────────────────────────────────────
    #[error("Number of priors must match number of classes.")]
    PriorLength { expected: usize, got: usize },

    #[error("The sum of the priors should be 1.")]
    PriorSum { sum: f64 },

    #[error("Priors must be non-negative.")]
    PriorNegative,

    #[error("Smoothing parameter alpha = {value:.1e}. alpha should be > 0.")]
    AlphaNegative { value: f64 },

    #[error("alpha should be a scalar or an array with shape [n_features] = {expected}, got {got}")]
    AlphaShape { expected: usize, got: usize },

    #[error("'min_categories' should have shape (n_features,) = {expected}, got {got}")]
    MinCategoriesShape { expected: usize, got: usize },

    #[error("Estimator names are not unique: {name} appears more than once.")]
    DuplicateEstimatorName { name: String },

    #[error("A list of naive Bayes estimators must be provided.")]
    NoEstimators,

    #[error("Invalid parameter {name} for estimator.")]
    UnknownParam { name: String },

    #[error("Column names can only be resolved against a labeled table input.")]
    NamesWithoutTable,

    #[error("A column named {name} is not present in the input table.")]
    UnknownColumn { name: String },

    // ── Data ────────────────────────────────────────────────────────
    #[error("Negative values in data passed to {family} (input X)")]
    NegativeInput { family: &'static str },

    #[error("Non-integral category codes in data passed to {family} (input X)")]
    NonIntegralCategory { family: &'static str },

    #[error("classes must be passed on the first call to partial_fit.")]
    ClassesMissing,

    #[error("classes {got:?} is not the same as on last call to partial_fit.")]
    ClassMismatch { got: Vec<i64> },

    #[error("y contains label {label} which is not in classes.")]
    UnknownLabel { label: i64 },

    #[error("Found input with {got} features, but {family} is expecting {expected} features as input.")]
    FeatureCountMismatch {
        family: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("Found input variables with inconsistent numbers of samples: X has {x_rows}, y has {y_rows}.")]
    SampleCountMismatch { x_rows: usize, y_rows: usize },

    #[error("sample_weight has {got} entries but X has {expected} rows.")]
    WeightLength { expected: usize, got: usize },

    #[error("Column index {index} is out of bounds for input with {n_columns} columns.")]
    ColumnOutOfBounds { index: usize, n_columns: usize },

    #[error("This {family} instance is not fitted yet. Call fit or partial_fit first.")]
    NotFitted { family: &'static str },

    // ── Capability ──────────────────────────────────────────────────
    #[error("Estimator {name} does not support {capability}.")]
    MissingCapability {
        name: String,
        capability: &'static str,
    },

    // ── Extraction ──────────────────────────────────────────────────
    #[error("Unable to extract class prior from estimator {name}.")]
    PriorExtraction { name: String },
}

impl From<cb_math::AlphaError> for NbError {
    fn from(err: cb_math::AlphaError) -> Self {
        match err {
            cb_math::AlphaError::Negative { value } => NbError::AlphaNegative { value },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_input_names_family() {
        let err = NbError::NegativeInput {
            family: "MultinomialNb",
        };
        assert_eq!(
            err.to_string(),
            "Negative values in data passed to MultinomialNb (input X)"
        );
    }

    #[test]
    fn alpha_error_converts_with_value() {
        let err: NbError = cb_math::AlphaError::Negative { value: -0.1 }.into();
        let msg = err.to_string();
        assert!(msg.contains("alpha should be > 0."));
        assert!(msg.contains("-1.0e-1"));
    }

    #[test]
    fn prior_extraction_names_estimator() {
        let err = NbError::PriorExtraction {
            name: "g2".to_string(),
        };
        assert!(err.to_string().contains("estimator g2"));
    }

    #[test]
    fn class_mismatch_lists_classes() {
        let err = NbError::ClassMismatch { got: vec![0, 2] };
        assert!(err
            .to_string()
            .contains("is not the same as on last call to partial_fit"));
    }
}
