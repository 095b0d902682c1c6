//! Naive Bayes classifiers with columnwise composition.
//!
//! Five per-family likelihood engines (Gaussian, Multinomial, Bernoulli,
//! Complement, Categorical) share one estimator protocol: batch `fit`,
//! incremental `partial_fit`, and a joint log-likelihood contract from
//! which predictions are derived. [`ColumnwiseNb`] binds independent
//! engines to column subsets of the input and recombines their outputs
//! into a single coherent posterior, optionally fitting the sub-models in
//! parallel.

pub mod bernoulli;
pub mod categorical;
pub mod columnwise;
pub mod complement;
pub mod data;
mod discrete;
pub mod error;
pub mod gaussian;
pub mod multinomial;
pub mod parallel;
pub mod protocol;
pub mod selector;

pub use bernoulli::BernoulliNb;
pub use categorical::{CategoricalNb, MinCategories};
pub use columnwise::{ColumnwiseNb, PriorSpec};
pub use complement::ComplementNb;
pub use data::{CsrMatrix, Features, Matrix, Table};
pub use error::{NbError, Result};
pub use gaussian::GaussianNb;
pub use multinomial::MultinomialNb;
pub use protocol::{Alpha, NaiveBayesEstimator, ParamValue};
pub use selector::ColumnSelector;
