//! Column selection for the columnwise composition engine.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use crate::data::Features;
use crate::error::{NbError, Result};

/// Which columns of the input a sub-model consumes.
///
/// A selector is resolved to concrete column indices once per fit or
/// predict call, against the input seen by that call. Name and predicate
/// selectors only make sense against a labeled [`Table`](crate::Table).
#[derive(Clone)]
pub enum ColumnSelector {
    /// Explicit column indices, in sub-model feature order.
    Indices(Vec<usize>),
    /// Column names, resolved against the table header.
    Names(Vec<String>),
    /// Half-open index range; the upper bound clamps to the input width.
    Range(Range<usize>),
    /// Keeps every column whose name satisfies the predicate, in table
    /// order.
    Predicate(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl fmt::Debug for ColumnSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnSelector::Indices(v) => f.debug_tuple("Indices").field(v).finish(),
            ColumnSelector::Names(v) => f.debug_tuple("Names").field(v).finish(),
            ColumnSelector::Range(r) => f.debug_tuple("Range").field(r).finish(),
            ColumnSelector::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl ColumnSelector {
    pub fn indices(indices: impl Into<Vec<usize>>) -> Self {
        ColumnSelector::Indices(indices.into())
    }

    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ColumnSelector::Names(names.into_iter().map(Into::into).collect())
    }

    pub fn range(range: Range<usize>) -> Self {
        ColumnSelector::Range(range)
    }

    pub fn predicate(pred: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        ColumnSelector::Predicate(Arc::new(pred))
    }

    /// Resolve to concrete column indices against `x`.
    pub fn resolve(&self, x: &Features) -> Result<Vec<usize>> {
        let n_columns = x.shape().1;
        match self {
            ColumnSelector::Indices(indices) => {
                for &index in indices {
                    if index >= n_columns {
                        return Err(NbError::ColumnOutOfBounds { index, n_columns });
                    }
                }
                Ok(indices.clone())
            }
            ColumnSelector::Names(wanted) => {
                let names = x.names().ok_or(NbError::NamesWithoutTable)?;
                wanted
                    .iter()
                    .map(|name| {
                        names
                            .iter()
                            .position(|n| n == name)
                            .ok_or_else(|| NbError::UnknownColumn { name: name.clone() })
                    })
                    .collect()
            }
            ColumnSelector::Range(range) => {
                Ok((range.start.min(n_columns)..range.end.min(n_columns)).collect())
            }
            ColumnSelector::Predicate(pred) => {
                let names = x.names().ok_or(NbError::NamesWithoutTable)?;
                Ok(names
                    .iter()
                    .enumerate()
                    .filter(|(_, name)| pred(name))
                    .map(|(j, _)| j)
                    .collect())
            }
        }
    }
}

impl From<Vec<usize>> for ColumnSelector {
    fn from(indices: Vec<usize>) -> Self {
        ColumnSelector::Indices(indices)
    }
}

impl From<Range<usize>> for ColumnSelector {
    fn from(range: Range<usize>) -> Self {
        ColumnSelector::Range(range)
    }
}
