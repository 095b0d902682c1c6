//! Input containers for the likelihood engines.
//!
//! Engines accept three input shapes through the borrowed [`Features`]
//! union: a dense row-major [`Matrix`], a compressed-sparse-row
//! [`CsrMatrix`], or a [`Table`] whose columns are addressable by name.

use crate::error::{NbError, Result};
use serde::{Deserialize, Serialize};

/// Dense row-major matrix of f64 values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    n_rows: usize,
    n_cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Build from a row-major buffer.
    ///
    /// # Panics
    ///
    /// Panics if `data.len() != n_rows * n_cols`.
    pub fn from_vec(n_rows: usize, n_cols: usize, data: Vec<f64>) -> Self {
        assert_eq!(
            data.len(),
            n_rows * n_cols,
            "matrix data length must equal n_rows * n_cols"
        );
        Self {
            n_rows,
            n_cols,
            data,
        }
    }

    /// Build from a list of equal-length rows.
    ///
    /// # Panics
    ///
    /// Panics if rows have unequal lengths.
    pub fn from_rows(rows: &[Vec<f64>]) -> Self {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(n_rows * n_cols);
        for row in rows {
            assert_eq!(row.len(), n_cols, "rows must have equal lengths");
            data.extend_from_slice(row);
        }
        Self {
            n_rows,
            n_cols,
            data,
        }
    }

    /// All-zero matrix of the given shape.
    pub fn zeros(n_rows: usize, n_cols: usize) -> Self {
        Self {
            n_rows,
            n_cols,
            data: vec![0.0; n_rows * n_cols],
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows, self.n_cols)
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.n_cols + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.n_cols + col] = value;
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.n_cols..(row + 1) * self.n_cols]
    }

    pub fn row_mut(&mut self, row: usize) -> &mut [f64] {
        &mut self.data[row * self.n_cols..(row + 1) * self.n_cols]
    }

    /// Copy out a column subset. Repeated indices duplicate columns,
    /// exactly as repeating the underlying data would.
    pub fn select_columns(&self, columns: &[usize]) -> Result<Matrix> {
        select_columns_impl(self.n_rows, self.n_cols, columns, |i, j| self.get(i, j))
    }
}

/// Compressed sparse row matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsrMatrix {
    n_rows: usize,
    n_cols: usize,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    values: Vec<f64>,
}

impl CsrMatrix {
    /// Build from raw CSR parts.
    ///
    /// # Panics
    ///
    /// Panics if the parts are structurally inconsistent (indptr length,
    /// unsorted or out-of-range column indices).
    pub fn from_parts(
        n_rows: usize,
        n_cols: usize,
        indptr: Vec<usize>,
        indices: Vec<usize>,
        values: Vec<f64>,
    ) -> Self {
        assert_eq!(indptr.len(), n_rows + 1, "indptr must have n_rows + 1 entries");
        assert_eq!(indices.len(), values.len());
        assert_eq!(*indptr.last().unwrap_or(&0), indices.len());
        for row in 0..n_rows {
            let span = &indices[indptr[row]..indptr[row + 1]];
            assert!(span.windows(2).all(|w| w[0] < w[1]), "column indices must be sorted");
            assert!(span.iter().all(|j| *j < n_cols), "column index out of range");
        }
        Self {
            n_rows,
            n_cols,
            indptr,
            indices,
            values,
        }
    }

    /// Sparsify a dense matrix, dropping exact zeros.
    pub fn from_dense(dense: &Matrix) -> Self {
        let (n_rows, n_cols) = dense.shape();
        let mut indptr = Vec::with_capacity(n_rows + 1);
        let mut indices = Vec::new();
        let mut values = Vec::new();
        indptr.push(0);
        for i in 0..n_rows {
            for (j, v) in dense.row(i).iter().enumerate() {
                if *v != 0.0 {
                    indices.push(j);
                    values.push(*v);
                }
            }
            indptr.push(indices.len());
        }
        Self {
            n_rows,
            n_cols,
            indptr,
            indices,
            values,
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows, self.n_cols)
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        let span = &self.indices[self.indptr[row]..self.indptr[row + 1]];
        match span.binary_search(&col) {
            Ok(pos) => self.values[self.indptr[row] + pos],
            Err(_) => 0.0,
        }
    }

    /// Iterate the stored (column, value) pairs of one row.
    pub fn row_nonzero(&self, row: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let start = self.indptr[row];
        let end = self.indptr[row + 1];
        self.indices[start..end]
            .iter()
            .copied()
            .zip(self.values[start..end].iter().copied())
    }

    /// Densify the whole matrix.
    pub fn to_dense(&self) -> Matrix {
        let mut out = Matrix::zeros(self.n_rows, self.n_cols);
        for i in 0..self.n_rows {
            for (j, v) in self.row_nonzero(i) {
                out.set(i, j, v);
            }
        }
        out
    }
}

/// Dense matrix with named columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    names: Vec<String>,
    data: Matrix,
}

impl Table {
    /// # Panics
    ///
    /// Panics if the number of names does not match the matrix width.
    pub fn new(names: Vec<String>, data: Matrix) -> Self {
        assert_eq!(names.len(), data.n_cols(), "one name per column");
        Self { names, data }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn data(&self) -> &Matrix {
        &self.data
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
}

/// Borrowed view over any accepted input shape.
#[derive(Debug, Clone, Copy)]
pub enum Features<'a> {
    Dense(&'a Matrix),
    Sparse(&'a CsrMatrix),
    Table(&'a Table),
}

impl<'a> Features<'a> {
    pub fn shape(&self) -> (usize, usize) {
        match self {
            Features::Dense(m) => m.shape(),
            Features::Sparse(m) => m.shape(),
            Features::Table(t) => t.data().shape(),
        }
    }

    pub fn n_rows(&self) -> usize {
        self.shape().0
    }

    pub fn n_cols(&self) -> usize {
        self.shape().1
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        match self {
            Features::Dense(m) => m.get(row, col),
            Features::Sparse(m) => m.get(row, col),
            Features::Table(t) => t.data().get(row, col),
        }
    }

    /// Column names, present only for labeled tables.
    pub fn names(&self) -> Option<&'a [String]> {
        match self {
            Features::Table(t) => Some(t.names()),
            _ => None,
        }
    }

    /// Copy one row into a dense buffer.
    pub fn row_dense(&self, row: usize) -> Vec<f64> {
        match self {
            Features::Dense(m) => m.row(row).to_vec(),
            Features::Table(t) => t.data().row(row).to_vec(),
            Features::Sparse(m) => {
                let mut out = vec![0.0; m.shape().1];
                for (j, v) in m.row_nonzero(row) {
                    out[j] = v;
                }
                out
            }
        }
    }

    /// Densified column subset; repeated indices duplicate columns.
    pub fn select_columns(&self, columns: &[usize]) -> Result<Matrix> {
        let (n_rows, n_cols) = self.shape();
        select_columns_impl(n_rows, n_cols, columns, |i, j| self.get(i, j))
    }
}

impl<'a> From<&'a Matrix> for Features<'a> {
    fn from(m: &'a Matrix) -> Self {
        Features::Dense(m)
    }
}

impl<'a> From<&'a CsrMatrix> for Features<'a> {
    fn from(m: &'a CsrMatrix) -> Self {
        Features::Sparse(m)
    }
}

impl<'a> From<&'a Table> for Features<'a> {
    fn from(t: &'a Table) -> Self {
        Features::Table(t)
    }
}

fn select_columns_impl(
    n_rows: usize,
    n_cols: usize,
    columns: &[usize],
    get: impl Fn(usize, usize) -> f64,
) -> Result<Matrix> {
    if let Some(bad) = columns.iter().find(|c| **c >= n_cols) {
        return Err(NbError::ColumnOutOfBounds {
            index: *bad,
            n_columns: n_cols,
        });
    }
    let mut data = Vec::with_capacity(n_rows * columns.len());
    for i in 0..n_rows {
        for j in columns {
            data.push(get(i, *j));
        }
    }
    Ok(Matrix::from_vec(n_rows, columns.len(), data))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Matrix {
        Matrix::from_vec(2, 3, vec![1.0, 0.0, 2.0, 0.0, 3.0, 0.0])
    }

    #[test]
    fn dense_shape_and_get() {
        let m = sample();
        assert_eq!(m.shape(), (2, 3));
        assert_eq!(m.get(0, 2), 2.0);
        assert_eq!(m.get(1, 1), 3.0);
    }

    #[test]
    fn select_columns_repeats_data() {
        let m = sample();
        let sub = m.select_columns(&[2, 2, 0]).unwrap();
        assert_eq!(sub.shape(), (2, 3));
        assert_eq!(sub.row(0), &[2.0, 2.0, 1.0]);
    }

    #[test]
    fn select_columns_out_of_bounds_errors() {
        let m = sample();
        let err = m.select_columns(&[0, 5]).unwrap_err();
        assert!(matches!(err, NbError::ColumnOutOfBounds { index: 5, .. }));
    }

    #[test]
    fn csr_roundtrip_matches_dense() {
        let m = sample();
        let csr = CsrMatrix::from_dense(&m);
        assert_eq!(csr.to_dense(), m);
        assert_eq!(csr.get(0, 1), 0.0);
        assert_eq!(csr.get(1, 1), 3.0);
    }

    #[test]
    fn csr_row_nonzero_skips_zeros() {
        let csr = CsrMatrix::from_dense(&sample());
        let row: Vec<(usize, f64)> = csr.row_nonzero(0).collect();
        assert_eq!(row, vec![(0, 1.0), (2, 2.0)]);
    }

    #[test]
    fn features_uniform_access() {
        let m = sample();
        let csr = CsrMatrix::from_dense(&m);
        let table = Table::new(
            vec!["a".into(), "b".into(), "c".into()],
            m.clone(),
        );
        for x in [
            Features::from(&m),
            Features::from(&csr),
            Features::from(&table),
        ] {
            assert_eq!(x.shape(), (2, 3));
            assert_eq!(x.get(1, 1), 3.0);
            assert_eq!(x.row_dense(0), vec![1.0, 0.0, 2.0]);
        }
    }

    #[test]
    fn table_name_lookup() {
        let table = Table::new(vec!["a".into(), "b".into(), "c".into()], sample());
        assert_eq!(table.column_index("b"), Some(1));
        assert_eq!(table.column_index("zz"), None);
        let x = Features::from(&table);
        assert_eq!(x.names().unwrap()[2], "c");
    }
}
