//! Dense row-major matrix.

use std::fmt;
use std::ops::Range;

use crate::Error;

/// A `rows × cols` matrix of `f64` stored row by row.
///
/// Element `(i, j)` lives at index `i * cols + j` of the raw buffer, and the
/// buffer length is always `rows * cols`. Indexing outside the shape panics.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    values: Vec<f64>,
}

impl Matrix {
    /// Creates a zero-filled matrix.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, 0.0)
    }

    pub fn filled(rows: usize, cols: usize, value: f64) -> Self {
        Self {
            rows,
            cols,
            values: vec![value; rows * cols],
        }
    }

    pub fn identity(n: usize) -> Self {
        let mut m = Self::new(n, n);
        for i in 0..n {
            m.set(i, i, 1.0);
        }
        m
    }

    /// Wraps a row-major buffer.
    pub fn from_vec(rows: usize, cols: usize, values: Vec<f64>) -> Result<Self, Error> {
        if values.len() != rows * cols {
            return Err(Error::InvalidData {
                rows,
                cols,
                len: values.len(),
            });
        }
        Ok(Self { rows, cols, values })
    }

    /// Builds a matrix from nested rows. All rows must have the same length.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, Error> {
        let n = rows.len();
        let cols = rows.first().map_or(0, |row| row.len());
        let mut values = Vec::with_capacity(n * cols);

        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != cols {
                return Err(Error::RaggedRows {
                    row: i,
                    expected: cols,
                    actual: row.len(),
                });
            }
            values.extend(row);
        }

        Ok(Self {
            rows: n,
            cols,
            values,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[self.index(i, j)]
    }

    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        let idx = self.index(i, j);
        self.values[idx] = value;
    }

    /// Adds `delta` to element `(i, j)`.
    pub fn increment(&mut self, i: usize, j: usize, delta: f64) {
        let idx = self.index(i, j);
        self.values[idx] += delta;
    }

    /// The flat row-major buffer, for bulk transfer.
    pub fn raw_buffer(&self) -> &[f64] {
        &self.values
    }

    pub fn raw_buffer_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    /// Range of the raw buffer holding the given rows.
    ///
    /// An empty row range maps to an empty element range.
    pub fn element_range(&self, rows: Range<usize>) -> Range<usize> {
        assert!(
            rows.start <= rows.end && rows.end <= self.rows,
            "row range {:?} out of bounds for {} rows",
            rows,
            self.rows
        );
        rows.start * self.cols..rows.end * self.cols
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        if self.cols == 0 {
            return vec![Vec::new(); self.rows];
        }
        self.values.chunks(self.cols).map(<[f64]>::to_vec).collect()
    }

    fn index(&self, i: usize, j: usize) -> usize {
        assert!(
            i < self.rows && j < self.cols,
            "index ({}, {}) out of bounds for {}x{} matrix",
            i,
            j,
            self.rows,
            self.cols
        );
        i * self.cols + j
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.to_rows() {
            writeln!(f, "  {:?}", row)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_is_zero_filled() {
        let m = Matrix::new(2, 3);
        assert_eq!(m.shape(), (2, 3));
        assert_eq!(m.raw_buffer(), &[0.0; 6]);
    }

    #[test]
    fn row_major_layout() {
        let mut m = Matrix::new(2, 3);
        m.set(1, 2, 7.0);
        assert_eq!(m.raw_buffer()[5], 7.0);
        m.set(0, 1, 3.0);
        assert_eq!(m.raw_buffer()[1], 3.0);
        assert_eq!(m.get(1, 2), 7.0);
    }

    #[test]
    fn increment_accumulates() {
        let mut m = Matrix::new(1, 1);
        m.increment(0, 0, 1.5);
        m.increment(0, 0, 2.5);
        assert_eq!(m.get(0, 0), 4.0);
    }

    #[test]
    fn from_rows_round_trips_through_to_rows() {
        let rows = vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]];
        let m = Matrix::from_rows(rows.clone()).unwrap();
        assert_eq!(m.shape(), (3, 2));
        assert_eq!(m.get(2, 0), 5.0);
        assert_eq!(m.to_rows(), rows);
    }

    #[test]
    fn from_rows_rejects_ragged_input() {
        let err = Matrix::from_rows(vec![vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(matches!(
            err,
            Error::RaggedRows {
                row: 1,
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn from_vec_checks_length() {
        assert!(Matrix::from_vec(2, 2, vec![1.0; 4]).is_ok());
        assert!(matches!(
            Matrix::from_vec(2, 2, vec![1.0; 3]),
            Err(Error::InvalidData { len: 3, .. })
        ));
    }

    #[test]
    fn element_range_covers_rows() {
        let m = Matrix::new(4, 3);
        assert_eq!(m.element_range(1..3), 3..9);
        assert_eq!(m.element_range(4..4), 12..12);
    }

    #[test]
    fn identity_has_unit_diagonal() {
        let m = Matrix::identity(3);
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(m.get(i, j), if i == j { 1.0 } else { 0.0 });
            }
        }
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn column_overflow_panics() {
        let m = Matrix::new(2, 2);
        m.get(0, 2);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn row_overflow_panics() {
        let mut m = Matrix::new(2, 2);
        m.set(2, 0, 1.0);
    }
}
