// Copyright 2026 the Knotfit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A sparse matrix with row and column access.

use alloc::vec;
use alloc::vec::Vec;

use crate::linalg::Matrix;

#[derive(Clone, Copy, Debug, PartialEq)]
struct SparseCell {
    row: usize,
    col: usize,
    value: f64,
}

/// A sparse matrix storing only its nonzero cells.
///
/// Every cell lives once in an arena and is referenced from exactly one row
/// list and one column list, so both rows and columns can be walked without
/// scanning the whole matrix. Lists are unordered.
///
/// An optional bitmap answers [`is_nonzero`] in constant time; without it the
/// query scans the shorter of the row and column lists.
///
/// [`is_nonzero`]: SparseMatrix::is_nonzero
#[derive(Clone, Debug)]
pub struct SparseMatrix {
    rows: usize,
    cols: usize,
    cells: Vec<SparseCell>,
    row_lists: Vec<Vec<usize>>,
    col_lists: Vec<Vec<usize>>,
    indicator: Option<Vec<u64>>,
}

impl SparseMatrix {
    /// An empty `rows x cols` matrix, optionally with a presence bitmap.
    pub fn new(rows: usize, cols: usize, with_indicator: bool) -> Self {
        SparseMatrix {
            rows,
            cols,
            cells: Vec::new(),
            row_lists: vec![Vec::new(); rows],
            col_lists: vec![Vec::new(); cols],
            indicator: with_indicator.then(|| vec![0; (rows * cols).div_ceil(64)]),
        }
    }

    /// Number of rows.
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of stored cells.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.cells.len()
    }

    /// Add `value` into cell `(row, col)`, creating it if absent.
    ///
    /// # Panics
    ///
    /// Panics if the cell is out of bounds.
    pub fn insert(&mut self, row: usize, col: usize, value: f64) {
        assert!(row < self.rows && col < self.cols, "cell out of bounds");
        if let Some(idx) = self.find(row, col) {
            self.cells[idx].value += value;
            return;
        }
        let idx = self.cells.len();
        self.cells.push(SparseCell { row, col, value });
        self.row_lists[row].push(idx);
        self.col_lists[col].push(idx);
        if let Some(bits) = &mut self.indicator {
            let bit = row * self.cols + col;
            bits[bit / 64] |= 1_u64 << (bit % 64);
        }
    }

    fn find(&self, row: usize, col: usize) -> Option<usize> {
        if let Some(bits) = &self.indicator {
            let bit = row * self.cols + col;
            if bits[bit / 64] & (1_u64 << (bit % 64)) == 0 {
                return None;
            }
        }
        let (list, by_row) = if self.row_lists[row].len() <= self.col_lists[col].len() {
            (&self.row_lists[row], true)
        } else {
            (&self.col_lists[col], false)
        };
        list.iter().copied().find(|&i| {
            let cell = &self.cells[i];
            if by_row {
                cell.col == col
            } else {
                cell.row == row
            }
        })
    }

    /// The value at `(row, col)`, zero when no cell is stored.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.find(row, col).map_or(0.0, |i| self.cells[i].value)
    }

    /// Whether a cell is stored at `(row, col)`.
    pub fn is_nonzero(&self, row: usize, col: usize) -> bool {
        match &self.indicator {
            Some(bits) => {
                let bit = row * self.cols + col;
                bits[bit / 64] & (1_u64 << (bit % 64)) != 0
            }
            None => self.find(row, col).is_some(),
        }
    }

    /// The cells of row `r` as `(col, value)` pairs, in insertion order.
    pub fn row(&self, r: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.row_lists[r].iter().map(|&i| {
            let c = &self.cells[i];
            (c.col, c.value)
        })
    }

    /// The cells of column `c` as `(row, value)` pairs, in insertion order.
    pub fn col(&self, c: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.col_lists[c].iter().map(|&i| {
            let c = &self.cells[i];
            (c.row, c.value)
        })
    }

    /// The transpose, keeping the indicator setting.
    #[must_use]
    pub fn transpose(&self) -> SparseMatrix {
        let mut t = SparseMatrix::new(self.cols, self.rows, self.indicator.is_some());
        for cell in &self.cells {
            t.insert(cell.col, cell.row, cell.value);
        }
        t
    }

    /// The dense product `self * other`.
    ///
    /// Walks the rows of `self` against the columns of `other`, so the cost
    /// is proportional to the stored cells rather than the full dimensions.
    ///
    /// # Panics
    ///
    /// Panics if the inner dimensions differ.
    pub fn mul_sparse_dense(&self, other: &SparseMatrix) -> Matrix {
        assert_eq!(self.cols, other.rows, "inner dimensions must agree");
        let mut out = Matrix::zeros(self.rows, other.cols);
        for r in 0..self.rows {
            for (k, a) in self.row(r) {
                for (c, b) in other.row(k) {
                    out[(r, c)] += a * b;
                }
            }
        }
        out
    }

    /// The dense product `self * other` with a dense right factor.
    ///
    /// # Panics
    ///
    /// Panics if the inner dimensions differ.
    pub fn mul_dense(&self, other: &Matrix) -> Matrix {
        assert_eq!(self.cols, other.rows(), "inner dimensions must agree");
        let mut out = Matrix::zeros(self.rows, other.cols());
        for cell in &self.cells {
            let src = other.row(cell.col);
            for (o, b) in out.row_mut(cell.row).iter_mut().zip(src) {
                *o += cell.value * b;
            }
        }
        out
    }

    /// Expand to a dense matrix.
    pub fn to_dense(&self) -> Matrix {
        let mut out = Matrix::zeros(self.rows, self.cols);
        for cell in &self.cells {
            out[(cell.row, cell.col)] = cell.value;
        }
        out
    }
}
