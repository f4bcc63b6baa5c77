// Copyright 2026 the Knotfit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dense row-major matrices.

use core::fmt;
use core::ops::{Index, IndexMut, Mul};

use alloc::vec;
use alloc::vec::Vec;

#[cfg(not(feature = "std"))]
use crate::common::FloatFuncs;

use crate::linalg::Svd;

/// A dense matrix stored row by row.
#[derive(Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// A `rows x cols` matrix of zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Matrix {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// The `n x n` identity.
    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m[(i, i)] = 1.0;
        }
        m
    }

    /// Wrap row-major data.
    ///
    /// # Panics
    ///
    /// Panics if `data.len() != rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Self {
        assert_eq!(data.len(), rows * cols, "matrix data has the wrong length");
        Matrix { rows, cols, data }
    }

    /// Build from a slice of equal-length rows.
    ///
    /// # Panics
    ///
    /// Panics if the rows differ in length.
    pub fn from_rows(rows: &[&[f64]]) -> Self {
        let cols = rows.first().map_or(0, |r| r.len());
        let mut data = Vec::with_capacity(rows.len() * cols);
        for r in rows {
            assert_eq!(r.len(), cols, "rows must have equal length");
            data.extend_from_slice(r);
        }
        Matrix {
            rows: rows.len(),
            cols,
            data,
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

    /// Row `r` as a slice.
    #[inline]
    pub fn row(&self, r: usize) -> &[f64] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    /// Row `r` as a mutable slice.
    #[inline]
    pub fn row_mut(&mut self, r: usize) -> &mut [f64] {
        &mut self.data[r * self.cols..(r + 1) * self.cols]
    }

    /// Column `c`, copied.
    pub fn col(&self, c: usize) -> Vec<f64> {
        (0..self.rows).map(|r| self[(r, c)]).collect()
    }

    /// The raw row-major data.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Swap two rows in place.
    pub fn swap_rows(&mut self, a: usize, b: usize) {
        if a != b {
            for c in 0..self.cols {
                self.data.swap(a * self.cols + c, b * self.cols + c);
            }
        }
    }

    /// Swap two columns in place.
    pub fn swap_cols(&mut self, a: usize, b: usize) {
        if a != b {
            for r in 0..self.rows {
                self.data.swap(r * self.cols + a, r * self.cols + b);
            }
        }
    }

    /// The transpose.
    #[must_use]
    pub fn transpose(&self) -> Matrix {
        let mut t = Matrix::zeros(self.cols, self.rows);
        for r in 0..self.rows {
            for c in 0..self.cols {
                t[(c, r)] = self[(r, c)];
            }
        }
        t
    }

    /// `self * v`.
    ///
    /// # Panics
    ///
    /// Panics if `v.len() != self.cols()`.
    pub fn mul_vec(&self, v: &[f64]) -> Vec<f64> {
        assert_eq!(v.len(), self.cols, "vector length must match columns");
        (0..self.rows)
            .map(|r| self.row(r).iter().zip(v).map(|(a, b)| a * b).sum())
            .collect()
    }

    /// `self^T * v`.
    ///
    /// # Panics
    ///
    /// Panics if `v.len() != self.rows()`.
    pub fn transpose_mul_vec(&self, v: &[f64]) -> Vec<f64> {
        assert_eq!(v.len(), self.rows, "vector length must match rows");
        let mut out = vec![0.0; self.cols];
        for (r, vr) in v.iter().enumerate() {
            for (o, a) in out.iter_mut().zip(self.row(r)) {
                *o += a * vr;
            }
        }
        out
    }

    /// Largest absolute entry.
    pub fn max_abs(&self) -> f64 {
        self.data.iter().fold(0.0, |m: f64, x| m.max(x.abs()))
    }

    /// Inverse of a square matrix by Gauss-Jordan elimination with full pivoting.
    ///
    /// Returns `None` if the matrix is singular.
    ///
    /// # Panics
    ///
    /// Panics if the matrix is not square.
    pub fn inverse(&self) -> Option<Matrix> {
        assert_eq!(self.rows, self.cols, "only square matrices have inverses");
        let n = self.rows;
        let tol = f64::EPSILON * self.max_abs() * n as f64;
        let mut a = self.clone();
        let mut pivoted = vec![false; n];
        let mut row_of = vec![0; n];
        let mut col_of = vec![0; n];
        for i in 0..n {
            let mut big = 0.0;
            let (mut irow, mut icol) = (0, 0);
            for j in (0..n).filter(|&j| !pivoted[j]) {
                for k in (0..n).filter(|&k| !pivoted[k]) {
                    if a[(j, k)].abs() >= big {
                        big = a[(j, k)].abs();
                        irow = j;
                        icol = k;
                    }
                }
            }
            if big <= tol || big == 0.0 {
                return None;
            }
            pivoted[icol] = true;
            a.swap_rows(irow, icol);
            row_of[i] = irow;
            col_of[i] = icol;
            let pivinv = a[(icol, icol)].recip();
            a[(icol, icol)] = 1.0;
            for x in a.row_mut(icol) {
                *x *= pivinv;
            }
            for ll in (0..n).filter(|&ll| ll != icol) {
                let dum = a[(ll, icol)];
                a[(ll, icol)] = 0.0;
                for c in 0..n {
                    let v = a[(icol, c)];
                    a[(ll, c)] -= v * dum;
                }
            }
        }
        // Undo the column interchanges in reverse order.
        for l in (0..n).rev() {
            a.swap_cols(row_of[l], col_of[l]);
        }
        Some(a)
    }

    /// Determinant of a square matrix, by LU decomposition with partial pivoting.
    ///
    /// # Panics
    ///
    /// Panics if the matrix is not square.
    pub fn determinant(&self) -> f64 {
        assert_eq!(self.rows, self.cols, "determinant needs a square matrix");
        let n = self.rows;
        let mut a = self.clone();
        let mut det = 1.0;
        for k in 0..n {
            let p = (k..n)
                .max_by(|&i, &j| a[(i, k)].abs().total_cmp(&a[(j, k)].abs()))
                .unwrap_or(k);
            if a[(p, k)] == 0.0 {
                return 0.0;
            }
            if p != k {
                a.swap_rows(p, k);
                det = -det;
            }
            det *= a[(k, k)];
            for i in k + 1..n {
                let f = a[(i, k)] / a[(k, k)];
                for c in k..n {
                    let v = a[(k, c)];
                    a[(i, c)] -= f * v;
                }
            }
        }
        det
    }

    /// Moore-Penrose pseudo-inverse, via the singular value decomposition.
    #[must_use]
    pub fn pseudo_inverse(&self) -> Matrix {
        if self.rows < self.cols {
            return self.transpose().pseudo_inverse().transpose();
        }
        let svd = Svd::new(self);
        let s = svd.singular_values();
        let cutoff = crate::common::SVD_EPS * s.first().copied().unwrap_or(0.0);
        let (u, v) = (svd.u(), svd.v());
        let mut out = Matrix::zeros(self.cols, self.rows);
        for (j, &sj) in s.iter().enumerate() {
            if sj <= cutoff {
                continue;
            }
            let inv = sj.recip();
            for r in 0..self.cols {
                let vr = v[(r, j)] * inv;
                for c in 0..self.rows {
                    out[(r, c)] += vr * u[(c, j)];
                }
            }
        }
        out
    }

    /// An orthonormal basis of the vectors `x` with `self * x = 0`.
    ///
    /// Each returned vector has length `self.cols()`.
    pub fn null_space(&self) -> Vec<Vec<f64>> {
        let padded;
        let a = if self.rows < self.cols {
            let mut data = self.data.clone();
            data.resize(self.cols * self.cols, 0.0);
            padded = Matrix::from_vec(self.cols, self.cols, data);
            &padded
        } else {
            self
        };
        let svd = Svd::new(a);
        let s = svd.singular_values();
        let cutoff = crate::common::SVD_EPS * s.first().copied().unwrap_or(0.0).max(1.0);
        s.iter()
            .enumerate()
            .filter(|&(_, &sj)| sj <= cutoff)
            .map(|(j, _)| svd.v().col(j))
            .collect()
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    #[inline]
    fn index(&self, (r, c): (usize, usize)) -> &f64 {
        &self.data[r * self.cols + c]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    #[inline]
    fn index_mut(&mut self, (r, c): (usize, usize)) -> &mut f64 {
        &mut self.data[r * self.cols + c]
    }
}

impl Mul for &Matrix {
    type Output = Matrix;

    fn mul(self, other: &Matrix) -> Matrix {
        assert_eq!(self.cols, other.rows, "inner dimensions must agree");
        let mut out = Matrix::zeros(self.rows, other.cols);
        for r in 0..self.rows {
            for k in 0..self.cols {
                let a = self[(r, k)];
                if a == 0.0 {
                    continue;
                }
                for c in 0..other.cols {
                    out[(r, c)] += a * other[(k, c)];
                }
            }
        }
        out
    }
}

impl fmt::Debug for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Matrix {}x{} [", self.rows, self.cols)?;
        for r in 0..self.rows {
            writeln!(f, "  {:?}", self.row(r))?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_near(a: &Matrix, b: &Matrix, eps: f64) {
        assert_eq!((a.rows(), a.cols()), (b.rows(), b.cols()));
        for (x, y) in a.as_slice().iter().zip(b.as_slice()) {
            assert!((x - y).abs() < eps, "{a:?} != {b:?}");
        }
    }

    #[test]
    fn inverse_full_pivot() {
        // The leading zero forces a pivot away from the diagonal.
        let a = Matrix::from_rows(&[
            &[0.0, 2.0, 1.0, 0.0],
            &[1.0, 0.0, 0.0, 3.0],
            &[0.0, 1.0, 4.0, 0.0],
            &[2.0, 0.0, 1.0, 1.0],
        ]);
        let inv = a.inverse().unwrap();
        assert_near(&(&a * &inv), &Matrix::identity(4), 1e-12);
        assert_near(&(&inv * &a), &Matrix::identity(4), 1e-12);
    }

    #[test]
    fn inverse_singular() {
        let a = Matrix::from_rows(&[&[1.0, 2.0], &[2.0, 4.0]]);
        assert!(a.inverse().is_none());
        assert_eq!(a.determinant(), 0.0);
    }

    #[test]
    fn determinant() {
        let a = Matrix::from_rows(&[&[2.0, 0.0, 1.0], &[1.0, 3.0, 2.0], &[1.0, 1.0, 2.0]]);
        assert!((a.determinant() - 6.0).abs() < 1e-12);
        let c = Matrix::from_rows(&[&[2.0, 0.0, 1.0], &[1.0, 3.0, 2.0], &[1.0, 1.0, 1.0]]);
        assert!(c.determinant().abs() < 1e-12);
        let b = Matrix::from_rows(&[&[0.0, 1.0], &[1.0, 0.0]]);
        assert!((b.determinant() + 1.0).abs() < 1e-15);
    }

    #[test]
    fn transpose_and_mul_vec() {
        let a = Matrix::from_rows(&[&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]]);
        let t = a.transpose();
        assert_eq!(t[(2, 1)], 6.0);
        assert_eq!(a.mul_vec(&[1.0, 0.0, -1.0]), vec![-2.0, -2.0]);
        assert_eq!(a.transpose_mul_vec(&[1.0, 1.0]), vec![5.0, 7.0, 9.0]);
    }

    #[test]
    fn pseudo_inverse_wide() {
        let a = Matrix::from_rows(&[&[1.0, 0.0, 1.0], &[0.0, 1.0, 1.0]]);
        let p = a.pseudo_inverse();
        assert_eq!((p.rows(), p.cols()), (3, 2));
        // A A^+ = I for a full row rank matrix.
        assert_near(&(&a * &p), &Matrix::identity(2), 1e-12);
    }

    #[test]
    fn null_space_of_wide_matrix() {
        let a = Matrix::from_rows(&[&[1.0, 1.0, 0.0], &[0.0, 1.0, 1.0]]);
        let ns = a.null_space();
        assert_eq!(ns.len(), 1);
        let r = a.mul_vec(&ns[0]);
        assert!(r.iter().all(|x| x.abs() < 1e-12));
        assert!((crate::common::norm(&ns[0]) - 1.0).abs() < 1e-12);
    }
}
