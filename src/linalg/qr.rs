// Copyright 2026 the Knotfit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Householder QR and minimum-norm solves of underdetermined systems.

use alloc::vec;
use alloc::vec::Vec;

#[cfg(not(feature = "std"))]
use crate::common::FloatFuncs;

use crate::common::QR_EPS;
use crate::linalg::Matrix;

/// QR factorization of the transpose of a wide matrix.
///
/// For an `m x n` matrix `A` with `m <= n` this holds `A^T = Q R`, with `Q`
/// an `n x m` matrix of orthonormal columns and `R` an `m x m` upper
/// triangle. The system `A x = b` then becomes `R^T z = b` with `x = Q z`,
/// and since `x` lies in the row space of `A` it is the solution of least
/// norm.
#[derive(Clone, Debug)]
pub struct Qr {
    q: Matrix,
    r: Matrix,
}

impl Qr {
    /// Factor `a`, which must have no more rows than columns.
    ///
    /// Returns `None` if the rows of `a` are numerically dependent, that is
    /// if some diagonal entry of `R` is below [`QR_EPS`] relative to the
    /// scale of `a`.
    ///
    /// # Panics
    ///
    /// Panics if `a` has more rows than columns.
    pub fn factor(a: &Matrix) -> Option<Qr> {
        let (m, n) = (a.rows(), a.cols());
        assert!(m <= n, "QR minimum-norm solve needs a wide matrix");
        let scale = (0..m)
            .map(|i| crate::common::norm(a.row(i)))
            .fold(1.0, f64::max);
        let mut w = a.transpose();
        let mut reflectors: Vec<Vec<f64>> = Vec::with_capacity(m);
        for k in 0..m {
            let mut v: Vec<f64> = (k..n).map(|i| w[(i, k)]).collect();
            let len = crate::common::norm(&v);
            let alpha = if v[0] > 0.0 { -len } else { len };
            v[0] -= alpha;
            let vlen = crate::common::norm(&v);
            if vlen > 0.0 {
                for x in &mut v {
                    *x /= vlen;
                }
                apply_reflector(&mut w, &v, k, k..m);
            }
            reflectors.push(v);
            if w[(k, k)].abs() < QR_EPS * scale {
                log::trace!("QR pivot {k} is {:e}", w[(k, k)]);
                return None;
            }
        }

        let mut r = Matrix::zeros(m, m);
        for i in 0..m {
            for j in i..m {
                r[(i, j)] = w[(i, j)];
            }
        }
        // Q is the product of the reflectors applied to the leading columns of I.
        let mut q = Matrix::zeros(n, m);
        for j in 0..m {
            q[(j, j)] = 1.0;
        }
        for (k, v) in reflectors.iter().enumerate().rev() {
            apply_reflector(&mut q, v, k, 0..m);
        }
        Some(Qr { q, r })
    }

    /// The orthonormal factor `Q`, `n x m`.
    #[inline]
    pub fn q(&self) -> &Matrix {
        &self.q
    }

    /// The upper triangular factor `R`, `m x m`.
    #[inline]
    pub fn r(&self) -> &Matrix {
        &self.r
    }

    /// The minimum-norm solution of `A x = b`.
    ///
    /// # Panics
    ///
    /// Panics if `b` does not have one entry per row of `A`.
    pub fn solve_min_norm(&self, b: &[f64]) -> Vec<f64> {
        let m = self.r.rows();
        assert_eq!(b.len(), m, "right hand side length must match rows");
        // Forward substitution on the lower triangle R^T.
        let mut z = vec![0.0; m];
        for i in 0..m {
            let mut acc = b[i];
            for j in 0..i {
                acc -= self.r[(j, i)] * z[j];
            }
            z[i] = acc / self.r[(i, i)];
        }
        self.q.mul_vec(&z)
    }
}

/// Apply `I - 2 v v^T` to rows `k..` of the given columns of `a`.
fn apply_reflector(a: &mut Matrix, v: &[f64], k: usize, cols: core::ops::Range<usize>) {
    for c in cols {
        let d: f64 = v.iter().enumerate().map(|(i, vi)| vi * a[(k + i, c)]).sum();
        if d == 0.0 {
            continue;
        }
        for (i, vi) in v.iter().enumerate() {
            a[(k + i, c)] -= 2.0 * d * vi;
        }
    }
}
