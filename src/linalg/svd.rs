// Copyright 2026 the Knotfit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Singular value decomposition and least-squares solves.

use alloc::vec;
use alloc::vec::Vec;

#[cfg(not(feature = "std"))]
use crate::common::FloatFuncs;

use crate::common::SVD_EPS;
use crate::linalg::Matrix;

const MAX_SWEEPS: usize = 60;
const JACOBI_EPS: f64 = 1e-15;

/// The decomposition `A = U S V^T` of an `m x n` matrix with `m >= n`.
///
/// `U` is `m x n` with orthonormal columns (for nonzero singular values),
/// `S` holds the singular values in decreasing order, and `V` is `n x n`
/// orthogonal.
///
/// The decomposition is computed with one-sided Jacobi rotations, which are
/// slow for large matrices but accurate for the small, often badly scaled
/// systems that come out of spline fitting.
#[derive(Clone, Debug)]
pub struct Svd {
    u: Matrix,
    s: Vec<f64>,
    v: Matrix,
}

impl Svd {
    /// Decompose `a`.
    ///
    /// # Panics
    ///
    /// Panics if `a` has fewer rows than columns.
    pub fn new(a: &Matrix) -> Self {
        let (m, n) = (a.rows(), a.cols());
        assert!(m >= n, "SVD needs at least as many rows as columns");
        let mut u = a.clone();
        let mut v = Matrix::identity(n);
        for _ in 0..MAX_SWEEPS {
            let mut rotated = false;
            for p in 0..n {
                for q in p + 1..n {
                    let (mut alpha, mut beta, mut gamma) = (0.0, 0.0, 0.0);
                    for i in 0..m {
                        let (up, uq) = (u[(i, p)], u[(i, q)]);
                        alpha += up * up;
                        beta += uq * uq;
                        gamma += up * uq;
                    }
                    if gamma == 0.0 || gamma.abs() <= JACOBI_EPS * (alpha * beta).sqrt() {
                        continue;
                    }
                    rotated = true;
                    let zeta = (beta - alpha) / (2.0 * gamma);
                    let t = zeta.signum() / (zeta.abs() + (1.0 + zeta * zeta).sqrt());
                    let c = (1.0 + t * t).sqrt().recip();
                    let s = c * t;
                    rotate_cols(&mut u, p, q, c, s);
                    rotate_cols(&mut v, p, q, c, s);
                }
            }
            if !rotated {
                break;
            }
        }

        let mut s: Vec<f64> = (0..n).map(|j| crate::common::norm(&u.col(j))).collect();
        for (j, &sj) in s.iter().enumerate() {
            if sj > 0.0 {
                let inv = sj.recip();
                for i in 0..m {
                    u[(i, j)] *= inv;
                }
            }
        }

        // Selection sort into decreasing order, permuting U and V alongside.
        for j in 0..n {
            let best = (j..n)
                .max_by(|&a, &b| s[a].total_cmp(&s[b]))
                .unwrap_or(j);
            if best != j {
                s.swap(j, best);
                u.swap_cols(j, best);
                v.swap_cols(j, best);
            }
        }
        Svd { u, s, v }
    }

    /// The left singular vectors, one per column.
    #[inline]
    pub fn u(&self) -> &Matrix {
        &self.u
    }

    /// The singular values, largest first.
    #[inline]
    pub fn singular_values(&self) -> &[f64] {
        &self.s
    }

    /// The right singular vectors, one per column.
    #[inline]
    pub fn v(&self) -> &Matrix {
        &self.v
    }

    /// Ratio of the smallest to the largest singular value.
    ///
    /// This is zero for a zero matrix, and close to zero for a numerically
    /// singular one.
    pub fn min_ratio(&self) -> f64 {
        match (self.s.first(), self.s.last()) {
            (Some(&max), Some(&min)) if max > 0.0 => min / max,
            _ => 0.0,
        }
    }

    /// The 2-norm condition number, infinite for a singular matrix.
    pub fn condition(&self) -> f64 {
        let r = self.min_ratio();
        if r > 0.0 {
            r.recip()
        } else {
            f64::INFINITY
        }
    }

    /// The least-squares solution of `A x = b`, `x = V S^-1 U^T b`.
    ///
    /// Reciprocals of singular values below a small fraction of the largest
    /// are taken as zero, so for rank deficient systems this is the
    /// minimum-norm least-squares solution.
    ///
    /// # Panics
    ///
    /// Panics if `b` does not have one entry per row of `A`.
    pub fn solve_least_squares(&self, b: &[f64]) -> Vec<f64> {
        let (m, n) = (self.u.rows(), self.u.cols());
        assert_eq!(b.len(), m, "right hand side length must match rows");
        let cutoff = SVD_EPS * self.s.first().copied().unwrap_or(0.0);
        let mut x = vec![0.0; n];
        for (j, &sj) in self.s.iter().enumerate() {
            if sj <= cutoff {
                continue;
            }
            let coef = (0..m).map(|i| self.u[(i, j)] * b[i]).sum::<f64>() / sj;
            for (r, xr) in x.iter_mut().enumerate() {
                *xr += coef * self.v[(r, j)];
            }
        }
        x
    }
}

fn rotate_cols(a: &mut Matrix, p: usize, q: usize, c: f64, s: f64) {
    for i in 0..a.rows() {
        let (ap, aq) = (a[(i, p)], a[(i, q)]);
        a[(i, p)] = c * ap - s * aq;
        a[(i, q)] = s * ap + c * aq;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn random_matrix(rng: &mut StdRng, m: usize, n: usize) -> Matrix {
        let data = (0..m * n).map(|_| rng.random_range(-1.0..1.0)).collect();
        Matrix::from_vec(m, n, data)
    }

    #[test]
    fn reconstructs_input() {
        let mut rng = StdRng::seed_from_u64(7);
        let a = random_matrix(&mut rng, 7, 4);
        let svd = Svd::new(&a);
        let s = svd.singular_values();
        assert!(s.windows(2).all(|w| w[0] >= w[1]));
        for r in 0..7 {
            for c in 0..4 {
                let x: f64 = (0..4)
                    .map(|j| svd.u()[(r, j)] * s[j] * svd.v()[(c, j)])
                    .sum();
                assert!((x - a[(r, c)]).abs() < 1e-12);
            }
        }
        // V is orthogonal.
        let vtv = &svd.v().transpose() * svd.v();
        for r in 0..4 {
            for c in 0..4 {
                let expected = if r == c { 1.0 } else { 0.0 };
                assert!((vtv[(r, c)] - expected).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn diagonal_singular_values() {
        let a = Matrix::from_rows(&[&[3.0, 0.0], &[0.0, -4.0], &[0.0, 0.0]]);
        let svd = Svd::new(&a);
        approx::assert_abs_diff_eq!(svd.singular_values()[0], 4.0, epsilon = 1e-14);
        approx::assert_abs_diff_eq!(svd.singular_values()[1], 3.0, epsilon = 1e-14);
        approx::assert_abs_diff_eq!(svd.condition(), 4.0 / 3.0, epsilon = 1e-14);
    }

    #[test]
    fn least_squares_line() {
        // Fit y = a + b x to points on y = 1 + 2x plus symmetric noise.
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [1.1, 2.9, 5.1, 6.9];
        let rows: Vec<[f64; 2]> = xs.iter().map(|&x| [1.0, x]).collect();
        let rows: Vec<&[f64]> = rows.iter().map(|r| r.as_slice()).collect();
        let a = Matrix::from_rows(&rows);
        let x = Svd::new(&a).solve_least_squares(&ys);
        // Normal equations: [4 6; 6 14] x = [16, 33.8].
        approx::assert_abs_diff_eq!(x[0], 1.06, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(x[1], 1.96, epsilon = 1e-12);
    }

    #[test]
    fn singular_ratio() {
        let a = Matrix::from_rows(&[&[0.5, 0.5], &[0.5, 0.5]]);
        let svd = Svd::new(&a);
        assert!(svd.min_ratio() < SVD_EPS);
        assert_eq!(svd.condition(), f64::INFINITY);
        assert_eq!(Svd::new(&Matrix::zeros(2, 2)).min_ratio(), 0.0);
    }
}
