// Copyright 2026 the Knotfit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dense and sparse linear algebra for the fitting systems.
//!
//! Interpolation systems come in two shapes. When there are fewer
//! constraints than control points the system is underdetermined and is
//! solved for the minimum-norm solution with [`Qr`]; otherwise it is solved in
//! the least-squares sense with [`Svd`]. [`Factorization`] picks between them
//! and may be reused for every coordinate channel of one system.

mod matrix;
mod qr;
mod sparse;
mod svd;

pub use matrix::Matrix;
pub use qr::Qr;
pub use sparse::SparseMatrix;
pub use svd::Svd;

use alloc::vec;
use alloc::vec::Vec;

use crate::common::SVD_EPS;

/// A factored system matrix, ready to solve against many right hand sides.
#[derive(Clone, Debug)]
pub enum Factorization {
    /// A system with no rows; every solution is zero.
    Empty {
        /// Number of unknowns.
        cols: usize,
    },
    /// An underdetermined system, solved for minimum norm.
    Qr(Qr),
    /// A square or overdetermined system, solved in the least-squares sense.
    Svd(Svd),
}

impl Factorization {
    /// Factor `a` with the decomposition matching its shape.
    ///
    /// Returns `None` when the system is numerically singular.
    pub fn new(a: &Matrix) -> Option<Self> {
        let (rows, cols) = (a.rows(), a.cols());
        if rows == 0 {
            log::debug!("empty {rows}x{cols} system, solution is zero");
            return Some(Factorization::Empty { cols });
        }
        if rows < cols {
            log::debug!("factoring {rows}x{cols} system with QR");
            Qr::factor(a).map(Factorization::Qr)
        } else {
            log::debug!("factoring {rows}x{cols} system with SVD");
            let svd = Svd::new(a);
            if svd.min_ratio() < SVD_EPS {
                log::debug!("singular value ratio {:e} is too small", svd.min_ratio());
                return None;
            }
            Some(Factorization::Svd(svd))
        }
    }

    /// Solve for one right hand side.
    ///
    /// # Panics
    ///
    /// Panics if `rhs` does not have one entry per row of the factored matrix.
    pub fn solve(&self, rhs: &[f64]) -> Vec<f64> {
        match self {
            Factorization::Empty { cols } => vec![0.0; *cols],
            Factorization::Qr(qr) => qr.solve_min_norm(rhs),
            Factorization::Svd(svd) => svd.solve_least_squares(rhs),
        }
    }
}
