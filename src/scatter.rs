// Copyright 2026 the Knotfit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Surfaces through scattered samples.
//!
//! Each sample `(u, v, value)` gives one equation `\sum N_i(u) M_j(v) P_ij = value`,
//! touching only `u_order * v_order` of the unknowns. [`fit_scattered`]
//! solves the dense system directly. [`fit_scattered_normal`] keeps the
//! system sparse and solves the normal equations `A^T A x = A^T b`, whose
//! size does not grow with the number of samples.

use alloc::vec;
use alloc::vec::Vec;

use crate::basis;
use crate::common::SVD_EPS;
use crate::knots;
use crate::linalg::{Matrix, SparseMatrix, Svd};
use crate::{BsplineSurface, ControlPoints, CtlPt, FitError, PointType};

/// A value at a surface parameter.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScatterSample {
    /// The U parameter.
    pub u: f64,
    /// The V parameter.
    pub v: f64,
    /// The value the surface should take at `(u, v)`.
    pub value: CtlPt,
}

impl ScatterSample {
    /// A new sample.
    pub fn new(u: f64, v: f64, value: impl Into<CtlPt>) -> Self {
        ScatterSample {
            u,
            v,
            value: value.into(),
        }
    }
}

/// Options for [`fit_scattered`] and [`fit_scattered_normal`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScatterOptions {
    /// Order in U.
    pub u_order: usize,
    /// Order in V.
    pub v_order: usize,
    /// Number of control points in U.
    pub u_size: usize,
    /// Number of control points in V.
    pub v_size: usize,
    /// U knots; uniform and open on `[0, 1]` when `None`.
    pub u_knots: Option<Vec<f64>>,
    /// V knots; uniform and open on `[0, 1]` when `None`.
    pub v_knots: Option<Vec<f64>>,
    /// Keep a presence bitmap in the sparse system.
    pub with_indicator: bool,
}

impl Default for ScatterOptions {
    fn default() -> Self {
        ScatterOptions {
            u_order: 4,
            v_order: 4,
            u_size: 8,
            v_size: 8,
            u_knots: None,
            v_knots: None,
            with_indicator: false,
        }
    }
}

impl ScatterOptions {
    /// Options for the given orders and mesh size.
    pub fn new((u_order, v_order): (usize, usize), (u_size, v_size): (usize, usize)) -> Self {
        ScatterOptions {
            u_order,
            v_order,
            u_size,
            v_size,
            ..Default::default()
        }
    }

    /// Use the given knot vectors.
    #[must_use]
    pub fn knots(mut self, u_knots: Vec<f64>, v_knots: Vec<f64>) -> Self {
        self.u_knots = Some(u_knots);
        self.v_knots = Some(v_knots);
        self
    }

    /// Set whether the sparse system keeps a presence bitmap.
    #[must_use]
    pub fn with_indicator(mut self, with_indicator: bool) -> Self {
        self.with_indicator = with_indicator;
        self
    }
}

/// The validated pieces shared by both solvers.
struct Setup {
    u_knots: Vec<f64>,
    v_knots: Vec<f64>,
    point_type: PointType,
}

impl Setup {
    fn new(samples: &[ScatterSample], opts: &ScatterOptions) -> Result<Self, FitError> {
        for (order, size) in [(opts.u_order, opts.u_size), (opts.v_order, opts.v_size)] {
            if order == 0 || size < order {
                return Err(FitError::InvalidOrderOrSize {
                    order,
                    length: size,
                });
            }
        }
        let first = samples.first().ok_or(FitError::InvalidOrderOrSize {
            order: opts.u_order,
            length: 0,
        })?;
        let point_type = first.value.point_type();
        if let Some(s) = samples.iter().find(|s| s.value.point_type() != point_type) {
            return Err(FitError::PointCountOrLengthMismatch {
                expected: point_type.channels(),
                found: s.value.point_type().channels(),
            });
        }
        let u_knots = opts
            .u_knots
            .clone()
            .unwrap_or_else(|| knots::uniform_open(opts.u_order, opts.u_size));
        let v_knots = opts
            .v_knots
            .clone()
            .unwrap_or_else(|| knots::uniform_open(opts.v_order, opts.v_size));
        knots::validate(&u_knots, opts.u_order, opts.u_size, false)?;
        knots::validate(&v_knots, opts.v_order, opts.v_size, false)?;
        Ok(Setup {
            u_knots,
            v_knots,
            point_type,
        })
    }

    /// `(column, value)` for every unknown touched by a sample, with the
    /// sample parameters clamped into the domain.
    fn row(&self, opts: &ScatterOptions, s: &ScatterSample) -> Vec<(usize, f64)> {
        let (u0, u1) = knots::domain(&self.u_knots, opts.u_order, opts.u_size, false);
        let (v0, v1) = knots::domain(&self.v_knots, opts.v_order, opts.v_size, false);
        let bu = basis::eval(&self.u_knots, opts.u_order, s.u.clamp(u0, u1));
        let bv = basis::eval(&self.v_knots, opts.v_order, s.v.clamp(v0, v1));
        let mut row = Vec::with_capacity(opts.u_order * opts.v_order);
        for (j, nv) in bv.iter() {
            for (i, nu) in bu.iter() {
                row.push((i + j * opts.u_size, nu * nv));
            }
        }
        row
    }

    fn surface(self, opts: &ScatterOptions, channels: Vec<Vec<f64>>) -> Result<BsplineSurface, FitError> {
        BsplineSurface::new(
            (opts.u_order, opts.v_order),
            (opts.u_size, opts.v_size),
            self.u_knots,
            self.v_knots,
            ControlPoints::from_channels(self.point_type, channels),
        )
    }
}

/// Fit a surface to scattered samples through the dense system.
///
/// The system has `max(size, samples)` rows, padded with zero rows, and is
/// solved in the least-squares sense.
///
/// # Errors
///
/// Returns [`FitError::NoSolution`] when the system is singular, which is
/// always the case with fewer samples than control points.
/// [`FitError::InvalidOrderOrSize`], [`FitError::InvalidKnotVector`] and
/// [`FitError::PointCountOrLengthMismatch`] report unusable input.
pub fn fit_scattered(
    samples: &[ScatterSample],
    opts: &ScatterOptions,
) -> Result<BsplineSurface, FitError> {
    let setup = Setup::new(samples, opts)?;
    let size = opts.u_size * opts.v_size;
    let rows = size.max(samples.len());
    let mut a = Matrix::zeros(rows, size);
    for (r, s) in samples.iter().enumerate() {
        for (c, value) in setup.row(opts, s) {
            a[(r, c)] += value;
        }
    }
    let svd = Svd::new(&a);
    if svd.min_ratio() < SVD_EPS {
        log::warn!(
            "scattered fit of {} samples to {size} control points has no solution",
            samples.len()
        );
        return Err(FitError::NoSolution);
    }
    let channels = (0..setup.point_type.channels())
        .map(|k| {
            let mut b = vec![0.0; rows];
            for (bi, s) in b.iter_mut().zip(samples) {
                *bi = s.value.channel(k);
            }
            svd.solve_least_squares(&b)
        })
        .collect();
    setup.surface(opts, channels)
}

/// Fit a surface to scattered samples through sparse normal equations.
///
/// Returns the surface and the condition number of `A^T A`.
///
/// # Errors
///
/// As for [`fit_scattered`].
pub fn fit_scattered_normal(
    samples: &[ScatterSample],
    opts: &ScatterOptions,
) -> Result<(BsplineSurface, f64), FitError> {
    let setup = Setup::new(samples, opts)?;
    let size = opts.u_size * opts.v_size;
    let mut a = SparseMatrix::new(samples.len(), size, opts.with_indicator);
    for (r, s) in samples.iter().enumerate() {
        for (c, value) in setup.row(opts, s) {
            a.insert(r, c, value);
        }
    }
    let ata = a.transpose().mul_sparse_dense(&a);
    log::debug!(
        "normal equations of {} samples: {} nonzeros, {size}x{size}",
        samples.len(),
        a.nnz()
    );
    let svd = Svd::new(&ata);
    let condition = svd.condition();
    if svd.min_ratio() < SVD_EPS {
        log::warn!("normal equations are singular, condition {condition:e}");
        return Err(FitError::NoSolution);
    }
    let channels = (0..setup.point_type.channels())
        .map(|k| {
            let rhs: Vec<f64> = (0..size)
                .map(|c| a.col(c).map(|(r, v)| v * samples[r].value.channel(k)).sum())
                .collect();
            svd.solve_least_squares(&rhs)
        })
        .collect();
    Ok((setup.surface(opts, channels)?, condition))
}
