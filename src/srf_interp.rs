// Copyright 2026 the Knotfit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tensor product surface interpolation.
//!
//! A grid is interpolated in two passes of the curve engine: every row in
//! the U direction, then every column of the resulting control points in
//! the V direction.

use alloc::vec::Vec;

use crate::interp::interpolate_curve;
use crate::knots::{self, Parametrization};
use crate::{BsplineSurface, ControlPoints, CtlPt, FitError, Sample};

/// A rectangular grid of sample points.
///
/// Point `(i, j)`, the `i`th point of row `j`, is stored at `i + j * u_count`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Grid {
    u_count: usize,
    v_count: usize,
    points: Vec<CtlPt>,
}

impl Grid {
    /// A grid from points stored row by row.
    ///
    /// # Errors
    ///
    /// Returns [`FitError::PointCountOrLengthMismatch`] unless there are
    /// exactly `u_count * v_count` points.
    pub fn new(u_count: usize, v_count: usize, points: Vec<CtlPt>) -> Result<Self, FitError> {
        if points.len() != u_count * v_count {
            return Err(FitError::PointCountOrLengthMismatch {
                expected: u_count * v_count,
                found: points.len(),
            });
        }
        Ok(Grid {
            u_count,
            v_count,
            points,
        })
    }

    /// A grid from one vector per row.
    ///
    /// # Errors
    ///
    /// Returns [`FitError::PointCountOrLengthMismatch`] for ragged rows.
    pub fn from_rows(rows: Vec<Vec<CtlPt>>) -> Result<Self, FitError> {
        let u_count = rows.first().map_or(0, Vec::len);
        let v_count = rows.len();
        let mut points = Vec::with_capacity(u_count * v_count);
        for row in rows {
            if row.len() != u_count {
                return Err(FitError::PointCountOrLengthMismatch {
                    expected: u_count,
                    found: row.len(),
                });
            }
            points.extend(row);
        }
        Ok(Grid {
            u_count,
            v_count,
            points,
        })
    }

    /// Number of points in each row.
    #[inline]
    pub fn u_count(&self) -> usize {
        self.u_count
    }

    /// Number of rows.
    #[inline]
    pub fn v_count(&self) -> usize {
        self.v_count
    }

    /// Point `i` of row `j`.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> &CtlPt {
        &self.points[i + j * self.u_count]
    }

    /// Row `j`.
    pub fn row(&self, j: usize) -> &[CtlPt] {
        &self.points[j * self.u_count..(j + 1) * self.u_count]
    }

    /// Column `i`.
    pub fn column(&self, i: usize) -> impl Iterator<Item = &CtlPt> + '_ {
        self.points.iter().skip(i).step_by(self.u_count.max(1))
    }
}

/// Options for [`interpolate_surface_points`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SurfaceInterpOptions {
    /// Order in U.
    pub u_order: usize,
    /// Order in V.
    pub v_order: usize,
    /// Number of control points in U; the row length when `None`.
    pub u_size: Option<usize>,
    /// Number of control points in V; the number of rows when `None`.
    pub v_size: Option<usize>,
    /// How rows and columns are parametrized.
    pub param: Parametrization,
    /// U knots for [`Parametrization::Nodal`].
    pub u_knots: Option<Vec<f64>>,
    /// V knots for [`Parametrization::Nodal`].
    pub v_knots: Option<Vec<f64>>,
}

impl Default for SurfaceInterpOptions {
    fn default() -> Self {
        SurfaceInterpOptions {
            u_order: 4,
            v_order: 4,
            u_size: None,
            v_size: None,
            param: Parametrization::Uniform,
            u_knots: None,
            v_knots: None,
        }
    }
}

impl SurfaceInterpOptions {
    /// Options for the given orders, interpolating every grid point.
    pub fn new(u_order: usize, v_order: usize) -> Self {
        SurfaceInterpOptions {
            u_order,
            v_order,
            ..Default::default()
        }
    }

    /// Set the number of control points in each direction.
    #[must_use]
    pub fn sizes(mut self, u_size: usize, v_size: usize) -> Self {
        self.u_size = Some(u_size);
        self.v_size = Some(v_size);
        self
    }

    /// Set the parametrization.
    #[must_use]
    pub fn param(mut self, param: Parametrization) -> Self {
        self.param = param;
        self
    }

    /// Use the given knot vectors, with [`Parametrization::Nodal`].
    #[must_use]
    pub fn knots(mut self, u_knots: Vec<f64>, v_knots: Vec<f64>) -> Self {
        self.param = Parametrization::Nodal;
        self.u_knots = Some(u_knots);
        self.v_knots = Some(v_knots);
        self
    }
}

/// Interpolate a grid at known parameters.
///
/// `sizes` and `orders` are `(u, v)` pairs. Every row and every column must
/// have at least `max(order, size)` points in its direction.
///
/// # Errors
///
/// Returns [`FitError::InvalidOrderOrSize`] when the grid is too small,
/// [`FitError::PointCountOrLengthMismatch`] when a parameter vector does
/// not match the grid, and any error of a row or column interpolation.
pub fn interpolate_surface(
    grid: &Grid,
    u_params: &[f64],
    v_params: &[f64],
    u_knots: &[f64],
    v_knots: &[f64],
    sizes: (usize, usize),
    orders: (usize, usize),
) -> Result<BsplineSurface, FitError> {
    let (u_size, v_size) = sizes;
    let (u_order, v_order) = orders;
    for (count, order, size) in [
        (grid.u_count, u_order, u_size),
        (grid.v_count, v_order, v_size),
    ] {
        if order < 2 || count < order.max(size) {
            return Err(FitError::InvalidOrderOrSize {
                order,
                length: count,
            });
        }
    }
    for (count, params) in [(grid.u_count, u_params), (grid.v_count, v_params)] {
        if params.len() != count {
            return Err(FitError::PointCountOrLengthMismatch {
                expected: count,
                found: params.len(),
            });
        }
    }

    let rows = (0..grid.v_count)
        .map(|j| {
            let samples: Vec<Sample> = grid.row(j).iter().cloned().map(Sample::point).collect();
            interpolate_curve(&samples, u_params, u_knots, u_size, u_order, false)
        })
        .collect::<Result<Vec<_>, _>>()?;
    log::debug!("interpolated {} rows of {} points", rows.len(), grid.u_count);

    let pt = grid.points[0].point_type();
    let mut points = ControlPoints::new(pt, u_size * v_size);
    for i in 0..u_size {
        let samples: Vec<Sample> = rows.iter().map(|c| Sample::point(c.points().point(i))).collect();
        let column = interpolate_curve(&samples, v_params, v_knots, v_size, v_order, false)?;
        for (j, p) in column.points().iter().enumerate() {
            points.set_point(i + j * u_size, &p);
        }
    }
    BsplineSurface::new(orders, sizes, u_knots.to_vec(), v_knots.to_vec(), points)
}

/// Interpolate a grid, choosing parameters and knots.
///
/// The U parameters are the average of the parameters of every row, and
/// the V parameters the average over every column.
///
/// # Errors
///
/// As for [`interpolate_surface`]; [`Parametrization::Nodal`] without both
/// knot vectors is a [`FitError::InvalidKnotVector`].
pub fn interpolate_surface_points(
    grid: &Grid,
    opts: &SurfaceInterpOptions,
) -> Result<BsplineSurface, FitError> {
    let u_size = opts.u_size.unwrap_or(grid.u_count);
    let v_size = opts.v_size.unwrap_or(grid.v_count);
    let orders = (opts.u_order, opts.v_order);
    for (count, order, size) in [
        (grid.u_count, opts.u_order, u_size),
        (grid.v_count, opts.v_order, v_size),
    ] {
        if order < 2 || size < order || count < size {
            return Err(FitError::InvalidOrderOrSize {
                order,
                length: count,
            });
        }
    }

    let (u_params, u_knots, v_params, v_knots) = if opts.param == Parametrization::Nodal {
        let (u_params, u_knots) = nodal(grid.row(0), opts.u_order, u_size, opts.u_knots.as_deref())?;
        let column: Vec<CtlPt> = grid.column(0).cloned().collect();
        let (v_params, v_knots) = nodal(&column, opts.v_order, v_size, opts.v_knots.as_deref())?;
        (u_params, u_knots, v_params, v_knots)
    } else {
        let u_params = mean_params((0..grid.v_count).map(|j| grid.row(j).to_vec()), opts.param);
        let v_params = mean_params(
            (0..grid.u_count).map(|i| grid.column(i).cloned().collect()),
            opts.param,
        );
        let u_knots = knots::from_params(&u_params, opts.u_order, u_size, false);
        let v_knots = knots::from_params(&v_params, opts.v_order, v_size, false);
        (u_params, u_knots, v_params, v_knots)
    };
    interpolate_surface(
        grid,
        &u_params,
        &v_params,
        &u_knots,
        &v_knots,
        (u_size, v_size),
        orders,
    )
}

fn nodal(
    line: &[CtlPt],
    order: usize,
    size: usize,
    knots: Option<&[f64]>,
) -> Result<(Vec<f64>, Vec<f64>), FitError> {
    let samples: Vec<Sample> = line.iter().cloned().map(Sample::point).collect();
    knots::params_and_knots(&samples, order, size, Parametrization::Nodal, false, knots)
}

/// The average of the parameter vectors of several point lines.
fn mean_params(lines: impl Iterator<Item = Vec<CtlPt>>, param: Parametrization) -> Vec<f64> {
    let mut sum: Vec<f64> = Vec::new();
    let mut count = 0;
    for line in lines {
        let p = knots::params(&line, param, false);
        if sum.is_empty() {
            sum = p;
        } else {
            for (s, t) in sum.iter_mut().zip(p) {
                *s += t;
            }
        }
        count += 1;
    }
    for s in &mut sum {
        *s /= count as f64;
    }
    sum
}
