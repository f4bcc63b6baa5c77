// Copyright 2026 the Knotfit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Least-squares refitting of existing curves and surfaces.
//!
//! The source is sampled at `order + size * ratio` uniformly spaced
//! parameters per direction, the samples are approximated with the
//! requested order and size, and the result is mapped back onto the domain
//! of the source.
//!
//! The reported error is exact for polynomial sources: it is the largest
//! coordinate of the bounding box of the difference, which bounds the
//! deviation everywhere by the convex hull property. The difference of
//! rational curves is not a B-spline, so for rational sources the error is
//! the largest deviation over a dense sample instead.

use alloc::vec::Vec;

use crate::interp::{interpolate_points, InterpOptions};
use crate::knots::Parametrization;
use crate::srf_interp::{interpolate_surface_points, Grid, SurfaceInterpOptions};
use crate::{BsplineCurve, BsplineSurface, CtlPt, FitError, Sample};

#[cfg(not(feature = "std"))]
use crate::common::FloatFuncs;

/// Options for [`fit_curve`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FitOptions {
    /// Order of the fitted curve.
    pub order: usize,
    /// Number of control points of the fitted curve.
    pub length: usize,
    /// Samples taken per control point.
    pub ratio: usize,
    /// How the samples are parametrized.
    pub param: Parametrization,
    /// Fit a periodic curve.
    pub periodic: bool,
    /// Copy the end points of the source into the result.
    pub preserve_ends: bool,
    /// Measure the fitting error.
    pub eval_error: bool,
}

impl Default for FitOptions {
    fn default() -> Self {
        FitOptions {
            order: 4,
            length: 8,
            ratio: 2,
            param: Parametrization::Uniform,
            periodic: false,
            preserve_ends: false,
            eval_error: true,
        }
    }
}

impl FitOptions {
    /// Fit with the given order and number of control points.
    pub fn new(order: usize, length: usize) -> Self {
        FitOptions {
            order,
            length,
            ..Default::default()
        }
    }

    /// Set the number of samples per control point.
    #[must_use]
    pub fn ratio(mut self, ratio: usize) -> Self {
        self.ratio = ratio;
        self
    }

    /// Set the parametrization.
    #[must_use]
    pub fn param(mut self, param: Parametrization) -> Self {
        self.param = param;
        self
    }

    /// Set whether the fitted curve is periodic.
    #[must_use]
    pub fn periodic(mut self, periodic: bool) -> Self {
        self.periodic = periodic;
        self
    }

    /// Set whether the end points of the source are kept exactly.
    #[must_use]
    pub fn preserve_ends(mut self, preserve_ends: bool) -> Self {
        self.preserve_ends = preserve_ends;
        self
    }

    /// Set whether the fitting error is measured.
    #[must_use]
    pub fn eval_error(mut self, eval_error: bool) -> Self {
        self.eval_error = eval_error;
        self
    }
}

/// Options for [`fit_surface`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SurfaceFitOptions {
    /// Orders of the fitted surface, `(u, v)`.
    pub orders: (usize, usize),
    /// Control mesh size of the fitted surface, `(u, v)`.
    pub sizes: (usize, usize),
    /// Samples taken per control point in each direction.
    pub ratio: usize,
    /// How the sample grid is parametrized.
    pub param: Parametrization,
    /// Measure the fitting error.
    pub eval_error: bool,
}

impl Default for SurfaceFitOptions {
    fn default() -> Self {
        SurfaceFitOptions {
            orders: (4, 4),
            sizes: (8, 8),
            ratio: 2,
            param: Parametrization::Uniform,
            eval_error: true,
        }
    }
}

impl SurfaceFitOptions {
    /// Fit with the given orders and mesh size.
    pub fn new(orders: (usize, usize), sizes: (usize, usize)) -> Self {
        SurfaceFitOptions {
            orders,
            sizes,
            ..Default::default()
        }
    }

    /// Set the number of samples per control point.
    #[must_use]
    pub fn ratio(mut self, ratio: usize) -> Self {
        self.ratio = ratio;
        self
    }

    /// Set the parametrization.
    #[must_use]
    pub fn param(mut self, param: Parametrization) -> Self {
        self.param = param;
        self
    }
}

/// A fitted curve or surface with its error.
#[derive(Clone, Debug, PartialEq)]
pub struct FitResult<T> {
    /// The fit.
    pub fit: T,
    /// The maximum deviation from the source, when requested.
    pub error: Option<f64>,
}

/// `count` parameters spread uniformly over `[t0, t1]`.
///
/// A closed sequence leaves out `t1`, which coincides with `t0`.
fn sample_params((t0, t1): (f64, f64), count: usize, closed: bool) -> Vec<f64> {
    let steps = if closed { count } else { count - 1 };
    (0..count)
        .map(|i| t0 + (t1 - t0) * i as f64 / steps as f64)
        .collect()
}

/// The largest absolute coordinate of a bounding box.
fn bbox_norm((lo, hi): (CtlPt, CtlPt)) -> f64 {
    lo.coords
        .iter()
        .chain(&hi.coords)
        .fold(0.0_f64, |m, &c| m.max(c.abs()))
}

/// Approximate a curve by one of a different order or size.
///
/// # Errors
///
/// Returns [`FitError::InvalidOrderOrSize`] for an unusable order, length
/// or ratio, and any error of the interpolation itself.
pub fn fit_curve(
    curve: &BsplineCurve,
    opts: &FitOptions,
) -> Result<FitResult<BsplineCurve>, FitError> {
    if opts.order < 2 || opts.length < opts.order || opts.ratio == 0 {
        return Err(FitError::InvalidOrderOrSize {
            order: opts.order,
            length: opts.length,
        });
    }
    let domain = curve.domain();
    let count = opts.order + opts.length * opts.ratio;
    let samples: Vec<Sample> = sample_params(domain, count, opts.periodic)
        .into_iter()
        .map(|t| Sample::point(curve.eval(t)))
        .collect();
    let interp = InterpOptions {
        order: opts.order,
        length: Some(opts.length),
        param: opts.param,
        periodic: opts.periodic,
        knots: None,
    };
    let mut fit = interpolate_points(&samples, &interp)?;
    fit.set_domain(domain.0, domain.1);
    if opts.preserve_ends && !opts.periodic {
        let last = fit.length() - 1;
        fit.points_mut().set_point(0, &curve.eval(domain.0));
        fit.points_mut().set_point(last, &curve.eval(domain.1));
    }

    let error = if !opts.eval_error {
        None
    } else if curve.point_type().is_rational() {
        let dense = sample_params(domain, 4 * count, false);
        Some(dense.into_iter().fold(0.0_f64, |m, t| {
            m.max(fit.eval_euclidean(t).distance(&curve.eval_euclidean(t)))
        }))
    } else {
        Some(bbox_norm(fit.difference(curve)?.bbox()))
    };
    log::debug!(
        "refit {} control points to {} from {count} samples, error {error:?}",
        curve.length(),
        opts.length
    );
    Ok(FitResult { fit, error })
}

/// Approximate a surface by one of a different order or size.
///
/// # Errors
///
/// Returns [`FitError::InvalidOrderOrSize`] for unusable orders, sizes or
/// ratio, and any error of the interpolation itself.
pub fn fit_surface(
    surface: &BsplineSurface,
    opts: &SurfaceFitOptions,
) -> Result<FitResult<BsplineSurface>, FitError> {
    for (order, size) in [
        (opts.orders.0, opts.sizes.0),
        (opts.orders.1, opts.sizes.1),
    ] {
        if order < 2 || size < order || opts.ratio == 0 {
            return Err(FitError::InvalidOrderOrSize {
                order,
                length: size,
            });
        }
    }
    let (u_domain, v_domain) = surface.domain();
    let u_count = opts.orders.0 + opts.sizes.0 * opts.ratio;
    let v_count = opts.orders.1 + opts.sizes.1 * opts.ratio;
    let us = sample_params(u_domain, u_count, false);
    let vs = sample_params(v_domain, v_count, false);
    let points = vs
        .iter()
        .flat_map(|&v| us.iter().map(move |&u| (u, v)))
        .map(|(u, v)| surface.eval(u, v))
        .collect();
    let grid = Grid::new(u_count, v_count, points)?;
    let interp = SurfaceInterpOptions::new(opts.orders.0, opts.orders.1)
        .sizes(opts.sizes.0, opts.sizes.1)
        .param(opts.param);
    let mut fit = interpolate_surface_points(&grid, &interp)?;
    fit.set_domain(u_domain, v_domain);

    let error = if !opts.eval_error {
        None
    } else if surface.point_type().is_rational() {
        let us = sample_params(u_domain, 4 * u_count, false);
        let vs = sample_params(v_domain, 4 * v_count, false);
        let mut err: f64 = 0.0;
        for &v in &vs {
            for &u in &us {
                err = err.max(fit.eval_euclidean(u, v).distance(&surface.eval_euclidean(u, v)));
            }
        }
        Some(err)
    } else {
        Some(bbox_norm(fit.difference(surface)?.bbox()))
    };
    Ok(FitResult { fit, error })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ControlPoints, PointType};
    use approx::assert_abs_diff_eq;

    fn points(p: &[(f64, f64)]) -> ControlPoints {
        let pts: Vec<CtlPt> = p.iter().map(|&p| CtlPt::from(p)).collect();
        ControlPoints::from_points(&pts).unwrap()
    }

    #[test]
    fn elevated_quadratic_round_trip() {
        let quad = BsplineCurve::bezier(points(&[(0.0, 0.0), (1.0, 2.0), (3.0, 0.5)]));
        let r = fit_curve(&quad, &FitOptions::new(4, 4)).unwrap();
        assert_eq!(r.fit.order(), 4);
        assert!(r.error.unwrap() < 1e-10);
        let elevated = quad.elevate_bezier_form(4);
        for i in 0..4 {
            assert!(r.fit.points().point(i).distance(&elevated.points().point(i)) < 1e-10);
        }
    }

    #[test]
    fn uniform_cubic_round_trip() {
        let src = points(&[
            (0.0, 0.0),
            (1.0, 1.0),
            (2.0, -1.0),
            (3.0, 2.0),
            (4.0, 0.0),
            (5.0, 1.0),
        ]);
        let mut curve = BsplineCurve::uniform(4, src, false).unwrap();
        curve.set_domain(2.0, 5.0);
        let r = fit_curve(&curve, &FitOptions::new(4, 6)).unwrap();
        assert_eq!(r.fit.domain(), (2.0, 5.0));
        assert!(r.error.unwrap() < 1e-9);
        assert!(r.fit.eval(3.3).distance(&curve.eval(3.3)) < 1e-9);
    }

    #[test]
    fn reduction_error_bounds_deviation() {
        let src = points(&[
            (0.0, 0.0),
            (1.0, 2.0),
            (2.0, -1.0),
            (3.0, 2.0),
            (4.0, -1.0),
            (5.0, 2.0),
            (6.0, 0.0),
            (7.0, 1.0),
        ]);
        let curve = BsplineCurve::uniform(4, src, false).unwrap();
        let r = fit_curve(&curve, &FitOptions::new(4, 5).preserve_ends(true)).unwrap();
        let err = r.error.unwrap();
        assert!(err > 1e-3);
        for i in 0..=40 {
            let t = i as f64 / 40.0;
            let d = r.fit.eval(t).to_euclidean();
            let s = curve.eval(t);
            for k in 0..2 {
                assert!((d.coord(k) - s.coord(k)).abs() <= err + 1e-12);
            }
        }
        assert!(r.fit.eval(0.0).distance(&curve.eval(0.0)) < 1e-12);
        assert!(r.fit.eval(1.0).distance(&curve.eval(1.0)) < 1e-12);

        let quiet = fit_curve(&curve, &FitOptions::new(4, 5).eval_error(false)).unwrap();
        assert_eq!(quiet.error, None);
    }

    #[test]
    fn rational_round_trip() {
        let h = core::f64::consts::FRAC_1_SQRT_2;
        let mut cp = ControlPoints::new(PointType::P2, 0);
        cp.push(&CtlPt::rational(1.0, &[1.0, 0.0]));
        cp.push(&CtlPt::rational(h, &[h, h]));
        cp.push(&CtlPt::rational(1.0, &[0.0, 1.0]));
        let arc = BsplineCurve::bezier(cp);
        let r = fit_curve(&arc, &FitOptions::new(3, 3)).unwrap();
        assert!(r.fit.point_type().is_rational());
        assert!(r.error.unwrap() < 1e-9);
        let p = r.fit.eval_euclidean(0.3);
        assert_abs_diff_eq!(p.coord(0).hypot(p.coord(1)), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn periodic_round_trip() {
        let src = points(&[
            (1.0, 0.0),
            (0.7, 0.7),
            (0.0, 1.0),
            (-0.7, 0.7),
            (-1.0, 0.0),
            (-0.7, -0.7),
            (0.0, -1.0),
            (0.7, -0.7),
        ]);
        let curve = BsplineCurve::uniform(4, src, true).unwrap();
        let r = fit_curve(&curve, &FitOptions::new(4, 8).periodic(true)).unwrap();
        assert!(r.fit.is_periodic());
        assert!(r.error.unwrap() < 1e-9);
    }

    #[test]
    fn invalid_options() {
        let quad = BsplineCurve::bezier(points(&[(0.0, 0.0), (1.0, 2.0), (3.0, 0.5)]));
        assert_eq!(
            fit_curve(&quad, &FitOptions::new(4, 3)),
            Err(FitError::InvalidOrderOrSize {
                order: 4,
                length: 3
            })
        );
        assert!(fit_curve(&quad, &FitOptions::new(3, 3).ratio(0)).is_err());
    }

    #[test]
    fn surface_round_trip() {
        let mut pts = ControlPoints::new(PointType::E3, 0);
        for j in 0..3 {
            for i in 0..4 {
                let (x, y) = (i as f64, j as f64);
                pts.push(&CtlPt::from((x, y, (x - 1.5) * (y - 1.0) + 0.3 * (i % 2) as f64)));
            }
        }
        let mut s = BsplineSurface::uniform((3, 2), (4, 3), pts).unwrap();
        s.set_domain((0.0, 3.0), (-1.0, 1.0));
        let r = fit_surface(&s, &SurfaceFitOptions::new((3, 2), (4, 3))).unwrap();
        assert_eq!(r.fit.domain(), ((0.0, 3.0), (-1.0, 1.0)));
        assert!(r.error.unwrap() < 1e-9);
        for i in 0..4 {
            for j in 0..3 {
                assert!(r.fit.point(i, j).distance(&s.point(i, j)) < 1e-9);
            }
        }

        let coarse = fit_surface(&s, &SurfaceFitOptions::new((2, 2), (2, 2)).ratio(3)).unwrap();
        assert_eq!(coarse.fit.lengths(), (2, 2));
        assert!(coarse.error.unwrap() > 1e-3);
    }
}
