// Copyright 2026 the Knotfit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Curve interpolation and least-squares approximation.
//!
//! Each sample contributes one row to a linear system whose unknowns are the
//! control point coordinates: basis values for a point, basis derivatives
//! for a derivative, a single one for a pinned control point. When there
//! are fewer rows than control points the minimum-norm solution is taken,
//! otherwise the least-squares one.
//!
//! Without symmetry or area constraints every coordinate shares the system,
//! which is factored once. Those constraints add rows that differ per
//! coordinate, so each coordinate is then solved on its own.

use alloc::vec;
use alloc::vec::Vec;

use crate::basis;
use crate::common::{gauss_legendre_for_degree, wrap_index, PARAM_EPS};
use crate::knots::{self, Parametrization};
use crate::linalg::{Factorization, Matrix};
use crate::{
    AreaAxis, AreaConstraint, AreaTarget, BsplineCurve, ControlPoints, CtlPt, FitError, PointType,
    Sample, SampleConstraint, SymmetryConstraint,
};

/// Options for [`interpolate_points`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InterpOptions {
    /// Order of the resulting curve.
    pub order: usize,
    /// Number of control points; the number of samples when `None`.
    pub length: Option<usize>,
    /// How samples are parametrized.
    pub param: Parametrization,
    /// Build a closed, periodic curve.
    pub periodic: bool,
    /// The knot vector for [`Parametrization::Nodal`].
    pub knots: Option<Vec<f64>>,
}

impl Default for InterpOptions {
    fn default() -> Self {
        InterpOptions {
            order: 4,
            length: None,
            param: Parametrization::Uniform,
            periodic: false,
            knots: None,
        }
    }
}

impl InterpOptions {
    /// Options for a curve of the given order and length.
    pub fn new(order: usize, length: usize) -> Self {
        InterpOptions {
            order,
            length: Some(length),
            ..Default::default()
        }
    }

    /// Set the parametrization.
    #[must_use]
    pub fn param(mut self, param: Parametrization) -> Self {
        self.param = param;
        self
    }

    /// Set whether the curve is periodic.
    #[must_use]
    pub fn periodic(mut self, periodic: bool) -> Self {
        self.periodic = periodic;
        self
    }

    /// Use the given knot vector, with [`Parametrization::Nodal`].
    #[must_use]
    pub fn knots(mut self, knots: Vec<f64>) -> Self {
        self.param = Parametrization::Nodal;
        self.knots = Some(knots);
        self
    }
}

/// Interpolate or approximate samples at known parameters.
///
/// `params` holds one parameter per sample and `knots` must be a valid knot
/// vector for `order` and `length`. The result has exactly `length`
/// control points. With as many rows as control points it interpolates the
/// samples, with fewer it is the interpolant of least control point norm,
/// and with more it is the least-squares approximation.
///
/// # Errors
///
/// * [`FitError::InvalidOrderOrSize`] for `order < 2`, `length < order`
///   or no samples.
/// * [`FitError::PointCountOrLengthMismatch`] when `params` and `samples`
///   differ in length, the samples mix point types, or an area constraint
///   is placed on one dimensional points.
/// * [`FitError::InvalidKnotVector`] for a bad knot vector.
/// * [`FitError::UnsupportedDerivativeOrder`] for derivatives other than the first.
/// * [`FitError::RationalNotSupported`] for derivative or area constraints on
///   rational samples.
/// * [`FitError::SingularSystem`] when the system is numerically singular.
pub fn interpolate_curve(
    samples: &[Sample],
    params: &[f64],
    knots: &[f64],
    length: usize,
    order: usize,
    periodic: bool,
) -> Result<BsplineCurve, FitError> {
    if order < 2 || length < order {
        return Err(FitError::InvalidOrderOrSize { order, length });
    }
    let Some(first) = samples.first() else {
        return Err(FitError::InvalidOrderOrSize { order, length: 0 });
    };
    if params.len() != samples.len() {
        return Err(FitError::PointCountOrLengthMismatch {
            expected: samples.len(),
            found: params.len(),
        });
    }
    knots::validate(knots, order, length, periodic)?;

    let pt = first.pt.point_type();
    let mut symmetry = None;
    let mut area = None;
    for s in samples {
        if s.pt.point_type() != pt {
            return Err(FitError::PointCountOrLengthMismatch {
                expected: pt.channels(),
                found: s.pt.point_type().channels(),
            });
        }
        match &s.constraint {
            SampleConstraint::Derivative(d) if *d != 1 => {
                return Err(FitError::UnsupportedDerivativeOrder(*d));
            }
            SampleConstraint::Derivative(_) | SampleConstraint::Area(_) if pt.is_rational() => {
                return Err(FitError::RationalNotSupported);
            }
            SampleConstraint::FixedIndex(i)
                if !periodic && (*i >= length as isize || *i < -(length as isize)) =>
            {
                return Err(FitError::InvalidOrderOrSize { order, length });
            }
            SampleConstraint::Symmetry(sym) => {
                symmetry.get_or_insert(sym);
            }
            SampleConstraint::Area(a) => {
                area.get_or_insert(*a);
            }
            _ => {}
        }
    }
    if area.is_some() && pt.dim() < 2 {
        return Err(FitError::PointCountOrLengthMismatch {
            expected: 2,
            found: pt.dim(),
        });
    }

    let system = System {
        samples,
        params,
        knots,
        order,
        length,
        periodic,
        domain: knots::domain(knots, order, length, periodic),
    };
    let points = if symmetry.is_none() && area.is_none() {
        system.solve_shared(pt)?
    } else {
        system.solve_per_channel(pt, symmetry, area)?
    };
    Ok(BsplineCurve::from_parts(order, knots.to_vec(), points, periodic))
}

/// Interpolate samples, choosing parameters and knots.
///
/// # Errors
///
/// As for [`knots::params_and_knots`] and [`interpolate_curve`].
pub fn interpolate_points(samples: &[Sample], opts: &InterpOptions) -> Result<BsplineCurve, FitError> {
    let length = opts.length.unwrap_or(samples.len());
    let (params, knots) = knots::params_and_knots(
        samples,
        opts.order,
        length,
        opts.param,
        opts.periodic,
        opts.knots.as_deref(),
    )?;
    interpolate_curve(samples, &params, &knots, length, opts.order, opts.periodic)
}

/// Interpolate plain points.
///
/// # Errors
///
/// As for [`interpolate_points`].
pub fn interpolate_positions(points: &[CtlPt], opts: &InterpOptions) -> Result<BsplineCurve, FitError> {
    let samples: Vec<Sample> = points.iter().cloned().map(Sample::point).collect();
    interpolate_points(&samples, opts)
}

/// The signed area functional `\int x(t) y'(t) dt` of a planar curve.
///
/// For a closed curve this is the enclosed area, positive when the curve
/// runs counterclockwise.
///
/// # Errors
///
/// Returns [`FitError::RationalNotSupported`] for rational curves and
/// [`FitError::PointCountOrLengthMismatch`] for one dimensional ones.
pub fn curve_area(curve: &BsplineCurve) -> Result<f64, FitError> {
    let pt = curve.point_type();
    if pt.is_rational() {
        return Err(FitError::RationalNotSupported);
    }
    if pt.dim() < 2 {
        return Err(FitError::PointCountOrLengthMismatch {
            expected: 2,
            found: pt.dim(),
        });
    }
    let m = area_matrix(curve.knots(), curve.order(), curve.length(), curve.is_periodic());
    let (x, y) = (curve.points().channel(0), curve.points().channel(1));
    Ok(crate::common::dot(x, &m.mul_vec(y)))
}

/// The matrix `M_ij = \int N_i(t) N'_j(t) dt` over the domain.
fn area_matrix(knots: &[f64], order: usize, length: usize, periodic: bool) -> Matrix {
    let (t0, t1) = knots::domain(knots, order, length, periodic);
    let count = knots.len() - order;
    let rule = gauss_legendre_for_degree(2 * order - 3);
    let mut m = Matrix::zeros(length, length);
    for s in order - 1..count {
        let (a, b) = (knots[s], knots[s + 1]);
        if b <= a || a < t0 - PARAM_EPS || b > t1 + PARAM_EPS {
            continue;
        }
        let (mid, half) = (0.5 * (a + b), 0.5 * (b - a));
        for &(w, x) in rule {
            let t = mid + half * x;
            let n = basis::eval(knots, order, t);
            let d = basis::eval_deriv(knots, order, t);
            for (i, ni) in n.iter() {
                for (j, dj) in d.iter() {
                    m[(i % length, j % length)] += w * half * ni * dj;
                }
            }
        }
    }
    m
}

/// `\sum 0.5 (x_i + x_{i+1}) (y_{i+1} - y_i)` over the positional samples.
fn polygon_area(samples: &[Sample], closed: bool) -> f64 {
    let pts: Vec<CtlPt> = samples
        .iter()
        .filter(|s| s.is_positional())
        .map(|s| s.pt.to_euclidean())
        .collect();
    let n = pts.len();
    let segments = if closed { n } else { n.saturating_sub(1) };
    (0..segments)
        .map(|i| {
            let (p, q) = (&pts[i], &pts[(i + 1) % n]);
            0.5 * (p.coord(0) + q.coord(0)) * (q.coord(1) - p.coord(1))
        })
        .sum()
}

struct System<'a> {
    samples: &'a [Sample],
    params: &'a [f64],
    knots: &'a [f64],
    order: usize,
    length: usize,
    periodic: bool,
    domain: (f64, f64),
}

impl System<'_> {
    /// The parameter of sample `idx`, clamped into the domain.
    fn param(&self, idx: usize) -> f64 {
        self.params[idx].clamp(self.domain.0, self.domain.1)
    }

    fn column(&self, i: usize) -> usize {
        if self.periodic {
            i % self.length
        } else {
            i
        }
    }

    fn sample_row(&self, idx: usize) -> Vec<f64> {
        let mut row = vec![0.0; self.length];
        let t = self.param(idx);
        match self.samples[idx].constraint {
            SampleConstraint::Derivative(_) => {
                for (i, v) in basis::eval_deriv(self.knots, self.order, t).iter() {
                    row[self.column(i)] += v;
                }
            }
            SampleConstraint::FixedIndex(i) => {
                row[wrap_index(i, self.length, true)] = 1.0;
            }
            _ => {
                for (i, v) in basis::eval(self.knots, self.order, t).iter() {
                    row[self.column(i)] += v;
                }
            }
        }
        row
    }

    /// Rows for every sample, skipping positional samples past `limit`
    /// other than `keep`.
    fn sample_rows(&self, limit: Option<f64>, keep: Option<usize>) -> (Vec<Vec<f64>>, Vec<usize>) {
        let mut rows = Vec::with_capacity(self.samples.len());
        let mut used = Vec::with_capacity(self.samples.len());
        for (idx, s) in self.samples.iter().enumerate() {
            if let Some(limit) = limit {
                if s.is_positional() && self.param(idx) > limit + PARAM_EPS && keep != Some(idx) {
                    continue;
                }
            }
            rows.push(self.sample_row(idx));
            used.push(idx);
        }
        log::trace!("{} of {} samples give rows", rows.len(), self.samples.len());
        (rows, used)
    }

    fn factor(&self, rows: &[Vec<f64>]) -> Result<Factorization, FitError> {
        let data = rows.iter().flatten().copied().collect();
        let a = Matrix::from_vec(rows.len(), self.length, data);
        Factorization::new(&a).ok_or_else(|| {
            log::warn!(
                "singular {}x{} interpolation system of order {}",
                rows.len(),
                self.length,
                self.order
            );
            FitError::SingularSystem
        })
    }

    /// One factorization shared by every channel.
    fn solve_shared(&self, pt: PointType) -> Result<ControlPoints, FitError> {
        let (rows, used) = self.sample_rows(None, None);
        let f = self.factor(&rows)?;
        let channels = (0..pt.channels())
            .map(|k| {
                let rhs: Vec<f64> = used.iter().map(|&i| self.samples[i].pt.channel(k)).collect();
                f.solve(&rhs)
            })
            .collect();
        Ok(ControlPoints::from_channels(pt, channels))
    }

    /// A separate system per channel, with symmetry and area rows.
    fn solve_per_channel(
        &self,
        pt: PointType,
        symmetry: Option<&SymmetryConstraint>,
        area: Option<AreaConstraint>,
    ) -> Result<ControlPoints, FitError> {
        let limit = symmetry.map(|sym| {
            let (t0, t1) = self.domain;
            if sym.circular {
                t0 + 0.25 * (t1 - t0)
            } else {
                0.5 * (t0 + t1)
            }
        });
        // An even number of mirrored points has no middle point, so without
        // a state the reflection constant is fixed by the last sample.
        let keep = symmetry
            .filter(|sym| sym.state.is_none() && !sym.circular && self.length % 2 == 0)
            .and_then(|_| self.samples.iter().rposition(Sample::is_positional));
        let (base, used) = self.sample_rows(limit, keep);

        // The area axis is solved after the axis it is paired with.
        let (x, y) = (pt.axis_channel(0), pt.axis_channel(1));
        let area = area.map(|a| match a.axis {
            AreaAxis::X => (a, x, y),
            AreaAxis::Y => (a, y, x),
        });
        let mut sequence: Vec<usize> = (0..pt.channels()).collect();
        if let Some((_, target, _)) = area {
            sequence.retain(|&k| k != target);
            sequence.push(target);
        }

        let mut channels: Vec<Vec<f64>> = vec![Vec::new(); pt.channels()];
        for k in sequence {
            let mut rows = base.clone();
            let mut rhs: Vec<f64> = used.iter().map(|&i| self.samples[i].pt.channel(k)).collect();
            if let Some(sym) = symmetry {
                self.symmetry_rows(sym, pt, k, &mut rows, &mut rhs)?;
            }
            if let Some((a, target, driver)) = area {
                if k == target {
                    let m = area_matrix(self.knots, self.order, self.length, self.periodic);
                    let other = &channels[driver];
                    rows.push(match a.axis {
                        AreaAxis::X => m.mul_vec(other),
                        AreaAxis::Y => m.transpose_mul_vec(other),
                    });
                    rhs.push(match a.target {
                        AreaTarget::Value(v) => v,
                        AreaTarget::SamplePolygon => polygon_area(self.samples, self.periodic),
                    });
                }
            }
            log::debug!("channel {k}: {} rows, {} unknowns", rows.len(), self.length);
            channels[k] = self.factor(&rows)?.solve(&rhs);
        }
        Ok(ControlPoints::from_channels(pt, channels))
    }

    fn symmetry_rows(
        &self,
        sym: &SymmetryConstraint,
        pt: PointType,
        k: usize,
        rows: &mut Vec<Vec<f64>>,
        rhs: &mut Vec<f64>,
    ) -> Result<(), FitError> {
        let reflect = match (pt.is_rational(), k) {
            (true, 0) => false,
            (true, k) => sym.axes.contains(k - 1),
            (false, k) => sym.axes.contains(k),
        };
        let state = match &sym.state {
            Some(s) if s.len() != self.length || s.point_type() != pt => {
                return Err(FitError::PointCountOrLengthMismatch {
                    expected: self.length,
                    found: s.len(),
                });
            }
            Some(s) => Some(s.channel(k)),
            None => None,
        };
        self.mirror_rows(self.length, reflect, state, rows, rhs);
        if sym.circular {
            self.mirror_rows(self.length.div_ceil(2), reflect, state, rows, rhs);
        }
        Ok(())
    }

    /// Mirror relations between `P_i` and `P_{h-1-i}` on the first `h` points.
    fn mirror_rows(
        &self,
        h: usize,
        reflect: bool,
        state: Option<&[f64]>,
        rows: &mut Vec<Vec<f64>>,
        rhs: &mut Vec<f64>,
    ) {
        if h < 2 {
            return;
        }
        let last = h - 1;
        // Reflection rows are P_i + P_j = C, with C either fixed by the
        // state or tied to the end points as P_0 + P_last.
        let reflection = |row: &mut Vec<f64>, rhs: &mut Vec<f64>| match state {
            Some(s) => rhs.push(s[0] + s[last]),
            None => {
                row[0] -= 1.0;
                row[last] -= 1.0;
                rhs.push(0.0);
            }
        };
        for i in 0..h / 2 {
            let j = last - i;
            let mut row = vec![0.0; self.length];
            if reflect {
                if i == 0 && state.is_none() {
                    continue;
                }
                row[i] += 1.0;
                row[j] += 1.0;
                reflection(&mut row, rhs);
            } else {
                row[i] = 1.0;
                row[j] = -1.0;
                rhs.push(0.0);
            }
            rows.push(row);
        }
        if reflect && h % 2 == 1 {
            let mut row = vec![0.0; self.length];
            row[h / 2] = 2.0;
            reflection(&mut row, rhs);
            rows.push(row);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SymmetryAxes;
    use approx::assert_abs_diff_eq;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn pts2(p: &[(f64, f64)]) -> Vec<CtlPt> {
        p.iter().map(|&p| CtlPt::from(p)).collect()
    }

    fn residual(curve: &BsplineCurve, pts: &[CtlPt], params: &[f64]) -> f64 {
        pts.iter()
            .zip(params)
            .map(|(p, &t)| {
                let d = p.distance(&curve.eval(t));
                d * d
            })
            .sum()
    }

    const SQUARE: [(f64, f64); 5] = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.5)];

    #[test]
    fn exact_interpolation() {
        let pts = pts2(&SQUARE);
        let c = interpolate_positions(&pts, &InterpOptions::new(4, 5)).unwrap();
        assert_eq!(c.length(), 5);
        let expected = [0.0, 0.0, 0.0, 0.0, 0.5, 1.0, 1.0, 1.0, 1.0];
        for (k, e) in c.knots().iter().zip(expected) {
            assert_abs_diff_eq!(*k, e, epsilon = 1e-14);
        }
        for (i, p) in pts.iter().enumerate() {
            assert!(c.eval(i as f64 / 4.0).distance(p) < 1e-10);
        }
        // A clamped curve starts and ends on its end control points.
        assert!(c.points().point(0).distance(&pts[0]) < 1e-10);
        assert!(c.points().point(4).distance(&pts[4]) < 1e-10);
    }

    #[test]
    fn exact_interpolation_any_order() {
        let pts: Vec<CtlPt> = (0..9)
            .map(|i| {
                let x = i as f64 * 0.7;
                CtlPt::new(&[x, x.sin(), 0.3 * x * x])
            })
            .collect();
        for order in 2..=6 {
            for param in [
                Parametrization::Uniform,
                Parametrization::ChordLength,
                Parametrization::Centripetal,
                Parametrization::NielsonFoley,
            ] {
                let samples: Vec<Sample> = pts.iter().cloned().map(Sample::point).collect();
                let (params, knots) =
                    knots::params_and_knots(&samples, order, 9, param, false, None).unwrap();
                let c = interpolate_curve(&samples, &params, &knots, 9, order, false).unwrap();
                for (p, &t) in pts.iter().zip(&params) {
                    assert!(c.eval(t).distance(p) < 1e-8, "order {order} {param:?}");
                }
            }
        }
    }

    #[test]
    fn least_squares_is_optimal() {
        let pts = pts2(&SQUARE);
        let samples: Vec<Sample> = pts.iter().cloned().map(Sample::point).collect();
        let (params, knots) =
            knots::params_and_knots(&samples, 3, 3, Parametrization::Uniform, false, None).unwrap();
        let c = interpolate_curve(&samples, &params, &knots, 3, 3, false).unwrap();
        let base = residual(&c, &pts, &params);
        assert!(base.is_finite() && base > 0.0);

        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..50 {
            let mut p = c.clone();
            for k in 0..2 {
                for x in p.points_mut().channel_mut(k) {
                    *x += rng.random_range(-1e-3..1e-3);
                }
            }
            assert!(residual(&p, &pts, &params) >= base - 1e-15);
        }
    }

    #[test]
    fn minimum_norm_when_underdetermined() {
        let pts = pts2(&[(0.0, 0.0), (1.0, 2.0), (3.0, 1.0), (4.0, 3.0)]);
        let samples: Vec<Sample> = pts.iter().cloned().map(Sample::point).collect();
        let opts = InterpOptions::new(4, 7);
        let c = interpolate_points(&samples, &opts).unwrap();
        assert_eq!(c.length(), 7);
        let (params, knots) =
            knots::params_and_knots(&samples, 4, 7, Parametrization::Uniform, false, None).unwrap();
        assert_eq!(c.knots(), knots.as_slice());
        for (p, &t) in pts.iter().zip(&params) {
            assert!(c.eval(t).distance(p) < 1e-10);
        }
        // Any other interpolant differs by a null space vector and is longer.
        let rows: Vec<f64> = params
            .iter()
            .flat_map(|&t| {
                let mut row = vec![0.0; 7];
                for (i, v) in basis::eval(&knots, 4, t).iter() {
                    row[i] = v;
                }
                row
            })
            .collect();
        let a = Matrix::from_vec(4, 7, rows);
        let null = a.null_space();
        assert_eq!(null.len(), 3);
        let mut rng = StdRng::seed_from_u64(3);
        for k in 0..2 {
            let x = c.points().channel(k);
            let base = crate::common::norm(x);
            for _ in 0..20 {
                let mut y = x.to_vec();
                for n in &null {
                    let s = rng.random_range(-1.0..1.0);
                    for (yi, ni) in y.iter_mut().zip(n) {
                        *yi += s * ni;
                    }
                }
                assert!(crate::common::norm(&y) >= base - 1e-12);
            }
        }
    }

    #[test]
    fn periodic_circle() {
        let pts: Vec<CtlPt> = (0..16)
            .map(|i| {
                let a = core::f64::consts::TAU * i as f64 / 16.0;
                CtlPt::from((a.cos(), a.sin()))
            })
            .collect();
        let c = interpolate_positions(&pts, &InterpOptions::new(4, 16).periodic(true)).unwrap();
        assert!(c.is_periodic());
        assert_eq!(c.domain(), (0.0, 1.0));
        for (t, x, y) in [(0.0, 1.0, 0.0), (0.25, 0.0, 1.0), (0.5, -1.0, 0.0), (0.75, 0.0, -1.0)] {
            let p = c.eval(t);
            assert_abs_diff_eq!(p.coord(0), x, epsilon = 1e-10);
            assert_abs_diff_eq!(p.coord(1), y, epsilon = 1e-10);
        }
        // Between samples it stays close to the circle.
        let p = c.eval(1.0 / 32.0);
        assert_abs_diff_eq!(p.coord(0).hypot(p.coord(1)), 1.0, epsilon = 1e-3);
        // The enclosed area is nearly pi.
        assert_abs_diff_eq!(curve_area(&c).unwrap(), core::f64::consts::PI, epsilon = 1e-2);
    }

    #[test]
    fn coincident_parameters_are_singular() {
        let samples = [Sample::point((1.0, 1.0)), Sample::point((1.0, 1.0))];
        let r = interpolate_curve(&samples, &[0.5, 0.5], &[0.0, 0.0, 1.0, 1.0], 2, 2, false);
        assert_eq!(r, Err(FitError::SingularSystem));
        assert!(r.unwrap_err().is_numerical());
    }

    #[test]
    fn derivative_and_fixed_constraints() {
        let samples = [
            Sample::point((0.0, 0.0)),
            Sample::derivative((0.0, 4.0)),
            Sample::point((1.0, 1.0)),
            Sample::point((2.0, 0.0)),
            Sample::derivative((0.0, -4.0)),
        ];
        let c = interpolate_points(&samples, &InterpOptions::new(4, 5)).unwrap();
        let d = c.deriv().unwrap();
        let (t0, t1) = c.domain();
        assert_abs_diff_eq!(d.eval(t0).coord(1), 4.0, epsilon = 1e-9);
        assert_abs_diff_eq!(d.eval(t1).coord(0), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(d.eval(t1).coord(1), -4.0, epsilon = 1e-9);
        assert!(c.eval(t1).distance(&CtlPt::from((2.0, 0.0))) < 1e-9);

        let samples = [
            Sample::point((0.0, 0.0)),
            Sample::point((1.0, 1.0)),
            Sample::point((2.0, 0.0)),
            Sample::fixed(-2, (1.5, 3.0)),
        ];
        let c = interpolate_points(&samples, &InterpOptions::new(3, 4)).unwrap();
        assert!(c.points().point(2).distance(&CtlPt::from((1.5, 3.0))) < 1e-9);
    }

    #[test]
    fn parameters_clamped_to_domain() {
        let samples = [Sample::point((0.0, 0.0)), Sample::point((1.0, 1.0))];
        let c = interpolate_curve(&samples, &[-0.25, 1.0], &[0.0, 0.0, 1.0, 1.0], 2, 2, false)
            .unwrap();
        assert!(c.points().point(0).distance(&CtlPt::from((0.0, 0.0))) < 1e-12);
        assert!(c.points().point(1).distance(&CtlPt::from((1.0, 1.0))) < 1e-12);
        let c = interpolate_curve(&samples, &[0.0, 1.5], &[0.0, 0.0, 1.0, 1.0], 2, 2, false)
            .unwrap();
        assert!(c.eval(1.0).distance(&CtlPt::from((1.0, 1.0))) < 1e-12);
    }

    #[test]
    fn fixed_index_range() {
        let samples = |index| {
            [
                Sample::point((0.0, 0.0)),
                Sample::point((1.0, 1.0)),
                Sample::point((2.0, 0.0)),
                Sample::point((3.0, 1.0)),
                Sample::fixed(index, (1.5, 3.0)),
            ]
        };
        let opts = InterpOptions::new(4, 5);
        for index in [5, 7, -6] {
            assert_eq!(
                interpolate_points(&samples(index), &opts),
                Err(FitError::InvalidOrderOrSize {
                    order: 4,
                    length: 5
                }),
                "index {index}"
            );
        }
        let c = interpolate_points(&samples(-4), &opts).unwrap();
        assert!(c.points().point(1).distance(&CtlPt::from((1.5, 3.0))) < 1e-9);
        // Periodic curves wrap the index.
        let c = interpolate_points(&samples(7), &opts.clone().periodic(true)).unwrap();
        assert!(c.points().point(2).distance(&CtlPt::from((1.5, 3.0))) < 1e-9);
    }

    #[test]
    fn constraint_errors() {
        let opts = InterpOptions::new(3, 3);
        let second = [
            Sample::point((0.0, 0.0)),
            Sample {
                pt: CtlPt::from((1.0, 0.0)),
                constraint: SampleConstraint::Derivative(2),
            },
            Sample::point((1.0, 1.0)),
        ];
        assert_eq!(
            interpolate_points(&second, &opts),
            Err(FitError::UnsupportedDerivativeOrder(2))
        );
        let rational = [
            Sample::point(CtlPt::rational(1.0, &[0.0, 0.0])),
            Sample::derivative(CtlPt::rational(1.0, &[1.0, 0.0])),
            Sample::point(CtlPt::rational(1.0, &[1.0, 1.0])),
        ];
        assert_eq!(
            interpolate_points(&rational, &opts),
            Err(FitError::RationalNotSupported)
        );
        let mixed = [
            Sample::point((0.0, 0.0)),
            Sample::point((1.0, 0.0, 1.0)),
            Sample::point((1.0, 1.0)),
        ];
        assert!(matches!(
            interpolate_points(&mixed, &opts),
            Err(FitError::PointCountOrLengthMismatch { .. })
        ));
        let samples = [Sample::point((0.0, 0.0)), Sample::point((1.0, 0.0))];
        assert_eq!(
            interpolate_curve(&samples, &[0.0], &[0.0, 0.0, 1.0, 1.0], 2, 2, false),
            Err(FitError::PointCountOrLengthMismatch {
                expected: 2,
                found: 1
            })
        );
        assert_eq!(
            interpolate_curve(&samples, &[0.0, 1.0], &[0.0, 0.0, 1.0, 1.0], 2, 1, false),
            Err(FitError::InvalidOrderOrSize {
                order: 1,
                length: 2
            })
        );
    }

    #[test]
    fn rational_samples() {
        let pts = [
            CtlPt::rational(1.0, &[0.0, 0.0]),
            CtlPt::rational(2.0, &[2.0, 2.0]),
            CtlPt::rational(0.5, &[1.0, 0.0]),
        ];
        let c = interpolate_positions(&pts, &InterpOptions::new(3, 3)).unwrap();
        assert!(c.point_type().is_rational());
        assert!(c.eval(0.5).is_near(&pts[1], 1e-10));
        assert!(c.eval_euclidean(0.5).distance(&CtlPt::from((1.0, 1.0))) < 1e-10);
    }

    fn arch() -> Vec<CtlPt> {
        pts2(&[(-2.0, 0.0), (-1.0, 1.0), (0.0, 1.5), (1.0, 1.0), (2.0, 0.0)])
    }

    fn symmetric_samples(pts: &[CtlPt], sym: SymmetryConstraint) -> Vec<Sample> {
        pts.iter()
            .enumerate()
            .map(|(i, p)| {
                if i == 2 {
                    Sample::with_symmetry(p.clone(), sym.clone())
                } else {
                    Sample::point(p.clone())
                }
            })
            .collect()
    }

    #[test]
    fn reflection_symmetry() {
        let pts = arch();
        let sym = SymmetryConstraint::new(SymmetryAxes::X);
        let c = interpolate_points(&symmetric_samples(&pts, sym.clone()), &InterpOptions::new(4, 5))
            .unwrap();
        let cp = c.points();
        let sum = cp.coord(0, 0) + cp.coord(0, 4);
        for i in 0..5 {
            assert_abs_diff_eq!(cp.coord(0, i) + cp.coord(0, 4 - i), sum, epsilon = 1e-10);
            assert_abs_diff_eq!(cp.coord(1, i), cp.coord(1, 4 - i), epsilon = 1e-10);
        }
        for (i, p) in pts.iter().enumerate() {
            assert!(c.eval(i as f64 / 4.0).distance(p) < 1e-9);
        }

        // Samples past the middle are implied by the symmetry.
        let mut skewed = pts.clone();
        skewed[3] = CtlPt::from((1.3, 0.7));
        skewed[4] = CtlPt::from((2.5, -0.2));
        let d = interpolate_points(&symmetric_samples(&skewed, sym), &InterpOptions::new(4, 5))
            .unwrap();
        for i in 0..5 {
            assert!(c.points().point(i).distance(&d.points().point(i)) < 1e-9);
        }
    }

    #[test]
    fn even_length_reflection() {
        let pts = pts2(&[(-2.0, 0.0), (-1.5, 1.0), (-0.5, 1.5), (0.5, 1.5), (1.5, 1.0), (2.0, 0.0)]);
        let sym = SymmetryConstraint::new(SymmetryAxes::X);
        let c = interpolate_points(&symmetric_samples(&pts, sym), &InterpOptions::new(4, 6))
            .unwrap();
        let cp = c.points();
        for i in 0..6 {
            assert_abs_diff_eq!(cp.coord(0, i) + cp.coord(0, 5 - i), 0.0, epsilon = 1e-10);
            assert_abs_diff_eq!(cp.coord(1, i), cp.coord(1, 5 - i), epsilon = 1e-10);
        }
        for (i, p) in pts.iter().enumerate() {
            assert!(c.eval(i as f64 / 5.0).distance(p) < 1e-9, "sample {i}");
        }
    }

    #[test]
    fn reflection_in_y() {
        for pts in [
            pts2(&[(0.0, -2.0), (1.0, -1.5), (1.5, -0.5), (1.5, 0.5), (1.0, 1.5), (0.0, 2.0)]),
            pts2(&[(0.0, -2.0), (1.0, -1.0), (1.5, 0.0), (1.0, 1.0), (0.0, 2.0)]),
        ] {
            let n = pts.len();
            let sym = SymmetryConstraint::new(SymmetryAxes::Y);
            let c = interpolate_points(&symmetric_samples(&pts, sym), &InterpOptions::new(4, n))
                .unwrap();
            let cp = c.points();
            for i in 0..n {
                assert_abs_diff_eq!(cp.coord(0, i), cp.coord(0, n - 1 - i), epsilon = 1e-10);
                assert_abs_diff_eq!(cp.coord(1, i) + cp.coord(1, n - 1 - i), 0.0, epsilon = 1e-10);
            }
            for (i, p) in pts.iter().enumerate() {
                assert!(c.eval(i as f64 / (n - 1) as f64).distance(p) < 1e-9, "{n} samples, {i}");
            }
        }
    }

    #[test]
    fn symmetry_with_state() {
        let pts = arch();
        let mut state = ControlPoints::new(PointType::E2, 5);
        // Fix the reflection constant at x = 0, y = 2.
        state.set_point(0, &CtlPt::from((-1.0, 1.0)));
        state.set_point(4, &CtlPt::from((1.0, 1.0)));
        let sym = SymmetryConstraint::new(SymmetryAxes::X).with_state(state);
        let c = interpolate_points(&symmetric_samples(&pts, sym), &InterpOptions::new(4, 5))
            .unwrap();
        let cp = c.points();
        for i in 0..5 {
            assert_abs_diff_eq!(cp.coord(0, i) + cp.coord(0, 4 - i), 0.0, epsilon = 1e-10);
        }

        let bad = SymmetryConstraint::new(SymmetryAxes::X).with_state(ControlPoints::new(PointType::E2, 3));
        assert!(matches!(
            interpolate_points(&symmetric_samples(&pts, bad), &InterpOptions::new(4, 5)),
            Err(FitError::PointCountOrLengthMismatch { .. })
        ));
    }

    #[test]
    fn circular_symmetry() {
        let pts: Vec<CtlPt> = (0..9)
            .map(|i| {
                let a = core::f64::consts::PI * i as f64 / 8.0;
                CtlPt::from((-a.cos(), 0.5 * (2.0 * a).sin().abs() + 0.1 * i as f64))
            })
            .collect();
        let sym = SymmetryConstraint::new(SymmetryAxes::X).circular(true);
        let samples: Vec<Sample> = pts
            .iter()
            .enumerate()
            .map(|(i, p)| {
                if i == 4 {
                    Sample::with_symmetry(p.clone(), sym.clone())
                } else {
                    Sample::point(p.clone())
                }
            })
            .collect();
        let c = interpolate_points(&samples, &InterpOptions::new(4, 9)).unwrap();
        let cp = c.points();
        for h in [9, 5] {
            let last = h - 1;
            for i in 0..h {
                let (x, xm) = (cp.coord(0, i), cp.coord(0, last - i));
                assert_abs_diff_eq!(x + xm, cp.coord(0, 0) + cp.coord(0, last), epsilon = 1e-9);
                assert_abs_diff_eq!(cp.coord(1, i), cp.coord(1, last - i), epsilon = 1e-9);
            }
        }
        // Only the samples up to the quarter point are interpolated.
        for (i, p) in pts.iter().enumerate().take(3) {
            assert!(c.eval(i as f64 / 8.0).distance(p) < 1e-9);
        }
    }

    #[test]
    fn area_constraint() {
        let pts = pts2(&[(0.0, 0.0), (1.0, 1.0), (2.0, 1.2), (3.0, 1.0), (4.0, 0.0)]);
        for axis in [AreaAxis::X, AreaAxis::Y] {
            let area = AreaConstraint {
                axis,
                target: AreaTarget::Value(-3.0),
            };
            let samples: Vec<Sample> = pts
                .iter()
                .enumerate()
                .map(|(i, p)| {
                    if i == 0 {
                        Sample::with_area(p.clone(), area)
                    } else {
                        Sample::point(p.clone())
                    }
                })
                .collect();
            let c = interpolate_points(&samples, &InterpOptions::new(4, 7)).unwrap();
            assert_abs_diff_eq!(curve_area(&c).unwrap(), -3.0, epsilon = 1e-8);
            for (i, p) in pts.iter().enumerate() {
                assert!(c.eval(i as f64 / 4.0).distance(p) < 1e-8, "{axis:?}");
            }
        }
    }

    #[test]
    fn area_of_sample_polygon() {
        // A closed square, counterclockwise, has polygon area 4. The closing
        // edge is horizontal, so the open polygon gives the same sum.
        let pts = pts2(&[(1.0, -1.0), (1.0, 1.0), (-1.0, 1.0), (-1.0, -1.0)]);
        let samples: Vec<Sample> = pts.iter().cloned().map(Sample::point).collect();
        assert_abs_diff_eq!(polygon_area(&samples, true), 4.0);
        assert_abs_diff_eq!(polygon_area(&samples, false), 4.0);
        // Starting on a vertical edge, the open polygon misses it.
        let turned = pts2(&[(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)]);
        let samples: Vec<Sample> = turned.iter().cloned().map(Sample::point).collect();
        assert_abs_diff_eq!(polygon_area(&samples, true), 4.0);
        assert_abs_diff_eq!(polygon_area(&samples, false), 2.0);
    }

    #[test]
    fn area_of_a_unit_square_bezier() {
        // x = t, y = t on [0, 1]: \int x y' dt = 1/2.
        let cp = ControlPoints::from_points(&pts2(&[(0.0, 0.0), (0.5, 0.5), (1.0, 1.0)])).unwrap();
        assert_abs_diff_eq!(curve_area(&BsplineCurve::bezier(cp)).unwrap(), 0.5, epsilon = 1e-14);
    }
}
