// Copyright 2026 the Knotfit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! B-spline curves.

use alloc::vec::Vec;

use crate::basis;
use crate::common::PARAM_EPS;
use crate::knots::{self, find_span, multiplicity};
use crate::{ControlPoints, CtlPt, FitError, PointType};

#[cfg(not(feature = "std"))]
use crate::common::FloatFuncs;

/// A B-spline curve, possibly rational, possibly periodic.
///
/// An open curve of order `k` with `n` control points has `n + k` knots.
/// A periodic curve has `n + 2k - 1` knots, and control point indices wrap
/// around so that the curve closes smoothly.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BsplineCurve {
    order: usize,
    periodic: bool,
    knots: Vec<f64>,
    points: ControlPoints,
}

impl BsplineCurve {
    /// Create a curve from its parts.
    ///
    /// # Errors
    ///
    /// Returns [`FitError::InvalidOrderOrSize`] if `order` is zero or exceeds
    /// the number of control points, and [`FitError::InvalidKnotVector`] if
    /// the knot vector has the wrong length or decreases.
    pub fn new(
        order: usize,
        points: ControlPoints,
        knots: Vec<f64>,
        periodic: bool,
    ) -> Result<Self, FitError> {
        let length = points.len();
        if order == 0 || length < order {
            return Err(FitError::InvalidOrderOrSize { order, length });
        }
        knots::validate(&knots, order, length, periodic)?;
        Ok(BsplineCurve {
            order,
            periodic,
            knots,
            points,
        })
    }

    /// A curve with uniform knots on `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns [`FitError::InvalidOrderOrSize`] if `order` is zero or exceeds
    /// the number of control points.
    pub fn uniform(order: usize, points: ControlPoints, periodic: bool) -> Result<Self, FitError> {
        let length = points.len();
        if order == 0 || length < order {
            return Err(FitError::InvalidOrderOrSize { order, length });
        }
        let knots = if periodic {
            knots::uniform_periodic(order, length)
        } else {
            knots::uniform_open(order, length)
        };
        Ok(BsplineCurve {
            order,
            periodic,
            knots,
            points,
        })
    }

    /// A single Bezier segment on `[0, 1]` with the given control points.
    ///
    /// # Panics
    ///
    /// Panics if `points` is empty.
    pub fn bezier(points: ControlPoints) -> Self {
        let n = points.len();
        assert!(n > 0, "a Bezier curve needs at least one control point");
        BsplineCurve {
            order: n,
            periodic: false,
            knots: knots::uniform_open(n, n),
            points,
        }
    }

    pub(crate) fn from_parts(
        order: usize,
        knots: Vec<f64>,
        points: ControlPoints,
        periodic: bool,
    ) -> Self {
        debug_assert_eq!(
            knots.len(),
            knots::knot_count(order, points.len(), periodic),
            "knot count must match the control points"
        );
        BsplineCurve {
            order,
            periodic,
            knots,
            points,
        }
    }

    /// The order, one more than the polynomial degree.
    #[inline]
    pub fn order(&self) -> usize {
        self.order
    }

    /// The number of control points.
    #[inline]
    pub fn length(&self) -> usize {
        self.points.len()
    }

    /// Whether the curve is closed with wrapped control points.
    #[inline]
    pub fn is_periodic(&self) -> bool {
        self.periodic
    }

    /// The knot vector.
    #[inline]
    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    /// The control points.
    #[inline]
    pub fn points(&self) -> &ControlPoints {
        &self.points
    }

    /// Mutable access to the control points.
    #[inline]
    pub fn points_mut(&mut self) -> &mut ControlPoints {
        &mut self.points
    }

    /// The shape of the control points.
    #[inline]
    pub fn point_type(&self) -> PointType {
        self.points.point_type()
    }

    /// The parameter domain.
    #[inline]
    pub fn domain(&self) -> (f64, f64) {
        knots::domain(&self.knots, self.order, self.length(), self.periodic)
    }

    /// Evaluate at `t`, in homogeneous coordinates for rational curves.
    pub fn eval(&self, t: f64) -> CtlPt {
        self.combine(&basis::eval(&self.knots, self.order, t))
    }

    /// Evaluate at `t`, projected to Euclidean space.
    pub fn eval_euclidean(&self, t: f64) -> CtlPt {
        self.eval(t).to_euclidean()
    }

    fn combine(&self, b: &basis::BasisValues) -> CtlPt {
        let pt = self.point_type();
        let n = self.length();
        let mut out = CtlPt::zero(pt);
        for k in 0..pt.channels() {
            let ch = self.points.channel(k);
            let v = b.iter().map(|(i, bv)| bv * ch[i % n]).sum();
            out.set_channel(k, v);
        }
        out
    }

    /// The derivative curve, one order lower.
    ///
    /// # Errors
    ///
    /// Returns [`FitError::RationalNotSupported`] for rational curves, whose
    /// derivative is not a B-spline of the same kind, and
    /// [`FitError::InvalidOrderOrSize`] for piecewise constant curves.
    pub fn deriv(&self) -> Result<BsplineCurve, FitError> {
        let (k, n) = (self.order, self.length());
        if self.point_type().is_rational() {
            return Err(FitError::RationalNotSupported);
        }
        if k < 2 {
            return Err(FitError::InvalidOrderOrSize {
                order: k,
                length: n,
            });
        }
        let count = if self.periodic { n } else { n - 1 };
        let scale = (k - 1) as f64;
        let knots = &self.knots;
        let channels = self
            .points
            .channels()
            .map(|ch| {
                (0..count)
                    .map(|i| {
                        let w = knots[i + k] - knots[i + 1];
                        if w > 0.0 {
                            scale * (ch[(i + 1) % n] - ch[i]) / w
                        } else {
                            0.0
                        }
                    })
                    .collect()
            })
            .collect();
        Ok(BsplineCurve {
            order: k - 1,
            periodic: self.periodic,
            knots: knots[1..knots.len() - 1].to_vec(),
            points: ControlPoints::from_channels(self.point_type(), channels),
        })
    }

    /// Insert the knot `t`, keeping the curve's shape.
    ///
    /// A periodic curve is first converted to its open form, so the result
    /// is always open. `t` should lie in the domain.
    #[must_use]
    pub fn insert_knot(&self, t: f64) -> BsplineCurve {
        if self.periodic {
            return self.to_open().insert_knot(t);
        }
        let k = self.order;
        let s = find_span(&self.knots, k, t);
        let first = s + 1 - k;
        let channels = self
            .points
            .channels()
            .map(|ch| {
                (0..=ch.len())
                    .map(|i| {
                        if i <= first {
                            ch[i]
                        } else if i > s {
                            ch[i - 1]
                        } else {
                            let w = self.knots[i + k - 1] - self.knots[i];
                            let alpha = if w > 0.0 { (t - self.knots[i]) / w } else { 0.0 };
                            alpha * ch[i] + (1.0 - alpha) * ch[i - 1]
                        }
                    })
                    .collect()
            })
            .collect();
        let mut knots = self.knots.clone();
        knots.insert(s + 1, t);
        BsplineCurve {
            order: k,
            periodic: false,
            knots,
            points: ControlPoints::from_channels(self.point_type(), channels),
        }
    }

    /// Insert every knot of `ts`.
    #[must_use]
    pub fn refine(&self, ts: &[f64]) -> BsplineCurve {
        ts.iter().fold(self.clone(), |c, &t| c.insert_knot(t))
    }

    /// The same curve as an open curve clamped at both ends of its domain.
    ///
    /// The first and last control points of the result are the end points
    /// of the curve.
    #[must_use]
    pub fn to_open(&self) -> BsplineCurve {
        let k = self.order;
        let (a, b) = self.domain();
        let mut c = if self.periodic {
            // Unroll the wrapped control points into an unclamped open curve.
            let n = self.length();
            BsplineCurve {
                order: k,
                periodic: false,
                knots: self.knots.clone(),
                points: self.points.select((0..n + k - 1).map(|i| i % n)),
            }
        } else {
            self.clone()
        };
        for t in [a, b] {
            for _ in 0..k {
                if multiplicity(&c.knots, t) >= k {
                    break;
                }
                c = c.insert_knot(t);
            }
        }
        let near = |x: f64, t: f64| (x - t).abs() <= PARAM_EPS;
        let j = c.knots.iter().position(|&x| near(x, a)).unwrap_or(0);
        let e = c
            .knots
            .iter()
            .position(|&x| near(x, b))
            .unwrap_or(c.length());
        BsplineCurve {
            order: k,
            periodic: false,
            knots: c.knots[j..e + k].to_vec(),
            points: c.points.select(j..e),
        }
    }

    /// Distinct knot values strictly inside the domain.
    pub fn breakpoints(&self) -> Vec<f64> {
        let (a, b) = self.domain();
        let mut out: Vec<f64> = Vec::new();
        for &t in &self.knots {
            if t > a + PARAM_EPS
                && t < b - PARAM_EPS
                && out.last().map_or(true, |&l| t - l > PARAM_EPS)
            {
                out.push(t);
            }
        }
        out
    }

    /// The same curve in piecewise Bezier form.
    ///
    /// The result is clamped and every interior knot has multiplicity
    /// `order - 1`, so each span has its own Bezier control polygon.
    #[must_use]
    pub fn to_bezier_form(&self) -> BsplineCurve {
        let mut c = self.to_open();
        let p = self.order.saturating_sub(1);
        for t in c.breakpoints() {
            while multiplicity(&c.knots, t) < p {
                c = c.insert_knot(t);
            }
        }
        c
    }

    /// Raise the order to `order`, returning the result in Bezier form.
    ///
    /// # Panics
    ///
    /// Panics if the curve is piecewise constant.
    #[must_use]
    pub fn elevate_bezier_form(&self, order: usize) -> BsplineCurve {
        let c = self.to_bezier_form();
        if order <= c.order {
            return c;
        }
        assert!(c.order >= 2, "cannot elevate a piecewise constant curve");
        let p = c.order - 1;
        let (a, b) = c.domain();
        let mut knots = alloc::vec![a; order];
        let mut channels: Vec<Vec<f64>> = c.points.channels().map(|_| Vec::new()).collect();
        let mut last_span: Option<usize> = None;
        for s in p..c.length() {
            if c.knots[s] >= c.knots[s + 1] {
                continue;
            }
            let shared = last_span.is_some_and(|l| l == s - p);
            if let Some(l) = last_span {
                let m = if shared { order - 1 } else { order };
                knots.extend(core::iter::repeat(c.knots[l + 1]).take(m));
            }
            for (out, ch) in channels.iter_mut().zip(c.points.channels()) {
                let mut seg: Vec<f64> = ch[s - p..=s].to_vec();
                for _ in c.order..order {
                    seg = elevate_once(&seg);
                }
                out.extend_from_slice(if shared { &seg[1..] } else { &seg });
            }
            last_span = Some(s);
        }
        knots.extend(core::iter::repeat(b).take(order));
        BsplineCurve {
            order,
            periodic: false,
            knots,
            points: ControlPoints::from_channels(c.point_type(), channels),
        }
    }

    /// Bring the curve to order `order` in Bezier form with breakpoints at
    /// least at `breaks`.
    pub(crate) fn with_breakpoints(&self, order: usize, breaks: &[f64]) -> BsplineCurve {
        let mut c = self.elevate_bezier_form(order);
        let (a, b) = c.domain();
        for &t in breaks {
            if t <= a + PARAM_EPS || t >= b - PARAM_EPS {
                continue;
            }
            while multiplicity(&c.knots, t) < c.order - 1 {
                c = c.insert_knot(t);
            }
        }
        c
    }

    /// Affinely remap the knot vector so the domain becomes `[t0, t1]`.
    pub fn set_domain(&mut self, t0: f64, t1: f64) {
        let from = self.domain();
        for k in &mut self.knots {
            *k = crate::common::remap(*k, from, (t0, t1));
        }
    }

    /// Bounding box of the control polygon, projected to Euclidean space.
    ///
    /// By the convex hull property it contains the whole curve when all
    /// weights are positive.
    pub fn bbox(&self) -> (CtlPt, CtlPt) {
        bbox_of(&self.points)
    }

    /// The curve `self - other`, computed exactly.
    ///
    /// `other` is mapped onto the domain of `self`; both are then brought to
    /// a common order and breakpoint set so the difference is a plain
    /// subtraction of control points.
    ///
    /// # Errors
    ///
    /// Returns [`FitError::RationalNotSupported`] if either curve is rational
    /// and [`FitError::PointCountOrLengthMismatch`] if the dimensions differ.
    pub fn difference(&self, other: &BsplineCurve) -> Result<BsplineCurve, FitError> {
        check_compatible(self.point_type(), other.point_type())?;
        let mut b = other.clone();
        let (t0, t1) = self.domain();
        b.set_domain(t0, t1);
        let order = self.order.max(b.order);
        let breaks = merge_breaks(&self.breakpoints(), &b.breakpoints());
        let a = self.with_breakpoints(order, &breaks);
        let b = b.with_breakpoints(order, &breaks);
        if a.length() != b.length() {
            return Err(FitError::PointCountOrLengthMismatch {
                expected: a.length(),
                found: b.length(),
            });
        }
        let channels = a
            .points
            .channels()
            .zip(b.points.channels())
            .map(|(x, y)| x.iter().zip(y).map(|(x, y)| x - y).collect())
            .collect();
        Ok(BsplineCurve {
            order,
            periodic: false,
            knots: a.knots,
            points: ControlPoints::from_channels(a.points.point_type(), channels),
        })
    }
}

/// One step of Bezier degree elevation.
fn elevate_once(q: &[f64]) -> Vec<f64> {
    let p = q.len() - 1;
    let denom = (p + 1) as f64;
    (0..=p + 1)
        .map(|i| {
            if i == 0 {
                q[0]
            } else if i == p + 1 {
                q[p]
            } else {
                let a = i as f64 / denom;
                a * q[i - 1] + (1.0 - a) * q[i]
            }
        })
        .collect()
}

pub(crate) fn check_compatible(a: PointType, b: PointType) -> Result<(), FitError> {
    if a.is_rational() || b.is_rational() {
        return Err(FitError::RationalNotSupported);
    }
    if a.dim() != b.dim() {
        return Err(FitError::PointCountOrLengthMismatch {
            expected: a.dim(),
            found: b.dim(),
        });
    }
    Ok(())
}

/// Sorted union of two breakpoint lists, merging values closer than the tolerance.
pub(crate) fn merge_breaks(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut all: Vec<f64> = a.iter().chain(b).copied().collect();
    all.sort_by(f64::total_cmp);
    all.dedup_by(|x, y| (*x - *y).abs() <= PARAM_EPS);
    all
}

pub(crate) fn bbox_of(points: &ControlPoints) -> (CtlPt, CtlPt) {
    let e = points.point_type().to_euclidean();
    let mut lo = CtlPt::zero(e);
    let mut hi = CtlPt::zero(e);
    for k in 0..e.dim() {
        lo.coords[k] = f64::INFINITY;
        hi.coords[k] = f64::NEG_INFINITY;
    }
    for pt in points.iter() {
        let pt = pt.to_euclidean();
        for k in 0..e.dim() {
            lo.coords[k] = lo.coords[k].min(pt.coords[k]);
            hi.coords[k] = hi.coords[k].max(pt.coords[k]);
        }
    }
    (lo, hi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn plane_points(pts: &[(f64, f64)]) -> ControlPoints {
        let pts: Vec<CtlPt> = pts.iter().map(|&p| CtlPt::from(p)).collect();
        ControlPoints::from_points(&pts).unwrap()
    }

    fn assert_same_shape(a: &BsplineCurve, b: &BsplineCurve) {
        let (t0, t1) = a.domain();
        for i in 0..=40 {
            let t = t0 + (t1 - t0) * i as f64 / 40.0;
            let (p, q) = (a.eval_euclidean(t), b.eval_euclidean(t));
            assert!(p.distance(&q) < 1e-10, "{t}: {p:?} != {q:?}");
        }
    }

    fn sample_curve() -> BsplineCurve {
        let pts = plane_points(&[(0.0, 0.0), (1.0, 2.0), (2.0, -1.0), (4.0, 0.5), (5.0, 3.0), (6.0, 0.0)]);
        BsplineCurve::new(4, pts, alloc::vec![0.0, 0.0, 0.0, 0.0, 0.3, 0.7, 1.0, 1.0, 1.0, 1.0], false)
            .unwrap()
    }

    #[test]
    fn invalid_curves() {
        let pts = plane_points(&[(0.0, 0.0), (1.0, 0.0)]);
        assert_eq!(
            BsplineCurve::new(3, pts.clone(), alloc::vec![0.0; 5], false),
            Err(FitError::InvalidOrderOrSize {
                order: 3,
                length: 2
            })
        );
        assert!(matches!(
            BsplineCurve::new(2, pts, alloc::vec![0.0, 1.0, 0.0, 1.0], false),
            Err(FitError::InvalidKnotVector { .. })
        ));
    }

    #[test]
    fn bezier_eval() {
        let c = BsplineCurve::bezier(plane_points(&[(0.0, 0.0), (1.0, 2.0), (2.0, 0.0)]));
        let mid = c.eval(0.5);
        assert_abs_diff_eq!(mid.coord(0), 1.0, epsilon = 1e-15);
        assert_abs_diff_eq!(mid.coord(1), 1.0, epsilon = 1e-15);
        assert_eq!(c.domain(), (0.0, 1.0));
    }

    #[test]
    fn rational_quarter_circle() {
        let w = core::f64::consts::FRAC_1_SQRT_2;
        let pts = [
            CtlPt::rational(1.0, &[1.0, 0.0]),
            CtlPt::rational(w, &[w, w]),
            CtlPt::rational(1.0, &[0.0, 1.0]),
        ];
        let c = BsplineCurve::bezier(ControlPoints::from_points(&pts).unwrap());
        for i in 0..=10 {
            let p = c.eval_euclidean(i as f64 / 10.0);
            assert_abs_diff_eq!(p.coord(0).hypot(p.coord(1)), 1.0, epsilon = 1e-14);
        }
        assert_eq!(c.deriv(), Err(FitError::RationalNotSupported));
    }

    #[test]
    fn derivative_curve() {
        let c = sample_curve();
        let d = c.deriv().unwrap();
        assert_eq!((d.order(), d.length()), (3, 5));
        let h = 1e-6;
        for t in [0.1, 0.5, 0.9] {
            let fd = (c.eval(t + h).coord(1) - c.eval(t - h).coord(1)) / (2.0 * h);
            assert_abs_diff_eq!(d.eval(t).coord(1), fd, epsilon = 1e-5);
        }
    }

    #[test]
    fn knot_insertion_keeps_shape() {
        let c = sample_curve();
        let r = c.refine(&[0.5, 0.5, 0.1]);
        assert_eq!(r.length(), c.length() + 3);
        knots::validate(r.knots(), 4, r.length(), false).unwrap();
        assert_same_shape(&c, &r);
    }

    #[test]
    fn periodic_to_open() {
        let pts = plane_points(&[(1.0, 0.0), (0.0, 1.0), (-1.0, 0.0), (0.0, -1.0), (0.5, -0.5)]);
        let c = BsplineCurve::uniform(4, pts, true).unwrap();
        assert_eq!(c.knots().len(), 5 + 2 * 4 - 1);
        let o = c.to_open();
        assert!(!o.is_periodic());
        knots::validate(o.knots(), 4, o.length(), false).unwrap();
        assert_same_shape(&c, &o);
        // Closed: both ends meet.
        assert!(c.eval(0.0).distance(&c.eval(1.0)) < 1e-12);
        let first = o.points().point(0);
        assert!(first.distance(&c.eval(0.0)) < 1e-12);
    }

    #[test]
    fn bezier_form_and_elevation() {
        let c = sample_curve();
        let bz = c.to_bezier_form();
        assert_eq!(bz.length(), 1 + 3 * 3);
        assert_same_shape(&c, &bz);
        let up = c.elevate_bezier_form(6);
        assert_eq!(up.order(), 6);
        assert_eq!(up.length(), 1 + 5 * 3);
        knots::validate(up.knots(), 6, up.length(), false).unwrap();
        assert_same_shape(&c, &up);
    }

    #[test]
    fn exact_difference() {
        let quad = BsplineCurve::bezier(plane_points(&[(0.0, 0.0), (1.0, 2.0), (2.0, 0.0)]));
        let cubic = quad.elevate_bezier_form(4);
        let d = quad.difference(&cubic).unwrap();
        let (lo, hi) = d.bbox();
        assert!(lo.coords.iter().chain(&hi.coords).all(|x| x.abs() < 1e-14));

        let c = sample_curve();
        let mut shifted = c.clone();
        for x in shifted.points_mut().channel_mut(1) {
            *x += 0.25;
        }
        shifted.set_domain(2.0, 5.0);
        let d = shifted.difference(&c).unwrap();
        assert_eq!(d.domain(), (2.0, 5.0));
        let (lo, hi) = d.bbox();
        assert_abs_diff_eq!(lo.coord(1), 0.25, epsilon = 1e-12);
        assert_abs_diff_eq!(hi.coord(1), 0.25, epsilon = 1e-12);
        assert_abs_diff_eq!(hi.coord(0), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn bounding_box() {
        let (lo, hi) = sample_curve().bbox();
        assert_eq!(lo.coords.as_slice(), &[0.0, -1.0]);
        assert_eq!(hi.coords.as_slice(), &[6.0, 3.0]);
    }
}
