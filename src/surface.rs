// Copyright 2026 the Knotfit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tensor product B-spline surfaces.

use alloc::vec::Vec;

use crate::basis;
use crate::curve::{bbox_of, check_compatible, merge_breaks};
use crate::knots;
use crate::{BsplineCurve, ControlPoints, CtlPt, FitError, PointType};

/// A parametric direction of a surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    /// The first parameter, along which the mesh index varies fastest.
    U,
    /// The second parameter.
    V,
}

/// A tensor product B-spline surface with open knot vectors.
///
/// Control point `(i, j)` is stored at index `i + j * u_length`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BsplineSurface {
    u_order: usize,
    v_order: usize,
    u_length: usize,
    v_length: usize,
    u_knots: Vec<f64>,
    v_knots: Vec<f64>,
    points: ControlPoints,
}

impl BsplineSurface {
    /// Create a surface from its parts.
    ///
    /// # Errors
    ///
    /// Returns [`FitError::InvalidOrderOrSize`] if an order is zero or
    /// exceeds the length in its direction,
    /// [`FitError::PointCountOrLengthMismatch`] if the mesh does not have
    /// `u_length * v_length` points, and [`FitError::InvalidKnotVector`] for
    /// a bad knot vector.
    pub fn new(
        (u_order, v_order): (usize, usize),
        (u_length, v_length): (usize, usize),
        u_knots: Vec<f64>,
        v_knots: Vec<f64>,
        points: ControlPoints,
    ) -> Result<Self, FitError> {
        for (order, length) in [(u_order, u_length), (v_order, v_length)] {
            if order == 0 || length < order {
                return Err(FitError::InvalidOrderOrSize { order, length });
            }
        }
        if points.len() != u_length * v_length {
            return Err(FitError::PointCountOrLengthMismatch {
                expected: u_length * v_length,
                found: points.len(),
            });
        }
        knots::validate(&u_knots, u_order, u_length, false)?;
        knots::validate(&v_knots, v_order, v_length, false)?;
        Ok(BsplineSurface {
            u_order,
            v_order,
            u_length,
            v_length,
            u_knots,
            v_knots,
            points,
        })
    }

    /// A surface with uniform open knots on `[0, 1] x [0, 1]`.
    ///
    /// # Errors
    ///
    /// As for [`BsplineSurface::new`].
    pub fn uniform(
        orders: (usize, usize),
        lengths: (usize, usize),
        points: ControlPoints,
    ) -> Result<Self, FitError> {
        for (order, length) in [(orders.0, lengths.0), (orders.1, lengths.1)] {
            if order == 0 || length < order {
                return Err(FitError::InvalidOrderOrSize { order, length });
            }
        }
        let u_knots = knots::uniform_open(orders.0, lengths.0);
        let v_knots = knots::uniform_open(orders.1, lengths.1);
        Self::new(orders, lengths, u_knots, v_knots, points)
    }

    /// The order in each direction.
    #[inline]
    pub fn orders(&self) -> (usize, usize) {
        (self.u_order, self.v_order)
    }

    /// The number of control points in each direction.
    #[inline]
    pub fn lengths(&self) -> (usize, usize) {
        (self.u_length, self.v_length)
    }

    /// The U knot vector.
    #[inline]
    pub fn u_knots(&self) -> &[f64] {
        &self.u_knots
    }

    /// The V knot vector.
    #[inline]
    pub fn v_knots(&self) -> &[f64] {
        &self.v_knots
    }

    /// The control mesh.
    #[inline]
    pub fn points(&self) -> &ControlPoints {
        &self.points
    }

    /// Control point `(i, j)`.
    #[inline]
    pub fn point(&self, i: usize, j: usize) -> CtlPt {
        self.points.point(i + j * self.u_length)
    }

    /// The shape of the control points.
    #[inline]
    pub fn point_type(&self) -> PointType {
        self.points.point_type()
    }

    /// The parameter domain, `((u_min, u_max), (v_min, v_max))`.
    pub fn domain(&self) -> ((f64, f64), (f64, f64)) {
        (
            knots::domain(&self.u_knots, self.u_order, self.u_length, false),
            knots::domain(&self.v_knots, self.v_order, self.v_length, false),
        )
    }

    /// Evaluate at `(u, v)`, in homogeneous coordinates for rational surfaces.
    pub fn eval(&self, u: f64, v: f64) -> CtlPt {
        let bu = basis::eval(&self.u_knots, self.u_order, u);
        let bv = basis::eval(&self.v_knots, self.v_order, v);
        let pt = self.point_type();
        let mut out = CtlPt::zero(pt);
        for k in 0..pt.channels() {
            let ch = self.points.channel(k);
            let mut acc = 0.0;
            for (j, wv) in bv.iter() {
                for (i, wu) in bu.iter() {
                    acc += wu * wv * ch[i + j * self.u_length];
                }
            }
            out.set_channel(k, acc);
        }
        out
    }

    /// Evaluate at `(u, v)`, projected to Euclidean space.
    pub fn eval_euclidean(&self, u: f64, v: f64) -> CtlPt {
        self.eval(u, v).to_euclidean()
    }

    /// The mesh rows (along `U`) or columns (along `V`) as curves.
    pub fn curves(&self, dir: Direction) -> Vec<BsplineCurve> {
        let (ul, vl) = (self.u_length, self.v_length);
        match dir {
            Direction::U => (0..vl)
                .map(|j| {
                    let pts = self.points.select((0..ul).map(|i| i + j * ul));
                    BsplineCurve::from_parts(self.u_order, self.u_knots.clone(), pts, false)
                })
                .collect(),
            Direction::V => (0..ul)
                .map(|i| {
                    let pts = self.points.select((0..vl).map(|j| i + j * ul));
                    BsplineCurve::from_parts(self.v_order, self.v_knots.clone(), pts, false)
                })
                .collect(),
        }
    }

    /// Rebuild from curves along `dir` that share order and knots, keeping
    /// the other direction of `self`.
    fn with_curves(&self, dir: Direction, curves: &[BsplineCurve]) -> BsplineSurface {
        let Some(c0) = curves.first() else {
            return self.clone();
        };
        let n = c0.length();
        let pt = self.point_type();
        let mut channels: Vec<Vec<f64>> = (0..pt.channels()).map(|_| Vec::new()).collect();
        match dir {
            Direction::U => {
                for c in curves {
                    for (out, ch) in channels.iter_mut().zip(c.points().channels()) {
                        out.extend_from_slice(ch);
                    }
                }
            }
            Direction::V => {
                for j in 0..n {
                    for c in curves {
                        for (out, ch) in channels.iter_mut().zip(c.points().channels()) {
                            out.push(ch[j]);
                        }
                    }
                }
            }
        }
        let mut s = self.clone();
        s.points = ControlPoints::from_channels(pt, channels);
        match dir {
            Direction::U => {
                s.u_order = c0.order();
                s.u_length = n;
                s.u_knots = c0.knots().to_vec();
            }
            Direction::V => {
                s.v_order = c0.order();
                s.v_length = n;
                s.v_knots = c0.knots().to_vec();
            }
        }
        s
    }

    fn map_curves(
        &self,
        dir: Direction,
        f: impl Fn(&BsplineCurve) -> BsplineCurve,
    ) -> BsplineSurface {
        let curves: Vec<BsplineCurve> = self.curves(dir).iter().map(f).collect();
        self.with_curves(dir, &curves)
    }

    /// Insert the knot `t` in direction `dir`.
    #[must_use]
    pub fn insert_knot(&self, dir: Direction, t: f64) -> BsplineSurface {
        self.map_curves(dir, |c| c.insert_knot(t))
    }

    /// The same surface in piecewise Bezier form in both directions.
    #[must_use]
    pub fn to_bezier_form(&self) -> BsplineSurface {
        self.map_curves(Direction::U, BsplineCurve::to_bezier_form)
            .map_curves(Direction::V, BsplineCurve::to_bezier_form)
    }

    /// Affinely remap the knot vectors so the domain becomes the given ranges.
    pub fn set_domain(&mut self, u_range: (f64, f64), v_range: (f64, f64)) {
        let ((u0, u1), (v0, v1)) = self.domain();
        for k in &mut self.u_knots {
            *k = crate::common::remap(*k, (u0, u1), u_range);
        }
        for k in &mut self.v_knots {
            *k = crate::common::remap(*k, (v0, v1), v_range);
        }
    }

    /// Bounding box of the control mesh, projected to Euclidean space.
    pub fn bbox(&self) -> (CtlPt, CtlPt) {
        bbox_of(&self.points)
    }

    /// The surface `self - other`, computed exactly.
    ///
    /// # Errors
    ///
    /// Returns [`FitError::RationalNotSupported`] if either surface is
    /// rational and [`FitError::PointCountOrLengthMismatch`] if the
    /// dimensions differ.
    pub fn difference(&self, other: &BsplineSurface) -> Result<BsplineSurface, FitError> {
        check_compatible(self.point_type(), other.point_type())?;
        let mut b = other.clone();
        let (ud, vd) = self.domain();
        b.set_domain(ud, vd);
        let mut a = self.clone();
        for dir in [Direction::U, Direction::V] {
            let (ca, cb) = (a.curves(dir), b.curves(dir));
            let order = ca[0].order().max(cb[0].order());
            let breaks = merge_breaks(&ca[0].breakpoints(), &cb[0].breakpoints());
            a = a.map_curves(dir, |c| c.with_breakpoints(order, &breaks));
            b = b.map_curves(dir, |c| c.with_breakpoints(order, &breaks));
        }
        if a.points.len() != b.points.len() {
            return Err(FitError::PointCountOrLengthMismatch {
                expected: a.points.len(),
                found: b.points.len(),
            });
        }
        let channels = a
            .points
            .channels()
            .zip(b.points.channels())
            .map(|(x, y)| x.iter().zip(y).map(|(x, y)| x - y).collect())
            .collect();
        a.points = ControlPoints::from_channels(a.point_type(), channels);
        Ok(a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// z = x y on a 4 x 3 mesh over [0, 3] x [0, 2], bilinear in disguise.
    fn saddle() -> BsplineSurface {
        let mut pts = ControlPoints::new(PointType::E3, 0);
        for j in 0..3 {
            for i in 0..4 {
                let (x, y) = (i as f64, j as f64);
                pts.push(&CtlPt::from((x, y, x * y + 0.1 * (i % 2) as f64)));
            }
        }
        BsplineSurface::uniform((3, 2), (4, 3), pts).unwrap()
    }

    #[test]
    fn mesh_layout() {
        let s = saddle();
        assert_eq!(s.point(2, 1).coords.as_slice(), &[2.0, 1.0, 2.0]);
        assert_eq!(s.curves(Direction::U).len(), 3);
        assert_eq!(s.curves(Direction::V)[1].length(), 3);
        assert!(BsplineSurface::uniform((3, 2), (4, 4), s.points().clone()).is_err());
    }

    #[test]
    fn corners_interpolate() {
        let s = saddle();
        let c = s.eval(1.0, 1.0);
        assert_abs_diff_eq!(c.coord(2), 6.1, epsilon = 1e-14);
        assert_abs_diff_eq!(s.eval(0.0, 0.0).coord(0), 0.0);
    }

    #[test]
    fn refinement_keeps_shape() {
        let s = saddle();
        let r = s.insert_knot(Direction::U, 0.3).insert_knot(Direction::V, 0.7);
        assert_eq!(r.lengths(), (5, 4));
        let b = s.to_bezier_form();
        for (u, v) in [(0.1, 0.2), (0.5, 0.5), (0.9, 0.35)] {
            assert!(s.eval(u, v).distance(&r.eval(u, v)) < 1e-12);
            assert!(s.eval(u, v).distance(&b.eval(u, v)) < 1e-12);
        }
    }

    #[test]
    fn surface_difference() {
        let s = saddle();
        let mut t = s.to_bezier_form();
        t.set_domain((1.0, 2.0), (-1.0, 1.0));
        let d = t.difference(&s).unwrap();
        assert_eq!(d.domain(), ((1.0, 2.0), (-1.0, 1.0)));
        let (lo, hi) = d.bbox();
        assert!(lo.coords.iter().chain(&hi.coords).all(|x| x.abs() < 1e-12));
    }
}
