// Copyright 2026 the Knotfit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Control points and their struct-of-arrays storage.

use core::fmt;

use alloc::vec::Vec;

use arrayvec::ArrayVec;
use smallvec::SmallVec;

#[cfg(not(feature = "std"))]
use crate::common::FloatFuncs;

use crate::FitError;

/// The largest number of spatial coordinates a point may carry.
pub const MAX_DIM: usize = 9;

/// The shape of a control point: how many spatial coordinates, and whether
/// a weight channel is present.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PointType {
    dim: u8,
    rational: bool,
}

impl PointType {
    /// One dimensional, non-rational.
    pub const E1: PointType = PointType::new(1, false);
    /// Two dimensional, non-rational.
    pub const E2: PointType = PointType::new(2, false);
    /// Three dimensional, non-rational.
    pub const E3: PointType = PointType::new(3, false);
    /// Two dimensional, rational.
    pub const P2: PointType = PointType::new(2, true);
    /// Three dimensional, rational.
    pub const P3: PointType = PointType::new(3, true);

    /// Create a point type.
    ///
    /// # Panics
    ///
    /// Panics if `dim` is zero or exceeds [`MAX_DIM`].
    #[inline]
    pub const fn new(dim: usize, rational: bool) -> Self {
        assert!(dim >= 1 && dim <= MAX_DIM, "point dimension out of range");
        PointType {
            dim: dim as u8,
            rational,
        }
    }

    /// Number of spatial coordinates.
    #[inline]
    pub const fn dim(self) -> usize {
        self.dim as usize
    }

    /// Whether the point carries a weight channel.
    #[inline]
    pub const fn is_rational(self) -> bool {
        self.rational
    }

    /// Total number of channels, the weight included.
    #[inline]
    pub const fn channels(self) -> usize {
        self.dim as usize + self.rational as usize
    }

    /// The non-rational type with the same spatial dimension.
    #[inline]
    pub const fn to_euclidean(self) -> Self {
        PointType {
            dim: self.dim,
            rational: false,
        }
    }

    /// The channel index of spatial axis `axis`.
    #[inline]
    pub const fn axis_channel(self, axis: usize) -> usize {
        axis + self.rational as usize
    }
}

/// A single control point or sample.
///
/// Rational points store homogeneous coordinates: each entry of `coords` is
/// already multiplied by `weight`.
#[derive(Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CtlPt {
    /// The weight, for rational points.
    pub weight: Option<f64>,
    /// Spatial (homogeneous, when rational) coordinates.
    pub coords: ArrayVec<f64, MAX_DIM>,
}

impl CtlPt {
    /// A non-rational point.
    ///
    /// # Panics
    ///
    /// Panics if `coords` is empty or longer than [`MAX_DIM`].
    pub fn new(coords: &[f64]) -> Self {
        assert!(
            !coords.is_empty() && coords.len() <= MAX_DIM,
            "point dimension out of range"
        );
        CtlPt {
            weight: None,
            coords: coords.iter().copied().collect(),
        }
    }

    /// A rational point from homogeneous coordinates.
    ///
    /// # Panics
    ///
    /// Panics if `coords` is empty or longer than [`MAX_DIM`].
    pub fn rational(weight: f64, coords: &[f64]) -> Self {
        let mut pt = Self::new(coords);
        pt.weight = Some(weight);
        pt
    }

    /// The origin of the given point type, with unit weight if rational.
    pub fn zero(point_type: PointType) -> Self {
        let mut coords = ArrayVec::new();
        for _ in 0..point_type.dim() {
            coords.push(0.0);
        }
        CtlPt {
            weight: point_type.is_rational().then_some(1.0),
            coords,
        }
    }

    /// The shape of this point.
    #[inline]
    pub fn point_type(&self) -> PointType {
        PointType::new(self.coords.len(), self.weight.is_some())
    }

    /// Spatial coordinate `axis`, homogeneous if rational.
    #[inline]
    pub fn coord(&self, axis: usize) -> f64 {
        self.coords[axis]
    }

    /// Value of channel `k`, where channel 0 is the weight of a rational point.
    #[inline]
    pub fn channel(&self, k: usize) -> f64 {
        match self.weight {
            Some(w) if k == 0 => w,
            Some(_) => self.coords[k - 1],
            None => self.coords[k],
        }
    }

    /// Set channel `k`, where channel 0 is the weight of a rational point.
    #[inline]
    pub fn set_channel(&mut self, k: usize, value: f64) {
        match &mut self.weight {
            Some(w) if k == 0 => *w = value,
            Some(_) => self.coords[k - 1] = value,
            None => self.coords[k] = value,
        }
    }

    /// Project a rational point onto Euclidean space.
    pub fn to_euclidean(&self) -> CtlPt {
        match self.weight {
            Some(w) => {
                let inv = if w == 0.0 { 0.0 } else { w.recip() };
                CtlPt {
                    weight: None,
                    coords: self.coords.iter().map(|c| c * inv).collect(),
                }
            }
            None => self.clone(),
        }
    }

    /// Euclidean distance between the projections of two points.
    ///
    /// Missing coordinates of the lower dimensional point count as zero.
    pub fn distance(&self, other: &CtlPt) -> f64 {
        let a = self.to_euclidean();
        let b = other.to_euclidean();
        let n = a.coords.len().max(b.coords.len());
        let mut sum = 0.0;
        for i in 0..n {
            let d = a.coords.get(i).copied().unwrap_or(0.0) - b.coords.get(i).copied().unwrap_or(0.0);
            sum += d * d;
        }
        sum.sqrt()
    }

    /// Whether all coordinates (and the weight) are within `accuracy` of `other`.
    pub fn is_near(&self, other: &CtlPt, accuracy: f64) -> bool {
        self.point_type() == other.point_type()
            && (0..self.point_type().channels())
                .all(|k| (self.channel(k) - other.channel(k)).abs() <= accuracy)
    }
}

impl fmt::Debug for CtlPt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(w) = self.weight {
            write!(f, "[w={w:?}; ")?;
        } else {
            write!(f, "[")?;
        }
        for (i, c) in self.coords.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{c:?}")?;
        }
        write!(f, "]")
    }
}

impl From<(f64, f64)> for CtlPt {
    #[inline]
    fn from((x, y): (f64, f64)) -> CtlPt {
        CtlPt::new(&[x, y])
    }
}

impl From<(f64, f64, f64)> for CtlPt {
    #[inline]
    fn from((x, y, z): (f64, f64, f64)) -> CtlPt {
        CtlPt::new(&[x, y, z])
    }
}

#[cfg(feature = "mint")]
impl From<mint::Point2<f64>> for CtlPt {
    #[inline]
    fn from(p: mint::Point2<f64>) -> CtlPt {
        CtlPt::new(&[p.x, p.y])
    }
}

#[cfg(feature = "mint")]
impl From<mint::Point3<f64>> for CtlPt {
    #[inline]
    fn from(p: mint::Point3<f64>) -> CtlPt {
        CtlPt::new(&[p.x, p.y, p.z])
    }
}

#[cfg(feature = "mint")]
impl From<mint::Vector2<f64>> for CtlPt {
    #[inline]
    fn from(p: mint::Vector2<f64>) -> CtlPt {
        CtlPt::new(&[p.x, p.y])
    }
}

#[cfg(feature = "mint")]
impl From<mint::Vector3<f64>> for CtlPt {
    #[inline]
    fn from(p: mint::Vector3<f64>) -> CtlPt {
        CtlPt::new(&[p.x, p.y, p.z])
    }
}

/// Control points stored as one array per channel.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ControlPoints {
    weights: Option<Vec<f64>>,
    coords: SmallVec<[Vec<f64>; 3]>,
}

impl ControlPoints {
    /// `len` zero points (unit weight when rational).
    pub fn new(point_type: PointType, len: usize) -> Self {
        ControlPoints {
            weights: point_type.is_rational().then(|| alloc::vec![1.0; len]),
            coords: (0..point_type.dim()).map(|_| alloc::vec![0.0; len]).collect(),
        }
    }

    /// Gather points of a single type into channel arrays.
    ///
    /// # Errors
    ///
    /// Returns [`FitError::PointCountOrLengthMismatch`] if `points` is empty
    /// or the points do not share one point type.
    pub fn from_points(points: &[CtlPt]) -> Result<Self, FitError> {
        let first = points.first().ok_or(FitError::PointCountOrLengthMismatch {
            expected: 1,
            found: 0,
        })?;
        let point_type = first.point_type();
        let mut result = Self::new(point_type, points.len());
        for (i, pt) in points.iter().enumerate() {
            if pt.point_type() != point_type {
                return Err(FitError::PointCountOrLengthMismatch {
                    expected: point_type.channels(),
                    found: pt.point_type().channels(),
                });
            }
            result.set_point(i, pt);
        }
        Ok(result)
    }

    /// Build from channel arrays, weights first when present.
    ///
    /// # Panics
    ///
    /// Panics if the channels differ in length or the dimension is out of range.
    pub fn from_channels(point_type: PointType, mut channels: Vec<Vec<f64>>) -> Self {
        assert_eq!(
            channels.len(),
            point_type.channels(),
            "channel count must match the point type"
        );
        let len = channels[0].len();
        assert!(
            channels.iter().all(|c| c.len() == len),
            "channels must have equal length"
        );
        let weights = point_type.is_rational().then(|| channels.remove(0));
        ControlPoints {
            weights,
            coords: channels.into_iter().collect(),
        }
    }

    /// The shape of the stored points.
    #[inline]
    pub fn point_type(&self) -> PointType {
        PointType::new(self.coords.len(), self.weights.is_some())
    }

    /// Number of points.
    #[inline]
    pub fn len(&self) -> usize {
        self.coords[0].len()
    }

    /// Whether there are no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Weight of point `i`; 1.0 for non-rational points.
    #[inline]
    pub fn weight(&self, i: usize) -> f64 {
        self.weights.as_ref().map_or(1.0, |w| w[i])
    }

    /// Spatial coordinate `axis` of point `i`, homogeneous if rational.
    #[inline]
    pub fn coord(&self, axis: usize, i: usize) -> f64 {
        self.coords[axis][i]
    }

    /// Point `i`.
    pub fn point(&self, i: usize) -> CtlPt {
        CtlPt {
            weight: self.weights.as_ref().map(|w| w[i]),
            coords: self.coords.iter().map(|c| c[i]).collect(),
        }
    }

    /// Overwrite point `i`.
    ///
    /// # Panics
    ///
    /// Panics if the point type differs from the stored type.
    pub fn set_point(&mut self, i: usize, pt: &CtlPt) {
        assert_eq!(pt.point_type(), self.point_type(), "point type mismatch");
        if let (Some(w), Some(pw)) = (self.weights.as_mut(), pt.weight) {
            w[i] = pw;
        }
        for (c, v) in self.coords.iter_mut().zip(&pt.coords) {
            c[i] = *v;
        }
    }

    /// Append a point.
    ///
    /// # Panics
    ///
    /// Panics if the point type differs from the stored type.
    pub fn push(&mut self, pt: &CtlPt) {
        assert_eq!(pt.point_type(), self.point_type(), "point type mismatch");
        if let (Some(w), Some(pw)) = (self.weights.as_mut(), pt.weight) {
            w.push(pw);
        }
        for (c, v) in self.coords.iter_mut().zip(&pt.coords) {
            c.push(*v);
        }
    }

    /// Channel `k`, where channel 0 holds the weights of rational points.
    pub fn channel(&self, k: usize) -> &[f64] {
        match &self.weights {
            Some(w) if k == 0 => w,
            Some(_) => &self.coords[k - 1],
            None => &self.coords[k],
        }
    }

    /// Mutable access to channel `k`.
    pub fn channel_mut(&mut self, k: usize) -> &mut Vec<f64> {
        match &mut self.weights {
            Some(w) if k == 0 => w,
            Some(_) => &mut self.coords[k - 1],
            None => &mut self.coords[k],
        }
    }

    /// All channels, weights first.
    pub fn channels(&self) -> impl Iterator<Item = &[f64]> + '_ {
        self.weights
            .iter()
            .chain(self.coords.iter())
            .map(|c| c.as_slice())
    }

    /// Iterate over the points.
    pub fn iter(&self) -> impl Iterator<Item = CtlPt> + '_ {
        (0..self.len()).map(|i| self.point(i))
    }

    /// A new array holding the points at `indices`, in order.
    pub fn select(&self, indices: impl Iterator<Item = usize>) -> Self {
        let indices: Vec<usize> = indices.collect();
        ControlPoints {
            weights: self
                .weights
                .as_ref()
                .map(|w| indices.iter().map(|&i| w[i]).collect()),
            coords: self
                .coords
                .iter()
                .map(|c| indices.iter().map(|&i| c[i]).collect())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channels_of_rational_point() {
        let mut pt = CtlPt::rational(2.0, &[2.0, 4.0]);
        assert_eq!(pt.point_type(), PointType::P2);
        assert_eq!(pt.channel(0), 2.0);
        assert_eq!(pt.channel(2), 4.0);
        pt.set_channel(1, 6.0);
        assert_eq!(pt.coord(0), 6.0);
        let e = pt.to_euclidean();
        assert_eq!(e.coords.as_slice(), &[3.0, 2.0]);
        assert_eq!(e.point_type(), PointType::E2);
    }

    #[test]
    fn distance_mixed_dimensions() {
        let a = CtlPt::new(&[3.0]);
        let b = CtlPt::from((0.0, 4.0));
        assert!((a.distance(&b) - 5.0).abs() < 1e-15);
    }

    #[test]
    fn control_points_round_trip() {
        let pts = [
            CtlPt::rational(1.0, &[0.0, 1.0]),
            CtlPt::rational(0.5, &[0.5, 0.25]),
        ];
        let cp = ControlPoints::from_points(&pts).unwrap();
        assert_eq!(cp.len(), 2);
        assert_eq!(cp.weight(1), 0.5);
        assert_eq!(cp.channel(0), &[1.0, 0.5]);
        assert_eq!(cp.channel(2), &[1.0, 0.25]);
        assert_eq!(cp.point(1), pts[1]);
        assert_eq!(cp.channels().count(), 3);
    }

    #[test]
    fn mixed_types_rejected() {
        let pts = [CtlPt::new(&[0.0, 1.0]), CtlPt::new(&[0.0, 1.0, 2.0])];
        assert!(matches!(
            ControlPoints::from_points(&pts),
            Err(FitError::PointCountOrLengthMismatch { .. })
        ));
        assert!(ControlPoints::from_points(&[]).is_err());
    }

    #[test]
    fn select_and_push() {
        let mut cp = ControlPoints::new(PointType::E2, 0);
        for i in 0..4 {
            cp.push(&CtlPt::from((i as f64, -(i as f64))));
        }
        let sel = cp.select([3, 1].into_iter());
        assert_eq!(sel.point(0), CtlPt::from((3.0, -3.0)));
        assert_eq!(sel.coord(1, 1), -1.0);
    }

    #[test]
    fn debug_format() {
        let s = format!("{:?}", CtlPt::rational(0.5, &[1.0]));
        assert_eq!(s, "[w=0.5; 1.0]");
    }
}
