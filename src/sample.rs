// Copyright 2026 the Knotfit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Interpolation samples and the constraints they can carry.

use crate::{ControlPoints, CtlPt};

/// One input to curve interpolation: a point or vector, and how to use it.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sample {
    /// The point, or the derivative vector for derivative samples.
    pub pt: CtlPt,
    /// What the sample constrains.
    pub constraint: SampleConstraint,
}

/// The kind of row a [`Sample`] contributes to the interpolation system.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SampleConstraint {
    /// The curve passes through the point.
    Point,
    /// The derivative of the given order at the sample's parameter equals
    /// the vector. Only first derivatives are supported.
    Derivative(u8),
    /// The control point with this index equals the point. Negative indices
    /// count from the end.
    FixedIndex(isize),
    /// The curve passes through the point, and the whole control polygon is
    /// symmetric.
    Symmetry(SymmetryConstraint),
    /// The curve passes through the point, and the area under the curve is
    /// prescribed.
    Area(AreaConstraint),
}

/// Which coordinate axes are mirrored by a [`SymmetryConstraint`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SymmetryAxes {
    /// Reflect the X coordinate.
    pub x: bool,
    /// Reflect the Y coordinate.
    pub y: bool,
    /// Reflect the Z coordinate.
    pub z: bool,
}

impl SymmetryAxes {
    /// Reflect X only, for curves symmetric about a vertical line.
    pub const X: SymmetryAxes = SymmetryAxes {
        x: true,
        y: false,
        z: false,
    };
    /// Reflect Y only, for curves symmetric about a horizontal line.
    pub const Y: SymmetryAxes = SymmetryAxes {
        x: false,
        y: true,
        z: false,
    };

    /// Whether spatial axis `axis` is reflected.
    #[inline]
    pub fn contains(self, axis: usize) -> bool {
        match axis {
            0 => self.x,
            1 => self.y,
            2 => self.z,
            _ => false,
        }
    }
}

/// Mirror symmetry of the control polygon, `P_i` against `P_{n-1-i}`.
///
/// Reflected axes satisfy `P_i + P_{n-1-i} = C` and the other axes satisfy
/// `P_i = P_{n-1-i}`. The constant `C` is `P_0 + P_{n-1}` of the solution
/// unless a `state` polygon is given, in which case it is taken from that
/// polygon's end points.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SymmetryConstraint {
    /// The reflected axes.
    pub axes: SymmetryAxes,
    /// Also impose the same symmetry on the first half of the polygon.
    pub circular: bool,
    /// A current control polygon fixing the reflection constant.
    pub state: Option<ControlPoints>,
}

impl SymmetryConstraint {
    /// Symmetry over the given axes, with a free reflection constant.
    pub fn new(axes: SymmetryAxes) -> Self {
        SymmetryConstraint {
            axes,
            circular: false,
            state: None,
        }
    }

    /// Set the circular flag.
    #[must_use]
    pub fn circular(mut self, circular: bool) -> Self {
        self.circular = circular;
        self
    }

    /// Fix the reflection constant from a control polygon.
    #[must_use]
    pub fn with_state(mut self, state: ControlPoints) -> Self {
        self.state = Some(state);
        self
    }
}

/// The axis whose coordinates are adjusted to meet an [`AreaConstraint`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AreaAxis {
    /// Solve Y freely, then constrain X.
    X,
    /// Solve X freely, then constrain Y.
    Y,
}

/// The area value an [`AreaConstraint`] asks for.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AreaTarget {
    /// A given value of `\int x(t) y'(t) dt`.
    Value(f64),
    /// The same functional measured on the polygon through the samples.
    SamplePolygon,
}

/// Prescribe the signed area `\int x(t) y'(t) dt` of the curve.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AreaConstraint {
    /// The axis that absorbs the constraint.
    pub axis: AreaAxis,
    /// The area to reach.
    pub target: AreaTarget,
}

impl Sample {
    /// A plain point to pass through.
    #[inline]
    pub fn point(pt: impl Into<CtlPt>) -> Self {
        Sample {
            pt: pt.into(),
            constraint: SampleConstraint::Point,
        }
    }

    /// A first derivative vector, at the parameter of the neighboring point.
    #[inline]
    pub fn derivative(v: impl Into<CtlPt>) -> Self {
        Sample {
            pt: v.into(),
            constraint: SampleConstraint::Derivative(1),
        }
    }

    /// Pin control point `index` to `pt`.
    #[inline]
    pub fn fixed(index: isize, pt: impl Into<CtlPt>) -> Self {
        Sample {
            pt: pt.into(),
            constraint: SampleConstraint::FixedIndex(index),
        }
    }

    /// A point that also carries a symmetry constraint.
    #[inline]
    pub fn with_symmetry(pt: impl Into<CtlPt>, symmetry: SymmetryConstraint) -> Self {
        Sample {
            pt: pt.into(),
            constraint: SampleConstraint::Symmetry(symmetry),
        }
    }

    /// A point that also carries an area constraint.
    #[inline]
    pub fn with_area(pt: impl Into<CtlPt>, area: AreaConstraint) -> Self {
        Sample {
            pt: pt.into(),
            constraint: SampleConstraint::Area(area),
        }
    }

    /// Whether the curve is asked to pass through this sample.
    ///
    /// Only positional samples take part in parametrization.
    #[inline]
    pub fn is_positional(&self) -> bool {
        matches!(
            self.constraint,
            SampleConstraint::Point | SampleConstraint::Symmetry(_) | SampleConstraint::Area(_)
        )
    }
}

impl From<CtlPt> for Sample {
    #[inline]
    fn from(pt: CtlPt) -> Sample {
        Sample::point(pt)
    }
}
