// Copyright 2026 the Knotfit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors reported by the interpolation and fitting routines.

/// The ways an interpolation or fit can fail.
///
/// There are two shapes of failure. Most variants describe a request that can
/// never succeed (an invalid order, an unsupported constraint) and indicate a
/// bug in the caller. [`SingularSystem`] and [`NoSolution`] are numerical: the
/// request was well formed but the data made the linear system ill posed, and
/// the caller is expected to handle them as an ordinary "no result".
///
/// [`SingularSystem`]: FitError::SingularSystem
/// [`NoSolution`]: FitError::NoSolution
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FitError {
    /// The order is below 2 or the length is below the order.
    #[error("invalid order {order} for a curve of length {length}")]
    InvalidOrderOrSize {
        /// The requested order.
        order: usize,
        /// The requested length (control point count), or the available sample count.
        length: usize,
    },
    /// A supplied knot vector has the wrong length or is decreasing.
    #[error("invalid knot vector: expected {expected} non-decreasing knots, found {found}")]
    InvalidKnotVector {
        /// Expected number of knots.
        expected: usize,
        /// Number of knots supplied.
        found: usize,
    },
    /// The linear system has no well-conditioned solution.
    #[error("the interpolation system is singular")]
    SingularSystem,
    /// Only first derivative constraints are supported.
    #[error("derivative constraints of order {0} are not supported, only first derivatives")]
    UnsupportedDerivativeOrder(u8),
    /// The constraint is not defined for rational point types.
    #[error("constraint is not supported for rational point types")]
    RationalNotSupported,
    /// Inconsistent sample counts, row lengths or point types.
    #[error("point count or length mismatch: expected {expected}, found {found}")]
    PointCountOrLengthMismatch {
        /// The count that was required.
        expected: usize,
        /// The count that was supplied.
        found: usize,
    },
    /// A scattered data fit has no well-conditioned solution.
    #[error("no solution for the scattered data fit")]
    NoSolution,
}

impl FitError {
    /// Whether this is a numerically detected failure rather than a caller error.
    pub fn is_numerical(&self) -> bool {
        matches!(self, Self::SingularSystem | Self::NoSolution)
    }
}
