// Copyright 2026 the Knotfit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! B-spline interpolation and least-squares fitting.
//!
//! The knotfit library builds B-spline curves and tensor product surfaces
//! from sampled data. Samples are assigned parameters by one of several
//! policies, a knot vector is derived from the parameters, and the control
//! points are found by solving a linear system: exactly when there are as
//! many samples as control points, for the minimum-norm solution when there
//! are fewer, and in the least-squares sense when there are more.
//!
//! Beyond plain points, a sample can constrain the first derivative, pin a
//! control point, ask for a symmetric control polygon, or fix the signed
//! area of a planar curve. Existing curves and surfaces can be refit to a
//! different order or size with an exact error bound, and surfaces can be
//! fit to scattered `(u, v)` data.
//!
//! # Examples
//!
//! Interpolating points with a cubic:
//! ```
//! use knotfit::{interpolate_positions, CtlPt, InterpOptions};
//!
//! let pts: Vec<CtlPt> = [(0.0, 0.0), (1.0, 2.0), (3.0, 2.0), (4.0, 0.0)]
//!     .into_iter()
//!     .map(CtlPt::from)
//!     .collect();
//! let curve = interpolate_positions(&pts, &InterpOptions::new(4, 4)).unwrap();
//! assert_eq!(curve.domain(), (0.0, 1.0));
//! assert!(curve.eval(1.0 / 3.0).distance(&pts[1]) < 1e-9);
//! ```
//!
//! Refitting a quadratic as a cubic, which is exact:
//! ```
//! use knotfit::{fit_curve, BsplineCurve, ControlPoints, CtlPt, FitOptions};
//!
//! let pts = [(0.0, 0.0), (1.0, 2.0), (3.0, 0.5)].map(CtlPt::from);
//! let quad = BsplineCurve::bezier(ControlPoints::from_points(&pts).unwrap());
//! let result = fit_curve(&quad, &FitOptions::new(4, 4)).unwrap();
//! assert!(result.error.unwrap() < 1e-9);
//! ```
//!
//! # Features
//!
//! This crate either uses the standard library or the [`libm`] crate for
//! math functionality. The `std` feature is enabled by default, but can be
//! disabled, as long as the `libm` feature is enabled. This is useful for
//! `no_std` environments. The `alloc` crate is used regardless.
//!
//! The `serde` feature derives serialization for the data types, and the
//! `mint` feature adds conversions from `mint` points and vectors.
//!
//! [`libm`]: https://docs.rs/libm

#![forbid(unsafe_code)]
#![deny(missing_docs, clippy::trivially_copy_pass_by_ref)]
#![warn(clippy::doc_markdown, rustdoc::broken_intra_doc_links)]
#![warn(clippy::semicolon_if_nothing_returned)]
#![warn(unused_qualifications)]
#![allow(
    clippy::unreadable_literal,
    clippy::many_single_char_names,
    clippy::excessive_precision,
    clippy::needless_range_loop
)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![cfg_attr(all(not(feature = "std"), not(test)), no_std)]

#[cfg(not(any(feature = "std", feature = "libm")))]
compile_error!("knotfit requires either the `std` or `libm` feature");

extern crate alloc;

pub mod basis;
pub mod common;
mod curve;
mod error;
mod fit;
mod interp;
pub mod knots;
pub mod linalg;
mod point;
mod sample;
mod scatter;
mod srf_interp;
mod surface;

pub use crate::curve::*;
pub use crate::error::*;
pub use crate::fit::*;
pub use crate::interp::*;
pub use crate::knots::Parametrization;
pub use crate::point::*;
pub use crate::sample::*;
pub use crate::scatter::*;
pub use crate::srf_interp::*;
pub use crate::surface::*;
