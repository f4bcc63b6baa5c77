// Copyright 2026 the Knotfit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Evaluation of B-spline basis functions.

use smallvec::{smallvec, SmallVec};

use crate::knots::find_span;

/// The basis functions that are nonzero at one parameter.
///
/// Only `order` consecutive functions can be nonzero at any parameter;
/// `values[j]` is the value of function `first + j`.
#[derive(Clone, Debug, PartialEq)]
pub struct BasisValues {
    /// Index of the first nonzero function.
    pub first: usize,
    /// Values of the functions `first .. first + order`.
    pub values: SmallVec<[f64; 8]>,
}

impl BasisValues {
    /// `(index, value)` pairs of the nonzero functions.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(|(j, &v)| (self.first + j, v))
    }
}

/// Values of the basis functions of order `order` at `t`.
///
/// The number of functions is `knots.len() - order`; `t` outside the
/// domain is evaluated on the nearest end span.
pub fn eval(knots: &[f64], order: usize, t: f64) -> BasisValues {
    let span = find_span(knots, order, t);
    BasisValues {
        first: span + 1 - order,
        values: eval_at_span(knots, order, span, t),
    }
}

/// First derivatives of the basis functions of order `order` at `t`.
///
/// Uses `N'_{i,k} = (k-1) [N_{i,k-1} / (t_{i+k-1} - t_i) - N_{i+1,k-1} / (t_{i+k} - t_{i+1})]`,
/// where a zero width support contributes nothing.
pub fn eval_deriv(knots: &[f64], order: usize, t: f64) -> BasisValues {
    let span = find_span(knots, order, t);
    let first = span + 1 - order;
    if order < 2 {
        return BasisValues {
            first,
            values: smallvec![0.0; order],
        };
    }
    let lower = eval_at_span(knots, order - 1, span, t);
    let k = order;
    let scale = (k - 1) as f64;
    let values = (0..k)
        .map(|m| {
            let i = first + m;
            let mut d = 0.0;
            if m >= 1 {
                let w = knots[i + k - 1] - knots[i];
                if w > 0.0 {
                    d += lower[m - 1] / w;
                }
            }
            if m + 1 < k {
                let w = knots[i + k] - knots[i + 1];
                if w > 0.0 {
                    d -= lower[m] / w;
                }
            }
            scale * d
        })
        .collect();
    BasisValues { first, values }
}

/// The triangular Cox-de Boor scheme on one span.
///
/// Returns the values of the `order` functions `span + 1 - order ..= span`.
fn eval_at_span(knots: &[f64], order: usize, span: usize, t: f64) -> SmallVec<[f64; 8]> {
    let mut n: SmallVec<[f64; 8]> = smallvec![0.0; order];
    let mut left: SmallVec<[f64; 8]> = smallvec![0.0; order];
    let mut right: SmallVec<[f64; 8]> = smallvec![0.0; order];
    n[0] = 1.0;
    for j in 1..order {
        left[j] = t - knots[span + 1 - j];
        right[j] = knots[span + j] - t;
        let mut saved = 0.0;
        for r in 0..j {
            let denom = right[r + 1] + left[j - r];
            let temp = if denom == 0.0 { 0.0 } else { n[r] / denom };
            n[r] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        n[j] = saved;
    }
    n
}
