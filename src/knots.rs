// Copyright 2026 the Knotfit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Knot vectors and the parametrization of samples.
//!
//! A knot vector for a curve of order `k` with `n` control points has
//! `n + k` non-decreasing entries, and its domain is `[t_{k-1}, t_n]`.
//! Periodic curves carry `k - 1` more knots so the wrapped control points
//! have support on both ends of the domain.

use alloc::vec;
use alloc::vec::Vec;

#[cfg(not(feature = "std"))]
use crate::common::FloatFuncs;

use crate::common::{CHORD_EPS, METRIC_EPS, PARAM_EPS};
use crate::{CtlPt, FitError, Sample};

/// How parameter values are assigned to samples.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Parametrization {
    /// Equally spaced parameters.
    #[default]
    Uniform,
    /// Parameters proportional to the accumulated distance between samples.
    ChordLength,
    /// Parameters proportional to the accumulated square root of distance.
    Centripetal,
    /// The affine invariant parametrization of Nielson and Foley, which
    /// lengthens spans around sharp turns.
    NielsonFoley,
    /// Use a supplied knot vector, with parameters at its Greville abscissae.
    Nodal,
}

/// Number of knots of a curve with the given order and length.
#[inline]
pub fn knot_count(order: usize, length: usize, periodic: bool) -> usize {
    if periodic {
        length + 2 * order - 1
    } else {
        length + order
    }
}

/// A clamped knot vector with uniformly spaced interior knots on `[0, 1]`.
///
/// # Panics
///
/// Panics if `length < order` or `order` is zero.
pub fn uniform_open(order: usize, length: usize) -> Vec<f64> {
    assert!(order >= 1 && length >= order, "length must be at least order");
    let spans = (length - order + 1) as f64;
    let mut knots = vec![0.0; order];
    knots.extend((1..=length - order).map(|i| i as f64 / spans));
    knots.extend(core::iter::repeat(1.0).take(order));
    knots
}

/// A uniform periodic knot vector with domain `[0, 1]`.
///
/// The knots are `(i - (order - 1)) / length`, so the first `order - 1` of
/// them are negative.
pub fn uniform_periodic(order: usize, length: usize) -> Vec<f64> {
    let n = knot_count(order, length, true);
    (0..n)
        .map(|i| (i as f64 - (order - 1) as f64) / length as f64)
        .collect()
}

/// Build a knot vector by averaging windows of the parameters.
///
/// This generalizes the classic interpolation rule (averages of `order - 1`
/// consecutive parameters) to any `length <= params.len()`. The result is
/// clamped and its domain is exactly `[params[0], params[last]]`.
///
/// # Panics
///
/// Panics if `length < order` or there are fewer parameters than `length`.
pub fn average(params: &[f64], order: usize, length: usize) -> Vec<f64> {
    let n = params.len();
    assert!(
        order >= 1 && length >= order && n >= length,
        "averaging needs at least as many parameters as control points"
    );
    let window = n + order - length - 1;
    let windows = length - order + 2;
    let averages: Vec<f64> = (0..windows)
        .map(|j| {
            if window == 0 {
                params[j]
            } else {
                params[j..j + window].iter().sum::<f64>() / window as f64
            }
        })
        .collect();
    let mut knots = vec![averages[0]; order];
    knots.extend_from_slice(&averages[1..windows - 1]);
    knots.extend(core::iter::repeat(averages[windows - 1]).take(order));
    affine_map(&mut knots, (params[0], params[n - 1]));
    knots
}

/// Build a knot vector for more control points than parameters.
///
/// The ends are clamped to the first and last parameter, and the interior
/// knots walk through the parameters at a fixed stride, interpolating
/// linearly between neighbors.
///
/// # Panics
///
/// Panics if `params` is empty or `length < order`.
pub fn walk(params: &[f64], order: usize, length: usize) -> Vec<f64> {
    let n = params.len();
    assert!(n >= 1 && order >= 1 && length >= order, "invalid knot walk");
    let (first, last) = (params[0], params[n - 1]);
    let mut knots = vec![first; order];
    if n == 1 {
        knots.extend(core::iter::repeat(first).take(length - order));
    } else {
        let r = (n - 1) as f64 / (length - order + 1) as f64;
        for i in 1..=length - order {
            let pos = r * i as f64;
            let idx = (pos.floor() as usize).min(n - 2);
            let frac = pos - idx as f64;
            knots.push(params[idx] + frac * (params[idx + 1] - params[idx]));
        }
    }
    knots.extend(core::iter::repeat(last).take(order));
    knots
}

/// The Greville abscissae (knot averages) of a knot vector.
///
/// Node `i` is the average of `t_{i+1} .. t_{i+order-1}`; it is the
/// parameter at which control point `i` has the most influence.
pub fn nodes(knots: &[f64], order: usize, length: usize) -> Vec<f64> {
    if order <= 1 {
        return knots[..length].to_vec();
    }
    (0..length)
        .map(|i| knots[i + 1..i + order].iter().sum::<f64>() / (order - 1) as f64)
        .collect()
}

/// Affinely map a knot vector so its first and last entries span `range`.
pub fn affine_map(knots: &mut [f64], range: (f64, f64)) {
    let (Some(&a), Some(&b)) = (knots.first(), knots.last()) else {
        return;
    };
    for k in knots.iter_mut() {
        *k = crate::common::remap(*k, (a, b), range);
    }
}

/// Check that a knot vector has the right length and never decreases.
///
/// # Errors
///
/// Returns [`FitError::InvalidKnotVector`] otherwise.
pub fn validate(knots: &[f64], order: usize, length: usize, periodic: bool) -> Result<(), FitError> {
    let expected = knot_count(order, length, periodic);
    if knots.len() != expected || knots.windows(2).any(|w| !(w[1] >= w[0])) {
        return Err(FitError::InvalidKnotVector {
            expected,
            found: knots.len(),
        });
    }
    Ok(())
}

/// The parameter domain `[t_min, t_max]` of a curve.
#[inline]
pub fn domain(knots: &[f64], order: usize, length: usize, periodic: bool) -> (f64, f64) {
    let end = if periodic { length + order - 1 } else { length };
    (knots[order - 1], knots[end])
}

/// The knot span containing `t`.
///
/// Returns `s` with `t_s <= t < t_{s+1}` for `s` in `order - 1 .. count`, where
/// `count = knots.len() - order` is the number of basis functions. Values
/// outside the domain map to the first or last non-empty span.
pub fn find_span(knots: &[f64], order: usize, t: f64) -> usize {
    let count = knots.len() - order;
    let lo = order - 1;
    let below = knots[lo..=count].partition_point(|&k| k <= t);
    let mut s = (lo + below).saturating_sub(1).clamp(lo, count - 1);
    while s > lo && knots[s] >= knots[s + 1] {
        s -= 1;
    }
    s
}

/// Number of knots equal to `t`, within a small tolerance.
pub fn multiplicity(knots: &[f64], t: f64) -> usize {
    knots.iter().filter(|&&k| (k - t).abs() <= PARAM_EPS).count()
}

/// Parameters for a list of points, one per point.
///
/// Uniform parameters run over `[0, 1]`, or `[0, 1)` when `periodic`. The
/// distance based policies are normalized to `[0, 1]`. [`Parametrization::Nodal`]
/// has no meaning without a knot vector and yields uniform parameters here.
pub fn params(points: &[CtlPt], param: Parametrization, periodic: bool) -> Vec<f64> {
    let n = points.len();
    if n == 0 {
        return Vec::new();
    }
    if periodic || n == 1 {
        return (0..n).map(|i| i as f64 / n as f64).collect();
    }
    let spans: Vec<f64> = match param {
        Parametrization::Uniform | Parametrization::Nodal => {
            return (0..n).map(|i| i as f64 / (n - 1) as f64).collect();
        }
        Parametrization::ChordLength => points
            .windows(2)
            .map(|w| w[0].distance(&w[1]) + CHORD_EPS)
            .collect(),
        Parametrization::Centripetal => points
            .windows(2)
            .map(|w| w[0].distance(&w[1]).sqrt() + CHORD_EPS)
            .collect(),
        Parametrization::NielsonFoley => nielson_foley_spans(points),
    };
    let total: f64 = spans.iter().sum();
    let mut acc = 0.0;
    let mut out = Vec::with_capacity(n);
    out.push(0.0);
    for s in &spans {
        acc += s;
        out.push(acc / total);
    }
    out
}

fn nielson_foley_spans(points: &[CtlPt]) -> Vec<f64> {
    let pts: Vec<[f64; 2]> = points
        .iter()
        .map(|p| {
            let e = p.to_euclidean();
            [e.coords[0], e.coords.get(1).copied().unwrap_or(0.0)]
        })
        .collect();
    let n = pts.len() as f64;
    let mean = pts
        .iter()
        .fold([0.0, 0.0], |m, p| [m[0] + p[0] / n, m[1] + p[1] / n]);
    let (mut sxx, mut sxy, mut syy) = (0.0, 0.0, 0.0);
    for p in &pts {
        let (dx, dy) = (p[0] - mean[0], p[1] - mean[1]);
        sxx += dx * dx / n;
        sxy += dx * dy / n;
        syy += dy * dy / n;
    }
    let mut det = sxx * syy - sxy * sxy;
    if !(det > 0.0) {
        // Regularize a flat point cloud so the metric stays positive definite.
        sxx += METRIC_EPS;
        syy += METRIC_EPS;
        det = sxx * syy - sxy * sxy;
    }
    // The metric is the inverse covariance.
    let metric = [syy / det, -sxy / det, sxx / det];
    let dot = |a: [f64; 2], b: [f64; 2]| {
        a[0] * metric[0] * b[0] + (a[0] * b[1] + a[1] * b[0]) * metric[1] + a[1] * metric[2] * b[1]
    };
    let segs: Vec<[f64; 2]> = pts
        .windows(2)
        .map(|w| [w[1][0] - w[0][0], w[1][1] - w[0][1]])
        .collect();
    let d: Vec<f64> = segs.iter().map(|&s| dot(s, s).max(0.0).sqrt()).collect();
    // Turning angle term at each interior point, zero at the ends.
    let mut theta = vec![0.0; pts.len()];
    for i in 1..pts.len() - 1 {
        let denom = d[i - 1] * d[i];
        if denom > 0.0 {
            let back = [-segs[i - 1][0], -segs[i - 1][1]];
            let cos = (dot(back, segs[i]) / denom).clamp(-1.0, 1.0);
            theta[i] = (core::f64::consts::PI - cos.acos()).min(core::f64::consts::FRAC_PI_2);
        }
    }
    (0..segs.len())
        .map(|i| {
            let mut scale = 1.0;
            if i > 0 && d[i - 1] + d[i] > 0.0 {
                scale += 1.5 * theta[i] * d[i - 1] / (d[i - 1] + d[i]);
            }
            if i + 1 < segs.len() && d[i] + d[i + 1] > 0.0 {
                scale += 1.5 * theta[i + 1] * d[i + 1] / (d[i] + d[i + 1]);
            }
            d[i] * scale + CHORD_EPS
        })
        .collect()
}

/// Build a knot vector for the given parameters.
///
/// Uses [`average`] when there are at least as many parameters as control
/// points and [`walk`] otherwise. A single parameter or a degenerate range
/// falls back to [`uniform_open`].
pub fn from_params(params: &[f64], order: usize, length: usize, periodic: bool) -> Vec<f64> {
    if periodic {
        return uniform_periodic(order, length);
    }
    let n = params.len();
    if n <= 1 || (params[n - 1] - params[0]).abs() < PARAM_EPS {
        log::debug!("degenerate parameter range, using uniform knots");
        return uniform_open(order, length);
    }
    if length <= n {
        average(params, order, length)
    } else {
        walk(params, order, length)
    }
}

/// Parameters for every sample and a knot vector to interpolate them with.
///
/// Only positional samples are parametrized; derivative and fixed control
/// point samples reuse the parameter of the preceding positional sample, or
/// of the following one when they come first. Periodic curves always use
/// uniform parameters and knots. With [`Parametrization::Nodal`] the
/// supplied `nodal` knot vector is kept as is and the positional samples
/// are spread over its Greville abscissae.
///
/// All parameters are clamped into the domain of the returned knots.
///
/// # Errors
///
/// Returns [`FitError::InvalidOrderOrSize`] for an invalid order or length or
/// when no sample is positional, and [`FitError::InvalidKnotVector`] when the
/// nodal knot vector is missing or malformed.
pub fn params_and_knots(
    samples: &[Sample],
    order: usize,
    length: usize,
    param: Parametrization,
    periodic: bool,
    nodal: Option<&[f64]>,
) -> Result<(Vec<f64>, Vec<f64>), FitError> {
    if order < 2 || length < order {
        return Err(FitError::InvalidOrderOrSize { order, length });
    }
    let positional: Vec<CtlPt> = samples
        .iter()
        .filter(|s| s.is_positional())
        .map(|s| s.pt.to_euclidean())
        .collect();
    if positional.is_empty() {
        return Err(FitError::InvalidOrderOrSize { order, length: 0 });
    }

    let (pos_params, knots) = if param == Parametrization::Nodal && !periodic {
        let knots = nodal.ok_or(FitError::InvalidKnotVector {
            expected: knot_count(order, length, false),
            found: 0,
        })?;
        validate(knots, order, length, false)?;
        let nd = nodes(knots, order, length);
        let m = positional.len();
        let pos_params = if m == 1 {
            vec![nd[0]]
        } else {
            // Spread the samples over the nodes; identical when m == length.
            let r = (length - 1) as f64 / (m - 1) as f64;
            (0..m)
                .map(|i| {
                    let pos = r * i as f64;
                    let idx = (pos.floor() as usize).min(length.saturating_sub(2));
                    let frac = pos - idx as f64;
                    match nd.get(idx + 1) {
                        Some(next) => nd[idx] + frac * (next - nd[idx]),
                        None => nd[idx],
                    }
                })
                .collect()
        };
        (pos_params, knots.to_vec())
    } else {
        let pos_params = params(&positional, param, periodic);
        let all = spread(samples, &pos_params);
        let knots = from_params(&all, order, length, periodic);
        (pos_params, knots)
    };

    let mut all = spread(samples, &pos_params);
    let (t0, t1) = domain(&knots, order, length, periodic);
    for t in &mut all {
        *t = t.clamp(t0, t1);
    }
    log::debug!(
        "parametrized {} samples ({param:?}), {} knots on [{t0}, {t1}]",
        samples.len(),
        knots.len()
    );
    Ok((all, knots))
}

/// Give every sample a parameter from the positional ones.
fn spread(samples: &[Sample], pos_params: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(samples.len());
    let mut next = 0;
    for s in samples {
        if s.is_positional() {
            out.push(pos_params[next]);
            next += 1;
        } else if next == 0 {
            out.push(pos_params[0]);
        } else {
            out.push(pos_params[next - 1]);
        }
    }
    out
}
