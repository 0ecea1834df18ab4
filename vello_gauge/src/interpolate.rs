// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lookup of colors and widths by a normalized position.
//!
//! Both families share [`lookup`]: the first sample sits at ratio `0`, the last at
//! ratio `1`. In smooth mode the value is blended linearly between the two
//! bracketing samples; in rough mode the ratio selects a bucket.

use peniko::Color;

/// Positions closer than this to a whole sample index snap to it.
const SNAP_EPSILON: f64 = 1e-9;

/// Look up `values` at `ratio`.
///
/// Returns `None` for an empty slice. `blend(start, end, t)` produces the value a
/// fraction `t` of the way from `start` to `end` and is only called in smooth mode.
pub fn lookup<T: Copy>(
    values: &[T],
    ratio: f64,
    smooth: bool,
    blend: impl FnOnce(T, T, f64) -> T,
) -> Option<T> {
    let (first, last) = (*values.first()?, *values.last()?);
    if values.len() == 1 || ratio.is_nan() || ratio <= 0.0 {
        return Some(first);
    }
    if ratio >= 1.0 {
        return Some(last);
    }

    let n = values.len();
    if smooth {
        let mut position = (n - 1) as f64 * ratio;
        let nearest = position.round();
        if (position - nearest).abs() < SNAP_EPSILON {
            position = nearest;
        }
        let sector = position.floor() as usize;
        let local = position - sector as f64;
        if local == 0.0 {
            return Some(values[sector]);
        }
        Some(blend(values[sector], values[sector + 1], local))
    } else {
        // `n` buckets over `[0, 1)`, where the smooth mode has `n - 1` intervals.
        let sector = ((n as f64 * ratio).floor() as usize).min(n - 1);
        Some(values[sector])
    }
}

/// The color at `ratio` in `colors`, or `None` when there are no colors.
///
/// Channels (alpha included) are blended as `end * t + start * (1 - t)` and truncated.
pub fn interpolate_color(colors: &[Color], ratio: f64, smooth: bool) -> Option<Color> {
    lookup(colors, ratio, smooth, |start, end, t| {
        let channel = |s: u8, e: u8| (f64::from(e) * t + f64::from(s) * (1.0 - t)) as u8;
        Color::rgba8(
            channel(start.r, end.r),
            channel(start.g, end.g),
            channel(start.b, end.b),
            channel(start.a, end.a),
        )
    })
}

/// The value at `ratio` in `values`, or `fallback` when there are no values.
pub fn interpolate_value(values: &[f64], ratio: f64, smooth: bool, fallback: f64) -> f64 {
    lookup(values, ratio, smooth, |start, end, t| {
        end * t + start * (1.0 - t)
    })
    .unwrap_or(fallback)
}
