// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Arc-length measurement of paths.

use std::cell::OnceCell;

use peniko::kurbo::{
    BezPath, CubicBez, Line, ParamCurve, ParamCurveArclen, ParamCurveDeriv, ParamCurveExtrema,
    PathEl, PathSeg, Point, QuadBez, Rect, Vec2,
};

use crate::{Error, Result};

/// Options for [`PathSampler`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SamplerOptions {
    /// Accuracy of arc-length computations on curved segments.
    pub accuracy: f64,
}

impl Default for SamplerOptions {
    fn default() -> Self {
        Self { accuracy: 1e-3 }
    }
}

/// One connected subpath with its cumulative length table.
#[derive(Clone, Debug)]
struct Contour {
    segments: Vec<PathSeg>,
    /// `ends[i]` is the distance from the contour start to the end of `segments[i]`.
    ends: Vec<f64>,
    closed: bool,
}

impl Contour {
    fn new(segments: Vec<PathSeg>, closed: bool, accuracy: f64) -> Self {
        let mut total = 0.0;
        let ends = segments
            .iter()
            .map(|seg| {
                total += seg.arclen(accuracy);
                total
            })
            .collect();
        Self {
            segments,
            ends,
            closed,
        }
    }

    fn length(&self) -> f64 {
        self.ends.last().copied().unwrap_or(0.0)
    }

    /// The segment containing `distance` and the distance along it.
    fn locate(&self, distance: f64) -> (usize, f64) {
        let last = self.segments.len() - 1;
        let idx = self.ends.partition_point(|&end| end < distance).min(last);
        let seg_start = if idx == 0 { 0.0 } else { self.ends[idx - 1] };
        (idx, (distance - seg_start).max(0.0))
    }

    fn param(&self, idx: usize, local: f64, accuracy: f64) -> f64 {
        let seg_len = self.ends[idx] - if idx == 0 { 0.0 } else { self.ends[idx - 1] };
        if seg_len <= 0.0 {
            return 0.0;
        }
        if local >= seg_len {
            return 1.0;
        }
        match self.segments[idx] {
            PathSeg::Line(_) => local / seg_len,
            seg => seg.inv_arclen(local, accuracy),
        }
    }

    fn sample(&self, distance: f64, accuracy: f64) -> (Point, f64) {
        let (idx, local) = self.locate(distance);
        let t = self.param(idx, local, accuracy);
        let seg = self.segments[idx];
        (seg.eval(t), tangent_angle(seg, t))
    }

    /// Append the part of the contour between two increasing distances to `out`.
    fn extract(&self, start: f64, end: f64, accuracy: f64, out: &mut Vec<PathSeg>) {
        let (first, first_local) = self.locate(start);
        let (last, last_local) = self.locate(end);
        for idx in first..=last {
            let t0 = if idx == first {
                self.param(idx, first_local, accuracy)
            } else {
                0.0
            };
            let t1 = if idx == last {
                self.param(idx, last_local, accuracy)
            } else {
                1.0
            };
            if t1 > t0 {
                out.push(self.segments[idx].subsegment(t0..t1));
            }
        }
    }

    fn bounds(&self) -> Rect {
        self.segments
            .iter()
            .map(ParamCurveExtrema::bounding_box)
            .reduce(|a, b| a.union(b))
            .unwrap_or_default()
    }
}

/// Tangent direction in degrees, `0` when the derivative vanishes.
fn tangent_angle(seg: PathSeg, t: f64) -> f64 {
    let deriv: Vec2 = match seg {
        PathSeg::Line(line) => line.p1 - line.p0,
        PathSeg::Quad(quad) => quad.deriv().eval(t).to_vec2(),
        PathSeg::Cubic(cubic) => cubic.deriv().eval(t).to_vec2(),
    };
    let deriv = if deriv.hypot2() > 1e-18 {
        deriv
    } else {
        // Degenerate control points; the chord still gives the direction.
        seg.end() - seg.start()
    };
    if deriv.hypot2() > 1e-18 {
        deriv.atan2().to_degrees()
    } else {
        0.0
    }
}

/// Split a path into contours, dropping those without any segment.
fn build_contours(path: &BezPath, force_closed: bool, accuracy: f64) -> Vec<Contour> {
    fn finish(
        contours: &mut Vec<Contour>,
        segments: &mut Vec<PathSeg>,
        start: Point,
        last: Point,
        closed: bool,
        force_closed: bool,
        accuracy: f64,
    ) {
        if segments.is_empty() {
            return;
        }
        let closed = closed || force_closed;
        if closed && last != start {
            segments.push(PathSeg::Line(Line::new(last, start)));
        }
        contours.push(Contour::new(std::mem::take(segments), closed, accuracy));
    }

    let mut contours = vec![];
    let mut segments = vec![];
    let mut start = Point::ZERO;
    let mut last = Point::ZERO;
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => {
                finish(
                    &mut contours,
                    &mut segments,
                    start,
                    last,
                    false,
                    force_closed,
                    accuracy,
                );
                start = p;
                last = p;
            }
            PathEl::LineTo(p) => {
                segments.push(PathSeg::Line(Line::new(last, p)));
                last = p;
            }
            PathEl::QuadTo(p1, p2) => {
                segments.push(PathSeg::Quad(QuadBez::new(last, p1, p2)));
                last = p2;
            }
            PathEl::CurveTo(p1, p2, p3) => {
                segments.push(PathSeg::Cubic(CubicBez::new(last, p1, p2, p3)));
                last = p3;
            }
            PathEl::ClosePath => {
                finish(
                    &mut contours,
                    &mut segments,
                    start,
                    last,
                    true,
                    force_closed,
                    accuracy,
                );
                last = start;
            }
        }
    }
    finish(
        &mut contours,
        &mut segments,
        start,
        last,
        false,
        force_closed,
        accuracy,
    );
    contours
}

/// Arc-length queries over a path.
///
/// A sampler built from a path measures all of its contours one after the other, so
/// [`length`](Self::length) is the sum of the contour lengths. Each contour can also be
/// measured on its own through [`contour`](Self::contour); those child samplers are built
/// on first use and kept until the path changes or [`refresh`](Self::refresh) is called.
#[derive(Clone, Debug, Default)]
pub struct PathSampler {
    options: SamplerOptions,
    contours: Vec<Contour>,
    /// `starts[i]` is the distance from the path start to the start of `contours[i]`.
    starts: Vec<f64>,
    length: f64,
    children: Vec<OnceCell<PathSampler>>,
}

static_assertions::assert_impl_all!(PathSampler: Send);

impl PathSampler {
    /// Create a sampler measuring `path`.
    pub fn new(path: Option<&BezPath>, force_closed: bool) -> Self {
        Self::with_options(path, force_closed, SamplerOptions::default())
    }

    /// Create a sampler measuring `path` with explicit options.
    pub fn with_options(path: Option<&BezPath>, force_closed: bool, options: SamplerOptions) -> Self {
        let mut sampler = Self {
            options,
            ..Self::default()
        };
        sampler.set_path(path, force_closed);
        sampler
    }

    /// Replace the measured path.
    ///
    /// A `None` or empty path is accepted and measures as zero length.
    pub fn set_path(&mut self, path: Option<&BezPath>, force_closed: bool) {
        let contours = path
            .map(|path| build_contours(path, force_closed, self.options.accuracy))
            .unwrap_or_default();
        self.set_contours(contours);
    }

    fn set_contours(&mut self, contours: Vec<Contour>) {
        let mut length = 0.0;
        self.starts = contours
            .iter()
            .map(|contour| {
                let start = length;
                length += contour.length();
                start
            })
            .collect();
        self.length = length;
        self.children = (0..contours.len()).map(|_| OnceCell::new()).collect();
        self.contours = contours;
    }

    /// Drop the memoized per-contour samplers.
    pub fn refresh(&mut self) {
        for child in &mut self.children {
            child.take();
        }
    }

    /// The options this sampler measures with.
    pub fn options(&self) -> SamplerOptions {
        self.options
    }

    /// Total arc length.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Whether every contour is closed. `false` for an empty path.
    pub fn is_closed(&self) -> bool {
        !self.contours.is_empty() && self.contours.iter().all(|contour| contour.closed)
    }

    /// The bounding box of the measured geometry.
    pub fn bounds(&self) -> Rect {
        self.contours
            .iter()
            .map(Contour::bounds)
            .reduce(|a, b| a.union(b))
            .unwrap_or_default()
    }

    /// Whether there is nothing to measure: no path, or a path without drawable segments.
    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    /// Number of contours.
    pub fn contour_count(&self) -> usize {
        self.contours.len()
    }

    /// The `(start, end)` distances of each contour along the whole path.
    pub fn contour_spans(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.starts
            .iter()
            .zip(&self.contours)
            .map(|(&start, contour)| (start, start + contour.length()))
    }

    /// A sampler measuring only the contour at the 1-based `index`.
    pub fn contour(&self, index: usize) -> Result<&Self> {
        let count = self.contours.len();
        if index == 0 || index > count {
            return Err(Error::IndexOutOfRange { index, count });
        }
        Ok(self.children[index - 1].get_or_init(|| {
            let mut child = Self {
                options: self.options,
                ..Self::default()
            };
            child.set_contours(vec![self.contours[index - 1].clone()]);
            child
        }))
    }

    /// Which contour a clamped distance falls on, with the distance along it.
    fn locate(&self, distance: f64) -> (usize, f64) {
        let idx = self
            .starts
            .partition_point(|&start| start <= distance)
            .saturating_sub(1);
        (idx, distance - self.starts[idx])
    }

    fn clamp(&self, distance: f64) -> f64 {
        if distance.is_nan() {
            return 0.0;
        }
        distance.clamp(0.0, self.length)
    }

    /// Point and tangent angle (in degrees) at `distance`, clamped to `[0, length]`.
    ///
    /// An empty path answers the origin with angle `0`.
    pub fn point_and_tangent(&self, distance: f64) -> (Point, f64) {
        if self.contours.is_empty() {
            return (Point::ZERO, 0.0);
        }
        let (idx, local) = self.locate(self.clamp(distance));
        self.contours[idx].sample(local, self.options.accuracy)
    }

    /// A path tracing the geometry between two distances.
    ///
    /// When `start > end` the result runs backward. Equal distances give an empty path.
    pub fn extract_segment(&self, start: f64, end: f64) -> BezPath {
        let (start, end) = (self.clamp(start), self.clamp(end));
        let reversed = start > end;
        let (lo, hi) = if reversed { (end, start) } else { (start, end) };
        if self.contours.is_empty() || hi - lo <= 0.0 {
            return BezPath::new();
        }

        let mut pieces: Vec<Vec<PathSeg>> = vec![];
        for (idx, contour) in self.contours.iter().enumerate() {
            let offset = self.starts[idx];
            let (from, to) = (lo - offset, hi - offset);
            if to <= 0.0 || from >= contour.length() {
                continue;
            }
            let mut segments = vec![];
            contour.extract(
                from.max(0.0),
                to.min(contour.length()),
                self.options.accuracy,
                &mut segments,
            );
            if !segments.is_empty() {
                pieces.push(segments);
            }
        }

        if reversed {
            pieces.reverse();
            for segments in &mut pieces {
                segments.reverse();
                for seg in segments.iter_mut() {
                    *seg = seg.reverse();
                }
            }
        }

        let mut path = BezPath::new();
        for segments in pieces {
            path.move_to(segments[0].start());
            for seg in segments {
                path.push(seg.as_path_el());
            }
        }
        path
    }
}
