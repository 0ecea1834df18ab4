// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Variable width, variable color strokes that follow a path.
//!
//! A ribbon is drawn in three steps:
//!
//! 1. A *strip* is rasterized by stamping square points along the whole path, each one
//!    rotated to the local tangent and colored and sized for its distance.
//! 2. An *outline* is built by tracing the window forward on one edge and backward on
//!    the other, offset along the path normal by the local half width.
//! 3. The outline is filled with the strip as a texture.

use std::f64::consts::PI;
use std::sync::Arc;

use peniko::kurbo::{Arc as ArcShape, BezPath, Cap, Point, Vec2};
use peniko::Extend;

use crate::canvas::Canvas;
use crate::feature::{rotate_about, DrawContext, Feature, FeatureKind, Position, Window};
use crate::pixmap::Pixmap;
use crate::sampler::PathSampler;
use crate::surface::{Paint, Surface, Texture, DEFAULT_TOLERANCE};
use crate::Result;

/// A colored band following the path between the window ends.
#[derive(Clone, Debug)]
pub struct Ribbon {
    cap: Cap,
    step: f64,
    /// Strip of the last contour drawn.
    strip: Option<Arc<Pixmap>>,
    /// Outline of the last contour drawn, and that contour's index.
    ///
    /// The whole-path outline (index 0) does not depend on the surface, so it is
    /// reused until a property changes.
    outline: Option<(usize, BezPath)>,
}

impl Default for Ribbon {
    fn default() -> Self {
        Self {
            cap: Cap::Butt,
            step: 1.0,
            strip: None,
            outline: None,
        }
    }
}

impl Ribbon {
    /// How the two ends of the ribbon are finished. Only [`Cap::Round`] adds geometry.
    pub fn cap(&self) -> Cap {
        self.cap
    }

    /// Distance between samples, for both the strip and the outline.
    pub fn step(&self) -> f64 {
        self.step
    }

    /// The strip of the last contour drawn, in device pixels.
    ///
    /// Kept for inspection. It is rebuilt on every rendering since it depends on the
    /// surface size and transform.
    pub fn strip(&self) -> Option<&Arc<Pixmap>> {
        self.strip.as_ref()
    }

    /// The outline of the last contour drawn, in user space.
    pub fn outline(&self) -> Option<&BezPath> {
        self.outline.as_ref().map(|(_, outline)| outline)
    }

    /// Distances from `from` to `to`, at most `step` apart, including both ends.
    fn stations(from: f64, to: f64, step: f64) -> impl Iterator<Item = f64> {
        let span = to - from;
        let count = (span.abs() / step).ceil().max(1.0) as usize;
        let dir = span.signum();
        (0..=count).map(move |i| {
            if i == count {
                to
            } else {
                from + dir * step * i as f64
            }
        })
    }

    fn build_strip(&self, ctx: &DrawContext<'_>, window: &Window, surface: &dyn Surface) -> Pixmap {
        let mut strip = Canvas::new(surface.width(), surface.height());
        strip.set_transform(surface.transform());
        let shift = ctx.config().position.sign();
        let length = ctx.length();

        let mut stamp = |center: Point, angle: f64, distance: f64| {
            let width = ctx.window_width(window, distance);
            if width <= 0.0 {
                return;
            }
            let color = ctx.window_color(window, distance);
            strip.save();
            strip.concat(rotate_about(angle.to_radians(), center));
            let paint = Paint::stroke(color, width).with_cap(Cap::Square);
            strip.draw_point(center + Vec2::new(0.0, shift * width / 2.0), &paint);
            strip.restore();
        };

        for distance in Self::stations(0.0, length, self.step) {
            let (point, angle) = ctx.point_and_tangent(distance);
            stamp(point, angle, distance);
        }
        // One extra stamp a width behind the start, under the start cap.
        let (point, angle) = ctx.point_and_tangent(0.0);
        let width = ctx.window_width(window, 0.0);
        stamp(point - Vec2::from_angle(angle.to_radians()) * width, angle, 0.0);
        log::debug!("built ribbon strip over {length:.1}");
        strip.into_pixmap()
    }

    fn build_outline(&self, ctx: &DrawContext<'_>, window: &Window) -> Result<Option<BezPath>> {
        if window.len() <= 0.0 {
            return Ok(None);
        }
        let config = ctx.config();
        let dir = if window.is_reversed() { -1.0 } else { 1.0 };
        let trim = |distance| config.edge_treatment.trim(ctx.window_width(window, distance) / 2.0);
        let start = window.start + dir * trim(window.start);
        let end = window.end - dir * trim(window.end);
        if (end - start) * dir <= 0.0 {
            return Ok(None);
        }

        // One closed piece per contour touched by the window, so gaps between
        // contours are never bridged.
        let (lo, hi) = if dir > 0.0 { (start, end) } else { (end, start) };
        let sampler = ctx.sampler();
        let mut pieces = sampler
            .contour_spans()
            .enumerate()
            .filter_map(|(i, (span_start, span_end))| {
                let (from, to) = (lo.max(span_start), hi.min(span_end));
                (to > from).then_some((i + 1, span_start, from, to))
            })
            .collect::<Vec<_>>();
        if dir < 0.0 {
            pieces.reverse();
        }

        let mut outline = BezPath::new();
        for (index, base, from, to) in pieces {
            let contour = sampler.contour(index)?;
            let (from, to) = if dir > 0.0 { (from, to) } else { (to, from) };
            self.trace_piece(ctx, window, contour, base, (from, to), &mut outline);
        }
        if outline.elements().is_empty() {
            return Ok(None);
        }
        log::debug!("built ribbon outline from {start:.1} to {end:.1}");
        Ok(Some(outline))
    }

    /// Append the closed outline of one contour between two path distances.
    ///
    /// `base` is the path distance at which `contour` starts.
    fn trace_piece(
        &self,
        ctx: &DrawContext<'_>,
        window: &Window,
        contour: &PathSampler,
        base: f64,
        (from, to): (f64, f64),
        outline: &mut BezPath,
    ) {
        let position = ctx.config().position;
        let dir = if from > to { -1.0 } else { 1.0 };
        let samples = Self::stations(from, to, self.step)
            .map(|distance| {
                let (point, angle) = contour.point_and_tangent(distance - base);
                let (sin, cos) = angle.to_radians().sin_cos();
                let half = ctx.window_width(window, distance) / 2.0;
                let (a, b) = match position {
                    Position::Inside => (0.0, 2.0 * half),
                    Position::Middle => (-half, half),
                    Position::Outside => (0.0, -2.0 * half),
                };
                let normal = Vec2::new(-sin, cos);
                let travel = Vec2::new(cos, sin) * dir;
                (point + normal * a, point + normal * b, travel)
            })
            .collect::<Vec<_>>();
        let (Some(first), Some(last)) = (samples.first(), samples.last()) else {
            return;
        };

        outline.move_to(first.0);
        for sample in &samples[1..] {
            outline.line_to(sample.0);
        }
        if self.cap == Cap::Round {
            push_cap(outline, last.0, last.1, last.2);
        }
        outline.line_to(last.1);
        for sample in samples.iter().rev().skip(1) {
            outline.line_to(sample.1);
        }
        if self.cap == Cap::Round {
            push_cap(outline, first.1, first.0, -first.2);
        }
        outline.close_path();
    }
}

/// Append a half circle from `from` to `to`, bulging toward `outward`.
fn push_cap(path: &mut BezPath, from: Point, to: Point, outward: Vec2) {
    let center = from.midpoint(to);
    let radius = (from - center).hypot();
    if radius <= 0.0 {
        return;
    }
    let u = (from - center) / radius;
    let sweep = if Vec2::new(-u.y, u.x).dot(outward) >= 0.0 {
        PI
    } else {
        -PI
    };
    let arc = ArcShape {
        center,
        radii: Vec2::new(radius, radius),
        start_angle: u.atan2(),
        sweep_angle: sweep,
        x_rotation: 0.0,
    };
    path.extend(arc.append_iter(DEFAULT_TOLERANCE));
}

impl FeatureKind for Ribbon {
    fn draw_contour(&mut self, ctx: &DrawContext<'_>, surface: &mut dyn Surface) -> Result<()> {
        let window = ctx.window();
        let index = ctx.contour().index;
        let outline = match self.outline.take() {
            Some((cached, outline)) if index == 0 && cached == 0 => outline,
            _ => match self.build_outline(ctx, &window)? {
                Some(outline) => outline,
                None => {
                    self.strip = None;
                    return Ok(());
                }
            },
        };
        let strip = Arc::new(self.build_strip(ctx, &window, surface));
        surface.fill_path(&outline, &Paint::texture(Texture::new(strip.clone(), Extend::Pad)));
        self.strip = Some(strip);
        self.outline = Some((index, outline));
        Ok(())
    }

    fn invalidate(&mut self) {
        self.strip = None;
        self.outline = None;
    }

    fn copy_settings(&self, dst: &mut Self) -> bool {
        if (dst.cap, dst.step) == (self.cap, self.step) {
            return false;
        }
        (dst.cap, dst.step) = (self.cap, self.step);
        true
    }
}

impl Feature<Ribbon> {
    /// Set the end cap style.
    pub fn set_stroke_cap(&mut self, cap: Cap) {
        self.update_kind("stroke_cap", cap, |ribbon| &mut ribbon.cap);
    }

    /// Set the sampling step. Non-positive steps are ignored.
    pub fn set_step(&mut self, step: f64) {
        if !step.is_finite() || step <= 0.0 {
            log::warn!("ignoring ribbon step {step}");
            return;
        }
        self.update_kind("step", step, |ribbon| &mut ribbon.step);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::EdgeTreatment;
    use crate::pixmap::PremulRgba8;
    use peniko::kurbo::{Rect, Shape};
    use peniko::Color;

    fn line() -> BezPath {
        let mut path = BezPath::new();
        path.move_to((0.0, 50.0));
        path.line_to((100.0, 50.0));
        path
    }

    fn ribbon(path: BezPath) -> Feature<Ribbon> {
        let mut feature = Feature::new(Ribbon::default());
        feature.set_path(Some(path));
        feature.set_colors(vec![Color::RED]);
        feature.set_widths(vec![10.0]);
        feature
    }

    fn outline_bounds(feature: &Feature<Ribbon>) -> Rect {
        feature
            .kind()
            .outline()
            .map(|outline| outline.bounding_box())
            .unwrap_or_default()
    }

    #[test]
    fn straight_line_makes_a_rectangle() {
        let mut feature = ribbon(line());
        let mut canvas = Canvas::new(120, 100);
        feature.draw(&mut canvas).unwrap();

        let bounds = outline_bounds(&feature);
        assert!((bounds.x0 - 0.0).abs() < 1e-9, "{bounds:?}");
        assert!((bounds.x1 - 100.0).abs() < 1e-9, "{bounds:?}");
        assert!((bounds.y0 - 45.0).abs() < 1e-9, "{bounds:?}");
        assert!((bounds.y1 - 55.0).abs() < 1e-9, "{bounds:?}");

        let red = PremulRgba8::from_color(Color::RED, 255);
        let pixmap = canvas.pixmap();
        for (x, y) in [(0, 45), (50, 50), (99, 54), (50, 45)] {
            assert_eq!(pixmap.sample(x, y), red, "({x}, {y})");
        }
        for (x, y) in [(50, 44), (50, 55), (100, 50), (110, 50)] {
            assert_eq!(pixmap.sample(x, y), PremulRgba8::TRANSPARENT, "({x}, {y})");
        }
    }

    #[test]
    fn position_moves_the_band() {
        let mut feature = ribbon(line());
        feature.set_position(Position::Inside);
        feature.draw(&mut Canvas::new(120, 100)).unwrap();
        let bounds = outline_bounds(&feature);
        assert!((bounds.y0 - 50.0).abs() < 1e-9 && (bounds.y1 - 60.0).abs() < 1e-9);

        feature.set_position(Position::Outside);
        feature.draw(&mut Canvas::new(120, 100)).unwrap();
        let bounds = outline_bounds(&feature);
        assert!((bounds.y0 - 40.0).abs() < 1e-9 && (bounds.y1 - 50.0).abs() < 1e-9);
    }

    #[test]
    fn empty_window_draws_nothing() {
        let mut feature = ribbon(line());
        feature.set_start_percent(40.0);
        feature.set_end_percent(40.0);
        let mut canvas = Canvas::new(120, 100);
        feature.draw(&mut canvas).unwrap();
        assert!(feature.kind().outline().is_none());
        assert!(canvas.pixmap().data().iter().all(|p| p.a == 0));
    }

    #[test]
    fn edge_treatment_trims_the_ends() {
        let mut feature = ribbon(line());
        feature.set_edge_treatment(EdgeTreatment::Inside);
        feature.draw(&mut Canvas::new(120, 100)).unwrap();
        let bounds = outline_bounds(&feature);
        assert!((bounds.x0 - 5.0).abs() < 1e-9 && (bounds.x1 - 95.0).abs() < 1e-9);

        feature.set_edge_treatment(EdgeTreatment::Middle);
        feature.draw(&mut Canvas::new(120, 100)).unwrap();
        let bounds = outline_bounds(&feature);
        assert!((bounds.x0 - 2.5).abs() < 1e-9 && (bounds.x1 - 97.5).abs() < 1e-9);
    }

    #[test]
    fn round_caps_extend_past_the_ends() {
        let mut feature = ribbon(line());
        feature.set_start_percent(20.0);
        feature.set_end_percent(80.0);
        feature.set_stroke_cap(Cap::Round);
        let mut canvas = Canvas::new(120, 100);
        feature.draw(&mut canvas).unwrap();
        let bounds = outline_bounds(&feature);
        assert!((bounds.x0 - 15.0).abs() < 0.05, "{bounds:?}");
        assert!((bounds.x1 - 85.0).abs() < 0.05, "{bounds:?}");
        // Cap tips are painted, the corners next to them are not.
        let red = PremulRgba8::from_color(Color::RED, 255);
        assert_eq!(canvas.pixmap().sample(16, 50), red);
        assert_eq!(canvas.pixmap().sample(15, 45), PremulRgba8::TRANSPARENT);
    }

    #[test]
    fn reversed_window_covers_the_same_band() {
        let mut feature = ribbon(line());
        feature.set_start_percent(80.0);
        feature.set_end_percent(20.0);
        feature.draw(&mut Canvas::new(120, 100)).unwrap();
        let bounds = outline_bounds(&feature);
        assert!((bounds.x0 - 20.0).abs() < 1e-9 && (bounds.x1 - 80.0).abs() < 1e-9);
        assert!((bounds.y0 - 45.0).abs() < 1e-9 && (bounds.y1 - 55.0).abs() < 1e-9);
    }

    #[test]
    fn zero_width_leaves_a_gap_in_the_strip() {
        let mut feature = ribbon(line());
        feature.set_widths(vec![10.0, 0.0, 10.0]);
        feature.set_width_interpolation(crate::WidthInterpolation::Rough);
        feature.draw(&mut Canvas::new(120, 100)).unwrap();
        let strip = feature.kind().strip().unwrap();
        assert_eq!(strip.sample(50, 50), PremulRgba8::TRANSPARENT);
        assert_ne!(strip.sample(10, 50), PremulRgba8::TRANSPARENT);
    }

    #[test]
    fn strip_extends_behind_the_start_only() {
        let mut path = BezPath::new();
        path.move_to((20.0, 50.0));
        path.line_to((100.0, 50.0));
        let mut feature = ribbon(path);
        feature.draw(&mut Canvas::new(120, 100)).unwrap();
        let strip = feature.kind().strip().unwrap();
        // Stamps are 10 wide: the extra one covers [5, 15), the last one [95, 105).
        assert_ne!(strip.sample(8, 50), PremulRgba8::TRANSPARENT);
        assert_ne!(strip.sample(104, 50), PremulRgba8::TRANSPARENT);
        assert_eq!(strip.sample(4, 50), PremulRgba8::TRANSPARENT);
        assert_eq!(strip.sample(106, 50), PremulRgba8::TRANSPARENT);
        assert_eq!(strip.sample(110, 50), PremulRgba8::TRANSPARENT);
    }

    #[test]
    fn outline_survives_a_resize() {
        let mut feature = ribbon(line());
        feature.draw(&mut Canvas::new(120, 100)).unwrap();
        let outline = feature.kind().outline().cloned();
        feature.draw(&mut Canvas::new(150, 100)).unwrap();
        assert_eq!(feature.kind().outline().cloned(), outline);
        assert_eq!(feature.kind().strip().unwrap().width(), 150);
    }

    #[test]
    fn property_changes_drop_the_caches() {
        let mut feature = ribbon(line());
        feature.draw(&mut Canvas::new(120, 100)).unwrap();
        assert!(feature.kind().outline().is_some());
        feature.set_step(2.0);
        assert!(feature.kind().outline().is_none());
        assert!(feature.kind().strip().is_none());
        feature.set_step(-1.0);
        assert_eq!(feature.kind().step(), 2.0);
    }
}
