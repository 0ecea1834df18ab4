// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Discrete shapes repeated along a path: tick marks and pointers.

use std::fmt;

use peniko::kurbo::{Affine, Line, Point, Rect, Vec2};
use peniko::Color;
use smallvec::SmallVec;

use crate::feature::{DrawContext, Feature, FeatureKind, Position, Window};
use crate::surface::{Paint, Surface};
use crate::Result;

/// Upper bound on the notches drawn in one pass.
pub const MAX_NOTCHES: usize = 1 << 16;

/// The primitive drawn for each repetition.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum MarkerShape {
    /// A line across the path, stroked with the repetition width.
    #[default]
    Line,
    /// A filled rectangle.
    Rect,
    /// A filled oval.
    Oval,
}

/// Shape and size of a marker.
///
/// The width of a marker (along the path) comes from the feature widths; the height
/// (across the path) is fixed here.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MarkerStyle {
    pub shape: MarkerShape,
    pub height: f64,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            shape: MarkerShape::Line,
            height: 10.0,
        }
    }
}

/// Where notches are placed inside the window.
#[derive(Clone, Debug, PartialEq)]
pub enum Distribution {
    /// This many notches, evenly spread from the window start to its end.
    ///
    /// On a closed path with a full window the last notch would land on the first
    /// one, so the spacing is divided by `n` instead of `n - 1`.
    Count(usize),
    /// One notch every this many units from the window start.
    Spacing(f64),
    /// Notches at these percentages of the window.
    Positions(Vec<f64>),
}

impl Default for Distribution {
    fn default() -> Self {
        Self::Count(5)
    }
}

/// Resolved parameters of one repetition, which a pre-draw hook may override.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RepetitionInfo {
    /// 1-based index in drawing order.
    pub index: usize,
    pub distance: f64,
    pub point: Point,
    /// Tangent angle in degrees.
    pub angle: f64,
    /// Size along the path.
    pub width: f64,
    /// Size across the path.
    pub height: f64,
    pub color: Color,
    pub visible: bool,
    /// Translation applied on top of `point`.
    pub offset: Vec2,
}

type RepetitionListener = Box<dyn FnMut(&mut RepetitionInfo)>;

/// State shared by the two marker kinds.
#[derive(Default)]
struct Marker {
    style: MarkerStyle,
    on_draw_repetition: Option<RepetitionListener>,
}

impl fmt::Debug for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Marker")
            .field("style", &self.style)
            .field("on_draw_repetition", &self.on_draw_repetition.is_some())
            .finish()
    }
}

impl Marker {
    fn resolve(
        &mut self,
        ctx: &DrawContext<'_>,
        window: &Window,
        index: usize,
        distance: f64,
    ) -> Option<RepetitionInfo> {
        let (point, angle) = ctx.point_and_tangent(distance);
        let mut info = RepetitionInfo {
            index,
            distance,
            point,
            angle,
            width: ctx.window_width(window, distance),
            height: self.style.height,
            color: ctx.window_color(window, distance),
            visible: true,
            offset: Vec2::ZERO,
        };
        if let Some(hook) = &mut self.on_draw_repetition {
            hook(&mut info);
        }
        info.visible.then_some(info)
    }

    /// Draw `info` grown by `grow` on every side.
    fn draw(
        &self,
        surface: &mut dyn Surface,
        position: Position,
        info: &RepetitionInfo,
        grow: f64,
        alpha: u8,
    ) {
        let width = info.width + 2.0 * grow;
        let height = info.height + 2.0 * grow;
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        surface.save();
        surface.concat(
            Affine::translate((info.point + info.offset).to_vec2())
                * Affine::rotate(info.angle.to_radians()),
        );
        let center = Point::new(0.0, position.sign() * info.height / 2.0);
        match self.style.shape {
            MarkerShape::Line => {
                let half = Vec2::new(0.0, height / 2.0);
                surface.draw_line(
                    Line::new(center - half, center + half),
                    &Paint::stroke(info.color, width).with_alpha(alpha),
                );
            }
            MarkerShape::Rect => surface.draw_rect(
                Rect::from_center_size(center, (width, height)),
                &Paint::fill(info.color).with_alpha(alpha),
            ),
            MarkerShape::Oval => surface.draw_oval(
                Rect::from_center_size(center, (width, height)),
                &Paint::fill(info.color).with_alpha(alpha),
            ),
        }
        surface.restore();
    }
}

/// Repeated marks spread over the window, like the ticks of a scale.
#[derive(Debug, Default)]
pub struct Notches {
    marker: Marker,
    distribution: Distribution,
}

impl Notches {
    pub fn new(distribution: Distribution, style: MarkerStyle) -> Self {
        Self {
            marker: Marker {
                style,
                on_draw_repetition: None,
            },
            distribution,
        }
    }

    pub fn style(&self) -> MarkerStyle {
        self.marker.style
    }

    pub fn distribution(&self) -> &Distribution {
        &self.distribution
    }

    /// The path distances of each notch, in drawing order.
    fn distances(&self, ctx: &DrawContext<'_>) -> SmallVec<[f64; 16]> {
        let window = ctx.window();
        let config = ctx.config();
        let len = window.len();
        let dir = if window.is_reversed() { -1.0 } else { 1.0 };
        let seamless = ctx.sampler().is_closed() && config.approx_eq(len, ctx.length());

        match &self.distribution {
            Distribution::Count(0) => SmallVec::new(),
            Distribution::Count(1) => SmallVec::from_elem(window.start, 1),
            Distribution::Count(n) if *n > MAX_NOTCHES => {
                log::warn!("ignoring notch count {n}, above {MAX_NOTCHES}");
                SmallVec::new()
            }
            Distribution::Count(n) => {
                let intervals = if seamless { *n } else { n - 1 };
                let step = len / intervals as f64;
                (0..*n).map(|i| window.start + dir * step * i as f64).collect()
            }
            Distribution::Spacing(spacing) => {
                if !spacing.is_finite() || *spacing <= 0.0 {
                    return SmallVec::new();
                }
                let intervals = (len / spacing + 1e-9).floor();
                if intervals >= MAX_NOTCHES as f64 {
                    log::warn!("ignoring notch spacing {spacing}, more than {MAX_NOTCHES} notches");
                    return SmallVec::new();
                }
                let mut count = intervals as usize + 1;
                if seamless && count > 1 && config.approx_eq((count - 1) as f64 * spacing, len) {
                    count -= 1;
                }
                (0..count)
                    .map(|i| window.start + dir * spacing * i as f64)
                    .collect()
            }
            Distribution::Positions(percents) => percents
                .iter()
                .filter(|percent| !percent.is_nan())
                .map(|percent| {
                    let t = percent.clamp(0.0, 100.0) / 100.0;
                    window.start + (window.end - window.start) * t
                })
                .collect(),
        }
    }
}

impl FeatureKind for Notches {
    fn draw_contour(&mut self, ctx: &DrawContext<'_>, surface: &mut dyn Surface) -> Result<()> {
        if ctx.sampler().is_empty() {
            return Ok(());
        }
        let window = ctx.window();
        let position = ctx.config().position;
        let distances = self.distances(ctx);
        log::trace!("drawing {} notches", distances.len());
        for (i, distance) in distances.into_iter().enumerate() {
            if let Some(info) = self.marker.resolve(ctx, &window, i + 1, distance) {
                self.marker.draw(surface, position, &info, 0.0, 255);
            }
        }
        Ok(())
    }

    fn copy_settings(&self, dst: &mut Self) -> bool {
        if dst.marker.style == self.marker.style && dst.distribution == self.distribution {
            return false;
        }
        dst.marker.style = self.marker.style;
        dst.distribution = self.distribution.clone();
        true
    }
}

impl Feature<Notches> {
    /// Spread `count` notches over the window.
    pub fn set_repetitions(&mut self, count: usize) {
        self.set_distribution(Distribution::Count(count));
    }

    /// Place a notch every `spacing` units from the window start.
    pub fn set_spacing(&mut self, spacing: f64) {
        self.set_distribution(Distribution::Spacing(spacing));
    }

    /// Place notches at percentages of the window.
    pub fn set_positions(&mut self, percents: Vec<f64>) {
        self.set_distribution(Distribution::Positions(percents));
    }

    pub fn set_distribution(&mut self, distribution: Distribution) {
        self.update_kind("distribution", distribution, |notches| &mut notches.distribution);
    }

    pub fn set_marker_shape(&mut self, shape: MarkerShape) {
        self.update_kind("marker_shape", shape, |notches| &mut notches.marker.style.shape);
    }

    pub fn set_marker_height(&mut self, height: f64) {
        self.update_kind("marker_height", height.max(0.0), |notches| {
            &mut notches.marker.style.height
        });
    }

    /// Register a hook that can adjust each notch before it is drawn.
    pub fn set_on_draw_repetition(&mut self, hook: impl FnMut(&mut RepetitionInfo) + 'static) {
        self.kind_mut().marker.on_draw_repetition = Some(Box::new(hook));
    }
}

/// A single marker at a settable value, with a halo behind it.
///
/// A pointer always has exactly one repetition, placed at [`value`](Self::value)
/// percent of the path.
#[derive(Debug)]
pub struct Pointer {
    marker: Marker,
    value: f64,
    halo_width: f64,
    halo_alpha: u8,
    pressed: bool,
}

impl Default for Pointer {
    fn default() -> Self {
        Self {
            marker: Marker {
                style: MarkerStyle {
                    shape: MarkerShape::Oval,
                    ..MarkerStyle::default()
                },
                on_draw_repetition: None,
            },
            value: 0.0,
            halo_width: 5.0,
            halo_alpha: 64,
            pressed: false,
        }
    }
}

impl Pointer {
    pub fn new(style: MarkerStyle) -> Self {
        Self {
            marker: Marker {
                style,
                on_draw_repetition: None,
            },
            ..Self::default()
        }
    }

    /// Start at `percent` of the path length.
    pub fn with_value(mut self, percent: f64) -> Self {
        self.value = if percent.is_nan() { 0.0 } else { percent.clamp(0.0, 100.0) };
        self
    }

    pub fn with_halo(mut self, width: f64, alpha: u8) -> Self {
        self.halo_width = width.max(0.0);
        self.halo_alpha = alpha;
        self
    }

    pub fn with_pressed(mut self, pressed: bool) -> Self {
        self.pressed = pressed;
        self
    }

    pub fn style(&self) -> MarkerStyle {
        self.marker.style
    }

    /// Position in percent of the path length.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// How far the halo extends past the pointer on every side.
    pub fn halo_width(&self) -> f64 {
        self.halo_width
    }

    pub fn halo_alpha(&self) -> u8 {
        self.halo_alpha
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// The `(pointer, halo)` alphas for the current pressed state.
    pub fn alphas(&self) -> (u8, u8) {
        if self.pressed {
            (self.halo_alpha, 255)
        } else {
            (255, self.halo_alpha)
        }
    }
}

impl FeatureKind for Pointer {
    fn draw_contour(&mut self, ctx: &DrawContext<'_>, surface: &mut dyn Surface) -> Result<()> {
        if ctx.sampler().is_empty() {
            return Ok(());
        }
        let window = ctx.window();
        let position = ctx.config().position;
        let distance = ctx.distance_for(self.value);
        let Some(info) = self.marker.resolve(ctx, &window, 1, distance) else {
            return Ok(());
        };
        let (primary, halo) = self.alphas();
        if self.halo_width > 0.0 {
            self.marker.draw(surface, position, &info, self.halo_width, halo);
        }
        self.marker.draw(surface, position, &info, 0.0, primary);
        Ok(())
    }

    /// Copies the style, value and halo. The pressed state is not a setting.
    fn copy_settings(&self, dst: &mut Self) -> bool {
        let settings = (self.marker.style, self.value, self.halo_width, self.halo_alpha);
        if (dst.marker.style, dst.value, dst.halo_width, dst.halo_alpha) == settings {
            return false;
        }
        (dst.marker.style, dst.value, dst.halo_width, dst.halo_alpha) = settings;
        true
    }
}

impl Feature<Pointer> {
    /// Move the pointer, in percent of the path length. Clamped to `[0, 100]`.
    pub fn set_value(&mut self, percent: f64) {
        if percent.is_nan() {
            log::warn!("ignoring NaN pointer value");
            return;
        }
        let percent = percent.clamp(0.0, 100.0);
        if self.config().approx_eq(self.kind().value, percent) {
            return;
        }
        self.update_kind("value", percent, |pointer| &mut pointer.value);
    }

    pub fn set_pressed(&mut self, pressed: bool) {
        self.update_kind("pressed", pressed, |pointer| &mut pointer.pressed);
    }

    pub fn set_halo_alpha(&mut self, alpha: u8) {
        self.update_kind("halo_alpha", alpha, |pointer| &mut pointer.halo_alpha);
    }

    pub fn set_halo_width(&mut self, width: f64) {
        self.update_kind("halo_width", width.max(0.0), |pointer| &mut pointer.halo_width);
    }

    pub fn set_marker_shape(&mut self, shape: MarkerShape) {
        self.update_kind("marker_shape", shape, |pointer| &mut pointer.marker.style.shape);
    }

    pub fn set_marker_height(&mut self, height: f64) {
        self.update_kind("marker_height", height.max(0.0), |pointer| {
            &mut pointer.marker.style.height
        });
    }

    /// Register a hook that can adjust the pointer before it is drawn.
    pub fn set_on_draw_repetition(&mut self, hook: impl FnMut(&mut RepetitionInfo) + 'static) {
        self.kind_mut().marker.on_draw_repetition = Some(Box::new(hook));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Canvas;
    use crate::feature::{ContourInfo, FeatureConfig};
    use crate::sampler::PathSampler;
    use peniko::kurbo::{BezPath, Circle, Shape};

    fn line() -> BezPath {
        let mut path = BezPath::new();
        path.move_to((0.0, 50.0));
        path.line_to((100.0, 50.0));
        path
    }

    fn distances(notches: &Notches, path: &BezPath, config: &FeatureConfig) -> Vec<f64> {
        let sampler = PathSampler::new(Some(path), false);
        let info = ContourInfo::new(0, Point::ZERO);
        let ctx = DrawContext::new(config, &sampler, &info);
        notches.distances(&ctx).into_vec()
    }

    fn notches(distribution: Distribution) -> Notches {
        Notches {
            distribution,
            ..Notches::default()
        }
    }

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len(), "{actual:?}");
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-6, "{actual:?} != {expected:?}");
        }
    }

    #[test]
    fn count_on_open_path_includes_both_ends() {
        let config = FeatureConfig::default();
        let found = distances(&notches(Distribution::Count(5)), &line(), &config);
        assert_close(&found, &[0.0, 25.0, 50.0, 75.0, 100.0]);
        assert!(distances(&notches(Distribution::Count(0)), &line(), &config).is_empty());
        assert_close(&distances(&notches(Distribution::Count(1)), &line(), &config), &[0.0]);
    }

    #[test]
    fn count_on_closed_path_skips_the_seam() {
        let ring = Circle::new((50.0, 50.0), 40.0).to_path(0.01);
        let config = FeatureConfig::default();
        let found = distances(&notches(Distribution::Count(4)), &ring, &config);
        let length = PathSampler::new(Some(&ring), false).length();
        assert_close(&found, &[0.0, length / 4.0, length / 2.0, length * 0.75]);

        // A partial window still includes both ends.
        let config = FeatureConfig {
            end_percent: 50.0,
            ..FeatureConfig::default()
        };
        let found = distances(&notches(Distribution::Count(3)), &ring, &config);
        assert_close(&found, &[0.0, length / 4.0, length / 2.0]);
    }

    #[test]
    fn spacing_and_positions_follow_the_window() {
        let config = FeatureConfig {
            start_percent: 80.0,
            end_percent: 20.0,
            ..FeatureConfig::default()
        };
        let found = distances(&notches(Distribution::Spacing(25.0)), &line(), &config);
        assert_close(&found, &[80.0, 55.0, 30.0]);
        let found = distances(
            &notches(Distribution::Positions(vec![0.0, 50.0, 150.0])),
            &line(),
            &config,
        );
        assert_close(&found, &[80.0, 50.0, 20.0]);
        assert!(distances(&notches(Distribution::Spacing(0.0)), &line(), &config).is_empty());
    }

    #[test]
    fn oversized_distributions_draw_nothing() {
        let config = FeatureConfig::default();
        for spacing in [1e-300, 1e-3, f64::MIN_POSITIVE] {
            let found = distances(&notches(Distribution::Spacing(spacing)), &line(), &config);
            assert!(found.is_empty(), "{spacing}");
        }
        let found = distances(&notches(Distribution::Count(usize::MAX)), &line(), &config);
        assert!(found.is_empty());
        // Right at the limit is still drawn.
        let spacing = 100.0 / (MAX_NOTCHES - 1) as f64;
        let found = distances(&notches(Distribution::Spacing(spacing)), &line(), &config);
        assert_eq!(found.len(), MAX_NOTCHES);

        let mut feature = Feature::new(Notches::default());
        feature.set_path(Some(line()));
        feature.set_spacing(1e-300);
        let mut canvas = Canvas::new(120, 100);
        feature.draw(&mut canvas).unwrap();
        assert!(canvas.pixmap().data().iter().all(|p| p.a == 0));
    }

    #[test]
    fn markers_skip_paths_without_segments() {
        let mut empty = BezPath::new();
        empty.move_to((60.0, 60.0));

        let mut notches = Feature::new(Notches::default());
        notches.set_path(Some(empty.clone()));
        notches.set_marker_shape(MarkerShape::Rect);
        notches.set_width(4.0);
        let mut canvas = Canvas::new(120, 100);
        notches.draw(&mut canvas).unwrap();
        assert!(canvas.pixmap().data().iter().all(|p| p.a == 0));

        let mut pointer = Feature::new(Pointer::default());
        pointer.set_path(Some(empty));
        pointer.set_width(6.0);
        pointer.draw(&mut canvas).unwrap();
        assert!(canvas.pixmap().data().iter().all(|p| p.a == 0));
    }

    #[test]
    fn notch_hook_can_hide_repetitions() {
        let mut feature = Feature::new(Notches::default());
        feature.set_path(Some(line()));
        feature.set_repetitions(3);
        feature.set_marker_shape(MarkerShape::Rect);
        feature.set_width(4.0);
        feature.set_on_draw_repetition(|info| info.visible = info.index != 2);
        let mut canvas = Canvas::new(120, 100);
        feature.draw(&mut canvas).unwrap();
        let pixmap = canvas.pixmap();
        assert_ne!(pixmap.sample(0, 50).a, 0);
        assert_eq!(pixmap.sample(50, 50).a, 0);
        assert_ne!(pixmap.sample(99, 50).a, 0);
    }

    #[test]
    fn pressed_swaps_alphas() {
        let mut feature = Feature::new(Pointer::default());
        feature.set_halo_alpha(80);
        assert_eq!(feature.kind().alphas(), (255, 80));
        feature.set_pressed(true);
        assert_eq!(feature.kind().alphas(), (80, 255));
    }

    #[test]
    fn pointer_sits_at_its_value() {
        let mut feature = Feature::new(Pointer::default());
        feature.set_path(Some(line()));
        feature.set_width(6.0);
        feature.set_halo_width(0.0);
        feature.set_value(40.0);
        let mut canvas = Canvas::new(120, 100);
        feature.draw(&mut canvas).unwrap();
        let pixmap = canvas.pixmap();
        assert_eq!(pixmap.sample(40, 50).a, 255);
        assert_eq!(pixmap.sample(10, 50).a, 0);

        feature.set_value(250.0);
        assert_eq!(feature.kind().value(), 100.0);
    }
}
