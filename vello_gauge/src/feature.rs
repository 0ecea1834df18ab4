// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The machinery shared by everything drawn along a path.

use std::fmt;

use peniko::kurbo::{Affine, BezPath, Cap, Point, Vec2};
use peniko::Color;

use crate::canvas::Canvas;
use crate::interpolate::{interpolate_color, interpolate_value};
use crate::marker::{Distribution, MarkerShape};
use crate::pixmap::Pixmap;
use crate::sampler::PathSampler;
use crate::surface::Surface;
use crate::Result;

/// Which side of the path a feature is drawn on.
///
/// "Inside" is the side the path normal points to, i.e. the tangent rotated by +90°.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Position {
    /// Entirely on the inner side of the path.
    Inside,
    /// Centered on the path.
    #[default]
    Middle,
    /// Entirely on the outer side of the path.
    Outside,
}

impl Position {
    /// Sign of the shift from the path to the feature's center line.
    pub fn sign(self) -> f64 {
        match self {
            Self::Inside => 1.0,
            Self::Middle => 0.0,
            Self::Outside => -1.0,
        }
    }
}

/// How much a ribbon pulls its ends back from the window's cut points.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum EdgeTreatment {
    /// Trim a full half width, so caps stay inside the window.
    Inside,
    /// Trim half of the half width.
    Middle,
    /// No trimming.
    #[default]
    Outside,
}

impl EdgeTreatment {
    /// How far to trim an end whose half width is `half_width`.
    pub fn trim(self, half_width: f64) -> f64 {
        match self {
            Self::Inside => half_width,
            Self::Middle => half_width / 2.0,
            Self::Outside => 0.0,
        }
    }
}

/// Color lookup mode.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ColorInterpolation {
    /// Step between colors.
    Solid,
    /// Blend neighbouring colors.
    #[default]
    Gradient,
}

/// Width lookup mode.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum WidthInterpolation {
    /// Step between widths.
    Rough,
    /// Blend neighbouring widths.
    #[default]
    Smooth,
}

/// The value carried by a property change notification.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum PropertyValue {
    Bool(bool),
    Number(f64),
    Count(usize),
    Alpha(u8),
    Color(Color),
    Colors(Vec<Color>),
    Widths(Vec<f64>),
    Position(Position),
    EdgeTreatment(EdgeTreatment),
    ColorInterpolation(ColorInterpolation),
    WidthInterpolation(WidthInterpolation),
    Cap(Cap),
    Shape(MarkerShape),
    Distribution(Distribution),
    Path(Option<BezPath>),
    Tag(Option<String>),
    /// A whole configuration was replaced, see [`Feature::copy_to`].
    Config(Box<FeatureConfig>),
    /// The kind's own settings were replaced, see [`Feature::copy_all_to`].
    KindSettings,
}

macro_rules! impl_from_for_property {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for PropertyValue {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

impl_from_for_property! {
    bool => Bool,
    f64 => Number,
    usize => Count,
    u8 => Alpha,
    Color => Color,
    Vec<Color> => Colors,
    Vec<f64> => Widths,
    Position => Position,
    EdgeTreatment => EdgeTreatment,
    ColorInterpolation => ColorInterpolation,
    WidthInterpolation => WidthInterpolation,
    Cap => Cap,
    MarkerShape => Shape,
    Distribution => Distribution,
    Option<BezPath> => Path,
    Option<String> => Tag,
}

/// Configuration shared by all features.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureConfig {
    /// Free-form identifier, used by [`Gauge::find`](crate::Gauge::find).
    pub tag: Option<String>,
    pub visible: bool,
    /// Start of the window, in percent of the path length.
    pub start_percent: f64,
    /// End of the window, in percent of the path length. May be below `start_percent`.
    pub end_percent: f64,
    pub position: Position,
    pub edge_treatment: EdgeTreatment,
    /// Used when `colors` is empty.
    pub color: Color,
    pub colors: Vec<Color>,
    pub color_interpolation: ColorInterpolation,
    /// Used when `widths` is empty.
    pub width: f64,
    pub widths: Vec<f64>,
    pub width_interpolation: WidthInterpolation,
    /// Draw each contour on its own, re-rendering on every draw.
    pub consider_contours: bool,
    /// Close every open contour when measuring.
    pub force_closed: bool,
    /// Decimal places used by [`FeatureConfig::approx_eq`].
    pub float_precision: u32,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            tag: None,
            visible: true,
            start_percent: 0.0,
            end_percent: 100.0,
            position: Position::default(),
            edge_treatment: EdgeTreatment::default(),
            color: Color::BLACK,
            colors: vec![],
            color_interpolation: ColorInterpolation::default(),
            width: 1.0,
            widths: vec![],
            width_interpolation: WidthInterpolation::default(),
            consider_contours: false,
            force_closed: false,
            float_precision: 3,
        }
    }
}

impl FeatureConfig {
    /// Compare two values after rounding both to `float_precision` decimal places.
    pub fn approx_eq(&self, a: f64, b: f64) -> bool {
        let scale = 10_f64.powi(self.float_precision.min(15) as i32);
        (a * scale).round() == (b * scale).round()
    }

    /// The distance at `percent` of `length`, with `percent` clamped to `[0, 100]`.
    pub fn distance_for(&self, percent: f64, length: f64) -> f64 {
        let percent = if percent.is_nan() { 0.0 } else { percent.clamp(0.0, 100.0) };
        if self.approx_eq(percent, 0.0) {
            0.0
        } else if self.approx_eq(percent, 100.0) {
            length
        } else {
            percent * (length / 100.0)
        }
    }

    /// The window distances on a path of `length`.
    pub fn window(&self, length: f64) -> Window {
        Window {
            start: self.distance_for(self.start_percent, length),
            end: self.distance_for(self.end_percent, length),
        }
    }

    /// Color at `distance` over `length`.
    pub fn gradient_color(&self, distance: f64, length: f64) -> Color {
        let ratio = if length == 0.0 { 0.0 } else { distance / length };
        let smooth = self.color_interpolation == ColorInterpolation::Gradient;
        interpolate_color(&self.colors, ratio, smooth).unwrap_or(self.color)
    }

    /// Width at `distance` over `length`.
    pub fn width_at(&self, distance: f64, length: f64) -> f64 {
        let ratio = if length == 0.0 { 0.0 } else { distance / length };
        let smooth = self.width_interpolation == WidthInterpolation::Smooth;
        interpolate_value(&self.widths, ratio, smooth, self.width)
    }
}

/// The `[start, end]` distance range a feature is drawn in.
///
/// `start > end` is a reversed window, traced from `start` backward to `end`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Window {
    pub start: f64,
    pub end: f64,
}

impl Window {
    /// The covered distance.
    pub fn len(&self) -> f64 {
        (self.end - self.start).abs()
    }

    /// Whether both ends are at the same distance.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn is_reversed(&self) -> bool {
        self.start > self.end
    }

    /// Position of `distance` in the window, `0` at `start` and `1` at `end`.
    pub fn ratio(&self, distance: f64) -> f64 {
        let span = self.end - self.start;
        if span == 0.0 {
            0.0
        } else {
            (distance - self.start) / span
        }
    }

    /// Whether `distance` lies between the two ends.
    pub fn contains(&self, distance: f64) -> bool {
        let (lo, hi) = if self.is_reversed() {
            (self.end, self.start)
        } else {
            (self.start, self.end)
        };
        distance >= lo && distance <= hi
    }
}

/// Per-contour drawing parameters, which a pre-draw hook may override.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ContourInfo {
    /// 1-based contour index, or `0` when the whole path is drawn at once.
    pub index: usize,
    pub visible: bool,
    /// Rotation in degrees around `pivot`.
    pub angle: f64,
    /// Scale around `pivot`.
    pub scale: Vec2,
    /// Translation applied after rotation and scale.
    pub offset: Vec2,
    /// Center of the contour's bounding box.
    pub pivot: Point,
}

impl ContourInfo {
    /// Identity parameters for the contour at `index`.
    pub fn new(index: usize, pivot: Point) -> Self {
        Self {
            index,
            visible: true,
            angle: 0.0,
            scale: Vec2::new(1.0, 1.0),
            offset: Vec2::ZERO,
            pivot,
        }
    }

    /// The transform applied while this contour is drawn.
    pub fn transform(&self) -> Affine {
        let pivot = self.pivot.to_vec2();
        Affine::translate(self.offset)
            * rotate_about(self.angle.to_radians(), self.pivot)
            * Affine::translate(pivot)
            * Affine::scale_non_uniform(self.scale.x, self.scale.y)
            * Affine::translate(-pivot)
    }
}

pub(crate) fn rotate_about(radians: f64, pivot: Point) -> Affine {
    let pivot = pivot.to_vec2();
    Affine::translate(pivot) * Affine::rotate(radians) * Affine::translate(-pivot)
}

/// What a feature sees while one contour is drawn.
///
/// Geometry queries go to the sampler of the contour being drawn when contours are
/// considered separately, and to the whole path otherwise.
#[derive(Clone, Copy)]
pub struct DrawContext<'a> {
    config: &'a FeatureConfig,
    sampler: &'a PathSampler,
    contour: &'a ContourInfo,
}

impl<'a> DrawContext<'a> {
    /// Assemble a context by hand, mostly useful for driving a [`FeatureKind`] directly.
    pub fn new(config: &'a FeatureConfig, sampler: &'a PathSampler, contour: &'a ContourInfo) -> Self {
        Self {
            config,
            sampler,
            contour,
        }
    }

    pub fn config(&self) -> &'a FeatureConfig {
        self.config
    }

    pub fn sampler(&self) -> &'a PathSampler {
        self.sampler
    }

    pub fn contour(&self) -> &'a ContourInfo {
        self.contour
    }

    pub fn length(&self) -> f64 {
        self.sampler.length()
    }

    pub fn point_and_tangent(&self, distance: f64) -> (Point, f64) {
        self.sampler.point_and_tangent(distance)
    }

    pub fn distance_for(&self, percent: f64) -> f64 {
        self.config.distance_for(percent, self.length())
    }

    pub fn window(&self) -> Window {
        self.config.window(self.length())
    }

    /// Color at `distance`, measured over `length_override` or the path length.
    pub fn gradient_color(&self, distance: f64, length_override: Option<f64>) -> Color {
        let length = length_override.unwrap_or_else(|| self.length());
        self.config.gradient_color(distance, length)
    }

    /// Width at `distance`, measured over `length_override` or the path length.
    pub fn width_at(&self, distance: f64, length_override: Option<f64>) -> f64 {
        let length = length_override.unwrap_or_else(|| self.length());
        self.config.width_at(distance, length)
    }

    /// Color at a path distance, with the window ends as the first and last color.
    pub fn window_color(&self, window: &Window, distance: f64) -> Color {
        self.gradient_color(window.ratio(distance), Some(1.0))
    }

    /// Width at a path distance, with the window ends as the first and last width.
    pub fn window_width(&self, window: &Window, distance: f64) -> f64 {
        self.width_at(window.ratio(distance), Some(1.0))
    }
}

impl fmt::Debug for DrawContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DrawContext")
            .field("contour", self.contour)
            .field("length", &self.length())
            .finish_non_exhaustive()
    }
}

/// The part of a feature that decides what gets drawn.
pub trait FeatureKind {
    /// Draw one contour (or the whole path) into `surface`.
    ///
    /// The surface transform already includes the contour transform.
    fn draw_contour(&mut self, ctx: &DrawContext<'_>, surface: &mut dyn Surface) -> Result<()>;

    /// Drop any cached drawing data. Called on every property change and refresh.
    fn invalidate(&mut self) {}

    /// Copy the kind's own settings (not its hooks or caches) into `dst`.
    ///
    /// Returns whether anything changed.
    fn copy_settings(&self, dst: &mut Self) -> bool
    where
        Self: Sized,
    {
        let _ = dst;
        false
    }
}

type PropertyListener = Box<dyn FnMut(&str, &PropertyValue)>;
type ContourListener = Box<dyn FnMut(&mut ContourInfo)>;

/// Something drawn along a path.
///
/// The feature owns the path, its [`PathSampler`] and a raster of the last rendering.
/// The raster is reused by [`draw`](Self::draw) until a property changes or the surface
/// size or transform differs from the one it was rendered for. When
/// [`consider_contours`](FeatureConfig::consider_contours) is set, every draw renders again.
pub struct Feature<K> {
    config: FeatureConfig,
    path: Option<BezPath>,
    sampler: PathSampler,
    raster: Option<Pixmap>,
    /// Surface transform the raster was rendered with.
    raster_transform: Affine,
    dirty: bool,
    on_property_change: Option<PropertyListener>,
    on_draw_contour: Option<ContourListener>,
    kind: K,
}

impl<K: FeatureKind + Default> Default for Feature<K> {
    fn default() -> Self {
        Self::new(K::default())
    }
}

impl<K: fmt::Debug> fmt::Debug for Feature<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Feature")
            .field("config", &self.config)
            .field("length", &self.sampler.length())
            .field("dirty", &self.dirty)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl<K: FeatureKind> Feature<K> {
    /// Create a feature with the default configuration.
    pub fn new(kind: K) -> Self {
        Self::with_config(kind, FeatureConfig::default())
    }

    /// Create a feature with the given configuration.
    pub fn with_config(kind: K, config: FeatureConfig) -> Self {
        Self {
            config,
            path: None,
            sampler: PathSampler::default(),
            raster: None,
            raster_transform: Affine::IDENTITY,
            dirty: true,
            on_property_change: None,
            on_draw_contour: None,
            kind,
        }
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    pub fn kind(&self) -> &K {
        &self.kind
    }

    /// Mutable access to the kind. Marks the raster dirty.
    pub(crate) fn kind_mut(&mut self) -> &mut K {
        self.dirty = true;
        &mut self.kind
    }

    pub fn path(&self) -> Option<&BezPath> {
        self.path.as_ref()
    }

    pub fn sampler(&self) -> &PathSampler {
        &self.sampler
    }

    /// Whether the next draw renders again.
    pub fn is_dirty(&self) -> bool {
        self.dirty || self.config.consider_contours
    }

    /// The raster of the last complete rendering.
    pub fn raster(&self) -> Option<&Pixmap> {
        self.raster.as_ref()
    }

    /// Register the listener told about every property change.
    pub fn set_on_property_change(&mut self, listener: impl FnMut(&str, &PropertyValue) + 'static) {
        self.on_property_change = Some(Box::new(listener));
    }

    /// Register a hook that can adjust each contour before it is drawn.
    pub fn set_on_draw_contour(&mut self, listener: impl FnMut(&mut ContourInfo) + 'static) {
        self.on_draw_contour = Some(Box::new(listener));
    }

    /// Mark the raster dirty and tell the listener.
    ///
    /// All setters go through here when, and only when, they change a value.
    pub fn on_property_change(&mut self, name: &str, value: PropertyValue) {
        log::trace!("feature property `{name}` changed");
        self.dirty = true;
        self.kind.invalidate();
        if let Some(listener) = &mut self.on_property_change {
            listener(name, &value);
        }
    }

    /// Force the next draw to render again and re-measure contours.
    pub fn refresh(&mut self) {
        self.dirty = true;
        self.kind.invalidate();
        self.sampler.refresh();
    }

    fn update<T>(&mut self, name: &str, value: T, field: impl FnOnce(&mut FeatureConfig) -> &mut T)
    where
        T: PartialEq + Clone + Into<PropertyValue>,
    {
        let slot = field(&mut self.config);
        if *slot == value {
            return;
        }
        *slot = value.clone();
        self.on_property_change(name, value.into());
    }

    /// Like the config setters, for state owned by the kind.
    pub(crate) fn update_kind<T>(&mut self, name: &str, value: T, field: impl FnOnce(&mut K) -> &mut T)
    where
        T: PartialEq + Clone + Into<PropertyValue>,
    {
        let slot = field(&mut self.kind);
        if *slot == value {
            return;
        }
        *slot = value.clone();
        self.on_property_change(name, value.into());
    }

    fn update_percent(&mut self, name: &str, percent: f64, field: fn(&mut FeatureConfig) -> &mut f64) {
        if percent.is_nan() {
            log::warn!("ignoring NaN for `{name}`");
            return;
        }
        let percent = percent.clamp(0.0, 100.0);
        let current = *field(&mut self.config);
        if self.config.approx_eq(current, percent) {
            return;
        }
        *field(&mut self.config) = percent;
        self.on_property_change(name, percent.into());
    }

    /// Replace the path and re-measure it.
    pub fn set_path(&mut self, path: Option<BezPath>) {
        if self.path == path {
            return;
        }
        self.sampler.set_path(path.as_ref(), self.config.force_closed);
        self.path = path.clone();
        self.on_property_change("path", path.into());
    }

    pub fn set_tag(&mut self, tag: Option<String>) {
        self.update("tag", tag, |c| &mut c.tag);
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.update("visible", visible, |c| &mut c.visible);
    }

    /// Set the window start, clamped to `[0, 100]`.
    pub fn set_start_percent(&mut self, percent: f64) {
        self.update_percent("start_percent", percent, |c| &mut c.start_percent);
    }

    /// Set the window end, clamped to `[0, 100]`.
    pub fn set_end_percent(&mut self, percent: f64) {
        self.update_percent("end_percent", percent, |c| &mut c.end_percent);
    }

    pub fn set_position(&mut self, position: Position) {
        self.update("position", position, |c| &mut c.position);
    }

    pub fn set_edge_treatment(&mut self, edge_treatment: EdgeTreatment) {
        self.update("edge_treatment", edge_treatment, |c| &mut c.edge_treatment);
    }

    /// The color used when no color sequence is set.
    pub fn set_color(&mut self, color: Color) {
        self.update("color", color, |c| &mut c.color);
    }

    pub fn set_colors(&mut self, colors: Vec<Color>) {
        self.update("colors", colors, |c| &mut c.colors);
    }

    pub fn set_color_interpolation(&mut self, mode: ColorInterpolation) {
        self.update("color_interpolation", mode, |c| &mut c.color_interpolation);
    }

    /// The width used when no width sequence is set.
    pub fn set_width(&mut self, width: f64) {
        self.update("width", width.max(0.0), |c| &mut c.width);
    }

    /// Set the width sequence. Negative widths are raised to zero.
    pub fn set_widths(&mut self, widths: Vec<f64>) {
        let widths = widths.into_iter().map(|w| w.max(0.0)).collect::<Vec<_>>();
        self.update("widths", widths, |c| &mut c.widths);
    }

    pub fn set_width_interpolation(&mut self, mode: WidthInterpolation) {
        self.update("width_interpolation", mode, |c| &mut c.width_interpolation);
    }

    pub fn set_consider_contours(&mut self, consider: bool) {
        self.update("consider_contours", consider, |c| &mut c.consider_contours);
    }

    /// Measure open contours as if they were closed.
    pub fn set_force_closed(&mut self, force_closed: bool) {
        if self.config.force_closed == force_closed {
            return;
        }
        self.config.force_closed = force_closed;
        self.sampler.set_path(self.path.as_ref(), force_closed);
        self.on_property_change("force_closed", force_closed.into());
    }

    /// Decimal places kept when comparing percentages.
    pub fn set_float_precision(&mut self, decimals: u32) {
        if self.config.float_precision == decimals {
            return;
        }
        self.config.float_precision = decimals;
        self.on_property_change("float_precision", (decimals as usize).into());
    }

    /// Copy the configuration into `dst`, which may be of another kind.
    ///
    /// Sequences are cloned, never shared. The tag of `dst` is kept.
    pub fn copy_to<D: FeatureKind>(&self, dst: &mut Feature<D>) {
        let config = FeatureConfig {
            tag: dst.config.tag.clone(),
            ..self.config.clone()
        };
        if dst.config == config {
            return;
        }
        let force_closed_changed = dst.config.force_closed != config.force_closed;
        dst.config = config;
        if force_closed_changed {
            dst.sampler.set_path(dst.path.as_ref(), dst.config.force_closed);
        }
        let value = PropertyValue::Config(Box::new(dst.config.clone()));
        dst.on_property_change("config", value);
    }

    /// Like [`copy_to`](Self::copy_to), also copying the settings of the kind.
    pub fn copy_all_to(&self, dst: &mut Self) {
        self.copy_to(dst);
        if self.kind.copy_settings(&mut dst.kind) {
            dst.on_property_change("kind_settings", PropertyValue::KindSettings);
        }
    }

    /// Distance at `percent` of the whole path.
    pub fn distance_for(&self, percent: f64) -> f64 {
        self.config.distance_for(percent, self.sampler.length())
    }

    /// Color at `distance`, measured over `length_override` or the whole path length.
    pub fn gradient_color(&self, distance: f64, length_override: Option<f64>) -> Color {
        let length = length_override.unwrap_or_else(|| self.sampler.length());
        self.config.gradient_color(distance, length)
    }

    /// Width at `distance`, measured over `length_override` or the whole path length.
    pub fn width_at(&self, distance: f64, length_override: Option<f64>) -> f64 {
        let length = length_override.unwrap_or_else(|| self.sampler.length());
        self.config.width_at(distance, length)
    }

    /// Draw onto `surface`, rendering again first if the raster is stale.
    ///
    /// Nothing happens when the feature is hidden, has no path or the surface has no
    /// pixels. If rendering fails, the previous raster is kept and the feature stays dirty.
    pub fn draw(&mut self, surface: &mut dyn Surface) -> Result<()> {
        if !self.config.visible || self.path.is_none() {
            return Ok(());
        }
        let (width, height) = (surface.width(), surface.height());
        if width == 0 || height == 0 {
            return Ok(());
        }

        let transform = surface.transform();
        let stale = self.raster.as_ref().map_or(true, |raster| {
            raster.width() != width
                || raster.height() != height
                || self.raster_transform != transform
        });
        if self.is_dirty() || stale {
            log::debug!("rendering feature raster at {width}x{height}");
            let mut canvas = Canvas::new(width, height);
            canvas.set_transform(transform);
            self.render_contours(&mut canvas)?;
            self.raster = Some(canvas.into_pixmap());
            self.raster_transform = transform;
            self.dirty = false;
        }

        if let Some(raster) = &self.raster {
            surface.save();
            surface.set_transform(Affine::IDENTITY);
            surface.draw_pixmap(raster, Affine::IDENTITY);
            surface.restore();
        }
        Ok(())
    }

    fn render_contours(&mut self, canvas: &mut Canvas) -> Result<()> {
        let consider = self.config.consider_contours;
        let count = if consider {
            self.sampler.contour_count()
        } else {
            1
        };
        for n in 1..=count {
            let sampler = if consider {
                self.sampler.contour(n)?
            } else {
                &self.sampler
            };
            let mut info = ContourInfo::new(if consider { n } else { 0 }, sampler.bounds().center());
            if let Some(hook) = &mut self.on_draw_contour {
                hook(&mut info);
            }
            if !info.visible {
                log::trace!("skipping hidden contour {}", info.index);
                continue;
            }

            log::trace!("drawing contour {}", info.index);
            canvas.save();
            canvas.concat(info.transform());
            let ctx = DrawContext::new(&self.config, sampler, &info);
            let result = self.kind.draw_contour(&ctx, canvas);
            canvas.restore();
            result?;
        }
        Ok(())
    }
}
