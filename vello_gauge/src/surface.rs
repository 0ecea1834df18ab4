// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The rendering target abstraction and the paints used with it.

use std::sync::Arc;

use peniko::kurbo::{Affine, BezPath, Cap, Circle, Ellipse, Line, Point, Rect, Shape, Stroke};
use peniko::{Color, Extend};

use crate::pixmap::Pixmap;

/// Tolerance used when converting shapes to paths.
pub const DEFAULT_TOLERANCE: f64 = 0.1;

/// How a primitive is painted.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum PaintStyle {
    /// Fill the interior.
    #[default]
    Fill,
    /// Stroke the outline with the paint's [`Stroke`].
    Stroke,
    /// Fill, then stroke.
    FillAndStroke,
}

/// A pixmap used as a repeating or clamped fill.
///
/// `transform` maps pixmap pixel coordinates to device coordinates, so an identity
/// transform lines the texture up with the device pixel grid.
#[derive(Clone, Debug)]
pub struct Texture {
    /// The pixels.
    pub pixmap: Arc<Pixmap>,
    /// Addressing mode outside of the pixmap bounds, applied on both axes.
    /// Sampling is nearest neighbor.
    pub extend: Extend,
    /// Pixmap space to device space.
    pub transform: Affine,
}

impl Texture {
    /// A device-aligned texture with the given addressing mode.
    pub fn new(pixmap: Arc<Pixmap>, extend: Extend) -> Self {
        Self {
            pixmap,
            extend,
            transform: Affine::IDENTITY,
        }
    }
}

/// Where the color of a painted pixel comes from.
#[derive(Clone, Debug)]
pub enum Shader {
    /// A single straight-alpha color.
    Solid(Color),
    /// A pixmap texture.
    Texture(Texture),
}

impl From<Color> for Shader {
    fn from(color: Color) -> Self {
        Self::Solid(color)
    }
}

/// Everything needed to draw a primitive.
#[derive(Clone, Debug)]
pub struct Paint {
    /// Color source.
    pub shader: Shader,
    /// Fill and/or stroke.
    pub style: PaintStyle,
    /// Stroke width and caps. Also sizes points drawn with [`Surface::draw_point`].
    pub stroke: Stroke,
    /// Extra opacity applied on top of the shader.
    pub alpha: u8,
}

impl Paint {
    /// A solid fill paint.
    pub fn fill(color: Color) -> Self {
        Self {
            shader: color.into(),
            style: PaintStyle::Fill,
            stroke: Stroke::new(1.0).with_caps(Cap::Butt),
            alpha: 255,
        }
    }

    /// A solid stroke paint of the given width with butt caps.
    pub fn stroke(color: Color, width: f64) -> Self {
        Self {
            shader: color.into(),
            style: PaintStyle::Stroke,
            stroke: Stroke::new(width).with_caps(Cap::Butt),
            alpha: 255,
        }
    }

    /// A fill paint reading from a texture.
    pub fn texture(texture: Texture) -> Self {
        Self {
            shader: Shader::Texture(texture),
            ..Self::fill(Color::TRANSPARENT)
        }
    }

    /// Replace the stroke caps.
    pub fn with_cap(mut self, cap: Cap) -> Self {
        self.stroke.start_cap = cap;
        self.stroke.end_cap = cap;
        self
    }

    /// Replace the alpha.
    pub fn with_alpha(mut self, alpha: u8) -> Self {
        self.alpha = alpha;
        self
    }
}

/// A drawing target.
///
/// Coordinates passed to the drawing methods are in user space and mapped to device
/// space by the current [transform](Surface::transform). The primitive methods have
/// default implementations in terms of [`fill_path`](Surface::fill_path) and
/// [`stroke_path`](Surface::stroke_path).
pub trait Surface {
    /// Width of the surface in device pixels.
    fn width(&self) -> u16;

    /// Height of the surface in device pixels.
    fn height(&self) -> u16;

    /// Push the current transform.
    fn save(&mut self);

    /// Pop the transform pushed by the matching [`save`](Surface::save).
    fn restore(&mut self);

    /// The current user space to device space transform.
    fn transform(&self) -> Affine;

    /// Replace the current transform.
    fn set_transform(&mut self, transform: Affine);

    /// Pre-multiply the current transform, so `transform` applies to user coordinates first.
    fn concat(&mut self, transform: Affine) {
        let current = self.transform();
        self.set_transform(current * transform);
    }

    /// Fill a path with the non-zero winding rule.
    fn fill_path(&mut self, path: &BezPath, paint: &Paint);

    /// Stroke a path using [`Paint::stroke`].
    fn stroke_path(&mut self, path: &BezPath, paint: &Paint);

    /// Composite a pixmap, placed in user space by `transform`.
    fn draw_pixmap(&mut self, pixmap: &Pixmap, transform: Affine);

    /// Draw a path according to [`Paint::style`].
    fn draw_path(&mut self, path: &BezPath, paint: &Paint) {
        match paint.style {
            PaintStyle::Fill => self.fill_path(path, paint),
            PaintStyle::Stroke => self.stroke_path(path, paint),
            PaintStyle::FillAndStroke => {
                self.fill_path(path, paint);
                self.stroke_path(path, paint);
            }
        }
    }

    /// Draw a single point sized by the stroke width.
    ///
    /// Round caps produce a disc, every other cap a square.
    fn draw_point(&mut self, point: Point, paint: &Paint) {
        let size = paint.stroke.width;
        if size <= 0.0 {
            return;
        }
        let path = match paint.stroke.start_cap {
            Cap::Round => Circle::new(point, size / 2.0).to_path(DEFAULT_TOLERANCE),
            Cap::Butt | Cap::Square => {
                Rect::from_center_size(point, (size, size)).to_path(DEFAULT_TOLERANCE)
            }
        };
        self.fill_path(&path, paint);
    }

    /// Stroke a line.
    fn draw_line(&mut self, line: Line, paint: &Paint) {
        self.stroke_path(&line.to_path(DEFAULT_TOLERANCE), paint);
    }

    /// Draw a rectangle.
    fn draw_rect(&mut self, rect: Rect, paint: &Paint) {
        self.draw_path(&rect.to_path(DEFAULT_TOLERANCE), paint);
    }

    /// Draw the oval inscribed in `rect`.
    fn draw_oval(&mut self, rect: Rect, paint: &Paint) {
        self.draw_path(&Ellipse::from_rect(rect).to_path(DEFAULT_TOLERANCE), paint);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paint_builders() {
        let paint = Paint::stroke(Color::WHITE, 3.0)
            .with_cap(Cap::Round)
            .with_alpha(128);
        assert_eq!(paint.style, PaintStyle::Stroke);
        assert_eq!(paint.stroke.width, 3.0);
        assert_eq!(paint.stroke.end_cap, Cap::Round);
        assert_eq!(paint.alpha, 128);

        let texture = Texture::new(Arc::new(Pixmap::new(2, 2)), Extend::Repeat);
        let paint = Paint::texture(texture);
        assert_eq!(paint.style, PaintStyle::Fill);
        assert!(matches!(
            paint.shader,
            Shader::Texture(Texture {
                extend: Extend::Repeat,
                ..
            })
        ));
    }
}
