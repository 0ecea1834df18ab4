// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A software [`Surface`] rendering into a [`Pixmap`] with tiny-skia.
//!
//! Anti-aliasing is off: a pixel is painted when its center lies inside the
//! shape under the non-zero winding rule. Raster output is exact and
//! reproducible, which is what the feature caches need.

use peniko::kurbo::{Affine, BezPath, Cap, Join, PathEl, Stroke};
use peniko::Extend;
use tiny_skia::{
    FillRule, FilterQuality, LineCap, LineJoin, PathBuilder, Pattern, PixmapPaint, SpreadMode,
    StrokeDash, Transform,
};

use crate::pixmap::{to_skia_color, Pixmap};
use crate::surface::{Paint, Shader, Surface};

/// A software render context.
#[derive(Debug, Clone)]
pub struct Canvas {
    pixmap: Pixmap,
    transform: Affine,
    stack: Vec<Affine>,
}

impl Canvas {
    /// Create a new canvas with the given width and height in pixels.
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            pixmap: Pixmap::new(width, height),
            transform: Affine::IDENTITY,
            stack: vec![],
        }
    }

    /// The pixels rendered so far.
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Consume the canvas, returning its pixels.
    pub fn into_pixmap(self) -> Pixmap {
        self.pixmap
    }

    /// Clear the pixels and reset the transform state.
    pub fn reset(&mut self) {
        self.pixmap.clear();
        self.transform = Affine::IDENTITY;
        self.stack.clear();
    }

    /// Whether the current transform can map anything onto the pixmap.
    fn is_drawable(&self) -> bool {
        self.transform.is_finite() && self.transform.determinant() != 0.0
    }

    fn skia_paint<'a>(&self, paint: &'a Paint) -> Option<tiny_skia::Paint<'a>> {
        let opacity = f32::from(paint.alpha) / 255.0;
        let shader = match &paint.shader {
            Shader::Solid(color) => {
                let mut color = to_skia_color(*color);
                color.apply_opacity(opacity);
                tiny_skia::Shader::SolidColor(color)
            }
            Shader::Texture(texture) => {
                // Textures live in device space; tiny-skia applies the path transform to
                // shaders as well.
                let local = self.transform.inverse() * texture.transform;
                Pattern::new(
                    texture.pixmap.as_skia()?,
                    spread_mode(texture.extend),
                    FilterQuality::Nearest,
                    opacity,
                    to_transform(local),
                )
            }
        };
        Some(tiny_skia::Paint {
            shader,
            anti_alias: false,
            ..tiny_skia::Paint::default()
        })
    }
}

fn to_transform(affine: Affine) -> Transform {
    let [a, b, c, d, e, f] = affine.as_coeffs();
    Transform::from_row(a as f32, b as f32, c as f32, d as f32, e as f32, f as f32)
}

fn to_path(path: &BezPath) -> Option<tiny_skia::Path> {
    let mut builder = PathBuilder::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => builder.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => builder.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(p1, p) => {
                builder.quad_to(p1.x as f32, p1.y as f32, p.x as f32, p.y as f32);
            }
            PathEl::CurveTo(p1, p2, p) => builder.cubic_to(
                p1.x as f32,
                p1.y as f32,
                p2.x as f32,
                p2.y as f32,
                p.x as f32,
                p.y as f32,
            ),
            PathEl::ClosePath => builder.close(),
        }
    }
    builder.finish()
}

fn to_stroke(stroke: &Stroke) -> tiny_skia::Stroke {
    let dash = if stroke.dash_pattern.is_empty() {
        None
    } else {
        StrokeDash::new(
            stroke.dash_pattern.iter().map(|&dash| dash as f32).collect(),
            stroke.dash_offset as f32,
        )
    };
    tiny_skia::Stroke {
        width: stroke.width as f32,
        miter_limit: stroke.miter_limit as f32,
        // tiny-skia has a single cap for both ends.
        line_cap: match stroke.start_cap {
            Cap::Butt => LineCap::Butt,
            Cap::Square => LineCap::Square,
            Cap::Round => LineCap::Round,
        },
        line_join: match stroke.join {
            Join::Bevel => LineJoin::Bevel,
            Join::Miter => LineJoin::Miter,
            Join::Round => LineJoin::Round,
        },
        dash,
    }
}

fn spread_mode(extend: Extend) -> SpreadMode {
    match extend {
        Extend::Pad => SpreadMode::Pad,
        Extend::Repeat => SpreadMode::Repeat,
        Extend::Reflect => SpreadMode::Reflect,
    }
}

impl Surface for Canvas {
    fn width(&self) -> u16 {
        self.pixmap.width()
    }

    fn height(&self) -> u16 {
        self.pixmap.height()
    }

    fn save(&mut self) {
        self.stack.push(self.transform);
    }

    fn restore(&mut self) {
        if let Some(transform) = self.stack.pop() {
            self.transform = transform;
        } else {
            log::warn!("Canvas::restore called without a matching save");
        }
    }

    fn transform(&self) -> Affine {
        self.transform
    }

    fn set_transform(&mut self, transform: Affine) {
        self.transform = transform;
    }

    fn fill_path(&mut self, path: &BezPath, paint: &Paint) {
        if !self.is_drawable() {
            return;
        }
        let (Some(skia_path), Some(skia_paint)) = (to_path(path), self.skia_paint(paint)) else {
            return;
        };
        let transform = to_transform(self.transform);
        if let Some(target) = self.pixmap.as_skia_mut() {
            target.fill_path(&skia_path, &skia_paint, FillRule::Winding, transform, None);
        }
    }

    fn stroke_path(&mut self, path: &BezPath, paint: &Paint) {
        if paint.stroke.width <= 0.0 || !self.is_drawable() {
            return;
        }
        let (Some(skia_path), Some(skia_paint)) = (to_path(path), self.skia_paint(paint)) else {
            return;
        };
        let stroke = to_stroke(&paint.stroke);
        let transform = to_transform(self.transform);
        if let Some(target) = self.pixmap.as_skia_mut() {
            target.stroke_path(&skia_path, &skia_paint, &stroke, transform, None);
        }
    }

    fn draw_pixmap(&mut self, pixmap: &Pixmap, transform: Affine) {
        let Some(source) = pixmap.as_skia() else {
            return;
        };
        let transform = to_transform(self.transform * transform);
        if let Some(target) = self.pixmap.as_skia_mut() {
            target.draw_pixmap(0, 0, source, &PixmapPaint::default(), transform, None);
        }
    }
}
