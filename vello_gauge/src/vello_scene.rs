// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A [`Surface`] recording into a [`vello::Scene`].

use std::sync::Arc;

use peniko::kurbo::{Affine, BezPath};
use peniko::{Blob, Brush, Fill, Format, Image};
use vello::Scene;

use crate::pixmap::Pixmap;
use crate::surface::{Paint, Shader, Surface};

/// Records drawing commands into a borrowed [`Scene`].
///
/// Scenes have no intrinsic size, so the target size is given up front and used to
/// size feature rasters.
pub struct SceneSurface<'a> {
    scene: &'a mut Scene,
    width: u16,
    height: u16,
    transform: Affine,
    stack: Vec<Affine>,
}

impl<'a> SceneSurface<'a> {
    pub fn new(scene: &'a mut Scene, width: u16, height: u16) -> Self {
        Self {
            scene,
            width,
            height,
            transform: Affine::IDENTITY,
            stack: vec![],
        }
    }

    fn brush(&self, paint: &Paint) -> (Brush, Option<Affine>) {
        let alpha = f32::from(paint.alpha) / 255.0;
        match &paint.shader {
            Shader::Solid(color) => (Brush::Solid(color.with_alpha_factor(alpha)), None),
            Shader::Texture(texture) => {
                let image = to_image(&texture.pixmap)
                    .with_extend(texture.extend)
                    .multiply_alpha(alpha);
                (
                    Brush::Image(image),
                    Some(self.transform.inverse() * texture.transform),
                )
            }
        }
    }
}

fn to_image(pixmap: &Pixmap) -> Image {
    let data = pixmap.clone().take_unpremultiplied();
    Image::new(
        Blob::new(Arc::new(data)),
        Format::Rgba8,
        u32::from(pixmap.width()),
        u32::from(pixmap.height()),
    )
}

impl Surface for SceneSurface<'_> {
    fn width(&self) -> u16 {
        self.width
    }

    fn height(&self) -> u16 {
        self.height
    }

    fn save(&mut self) {
        self.stack.push(self.transform);
    }

    fn restore(&mut self) {
        if let Some(transform) = self.stack.pop() {
            self.transform = transform;
        } else {
            log::warn!("SceneSurface::restore called without a matching save");
        }
    }

    fn transform(&self) -> Affine {
        self.transform
    }

    fn set_transform(&mut self, transform: Affine) {
        self.transform = transform;
    }

    fn fill_path(&mut self, path: &BezPath, paint: &Paint) {
        let (brush, brush_transform) = self.brush(paint);
        self.scene
            .fill(Fill::NonZero, self.transform, &brush, brush_transform, path);
    }

    fn stroke_path(&mut self, path: &BezPath, paint: &Paint) {
        if paint.stroke.width <= 0.0 {
            return;
        }
        let (brush, brush_transform) = self.brush(paint);
        self.scene
            .stroke(&paint.stroke, self.transform, &brush, brush_transform, path);
    }

    fn draw_pixmap(&mut self, pixmap: &Pixmap, transform: Affine) {
        if pixmap.is_empty() {
            return;
        }
        self.scene
            .draw_image(&to_image(pixmap), self.transform * transform);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::Texture;
    use peniko::kurbo::{Line, Rect};
    use peniko::{Color, Extend};

    fn red_pixmap() -> Pixmap {
        let mut pixmap = Pixmap::new(2, 2);
        pixmap.set_pixel(1, 0, crate::PremulRgba8::from_color(Color::RED, 255));
        pixmap
    }

    #[test]
    fn records_fills_strokes_and_images() {
        let mut scene = Scene::new();
        let mut surface = SceneSurface::new(&mut scene, 64, 32);
        assert_eq!((surface.width(), surface.height()), (64, 32));
        surface.draw_rect(Rect::new(0.0, 0.0, 10.0, 10.0), &Paint::fill(Color::RED));
        surface.draw_line(
            Line::new((0.0, 0.0), (10.0, 0.0)),
            &Paint::stroke(Color::RED, 2.0),
        );
        // Zero-width strokes and empty pixmaps record nothing.
        surface.draw_line(
            Line::new((0.0, 0.0), (10.0, 0.0)),
            &Paint::stroke(Color::RED, 0.0),
        );
        surface.draw_pixmap(&Pixmap::new(0, 0), Affine::IDENTITY);
        surface.draw_pixmap(&red_pixmap(), Affine::translate((4.0, 4.0)));
        drop(surface);
        assert_eq!(scene.encoding().n_paths, 3);
    }

    #[test]
    fn save_and_restore_the_transform() {
        let mut scene = Scene::new();
        let mut surface = SceneSurface::new(&mut scene, 10, 10);
        surface.save();
        surface.concat(Affine::translate((3.0, 0.0)));
        assert_eq!(surface.transform(), Affine::translate((3.0, 0.0)));
        surface.restore();
        assert_eq!(surface.transform(), Affine::IDENTITY);
        // Unbalanced restores keep the current transform.
        surface.set_transform(Affine::scale(2.0));
        surface.restore();
        assert_eq!(surface.transform(), Affine::scale(2.0));
    }

    #[test]
    fn brushes_carry_alpha_and_texture_placement() {
        let mut scene = Scene::new();
        let mut surface = SceneSurface::new(&mut scene, 10, 10);
        let (brush, transform) = surface.brush(&Paint::fill(Color::RED).with_alpha(128));
        assert!(transform.is_none());
        let Brush::Solid(color) = brush else {
            panic!("expected a solid brush, got {brush:?}");
        };
        assert_eq!((color.r, color.a), (255, 128));

        surface.set_transform(Affine::translate((5.0, 0.0)));
        let texture = Texture::new(Arc::new(red_pixmap()), Extend::Pad);
        let (brush, transform) = surface.brush(&Paint::texture(texture));
        let Brush::Image(image) = brush else {
            panic!("expected an image brush, got {brush:?}");
        };
        assert_eq!((image.width, image.height), (2, 2));
        assert_eq!(image.extend, Extend::Pad);
        // Straight alpha bytes, row-major.
        assert_eq!(&image.data.data()[4..8], &[255, 0, 0, 255]);
        let transform = transform.unwrap();
        assert!((transform.translation() - peniko::kurbo::Vec2::new(-5.0, 0.0)).hypot() < 1e-9);
    }
}
