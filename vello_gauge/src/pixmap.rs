// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A simple pixmap type, stored in a [`tiny_skia::Pixmap`].

use std::fmt;

use bytemuck::{Pod, Zeroable};
use peniko::Color;
use tiny_skia::PremultipliedColorU8;

/// A premultiplied RGBA8 pixel.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct PremulRgba8 {
    /// Red, premultiplied by alpha.
    pub r: u8,
    /// Green, premultiplied by alpha.
    pub g: u8,
    /// Blue, premultiplied by alpha.
    pub b: u8,
    /// Alpha.
    pub a: u8,
}

impl PremulRgba8 {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
    };

    /// Premultiply a straight-alpha color, additionally scaling its alpha by `alpha`.
    pub fn from_color(color: Color, alpha: u8) -> Self {
        let mut color = to_skia_color(color);
        color.apply_opacity(f32::from(alpha) / 255.0);
        color.premultiply().to_color_u8().into()
    }

    /// Convert back to a straight-alpha color.
    ///
    /// Pixels with a component above their alpha are not valid premultiplied values
    /// and convert to transparent.
    pub fn to_color(self) -> Color {
        let Some(pixel) = PremultipliedColorU8::from_rgba(self.r, self.g, self.b, self.a) else {
            return Color::TRANSPARENT;
        };
        let color = pixel.demultiply();
        Color::rgba8(color.red(), color.green(), color.blue(), color.alpha())
    }
}

impl From<PremultipliedColorU8> for PremulRgba8 {
    fn from(pixel: PremultipliedColorU8) -> Self {
        Self {
            r: pixel.red(),
            g: pixel.green(),
            b: pixel.blue(),
            a: pixel.alpha(),
        }
    }
}

pub(crate) fn to_skia_color(color: Color) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba8(color.r, color.g, color.b, color.a)
}

/// A pixmap of premultiplied RGBA8 values.
///
/// The origin is the top-left corner, `x` grows to the right and `y` grows downward.
/// A pixmap with a zero dimension holds no buffer at all.
#[derive(Clone, PartialEq)]
pub struct Pixmap {
    width: u16,
    height: u16,
    pixels: Option<tiny_skia::Pixmap>,
}

impl fmt::Debug for Pixmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pixmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl Pixmap {
    /// Create a new pixmap with the given width and height in pixels.
    ///
    /// All pixels are initialized to transparent black.
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            pixels: tiny_skia::Pixmap::new(u32::from(width), u32::from(height)),
        }
    }

    /// Return the width of the pixmap.
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Return the height of the pixmap.
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Whether the pixmap covers no pixels at all.
    pub fn is_empty(&self) -> bool {
        self.pixels.is_none()
    }

    /// Reset every pixel to transparent black.
    pub fn clear(&mut self) {
        if let Some(pixels) = &mut self.pixels {
            pixels.fill(tiny_skia::Color::TRANSPARENT);
        }
    }

    /// Returns a reference to the underlying data as premultiplied RGBA8.
    pub fn data(&self) -> &[PremulRgba8] {
        bytemuck::cast_slice(self.data_as_u8_slice())
    }

    /// Returns the underlying data as bytes in `[r, g, b, a]` order.
    pub fn data_as_u8_slice(&self) -> &[u8] {
        match &self.pixels {
            Some(pixels) => pixels.data(),
            None => &[],
        }
    }

    /// Sample a pixel from the pixmap.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are outside of the pixmap.
    #[inline(always)]
    pub fn sample(&self, x: u16, y: u16) -> PremulRgba8 {
        self.data()[self.index(x, y)]
    }

    /// Set a pixel in the pixmap at the given coordinates.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are outside of the pixmap.
    pub fn set_pixel(&mut self, x: u16, y: u16, pixel: PremulRgba8) {
        let idx = self.index(x, y);
        let data: &mut [PremulRgba8] = match &mut self.pixels {
            Some(pixels) => bytemuck::cast_slice_mut(pixels.data_mut()),
            None => &mut [],
        };
        data[idx] = pixel;
    }

    /// Consume the pixmap, returning the data as straight-alpha RGBA8 bytes.
    ///
    /// Not fast, but useful for handing the pixels to APIs that expect unpremultiplied data.
    pub fn take_unpremultiplied(self) -> Vec<u8> {
        self.data()
            .iter()
            .flat_map(|pixel| {
                let color = pixel.to_color();
                [color.r, color.g, color.b, color.a]
            })
            .collect()
    }

    pub(crate) fn as_skia(&self) -> Option<tiny_skia::PixmapRef<'_>> {
        self.pixels.as_ref().map(|pixels| pixels.as_ref())
    }

    pub(crate) fn as_skia_mut(&mut self) -> Option<&mut tiny_skia::Pixmap> {
        self.pixels.as_mut()
    }

    #[inline(always)]
    fn index(&self, x: u16, y: u16) -> usize {
        usize::from(self.width) * usize::from(y) + usize::from(x)
    }
}
