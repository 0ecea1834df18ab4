// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Vello Gauge draws decorations that follow an arbitrary 2D path: gradient ribbons,
//! repeated notches and draggable pointers. These are the building blocks of
//! gauge-style widgets such as progress rings, dials and tick scales.
//!
//! The crate is organized around a few pieces:
//!
//! - [`PathSampler`] answers arc-length questions about a [`BezPath`]: total length,
//!   point and tangent at a distance, and extraction of sub-paths.
//! - The [`interpolate`] module maps a normalized position to a color or a width.
//! - [`Feature`] is the shared drawing machinery: visibility, the start/end window,
//!   per-contour iteration, the raster cache and change notification.
//!   What actually gets drawn is decided by its [`FeatureKind`]:
//!   [`Ribbon`], [`Notches`] or [`Pointer`].
//! - [`Surface`] is the rendering target. [`Canvas`] is a software implementation
//!   rasterizing with [tiny-skia](https://docs.rs/tiny-skia) into a [`Pixmap`], which is
//!   also used for the raster cache.
//!
//! ## Example
//!
//! ```
//! use vello_gauge::kurbo::BezPath;
//! use vello_gauge::peniko::Color;
//! use vello_gauge::{Canvas, Feature, Ribbon};
//!
//! let mut path = BezPath::new();
//! path.move_to((10.0, 50.0));
//! path.line_to((110.0, 50.0));
//!
//! let mut ribbon = Feature::new(Ribbon::default());
//! ribbon.set_path(Some(path));
//! ribbon.set_colors(vec![Color::RED, Color::BLUE]);
//! ribbon.set_widths(vec![4.0, 12.0]);
//! ribbon.set_end_percent(75.0);
//!
//! let mut canvas = Canvas::new(120, 100);
//! ribbon.draw(&mut canvas).unwrap();
//! ```
//!
//! ## Features
//!
//! - `vello`: implement [`Surface`] for [`vello::Scene`](https://docs.rs/vello).

// LINEBENDER LINT SET - lib.rs - v3
// See https://linebender.org/wiki/canonical-lints/
// These lints shouldn't apply to examples or tests.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
// These lints shouldn't apply to examples.
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

mod canvas;
mod feature;
mod gauge;
pub mod interpolate;
mod marker;
mod pixmap;
mod ribbon;
mod sampler;
mod surface;
#[cfg(feature = "vello")]
mod vello_scene;

pub use peniko;
pub use peniko::kurbo;

pub use canvas::Canvas;
pub use feature::{
    ColorInterpolation, ContourInfo, DrawContext, EdgeTreatment, Feature, FeatureConfig,
    FeatureKind, Position, PropertyValue, WidthInterpolation, Window,
};
pub use gauge::{Gauge, GaugeFeature};
pub use marker::{
    Distribution, MarkerShape, MarkerStyle, Notches, Pointer, RepetitionInfo, MAX_NOTCHES,
};
pub use pixmap::{Pixmap, PremulRgba8};
pub use ribbon::Ribbon;
pub use sampler::{PathSampler, SamplerOptions};
pub use surface::{Paint, PaintStyle, Shader, Surface, Texture, DEFAULT_TOLERANCE};
#[cfg(feature = "vello")]
pub use vello_scene::SceneSurface;

/// Errors that can occur in Vello Gauge.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A contour was requested by a 1-based index outside `[1, count]`.
    #[error("Contour index {index} is out of range (the path has {count} contours)")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// The number of contours in the path.
        count: usize,
    },
}

/// Result type alias for this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
