// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Utility functions shared across different tests.

use std::cell::RefCell;
use std::rc::Rc;

use vello_gauge::kurbo::{Affine, BezPath, Circle, Shape};
use vello_gauge::peniko::Color;
use vello_gauge::{Canvas, Paint, Pixmap, PropertyValue, Shader, Surface};

pub(crate) const WIDTH: u16 = 120;
pub(crate) const HEIGHT: u16 = 100;

pub(crate) fn get_canvas() -> Canvas {
    Canvas::new(WIDTH, HEIGHT)
}

/// A horizontal line of length 100 at `y = 50`.
pub(crate) fn horizontal_line() -> BezPath {
    let mut path = BezPath::new();
    path.move_to((0.0, 50.0));
    path.line_to((100.0, 50.0));
    path
}

/// A closed circle of radius 40 centered in the canvas.
pub(crate) fn ring() -> BezPath {
    Circle::new((60.0, 50.0), 40.0).to_path(0.01)
}

/// Two separate horizontal lines, 30 and 60 long.
pub(crate) fn two_lines() -> BezPath {
    let mut path = BezPath::new();
    path.move_to((10.0, 20.0));
    path.line_to((40.0, 20.0));
    path.move_to((10.0, 70.0));
    path.line_to((70.0, 70.0));
    path
}

pub(crate) fn is_painted(pixmap: &Pixmap, x: u16, y: u16) -> bool {
    pixmap.sample(x, y).a != 0
}

pub(crate) fn color_at(pixmap: &Pixmap, x: u16, y: u16) -> Color {
    pixmap.sample(x, y).to_color()
}

/// Collects property change notifications.
pub(crate) fn recorder() -> (
    Rc<RefCell<Vec<(String, PropertyValue)>>>,
    impl FnMut(&str, &PropertyValue) + 'static,
) {
    let log = Rc::new(RefCell::new(vec![]));
    let sink = log.clone();
    (log, move |name: &str, value: &PropertyValue| {
        sink.borrow_mut().push((name.to_owned(), value.clone()));
    })
}

/// A drawing command seen by a [`RecordingSurface`].
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Command {
    Fill { color: Option<Color>, alpha: u8 },
    Stroke { color: Option<Color>, alpha: u8, width: f64 },
    Pixmap,
}

/// A surface that only records what is drawn on it.
#[derive(Debug)]
pub(crate) struct RecordingSurface {
    pub(crate) commands: Vec<Command>,
    transform: Affine,
    stack: Vec<Affine>,
}

impl RecordingSurface {
    pub(crate) fn new() -> Self {
        Self {
            commands: vec![],
            transform: Affine::IDENTITY,
            stack: vec![],
        }
    }
}

fn solid(paint: &Paint) -> Option<Color> {
    match &paint.shader {
        Shader::Solid(color) => Some(*color),
        _ => None,
    }
}

impl Surface for RecordingSurface {
    fn width(&self) -> u16 {
        WIDTH
    }

    fn height(&self) -> u16 {
        HEIGHT
    }

    fn save(&mut self) {
        self.stack.push(self.transform);
    }

    fn restore(&mut self) {
        self.transform = self.stack.pop().unwrap();
    }

    fn transform(&self) -> Affine {
        self.transform
    }

    fn set_transform(&mut self, transform: Affine) {
        self.transform = transform;
    }

    fn fill_path(&mut self, _: &BezPath, paint: &Paint) {
        self.commands.push(Command::Fill {
            color: solid(paint),
            alpha: paint.alpha,
        });
    }

    fn stroke_path(&mut self, _: &BezPath, paint: &Paint) {
        self.commands.push(Command::Stroke {
            color: solid(paint),
            alpha: paint.alpha,
            width: paint.stroke.width,
        });
    }

    fn draw_pixmap(&mut self, _: &Pixmap, _: Affine) {
        self.commands.push(Command::Pixmap);
    }
}
