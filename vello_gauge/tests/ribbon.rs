// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tests for ribbons.

use crate::util::{color_at, get_canvas, horizontal_line, is_painted, ring};
use vello_gauge::kurbo::{Affine, Shape};
use vello_gauge::peniko::Color;
use vello_gauge::{ColorInterpolation, Feature, Position, Ribbon, Surface};

fn red_ribbon() -> Feature<Ribbon> {
    let mut feature = Feature::new(Ribbon::default());
    feature.set_path(Some(horizontal_line()));
    feature.set_colors(vec![Color::RED]);
    feature.set_widths(vec![10.0]);
    feature.set_position(Position::Middle);
    feature
}

#[test]
fn straight_ribbon_is_uniformly_red() {
    let mut feature = red_ribbon();
    let mut canvas = get_canvas();
    feature.draw(&mut canvas).unwrap();

    let bounds = feature.kind().outline().unwrap().bounding_box();
    assert!((bounds.width() - 100.0).abs() < 1e-9);
    assert!((bounds.height() - 10.0).abs() < 1e-9);

    let pixmap = canvas.pixmap();
    for y in 45..55 {
        for x in 0..100 {
            assert_eq!(color_at(pixmap, x, y), Color::RED, "({x}, {y})");
        }
    }
    let painted = pixmap.data().iter().filter(|pixel| pixel.a != 0).count();
    assert_eq!(painted, 1000);
}

#[test]
fn empty_window_has_no_visible_output() {
    let mut feature = red_ribbon();
    feature.set_start_percent(30.0);
    feature.set_end_percent(30.0);
    let mut canvas = get_canvas();
    feature.draw(&mut canvas).unwrap();
    assert!(canvas.pixmap().data().iter().all(|pixel| pixel.a == 0));
}

#[test]
fn solid_colors_split_the_window() {
    let mut feature = red_ribbon();
    feature.set_colors(vec![Color::RED, Color::BLUE]);
    feature.set_color_interpolation(ColorInterpolation::Solid);
    let mut canvas = get_canvas();
    feature.draw(&mut canvas).unwrap();
    let pixmap = canvas.pixmap();
    assert_eq!(color_at(pixmap, 20, 50), Color::RED);
    assert_eq!(color_at(pixmap, 80, 50), Color::BLUE);
}

#[test]
fn gradient_follows_a_partial_window() {
    let mut feature = red_ribbon();
    feature.set_colors(vec![Color::RED, Color::BLUE]);
    feature.set_start_percent(50.0);
    let mut canvas = get_canvas();
    feature.draw(&mut canvas).unwrap();
    let pixmap = canvas.pixmap();
    assert!(!is_painted(pixmap, 40, 50));
    // The window starts red and ends blue, regardless of where it sits on the path.
    let start = color_at(pixmap, 50, 50);
    let end = color_at(pixmap, 99, 50);
    assert!(start.r > 200 && start.b < 55, "{start:?}");
    assert!(end.b > 240 && end.r < 15, "{end:?}");
}

#[test]
fn ribbon_on_a_ring_stays_on_the_ring() {
    let mut feature = Feature::new(Ribbon::default());
    feature.set_path(Some(ring()));
    feature.set_color(Color::LIME);
    feature.set_width(6.0);
    let mut canvas = get_canvas();
    feature.draw(&mut canvas).unwrap();
    let pixmap = canvas.pixmap();
    // Points on the circle are painted, its center is not.
    assert!(is_painted(pixmap, 100, 50));
    assert!(is_painted(pixmap, 60, 90));
    assert!(is_painted(pixmap, 20, 50));
    assert!(!is_painted(pixmap, 60, 50));
}

#[test]
fn raster_is_reused_until_a_property_changes() {
    let mut feature = red_ribbon();
    feature.draw(&mut get_canvas()).unwrap();
    assert!(!feature.is_dirty());
    let before = feature.raster().cloned();

    feature.draw(&mut get_canvas()).unwrap();
    assert_eq!(feature.raster().cloned(), before);

    feature.set_width(4.0);
    assert!(feature.is_dirty());
    feature.refresh();
    assert!(feature.is_dirty());
}

#[test]
fn surface_transform_applies_to_the_ribbon() {
    let mut feature = red_ribbon();
    let mut canvas = get_canvas();
    canvas.set_transform(Affine::translate((10.0, 20.0)));
    feature.draw(&mut canvas).unwrap();
    let pixmap = canvas.pixmap();
    assert!(is_painted(pixmap, 15, 70));
    assert!(!is_painted(pixmap, 5, 70));
    assert!(!is_painted(pixmap, 15, 50));
}

#[test]
fn moving_the_surface_renders_again() {
    let mut feature = red_ribbon();
    feature.draw(&mut get_canvas()).unwrap();

    let mut canvas = get_canvas();
    canvas.set_transform(Affine::translate((0.0, 20.0)));
    feature.draw(&mut canvas).unwrap();
    let pixmap = canvas.pixmap();
    assert!(is_painted(pixmap, 50, 70));
    assert!(!is_painted(pixmap, 50, 50));
}
