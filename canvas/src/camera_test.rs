#![allow(clippy::float_cmp)]

use super::*;

const EPSILON: f64 = 1e-9;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn point_approx_eq(a: Point, b: Point) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y)
}

fn vp() -> Viewport {
    Viewport::new(800.0, 600.0)
}

// --- Point / Viewport ---

#[test]
fn point_distance() {
    assert_eq!(Point::new(0.0, 0.0).distance(Point::new(3.0, 4.0)), 5.0);
}

#[test]
fn viewport_center() {
    assert_eq!(vp().center(), Point::new(400.0, 300.0));
}

// --- Camera defaults ---

#[test]
fn camera_default_is_identity() {
    let cam = Camera::default();
    assert_eq!(cam.scale, 1.0);
    assert_eq!(cam.offset_x, 0.0);
    assert_eq!(cam.offset_y, 0.0);
}

#[test]
fn default_camera_puts_world_origin_at_viewport_center() {
    let cam = Camera::default();
    assert!(point_approx_eq(cam.screen_to_world(Point::new(400.0, 300.0), vp()), Point::new(0.0, 0.0)));
    assert!(point_approx_eq(cam.world_to_screen(Point::new(0.0, 0.0), vp()), Point::new(400.0, 300.0)));
}

// --- Conversions ---

#[test]
fn world_to_screen_applies_scale_and_offset() {
    let cam = Camera { scale: 2.0, offset_x: 10.0, offset_y: -20.0 };
    assert!(point_approx_eq(cam.world_to_screen(Point::new(5.0, 5.0), vp()), Point::new(420.0, 290.0)));
}

#[test]
fn screen_to_world_inverts_world_to_screen() {
    let cam = Camera { scale: 1.7, offset_x: -33.0, offset_y: 12.5 };
    for world in [Point::new(0.0, 0.0), Point::new(123.0, -45.0), Point::new(-999.5, 0.25)] {
        let screen = cam.world_to_screen(world, vp());
        assert!(point_approx_eq(cam.screen_to_world(screen, vp()), world));
    }
}

#[test]
fn screen_dist_to_world_divides_by_scale() {
    let cam = Camera { scale: 2.0, ..Camera::default() };
    assert_eq!(cam.screen_dist_to_world(14.0), 7.0);
}

#[test]
fn pan_by_shifts_offset() {
    let mut cam = Camera::default();
    cam.pan_by(15.0, -5.0);
    cam.pan_by(5.0, 5.0);
    assert_eq!(cam.offset_x, 20.0);
    assert_eq!(cam.offset_y, 0.0);
}

// --- Zoom ---

#[test]
fn clamp_scale_range() {
    assert_eq!(clamp_scale(0.01), MIN_SCALE);
    assert_eq!(clamp_scale(99.0), MAX_SCALE);
    assert_eq!(clamp_scale(1.3), 1.3);
    assert_eq!(clamp_scale(f64::NAN), 1.0);
}

#[test]
fn zoom_clamps_to_max() {
    let mut cam = Camera::default();
    assert!(cam.zoom(100.0, None, vp()));
    assert_eq!(cam.scale, MAX_SCALE);
}

#[test]
fn zoom_clamps_to_min() {
    let mut cam = Camera::default();
    assert!(cam.zoom(0.0001, None, vp()));
    assert_eq!(cam.scale, MIN_SCALE);
}

#[test]
fn zoom_at_limit_is_noop() {
    let mut cam = Camera { scale: MAX_SCALE, offset_x: 3.0, offset_y: 4.0 };
    let before = cam;
    assert!(!cam.zoom(2.0, Some(Point::new(10.0, 10.0)), vp()));
    assert_eq!(cam, before);
}

#[test]
fn zoom_keeps_pivot_fixed() {
    let mut cam = Camera { scale: 1.2, offset_x: 40.0, offset_y: -15.0 };
    let pivot = Point::new(130.0, 470.0);
    let anchor = cam.screen_to_world(pivot, vp());
    assert!(cam.zoom(1.5, Some(pivot), vp()));
    assert!(approx_eq(cam.scale, 1.8));
    assert!(point_approx_eq(cam.screen_to_world(pivot, vp()), anchor));
}

#[test]
fn zoom_without_pivot_keeps_view_center() {
    let mut cam = Camera { scale: 1.0, offset_x: 100.0, offset_y: 50.0 };
    let center = cam.screen_to_world(vp().center(), vp());
    assert!(cam.zoom(0.5, None, vp()));
    assert!(point_approx_eq(cam.screen_to_world(vp().center(), vp()), center));
}

// --- Fit to content ---

#[test]
fn fit_empty_resets_view() {
    let mut cam = Camera { scale: 2.0, offset_x: 50.0, offset_y: 50.0 };
    assert!(cam.fit_to_content(std::iter::empty(), vp()));
    assert_eq!(cam, Camera::default());
    assert!(!cam.fit_to_content(std::iter::empty(), vp()));
}

#[test]
fn fit_centers_content() {
    let mut cam = Camera::default();
    let items = [(Point::new(0.0, 0.0), 36.0), (Point::new(400.0, 0.0), 36.0)];
    assert!(cam.fit_to_content(items, vp()));
    // Box is (-84..484) x (-84..84); width fit wins.
    assert!(approx_eq(cam.scale, 800.0 / 568.0));
    assert!(point_approx_eq(cam.world_to_screen(Point::new(200.0, 0.0), vp()), vp().center()));
}

#[test]
fn fit_uses_height_when_tall() {
    let mut cam = Camera::default();
    let items = [(Point::new(0.0, 0.0), 10.0), (Point::new(0.0, 1000.0), 10.0)];
    cam.fit_to_content(items, vp());
    assert!(approx_eq(cam.scale, 600.0 / (1000.0 + 2.0 * (10.0 + FIT_PADDING))));
}

#[test]
fn fit_scale_is_clamped() {
    let mut cam = Camera::default();
    cam.fit_to_content([(Point::new(0.0, 0.0), 1.0)], vp());
    assert_eq!(cam.scale, MAX_SCALE);

    cam.fit_to_content([(Point::new(-50_000.0, 0.0), 1.0), (Point::new(50_000.0, 0.0), 1.0)], vp());
    assert_eq!(cam.scale, MIN_SCALE);
}

#[test]
fn fit_twice_is_stable() {
    let mut cam = Camera::default();
    let items = [(Point::new(-100.0, 20.0), 40.0), (Point::new(300.0, 90.0), 36.0)];
    assert!(cam.fit_to_content(items, vp()));
    assert!(!cam.fit_to_content(items, vp()));
}
