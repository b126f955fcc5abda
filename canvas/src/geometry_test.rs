#![allow(clippy::float_cmp)]

use super::*;
use std::f64::consts::{FRAC_PI_2, PI};

const EPSILON: f64 = 1e-9;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn point_approx_eq(a: Point, b: Point) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y)
}

// =============================================================
// Bounds
// =============================================================

#[test]
fn bounds_around_center() {
    let b = Bounds::around(Point::new(10.0, 20.0), 5.0, 3.0);
    assert_eq!(b, Bounds { min_x: 5.0, min_y: 17.0, max_x: 15.0, max_y: 23.0 });
    assert_eq!(b.width(), 10.0);
    assert_eq!(b.height(), 6.0);
    assert_eq!(b.center(), Point::new(10.0, 20.0));
}

#[test]
fn bounds_of_points_empty_is_none() {
    assert!(Bounds::of_points(&[]).is_none());
}

#[test]
fn bounds_of_points_spans_all() {
    let pts = [Point::new(1.0, -2.0), Point::new(-3.0, 4.0), Point::new(0.0, 0.0)];
    let b = Bounds::of_points(&pts).unwrap();
    assert_eq!(b, Bounds { min_x: -3.0, min_y: -2.0, max_x: 1.0, max_y: 4.0 });
}

#[test]
fn bounds_union_covers_both() {
    let a = Bounds::around(Point::new(0.0, 0.0), 1.0, 1.0);
    let b = Bounds::around(Point::new(10.0, 5.0), 1.0, 1.0);
    let u = a.union(b);
    assert!(u.contains(Point::new(-1.0, -1.0)));
    assert!(u.contains(Point::new(11.0, 6.0)));
}

#[test]
fn bounds_contains_edges_inclusive() {
    let b = Bounds::around(Point::new(0.0, 0.0), 2.0, 2.0);
    assert!(b.contains(Point::new(2.0, -2.0)));
    assert!(!b.contains(Point::new(2.0001, 0.0)));
}

// =============================================================
// Rotation
// =============================================================

#[test]
fn rotate_quarter_turn() {
    let p = rotate_about(Point::new(1.0, 0.0), FRAC_PI_2, Point::new(0.0, 0.0));
    assert!(point_approx_eq(p, Point::new(0.0, 1.0)));
}

#[test]
fn rotate_translates_by_center() {
    let p = rotate_about(Point::new(2.0, 0.0), PI, Point::new(10.0, 10.0));
    assert!(point_approx_eq(p, Point::new(8.0, 10.0)));
}

#[test]
fn to_local_inverts_rotate_about() {
    let center = Point::new(-4.0, 7.5);
    let local = Point::new(12.0, -3.0);
    for angle in [0.0, 0.3, FRAC_PI_2, 2.5, -1.2] {
        let world = rotate_about(local, angle, center);
        assert!(point_approx_eq(to_local(world, angle, center), local), "angle {angle}");
    }
}

// =============================================================
// Polygons
// =============================================================

#[test]
fn arrow_polygon_unrotated_vertices() {
    let poly = arrow_polygon(100.0, 60.0, 20.0, 0.0, Point::new(0.0, 0.0), 0.0);
    let expected = [
        Point::new(-50.0, -10.0),
        Point::new(20.0, -10.0),
        Point::new(20.0, -30.0),
        Point::new(50.0, 0.0),
        Point::new(20.0, 30.0),
        Point::new(20.0, 10.0),
        Point::new(-50.0, 10.0),
    ];
    assert_eq!(poly.len(), 7);
    for (got, want) in poly.iter().zip(expected) {
        assert!(point_approx_eq(*got, want), "{got:?} != {want:?}");
    }
}

#[test]
fn arrow_head_never_longer_than_half_width() {
    let poly = arrow_polygon(20.0, 60.0, 4.0, 0.0, Point::new(0.0, 0.0), 0.0);
    // hw = 10; head floor of 18 is capped at hw, so the neck sits at x = 0.
    assert!(approx_eq(poly[1].x, 0.0));
    assert!(approx_eq(poly[3].x, 10.0));
}

#[test]
fn arrow_shaft_capped_by_half_height() {
    let poly = arrow_polygon(200.0, 40.0, 100.0, 0.0, Point::new(0.0, 0.0), 0.0);
    assert!(approx_eq(poly[0].y, -20.0));
}

#[test]
fn arrow_polygon_padding_inflates() {
    let poly = arrow_polygon(100.0, 60.0, 20.0, 0.0, Point::new(0.0, 0.0), 6.0);
    assert!(approx_eq(poly[3].x, 56.0));
    assert!(approx_eq(poly[2].y, -36.0));
    assert!(approx_eq(poly[0].y, -16.0));
}

#[test]
fn arrow_polygon_rotated_tip_points_down() {
    let poly = arrow_polygon(100.0, 60.0, 20.0, FRAC_PI_2, Point::new(5.0, 5.0), 0.0);
    assert!(point_approx_eq(poly[3], Point::new(5.0, 55.0)));
}

#[test]
fn point_in_arrow_polygon() {
    let poly = arrow_polygon(100.0, 60.0, 20.0, 0.0, Point::new(0.0, 0.0), 0.0);
    assert!(point_in_polygon(Point::new(45.0, 0.0), &poly));
    assert!(point_in_polygon(Point::new(25.0, 20.0), &poly));
    assert!(point_in_polygon(Point::new(-40.0, 5.0), &poly));
    assert!(!point_in_polygon(Point::new(0.0, 20.0), &poly));
    assert!(!point_in_polygon(Point::new(60.0, 0.0), &poly));
}

#[test]
fn line_polygon_rotated() {
    let poly = line_polygon(100.0, 10.0, FRAC_PI_2, Point::new(0.0, 0.0), 0.0);
    assert!(point_in_polygon(Point::new(0.0, 45.0), &poly));
    assert!(!point_in_polygon(Point::new(45.0, 0.0), &poly));
}

#[test]
fn point_in_polygon_degenerate() {
    assert!(!point_in_polygon(Point::new(0.0, 0.0), &[]));
    assert!(!point_in_polygon(Point::new(0.0, 0.0), &[Point::new(-1.0, 0.0), Point::new(1.0, 0.0)]));
}

// =============================================================
// Text layout
// =============================================================

#[test]
fn approx_metrics_width() {
    assert!(approx_eq(ApproxMetrics.text_width("abcd", 10.0), 24.0));
    assert_eq!(ApproxMetrics.text_width("", 10.0), 0.0);
}

#[test]
fn wrap_text_breaks_on_width() {
    let block = wrap_text("hello world", 40.0, 10.0, &ApproxMetrics);
    assert_eq!(block.lines, vec!["hello", "world"]);
    assert!(approx_eq(block.width, 30.0));
    assert!(approx_eq(block.height, 25.0));
}

#[test]
fn wrap_text_keeps_fitting_words_together() {
    let block = wrap_text("a b c", 1000.0, 10.0, &ApproxMetrics);
    assert_eq!(block.lines, vec!["a b c"]);
}

#[test]
fn wrap_text_long_word_on_own_line() {
    let block = wrap_text("tiny enormousword x", 30.0, 10.0, &ApproxMetrics);
    assert_eq!(block.lines, vec!["tiny", "enormousword", "x"]);
    assert!(approx_eq(block.width, 72.0));
}

#[test]
fn wrap_text_respects_newlines() {
    let block = wrap_text("one\ntwo", 1000.0, 10.0, &ApproxMetrics);
    assert_eq!(block.lines, vec!["one", "two"]);
}

#[test]
fn node_radius_empty_text_is_base() {
    assert_eq!(node_radius("", 18.0, &ApproxMetrics), NODE_BASE_RADIUS);
    assert_eq!(node_radius("   ", 18.0, &ApproxMetrics), NODE_BASE_RADIUS);
}

#[test]
fn node_radius_short_text_is_base() {
    assert_eq!(node_radius("Hi", 18.0, &ApproxMetrics), NODE_BASE_RADIUS);
}

#[test]
fn node_radius_wraps_long_text() {
    let text = "a very long label that needs wrapping";
    let single_line = wrap_text(text, f64::INFINITY, 18.0, &ApproxMetrics);
    let single_radius = (single_line.width * 0.5).hypot(single_line.height * 0.5) + NODE_TEXT_PADDING;
    let r = node_radius(text, 18.0, &ApproxMetrics);
    assert!(r > NODE_BASE_RADIUS);
    assert!(r < single_radius, "{r} should beat single-line {single_radius}");
}

#[test]
fn node_radius_grows_with_font() {
    let text = "quarterly planning review";
    assert!(node_radius(text, 24.0, &ApproxMetrics) > node_radius(text, 14.0, &ApproxMetrics));
}

#[test]
fn fit_label_prefers_narrowest_minimum() {
    let (block, radius) = fit_label("one two three four five six", 18.0, &ApproxMetrics);
    let alternative = wrap_text("one two three four five six", f64::INFINITY, 18.0, &ApproxMetrics);
    assert!(block.lines.len() > 1);
    assert!(radius <= (alternative.width * 0.5).hypot(alternative.height * 0.5) + NODE_TEXT_PADDING);
}

struct DoubleWidth;

impl TextMeasure for DoubleWidth {
    fn text_width(&self, text: &str, font_px: f64) -> f64 {
        ApproxMetrics.text_width(text, font_px) * 2.0
    }
}

#[test]
fn custom_metrics_are_used() {
    let text = "custom metrics change the radius";
    assert!(node_radius(text, 18.0, &DoubleWidth) > node_radius(text, 18.0, &ApproxMetrics));
}

// =============================================================
// Label fitting cost and caching
// =============================================================

/// Approximate metrics that count how often they are asked.
#[derive(Default)]
struct Counting {
    calls: std::cell::Cell<usize>,
}

impl TextMeasure for Counting {
    fn text_width(&self, text: &str, font_px: f64) -> f64 {
        self.calls.set(self.calls.get() + 1);
        ApproxMetrics.text_width(text, font_px)
    }
}

fn long_label(words: usize) -> String {
    (0..words).map(|i| "w".repeat(2 + i % 8)).collect::<Vec<_>>().join(" ")
}

#[test]
fn fit_label_cost_stays_bounded_for_long_labels() {
    let text = long_label(400);
    let counting = Counting::default();
    let (block, radius) = fit_label(&text, 18.0, &counting);
    assert!(counting.calls.get() < 1_000_000, "{} width queries", counting.calls.get());
    assert!(block.lines.len() > 1);
    assert!(radius < node_radius(&text, 18.0, &ApproxMetrics) + 1e-9);
}

#[test]
fn fit_label_matches_exhaustive_search() {
    for words in [3, 7, 12, 20] {
        let text = long_label(words);
        let (_, radius) = fit_label(&text, 18.0, &ApproxMetrics);
        let best = (1..=text.len())
            .map(|chars| {
                #[allow(clippy::cast_precision_loss)]
                let width = chars as f64 * 18.0 * 0.6;
                let b = wrap_text(&text, width, 18.0, &ApproxMetrics);
                (b.width * 0.5).hypot(b.height * 0.5) + NODE_TEXT_PADDING
            })
            .fold(f64::INFINITY, f64::min);
        assert!((radius - best).abs() < 1e-6, "{words} words: {radius} vs {best}");
    }
}

#[test]
fn cached_measure_memoizes_radii() {
    let cache = CachedMeasure::new(Box::new(ApproxMetrics));
    let text = long_label(40);
    let first = node_radius(&text, 18.0, &cache);
    assert_eq!(cache.cached(), 1);
    assert_eq!(node_radius(&text, 18.0, &cache), first);
    assert_eq!(cache.cached(), 1);
    node_radius(&text, 24.0, &cache);
    assert_eq!(cache.cached(), 2);
    assert_eq!(first, node_radius(&text, 18.0, &ApproxMetrics));
}

#[test]
fn cached_measure_skips_blank_labels() {
    let cache = CachedMeasure::default();
    assert_eq!(node_radius("   ", 18.0, &cache), NODE_BASE_RADIUS);
    assert_eq!(cache.cached(), 0);
}
