//! Pure geometry: rotation, polygons, bounding boxes, and text-driven node sizing.
//!
//! Everything here works in world coordinates. Apart from [`CachedMeasure`]
//! nothing holds state. The hit-test
//! layer ([`crate::hit`]) and the camera ([`crate::camera`]) build on these.

#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;

use std::cell::RefCell;
use std::collections::HashMap;

use crate::camera::Point;
use crate::consts::{
    APPROX_CHAR_WIDTH_FACTOR, ARROW_HEAD_FRACTION, ARROW_HEAD_MIN, LABEL_CACHE_LIMIT, LINE_HEIGHT_FACTOR,
    NODE_BASE_RADIUS, NODE_TEXT_PADDING,
};

/// Axis-aligned bounding box in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Box centred on `center` with the given half extents.
    #[must_use]
    pub fn around(center: Point, half_w: f64, half_h: f64) -> Self {
        Self {
            min_x: center.x - half_w,
            min_y: center.y - half_h,
            max_x: center.x + half_w,
            max_y: center.y + half_h,
        }
    }

    /// Smallest box containing every point, or `None` for an empty slice.
    #[must_use]
    pub fn of_points(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let mut b = Self { min_x: first.x, min_y: first.y, max_x: first.x, max_y: first.y };
        for p in &points[1..] {
            b.min_x = b.min_x.min(p.x);
            b.min_y = b.min_y.min(p.y);
            b.max_x = b.max_x.max(p.x);
            b.max_y = b.max_y.max(p.y);
        }
        Some(b)
    }

    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new((self.min_x + self.max_x) * 0.5, (self.min_y + self.max_y) * 0.5)
    }

    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }
}

// =============================================================
// Rotation
// =============================================================

/// Rotate `local` by `angle` radians about the origin, then translate by `center`.
#[must_use]
pub fn rotate_about(local: Point, angle: f64, center: Point) -> Point {
    let (sin, cos) = angle.sin_cos();
    Point::new(center.x + local.x * cos - local.y * sin, center.y + local.x * sin + local.y * cos)
}

/// Inverse of [`rotate_about`]: express a world point in the local frame.
#[must_use]
pub fn to_local(world: Point, angle: f64, center: Point) -> Point {
    let dx = world.x - center.x;
    let dy = world.y - center.y;
    let (sin, cos) = angle.sin_cos();
    Point::new(dx * cos + dy * sin, -dx * sin + dy * cos)
}

// =============================================================
// Polygons
// =============================================================

/// Closed 7-point arrow polygon pointing along `angle`, centred on `center`.
///
/// `padding` inflates width, height and thickness uniformly; pass `0.0` for the
/// drawn outline and a positive value for a forgiving hit area.
#[must_use]
pub fn arrow_polygon(width: f64, height: f64, thickness: f64, angle: f64, center: Point, padding: f64) -> Vec<Point> {
    let hw = width * 0.5 + padding;
    let hh = height * 0.5 + padding;
    let head = (hw * ARROW_HEAD_FRACTION).max(ARROW_HEAD_MIN).min(hw);
    let shaft = (thickness * 0.5 + padding).min(hh);
    let neck = hw - head;

    [
        Point::new(-hw, -shaft),
        Point::new(neck, -shaft),
        Point::new(neck, -hh),
        Point::new(hw, 0.0),
        Point::new(neck, hh),
        Point::new(neck, shaft),
        Point::new(-hw, shaft),
    ]
    .into_iter()
    .map(|p| rotate_about(p, angle, center))
    .collect()
}

/// Rectangle polygon covering a rotated line of the given length and thickness.
#[must_use]
pub fn line_polygon(length: f64, thickness: f64, angle: f64, center: Point, padding: f64) -> Vec<Point> {
    let hl = length * 0.5 + padding;
    let ht = thickness * 0.5 + padding;
    [Point::new(-hl, -ht), Point::new(hl, -ht), Point::new(hl, ht), Point::new(-hl, ht)]
        .into_iter()
        .map(|p| rotate_about(p, angle, center))
        .collect()
}

/// Ray-casting parity test. Vertices are taken in order and the polygon is
/// implicitly closed.
#[must_use]
pub fn point_in_polygon(p: Point, polygon: &[Point]) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let a = polygon[i];
        let b = polygon[j];
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

// =============================================================
// Text layout
// =============================================================

/// Measures rendered text width. The host supplies real font metrics; tests and
/// headless tools use [`ApproxMetrics`].
pub trait TextMeasure {
    /// Width in world units of `text` rendered at `font_px`.
    fn text_width(&self, text: &str, font_px: f64) -> f64;

    /// Radius of the tightest circle around the wrapped label, before the
    /// [`NODE_BASE_RADIUS`] floor.
    fn label_radius(&self, text: &str, font_px: f64) -> f64 {
        fit_label(text, font_px, self).1
    }
}

/// Memoizes [`TextMeasure::label_radius`] per (text, font size) on top of
/// another measure. Node radii are asked for on every hit test, so the
/// editor always measures through one of these.
pub struct CachedMeasure {
    inner: Box<dyn TextMeasure>,
    radii: RefCell<HashMap<(String, u64), f64>>,
}

impl CachedMeasure {
    #[must_use]
    pub fn new(inner: Box<dyn TextMeasure>) -> Self {
        Self { inner, radii: RefCell::new(HashMap::new()) }
    }

    /// Number of memoized radii.
    #[must_use]
    pub fn cached(&self) -> usize {
        self.radii.borrow().len()
    }
}

impl Default for CachedMeasure {
    fn default() -> Self {
        Self::new(Box::new(ApproxMetrics))
    }
}

impl TextMeasure for CachedMeasure {
    fn text_width(&self, text: &str, font_px: f64) -> f64 {
        self.inner.text_width(text, font_px)
    }

    fn label_radius(&self, text: &str, font_px: f64) -> f64 {
        let key = (text.to_string(), font_px.to_bits());
        let hit = self.radii.borrow().get(&key).copied();
        if let Some(radius) = hit {
            return radius;
        }
        let radius = self.inner.label_radius(text, font_px);
        let mut radii = self.radii.borrow_mut();
        if radii.len() >= LABEL_CACHE_LIMIT {
            radii.clear();
        }
        radii.insert(key, radius);
        radius
    }
}

/// Fixed-advance approximation: every character is `0.6 × font_px` wide.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproxMetrics;

impl TextMeasure for ApproxMetrics {
    fn text_width(&self, text: &str, font_px: f64) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let chars = text.chars().count() as f64;
        chars * font_px * APPROX_CHAR_WIDTH_FACTOR
    }
}

/// Result of wrapping a label.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub lines: Vec<String>,
    pub width: f64,
    pub height: f64,
}

/// Greedy word-wrap of `text` at `max_width`. Words wider than `max_width`
/// occupy a line of their own. Explicit newlines always break.
#[must_use]
pub fn wrap_text<M: TextMeasure + ?Sized>(text: &str, max_width: f64, font_px: f64, metrics: &M) -> TextBlock {
    let mut lines: Vec<String> = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if current.is_empty() {
                current.push_str(word);
                continue;
            }
            let candidate = format!("{current} {word}");
            if metrics.text_width(&candidate, font_px) <= max_width {
                current = candidate;
            } else {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
            }
        }
        lines.push(current);
    }

    let width = lines
        .iter()
        .map(|l| metrics.text_width(l, font_px))
        .fold(0.0_f64, f64::max);
    #[allow(clippy::cast_precision_loss)]
    let height = lines.len() as f64 * font_px * LINE_HEIGHT_FACTOR;
    TextBlock { lines, width, height }
}

fn circumscribed_radius(block: &TextBlock) -> f64 {
    (block.width * 0.5).hypot(block.height * 0.5) + NODE_TEXT_PADDING
}

/// Pick the wrap that yields the smallest enclosing circle.
///
/// Walks the distinct greedy wraps from a single line downwards: each step
/// wraps just below the previous block width, which forces the widest line to
/// break. Line count only grows along the way, so the walk stops once the text
/// height alone cannot beat the best radius. The narrowest width reaching the
/// minimum radius wins.
#[must_use]
pub fn fit_label<M: TextMeasure + ?Sized>(text: &str, font_px: f64, metrics: &M) -> (TextBlock, f64) {
    let widest_word = text
        .split_whitespace()
        .map(|w| metrics.text_width(w, font_px))
        .fold(0.0_f64, f64::max);

    let mut block = wrap_text(text, f64::INFINITY, font_px, metrics);
    let mut best_radius = circumscribed_radius(&block);
    let mut best_block = block.clone();

    while block.width > widest_word {
        let next = wrap_text(text, block.width.next_down(), font_px, metrics);
        if next.width >= block.width {
            break;
        }
        let radius = circumscribed_radius(&next);
        if radius <= best_radius + 1e-9 {
            best_radius = radius.min(best_radius);
            best_block = next.clone();
        }
        if next.height * 0.5 + NODE_TEXT_PADDING >= best_radius {
            break;
        }
        block = next;
    }
    (best_block, best_radius)
}

/// Rendered radius of a node label: the tightest circle around its wrapped
/// text, never smaller than [`NODE_BASE_RADIUS`].
#[must_use]
pub fn node_radius(text: &str, font_px: f64, metrics: &dyn TextMeasure) -> f64 {
    if text.trim().is_empty() {
        return NODE_BASE_RADIUS;
    }
    metrics.label_radius(text, font_px).max(NODE_BASE_RADIUS)
}
