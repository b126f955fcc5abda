#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::camera::{Camera, Point};
use crate::consts::{ANNOTATION_MAX_WIDTH, ANNOTATION_PADDING, HANDLE_SIZE_PX, HIT_PADDING};
use crate::doc::{Annotation, Document, EntityId, Node, Shape, ShapeKind};
use crate::geometry::{Bounds, TextMeasure, arrow_polygon, line_polygon, node_radius, point_in_polygon, wrap_text};
use crate::selection::Selection;

/// Which entity collection a hit belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitKind {
    Node,
    Annotation,
    Shape,
}

/// Which part of the entity was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitPart {
    Body,
    ResizeHandle,
}

/// Result of a hit test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub id: EntityId,
    pub kind: HitKind,
    pub part: HitPart,
}

impl Hit {
    fn body(id: &str, kind: HitKind) -> Self {
        Self { id: id.to_string(), kind, part: HitPart::Body }
    }
}

// =============================================================
// Per-entity tests
// =============================================================

/// Circle test against the node's rendered radius.
#[must_use]
pub fn node_contains(node: &Node, p: Point, metrics: &dyn TextMeasure) -> bool {
    let radius = node_radius(&node.text, node.text_size.font_px(), metrics);
    node.position().distance(p) <= radius
}

/// Padded box around an annotation's wrapped text, centred on its position.
#[must_use]
pub fn annotation_bounds(annotation: &Annotation, metrics: &dyn TextMeasure) -> Bounds {
    let block = wrap_text(&annotation.text, ANNOTATION_MAX_WIDTH, annotation.text_size.font_px(), metrics);
    Bounds::around(
        annotation.position(),
        block.width * 0.5 + ANNOTATION_PADDING,
        block.height * 0.5 + ANNOTATION_PADDING,
    )
}

#[must_use]
pub fn annotation_contains(annotation: &Annotation, p: Point, metrics: &dyn TextMeasure) -> bool {
    annotation_bounds(annotation, metrics).contains(p)
}

/// Stroke-only hit test.
///
/// Ring, ellipse and rectangle accept points inside the outer boundary and
/// outside the inner boundary, each offset from the outline by half the
/// stroke plus [`HIT_PADDING`]. Arrow and line use their padded polygon.
#[must_use]
pub fn shape_contains(shape: &Shape, p: Point) -> bool {
    let dx = p.x - shape.x;
    let dy = p.y - shape.y;
    let band = shape.kind.thickness() * 0.5 + HIT_PADDING;
    match shape.kind {
        ShapeKind::Ring { radius, .. } => (dx.hypot(dy) - radius).abs() <= band,
        ShapeKind::Ellipse { radius_x, radius_y, .. } => {
            let inside_outer = ellipse_value(dx, dy, radius_x + band, radius_y + band) <= 1.0;
            let (ix, iy) = (radius_x - band, radius_y - band);
            let inside_inner = ix > 0.0 && iy > 0.0 && ellipse_value(dx, dy, ix, iy) < 1.0;
            inside_outer && !inside_inner
        }
        ShapeKind::Rectangle { width, height, .. } => {
            let (hw, hh) = (width * 0.5, height * 0.5);
            let inside_outer = dx.abs() <= hw + band && dy.abs() <= hh + band;
            let inside_inner = dx.abs() < hw - band && dy.abs() < hh - band;
            inside_outer && !inside_inner
        }
        ShapeKind::Arrow { width, height, thickness, angle } => {
            point_in_polygon(p, &arrow_polygon(width, height, thickness, angle, shape.center(), HIT_PADDING))
        }
        ShapeKind::Line { length, thickness, angle } => {
            point_in_polygon(p, &line_polygon(length, thickness, angle, shape.center(), HIT_PADDING))
        }
    }
}

fn ellipse_value(dx: f64, dy: f64, rx: f64, ry: f64) -> f64 {
    (dx / rx).powi(2) + (dy / ry).powi(2)
}

/// Square handle of [`HANDLE_SIZE_PX`] screen pixels around the shape's anchor.
#[must_use]
pub fn handle_contains(shape: &Shape, p: Point, camera: &Camera) -> bool {
    let half = camera.screen_dist_to_world(HANDLE_SIZE_PX * 0.5);
    Bounds::around(shape.handle_anchor(), half, half).contains(p)
}

// =============================================================
// Document query
// =============================================================

/// Topmost entity under `world_pt`.
///
/// The selected shape's resize handle wins over everything; after that
/// annotations, then nodes, then shape strokes. Within a collection later
/// entries are drawn on top and are tested first.
#[must_use]
pub fn hit_test(
    world_pt: Point,
    doc: &Document,
    camera: &Camera,
    selection: &Selection,
    metrics: &dyn TextMeasure,
) -> Option<Hit> {
    if let Some(shape) = selection.shape_id().and_then(|id| doc.shape(id)) {
        if handle_contains(shape, world_pt, camera) {
            return Some(Hit { id: shape.id.clone(), kind: HitKind::Shape, part: HitPart::ResizeHandle });
        }
    }

    if let Some(a) = doc.annotations.iter().rev().find(|a| annotation_contains(a, world_pt, metrics)) {
        return Some(Hit::body(&a.id, HitKind::Annotation));
    }
    if let Some(n) = doc.nodes.iter().rev().find(|n| node_contains(n, world_pt, metrics)) {
        return Some(Hit::body(&n.id, HitKind::Node));
    }
    doc.shapes
        .iter()
        .rev()
        .find(|s| shape_contains(s, world_pt))
        .map(|s| Hit::body(&s.id, HitKind::Shape))
}
