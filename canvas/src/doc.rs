//! Document model: nodes, annotations, shapes, and their pure mutations.
//!
//! [`Document`] owns the three canonical collections. Every mutation here is a
//! plain function over the data that reports whether anything observable
//! changed; the history layer ([`crate::editor::Editor`]) uses that flag to
//! decide whether a snapshot is pushed.
//!
//! Nodes form a forest through `parent_id` pointers only. Children are derived
//! on demand by [`Document::children_index`], never stored.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::camera::Point;
use crate::consts::{
    ARROW_HEIGHT_MIN, ARROW_SIDE_MAX, ARROW_WIDTH_MIN, DEFAULT_COLOR, DEFAULT_ROOT_ID, DEFAULT_ROOT_TEXT,
    ELLIPSE_RADIUS_MAX, ELLIPSE_RADIUS_MIN, LINE_LENGTH_MAX, LINE_LENGTH_MIN, RECT_SIDE_MAX, RECT_SIDE_MIN,
    RING_RADIUS_MAX, RING_RADIUS_MIN, THICKNESS_MAX, THICKNESS_MIN,
};
use crate::geometry::rotate_about;

/// Identifier shared by every entity kind. Imported documents may carry any
/// string; ids generated by the engine are UUID v4 strings.
pub type EntityId = String;

/// Generate a fresh entity id.
#[must_use]
pub fn new_id() -> EntityId {
    Uuid::new_v4().to_string()
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

// =============================================================
// TextSize
// =============================================================

/// Label size bucket. Anything unrecognised normalizes to `Medium`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl TextSize {
    /// Parse a raw value, defaulting to `Medium`.
    #[must_use]
    pub fn normalize(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "small" => Self::Small,
            "large" => Self::Large,
            _ => Self::Medium,
        }
    }

    /// Font size in pixels at scale 1.
    #[must_use]
    pub fn font_px(self) -> f64 {
        match self {
            Self::Small => 14.0,
            Self::Medium => 18.0,
            Self::Large => 24.0,
        }
    }
}

impl<'de> Deserialize<'de> for TextSize {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = serde_json::Value::deserialize(deserializer)?;
        Ok(raw.as_str().map_or(Self::Medium, Self::normalize))
    }
}

// =============================================================
// Entities
// =============================================================

/// A labelled circle in the node forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: EntityId,
    #[serde(default)]
    pub parent_id: Option<EntityId>,
    #[serde(default)]
    pub text: String,
    pub x: f64,
    pub y: f64,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub text_size: TextSize,
}

impl Node {
    #[must_use]
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// A free-floating text callout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub id: EntityId,
    #[serde(default)]
    pub text: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub text_size: TextSize,
}

impl Annotation {
    #[must_use]
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Kind-specific geometry of a shape. `(x, y)` on the owning [`Shape`] is
/// always the centre.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum ShapeKind {
    Ring {
        radius: f64,
        thickness: f64,
    },
    Ellipse {
        radius_x: f64,
        radius_y: f64,
        thickness: f64,
    },
    Rectangle {
        width: f64,
        height: f64,
        thickness: f64,
    },
    Arrow {
        width: f64,
        height: f64,
        thickness: f64,
        #[serde(default)]
        angle: f64,
    },
    Line {
        length: f64,
        thickness: f64,
        #[serde(default)]
        angle: f64,
    },
}

fn clamp_dim(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        return min;
    }
    value.clamp(min, max)
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

/// NaN and infinities do not survive a JSON round trip.
fn finite_position(x: f64, y: f64) -> bool {
    x.is_finite() && y.is_finite()
}

impl ShapeKind {
    /// Wire tag for this kind.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ring { .. } => "ring",
            Self::Ellipse { .. } => "ellipse",
            Self::Rectangle { .. } => "rectangle",
            Self::Arrow { .. } => "arrow",
            Self::Line { .. } => "line",
        }
    }

    #[must_use]
    pub fn thickness(&self) -> f64 {
        match *self {
            Self::Ring { thickness, .. }
            | Self::Ellipse { thickness, .. }
            | Self::Rectangle { thickness, .. }
            | Self::Arrow { thickness, .. }
            | Self::Line { thickness, .. } => thickness,
        }
    }

    /// Rotation in radians; zero for axis-aligned kinds.
    #[must_use]
    pub fn angle(&self) -> f64 {
        match *self {
            Self::Arrow { angle, .. } | Self::Line { angle, .. } => angle,
            _ => 0.0,
        }
    }

    /// Copy with every dimension pulled into its kind's allowed range.
    #[must_use]
    pub fn clamped(self) -> Self {
        match self {
            Self::Ring { radius, thickness } => {
                let thickness = clamp_dim(thickness, THICKNESS_MIN, THICKNESS_MAX);
                Self::Ring { radius: clamp_dim(radius, RING_RADIUS_MIN.max(thickness), RING_RADIUS_MAX), thickness }
            }
            Self::Ellipse { radius_x, radius_y, thickness } => Self::Ellipse {
                radius_x: clamp_dim(radius_x, ELLIPSE_RADIUS_MIN, ELLIPSE_RADIUS_MAX),
                radius_y: clamp_dim(radius_y, ELLIPSE_RADIUS_MIN, ELLIPSE_RADIUS_MAX),
                thickness: clamp_dim(thickness, THICKNESS_MIN, THICKNESS_MAX),
            },
            Self::Rectangle { width, height, thickness } => Self::Rectangle {
                width: clamp_dim(width, RECT_SIDE_MIN, RECT_SIDE_MAX),
                height: clamp_dim(height, RECT_SIDE_MIN, RECT_SIDE_MAX),
                thickness: clamp_dim(thickness, THICKNESS_MIN, THICKNESS_MAX),
            },
            Self::Arrow { width, height, thickness, angle } => Self::Arrow {
                width: clamp_dim(width, ARROW_WIDTH_MIN, ARROW_SIDE_MAX),
                height: clamp_dim(height, ARROW_HEIGHT_MIN, ARROW_SIDE_MAX),
                thickness: clamp_dim(thickness, THICKNESS_MIN, THICKNESS_MAX),
                angle: finite_or_zero(angle),
            },
            Self::Line { length, thickness, angle } => Self::Line {
                length: clamp_dim(length, LINE_LENGTH_MIN, LINE_LENGTH_MAX),
                thickness: clamp_dim(thickness, THICKNESS_MIN, THICKNESS_MAX),
                angle: finite_or_zero(angle),
            },
        }
    }
}

/// A stroked geometric figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub id: EntityId,
    pub x: f64,
    pub y: f64,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(flatten)]
    pub kind: ShapeKind,
}

impl Shape {
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// World position of this shape's single resize handle.
    ///
    /// Ring: the rightmost point of the circle. Ellipse and rectangle: the
    /// bottom-right corner of the bounding box. Arrow: the tip `(width/2, 0)`
    /// in local space, rotated by `angle`, rather than a corner of the head;
    /// dragging it turns and stretches the arrow while the height is left
    /// alone. Line: the far endpoint, rotated the same way.
    #[must_use]
    pub fn handle_anchor(&self) -> Point {
        let c = self.center();
        match self.kind {
            ShapeKind::Ring { radius, .. } => Point::new(c.x + radius, c.y),
            ShapeKind::Ellipse { radius_x, radius_y, .. } => Point::new(c.x + radius_x, c.y + radius_y),
            ShapeKind::Rectangle { width, height, .. } => Point::new(c.x + width * 0.5, c.y + height * 0.5),
            ShapeKind::Arrow { width, angle, .. } => rotate_about(Point::new(width * 0.5, 0.0), angle, c),
            ShapeKind::Line { length, angle, .. } => rotate_about(Point::new(length * 0.5, 0.0), angle, c),
        }
    }

    /// Resize toward a world-space pointer position. Arrow and line also turn
    /// to face the pointer. The result is clamped.
    pub fn resize_to(&mut self, pointer: Point) {
        let dx = pointer.x - self.x;
        let dy = pointer.y - self.y;
        let dist = dx.hypot(dy);
        self.kind = match self.kind {
            ShapeKind::Ring { thickness, .. } => ShapeKind::Ring { radius: dist, thickness },
            ShapeKind::Ellipse { thickness, .. } => ShapeKind::Ellipse { radius_x: dx.abs(), radius_y: dy.abs(), thickness },
            ShapeKind::Rectangle { thickness, .. } => {
                ShapeKind::Rectangle { width: dx.abs() * 2.0, height: dy.abs() * 2.0, thickness }
            }
            ShapeKind::Arrow { height, thickness, .. } => {
                ShapeKind::Arrow { width: dist * 2.0, height, thickness, angle: dy.atan2(dx) }
            }
            ShapeKind::Line { thickness, .. } => ShapeKind::Line { length: dist * 2.0, thickness, angle: dy.atan2(dx) },
        }
        .clamped();
    }
}

// =============================================================
// Drafts and patches
// =============================================================

/// Input for creating a node. A missing id is generated.
#[derive(Debug, Clone, Default)]
pub struct NodeDraft {
    pub id: Option<EntityId>,
    pub parent_id: Option<EntityId>,
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub color: Option<String>,
    pub text_size: TextSize,
}

/// Input for creating an annotation. A missing id is generated.
#[derive(Debug, Clone, Default)]
pub struct AnnotationDraft {
    pub id: Option<EntityId>,
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub text_size: TextSize,
}

/// Input for creating a shape. A missing id is generated; dimensions are clamped.
#[derive(Debug, Clone)]
pub struct ShapeDraft {
    pub id: Option<EntityId>,
    pub x: f64,
    pub y: f64,
    pub color: Option<String>,
    pub kind: ShapeKind,
}

/// Sparse node update. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePatch {
    pub text: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub color: Option<String>,
    pub text_size: Option<TextSize>,
}

/// Sparse annotation update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationPatch {
    pub text: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub text_size: Option<TextSize>,
}

/// Sparse shape update. Fields that do not exist on the shape's kind are
/// ignored; the result is clamped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapePatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub color: Option<String>,
    pub radius: Option<f64>,
    pub radius_x: Option<f64>,
    pub radius_y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub length: Option<f64>,
    pub thickness: Option<f64>,
    pub angle: Option<f64>,
}

fn set_if_changed<T: PartialEq>(slot: &mut T, value: Option<T>) -> bool {
    match value {
        Some(v) if *slot != v => {
            *slot = v;
            true
        }
        _ => false,
    }
}

impl ShapePatch {
    fn apply(&self, shape: &mut Shape) -> bool {
        let before = shape.clone();
        if let Some(x) = self.x.filter(|v| v.is_finite()) {
            shape.x = x;
        }
        if let Some(y) = self.y.filter(|v| v.is_finite()) {
            shape.y = y;
        }
        if let Some(ref color) = self.color {
            shape.color.clone_from(color);
        }
        let t = self.thickness;
        shape.kind = match shape.kind {
            ShapeKind::Ring { radius, thickness } => ShapeKind::Ring {
                radius: self.radius.unwrap_or(radius),
                thickness: t.unwrap_or(thickness),
            },
            ShapeKind::Ellipse { radius_x, radius_y, thickness } => ShapeKind::Ellipse {
                radius_x: self.radius_x.unwrap_or(radius_x),
                radius_y: self.radius_y.unwrap_or(radius_y),
                thickness: t.unwrap_or(thickness),
            },
            ShapeKind::Rectangle { width, height, thickness } => ShapeKind::Rectangle {
                width: self.width.unwrap_or(width),
                height: self.height.unwrap_or(height),
                thickness: t.unwrap_or(thickness),
            },
            ShapeKind::Arrow { width, height, thickness, angle } => ShapeKind::Arrow {
                width: self.width.unwrap_or(width),
                height: self.height.unwrap_or(height),
                thickness: t.unwrap_or(thickness),
                angle: self.angle.unwrap_or(angle),
            },
            ShapeKind::Line { length, thickness, angle } => ShapeKind::Line {
                length: self.length.unwrap_or(length),
                thickness: t.unwrap_or(thickness),
                angle: self.angle.unwrap_or(angle),
            },
        }
        .clamped();
        *shape != before
    }
}

// =============================================================
// Document
// =============================================================

/// The three canonical collections. Also the undo snapshot type and the
/// export payload.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub shapes: Vec<Shape>,
}

impl Document {
    /// A document holding only the default root node.
    #[must_use]
    pub fn with_default_root() -> Self {
        Self {
            nodes: vec![Node {
                id: DEFAULT_ROOT_ID.to_string(),
                parent_id: None,
                text: DEFAULT_ROOT_TEXT.to_string(),
                x: 0.0,
                y: 0.0,
                color: default_color(),
                text_size: TextSize::Medium,
            }],
            annotations: Vec::new(),
            shapes: Vec::new(),
        }
    }

    // --- Lookup ---

    #[must_use]
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    #[must_use]
    pub fn annotation(&self, id: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    fn annotation_mut(&mut self, id: &str) -> Option<&mut Annotation> {
        self.annotations.iter_mut().find(|a| a.id == id)
    }

    #[must_use]
    pub fn shape(&self, id: &str) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id == id)
    }

    fn shape_mut(&mut self, id: &str) -> Option<&mut Shape> {
        self.shapes.iter_mut().find(|s| s.id == id)
    }

    #[must_use]
    pub fn has_id(&self, id: &str) -> bool {
        self.node(id).is_some() || self.annotation(id).is_some() || self.shape(id).is_some()
    }

    /// Parent → children index built from the current node list.
    #[must_use]
    pub fn children_index(&self) -> HashMap<&str, Vec<&str>> {
        let mut index: HashMap<&str, Vec<&str>> = HashMap::new();
        for node in &self.nodes {
            if let Some(ref parent) = node.parent_id {
                index.entry(parent.as_str()).or_default().push(node.id.as_str());
            }
        }
        index
    }

    /// Ids of the given nodes plus all their descendants. Ids that do not name
    /// a node are ignored.
    #[must_use]
    pub fn subtree_ids(&self, roots: &[EntityId]) -> HashSet<EntityId> {
        let index = self.children_index();
        let mut seen: HashSet<EntityId> = HashSet::new();
        let mut stack: Vec<&str> = roots
            .iter()
            .map(String::as_str)
            .filter(|id| self.node(id).is_some())
            .collect();
        while let Some(id) = stack.pop() {
            if !seen.insert(id.to_string()) {
                continue;
            }
            if let Some(children) = index.get(id) {
                stack.extend(children.iter().copied());
            }
        }
        seen
    }

    /// Number of direct children of `id`.
    #[must_use]
    pub fn child_count(&self, id: &str) -> usize {
        self.nodes.iter().filter(|n| n.parent_id.as_deref() == Some(id)).count()
    }

    // --- Nodes ---

    /// Insert a node. Rejected when the id is taken, the parent is missing or
    /// the position is not finite.
    pub fn insert_node(&mut self, node: Node) -> bool {
        if self.has_id(&node.id) || !finite_position(node.x, node.y) {
            return false;
        }
        if let Some(ref parent) = node.parent_id {
            if self.node(parent).is_none() {
                return false;
            }
        }
        self.nodes.push(node);
        true
    }

    pub fn update_node(&mut self, id: &str, patch: &NodePatch) -> bool {
        let Some(node) = self.node_mut(id) else {
            return false;
        };
        let mut changed = set_if_changed(&mut node.text, patch.text.clone());
        changed |= set_if_changed(&mut node.x, patch.x.filter(|v| v.is_finite()));
        changed |= set_if_changed(&mut node.y, patch.y.filter(|v| v.is_finite()));
        changed |= set_if_changed(&mut node.color, patch.color.clone());
        changed |= set_if_changed(&mut node.text_size, patch.text_size);
        changed
    }

    pub fn move_node(&mut self, id: &str, x: f64, y: f64) -> bool {
        self.update_node(id, &NodePatch { x: Some(x), y: Some(y), ..NodePatch::default() })
    }

    /// Point `id` at a new parent (or make it a root). Refused when it would
    /// create a cycle.
    pub fn reparent_node(&mut self, id: &str, new_parent: Option<&str>) -> bool {
        let Some(node) = self.node(id) else {
            return false;
        };
        if node.parent_id.as_deref() == new_parent {
            return false;
        }
        if let Some(parent) = new_parent {
            if self.node(parent).is_none() || self.subtree_ids(&[id.to_string()]).contains(parent) {
                return false;
            }
        }
        let new_parent = new_parent.map(str::to_string);
        self.node_mut(id).is_some_and(|n| {
            n.parent_id = new_parent;
            true
        })
    }

    /// Remove the given nodes and all their descendants in one pass. Returns
    /// the removed nodes in document order.
    pub fn remove_nodes(&mut self, ids: &[EntityId]) -> Vec<Node> {
        let doomed = self.subtree_ids(ids);
        if doomed.is_empty() {
            return Vec::new();
        }
        let (removed, kept): (Vec<Node>, Vec<Node>) =
            std::mem::take(&mut self.nodes).into_iter().partition(|n| doomed.contains(&n.id));
        self.nodes = kept;
        removed
    }

    // --- Annotations ---

    pub fn insert_annotation(&mut self, annotation: Annotation) -> bool {
        if self.has_id(&annotation.id) || !finite_position(annotation.x, annotation.y) {
            return false;
        }
        self.annotations.push(annotation);
        true
    }

    pub fn update_annotation(&mut self, id: &str, patch: &AnnotationPatch) -> bool {
        let Some(a) = self.annotation_mut(id) else {
            return false;
        };
        let mut changed = set_if_changed(&mut a.text, patch.text.clone());
        changed |= set_if_changed(&mut a.x, patch.x.filter(|v| v.is_finite()));
        changed |= set_if_changed(&mut a.y, patch.y.filter(|v| v.is_finite()));
        changed |= set_if_changed(&mut a.text_size, patch.text_size);
        changed
    }

    pub fn remove_annotation(&mut self, id: &str) -> bool {
        let before = self.annotations.len();
        self.annotations.retain(|a| a.id != id);
        self.annotations.len() != before
    }

    // --- Shapes ---

    /// Insert a shape, clamping its dimensions. A non-finite centre is refused.
    pub fn insert_shape(&mut self, mut shape: Shape) -> bool {
        if self.has_id(&shape.id) || !finite_position(shape.x, shape.y) {
            return false;
        }
        shape.kind = shape.kind.clamped();
        self.shapes.push(shape);
        true
    }

    pub fn update_shape(&mut self, id: &str, patch: &ShapePatch) -> bool {
        self.shape_mut(id).is_some_and(|s| patch.apply(s))
    }

    pub fn resize_shape(&mut self, id: &str, pointer: Point) -> bool {
        let Some(shape) = self.shape_mut(id) else {
            return false;
        };
        let before = shape.kind;
        shape.resize_to(pointer);
        shape.kind != before
    }

    pub fn remove_shape(&mut self, id: &str) -> bool {
        let before = self.shapes.len();
        self.shapes.retain(|s| s.id != id);
        self.shapes.len() != before
    }

    /// Total number of entities across all kinds.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.nodes.len() + self.annotations.len() + self.shapes.len()
    }
}
