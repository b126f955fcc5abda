//! Shared numeric constants for the canvas crate.

// ── Camera ──────────────────────────────────────────────────────

/// Smallest allowed view scale.
pub const MIN_SCALE: f64 = 0.25;

/// Largest allowed view scale.
pub const MAX_SCALE: f64 = 2.5;

/// World-space margin added around content by fit-to-content.
pub const FIT_PADDING: f64 = 48.0;

/// Wheel delta (pixels) to zoom-factor exponent.
pub const WHEEL_ZOOM_SENSITIVITY: f64 = 0.0015;

/// Tolerance for "did the scale actually change".
pub const SCALE_EPSILON: f64 = 1e-9;

// ── Nodes ───────────────────────────────────────────────────────

/// Nodes are never drawn smaller than this radius.
pub const NODE_BASE_RADIUS: f64 = 36.0;

/// Gap between a node's label block and its circle outline.
pub const NODE_TEXT_PADDING: f64 = 12.0;

/// Memoized label radii kept before the cache is flushed.
pub const LABEL_CACHE_LIMIT: usize = 4096;

/// Line height as a multiple of the font size.
pub const LINE_HEIGHT_FACTOR: f64 = 1.25;

/// Approximate glyph advance as a multiple of the font size.
pub const APPROX_CHAR_WIDTH_FACTOR: f64 = 0.6;

/// Space left between a parent's outline and a new child's outline.
pub const CHILD_GAP: f64 = 80.0;

/// Angular step between successive siblings (golden angle), measured from
/// the direction pointing away from the grandparent.
pub const CHILD_ANGLE_STEP: f64 = 2.399_963_229_728_653;

/// Default colour for nodes and shapes.
pub const DEFAULT_COLOR: &str = "#4f46e5";

/// Id of the root node produced by `clear_all`.
pub const DEFAULT_ROOT_ID: &str = "root";

/// Label of the root node produced by `clear_all`.
pub const DEFAULT_ROOT_TEXT: &str = "Central idea";

// ── Annotations ─────────────────────────────────────────────────

/// Wrap width for annotation text blocks.
pub const ANNOTATION_MAX_WIDTH: f64 = 240.0;

/// Padding around an annotation's text block for hit-testing.
pub const ANNOTATION_PADDING: f64 = 8.0;

// ── Shapes ──────────────────────────────────────────────────────

pub const THICKNESS_MIN: f64 = 2.0;
pub const THICKNESS_MAX: f64 = 120.0;

pub const RING_RADIUS_MIN: f64 = 24.0;
pub const RING_RADIUS_MAX: f64 = 4000.0;

pub const ELLIPSE_RADIUS_MIN: f64 = 16.0;
pub const ELLIPSE_RADIUS_MAX: f64 = 4000.0;

pub const RECT_SIDE_MIN: f64 = 24.0;
pub const RECT_SIDE_MAX: f64 = 8000.0;

pub const ARROW_WIDTH_MIN: f64 = 60.0;
pub const ARROW_HEIGHT_MIN: f64 = 36.0;
pub const ARROW_SIDE_MAX: f64 = 8000.0;

pub const LINE_LENGTH_MIN: f64 = 24.0;
pub const LINE_LENGTH_MAX: f64 = 8000.0;

/// Arrow head length as a fraction of the arrow's half-width.
pub const ARROW_HEAD_FRACTION: f64 = 0.6;

/// Arrow head length floor.
pub const ARROW_HEAD_MIN: f64 = 18.0;

// ── Hit-testing ─────────────────────────────────────────────────

/// World-space slop added to stroke bands and arrow/line polygons.
pub const HIT_PADDING: f64 = 6.0;

/// Side of the square resize handle, in screen pixels.
pub const HANDLE_SIZE_PX: f64 = 14.0;
