#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use crate::consts::{FIT_PADDING, MAX_SCALE, MIN_SCALE, SCALE_EPSILON};
use crate::geometry::Bounds;

/// A point in either screen or world space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Viewport size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.width * 0.5, self.height * 0.5)
    }
}

/// Camera state for pan/zoom on the infinite canvas.
///
/// World origin sits at the viewport centre when both offsets are zero.
/// `offset_x` / `offset_y` are in CSS pixels; `scale` is clamped to
/// [`MIN_SCALE`]..=[`MAX_SCALE`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self { scale: 1.0, offset_x: 0.0, offset_y: 0.0 }
    }
}

/// Clamp a scale into the allowed zoom range.
#[must_use]
pub fn clamp_scale(scale: f64) -> f64 {
    if scale.is_nan() {
        return 1.0;
    }
    scale.clamp(MIN_SCALE, MAX_SCALE)
}

impl Camera {
    /// Convert a screen-space point (CSS pixels) to world coordinates.
    #[must_use]
    pub fn screen_to_world(&self, screen: Point, viewport: Viewport) -> Point {
        Point {
            x: (screen.x - viewport.width * 0.5 - self.offset_x) / self.scale,
            y: (screen.y - viewport.height * 0.5 - self.offset_y) / self.scale,
        }
    }

    /// Convert a world-space point to screen coordinates (CSS pixels).
    #[must_use]
    pub fn world_to_screen(&self, world: Point, viewport: Viewport) -> Point {
        Point {
            x: world.x * self.scale + self.offset_x + viewport.width * 0.5,
            y: world.y * self.scale + self.offset_y + viewport.height * 0.5,
        }
    }

    /// Convert a screen-space distance (pixels) to world-space distance.
    #[must_use]
    pub fn screen_dist_to_world(&self, screen_dist: f64) -> f64 {
        screen_dist / self.scale
    }

    /// Shift the view by a screen-space delta.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.offset_x += dx;
        self.offset_y += dy;
    }

    /// Multiply the scale by `factor`, keeping the world point under `pivot`
    /// (or under the viewport centre when `pivot` is `None`) fixed on screen.
    ///
    /// Returns `false` when the clamped scale is unchanged.
    pub fn zoom(&mut self, factor: f64, pivot: Option<Point>, viewport: Viewport) -> bool {
        let next = clamp_scale(self.scale * factor);
        if (next - self.scale).abs() < SCALE_EPSILON {
            return false;
        }
        let pivot = pivot.unwrap_or_else(|| viewport.center());
        let anchor = self.screen_to_world(pivot, viewport);
        self.scale = next;
        self.offset_x = pivot.x - viewport.width * 0.5 - anchor.x * next;
        self.offset_y = pivot.y - viewport.height * 0.5 - anchor.y * next;
        true
    }

    /// Frame the given circles (centre, radius) in the viewport.
    ///
    /// An empty input resets to the default view. Returns whether the camera
    /// changed.
    pub fn fit_to_content<I>(&mut self, items: I, viewport: Viewport) -> bool
    where
        I: IntoIterator<Item = (Point, f64)>,
    {
        let bounds = items
            .into_iter()
            .map(|(c, r)| Bounds::around(c, r + FIT_PADDING, r + FIT_PADDING))
            .reduce(Bounds::union);

        let next = match bounds {
            None => Camera::default(),
            Some(b) => {
                let fit_w = if b.width() > 0.0 { viewport.width / b.width() } else { MAX_SCALE };
                let fit_h = if b.height() > 0.0 { viewport.height / b.height() } else { MAX_SCALE };
                let scale = clamp_scale(fit_w.min(fit_h));
                let center = b.center();
                Camera { scale, offset_x: -center.x * scale, offset_y: -center.y * scale }
            }
        };

        if next == *self {
            return false;
        }
        *self = next;
        true
    }
}
