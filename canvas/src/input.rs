//! Input model: modifier keys, mouse buttons, and the drag state machine.
//!
//! `InputState` is the active gesture tracked between pointer-down and
//! pointer-up. Exactly one gesture can be active, and it belongs to the
//! pointer that started it. Each variant carries what the engine needs to
//! compute incremental moves and to commit or roll back on release.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::camera::Point;
use crate::doc::{Document, EntityId};

/// Pointer identifier as reported by the host (e.g. DOM `pointerId`).
pub type PointerId = i32;

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    /// Shift key is held.
    pub shift: bool,
    /// Ctrl key is held.
    pub ctrl: bool,
    /// Alt / Option key is held.
    pub alt: bool,
    /// Meta / Command key is held.
    pub meta: bool,
}

impl Modifiers {
    /// Shift, Ctrl or Meta: the "add to selection" chord.
    #[must_use]
    pub fn extends_selection(self) -> bool {
        self.shift || self.ctrl || self.meta
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button (or single-finger touch).
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button.
    Secondary,
}

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy)]
pub struct WheelDelta {
    /// Horizontal scroll amount in pixels.
    pub dx: f64,
    /// Vertical scroll amount in pixels (positive = down).
    pub dy: f64,
}

/// The five exclusive drag modes, plus `Idle`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragMode {
    Node,
    Annotation,
    ShapeMove,
    ShapeResize,
    Pan,
}

/// Internal state for the drag state machine.
#[derive(Debug, Clone, Default)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// Dragging one or more nodes. Every listed node keeps its offset from the pointer.
    DraggingNodes {
        pointer: PointerId,
        /// World-space pointer position at pointer-down.
        start_world: Point,
        /// Node ids with their positions at pointer-down.
        origins: Vec<(EntityId, Point)>,
        /// Document before the gesture, committed as one undo step on release.
        before: Document,
    },
    /// Dragging an annotation.
    DraggingAnnotation {
        pointer: PointerId,
        id: EntityId,
        start_world: Point,
        origin: Point,
        before: Document,
    },
    /// Moving a shape by its stroke.
    MovingShape {
        pointer: PointerId,
        id: EntityId,
        start_world: Point,
        origin: Point,
        before: Document,
    },
    /// Dragging a shape's resize handle.
    ResizingShape {
        pointer: PointerId,
        id: EntityId,
        before: Document,
    },
    /// Panning the view.
    Panning {
        pointer: PointerId,
        /// Screen-space position of the previous pointer event.
        last_screen: Point,
    },
}

impl InputState {
    /// Pointer that owns the active gesture.
    #[must_use]
    pub fn pointer(&self) -> Option<PointerId> {
        match self {
            Self::Idle => None,
            Self::DraggingNodes { pointer, .. }
            | Self::DraggingAnnotation { pointer, .. }
            | Self::MovingShape { pointer, .. }
            | Self::ResizingShape { pointer, .. }
            | Self::Panning { pointer, .. } => Some(*pointer),
        }
    }

    /// Active drag mode, if any.
    #[must_use]
    pub fn mode(&self) -> Option<DragMode> {
        match self {
            Self::Idle => None,
            Self::DraggingNodes { .. } => Some(DragMode::Node),
            Self::DraggingAnnotation { .. } => Some(DragMode::Annotation),
            Self::MovingShape { .. } => Some(DragMode::ShapeMove),
            Self::ResizingShape { .. } => Some(DragMode::ShapeResize),
            Self::Panning { .. } => Some(DragMode::Pan),
        }
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}
