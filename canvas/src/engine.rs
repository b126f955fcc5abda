//! Interaction controller: turns pointer and wheel events into editor calls.
//!
//! `EngineCore` owns the editor, the camera and the drag state machine. The
//! host feeds it raw events in screen coordinates and reacts to the returned
//! [`Action`]s (repaint, cursor change, persistence already handled). Drags
//! edit the live document through [`Editor::preview`] and land in history as a
//! single entry on pointer-up; pointer-cancel restores the pre-drag document.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use tracing::debug;

use crate::camera::{Camera, Point, Viewport};
use crate::config::EngineConfig;
use crate::consts::WHEEL_ZOOM_SENSITIVITY;
use crate::doc::{Annotation, AnnotationPatch, Document, EntityId, Shape, ShapePatch};
use crate::editor::Editor;
use crate::hit::{self, Hit, HitKind, HitPart};
use crate::input::{Button, DragMode, InputState, Modifiers, PointerId, WheelDelta};
use crate::selection::Selection;

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// The document changed (live preview or committed edit).
    DocumentChanged,
    /// The selection changed.
    SelectionChanged,
    /// Pan or zoom changed.
    CameraChanged,
    /// Set the CSS cursor of the canvas element.
    SetCursor(String),
    /// Something visible changed; schedule a repaint.
    RenderNeeded,
}

const CURSOR_DEFAULT: &str = "default";
const CURSOR_MOVE: &str = "move";
const CURSOR_RESIZE: &str = "nwse-resize";
const CURSOR_GRABBING: &str = "grabbing";

/// Core engine state. Everything here is host-independent and testable.
#[derive(Default)]
pub struct EngineCore {
    editor: Editor,
    camera: Camera,
    viewport: Viewport,
    input: InputState,
}

impl EngineCore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine over an editor built from [`EngineConfig`].
    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self { editor: Editor::from_config(config), ..Self::default() }
    }

    #[must_use]
    pub fn with_editor(editor: Editor) -> Self {
        Self { editor, ..Self::default() }
    }

    // --- Queries ---

    #[must_use]
    pub fn document(&self) -> &Document {
        self.editor.document()
    }

    #[must_use]
    pub fn selection(&self) -> &Selection {
        self.editor.selection()
    }

    #[must_use]
    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    /// Direct editor access for host commands. `None` while a gesture is
    /// active, since the gesture holds a snapshot of the document.
    pub fn editor_mut(&mut self) -> Option<&mut Editor> {
        if self.input.is_idle() { Some(&mut self.editor) } else { None }
    }

    #[must_use]
    pub fn camera(&self) -> Camera {
        self.camera
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Active drag mode, if a gesture is in progress.
    #[must_use]
    pub fn drag_mode(&self) -> Option<DragMode> {
        self.input.mode()
    }

    /// Hit-test a screen point against the current document.
    #[must_use]
    pub fn hit_at(&self, screen_pt: Point) -> Option<Hit> {
        let world = self.camera.screen_to_world(screen_pt, self.viewport);
        hit::hit_test(world, self.editor.document(), &self.camera, self.editor.selection(), self.editor.metrics())
    }

    // --- Viewport ---

    /// Update the viewport size in CSS pixels.
    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport = Viewport::new(width, height);
    }

    /// Zoom about the viewport centre.
    pub fn zoom(&mut self, factor: f64) -> Vec<Action> {
        if self.camera.zoom(factor, None, self.viewport) {
            vec![Action::CameraChanged, Action::RenderNeeded]
        } else {
            Vec::new()
        }
    }

    /// Frame every node in the viewport.
    pub fn fit_to_content(&mut self) -> Vec<Action> {
        let items: Vec<(Point, f64)> =
            self.editor.document().nodes.iter().map(|n| (n.position(), self.editor.node_radius(n))).collect();
        if self.camera.fit_to_content(items, self.viewport) {
            vec![Action::CameraChanged, Action::RenderNeeded]
        } else {
            Vec::new()
        }
    }

    // --- Commands ---
    //
    // Commands are ignored while a gesture is active so the gesture's
    // snapshot never goes stale.

    pub fn undo(&mut self) -> Vec<Action> {
        if !self.input.is_idle() || !self.editor.undo() {
            return Vec::new();
        }
        doc_and_selection_changed()
    }

    pub fn redo(&mut self) -> Vec<Action> {
        if !self.input.is_idle() || !self.editor.redo() {
            return Vec::new();
        }
        doc_and_selection_changed()
    }

    /// Delete whatever is selected: nodes (with descendants), an annotation or a shape.
    pub fn delete_selection(&mut self) -> Vec<Action> {
        if !self.input.is_idle() {
            return Vec::new();
        }
        let deleted = match self.editor.selection().clone() {
            Selection::None => false,
            Selection::Nodes(ids) => self.editor.delete_many(&ids),
            Selection::Annotation(id) => self.editor.delete_annotation(&id),
            Selection::Shape(id) => self.editor.delete_shape(&id),
        };
        if deleted { doc_and_selection_changed() } else { Vec::new() }
    }

    /// Add a child under the primary selected node and select it.
    pub fn add_child_to_primary(&mut self, text: &str) -> Option<EntityId> {
        if !self.input.is_idle() {
            return None;
        }
        let parent = self.editor.selection().primary_node()?.to_string();
        let id = self.editor.add_child(&parent, text)?;
        self.editor.set_selected_nodes(std::slice::from_ref(&id));
        Some(id)
    }

    // --- Input events ---

    pub fn on_pointer_down(
        &mut self,
        pointer: PointerId,
        screen_pt: Point,
        button: Button,
        modifiers: Modifiers,
    ) -> Vec<Action> {
        if !self.input.is_idle() {
            debug!(pointer, active = ?self.input.pointer(), "ignoring pointer-down during active gesture");
            return Vec::new();
        }

        match button {
            Button::Primary => {}
            Button::Middle => return self.begin_pan(pointer, screen_pt, Vec::new()),
            Button::Secondary => return Vec::new(),
        }

        let world = self.camera.screen_to_world(screen_pt, self.viewport);
        let Some(hit) = self.hit_at(screen_pt) else {
            let mut actions = Vec::new();
            if !modifiers.extends_selection() && self.editor.clear_selection() {
                actions.extend([Action::SelectionChanged, Action::RenderNeeded]);
            }
            return self.begin_pan(pointer, screen_pt, actions);
        };

        match (hit.kind, hit.part) {
            (HitKind::Shape, HitPart::ResizeHandle) => {
                let before = self.editor.begin_gesture();
                self.input = InputState::ResizingShape { pointer, id: hit.id, before };
                self.started(vec![Action::SetCursor(CURSOR_RESIZE.into())])
            }
            (HitKind::Shape, HitPart::Body) => {
                let mut actions = self.selection_actions(|e| e.select_shape(&hit.id));
                let origin = self.editor.document().shape(&hit.id).map(Shape::center).unwrap_or(world);
                let before = self.editor.begin_gesture();
                self.input = InputState::MovingShape { pointer, id: hit.id, start_world: world, origin, before };
                actions.push(Action::SetCursor(CURSOR_MOVE.into()));
                self.started(actions)
            }
            (HitKind::Annotation, _) => {
                let mut actions = self.selection_actions(|e| e.select_annotation(&hit.id));
                let origin =
                    self.editor.document().annotation(&hit.id).map(Annotation::position).unwrap_or(world);
                let before = self.editor.begin_gesture();
                self.input = InputState::DraggingAnnotation { pointer, id: hit.id, start_world: world, origin, before };
                actions.push(Action::SetCursor(CURSOR_MOVE.into()));
                self.started(actions)
            }
            (HitKind::Node, _) => self.begin_node_drag(pointer, &hit.id, world, modifiers),
        }
    }

    pub fn on_pointer_move(&mut self, pointer: PointerId, screen_pt: Point) -> Vec<Action> {
        if self.input.is_idle() {
            return vec![Action::SetCursor(self.hover_cursor(screen_pt).into())];
        }
        if self.input.pointer() != Some(pointer) {
            return Vec::new();
        }

        let world = self.camera.screen_to_world(screen_pt, self.viewport);
        let changed = match &mut self.input {
            InputState::Idle => false,
            InputState::DraggingNodes { start_world, origins, .. } => {
                let (dx, dy) = (world.x - start_world.x, world.y - start_world.y);
                self.editor.preview(|doc| {
                    origins.iter().fold(false, |changed, (id, o)| doc.move_node(id, o.x + dx, o.y + dy) | changed)
                })
            }
            InputState::DraggingAnnotation { id, start_world, origin, .. } => {
                let patch = AnnotationPatch {
                    x: Some(origin.x + world.x - start_world.x),
                    y: Some(origin.y + world.y - start_world.y),
                    ..AnnotationPatch::default()
                };
                self.editor.preview(|doc| doc.update_annotation(id, &patch))
            }
            InputState::MovingShape { id, start_world, origin, .. } => {
                let patch = ShapePatch {
                    x: Some(origin.x + world.x - start_world.x),
                    y: Some(origin.y + world.y - start_world.y),
                    ..ShapePatch::default()
                };
                self.editor.preview(|doc| doc.update_shape(id, &patch))
            }
            InputState::ResizingShape { id, .. } => self.editor.preview(|doc| doc.resize_shape(id, world)),
            InputState::Panning { last_screen, .. } => {
                if screen_pt == *last_screen {
                    return Vec::new();
                }
                self.camera.pan_by(screen_pt.x - last_screen.x, screen_pt.y - last_screen.y);
                *last_screen = screen_pt;
                return vec![Action::CameraChanged, Action::RenderNeeded];
            }
        };

        if changed { vec![Action::DocumentChanged, Action::RenderNeeded] } else { Vec::new() }
    }

    /// Finish the gesture owned by `pointer`, applying the release position
    /// first. The whole gesture becomes one undo step.
    pub fn on_pointer_up(&mut self, pointer: PointerId, screen_pt: Point) -> Vec<Action> {
        if self.input.is_idle() || self.input.pointer() != Some(pointer) {
            return Vec::new();
        }
        let mut actions = self.on_pointer_move(pointer, screen_pt);
        let mode = self.input.mode();

        let committed = match std::mem::take(&mut self.input) {
            InputState::Idle | InputState::Panning { .. } => false,
            InputState::DraggingNodes { before, .. } => self.editor.finish_gesture(before, "drag_nodes"),
            InputState::DraggingAnnotation { before, .. } => self.editor.finish_gesture(before, "drag_annotation"),
            InputState::MovingShape { before, .. } => self.editor.finish_gesture(before, "move_shape"),
            InputState::ResizingShape { before, .. } => self.editor.finish_gesture(before, "resize_shape"),
        };
        debug!(pointer, ?mode, committed, "gesture finished");

        if committed && !actions.contains(&Action::DocumentChanged) {
            actions.push(Action::DocumentChanged);
        }
        actions.push(Action::SetCursor(self.hover_cursor(screen_pt).into()));
        actions
    }

    /// Abort the gesture owned by `pointer`; document edits made during the
    /// gesture are rolled back. Camera movement from a pan is kept.
    pub fn on_pointer_cancel(&mut self, pointer: PointerId) -> Vec<Action> {
        if self.input.is_idle() || self.input.pointer() != Some(pointer) {
            return Vec::new();
        }
        let mode = self.input.mode();
        let before = match std::mem::take(&mut self.input) {
            InputState::Idle | InputState::Panning { .. } => None,
            InputState::DraggingNodes { before, .. }
            | InputState::DraggingAnnotation { before, .. }
            | InputState::MovingShape { before, .. }
            | InputState::ResizingShape { before, .. } => Some(before),
        };
        debug!(pointer, ?mode, "gesture cancelled");

        let mut actions = vec![Action::SetCursor(CURSOR_DEFAULT.into())];
        if let Some(before) = before {
            if before != *self.editor.document() {
                self.editor.cancel_gesture(before);
                actions.extend([Action::DocumentChanged, Action::RenderNeeded]);
            }
        }
        actions
    }

    /// Ctrl/Meta + wheel zooms about the cursor; a plain wheel pans.
    pub fn on_wheel(&mut self, screen_pt: Point, delta: WheelDelta, modifiers: Modifiers) -> Vec<Action> {
        let changed = if modifiers.ctrl || modifiers.meta {
            let factor = (-delta.dy * WHEEL_ZOOM_SENSITIVITY).exp();
            self.camera.zoom(factor, Some(screen_pt), self.viewport)
        } else if delta.dx.abs() > 0.0 || delta.dy.abs() > 0.0 {
            self.camera.pan_by(-delta.dx, -delta.dy);
            true
        } else {
            false
        };
        if changed { vec![Action::CameraChanged, Action::RenderNeeded] } else { Vec::new() }
    }

    // --- Internals ---

    fn begin_pan(&mut self, pointer: PointerId, screen_pt: Point, mut actions: Vec<Action>) -> Vec<Action> {
        self.input = InputState::Panning { pointer, last_screen: screen_pt };
        actions.push(Action::SetCursor(CURSOR_GRABBING.into()));
        self.started(actions)
    }

    fn begin_node_drag(&mut self, pointer: PointerId, id: &str, world: Point, modifiers: Modifiers) -> Vec<Action> {
        let mut actions = if modifiers.extends_selection() {
            self.selection_actions(|e| e.toggle_node_selection(id))
        } else if self.editor.selection().contains_node(id) {
            Vec::new()
        } else {
            self.selection_actions(|e| e.set_selected_nodes(&[id.to_string()]))
        };

        // A toggle that removed the node leaves nothing to drag.
        if !self.editor.selection().contains_node(id) {
            return actions;
        }

        let doc = self.editor.document();
        let origins: Vec<(EntityId, Point)> = self
            .editor
            .selection()
            .node_ids()
            .iter()
            .filter_map(|nid| doc.node(nid).map(|n| (nid.clone(), n.position())))
            .collect();
        let before = self.editor.begin_gesture();
        self.input = InputState::DraggingNodes { pointer, start_world: world, origins, before };
        actions.push(Action::SetCursor(CURSOR_MOVE.into()));
        self.started(actions)
    }

    fn selection_actions<F>(&mut self, f: F) -> Vec<Action>
    where
        F: FnOnce(&mut Editor) -> bool,
    {
        if f(&mut self.editor) { vec![Action::SelectionChanged, Action::RenderNeeded] } else { Vec::new() }
    }

    fn started(&self, actions: Vec<Action>) -> Vec<Action> {
        debug!(pointer = ?self.input.pointer(), mode = ?self.input.mode(), "gesture started");
        actions
    }

    fn hover_cursor(&self, screen_pt: Point) -> &'static str {
        match self.hit_at(screen_pt) {
            Some(Hit { part: HitPart::ResizeHandle, .. }) => CURSOR_RESIZE,
            Some(_) => CURSOR_MOVE,
            None => CURSOR_DEFAULT,
        }
    }
}

fn doc_and_selection_changed() -> Vec<Action> {
    vec![Action::DocumentChanged, Action::SelectionChanged, Action::RenderNeeded]
}
