//! Editor: the document plus selection, wrapped in snapshot undo/redo.
//!
//! DESIGN
//! ======
//! Every document-changing call runs against the live [`Document`] after
//! cloning it. If the call reports a change, the clone is pushed onto the
//! undo stack; otherwise it is discarded, so no-op calls never create an
//! undo step. Batch calls (`move_many`, `delete_many`, `update_many`) run as a
//! single closure and therefore produce a single entry.
//!
//! Selection is not part of a snapshot. After undo/redo it is re-resolved
//! against the restored document.
//!
//! Pointer gestures edit the document through [`Editor::preview`] and are
//! recorded once, on release, by [`Editor::finish_gesture`].
//!
//! PERSISTENCE
//! ===========
//! With a [`Storage`] attached, the full state is written after every
//! observable change. Write failures are logged and otherwise ignored.

#[cfg(test)]
#[path = "editor_test.rs"]
mod editor_test;

use tracing::{debug, info, warn};

use crate::camera::Point;
use crate::config::EngineConfig;
use crate::consts::{CHILD_ANGLE_STEP, CHILD_GAP, DEFAULT_COLOR};
use crate::doc::{
    Annotation, AnnotationDraft, AnnotationPatch, Document, EntityId, Node, NodeDraft, NodePatch, Shape, ShapeDraft,
    ShapePatch, TextSize, new_id,
};
use crate::geometry::{CachedMeasure, TextMeasure, node_radius, rotate_about};
use crate::history::History;
use crate::persist::{self, FileStorage, ImportError, Storage, decode_state, encode_state};
use crate::selection::Selection;

pub struct Editor {
    doc: Document,
    selection: Selection,
    history: History<Document>,
    storage: Option<Box<dyn Storage>>,
    metrics: CachedMeasure,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    /// Editor holding the default root node, selected, with empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::with_document(Document::with_default_root())
    }

    /// Editor over an existing document. The first node, if any, is selected.
    #[must_use]
    pub fn with_document(doc: Document) -> Self {
        let selection = first_node_selection(&doc);
        Self { doc, selection, history: History::default(), storage: None, metrics: CachedMeasure::default() }
    }

    /// Editor configured from [`EngineConfig`]: history limit and, when a
    /// storage path is set, file persistence restored at startup.
    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        let mut editor = Self::new();
        editor.history = History::new(config.history_limit);
        match config.storage_path {
            Some(ref path) => editor.with_storage(Box::new(FileStorage::new(path.clone()))),
            None => editor,
        }
    }

    /// Attach a storage backend and restore whatever it holds.
    ///
    /// An unreadable or invalid payload is logged and the current state kept.
    #[must_use]
    pub fn with_storage(mut self, storage: Box<dyn Storage>) -> Self {
        match storage.load() {
            Ok(Some(raw)) => match decode_state(&raw) {
                Ok((doc, selection)) => {
                    info!(nodes = doc.nodes.len(), "restored persisted editor state");
                    self.doc = doc;
                    self.selection = selection;
                    self.history.reset();
                }
                Err(e) => warn!(error = %e, "persisted editor state is invalid; starting fresh"),
            },
            Ok(None) => debug!("no persisted editor state"),
            Err(e) => warn!(error = %e, "failed to read persisted editor state"),
        }
        self.storage = Some(storage);
        self
    }

    /// Replace the text metrics used for node radii and child placement.
    pub fn set_text_measure(&mut self, metrics: Box<dyn TextMeasure>) {
        self.metrics = CachedMeasure::new(metrics);
    }

    // --- Queries ---

    #[must_use]
    pub fn document(&self) -> &Document {
        &self.doc
    }

    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    #[must_use]
    pub fn history(&self) -> &History<Document> {
        &self.history
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    #[must_use]
    pub fn metrics(&self) -> &dyn TextMeasure {
        &self.metrics
    }

    /// Rendered radius of a node.
    #[must_use]
    pub fn node_radius(&self, node: &Node) -> f64 {
        node_radius(&node.text, node.text_size.font_px(), &self.metrics)
    }

    // --- Core commit path ---

    fn apply<F>(&mut self, op: &'static str, f: F) -> bool
    where
        F: FnOnce(&mut Document, &mut Selection) -> bool,
    {
        let before = self.doc.clone();
        if !f(&mut self.doc, &mut self.selection) {
            return false;
        }
        self.history.commit(before);
        debug!(op, undo_depth = self.history.undo_depth(), "history commit");
        self.persist();
        true
    }

    fn persist(&mut self) {
        let Some(storage) = self.storage.as_mut() else {
            return;
        };
        match encode_state(&self.doc, &self.selection) {
            Ok(payload) => {
                if let Err(e) = storage.save(&payload) {
                    warn!(error = %e, "failed to persist editor state");
                }
            }
            Err(e) => warn!(error = %e, "failed to encode editor state"),
        }
    }

    fn set_selection(&mut self, next: Selection) -> bool {
        if next == self.selection {
            return false;
        }
        self.selection = next;
        self.persist();
        true
    }

    // --- Nodes ---

    /// Add a node. Returns its id, or `None` when the id is taken, the
    /// parent does not exist or the position is not finite.
    pub fn add_node(&mut self, draft: NodeDraft) -> Option<EntityId> {
        let id = draft.id.unwrap_or_else(new_id);
        let node = Node {
            id: id.clone(),
            parent_id: draft.parent_id,
            text: draft.text,
            x: draft.x,
            y: draft.y,
            color: draft.color.unwrap_or_else(|| DEFAULT_COLOR.to_string()),
            text_size: draft.text_size,
        };
        self.apply("add_node", |doc, _| doc.insert_node(node)).then_some(id)
    }

    /// Add a child under `parent_id`, placed clear of the parent and its
    /// existing children. Inherits the parent's colour.
    pub fn add_child(&mut self, parent_id: &str, text: &str) -> Option<EntityId> {
        let parent = self.doc.node(parent_id)?;
        let pos = self.child_position(parent, text, TextSize::Medium);
        let color = parent.color.clone();
        self.add_node(NodeDraft {
            parent_id: Some(parent_id.to_string()),
            text: text.to_string(),
            x: pos.x,
            y: pos.y,
            color: Some(color),
            ..NodeDraft::default()
        })
    }

    fn child_position(&self, parent: &Node, text: &str, size: TextSize) -> Point {
        let metrics = &self.metrics;
        let distance = self.node_radius(parent) + node_radius(text, size.font_px(), metrics) + CHILD_GAP;
        let siblings = self.doc.child_count(&parent.id);
        let grandparent = parent.parent_id.as_deref().and_then(|g| self.doc.node(g));
        let outward = grandparent.map_or(0.0, |gp| (parent.y - gp.y).atan2(parent.x - gp.x));
        #[allow(clippy::cast_precision_loss)]
        let angle = outward + siblings as f64 * CHILD_ANGLE_STEP;
        rotate_about(Point::new(distance, 0.0), angle, parent.position())
    }

    pub fn update_node(&mut self, id: &str, patch: &NodePatch) -> bool {
        self.apply("update_node", |doc, _| doc.update_node(id, patch))
    }

    pub fn move_node(&mut self, id: &str, x: f64, y: f64) -> bool {
        self.apply("move_node", |doc, _| doc.move_node(id, x, y))
    }

    /// Apply the same patch to several nodes as one undo step.
    pub fn update_many(&mut self, ids: &[EntityId], patch: &NodePatch) -> bool {
        self.apply("update_many", |doc, _| {
            ids.iter().fold(false, |changed, id| doc.update_node(id, patch) | changed)
        })
    }

    /// Move several nodes as one undo step.
    pub fn move_many(&mut self, moves: &[(EntityId, f64, f64)]) -> bool {
        self.apply("move_many", |doc, _| {
            moves.iter().fold(false, |changed, (id, x, y)| doc.move_node(id, *x, *y) | changed)
        })
    }

    pub fn reparent_node(&mut self, id: &str, new_parent: Option<&str>) -> bool {
        self.apply("reparent_node", |doc, _| doc.reparent_node(id, new_parent))
    }

    /// Delete a node and its descendants.
    pub fn delete_node(&mut self, id: &str) -> bool {
        self.delete_many(&[id.to_string()])
    }

    /// Delete several nodes and all their descendants as one undo step.
    ///
    /// If no selected node survives, the selection moves to the parent of the
    /// first deleted node, else the first remaining node, else nothing.
    pub fn delete_many(&mut self, ids: &[EntityId]) -> bool {
        let anchor = ids
            .iter()
            .find_map(|id| self.doc.node(id))
            .and_then(|n| n.parent_id.clone());
        self.apply("delete_nodes", |doc, selection| {
            let removed = doc.remove_nodes(ids);
            if removed.is_empty() {
                return false;
            }
            if let Selection::Nodes(selected) = selection {
                let surviving: Vec<EntityId> = selected.iter().filter(|id| doc.node(id).is_some()).cloned().collect();
                *selection = if surviving.is_empty() {
                    match anchor.filter(|p| doc.node(p).is_some()) {
                        Some(parent) => Selection::Nodes(vec![parent]),
                        None => first_node_selection(doc),
                    }
                } else {
                    Selection::Nodes(surviving)
                };
            }
            debug!(removed = removed.len(), "cascade delete");
            true
        })
    }

    // --- Annotations ---

    pub fn add_annotation(&mut self, draft: AnnotationDraft) -> Option<EntityId> {
        let id = draft.id.unwrap_or_else(new_id);
        let annotation = Annotation { id: id.clone(), text: draft.text, x: draft.x, y: draft.y, text_size: draft.text_size };
        self.apply("add_annotation", |doc, _| doc.insert_annotation(annotation)).then_some(id)
    }

    pub fn update_annotation(&mut self, id: &str, patch: &AnnotationPatch) -> bool {
        self.apply("update_annotation", |doc, _| doc.update_annotation(id, patch))
    }

    pub fn move_annotation(&mut self, id: &str, x: f64, y: f64) -> bool {
        let patch = AnnotationPatch { x: Some(x), y: Some(y), ..AnnotationPatch::default() };
        self.update_annotation(id, &patch)
    }

    pub fn delete_annotation(&mut self, id: &str) -> bool {
        self.apply("delete_annotation", |doc, selection| {
            if !doc.remove_annotation(id) {
                return false;
            }
            if selection.annotation_id() == Some(id) {
                *selection = Selection::None;
            }
            true
        })
    }

    // --- Shapes ---

    pub fn add_shape(&mut self, draft: ShapeDraft) -> Option<EntityId> {
        let id = draft.id.unwrap_or_else(new_id);
        let shape = Shape {
            id: id.clone(),
            x: draft.x,
            y: draft.y,
            color: draft.color.unwrap_or_else(|| DEFAULT_COLOR.to_string()),
            kind: draft.kind,
        };
        self.apply("add_shape", |doc, _| doc.insert_shape(shape)).then_some(id)
    }

    pub fn update_shape(&mut self, id: &str, patch: &ShapePatch) -> bool {
        self.apply("update_shape", |doc, _| doc.update_shape(id, patch))
    }

    pub fn move_shape(&mut self, id: &str, x: f64, y: f64) -> bool {
        let patch = ShapePatch { x: Some(x), y: Some(y), ..ShapePatch::default() };
        self.update_shape(id, &patch)
    }

    /// Resize a shape toward a world-space pointer position as one undo step.
    pub fn resize_shape(&mut self, id: &str, pointer: Point) -> bool {
        self.apply("resize_shape", |doc, _| doc.resize_shape(id, pointer))
    }

    pub fn delete_shape(&mut self, id: &str) -> bool {
        self.apply("delete_shape", |doc, selection| {
            if !doc.remove_shape(id) {
                return false;
            }
            if selection.shape_id() == Some(id) {
                *selection = Selection::None;
            }
            true
        })
    }

    // --- Whole-document operations ---

    /// Replace everything with the default root node as an undoable step.
    pub fn clear_all(&mut self) -> bool {
        self.apply("clear_all", |doc, selection| {
            let fresh = Document::with_default_root();
            if *doc == fresh {
                return false;
            }
            *doc = fresh;
            *selection = first_node_selection(doc);
            true
        })
    }

    /// Start from scratch: default root node and empty history.
    pub fn reset_document(&mut self) {
        self.doc = Document::with_default_root();
        self.selection = first_node_selection(&self.doc);
        self.history.reset();
        info!("document reset; history cleared");
        self.persist();
    }

    /// Replace the document with an imported snapshot. History starts fresh.
    ///
    /// # Errors
    ///
    /// Any [`ImportError`]; the current document is left untouched.
    pub fn import_json(&mut self, raw: &str) -> Result<(), ImportError> {
        let doc = match persist::import_document(raw) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(error = %e, "import rejected");
                return Err(e);
            }
        };
        info!(
            nodes = doc.nodes.len(),
            annotations = doc.annotations.len(),
            shapes = doc.shapes.len(),
            "document imported"
        );
        self.selection = first_node_selection(&doc);
        self.doc = doc;
        self.history.reset();
        self.persist();
        Ok(())
    }

    /// Serialize the current document in the snapshot format.
    ///
    /// # Errors
    ///
    /// See [`persist::export_document`].
    pub fn export_json(&self) -> Result<String, serde_json::Error> {
        persist::export_document(&self.doc)
    }

    // --- Selection ---

    /// Select the given nodes in order. Unknown ids are skipped.
    pub fn set_selected_nodes(&mut self, ids: &[EntityId]) -> bool {
        let next = Selection::nodes(ids.iter().filter(|id| self.doc.node(id).is_some()).cloned());
        self.set_selection(next)
    }

    /// Add or remove one node from the node selection.
    pub fn toggle_node_selection(&mut self, id: &str) -> bool {
        if self.doc.node(id).is_none() {
            return false;
        }
        let next = self.selection.toggled_node(id);
        self.set_selection(next)
    }

    pub fn select_annotation(&mut self, id: &str) -> bool {
        if self.doc.annotation(id).is_none() {
            return false;
        }
        self.set_selection(Selection::Annotation(id.to_string()))
    }

    pub fn select_shape(&mut self, id: &str) -> bool {
        if self.doc.shape(id).is_none() {
            return false;
        }
        self.set_selection(Selection::Shape(id.to_string()))
    }

    pub fn clear_selection(&mut self) -> bool {
        self.set_selection(Selection::None)
    }

    // --- Undo / redo ---

    pub fn undo(&mut self) -> bool {
        if !self.history.undo(&mut self.doc) {
            return false;
        }
        self.selection = self.selection.resolve(&self.doc);
        debug!(undo_depth = self.history.undo_depth(), redo_depth = self.history.redo_depth(), "undo");
        self.persist();
        true
    }

    pub fn redo(&mut self) -> bool {
        if !self.history.redo(&mut self.doc) {
            return false;
        }
        self.selection = self.selection.resolve(&self.doc);
        debug!(undo_depth = self.history.undo_depth(), redo_depth = self.history.redo_depth(), "redo");
        self.persist();
        true
    }

    // --- Gestures ---

    /// Snapshot to hand back to [`Editor::finish_gesture`] or
    /// [`Editor::cancel_gesture`].
    #[must_use]
    pub fn begin_gesture(&self) -> Document {
        self.doc.clone()
    }

    /// Edit the live document without recording history or persisting.
    pub fn preview<F>(&mut self, f: F) -> bool
    where
        F: FnOnce(&mut Document) -> bool,
    {
        f(&mut self.doc)
    }

    /// Record a finished gesture as one undo step if it changed anything.
    pub fn finish_gesture(&mut self, before: Document, op: &'static str) -> bool {
        if before == self.doc {
            return false;
        }
        self.history.commit(before);
        debug!(op, undo_depth = self.history.undo_depth(), "gesture committed");
        self.persist();
        true
    }

    /// Throw away a gesture's preview edits.
    pub fn cancel_gesture(&mut self, before: Document) {
        if before != self.doc {
            debug!("gesture cancelled; restoring pre-gesture document");
            self.doc = before;
        }
    }
}

fn first_node_selection(doc: &Document) -> Selection {
    doc.nodes.first().map_or(Selection::None, |n| Selection::Nodes(vec![n.id.clone()]))
}
