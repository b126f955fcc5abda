//! Import/export of the document snapshot format and the persisted editor state.
//!
//! DESIGN
//! ======
//! Import is lenient item-by-item and strict about the whole: malformed nodes,
//! annotations and shapes are dropped individually, but a payload without at
//! least one valid node is rejected so the caller can leave the current
//! document untouched. Everything that survives is normalized exactly as if it
//! had been created through the editor (text sizes, clamped shape dimensions,
//! no dangling parents).
//!
//! The persisted payload is the export format plus selection ids. It is read
//! once at startup and rewritten after every state change through a
//! [`Storage`] backend.

#[cfg(test)]
#[path = "persist_test.rs"]
mod persist_test;

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::doc::{Annotation, Document, EntityId, Node, Shape};
use crate::selection::Selection;

// =============================================================================
// ERRORS
// =============================================================================

/// Why an import was refused. The messages are shown to the user.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("the file is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("the document has no \"nodes\" list")]
    MissingNodes,
    #[error("\"nodes\" must be a list")]
    NodesNotList,
    #[error("the document contains no valid nodes")]
    NoValidNodes,
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage io failed: {0}")]
    Io(#[from] io::Error),
    #[error("failed to encode editor state: {0}")]
    Encode(#[from] serde_json::Error),
}

// =============================================================================
// EXPORT / IMPORT
// =============================================================================

/// Serialize a document in the snapshot format.
///
/// # Errors
///
/// Returns the underlying `serde_json` error; in practice only non-string map
/// keys can trigger it, which the document types never produce.
pub fn export_document(doc: &Document) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(doc)
}

/// Parse and normalize a snapshot.
///
/// # Errors
///
/// [`ImportError::InvalidJson`] for unparsable text, otherwise see
/// [`document_from_value`].
pub fn import_document(raw: &str) -> Result<Document, ImportError> {
    let value: Value = serde_json::from_str(raw)?;
    document_from_value(&value)
}

/// Normalize an already-parsed snapshot.
///
/// # Errors
///
/// [`ImportError::MissingNodes`] when there is no `nodes` key,
/// [`ImportError::NodesNotList`] when it is not an array and
/// [`ImportError::NoValidNodes`] when filtering leaves nothing.
pub fn document_from_value(value: &Value) -> Result<Document, ImportError> {
    let raw_nodes = value.get("nodes").ok_or(ImportError::MissingNodes)?;
    let raw_nodes = raw_nodes.as_array().ok_or(ImportError::NodesNotList)?;

    let mut seen: HashSet<EntityId> = HashSet::new();
    let mut nodes: Vec<Node> = collect_valid(raw_nodes, "node", &mut seen, |n: &Node| n.id.as_str());
    if nodes.is_empty() {
        return Err(ImportError::NoValidNodes);
    }
    repair_forest(&mut nodes);

    let annotations: Vec<Annotation> = match value.get("annotations") {
        Some(Value::Array(items)) => collect_valid(items, "annotation", &mut seen, |a: &Annotation| a.id.as_str()),
        Some(other) if !other.is_null() => {
            warn!(found = %json_type(other), "annotations is not a list; ignoring");
            Vec::new()
        }
        _ => Vec::new(),
    };

    let mut shapes: Vec<Shape> = match value.get("shapes") {
        Some(Value::Array(items)) => collect_valid(items, "shape", &mut seen, |s: &Shape| s.id.as_str()),
        Some(other) if !other.is_null() => {
            warn!(found = %json_type(other), "shapes is not a list; ignoring");
            Vec::new()
        }
        _ => Vec::new(),
    };
    for shape in &mut shapes {
        shape.kind = shape.kind.clamped();
    }

    debug!(
        nodes = nodes.len(),
        annotations = annotations.len(),
        shapes = shapes.len(),
        "document normalized"
    );
    Ok(Document { nodes, annotations, shapes })
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Deserialize each item on its own, keeping the first occurrence of every id.
fn collect_valid<T, F>(items: &[Value], kind: &'static str, seen: &mut HashSet<EntityId>, id_of: F) -> Vec<T>
where
    T: serde::de::DeserializeOwned,
    F: Fn(&T) -> &str,
{
    let mut out = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match serde_json::from_value::<T>(item.clone()) {
            Ok(entity) => {
                let id = id_of(&entity);
                if id.is_empty() || !seen.insert(id.to_string()) {
                    debug!(kind, index, id, "dropping entity with empty or duplicate id");
                    continue;
                }
                out.push(entity);
            }
            Err(e) => debug!(kind, index, error = %e, "dropping malformed entity"),
        }
    }
    out
}

/// Detach nodes whose parent is missing or that close a parent cycle.
fn repair_forest(nodes: &mut [Node]) {
    let mut parents: HashMap<EntityId, Option<EntityId>> =
        nodes.iter().map(|n| (n.id.clone(), n.parent_id.clone())).collect();

    for i in 0..nodes.len() {
        let id = nodes[i].id.clone();
        let dangling = nodes[i].parent_id.as_ref().is_some_and(|p| !parents.contains_key(p));
        let mut cyclic = false;
        if !dangling {
            let mut cursor = parents.get(&id).cloned().flatten();
            let mut steps = 0;
            while let Some(current) = cursor {
                if current == id {
                    cyclic = true;
                    break;
                }
                steps += 1;
                if steps > nodes.len() {
                    break;
                }
                cursor = parents.get(&current).cloned().flatten();
            }
        }
        if dangling || cyclic {
            debug!(%id, dangling, cyclic, "re-rooting node");
            nodes[i].parent_id = None;
            parents.insert(id, None);
        }
    }
}

// =============================================================================
// PERSISTED STATE
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PersistedStateRef<'a> {
    #[serde(flatten)]
    document: &'a Document,
    selected_node_ids: &'a [EntityId],
    selected_annotation_id: Option<&'a str>,
    selected_shape_id: Option<&'a str>,
}

/// Serialize the document together with the selection.
///
/// # Errors
///
/// See [`export_document`].
pub fn encode_state(doc: &Document, selection: &Selection) -> Result<String, serde_json::Error> {
    serde_json::to_string(&PersistedStateRef {
        document: doc,
        selected_node_ids: selection.node_ids(),
        selected_annotation_id: selection.annotation_id(),
        selected_shape_id: selection.shape_id(),
    })
}

/// Restore a persisted payload. Stale selection ids are replaced by the first
/// entity of the same kind.
///
/// # Errors
///
/// Same conditions as [`import_document`].
pub fn decode_state(raw: &str) -> Result<(Document, Selection), ImportError> {
    let value: Value = serde_json::from_str(raw)?;
    let doc = document_from_value(&value)?;

    let string_field = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);
    let node_ids: Vec<EntityId> = value
        .get("selectedNodeIds")
        .and_then(Value::as_array)
        .map(|ids| ids.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default();

    let stored = if let Some(id) = string_field("selectedShapeId") {
        Selection::Shape(id)
    } else if let Some(id) = string_field("selectedAnnotationId") {
        Selection::Annotation(id)
    } else {
        Selection::nodes(node_ids)
    };
    let selection = stored.resolve(&doc);
    if selection != stored {
        debug!(?stored, ?selection, "persisted selection was stale");
    }
    Ok((doc, selection))
}

// =============================================================================
// STORAGE BACKENDS
// =============================================================================

/// Key-value slot holding one persisted payload.
pub trait Storage {
    /// Read the stored payload, if any.
    ///
    /// # Errors
    ///
    /// Backend failures other than "nothing stored yet".
    fn load(&self) -> Result<Option<String>, StorageError>;

    /// Replace the stored payload.
    ///
    /// # Errors
    ///
    /// Backend write failures.
    fn save(&mut self, payload: &str) -> Result<(), StorageError>;
}

/// Stores the payload in a single file, replaced atomically on every save.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl Storage for FileStorage {
    fn load(&self) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&mut self, payload: &str) -> Result<(), StorageError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let tmp = self.temp_path();
        fs::write(&tmp, payload)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// In-memory slot. Clones share the same slot, so a caller can keep a handle
/// after giving the storage to an editor.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slot: Rc<RefCell<Option<String>>>,
    writes: Rc<Cell<usize>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-filled with a payload.
    #[must_use]
    pub fn with_payload(payload: impl Into<String>) -> Self {
        let storage = Self::default();
        *storage.slot.borrow_mut() = Some(payload.into());
        storage
    }

    #[must_use]
    pub fn contents(&self) -> Option<String> {
        self.slot.borrow().clone()
    }

    /// Number of successful saves.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }
}

impl Storage for MemoryStorage {
    fn load(&self) -> Result<Option<String>, StorageError> {
        Ok(self.contents())
    }

    fn save(&mut self, payload: &str) -> Result<(), StorageError> {
        *self.slot.borrow_mut() = Some(payload.to_string());
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}
