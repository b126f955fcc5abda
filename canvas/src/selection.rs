//! Selection model: one active domain at a time.
//!
//! Nodes support ordered multi-select (first id is the primary). Annotations
//! and shapes are single-select. Choosing any domain replaces the others, so
//! mixed selections cannot be represented.

#[cfg(test)]
#[path = "selection_test.rs"]
mod selection_test;

use crate::doc::{Document, EntityId};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    None,
    /// Ordered, duplicate-free, never empty.
    Nodes(Vec<EntityId>),
    Annotation(EntityId),
    Shape(EntityId),
}

impl Selection {
    /// Node selection from a list, dropping duplicates. An empty list yields `None`.
    #[must_use]
    pub fn nodes<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<EntityId>,
    {
        let mut out: Vec<EntityId> = Vec::new();
        for id in ids {
            let id = id.into();
            if !out.contains(&id) {
                out.push(id);
            }
        }
        if out.is_empty() { Self::None } else { Self::Nodes(out) }
    }

    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Selected node ids in order; empty when another domain is active.
    #[must_use]
    pub fn node_ids(&self) -> &[EntityId] {
        match self {
            Self::Nodes(ids) => ids,
            _ => &[],
        }
    }

    #[must_use]
    pub fn primary_node(&self) -> Option<&str> {
        self.node_ids().first().map(String::as_str)
    }

    #[must_use]
    pub fn annotation_id(&self) -> Option<&str> {
        match self {
            Self::Annotation(id) => Some(id),
            _ => None,
        }
    }

    #[must_use]
    pub fn shape_id(&self) -> Option<&str> {
        match self {
            Self::Shape(id) => Some(id),
            _ => None,
        }
    }

    #[must_use]
    pub fn contains_node(&self, id: &str) -> bool {
        self.node_ids().iter().any(|n| n == id)
    }

    /// Add `id` to a node selection, or remove it if already present. Any
    /// annotation/shape selection is replaced.
    #[must_use]
    pub fn toggled_node(&self, id: &str) -> Self {
        let mut ids: Vec<EntityId> = self.node_ids().to_vec();
        if let Some(pos) = ids.iter().position(|n| n == id) {
            ids.remove(pos);
        } else {
            ids.push(id.to_string());
        }
        Self::nodes(ids)
    }

    /// Re-check this selection against `doc`.
    ///
    /// Ids that no longer exist are dropped. Only when nothing of the active
    /// domain survives does the selection fall back to the first entity of the
    /// same kind (or `None` if the document has none).
    #[must_use]
    pub fn resolve(&self, doc: &Document) -> Self {
        match self {
            Self::None => Self::None,
            Self::Nodes(ids) => {
                let kept: Vec<EntityId> = ids.iter().filter(|id| doc.node(id).is_some()).cloned().collect();
                if kept.is_empty() {
                    doc.nodes.first().map_or(Self::None, |n| Self::Nodes(vec![n.id.clone()]))
                } else {
                    Self::Nodes(kept)
                }
            }
            Self::Annotation(id) => {
                if doc.annotation(id).is_some() {
                    self.clone()
                } else {
                    doc.annotations.first().map_or(Self::None, |a| Self::Annotation(a.id.clone()))
                }
            }
            Self::Shape(id) => {
                if doc.shape(id).is_some() {
                    self.clone()
                } else {
                    doc.shapes.first().map_or(Self::None, |s| Self::Shape(s.id.clone()))
                }
            }
        }
    }
}
