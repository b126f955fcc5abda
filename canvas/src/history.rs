//! Snapshot undo/redo stacks.
//!
//! Each entry is a full copy of the state taken before a mutation. Compound
//! edits need no per-action inverse: restoring a snapshot undoes everything
//! the edit touched.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

/// Two stacks of snapshots. The most recent entry is at the end of each `Vec`.
#[derive(Debug, Clone)]
pub struct History<T> {
    past: Vec<T>,
    future: Vec<T>,
    limit: Option<usize>,
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self::new(None)
    }
}

impl<T> History<T> {
    /// Create empty history. `limit` caps the undo depth; `None` is unbounded.
    #[must_use]
    pub fn new(limit: Option<usize>) -> Self {
        Self { past: Vec::new(), future: Vec::new(), limit: limit.filter(|l| *l > 0) }
    }

    /// Record `previous` as the state before a mutation. Clears redo.
    pub fn commit(&mut self, previous: T) {
        self.past.push(previous);
        self.future.clear();
        if let Some(limit) = self.limit {
            if self.past.len() > limit {
                let excess = self.past.len() - limit;
                self.past.drain(..excess);
            }
        }
    }

    /// Swap `current` with the latest past snapshot. Returns `false` when
    /// there is nothing to undo.
    pub fn undo(&mut self, current: &mut T) -> bool {
        let Some(previous) = self.past.pop() else {
            return false;
        };
        self.future.push(std::mem::replace(current, previous));
        true
    }

    /// Mirror of [`History::undo`].
    pub fn redo(&mut self, current: &mut T) -> bool {
        let Some(next) = self.future.pop() else {
            return false;
        };
        self.past.push(std::mem::replace(current, next));
        true
    }

    /// Forget everything.
    pub fn reset(&mut self) {
        self.past.clear();
        self.future.clear();
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.past.len()
    }

    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.future.len()
    }

    #[must_use]
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }
}
