//! Multi-selection tracking over the document tree projection.
//!
//! # Responsibility
//! - Keep the host's current selection as node ids in selection order.
//! - Answer kind queries used by action enablement.
//!
//! # Invariants
//! - No id appears twice.
//! - Every entry refers to a node of the document it was last synced with;
//!   stale entries are dropped by `prune`.

use crate::model::bible::Bible;
use crate::model::node::{NodeId, NodeKind};

/// Current multi-selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    entries: Vec<(NodeId, NodeKind)>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the selection. Unknown and repeated ids are skipped.
    ///
    /// Returns whether the selection changed.
    pub fn set(&mut self, bible: &Bible, ids: impl IntoIterator<Item = NodeId>) -> bool {
        let mut next: Vec<(NodeId, NodeKind)> = Vec::new();
        for id in ids {
            if next.iter().any(|(existing, _)| *existing == id) {
                continue;
            }
            if let Some(kind) = bible.kind_of(id) {
                next.push((id, kind));
            }
        }
        if next == self.entries {
            return false;
        }
        self.entries = next;
        true
    }

    /// Clears the selection. Returns whether anything was selected.
    pub fn clear(&mut self) -> bool {
        let changed = !self.entries.is_empty();
        self.entries.clear();
        changed
    }

    /// Drops entries whose nodes no longer exist in `bible`.
    pub fn prune(&mut self, bible: &Bible) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(id, _)| bible.contains(*id));
        before != self.entries.len()
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.entries.iter().any(|(entry, _)| *entry == id)
    }

    /// Selected ids in selection order.
    pub fn selected_ids(&self) -> Vec<NodeId> {
        self.entries.iter().map(|(id, _)| *id).collect()
    }

    /// The only selected id, when exactly one node is selected.
    pub fn single(&self) -> Option<NodeId> {
        match self.entries.as_slice() {
            [(id, _)] => Some(*id),
            _ => None,
        }
    }

    /// True iff at least one node is selected and all share one kind.
    pub fn is_single_type_selected(&self) -> bool {
        self.selected_type().is_some()
    }

    /// Shared kind of the selection. `None` when empty or mixed.
    pub fn selected_type(&self) -> Option<NodeKind> {
        let (_, first) = self.entries.first()?;
        self.entries
            .iter()
            .all(|(_, kind)| kind == first)
            .then_some(*first)
    }

    /// Whether any selected node has `kind`.
    pub fn includes_kind(&self, kind: NodeKind) -> bool {
        self.entries.iter().any(|(_, entry)| *entry == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::Selection;
    use crate::model::bible::{Bible, BibleMetadata};
    use crate::model::node::{NodeKind, NodeTree};

    #[test]
    fn mixed_selection_has_no_single_type() {
        let bible = Bible::from_books(
            BibleMetadata::new("Sel"),
            [NodeTree::book(1, "Genesis").with_children([NodeTree::chapter(1)])],
        )
        .unwrap();
        let book = bible.children(bible.root()).unwrap()[0];
        let chapter = bible.children(book).unwrap()[0];

        let mut selection = Selection::new();
        assert!(!selection.is_single_type_selected());
        assert_eq!(selection.selected_type(), None);

        assert!(selection.set(&bible, [book, book, uuid::Uuid::new_v4()]));
        assert_eq!(selection.count(), 1);
        assert_eq!(selection.selected_type(), Some(NodeKind::Book));

        selection.set(&bible, [book, chapter]);
        assert_eq!(selection.count(), 2);
        assert!(!selection.is_single_type_selected());
        assert!(selection.includes_kind(NodeKind::Chapter));
    }
}
