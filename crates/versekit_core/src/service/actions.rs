//! Editor actions and their enablement rules.
//!
//! # Responsibility
//! - Name every user-facing editing action.
//! - Derive which actions are enabled from selection, clipboard and history.
//!
//! # Invariants
//! - Enablement is a pure function of its inputs; it never mutates state.

use crate::clipboard::Clipboard;
use crate::history::undo::UndoManager;
use crate::model::node::NodeKind;
use crate::selection::Selection;
use std::collections::BTreeSet;

/// User-facing editing actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Action {
    Copy,
    Cut,
    Paste,
    Delete,
    NewBook,
    NewChapter,
    NewVerse,
    EditNode,
    Renumber,
    Reorder,
    Undo,
    Redo,
    Save,
    SaveAs,
}

impl Action {
    pub const ALL: [Action; 14] = [
        Action::Copy,
        Action::Cut,
        Action::Paste,
        Action::Delete,
        Action::NewBook,
        Action::NewChapter,
        Action::NewVerse,
        Action::EditNode,
        Action::Renumber,
        Action::Reorder,
        Action::Undo,
        Action::Redo,
        Action::Save,
        Action::SaveAs,
    ];

    /// Stable snake_case name used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Copy => "copy",
            Self::Cut => "cut",
            Self::Paste => "paste",
            Self::Delete => "delete",
            Self::NewBook => "new_book",
            Self::NewChapter => "new_chapter",
            Self::NewVerse => "new_verse",
            Self::EditNode => "edit_node",
            Self::Renumber => "renumber",
            Self::Reorder => "reorder",
            Self::Undo => "undo",
            Self::Redo => "redo",
            Self::Save => "save",
            Self::SaveAs => "save_as",
        }
    }

    /// Container kind a new-child action targets.
    pub fn new_child_parent(self) -> Option<NodeKind> {
        match self {
            Self::NewBook => Some(NodeKind::Bible),
            Self::NewChapter => Some(NodeKind::Book),
            Self::NewVerse => Some(NodeKind::Chapter),
            _ => None,
        }
    }

    /// Undo batch label recorded for document-changing actions.
    pub fn batch_label(self) -> Option<&'static str> {
        match self {
            Self::Cut => Some("Cut"),
            Self::Paste => Some("Paste"),
            Self::Delete => Some("Delete"),
            Self::NewBook => Some("New book"),
            Self::NewChapter => Some("New chapter"),
            Self::NewVerse => Some("New verse"),
            Self::EditNode => Some("Edit"),
            Self::Renumber => Some("Renumber"),
            Self::Reorder => Some("Reorder"),
            _ => None,
        }
    }
}

/// Snapshot of action enablement plus history labels.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActionState {
    enabled: BTreeSet<Action>,
    pub undo_label: Option<String>,
    pub redo_label: Option<String>,
    pub dirty: bool,
}

impl ActionState {
    pub fn is_enabled(&self, action: Action) -> bool {
        self.enabled.contains(&action)
    }

    /// Enabled actions in declaration order.
    pub fn enabled(&self) -> impl Iterator<Item = Action> + '_ {
        self.enabled.iter().copied()
    }
}

/// Computes action enablement for the current editor state.
pub fn evaluate(
    history: &UndoManager,
    selection: &Selection,
    clipboard: &dyn Clipboard,
    has_store: bool,
) -> ActionState {
    let bible = history.target();
    let single_kind = selection.single().and_then(|id| bible.kind_of(id));
    let copyable = matches!(selection.selected_type(), Some(kind) if kind != NodeKind::Bible);

    let paste_format = single_kind
        .and_then(NodeKind::child_kind)
        .and_then(NodeKind::clipboard_format);

    let mut enabled = BTreeSet::new();
    for action in Action::ALL {
        let on = match action {
            Action::Copy | Action::Cut => copyable,
            Action::Paste => paste_format.is_some_and(|format| clipboard.has_format(format)),
            Action::Delete => !selection.is_empty() && !selection.includes_kind(NodeKind::Bible),
            Action::NewBook | Action::NewChapter | Action::NewVerse => {
                single_kind.is_some() && single_kind == action.new_child_parent()
            }
            Action::EditNode => single_kind.is_some(),
            Action::Renumber | Action::Reorder => {
                matches!(single_kind, Some(kind) if kind != NodeKind::Verse)
            }
            Action::Undo => history.can_undo(),
            Action::Redo => history.can_redo(),
            Action::Save | Action::SaveAs => has_store,
        };
        if on {
            enabled.insert(action);
        }
    }

    ActionState {
        enabled,
        undo_label: history.undo_label().map(str::to_string),
        redo_label: history.redo_label().map(str::to_string),
        dirty: history.is_dirty(),
    }
}

#[cfg(test)]
mod tests {
    use super::{evaluate, Action};
    use crate::clipboard::MemoryClipboard;
    use crate::history::undo::UndoManager;
    use crate::model::bible::{Bible, BibleMetadata};
    use crate::model::node::NodeTree;
    use crate::selection::Selection;

    #[test]
    fn root_selection_enables_only_container_actions() {
        let bible = Bible::from_books(BibleMetadata::new("Acts"), [NodeTree::book(1, "Acts")])
            .unwrap();
        let root = bible.root();
        let history = UndoManager::new(bible);
        let mut selection = Selection::new();
        selection.set(history.target(), [root]);

        let state = evaluate(&history, &selection, &MemoryClipboard::new(), false);
        assert!(state.is_enabled(Action::NewBook));
        assert!(state.is_enabled(Action::Renumber));
        assert!(!state.is_enabled(Action::Copy));
        assert!(!state.is_enabled(Action::Delete));
        assert!(!state.is_enabled(Action::Paste));
        assert!(!state.is_enabled(Action::Save));
        assert!(!state.dirty);
    }
}
