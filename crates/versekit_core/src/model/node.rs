//! Node kinds, node payloads and detached node trees.
//!
//! # Responsibility
//! - Define the closed set of node kinds (`Bible`, `Book`, `Chapter`, `Verse`).
//! - Keep per-kind rules (child kind, clipboard format, natural order) in one
//!   lookup table instead of scattered type tests.
//! - Provide `NodeTree`, the identity-free deep copy used by construction and
//!   the clipboard.
//!
//! # Invariants
//! - Each kind declares at most one child kind.
//! - `NodeData` variant always equals the node's `NodeKind`.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;

/// Stable identifier for every node in a Bible document.
///
/// Independent from `Number` and position; used for undo addressing.
pub type NodeId = Uuid;

/// Closed set of node kinds in the Bible hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Document root.
    Bible,
    /// Child of the Bible root.
    Book,
    /// Child of a Book.
    Chapter,
    /// Leaf node holding verse text.
    Verse,
}

type NaturalOrder = fn(&NodeData, &NodeData) -> Ordering;

struct KindRule {
    label: &'static str,
    parent: Option<NodeKind>,
    child: Option<NodeKind>,
    clipboard_format: Option<&'static str>,
    natural_order: Option<NaturalOrder>,
}

/// Clipboard format key for a list of books.
pub const BOOK_LIST_FORMAT: &str = "application/x-versekit-json-list;kind=book";
/// Clipboard format key for a list of chapters.
pub const CHAPTER_LIST_FORMAT: &str = "application/x-versekit-json-list;kind=chapter";
/// Clipboard format key for a list of verses.
pub const VERSE_LIST_FORMAT: &str = "application/x-versekit-json-list;kind=verse";

// Indexed by `NodeKind as usize`.
const KIND_RULES: [KindRule; 4] = [
    KindRule {
        label: "bible",
        parent: None,
        child: Some(NodeKind::Book),
        clipboard_format: None,
        natural_order: None,
    },
    KindRule {
        label: "book",
        parent: Some(NodeKind::Bible),
        child: Some(NodeKind::Chapter),
        clipboard_format: Some(BOOK_LIST_FORMAT),
        natural_order: Some(compare_books),
    },
    KindRule {
        label: "chapter",
        parent: Some(NodeKind::Book),
        child: Some(NodeKind::Verse),
        clipboard_format: Some(CHAPTER_LIST_FORMAT),
        natural_order: Some(compare_numbers),
    },
    KindRule {
        label: "verse",
        parent: Some(NodeKind::Chapter),
        child: None,
        clipboard_format: Some(VERSE_LIST_FORMAT),
        natural_order: Some(compare_numbers),
    },
];

impl NodeKind {
    /// All kinds, root first.
    pub const ALL: [NodeKind; 4] = [
        NodeKind::Bible,
        NodeKind::Book,
        NodeKind::Chapter,
        NodeKind::Verse,
    ];

    fn rule(self) -> &'static KindRule {
        &KIND_RULES[self as usize]
    }

    /// Stable lowercase label.
    pub fn as_str(self) -> &'static str {
        self.rule().label
    }

    /// Kind of the container that holds nodes of this kind.
    pub fn parent_kind(self) -> Option<NodeKind> {
        self.rule().parent
    }

    /// Kind of the children this kind may contain. `None` for leaves.
    pub fn child_kind(self) -> Option<NodeKind> {
        self.rule().child
    }

    /// Clipboard format key for a homogeneous list of this kind.
    ///
    /// The root kind cannot be copied and has no format.
    pub fn clipboard_format(self) -> Option<&'static str> {
        self.rule().clipboard_format
    }

    /// Reverse lookup of `clipboard_format`.
    pub fn from_clipboard_format(format: &str) -> Option<NodeKind> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.clipboard_format() == Some(format))
    }

    /// Compares two payloads of this kind by natural key.
    ///
    /// Returns `Ordering::Equal` for kinds without a natural order so that a
    /// stable sort leaves them untouched.
    pub fn compare(self, left: &NodeData, right: &NodeData) -> Ordering {
        match self.rule().natural_order {
            Some(order) => order(left, right),
            None => Ordering::Equal,
        }
    }

    /// Default payload for a freshly created child of this kind.
    pub fn new_child_data(self, number: i32) -> Option<NodeData> {
        match self.child_kind()? {
            NodeKind::Book => Some(NodeData::Book {
                number,
                name: format!("Book {number}"),
            }),
            NodeKind::Chapter => Some(NodeData::Chapter { number }),
            NodeKind::Verse => Some(NodeData::Verse {
                number,
                text: String::new(),
            }),
            NodeKind::Bible => None,
        }
    }
}

fn compare_books(left: &NodeData, right: &NodeData) -> Ordering {
    left.number()
        .cmp(&right.number())
        .then_with(|| left.name().cmp(&right.name()))
}

fn compare_numbers(left: &NodeData, right: &NodeData) -> Ordering {
    left.number().cmp(&right.number())
}

/// Kind-specific node payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeData {
    /// Root payload. Document metadata lives on `Bible` itself.
    Bible,
    Book {
        number: i32,
        name: String,
    },
    Chapter {
        number: i32,
    },
    Verse {
        number: i32,
        text: String,
    },
}

impl NodeData {
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Bible => NodeKind::Bible,
            Self::Book { .. } => NodeKind::Book,
            Self::Chapter { .. } => NodeKind::Chapter,
            Self::Verse { .. } => NodeKind::Verse,
        }
    }

    /// Advisory display number. `None` for the root.
    pub fn number(&self) -> Option<i32> {
        match self {
            Self::Bible => None,
            Self::Book { number, .. } | Self::Chapter { number } | Self::Verse { number, .. } => {
                Some(*number)
            }
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Book { name, .. } => Some(name.as_str()),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Verse { text, .. } => Some(text.as_str()),
            _ => None,
        }
    }

    /// Returns a copy with `number` replaced. The root is returned unchanged.
    pub fn with_number(&self, number: i32) -> NodeData {
        let mut next = self.clone();
        match &mut next {
            Self::Bible => {}
            Self::Book { number: value, .. }
            | Self::Chapter { number: value }
            | Self::Verse { number: value, .. } => *value = number,
        }
        next
    }

    /// One-line summary used for the plain-text clipboard entry.
    ///
    /// Book → name, Chapter → number, Verse → text.
    pub fn summary(&self) -> String {
        match self {
            Self::Bible => String::new(),
            Self::Book { name, .. } => name.clone(),
            Self::Chapter { number } => number.to_string(),
            Self::Verse { text, .. } => text.clone(),
        }
    }
}

/// One node record stored in a Bible arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) data: NodeData,
}

impl Node {
    pub(crate) fn new(id: NodeId, data: NodeData) -> Self {
        Self {
            id,
            parent: None,
            children: Vec::new(),
            data,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Container holding this node. `None` for the root and detached nodes.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Ordered child ids.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn data(&self) -> &NodeData {
        &self.data
    }

    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }
}

/// Identity-free deep copy of one node and its descendants.
///
/// Used to build documents and as the clipboard wire shape: turning a tree
/// into arena nodes always allocates fresh ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeTree {
    pub data: NodeData,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeTree>,
}

impl NodeTree {
    pub fn new(data: NodeData) -> Self {
        Self {
            data,
            children: Vec::new(),
        }
    }

    pub fn book(number: i32, name: impl Into<String>) -> Self {
        Self::new(NodeData::Book {
            number,
            name: name.into(),
        })
    }

    pub fn chapter(number: i32) -> Self {
        Self::new(NodeData::Chapter { number })
    }

    pub fn verse(number: i32, text: impl Into<String>) -> Self {
        Self::new(NodeData::Verse {
            number,
            text: text.into(),
        })
    }

    /// Appends children and returns `self` for builder-style construction.
    pub fn with_children(mut self, children: impl IntoIterator<Item = NodeTree>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }

    /// Checks that this tree is rooted at `expected` and that every level
    /// below follows the kind hierarchy.
    ///
    /// Returns the first offending `(expected, actual)` pair on failure.
    pub fn check_kinds(&self, expected: NodeKind) -> Result<(), (NodeKind, NodeKind)> {
        let actual = self.kind();
        if actual != expected {
            return Err((expected, actual));
        }
        match actual.child_kind() {
            Some(child_kind) => self
                .children
                .iter()
                .try_for_each(|child| child.check_kinds(child_kind)),
            None => match self.children.first() {
                Some(child) => Err((actual, child.kind())),
                None => Ok(()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{NodeData, NodeKind, NodeTree, CHAPTER_LIST_FORMAT};
    use std::cmp::Ordering;

    #[test]
    fn kind_table_is_consistent() {
        for kind in NodeKind::ALL {
            if let Some(child) = kind.child_kind() {
                assert_eq!(child.parent_kind(), Some(kind));
            }
        }
        assert_eq!(NodeKind::Bible.clipboard_format(), None);
        assert_eq!(
            NodeKind::from_clipboard_format(CHAPTER_LIST_FORMAT),
            Some(NodeKind::Chapter)
        );
        assert_eq!(NodeKind::from_clipboard_format("text/plain"), None);
    }

    #[test]
    fn books_order_by_number_then_name() {
        let a = NodeData::Book {
            number: 2,
            name: "Exodus".to_string(),
        };
        let b = NodeData::Book {
            number: 2,
            name: "Alpha".to_string(),
        };
        let c = NodeData::Book {
            number: 1,
            name: "Genesis".to_string(),
        };
        assert_eq!(NodeKind::Book.compare(&c, &a), Ordering::Less);
        assert_eq!(NodeKind::Book.compare(&a, &b), Ordering::Greater);
    }

    #[test]
    fn check_kinds_rejects_misplaced_levels() {
        let valid = NodeTree::chapter(1).with_children([NodeTree::verse(1, "a")]);
        assert!(valid.check_kinds(NodeKind::Chapter).is_ok());

        let nested_wrong = NodeTree::book(1, "Genesis").with_children([NodeTree::verse(1, "x")]);
        assert_eq!(
            nested_wrong.check_kinds(NodeKind::Book),
            Err((NodeKind::Chapter, NodeKind::Verse))
        );
    }

    #[test]
    fn with_number_keeps_other_fields() {
        let verse = NodeData::Verse {
            number: 7,
            text: "Jesus wept.".to_string(),
        };
        let renumbered = verse.with_number(1);
        assert_eq!(renumbered.number(), Some(1));
        assert_eq!(renumbered.text(), Some("Jesus wept."));
    }
}
