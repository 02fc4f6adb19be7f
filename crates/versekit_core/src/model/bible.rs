//! Bible document arena and ordered container primitives.
//!
//! # Responsibility
//! - Own every node of one document in an id-keyed arena.
//! - Provide the ordered container primitives (`children`, `insert`,
//!   `remove_all`, `index_of`, `renumber`, `reorder`).
//! - Describe every mutation as a replayable `Change` record.
//!
//! # Invariants
//! - A child's `parent` always equals the container listing it.
//! - Child kinds always match the container kind's declared child kind.
//! - No id appears twice in the arena.
//! - Mutators are crate-private; outside callers mutate through
//!   `history::UndoManager` so every change lands in a batch.

use crate::model::node::{Node, NodeData, NodeId, NodeKind, NodeTree};
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Errors from ordered container primitives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// Node id is not part of the document.
    NodeNotFound(NodeId),
    /// Node exists but is a leaf and cannot hold children.
    NotAContainer(NodeId),
    /// Node kind does not fit the target container.
    KindMismatch {
        parent: NodeId,
        expected: NodeKind,
        actual: NodeKind,
    },
    /// Node id already exists in the document.
    DuplicateNode(NodeId),
    /// Payload edit tried to change the node kind.
    DataKindChange {
        node: NodeId,
        expected: NodeKind,
        actual: NodeKind,
    },
    /// The document root cannot be detached.
    RootImmutable(NodeId),
    /// Replayed change does not match current document state.
    Inconsistent(String),
}

impl Display for TreeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NodeNotFound(id) => write!(f, "node not found: {id}"),
            Self::NotAContainer(id) => write!(f, "node cannot hold children: {id}"),
            Self::KindMismatch {
                parent,
                expected,
                actual,
            } => write!(
                f,
                "container {parent} expects `{}` children, got `{}`",
                expected.as_str(),
                actual.as_str()
            ),
            Self::DuplicateNode(id) => write!(f, "node already exists: {id}"),
            Self::DataKindChange {
                node,
                expected,
                actual,
            } => write!(
                f,
                "node {node} is `{}`; refusing `{}` payload",
                expected.as_str(),
                actual.as_str()
            ),
            Self::RootImmutable(id) => write!(f, "document root cannot be detached: {id}"),
            Self::Inconsistent(message) => write!(f, "inconsistent document state: {message}"),
        }
    }
}

impl Error for TreeError {}

/// Result type used by ordered container primitives.
pub type TreeResult<T> = Result<T, TreeError>;

/// Document-level metadata. Not covered by undo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BibleMetadata {
    /// Persistence identity, distinct from the root node id.
    pub document_id: Uuid,
    pub name: String,
    pub language: String,
    pub source: String,
    pub copyright: String,
    pub notes: String,
}

impl BibleMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            document_id: Uuid::new_v4(),
            name: name.into(),
            language: String::new(),
            source: String::new(),
            copyright: String::new(),
            notes: String::new(),
        }
    }
}

/// Detached subtree, stored in pre-order with the subtree root first.
///
/// Keeps original ids so undo/redo can re-attach exactly the same nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    nodes: Vec<Node>,
}

impl Fragment {
    /// Materializes a node tree with freshly allocated ids.
    pub fn from_tree(tree: &NodeTree) -> Self {
        let mut nodes = Vec::new();
        push_tree(tree, None, &mut nodes);
        Self { nodes }
    }

    pub fn root(&self) -> NodeId {
        self.nodes[0].id
    }

    pub fn kind(&self) -> NodeKind {
        self.nodes[0].kind()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }
}

fn push_tree(tree: &NodeTree, parent: Option<NodeId>, out: &mut Vec<Node>) -> NodeId {
    let id = Uuid::new_v4();
    let slot = out.len();
    let mut node = Node::new(id, tree.data.clone());
    node.parent = parent;
    out.push(node);
    let children = tree
        .children
        .iter()
        .map(|child| push_tree(child, Some(id), out))
        .collect();
    out[slot].children = children;
    id
}

/// One replayable mutation record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// Child list of `container` went from `before` to `after`.
    ///
    /// `detached` subtrees left the document, `attached` subtrees entered it.
    Children {
        container: NodeId,
        before: Vec<NodeId>,
        after: Vec<NodeId>,
        detached: Vec<Fragment>,
        attached: Vec<Fragment>,
    },
    /// Payload of `node` went from `before` to `after`.
    Data {
        node: NodeId,
        before: NodeData,
        after: NodeData,
    },
}

impl Change {
    /// Roots of the subtrees this change attached, in insertion order.
    pub fn attached_roots(&self) -> Vec<NodeId> {
        match self {
            Self::Children { attached, .. } => attached.iter().map(Fragment::root).collect(),
            Self::Data { .. } => Vec::new(),
        }
    }

    /// Subtrees this change detached, in container order.
    pub fn detached(&self) -> &[Fragment] {
        match self {
            Self::Children { detached, .. } => detached,
            Self::Data { .. } => &[],
        }
    }
}

/// Replay direction for `Bible::apply`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// One Bible document: metadata plus the Book → Chapter → Verse arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bible {
    pub meta: BibleMetadata,
    root: NodeId,
    nodes: HashMap<NodeId, Node>,
}

impl Bible {
    /// Creates an empty document with a fresh root node.
    pub fn new(meta: BibleMetadata) -> Self {
        Self::with_root(meta, Uuid::new_v4())
    }

    /// Creates an empty document with a caller-provided root id.
    ///
    /// Used by persistence where the root identity already exists.
    pub fn with_root(meta: BibleMetadata, root: NodeId) -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(root, Node::new(root, NodeData::Bible));
        Self { meta, root, nodes }
    }

    /// Builds a document from book trees. Construction is not undoable.
    pub fn from_books(
        meta: BibleMetadata,
        books: impl IntoIterator<Item = NodeTree>,
    ) -> TreeResult<Self> {
        let mut bible = Self::new(meta);
        let root = bible.root;
        let fragments: Vec<Fragment> = books
            .into_iter()
            .map(|tree| Fragment::from_tree(&tree))
            .collect();
        bible.insert(root, usize::MAX, fragments)?;
        Ok(bible)
    }

    /// Rebuilds a document from persisted node records.
    ///
    /// `records` are `(id, parent, data)` triples already sorted by sibling
    /// order. Every record must be reachable from `root`.
    pub fn restore(
        meta: BibleMetadata,
        root: NodeId,
        records: Vec<(NodeId, NodeId, NodeData)>,
    ) -> TreeResult<Self> {
        let mut bible = Self::with_root(meta, root);
        let expected = records.len();
        for (id, _, data) in &records {
            if *id == root || bible.nodes.contains_key(id) {
                return Err(TreeError::DuplicateNode(*id));
            }
            bible.nodes.insert(*id, Node::new(*id, data.clone()));
        }
        for (id, parent, data) in records {
            let parent_kind = bible.kind_of(parent).ok_or(TreeError::NodeNotFound(parent))?;
            let child_kind = parent_kind
                .child_kind()
                .ok_or(TreeError::NotAContainer(parent))?;
            if child_kind != data.kind() {
                return Err(TreeError::KindMismatch {
                    parent,
                    expected: child_kind,
                    actual: data.kind(),
                });
            }
            if let Some(node) = bible.nodes.get_mut(&id) {
                node.parent = Some(parent);
            }
            if let Some(container) = bible.nodes.get_mut(&parent) {
                container.children.push(id);
            }
        }
        let reachable = bible.subtree_len(root).unwrap_or(0);
        if reachable != expected + 1 {
            return Err(TreeError::Inconsistent(format!(
                "{} node(s) unreachable from root {root}",
                expected + 1 - reachable.min(expected + 1)
            )));
        }
        Ok(bible)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn kind_of(&self, id: NodeId) -> Option<NodeKind> {
        self.nodes.get(&id).map(Node::kind)
    }

    pub fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(&id).map(Node::data)
    }

    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(Node::parent)
    }

    /// Total number of nodes including the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a document holds at least its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Ordered child ids of `parent`.
    pub fn children(&self, parent: NodeId) -> TreeResult<&[NodeId]> {
        self.nodes
            .get(&parent)
            .map(Node::children)
            .ok_or(TreeError::NodeNotFound(parent))
    }

    /// Position of `child` within `parent`, if it is a direct child.
    pub fn index_of(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        self.nodes
            .get(&parent)?
            .children
            .iter()
            .position(|id| *id == child)
    }

    /// Number of nodes in the subtree rooted at `id`, including `id`.
    pub fn subtree_len(&self, id: NodeId) -> Option<usize> {
        self.nodes.get(&id)?;
        let mut count = 0;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            count += 1;
            if let Some(node) = self.nodes.get(&current) {
                stack.extend(node.children.iter().copied());
            }
        }
        Some(count)
    }

    /// Identity-free deep copy of one subtree.
    pub fn to_tree(&self, id: NodeId) -> Option<NodeTree> {
        let node = self.nodes.get(&id)?;
        let children = node
            .children
            .iter()
            .filter_map(|child| self.to_tree(*child))
            .collect();
        Some(NodeTree {
            data: node.data.clone(),
            children,
        })
    }

    /// Deep copies of all books, in document order.
    pub fn book_trees(&self) -> Vec<NodeTree> {
        self.children(self.root)
            .map(|books| books.iter().filter_map(|id| self.to_tree(*id)).collect())
            .unwrap_or_default()
    }

    /// Visits every node below the root in pre-order as `(parent, node)`.
    pub fn walk(&self) -> Vec<(NodeId, &Node)> {
        let mut out = Vec::with_capacity(self.nodes.len().saturating_sub(1));
        let mut stack: Vec<NodeId> = self
            .nodes
            .get(&self.root)
            .map(|root| root.children.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.get(&id) {
                out.push((node.parent.unwrap_or(self.root), node));
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    /// Inserts `fragments` at `index` (clamped) under `parent`.
    pub(crate) fn insert(
        &mut self,
        parent: NodeId,
        index: usize,
        fragments: Vec<Fragment>,
    ) -> TreeResult<Change> {
        let child_kind = self.container_child_kind(parent)?;
        let mut incoming = HashSet::new();
        for fragment in &fragments {
            if fragment.kind() != child_kind {
                return Err(TreeError::KindMismatch {
                    parent,
                    expected: child_kind,
                    actual: fragment.kind(),
                });
            }
            for node in fragment.nodes() {
                if self.nodes.contains_key(&node.id) || !incoming.insert(node.id) {
                    return Err(TreeError::DuplicateNode(node.id));
                }
            }
        }

        let before = self.children(parent)?.to_vec();
        let mut after = before.clone();
        let at = index.min(after.len());
        after.splice(at..at, fragments.iter().map(Fragment::root));

        let change = Change::Children {
            container: parent,
            before,
            after,
            detached: Vec::new(),
            attached: fragments,
        };
        self.apply(&change, Direction::Forward)?;
        Ok(change)
    }

    /// Detaches the listed direct children of `parent`.
    ///
    /// Ids that are not direct children are ignored. Returns `None` when
    /// nothing was removed.
    pub(crate) fn remove_all(
        &mut self,
        parent: NodeId,
        children: &[NodeId],
    ) -> TreeResult<Option<Change>> {
        let before = self.children(parent)?.to_vec();
        let wanted: HashSet<NodeId> = children.iter().copied().collect();
        if wanted.contains(&self.root) {
            return Err(TreeError::RootImmutable(self.root));
        }
        let (removed, after): (Vec<NodeId>, Vec<NodeId>) =
            before.iter().copied().partition(|id| wanted.contains(id));
        if removed.is_empty() {
            return Ok(None);
        }

        let detached = removed
            .iter()
            .map(|id| self.snapshot_fragment(*id))
            .collect::<TreeResult<Vec<_>>>()?;
        let change = Change::Children {
            container: parent,
            before,
            after,
            detached,
            attached: Vec::new(),
        };
        self.apply(&change, Direction::Forward)?;
        Ok(Some(change))
    }

    /// Replaces the payload of `id`. The kind must stay the same.
    pub(crate) fn set_data(&mut self, id: NodeId, data: NodeData) -> TreeResult<Option<Change>> {
        let current = self.data(id).ok_or(TreeError::NodeNotFound(id))?;
        if current.kind() != data.kind() {
            return Err(TreeError::DataKindChange {
                node: id,
                expected: current.kind(),
                actual: data.kind(),
            });
        }
        if *current == data {
            return Ok(None);
        }
        let change = Change::Data {
            node: id,
            before: current.clone(),
            after: data,
        };
        self.apply(&change, Direction::Forward)?;
        Ok(Some(change))
    }

    /// Rewrites child Numbers to `1..=N` in current order.
    pub(crate) fn renumber(&mut self, container: NodeId) -> TreeResult<Vec<Change>> {
        self.container_child_kind(container)?;
        let children = self.children(container)?.to_vec();
        let mut changes = Vec::new();
        for (index, child) in children.into_iter().enumerate() {
            let data = self.data(child).ok_or(TreeError::NodeNotFound(child))?;
            let next = data.with_number(index as i32 + 1);
            if let Some(change) = self.set_data(child, next)? {
                changes.push(change);
            }
        }
        Ok(changes)
    }

    /// Stable-sorts children by the child kind's natural key.
    pub(crate) fn reorder(&mut self, container: NodeId) -> TreeResult<Option<Change>> {
        let child_kind = self.container_child_kind(container)?;
        let before = self.children(container)?.to_vec();
        let mut after = before.clone();
        let mut sort_error = None;
        after.sort_by(|left, right| match (self.data(*left), self.data(*right)) {
            (Some(left), Some(right)) => child_kind.compare(left, right),
            _ => {
                sort_error = Some(TreeError::Inconsistent(format!(
                    "dangling child reference under {container}"
                )));
                std::cmp::Ordering::Equal
            }
        });
        if let Some(err) = sort_error {
            return Err(err);
        }
        if after == before {
            return Ok(None);
        }
        let change = Change::Children {
            container,
            before,
            after,
            detached: Vec::new(),
            attached: Vec::new(),
        };
        self.apply(&change, Direction::Forward)?;
        Ok(Some(change))
    }

    /// Replays one change record in the given direction.
    pub(crate) fn apply(&mut self, change: &Change, direction: Direction) -> TreeResult<()> {
        match change {
            Change::Children {
                container,
                before,
                after,
                detached,
                attached,
            } => {
                let (expected, target, leaving, entering) = match direction {
                    Direction::Forward => (before, after, detached, attached),
                    Direction::Backward => (after, before, attached, detached),
                };
                let current = self.children(*container)?;
                if current != expected.as_slice() {
                    return Err(TreeError::Inconsistent(format!(
                        "children of {container} diverged from recorded state"
                    )));
                }
                for fragment in leaving {
                    self.take_fragment(fragment.root())?;
                }
                for fragment in entering {
                    self.put_fragment(fragment, *container);
                }
                if let Some(node) = self.nodes.get_mut(container) {
                    node.children = target.clone();
                }
                Ok(())
            }
            Change::Data {
                node,
                before,
                after,
            } => {
                let (expected, target) = match direction {
                    Direction::Forward => (before, after),
                    Direction::Backward => (after, before),
                };
                let entry = self.nodes.get_mut(node).ok_or(TreeError::NodeNotFound(*node))?;
                if entry.data != *expected {
                    return Err(TreeError::Inconsistent(format!(
                        "payload of {node} diverged from recorded state"
                    )));
                }
                entry.data = target.clone();
                Ok(())
            }
        }
    }

    fn container_child_kind(&self, id: NodeId) -> TreeResult<NodeKind> {
        let kind = self.kind_of(id).ok_or(TreeError::NodeNotFound(id))?;
        kind.child_kind().ok_or(TreeError::NotAContainer(id))
    }

    fn snapshot_fragment(&self, id: NodeId) -> TreeResult<Fragment> {
        let mut nodes = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = self
                .nodes
                .get(&current)
                .ok_or(TreeError::NodeNotFound(current))?;
            nodes.push(node.clone());
            stack.extend(node.children.iter().rev().copied());
        }
        Ok(Fragment { nodes })
    }

    fn take_fragment(&mut self, id: NodeId) -> TreeResult<()> {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = self
                .nodes
                .remove(&current)
                .ok_or(TreeError::NodeNotFound(current))?;
            stack.extend(node.children);
        }
        Ok(())
    }

    fn put_fragment(&mut self, fragment: &Fragment, container: NodeId) {
        let root = fragment.root();
        for node in fragment.nodes() {
            let mut node = node.clone();
            if node.id == root {
                node.parent = Some(container);
            }
            self.nodes.insert(node.id, node);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Bible, BibleMetadata, Direction, Fragment, TreeError};
    use crate::model::node::{NodeKind, NodeTree};

    fn genesis() -> Bible {
        Bible::from_books(
            BibleMetadata::new("Test"),
            [NodeTree::book(1, "Genesis").with_children([
                NodeTree::chapter(1)
                    .with_children([NodeTree::verse(1, "a"), NodeTree::verse(2, "b")]),
                NodeTree::chapter(2),
            ])],
        )
        .unwrap()
    }

    #[test]
    fn insert_rejects_wrong_child_kind() {
        let mut bible = genesis();
        let root = bible.root();
        let err = bible
            .insert(root, 0, vec![Fragment::from_tree(&NodeTree::chapter(9))])
            .unwrap_err();
        assert!(matches!(
            err,
            TreeError::KindMismatch {
                expected: NodeKind::Book,
                actual: NodeKind::Chapter,
                ..
            }
        ));
    }

    #[test]
    fn remove_then_replay_backward_restores_identity() {
        let mut bible = genesis();
        let snapshot = bible.clone();
        let book = bible.children(bible.root()).unwrap()[0];
        let first_chapter = bible.children(book).unwrap()[0];

        let change = bible.remove_all(book, &[first_chapter]).unwrap().unwrap();
        assert!(!bible.contains(first_chapter));
        assert_eq!(bible.len(), snapshot.len() - 3);

        bible.apply(&change, Direction::Backward).unwrap();
        assert_eq!(bible, snapshot);
    }

    #[test]
    fn restore_rejects_unreachable_records() {
        let meta = BibleMetadata::new("Broken");
        let root = uuid::Uuid::new_v4();
        let orphan_parent = uuid::Uuid::new_v4();
        let err = Bible::restore(
            meta,
            root,
            vec![(
                uuid::Uuid::new_v4(),
                orphan_parent,
                crate::model::node::NodeData::Chapter { number: 1 },
            )],
        )
        .unwrap_err();
        assert_eq!(err, TreeError::NodeNotFound(orphan_parent));
    }
}
