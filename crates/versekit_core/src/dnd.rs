//! Drag-and-drop target resolution.
//!
//! # Responsibility
//! - Classify a hovered row as `Into`, `Before` or `After` for a dragged
//!   homogeneous selection, from pointer geometry and kind rules.
//! - Compute the insertion container and index once the dragged nodes have
//!   been detached.
//!
//! # Invariants
//! - A node can never be dropped onto itself or into its own descendants;
//!   kind rules only admit the parent level or the sibling level.
//! - Classification is pure and never touches the document.

use crate::model::bible::{Bible, TreeError, TreeResult};
use crate::model::node::{NodeId, NodeKind};

/// Portion of the row height, measured from the top, that means "before".
pub const SIBLING_BEFORE_RATIO: f64 = 0.75;

/// Where dragged nodes land relative to the hovered node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropPosition {
    /// Appended as the last children of the hovered container.
    Into,
    /// Inserted right before the hovered sibling.
    Before,
    /// Inserted right after the hovered sibling.
    After,
}

/// Accepted drop location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropTarget {
    pub target: NodeId,
    pub position: DropPosition,
}

/// Classifies a drop of `dragged` onto `hovered`.
///
/// `offset_y` is the pointer offset from the top of the hovered row. Returns
/// `None` when the drop is not allowed.
pub fn classify_drop(
    bible: &Bible,
    dragged: &[NodeId],
    hovered: Option<NodeId>,
    offset_y: f64,
    row_height: f64,
) -> Option<DropTarget> {
    let target = hovered?;
    if dragged.is_empty() || dragged.contains(&target) {
        return None;
    }
    let dragged_kind = shared_kind(bible, dragged)?;
    let parent_kind = dragged_kind.parent_kind()?;
    let target_kind = bible.kind_of(target)?;

    let position = if target_kind == parent_kind {
        DropPosition::Into
    } else if target_kind == dragged_kind {
        if offset_y < SIBLING_BEFORE_RATIO * row_height {
            DropPosition::Before
        } else {
            DropPosition::After
        }
    } else {
        return None;
    };
    Some(DropTarget { target, position })
}

/// Container and index for inserting the dragged nodes.
///
/// Must be called after the dragged nodes were removed, so the index is
/// relative to the remaining siblings.
pub fn insertion_point(bible: &Bible, drop: &DropTarget) -> TreeResult<(NodeId, usize)> {
    match drop.position {
        DropPosition::Into => {
            let len = bible.children(drop.target)?.len();
            Ok((drop.target, len))
        }
        DropPosition::Before | DropPosition::After => {
            let parent = bible
                .parent_of(drop.target)
                .ok_or(TreeError::NodeNotFound(drop.target))?;
            let index = bible
                .index_of(parent, drop.target)
                .ok_or(TreeError::NodeNotFound(drop.target))?;
            let offset = usize::from(drop.position == DropPosition::After);
            Ok((parent, index + offset))
        }
    }
}

fn shared_kind(bible: &Bible, ids: &[NodeId]) -> Option<NodeKind> {
    let first = bible.kind_of(*ids.first()?)?;
    ids.iter()
        .all(|id| bible.kind_of(*id) == Some(first))
        .then_some(first)
}
