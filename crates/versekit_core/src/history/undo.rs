//! Batching undo/redo manager bound to one Bible document.
//!
//! # Responsibility
//! - Own the bound document and route every mutation through it.
//! - Group change records into labelled batches (one batch per user action).
//! - Track the saved ("clean") depth for dirty-state reporting.
//!
//! # Invariants
//! - At most one batch is open at a time; nesting is a programmer error.
//! - Mutations are only accepted while a batch is open.
//! - Completing a non-empty batch clears the redo stack.
//! - Undo replays a batch's records in reverse; redo replays them forward,
//!   so repeated cycling never drifts.

use crate::model::bible::{Bible, BibleMetadata, Change, Direction, Fragment, TreeError};
use crate::model::node::{NodeData, NodeId};
use log::{debug, error};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from undo manager operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    /// `begin_batch` called while another batch is still open.
    BatchAlreadyOpen { open: String, requested: String },
    /// Mutation or `complete_batch` without an open batch.
    NoOpenBatch,
    /// Undo/redo requested while a batch is open.
    BatchInProgress(String),
    /// Underlying container primitive failed.
    Tree(TreeError),
}

impl Display for HistoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BatchAlreadyOpen { open, requested } => write!(
                f,
                "batch `{open}` is still open; refusing to begin `{requested}`"
            ),
            Self::NoOpenBatch => write!(f, "no undo batch is open"),
            Self::BatchInProgress(label) => {
                write!(f, "batch `{label}` is open; undo/redo is unavailable")
            }
            Self::Tree(err) => write!(f, "{err}"),
        }
    }
}

impl Error for HistoryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Tree(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TreeError> for HistoryError {
    fn from(value: TreeError) -> Self {
        Self::Tree(value)
    }
}

/// Result type used by undo manager operations.
pub type HistoryResult<T> = Result<T, HistoryError>;

/// One undoable compound edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    label: String,
    changes: Vec<Change>,
}

impl Batch {
    fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            changes: Vec::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Change records in application order.
    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Undo/redo manager owning the bound document.
#[derive(Debug)]
pub struct UndoManager {
    target: Bible,
    undo_stack: Vec<Batch>,
    redo_stack: Vec<Batch>,
    open: Option<Batch>,
    /// Undo depth recorded by the last `mark`. `None` when unreachable.
    marked_depth: Option<usize>,
    /// Maximum kept undo levels; `0` keeps everything.
    max_levels: usize,
    revision: u64,
}

impl UndoManager {
    /// Binds a document with unlimited history. The document starts clean.
    pub fn new(target: Bible) -> Self {
        Self::with_max_levels(target, 0)
    }

    /// Binds a document keeping at most `max_levels` undo batches.
    pub fn with_max_levels(target: Bible, max_levels: usize) -> Self {
        Self {
            target,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            open: None,
            marked_depth: Some(0),
            max_levels,
            revision: 0,
        }
    }

    /// Rebinds to another document and returns the previous one.
    ///
    /// History is reset and the new document starts clean.
    pub fn bind(&mut self, target: Bible) -> Bible {
        self.discard_open_batch();
        let previous = std::mem::replace(&mut self.target, target);
        self.reset();
        self.marked_depth = Some(0);
        previous
    }

    /// Bound document.
    pub fn target(&self) -> &Bible {
        &self.target
    }

    /// Mutable access to document metadata, which is not covered by undo.
    pub fn metadata_mut(&mut self) -> &mut BibleMetadata {
        &mut self.target.meta
    }

    /// Unbinds and returns the document.
    pub fn into_target(self) -> Bible {
        self.target
    }

    /// Opens a batch.
    ///
    /// # Errors
    /// - `BatchAlreadyOpen` when called before the previous `complete_batch`.
    ///   Debug builds assert on this.
    pub fn begin_batch(&mut self, label: impl Into<String>) -> HistoryResult<()> {
        let label = label.into();
        if let Some(open) = &self.open {
            debug_assert!(
                false,
                "begin_batch(`{label}`) while `{}` is open",
                open.label
            );
            return Err(HistoryError::BatchAlreadyOpen {
                open: open.label.clone(),
                requested: label,
            });
        }
        debug!("event=batch_begin module=history status=ok label={label}");
        self.open = Some(Batch::new(label));
        Ok(())
    }

    /// Closes the open batch and pushes it onto the undo stack.
    ///
    /// Returns `false` when the batch recorded nothing; empty batches are
    /// dropped without touching the redo stack.
    pub fn complete_batch(&mut self) -> HistoryResult<bool> {
        let batch = match self.open.take() {
            Some(batch) => batch,
            None => {
                debug_assert!(false, "complete_batch without begin_batch");
                return Err(HistoryError::NoOpenBatch);
            }
        };
        if batch.is_empty() {
            debug!(
                "event=batch_complete module=history status=empty label={}",
                batch.label
            );
            return Ok(false);
        }

        debug!(
            "event=batch_complete module=history status=ok label={} changes={}",
            batch.label,
            batch.changes.len()
        );
        if matches!(self.marked_depth, Some(depth) if depth > self.undo_stack.len()) {
            // Saved state lived on the redo stack and is about to be discarded.
            self.marked_depth = None;
        }
        self.undo_stack.push(batch);
        self.redo_stack.clear();
        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
            self.undo_stack.remove(0);
            self.marked_depth = self.marked_depth.and_then(|depth| depth.checked_sub(1));
        }
        self.revision += 1;
        Ok(true)
    }

    /// Reverts everything recorded in the open batch and discards it.
    pub fn cancel_batch(&mut self) -> HistoryResult<()> {
        let batch = self.open.take().ok_or(HistoryError::NoOpenBatch)?;
        for change in batch.changes.iter().rev() {
            self.target.apply(change, Direction::Backward)?;
        }
        debug!(
            "event=batch_cancel module=history status=ok label={} changes={}",
            batch.label,
            batch.changes.len()
        );
        Ok(())
    }

    pub fn is_batch_open(&self) -> bool {
        self.open.is_some()
    }

    /// Inserts subtrees under `parent` at `index` (clamped to the end).
    ///
    /// Returns the inserted root ids in order.
    pub fn insert(
        &mut self,
        parent: NodeId,
        index: usize,
        fragments: Vec<Fragment>,
    ) -> HistoryResult<Vec<NodeId>> {
        self.ensure_open()?;
        let change = self.target.insert(parent, index, fragments)?;
        let inserted = change.attached_roots();
        self.record(change);
        Ok(inserted)
    }

    /// Removes the listed direct children of `parent`.
    ///
    /// Returns the detached subtrees in container order.
    pub fn remove_all(
        &mut self,
        parent: NodeId,
        children: &[NodeId],
    ) -> HistoryResult<Vec<Fragment>> {
        self.ensure_open()?;
        match self.target.remove_all(parent, children)? {
            Some(change) => {
                let detached = change.detached().to_vec();
                self.record(change);
                Ok(detached)
            }
            None => Ok(Vec::new()),
        }
    }

    /// Replaces one node payload.
    pub fn set_data(&mut self, node: NodeId, data: NodeData) -> HistoryResult<bool> {
        self.ensure_open()?;
        match self.target.set_data(node, data)? {
            Some(change) => {
                self.record(change);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Rewrites child Numbers of `container` to `1..=N`.
    pub fn renumber(&mut self, container: NodeId) -> HistoryResult<usize> {
        self.ensure_open()?;
        let changes = self.target.renumber(container)?;
        let count = changes.len();
        for change in changes {
            self.record(change);
        }
        Ok(count)
    }

    /// Sorts children of `container` by natural key.
    pub fn reorder(&mut self, container: NodeId) -> HistoryResult<bool> {
        self.ensure_open()?;
        match self.target.reorder(container)? {
            Some(change) => {
                self.record(change);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Reverts the most recent batch. Returns `false` when nothing to undo.
    pub fn undo(&mut self) -> HistoryResult<bool> {
        self.ensure_idle()?;
        let Some(batch) = self.undo_stack.pop() else {
            return Ok(false);
        };
        if let Err(err) = replay(&mut self.target, &batch, Direction::Backward) {
            error!(
                "event=undo module=history status=error label={} error={}",
                batch.label, err
            );
            self.undo_stack.push(batch);
            return Err(err.into());
        }
        debug!("event=undo module=history status=ok label={}", batch.label);
        self.redo_stack.push(batch);
        self.revision += 1;
        Ok(true)
    }

    /// Reapplies the most recently undone batch. Returns `false` when empty.
    pub fn redo(&mut self) -> HistoryResult<bool> {
        self.ensure_idle()?;
        let Some(batch) = self.redo_stack.pop() else {
            return Ok(false);
        };
        if let Err(err) = replay(&mut self.target, &batch, Direction::Forward) {
            error!(
                "event=redo module=history status=error label={} error={}",
                batch.label, err
            );
            self.redo_stack.push(batch);
            return Err(err.into());
        }
        debug!("event=redo module=history status=ok label={}", batch.label);
        self.undo_stack.push(batch);
        self.revision += 1;
        Ok(true)
    }

    /// Records the current undo depth as the saved state.
    pub fn mark(&mut self) {
        self.marked_depth = Some(self.undo_stack.len());
    }

    /// Whether the document differs from the last marked state.
    pub fn is_dirty(&self) -> bool {
        self.marked_depth != Some(self.undo_stack.len())
    }

    /// Clears both stacks, the open batch and the mark.
    ///
    /// An open batch is reverted first, so the document never keeps
    /// changes that no batch records.
    pub fn reset(&mut self) {
        self.discard_open_batch();
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.marked_depth = None;
        self.revision += 1;
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    /// Label of the batch `undo` would revert.
    pub fn undo_label(&self) -> Option<&str> {
        self.undo_stack.last().map(Batch::label)
    }

    /// Label of the batch `redo` would reapply.
    pub fn redo_label(&self) -> Option<&str> {
        self.redo_stack.last().map(Batch::label)
    }

    /// Monotonic counter bumped by every complete/undo/redo/reset.
    ///
    /// Lets callers detect edits that happened while a save was in flight.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn discard_open_batch(&mut self) {
        if self.open.is_none() {
            return;
        }
        if let Err(err) = self.cancel_batch() {
            error!("event=batch_cancel module=history status=error error={err}");
        }
    }

    fn ensure_open(&self) -> HistoryResult<()> {
        if self.open.is_none() {
            debug_assert!(false, "document mutation outside of a batch");
            return Err(HistoryError::NoOpenBatch);
        }
        Ok(())
    }

    fn ensure_idle(&self) -> HistoryResult<()> {
        match &self.open {
            Some(batch) => Err(HistoryError::BatchInProgress(batch.label.clone())),
            None => Ok(()),
        }
    }

    fn record(&mut self, change: Change) {
        if let Some(batch) = &mut self.open {
            batch.changes.push(change);
        }
    }
}

fn replay(target: &mut Bible, batch: &Batch, direction: Direction) -> Result<(), TreeError> {
    match direction {
        Direction::Forward => batch
            .changes
            .iter()
            .try_for_each(|change| target.apply(change, direction)),
        Direction::Backward => batch
            .changes
            .iter()
            .rev()
            .try_for_each(|change| target.apply(change, direction)),
    }
}
