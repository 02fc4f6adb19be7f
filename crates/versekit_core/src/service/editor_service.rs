//! Bible editing façade.
//!
//! # Responsibility
//! - Expose the editing actions (clipboard, delete, new child, edit,
//!   renumber, reorder, drag-and-drop, undo/redo, save/save-as).
//! - Run every document change inside exactly one undo batch.
//! - Publish action enablement and selection changes to observers.
//!
//! # Invariants
//! - A failed action leaves the document unchanged (the open batch is
//!   cancelled).
//! - A save only marks the document clean when no edit completed while it
//!   was in flight and the document still carries the id it was saved under.
//! - Save-as failures restore the previous document id and name.

use crate::clipboard::codec::{self, ClipboardError};
use crate::clipboard::Clipboard;
use crate::config::{EditorSettings, SettingsError, SettingsStore};
use crate::dnd::{classify_drop, insertion_point, DropTarget};
use crate::history::undo::{HistoryError, HistoryResult, UndoManager};
use crate::model::bible::{Bible, Fragment, TreeError};
use crate::model::node::{NodeData, NodeId, NodeKind, NodeTree};
use crate::repo::bible_repo::StoreError;
use crate::selection::Selection;
use crate::service::actions::{evaluate, Action, ActionState};
use crate::service::persistence::{
    BibleStore, PersistenceCompletion, PersistenceKind, PersistenceTicket, PersistenceWorker,
};
use log::{debug, error, info, warn};
use std::collections::{BTreeMap, HashMap};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use uuid::Uuid;

/// Undo label recorded for drag-and-drop moves.
pub const DRAG_DROP_LABEL: &str = "Drag and drop";

/// Errors from editor actions.
#[derive(Debug)]
pub enum EditorError {
    /// Undo manager or container primitive failure.
    History(HistoryError),
    /// Clipboard payload could not be encoded or decoded.
    Clipboard(ClipboardError),
    /// Persistence failure.
    Store(StoreError),
    /// Settings could not be written.
    Settings(SettingsError),
    /// Save requested without an attached store.
    NoStore,
}

impl Display for EditorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::History(err) => write!(f, "{err}"),
            Self::Clipboard(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Settings(err) => write!(f, "{err}"),
            Self::NoStore => write!(f, "no bible store attached"),
        }
    }
}

impl Error for EditorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::History(err) => Some(err),
            Self::Clipboard(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Settings(err) => Some(err),
            Self::NoStore => None,
        }
    }
}

impl From<HistoryError> for EditorError {
    fn from(value: HistoryError) -> Self {
        Self::History(value)
    }
}

impl From<TreeError> for EditorError {
    fn from(value: TreeError) -> Self {
        Self::History(HistoryError::Tree(value))
    }
}

impl From<ClipboardError> for EditorError {
    fn from(value: ClipboardError) -> Self {
        Self::Clipboard(value)
    }
}

impl From<StoreError> for EditorError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<SettingsError> for EditorError {
    fn from(value: SettingsError) -> Self {
        Self::Settings(value)
    }
}

pub type EditorResult<T> = Result<T, EditorError>;

/// Bulk container operations guarded by a confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkOperation {
    Renumber,
    Reorder,
}

impl BulkOperation {
    fn action(self) -> Action {
        match self {
            Self::Renumber => Action::Renumber,
            Self::Reorder => Action::Reorder,
        }
    }
}

/// Confirmation the host must answer before a bulk operation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingConfirmation {
    pub operation: BulkOperation,
    pub container: NodeId,
}

/// Result of a bulk operation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The document changed.
    Applied,
    /// Nothing changed (disabled, declined, or already in the target state).
    NotApplied,
    /// The host must ask the user and call `confirm`.
    NeedsConfirmation(PendingConfirmation),
}

/// Notifications published to editor observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    SelectionChanged(Vec<NodeId>),
    ActionsChanged(ActionState),
    PersistenceFinished {
        kind: PersistenceKind,
        document_id: Uuid,
        succeeded: bool,
    },
}

/// Host-side listener for editor notifications.
pub trait EditorObserver {
    fn on_event(&mut self, event: &EditorEvent);
}

/// Outcome of one finished save or save-as, as seen by the editor.
#[derive(Debug)]
pub struct PersistenceReport {
    pub ticket: PersistenceTicket,
    pub kind: PersistenceKind,
    /// Whether the document was marked clean.
    pub marked_clean: bool,
    pub error: Option<StoreError>,
}

struct PendingSave {
    kind: PersistenceKind,
    revision: u64,
    document_id: Uuid,
    rollback: Option<(Uuid, String)>,
}

/// Editing façade bound to one Bible document.
pub struct BibleEditor<C: Clipboard> {
    history: UndoManager,
    selection: Selection,
    clipboard: C,
    settings_store: Box<dyn SettingsStore>,
    settings: EditorSettings,
    persistence: Option<PersistenceWorker>,
    pending: BTreeMap<PersistenceTicket, PendingSave>,
    observers: Vec<Box<dyn EditorObserver>>,
    last_state: ActionState,
}

impl<C: Clipboard> BibleEditor<C> {
    /// Binds `bible` to a fresh editor. The document starts clean.
    ///
    /// Unreadable settings fall back to defaults.
    pub fn new(bible: Bible, clipboard: C, settings_store: Box<dyn SettingsStore>) -> Self {
        let settings = settings_store.load().unwrap_or_else(|err| {
            warn!("event=settings_load module=editor status=error fallback=defaults error={err}");
            EditorSettings::default()
        });
        let history = UndoManager::new(bible);
        let selection = Selection::new();
        let last_state = evaluate(&history, &selection, &clipboard, false);
        Self {
            history,
            selection,
            clipboard,
            settings_store,
            settings,
            persistence: None,
            pending: BTreeMap::new(),
            observers: Vec::new(),
            last_state,
        }
    }

    /// Starts background persistence against `store`, enabling save actions.
    pub fn attach_store(&mut self, store: Arc<dyn BibleStore>) -> EditorResult<()> {
        let worker = PersistenceWorker::start(store)
            .map_err(|err| StoreError::Unavailable(format!("failed to spawn worker: {err}")))?;
        self.persistence = Some(worker);
        self.refresh();
        Ok(())
    }

    pub fn add_observer(&mut self, observer: Box<dyn EditorObserver>) {
        self.observers.push(observer);
    }

    /// Replaces the bound document, resetting history and selection.
    pub fn open(&mut self, bible: Bible) -> Bible {
        let previous = self.history.bind(bible);
        if self.selection.clear() {
            self.emit(EditorEvent::SelectionChanged(Vec::new()));
        }
        self.refresh();
        previous
    }

    pub fn document(&self) -> &Bible {
        self.history.target()
    }

    pub fn history(&self) -> &UndoManager {
        &self.history
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn clipboard(&self) -> &C {
        &self.clipboard
    }

    pub fn clipboard_mut(&mut self) -> &mut C {
        &mut self.clipboard
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    /// Current action enablement.
    pub fn action_state(&self) -> &ActionState {
        &self.last_state
    }

    pub fn is_enabled(&self, action: Action) -> bool {
        self.last_state.is_enabled(action)
    }

    pub fn is_dirty(&self) -> bool {
        self.history.is_dirty()
    }

    /// Sets the selection from the host tree projection.
    pub fn select(&mut self, ids: impl IntoIterator<Item = NodeId>) -> bool {
        let changed = self.selection.set(self.history.target(), ids);
        if changed {
            self.emit(EditorEvent::SelectionChanged(self.selection.selected_ids()));
        }
        self.refresh();
        changed
    }

    /// Re-reads clipboard state, e.g. after another application wrote to it.
    pub fn clipboard_changed(&mut self) {
        self.refresh();
    }

    /// Copies the selection to the clipboard.
    pub fn copy(&mut self) -> EditorResult<bool> {
        if !self.is_enabled(Action::Copy) {
            return Ok(false);
        }
        let ids = self.selection.selected_ids();
        let payload = codec::encode(self.history.target(), &ids).map_err(|err| {
            warn!("event=editor_action module=editor status=error action=copy error={err}");
            err
        })?;
        info!(
            "event=editor_action module=editor status=ok action=copy kind={} count={}",
            payload.kind().as_str(),
            ids.len()
        );
        self.clipboard.set_contents(payload.into_contents());
        self.refresh();
        Ok(true)
    }

    /// Copies the selection and removes it from its common parent.
    ///
    /// Returns `false` when disabled or when the selection spans parents.
    pub fn cut(&mut self) -> EditorResult<bool> {
        if !self.is_enabled(Action::Cut) {
            return Ok(false);
        }
        let ids = self.selection.selected_ids();
        let Some(parent) = common_parent(self.history.target(), &ids) else {
            info!("event=editor_action module=editor status=skipped action=cut reason=no_common_parent");
            return Ok(false);
        };
        let payload = codec::encode(self.history.target(), &ids).map_err(|err| {
            warn!("event=editor_action module=editor status=error action=cut error={err}");
            err
        })?;

        self.run_batch(Action::Cut, |history| history.remove_all(parent, &ids))?;
        info!(
            "event=editor_action module=editor status=ok action=cut kind={} count={}",
            payload.kind().as_str(),
            ids.len()
        );
        self.clipboard.set_contents(payload.into_contents());
        self.refresh();
        Ok(true)
    }

    /// Appends clipboard nodes to the single selected container.
    ///
    /// Pasted nodes become the selection. A payload that does not match the
    /// container's child kind is a no-op.
    pub fn paste(&mut self) -> EditorResult<Vec<NodeId>> {
        let Some(target) = self.selection.single() else {
            return Ok(Vec::new());
        };
        let Some(format) = self
            .history
            .target()
            .kind_of(target)
            .and_then(NodeKind::child_kind)
            .and_then(NodeKind::clipboard_format)
        else {
            return Ok(Vec::new());
        };
        let Some(data) = self.clipboard.get(format) else {
            debug!("event=editor_action module=editor status=skipped action=paste reason=format_mismatch");
            return Ok(Vec::new());
        };
        let trees = codec::decode(format, &data).map_err(|err| {
            warn!("event=editor_action module=editor status=error action=paste error={err}");
            err
        })?;
        if trees.is_empty() {
            return Ok(Vec::new());
        }

        let fragments: Vec<Fragment> = trees.iter().map(Fragment::from_tree).collect();
        let inserted = self.run_batch(Action::Paste, |history| {
            history.insert(target, usize::MAX, fragments)
        })?;
        info!(
            "event=editor_action module=editor status=ok action=paste count={}",
            inserted.len()
        );
        self.reselect(inserted.clone());
        Ok(inserted)
    }

    /// Removes every selected node as one batch.
    pub fn delete(&mut self) -> EditorResult<bool> {
        if !self.is_enabled(Action::Delete) {
            return Ok(false);
        }
        let ids = self.selection.selected_ids();
        let groups = group_by_parent(self.history.target(), &ids);
        let removed = self.run_batch(Action::Delete, |history| {
            let mut removed = 0;
            for (parent, children) in &groups {
                removed += history.remove_all(*parent, children)?.len();
            }
            Ok(removed)
        })?;
        info!("event=editor_action module=editor status=ok action=delete count={removed}");
        self.refresh();
        Ok(removed > 0)
    }

    /// Appends a new child to the single selected container and selects it.
    ///
    /// `action` must be one of `NewBook`, `NewChapter` or `NewVerse`. The new
    /// node is numbered one past the highest sibling number.
    pub fn create_child(&mut self, action: Action) -> EditorResult<Option<NodeId>> {
        if action.new_child_parent().is_none() || !self.is_enabled(action) {
            return Ok(None);
        }
        let Some(parent) = self.selection.single() else {
            return Ok(None);
        };
        let bible = self.history.target();
        let number = bible
            .children(parent)?
            .iter()
            .filter_map(|id| bible.data(*id).and_then(NodeData::number))
            .max()
            .map_or(1, |max| max.saturating_add(1));
        let Some(data) = bible.kind_of(parent).and_then(|kind| kind.new_child_data(number)) else {
            return Ok(None);
        };
        let fragment = Fragment::from_tree(&NodeTree::new(data));

        let inserted = self.run_batch(action, |history| {
            history.insert(parent, usize::MAX, vec![fragment])
        })?;
        info!(
            "event=editor_action module=editor status=ok action={} number={number}",
            action.as_str()
        );
        let created = inserted.first().copied();
        self.reselect(inserted);
        Ok(created)
    }

    pub fn new_book(&mut self) -> EditorResult<Option<NodeId>> {
        self.create_child(Action::NewBook)
    }

    pub fn new_chapter(&mut self) -> EditorResult<Option<NodeId>> {
        self.create_child(Action::NewChapter)
    }

    pub fn new_verse(&mut self) -> EditorResult<Option<NodeId>> {
        self.create_child(Action::NewVerse)
    }

    /// Replaces the payload of one node as an undoable edit.
    pub fn update_node(&mut self, node: NodeId, data: NodeData) -> EditorResult<bool> {
        let changed = self.run_batch(Action::EditNode, |history| history.set_data(node, data))?;
        if changed {
            debug!("event=editor_action module=editor status=ok action=edit_node node={node}");
        }
        self.refresh();
        Ok(changed)
    }

    /// Rewrites child numbers of the selected container to `1..=N`.
    pub fn renumber(&mut self) -> EditorResult<ActionOutcome> {
        self.request_bulk(BulkOperation::Renumber)
    }

    /// Sorts children of the selected container by natural order.
    pub fn reorder(&mut self) -> EditorResult<ActionOutcome> {
        self.request_bulk(BulkOperation::Reorder)
    }

    /// Answers a pending confirmation.
    ///
    /// When `ask_again` is false the prompt is disabled and the setting is
    /// persisted; a settings write failure is logged and does not block the
    /// operation.
    pub fn confirm(
        &mut self,
        pending: PendingConfirmation,
        accepted: bool,
        ask_again: bool,
    ) -> EditorResult<ActionOutcome> {
        if !ask_again {
            match pending.operation {
                BulkOperation::Renumber => self.settings.warn_before_renumber = false,
                BulkOperation::Reorder => self.settings.warn_before_reorder = false,
            }
            if let Err(err) = self.settings_store.store(&self.settings) {
                warn!("event=settings_store module=editor status=error error={err}");
            }
        }
        if !accepted || !self.history.target().contains(pending.container) {
            return Ok(ActionOutcome::NotApplied);
        }
        self.apply_bulk(pending.operation, pending.container)
    }

    /// Reverts the most recent batch.
    pub fn undo(&mut self) -> EditorResult<bool> {
        let undone = self.history.undo()?;
        self.refresh();
        Ok(undone)
    }

    /// Reapplies the most recently undone batch.
    pub fn redo(&mut self) -> EditorResult<bool> {
        let redone = self.history.redo()?;
        self.refresh();
        Ok(redone)
    }

    /// Classifies a drag of the current selection over `hovered`.
    pub fn drag_over(
        &self,
        hovered: Option<NodeId>,
        offset_y: f64,
        row_height: f64,
    ) -> Option<DropTarget> {
        classify_drop(
            self.history.target(),
            &self.selection.selected_ids(),
            hovered,
            offset_y,
            row_height,
        )
    }

    /// Moves the current selection to the drop location as one batch.
    ///
    /// Moved nodes keep their ids, keep selection order, and become the new
    /// selection. Returns an empty list when the drop is rejected.
    pub fn drop_selection(
        &mut self,
        hovered: Option<NodeId>,
        offset_y: f64,
        row_height: f64,
    ) -> EditorResult<Vec<NodeId>> {
        let Some(drop) = self.drag_over(hovered, offset_y, row_height) else {
            return Ok(Vec::new());
        };
        let dragged = self.selection.selected_ids();
        let groups = group_by_parent(self.history.target(), &dragged);

        let moved = self.run_labelled(DRAG_DROP_LABEL, |history| {
            let mut detached: HashMap<NodeId, Fragment> = HashMap::new();
            for (parent, children) in &groups {
                for fragment in history.remove_all(*parent, children)? {
                    detached.insert(fragment.root(), fragment);
                }
            }
            let (parent, index) = insertion_point(history.target(), &drop)?;
            let fragments: Vec<Fragment> = dragged
                .iter()
                .filter_map(|id| detached.remove(id))
                .collect();
            history.insert(parent, index, fragments)
        })?;
        info!(
            "event=editor_action module=editor status=ok action=drag_drop position={:?} count={}",
            drop.position,
            moved.len()
        );
        self.reselect(moved.clone());
        Ok(moved)
    }

    /// Queues a background save of the current document.
    pub fn save(&mut self) -> EditorResult<PersistenceTicket> {
        let snapshot = self.history.target().clone();
        let pending = PendingSave {
            kind: PersistenceKind::Save,
            revision: self.history.revision(),
            document_id: snapshot.meta.document_id,
            rollback: None,
        };
        self.submit(pending, snapshot)
    }

    /// Default name proposed for "save as".
    pub fn default_save_as_name(&self) -> String {
        format!("Copy of {}", self.history.target().meta.name)
    }

    /// Saves the document as a new copy under a fresh document id.
    ///
    /// The id and name switch immediately and are restored if the save fails.
    pub fn save_as(&mut self, name: Option<String>) -> EditorResult<PersistenceTicket> {
        if self.persistence.is_none() {
            return Err(EditorError::NoStore);
        }
        let name = name.unwrap_or_else(|| self.default_save_as_name());
        let document_id = Uuid::new_v4();
        let meta = self.history.metadata_mut();
        let rollback = (meta.document_id, std::mem::replace(&mut meta.name, name));
        meta.document_id = document_id;

        let pending = PendingSave {
            kind: PersistenceKind::CreateCopy,
            revision: self.history.revision(),
            document_id,
            rollback: Some(rollback),
        };
        let snapshot = self.history.target().clone();
        self.submit(pending, snapshot)
    }

    /// Applies finished saves without blocking.
    pub fn poll_persistence(&mut self) -> Vec<PersistenceReport> {
        let mut reports = Vec::new();
        loop {
            let Some(completion) = self
                .persistence
                .as_ref()
                .and_then(PersistenceWorker::try_completion)
            else {
                break;
            };
            reports.push(self.finish_persistence(completion));
        }
        reports
    }

    /// Blocks until every queued save has finished.
    pub fn wait_for_persistence(&mut self) -> Vec<PersistenceReport> {
        let mut reports = Vec::new();
        while !self.pending.is_empty() {
            let Some(completion) = self
                .persistence
                .as_ref()
                .and_then(PersistenceWorker::wait_completion)
            else {
                error!(
                    "event=persist module=editor status=error error=worker_gone pending={}",
                    self.pending.len()
                );
                break;
            };
            reports.push(self.finish_persistence(completion));
        }
        reports
    }

    /// Number of saves still in flight.
    pub fn pending_saves(&self) -> usize {
        self.pending.len()
    }

    fn submit(&mut self, pending: PendingSave, snapshot: Bible) -> EditorResult<PersistenceTicket> {
        let Some(worker) = self.persistence.as_mut() else {
            return Err(EditorError::NoStore);
        };
        match worker.submit(pending.kind, snapshot) {
            Ok(ticket) => {
                debug!(
                    "event=persist_submit module=editor status=ok ticket={ticket:?} revision={}",
                    pending.revision
                );
                self.pending.insert(ticket, pending);
                Ok(ticket)
            }
            Err(err) => {
                if let Some((document_id, name)) = pending.rollback {
                    let meta = self.history.metadata_mut();
                    meta.document_id = document_id;
                    meta.name = name;
                }
                Err(err.into())
            }
        }
    }

    fn finish_persistence(&mut self, completion: PersistenceCompletion) -> PersistenceReport {
        let PersistenceCompletion {
            ticket,
            kind,
            result,
        } = completion;
        let Some(pending) = self.pending.remove(&ticket) else {
            warn!("event=persist_complete module=editor status=error error=unknown_ticket ticket={ticket:?}");
            return PersistenceReport {
                ticket,
                kind,
                marked_clean: false,
                error: result.err(),
            };
        };

        let (marked_clean, error) = match result {
            Ok(_) => {
                // A snapshot stored under an id the document no longer carries
                // (rolled-back save-as) says nothing about the current copy.
                let same_document =
                    self.history.target().meta.document_id == pending.document_id;
                let unchanged = same_document && self.history.revision() == pending.revision;
                if unchanged {
                    self.history.mark();
                }
                info!(
                    "event=persist_complete module=editor status=ok kind={kind:?} marked_clean={unchanged} same_document={same_document}"
                );
                (unchanged, None)
            }
            Err(err) => {
                let meta = self.history.metadata_mut();
                if let Some((document_id, name)) = pending.rollback {
                    if meta.document_id == pending.document_id {
                        meta.document_id = document_id;
                        meta.name = name;
                    }
                }
                warn!("event=persist_complete module=editor status=error kind={kind:?} error={err}");
                (false, Some(err))
            }
        };

        self.emit(EditorEvent::PersistenceFinished {
            kind,
            document_id: pending.document_id,
            succeeded: error.is_none(),
        });
        self.refresh();
        PersistenceReport {
            ticket,
            kind,
            marked_clean,
            error,
        }
    }

    fn request_bulk(&mut self, operation: BulkOperation) -> EditorResult<ActionOutcome> {
        if !self.is_enabled(operation.action()) {
            return Ok(ActionOutcome::NotApplied);
        }
        let Some(container) = self.selection.single() else {
            return Ok(ActionOutcome::NotApplied);
        };
        let warn_first = match operation {
            BulkOperation::Renumber => self.settings.warn_before_renumber,
            BulkOperation::Reorder => self.settings.warn_before_reorder,
        };
        if warn_first {
            return Ok(ActionOutcome::NeedsConfirmation(PendingConfirmation {
                operation,
                container,
            }));
        }
        self.apply_bulk(operation, container)
    }

    fn apply_bulk(
        &mut self,
        operation: BulkOperation,
        container: NodeId,
    ) -> EditorResult<ActionOutcome> {
        let changed = self.run_batch(operation.action(), |history| match operation {
            BulkOperation::Renumber => history.renumber(container).map(|count| count > 0),
            BulkOperation::Reorder => history.reorder(container),
        })?;
        info!(
            "event=editor_action module=editor status=ok action={} changed={changed}",
            operation.action().as_str()
        );
        self.refresh();
        Ok(if changed {
            ActionOutcome::Applied
        } else {
            ActionOutcome::NotApplied
        })
    }

    fn run_batch<T>(
        &mut self,
        action: Action,
        edit: impl FnOnce(&mut UndoManager) -> HistoryResult<T>,
    ) -> EditorResult<T> {
        let label = action.batch_label().unwrap_or(action.as_str());
        self.run_labelled(label, edit)
    }

    fn run_labelled<T>(
        &mut self,
        label: &str,
        edit: impl FnOnce(&mut UndoManager) -> HistoryResult<T>,
    ) -> EditorResult<T> {
        self.history.begin_batch(label)?;
        match edit(&mut self.history) {
            Ok(value) => {
                self.history.complete_batch()?;
                Ok(value)
            }
            Err(err) => {
                if let Err(cancel_err) = self.history.cancel_batch() {
                    error!(
                        "event=batch_cancel module=editor status=error label={label} error={cancel_err}"
                    );
                }
                warn!("event=editor_action module=editor status=error label={label} error={err}");
                Err(err.into())
            }
        }
    }

    fn reselect(&mut self, ids: Vec<NodeId>) {
        if self.selection.set(self.history.target(), ids) {
            self.emit(EditorEvent::SelectionChanged(self.selection.selected_ids()));
        }
        self.refresh();
    }

    fn refresh(&mut self) {
        if self.selection.prune(self.history.target()) {
            self.emit(EditorEvent::SelectionChanged(self.selection.selected_ids()));
        }
        let state = evaluate(
            &self.history,
            &self.selection,
            &self.clipboard,
            self.persistence.is_some(),
        );
        if state != self.last_state {
            self.last_state = state.clone();
            self.emit(EditorEvent::ActionsChanged(state));
        }
    }

    fn emit(&mut self, event: EditorEvent) {
        for observer in &mut self.observers {
            observer.on_event(&event);
        }
    }
}

/// Parent shared by every id, if any.
fn common_parent(bible: &Bible, ids: &[NodeId]) -> Option<NodeId> {
    let first = bible.parent_of(*ids.first()?)?;
    ids.iter()
        .all(|id| bible.parent_of(*id) == Some(first))
        .then_some(first)
}

/// Groups ids by parent in first-seen order.
///
/// Ids with a selected ancestor are dropped; removing the ancestor removes
/// them too.
fn group_by_parent(bible: &Bible, ids: &[NodeId]) -> Vec<(NodeId, Vec<NodeId>)> {
    let mut groups: Vec<(NodeId, Vec<NodeId>)> = Vec::new();
    for id in ids {
        if has_selected_ancestor(bible, *id, ids) {
            continue;
        }
        let Some(parent) = bible.parent_of(*id) else {
            continue;
        };
        match groups.iter_mut().find(|(existing, _)| *existing == parent) {
            Some((_, children)) => children.push(*id),
            None => groups.push((parent, vec![*id])),
        }
    }
    groups
}

fn has_selected_ancestor(bible: &Bible, id: NodeId, selected: &[NodeId]) -> bool {
    let mut current = bible.parent_of(id);
    while let Some(ancestor) = current {
        if selected.contains(&ancestor) {
            return true;
        }
        current = bible.parent_of(ancestor);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::{common_parent, group_by_parent};
    use crate::model::bible::{Bible, BibleMetadata};
    use crate::model::node::NodeTree;

    #[test]
    fn nested_selection_groups_only_outermost_nodes() {
        let bible = Bible::from_books(
            BibleMetadata::new("Groups"),
            [
                NodeTree::book(1, "Genesis").with_children([NodeTree::chapter(1)]),
                NodeTree::book(2, "Exodus"),
            ],
        )
        .unwrap();
        let books = bible.children(bible.root()).unwrap().to_vec();
        let chapter = bible.children(books[0]).unwrap()[0];

        let groups = group_by_parent(&bible, &[chapter, books[0], books[1]]);
        assert_eq!(groups, vec![(bible.root(), vec![books[0], books[1]])]);
        assert_eq!(common_parent(&bible, &[chapter, books[1]]), None);
        assert_eq!(common_parent(&bible, &books), Some(bible.root()));
    }
}
