//! Core editing engine for versekit Bible documents.
//! This crate is the single source of truth for document invariants.

pub mod clipboard;
pub mod config;
pub mod db;
pub mod dnd;
pub mod history;
pub mod logging;
pub mod model;
pub mod repo;
pub mod selection;
pub mod service;

pub use clipboard::codec::{ClipboardError, Payload};
pub use clipboard::{Clipboard, ClipboardContents, MemoryClipboard, TEXT_FORMAT};
pub use config::{EditorSettings, JsonSettingsFile, MemorySettings, SettingsError, SettingsStore};
pub use dnd::{classify_drop, DropPosition, DropTarget, SIBLING_BEFORE_RATIO};
pub use history::undo::{HistoryError, HistoryResult, UndoManager};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::bible::{Bible, BibleMetadata, TreeError, TreeResult};
pub use model::node::{Node, NodeData, NodeId, NodeKind, NodeTree};
pub use repo::bible_repo::{
    BibleRepository, BibleSummary, SqliteBibleRepository, StoreError, StoreResult,
};
pub use selection::Selection;
pub use service::actions::{Action, ActionState};
pub use service::editor_service::{
    ActionOutcome, BibleEditor, BulkOperation, EditorError, EditorEvent, EditorObserver,
    EditorResult, PendingConfirmation, PersistenceReport,
};
pub use service::persistence::{
    BibleStore, PersistenceKind, PersistenceTicket, SqliteBibleStore,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
