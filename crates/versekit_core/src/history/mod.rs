//! Undo/redo history for document edits.
//!
//! # Responsibility
//! - Record every document mutation into labelled, atomic batches.
//! - Provide undo/redo, clean-state marking and history reset.
//!
//! # See also
//! - `model::bible::Change` for the record format.

pub mod undo;
