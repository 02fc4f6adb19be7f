//! Bible document model.
//!
//! # Responsibility
//! - Define the Book → Chapter → Verse hierarchy and its per-kind rules.
//! - Hold one document as an ordered, id-addressed node arena.
//!
//! # Invariants
//! - Every node is identified by a stable `NodeId` independent of its Number.
//! - Ownership is strictly tree-shaped: no cross-links, no cycles.

pub mod bible;
pub mod node;
