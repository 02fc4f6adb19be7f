//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate document mutation, clipboard and persistence into editing
//!   actions.
//! - Keep hosts decoupled from undo batching and storage details.

pub mod actions;
pub mod editor_service;
pub mod persistence;
