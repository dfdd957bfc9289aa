//! Concrete storage for the coordination engine.
//!
//! This crate provides the one [`marcus_core::AssignmentStore`]
//! implementation shipped in this workspace (a temp-file-plus-rename JSON
//! document) and the one [`marcus_core::KanbanProvider`] implementation
//! with a working wire, an in-process task board used for local operation,
//! demos, and tests. Concrete clients for an actual kanban backend
//! (Planka, GitHub Issues, Linear) are out of scope; see
//! [`marcus_core::ProviderKind`] for the selector a real deployment would
//! extend.

mod json_store;
mod memory_provider;

pub use json_store::JsonAssignmentStore;
pub use memory_provider::InMemoryProvider;
