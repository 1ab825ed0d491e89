//! In-memory storage implementations
//!
//! This module provides in-memory implementations of the storage traits.
//! These implementations are suitable for development and testing.

mod documents;

pub use documents::MemoryDocumentStore;
