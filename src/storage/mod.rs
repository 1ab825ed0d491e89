//! Trait-based document storage with an in-memory backend.

pub mod documents;
pub mod inmemory;
pub mod traits;

// Re-export commonly used types and traits
pub use documents::Document;
pub use inmemory::MemoryDocumentStore;
pub use traits::*;
