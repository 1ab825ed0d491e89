//! Storage trait definitions for tenant documents.
//!
//! Defines an async document store interface with revision-based optimistic
//! concurrency that can be implemented by various backend providers.

use crate::errors::StorageError;
use async_trait::async_trait;
use serde_json::Value;

pub type Result<T> = std::result::Result<T, StorageError>;

/// Field name holding the document identifier
pub const ID_FIELD: &str = "_id";

/// Field name holding the document revision
pub const REV_FIELD: &str = "_rev";

/// Identifier and revision assigned by the store on write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocMeta {
    pub id: String,
    pub rev: String,
}

/// Predicate over a single top-level document field
#[derive(Debug, Clone)]
pub enum Selector {
    /// Field equals the given value
    Equal(String, Value),
    /// Field is a string starting with the given prefix
    StartsWith(String, String),
    /// Field is present and not null
    Exists(String),
}

impl Selector {
    pub fn equal(field: &str, value: impl Into<Value>) -> Self {
        Selector::Equal(field.to_string(), value.into())
    }

    pub fn starts_with(field: &str, prefix: &str) -> Self {
        Selector::StartsWith(field.to_string(), prefix.to_string())
    }

    pub fn exists(field: &str) -> Self {
        Selector::Exists(field.to_string())
    }

    /// Evaluate the selector against a JSON document
    pub fn matches(&self, doc: &Value) -> bool {
        match self {
            Selector::Equal(field, value) => doc.get(field) == Some(value),
            Selector::StartsWith(field, prefix) => doc
                .get(field)
                .and_then(Value::as_str)
                .is_some_and(|s| s.starts_with(prefix.as_str())),
            Selector::Exists(field) => doc.get(field).is_some_and(|v| !v.is_null()),
        }
    }
}

/// Query over a doctype
#[derive(Debug, Clone)]
pub struct FindRequest {
    /// Index hint for backends that support it
    pub use_index: Option<String>,
    pub selector: Selector,
    pub limit: Option<usize>,
}

impl FindRequest {
    pub fn new(selector: Selector) -> Self {
        Self {
            use_index: None,
            selector,
            limit: None,
        }
    }

    pub fn use_index(mut self, index: &str) -> Self {
        self.use_index = Some(index.to_string());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Trait for a tenant's JSON document store
///
/// Documents carry their identifier in `_id` and their revision in `_rev`.
/// Writes against a stale revision fail with [`StorageError::Conflict`].
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Store a new document, ignoring any `_id`/`_rev` it carries
    async fn create_doc(&self, doctype: &str, doc: Value) -> Result<DocMeta>;

    /// Replace an existing document, returning its new revision
    async fn update_doc(&self, doctype: &str, doc: Value) -> Result<String>;

    /// Delete a document at the given revision
    async fn delete_doc(&self, doctype: &str, id: &str, rev: &str) -> Result<()>;

    /// Retrieve a document by ID
    async fn get_doc(&self, doctype: &str, id: &str) -> Result<Option<Value>>;

    /// Find documents matching a selector
    async fn find_docs(&self, doctype: &str, request: &FindRequest) -> Result<Vec<Value>>;

    /// List documents of a doctype
    async fn all_docs(&self, doctype: &str, limit: Option<usize>) -> Result<Vec<Value>>;
}
