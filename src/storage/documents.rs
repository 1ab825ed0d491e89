//! Typed access to the document store.
//!
//! Wraps [`DocumentStore`] with serde (de)serialization so callers work with
//! their own document structs instead of raw JSON.

use crate::errors::StorageError;
use crate::storage::traits::{DocumentStore, FindRequest, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// A struct persisted in the document store
pub trait Document: Serialize + DeserializeOwned + Send + Sync {
    /// Doctype the document belongs to
    fn doctype() -> &'static str;

    fn id(&self) -> &str;

    fn rev(&self) -> &str;

    fn set_id(&mut self, id: String);

    fn set_rev(&mut self, rev: String);
}

fn to_value<D: Document>(doc: &D) -> Result<serde_json::Value> {
    serde_json::to_value(doc).map_err(|e| StorageError::SerializationFailed(e.to_string()))
}

fn from_value<D: Document>(value: serde_json::Value) -> Result<D> {
    serde_json::from_value(value).map_err(|e| StorageError::SerializationFailed(e.to_string()))
}

/// Persist a new document and record its assigned id and revision
pub async fn create_doc<D: Document>(store: &dyn DocumentStore, doc: &mut D) -> Result<()> {
    let meta = store.create_doc(D::doctype(), to_value(doc)?).await?;
    doc.set_id(meta.id);
    doc.set_rev(meta.rev);
    Ok(())
}

/// Replace a stored document and record its new revision
pub async fn update_doc<D: Document>(store: &dyn DocumentStore, doc: &mut D) -> Result<()> {
    if doc.id().is_empty() {
        return Err(StorageError::InvalidData(
            "cannot update a document without id".to_string(),
        ));
    }
    let rev = store.update_doc(D::doctype(), to_value(doc)?).await?;
    doc.set_rev(rev);
    Ok(())
}

/// Delete a stored document at its current revision
pub async fn delete_doc<D: Document>(store: &dyn DocumentStore, doc: &D) -> Result<()> {
    store.delete_doc(D::doctype(), doc.id(), doc.rev()).await
}

pub async fn get_doc<D: Document>(store: &dyn DocumentStore, id: &str) -> Result<Option<D>> {
    store
        .get_doc(D::doctype(), id)
        .await?
        .map(from_value)
        .transpose()
}

pub async fn find_docs<D: Document>(
    store: &dyn DocumentStore,
    request: &FindRequest,
) -> Result<Vec<D>> {
    store
        .find_docs(D::doctype(), request)
        .await?
        .into_iter()
        .map(from_value)
        .collect()
}

pub async fn all_docs<D: Document>(
    store: &dyn DocumentStore,
    limit: Option<usize>,
) -> Result<Vec<D>> {
    store
        .all_docs(D::doctype(), limit)
        .await?
        .into_iter()
        .map(from_value)
        .collect()
}
