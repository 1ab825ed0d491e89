//! In-memory document store implementation
//!
//! Keeps one map per doctype and enforces revisions the way a CouchDB-like
//! backend would, so optimistic concurrency behaves the same in tests.

use crate::errors::StorageError;
use crate::storage::traits::*;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use uuid::Uuid;

/// In-memory implementation of [`DocumentStore`]
#[derive(Default)]
pub struct MemoryDocumentStore {
    databases: Mutex<HashMap<String, BTreeMap<String, Value>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_rev(previous: Option<&str>) -> String {
        let generation = previous
            .and_then(|rev| rev.split_once('-'))
            .and_then(|(n, _)| n.parse::<u64>().ok())
            .unwrap_or(0);
        format!("{}-{}", generation + 1, Uuid::new_v4().simple())
    }

    fn stored_rev(doc: &Value) -> Option<&str> {
        doc.get(REV_FIELD).and_then(Value::as_str)
    }

    fn with_meta(mut doc: Value, id: &str, rev: &str) -> Result<Value> {
        let object = doc
            .as_object_mut()
            .ok_or_else(|| StorageError::InvalidData("document must be a JSON object".into()))?;
        object.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
        object.insert(REV_FIELD.to_string(), Value::String(rev.to_string()));
        Ok(doc)
    }
}

macro_rules! lock {
    ($store:expr) => {
        $store
            .databases
            .lock()
            .map_err(|e| StorageError::QueryFailed(format!("Lock error: {}", e)))?
    };
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn create_doc(&self, doctype: &str, doc: Value) -> Result<DocMeta> {
        let id = Uuid::new_v4().simple().to_string();
        let rev = Self::next_rev(None);
        let doc = Self::with_meta(doc, &id, &rev)?;

        let mut databases = lock!(self);
        databases
            .entry(doctype.to_string())
            .or_default()
            .insert(id.clone(), doc);
        Ok(DocMeta { id, rev })
    }

    async fn update_doc(&self, doctype: &str, doc: Value) -> Result<String> {
        let id = doc
            .get(ID_FIELD)
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| StorageError::InvalidData("document has no _id".into()))?
            .to_string();
        let rev = Self::stored_rev(&doc).unwrap_or_default().to_string();

        let mut databases = lock!(self);
        let existing = databases
            .get_mut(doctype)
            .and_then(|db| db.get_mut(&id))
            .ok_or_else(|| StorageError::NotFound(format!("{}/{}", doctype, id)))?;

        let current = Self::stored_rev(existing).unwrap_or_default().to_string();
        if current != rev {
            return Err(StorageError::Conflict(format!(
                "{}/{} is at revision {}, got {}",
                doctype, id, current, rev
            )));
        }

        let new_rev = Self::next_rev(Some(&current));
        *existing = Self::with_meta(doc, &id, &new_rev)?;
        Ok(new_rev)
    }

    async fn delete_doc(&self, doctype: &str, id: &str, rev: &str) -> Result<()> {
        let mut databases = lock!(self);
        let db = databases
            .get_mut(doctype)
            .ok_or_else(|| StorageError::NotFound(format!("{}/{}", doctype, id)))?;
        let existing = db
            .get(id)
            .ok_or_else(|| StorageError::NotFound(format!("{}/{}", doctype, id)))?;

        let current = Self::stored_rev(existing).unwrap_or_default();
        if current != rev {
            return Err(StorageError::Conflict(format!(
                "{}/{} is at revision {}, got {}",
                doctype, id, current, rev
            )));
        }

        db.remove(id);
        Ok(())
    }

    async fn get_doc(&self, doctype: &str, id: &str) -> Result<Option<Value>> {
        let databases = lock!(self);
        Ok(databases.get(doctype).and_then(|db| db.get(id)).cloned())
    }

    async fn find_docs(&self, doctype: &str, request: &FindRequest) -> Result<Vec<Value>> {
        let databases = lock!(self);
        let db = databases
            .get(doctype)
            .ok_or_else(|| StorageError::NoDatabase(doctype.to_string()))?;

        let matches = db.values().filter(|doc| request.selector.matches(doc));
        Ok(match request.limit {
            Some(limit) => matches.take(limit).cloned().collect(),
            None => matches.cloned().collect(),
        })
    }

    async fn all_docs(&self, doctype: &str, limit: Option<usize>) -> Result<Vec<Value>> {
        let databases = lock!(self);
        let db = databases
            .get(doctype)
            .ok_or_else(|| StorageError::NoDatabase(doctype.to_string()))?;

        let mut result: Vec<_> = db.values().cloned().collect();
        if let Some(limit) = limit {
            result.truncate(limit);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const DOCTYPE: &str = "io.example.tests";

    #[tokio::test]
    async fn test_create_and_get() {
        let store = MemoryDocumentStore::new();
        let meta = store
            .create_doc(DOCTYPE, json!({"_id": "ignored", "name": "one"}))
            .await
            .unwrap();

        assert_eq!(meta.id.len(), 32);
        assert_ne!(meta.id, "ignored");
        assert!(meta.rev.starts_with("1-"));

        let doc = store.get_doc(DOCTYPE, &meta.id).await.unwrap().unwrap();
        assert_eq!(doc["name"], "one");
        assert_eq!(doc[ID_FIELD], meta.id.as_str());
        assert_eq!(doc[REV_FIELD], meta.rev.as_str());

        assert!(store.get_doc(DOCTYPE, "missing").await.unwrap().is_none());
        assert!(store.get_doc("io.example.other", &meta.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_rejects_stale_revision() {
        let store = MemoryDocumentStore::new();
        let meta = store.create_doc(DOCTYPE, json!({"n": 1})).await.unwrap();

        let rev2 = store
            .update_doc(DOCTYPE, json!({"_id": meta.id, "_rev": meta.rev, "n": 2}))
            .await
            .unwrap();
        assert!(rev2.starts_with("2-"));

        // A writer still holding the first revision must not overwrite
        let result = store
            .update_doc(DOCTYPE, json!({"_id": meta.id, "_rev": meta.rev, "n": 3}))
            .await;
        assert!(matches!(result, Err(StorageError::Conflict(_))));

        let doc = store.get_doc(DOCTYPE, &meta.id).await.unwrap().unwrap();
        assert_eq!(doc["n"], 2);
    }

    #[tokio::test]
    async fn test_update_unknown_document() {
        let store = MemoryDocumentStore::new();
        let result = store
            .update_doc(DOCTYPE, json!({"_id": "nope", "_rev": "1-x"}))
            .await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));

        let result = store.update_doc(DOCTYPE, json!({"n": 1})).await;
        assert!(matches!(result, Err(StorageError::InvalidData(_))));
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryDocumentStore::new();
        let meta = store.create_doc(DOCTYPE, json!({})).await.unwrap();

        let result = store.delete_doc(DOCTYPE, &meta.id, "9-stale").await;
        assert!(matches!(result, Err(StorageError::Conflict(_))));

        store.delete_doc(DOCTYPE, &meta.id, &meta.rev).await.unwrap();
        assert!(store.get_doc(DOCTYPE, &meta.id).await.unwrap().is_none());

        let result = store.delete_doc(DOCTYPE, &meta.id, &meta.rev).await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_find_and_all_docs() {
        let store = MemoryDocumentStore::new();

        let result = store
            .find_docs(DOCTYPE, &FindRequest::new(Selector::exists("name")))
            .await;
        assert!(matches!(result, Err(StorageError::NoDatabase(_))));
        assert!(matches!(
            store.all_docs(DOCTYPE, None).await,
            Err(StorageError::NoDatabase(_))
        ));

        for name in ["App", "App-2", "Application", "Other"] {
            store.create_doc(DOCTYPE, json!({"name": name})).await.unwrap();
        }

        let found = store
            .find_docs(DOCTYPE, &FindRequest::new(Selector::starts_with("name", "App")))
            .await
            .unwrap();
        assert_eq!(found.len(), 3);

        let found = store
            .find_docs(
                DOCTYPE,
                &FindRequest::new(Selector::starts_with("name", "App")).limit(1),
            )
            .await
            .unwrap();
        assert_eq!(found.len(), 1);

        assert_eq!(store.all_docs(DOCTYPE, None).await.unwrap().len(), 4);
        assert_eq!(store.all_docs(DOCTYPE, Some(2)).await.unwrap().len(), 2);
    }
}
