//! In-process document store used by tests and examples.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::client::DocumentStore;
use crate::document::{Document, DocumentList};
use crate::error::StoreError;
use crate::query::Query;

/// Collection key within a database.
type CollectionKey = (String, String);

/// A thread-safe in-memory stand-in for the remote document backend.
///
/// Documents keep insertion order within a collection, matching the
/// backend's default listing order, and queries are evaluated with
/// [`Query::matches`]. Cloning shares the underlying state. Writes can be
/// made to fail on demand to exercise error paths.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<HashMap<CollectionKey, Vec<Document>>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// When set, every create, update, and delete answers with a 503.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Api {
                status: 503,
                message: "induced write failure".into(),
            });
        }
        Ok(())
    }

    fn key(database_id: &str, collection_id: &str) -> CollectionKey {
        (database_id.to_string(), collection_id.to_string())
    }

    fn as_object(data: Value) -> Result<serde_json::Map<String, Value>, StoreError> {
        match data {
            Value::Object(map) => Ok(map),
            other => Err(StoreError::Decode(format!(
                "document data must be a JSON object, got {other}"
            ))),
        }
    }
}

impl DocumentStore for MemoryStore {
    async fn list_documents(
        &self,
        database_id: &str,
        collection_id: &str,
        queries: &[Query],
    ) -> Result<DocumentList, StoreError> {
        let map = self.inner.read().await;
        let documents: Vec<Document> = map
            .get(&Self::key(database_id, collection_id))
            .map(|docs| {
                docs.iter()
                    .filter(|doc| queries.iter().all(|q| q.matches(doc)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        Ok(DocumentList {
            total: documents.len() as u64,
            documents,
        })
    }

    async fn get_document(
        &self,
        database_id: &str,
        collection_id: &str,
        document_id: &str,
    ) -> Result<Document, StoreError> {
        let map = self.inner.read().await;
        map.get(&Self::key(database_id, collection_id))
            .and_then(|docs| docs.iter().find(|doc| doc.id == document_id))
            .cloned()
            .ok_or(StoreError::DocumentNotFound)
    }

    async fn create_document(
        &self,
        database_id: &str,
        collection_id: &str,
        document_id: &str,
        data: Value,
    ) -> Result<Document, StoreError> {
        self.check_writable()?;
        let data = Self::as_object(data)?;
        let mut map = self.inner.write().await;
        let docs = map
            .entry(Self::key(database_id, collection_id))
            .or_default();

        if docs.iter().any(|doc| doc.id == document_id) {
            return Err(StoreError::Api {
                status: 409,
                message: format!("document {document_id} already exists"),
            });
        }

        let now = Utc::now();
        let doc = Document {
            id: document_id.to_string(),
            created_at: Some(now),
            updated_at: Some(now),
            data,
        };
        docs.push(doc.clone());
        Ok(doc)
    }

    async fn update_document(
        &self,
        database_id: &str,
        collection_id: &str,
        document_id: &str,
        data: Value,
    ) -> Result<Document, StoreError> {
        self.check_writable()?;
        let data = Self::as_object(data)?;
        let mut map = self.inner.write().await;
        let doc = map
            .get_mut(&Self::key(database_id, collection_id))
            .and_then(|docs| docs.iter_mut().find(|doc| doc.id == document_id))
            .ok_or(StoreError::DocumentNotFound)?;

        // Updates merge attributes, they do not replace the document.
        for (field, value) in data {
            doc.data.insert(field, value);
        }
        doc.updated_at = Some(Utc::now());
        Ok(doc.clone())
    }

    async fn delete_document(
        &self,
        database_id: &str,
        collection_id: &str,
        document_id: &str,
    ) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut map = self.inner.write().await;
        let docs = map
            .get_mut(&Self::key(database_id, collection_id))
            .ok_or(StoreError::DocumentNotFound)?;

        let before = docs.len();
        docs.retain(|doc| doc.id != document_id);
        if docs.len() == before {
            return Err(StoreError::DocumentNotFound);
        }
        Ok(())
    }
}
