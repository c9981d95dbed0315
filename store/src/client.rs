//! The document-store seam the flow layer is generic over.

use std::future::Future;

use serde_json::Value;

use crate::document::{Document, DocumentList};
use crate::error::StoreError;
use crate::query::Query;

/// Async CRUD over collections of documents.
///
/// `data` arguments must serialize to JSON objects; creates insert the given
/// attributes, updates merge them into the existing document. Flows take
/// `S: DocumentStore` so production code runs against [`crate::HttpStore`]
/// and tests against [`crate::MemoryStore`].
pub trait DocumentStore: Send + Sync {
    fn list_documents(
        &self,
        database_id: &str,
        collection_id: &str,
        queries: &[Query],
    ) -> impl Future<Output = Result<DocumentList, StoreError>> + Send;

    fn get_document(
        &self,
        database_id: &str,
        collection_id: &str,
        document_id: &str,
    ) -> impl Future<Output = Result<Document, StoreError>> + Send;

    fn create_document(
        &self,
        database_id: &str,
        collection_id: &str,
        document_id: &str,
        data: Value,
    ) -> impl Future<Output = Result<Document, StoreError>> + Send;

    fn update_document(
        &self,
        database_id: &str,
        collection_id: &str,
        document_id: &str,
        data: Value,
    ) -> impl Future<Output = Result<Document, StoreError>> + Send;

    fn delete_document(
        &self,
        database_id: &str,
        collection_id: &str,
        document_id: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}
