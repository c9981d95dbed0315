//! REST implementation of the document store.

use serde_json::{Value, json};

use crate::client::DocumentStore;
use crate::document::{Document, DocumentList};
use crate::error::StoreError;
use crate::query::Query;

/// HTTP client for an Appwrite-compatible deployment.
///
/// Authenticates with a project ID and API key header pair; all document
/// endpoints live under `/databases/{db}/collections/{col}/documents`.
#[derive(Debug, Clone)]
pub struct HttpStore {
    http: reqwest::Client,
    endpoint: String,
    project_id: String,
    api_key: String,
}

impl HttpStore {
    pub fn new(
        endpoint: impl Into<String>,
        project_id: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            project_id: project_id.into(),
            api_key: api_key.into(),
        }
    }

    /// Builds a client from the global configuration.
    pub fn from_env() -> Self {
        Self::new(
            common::config::endpoint(),
            common::config::project_id(),
            common::config::api_key(),
        )
    }

    fn collection_url(&self, database_id: &str, collection_id: &str) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.endpoint, database_id, collection_id
        )
    }

    fn document_url(&self, database_id: &str, collection_id: &str, document_id: &str) -> String {
        format!(
            "{}/{}",
            self.collection_url(database_id, collection_id),
            document_id
        )
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header("X-Appwrite-Project", &self.project_id)
            .header("X-Appwrite-Key", &self.api_key)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status.as_u16() == 404 {
            return Err(StoreError::DocumentNotFound);
        }
        let message = match response.json::<Value>().await {
            Ok(body) => body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown backend error")
                .to_string(),
            Err(_) => "unknown backend error".to_string(),
        };
        Err(StoreError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

impl DocumentStore for HttpStore {
    async fn list_documents(
        &self,
        database_id: &str,
        collection_id: &str,
        queries: &[Query],
    ) -> Result<DocumentList, StoreError> {
        let params: Vec<(&str, String)> = queries
            .iter()
            .map(|q| ("queries[]", q.to_wire()))
            .collect();

        let response = self
            .request(
                reqwest::Method::GET,
                self.collection_url(database_id, collection_id),
            )
            .query(&params)
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    async fn get_document(
        &self,
        database_id: &str,
        collection_id: &str,
        document_id: &str,
    ) -> Result<Document, StoreError> {
        let response = self
            .request(
                reqwest::Method::GET,
                self.document_url(database_id, collection_id, document_id),
            )
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    async fn create_document(
        &self,
        database_id: &str,
        collection_id: &str,
        document_id: &str,
        data: Value,
    ) -> Result<Document, StoreError> {
        let response = self
            .request(
                reqwest::Method::POST,
                self.collection_url(database_id, collection_id),
            )
            .json(&json!({ "documentId": document_id, "data": data }))
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    async fn update_document(
        &self,
        database_id: &str,
        collection_id: &str,
        document_id: &str,
        data: Value,
    ) -> Result<Document, StoreError> {
        let response = self
            .request(
                reqwest::Method::PATCH,
                self.document_url(database_id, collection_id, document_id),
            )
            .json(&json!({ "data": data }))
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    async fn delete_document(
        &self,
        database_id: &str,
        collection_id: &str,
        document_id: &str,
    ) -> Result<(), StoreError> {
        let response = self
            .request(
                reqwest::Method::DELETE,
                self.document_url(database_id, collection_id, document_id),
            )
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}
