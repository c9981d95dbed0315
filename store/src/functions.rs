//! Serverless function client for account provisioning.
//!
//! The backend cannot create or delete auth users from a client SDK, so the
//! deployment ships three functions (create user, delete user by email, look
//! up a user ID by email). Each takes a JSON body and answers with
//! `{"success": bool, ...}` inside the execution's `responseBody`.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::RwLock;

use crate::error::StoreError;

/// Payload for the user-creation function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub name: String,
    pub password: String,
    #[serde(rename = "userId")]
    pub user_id: String,
}

/// Auth-user provisioning seam.
pub trait Functions: Send + Sync {
    /// Creates an auth user and returns its ID.
    fn create_user(
        &self,
        request: CreateUserRequest,
    ) -> impl Future<Output = Result<String, StoreError>> + Send;

    fn delete_user_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Looks up the auth-user ID for an email, `None` when unknown.
    fn user_id_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<String>, StoreError>> + Send;
}

/// HTTP client for the deployment's provisioning functions.
#[derive(Debug, Clone)]
pub struct HttpFunctions {
    http: reqwest::Client,
    endpoint: String,
    project_id: String,
    api_key: String,
}

impl HttpFunctions {
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

    pub fn from_env() -> Self {
        Self::new(
            common::config::endpoint(),
            common::config::project_id(),
            common::config::api_key(),
        )
    }

    /// Runs a function synchronously and parses its JSON response body.
    async fn execute(&self, function_id: &str, payload: &Value) -> Result<Value, StoreError> {
        let url = format!("{}/functions/{}/executions", self.endpoint, function_id);
        let response = self
            .http
            .post(url)
            .header("X-Appwrite-Project", &self.project_id)
            .header("X-Appwrite-Key", &self.api_key)
            .json(&json!({ "body": payload.to_string(), "async": false }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Api {
                status: status.as_u16(),
                message: format!("function {function_id} execution request failed"),
            });
        }

        let execution: Value = response.json().await?;
        let raw = execution
            .get("responseBody")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if raw.is_empty() {
            return Err(StoreError::Execution(
                "function returned an empty response".into(),
            ));
        }
        Ok(serde_json::from_str(raw)?)
    }

    fn success(body: &Value) -> bool {
        body.get("success").and_then(Value::as_bool).unwrap_or(false)
    }

    fn failure_reason(body: &Value, fallback: &str) -> String {
        body.get("error")
            .and_then(Value::as_str)
            .unwrap_or(fallback)
            .to_string()
    }
}

impl Functions for HttpFunctions {
    async fn create_user(&self, request: CreateUserRequest) -> Result<String, StoreError> {
        let function_id = common::config::create_user_function();
        let body = self
            .execute(&function_id, &serde_json::to_value(&request)?)
            .await?;

        if !Self::success(&body) {
            return Err(StoreError::Execution(Self::failure_reason(
                &body,
                "user creation failed",
            )));
        }
        body.pointer("/user/userId")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| StoreError::Execution("user creation response missing userId".into()))
    }

    async fn delete_user_by_email(&self, email: &str) -> Result<(), StoreError> {
        let function_id = common::config::delete_user_function();
        let body = self.execute(&function_id, &json!({ "email": email })).await?;

        if !Self::success(&body) {
            return Err(StoreError::Execution(Self::failure_reason(
                &body,
                "user deletion failed",
            )));
        }
        Ok(())
    }

    async fn user_id_by_email(&self, email: &str) -> Result<Option<String>, StoreError> {
        let function_id = common::config::user_id_function();
        let body = self.execute(&function_id, &json!({ "email": email })).await?;

        if !Self::success(&body) {
            return Ok(None);
        }
        Ok(body
            .get("userId")
            .and_then(Value::as_str)
            .map(str::to_string))
    }
}

/// In-memory provisioning fake for tests.
///
/// Tracks users by email and can be told to reject creations to exercise
/// the best-effort provisioning paths.
#[derive(Clone, Default)]
pub struct MemoryFunctions {
    users: Arc<RwLock<HashMap<String, String>>>,
    reject_creates: Arc<AtomicBool>,
}

impl MemoryFunctions {
    pub fn new() -> Self {
        Self::default()
    }

    /// When set, every [`Functions::create_user`] call fails.
    pub fn reject_creates(&self, reject: bool) {
        self.reject_creates.store(reject, Ordering::SeqCst);
    }

    pub async fn has_user(&self, email: &str) -> bool {
        self.users.read().await.contains_key(email)
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }
}

impl Functions for MemoryFunctions {
    async fn create_user(&self, request: CreateUserRequest) -> Result<String, StoreError> {
        if self.reject_creates.load(Ordering::SeqCst) {
            return Err(StoreError::Execution("user provisioning rejected".into()));
        }
        let mut users = self.users.write().await;
        if users.contains_key(&request.email) {
            return Err(StoreError::Execution(format!(
                "user {} already exists",
                request.email
            )));
        }
        users.insert(request.email, request.user_id.clone());
        Ok(request.user_id)
    }

    async fn delete_user_by_email(&self, email: &str) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        if users.remove(email).is_none() {
            return Err(StoreError::Execution(format!("no user for {email}")));
        }
        Ok(())
    }

    async fn user_id_by_email(&self, email: &str) -> Result<Option<String>, StoreError> {
        Ok(self.users.read().await.get(email).cloned())
    }
}
