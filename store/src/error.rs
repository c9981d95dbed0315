use thiserror::Error;

/// Errors surfaced by the document store and function clients.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("document not found")]
    DocumentNotFound,

    #[error("function execution failed: {0}")]
    Execution(String),

    #[error("serialization failed: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("malformed document: {0}")]
    Decode(String),
}

impl StoreError {
    /// True when the backend reported a missing document.
    pub fn is_not_found(&self) -> bool {
        match self {
            StoreError::DocumentNotFound => true,
            StoreError::Api { status, .. } => *status == 404,
            _ => false,
        }
    }
}
