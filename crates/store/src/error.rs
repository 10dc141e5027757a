//! Error types for document store operations.

/// Errors produced by a document store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("store API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("document {id} not found in {collection}")]
    NotFound { collection: String, id: String },

    #[error("write rejected: {0}")]
    Rejected(String),

    #[error("invalid document: {0}")]
    InvalidDocument(String),
}
