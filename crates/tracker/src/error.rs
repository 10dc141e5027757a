//! Error types for tracker operations.

use gametrack_store::StoreError;

use crate::types::Collection;

/// Errors produced while searching, moving or projecting games.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("network error: {0}")]
    Network(#[from] gametrack_rawg::Error),

    #[error("store write failed: {0}")]
    StoreWrite(#[source] StoreError),

    #[error("store subscription failed: {0}")]
    StoreSubscription(#[source] StoreError),

    /// The source delete and its rollback both failed; the copy `id` in
    /// `collection` now duplicates the original.
    #[error("move incomplete: duplicate {id} left in {collection}")]
    PartialMove { collection: Collection, id: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
