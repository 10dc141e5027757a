//! Store-facing types: documents, snapshots, subscriptions and the backend trait.

use std::future::Future;
use std::pin::Pin;

use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::StoreError;

/// Field set of a document body.
pub type Fields = Map<String, Value>;

/// Boxed future returned by [`DocumentStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// A stored document tagged with its store-assigned id.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

/// Full ordered contents of a collection at one point in time.
pub type Snapshot = Vec<Document>;

/// Item delivered on a subscription stream.
pub type SnapshotResult = Result<Snapshot, StoreError>;

/// Abstract document database exposing named collections.
///
/// The tracker only needs three operations: create, delete, and a standing
/// subscription that redelivers the whole collection on every change.
pub trait DocumentStore: Send + Sync {
    /// Inserts a new document and returns the id the store assigned to it.
    fn create<'a>(&'a self, collection: &'a str, fields: &'a Fields) -> StoreFuture<'a, String>;

    /// Deletes a document by id.
    ///
    /// Fails with [`StoreError::NotFound`] if the document does not exist.
    fn delete<'a>(&'a self, collection: &'a str, id: &'a str) -> StoreFuture<'a, ()>;

    /// Opens a standing subscription on a collection.
    ///
    /// The first item is the current contents; every later item is the
    /// full contents after a change.
    fn subscribe<'a>(&'a self, collection: &'a str) -> StoreFuture<'a, Subscription>;
}

/// A standing subscription to one collection.
///
/// The backend stops producing snapshots once the subscription is cancelled
/// or dropped.
#[derive(Debug)]
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<SnapshotResult>,
    cancel: CancellationToken,
}

impl Subscription {
    /// Creates a subscription from a backend's receiving half.
    pub fn new(rx: mpsc::UnboundedReceiver<SnapshotResult>, cancel: CancellationToken) -> Self {
        Self { rx, cancel }
    }

    /// Waits for the next snapshot. Returns `None` once the backend has
    /// stopped or the subscription was cancelled.
    pub async fn next(&mut self) -> Option<SnapshotResult> {
        if self.cancel.is_cancelled() {
            return None;
        }
        tokio::select! {
            _ = self.cancel.cancelled() => None,
            item = self.rx.recv() => item,
        }
    }

    /// Token that cancels this subscription when triggered.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancels the subscription.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
